use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::TagHeader;
use crate::object::ObjectDefinition;
use crate::value::Value;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TagOperation {
    CreateAttr,
    ReplaceAttr,
    AppendAttr,
    DeleteAttr,
    ClearAllAttr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagUpdate {
    pub attr_name: String,
    pub operation: TagOperation,
    pub value: Option<Value>,
}

/// The full metadata payload at one (objectId, objectVersion, tagVersion),
/// "header + definition + attrs."
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub header: TagHeader,
    pub definition: ObjectDefinition,
    pub attrs: BTreeMap<String, Value>,
}

impl Tag {
    /// Applies a batch of [`TagUpdate`]s to this tag's attrs in order,
    /// enforcing a REPLACE targeting an absent attr is a
    /// FAILED_PRECONDITION.
    pub fn apply_updates(&mut self, updates: &[TagUpdate]) -> Result<(), crate::error::Error> {
        for update in updates {
            match update.operation {
                TagOperation::CreateAttr => {
                    let value = update.value.clone().ok_or_else(|| {
                        crate::error::Error::invalid_argument("CREATE_ATTR requires a value")
                    })?;
                    self.attrs.insert(update.attr_name.clone(), value);
                }
                TagOperation::ReplaceAttr => {
                    if !self.attrs.contains_key(&update.attr_name) {
                        return Err(crate::error::Error::failed_precondition(format!(
                            "REPLACE_ATTR on absent attr '{}'",
                            update.attr_name
                        )));
                    }
                    let value = update.value.clone().ok_or_else(|| {
                        crate::error::Error::invalid_argument("REPLACE_ATTR requires a value")
                    })?;
                    self.attrs.insert(update.attr_name.clone(), value);
                }
                TagOperation::AppendAttr => {
                    let value = update.value.clone().ok_or_else(|| {
                        crate::error::Error::invalid_argument("APPEND_ATTR requires a value")
                    })?;
                    self.attrs
                        .entry(update.attr_name.clone())
                        .and_modify(|existing| {
                            let mut items = match existing.clone() {
                                Value::Array(items) => items,
                                other => vec![other],
                            };
                            items.push(value.clone());
                            *existing = Value::Array(items);
                        })
                        .or_insert(value);
                }
                TagOperation::DeleteAttr => {
                    self.attrs.remove(&update.attr_name);
                }
                TagOperation::ClearAllAttr => {
                    self.attrs.clear();
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ObjectType;
    use crate::object::OpaquePayload;
    use chrono::Utc;

    fn sample_tag() -> Tag {
        Tag {
            header: TagHeader {
                object_type: ObjectType::Job,
                object_id: "id".into(),
                object_version: 1,
                tag_version: 1,
                object_timestamp: Utc::now(),
                tag_timestamp: Utc::now(),
            },
            definition: ObjectDefinition::Job(OpaquePayload {
                payload: serde_json::json!({}),
            }),
            attrs: BTreeMap::new(),
        }
    }

    #[test]
    fn replace_on_absent_attr_fails_precondition() {
        let mut tag = sample_tag();
        let update = TagUpdate {
            attr_name: "missing".into(),
            operation: TagOperation::ReplaceAttr,
            value: Some(Value::String("x".into())),
        };
        let err = tag.apply_updates(&[update]).unwrap_err();
        assert!(matches!(err, crate::error::Error::FailedPrecondition(_)));
    }

    #[test]
    fn create_then_append_builds_array() {
        let mut tag = sample_tag();
        let updates = vec![
            TagUpdate {
                attr_name: "tags".into(),
                operation: TagOperation::CreateAttr,
                value: Some(Value::String("a".into())),
            },
            TagUpdate {
                attr_name: "tags".into(),
                operation: TagOperation::AppendAttr,
                value: Some(Value::String("b".into())),
            },
        ];
        tag.apply_updates(&updates).unwrap();
        assert_eq!(
            tag.attrs.get("tags"),
            Some(&Value::Array(vec![
                Value::String("a".into()),
                Value::String("b".into())
            ]))
        );
    }

    #[test]
    fn clear_all_removes_every_attr() {
        let mut tag = sample_tag();
        tag.attrs.insert("x".into(), Value::Boolean(true));
        tag.apply_updates(&[TagUpdate {
            attr_name: String::new(),
            operation: TagOperation::ClearAllAttr,
            value: None,
        }])
        .unwrap();
        assert!(tag.attrs.is_empty());
    }
}
