use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::instrument;
use trac_models::{new_object_id, ObjectType, Tag, TagHeader, TagSelector};

use crate::dal::MetadataDal;
use crate::error::{DalError, DalResult};
use crate::resolve::{self, ObjectVersionRow, TagVersionRow};

/// All committed tag versions for one object version, in commit order.
type TagHistory = Vec<Tag>;
/// All object versions for one objectId, in commit order (index 0 == v1).
type ObjectHistory = Vec<TagHistory>;

/// An in-process metadata store backed by a `tokio::sync::RwLock`, used by
/// `tracd`'s dev mode and by this workspace's own integration tests so the
/// metadata DAL's properties can be exercised without a live Postgres.
///
/// Tenants are top-level map keys, so a selector built against one tenant's
/// objectId can never resolve against another tenant's rows.
#[derive(Default, Clone)]
pub struct InMemoryMetadataDal {
    tenants: Arc<RwLock<HashMap<String, HashMap<String, ObjectHistory>>>>,
}

impl InMemoryMetadataDal {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataDal for InMemoryMetadataDal {
    #[instrument(skip(self, tag))]
    async fn save_new_object(&self, tenant: &str, mut tag: Tag) -> DalResult<TagHeader> {
        let mut tenants = self.tenants.write().await;
        let objects = tenants.entry(tenant.to_string()).or_default();

        // A caller that already reserved an id via `preallocate_id` (e.g. so
        // a data item path can be built before the object is committed)
        // passes it in on `tag.header.object_id`; otherwise one is minted
        // here.
        let object_id = if tag.header.object_id.is_empty() {
            new_object_id()
        } else {
            tag.header.object_id.clone()
        };

        if objects.contains_key(&object_id) {
            return Err(DalError::AlreadyExists(format!(
                "object {object_id} already exists"
            )));
        }

        let now = Utc::now();
        tag.header = TagHeader::new_object(tag.definition.object_type(), now);
        tag.header.object_id = object_id;
        let header = tag.header.clone();
        objects.insert(header.object_id.clone(), vec![vec![tag]]);
        Ok(header)
    }

    #[instrument(skip(self, tag))]
    async fn save_new_version(&self, tenant: &str, mut tag: Tag) -> DalResult<TagHeader> {
        let mut tenants = self.tenants.write().await;
        let objects = tenants
            .entry(tenant.to_string())
            .or_default();

        let history = objects.get_mut(&tag.header.object_id).ok_or_else(|| {
            DalError::NotFound(format!("object {} has no prior version", tag.header.object_id))
        })?;

        let prior_tag = history
            .last()
            .and_then(|versions| versions.last())
            .expect("object history is never empty once created");

        if prior_tag.definition.object_type() != tag.definition.object_type() {
            return Err(DalError::InvalidArgument(format!(
                "object {} changed objectType from {} to {}",
                tag.header.object_id,
                prior_tag.definition.object_type(),
                tag.definition.object_type()
            )));
        }

        let expected_next_version = history.len() as u32 + 1;
        let now = Utc::now();
        tag.header = prior_tag.header.next_object_header(now);
        if tag.header.object_version != expected_next_version {
            return Err(DalError::AlreadyExists(format!(
                "object {} version {} was already committed by a concurrent writer",
                tag.header.object_id, expected_next_version
            )));
        }

        let header = tag.header.clone();
        history.push(vec![tag]);
        Ok(header)
    }

    #[instrument(skip(self, tag))]
    async fn save_new_tag(&self, tenant: &str, mut tag: Tag) -> DalResult<TagHeader> {
        let mut tenants = self.tenants.write().await;
        let objects = tenants
            .get_mut(tenant)
            .ok_or_else(|| DalError::NotFound(format!("tenant {tenant} has no objects")))?;

        let history = objects.get_mut(&tag.header.object_id).ok_or_else(|| {
            DalError::NotFound(format!("object {} not found", tag.header.object_id))
        })?;

        let version_idx = (tag.header.object_version as usize).checked_sub(1).ok_or_else(|| {
            DalError::InvalidArgument("objectVersion must be >= 1".to_string())
        })?;
        let tags = history.get_mut(version_idx).ok_or_else(|| {
            DalError::NotFound(format!(
                "object {} has no version {}",
                tag.header.object_id, tag.header.object_version
            ))
        })?;

        let prior_tag = tags.last().expect("version history is never empty");
        let now = Utc::now();
        tag.header = prior_tag.header.next_tag_header(now);
        tag.definition = prior_tag.definition.clone();

        let header = tag.header.clone();
        tags.push(tag);
        Ok(header)
    }

    #[instrument(skip(self))]
    async fn load_object(&self, tenant: &str, selector: &TagSelector) -> DalResult<Tag> {
        let tenants = self.tenants.read().await;
        let objects = tenants
            .get(tenant)
            .ok_or_else(|| DalError::NotFound(format!("tenant {tenant} has no objects")))?;
        let history = objects
            .get(&selector.object_id)
            .ok_or_else(|| DalError::NotFound(format!("object {} not found", selector.object_id)))?;

        let version_rows: Vec<ObjectVersionRow> = history
            .iter()
            .enumerate()
            .map(|(idx, tags)| ObjectVersionRow {
                object_version: (idx + 1) as u32,
                object_timestamp: tags[0].header.object_timestamp,
            })
            .collect();

        let now = Utc::now();
        let object_version = resolve::resolve_object_version(selector, &version_rows, now)?;
        let tags = &history[(object_version - 1) as usize];

        let tag_rows: Vec<TagVersionRow> = tags
            .iter()
            .map(|t| TagVersionRow {
                tag_version: t.header.tag_version,
                tag_timestamp: t.header.tag_timestamp,
            })
            .collect();
        let tag_version = resolve::resolve_tag_version(selector, &tag_rows, now)?;

        tags.iter()
            .find(|t| t.header.tag_version == tag_version)
            .cloned()
            .ok_or_else(|| DalError::NotFound(format!("tag version {tag_version} not found")))
    }

    #[instrument(skip(self))]
    async fn load_prior_object(&self, tenant: &str, selector: &TagSelector) -> DalResult<Tag> {
        if !selector.is_pinned_version() {
            return Err(DalError::InvalidArgument(
                "load_prior_object requires a pinned objectVersion".to_string(),
            ));
        }
        self.load_object(tenant, selector).await
    }

    #[instrument(skip(self))]
    async fn preallocate_id(&self, _tenant: &str, _object_type: ObjectType) -> DalResult<String> {
        Ok(new_object_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use trac_models::{ObjectDefinition, OpaquePayload, TagCriteria};

    fn new_job_tag() -> Tag {
        Tag {
            header: TagHeader::new_object(ObjectType::Job, Utc::now()),
            definition: ObjectDefinition::Job(OpaquePayload { payload: serde_json::json!({}) }),
            attrs: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn save_new_object_rejects_duplicate_id() {
        let dal = InMemoryMetadataDal::new();
        let tag = new_job_tag();
        let id = tag.header.object_id.clone();
        dal.save_new_object("tenant-a", tag.clone()).await.unwrap();

        let mut dup = tag;
        dup.header.object_id = id;
        let err = dal.save_new_object("tenant-a", dup).await.unwrap_err();
        assert!(matches!(err, DalError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn save_new_version_requires_prior_object() {
        let dal = InMemoryMetadataDal::new();
        let tag = new_job_tag();
        let err = dal.save_new_version("tenant-a", tag).await.unwrap_err();
        assert!(matches!(err, DalError::NotFound(_)));
    }

    #[tokio::test]
    async fn version_and_tag_increment_sequentially() {
        let dal = InMemoryMetadataDal::new();
        let tag = new_job_tag();
        let header = dal.save_new_object("tenant-a", tag.clone()).await.unwrap();
        assert_eq!((header.object_version, header.tag_version), (1, 1));

        let mut next = tag.clone();
        next.header.object_id = header.object_id.clone();
        let header2 = dal.save_new_version("tenant-a", next).await.unwrap();
        assert_eq!((header2.object_version, header2.tag_version), (2, 1));

        let mut tag_only = tag;
        tag_only.header = header2.clone();
        let header3 = dal.save_new_tag("tenant-a", tag_only).await.unwrap();
        assert_eq!((header3.object_version, header3.tag_version), (2, 2));
    }

    #[tokio::test]
    async fn save_new_object_honors_preallocated_id() {
        let dal = InMemoryMetadataDal::new();
        let reserved = dal.preallocate_id("tenant-a", ObjectType::Data).await.unwrap();

        let mut tag = new_job_tag();
        tag.header.object_id = reserved.clone();
        let header = dal.save_new_object("tenant-a", tag).await.unwrap();
        assert_eq!(header.object_id, reserved);
    }

    #[tokio::test]
    async fn cross_tenant_read_is_not_found() {
        let dal = InMemoryMetadataDal::new();
        let tag = new_job_tag();
        let header = dal.save_new_object("ACME_CORP", tag).await.unwrap();

        let selector = TagSelector {
            object_type: ObjectType::Job,
            object_id: header.object_id,
            object_criteria: trac_models::ObjectCriteria::LatestObject,
            tag_criteria: TagCriteria::LatestTag,
        };
        let err = dal
            .load_object("SOME_OTHER_CORP", &selector)
            .await
            .unwrap_err();
        assert!(matches!(err, DalError::NotFound(_)));
    }

    #[tokio::test]
    async fn latest_selector_returns_most_recent_version() {
        let dal = InMemoryMetadataDal::new();
        let tag = new_job_tag();
        let header = dal.save_new_object("tenant-a", tag.clone()).await.unwrap();
        let mut next = tag;
        next.header.object_id = header.object_id.clone();
        dal.save_new_version("tenant-a", next).await.unwrap();

        let selector = TagSelector {
            object_type: ObjectType::Job,
            object_id: header.object_id,
            object_criteria: trac_models::ObjectCriteria::LatestObject,
            tag_criteria: TagCriteria::LatestTag,
        };
        let loaded = dal.load_object("tenant-a", &selector).await.unwrap();
        assert_eq!(loaded.header.object_version, 2);
    }
}
