//! Request-boundary validators: validation at the service boundary produces
//! INVALID_ARGUMENT before any I/O happens.

use trac_models::{validate::validate_attr_name, ObjectType, TagSelector, TagUpdate};

use crate::error::{ServiceError, ServiceResult};

pub fn validate_tenant(tenant: &str) -> ServiceResult<()> {
    if tenant.trim().is_empty() {
        return Err(ServiceError::invalid_argument("tenant must not be empty"));
    }
    Ok(())
}

/// Client-originated tag updates may never use a `trac_`/`_`-reserved attr
/// name; those are written only by the platform itself.
pub fn validate_client_tag_updates(updates: &[TagUpdate]) -> ServiceResult<()> {
    for update in updates {
        validate_attr_name(&update.attr_name, false)?;
    }
    Ok(())
}

/// Requires `selector` to reference `expected_type` and to be fully
/// well-formed (non-empty id): the prior version must be present,
/// well-formed, of the correct type, and resolvable.
pub fn validate_prior_version(selector: &TagSelector, expected_type: ObjectType) -> ServiceResult<()> {
    if selector.object_type != expected_type {
        return Err(ServiceError::invalid_argument(format!(
            "prior version selector must reference a {expected_type} object, found {}",
            selector.object_type
        )));
    }
    if selector.object_id.trim().is_empty() {
        return Err(ServiceError::invalid_argument("prior version selector must carry an object id"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trac_models::{ObjectCriteria, TagCriteria, TagOperation, Value};

    #[test]
    fn empty_tenant_is_rejected() {
        assert!(validate_tenant("").is_err());
        assert!(validate_tenant("   ").is_err());
    }

    #[test]
    fn reserved_attr_name_in_client_update_is_rejected() {
        let updates = vec![TagUpdate {
            attr_name: "trac_data_size".into(),
            operation: TagOperation::CreateAttr,
            value: Some(Value::Integer(1)),
        }];
        assert!(validate_client_tag_updates(&updates).is_err());
    }

    #[test]
    fn prior_version_of_wrong_object_type_is_rejected() {
        let selector = TagSelector {
            object_type: ObjectType::File,
            object_id: "x".into(),
            object_criteria: ObjectCriteria::LatestObject,
            tag_criteria: TagCriteria::LatestTag,
        };
        assert!(validate_prior_version(&selector, ObjectType::Data).is_err());
    }
}
