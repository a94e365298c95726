use async_trait::async_trait;
use trac_models::{Tag, TagHeader, TagSelector};

use crate::error::DalResult;

/// The public contract of the metadata DAL. Both the Postgres-backed and
/// in-memory implementations honor identical semantics; only the storage
/// medium differs.
#[async_trait]
pub trait MetadataDal: Send + Sync {
    /// Fails with ALREADY_EXISTS if `(objectId, 1)` already exists for this
    /// tenant.
    async fn save_new_object(&self, tenant: &str, tag: Tag) -> DalResult<TagHeader>;

    /// Requires the prior `(objectId, N)` to exist; assigns `N + 1`. Fails
    /// ALREADY_EXISTS on a concurrent writer that claimed `N + 1` first,
    /// NOT_FOUND if no prior version exists, INVALID_ARGUMENT if
    /// `objectType` differs from the prior version's.
    async fn save_new_version(&self, tenant: &str, tag: Tag) -> DalResult<TagHeader>;

    /// Increments `tagVersion` for the current `(objectId, objectVersion)`.
    async fn save_new_tag(&self, tenant: &str, tag: Tag) -> DalResult<TagHeader>;

    /// Resolves `selector` using latest-wins precedence.
    async fn load_object(&self, tenant: &str, selector: &TagSelector) -> DalResult<Tag>;

    /// Same as [`MetadataDal::load_object`] but bypasses "latest" semantics:
    /// an explicit object/tag version must be given, or the call fails.
    async fn load_prior_object(&self, tenant: &str, selector: &TagSelector) -> DalResult<Tag>;

    /// Batched form of [`MetadataDal::load_object`].
    async fn load_objects(&self, tenant: &str, selectors: &[TagSelector]) -> DalResult<Vec<Tag>> {
        let mut out = Vec::with_capacity(selectors.len());
        for selector in selectors {
            out.push(self.load_object(tenant, selector).await?);
        }
        Ok(out)
    }

    /// Reserves a fresh object id without committing any tag for it, used by
    /// clients that need to reference an id before the object exists.
    async fn preallocate_id(&self, tenant: &str, object_type: trac_models::ObjectType) -> DalResult<String>;
}
