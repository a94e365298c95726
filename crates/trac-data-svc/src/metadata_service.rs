//! `TracMetadataApi` implementation: CRUD over `Tag`/`ObjectDefinition`
//! through the configured [`MetadataDal`], covering createObject,
//! updateObject, updateTag, readObject, readBatch, search,
//! createObjectBatch, and their trusted/admin variants.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tonic::{Request, Response, Status};
use tracing::instrument;

use trac_metadata_dal::MetadataDal;
use trac_models::{Tag, TagHeader};
use trac_proto::conversions;
use trac_proto::metadata as p;
use trac_proto::metadata::trac_metadata_api_server::TracMetadataApi;

use crate::error::{ServiceError, ServiceResult};
use crate::validate;

pub struct MetadataService {
    dal: Arc<dyn MetadataDal>,
}

impl MetadataService {
    pub fn new(dal: Arc<dyn MetadataDal>) -> Self {
        MetadataService { dal }
    }

    async fn create_object_inner(&self, req: p::MetadataWriteRequest) -> ServiceResult<TagHeader> {
        validate::validate_tenant(&req.tenant)?;

        let definition = conversions::object_definition_from_wire(
            req.definition.ok_or_else(|| ServiceError::invalid_argument("definition is required"))?,
        )?;
        let tag_updates = req
            .tag_updates
            .into_iter()
            .map(conversions::tag_update_from_wire)
            .collect::<Result<Vec<_>, _>>()?;
        validate::validate_client_tag_updates(&tag_updates)?;

        let now = Utc::now();
        let mut tag = Tag {
            header: TagHeader::new_object(definition.object_type(), now),
            definition,
            attrs: BTreeMap::new(),
        };
        // The DAL mints the real object id; clearing it here lets
        // `save_new_object` tell "brand new" apart from "caller reserved
        // this id via preallocate_id" (neither path applies to a plain
        // CreateObject call).
        tag.header.object_id = String::new();
        tag.apply_updates(&tag_updates)?;

        Ok(self.dal.save_new_object(&req.tenant, tag).await?)
    }

    async fn update_object_inner(&self, req: p::MetadataWriteRequest) -> ServiceResult<TagHeader> {
        validate::validate_tenant(&req.tenant)?;

        let definition = conversions::object_definition_from_wire(
            req.definition.ok_or_else(|| ServiceError::invalid_argument("definition is required"))?,
        )?;
        let tag_updates = req
            .tag_updates
            .into_iter()
            .map(conversions::tag_update_from_wire)
            .collect::<Result<Vec<_>, _>>()?;
        validate::validate_client_tag_updates(&tag_updates)?;

        let prior_selector = conversions::tag_selector_from_wire(
            req.prior_version.ok_or_else(|| ServiceError::invalid_argument("prior_version is required"))?,
        )?;
        validate::validate_prior_version(&prior_selector, definition.object_type())?;

        let prior = self.dal.load_prior_object(&req.tenant, &prior_selector).await?;
        if prior.definition.object_type() != definition.object_type() {
            return Err(ServiceError::invalid_argument(format!(
                "object {} changed objectType from {} to {}",
                prior.header.object_id,
                prior.definition.object_type(),
                definition.object_type()
            )));
        }

        let mut tag = Tag {
            header: prior.header.clone(),
            definition,
            attrs: BTreeMap::new(),
        };
        tag.apply_updates(&tag_updates)?;

        Ok(self.dal.save_new_version(&req.tenant, tag).await?)
    }

    async fn update_tag_inner(&self, req: p::MetadataUpdateTagRequest) -> ServiceResult<TagHeader> {
        validate::validate_tenant(&req.tenant)?;

        let selector = conversions::tag_selector_from_wire(
            req.selector.ok_or_else(|| ServiceError::invalid_argument("selector is required"))?,
        )?;
        let tag_updates = req
            .tag_updates
            .into_iter()
            .map(conversions::tag_update_from_wire)
            .collect::<Result<Vec<_>, _>>()?;
        validate::validate_client_tag_updates(&tag_updates)?;

        let mut tag = self.dal.load_object(&req.tenant, &selector).await?;
        tag.apply_updates(&tag_updates)?;

        Ok(self.dal.save_new_tag(&req.tenant, tag).await?)
    }

    async fn read_object_inner(&self, req: p::MetadataReadRequest) -> ServiceResult<Tag> {
        validate::validate_tenant(&req.tenant)?;
        let selector = conversions::tag_selector_from_wire(
            req.selector.ok_or_else(|| ServiceError::invalid_argument("selector is required"))?,
        )?;
        Ok(self.dal.load_object(&req.tenant, &selector).await?)
    }

    async fn read_batch_inner(&self, req: p::MetadataReadBatchRequest) -> ServiceResult<Vec<Tag>> {
        validate::validate_tenant(&req.tenant)?;
        let selectors = req
            .selectors
            .into_iter()
            .map(conversions::tag_selector_from_wire)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.dal.load_objects(&req.tenant, &selectors).await?)
    }

    async fn create_object_batch_inner(&self, req: p::MetadataWriteBatchRequest) -> ServiceResult<Vec<TagHeader>> {
        validate::validate_tenant(&req.tenant)?;
        let mut headers = Vec::with_capacity(req.requests.len());
        for mut item in req.requests {
            item.tenant = req.tenant.clone();
            headers.push(self.create_object_inner(item).await?);
        }
        Ok(headers)
    }
}

#[tonic::async_trait]
impl TracMetadataApi for MetadataService {
    #[instrument(skip(self, request))]
    async fn create_object(&self, request: Request<p::MetadataWriteRequest>) -> Result<Response<p::TagHeader>, Status> {
        let header = self.create_object_inner(request.into_inner()).await?;
        Ok(Response::new(conversions::tag_header_to_wire(&header)))
    }

    #[instrument(skip(self, request))]
    async fn update_object(&self, request: Request<p::MetadataWriteRequest>) -> Result<Response<p::TagHeader>, Status> {
        let header = self.update_object_inner(request.into_inner()).await?;
        Ok(Response::new(conversions::tag_header_to_wire(&header)))
    }

    #[instrument(skip(self, request))]
    async fn update_tag(&self, request: Request<p::MetadataUpdateTagRequest>) -> Result<Response<p::TagHeader>, Status> {
        let header = self.update_tag_inner(request.into_inner()).await?;
        Ok(Response::new(conversions::tag_header_to_wire(&header)))
    }

    #[instrument(skip(self, request))]
    async fn read_object(&self, request: Request<p::MetadataReadRequest>) -> Result<Response<p::Tag>, Status> {
        let tag = self.read_object_inner(request.into_inner()).await?;
        Ok(Response::new(conversions::tag_to_wire(&tag)))
    }

    #[instrument(skip(self, request))]
    async fn read_batch(
        &self,
        request: Request<p::MetadataReadBatchRequest>,
    ) -> Result<Response<p::MetadataReadBatchResponse>, Status> {
        let tags = self.read_batch_inner(request.into_inner()).await?;
        Ok(Response::new(p::MetadataReadBatchResponse {
            tags: tags.iter().map(conversions::tag_to_wire).collect(),
        }))
    }

    #[instrument(skip(self, _request))]
    async fn search(
        &self,
        _request: Request<p::MetadataSearchRequest>,
    ) -> Result<Response<p::MetadataSearchResponse>, Status> {
        // Search-expression evaluation is query-execution territory, named
        // out of scope; the RPC exists on the wire surface but is not
        // implemented here.
        Err(Status::unimplemented("search is not implemented"))
    }

    #[instrument(skip(self, request))]
    async fn create_object_batch(
        &self,
        request: Request<p::MetadataWriteBatchRequest>,
    ) -> Result<Response<p::MetadataWriteBatchResponse>, Status> {
        let headers = self.create_object_batch_inner(request.into_inner()).await?;
        Ok(Response::new(p::MetadataWriteBatchResponse {
            headers: headers.iter().map(conversions::tag_header_to_wire).collect(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trac_metadata_dal::InMemoryMetadataDal;
    use trac_models::{BasicType, FieldSchema, SchemaDefinition, SchemaType, TableSchema};

    fn table_schema() -> p::SchemaDefinition {
        conversions::schema_definition_to_wire(&SchemaDefinition {
            schema_type: SchemaType::Table,
            table: TableSchema {
                fields: vec![FieldSchema {
                    field_name: "a".into(),
                    field_order: 0,
                    field_type: BasicType::Integer,
                    business_key: false,
                    categorical: false,
                    nullable: true,
                    label: None,
                    format_code: None,
                }],
            },
        })
    }

    fn schema_object_definition() -> p::ObjectDefinition {
        p::ObjectDefinition {
            object_type: p::ObjectType::Schema as i32,
            definition: Some(p::object_definition::Definition::Schema(table_schema())),
        }
    }

    fn service() -> MetadataService {
        MetadataService::new(Arc::new(InMemoryMetadataDal::new()))
    }

    #[tokio::test]
    async fn create_then_read_round_trips() {
        let svc = service();
        let header = svc
            .create_object_inner(p::MetadataWriteRequest {
                tenant: "acme".into(),
                definition: Some(schema_object_definition()),
                tag_updates: vec![],
                prior_version: None,
            })
            .await
            .unwrap();
        assert_eq!(header.object_version, 1);

        let selector = trac_models::TagSelector::pinned(&header);
        let tag = svc
            .read_object_inner(p::MetadataReadRequest {
                tenant: "acme".into(),
                selector: Some(conversions::tag_selector_to_wire(&selector)),
            })
            .await
            .unwrap();
        assert_eq!(tag.header, header);
    }

    #[tokio::test]
    async fn update_object_requires_matching_type() {
        let svc = service();
        let header = svc
            .create_object_inner(p::MetadataWriteRequest {
                tenant: "acme".into(),
                definition: Some(schema_object_definition()),
                tag_updates: vec![],
                prior_version: None,
            })
            .await
            .unwrap();

        let prior_selector = trac_models::TagSelector::pinned(&header);
        let err = svc
            .update_object_inner(p::MetadataWriteRequest {
                tenant: "acme".into(),
                definition: Some(p::ObjectDefinition {
                    object_type: p::ObjectType::Job as i32,
                    definition: Some(p::object_definition::Definition::Job(p::OpaquePayload {
                        json_payload: b"{}".to_vec(),
                    })),
                }),
                tag_updates: vec![],
                prior_version: Some(conversions::tag_selector_to_wire(&prior_selector)),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn cross_tenant_read_is_not_found() {
        let svc = service();
        let header = svc
            .create_object_inner(p::MetadataWriteRequest {
                tenant: "acme".into(),
                definition: Some(schema_object_definition()),
                tag_updates: vec![],
                prior_version: None,
            })
            .await
            .unwrap();

        let selector = trac_models::TagSelector::pinned(&header);
        let err = svc
            .read_object_inner(p::MetadataReadRequest {
                tenant: "other".into(),
                selector: Some(conversions::tag_selector_to_wire(&selector)),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
