//! `TracDataApi` implementation: the streaming create/update/read surface
//! over DATA and FILE objects.
//!
//! Every version — create or update — writes a brand new, self-contained
//! copy of its content under its own `dataItem` path token; the STORAGE
//! object accumulates every `dataItem` ever written, and DATA/FILE.storageId
//! always points at it with a `latestObject`/`latestTag` selector, so
//! earlier DATA/FILE versions stay readable by resolving their own
//! `dataItem` out of the one, ever-growing STORAGE object.

use std::collections::BTreeMap;
use std::pin::Pin;

use bytes::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt};
use tonic::{Request, Response, Status, Streaming};
use tracing::instrument;

use trac_codecs::FormatCode;
use trac_models::{
    path, validate::validate_file_name, DataDefinition, FileDefinition, ObjectDefinition,
    ObjectType, SchemaDefinition, SchemaSpec, StorageDefinition, Tag, TagHeader, TagSelector,
    TagUpdate,
};
use trac_pipeline::{check_declared_size, run_ingest, run_passthrough, run_read, CancellationToken, PipelineError, PipelineResult, RowRange};
use trac_proto::conversions;
use trac_proto::data as p;
use trac_proto::data::trac_data_api_server::TracDataApi;

use crate::context::ServiceContext;
use crate::error::{ServiceError, ServiceResult};
use crate::storage_obj;
use crate::validate;

pub struct DataService {
    ctx: ServiceContext,
}

/// Which pipeline shape `write_content_and_commit` drives the content
/// through: a schema-directed codec stage for DATA, or a raw byte
/// passthrough for FILE (opaque content has no schema to decode against).
enum ContentMode<'a> {
    Codec { source_format: FormatCode, schema: &'a SchemaDefinition },
    Raw { mime_type: &'a str },
}

impl DataService {
    pub fn new(ctx: ServiceContext) -> Self {
        DataService { ctx }
    }

    fn resolve_schema_definition<'a>(
        &'a self,
        tenant: &'a str,
        spec: &'a SchemaSpec,
    ) -> Pin<Box<dyn std::future::Future<Output = ServiceResult<SchemaDefinition>> + Send + 'a>> {
        Box::pin(async move {
            match spec {
                SchemaSpec::Embedded(s) => Ok(s.clone()),
                SchemaSpec::External(selector) => {
                    if selector.is_latest_object() {
                        return Err(ServiceError::invalid_argument(
                            "external schema selector must pin a specific version, not latestObject",
                        ));
                    }
                    let tag = self.ctx.dal.load_object(tenant, selector).await?;
                    match tag.definition {
                        ObjectDefinition::Schema(def) => Ok(def),
                        _ => Err(ServiceError::invalid_argument("schemaId does not reference a SCHEMA object")),
                    }
                }
            }
        })
    }

    /// Derives the new `dataItem` path, extends STORAGE, streams the content
    /// through the pipeline, and commits STORAGE before DATA/FILE -- shared
    /// between `createDataset`/`updateDataset` and `createFile`/`updateFile`.
    ///
    /// `content` selects the pipeline shape: `Codec` decodes `source_format`
    /// and re-encodes into the canonical on-disk format for DATA; `Raw`
    /// streams FILE's opaque bytes straight to the object-store writer with
    /// no codec stage, since there is no schema to decode opaque bytes
    /// against.
    #[allow(clippy::too_many_arguments)]
    async fn write_content_and_commit(
        &self,
        tenant: &str,
        object_type: ObjectType,
        prior: Option<&Tag>,
        tag_updates: &[TagUpdate],
        content: ContentMode<'_>,
        declared_size: Option<u64>,
        frames: impl Stream<Item = PipelineResult<Bytes>> + Unpin,
        build_definition: impl FnOnce() -> ObjectDefinition,
    ) -> ServiceResult<TagHeader> {
        let prior_storage = match prior {
            Some(prior_tag) => {
                let selector = storage_selector_of(prior_tag)?;
                let storage_tag = self.ctx.dal.load_object(tenant, &selector).await?;
                let def = match storage_tag.definition {
                    ObjectDefinition::Storage(def) => def,
                    _ => return Err(ServiceError::Internal("storageId did not resolve to a STORAGE object".to_string())),
                };
                Some((storage_tag.header, def))
            }
            None => None,
        };

        let object_id = match prior {
            Some(prior_tag) => prior_tag.header.object_id.clone(),
            None => self.ctx.dal.preallocate_id(tenant, object_type).await?,
        };
        let next_object_version = prior.map(|t| t.header.object_version + 1).unwrap_or(1);
        let suffix = path::random_suffix_hex(8);
        let item_path = match object_type {
            ObjectType::Data => path::data_item_path(&object_id, 0, next_object_version - 1, &suffix),
            ObjectType::File => path::file_item_path(&object_id, next_object_version),
            other => return Err(ServiceError::Internal(format!("unexpected object type {other}"))),
        };
        let storage_path = self.ctx.tenant_path(tenant, &item_path);
        let storage_format_label = match &content {
            ContentMode::Codec { .. } => self.ctx.canonical_format.to_string(),
            ContentMode::Raw { mime_type } => mime_type.to_string(),
        };

        let now = Utc::now();
        let new_storage_def = match &prior_storage {
            Some((_, def)) => storage_obj::append_data_item(
                def.clone(),
                &item_path,
                &self.ctx.storage_key,
                &storage_path,
                &storage_format_label,
                now,
            ),
            None => storage_obj::new_storage_definition(
                &item_path,
                &self.ctx.storage_key,
                &storage_path,
                &storage_format_label,
                now,
            ),
        };

        let token = CancellationToken::new();
        let writer = self.ctx.store.writer(&storage_path).await?;
        let outcome = match content {
            ContentMode::Codec { source_format, schema } => {
                run_ingest(schema, source_format, self.ctx.canonical_format, frames, writer, &token).await?
            }
            ContentMode::Raw { .. } => run_passthrough(frames, writer, &token).await?,
        };
        check_declared_size(declared_size, &outcome)?;

        let storage_tag_to_save = Tag {
            header: match &prior_storage {
                Some((header, _)) => header.clone(),
                None => {
                    let mut header = TagHeader::new_object(ObjectType::Storage, now);
                    header.object_id = String::new();
                    header
                }
            },
            definition: ObjectDefinition::Storage(new_storage_def.clone()),
            attrs: BTreeMap::new(),
        };

        let storage_header = if prior_storage.is_some() {
            self.ctx.dal.save_new_version(tenant, storage_tag_to_save).await?
        } else {
            self.ctx.dal.save_new_object(tenant, storage_tag_to_save).await?
        };

        let mut definition = build_definition();
        // Invariant 5: storageId always points at STORAGE with
        // latestObject=true/latestTag=true, never a pinned version -- the
        // concrete dataItem for this DATA/FILE version is resolved out of
        // `parts`/`data_item` (set below), not by pinning the whole STORAGE
        // object down to this write's version.
        set_storage_selector(&mut definition, TagSelector::latest(ObjectType::Storage, storage_header.object_id.clone()));
        set_data_item(&mut definition, &item_path, next_object_version - 1);

        let data_tag_header = match prior {
            Some(prior_tag) => prior_tag.header.clone(),
            None => {
                let mut header = TagHeader::new_object(object_type, now);
                header.object_id = object_id;
                header
            }
        };

        let mut tag = Tag { header: data_tag_header, definition, attrs: BTreeMap::new() };
        tag.apply_updates(tag_updates)?;

        let commit = if prior.is_some() {
            self.ctx.dal.save_new_version(tenant, tag).await
        } else {
            self.ctx.dal.save_new_object(tenant, tag).await
        };

        match commit {
            Ok(header) => Ok(header),
            Err(err) => {
                self.expunge_storage_best_effort(tenant, storage_header, new_storage_def, item_path);
                Err(err.into())
            }
        }
    }

    /// Open Question (a): marks the copy EXPUNGED asynchronously rather than
    /// blocking the failed write on a second round trip; no background
    /// reaper deletes the underlying bytes (see DESIGN.md).
    fn expunge_storage_best_effort(&self, tenant: &str, storage_header: TagHeader, storage_def: StorageDefinition, data_item: String) {
        let dal = self.ctx.dal.clone();
        let tenant = tenant.to_string();
        tokio::spawn(async move {
            let expunged = storage_obj::expunge_data_item(storage_def, &data_item);
            let tag = Tag { header: storage_header, definition: ObjectDefinition::Storage(expunged), attrs: BTreeMap::new() };
            if let Err(err) = dal.save_new_tag(&tenant, tag).await {
                tracing::warn!(error = ?err, "failed to mark orphaned storage copy as expunged");
            }
        });
    }
}

fn set_storage_selector(definition: &mut ObjectDefinition, selector: TagSelector) {
    match definition {
        ObjectDefinition::Data(d) => d.storage_id = selector,
        ObjectDefinition::File(f) => f.storage_id = selector,
        _ => {}
    }
}

/// Records which physical `dataItem` this version's content was written to:
/// the single `"default"` part's one delta for DATA, the `dataItem` field
/// directly for FILE. `delta_index` mirrors the index already baked into the
/// item path token by [`path::data_item_path`].
fn set_data_item(definition: &mut ObjectDefinition, item_path: &str, delta_index: u32) {
    match definition {
        ObjectDefinition::Data(d) => {
            d.parts.insert(
                "default".to_string(),
                trac_models::Part {
                    part_key: "default".to_string(),
                    snap: trac_models::Snap {
                        snap_index: 0,
                        deltas: vec![trac_models::DeltaRef { delta_index, data_item: item_path.to_string() }],
                    },
                },
            );
        }
        ObjectDefinition::File(f) => f.data_item = item_path.to_string(),
        _ => {}
    }
}

fn storage_selector_of(tag: &Tag) -> ServiceResult<TagSelector> {
    match &tag.definition {
        ObjectDefinition::Data(d) => Ok(d.storage_id.clone()),
        ObjectDefinition::File(f) => Ok(f.storage_id.clone()),
        _ => Err(ServiceError::Internal("prior object is not a DATA or FILE object".to_string())),
    }
}

fn data_write_content_stream(
    first_content: Vec<u8>,
    rest: impl Stream<Item = Result<p::DataWriteRequest, Status>> + Unpin + Send + 'static,
) -> impl Stream<Item = PipelineResult<Bytes>> + Unpin {
    let head = futures::stream::iter(if first_content.is_empty() { None } else { Some(Ok(Bytes::from(first_content))) });
    let tail = rest.map(|item| {
        item.map(|req| Bytes::from(req.content))
            .map_err(|status| PipelineError::Io(std::io::Error::other(status.to_string())))
    });
    Box::pin(head.chain(tail))
}

fn file_write_content_stream(
    first_content: Vec<u8>,
    rest: impl Stream<Item = Result<p::FileWriteRequest, Status>> + Unpin + Send + 'static,
) -> impl Stream<Item = PipelineResult<Bytes>> + Unpin {
    let head = futures::stream::iter(if first_content.is_empty() { None } else { Some(Ok(Bytes::from(first_content))) });
    let tail = rest.map(|item| {
        item.map(|req| Bytes::from(req.content))
            .map_err(|status| PipelineError::Io(std::io::Error::other(status.to_string())))
    });
    Box::pin(head.chain(tail))
}

impl DataService {
    async fn create_or_update_dataset(&self, mut stream: Streaming<p::DataWriteRequest>, is_update: bool) -> ServiceResult<TagHeader> {
        let first = stream
            .message()
            .await
            .map_err(|e| ServiceError::invalid_argument(e.to_string()))?
            .ok_or_else(|| ServiceError::invalid_argument("empty request stream"))?;
        self.create_or_update_dataset_from_first(first, stream, is_update).await
    }

    /// Drives the write/commit path from an already-extracted first frame plus
    /// the remaining frames of the stream. Exposed `pub` (rather than only
    /// reachable through the `tonic::Streaming`-typed RPC entrypoint) so
    /// callers that assemble a request from a single decoded message -- the
    /// REST gateway's unary-JSON bridge, and these unit tests -- can drive the
    /// same write path without constructing a real `tonic::Streaming`, which
    /// only a live gRPC transport can produce.
    pub async fn create_or_update_dataset_from_first(
        &self,
        first: p::DataWriteRequest,
        rest: impl Stream<Item = Result<p::DataWriteRequest, Status>> + Unpin + Send + 'static,
        is_update: bool,
    ) -> ServiceResult<TagHeader> {
        validate::validate_tenant(&first.tenant)?;
        let tenant = first.tenant.clone();

        let tag_updates = first
            .tag_updates
            .clone()
            .into_iter()
            .map(conversions::tag_update_from_wire)
            .collect::<Result<Vec<_>, _>>()?;
        validate::validate_client_tag_updates(&tag_updates)?;

        let schema_spec = conversions::schema_spec_from_wire(
            first.schema_spec.clone().ok_or_else(|| ServiceError::invalid_argument("schema_spec is required"))?,
        )?;
        let format = FormatCode::parse(&first.format)?;
        let schema = self.resolve_schema_definition(&tenant, &schema_spec).await?;
        let declared_size = if first.size > 0 { Some(first.size) } else { None };
        let first_content = first.content.clone();

        let prior = if is_update {
            let selector = conversions::tag_selector_from_wire(
                first.prior_version.clone().ok_or_else(|| ServiceError::invalid_argument("prior_version is required"))?,
            )?;
            validate::validate_prior_version(&selector, ObjectType::Data)?;
            let prior_tag = self.ctx.dal.load_prior_object(&tenant, &selector).await?;
            let prior_data = prior_tag
                .definition
                .as_data()
                .ok_or_else(|| ServiceError::invalid_argument("prior_version does not reference a DATA object"))?;

            match (&prior_data.schema, &schema_spec) {
                (SchemaSpec::Embedded(_), SchemaSpec::Embedded(_)) | (SchemaSpec::External(_), SchemaSpec::External(_)) => {}
                _ => {
                    return Err(ServiceError::failed_precondition(
                        "switching between embedded and external schema is not permitted",
                    ))
                }
            }
            let prior_schema = self.resolve_schema_definition(&tenant, &prior_data.schema).await?;
            prior_schema.is_compatible_update(&schema).map_err(ServiceError::failed_precondition)?;

            Some(prior_tag)
        } else {
            None
        };

        let frames = data_write_content_stream(first_content, rest);
        let schema_for_definition = schema_spec.clone();

        self.write_content_and_commit(
            &tenant,
            ObjectType::Data,
            prior.as_ref(),
            &tag_updates,
            ContentMode::Codec { source_format: format, schema: &schema },
            declared_size,
            frames,
            move || {
                ObjectDefinition::Data(DataDefinition {
                    schema: schema_for_definition,
                    storage_id: TagSelector::latest(ObjectType::Storage, String::new()),
                    parts: BTreeMap::new(),
                })
            },
        )
        .await
    }

    async fn create_or_update_file(&self, mut stream: Streaming<p::FileWriteRequest>, is_update: bool) -> ServiceResult<TagHeader> {
        let first = stream
            .message()
            .await
            .map_err(|e| ServiceError::invalid_argument(e.to_string()))?
            .ok_or_else(|| ServiceError::invalid_argument("empty request stream"))?;
        self.create_or_update_file_from_first(first, stream, is_update).await
    }

    /// See [`Self::create_or_update_dataset_from_first`]: same rationale, for
    /// FILE writes.
    pub async fn create_or_update_file_from_first(
        &self,
        first: p::FileWriteRequest,
        stream: impl Stream<Item = Result<p::FileWriteRequest, Status>> + Unpin + Send + 'static,
        is_update: bool,
    ) -> ServiceResult<TagHeader> {
        validate::validate_tenant(&first.tenant)?;
        let tenant = first.tenant.clone();

        let tag_updates = first
            .tag_updates
            .clone()
            .into_iter()
            .map(conversions::tag_update_from_wire)
            .collect::<Result<Vec<_>, _>>()?;
        validate::validate_client_tag_updates(&tag_updates)?;
        validate_file_name(&first.name)?;

        let extension = file_extension(&first.name);
        let declared_size = if first.size > 0 { Some(first.size) } else { None };
        let first_content = first.content.clone();
        let name = first.name.clone();
        let mime_type = first.mime_type.clone();
        let mime_type_for_definition = mime_type.clone();

        let prior = if is_update {
            let selector = conversions::tag_selector_from_wire(
                first.prior_version.clone().ok_or_else(|| ServiceError::invalid_argument("prior_version is required"))?,
            )?;
            validate::validate_prior_version(&selector, ObjectType::File)?;
            let prior_tag = self.ctx.dal.load_prior_object(&tenant, &selector).await?;
            let prior_file = prior_tag
                .definition
                .as_file()
                .ok_or_else(|| ServiceError::invalid_argument("prior_version does not reference a FILE object"))?;

            if prior_file.extension != extension {
                return Err(ServiceError::failed_precondition(format!(
                    "file extension cannot change from '{}' to '{}'",
                    prior_file.extension, extension
                )));
            }
            Some(prior_tag)
        } else {
            None
        };

        let frames = file_write_content_stream(first_content, stream);

        self.write_content_and_commit(
            &tenant,
            ObjectType::File,
            prior.as_ref(),
            &tag_updates,
            ContentMode::Raw { mime_type: &mime_type },
            declared_size,
            frames,
            move || {
                ObjectDefinition::File(FileDefinition {
                    name,
                    extension,
                    mime_type: mime_type_for_definition,
                    size: declared_size.unwrap_or_default(),
                    storage_id: TagSelector::latest(ObjectType::Storage, String::new()),
                    data_item: String::new(),
                })
            },
        )
        .await
    }
}

fn file_extension(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_string(),
        _ => String::new(),
    }
}

#[tonic::async_trait]
impl TracDataApi for DataService {
    #[instrument(skip(self, request))]
    async fn create_dataset(&self, request: Request<Streaming<p::DataWriteRequest>>) -> Result<Response<trac_proto::metadata::TagHeader>, Status> {
        let header = self.create_or_update_dataset(request.into_inner(), false).await?;
        Ok(Response::new(conversions::tag_header_to_wire(&header)))
    }

    #[instrument(skip(self, request))]
    async fn update_dataset(&self, request: Request<Streaming<p::DataWriteRequest>>) -> Result<Response<trac_proto::metadata::TagHeader>, Status> {
        let header = self.create_or_update_dataset(request.into_inner(), true).await?;
        Ok(Response::new(conversions::tag_header_to_wire(&header)))
    }

    type ReadDatasetStream = Pin<Box<dyn Stream<Item = Result<p::DataReadResponse, Status>> + Send>>;

    #[instrument(skip(self, request))]
    async fn read_dataset(&self, request: Request<p::DataReadRequest>) -> Result<Response<Self::ReadDatasetStream>, Status> {
        let req = request.into_inner();
        validate::validate_tenant(&req.tenant)?;
        let selector = conversions::tag_selector_from_wire(
            req.selector.ok_or_else(|| ServiceError::invalid_argument("selector is required"))?,
        )
        .map_err(ServiceError::from)?;

        let tag = self.ctx.dal.load_object(&req.tenant, &selector).await.map_err(ServiceError::from)?;
        let data = tag
            .definition
            .as_data()
            .ok_or_else(|| ServiceError::invalid_argument("selector does not reference a DATA object"))?;
        let schema = self.resolve_schema_definition(&req.tenant, &data.schema).await?;

        let (copy_path, storage_format) = self.locate_available_copy(&req.tenant, data).await?;
        let storage_format = FormatCode::parse(&storage_format).map_err(ServiceError::from)?;
        let output_format = if req.format.is_empty() { storage_format } else { FormatCode::parse(&req.format).map_err(ServiceError::from)? };

        let mut reader = self.ctx.store.reader(&copy_path).await.map_err(ServiceError::from)?;
        let mut stored_bytes = Vec::new();
        tokio::io::copy(&mut reader, &mut stored_bytes).await.map_err(|e| ServiceError::Internal(e.to_string()))?;

        let row_range = if req.limit > 0 { Some(RowRange { offset: req.offset as usize, limit: req.limit as usize }) } else { None };
        let frames = run_read(&schema, storage_format, output_format, &stored_bytes, row_range).await.map_err(ServiceError::from)?;

        let header_frame = p::DataReadResponse {
            schema: Some(conversions::schema_definition_to_wire(&schema)),
            content: Vec::new(),
        };
        let mut responses = vec![Ok(header_frame)];
        responses.extend(frames.into_iter().map(|bytes| Ok(p::DataReadResponse { schema: None, content: bytes.to_vec() })));

        Ok(Response::new(Box::pin(futures::stream::iter(responses))))
    }

    async fn create_file(&self, request: Request<Streaming<p::FileWriteRequest>>) -> Result<Response<trac_proto::metadata::TagHeader>, Status> {
        let header = self.create_or_update_file(request.into_inner(), false).await?;
        Ok(Response::new(conversions::tag_header_to_wire(&header)))
    }

    async fn update_file(&self, request: Request<Streaming<p::FileWriteRequest>>) -> Result<Response<trac_proto::metadata::TagHeader>, Status> {
        let header = self.create_or_update_file(request.into_inner(), true).await?;
        Ok(Response::new(conversions::tag_header_to_wire(&header)))
    }

    type ReadFileStream = Pin<Box<dyn Stream<Item = Result<p::FileReadResponse, Status>> + Send>>;

    #[instrument(skip(self, request))]
    async fn read_file(&self, request: Request<p::FileReadRequest>) -> Result<Response<Self::ReadFileStream>, Status> {
        let req = request.into_inner();
        validate::validate_tenant(&req.tenant)?;
        let selector = conversions::tag_selector_from_wire(
            req.selector.ok_or_else(|| ServiceError::invalid_argument("selector is required"))?,
        )
        .map_err(ServiceError::from)?;

        let tag = self.ctx.dal.load_object(&req.tenant, &selector).await.map_err(ServiceError::from)?;
        let file = tag
            .definition
            .as_file()
            .ok_or_else(|| ServiceError::invalid_argument("selector does not reference a FILE object"))?
            .clone();

        let (copy_path, _storage_format) = self.locate_file_copy(&req.tenant, &file).await?;
        let reader = self.ctx.store.reader(&copy_path).await.map_err(ServiceError::from)?;

        let header_frame = p::FileReadResponse {
            file_definition: Some(conversions::file_definition_to_wire(&file)),
            content: Vec::new(),
        };

        let body = tokio_util::io::ReaderStream::new(reader).map(|chunk| {
            chunk
                .map(|bytes| p::FileReadResponse { file_definition: None, content: bytes.to_vec() })
                .map_err(|e| Status::internal(e.to_string()))
        });

        let stream = futures::stream::once(async move { Ok(header_frame) }).chain(body);
        Ok(Response::new(Box::pin(stream)))
    }
}

impl DataService {
    async fn locate_available_copy(&self, tenant: &str, data: &DataDefinition) -> ServiceResult<(String, String)> {
        let storage_tag = self.ctx.dal.load_object(tenant, &data.storage_id).await?;
        let storage = match storage_tag.definition {
            ObjectDefinition::Storage(s) => s,
            _ => return Err(ServiceError::Internal("storageId did not resolve to a STORAGE object".to_string())),
        };
        // Resolve through `parts`, not a blind scan of every data item ever
        // written into this STORAGE object: the STORAGE object accumulates
        // one entry per version ever committed against it, so picking "any"
        // available copy would non-deterministically return a stale
        // version's bytes instead of this DATA version's own.
        let data_item = data
            .parts
            .values()
            .flat_map(|part| part.snap.deltas.iter())
            .max_by_key(|delta| delta.delta_index)
            .map(|delta| delta.data_item.as_str())
            .ok_or_else(|| ServiceError::NotFound("data definition has no parts".to_string()))?;
        let item = storage
            .data_items
            .get(data_item)
            .and_then(|item| item.first_available_copy())
            .ok_or_else(|| ServiceError::NotFound("no available copy for this data item".to_string()))?;
        Ok((item.storage_path.clone(), item.storage_format.clone()))
    }

    async fn locate_file_copy(&self, tenant: &str, file: &FileDefinition) -> ServiceResult<(String, String)> {
        let storage_tag = self.ctx.dal.load_object(tenant, &file.storage_id).await?;
        let storage = match storage_tag.definition {
            ObjectDefinition::Storage(s) => s,
            _ => return Err(ServiceError::Internal("storageId did not resolve to a STORAGE object".to_string())),
        };
        let item = storage
            .data_items
            .get(&file.data_item)
            .and_then(|item| item.first_available_copy())
            .ok_or_else(|| ServiceError::NotFound("no available copy for this file".to_string()))?;
        Ok((item.storage_path.clone(), item.storage_format.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use trac_metadata_dal::InMemoryMetadataDal;
    use trac_models::{BasicType, FieldSchema, SchemaType, TableSchema};
    use trac_storage::LocalFsStore;

    fn schema() -> SchemaDefinition {
        SchemaDefinition {
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
        }
    }

    fn service(tmp: &std::path::Path) -> DataService {
        let dal = Arc::new(InMemoryMetadataDal::new());
        let store = Arc::new(LocalFsStore::new(tmp.to_path_buf()));
        DataService::new(ServiceContext::new(dal, store))
    }

    fn write_request(tenant: &str, csv: &[u8]) -> p::DataWriteRequest {
        p::DataWriteRequest {
            tenant: tenant.to_string(),
            prior_version: None,
            tag_updates: vec![],
            schema_spec: Some(conversions::schema_spec_to_wire(&SchemaSpec::Embedded(schema()))),
            format: "text/csv".to_string(),
            size: csv.len() as u64,
            content: csv.to_vec(),
        }
    }

    /// `tonic::Streaming` cannot be constructed outside a real gRPC
    /// transport, so tests drive `create_or_update_dataset_from_first`
    /// directly: the first frame plus an empty tail stream, exactly what the
    /// public RPC handler extracts before delegating to it.
    fn empty_rest() -> impl Stream<Item = Result<p::DataWriteRequest, Status>> + Unpin + Send + 'static {
        futures::stream::empty()
    }

    #[tokio::test]
    async fn create_dataset_round_trips_through_read() {
        let tmp = tempfile::tempdir().unwrap();
        let svc = service(tmp.path());

        let csv = b"a\n1\n2\n3\n".to_vec();
        let header = svc
            .create_or_update_dataset_from_first(write_request("acme", &csv), empty_rest(), false)
            .await
            .unwrap();
        assert_eq!(header.object_version, 1);

        let tag = svc.ctx.dal.load_object("acme", &trac_models::TagSelector::pinned(&header)).await.unwrap();
        let data = tag.definition.as_data().unwrap();
        assert_eq!(data.parts.len(), 1);
        assert!(matches!(data.schema, SchemaSpec::Embedded(_)));
    }

    #[tokio::test]
    async fn update_dataset_reads_back_the_new_version_not_the_old_one() {
        let tmp = tempfile::tempdir().unwrap();
        let svc = service(tmp.path());

        let v1_csv = b"a\n1\n2\n3\n".to_vec();
        let v1_header = svc
            .create_or_update_dataset_from_first(write_request("acme", &v1_csv), empty_rest(), false)
            .await
            .unwrap();

        let v2_csv = b"a\n40\n50\n".to_vec();
        let mut update_req = write_request("acme", &v2_csv);
        update_req.prior_version = Some(conversions::tag_selector_to_wire(&trac_models::TagSelector::pinned(&v1_header)));
        let v2_header = svc
            .create_or_update_dataset_from_first(update_req, empty_rest(), true)
            .await
            .unwrap();
        assert_eq!(v2_header.object_version, 2);

        let v2_tag = svc.ctx.dal.load_object("acme", &trac_models::TagSelector::pinned(&v2_header)).await.unwrap();
        let v2_data = v2_tag.definition.as_data().unwrap();
        let (path, _) = svc.locate_available_copy("acme", v2_data).await.unwrap();
        assert!(path.contains("delta-1"), "v2 read should resolve the v2 delta, got {path}");

        let v1_tag = svc.ctx.dal.load_object("acme", &trac_models::TagSelector::pinned(&v1_header)).await.unwrap();
        let v1_data = v1_tag.definition.as_data().unwrap();
        let (path, _) = svc.locate_available_copy("acme", v1_data).await.unwrap();
        assert!(path.contains("delta-0"), "v1 read should still resolve the v1 delta, got {path}");
    }

    #[tokio::test]
    async fn declared_size_mismatch_is_data_loss() {
        let tmp = tempfile::tempdir().unwrap();
        let svc = service(tmp.path());

        let csv = b"a\n1\n2\n3\n".to_vec();
        let mut req = write_request("acme", &csv);
        req.size = csv.len() as u64 + 5;

        let err = svc.create_or_update_dataset_from_first(req, empty_rest(), false).await.unwrap_err();
        assert!(matches!(err, ServiceError::DataLoss(_)));
    }

    fn empty_file_rest() -> impl Stream<Item = Result<p::FileWriteRequest, Status>> + Unpin + Send + 'static {
        futures::stream::empty()
    }

    #[tokio::test]
    async fn file_round_trips_byte_exact_through_read() {
        let tmp = tempfile::tempdir().unwrap();
        let svc = service(tmp.path());

        let content = b"hello trac\x00\x01\xffworld".to_vec();
        let req = p::FileWriteRequest {
            tenant: "acme".to_string(),
            prior_version: None,
            tag_updates: vec![],
            name: "report.txt".to_string(),
            mime_type: "text/plain".to_string(),
            size: content.len() as u64,
            content: content.clone(),
        };
        let header = svc.create_or_update_file_from_first(req, empty_file_rest(), false).await.unwrap();
        assert_eq!(header.object_version, 1);

        let read_req = Request::new(p::FileReadRequest {
            tenant: "acme".to_string(),
            selector: Some(conversions::tag_selector_to_wire(&trac_models::TagSelector::pinned(&header))),
        });
        let mut stream = TracDataApi::read_file(&svc, read_req).await.unwrap().into_inner();
        let mut frames = Vec::new();
        while let Some(frame) = stream.next().await {
            frames.push(frame.unwrap());
        }
        assert!(frames[0].file_definition.is_some());
        assert!(frames[0].content.is_empty());
        let body: Vec<u8> = frames[1..].iter().flat_map(|f| f.content.clone()).collect();
        assert_eq!(body, content);
    }
}
