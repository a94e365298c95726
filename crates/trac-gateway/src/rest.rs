//! Hand-written REST↔gRPC bridge. Every handler here builds the same
//! request message the gRPC entrypoint would have received,
//! calls the service trait method directly (in-process, no second network
//! hop), and renders the response back to JSON. `trac_models` wire types
//! already derive `Serialize`/`Deserialize`, so most bodies are just those
//! types plus `trac_proto::conversions` at the model↔wire boundary --
//! there's no separate protobuf-JSON shadow schema to maintain.
//!
//! The streaming Data API is bridged onto unary REST: a write is one JSON
//! body with a single base64-encoded content field (the same convention
//! protobuf canonical JSON uses for `bytes` fields), and a read concatenates
//! every response frame's content into one body.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tonic::{Request, Status};

use futures::StreamExt;

use trac_data_svc::{AdminService, DataService, MetadataService};
use trac_models::{ObjectCriteria, ObjectDefinition, ObjectType, SchemaSpec, Tag, TagCriteria, TagHeader, TagSelector, TagUpdate};
use trac_proto::admin as ap;
use trac_proto::admin::trac_admin_api_server::TracAdminApi;
use trac_proto::conversions;
use trac_proto::data as dp;
use trac_proto::data::trac_data_api_server::TracDataApi;
use trac_proto::metadata as mp;
use trac_proto::metadata::trac_metadata_api_server::TracMetadataApi;

use crate::error::GatewayError;
use crate::translator;

pub struct AppState {
    pub metadata: Arc<MetadataService>,
    pub data: Arc<DataService>,
    pub admin: Arc<AdminService>,
}

/// Mounts every built-in REST route under `api_prefix` (/// `{apiPrefix}{restPrefix}/`). The concrete path templates here must track
/// [`crate::routes::RouteTable`]'s built-in entries one for one.
pub fn router(state: Arc<AppState>, api_prefix: &str) -> Router {
    let api = Router::new()
        .route("/v1/{tenant}/metadata", post(create_object))
        .route("/v1/{tenant}/metadata/batch", post(create_object_batch))
        .route("/v1/{tenant}/metadata/batch/read", post(read_batch))
        .route("/v1/{tenant}/metadata/search", post(search))
        .route("/v1/{tenant}/metadata/{object_type}/{object_id}", post(update_object))
        .route("/v1/{tenant}/metadata/{object_type}/{object_id}/versions/{object_version}/tag", post(update_tag))
        .route(
            "/v1/{tenant}/metadata/{object_type}/{object_id}/versions/{object_version}/tags/{tag_version}",
            get(read_object),
        )
        .route("/v1/{tenant}/data/dataset", post(create_dataset))
        .route("/v1/{tenant}/data/dataset/{object_id}", post(update_dataset))
        .route("/v1/{tenant}/data/dataset/{object_id}/versions/{object_version}", get(read_dataset))
        .route("/v1/{tenant}/data/file", post(create_file))
        .route("/v1/{tenant}/data/file/{object_id}", post(update_file))
        .route("/v1/{tenant}/data/file/{object_id}/versions/{object_version}", get(read_file))
        .route("/v1/trac-admin/tenants", post(create_tenant).get(list_tenants))
        .route("/v1/trac-admin/{tenant}/config/{config_key}", post(set_config).get(get_config))
        .with_state(state);

    Router::new().nest(api_prefix, api)
}

const OBJECT_TYPE_VARIANTS: [&str; 8] = ["DATA", "FILE", "STORAGE", "SCHEMA", "MODEL", "FLOW", "JOB", "CUSTOM"];
const OBJECT_TYPES: [ObjectType; 8] = [
    ObjectType::Data,
    ObjectType::File,
    ObjectType::Storage,
    ObjectType::Schema,
    ObjectType::Model,
    ObjectType::Flow,
    ObjectType::Job,
    ObjectType::Custom,
];

fn parse_object_type(field: &str, raw: &str) -> Result<ObjectType, GatewayError> {
    let idx = translator::coerce_enum(field, raw, &OBJECT_TYPE_VARIANTS)?;
    Ok(OBJECT_TYPES[idx])
}

fn parse_version(field: &str, raw: &str) -> Result<u32, GatewayError> {
    let v = translator::coerce_i32(field, raw)?;
    u32::try_from(v).map_err(|_| GatewayError::bad_request(format!("field '{field}' must be non-negative")))
}

fn status_err(status: Status) -> GatewayError {
    GatewayError::from(status)
}

// ---- metadata -------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct WriteObjectBody {
    definition: ObjectDefinition,
    #[serde(default)]
    tag_updates: Vec<TagUpdate>,
}

async fn create_object(
    State(state): State<Arc<AppState>>,
    Path(tenant): Path<String>,
    Json(body): Json<WriteObjectBody>,
) -> Result<Json<TagHeader>, GatewayError> {
    let req = mp::MetadataWriteRequest {
        tenant,
        definition: Some(conversions::object_definition_to_wire(&body.definition)),
        tag_updates: body.tag_updates.iter().map(conversions::tag_update_to_wire).collect(),
        prior_version: None,
    };
    let header = state.metadata.create_object(Request::new(req)).await.map_err(status_err)?.into_inner();
    Ok(Json(conversions::tag_header_from_wire(header)?))
}

#[derive(Debug, Deserialize)]
struct UpdateObjectBody {
    definition: ObjectDefinition,
    #[serde(default)]
    tag_updates: Vec<TagUpdate>,
    prior_version: TagSelector,
}

async fn update_object(
    State(state): State<Arc<AppState>>,
    Path((tenant, object_type, object_id)): Path<(String, String, String)>,
    Json(body): Json<UpdateObjectBody>,
) -> Result<Json<TagHeader>, GatewayError> {
    let path_type = parse_object_type("object_type", &object_type)?;
    if path_type != body.prior_version.object_type || object_id != body.prior_version.object_id {
        return Err(GatewayError::bad_request("path object_type/object_id must match priorVersion"));
    }

    let req = mp::MetadataWriteRequest {
        tenant,
        definition: Some(conversions::object_definition_to_wire(&body.definition)),
        tag_updates: body.tag_updates.iter().map(conversions::tag_update_to_wire).collect(),
        prior_version: Some(conversions::tag_selector_to_wire(&body.prior_version)),
    };
    let header = state.metadata.update_object(Request::new(req)).await.map_err(status_err)?.into_inner();
    Ok(Json(conversions::tag_header_from_wire(header)?))
}

#[derive(Debug, Deserialize)]
struct UpdateTagBody {
    #[serde(default)]
    tag_updates: Vec<TagUpdate>,
}

async fn update_tag(
    State(state): State<Arc<AppState>>,
    Path((tenant, object_type, object_id, object_version)): Path<(String, String, String, String)>,
    Json(body): Json<UpdateTagBody>,
) -> Result<Json<TagHeader>, GatewayError> {
    let object_type = parse_object_type("object_type", &object_type)?;
    let object_version = parse_version("object_version", &object_version)?;

    let selector = TagSelector {
        object_type,
        object_id,
        object_criteria: ObjectCriteria::Version(object_version),
        tag_criteria: TagCriteria::LatestTag,
    };
    let req = mp::MetadataUpdateTagRequest {
        tenant,
        selector: Some(conversions::tag_selector_to_wire(&selector)),
        tag_updates: body.tag_updates.iter().map(conversions::tag_update_to_wire).collect(),
    };
    let header = state.metadata.update_tag(Request::new(req)).await.map_err(status_err)?.into_inner();
    Ok(Json(conversions::tag_header_from_wire(header)?))
}

async fn read_object(
    State(state): State<Arc<AppState>>,
    Path((tenant, object_type, object_id, object_version, tag_version)): Path<(String, String, String, String, String)>,
) -> Result<Json<Tag>, GatewayError> {
    let object_type = parse_object_type("object_type", &object_type)?;
    let object_version = parse_version("object_version", &object_version)?;
    let tag_version = parse_version("tag_version", &tag_version)?;

    let selector = TagSelector {
        object_type,
        object_id,
        object_criteria: ObjectCriteria::Version(object_version),
        tag_criteria: TagCriteria::Version(tag_version),
    };
    let req = mp::MetadataReadRequest { tenant, selector: Some(conversions::tag_selector_to_wire(&selector)) };
    let tag = state.metadata.read_object(Request::new(req)).await.map_err(status_err)?.into_inner();
    Ok(Json(conversions::tag_from_wire(tag)?))
}

#[derive(Debug, Deserialize)]
struct ReadBatchBody {
    selectors: Vec<TagSelector>,
}

async fn read_batch(
    State(state): State<Arc<AppState>>,
    Path(tenant): Path<String>,
    Json(body): Json<ReadBatchBody>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let req = mp::MetadataReadBatchRequest {
        tenant,
        selectors: body.selectors.iter().map(conversions::tag_selector_to_wire).collect(),
    };
    let resp = state.metadata.read_batch(Request::new(req)).await.map_err(status_err)?.into_inner();
    let tags = resp.tags.into_iter().map(conversions::tag_from_wire).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(json!({ "tags": tags })))
}

#[derive(Debug, Deserialize)]
struct CreateObjectBatchBody {
    requests: Vec<WriteObjectBody>,
}

async fn create_object_batch(
    State(state): State<Arc<AppState>>,
    Path(tenant): Path<String>,
    Json(body): Json<CreateObjectBatchBody>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let req = mp::MetadataWriteBatchRequest {
        tenant,
        requests: body
            .requests
            .iter()
            .map(|r| mp::MetadataWriteRequest {
                tenant: String::new(),
                definition: Some(conversions::object_definition_to_wire(&r.definition)),
                tag_updates: r.tag_updates.iter().map(conversions::tag_update_to_wire).collect(),
                prior_version: None,
            })
            .collect(),
    };
    let resp = state.metadata.create_object_batch(Request::new(req)).await.map_err(status_err)?.into_inner();
    let headers = resp.headers.into_iter().map(conversions::tag_header_from_wire).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(json!({ "headers": headers })))
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    object_type: String,
    search_expression: String,
}

async fn search(
    State(state): State<Arc<AppState>>,
    Path(tenant): Path<String>,
    Json(body): Json<SearchBody>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let object_type = parse_object_type("object_type", &body.object_type)?;
    let req = mp::MetadataSearchRequest {
        tenant,
        object_type: conversions::object_type_to_wire(object_type),
        search_expression: body.search_expression,
    };
    // Always returns UNIMPLEMENTED today; the gRPC-status table maps it to
    // the same 500 a real query-execution failure would produce.
    let resp = state.metadata.search(Request::new(req)).await.map_err(status_err)?.into_inner();
    let results = resp.results.into_iter().map(conversions::tag_header_from_wire).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(json!({ "results": results })))
}

// ---- data -------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CreateDataBody {
    schema_spec: SchemaSpec,
    #[serde(default)]
    format: String,
    #[serde(default)]
    tag_updates: Vec<TagUpdate>,
    content_base64: String,
}

fn decode_content(field: &str, raw: &str) -> Result<Vec<u8>, GatewayError> {
    BASE64.decode(raw).map_err(|e| GatewayError::bad_request(format!("field '{field}' is not valid base64: {e}")))
}

async fn create_dataset(
    State(state): State<Arc<AppState>>,
    Path(tenant): Path<String>,
    Json(body): Json<CreateDataBody>,
) -> Result<Json<TagHeader>, GatewayError> {
    let content = decode_content("contentBase64", &body.content_base64)?;
    let req = dp::DataWriteRequest {
        tenant,
        prior_version: None,
        tag_updates: body.tag_updates.iter().map(conversions::tag_update_to_wire).collect(),
        schema_spec: Some(conversions::schema_spec_to_wire(&body.schema_spec)),
        format: body.format,
        size: content.len() as u64,
        content,
    };
    let header = state
        .data
        .create_or_update_dataset_from_first(req, futures::stream::empty(), false)
        .await
        .map_err(Status::from)
        .map_err(status_err)?;
    Ok(Json(header))
}

#[derive(Debug, Deserialize)]
struct UpdateDataBody {
    schema_spec: SchemaSpec,
    #[serde(default)]
    format: String,
    #[serde(default)]
    tag_updates: Vec<TagUpdate>,
    prior_version: TagSelector,
    content_base64: String,
}

async fn update_dataset(
    State(state): State<Arc<AppState>>,
    Path((tenant, object_id)): Path<(String, String)>,
    Json(body): Json<UpdateDataBody>,
) -> Result<Json<TagHeader>, GatewayError> {
    if object_id != body.prior_version.object_id {
        return Err(GatewayError::bad_request("path object_id must match priorVersion.objectId"));
    }
    let content = decode_content("contentBase64", &body.content_base64)?;
    let req = dp::DataWriteRequest {
        tenant,
        prior_version: Some(conversions::tag_selector_to_wire(&body.prior_version)),
        tag_updates: body.tag_updates.iter().map(conversions::tag_update_to_wire).collect(),
        schema_spec: Some(conversions::schema_spec_to_wire(&body.schema_spec)),
        format: body.format,
        size: content.len() as u64,
        content,
    };
    let header = state
        .data
        .create_or_update_dataset_from_first(req, futures::stream::empty(), true)
        .await
        .map_err(Status::from)
        .map_err(status_err)?;
    Ok(Json(header))
}

#[derive(Debug, Deserialize, Default)]
struct DataReadQuery {
    format: Option<String>,
    tag_version: Option<u32>,
    offset: Option<u64>,
    limit: Option<u64>,
}

async fn read_dataset(
    State(state): State<Arc<AppState>>,
    Path((tenant, object_id, object_version)): Path<(String, String, String)>,
    Query(query): Query<DataReadQuery>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let object_version = parse_version("object_version", &object_version)?;
    let tag_criteria = match query.tag_version {
        Some(v) => TagCriteria::Version(v),
        None => TagCriteria::LatestTag,
    };
    let selector =
        TagSelector { object_type: ObjectType::Data, object_id, object_criteria: ObjectCriteria::Version(object_version), tag_criteria };

    let req = dp::DataReadRequest {
        tenant,
        selector: Some(conversions::tag_selector_to_wire(&selector)),
        format: query.format.unwrap_or_default(),
        offset: query.offset.unwrap_or(0),
        limit: query.limit.unwrap_or(0),
    };
    let mut stream = state.data.read_dataset(Request::new(req)).await.map_err(status_err)?.into_inner();

    let mut schema = None;
    let mut content = Vec::new();
    while let Some(frame) = stream.next().await {
        let frame = frame.map_err(status_err)?;
        if let Some(wire_schema) = frame.schema {
            schema = Some(conversions::schema_definition_from_wire(wire_schema)?);
        }
        content.extend_from_slice(&frame.content);
    }

    Ok(Json(json!({
        "schema": schema,
        "contentBase64": BASE64.encode(content),
    })))
}

#[derive(Debug, Deserialize)]
struct CreateFileBody {
    name: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    tag_updates: Vec<TagUpdate>,
    content_base64: String,
}

async fn create_file(
    State(state): State<Arc<AppState>>,
    Path(tenant): Path<String>,
    Json(body): Json<CreateFileBody>,
) -> Result<Json<TagHeader>, GatewayError> {
    let content = decode_content("contentBase64", &body.content_base64)?;
    let req = dp::FileWriteRequest {
        tenant,
        prior_version: None,
        tag_updates: body.tag_updates.iter().map(conversions::tag_update_to_wire).collect(),
        name: body.name,
        mime_type: body.mime_type,
        size: content.len() as u64,
        content,
    };
    let header = state
        .data
        .create_or_update_file_from_first(req, futures::stream::empty(), false)
        .await
        .map_err(Status::from)
        .map_err(status_err)?;
    Ok(Json(header))
}

#[derive(Debug, Deserialize)]
struct UpdateFileBody {
    name: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    tag_updates: Vec<TagUpdate>,
    prior_version: TagSelector,
    content_base64: String,
}

async fn update_file(
    State(state): State<Arc<AppState>>,
    Path((tenant, object_id)): Path<(String, String)>,
    Json(body): Json<UpdateFileBody>,
) -> Result<Json<TagHeader>, GatewayError> {
    if object_id != body.prior_version.object_id {
        return Err(GatewayError::bad_request("path object_id must match priorVersion.objectId"));
    }
    let content = decode_content("contentBase64", &body.content_base64)?;
    let req = dp::FileWriteRequest {
        tenant,
        prior_version: Some(conversions::tag_selector_to_wire(&body.prior_version)),
        tag_updates: body.tag_updates.iter().map(conversions::tag_update_to_wire).collect(),
        name: body.name,
        mime_type: body.mime_type,
        size: content.len() as u64,
        content,
    };
    let header = state
        .data
        .create_or_update_file_from_first(req, futures::stream::empty(), true)
        .await
        .map_err(Status::from)
        .map_err(status_err)?;
    Ok(Json(header))
}

async fn read_file(
    State(state): State<Arc<AppState>>,
    Path((tenant, object_id, object_version)): Path<(String, String, String)>,
    Query(query): Query<DataReadQuery>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let object_version = parse_version("object_version", &object_version)?;
    let tag_criteria = match query.tag_version {
        Some(v) => TagCriteria::Version(v),
        None => TagCriteria::LatestTag,
    };
    let selector =
        TagSelector { object_type: ObjectType::File, object_id, object_criteria: ObjectCriteria::Version(object_version), tag_criteria };

    let req = dp::FileReadRequest { tenant, selector: Some(conversions::tag_selector_to_wire(&selector)) };
    let mut stream = state.data.read_file(Request::new(req)).await.map_err(status_err)?.into_inner();

    let mut file_definition = None;
    let mut content = Vec::new();
    while let Some(frame) = stream.next().await {
        let frame = frame.map_err(status_err)?;
        if let Some(wire_def) = frame.file_definition {
            file_definition = Some(conversions::file_definition_from_wire(wire_def)?);
        }
        content.extend_from_slice(&frame.content);
    }

    Ok(Json(json!({
        "fileDefinition": file_definition,
        "contentBase64": BASE64.encode(content),
    })))
}

// ---- admin -------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct TenantBody {
    tenant_code: String,
    #[serde(default)]
    description: String,
}

impl From<ap::Tenant> for TenantBody {
    fn from(t: ap::Tenant) -> Self {
        TenantBody { tenant_code: t.tenant_code, description: t.description }
    }
}

async fn create_tenant(State(state): State<Arc<AppState>>, Json(body): Json<TenantBody>) -> Result<Json<TenantBody>, GatewayError> {
    let tenant = ap::Tenant { tenant_code: body.tenant_code, description: body.description };
    let saved = state
        .admin
        .create_tenant(Request::new(ap::CreateTenantRequest { tenant: Some(tenant) }))
        .await
        .map_err(status_err)?
        .into_inner();
    Ok(Json(saved.into()))
}

async fn list_tenants(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, GatewayError> {
    let resp = state.admin.list_tenants(Request::new(ap::ListTenantsRequest {})).await.map_err(status_err)?.into_inner();
    let tenants: Vec<TenantBody> = resp.tenants.into_iter().map(TenantBody::from).collect();
    Ok(Json(json!({ "tenants": tenants })))
}

#[derive(Debug, Deserialize)]
struct SetConfigBody {
    config_value: String,
}

async fn set_config(
    State(state): State<Arc<AppState>>,
    Path((tenant, config_key)): Path<(String, String)>,
    Json(body): Json<SetConfigBody>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let entry = ap::ConfigEntry { tenant, config_key, config_value: body.config_value };
    let saved = state
        .admin
        .set_config(Request::new(ap::SetConfigRequest { entry: Some(entry) }))
        .await
        .map_err(status_err)?
        .into_inner();
    Ok(Json(json!({ "tenant": saved.tenant, "configKey": saved.config_key, "configValue": saved.config_value })))
}

async fn get_config(
    State(state): State<Arc<AppState>>,
    Path((tenant, config_key)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let entry = state
        .admin
        .get_config(Request::new(ap::GetConfigRequest { tenant, config_key }))
        .await
        .map_err(status_err)?
        .into_inner();
    Ok(Json(json!({ "tenant": entry.tenant, "configKey": entry.config_key, "configValue": entry.config_value })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use tower::ServiceExt;
    use trac_metadata_dal::InMemoryMetadataDal;
    use trac_storage::LocalFsStore;

    /// Returns the app state plus the backing tempdir's guard; the guard
    /// must outlive the test or the on-disk store vanishes mid-test.
    fn state() -> (Arc<AppState>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let dal = Arc::new(InMemoryMetadataDal::new());
        let store = Arc::new(LocalFsStore::new(tmp.path().to_path_buf()));
        let ctx = trac_data_svc::ServiceContext::new(dal.clone(), store);
        let state = Arc::new(AppState {
            metadata: Arc::new(MetadataService::new(dal)),
            data: Arc::new(DataService::new(ctx)),
            admin: Arc::new(AdminService::new()),
        });
        (state, tmp)
    }

    #[tokio::test]
    async fn create_tenant_then_list_round_trips_over_http() {
        let (app_state, _tmp) = state();
        let app = router(app_state, "/trac-api");

        let create = HttpRequest::builder()
            .method("POST")
            .uri("/trac-api/v1/trac-admin/tenants")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"tenant_code":"acme","description":"Acme"}"#))
            .unwrap();
        let resp = app.clone().oneshot(create).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let list = HttpRequest::builder().method("GET").uri("/trac-api/v1/trac-admin/tenants").body(Body::empty()).unwrap();
        let resp = app.oneshot(list).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["tenants"][0]["tenant_code"], "acme");
    }

    #[tokio::test]
    async fn create_dataset_then_read_round_trips_over_http() {
        let (app_state, _tmp) = state();
        let app = router(app_state, "/trac-api");

        let csv = BASE64.encode(b"a\n1\n2\n3\n");
        let schema_spec = serde_json::json!({
            "Embedded": {
                "schema_type": "TABLE",
                "table": {
                    "fields": [{
                        "field_name": "a",
                        "field_order": 0,
                        "field_type": "INTEGER",
                        "business_key": false,
                        "categorical": false,
                        "nullable": true,
                        "label": null,
                        "format_code": null,
                    }]
                }
            }
        });
        let create = HttpRequest::builder()
            .method("POST")
            .uri("/trac-api/v1/acme/data/dataset")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({
                    "schema_spec": schema_spec,
                    "format": "csv",
                    "content_base64": csv,
                })
                .to_string(),
            ))
            .unwrap();
        let resp = app.clone().oneshot(create).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let header: TagHeader = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(header.object_version, 1);

        let read = HttpRequest::builder()
            .method("GET")
            .uri(format!("/trac-api/v1/acme/data/dataset/{}/versions/1", header.object_id))
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(read).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_tenant_config_is_404() {
        let (app_state, _tmp) = state();
        let app = router(app_state, "/trac-api");
        let req = HttpRequest::builder().method("GET").uri("/trac-api/v1/trac-admin/ghost/config/k").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
