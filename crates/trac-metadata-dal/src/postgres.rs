//! Postgres-backed [`MetadataDal`], grounded on the query style of
//! `agent-sql`: hand-written SQL, `sqlx::Transaction` for each write,
//! optimistic concurrency via unique constraints mapped onto ALREADY_EXISTS.
//!
//! Unlike `agent-sql`'s use of `sqlx::query!`/`query_as!` (which require a
//! live database or a checked-in `.sqlx` offline cache at compile time),
//! this DAL uses the runtime-checked `sqlx::query`/`query_as` forms so the
//! crate can be built against any reachable Postgres without a prepared
//! query cache.

use chrono::{DateTime, Utc};
use serde_json::Value as Json;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use trac_models::{ObjectDefinition, ObjectType, Tag, TagHeader, TagSelector};

use crate::dal::MetadataDal;
use crate::error::{DalError, DalResult};
use crate::resolve::{self, ObjectVersionRow, TagVersionRow};

/// The DDL this backend expects. Exposed so callers (or a migration runner
/// in `tracd`) can provision a fresh tenant database; this crate does not
/// run migrations itself.
pub const SCHEMA_SQL: &str = include_str!("schema.sql");

pub struct PgMetadataDal {
    pool: PgPool,
}

impl PgMetadataDal {
    pub fn new(pool: PgPool) -> Self {
        PgMetadataDal { pool }
    }

    async fn object_type_of(
        txn: &mut Transaction<'_, Postgres>,
        tenant: &str,
        object_id: &str,
    ) -> DalResult<Option<String>> {
        let row = sqlx::query(
            "select object_type from object where tenant_id = $1 and object_id = $2",
        )
        .bind(tenant)
        .bind(object_id)
        .fetch_optional(&mut **txn)
        .await?;
        Ok(row.map(|r| r.get::<String, _>("object_type")))
    }
}

#[async_trait::async_trait]
impl MetadataDal for PgMetadataDal {
    #[instrument(skip(self, tag))]
    async fn save_new_object(&self, tenant: &str, mut tag: Tag) -> DalResult<TagHeader> {
        let now = Utc::now();
        // Honor an id reserved earlier via `preallocate_id` (already present
        // in the `object` table), rather than always minting a fresh one.
        let object_id = if tag.header.object_id.is_empty() {
            trac_models::new_object_id()
        } else {
            tag.header.object_id.clone()
        };
        tag.header = TagHeader::new_object(tag.definition.object_type(), now);
        tag.header.object_id = object_id;

        let mut txn = self.pool.begin().await?;

        sqlx::query(
            "insert into object (tenant_id, object_id, object_type) values ($1, $2, $3) \
             on conflict (tenant_id, object_id) do nothing",
        )
        .bind(tenant)
        .bind(&tag.header.object_id)
        .bind(tag.header.object_type.to_string())
        .execute(&mut *txn)
        .await?;

        // `object_definition`'s primary key (tenant, id, version) rejects a
        // second version-1 insert for the same id, giving ALREADY_EXISTS on
        // a concurrent create without a separate existence check here.
        insert_version_and_tag(&mut txn, tenant, &tag).await?;
        txn.commit().await?;
        Ok(tag.header)
    }

    #[instrument(skip(self, tag))]
    async fn save_new_version(&self, tenant: &str, mut tag: Tag) -> DalResult<TagHeader> {
        let mut txn = self.pool.begin().await?;

        let existing_type = Self::object_type_of(&mut txn, tenant, &tag.header.object_id)
            .await?
            .ok_or_else(|| {
                DalError::NotFound(format!("object {} has no prior version", tag.header.object_id))
            })?;

        if existing_type != tag.definition.object_type().to_string() {
            return Err(DalError::InvalidArgument(format!(
                "object {} changed objectType from {} to {}",
                tag.header.object_id,
                existing_type,
                tag.definition.object_type()
            )));
        }

        let row = sqlx::query(
            "select object_version, object_timestamp from object_definition \
             where tenant_id = $1 and object_id = $2 order by object_version desc limit 1",
        )
        .bind(tenant)
        .bind(&tag.header.object_id)
        .fetch_one(&mut *txn)
        .await?;
        let prior_version: i32 = row.get("object_version");
        let prior_timestamp: DateTime<Utc> = row.get("object_timestamp");

        let prior_header = TagHeader {
            object_type: tag.definition.object_type(),
            object_id: tag.header.object_id.clone(),
            object_version: prior_version as u32,
            tag_version: 0,
            object_timestamp: prior_timestamp,
            tag_timestamp: prior_timestamp,
        };
        tag.header = prior_header.next_object_header(Utc::now());

        insert_version_and_tag(&mut txn, tenant, &tag).await?;
        txn.commit().await?;
        Ok(tag.header)
    }

    #[instrument(skip(self, tag))]
    async fn save_new_tag(&self, tenant: &str, mut tag: Tag) -> DalResult<TagHeader> {
        let mut txn = self.pool.begin().await?;

        let row = sqlx::query(
            "select tag_version, tag_timestamp, definition, object_timestamp \
             from tag join object_definition using (tenant_id, object_id, object_version) \
             where tag.tenant_id = $1 and tag.object_id = $2 and tag.object_version = $3 \
             order by tag_version desc limit 1",
        )
        .bind(tenant)
        .bind(&tag.header.object_id)
        .bind(tag.header.object_version as i32)
        .fetch_one(&mut *txn)
        .await?;

        let prior_tag_version: i32 = row.get("tag_version");
        let prior_tag_timestamp: DateTime<Utc> = row.get("tag_timestamp");
        let object_timestamp: DateTime<Utc> = row.get("object_timestamp");
        let definition_json: Json = row.get("definition");
        let definition: ObjectDefinition = serde_json::from_value(definition_json)
            .map_err(|e| DalError::Internal(format!("corrupt stored definition: {e}")))?;

        let prior_header = TagHeader {
            object_type: tag.definition.object_type(),
            object_id: tag.header.object_id.clone(),
            object_version: tag.header.object_version,
            tag_version: prior_tag_version as u32,
            object_timestamp,
            tag_timestamp: prior_tag_timestamp,
        };
        tag.header = prior_header.next_tag_header(Utc::now());
        tag.definition = definition;

        insert_tag_only(&mut txn, tenant, &tag).await?;
        txn.commit().await?;
        Ok(tag.header)
    }

    #[instrument(skip(self))]
    async fn load_object(&self, tenant: &str, selector: &TagSelector) -> DalResult<Tag> {
        let version_rows = sqlx::query(
            "select object_version, object_timestamp from object_definition \
             where tenant_id = $1 and object_id = $2",
        )
        .bind(tenant)
        .bind(&selector.object_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|r| ObjectVersionRow {
            object_version: r.get::<i32, _>("object_version") as u32,
            object_timestamp: r.get("object_timestamp"),
        })
        .collect::<Vec<_>>();

        if version_rows.is_empty() {
            return Err(DalError::NotFound(format!("object {} not found", selector.object_id)));
        }

        let now = Utc::now();
        let object_version = resolve::resolve_object_version(selector, &version_rows, now)?;

        let tag_rows = sqlx::query(
            "select tag_version, tag_timestamp from tag \
             where tenant_id = $1 and object_id = $2 and object_version = $3",
        )
        .bind(tenant)
        .bind(&selector.object_id)
        .bind(object_version as i32)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|r| TagVersionRow {
            tag_version: r.get::<i32, _>("tag_version") as u32,
            tag_timestamp: r.get("tag_timestamp"),
        })
        .collect::<Vec<_>>();

        let tag_version = resolve::resolve_tag_version(selector, &tag_rows, now)?;

        let row = sqlx::query(
            "select t.object_timestamp, t.tag_timestamp, d.definition, t.attrs \
             from tag t join object_definition d using (tenant_id, object_id, object_version) \
             where t.tenant_id = $1 and t.object_id = $2 and t.object_version = $3 and t.tag_version = $4",
        )
        .bind(tenant)
        .bind(&selector.object_id)
        .bind(object_version as i32)
        .bind(tag_version as i32)
        .fetch_one(&self.pool)
        .await?;

        let definition: ObjectDefinition = serde_json::from_value(row.get("definition"))
            .map_err(|e| DalError::Internal(format!("corrupt stored definition: {e}")))?;
        let attrs = serde_json::from_value(row.get("attrs"))
            .map_err(|e| DalError::Internal(format!("corrupt stored attrs: {e}")))?;

        Ok(Tag {
            header: TagHeader {
                object_type: selector.object_type,
                object_id: selector.object_id.clone(),
                object_version,
                tag_version,
                object_timestamp: row.get("object_timestamp"),
                tag_timestamp: row.get("tag_timestamp"),
            },
            definition,
            attrs,
        })
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
    async fn preallocate_id(&self, tenant: &str, object_type: ObjectType) -> DalResult<String> {
        let id = trac_models::new_object_id();
        sqlx::query("insert into object (tenant_id, object_id, object_type) values ($1, $2, $3)")
            .bind(tenant)
            .bind(&id)
            .bind(object_type.to_string())
            .execute(&self.pool)
            .await?;
        Ok(id)
    }
}

async fn insert_version_and_tag(
    txn: &mut Transaction<'_, Postgres>,
    tenant: &str,
    tag: &Tag,
) -> DalResult<()> {
    let definition_json = serde_json::to_value(&tag.definition)
        .map_err(|e| DalError::Internal(format!("failed to serialize definition: {e}")))?;

    sqlx::query(
        "insert into object_definition (tenant_id, object_id, object_version, object_timestamp, definition) \
         values ($1, $2, $3, $4, $5)",
    )
    .bind(tenant)
    .bind(&tag.header.object_id)
    .bind(tag.header.object_version as i32)
    .bind(tag.header.object_timestamp)
    .bind(definition_json)
    .execute(&mut **txn)
    .await?;

    insert_tag_only(txn, tenant, tag).await
}

async fn insert_tag_only(
    txn: &mut Transaction<'_, Postgres>,
    tenant: &str,
    tag: &Tag,
) -> DalResult<()> {
    let attrs_json = serde_json::to_value(&tag.attrs)
        .map_err(|e| DalError::Internal(format!("failed to serialize attrs: {e}")))?;

    sqlx::query(
        "insert into tag (tenant_id, object_id, object_version, tag_version, tag_timestamp, object_timestamp, attrs) \
         values ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(tenant)
    .bind(&tag.header.object_id)
    .bind(tag.header.object_version as i32)
    .bind(tag.header.tag_version as i32)
    .bind(tag.header.tag_timestamp)
    .bind(tag.header.object_timestamp)
    .bind(attrs_json)
    .execute(&mut **txn)
    .await?;

    Ok(())
}
