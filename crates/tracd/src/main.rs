//! `tracd`: assembles the metadata DAL, object store, and the
//! data/metadata/admin services behind the gateway router into one runnable
//! daemon. Exit codes: 0 success, 1 startup error, 2 config error, 3
//! runtime error, 4 data error.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use trac_data_svc::{AdminService, DataService, MetadataService, ServiceContext};
use trac_gateway::rest::AppState;
use trac_metadata_dal::{InMemoryMetadataDal, MetadataDal, PgMetadataDal};
use trac_storage::{LocalFsStore, ObjectStore, StorageConfig};

use config::PlatformConfig;

const EXIT_STARTUP_ERROR: i32 = 1;
const EXIT_CONFIG_ERROR: i32 = 2;
const EXIT_RUNTIME_ERROR: i32 = 3;

/// TRAC data/metadata platform daemon.
#[derive(Debug, Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to the platform config YAML file.
    #[clap(long, env = "TRAC_CONFIG", default_value = "tracd.yaml")]
    config: PathBuf,
}

fn main() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("failed to install tracing subscriber");
    }

    let args = Args::parse();

    let config = match PlatformConfig::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err:#}");
            std::process::exit(EXIT_CONFIG_ERROR);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("startup error: failed to build async runtime: {err}");
            std::process::exit(EXIT_STARTUP_ERROR);
        }
    };

    match runtime.block_on(async_main(config)) {
        Ok(()) => {}
        Err(err) => {
            tracing::error!(error = ?err, "tracd exited with an error");
            std::process::exit(if err.is::<StartupError>() { EXIT_STARTUP_ERROR } else { EXIT_RUNTIME_ERROR });
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct StartupError(String);

fn startup_error(msg: impl Into<String>) -> anyhow::Error {
    anyhow::Error::new(StartupError(msg.into()))
}

async fn async_main(config: PlatformConfig) -> anyhow::Result<()> {
    let dal: Arc<dyn MetadataDal> = match config.metadata_db.dialect.as_str() {
        "memory" => Arc::new(InMemoryMetadataDal::new()),
        "postgres" => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.metadata_db.pool_size.unwrap_or(10))
                .connect(&config.metadata_db.jdbc_url)
                .await
                .map_err(|e| startup_error(format!("connecting to postgres: {e}")))?;
            Arc::new(PgMetadataDal::new(pool))
        }
        other => return Err(startup_error(format!("unsupported metadataDb.dialect '{other}'"))),
    };

    let storage_plugin = config
        .storage
        .plugins
        .get(&config.storage.default_storage_key)
        .ok_or_else(|| startup_error(format!("no storage plugin configured for key '{}'", config.storage.default_storage_key)))?;
    let store: Arc<dyn ObjectStore> = match storage_plugin {
        StorageConfig::LocalFs { root } => Arc::new(LocalFsStore::new(PathBuf::from(root))),
        other => return Err(startup_error(format!("storage backend {other:?} is an external interface, not implemented by this binary"))),
    };

    let admin = Arc::new(AdminService::with_bootstrap_tenants(config.tenants.iter().map(|t| trac_proto::admin::Tenant {
        tenant_code: t.tenant_code.clone(),
        description: t.description.clone(),
    })));
    let metadata = Arc::new(MetadataService::new(dal.clone()));
    let data = Arc::new(DataService::new(ServiceContext::new(dal, store)));

    let rest_state = Arc::new(AppState { metadata: metadata.clone(), data: data.clone(), admin: admin.clone() });
    let rest_app = trac_gateway::rest::router(rest_state, &config.gateway.api_prefix);

    let rest_port = config.services.get("rest").map(|s| s.port).unwrap_or(8080);
    let grpc_port = config.services.get("grpc").map(|s| s.port).unwrap_or(9090);

    let rest_listener = tokio::net::TcpListener::bind(("0.0.0.0", rest_port))
        .await
        .map_err(|e| startup_error(format!("binding REST port {rest_port}: {e}")))?;
    let grpc_addr = format!("0.0.0.0:{grpc_port}")
        .parse()
        .map_err(|e| startup_error(format!("parsing gRPC bind address: {e}")))?;

    tracing::info!(rest_port, grpc_port, "tracd listening");

    let rest_server = axum::serve(rest_listener, rest_app);
    let grpc_server = trac_gateway::grpc::build_router(metadata, data, admin).serve(grpc_addr);

    tokio::try_join!(
        async { rest_server.await.map_err(|e| anyhow::anyhow!("REST server error: {e}")) },
        async { grpc_server.await.map_err(|e| anyhow::anyhow!("gRPC server error: {e}")) },
    )?;

    Ok(())
}
