mod config;
mod editor;
mod errors;
mod models;
mod persistence;
mod routes;
mod state;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, S3Config};
use crate::editor::export::{ExportSink, S3ExportSink};
use crate::editor::session::EditorSession;
use crate::editor::versions::SnapshotStore;
use crate::models::resume::Resume;
use crate::persistence::{load_resume, KeyValueStore, MemoryStore, RedisStore};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume API v{}", env!("CARGO_PKG_VERSION"));

    // Persistence: Redis when configured, otherwise process memory
    let store: Arc<dyn KeyValueStore> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            Arc::new(RedisStore::connect(&client).await?)
        }
        None => {
            info!("REDIS_URL not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    // Restore the live document and the saved versions
    let initial = match load_resume(store.as_ref()).await? {
        Some(resume) => {
            info!("Restored saved resume");
            resume
        }
        None => Resume::starter(),
    };
    let session = EditorSession::new(initial, config.max_history);
    let versions = SnapshotStore::load(store.as_ref()).await?;

    // Optional S3 / MinIO publishing
    let exporter: Option<Arc<dyn ExportSink>> = match &config.s3 {
        Some(s3) => {
            let client = build_s3_client(s3).await;
            info!("S3 client initialized (bucket: {})", s3.bucket);
            Some(Arc::new(S3ExportSink::new(client, s3.bucket.clone())))
        }
        None => None,
    };

    // Build app state
    let state = AppState {
        session: Arc::new(Mutex::new(session)),
        versions: Arc::new(Mutex::new(versions)),
        store,
        exporter,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the editor frontend has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &S3Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.access_key_id,
        &config.secret_access_key,
        None,
        None,
        "resume-api-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
