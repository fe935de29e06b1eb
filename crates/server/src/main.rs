use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use signet_pdf::Rasterizer;
use signet_server::api::{AppState, router};
use signet_server::auth::{MemorySessionResolver, MemoryTeamDirectory, PresignManager};
use signet_server::config::SignetConfig;
use signet_state_memory::MemoryEnvelopeStore;
use signet_storage::{DocumentStorage, MemoryObjectStore, ObjectStore, StorageTransport};

/// Signet envelope delivery HTTP server.
#[derive(Parser, Debug)]
#[command(name = "signet-server", about = "Standalone HTTP server for Signet")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "signet.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber from RUST_LOG or default to info.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let config: SignetConfig = if Path::new(&cli.config).exists() {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        info!(path = %cli.config, "config file not found, using defaults");
        SignetConfig::default()
    };

    let (objects, transport) = build_object_store(&config).await?;

    let presign_secret = config
        .auth
        .presign_secret
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let state = AppState {
        store: Arc::new(MemoryEnvelopeStore::new()),
        storage: Arc::new(DocumentStorage::new(objects, transport)),
        rasterizer: Arc::new(Rasterizer::new(config.render.max_concurrent_renders)),
        sessions: Arc::new(MemorySessionResolver::new()),
        teams: Arc::new(MemoryTeamDirectory::new()),
        presign: Arc::new(PresignManager::new(
            &presign_secret,
            config.auth.presign_expiry_seconds,
        )),
        render: Arc::new(config.render.clone()),
        max_upload_bytes: config.server.max_upload_bytes,
    };

    let app = router(state);

    let host = cli.host.unwrap_or_else(|| config.server.host.clone());
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, transport = %config.storage.transport, "signet server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_object_store(
    config: &SignetConfig,
) -> Result<(Arc<dyn ObjectStore>, StorageTransport), Box<dyn std::error::Error>> {
    match config.storage.transport.as_str() {
        "inline" => Ok((Arc::new(MemoryObjectStore::new()), StorageTransport::Inline)),
        #[cfg(feature = "s3")]
        "s3" => {
            let s3_config = signet_storage::s3::S3Config {
                region: config
                    .storage
                    .region
                    .clone()
                    .ok_or("storage.region is required for the s3 transport")?,
                bucket: config
                    .storage
                    .bucket
                    .clone()
                    .ok_or("storage.bucket is required for the s3 transport")?,
                endpoint_url: config.storage.endpoint_url.clone(),
            };
            let store = signet_storage::s3::S3ObjectStore::connect(&s3_config).await;
            Ok((Arc::new(store), StorageTransport::ObjectStore))
        }
        #[cfg(not(feature = "s3"))]
        "s3" => Err("this build does not include the s3 feature".into()),
        other => Err(format!("unknown storage transport: {other}").into()),
    }
}
