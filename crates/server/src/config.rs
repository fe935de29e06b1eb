use serde::Deserialize;

/// Top-level configuration for the Signet server, loaded from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignetConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Document storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Page rendering configuration.
    #[serde(default)]
    pub render: RenderConfig,
    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// HTTP server bind configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

/// Document storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Which transport to use for new documents: `"inline"` or `"s3"`.
    #[serde(default = "default_transport")]
    pub transport: String,
    /// AWS region for the `s3` transport.
    pub region: Option<String>,
    /// Bucket name for the `s3` transport.
    pub bucket: Option<String>,
    /// Endpoint URL override for local development (e.g. `LocalStack`).
    pub endpoint_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            transport: default_transport(),
            region: None,
            bucket: None,
            endpoint_url: None,
        }
    }
}

fn default_transport() -> String {
    "inline".to_owned()
}

/// Page rendering configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Scale factor applied when rasterizing pages.
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Maximum pages rendered concurrently.
    #[serde(default = "default_max_concurrent_renders")]
    pub max_concurrent_renders: usize,
    /// Maximum concurrent page-image uploads during pre-warming.
    #[serde(default = "default_max_concurrent_uploads")]
    pub max_concurrent_uploads: usize,
    /// Deadline in seconds for rendering a whole document during
    /// pre-warming; batches past it are aborted and dead-lettered.
    #[serde(default = "default_batch_timeout_seconds")]
    pub batch_timeout_seconds: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            max_concurrent_renders: default_max_concurrent_renders(),
            max_concurrent_uploads: default_max_concurrent_uploads(),
            batch_timeout_seconds: default_batch_timeout_seconds(),
        }
    }
}

fn default_batch_timeout_seconds() -> u64 {
    300
}

fn default_scale() -> f32 {
    signet_pdf::DEFAULT_RENDER_SCALE
}

fn default_max_concurrent_renders() -> usize {
    signet_pdf::DEFAULT_MAX_CONCURRENT_RENDERS
}

fn default_max_concurrent_uploads() -> usize {
    100
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret for signing presign tokens. A random secret is generated when
    /// unset, so presigned URLs will not survive server restarts.
    pub presign_secret: Option<String>,
    /// Presign token lifetime in seconds.
    #[serde(default = "default_presign_expiry")]
    pub presign_expiry_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            presign_secret: None,
            presign_expiry_seconds: default_presign_expiry(),
        }
    }
}

fn default_presign_expiry() -> u64 {
    3600
}
