use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub templates: TemplatesConfig,
    #[serde(default)]
    pub ratelimit: RateLimitConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub otel: OtelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Largest accepted request body
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    /// Bearer token required on the /api routes
    pub key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    /// "smtp" to deliver through the relay, "memory" to only record messages
    #[serde(default = "default_transport")]
    pub transport: String,
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Implicit TLS instead of opportunistic STARTTLS
    #[serde(default)]
    pub secure: bool,
    #[serde(default = "default_from")]
    pub from: String,
    #[serde(default)]
    pub from_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesConfig {
    /// Directory of `<key>.hbs` templates
    #[serde(default = "default_templates_dir")]
    pub dir: PathBuf,
    /// Partials directory; defaults to `<dir>/partials`
    #[serde(default)]
    pub partials: Option<PathBuf>,
    /// Directory of `<locale>.json` bundles
    #[serde(default = "default_locales_dir")]
    pub locales: PathBuf,
    /// Logo file attached inline to every message
    #[serde(default = "default_logo")]
    pub logo: PathBuf,
    /// Content-id of the inline logo
    #[serde(default = "default_cid")]
    pub cid: String,
}

/// Configuration for rate limiting
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Whether rate limiting is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Requests allowed per client per window
    #[serde(default = "default_requests")]
    pub requests: u32,
    /// Window length in seconds; tokens refill evenly across it
    #[serde(default = "default_window")]
    pub window: u64,
    /// Cleanup interval for stale buckets in seconds
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: u64,
    /// Time after which unused buckets are removed (seconds)
    #[serde(default = "default_bucket_ttl")]
    pub bucket_ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// OpenTelemetry exporter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_body_limit() -> usize {
    100 * 1024
}

fn default_transport() -> String {
    "smtp".to_string()
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from() -> String {
    "noreply@localhost".to_string()
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_locales_dir() -> PathBuf {
    PathBuf::from("locales")
}

fn default_logo() -> PathBuf {
    PathBuf::from("templates/logo.png")
}

fn default_cid() -> String {
    "logo".to_string()
}

fn default_true() -> bool {
    true
}

fn default_requests() -> u32 {
    30 // 30 requests per window per client
}

fn default_window() -> u64 {
    60 // 1 minute
}

fn default_cleanup_interval() -> u64 {
    60 // Clean up every minute
}

fn default_bucket_ttl() -> u64 {
    300 // Remove buckets unused for 5 minutes
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "ara-email-service".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("smtp.port", 587)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables
            // SERVER_PORT, API_KEY, SMTP_HOST, SMTP_USERNAME, SMTP_PASSWORD, SMTP_FROM, etc.
            .add_source(
                Environment::default()
                    .separator("_")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins"),
            );

        builder.build()?.try_deserialize()
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(ConfigError::Message("api.key (API_KEY) is required".into()));
        }
        if self.smtp.transport == "smtp" && self.smtp.host.trim().is_empty() {
            return Err(ConfigError::Message("smtp.host (SMTP_HOST) is required".into()));
        }
        if self.ratelimit.requests == 0 || self.ratelimit.window == 0 {
            return Err(ConfigError::Message(
                "ratelimit.requests and ratelimit.window must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl TemplatesConfig {
    pub fn partials_dir(&self) -> PathBuf {
        self.partials
            .clone()
            .unwrap_or_else(|| self.dir.join("partials"))
    }

    /// Reference used by templates for the inline logo
    pub fn logo_url(&self) -> String {
        format!("cid:{}", self.cid)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            transport: default_transport(),
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: None,
            password: None,
            secure: false,
            from: default_from(),
            from_name: None,
        }
    }
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: default_templates_dir(),
            partials: None,
            locales: default_locales_dir(),
            logo: default_logo(),
            cid: default_cid(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests: default_requests(),
            window: default_window(),
            cleanup_interval_seconds: default_cleanup_interval(),
            bucket_ttl_seconds: default_bucket_ttl(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}
