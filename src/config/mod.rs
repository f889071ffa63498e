mod settings;

pub use settings::{
    ApiConfig, LogConfig, OtelConfig, RateLimitConfig, ServerConfig, Settings, SmtpConfig,
    TemplatesConfig,
};
