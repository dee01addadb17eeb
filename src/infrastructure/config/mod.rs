mod settings;

pub use settings::{
    DatabaseConfig, DeliveryConfig, LogFormat, LoggingConfig, OtelConfig, ServerConfig, Settings,
    SmtpConfig, SmtpTls, StorageConfig, TemplateConfig,
};
