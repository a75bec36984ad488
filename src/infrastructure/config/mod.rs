mod settings;

pub use settings::{
    ApiConfig, DatabaseConfig, LoggingConfig, OtelConfig, ServerConfig, Settings, StorageConfig,
};
