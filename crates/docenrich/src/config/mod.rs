pub mod loader;
pub mod schema;

pub use loader::{
    config_path_from_env, load_config, load_config_from_str, load_config_or_default,
    validate_config, CONFIG_PATH_ENV,
};
pub use schema::{
    Config, PipelineSettings, ServerConfig, ServiceConfig, StorageBackend, StorageConfig,
    TranslatorConfig,
};
