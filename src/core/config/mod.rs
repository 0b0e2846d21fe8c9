pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    load_config, AgentConfig, AppConfig, IngestConfig, PreamblePolicy, ProviderConfig,
    ServerConfig, SessionConfig,
};
