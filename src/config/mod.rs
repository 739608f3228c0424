mod dotenv;
mod settings;

pub use dotenv::DotEnv;
pub use settings::{
    BackupConfig, BotConfigFiles, ConfigError, DependencyConfig, DirectoriesConfig,
    EnvironmentConfig, LauncherConfig, LoggingConfig, MissingConfigPolicy, PreflightConfig,
    RuntimeConfig, StoreConfig, TomlConfig, WorkerConfig, EXAMPLE_CONFIG,
};
