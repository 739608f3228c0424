use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::util::paths::ProjectLayout;

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("launcher.toml.example");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid launcher configuration: {0}")]
    Invalid(String),
}

/// What to do when the bot configuration file had to be created from its template
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MissingConfigPolicy {
    /// Stop and ask the operator to edit the file and re-run
    #[default]
    Halt,
    /// Wait for the operator to confirm the file was edited, then continue
    Prompt,
}

impl MissingConfigPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingConfigPolicy::Halt => "halt",
            MissingConfigPolicy::Prompt => "prompt",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Interpreter names searched on PATH, in order
    pub candidates: Vec<String>,
    /// Explicit interpreter path (takes precedence over candidates)
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct DependencyConfig {
    pub requirements: PathBuf,
    pub marker: PathBuf,
    /// Upgrade pip before installing requirements
    pub upgrade_pip: bool,
}

#[derive(Debug, Clone)]
pub struct BotConfigFiles {
    pub file: PathBuf,
    pub template: PathBuf,
    pub on_missing: MissingConfigPolicy,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
    /// External initializer command; `None` uses the built-in schema
    pub initializer: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct DirectoriesConfig {
    pub create: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct PreflightConfig {
    pub enabled: bool,
    pub command: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub command: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BackupConfig {
    pub dir: PathBuf,
    pub keep_days: u32,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub dir: PathBuf,
}

/// Launcher configuration
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub runtime: RuntimeConfig,
    pub environment: EnvironmentConfig,
    pub dependencies: DependencyConfig,
    pub configuration: BotConfigFiles,
    pub store: StoreConfig,
    pub directories: DirectoriesConfig,
    pub preflight: PreflightConfig,
    pub worker: WorkerConfig,
    pub backup: BackupConfig,
    pub logging: LoggingConfig,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeConfig {
                candidates: strings(&["python3", "python"]),
                path: None,
            },
            environment: EnvironmentConfig {
                dir: PathBuf::from("venv"),
            },
            dependencies: DependencyConfig {
                requirements: PathBuf::from("requirements.txt"),
                marker: PathBuf::from("venv/.deps_installed"),
                upgrade_pip: true,
            },
            configuration: BotConfigFiles {
                file: PathBuf::from(".env"),
                template: PathBuf::from(".env.example"),
                on_missing: MissingConfigPolicy::Halt,
            },
            store: StoreConfig {
                path: PathBuf::from("game.db"),
                initializer: None,
            },
            directories: DirectoriesConfig {
                create: vec![
                    PathBuf::from("logs"),
                    PathBuf::from("backups"),
                    PathBuf::from("data"),
                ],
            },
            preflight: PreflightConfig {
                enabled: false,
                command: strings(&["python", "-m", "pytest", "-q"]),
            },
            worker: WorkerConfig {
                command: strings(&["python", "main.py"]),
            },
            backup: BackupConfig {
                dir: PathBuf::from("backups"),
                keep_days: 7,
            },
            logging: LoggingConfig {
                dir: PathBuf::from("logs"),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlRuntimeConfig {
    pub candidates: Option<Vec<String>>,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlEnvironmentConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlDependencyConfig {
    pub requirements: Option<PathBuf>,
    pub marker: Option<PathBuf>,
    pub upgrade_pip: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlBotConfigFiles {
    pub file: Option<PathBuf>,
    pub template: Option<PathBuf>,
    pub on_missing: Option<MissingConfigPolicy>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlStoreConfig {
    pub path: Option<PathBuf>,
    pub initializer: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlDirectoriesConfig {
    pub create: Option<Vec<PathBuf>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlPreflightConfig {
    pub enabled: Option<bool>,
    pub command: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlWorkerConfig {
    pub command: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlBackupConfig {
    pub dir: Option<PathBuf>,
    pub keep_days: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlLoggingConfig {
    pub dir: Option<PathBuf>,
}

/// TOML representation of launcher.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub runtime: Option<TomlRuntimeConfig>,
    pub environment: Option<TomlEnvironmentConfig>,
    pub dependencies: Option<TomlDependencyConfig>,
    pub configuration: Option<TomlBotConfigFiles>,
    pub store: Option<TomlStoreConfig>,
    pub directories: Option<TomlDirectoriesConfig>,
    pub preflight: Option<TomlPreflightConfig>,
    pub worker: Option<TomlWorkerConfig>,
    pub backup: Option<TomlBackupConfig>,
    pub logging: Option<TomlLoggingConfig>,
}

impl LauncherConfig {
    /// Load launcher.toml from the project root, merging with defaults.
    ///
    /// A missing file yields the defaults; the launcher never writes one.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let config_file = ProjectLayout::launcher_config_path(root);
        if !config_file.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_file).map_err(|source| ConfigError::Read {
            path: config_file.clone(),
            source,
        })?;
        let toml_config =
            toml::from_str::<TomlConfig>(&contents).map_err(|source| ConfigError::Parse {
                path: config_file.clone(),
                source,
            })?;

        tracing::debug!(path = %config_file.display(), "Loaded launcher configuration");
        Self::from_toml(toml_config)
    }

    /// Merge a parsed TOML document onto the defaults and validate the result
    pub fn from_toml(toml_config: TomlConfig) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(runtime) = toml_config.runtime {
            if let Some(candidates) = runtime.candidates {
                config.runtime.candidates = candidates;
            }
            if let Some(path) = runtime.path {
                config.runtime.path = Some(path);
            }
        }

        if let Some(environment) = toml_config.environment {
            if let Some(dir) = environment.dir {
                config.environment.dir = dir;
            }
        }

        if let Some(deps) = toml_config.dependencies {
            if let Some(requirements) = deps.requirements {
                config.dependencies.requirements = requirements;
            }
            if let Some(marker) = deps.marker {
                config.dependencies.marker = marker;
            }
            if let Some(upgrade_pip) = deps.upgrade_pip {
                config.dependencies.upgrade_pip = upgrade_pip;
            }
        }

        if let Some(files) = toml_config.configuration {
            if let Some(file) = files.file {
                config.configuration.file = file;
            }
            if let Some(template) = files.template {
                config.configuration.template = template;
            }
            if let Some(on_missing) = files.on_missing {
                config.configuration.on_missing = on_missing;
            }
        }

        if let Some(store) = toml_config.store {
            if let Some(path) = store.path {
                config.store.path = path;
            }
            if let Some(initializer) = store.initializer {
                config.store.initializer = Some(initializer);
            }
        }

        if let Some(directories) = toml_config.directories {
            if let Some(create) = directories.create {
                config.directories.create = create;
            }
        }

        if let Some(preflight) = toml_config.preflight {
            if let Some(enabled) = preflight.enabled {
                config.preflight.enabled = enabled;
            }
            if let Some(command) = preflight.command {
                config.preflight.command = command;
            }
        }

        if let Some(worker) = toml_config.worker {
            if let Some(command) = worker.command {
                config.worker.command = command;
            }
        }

        if let Some(backup) = toml_config.backup {
            if let Some(dir) = backup.dir {
                config.backup.dir = dir;
            }
            if let Some(keep_days) = backup.keep_days {
                config.backup.keep_days = keep_days;
            }
        }

        if let Some(logging) = toml_config.logging {
            if let Some(dir) = logging.dir {
                config.logging.dir = dir;
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let toml_config =
            toml::from_str::<TomlConfig>(contents).map_err(|source| ConfigError::Parse {
                path: PathBuf::from(crate::util::LAUNCHER_CONFIG_FILE),
                source,
            })?;
        Self::from_toml(toml_config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.runtime.candidates.is_empty() && self.runtime.path.is_none() {
            return Err(ConfigError::Invalid(
                "runtime.candidates is empty and runtime.path is not set".into(),
            ));
        }
        if self.worker.command.is_empty() {
            return Err(ConfigError::Invalid("worker.command must not be empty".into()));
        }
        if self.preflight.command.is_empty() {
            return Err(ConfigError::Invalid(
                "preflight.command must not be empty".into(),
            ));
        }
        if matches!(&self.store.initializer, Some(cmd) if cmd.is_empty()) {
            return Err(ConfigError::Invalid(
                "store.initializer must not be empty (omit it to use the built-in schema)".into(),
            ));
        }
        Ok(())
    }
}
