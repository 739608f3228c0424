//! Path layout of a bot checkout
//!
//! Every path the launcher touches is resolved against the project root (the
//! invocation directory unless `--root` is given). Absolute paths in
//! launcher.toml are used as-is.

use std::path::{Path, PathBuf};

use crate::config::{DotEnv, LauncherConfig};

/// Launcher settings file, looked up in the project root
pub const LAUNCHER_CONFIG_FILE: &str = "launcher.toml";

/// Launcher log file name inside the logs directory
pub const LAUNCHER_LOG_FILE: &str = "launcher.log";

/// Resolved filesystem contract for one project root
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    pub root: PathBuf,
    /// Isolated environment directory (its existence is the environment marker)
    pub env_dir: PathBuf,
    pub requirements: PathBuf,
    /// Installed-dependencies sentinel
    pub deps_marker: PathBuf,
    /// Bot configuration file and the template it is copied from
    pub config_file: PathBuf,
    pub config_template: PathBuf,
    /// Store path from launcher.toml; see [`ProjectLayout::effective_store_file`]
    pub store_file: PathBuf,
    pub aux_dirs: Vec<PathBuf>,
    pub backup_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl ProjectLayout {
    pub fn resolve(root: &Path, config: &LauncherConfig) -> Self {
        let join = |p: &Path| resolve_in(root, p);
        Self {
            root: root.to_path_buf(),
            env_dir: join(&config.environment.dir),
            requirements: join(&config.dependencies.requirements),
            deps_marker: join(&config.dependencies.marker),
            config_file: join(&config.configuration.file),
            config_template: join(&config.configuration.template),
            store_file: join(&config.store.path),
            aux_dirs: config.directories.create.iter().map(|d| join(d)).collect(),
            backup_dir: join(&config.backup.dir),
            logs_dir: join(&config.logging.dir),
        }
    }

    /// Path of launcher.toml for a root
    pub fn launcher_config_path(root: &Path) -> PathBuf {
        root.join(LAUNCHER_CONFIG_FILE)
    }

    /// Get the launcher log file path (logs/launcher.log)
    pub fn log_file_path(&self) -> PathBuf {
        self.logs_dir.join(LAUNCHER_LOG_FILE)
    }

    /// Store path the bot will actually use.
    ///
    /// A `DATABASE_URL=sqlite:///...` entry in the bot configuration file takes
    /// precedence over launcher.toml; anything else falls back to the configured path.
    pub fn effective_store_file(&self) -> PathBuf {
        match DotEnv::load(&self.config_file) {
            Ok(Some(env)) => env
                .sqlite_path()
                .map(|p| resolve_in(&self.root, &p))
                .unwrap_or_else(|| self.store_file.clone()),
            Ok(None) => self.store_file.clone(),
            Err(e) => {
                tracing::warn!(
                    path = %self.config_file.display(),
                    error = %e,
                    "Failed to read configuration file, using configured store path"
                );
                self.store_file.clone()
            }
        }
    }
}

fn resolve_in(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
