use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::environment::EnvironmentError;
use crate::util::RUNTIME_INSTALL_INSTRUCTIONS;

/// Gate failures. All are terminal for the invocation and none are retried.
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("FATAL: missing runtime ({detail})")]
    MissingRuntime { detail: String },

    #[error("Environment failure: {0}")]
    EnvironmentFailure(String),

    #[error("Dependency installation failed: {0}")]
    InstallFailure(String),

    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Store initialization failed: {0}")]
    StoreInitFailure(String),

    #[error("Preflight tests failed: {0}")]
    PreflightTestFailure(String),

    #[error("Failed to launch worker: {0}")]
    LaunchFailure(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{context} ({path}): {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<EnvironmentError> for BootstrapError {
    fn from(err: EnvironmentError) -> Self {
        BootstrapError::EnvironmentFailure(err.to_string())
    }
}

impl BootstrapError {
    pub fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BootstrapError::Io {
            context,
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Follow-up instructions for the operator, if any
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            BootstrapError::MissingRuntime { .. } => Some(RUNTIME_INSTALL_INSTRUCTIONS),
            BootstrapError::EnvironmentFailure(_) => {
                Some("Delete the environment directory and re-run to recreate it.")
            }
            BootstrapError::InstallFailure(_) => {
                Some("Fix the requirements and re-run; installation will be retried.")
            }
            _ => None,
        }
    }
}
