//! External process execution
//!
//! Every external program the launcher starts (venv creation, pip, the store
//! initializer, preflight tests, the worker) goes through [`ProcessRunner`].

pub mod mock;
mod system;

use std::ffi::OsString;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

pub use mock::MockProcessRunner;
pub use system::SystemRunner;

/// Why a process is being started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    CreateEnvironment,
    UpgradePip,
    InstallDependencies,
    InitializeStore,
    Preflight,
    Worker,
}

impl Purpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::CreateEnvironment => "create-environment",
            Purpose::UpgradePip => "upgrade-pip",
            Purpose::InstallDependencies => "install-dependencies",
            Purpose::InitializeStore => "initialize-store",
            Purpose::Preflight => "preflight",
            Purpose::Worker => "worker",
        }
    }
}

impl std::fmt::Display for Purpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub purpose: Purpose,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Variables set for the child
    pub env: Vec<(String, OsString)>,
    /// Variables removed from the inherited environment
    pub env_remove: Vec<String>,
}

impl Invocation {
    pub fn new(purpose: Purpose, program: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            purpose,
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            env: Vec::new(),
            env_remove: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn without_env(mut self, key: impl Into<String>) -> Self {
        self.env_remove.push(key.into());
        self
    }

    /// Value this invocation sets for `key`, if any
    pub fn env_value(&self, key: &str) -> Option<&OsString> {
        self.env.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Shell-like rendering for status lines and logs
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().map(|a| {
            if a.contains(char::is_whitespace) {
                format!("\"{a}\"")
            } else {
                a.clone()
            }
        }));
        parts.join(" ")
    }
}

/// Exit status of a finished process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    /// Exit code; `128 + N` when the process was terminated by signal `N`
    pub code: i32,
}

impl ProcessExit {
    pub fn new(code: i32) -> Self {
        Self { code }
    }

    pub fn success(&self) -> bool {
        self.code == 0
    }

    pub fn from_status(status: std::process::ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self { code };
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self { code: 128 + signal };
            }
        }

        Self { code: 1 }
    }
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("Failed while waiting for {program}: {source}")]
    Wait {
        program: String,
        source: std::io::Error,
    },
}

/// Starts external processes and waits for them to finish
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessExit, ProcessError>;
}
