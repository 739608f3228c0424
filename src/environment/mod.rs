//! Isolated Python environment (venv) for the bot
//!
//! Provisioning is a single `python -m venv <dir>`. Activation does not source any
//! script: it produces an [`ActivatedEnv`] that prepends the environment's
//! executables to `PATH`, sets `VIRTUAL_ENV`, and resolves programs there first.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::process::{Invocation, Purpose};

#[cfg(windows)]
const BIN_DIR: &str = "Scripts";
#[cfg(not(windows))]
const BIN_DIR: &str = "bin";

#[cfg(windows)]
const INTERPRETER: &str = "python.exe";
#[cfg(not(windows))]
const INTERPRETER: &str = "python";

#[derive(Error, Debug)]
pub enum EnvironmentError {
    #[error("Environment directory {0} does not exist")]
    Missing(PathBuf),
    #[error("Environment at {0} has no interpreter; delete it and re-run to recreate it")]
    NoInterpreter(PathBuf),
    #[error("Cannot build PATH for {dir}: {source}")]
    SearchPath {
        dir: PathBuf,
        source: std::env::JoinPathsError,
    },
}

/// An environment directory, provisioned or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsolatedEnv {
    dir: PathBuf,
}

impl IsolatedEnv {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The environment marker: the directory exists
    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.dir.join(BIN_DIR)
    }

    pub fn interpreter(&self) -> PathBuf {
        self.bin_dir().join(INTERPRETER)
    }

    /// `<runtime> -m venv <dir>`, run from the project root
    pub fn creation_invocation(&self, runtime: &Path, root: &Path) -> Invocation {
        Invocation::new(Purpose::CreateEnvironment, runtime, root)
            .with_args(["-m", "venv"])
            .with_args([self.dir.to_string_lossy().into_owned()])
    }

    /// Bind to this environment. Uses the launcher's own `PATH` as the tail.
    pub fn activate(&self) -> Result<ActivatedEnv, EnvironmentError> {
        self.activate_with_path(std::env::var_os("PATH"))
    }

    pub fn activate_with_path(
        &self,
        inherited_path: Option<OsString>,
    ) -> Result<ActivatedEnv, EnvironmentError> {
        if !self.exists() {
            return Err(EnvironmentError::Missing(self.dir.clone()));
        }
        let interpreter = self.interpreter();
        if !interpreter.exists() {
            return Err(EnvironmentError::NoInterpreter(self.dir.clone()));
        }

        let bin_dir = self.bin_dir();
        let mut entries = vec![bin_dir.clone()];
        if let Some(path) = &inherited_path {
            entries.extend(std::env::split_paths(path));
        }
        let search_path =
            std::env::join_paths(entries).map_err(|source| EnvironmentError::SearchPath {
                dir: self.dir.clone(),
                source,
            })?;

        tracing::debug!(env = %self.dir.display(), "Environment activated");
        Ok(ActivatedEnv {
            dir: self.dir.clone(),
            bin_dir,
            interpreter,
            search_path,
        })
    }
}

/// An environment the remaining steps run inside
#[derive(Debug, Clone)]
pub struct ActivatedEnv {
    dir: PathBuf,
    bin_dir: PathBuf,
    interpreter: PathBuf,
    search_path: OsString,
}

impl ActivatedEnv {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    /// `PATH` value for child processes
    pub fn search_path(&self) -> &OsString {
        &self.search_path
    }

    /// Resolve a program name the way an activated shell would.
    ///
    /// Names with a path separator are taken relative to `cwd`. Bare names are
    /// looked up on the environment's `PATH`; unresolvable names are returned
    /// unchanged so the spawn error names them.
    pub fn resolve_program(&self, program: &str, cwd: &Path) -> PathBuf {
        let as_path = Path::new(program);
        if as_path.components().count() > 1 {
            return if as_path.is_absolute() {
                as_path.to_path_buf()
            } else {
                cwd.join(as_path)
            };
        }
        which::which_in(program, Some(&self.search_path), cwd)
            .unwrap_or_else(|_| PathBuf::from(program))
    }

    /// Build an invocation of `command` (program + args) inside this environment
    pub fn invocation(&self, purpose: Purpose, command: &[String], cwd: &Path) -> Invocation {
        let (program, args) = match command.split_first() {
            Some((program, args)) => (self.resolve_program(program, cwd), args.to_vec()),
            None => (self.interpreter.clone(), Vec::new()),
        };
        Invocation::new(purpose, program, cwd)
            .with_args(args)
            .with_env("VIRTUAL_ENV", self.dir.as_os_str())
            .with_env("PATH", self.search_path.clone())
            .without_env("PYTHONHOME")
    }

    /// `python -m pip <args>` with the environment's interpreter
    pub fn pip_invocation(&self, purpose: Purpose, args: &[&str], cwd: &Path) -> Invocation {
        let mut command = vec![
            self.interpreter.to_string_lossy().into_owned(),
            "-m".to_string(),
            "pip".to_string(),
        ];
        command.extend(args.iter().map(|a| a.to_string()));
        self.invocation(purpose, &command, cwd)
    }
}
