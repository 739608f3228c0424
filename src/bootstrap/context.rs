use std::path::PathBuf;
use std::sync::Arc;

use super::confirm::Confirm;
use super::error::BootstrapError;
use crate::config::{LauncherConfig, MissingConfigPolicy};
use crate::environment::ActivatedEnv;
use crate::process::{Invocation, ProcessError, ProcessExit, ProcessRunner};
use crate::report::Reporter;
use crate::util::ProjectLayout;

/// Command-line overrides for a bootstrap run
#[derive(Debug, Clone, Copy, Default)]
pub struct BootstrapOptions {
    /// Confirm interactively instead of halting when the configuration file is created
    pub interactive: bool,
    /// Force preflight tests on or off, overriding launcher.toml
    pub preflight: Option<bool>,
}

/// State shared by the setup steps of one run
pub struct BootstrapContext {
    pub layout: ProjectLayout,
    pub config: LauncherConfig,
    pub policy: MissingConfigPolicy,
    pub runner: Arc<dyn ProcessRunner>,
    pub confirm: Arc<dyn Confirm>,
    pub reporter: Reporter,
    /// Interpreter found by the runtime check
    pub runtime: Option<PathBuf>,
    /// Bound environment, set by activation
    pub env: Option<ActivatedEnv>,
}

impl BootstrapContext {
    pub fn new(
        layout: ProjectLayout,
        config: LauncherConfig,
        options: BootstrapOptions,
        runner: Arc<dyn ProcessRunner>,
        confirm: Arc<dyn Confirm>,
        reporter: Reporter,
    ) -> Self {
        let policy = if options.interactive {
            MissingConfigPolicy::Prompt
        } else {
            config.configuration.on_missing
        };
        Self {
            layout,
            config,
            policy,
            runner,
            confirm,
            reporter,
            runtime: None,
            env: None,
        }
    }

    pub fn activated(&self) -> Result<&ActivatedEnv, BootstrapError> {
        self.env.as_ref().ok_or_else(|| {
            BootstrapError::EnvironmentFailure("environment has not been activated".into())
        })
    }

    /// Echo and run an external command
    pub async fn run(&self, invocation: &Invocation) -> Result<ProcessExit, ProcessError> {
        self.reporter.info(&format!("$ {}", invocation.display()));
        self.runner.run(invocation).await
    }
}
