use std::sync::Arc;

use super::confirm::Confirm;
use super::context::{BootstrapContext, BootstrapOptions};
use super::error::BootstrapError;
use super::stage::Stage;
use super::steps::{setup_steps, SetupStep, StepOutcome};
use crate::config::LauncherConfig;
use crate::process::{ProcessRunner, Purpose};
use crate::report::Reporter;
use crate::util::ProjectLayout;

const HANDOFF_TITLE: &str = "Launching bot";

/// How a run ended without a gate failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The configuration file was just created; nothing was launched
    AwaitingConfiguration,
    /// The worker ran and exited with this code
    Exited(i32),
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::AwaitingConfiguration => 1,
            Outcome::Exited(code) => *code,
        }
    }
}

/// Check-only view of one gate, for `launcher status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepStatus {
    pub title: &'static str,
    pub stage: Stage,
    pub satisfied: bool,
    /// No persistent effect; the step is never satisfied ahead of a run
    pub runs_every_launch: bool,
    pub note: &'static str,
}

/// Walks the setup gates in order, then hands off to the worker
pub struct Bootstrapper {
    ctx: BootstrapContext,
    steps: Vec<Box<dyn SetupStep>>,
    stage: Stage,
    current: &'static str,
}

impl Bootstrapper {
    pub fn new(
        layout: ProjectLayout,
        config: LauncherConfig,
        options: BootstrapOptions,
        runner: Arc<dyn ProcessRunner>,
        confirm: Arc<dyn Confirm>,
        reporter: Reporter,
    ) -> Self {
        let preflight = options.preflight.unwrap_or(config.preflight.enabled);
        let ctx = BootstrapContext::new(layout, config, options, runner, confirm, reporter);
        Self {
            ctx,
            steps: setup_steps(preflight),
            stage: Stage::Start,
            current: "",
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Evaluate every gate's check without applying anything
    pub fn status(&self) -> Vec<StepStatus> {
        self.steps
            .iter()
            .map(|step| StepStatus {
                title: step.title(),
                stage: step.reached(),
                satisfied: step.is_satisfied(&self.ctx),
                runs_every_launch: step.runs_every_launch(),
                note: step.pending_note(),
            })
            .collect()
    }

    pub async fn run(&mut self) -> Result<Outcome, BootstrapError> {
        match self.run_gates().await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                let reached = self.stage;
                self.stage.advance(Stage::Aborted);
                self.ctx
                    .reporter
                    .error(&format!("{} failed: {err}", self.current));
                if let Some(hint) = err.hint() {
                    self.ctx.reporter.plain(hint);
                }
                tracing::debug!(gate = self.current, reached = %reached, "Bootstrap aborted");
                Err(err)
            }
        }
    }

    async fn run_gates(&mut self) -> Result<Outcome, BootstrapError> {
        let reporter = self.ctx.reporter.clone();
        let total = self.steps.len() + 1;

        for (index, step) in self.steps.iter().enumerate() {
            self.current = step.title();
            reporter.step(index + 1, total, step.title());

            if step.skippable() && step.is_satisfied(&self.ctx) {
                reporter.info("Already done, skipping");
                self.stage.advance(step.reached());
                continue;
            }

            match step.apply(&mut self.ctx).await? {
                StepOutcome::Completed => {
                    self.stage.advance(step.reached());
                }
                StepOutcome::Halted => {
                    self.stage.advance(Stage::AwaitingConfig);
                    tracing::info!(gate = step.title(), "Waiting for configuration");
                    return Ok(Outcome::AwaitingConfiguration);
                }
            }
            tracing::debug!(stage = %self.stage, "Gate passed");
        }

        self.current = HANDOFF_TITLE;
        reporter.step(total, total, HANDOFF_TITLE);
        self.handoff().await
    }

    async fn handoff(&mut self) -> Result<Outcome, BootstrapError> {
        let invocation = self.ctx.activated()?.invocation(
            Purpose::Worker,
            &self.ctx.config.worker.command,
            &self.ctx.layout.root,
        );
        let exit = self
            .ctx
            .run(&invocation)
            .await
            .map_err(|e| BootstrapError::LaunchFailure(e.to_string()))?;
        self.stage.advance(Stage::Launched);

        if exit.success() {
            self.ctx.reporter.success("Bot exited normally");
        } else {
            self.ctx
                .reporter
                .warn(&format!("Bot exited with code {}", exit.code));
        }
        Ok(Outcome::Exited(exit.code))
    }
}
