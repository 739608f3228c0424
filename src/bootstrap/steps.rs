//! The setup gates, in the order they run
//!
//! Each step pairs a side-effect-free satisfaction check with the action that
//! satisfies it. Skippable steps whose check passes are not applied again.

use std::fs;

use async_trait::async_trait;

use super::context::BootstrapContext;
use super::error::BootstrapError;
use super::stage::Stage;
use crate::config::MissingConfigPolicy;
use crate::data::Database;
use crate::environment::IsolatedEnv;
use crate::process::Purpose;
use crate::util::{detect_runtime, ToolStatus};

/// Result of applying a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    /// Stop without error; the operator has to act before the next run
    Halted,
}

#[async_trait]
pub trait SetupStep: Send + Sync {
    fn title(&self) -> &'static str;

    /// Stage reached once this step is satisfied
    fn reached(&self) -> Stage;

    /// Whether the step's effect is already in place. Must not modify anything.
    fn is_satisfied(&self, ctx: &BootstrapContext) -> bool;

    /// Steps that bind state into the context run every time
    fn skippable(&self) -> bool {
        true
    }

    /// Steps with no persistent effect to check; `status` reports them as info
    fn runs_every_launch(&self) -> bool {
        false
    }

    /// Shown by `status` when the check does not pass
    fn pending_note(&self) -> &'static str {
        "pending"
    }

    async fn apply(&self, ctx: &mut BootstrapContext) -> Result<StepOutcome, BootstrapError>;
}

/// The gate list for a run
pub fn setup_steps(preflight: bool) -> Vec<Box<dyn SetupStep>> {
    let mut steps: Vec<Box<dyn SetupStep>> = vec![
        Box::new(RuntimeCheck),
        Box::new(ProvisionEnvironment),
        Box::new(ActivateEnvironment),
        Box::new(InstallDependencies),
        Box::new(MaterializeConfiguration),
        Box::new(InitializeStore),
        Box::new(CreateDirectories),
    ];
    if preflight {
        steps.push(Box::new(PreflightTests));
    }
    steps
}

fn detect(ctx: &BootstrapContext) -> ToolStatus {
    detect_runtime(
        ctx.config.runtime.path.as_ref(),
        &ctx.config.runtime.candidates,
    )
}

pub struct RuntimeCheck;

#[async_trait]
impl SetupStep for RuntimeCheck {
    fn title(&self) -> &'static str {
        "Checking Python runtime"
    }

    fn reached(&self) -> Stage {
        Stage::RuntimeChecked
    }

    fn is_satisfied(&self, ctx: &BootstrapContext) -> bool {
        detect(ctx).is_available()
    }

    fn skippable(&self) -> bool {
        false
    }

    fn pending_note(&self) -> &'static str {
        "no interpreter found"
    }

    async fn apply(&self, ctx: &mut BootstrapContext) -> Result<StepOutcome, BootstrapError> {
        match detect(ctx) {
            ToolStatus::Available(path) => {
                ctx.reporter
                    .info(&format!("Using runtime {}", path.display()));
                ctx.runtime = Some(path);
                Ok(StepOutcome::Completed)
            }
            ToolStatus::NotFound => Err(BootstrapError::MissingRuntime {
                detail: format!(
                    "none of {} found on PATH",
                    ctx.config.runtime.candidates.join(", ")
                ),
            }),
            ToolStatus::ConfiguredPathInvalid(path) => Err(BootstrapError::MissingRuntime {
                detail: format!("{} is not an executable file", path.display()),
            }),
        }
    }
}

pub struct ProvisionEnvironment;

#[async_trait]
impl SetupStep for ProvisionEnvironment {
    fn title(&self) -> &'static str {
        "Provisioning isolated environment"
    }

    fn reached(&self) -> Stage {
        Stage::EnvReady
    }

    fn is_satisfied(&self, ctx: &BootstrapContext) -> bool {
        IsolatedEnv::new(ctx.layout.env_dir.clone()).exists()
    }

    async fn apply(&self, ctx: &mut BootstrapContext) -> Result<StepOutcome, BootstrapError> {
        let runtime = ctx.runtime.clone().ok_or_else(|| BootstrapError::MissingRuntime {
            detail: "runtime was not checked".into(),
        })?;
        let env = IsolatedEnv::new(ctx.layout.env_dir.clone());
        let invocation = env.creation_invocation(&runtime, &ctx.layout.root);

        let exit = ctx
            .run(&invocation)
            .await
            .map_err(|e| BootstrapError::EnvironmentFailure(e.to_string()))?;
        if !exit.success() {
            return Err(BootstrapError::EnvironmentFailure(format!(
                "`{}` exited with code {}",
                invocation.display(),
                exit.code
            )));
        }
        if !env.exists() {
            return Err(BootstrapError::EnvironmentFailure(format!(
                "{} was not created",
                env.dir().display()
            )));
        }

        ctx.reporter.success(&format!(
            "Created isolated environment at {}",
            env.dir().display()
        ));
        Ok(StepOutcome::Completed)
    }
}

pub struct ActivateEnvironment;

#[async_trait]
impl SetupStep for ActivateEnvironment {
    fn title(&self) -> &'static str {
        "Activating environment"
    }

    fn reached(&self) -> Stage {
        Stage::EnvActive
    }

    fn is_satisfied(&self, ctx: &BootstrapContext) -> bool {
        let env = IsolatedEnv::new(ctx.layout.env_dir.clone());
        env.exists() && env.interpreter().exists()
    }

    fn skippable(&self) -> bool {
        false
    }

    fn pending_note(&self) -> &'static str {
        "no interpreter in environment"
    }

    async fn apply(&self, ctx: &mut BootstrapContext) -> Result<StepOutcome, BootstrapError> {
        let activated = IsolatedEnv::new(ctx.layout.env_dir.clone()).activate()?;
        ctx.reporter.info(&format!(
            "Environment active ({})",
            activated.interpreter().display()
        ));
        ctx.env = Some(activated);
        Ok(StepOutcome::Completed)
    }
}

pub struct InstallDependencies;

#[async_trait]
impl SetupStep for InstallDependencies {
    fn title(&self) -> &'static str {
        "Installing dependencies"
    }

    fn reached(&self) -> Stage {
        Stage::DepsReady
    }

    fn is_satisfied(&self, ctx: &BootstrapContext) -> bool {
        ctx.layout.deps_marker.exists()
    }

    async fn apply(&self, ctx: &mut BootstrapContext) -> Result<StepOutcome, BootstrapError> {
        let requirements = ctx.layout.requirements.clone();
        if !requirements.is_file() {
            return Err(BootstrapError::InstallFailure(format!(
                "requirements file {} not found",
                requirements.display()
            )));
        }
        let env = ctx.activated()?.clone();
        let root = ctx.layout.root.clone();

        if ctx.config.dependencies.upgrade_pip {
            let upgrade = env.pip_invocation(
                Purpose::UpgradePip,
                &["install", "--upgrade", "pip"],
                &root,
            );
            match ctx.run(&upgrade).await {
                Ok(exit) if exit.success() => {}
                Ok(exit) => ctx.reporter.warn(&format!(
                    "pip upgrade exited with code {}, continuing with the bundled pip",
                    exit.code
                )),
                Err(e) => ctx
                    .reporter
                    .warn(&format!("pip upgrade failed ({e}), continuing")),
            }
        }

        let requirements_arg = requirements.to_string_lossy().into_owned();
        let install = env.pip_invocation(
            Purpose::InstallDependencies,
            &["install", "-r", &requirements_arg],
            &root,
        );
        let exit = ctx
            .run(&install)
            .await
            .map_err(|e| BootstrapError::InstallFailure(e.to_string()))?;
        if !exit.success() {
            return Err(BootstrapError::InstallFailure(format!(
                "pip exited with code {}",
                exit.code
            )));
        }

        let marker = &ctx.layout.deps_marker;
        if let Some(parent) = marker.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| BootstrapError::io("Failed to create marker directory", parent, e))?;
        }
        fs::write(marker, b"")
            .map_err(|e| BootstrapError::io("Failed to write dependency marker", marker, e))?;

        ctx.reporter.success("Dependencies installed");
        Ok(StepOutcome::Completed)
    }
}

pub struct MaterializeConfiguration;

impl MaterializeConfiguration {
    fn print_instructions(ctx: &BootstrapContext) {
        let file = ctx.layout.config_file.display();
        ctx.reporter
            .warn(&format!("{file} was created from the template and needs your values:"));
        ctx.reporter
            .plain("    BOT_TOKEN      token issued by @BotFather");
        ctx.reporter
            .plain("    ADMIN_USER_ID  your numeric Telegram user id");
    }
}

#[async_trait]
impl SetupStep for MaterializeConfiguration {
    fn title(&self) -> &'static str {
        "Preparing bot configuration"
    }

    fn reached(&self) -> Stage {
        Stage::ConfigReady
    }

    fn is_satisfied(&self, ctx: &BootstrapContext) -> bool {
        ctx.layout.config_file.exists()
    }

    async fn apply(&self, ctx: &mut BootstrapContext) -> Result<StepOutcome, BootstrapError> {
        let file = &ctx.layout.config_file;
        let template = &ctx.layout.config_template;
        if !template.is_file() {
            return Err(BootstrapError::MissingConfiguration(format!(
                "{} does not exist and there is no template {} to create it from",
                file.display(),
                template.display()
            )));
        }
        fs::copy(template, file)
            .map_err(|e| BootstrapError::io("Failed to copy configuration template", file, e))?;
        tracing::info!(
            file = %file.display(),
            template = %template.display(),
            policy = ctx.policy.as_str(),
            "Configuration file created from template"
        );

        Self::print_instructions(ctx);
        match ctx.policy {
            MissingConfigPolicy::Halt => {
                ctx.reporter
                    .info("Fill in the file, then run the launcher again.");
                Ok(StepOutcome::Halted)
            }
            MissingConfigPolicy::Prompt => {
                let prompt = format!("Edit {} now.", ctx.layout.config_file.display());
                if ctx.confirm.confirm(&prompt).await {
                    Ok(StepOutcome::Completed)
                } else {
                    ctx.reporter
                        .info("Stopped. Fill in the file, then run the launcher again.");
                    Ok(StepOutcome::Halted)
                }
            }
        }
    }
}

pub struct InitializeStore;

#[async_trait]
impl SetupStep for InitializeStore {
    fn title(&self) -> &'static str {
        "Initializing game database"
    }

    fn reached(&self) -> Stage {
        Stage::StoreReady
    }

    fn is_satisfied(&self, ctx: &BootstrapContext) -> bool {
        ctx.layout.effective_store_file().exists()
    }

    async fn apply(&self, ctx: &mut BootstrapContext) -> Result<StepOutcome, BootstrapError> {
        let store = ctx.layout.effective_store_file();

        match ctx.config.store.initializer.clone() {
            Some(command) => {
                let invocation = ctx.activated()?.invocation(
                    Purpose::InitializeStore,
                    &command,
                    &ctx.layout.root,
                );
                let exit = ctx
                    .run(&invocation)
                    .await
                    .map_err(|e| BootstrapError::StoreInitFailure(e.to_string()))?;
                if !exit.success() {
                    return Err(BootstrapError::StoreInitFailure(format!(
                        "initializer exited with code {}",
                        exit.code
                    )));
                }
                if !store.exists() {
                    return Err(BootstrapError::StoreInitFailure(format!(
                        "initializer succeeded but {} was not created",
                        store.display()
                    )));
                }
            }
            None => {
                let db = Database::open(store.clone())
                    .map_err(|e| BootstrapError::StoreInitFailure(e.to_string()))?;
                let tables = db
                    .table_names()
                    .map_err(|e| BootstrapError::StoreInitFailure(e.to_string()))?;
                tracing::info!(store = %store.display(), tables = tables.len(), "Store schema created");
            }
        }

        ctx.reporter
            .success(&format!("Database ready at {}", store.display()));
        Ok(StepOutcome::Completed)
    }
}

pub struct CreateDirectories;

#[async_trait]
impl SetupStep for CreateDirectories {
    fn title(&self) -> &'static str {
        "Creating working directories"
    }

    fn reached(&self) -> Stage {
        Stage::DirsReady
    }

    fn is_satisfied(&self, ctx: &BootstrapContext) -> bool {
        ctx.layout.aux_dirs.iter().all(|dir| dir.is_dir())
    }

    async fn apply(&self, ctx: &mut BootstrapContext) -> Result<StepOutcome, BootstrapError> {
        for dir in &ctx.layout.aux_dirs {
            if dir.is_dir() {
                continue;
            }
            fs::create_dir_all(dir)
                .map_err(|e| BootstrapError::io("Failed to create directory", dir, e))?;
            ctx.reporter.info(&format!("Created {}", dir.display()));
        }
        Ok(StepOutcome::Completed)
    }
}

pub struct PreflightTests;

#[async_trait]
impl SetupStep for PreflightTests {
    fn title(&self) -> &'static str {
        "Running preflight tests"
    }

    fn reached(&self) -> Stage {
        Stage::TestsPassed
    }

    fn is_satisfied(&self, _ctx: &BootstrapContext) -> bool {
        false
    }

    fn skippable(&self) -> bool {
        false
    }

    fn runs_every_launch(&self) -> bool {
        true
    }

    fn pending_note(&self) -> &'static str {
        "runs before every launch"
    }

    async fn apply(&self, ctx: &mut BootstrapContext) -> Result<StepOutcome, BootstrapError> {
        let invocation = ctx.activated()?.invocation(
            Purpose::Preflight,
            &ctx.config.preflight.command,
            &ctx.layout.root,
        );
        let exit = ctx
            .run(&invocation)
            .await
            .map_err(|e| BootstrapError::PreflightTestFailure(e.to_string()))?;
        if !exit.success() {
            return Err(BootstrapError::PreflightTestFailure(format!(
                "exit code {}",
                exit.code
            )));
        }
        ctx.reporter.success("Preflight tests passed");
        Ok(StepOutcome::Completed)
    }
}
