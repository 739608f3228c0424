//! Environment bootstrapper
//!
//! Walks the setup gates (runtime, environment, dependencies, configuration,
//! store, directories, optional preflight tests) strictly in order and then
//! hands the process over to the bot worker. A gate that fails aborts the run;
//! gates already satisfied by an earlier run are skipped.

mod bootstrapper;
mod confirm;
mod context;
mod error;
mod stage;
mod steps;

pub use bootstrapper::{Bootstrapper, Outcome, StepStatus};
pub use confirm::{Confirm, ScriptedConfirm, StdinConfirm};
pub use context::{BootstrapContext, BootstrapOptions};
pub use error::BootstrapError;
pub use stage::Stage;
pub use steps::{setup_steps, SetupStep, StepOutcome};
