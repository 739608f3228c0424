pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod data;
pub mod environment;
pub mod logging;
pub mod process;
pub mod report;
pub mod util;

pub use bootstrap::{BootstrapError, BootstrapOptions, Bootstrapper, Outcome, Stage};
pub use config::LauncherConfig;
pub use data::{BackupManager, Database};
pub use environment::{ActivatedEnv, IsolatedEnv};
pub use process::{Invocation, MockProcessRunner, ProcessRunner, Purpose, SystemRunner};
pub use report::Reporter;
pub use util::ProjectLayout;
