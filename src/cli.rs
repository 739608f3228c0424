//! Command line
//!
//! `launcher` with no arguments bootstraps the project in the current directory
//! and launches the bot. Subcommands cover inspection and store maintenance.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::bootstrap::{BootstrapOptions, Bootstrapper, StdinConfirm};
use crate::config::{LauncherConfig, EXAMPLE_CONFIG};
use crate::data::{BackupError, BackupManager};
use crate::logging;
use crate::process::SystemRunner;
use crate::report::{color_enabled, Reporter};
use crate::util::ProjectLayout;

#[derive(Debug, Parser)]
#[command(
    name = "launcher",
    version,
    about = "Prepare the environment of the Legends of Valhalla bot and start it"
)]
pub struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Wait for confirmation instead of stopping when .env has to be created
    #[arg(long, global = true)]
    pub interactive: bool,

    /// Run the preflight tests before launching
    #[arg(long, global = true, conflicts_with = "skip_preflight")]
    pub preflight: bool,

    /// Skip the preflight tests even if launcher.toml enables them
    #[arg(long, global = true)]
    pub skip_preflight: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Bootstrap the environment and start the bot (default)
    Launch,
    /// Show which setup gates are already satisfied
    Status,
    /// Manage database backups
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },
    /// Print a documented launcher.toml with the default settings
    ExampleConfig,
}

#[derive(Debug, Clone, Subcommand)]
pub enum BackupAction {
    /// Snapshot the database and prune old backups
    Create,
    /// Replace the database with a backup
    Restore {
        #[arg(long, value_name = "PATH")]
        file: PathBuf,
    },
    /// List backups, newest first
    List {
        #[arg(long)]
        json: bool,
    },
    /// Delete backups older than the retention period
    Clean,
    /// Show backup totals
    Stats {
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    fn options(&self) -> BootstrapOptions {
        let preflight = if self.preflight {
            Some(true)
        } else if self.skip_preflight {
            Some(false)
        } else {
            None
        };
        BootstrapOptions {
            interactive: self.interactive,
            preflight,
        }
    }
}

/// Run the parsed command line; returns the process exit code
pub async fn execute(cli: Cli) -> anyhow::Result<i32> {
    let reporter = Reporter::stdout(color_enabled(cli.no_color));

    match cli.command.clone().unwrap_or(Command::Launch) {
        Command::ExampleConfig => {
            print!("{EXAMPLE_CONFIG}");
            Ok(0)
        }
        Command::Launch => {
            let Some((config, layout)) = open_project(&cli, &reporter)? else {
                return Ok(1);
            };
            let mut bootstrapper = Bootstrapper::new(
                layout,
                config,
                cli.options(),
                Arc::new(SystemRunner::new()),
                Arc::new(StdinConfirm),
                reporter,
            );
            Ok(match bootstrapper.run().await {
                Ok(outcome) => outcome.exit_code(),
                Err(err) => err.exit_code(),
            })
        }
        Command::Status => {
            let Some((config, layout)) = open_project(&cli, &reporter)? else {
                return Ok(1);
            };
            let policy = if cli.interactive {
                "prompt"
            } else {
                config.configuration.on_missing.as_str()
            };
            reporter.info(&format!("Project root: {}", layout.root.display()));
            reporter.info(&format!("Missing configuration policy: {policy}"));
            reporter.info(&format!(
                "Database: {}",
                layout.effective_store_file().display()
            ));
            let bootstrapper = Bootstrapper::new(
                layout,
                config,
                cli.options(),
                Arc::new(SystemRunner::new()),
                Arc::new(StdinConfirm),
                reporter.clone(),
            );
            for gate in bootstrapper.status() {
                if gate.satisfied {
                    reporter.success(gate.title);
                } else if gate.runs_every_launch {
                    reporter.info(&format!("{}: {}", gate.title, gate.note));
                } else {
                    reporter.warn(&format!("{}: {}", gate.title, gate.note));
                }
            }
            Ok(0)
        }
        Command::Backup { action } => {
            let Some((config, layout)) = open_project(&cli, &reporter)? else {
                return Ok(1);
            };
            let manager = BackupManager::new(
                layout.effective_store_file(),
                layout.backup_dir.clone(),
                config.backup.keep_days,
            );
            match run_backup(&manager, action, &reporter) {
                Ok(()) => Ok(0),
                Err(e) => {
                    reporter.error(&e.to_string());
                    Ok(1)
                }
            }
        }
    }
}

/// Load launcher.toml and start logging for commands that work on a project.
/// Returns `None` after reporting an invalid configuration.
fn open_project(
    cli: &Cli,
    reporter: &Reporter,
) -> anyhow::Result<Option<(LauncherConfig, ProjectLayout)>> {
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("Failed to determine the current directory")?,
    };
    let config = match LauncherConfig::load(&root) {
        Ok(config) => config,
        Err(e) => {
            reporter.error(&e.to_string());
            return Ok(None);
        }
    };
    let layout = ProjectLayout::resolve(&root, &config);
    let log_file = logging::init(&layout);
    tracing::info!(
        root = %root.display(),
        version = env!("CARGO_PKG_VERSION"),
        log_file = ?log_file,
        "Launcher started"
    );
    Ok(Some((config, layout)))
}

/// Status byte handed to the OS for an exit code.
///
/// Unix only keeps the low 8 bits, so codes are wrapped the same way a shell
/// would see them. Elsewhere the full 32-bit code survives only through
/// `std::process::exit`, signalled by `None`.
pub fn exit_status_byte(code: i32) -> Option<u8> {
    if cfg!(unix) {
        Some((code & 0xff) as u8)
    } else {
        u8::try_from(code).ok()
    }
}

fn run_backup(
    manager: &BackupManager,
    action: BackupAction,
    reporter: &Reporter,
) -> Result<(), BackupError> {
    match action {
        BackupAction::Create => {
            let path = manager.create()?;
            reporter.success(&format!("Backup created: {}", path.display()));
        }
        BackupAction::Restore { file } => {
            let preserved = manager.restore(&file)?;
            if let Some(preserved) = preserved {
                reporter.info(&format!(
                    "Previous database saved as {}",
                    preserved.display()
                ));
            }
            reporter.success(&format!("Database restored from {}", file.display()));
        }
        BackupAction::List { json } => {
            let backups = manager.list()?;
            if json {
                print_json(&backups);
            } else if backups.is_empty() {
                reporter.info(&format!(
                    "No backups in {}",
                    manager.backup_dir().display()
                ));
            } else {
                for backup in &backups {
                    reporter.plain(&format!(
                        "{:<40} {:>9.2} MB  {}",
                        backup.filename, backup.size_mb, backup.created
                    ));
                }
            }
        }
        BackupAction::Clean => {
            let removed = manager.cleanup()?;
            reporter.success(&format!("Removed {} old backup(s)", removed.len()));
        }
        BackupAction::Stats { json } => {
            let stats = manager.stats()?;
            if json {
                print_json(&stats);
            } else {
                reporter.plain(&format!("Backups:    {}", stats.total_backups));
                reporter.plain(&format!("Total size: {:.2} MB", stats.total_size_mb));
                reporter.plain(&format!(
                    "Latest:     {}",
                    stats.latest_backup.as_deref().unwrap_or("-")
                ));
                reporter.plain(&format!(
                    "Oldest:     {}",
                    stats.oldest_backup.as_deref().unwrap_or("-")
                ));
            }
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "Failed to serialize output"),
    }
}
