use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::util::ProjectLayout;

/// Install the global tracing subscriber.
///
/// Logs go to `logs/launcher.log` once the project's logs directory exists
/// (it is created by the directories gate); before that, warnings go to stderr
/// so an early abort leaves nothing behind. `RUST_LOG` overrides the level.
/// Returns the log file in use, if any.
pub fn init(layout: &ProjectLayout) -> Option<PathBuf> {
    if layout.logs_dir.is_dir() {
        let path = layout.log_file_path();
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(log_file) => {
                let installed = tracing_subscriber::fmt()
                    .with_env_filter(filter("info"))
                    .with_writer(Mutex::new(log_file))
                    .with_ansi(false) // Disable ANSI colors in log file
                    .try_init()
                    .is_ok();
                return installed.then_some(path);
            }
            Err(e) => eprintln!("Cannot open {}: {e}; logging to stderr", path.display()),
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter("warn"))
        .with_writer(std::io::stderr)
        .try_init();
    None
}

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}
