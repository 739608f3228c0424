//! Operator-facing status lines
//!
//! `ℹ` info, `⚠` warning, `✗` error, `[n/N]` step markers and `✓` success.
//! Every line is mirrored into `tracing` so the log file tells the same story.

use std::io::{IsTerminal, Write};
use std::sync::Arc;

use crossterm::style::Stylize;
use parking_lot::Mutex;

#[derive(Debug, Clone)]
enum Sink {
    /// stdout, with errors on stderr
    Terminal { color: bool },
    /// Captured lines, uncolored
    Memory(Arc<Mutex<Vec<String>>>),
}

#[derive(Debug, Clone)]
pub struct Reporter {
    sink: Sink,
}

/// Whether status lines should carry ANSI colors
pub fn color_enabled(no_color_flag: bool) -> bool {
    if no_color_flag {
        return false;
    }
    if std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
        return false;
    }
    std::io::stdout().is_terminal()
}

impl Reporter {
    pub fn stdout(color: bool) -> Self {
        Self {
            sink: Sink::Terminal { color },
        }
    }

    /// Reporter that records lines instead of printing them
    pub fn memory() -> Self {
        Self {
            sink: Sink::Memory(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    /// Lines recorded by a [`Reporter::memory`] reporter
    pub fn lines(&self) -> Vec<String> {
        match &self.sink {
            Sink::Memory(lines) => lines.lock().clone(),
            Sink::Terminal { .. } => Vec::new(),
        }
    }

    pub fn step(&self, index: usize, total: usize, title: &str) {
        tracing::info!(step = index, total, "{title}");
        let marker = format!("[{index}/{total}]");
        self.emit(false, &marker, title, |m| m.cyan().bold().to_string());
    }

    pub fn info(&self, message: &str) {
        tracing::info!("{message}");
        self.emit(false, "ℹ", message, |m| m.blue().to_string());
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!("{message}");
        self.emit(false, "⚠", message, |m| m.yellow().to_string());
    }

    pub fn error(&self, message: &str) {
        tracing::error!("{message}");
        self.emit(true, "✗", message, |m| m.red().to_string());
    }

    pub fn success(&self, message: &str) {
        tracing::info!("{message}");
        self.emit(false, "✓", message, |m| m.green().to_string());
    }

    /// Plain text without a marker (instructions, tables)
    pub fn plain(&self, message: &str) {
        match &self.sink {
            Sink::Terminal { .. } => println!("{message}"),
            Sink::Memory(lines) => lines.lock().push(message.to_string()),
        }
    }

    fn emit(&self, to_stderr: bool, marker: &str, message: &str, paint: impl Fn(&str) -> String) {
        match &self.sink {
            Sink::Terminal { color } => {
                let marker = if *color {
                    paint(marker)
                } else {
                    marker.to_string()
                };
                let line = format!("{marker} {message}");
                // A closed pipe must not abort the bootstrap
                if to_stderr {
                    let _ = writeln!(std::io::stderr(), "{line}");
                } else {
                    let _ = writeln!(std::io::stdout(), "{line}");
                }
            }
            Sink::Memory(lines) => lines.lock().push(format!("{marker} {message}")),
        }
    }
}
