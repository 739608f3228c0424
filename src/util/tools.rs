//! Runtime interpreter detection
//!
//! The launcher needs a Python interpreter to create the isolated environment.
//! An explicitly configured path always wins; otherwise the configured candidate
//! names are searched on `PATH` in order.

use std::path::{Path, PathBuf};

/// Human-readable installation hint shown when no interpreter can be found
pub const RUNTIME_INSTALL_INSTRUCTIONS: &str = "Install Python 3.8 or newer:\n  \
     Debian/Ubuntu: sudo apt install python3 python3-venv\n  \
     macOS:         brew install python\n  \
     Windows:       https://www.python.org/downloads/";

/// Status of the runtime interpreter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ToolStatus {
    /// Interpreter is available at the given path
    Available(PathBuf),
    /// No candidate was found in PATH
    #[default]
    NotFound,
    /// A path was configured in launcher.toml but it's invalid
    ConfiguredPathInvalid(PathBuf),
}

impl ToolStatus {
    /// Check if the interpreter is available
    pub fn is_available(&self) -> bool {
        matches!(self, ToolStatus::Available(_))
    }

    /// Get the path if available
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            ToolStatus::Available(p) => Some(p),
            _ => None,
        }
    }
}

/// Detect the runtime interpreter
///
/// 1. If a path is configured, validate that it exists and is executable
/// 2. Otherwise, use `which` to find the first candidate in PATH
pub fn detect_runtime(configured_path: Option<&PathBuf>, candidates: &[String]) -> ToolStatus {
    if let Some(path) = configured_path {
        if is_valid_executable(path) {
            return ToolStatus::Available(path.clone());
        }
        return ToolStatus::ConfiguredPathInvalid(path.clone());
    }

    for name in candidates {
        if let Ok(path) = which::which(name) {
            tracing::debug!(candidate = %name, path = %path.display(), "Runtime found");
            return ToolStatus::Available(path);
        }
    }

    ToolStatus::NotFound
}

/// Check if a path points to a valid executable
pub fn is_valid_executable(path: &Path) -> bool {
    if !path.exists() {
        return false;
    }

    // On Unix, check if the file is executable
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = path.metadata() {
            return metadata.is_file() && metadata.permissions().mode() & 0o111 != 0;
        }
        false
    }

    // On Windows, just check if the file exists
    #[cfg(not(unix))]
    {
        path.is_file()
    }
}
