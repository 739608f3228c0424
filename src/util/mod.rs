//! Utility modules

pub mod paths;
pub mod tools;

pub use paths::{ProjectLayout, LAUNCHER_CONFIG_FILE, LAUNCHER_LOG_FILE};
pub use tools::{detect_runtime, is_valid_executable, ToolStatus, RUNTIME_INSTALL_INSTRUCTIONS};
