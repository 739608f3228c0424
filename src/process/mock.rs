//! Mock process runner for deterministic testing
//!
//! Implements [`ProcessRunner`] without spawning anything. Each [`Purpose`] can be
//! scripted with an exit code, a spawn failure, or a side effect on the
//! filesystem; every invocation is captured for later verification.
//!
//! # Example
//! ```no_run
//! use launcher::process::{MockProcessRunner, Purpose};
//!
//! let runner = MockProcessRunner::new()
//!     .with_exit_code(Purpose::Preflight, 1)
//!     .with_exit_code(Purpose::Worker, 3);
//! // Hand `runner` to a Bootstrapper, then inspect runner.invocations()
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Invocation, ProcessError, ProcessExit, ProcessRunner, Purpose};
use crate::environment::IsolatedEnv;

/// Filesystem side effect run when an invocation is "executed"
pub type MockEffect = Arc<dyn Fn(&Invocation) + Send + Sync>;

/// Scripted behavior for one purpose
#[derive(Clone, Default)]
pub struct MockResponse {
    pub code: i32,
    pub fail_spawn: bool,
    pub effect: Option<MockEffect>,
}

/// Mock process runner for testing
#[derive(Clone)]
pub struct MockProcessRunner {
    responses: HashMap<Purpose, MockResponse>,
    captured: Arc<Mutex<Vec<Invocation>>>,
}

impl Default for MockProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProcessRunner {
    /// Every purpose succeeds; environment creation lays out an interpreter
    /// inside the target directory the way `python -m venv` would.
    pub fn new() -> Self {
        let runner = Self {
            responses: HashMap::new(),
            captured: Arc::new(Mutex::new(Vec::new())),
        };
        runner.with_effect(Purpose::CreateEnvironment, |inv| {
            if let Some(dir) = inv.args.last() {
                let env = IsolatedEnv::new(dir.into());
                let _ = std::fs::create_dir_all(env.bin_dir());
                let _ = std::fs::write(env.interpreter(), b"");
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let _ = std::fs::set_permissions(
                        env.interpreter(),
                        std::fs::Permissions::from_mode(0o755),
                    );
                }
            }
        })
    }

    /// Configure the exit code returned for a purpose
    pub fn with_exit_code(mut self, purpose: Purpose, code: i32) -> Self {
        self.responses.entry(purpose).or_default().code = code;
        self
    }

    /// Configure a purpose to fail as if its program did not exist
    pub fn failing_spawn(mut self, purpose: Purpose) -> Self {
        self.responses.entry(purpose).or_default().fail_spawn = true;
        self
    }

    /// Configure a side effect for a purpose (replaces any previous one)
    pub fn with_effect<F>(mut self, purpose: Purpose, effect: F) -> Self
    where
        F: Fn(&Invocation) + Send + Sync + 'static,
    {
        self.responses.entry(purpose).or_default().effect = Some(Arc::new(effect));
        self
    }

    /// All captured invocations, in order
    pub fn invocations(&self) -> Vec<Invocation> {
        self.captured.lock().clone()
    }

    /// Captured invocations for one purpose
    pub fn invocations_for(&self, purpose: Purpose) -> Vec<Invocation> {
        self.captured
            .lock()
            .iter()
            .filter(|inv| inv.purpose == purpose)
            .cloned()
            .collect()
    }

    /// Number of times a purpose was run
    pub fn count(&self, purpose: Purpose) -> usize {
        self.captured
            .lock()
            .iter()
            .filter(|inv| inv.purpose == purpose)
            .count()
    }

    pub fn clear(&self) {
        self.captured.lock().clear();
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessExit, ProcessError> {
        self.captured.lock().push(invocation.clone());

        let response = self
            .responses
            .get(&invocation.purpose)
            .cloned()
            .unwrap_or_default();

        if response.fail_spawn {
            return Err(ProcessError::Spawn {
                program: invocation.program.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "mock spawn failure"),
            });
        }

        if let Some(effect) = &response.effect {
            effect(invocation);
        }

        Ok(ProcessExit::new(response.code))
    }
}
