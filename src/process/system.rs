use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::{Invocation, ProcessError, ProcessExit, ProcessRunner};

/// Runs processes for real, with the launcher's stdio inherited.
///
/// Ctrl-C is delivered to the whole foreground process group, so the child sees
/// it directly. No interrupt handler is installed: the launcher keeps the default
/// SIGINT disposition and still terminates on Ctrl-C between children.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }

    fn build_command(invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        for key in &invocation.env_remove {
            cmd.env_remove(key);
        }
        for (key, value) in &invocation.env {
            cmd.env(key, value);
        }
        cmd
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessExit, ProcessError> {
        let program = invocation.program.display().to_string();
        let mut child = Self::build_command(invocation)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: program.clone(),
                source,
            })?;

        tracing::info!(
            purpose = %invocation.purpose,
            pid = child.id(),
            command = %invocation.display(),
            "Process started"
        );

        let status = child.wait().await.map_err(|source| ProcessError::Wait {
            program: program.clone(),
            source,
        })?;

        let exit = ProcessExit::from_status(status);
        tracing::info!(purpose = %invocation.purpose, code = exit.code, "Process exited");
        Ok(exit)
    }
}
