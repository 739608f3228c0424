//! Operator confirmation for the interactive missing-configuration policy

use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

#[async_trait]
pub trait Confirm: Send + Sync {
    /// Ask the operator; `false` means stop
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Reads the answer from stdin. Closed stdin counts as "no".
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirm;

impl StdinConfirm {
    fn ask(prompt: &str) -> bool {
        let mut stdout = std::io::stdout();
        let _ = write!(stdout, "{prompt} [Enter to continue, n to stop] ");
        let _ = stdout.flush();

        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => is_affirmative(&answer),
        }
    }
}

#[async_trait]
impl Confirm for StdinConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || Self::ask(&prompt))
            .await
            .unwrap_or(false)
    }
}

fn is_affirmative(answer: &str) -> bool {
    !matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "n" | "no" | "q" | "quit"
    )
}

/// Pre-recorded answers for tests; runs out as "no"
#[derive(Debug, Clone, Default)]
pub struct ScriptedConfirm {
    answers: Arc<Mutex<VecDeque<bool>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConfirm {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Arc::new(Mutex::new(answers.into_iter().collect())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Prompts shown so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl Confirm for ScriptedConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().push(prompt.to_string());
        self.answers.lock().pop_front().unwrap_or(false)
    }
}
