use std::fmt;

/// Where a bootstrap run currently stands.
///
/// Declaration order is the forward order of the gates; `AwaitingConfig` and
/// `Aborted` are terminal and sort after everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Start,
    RuntimeChecked,
    EnvReady,
    EnvActive,
    DepsReady,
    ConfigReady,
    StoreReady,
    DirsReady,
    TestsPassed,
    Launched,
    AwaitingConfig,
    Aborted,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Start => "START",
            Stage::RuntimeChecked => "RUNTIME_CHECKED",
            Stage::EnvReady => "ENV_READY",
            Stage::EnvActive => "ENV_ACTIVE",
            Stage::DepsReady => "DEPS_READY",
            Stage::ConfigReady => "CONFIG_READY",
            Stage::StoreReady => "STORE_READY",
            Stage::DirsReady => "DIRS_READY",
            Stage::TestsPassed => "TESTS_PASSED",
            Stage::Launched => "LAUNCHED",
            Stage::AwaitingConfig => "AWAITING_CONFIG",
            Stage::Aborted => "ABORTED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Launched | Stage::AwaitingConfig | Stage::Aborted)
    }

    /// Move to `next` if that is a forward transition; returns whether it moved
    pub fn advance(&mut self, next: Stage) -> bool {
        if self.is_terminal() || next <= *self {
            return false;
        }
        *self = next;
        true
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
