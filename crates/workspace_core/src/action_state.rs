use std::collections::HashMap;

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    CreateProcessGroup,
    CreateProcessor,
    Copy,
    Paste,
    Start,
    Stop,
    Enable,
    Disable,
    Delete,
}

impl ActionKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::CreateProcessGroup => "create_process_group",
            Self::CreateProcessor => "create_processor",
            Self::Copy => "copy",
            Self::Paste => "paste",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Enable => "enable",
            Self::Disable => "disable",
            Self::Delete => "delete",
        }
    }
}

/// Lifecycle of one mutating action: `Idle -> Pending -> Committed | RolledBack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionPhase {
    #[default]
    Idle,
    Pending,
    Committed,
    RolledBack,
}

#[derive(Debug, Default)]
pub(crate) struct ActionTracker {
    phases: HashMap<ActionKind, ActionPhase>,
}

impl ActionTracker {
    pub(crate) fn phase(&self, action: ActionKind) -> ActionPhase {
        self.phases.get(&action).copied().unwrap_or_default()
    }

    /// Applies a transition and reports whether it was legal. Settling an
    /// action that is not pending is ignored.
    pub(crate) fn transition(&mut self, action: ActionKind, next: ActionPhase) -> bool {
        let current = self.phase(action);
        let legal = match next {
            ActionPhase::Pending => true,
            ActionPhase::Committed | ActionPhase::RolledBack => current == ActionPhase::Pending,
            ActionPhase::Idle => false,
        };
        if !legal {
            debug!(
                action = action.name(),
                ?current,
                ?next,
                "ignoring illegal action transition"
            );
            return false;
        }
        self.phases.insert(action, next);
        true
    }
}
