//! Toolbar token to behaviour mapping.

use std::{collections::HashMap, fmt, future::Future, str::FromStr, sync::Arc};

use futures::{future::BoxFuture, FutureExt};
use tracing::{debug, info, warn};

use crate::{error::WorkspaceError, workspace::WorkspaceController};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolbarAction {
    Delete,
    Copy,
    Paste,
    Start,
    Stop,
    Enable,
    Disable,
    Configuration,
}

impl ToolbarAction {
    pub const ALL: [ToolbarAction; 8] = [
        Self::Delete,
        Self::Copy,
        Self::Paste,
        Self::Start,
        Self::Stop,
        Self::Enable,
        Self::Disable,
        Self::Configuration,
    ];

    /// The token the toolbar sends for this action. Casing is part of the
    /// token.
    pub fn token(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Copy => "copy",
            Self::Paste => "paste",
            Self::Start => "Start",
            Self::Stop => "Stop",
            Self::Enable => "Enable",
            Self::Disable => "Disable",
            Self::Configuration => "configuration",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownToolbarAction(pub String);

impl fmt::Display for UnknownToolbarAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ignoring unknown toolbar action '{}'", self.0)
    }
}

impl std::error::Error for UnknownToolbarAction {}

impl FromStr for ToolbarAction {
    type Err = UnknownToolbarAction;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.token() == token)
            .ok_or_else(|| UnknownToolbarAction(token.to_string()))
    }
}

pub type ActionHandler = fn(Arc<WorkspaceController>) -> BoxFuture<'static, ()>;

/// Handlers keyed by action, handed to the controller at construction.
#[derive(Clone, Default)]
pub struct ActionDispatchTable {
    handlers: HashMap<ToolbarAction, ActionHandler>,
}

impl ActionDispatchTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_handler(mut self, action: ToolbarAction, handler: ActionHandler) -> Self {
        self.handlers.insert(action, handler);
        self
    }

    pub fn handler(&self, action: ToolbarAction) -> Option<ActionHandler> {
        self.handlers.get(&action).copied()
    }

    pub fn standard() -> Self {
        Self::empty()
            .with_handler(ToolbarAction::Delete, delete)
            .with_handler(ToolbarAction::Copy, copy)
            .with_handler(ToolbarAction::Paste, paste)
            .with_handler(ToolbarAction::Start, start)
            .with_handler(ToolbarAction::Stop, stop)
            .with_handler(ToolbarAction::Enable, enable)
            .with_handler(ToolbarAction::Disable, disable)
            .with_handler(ToolbarAction::Configuration, configuration)
    }
}

fn settle(action: ToolbarAction, result: Result<(), WorkspaceError>) {
    if let Err(err) = result {
        debug!(action = action.token(), "toolbar action ended early: {err}");
    }
}

async fn guarded<F, Fut>(controller: Arc<WorkspaceController>, action: ToolbarAction, run: F)
where
    F: FnOnce(Arc<WorkspaceController>) -> Fut,
    Fut: Future<Output = Result<(), WorkspaceError>>,
{
    if !controller.has_selection().await {
        warn!(action = action.token(), "nothing selected; toolbar action ignored");
        return;
    }
    settle(action, run(controller).await);
}

fn delete(controller: Arc<WorkspaceController>) -> BoxFuture<'static, ()> {
    async move { settle(ToolbarAction::Delete, controller.request_delete().await) }.boxed()
}

fn copy(controller: Arc<WorkspaceController>) -> BoxFuture<'static, ()> {
    async move { settle(ToolbarAction::Copy, controller.copy_selection().await) }.boxed()
}

fn paste(controller: Arc<WorkspaceController>) -> BoxFuture<'static, ()> {
    async move { settle(ToolbarAction::Paste, controller.paste_buffer().await) }.boxed()
}

fn start(controller: Arc<WorkspaceController>) -> BoxFuture<'static, ()> {
    guarded(controller, ToolbarAction::Start, |c| async move {
        c.start_selected().await
    })
    .boxed()
}

fn stop(controller: Arc<WorkspaceController>) -> BoxFuture<'static, ()> {
    guarded(controller, ToolbarAction::Stop, |c| async move {
        c.stop_selected().await
    })
    .boxed()
}

fn enable(controller: Arc<WorkspaceController>) -> BoxFuture<'static, ()> {
    guarded(controller, ToolbarAction::Enable, |c| async move {
        c.enable_selected().await
    })
    .boxed()
}

fn disable(controller: Arc<WorkspaceController>) -> BoxFuture<'static, ()> {
    guarded(controller, ToolbarAction::Disable, |c| async move {
        c.disable_selected().await
    })
    .boxed()
}

/// With a selection, pokes the entity's own configuration affordance;
/// without one, switches to the controller-service table.
fn configuration(controller: Arc<WorkspaceController>) -> BoxFuture<'static, ()> {
    async move {
        if controller.request_configure_selected().await {
            return;
        }
        info!("no selection; opening controller services");
        controller.open_controller_services().await;
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip_with_exact_casing() {
        for action in ToolbarAction::ALL {
            assert_eq!(action.token().parse::<ToolbarAction>(), Ok(action));
        }
        assert!("start".parse::<ToolbarAction>().is_err());
        assert!("Delete".parse::<ToolbarAction>().is_err());
    }

    #[test]
    fn standard_table_covers_every_action() {
        let table = ActionDispatchTable::standard();
        for action in ToolbarAction::ALL {
            assert!(table.handler(action).is_some(), "missing {action:?}");
        }
        assert!(ActionDispatchTable::empty()
            .handler(ToolbarAction::Copy)
            .is_none());
    }
}
