//! Workspace orchestration for the flow administration console: view mode,
//! selection, copy/paste, canvas placement and the controller-service table.

pub mod action_state;
pub mod controller_services;
pub mod dispatch;
pub mod error;
pub mod layout;
pub mod nav;
pub mod settings;
pub mod workspace;

pub use action_state::{ActionKind, ActionPhase};
pub use controller_services::{
    ControllerServiceEvent, ControllerServiceTableController, DeleteAffordance,
    EnableDisableAction, FetchSource,
};
pub use dispatch::{ActionDispatchTable, ToolbarAction};
pub use error::WorkspaceError;
pub use layout::CanvasLayout;
pub use nav::NavOverflow;
pub use settings::{LayoutSettings, OfflineSamplePolicy, WorkspaceSettings};
pub use workspace::{CreationForm, WorkspaceController, WorkspaceEvent, WorkspaceSnapshot};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
