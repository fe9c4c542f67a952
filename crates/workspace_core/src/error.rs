use thiserror::Error;

/// Why a workspace operation did not complete. Every variant is logged where
/// it arises; none of them leaves the workspace unusable.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("no entity is selected")]
    NoSelection,
    #[error("parent process group id is not known yet")]
    MissingParentGroup,
    #[error("process group name must not be empty")]
    EmptyName,
    #[error("nothing has been copied yet")]
    EmptyCopyBuffer,
    #[error("no process group is open")]
    NotInsideGroup,
    #[error("no delete is awaiting confirmation")]
    NoPendingDelete,
    #[error("workspace has been shut down")]
    TornDown,
    #[error("discarded stale result from generation {generation} (latest is {latest})")]
    StaleResult { generation: u64, latest: u64 },
    #[error("controller service {0} is not in the current list")]
    UnknownControllerService(String),
    #[error("{action} failed: {source}")]
    Remote {
        action: &'static str,
        source: anyhow::Error,
    },
}

impl WorkspaceError {
    pub fn remote(action: &'static str, source: anyhow::Error) -> Self {
        Self::Remote { action, source }
    }
}
