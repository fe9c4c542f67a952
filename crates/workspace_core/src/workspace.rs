use std::{collections::HashMap, sync::Arc};

use flow_api::{FlowApi, FlowStatus};
use shared::{
    domain::{ComponentId, Position, ProcessGroupView, ProcessorView, Selection, ViewMode},
    mapper::{map_process_group_for_display, map_processors_for_display},
    protocol::{CopyBuffer, ProcessorSpec, ScheduledState},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::{
    action_state::{ActionKind, ActionPhase, ActionTracker},
    dispatch::{ActionDispatchTable, ToolbarAction},
    error::WorkspaceError,
    layout::CanvasLayout,
    settings::WorkspaceSettings,
};

/// Tab index that opens the process-group creation panel.
pub const CREATE_TAB_INDEX: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CreationForm {
    pub open: bool,
    pub name: String,
    pub parameter_context: Option<String>,
}

#[derive(Debug, Clone)]
pub enum WorkspaceEvent {
    ViewChanged(ViewMode),
    SelectionChanged(Option<Selection>),
    ProcessGroupsUpdated(Vec<ProcessGroupView>),
    ProcessorsUpdated(Vec<ProcessorView>),
    CopyBufferChanged { filled: bool },
    DeleteConfirmationRequested(Selection),
    ConfigureRequested { id: ComponentId, counter: u64 },
    CreationPanelChanged { open: bool },
    ActionPhaseChanged { action: ActionKind, phase: ActionPhase },
    StaleResultDiscarded { generation: u64, latest: u64 },
    FlowStatusUpdated(FlowStatus),
    Alert(String),
}

/// Point-in-time copy of the controller state for rendering.
#[derive(Debug, Clone)]
pub struct WorkspaceSnapshot {
    pub view: ViewMode,
    pub root_group_id: Option<ComponentId>,
    pub process_groups: Vec<ProcessGroupView>,
    pub processors: Vec<ProcessorView>,
    pub selection: Option<Selection>,
    pub has_copy_buffer: bool,
    pub pending_delete: Option<Selection>,
    pub creation_form: CreationForm,
    pub active_tab: usize,
    pub flow_status: Option<FlowStatus>,
}

#[derive(Default)]
struct WorkspaceState {
    view: ViewMode,
    root_group_id: Option<ComponentId>,
    flow_status: Option<FlowStatus>,
    process_groups: Vec<ProcessGroupView>,
    processors: Vec<ProcessorView>,
    selection: Option<Selection>,
    copy_buffer: Option<CopyBuffer>,
    pending_delete: Option<Selection>,
    creation_form: CreationForm,
    active_tab: usize,
    configure_counters: HashMap<ComponentId, u64>,
    list_generation: u64,
    actions: ActionTracker,
    torn_down: bool,
}

impl WorkspaceState {
    /// The group whose children are listed and created into: the open group
    /// when inside one, the root otherwise.
    fn parent_group_id(&self) -> Option<ComponentId> {
        self.view
            .current_group_id()
            .cloned()
            .or_else(|| self.root_group_id.clone())
    }

    fn bump_generation(&mut self) -> u64 {
        self.list_generation += 1;
        self.list_generation
    }
}

pub struct WorkspaceController {
    api: Arc<dyn FlowApi>,
    settings: WorkspaceSettings,
    layout: CanvasLayout,
    dispatch: ActionDispatchTable,
    inner: Mutex<WorkspaceState>,
    events: broadcast::Sender<WorkspaceEvent>,
}

impl WorkspaceController {
    pub fn new(
        api: Arc<dyn FlowApi>,
        settings: WorkspaceSettings,
        dispatch: ActionDispatchTable,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            api,
            layout: CanvasLayout::new(settings.layout.clone()),
            settings,
            dispatch,
            inner: Mutex::new(WorkspaceState::default()),
            events,
        })
    }

    pub fn with_defaults(api: Arc<dyn FlowApi>) -> Arc<Self> {
        Self::new(
            api,
            WorkspaceSettings::default(),
            ActionDispatchTable::standard(),
        )
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<WorkspaceEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: WorkspaceEvent) {
        let _ = self.events.send(event);
    }

    fn transition(&self, state: &mut WorkspaceState, action: ActionKind, phase: ActionPhase) {
        if state.actions.transition(action, phase) {
            self.emit(WorkspaceEvent::ActionPhaseChanged { action, phase });
        }
    }

    pub async fn snapshot(&self) -> WorkspaceSnapshot {
        let guard = self.inner.lock().await;
        WorkspaceSnapshot {
            view: guard.view.clone(),
            root_group_id: guard.root_group_id.clone(),
            process_groups: guard.process_groups.clone(),
            processors: guard.processors.clone(),
            selection: guard.selection.clone(),
            has_copy_buffer: guard.copy_buffer.is_some(),
            pending_delete: guard.pending_delete.clone(),
            creation_form: guard.creation_form.clone(),
            active_tab: guard.active_tab,
            flow_status: guard.flow_status.clone(),
        }
    }

    pub async fn action_phase(&self, action: ActionKind) -> ActionPhase {
        self.inner.lock().await.actions.phase(action)
    }

    pub async fn has_selection(&self) -> bool {
        self.inner.lock().await.selection.is_some()
    }

    /// Stops applying results. Calls still in flight settle into nothing.
    pub async fn shutdown(&self) {
        let mut guard = self.inner.lock().await;
        guard.torn_down = true;
        info!("workspace controller shut down");
    }

    pub async fn initialize(&self) -> Result<(), WorkspaceError> {
        if let Err(err) = self.api.authenticate().await {
            error!("authentication failed: {err:#}");
            self.emit(WorkspaceEvent::Alert(format!("Sign-in failed: {err}")));
            return Err(WorkspaceError::remote("authenticate", err));
        }

        match self.api.get_flow_status().await {
            Ok(status) => {
                let mut guard = self.inner.lock().await;
                guard.flow_status = Some(status.clone());
                drop(guard);
                self.emit(WorkspaceEvent::FlowStatusUpdated(status));
            }
            Err(err) => warn!("failed to fetch flow status: {err:#}"),
        }

        self.resolve_root_group_id().await?;
        self.refetch().await
    }

    /// Asks the server for the root group id. Also the retry path after a
    /// failed [`initialize`](Self::initialize).
    pub async fn resolve_root_group_id(&self) -> Result<ComponentId, WorkspaceError> {
        let root = self.api.get_root_process_group_id().await.map_err(|err| {
            error!("failed to resolve root process group id: {err:#}");
            WorkspaceError::remote("get_root_process_group_id", err)
        })?;
        let mut guard = self.inner.lock().await;
        if guard.torn_down {
            return Err(WorkspaceError::TornDown);
        }
        guard.root_group_id = Some(root.clone());
        info!(root_group_id = %root, "resolved root process group");
        Ok(root)
    }

    /// Reloads the list for the current parent group. Results from a fetch
    /// that was overtaken by a newer fetch or a view change are discarded.
    pub async fn refetch(&self) -> Result<(), WorkspaceError> {
        let (generation, parent, inside_group) = {
            let mut guard = self.inner.lock().await;
            if guard.torn_down {
                return Err(WorkspaceError::TornDown);
            }
            let Some(parent) = guard.parent_group_id() else {
                warn!("skipping refetch: parent process group id is not known");
                return Err(WorkspaceError::MissingParentGroup);
            };
            let inside_group = matches!(guard.view, ViewMode::InsideGroup { .. });
            (guard.bump_generation(), parent, inside_group)
        };

        let listing = self
            .api
            .fetch_flow_process_groups(&parent, self.settings.ui_only)
            .await
            .map_err(|err| {
                error!(parent_group_id = %parent, "failed to fetch process groups: {err:#}");
                WorkspaceError::remote("fetch_flow_process_groups", err)
            })?
            .normalize();

        let groups = self.layout.place_groups(
            listing
                .process_groups
                .iter()
                .map(map_process_group_for_display)
                .collect(),
        );
        let processors = if inside_group {
            self.layout
                .layout_processors(map_processors_for_display(&listing.processors))
        } else {
            Vec::new()
        };

        let mut guard = self.inner.lock().await;
        if guard.torn_down {
            return Err(WorkspaceError::TornDown);
        }
        if guard.list_generation != generation {
            let latest = guard.list_generation;
            warn!(generation, latest, "discarding stale process group listing");
            drop(guard);
            self.emit(WorkspaceEvent::StaleResultDiscarded { generation, latest });
            return Err(WorkspaceError::StaleResult { generation, latest });
        }
        debug!(
            parent_group_id = %parent,
            groups = groups.len(),
            processors = processors.len(),
            "applied process group listing"
        );
        guard.process_groups = groups.clone();
        guard.processors = processors.clone();
        drop(guard);

        self.emit(WorkspaceEvent::ProcessGroupsUpdated(groups));
        if inside_group {
            self.emit(WorkspaceEvent::ProcessorsUpdated(processors));
        }
        Ok(())
    }

    async fn refetch_if_parent_known(&self) {
        let known = self.inner.lock().await.parent_group_id().is_some();
        if !known {
            debug!("parent process group id unknown; skipping refetch");
            return;
        }
        if let Err(err) = self.refetch().await {
            debug!("refetch after action did not apply: {err}");
        }
    }

    pub async fn enter_canvas(&self) -> Result<(), WorkspaceError> {
        {
            let mut guard = self.inner.lock().await;
            guard.view = ViewMode::Canvas;
            guard.processors.clear();
            guard.bump_generation();
        }
        self.emit(WorkspaceEvent::ViewChanged(ViewMode::Canvas));
        self.refetch().await
    }

    pub async fn enter_group(
        &self,
        group_id: ComponentId,
        group_name: impl Into<String>,
    ) -> Result<(), WorkspaceError> {
        let view = ViewMode::InsideGroup {
            group_id,
            group_name: group_name.into(),
        };
        {
            let mut guard = self.inner.lock().await;
            // The group id is in place before the processor fetch below.
            guard.view = view.clone();
            guard.processors.clear();
            guard.selection = None;
            guard.bump_generation();
        }
        self.emit(WorkspaceEvent::ViewChanged(view));
        self.emit(WorkspaceEvent::SelectionChanged(None));
        self.emit(WorkspaceEvent::ProcessorsUpdated(Vec::new()));
        self.refetch().await
    }

    pub async fn exit_group(&self) -> Result<(), WorkspaceError> {
        {
            let mut guard = self.inner.lock().await;
            guard.view = ViewMode::Canvas;
            guard.processors.clear();
            guard.selection = None;
            // Re-resolved below rather than trusted from before.
            guard.root_group_id = None;
            guard.bump_generation();
        }
        self.emit(WorkspaceEvent::ViewChanged(ViewMode::Canvas));
        self.emit(WorkspaceEvent::SelectionChanged(None));
        self.emit(WorkspaceEvent::ProcessorsUpdated(Vec::new()));
        self.resolve_root_group_id().await?;
        self.refetch().await
    }

    pub async fn open_controller_services(&self) {
        {
            let mut guard = self.inner.lock().await;
            guard.view = ViewMode::ControllerServices;
            guard.selection = None;
            guard.bump_generation();
        }
        self.emit(WorkspaceEvent::ViewChanged(ViewMode::ControllerServices));
        self.emit(WorkspaceEvent::SelectionChanged(None));
    }

    pub async fn select_entity(&self, id: ComponentId, name: impl Into<String>) {
        let selection = Selection {
            id,
            name: name.into(),
        };
        self.inner.lock().await.selection = Some(selection.clone());
        self.emit(WorkspaceEvent::SelectionChanged(Some(selection)));
    }

    pub async fn deselect(&self) {
        let previous = self.inner.lock().await.selection.take();
        if previous.is_some() {
            self.emit(WorkspaceEvent::SelectionChanged(None));
        }
    }

    pub async fn update_creation_form(
        &self,
        name: impl Into<String>,
        parameter_context: Option<String>,
    ) {
        let mut guard = self.inner.lock().await;
        guard.creation_form.name = name.into();
        guard.creation_form.parameter_context = parameter_context;
    }

    pub async fn submit_creation_form(&self) -> Result<(), WorkspaceError> {
        let form = self.inner.lock().await.creation_form.clone();
        self.create_process_group(&form.name, form.parameter_context.as_deref())
            .await
    }

    pub async fn create_process_group(
        &self,
        name: &str,
        parameter_context: Option<&str>,
    ) -> Result<(), WorkspaceError> {
        let name = name.trim();
        if name.is_empty() {
            warn!("refusing to create a process group without a name");
            return Err(WorkspaceError::EmptyName);
        }

        let (parent, position) = {
            let mut guard = self.inner.lock().await;
            let Some(parent) = guard.parent_group_id() else {
                warn!(name, "cannot create process group: parent id unknown");
                return Err(WorkspaceError::MissingParentGroup);
            };
            let siblings: Vec<Position> =
                guard.process_groups.iter().map(|group| group.position).collect();
            let position = self.layout.new_group_position(&siblings);
            self.transition(&mut guard, ActionKind::CreateProcessGroup, ActionPhase::Pending);
            (parent, position)
        };

        let result = self
            .api
            .create_process_group(&parent, name, parameter_context, position)
            .await;

        let mut guard = self.inner.lock().await;
        match result {
            Ok(entity) => {
                if guard.torn_down {
                    self.transition(&mut guard, ActionKind::CreateProcessGroup, ActionPhase::RolledBack);
                    return Err(WorkspaceError::TornDown);
                }
                self.transition(&mut guard, ActionKind::CreateProcessGroup, ActionPhase::Committed);
                guard.creation_form = CreationForm::default();
                let created = map_process_group_for_display(&entity);
                info!(id = %created.id, name, parent_group_id = %parent, "created process group");
                // Only append when the user is still looking at the same parent.
                let still_same_parent = guard.parent_group_id().as_ref() == Some(&parent);
                if still_same_parent {
                    guard.process_groups.push(created);
                    // A listing issued before the create would drop the new group.
                    guard.bump_generation();
                }
                let groups = guard.process_groups.clone();
                drop(guard);
                self.emit(WorkspaceEvent::CreationPanelChanged { open: false });
                if still_same_parent {
                    self.emit(WorkspaceEvent::ProcessGroupsUpdated(groups));
                }
                Ok(())
            }
            Err(err) => {
                self.transition(&mut guard, ActionKind::CreateProcessGroup, ActionPhase::RolledBack);
                drop(guard);
                error!(name, parent_group_id = %parent, "failed to create process group: {err:#}");
                self.emit(WorkspaceEvent::Alert(format!(
                    "Could not create process group '{name}': {err}"
                )));
                Err(WorkspaceError::remote("create_process_group", err))
            }
        }
    }

    pub async fn create_processor(&self, spec: ProcessorSpec) -> Result<(), WorkspaceError> {
        let (group_id, position) = {
            let mut guard = self.inner.lock().await;
            let Some(group_id) = guard.view.current_group_id().cloned() else {
                warn!(processor_type = %spec.processor_type, "processors can only be added inside a process group");
                return Err(WorkspaceError::NotInsideGroup);
            };
            let position = self.layout.processor_position(guard.processors.len());
            self.transition(&mut guard, ActionKind::CreateProcessor, ActionPhase::Pending);
            (group_id, position)
        };

        match self.api.create_processor(&group_id, &spec, position).await {
            Ok(_) => {
                {
                    let mut guard = self.inner.lock().await;
                    self.transition(&mut guard, ActionKind::CreateProcessor, ActionPhase::Committed);
                }
                info!(group_id = %group_id, processor_type = %spec.processor_type, "created processor");
                self.refetch_if_parent_known().await;
                Ok(())
            }
            Err(err) => {
                {
                    let mut guard = self.inner.lock().await;
                    self.transition(&mut guard, ActionKind::CreateProcessor, ActionPhase::RolledBack);
                }
                error!(group_id = %group_id, "failed to create processor: {err:#}");
                self.emit(WorkspaceEvent::Alert(format!(
                    "Could not add processor {}: {err}",
                    spec.processor_type
                )));
                Err(WorkspaceError::remote("create_processor", err))
            }
        }
    }

    pub async fn copy_selection(&self) -> Result<(), WorkspaceError> {
        let (parent, selected) = {
            let mut guard = self.inner.lock().await;
            let Some(selected) = guard.selection.clone() else {
                warn!("nothing selected to copy");
                return Err(WorkspaceError::NoSelection);
            };
            let Some(parent) = guard.parent_group_id() else {
                error!(id = %selected.id, "cannot copy: parent process group id is not known");
                return Err(WorkspaceError::MissingParentGroup);
            };
            self.transition(&mut guard, ActionKind::Copy, ActionPhase::Pending);
            (parent, selected)
        };

        let result = self
            .api
            .copy_process_group(&parent, std::slice::from_ref(&selected.id))
            .await;

        let mut guard = self.inner.lock().await;
        match result {
            Ok(buffer) => {
                if guard.torn_down {
                    self.transition(&mut guard, ActionKind::Copy, ActionPhase::RolledBack);
                    return Err(WorkspaceError::TornDown);
                }
                guard.copy_buffer = Some(buffer);
                self.transition(&mut guard, ActionKind::Copy, ActionPhase::Committed);
                drop(guard);
                info!(id = %selected.id, name = %selected.name, "copied process group");
                self.emit(WorkspaceEvent::CopyBufferChanged { filled: true });
                Ok(())
            }
            Err(err) => {
                self.transition(&mut guard, ActionKind::Copy, ActionPhase::RolledBack);
                drop(guard);
                error!(id = %selected.id, parent_group_id = %parent, "failed to copy process group: {err:#}");
                Err(WorkspaceError::remote("copy_process_group", err))
            }
        }
    }

    pub async fn paste_buffer(&self) -> Result<(), WorkspaceError> {
        let (parent, buffer) = {
            let mut guard = self.inner.lock().await;
            let Some(buffer) = guard.copy_buffer.clone() else {
                warn!("nothing has been copied; ignoring paste");
                return Err(WorkspaceError::EmptyCopyBuffer);
            };
            let Some(parent) = guard.parent_group_id() else {
                error!("cannot paste: parent process group id is not known");
                return Err(WorkspaceError::MissingParentGroup);
            };
            self.transition(&mut guard, ActionKind::Paste, ActionPhase::Pending);
            (parent, buffer)
        };

        if let Err(err) = self.api.paste_process_group(&parent, &buffer).await {
            {
                let mut guard = self.inner.lock().await;
                self.transition(&mut guard, ActionKind::Paste, ActionPhase::RolledBack);
            }
            error!(parent_group_id = %parent, "failed to paste: {err:#}");
            self.emit(WorkspaceEvent::Alert(format!("Paste failed: {err}")));
            return Err(WorkspaceError::remote("paste_process_group", err));
        }

        // The server finishes instantiating pasted components asynchronously.
        tokio::time::sleep(self.settings.paste_settle_delay).await;

        {
            let mut guard = self.inner.lock().await;
            if guard.torn_down {
                self.transition(&mut guard, ActionKind::Paste, ActionPhase::RolledBack);
                return Err(WorkspaceError::TornDown);
            }
            // A newer copy made while pasting stays in place.
            if guard.copy_buffer.as_ref() == Some(&buffer) {
                guard.copy_buffer = None;
            }
            let filled = guard.copy_buffer.is_some();
            self.transition(&mut guard, ActionKind::Paste, ActionPhase::Committed);
            drop(guard);
            self.emit(WorkspaceEvent::CopyBufferChanged { filled });
        }
        info!(parent_group_id = %parent, "pasted copy buffer");
        self.refetch_if_parent_known().await;
        Ok(())
    }

    async fn apply_run_state(
        &self,
        action: ActionKind,
        state: ScheduledState,
    ) -> Result<(), WorkspaceError> {
        let selected = {
            let mut guard = self.inner.lock().await;
            let Some(selected) = guard.selection.clone() else {
                warn!(action = action.name(), "no entity selected");
                return Err(WorkspaceError::NoSelection);
            };
            self.transition(&mut guard, action, ActionPhase::Pending);
            selected
        };

        let id = &selected.id;
        let result = match state {
            ScheduledState::Running => self.api.start_process_group(id).await,
            ScheduledState::Stopped => self.api.stop_process_group(id).await,
            ScheduledState::Enabled => self.api.enable_process_group(id).await,
            ScheduledState::Disabled => self.api.disable_process_group(id).await,
        };

        match result {
            Ok(_) => {
                {
                    let mut guard = self.inner.lock().await;
                    self.transition(&mut guard, action, ActionPhase::Committed);
                }
                info!(action = action.name(), id = %id, "process group state changed");
                self.refetch_if_parent_known().await;
                Ok(())
            }
            Err(err) => {
                {
                    let mut guard = self.inner.lock().await;
                    self.transition(&mut guard, action, ActionPhase::RolledBack);
                }
                error!(action = action.name(), id = %id, "failed to change process group state: {err:#}");
                Err(WorkspaceError::remote(action.name(), err))
            }
        }
    }

    pub async fn start_selected(&self) -> Result<(), WorkspaceError> {
        self.apply_run_state(ActionKind::Start, ScheduledState::Running)
            .await
    }

    pub async fn stop_selected(&self) -> Result<(), WorkspaceError> {
        self.apply_run_state(ActionKind::Stop, ScheduledState::Stopped)
            .await
    }

    pub async fn enable_selected(&self) -> Result<(), WorkspaceError> {
        self.apply_run_state(ActionKind::Enable, ScheduledState::Enabled)
            .await
    }

    pub async fn disable_selected(&self) -> Result<(), WorkspaceError> {
        self.apply_run_state(ActionKind::Disable, ScheduledState::Disabled)
            .await
    }

    /// First phase of a delete: asks for confirmation.
    pub async fn request_delete(&self) -> Result<(), WorkspaceError> {
        let selected = {
            let mut guard = self.inner.lock().await;
            let Some(selected) = guard.selection.clone() else {
                warn!("nothing selected to delete");
                return Err(WorkspaceError::NoSelection);
            };
            guard.pending_delete = Some(selected.clone());
            selected
        };
        self.emit(WorkspaceEvent::DeleteConfirmationRequested(selected));
        Ok(())
    }

    pub async fn cancel_delete(&self) {
        self.inner.lock().await.pending_delete = None;
    }

    /// Second phase of a delete. Selection is cleared whatever the outcome.
    pub async fn confirm_delete(&self) -> Result<(), WorkspaceError> {
        let target = {
            let mut guard = self.inner.lock().await;
            let Some(target) = guard.pending_delete.take() else {
                warn!("no delete awaiting confirmation");
                return Err(WorkspaceError::NoPendingDelete);
            };
            self.transition(&mut guard, ActionKind::Delete, ActionPhase::Pending);
            target
        };

        let result = self.api.delete_process_group(&target.id).await;
        let outcome = match result {
            Ok(()) => {
                {
                    let mut guard = self.inner.lock().await;
                    self.transition(&mut guard, ActionKind::Delete, ActionPhase::Committed);
                }
                info!(id = %target.id, name = %target.name, "deleted process group");
                self.refetch_if_parent_known().await;
                Ok(())
            }
            Err(err) => {
                {
                    let mut guard = self.inner.lock().await;
                    self.transition(&mut guard, ActionKind::Delete, ActionPhase::RolledBack);
                }
                error!(id = %target.id, "failed to delete process group: {err:#}");
                Err(WorkspaceError::remote("delete_process_group", err))
            }
        };

        self.inner.lock().await.selection = None;
        self.emit(WorkspaceEvent::SelectionChanged(None));
        outcome
    }

    /// Bumps the configure counter of the selected entity. Returns `false`
    /// when nothing is selected.
    pub async fn request_configure_selected(&self) -> bool {
        let signal = {
            let mut guard = self.inner.lock().await;
            let Some(selected) = guard.selection.clone() else {
                return false;
            };
            let counter = guard
                .configure_counters
                .entry(selected.id.clone())
                .or_insert(0);
            *counter += 1;
            (selected.id, *counter)
        };
        debug!(id = %signal.0, counter = signal.1, "configure requested");
        self.emit(WorkspaceEvent::ConfigureRequested {
            id: signal.0,
            counter: signal.1,
        });
        true
    }

    pub async fn configure_counter(&self, id: &ComponentId) -> u64 {
        self.inner
            .lock()
            .await
            .configure_counters
            .get(id)
            .copied()
            .unwrap_or(0)
    }

    pub async fn on_box_click(&self, id: ComponentId, name: impl Into<String>) {
        self.select_entity(id, name).await;
    }

    pub async fn on_box_double_click(&self, id: ComponentId, name: impl Into<String>) {
        if let Err(err) = self.enter_group(id, name).await {
            debug!("entering group did not complete: {err}");
        }
    }

    pub async fn on_background_click(&self) {
        self.deselect().await;
    }

    pub async fn on_breadcrumb_click(&self) {
        if let Err(err) = self.exit_group().await {
            debug!("leaving group did not complete: {err}");
        }
    }

    pub async fn on_tab_change(&self, index: usize) {
        let open = index == CREATE_TAB_INDEX;
        {
            let mut guard = self.inner.lock().await;
            guard.active_tab = index;
            guard.creation_form.open = open;
        }
        self.emit(WorkspaceEvent::CreationPanelChanged { open });
    }

    pub async fn on_toolbar_action(self: &Arc<Self>, token: &str) {
        let action = match token.parse::<ToolbarAction>() {
            Ok(action) => action,
            Err(err) => {
                warn!("{err}");
                return;
            }
        };
        let Some(handler) = self.dispatch.handler(action) else {
            warn!(token, "no handler registered for toolbar action");
            return;
        };
        handler(Arc::clone(self)).await;
    }
}

#[cfg(test)]
#[path = "tests/workspace_tests.rs"]
mod tests;
