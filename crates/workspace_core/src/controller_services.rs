//! State behind the controller-service table and its enable/disable and
//! edit drawers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use flow_api::FlowApi;
use shared::{
    domain::{Bundle, ControllerServiceId, ControllerServiceView, ServiceState},
    mapper::normalize_controller_service,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::{
    error::WorkspaceError,
    settings::{OfflineSamplePolicy, WorkspaceSettings},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnableDisableAction {
    Enable,
    Disable,
}

impl EnableDisableAction {
    /// Running-like services are offered `Disable`; everything else `Enable`.
    pub fn infer(state: &ServiceState) -> Self {
        if state.is_running_like() {
            Self::Disable
        } else {
            Self::Enable
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteAffordance {
    Enabled,
    Disabled,
}

pub fn delete_affordance(service: &ControllerServiceView) -> DeleteAffordance {
    if service.state.allows_delete() {
        DeleteAffordance::Enabled
    } else {
        DeleteAffordance::Disabled
    }
}

/// Where the rows of the last completed fetch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    Server,
    OfflineSamples,
    Unchanged,
}

#[derive(Debug, Clone)]
pub enum ControllerServiceEvent {
    LoadingChanged(bool),
    ListUpdated {
        services: Vec<ControllerServiceView>,
        source: FetchSource,
    },
    EnableDisableDrawerOpened {
        service: ControllerServiceView,
        action: EnableDisableAction,
    },
    EditDrawerOpened(ControllerServiceView),
    DrawersClosed,
    Deleted(ControllerServiceId),
}

#[derive(Debug, Clone, Default)]
pub struct ControllerServiceTableSnapshot {
    pub list: Vec<ControllerServiceView>,
    pub is_loading: bool,
    pub selected_for_action: Option<ControllerServiceView>,
    pub action_kind: Option<EnableDisableAction>,
    pub selected_for_edit: Option<ControllerServiceView>,
    pub last_refreshed: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct TableState {
    list: Vec<ControllerServiceView>,
    is_loading: bool,
    selected_for_action: Option<ControllerServiceView>,
    action_kind: Option<EnableDisableAction>,
    selected_for_edit: Option<ControllerServiceView>,
    last_refreshed: Option<DateTime<Utc>>,
    fetch_generation: u64,
    torn_down: bool,
}

impl TableState {
    fn close_enable_disable(&mut self) -> bool {
        let was_open = self.selected_for_action.is_some();
        self.selected_for_action = None;
        self.action_kind = None;
        was_open
    }
}

/// Exact-match lookup. Every id passed over is logged so mismatches between
/// what the table shows and what was clicked can be traced.
fn find_service(
    list: &[ControllerServiceView],
    id: &ControllerServiceId,
) -> Option<ControllerServiceView> {
    for service in list {
        if &service.id == id {
            return Some(service.clone());
        }
        debug!(wanted = %id, candidate = %service.id, "controller service id mismatch");
    }
    None
}

pub struct ControllerServiceTableController {
    api: Arc<dyn FlowApi>,
    settings: WorkspaceSettings,
    inner: Mutex<TableState>,
    events: broadcast::Sender<ControllerServiceEvent>,
}

impl ControllerServiceTableController {
    pub fn new(api: Arc<dyn FlowApi>, settings: WorkspaceSettings) -> Arc<Self> {
        let (events, _) = broadcast::channel(128);
        Arc::new(Self {
            api,
            settings,
            inner: Mutex::new(TableState::default()),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerServiceEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: ControllerServiceEvent) {
        let _ = self.events.send(event);
    }

    pub async fn snapshot(&self) -> ControllerServiceTableSnapshot {
        let guard = self.inner.lock().await;
        ControllerServiceTableSnapshot {
            list: guard.list.clone(),
            is_loading: guard.is_loading,
            selected_for_action: guard.selected_for_action.clone(),
            action_kind: guard.action_kind,
            selected_for_edit: guard.selected_for_edit.clone(),
            last_refreshed: guard.last_refreshed,
        }
    }

    pub async fn shutdown(&self) {
        self.inner.lock().await.torn_down = true;
    }

    /// Reloads the table. An open enable/disable drawer is closed whenever
    /// a fetch lands, since its row may have changed or vanished.
    pub async fn fetch(&self, show_loading: bool) -> Result<FetchSource, WorkspaceError> {
        info!(show_loading, "fetching controller services");
        let generation = {
            let mut guard = self.inner.lock().await;
            if guard.torn_down {
                return Err(WorkspaceError::TornDown);
            }
            guard.fetch_generation += 1;
            if show_loading {
                guard.is_loading = true;
            }
            guard.fetch_generation
        };
        if show_loading {
            self.emit(ControllerServiceEvent::LoadingChanged(true));
        }

        let result = self.api.get_controller_services().await;

        let mut guard = self.inner.lock().await;
        if guard.torn_down {
            return Err(WorkspaceError::TornDown);
        }
        if guard.fetch_generation != generation {
            let latest = guard.fetch_generation;
            warn!(generation, latest, "discarding stale controller service listing");
            return Err(WorkspaceError::StaleResult { generation, latest });
        }

        let source = match result {
            Ok(response) => {
                guard.list = response
                    .controller_services
                    .iter()
                    .map(normalize_controller_service)
                    .collect();
                guard.last_refreshed = Some(Utc::now());
                info!(count = guard.list.len(), "loaded controller services");
                FetchSource::Server
            }
            Err(err) => {
                error!("failed to fetch controller services: {err:#}");
                match &self.settings.offline_samples {
                    OfflineSamplePolicy::SampleRows(rows) => {
                        warn!(count = rows.len(), "showing offline sample controller services");
                        guard.list = rows.clone();
                        FetchSource::OfflineSamples
                    }
                    OfflineSamplePolicy::Disabled => FetchSource::Unchanged,
                }
            }
        };

        let was_loading = std::mem::take(&mut guard.is_loading);
        let closed_drawer = guard.close_enable_disable();
        let services = guard.list.clone();
        drop(guard);

        if was_loading {
            self.emit(ControllerServiceEvent::LoadingChanged(false));
        }
        if closed_drawer {
            debug!("closed enable/disable drawer after refresh");
            self.emit(ControllerServiceEvent::DrawersClosed);
        }
        self.emit(ControllerServiceEvent::ListUpdated { services, source });
        Ok(source)
    }

    /// Opens the enable/disable drawer for `id` with the inferred action.
    /// An empty table is fetched first and the lookup retried once after the
    /// configured delay.
    pub async fn request_enable_disable(
        &self,
        id: &ControllerServiceId,
    ) -> Result<EnableDisableAction, WorkspaceError> {
        let list_empty = self.inner.lock().await.list.is_empty();
        if list_empty {
            info!(id = %id, "controller service list is empty; fetching before lookup");
            if let Err(err) = self.fetch(false).await {
                debug!("fetch before enable/disable lookup did not apply: {err}");
            }
            tokio::time::sleep(self.settings.enable_disable_retry_delay).await;
        }

        let (service, action) = {
            let mut guard = self.inner.lock().await;
            let Some(service) = find_service(&guard.list, id) else {
                warn!(id = %id, "controller service not found; not opening drawer");
                return Err(WorkspaceError::UnknownControllerService(id.to_string()));
            };
            let action = EnableDisableAction::infer(&service.state);
            guard.selected_for_action = Some(service.clone());
            guard.action_kind = Some(action);
            (service, action)
        };
        info!(id = %id, ?action, "opened enable/disable drawer");
        self.emit(ControllerServiceEvent::EnableDisableDrawerOpened { service, action });
        Ok(action)
    }

    /// Submits the drawer's action, then refreshes. The drawer is closed
    /// afterwards in every case.
    pub async fn confirm_enable_disable(&self) -> Result<(), WorkspaceError> {
        let target = {
            let guard = self.inner.lock().await;
            guard.selected_for_action.clone().zip(guard.action_kind)
        };
        if let Some((service, action)) = &target {
            let enabled = *action == EnableDisableAction::Enable;
            if let Err(err) = self
                .api
                .set_controller_service_state(&service.id, enabled)
                .await
            {
                error!(id = %service.id, ?action, "failed to change controller service state: {err:#}");
            }
        }

        let fetched = self.fetch(false).await;

        let mut guard = self.inner.lock().await;
        if guard.close_enable_disable() {
            drop(guard);
            self.emit(ControllerServiceEvent::DrawersClosed);
        }
        fetched.map(|_| ())
    }

    pub async fn cancel_enable_disable(&self) {
        let closed = self.inner.lock().await.close_enable_disable();
        if closed {
            self.emit(ControllerServiceEvent::DrawersClosed);
        }
    }

    pub async fn open_edit(&self, id: &ControllerServiceId) -> Result<(), WorkspaceError> {
        let service = {
            let mut guard = self.inner.lock().await;
            let Some(service) = find_service(&guard.list, id) else {
                warn!(id = %id, "controller service not found; not opening editor");
                return Err(WorkspaceError::UnknownControllerService(id.to_string()));
            };
            guard.selected_for_edit = Some(service.clone());
            service
        };
        self.emit(ControllerServiceEvent::EditDrawerOpened(service));
        Ok(())
    }

    pub async fn confirm_edit(&self) -> Result<(), WorkspaceError> {
        let fetched = self.fetch(false).await;
        self.inner.lock().await.selected_for_edit = None;
        self.emit(ControllerServiceEvent::DrawersClosed);
        fetched.map(|_| ())
    }

    /// Deletes `id` when its state allows it. Returns `Ok(false)` without
    /// touching the server for any state other than `INVALID`.
    pub async fn request_delete(&self, id: &ControllerServiceId) -> Result<bool, WorkspaceError> {
        let service = {
            let guard = self.inner.lock().await;
            find_service(&guard.list, id)
        };
        let Some(service) = service else {
            warn!(id = %id, "controller service not found; nothing to delete");
            return Err(WorkspaceError::UnknownControllerService(id.to_string()));
        };
        if delete_affordance(&service) == DeleteAffordance::Disabled {
            debug!(id = %id, state = %service.state, "delete control is inert for this state");
            return Ok(false);
        }

        self.api
            .delete_controller_service(&service.id)
            .await
            .map_err(|err| {
                error!(id = %service.id, "failed to delete controller service: {err:#}");
                WorkspaceError::remote("delete_controller_service", err)
            })?;
        info!(id = %service.id, name = %service.name, "deleted controller service");
        self.emit(ControllerServiceEvent::Deleted(service.id.clone()));
        if let Err(err) = self.fetch(false).await {
            debug!("refresh after delete did not apply: {err}");
        }
        Ok(true)
    }
}

fn demo_row(
    id: &str,
    name: &str,
    service_type: &str,
    artifact: &str,
    state: ServiceState,
) -> ControllerServiceView {
    ControllerServiceView {
        id: ControllerServiceId::from(id),
        name: name.to_string(),
        service_type: service_type.to_string(),
        bundle: Bundle {
            group: "org.apache.nifi".to_string(),
            artifact: artifact.to_string(),
            version: "2.0.0".to_string(),
        },
        state,
        scope: "Flow".to_string(),
    }
}

/// Fixed rows shown by [`OfflineSamplePolicy::demo`].
pub fn demo_controller_services() -> Vec<ControllerServiceView> {
    vec![
        demo_row(
            "sample-dbcp",
            "DBCPConnectionPool",
            "org.apache.nifi.dbcp.DBCPConnectionPool",
            "nifi-dbcp-service-nar",
            ServiceState::Enabled,
        ),
        demo_row(
            "sample-json-reader",
            "JsonTreeReader",
            "org.apache.nifi.json.JsonTreeReader",
            "nifi-record-serialization-services-nar",
            ServiceState::Disabled,
        ),
        demo_row(
            "sample-ssl",
            "StandardSSLContextService",
            "org.apache.nifi.ssl.StandardSSLContextService",
            "nifi-ssl-context-service-nar",
            ServiceState::Invalid,
        ),
    ]
}

#[cfg(test)]
#[path = "tests/controller_services_tests.rs"]
mod tests;
