use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Arc,
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use flow_api::{FlowApi, FlowStatus};
use serde_json::json;
use shared::{
    domain::{ComponentId, ControllerServiceId, Position},
    protocol::{
        ControllerServicesResponse, ControllerStatus, CopyBuffer, FlowContents, FlowListing,
        ProcessGroupComponent, ProcessGroupEntity, ProcessGroupFlow, ProcessGroupFlowResponse,
        ProcessorComponent, ProcessorEntity, ProcessorSpec, ScheduledState,
    },
};
use tokio::sync::Mutex;

use crate::settings::WorkspaceSettings;

/// Recording [`FlowApi`] with injectable failures and per-call latency.
pub(crate) struct FakeFlowApi {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub root_id: Mutex<String>,
    pub listings: Mutex<HashMap<String, FlowListing>>,
    pub queued_listings: Mutex<VecDeque<(Duration, FlowListing)>>,
    pub failing: Mutex<HashSet<&'static str>>,
    pub services: Mutex<Vec<ControllerServicesResponse>>,
    pub created_positions: Mutex<Vec<Position>>,
    pub copy_counter: Mutex<u32>,
}

impl FakeFlowApi {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            root_id: Mutex::new("root".to_string()),
            listings: Mutex::new(HashMap::new()),
            queued_listings: Mutex::new(VecDeque::new()),
            failing: Mutex::new(HashSet::new()),
            services: Mutex::new(Vec::new()),
            created_positions: Mutex::new(Vec::new()),
            copy_counter: Mutex::new(0),
        }
    }

    pub async fn fail(&self, operation: &'static str) {
        self.failing.lock().await.insert(operation);
    }

    pub async fn set_listing(&self, parent: &str, listing: FlowListing) {
        self.listings
            .lock()
            .await
            .insert(parent.to_string(), listing);
    }

    pub async fn queue_listing(&self, delay: Duration, listing: FlowListing) {
        self.queued_listings
            .lock()
            .await
            .push_back((delay, listing));
    }

    pub async fn push_services(&self, response: ControllerServicesResponse) {
        self.services.lock().await.push(response);
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    pub async fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| call.starts_with(prefix))
            .cloned()
            .collect()
    }

    async fn record(&self, operation: &'static str, call: String) -> Result<()> {
        self.calls.lock().await.push(call);
        if self.failing.lock().await.contains(operation) {
            return Err(anyhow!("{operation} rejected by test server"));
        }
        Ok(())
    }
}

pub(crate) fn group(id: &str, name: &str) -> ProcessGroupEntity {
    ProcessGroupEntity {
        id: Some(id.to_string()),
        component: Some(ProcessGroupComponent {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            ..ProcessGroupComponent::default()
        }),
        ..ProcessGroupEntity::default()
    }
}

pub(crate) fn processor(id: &str) -> ProcessorEntity {
    ProcessorEntity {
        id: Some(id.to_string()),
        component: Some(ProcessorComponent {
            name: Some(format!("processor {id}")),
            processor_type: Some("org.apache.nifi.processors.standard.LogAttribute".to_string()),
            ..ProcessorComponent::default()
        }),
        ..ProcessorEntity::default()
    }
}

pub(crate) fn listing(
    id: &str,
    groups: Vec<ProcessGroupEntity>,
    processors: Vec<ProcessorEntity>,
) -> FlowListing {
    FlowListing::Flow(ProcessGroupFlowResponse {
        process_group_flow: ProcessGroupFlow {
            id: Some(id.to_string()),
            flow: FlowContents {
                process_groups: groups,
                processors,
            },
        },
    })
}

pub(crate) fn fast_settings() -> WorkspaceSettings {
    WorkspaceSettings {
        paste_settle_delay: Duration::from_millis(5),
        enable_disable_retry_delay: Duration::from_millis(5),
        ..WorkspaceSettings::default()
    }
}

#[async_trait]
impl FlowApi for FakeFlowApi {
    async fn authenticate(&self) -> Result<()> {
        self.record("authenticate", "authenticate".to_string())
            .await
    }

    async fn get_flow_status(&self) -> Result<FlowStatus> {
        self.record("flow_status", "get_flow_status".to_string())
            .await?;
        Ok(FlowStatus {
            controller: ControllerStatus {
                running_count: 2,
                ..ControllerStatus::default()
            },
            fetched_at: Utc::now(),
        })
    }

    async fn get_root_process_group_id(&self) -> Result<ComponentId> {
        self.record("root", "get_root_process_group_id".to_string())
            .await?;
        Ok(ComponentId(self.root_id.lock().await.clone()))
    }

    async fn fetch_flow_process_groups(
        &self,
        parent_group_id: &ComponentId,
        _ui_only: bool,
    ) -> Result<FlowListing> {
        self.record("fetch", format!("fetch:{parent_group_id}"))
            .await?;
        let queued = self.queued_listings.lock().await.pop_front();
        if let Some((delay, listing)) = queued {
            tokio::time::sleep(delay).await;
            return Ok(listing);
        }
        Ok(self
            .listings
            .lock()
            .await
            .get(parent_group_id.as_str())
            .cloned()
            .unwrap_or_else(|| listing(parent_group_id.as_str(), Vec::new(), Vec::new())))
    }

    async fn create_process_group(
        &self,
        parent_group_id: &ComponentId,
        name: &str,
        _parameter_context: Option<&str>,
        position: Position,
    ) -> Result<ProcessGroupEntity> {
        self.record("create", format!("create_process_group:{parent_group_id}:{name}"))
            .await?;
        let mut positions = self.created_positions.lock().await;
        positions.push(position);
        let mut entity = group(&format!("new-{}", positions.len()), name);
        entity.position = Some(position);
        Ok(entity)
    }

    async fn set_process_group_state(
        &self,
        id: &ComponentId,
        state: ScheduledState,
    ) -> Result<ProcessGroupEntity> {
        let verb = match state {
            ScheduledState::Running => "start",
            ScheduledState::Stopped => "stop",
            ScheduledState::Enabled => "enable",
            ScheduledState::Disabled => "disable",
        };
        self.record("run_state", format!("{verb}:{id}")).await?;
        Ok(group(id.as_str(), "changed"))
    }

    async fn copy_process_group(
        &self,
        parent_group_id: &ComponentId,
        ids: &[ComponentId],
    ) -> Result<CopyBuffer> {
        let joined: Vec<_> = ids.iter().map(ToString::to_string).collect();
        self.record("copy", format!("copy:{parent_group_id}:{}", joined.join(",")))
            .await?;
        let mut counter = self.copy_counter.lock().await;
        *counter += 1;
        Ok(CopyBuffer(json!({ "copy": *counter, "processGroups": joined })))
    }

    async fn paste_process_group(
        &self,
        parent_group_id: &ComponentId,
        buffer: &CopyBuffer,
    ) -> Result<serde_json::Value> {
        self.record("paste", format!("paste:{parent_group_id}:{}", buffer.0["copy"]))
            .await?;
        Ok(json!({}))
    }

    async fn delete_process_group(&self, id: &ComponentId) -> Result<()> {
        self.record("delete", format!("delete:{id}")).await
    }

    async fn create_processor(
        &self,
        parent_group_id: &ComponentId,
        spec: &ProcessorSpec,
        position: Position,
    ) -> Result<ProcessorEntity> {
        self.record(
            "create_processor",
            format!("create_processor:{parent_group_id}:{}", spec.processor_type),
        )
        .await?;
        self.created_positions.lock().await.push(position);
        Ok(processor("created"))
    }

    async fn get_controller_services(&self) -> Result<ControllerServicesResponse> {
        self.record("services", "get_controller_services".to_string())
            .await?;
        let mut queue = self.services.lock().await;
        if queue.len() > 1 {
            return Ok(queue.remove(0));
        }
        Ok(queue.first().cloned().unwrap_or_default())
    }

    async fn set_controller_service_state(
        &self,
        id: &ControllerServiceId,
        enabled: bool,
    ) -> Result<()> {
        self.record("cs_state", format!("set_cs_state:{id}:{enabled}"))
            .await
    }

    async fn delete_controller_service(&self, id: &ControllerServiceId) -> Result<()> {
        self.record("delete_cs", format!("delete_cs:{id}")).await
    }
}
