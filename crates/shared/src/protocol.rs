//! Wire shapes exchanged with the flow server's REST API.
//!
//! Every field the server may omit is optional or defaulted; turning these
//! into display records is the job of [`crate::mapper`].

use serde::{Deserialize, Serialize};

use crate::domain::{Bundle, ComponentId, Position};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default)]
    pub version: i64,
}

impl Revision {
    pub fn initial(client_id: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            version: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParameterContextReference {
    pub id: Option<String>,
    pub component: Option<ParameterContextComponent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParameterContextComponent {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessGroupEntity {
    pub id: Option<String>,
    pub revision: Option<Revision>,
    pub position: Option<Position>,
    pub component: Option<ProcessGroupComponent>,
    pub status: Option<ProcessGroupStatus>,
    pub running_count: Option<u32>,
    pub stopped_count: Option<u32>,
    pub invalid_count: Option<u32>,
    pub disabled_count: Option<u32>,
    pub active_remote_port_count: Option<u32>,
    pub inactive_remote_port_count: Option<u32>,
    pub up_to_date_count: Option<u32>,
    pub locally_modified_count: Option<u32>,
    pub stale_count: Option<u32>,
    pub locally_modified_and_stale_count: Option<u32>,
    pub sync_failure_count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessGroupComponent {
    pub id: Option<String>,
    pub name: Option<String>,
    pub position: Option<Position>,
    pub parameter_context: Option<ParameterContextReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessGroupStatus {
    pub aggregate_snapshot: Option<ThroughputSnapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThroughputSnapshot {
    pub queued: Option<String>,
    pub input: Option<String>,
    pub read: Option<String>,
    pub written: Option<String>,
    pub output: Option<String>,
    pub task_count: Option<u64>,
    pub tasks_duration: Option<String>,
    pub tasks_duration_nanos: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessorEntity {
    pub id: Option<String>,
    pub revision: Option<Revision>,
    pub position: Option<Position>,
    pub component: Option<ProcessorComponent>,
    pub status: Option<ProcessorStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessorComponent {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub processor_type: Option<String>,
    pub bundle: Option<Bundle>,
    pub state: Option<String>,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessorStatus {
    pub run_status: Option<String>,
    pub aggregate_snapshot: Option<ThroughputSnapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlowContents {
    pub process_groups: Vec<ProcessGroupEntity>,
    pub processors: Vec<ProcessorEntity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessGroupFlow {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub flow: FlowContents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessGroupFlowResponse {
    pub process_group_flow: ProcessGroupFlow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowPayloadEnvelope {
    pub payload: ProcessGroupFlowResponse,
}

/// The listing endpoint has been observed returning three shapes: the flow
/// wrapped in a `payload` envelope, the bare flow, or a flat group list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlowListing {
    Envelope(FlowPayloadEnvelope),
    Flow(ProcessGroupFlowResponse),
    Groups(Vec<ProcessGroupEntity>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedListing {
    pub parent_id: Option<ComponentId>,
    pub process_groups: Vec<ProcessGroupEntity>,
    pub processors: Vec<ProcessorEntity>,
}

impl FlowListing {
    pub fn normalize(self) -> NormalizedListing {
        let flow = match self {
            Self::Envelope(envelope) => envelope.payload.process_group_flow,
            Self::Flow(response) => response.process_group_flow,
            Self::Groups(process_groups) => {
                return NormalizedListing {
                    parent_id: None,
                    process_groups,
                    processors: Vec::new(),
                }
            }
        };
        NormalizedListing {
            parent_id: flow.id.map(ComponentId),
            process_groups: flow.flow.process_groups,
            processors: flow.flow.processors,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlowStatusResponse {
    pub controller_status: ControllerStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerStatus {
    pub active_thread_count: u32,
    pub queued: String,
    pub running_count: u32,
    pub stopped_count: u32,
    pub invalid_count: u32,
    pub disabled_count: u32,
}

/// Server-issued payload bridging a copy to a later paste. Never inspected
/// on this side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CopyBuffer(pub serde_json::Value);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyRequest {
    pub process_groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasteRequest {
    pub copy_response: CopyBuffer,
    pub revision: Revision,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProcessGroupRequest {
    pub revision: Revision,
    pub component: NewProcessGroup,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProcessGroup {
    pub name: String,
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_context: Option<ParameterContextReference>,
}

/// What to instantiate when adding a processor to a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorSpec {
    pub processor_type: String,
    pub bundle: Bundle,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProcessorRequest {
    pub revision: Revision,
    pub component: NewProcessor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProcessor {
    #[serde(rename = "type")]
    pub processor_type: String,
    pub bundle: Bundle,
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduledState {
    Running,
    Stopped,
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleComponentsRequest {
    pub id: String,
    pub state: ScheduledState,
    pub disconnected_node_acknowledged: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerServicesResponse {
    pub controller_services: Vec<ControllerServiceEntry>,
}

/// Controller services arrive either wrapped (`component` + `status`) or as
/// flat records, depending on the endpoint and server version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControllerServiceEntry {
    Nested(NestedControllerService),
    Flat(ControllerServiceComponent),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedControllerService {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub revision: Option<Revision>,
    pub component: ControllerServiceComponent,
    #[serde(default)]
    pub status: Option<ControllerServiceStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerServiceComponent {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub service_type: Option<String>,
    pub bundle: Option<Bundle>,
    pub state: Option<String>,
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerServiceStatus {
    pub run_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerServiceRunStatusRequest {
    pub revision: Revision,
    pub state: ScheduledState,
    pub disconnected_node_acknowledged: bool,
}
