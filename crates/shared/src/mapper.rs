//! Flattens raw server entities into the records the canvas and tables draw.
//!
//! All functions here are total: absent substructures fall back to the
//! display defaults below instead of failing.

use crate::{
    domain::{
        ComponentId, ControllerServiceId, ControllerServiceView, ProcessGroupView,
        ProcessorView, ServiceState,
    },
    protocol::{
        ControllerServiceComponent, ControllerServiceEntry, ParameterContextReference,
        ProcessGroupEntity, ProcessorEntity, ThroughputSnapshot,
    },
};

pub const DEFAULT_QUEUED: &str = "0 (0 bytes)";
pub const DEFAULT_THROUGHPUT: &str = "0 bytes";
pub const DEFAULT_TASK_TIME: &str = "00:00:00.000";
pub const DEFAULT_SCOPE: &str = "Flow";

fn or_default(value: Option<&String>, fallback: &str) -> String {
    value.cloned().unwrap_or_else(|| fallback.to_string())
}

fn parameter_context_name(reference: Option<&ParameterContextReference>) -> String {
    let Some(reference) = reference else {
        return String::new();
    };
    reference
        .component
        .as_ref()
        .and_then(|component| component.name.clone())
        .or_else(|| reference.id.clone())
        .unwrap_or_default()
}

fn throughput(snapshot: Option<&ThroughputSnapshot>) -> [String; 5] {
    [
        or_default(snapshot.and_then(|s| s.queued.as_ref()), DEFAULT_QUEUED),
        or_default(snapshot.and_then(|s| s.input.as_ref()), DEFAULT_QUEUED),
        or_default(snapshot.and_then(|s| s.read.as_ref()), DEFAULT_THROUGHPUT),
        or_default(snapshot.and_then(|s| s.written.as_ref()), DEFAULT_THROUGHPUT),
        or_default(snapshot.and_then(|s| s.output.as_ref()), DEFAULT_QUEUED),
    ]
}

pub fn map_process_group_for_display(raw: &ProcessGroupEntity) -> ProcessGroupView {
    let component = raw.component.as_ref();
    let id = raw
        .id
        .clone()
        .or_else(|| component.and_then(|c| c.id.clone()))
        .unwrap_or_default();
    let position = raw
        .position
        .or_else(|| component.and_then(|c| c.position))
        .unwrap_or_default();
    let snapshot = raw
        .status
        .as_ref()
        .and_then(|status| status.aggregate_snapshot.as_ref());
    let [queued, input, read, written, output] = throughput(snapshot);

    ProcessGroupView {
        id: ComponentId(id),
        name: component.and_then(|c| c.name.clone()).unwrap_or_default(),
        parameter_context: parameter_context_name(
            component.and_then(|c| c.parameter_context.as_ref()),
        ),
        position,
        running_count: raw.running_count.unwrap_or(0),
        stopped_count: raw.stopped_count.unwrap_or(0),
        invalid_count: raw.invalid_count.unwrap_or(0),
        disabled_count: raw.disabled_count.unwrap_or(0),
        active_remote_port_count: raw.active_remote_port_count.unwrap_or(0),
        inactive_remote_port_count: raw.inactive_remote_port_count.unwrap_or(0),
        queued,
        input,
        read,
        written,
        output,
        up_to_date_count: raw.up_to_date_count.unwrap_or(0),
        locally_modified_count: raw.locally_modified_count.unwrap_or(0),
        stale_count: raw.stale_count.unwrap_or(0),
        locally_modified_and_stale_count: raw.locally_modified_and_stale_count.unwrap_or(0),
        sync_failure_count: raw.sync_failure_count.unwrap_or(0),
    }
}

pub fn map_processor_for_display(raw: &ProcessorEntity) -> ProcessorView {
    let component = raw.component.as_ref();
    let status = raw.status.as_ref();
    let snapshot = status.and_then(|s| s.aggregate_snapshot.as_ref());
    let bundle = component.and_then(|c| c.bundle.clone()).unwrap_or_default();
    let [queued, input, read, written, output] = throughput(snapshot);

    let run_state = status
        .and_then(|s| s.run_status.clone())
        .or_else(|| component.and_then(|c| c.state.clone()))
        .unwrap_or_default()
        .to_ascii_uppercase();
    let flag = |state: &str| u32::from(run_state == state);

    ProcessorView {
        summary: ProcessGroupView {
            id: ComponentId(
                raw.id
                    .clone()
                    .or_else(|| component.and_then(|c| c.id.clone()))
                    .unwrap_or_default(),
            ),
            name: component.and_then(|c| c.name.clone()).unwrap_or_default(),
            parameter_context: String::new(),
            position: raw
                .position
                .or_else(|| component.and_then(|c| c.position))
                .unwrap_or_default(),
            running_count: flag("RUNNING"),
            stopped_count: flag("STOPPED"),
            invalid_count: flag("INVALID"),
            disabled_count: flag("DISABLED"),
            queued,
            input,
            read,
            written,
            output,
            ..ProcessGroupView::default()
        },
        is_processor: true,
        processor_type: component
            .and_then(|c| c.processor_type.clone())
            .unwrap_or_default(),
        bundle_group: bundle.group,
        bundle_artifact: bundle.artifact,
        bundle_version: bundle.version,
        task_time: or_default(
            snapshot.and_then(|s| s.tasks_duration.as_ref()),
            DEFAULT_TASK_TIME,
        ),
        task_count: snapshot.and_then(|s| s.task_count).unwrap_or(0),
        task_duration: format!(
            "{} ms",
            snapshot
                .and_then(|s| s.tasks_duration_nanos)
                .unwrap_or(0)
                / 1_000_000
        ),
    }
}

pub fn map_processors_for_display(raw: &[ProcessorEntity]) -> Vec<ProcessorView> {
    raw.iter().map(map_processor_for_display).collect()
}

/// Folds both controller-service shapes into one view. The nested shape
/// prefers `status.runStatus` over `component.state`.
pub fn normalize_controller_service(entry: &ControllerServiceEntry) -> ControllerServiceView {
    let (outer_id, component, run_status): (Option<&String>, &ControllerServiceComponent, _) =
        match entry {
            ControllerServiceEntry::Nested(nested) => (
                nested.id.as_ref(),
                &nested.component,
                nested
                    .status
                    .as_ref()
                    .and_then(|status| status.run_status.as_ref()),
            ),
            ControllerServiceEntry::Flat(flat) => (None, flat, None),
        };

    let id = component
        .id
        .as_ref()
        .or(outer_id)
        .cloned()
        .unwrap_or_default();
    let state = run_status
        .or(component.state.as_ref())
        .map(|raw| ServiceState::parse(raw))
        .unwrap_or_else(|| ServiceState::Other(String::new()));

    ControllerServiceView {
        id: ControllerServiceId(id),
        name: component.name.clone().unwrap_or_default(),
        service_type: component.service_type.clone().unwrap_or_default(),
        bundle: component.bundle.clone().unwrap_or_default(),
        state,
        scope: or_default(component.scope.as_ref(), DEFAULT_SCOPE),
    }
}
