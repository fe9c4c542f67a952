use std::time::Duration;

use shared::domain::{ControllerServiceView, Position};

use crate::controller_services::demo_controller_services;

/// Fixed canvas constants used when placing new entities.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSettings {
    pub group_base: Position,
    pub group_delta: Position,
    pub processor_start: Position,
    pub processor_width: f64,
    pub processor_gap: f64,
    /// Server positions with `x` beyond this are treated as unplaced.
    pub off_canvas_x_threshold: f64,
    pub visible_default: Position,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            group_base: Position::new(100.0, 100.0),
            group_delta: Position::new(50.0, 50.0),
            processor_start: Position::new(100.0, 100.0),
            processor_width: 350.0,
            processor_gap: 50.0,
            off_canvas_x_threshold: 2000.0,
            visible_default: Position::new(100.0, 100.0),
        }
    }
}

/// What the controller-service table shows when the server cannot be reached.
#[derive(Debug, Clone, PartialEq)]
pub enum OfflineSamplePolicy {
    /// Keep whatever rows were last loaded.
    Disabled,
    SampleRows(Vec<ControllerServiceView>),
}

impl OfflineSamplePolicy {
    pub fn demo() -> Self {
        Self::SampleRows(demo_controller_services())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceSettings {
    pub layout: LayoutSettings,
    pub paste_settle_delay: Duration,
    pub enable_disable_retry_delay: Duration,
    pub offline_samples: OfflineSamplePolicy,
    pub ui_only: bool,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            layout: LayoutSettings::default(),
            paste_settle_delay: Duration::from_millis(500),
            enable_disable_retry_delay: Duration::from_millis(1000),
            offline_samples: OfflineSamplePolicy::demo(),
            ui_only: true,
        }
    }
}
