use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

// Process groups and processors share the server's component id space.
id_newtype!(ComponentId);
id_newtype!(ControllerServiceId);

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessGroupView {
    pub id: ComponentId,
    pub name: String,
    pub parameter_context: String,
    pub position: Position,
    pub running_count: u32,
    pub stopped_count: u32,
    pub invalid_count: u32,
    pub disabled_count: u32,
    pub active_remote_port_count: u32,
    pub inactive_remote_port_count: u32,
    pub queued: String,
    pub input: String,
    pub read: String,
    pub written: String,
    pub output: String,
    pub up_to_date_count: u32,
    pub locally_modified_count: u32,
    pub stale_count: u32,
    pub locally_modified_and_stale_count: u32,
    pub sync_failure_count: u32,
}

/// A processor as drawn inside an opened process group. Carries every
/// group field so the canvas can render both with the same box.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorView {
    #[serde(flatten)]
    pub summary: ProcessGroupView,
    pub is_processor: bool,
    pub processor_type: String,
    pub bundle_group: String,
    pub bundle_artifact: String,
    pub bundle_version: String,
    pub task_time: String,
    pub task_count: u64,
    pub task_duration: String,
}

impl ProcessorView {
    pub fn id(&self) -> &ComponentId {
        &self.summary.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub artifact: String,
    #[serde(default)]
    pub version: String,
}

impl Bundle {
    /// Parses `group:artifact:version`.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.splitn(3, ':');
        let group = parts.next()?.trim();
        let artifact = parts.next()?.trim();
        let version = parts.next()?.trim();
        if group.is_empty() || artifact.is_empty() || version.is_empty() {
            return None;
        }
        Some(Self {
            group: group.to_string(),
            artifact: artifact.to_string(),
            version: version.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServiceState {
    Enabled,
    Disabled,
    Enabling,
    Disabling,
    Running,
    Stopped,
    Invalid,
    Other(String),
}

impl ServiceState {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ENABLED" => Self::Enabled,
            "DISABLED" => Self::Disabled,
            "ENABLING" => Self::Enabling,
            "DISABLING" => Self::Disabling,
            "RUNNING" => Self::Running,
            "STOPPED" => Self::Stopped,
            "INVALID" => Self::Invalid,
            _ => Self::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Enabled => "ENABLED",
            Self::Disabled => "DISABLED",
            Self::Enabling => "ENABLING",
            Self::Disabling => "DISABLING",
            Self::Running => "RUNNING",
            Self::Stopped => "STOPPED",
            Self::Invalid => "INVALID",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_running_like(&self) -> bool {
        matches!(self, Self::Enabled | Self::Running | Self::Enabling)
    }

    pub fn allows_delete(&self) -> bool {
        matches!(self, Self::Invalid)
    }
}

impl From<String> for ServiceState {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<ServiceState> for String {
    fn from(value: ServiceState) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerServiceView {
    pub id: ControllerServiceId,
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub bundle: Bundle,
    pub state: ServiceState,
    pub scope: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub id: ComponentId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Canvas,
    InsideGroup {
        group_id: ComponentId,
        group_name: String,
    },
    ControllerServices,
}

impl ViewMode {
    pub fn current_group_id(&self) -> Option<&ComponentId> {
        match self {
            Self::InsideGroup { group_id, .. } => Some(group_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_state_parsing_is_case_insensitive() {
        assert_eq!(ServiceState::parse("enabled"), ServiceState::Enabled);
        assert_eq!(ServiceState::parse("Invalid"), ServiceState::Invalid);
        assert_eq!(
            ServiceState::parse("VALIDATING"),
            ServiceState::Other("VALIDATING".to_string())
        );
    }

    #[test]
    fn running_like_states() {
        assert!(ServiceState::parse("enabling").is_running_like());
        assert!(ServiceState::Running.is_running_like());
        assert!(!ServiceState::Disabled.is_running_like());
        assert!(!ServiceState::Invalid.is_running_like());
    }

    #[test]
    fn bundle_parse_requires_three_parts() {
        let bundle = Bundle::parse("org.apache.nifi:nifi-standard-nar:2.0.0").expect("bundle");
        assert_eq!(bundle.artifact, "nifi-standard-nar");
        assert!(Bundle::parse("org.apache.nifi:nifi-standard-nar").is_none());
        assert!(Bundle::parse("a::c").is_none());
    }
}
