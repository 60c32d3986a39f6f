//! Resource-manager wire types.
//!
//! These mirror the resource manager's protobuf messages field for field,
//! so the transport layer can encode them without further translation.
//! Optional protobuf fields are `Option`s; repeated fields are `Vec`s.

use serde::{Deserialize, Serialize};

pub const CPUS: &str = "cpus";
pub const MEM: &str = "mem";
pub const DISK: &str = "disk";
pub const PORTS: &str = "ports";

// ── Resources ─────────────────────────────────────────────────────

/// Inclusive integer interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRange {
    pub begin: u64,
    pub end: u64,
}

impl ValueRange {
    pub fn new(begin: u64, end: u64) -> Self {
        Self { begin, end }
    }

    pub fn contains(&self, value: u64) -> bool {
        self.begin <= value && value <= self.end
    }

    pub fn len(&self) -> u64 {
        if self.end < self.begin {
            0
        } else {
            self.end - self.begin + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResourceValue {
    Scalar { value: f64 },
    Ranges { ranges: Vec<ValueRange> },
}

/// One slice of an offer (or of a launch request), tagged with its role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub role: String,
    #[serde(flatten)]
    pub value: ResourceValue,
}

impl Resource {
    pub fn scalar(name: &str, value: f64, role: &str) -> Self {
        Self {
            name: name.to_string(),
            role: role.to_string(),
            value: ResourceValue::Scalar { value },
        }
    }

    pub fn ranges(name: &str, ranges: Vec<ValueRange>, role: &str) -> Self {
        Self {
            name: name.to_string(),
            role: role.to_string(),
            value: ResourceValue::Ranges { ranges },
        }
    }

    pub fn scalar_value(&self) -> Option<f64> {
        match &self.value {
            ResourceValue::Scalar { value } => Some(*value),
            ResourceValue::Ranges { .. } => None,
        }
    }

    pub fn range_values(&self) -> &[ValueRange] {
        match &self.value {
            ResourceValue::Ranges { ranges } => ranges,
            ResourceValue::Scalar { .. } => &[],
        }
    }
}

/// A time-bounded grant of resources on one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,
    pub framework_id: String,
    pub agent_id: String,
    pub hostname: String,
    pub resources: Vec<Resource>,
}

impl Offer {
    /// One-line summary of the offered resources, for operator logs.
    pub fn summary(&self) -> String {
        let parts: Vec<String> = self
            .resources
            .iter()
            .map(|r| match &r.value {
                ResourceValue::Scalar { value } => format!("{}({})={}", r.name, r.role, value),
                ResourceValue::Ranges { ranges } => {
                    let ranges: Vec<String> =
                        ranges.iter().map(|v| format!("{}-{}", v.begin, v.end)).collect();
                    format!("{}({})=[{}]", r.name, r.role, ranges.join(","))
                }
            })
            .collect();
        format!("{} on {}: {}", self.id, self.hostname, parts.join(" "))
    }
}

// ── Launch descriptor ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Labels {
    pub labels: Vec<Label>,
}

impl Labels {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        Self {
            labels: pairs
                .into_iter()
                .map(|(key, value)| Label {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Environment {
    pub variables: Vec<Variable>,
}

impl Environment {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandUri {
    pub value: String,
    pub executable: bool,
    pub extract: bool,
    pub cache: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandInfo {
    pub value: Option<String>,
    /// Protobuf default is `true`.
    pub shell: bool,
    pub arguments: Vec<String>,
    pub environment: Environment,
    pub uris: Vec<CommandUri>,
    pub user: Option<String>,
}

impl Default for CommandInfo {
    fn default() -> Self {
        Self {
            value: None,
            shell: true,
            arguments: Vec::new(),
            environment: Environment::default(),
            uris: Vec::new(),
            user: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerType {
    Docker,
    Mesos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolumeMode {
    Rw,
    Ro,
}

/// Native host-path volume. The native format has no persistent variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeInfo {
    pub container_path: String,
    pub host_path: Option<String>,
    pub mode: VolumeMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DockerNetwork {
    Host,
    Bridge,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerPortMapping {
    pub host_port: u32,
    pub container_port: u32,
    pub service_port: u32,
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerInfo {
    pub image: String,
    pub network: Option<DockerNetwork>,
    pub port_mappings: Vec<DockerPortMapping>,
    pub privileged: bool,
    pub parameters: Vec<Parameter>,
    pub force_pull_image: bool,
}

/// Placeholder entry; the resource manager assigns the concrete address.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IpAddressInfo {
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub ip_addresses: Vec<IpAddressInfo>,
    pub groups: Vec<String>,
    pub labels: Labels,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub container_type: Option<ContainerType>,
    pub volumes: Vec<VolumeInfo>,
    pub docker: Option<DockerInfo>,
    pub network_infos: Vec<NetworkInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscoveryVisibility {
    Framework,
    Cluster,
    External,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryPort {
    pub number: u32,
    pub name: String,
    pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryInfo {
    pub visibility: DiscoveryVisibility,
    pub name: String,
    pub ports: Vec<DiscoveryPort>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckInfo {
    pub command: CommandInfo,
    pub delay_seconds: f64,
    pub interval_seconds: f64,
    pub timeout_seconds: f64,
    pub consecutive_failures: u32,
    pub grace_period_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorInfo {
    pub executor_id: String,
    pub command: CommandInfo,
    pub container: Option<ContainerInfo>,
}

/// The launch descriptor handed back to the resource manager.
///
/// Exactly one of `command` and `executor` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub name: String,
    pub task_id: String,
    pub agent_id: String,
    pub resources: Vec<Resource>,
    pub command: Option<CommandInfo>,
    pub executor: Option<ExecutorInfo>,
    pub container: Option<ContainerInfo>,
    pub health_check: Option<HealthCheckInfo>,
    pub labels: Option<Labels>,
    pub discovery: Option<DiscoveryInfo>,
    pub data: Option<Vec<u8>>,
}

impl TaskInfo {
    /// Sum of all scalar resources with the given name.
    pub fn scalar_total(&self, name: &str) -> f64 {
        self.resources
            .iter()
            .filter(|r| r.name == name)
            .filter_map(Resource::scalar_value)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_len_and_contains() {
        let range = ValueRange::new(31000, 31009);
        assert_eq!(range.len(), 10);
        assert!(range.contains(31000));
        assert!(range.contains(31009));
        assert!(!range.contains(31010));
        assert!(ValueRange::new(5, 4).is_empty());
    }

    #[test]
    fn test_resource_accessors() {
        let cpus = Resource::scalar(CPUS, 2.0, "*");
        assert_eq!(cpus.scalar_value(), Some(2.0));
        assert!(cpus.range_values().is_empty());

        let ports = Resource::ranges(PORTS, vec![ValueRange::new(1, 2)], "*");
        assert_eq!(ports.scalar_value(), None);
        assert_eq!(ports.range_values().len(), 1);
    }

    #[test]
    fn test_resource_json_shape() {
        let json = serde_json::to_value(Resource::scalar(MEM, 128.0, "*")).unwrap();
        assert_eq!(json["name"], "mem");
        assert_eq!(json["type"], "scalar");
        assert_eq!(json["value"], 128.0);
    }

    #[test]
    fn test_offer_summary() {
        let offer = Offer {
            id: "o-1".to_string(),
            framework_id: "fw".to_string(),
            agent_id: "a-1".to_string(),
            hostname: "host-1".to_string(),
            resources: vec![
                Resource::scalar(CPUS, 2.0, "*"),
                Resource::ranges(PORTS, vec![ValueRange::new(31000, 32000)], "*"),
            ],
        };
        assert_eq!(offer.summary(), "o-1 on host-1: cpus(*)=2 ports(*)=[31000-32000]");
    }

    #[test]
    fn test_command_info_defaults_to_shell() {
        assert!(CommandInfo::default().shell);
    }
}
