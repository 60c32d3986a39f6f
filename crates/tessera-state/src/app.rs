//! Workload specifications ("apps").

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use tessera_core::PathId;

use crate::container::{Container, PortMapping, Protocol};

/// Port value meaning "assign any free port from the offer".
pub const RANDOM_PORT: u32 = 0;

/// The orchestratable unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDefinition {
    pub id: PathId,
    #[serde(default)]
    pub cmd: Option<String>,
    /// Takes precedence over `cmd` when both are present.
    #[serde(default)]
    pub args: Option<Vec<String>>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default = "default_instances")]
    pub instances: u32,
    #[serde(default = "default_cpus")]
    pub cpus: f64,
    /// Memory in MB.
    #[serde(default = "default_mem")]
    pub mem: f64,
    /// Disk in MB. Zero means "do not declare disk at all".
    #[serde(default)]
    pub disk: f64,
    /// Empty falls back to the operator's default executor.
    #[serde(default)]
    pub executor: String,
    #[serde(default)]
    pub fetch: Vec<FetchUri>,
    #[serde(default)]
    pub ports: Vec<u32>,
    #[serde(default)]
    pub require_ports: bool,
    /// `None` falls back to the operator's default role set.
    #[serde(default)]
    pub accepted_resource_roles: Option<BTreeSet<String>>,
    #[serde(default)]
    pub container: Option<Container>,
    #[serde(default)]
    pub ip_address: Option<IpAddress>,
    #[serde(default)]
    pub health_checks: Vec<HealthCheck>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub version: DateTime<Utc>,
}

fn default_instances() -> u32 {
    1
}

fn default_cpus() -> f64 {
    1.0
}

fn default_mem() -> f64 {
    128.0
}

impl AppDefinition {
    /// An app with stock resources and nothing else declared.
    pub fn new(id: PathId) -> Self {
        Self {
            id,
            cmd: None,
            args: None,
            user: None,
            env: BTreeMap::new(),
            instances: default_instances(),
            cpus: default_cpus(),
            mem: default_mem(),
            disk: 0.0,
            executor: String::new(),
            fetch: Vec::new(),
            ports: Vec::new(),
            require_ports: false,
            accepted_resource_roles: None,
            container: None,
            ip_address: None,
            health_checks: Vec::new(),
            labels: BTreeMap::new(),
            version: DateTime::<Utc>::default(),
        }
    }

    /// Bridge-mode port mappings, when the container declares any.
    pub fn port_mappings(&self) -> Option<&[PortMapping]> {
        self.container.as_ref().and_then(Container::port_mappings)
    }

    /// Ports as the workload sees them: container ports when mapped,
    /// otherwise the `ports` list.
    pub fn declared_ports(&self) -> Vec<u32> {
        match self.port_mappings() {
            Some(mappings) => mappings.iter().map(|pm| pm.container_port).collect(),
            None => self.ports.clone(),
        }
    }

    /// Number of host ports a launch of this app consumes.
    pub fn required_port_count(&self) -> usize {
        match self.port_mappings() {
            Some(mappings) => mappings.len(),
            None => self.ports.len(),
        }
    }

    pub fn docker_image(&self) -> Option<&str> {
        self.container
            .as_ref()
            .and_then(|c| c.docker.as_ref())
            .map(|d| d.image.as_str())
    }

    /// The launch line a custom executor receives after its own path.
    /// `args` win over `cmd`.
    pub fn command_line(&self) -> String {
        match (&self.args, &self.cmd) {
            (Some(args), _) => args.join(" "),
            (None, Some(cmd)) => cmd.clone(),
            (None, None) => String::new(),
        }
    }

    pub fn version_string(&self) -> String {
        self.version.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

// ── Fetch ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchUri {
    pub uri: String,
    #[serde(default)]
    pub executable: bool,
    #[serde(default = "default_extract")]
    pub extract: bool,
    #[serde(default)]
    pub cache: bool,
}

fn default_extract() -> bool {
    true
}

impl FetchUri {
    pub fn new(uri: &str) -> Self {
        Self {
            uri: uri.to_string(),
            executable: false,
            extract: default_extract(),
            cache: false,
        }
    }
}

// ── IP per task ───────────────────────────────────────────────────

/// Request for a dedicated IP address per task.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpAddress {
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub discovery: DiscoverySpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiscoverySpec {
    #[serde(default)]
    pub ports: Vec<DiscoveryPortSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryPortSpec {
    pub number: u32,
    pub name: String,
    #[serde(default)]
    pub protocol: Protocol,
}

// ── Health checks ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthCheckProtocol {
    #[default]
    Http,
    Tcp,
    Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandCheck {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    #[serde(default)]
    pub protocol: HealthCheckProtocol,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub port_index: u32,
    #[serde(default)]
    pub command: Option<CommandCheck>,
    #[serde(default = "default_grace_period")]
    pub grace_period_seconds: u64,
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_failures")]
    pub max_consecutive_failures: u32,
}

fn default_grace_period() -> u64 {
    300
}

fn default_interval() -> u64 {
    60
}

fn default_timeout() -> u64 {
    20
}

fn default_max_failures() -> u32 {
    3
}

impl HealthCheck {
    pub fn http(path: &str) -> Self {
        Self {
            protocol: HealthCheckProtocol::Http,
            path: Some(path.to_string()),
            command: None,
            ..Self::command("")
        }
    }

    pub fn command(value: &str) -> Self {
        Self {
            protocol: HealthCheckProtocol::Command,
            path: None,
            port_index: 0,
            command: Some(CommandCheck {
                value: value.to_string(),
            }),
            grace_period_seconds: default_grace_period(),
            interval_seconds: default_interval(),
            timeout_seconds: default_timeout(),
            max_consecutive_failures: default_max_failures(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Docker;

    fn sample_app() -> AppDefinition {
        AppDefinition::new(PathId::parse("/prod/api").unwrap())
    }

    #[test]
    fn minimal_json_takes_defaults() {
        let app: AppDefinition = serde_json::from_str(r#"{"id": "/prod/api"}"#).unwrap();
        assert_eq!(app, sample_app());
        assert_eq!(app.cpus, 1.0);
        assert_eq!(app.mem, 128.0);
        assert_eq!(app.disk, 0.0);
        assert!(app.executor.is_empty());
    }

    #[test]
    fn declared_ports_prefer_mappings() {
        let mut app = sample_app();
        app.ports = vec![8080, 0];
        assert_eq!(app.declared_ports(), vec![8080, 0]);
        assert_eq!(app.required_port_count(), 2);

        let mut docker = Docker::new("nginx");
        docker.port_mappings = Some(vec![PortMapping::new(80, 0)]);
        app.container = Some(Container {
            docker: Some(docker),
            ..Container::docker("nginx")
        });
        assert_eq!(app.declared_ports(), vec![80]);
        assert_eq!(app.required_port_count(), 1);
    }

    #[test]
    fn command_line_prefers_args_then_cmd() {
        let mut app = sample_app();
        assert_eq!(app.command_line(), "");

        app.cmd = Some("./run.sh".to_string());
        assert_eq!(app.command_line(), "./run.sh");

        app.args = Some(vec!["serve".to_string(), "--port".to_string(), "80".to_string()]);
        assert_eq!(app.command_line(), "serve --port 80");
    }

    #[test]
    fn version_string_has_millis() {
        let mut app = sample_app();
        app.version = "2015-04-09T12:30:00Z".parse().unwrap();
        assert_eq!(app.version_string(), "2015-04-09T12:30:00.000Z");
    }

    #[test]
    fn json_round_trip_keeps_everything() {
        let mut app = sample_app();
        app.cmd = Some("sleep 100".to_string());
        app.ports = vec![0, 9000];
        app.labels.insert("team".to_string(), "core".to_string());
        app.health_checks.push(HealthCheck::command("true"));
        app.ip_address = Some(IpAddress {
            groups: vec!["frontend".to_string()],
            ..IpAddress::default()
        });
        app.fetch.push(FetchUri::new("https://example.com/app.tgz"));

        let json = serde_json::to_string(&app).unwrap();
        assert!(json.contains("\"requirePorts\":false"));
        let back: AppDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, app);
    }
}
