//! The Container Model: how a workload wants to be containerized.

use serde::{Deserialize, Serialize};

pub use tessera_core::{ContainerType, DockerNetwork, VolumeMode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// Defaults to DOCKER when absent.
    #[serde(rename = "type", default = "default_container_type")]
    pub container_type: ContainerType,
    #[serde(default)]
    pub volumes: Vec<Volume>,
    #[serde(default)]
    pub docker: Option<Docker>,
}

fn default_container_type() -> ContainerType {
    ContainerType::Docker
}

impl Container {
    /// A DOCKER container running `image` with no volumes.
    pub fn docker(image: &str) -> Self {
        Self {
            container_type: ContainerType::Docker,
            volumes: Vec::new(),
            docker: Some(Docker::new(image)),
        }
    }

    /// A MESOS container with no docker descriptor.
    pub fn mesos() -> Self {
        Self {
            container_type: ContainerType::Mesos,
            volumes: Vec::new(),
            docker: None,
        }
    }

    /// Declared port mappings, if any were given and the list is non-empty.
    pub fn port_mappings(&self) -> Option<&[PortMapping]> {
        self.docker
            .as_ref()
            .and_then(|d| d.port_mappings.as_deref())
            .filter(|pms| !pms.is_empty())
    }

    pub fn persistent_volumes(&self) -> impl Iterator<Item = &PersistentVolume> {
        self.volumes.iter().filter_map(|v| match v {
            Volume::Persistent(pv) => Some(pv),
            Volume::Docker(_) => None,
        })
    }
}

// ── Volumes ───────────────────────────────────────────────────────

/// A volume is either a host-path bind or a persistent local volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Volume {
    Docker(DockerVolume),
    Persistent(PersistentVolume),
}

impl Volume {
    pub fn container_path(&self) -> &str {
        match self {
            Volume::Docker(v) => &v.container_path,
            Volume::Persistent(v) => &v.container_path,
        }
    }

    pub fn mode(&self) -> VolumeMode {
        match self {
            Volume::Docker(v) => v.mode,
            Volume::Persistent(v) => v.mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerVolume {
    pub container_path: String,
    pub host_path: String,
    pub mode: VolumeMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolume {
    pub container_path: String,
    pub persistent: PersistentVolumeInfo,
    pub mode: VolumeMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentVolumeInfo {
    /// Size in MB.
    pub size: u64,
}

// ── Docker ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Docker {
    pub image: String,
    #[serde(default)]
    pub network: Option<DockerNetwork>,
    #[serde(default)]
    pub port_mappings: Option<Vec<PortMapping>>,
    #[serde(default)]
    pub privileged: bool,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub force_pull_image: bool,
}

impl Docker {
    pub fn new(image: &str) -> Self {
        Self {
            image: image.to_string(),
            network: None,
            port_mappings: None,
            privileged: false,
            parameters: Vec::new(),
            force_pull_image: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tcp" => Some(Protocol::Tcp),
            "udp" => Some(Protocol::Udp),
            _ => None,
        }
    }
}

/// Bridge-mode mapping. A zero port means "pick one for me".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMapping {
    #[serde(default)]
    pub container_port: u32,
    #[serde(default)]
    pub host_port: u32,
    #[serde(default)]
    pub service_port: u32,
    #[serde(default)]
    pub protocol: Protocol,
}

impl PortMapping {
    pub fn new(container_port: u32, host_port: u32) -> Self {
        Self {
            container_port,
            host_port,
            service_port: 0,
            protocol: Protocol::Tcp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub key: String,
    pub value: String,
}
