//! Container Model serializers.
//!
//! Two targets:
//!
//! - the resource manager's native `ContainerInfo`, which only knows
//!   host-path volumes. Persistent volumes are dropped on the way out; they
//!   reach the agent as disk reservations, not through this field.
//! - the orchestrator's own stored shape, which keeps every volume variant.

use serde::{Deserialize, Serialize};

use tessera_core::{
    ContainerInfo, ContainerType, DockerInfo, DockerNetwork, DockerPortMapping, VolumeInfo,
    VolumeMode,
};

use crate::container::{
    Container, Docker, DockerVolume, Parameter, PersistentVolume, PersistentVolumeInfo,
    PortMapping, Protocol, Volume,
};
use crate::error::{SerializerError, SerializerResult};

// ── Native ────────────────────────────────────────────────────────

pub fn container_to_native(container: &Container) -> ContainerInfo {
    let volumes = container
        .volumes
        .iter()
        .filter_map(|volume| match volume {
            Volume::Docker(dv) => Some(VolumeInfo {
                container_path: dv.container_path.clone(),
                host_path: Some(dv.host_path.clone()),
                mode: dv.mode,
            }),
            Volume::Persistent(_) => None,
        })
        .collect();

    ContainerInfo {
        container_type: Some(container.container_type),
        volumes,
        docker: container.docker.as_ref().map(docker_to_native),
        network_infos: Vec::new(),
    }
}

fn docker_to_native(docker: &Docker) -> DockerInfo {
    DockerInfo {
        image: docker.image.clone(),
        network: docker.network,
        port_mappings: docker
            .port_mappings
            .iter()
            .flatten()
            .map(|pm| DockerPortMapping {
                host_port: pm.host_port,
                container_port: pm.container_port,
                service_port: pm.service_port,
                protocol: Some(pm.protocol.as_str().to_string()),
            })
            .collect(),
        privileged: docker.privileged,
        parameters: docker
            .parameters
            .iter()
            .map(|p| tessera_core::Parameter {
                key: p.key.clone(),
                value: p.value.clone(),
            })
            .collect(),
        force_pull_image: docker.force_pull_image,
    }
}

/// Read a native `ContainerInfo` back into the model.
///
/// An absent type means DOCKER. An empty port-mapping list reads as
/// "no mappings declared".
pub fn container_from_native(info: &ContainerInfo) -> SerializerResult<Container> {
    let volumes = info
        .volumes
        .iter()
        .enumerate()
        .map(|(index, v)| match &v.host_path {
            Some(host_path) => Ok(Volume::Docker(DockerVolume {
                container_path: v.container_path.clone(),
                host_path: host_path.clone(),
                mode: v.mode,
            })),
            None => Err(SerializerError::MissingHostPath {
                index,
                container_path: v.container_path.clone(),
            }),
        })
        .collect::<SerializerResult<Vec<_>>>()?;

    Ok(Container {
        container_type: info.container_type.unwrap_or(ContainerType::Docker),
        volumes,
        docker: info.docker.as_ref().map(docker_from_native),
    })
}

fn docker_from_native(info: &DockerInfo) -> Docker {
    let port_mappings: Vec<PortMapping> = info
        .port_mappings
        .iter()
        .map(|pm| PortMapping {
            container_port: pm.container_port,
            host_port: pm.host_port,
            service_port: pm.service_port,
            protocol: pm
                .protocol
                .as_deref()
                .and_then(Protocol::parse)
                .unwrap_or_default(),
        })
        .collect();

    Docker {
        image: info.image.clone(),
        network: info.network,
        port_mappings: (!port_mappings.is_empty()).then_some(port_mappings),
        privileged: info.privileged,
        parameters: info
            .parameters
            .iter()
            .map(|p| Parameter {
                key: p.key.clone(),
                value: p.value.clone(),
            })
            .collect(),
        force_pull_image: info.force_pull_image,
    }
}

// ── Stored ────────────────────────────────────────────────────────

/// The orchestrator's persisted container record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredContainer {
    pub container_type: ContainerType,
    pub volumes: Vec<StoredVolume>,
    pub docker: Option<StoredDocker>,
}

/// Flat volume record; exactly one of `host_path` and `persistent` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredVolume {
    pub container_path: String,
    pub host_path: Option<String>,
    pub persistent: Option<StoredPersistentInfo>,
    pub mode: VolumeMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPersistentInfo {
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocker {
    pub image: String,
    pub network: Option<DockerNetwork>,
    pub port_mappings: Option<Vec<PortMapping>>,
    pub privileged: bool,
    pub parameters: Vec<Parameter>,
    pub force_pull_image: bool,
}

pub fn container_to_stored(container: &Container) -> StoredContainer {
    StoredContainer {
        container_type: container.container_type,
        volumes: container
            .volumes
            .iter()
            .map(|volume| match volume {
                Volume::Docker(dv) => StoredVolume {
                    container_path: dv.container_path.clone(),
                    host_path: Some(dv.host_path.clone()),
                    persistent: None,
                    mode: dv.mode,
                },
                Volume::Persistent(pv) => StoredVolume {
                    container_path: pv.container_path.clone(),
                    host_path: None,
                    persistent: Some(StoredPersistentInfo {
                        size: pv.persistent.size,
                    }),
                    mode: pv.mode,
                },
            })
            .collect(),
        docker: container.docker.as_ref().map(|d| StoredDocker {
            image: d.image.clone(),
            network: d.network,
            port_mappings: d.port_mappings.clone(),
            privileged: d.privileged,
            parameters: d.parameters.clone(),
            force_pull_image: d.force_pull_image,
        }),
    }
}

pub fn container_from_stored(stored: &StoredContainer) -> SerializerResult<Container> {
    let volumes = stored
        .volumes
        .iter()
        .enumerate()
        .map(|(index, v)| match (&v.host_path, &v.persistent) {
            (Some(host_path), None) => Ok(Volume::Docker(DockerVolume {
                container_path: v.container_path.clone(),
                host_path: host_path.clone(),
                mode: v.mode,
            })),
            (None, Some(info)) => Ok(Volume::Persistent(PersistentVolume {
                container_path: v.container_path.clone(),
                persistent: PersistentVolumeInfo { size: info.size },
                mode: v.mode,
            })),
            (Some(_), Some(_)) => Err(SerializerError::AmbiguousVolume {
                index,
                container_path: v.container_path.clone(),
            }),
            (None, None) => Err(SerializerError::UnknownVolumeShape {
                index,
                container_path: v.container_path.clone(),
            }),
        })
        .collect::<SerializerResult<Vec<_>>>()?;

    Ok(Container {
        container_type: stored.container_type,
        volumes,
        docker: stored.docker.as_ref().map(|d| Docker {
            image: d.image.clone(),
            network: d.network,
            port_mappings: d.port_mappings.clone(),
            privileged: d.privileged,
            parameters: d.parameters.clone(),
            force_pull_image: d.force_pull_image,
        }),
    })
}
