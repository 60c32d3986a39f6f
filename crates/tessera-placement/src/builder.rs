//! Launch descriptor construction.
//!
//! Turns a [`ResourceMatch`] into the `TaskInfo` the resource manager
//! launches. Building never fails: apps reaching this point have already
//! passed validation, and the match guarantees one host port per
//! required port.

use tracing::{error, warn};

use tessera_core::{
    ContainerInfo, ContainerType, DiscoveryInfo, DiscoveryPort, DiscoveryVisibility, ExecutorInfo,
    IpAddressInfo, Labels, NetworkInfo, Offer, PlacementConfig, TaskInfo,
};
use tessera_state::{AppDefinition, PortMapping, container_to_native};

use crate::env::command_info;
use crate::executor::{Executor, encode_payload, shell_quote};
use crate::health::select_health_check;
use crate::matcher::ResourceMatch;
use crate::task_id::TaskIdGenerator;

/// A built task plus the host ports it was given, in match order.
///
/// The caller sends `task_info` and records `host_ports` against the
/// running-instance ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Launch {
    pub task_info: TaskInfo,
    pub host_ports: Vec<u32>,
}

pub struct TaskBuilder<'a, G: ?Sized> {
    app: &'a AppDefinition,
    config: &'a PlacementConfig,
    task_ids: &'a G,
}

impl<'a, G: TaskIdGenerator + ?Sized> TaskBuilder<'a, G> {
    pub fn new(app: &'a AppDefinition, config: &'a PlacementConfig, task_ids: &'a G) -> Self {
        Self {
            app,
            config,
            task_ids,
        }
    }

    pub fn build(&self, offer: &Offer, resource_match: &ResourceMatch) -> Launch {
        let app = self.app;
        let executor = Executor::resolve(&app.executor, self.config);
        let task_id = self.task_ids.generate(&app.id);
        let host_ports = resource_match.host_ports();

        let mut task = TaskInfo {
            name: app.id.to_hostname(),
            task_id: task_id.clone(),
            agent_id: offer.agent_id.clone(),
            resources: resource_match.resources(app),
            command: None,
            executor: None,
            container: None,
            health_check: None,
            labels: None,
            discovery: discovery_info(app),
            data: None,
        };

        let container = compute_container_info(app, &host_ports);
        let command = command_info(
            app,
            Some(&task_id),
            Some(&offer.hostname),
            &host_ports,
            self.config.env_vars_prefix.as_deref(),
        );

        match executor {
            Executor::Command => {
                task.command = Some(command);
                task.container = container;
            }
            Executor::Path(path) => {
                let executor_path = shell_quote(&path);
                let line = format!(
                    "chmod ug+rx {executor_path} && exec {executor_path} {}",
                    app.command_line()
                );
                let mut command = command;
                command.value = Some(line.trim_end().to_string());
                command.shell = true;
                command.arguments.clear();

                task.executor = Some(ExecutorInfo {
                    executor_id: format!("marathon-{task_id}"),
                    command,
                    container,
                });
                match encode_payload(app) {
                    Ok(data) => task.data = Some(data),
                    Err(e) => error!(
                        task_id = %task_id,
                        error = %e,
                        "failed to encode executor payload; launching without it"
                    ),
                }
            }
        }

        let selection = select_health_check(&app.health_checks);
        if selection.dropped > 0 {
            warn!(
                task_id = %task_id,
                dropped = selection.dropped,
                "resource manager supports one command health check per task; task will run without {} of its defined health checks",
                selection.dropped
            );
        }
        task.health_check = selection.selected;

        if !app.labels.is_empty() {
            task.labels = Some(Labels::from_pairs(&app.labels));
        }

        Launch {
            task_info: task,
            host_ports,
        }
    }
}

/// Pair each mapping with the host port at the same position.
///
/// A mapping with container port 0 takes the host port on both sides, so
/// the app can advertise one number whether or not it fixed its port.
pub fn rewrite_port_mappings(mappings: &[PortMapping], host_ports: &[u32]) -> Vec<PortMapping> {
    mappings
        .iter()
        .zip(host_ports)
        .map(|(mapping, port)| {
            if mapping.container_port == 0 {
                PortMapping {
                    container_port: *port,
                    host_port: *port,
                    ..*mapping
                }
            } else {
                PortMapping {
                    host_port: *port,
                    ..*mapping
                }
            }
        })
        .collect()
}

/// Discovery info for IP-per-task apps that declare discovery ports.
pub fn discovery_info(app: &AppDefinition) -> Option<DiscoveryInfo> {
    let ip = app.ip_address.as_ref()?;
    if ip.discovery.ports.is_empty() {
        return None;
    }
    Some(DiscoveryInfo {
        visibility: DiscoveryVisibility::Framework,
        name: app.id.to_hostname(),
        ports: ip
            .discovery
            .ports
            .iter()
            .map(|p| DiscoveryPort {
                number: p.number,
                name: p.name.clone(),
                protocol: p.protocol.as_str().to_string(),
            })
            .collect(),
    })
}

/// Container info for the launch, or `None` when the app declares neither
/// a container nor an IP-per-task address.
pub fn compute_container_info(app: &AppDefinition, host_ports: &[u32]) -> Option<ContainerInfo> {
    if app.container.is_none() && app.ip_address.is_none() {
        return None;
    }

    let mut info = ContainerInfo {
        container_type: None,
        volumes: Vec::new(),
        docker: None,
        network_infos: Vec::new(),
    };

    if let Some(container) = &app.container {
        let mut container = container.clone();
        if let Some(docker) = container.docker.as_mut() {
            if let Some(mappings) = docker.port_mappings.as_mut() {
                *mappings = rewrite_port_mappings(mappings, host_ports);
            }
        }
        let native = container_to_native(&container);
        info.container_type = native.container_type;
        info.volumes.extend(native.volumes);
        info.docker = native.docker;
    }

    if let Some(ip) = &app.ip_address {
        info.network_infos.push(NetworkInfo {
            ip_addresses: vec![IpAddressInfo::default()],
            groups: ip.groups.clone(),
            labels: Labels::from_pairs(&ip.labels),
        });
    }

    if info.container_type.is_none() {
        info.container_type = Some(ContainerType::Mesos);
    }
    Some(info)
}
