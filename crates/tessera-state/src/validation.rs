//! Upstream validation of workload specs.
//!
//! Violations are collected, never short-circuited, so the workload owner
//! sees every failing field at once. Each violation names the attribute
//! path that failed, e.g. `container.volumes[1].persistent.size`.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use tessera_core::{ContainerType, VolumeMode};

use crate::app::{AppDefinition, HealthCheck, HealthCheckProtocol, RANDOM_PORT};
use crate::container::{Container, Docker, DockerVolume, PersistentVolume, Volume};

const MAX_PORT: u32 = 65535;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", render(.violations))]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

fn render(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationReport {
    /// Violations whose path starts with `prefix`.
    pub fn at<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Violation> + 'a {
        self.violations.iter().filter(move |v| v.path.starts_with(prefix))
    }
}

/// Accumulates violations under a path prefix.
struct Violations {
    items: Vec<Violation>,
}

impl Violations {
    fn new() -> Self {
        Self { items: Vec::new() }
    }

    fn push(&mut self, path: String, message: impl Into<String>) {
        self.items.push(Violation {
            path,
            message: message.into(),
        });
    }

    fn check(&mut self, ok: bool, path: String, message: &str) {
        if !ok {
            self.push(path, message);
        }
    }

    fn finish(self) -> Result<(), ValidationReport> {
        if self.items.is_empty() {
            Ok(())
        } else {
            Err(ValidationReport {
                violations: self.items,
            })
        }
    }
}

fn join(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

/// Validate a whole app, container included.
pub fn validate_app(app: &AppDefinition) -> Result<(), ValidationReport> {
    let mut v = Violations::new();

    for (field, value) in [("cpus", app.cpus), ("mem", app.mem), ("disk", app.disk)] {
        v.check(
            value.is_finite() && value >= 0.0,
            field.to_string(),
            "must be a finite number >= 0",
        );
    }

    v.check(
        app.cmd.is_none() || app.args.is_none(),
        "cmd".to_string(),
        "must not be set together with args",
    );

    let mut seen = BTreeSet::new();
    for (i, port) in app.ports.iter().enumerate() {
        if *port > MAX_PORT {
            v.push(format!("ports[{i}]"), format!("must be <= {MAX_PORT}"));
        }
        if *port != RANDOM_PORT && !seen.insert(*port) {
            v.push(format!("ports[{i}]"), "must be unique");
        }
    }

    if let Some(container) = &app.container {
        check_container(container, "container", &mut v);
    }

    let port_count = app.required_port_count();
    for (i, check) in app.health_checks.iter().enumerate() {
        check_health(check, port_count, &format!("healthChecks[{i}]"), &mut v);
    }

    if let Some(ip) = &app.ip_address {
        for (i, port) in ip.discovery.ports.iter().enumerate() {
            let path = format!("ipAddress.discovery.ports[{i}]");
            v.check(!port.name.is_empty(), join(&path, "name"), "must not be empty");
            v.check(
                port.number > 0 && port.number <= MAX_PORT,
                join(&path, "number"),
                "must be between 1 and 65535",
            );
        }
    }

    v.finish()
}

/// Validate a container on its own; paths are relative to the container.
pub fn validate_container(container: &Container) -> Result<(), ValidationReport> {
    let mut v = Violations::new();
    check_container(container, "", &mut v);
    v.finish()
}

fn check_container(container: &Container, prefix: &str, v: &mut Violations) {
    match (container.container_type, &container.docker) {
        (ContainerType::Mesos, Some(_)) => v.push(
            join(prefix, "docker"),
            "must be empty for container type MESOS",
        ),
        (ContainerType::Docker, None) => v.push(
            join(prefix, "docker"),
            "must be defined for container type DOCKER",
        ),
        (ContainerType::Docker, Some(docker)) => check_docker(docker, &join(prefix, "docker"), v),
        (ContainerType::Mesos, None) => {}
    }

    for (i, volume) in container.volumes.iter().enumerate() {
        let path = join(prefix, &format!("volumes[{i}]"));
        match volume {
            Volume::Docker(dv) => check_docker_volume(dv, &path, v),
            Volume::Persistent(pv) => check_persistent_volume(pv, &path, v),
        }
    }
}

fn check_docker(docker: &Docker, prefix: &str, v: &mut Violations) {
    v.check(!docker.image.is_empty(), join(prefix, "image"), "must not be empty");

    for (i, pm) in docker.port_mappings.iter().flatten().enumerate() {
        let path = join(prefix, &format!("portMappings[{i}]"));
        for (field, value) in [
            ("containerPort", pm.container_port),
            ("hostPort", pm.host_port),
            ("servicePort", pm.service_port),
        ] {
            if value > MAX_PORT {
                v.push(join(&path, field), format!("must be <= {MAX_PORT}"));
            }
        }
    }
}

fn check_docker_volume(volume: &DockerVolume, prefix: &str, v: &mut Violations) {
    v.check(
        !volume.container_path.is_empty(),
        join(prefix, "containerPath"),
        "must not be empty",
    );
    v.check(
        !volume.host_path.is_empty(),
        join(prefix, "hostPath"),
        "must not be empty",
    );
}

fn check_persistent_volume(volume: &PersistentVolume, prefix: &str, v: &mut Violations) {
    let path = join(prefix, "containerPath");
    if volume.container_path.is_empty() {
        v.push(path, "must not be empty");
    } else {
        v.check(
            !volume.container_path.contains('/'),
            path,
            "must be a relative path without '/'",
        );
    }
    v.check(
        volume.persistent.size > 0,
        join(prefix, "persistent.size"),
        "must be greater than 0",
    );
    v.check(
        volume.mode == VolumeMode::Rw,
        join(prefix, "mode"),
        "must be RW for persistent volumes",
    );
}

fn check_health(check: &HealthCheck, port_count: usize, prefix: &str, v: &mut Violations) {
    match check.protocol {
        HealthCheckProtocol::Command => v.check(
            check.command.as_ref().is_some_and(|c| !c.value.is_empty()),
            join(prefix, "command"),
            "must be defined for COMMAND health checks",
        ),
        HealthCheckProtocol::Http | HealthCheckProtocol::Tcp => {
            v.check(
                (check.port_index as usize) < port_count,
                join(prefix, "portIndex"),
                "must refer to a declared port",
            );
            if let Some(path) = &check.path {
                v.check(
                    check.protocol == HealthCheckProtocol::Http && path.starts_with('/'),
                    join(prefix, "path"),
                    "must be an absolute path on HTTP health checks",
                );
            }
        }
    }
    v.check(
        check.timeout_seconds < check.interval_seconds,
        join(prefix, "timeoutSeconds"),
        "must be smaller than intervalSeconds",
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{PersistentVolumeInfo, PortMapping};
    use tessera_core::PathId;

    fn sample_app() -> AppDefinition {
        AppDefinition::new(PathId::parse("/prod/api").unwrap())
    }

    fn persistent(path: &str, size: u64, mode: VolumeMode) -> Volume {
        Volume::Persistent(PersistentVolume {
            container_path: path.to_string(),
            persistent: PersistentVolumeInfo { size },
            mode,
        })
    }

    fn paths(report: &ValidationReport) -> Vec<&str> {
        report.violations.iter().map(|v| v.path.as_str()).collect()
    }

    #[test]
    fn accepts_minimal_app() {
        assert!(validate_app(&sample_app()).is_ok());
    }

    #[test]
    fn mesos_container_rejects_docker() {
        let mut container = Container::docker("nginx");
        container.container_type = ContainerType::Mesos;
        let report = validate_container(&container).unwrap_err();
        assert_eq!(paths(&report), vec!["docker"]);
    }

    #[test]
    fn docker_container_requires_docker() {
        let container = Container {
            container_type: ContainerType::Docker,
            volumes: Vec::new(),
            docker: None,
        };
        let report = validate_container(&container).unwrap_err();
        assert_eq!(report.violations[0].message, "must be defined for container type DOCKER");
    }

    #[test]
    fn persistent_volume_rules_aggregate_by_index() {
        let mut container = Container::mesos();
        container.volumes = vec![
            Volume::Docker(DockerVolume {
                container_path: "/etc".to_string(),
                host_path: "/srv/etc".to_string(),
                mode: VolumeMode::Ro,
            }),
            persistent("data", 0, VolumeMode::Ro),
            persistent("nested/data", 64, VolumeMode::Rw),
        ];
        let report = validate_container(&container).unwrap_err();
        assert_eq!(
            paths(&report),
            vec![
                "volumes[1].persistent.size",
                "volumes[1].mode",
                "volumes[2].containerPath",
            ]
        );
        assert_eq!(report.at("volumes[1]").count(), 2);
    }

    #[test]
    fn docker_volume_requires_paths() {
        let mut container = Container::docker("nginx");
        container.volumes.push(Volume::Docker(DockerVolume {
            container_path: String::new(),
            host_path: String::new(),
            mode: VolumeMode::Rw,
        }));
        let report = validate_container(&container).unwrap_err();
        assert_eq!(
            paths(&report),
            vec!["volumes[0].containerPath", "volumes[0].hostPath"]
        );
    }

    #[test]
    fn app_paths_are_prefixed_with_container() {
        let mut app = sample_app();
        let mut container = Container::docker("");
        container.docker.as_mut().unwrap().port_mappings =
            Some(vec![PortMapping::new(70000, 0)]);
        app.container = Some(container);
        let report = validate_app(&app).unwrap_err();
        assert_eq!(
            paths(&report),
            vec![
                "container.docker.image",
                "container.docker.portMappings[0].containerPort",
            ]
        );
        assert!(report.to_string().starts_with("validation failed: container.docker.image"));
    }

    #[test]
    fn rejects_duplicate_static_ports() {
        let mut app = sample_app();
        app.ports = vec![0, 8080, 0, 8080];
        let report = validate_app(&app).unwrap_err();
        assert_eq!(paths(&report), vec!["ports[3]"]);
    }

    #[test]
    fn rejects_cmd_together_with_args() {
        let mut app = sample_app();
        app.cmd = Some("./run.sh".to_string());
        app.args = Some(vec!["/bin/serve".to_string()]);
        let report = validate_app(&app).unwrap_err();
        assert_eq!(paths(&report), vec!["cmd"]);

        app.cmd = None;
        assert!(validate_app(&app).is_ok());
    }

    #[test]
    fn rejects_negative_resources() {
        let mut app = sample_app();
        app.mem = -1.0;
        app.cpus = f64::NAN;
        let report = validate_app(&app).unwrap_err();
        assert_eq!(paths(&report), vec!["cpus", "mem"]);
    }

    #[test]
    fn command_health_check_needs_command() {
        let mut app = sample_app();
        let mut check = HealthCheck::command("");
        check.command = None;
        app.health_checks.push(check);
        let report = validate_app(&app).unwrap_err();
        assert_eq!(paths(&report), vec!["healthChecks[0].command"]);
    }

    #[test]
    fn http_health_check_needs_port() {
        let mut app = sample_app();
        app.health_checks.push(HealthCheck::http("/health"));
        let report = validate_app(&app).unwrap_err();
        assert_eq!(paths(&report), vec!["healthChecks[0].portIndex"]);

        app.ports = vec![0];
        assert!(validate_app(&app).is_ok());
    }
}
