//! Resource matching: can this offer run this app?
//!
//! Scalars (cpus, mem, disk) are matched per role: accepted resources of
//! one role are summed and the first role, in offer order, whose total
//! covers the requirement wins. Ports are delegated to [`crate::ports`].
//!
//! The matcher keeps no state between calls. When several apps are packed
//! into one offer, the caller shrinks the offer between calls.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use tessera_core::{CPUS, DISK, MEM, Offer, PORTS, PlacementConfig, Resource, ValueRange};
use tessera_state::AppDefinition;

use crate::ports::{PortRequest, match_ports, port_requests};

/// A task already running somewhere in the cluster, with its host ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningInstance {
    pub task_id: String,
    pub host: String,
    pub ports: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortWithRole {
    pub port: u32,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRangeWithRole {
    pub begin: u32,
    pub end: u32,
    pub role: String,
}

/// A successful match: the role chosen for each scalar and the host ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMatch {
    pub cpu_role: String,
    pub mem_role: String,
    /// `None` when disk is not declared to the resource manager.
    pub disk_role: Option<String>,
    /// One entry per required port, in declaration order.
    pub ports: Vec<PortWithRole>,
}

impl ResourceMatch {
    pub fn host_ports(&self) -> Vec<u32> {
        self.ports.iter().map(|p| p.port).collect()
    }

    /// Selected ports folded into contiguous same-role ranges.
    pub fn port_ranges(&self) -> Vec<PortRangeWithRole> {
        let mut ranges: Vec<PortRangeWithRole> = Vec::new();
        for p in &self.ports {
            match ranges.last_mut() {
                Some(last) if last.role == p.role && last.end.checked_add(1) == Some(p.port) => {
                    last.end = p.port;
                }
                _ => ranges.push(PortRangeWithRole {
                    begin: p.port,
                    end: p.port,
                    role: p.role.clone(),
                }),
            }
        }
        ranges
    }

    /// The resources a task launched from this match consumes.
    pub fn resources(&self, app: &AppDefinition) -> Vec<Resource> {
        let mut resources = vec![
            Resource::scalar(CPUS, app.cpus, &self.cpu_role),
            Resource::scalar(MEM, app.mem, &self.mem_role),
        ];
        if let Some(role) = &self.disk_role {
            resources.push(Resource::scalar(DISK, app.disk, role));
        }

        let mut by_role: Vec<(String, Vec<ValueRange>)> = Vec::new();
        for range in self.port_ranges() {
            let value = ValueRange::new(u64::from(range.begin), u64::from(range.end));
            match by_role.iter_mut().find(|(role, _)| *role == range.role) {
                Some((_, values)) => values.push(value),
                None => by_role.push((range.role, vec![value])),
            }
        }
        resources.extend(
            by_role
                .into_iter()
                .map(|(role, values)| Resource::ranges(PORTS, values, &role)),
        );
        resources
    }
}

/// The app's own role set, or the operator default when it names none.
pub fn accepted_roles_for<'a>(
    app: &'a AppDefinition,
    config: &'a PlacementConfig,
) -> &'a BTreeSet<String> {
    app.accepted_resource_roles
        .as_ref()
        .unwrap_or(&config.default_accepted_resource_roles)
}

/// Match `app` against `offer`, consuming only `accepted_roles`.
///
/// Returns `None` when any requirement is not covered. That is a normal
/// outcome, logged at info level with a summary of the shortfall.
pub fn match_resources(
    offer: &Offer,
    app: &AppDefinition,
    running: &[RunningInstance],
    accepted_roles: &BTreeSet<String>,
    config: &PlacementConfig,
) -> Option<ResourceMatch> {
    let matched = try_match(offer, app, running, accepted_roles, config);
    if matched.is_none() {
        info!(
            app = %app.id,
            offer = %offer.id,
            "insufficient resources: {}",
            describe_shortfall(offer, app)
        );
    }
    matched
}

fn try_match(
    offer: &Offer,
    app: &AppDefinition,
    running: &[RunningInstance],
    accepted_roles: &BTreeSet<String>,
    config: &PlacementConfig,
) -> Option<ResourceMatch> {
    let cpu_role = scalar_role(offer, CPUS, app.cpus, accepted_roles)?;
    let mem_role = scalar_role(offer, MEM, app.mem, accepted_roles)?;
    let disk_role = if config.declares_disk(app.disk) {
        Some(scalar_role(offer, DISK, app.disk, accepted_roles)?)
    } else {
        None
    };

    let in_use: BTreeSet<u32> = running
        .iter()
        .filter(|instance| instance.host == offer.hostname)
        .flat_map(|instance| instance.ports.iter().copied())
        .collect();
    let ports = match_ports(offer, &port_requests(app), accepted_roles, &in_use)?;

    debug!(
        app = %app.id,
        offer = %offer.id,
        cpu_role = %cpu_role,
        mem_role = %mem_role,
        ports = ports.len(),
        "offer matched"
    );

    Some(ResourceMatch {
        cpu_role,
        mem_role,
        disk_role,
        ports,
    })
}

/// First accepted role whose summed scalar covers `required`.
fn scalar_role(
    offer: &Offer,
    name: &str,
    required: f64,
    accepted_roles: &BTreeSet<String>,
) -> Option<String> {
    let mut totals: Vec<(&str, f64)> = Vec::new();
    for resource in offer
        .resources
        .iter()
        .filter(|r| r.name == name && accepted_roles.contains(&r.role))
    {
        let Some(value) = resource.scalar_value() else {
            continue;
        };
        match totals.iter_mut().find(|(role, _)| *role == resource.role) {
            Some((_, total)) => *total += value,
            None => totals.push((resource.role.as_str(), value)),
        }
    }

    let role = totals
        .into_iter()
        .find(|(_, total)| *total >= required)
        .map(|(role, _)| role.to_string());
    if role.is_none() {
        debug!(resource = name, required, offer = %offer.id, "scalar requirement not covered");
    }
    role
}

/// `ports=([8080, 9000 required] + [2 dynamic])`
pub fn ports_string(app: &AppDefinition) -> String {
    let requests = port_requests(app);
    let required: Vec<String> = requests
        .iter()
        .filter_map(|r| match r {
            PortRequest::Static(port) => Some(port.to_string()),
            PortRequest::Dynamic => None,
        })
        .collect();
    let dynamic = requests
        .iter()
        .filter(|r| **r == PortRequest::Dynamic)
        .count();
    format!(
        "ports=([{} required] + [{} dynamic])",
        required.join(", "),
        dynamic
    )
}

/// Operator-facing summary of what the app needs against what was offered.
pub fn describe_shortfall(offer: &Offer, app: &AppDefinition) -> String {
    format!(
        "need cpus={:?}, mem={:?}, disk={:?}, {}; available in offer {}",
        app.cpus,
        app.mem,
        app.disk,
        ports_string(app),
        offer.summary()
    )
}
