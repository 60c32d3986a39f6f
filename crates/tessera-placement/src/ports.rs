//! Host port selection.
//!
//! Each port an app needs is either static (a specific host port that must
//! be offered and free) or dynamic (any free port). Statics are claimed
//! first so a dynamic pick can never steal a required port. Dynamic ports
//! are taken lowest-first from the accepted ranges, in offer order.

use std::collections::BTreeSet;

use tracing::debug;

use tessera_core::{Offer, PORTS};
use tessera_state::{AppDefinition, RANDOM_PORT};

use crate::matcher::PortWithRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortRequest {
    Static(u32),
    Dynamic,
}

/// What the app asks for, one entry per host port, in declaration order.
pub fn port_requests(app: &AppDefinition) -> Vec<PortRequest> {
    let to_request = |port: u32| {
        if port == RANDOM_PORT {
            PortRequest::Dynamic
        } else {
            PortRequest::Static(port)
        }
    };

    match app.port_mappings() {
        Some(mappings) => mappings.iter().map(|pm| to_request(pm.host_port)).collect(),
        None if app.require_ports => app.ports.iter().map(|p| to_request(*p)).collect(),
        None => vec![PortRequest::Dynamic; app.ports.len()],
    }
}

/// Pick host ports for `requests` out of the offer's accepted port ranges.
///
/// `in_use` holds ports already assigned to instances on this host.
/// Returns `None` if any request cannot be satisfied.
pub fn match_ports(
    offer: &Offer,
    requests: &[PortRequest],
    accepted_roles: &BTreeSet<String>,
    in_use: &BTreeSet<u32>,
) -> Option<Vec<PortWithRole>> {
    if requests.is_empty() {
        return Some(Vec::new());
    }

    let ranges: Vec<(u64, u64, &str)> = offer
        .resources
        .iter()
        .filter(|r| r.name == PORTS && accepted_roles.contains(&r.role))
        .flat_map(|r| {
            r.range_values()
                .iter()
                .map(move |v| (v.begin, v.end, r.role.as_str()))
        })
        .collect();

    let mut chosen: BTreeSet<u32> = BTreeSet::new();
    let mut selected: Vec<Option<PortWithRole>> = vec![None; requests.len()];

    for (i, request) in requests.iter().enumerate() {
        let PortRequest::Static(port) = *request else {
            continue;
        };
        let role = ranges
            .iter()
            .find(|(begin, end, _)| *begin <= u64::from(port) && u64::from(port) <= *end)
            .map(|(_, _, role)| *role);
        match role {
            Some(role) if !in_use.contains(&port) && chosen.insert(port) => {
                selected[i] = Some(PortWithRole {
                    port,
                    role: role.to_string(),
                });
            }
            _ => {
                debug!(port, offer = %offer.id, "required port not available in offer");
                return None;
            }
        }
    }

    let mut free = ranges.iter().flat_map(|(begin, end, role)| {
        (*begin..=*end)
            .filter_map(|p| u32::try_from(p).ok())
            .filter(|p| *p != RANDOM_PORT)
            .map(move |p| (p, *role))
    });

    for (i, request) in requests.iter().enumerate() {
        if *request != PortRequest::Dynamic {
            continue;
        }
        let next = free.find(|(p, _)| !in_use.contains(p) && !chosen.contains(p));
        match next {
            Some((port, role)) => {
                chosen.insert(port);
                selected[i] = Some(PortWithRole {
                    port,
                    role: role.to_string(),
                });
            }
            None => {
                debug!(offer = %offer.id, "not enough free ports in offer");
                return None;
            }
        }
    }

    selected.into_iter().collect()
}
