//! Match-then-build: the single entry point a scheduler loop calls per
//! offer.
//!
//! 1. Resolve the roles the app may consume
//! 2. Match the offer (see [`crate::matcher`])
//! 3. Build the launch descriptor (see [`crate::builder`])

use tracing::info;

use tessera_core::{Offer, PlacementConfig};
use tessera_state::AppDefinition;

use crate::builder::{Launch, TaskBuilder};
use crate::matcher::{RunningInstance, accepted_roles_for, match_resources};
use crate::task_id::TaskIdGenerator;

/// Place one task of `app` on `offer`, or `None` if the offer falls short.
pub fn place<G: TaskIdGenerator + ?Sized>(
    offer: &Offer,
    app: &AppDefinition,
    running: &[RunningInstance],
    config: &PlacementConfig,
    task_ids: &G,
) -> Option<Launch> {
    let roles = accepted_roles_for(app, config);
    let resource_match = match_resources(offer, app, running, roles, config)?;
    let launch = TaskBuilder::new(app, config, task_ids).build(offer, &resource_match);

    info!(
        app = %app.id,
        task_id = %launch.task_info.task_id,
        host = %offer.hostname,
        ports = ?launch.host_ports,
        "placed task"
    );
    Some(launch)
}
