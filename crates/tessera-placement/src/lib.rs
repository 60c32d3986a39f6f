//! Tessera placement core: offer matching and task construction.
//!
//! Given a resource offer and an app, decide whether the offer covers the
//! app's needs and, if it does, build the launch descriptor to send back
//! to the resource manager. Everything here is synchronous and pure;
//! callers own the offer stream and the instance ledger.
//!
//! # Components
//!
//! - **`matcher`**: Role-aware scalar matching and no-match diagnostics
//! - **`ports`**: Host port selection from offered ranges
//! - **`builder`**: `TaskInfo` construction (container, discovery, executor)
//! - **`env`**: Environment synthesis for command descriptions
//! - **`health`**: Health check selection for the native executor
//! - **`executor`**: Executor dispatch and the custom-executor payload
//! - **`task_id`**: Task id generation
//! - **`placer`**: Match-then-build entry point

pub mod builder;
pub mod env;
pub mod executor;
pub mod health;
pub mod matcher;
pub mod placer;
pub mod ports;
pub mod task_id;

pub use builder::{Launch, TaskBuilder};
pub use executor::{Executor, ExecutorPayload, PayloadError, decode_payload, encode_payload};
pub use matcher::{
    PortRangeWithRole, PortWithRole, ResourceMatch, RunningInstance, accepted_roles_for,
    describe_shortfall, match_resources, ports_string,
};
pub use placer::place;
pub use task_id::{TaskIdGenerator, UuidTaskIds};
