//! tessera-state: the orchestrator's declarative workload model.
//!
//! Everything here is plain data plus pure functions over it:
//!
//! - **`app`**: `AppDefinition` and its nested specs (health checks,
//!   IP-per-task, fetch URIs)
//! - **`container`**: the Container Model (`Container`, `Volume`, `Docker`)
//! - **`validation`**: path-annotated validation reports, run before any
//!   scheduling attempt
//! - **`serializer`**: Container Model ⇄ native wire format, and ⇄ the
//!   orchestrator's stored format
//!
//! All model types use camelCase JSON, the same shape the executor payload
//! carries to custom executors.

pub mod app;
pub mod container;
pub mod error;
pub mod serializer;
pub mod validation;

pub use app::*;
pub use container::*;
pub use error::{SerializerError, SerializerResult};
pub use serializer::{
    StoredContainer, StoredDocker, StoredPersistentInfo, StoredVolume, container_from_native,
    container_from_stored, container_to_native, container_to_stored,
};
pub use validation::{ValidationReport, Violation, validate_app, validate_container};
