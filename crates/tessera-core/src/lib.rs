pub mod config;
pub mod path_id;
pub mod wire;

pub use config::{ConfigError, DiskPolicy, PlacementConfig};
pub use path_id::PathId;
pub use wire::*;
