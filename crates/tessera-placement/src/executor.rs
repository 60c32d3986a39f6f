//! Executor dispatch and the custom-executor calling convention.
//!
//! A task either runs under the resource manager's built-in command
//! executor, or under a custom executor binary at a path on the agent.
//! Custom executors receive the full app definition as the task's `data`:
//!
//! ```text
//! {"version": 1, "app": { ...AppDefinition, camelCase JSON... }}
//! ```
//!
//! `version` changes only on incompatible payload changes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tessera_core::PlacementConfig;
use tessera_core::config::COMMAND_EXECUTOR;
use tessera_state::AppDefinition;

pub const PAYLOAD_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Executor {
    /// The resource manager's built-in command executor.
    Command,
    /// A custom executor binary on the agent.
    Path(String),
}

impl Executor {
    pub fn dispatch(spec: &str) -> Self {
        if spec == COMMAND_EXECUTOR {
            Executor::Command
        } else {
            Executor::Path(spec.to_string())
        }
    }

    /// An empty app executor falls back to the operator default.
    pub fn resolve(app_executor: &str, config: &PlacementConfig) -> Self {
        if app_executor.is_empty() {
            Self::dispatch(&config.executor)
        } else {
            Self::dispatch(app_executor)
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExecutorPayload<A> {
    pub version: u32,
    pub app: A,
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("malformed executor payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported executor payload version {0} (expected {expected})", expected = PAYLOAD_VERSION)]
    UnsupportedVersion(u32),
}

pub fn encode_payload(app: &AppDefinition) -> Result<Vec<u8>, PayloadError> {
    let payload = ExecutorPayload {
        version: PAYLOAD_VERSION,
        app,
    };
    Ok(serde_json::to_vec(&payload)?)
}

/// Executor-side decoding of `TaskInfo.data`.
pub fn decode_payload(data: &[u8]) -> Result<AppDefinition, PayloadError> {
    let payload: ExecutorPayload<AppDefinition> = serde_json::from_slice(data)?;
    if payload.version != PAYLOAD_VERSION {
        return Err(PayloadError::UnsupportedVersion(payload.version));
    }
    Ok(payload.app)
}

/// Single-quote a path for `sh`.
pub(crate) fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
