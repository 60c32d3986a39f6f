//! Error types for the container serializers.

use thiserror::Error;

pub type SerializerResult<T> = Result<T, SerializerError>;

#[derive(Debug, Error, PartialEq)]
pub enum SerializerError {
    #[error("volume {index} at {container_path:?} has neither a host path nor persistent info")]
    UnknownVolumeShape { index: usize, container_path: String },

    #[error("native volume {index} at {container_path:?} has no host path")]
    MissingHostPath { index: usize, container_path: String },

    #[error("persistent volume {index} at {container_path:?} also declares a host path")]
    AmbiguousVolume { index: usize, container_path: String },
}
