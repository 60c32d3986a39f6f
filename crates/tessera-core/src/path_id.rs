//! Hierarchical workload identifiers (`/group/sub/app`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathId {
    segments: Vec<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum PathIdError {
    #[error("path id must not be empty")]
    Empty,
    #[error("invalid path segment {segment:?} in {path:?}")]
    InvalidSegment { path: String, segment: String },
}

impl PathId {
    pub fn parse(path: &str) -> Result<Self, PathIdError> {
        let segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if segments.is_empty() {
            return Err(PathIdError::Empty);
        }
        if let Some(bad) = segments.iter().find(|s| !is_valid_segment(s)) {
            return Err(PathIdError::InvalidSegment {
                path: path.to_string(),
                segment: bad.clone(),
            });
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// DNS-style name: segments reversed and joined with dots.
    /// `/prod/api` becomes `api.prod`.
    pub fn to_hostname(&self) -> String {
        let mut reversed: Vec<&str> = self.segments.iter().map(String::as_str).collect();
        reversed.reverse();
        reversed.join(".")
    }

    /// Flat form usable inside task ids: `/prod/api` becomes `prod_api`.
    pub fn safe_path(&self) -> String {
        self.segments.join("_")
    }
}

/// Segments are lowercase alphanumerics with inner dashes or dots,
/// or `.`/`..` for relative references.
fn is_valid_segment(segment: &str) -> bool {
    if segment == "." || segment == ".." {
        return true;
    }
    let bytes = segment.as_bytes();
    let edge_ok = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    edge_ok(bytes[0])
        && edge_ok(bytes[bytes.len() - 1])
        && bytes
            .iter()
            .all(|&b| edge_ok(b) || b == b'-' || b == b'.')
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

impl FromStr for PathId {
    type Err = PathIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PathId {
    type Error = PathIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PathId> for String {
    fn from(id: PathId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested() {
        let id = PathId::parse("/prod/api").unwrap();
        assert_eq!(id.segments(), &["prod".to_string(), "api".to_string()]);
        assert_eq!(id.to_string(), "/prod/api");
    }

    #[test]
    fn test_parse_without_leading_slash() {
        let id: PathId = "prod/api".parse().unwrap();
        assert_eq!(id.to_string(), "/prod/api");
    }

    #[test]
    fn test_hostname_reverses_segments() {
        let id = PathId::parse("/prod/backend/api").unwrap();
        assert_eq!(id.to_hostname(), "api.backend.prod");
    }

    #[test]
    fn test_safe_path() {
        let id = PathId::parse("/prod/backend/api").unwrap();
        assert_eq!(id.safe_path(), "prod_backend_api");
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(PathId::parse("/"), Err(PathIdError::Empty));
    }

    #[test]
    fn test_rejects_uppercase() {
        assert!(matches!(
            PathId::parse("/Prod/api"),
            Err(PathIdError::InvalidSegment { .. })
        ));
    }

    #[test]
    fn test_serde_as_string() {
        let id = PathId::parse("/prod/api").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"/prod/api\"");
        let back: PathId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<PathId>("\"/\"").is_err());
    }
}
