//! Site identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Opaque, stable identifier of one published tenant site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(String);

impl SiteId {
    /// Wrap a raw identifier, rejecting empty or whitespace-only values
    /// and anything that would escape the `sites/{id}/` key prefix.
    pub fn new(raw: impl Into<String>) -> Result<Self, Error> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("site id cannot be empty".into()));
        }
        if trimmed.contains('/') || trimmed == "." || trimmed == ".." {
            return Err(Error::InvalidInput(format!("site id contains a path separator: {trimmed}")));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
