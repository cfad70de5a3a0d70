use std::collections::HashMap;
use std::fs;

use serde::Deserialize;
use thiserror::Error;

/// Sentinel returned whenever a remedy entry or one of its fields is absent.
pub const NOT_AVAILABLE: &str = "Not available";

#[derive(Debug, Error)]
pub enum RemedyLoadError {
    #[error("failed to read remedy table: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse remedy table: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemedyEntry {
    #[serde(default = "not_available")]
    pub cure: String,
    #[serde(default = "not_available")]
    pub precaution: String,
}

impl Default for RemedyEntry {
    fn default() -> Self {
        RemedyEntry {
            cure: not_available(),
            precaution: not_available(),
        }
    }
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

/// Static disease-name → treatment-text mapping, read once at startup.
#[derive(Debug, Default)]
pub struct RemedyTable {
    entries: HashMap<String, RemedyEntry>,
}

impl RemedyTable {
    pub fn load(path: &str) -> Result<Self, RemedyLoadError> {
        let raw = fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, RemedyLoadError> {
        let entries = serde_json::from_str(raw)?;
        Ok(RemedyTable { entries })
    }

    /// Missing entries resolve to the "Not available" defaults rather than
    /// an error; the prediction itself is still valid without remedy text.
    pub fn lookup(&self, disease_name: &str) -> RemedyEntry {
        self.entries
            .get(disease_name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
