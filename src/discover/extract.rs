//! Turns raw crt.sh entries into a clean set of subdomains of the target.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use crate::domain::{is_valid_hostname, Domain};

/// One row from the aggregator. Only `name_value` matters here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CtLogEntry {
    /// Comma/newline separated host names, possibly wildcarded
    pub name_value: Option<String>,
}

impl CtLogEntry {
    pub fn new(name_value: impl Into<String>) -> Self {
        Self { name_value: Some(name_value.into()) }
    }
}

pub type SubdomainSet = HashSet<String>;

/// Read entries out of a decoded response body.
///
/// Anything other than an array yields no entries. Array items that are not
/// objects, or lack a string `name_value`, become empty entries.
pub fn entries_from_json(value: &Value) -> Vec<CtLogEntry> {
    let Some(arr) = value.as_array() else {
        debug!("Discarding CT response that is not a JSON array");
        return Vec::new();
    };

    arr.iter()
        .map(|item| CtLogEntry::deserialize(item).unwrap_or_default())
        .collect()
}

/// Clean one raw name. `None` means the candidate is skipped.
pub fn clean_candidate(target: &Domain, raw: &str) -> Option<String> {
    let mut name = raw.trim().to_lowercase();

    if let Some(stripped) = name.strip_suffix('.') {
        name = stripped.to_string();
    }
    if let Some(stripped) = name.strip_prefix("*.") {
        name = stripped.to_string();
    }

    // emails and free-text descriptions
    if name.contains(' ') || name.contains('@') {
        return None;
    }
    if !target.is_strict_subdomain(&name) {
        return None;
    }
    // checked as-is so schemes, ports and paths never reach the set
    if !is_valid_hostname(&name) {
        return None;
    }
    Some(name)
}

pub fn extract(target: &Domain, entries: &[CtLogEntry]) -> SubdomainSet {
    let mut found = SubdomainSet::new();

    for entry in entries {
        let name_value = entry.name_value.as_deref().unwrap_or("");
        for raw in name_value.replace('\n', ",").split(',') {
            if let Some(name) = clean_candidate(target, raw) {
                found.insert(name);
            }
        }
    }

    found.remove(target.as_str());
    found
}
