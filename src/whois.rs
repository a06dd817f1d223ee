//! WHOIS registration metadata.
//!
//! Raw WHOIS text is fetched with `whois-rust` (falling back to the system
//! `whois` binary) and parsed into [`WhoisInfo`]. Every field normalizer is
//! total: unparseable input simply leaves the field absent.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};
use whois_rust::{WhoIs, WhoIsLookupOptions};

use crate::config::ScanConfig;
use crate::domain::Domain;
use crate::error::ScanError;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").unwrap()
});

const WHOIS_SERVERS: &str = r#"{
    "com": "whois.verisign-grs.com",
    "net": "whois.verisign-grs.com",
    "org": "whois.pir.org",
    "info": "whois.afilias.net",
    "io": "whois.nic.io",
    "dev": "whois.nic.google",
    "app": "whois.nic.google",
    "co": "whois.nic.co",
    "uk": "whois.nic.uk",
    "de": "whois.denic.de",
    "fr": "whois.nic.fr",
    "nl": "whois.domain-registry.nl",
    "eu": "whois.eu",
    "": "whois.iana.org"
}"#;

const REGISTRAR_KEYS: &[&str] = &["registrar", "sponsoring registrar", "registrar name"];
const CREATION_KEYS: &[&str] = &[
    "creation date",
    "created",
    "created on",
    "created date",
    "registered on",
    "registration time",
    "domain registration date",
];
const EXPIRATION_KEYS: &[&str] = &[
    "registry expiry date",
    "registrar registration expiration date",
    "expiration date",
    "expiry date",
    "expires",
    "expires on",
    "paid-till",
];
const NAME_SERVER_KEYS: &[&str] = &["name server", "nserver", "nameserver", "name servers"];
const STATUS_KEYS: &[&str] = &["domain status", "status"];

/// Registration data for one domain. `error` is set when no data could be
/// retrieved at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoisInfo {
    pub domain: String,
    pub registrar: Option<String>,
    pub creation_date: Option<String>,
    pub expiration_date: Option<String>,
    pub name_servers: Vec<String>,
    pub emails: Vec<String>,
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WhoisInfo {
    pub fn empty(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            ..Default::default()
        }
    }

    pub fn failed(domain: &str, reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::empty(domain)
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

pub struct WhoisClient {
    timeout: Duration,
}

impl WhoisClient {
    pub fn new(config: &ScanConfig) -> Self {
        Self { timeout: config.whois_timeout }
    }

    /// Look up `domain`. Never fails; see [`WhoisInfo::error`].
    pub async fn lookup(&self, domain: &Domain) -> WhoisInfo {
        let raw = match self.native_lookup(domain).await {
            Ok(raw) => Ok(raw),
            Err(e) => {
                debug!("{}; trying system whois", e);
                self.system_lookup(domain).await
            }
        };

        match raw {
            Ok(raw) => parse_whois(domain.as_str(), &raw),
            Err(e) => {
                warn!("WHOIS lookup for {} failed: {}", domain, e);
                WhoisInfo::failed(domain.as_str(), e.to_string())
            }
        }
    }

    async fn native_lookup(&self, domain: &Domain) -> Result<String, ScanError> {
        let whois = WhoIs::from_string(WHOIS_SERVERS)
            .map_err(|e| ScanError::Whois(format!("failed to create WHOIS client: {}", e)))?;
        let options = WhoIsLookupOptions::from_string(domain.as_str())
            .map_err(|e| ScanError::Whois(format!("invalid domain for WHOIS lookup: {}", e)))?;

        match tokio::time::timeout(
            self.timeout,
            tokio::task::spawn_blocking(move || whois.lookup(options)),
        )
        .await
        {
            Ok(Ok(Ok(raw))) => Ok(raw),
            Ok(Ok(Err(e))) => Err(ScanError::Whois(format!("whois-rust lookup failed: {}", e))),
            Ok(Err(_)) => Err(ScanError::Whois("whois-rust lookup task panicked".to_string())),
            Err(_) => Err(ScanError::Whois("whois-rust lookup timed out".to_string())),
        }
    }

    async fn system_lookup(&self, domain: &Domain) -> Result<String, ScanError> {
        let output = tokio::time::timeout(
            self.timeout,
            Command::new("whois").arg(domain.as_str()).kill_on_drop(true).output(),
        )
        .await
        .map_err(|_| ScanError::Whois("system whois timed out".to_string()))??;

        if !output.status.success() && output.stdout.is_empty() {
            return Err(ScanError::Whois(format!("system whois exited with {}", output.status)));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Parse `key: value` WHOIS text. Only the first occurrence of single-valued
/// fields counts.
pub fn parse_whois(domain: &str, raw: &str) -> WhoisInfo {
    let mut info = WhoisInfo::empty(domain);

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('%') || line.starts_with('#') || line.starts_with(">>>") {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let key = key.as_str();

        if REGISTRAR_KEYS.contains(&key) {
            if info.registrar.is_none() {
                info.registrar = Some(value.to_string());
            }
        } else if CREATION_KEYS.contains(&key) {
            if info.creation_date.is_none() {
                info.creation_date = normalize_date(value);
            }
        } else if EXPIRATION_KEYS.contains(&key) {
            if info.expiration_date.is_none() {
                info.expiration_date = normalize_date(value);
            }
        } else if NAME_SERVER_KEYS.contains(&key) {
            if let Some(ns) = normalize_name_server(value) {
                if !info.name_servers.contains(&ns) {
                    info.name_servers.push(ns);
                }
            }
        } else if STATUS_KEYS.contains(&key) && info.status.is_none() {
            info.status = normalize_status(value);
        }
    }

    for m in EMAIL_REGEX.find_iter(raw) {
        if let Some(email) = normalize_email(m.as_str()) {
            if !info.emails.contains(&email) {
                info.emails.push(email);
            }
        }
    }

    info
}

/// Render a WHOIS timestamp as `YYYY-MM-DD`.
pub fn normalize_date(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    parse_date(value)
        .or_else(|| value.split_whitespace().next().and_then(parse_date))
        .map(|d| d.format("%Y-%m-%d").to_string())
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in ["%Y-%m-%d", "%d-%b-%Y", "%Y.%m.%d", "%Y/%m/%d", "%d.%m.%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return Some(d);
        }
    }
    None
}

pub fn normalize_name_server(value: &str) -> Option<String> {
    let ns = value.split_whitespace().next()?.trim_end_matches('.').to_lowercase();
    if ns.is_empty() {
        None
    } else {
        Some(ns)
    }
}

pub fn normalize_email(value: &str) -> Option<String> {
    let email = value.trim().trim_matches(|c| c == '<' || c == '>').to_lowercase();
    if email.contains('@') && !email.contains(' ') {
        Some(email)
    } else {
        None
    }
}

/// `"clientTransferProhibited https://icann.org/epp#..."` becomes
/// `"clientTransferProhibited"`.
pub fn normalize_status(value: &str) -> Option<String> {
    value.split_whitespace().next().map(str::to_string)
}
