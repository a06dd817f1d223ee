//! DNS record retrieval for the scan target.

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::TokioAsyncResolver;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ScanConfig;
use crate::domain::Domain;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MxRecord {
    pub priority: u16,
    pub host: String,
}

/// Records per type. A type with no answer is an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecords {
    pub domain: String,
    pub a_records: Vec<String>,
    pub aaaa_records: Vec<String>,
    pub mx_records: Vec<MxRecord>,
    pub txt_records: Vec<String>,
    pub ns_records: Vec<String>,
    pub cname_records: Vec<String>,
}

impl DnsRecords {
    pub fn empty(domain: &Domain) -> Self {
        Self {
            domain: domain.to_string(),
            ..Default::default()
        }
    }

    pub fn ip_count(&self) -> usize {
        self.a_records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a_records.is_empty()
            && self.aaaa_records.is_empty()
            && self.mx_records.is_empty()
            && self.txt_records.is_empty()
            && self.ns_records.is_empty()
            && self.cname_records.is_empty()
    }
}

pub struct DnsScanner {
    resolver: TokioAsyncResolver,
}

impl DnsScanner {
    /// Resolver from the system configuration, falling back to the
    /// hickory defaults when it cannot be read.
    pub fn new(config: &ScanConfig) -> Self {
        let (resolver_config, opts) = match hickory_resolver::system_conf::read_system_conf() {
            Ok(conf) => conf,
            Err(e) => {
                warn!("Could not read system resolver config ({}), using defaults", e);
                (ResolverConfig::default(), ResolverOpts::default())
            }
        };
        Self::with_config(resolver_config, opts, config)
    }

    pub fn with_config(resolver_config: ResolverConfig, mut opts: ResolverOpts, config: &ScanConfig) -> Self {
        opts.timeout = config.dns_timeout;
        opts.attempts = config.dns_retries.max(1);
        Self {
            resolver: TokioAsyncResolver::tokio(resolver_config, opts),
        }
    }

    pub async fn get_dns_records(&self, domain: &Domain) -> DnsRecords {
        let name = domain.as_str();
        debug!("Resolving DNS records for {}", name);

        let (a, aaaa, mx, txt, ns, cname) = tokio::join!(
            self.resolver.ipv4_lookup(name),
            self.resolver.ipv6_lookup(name),
            self.resolver.mx_lookup(name),
            self.resolver.txt_lookup(name),
            self.resolver.ns_lookup(name),
            self.resolver.lookup(name, RecordType::CNAME),
        );

        let mut records = DnsRecords::empty(domain);

        if let Some(lookup) = answered(name, "A", a) {
            records.a_records = lookup.iter().map(|r| r.to_string()).collect();
        }
        if let Some(lookup) = answered(name, "AAAA", aaaa) {
            records.aaaa_records = lookup.iter().map(|r| r.to_string()).collect();
        }
        if let Some(lookup) = answered(name, "MX", mx) {
            records.mx_records = lookup
                .iter()
                .map(|mx| MxRecord {
                    priority: mx.preference(),
                    host: mx.exchange().to_utf8(),
                })
                .collect();
        }
        if let Some(lookup) = answered(name, "TXT", txt) {
            records.txt_records = lookup
                .iter()
                .map(|txt| {
                    let joined: String = txt
                        .txt_data()
                        .iter()
                        .map(|part| String::from_utf8_lossy(part).into_owned())
                        .collect();
                    joined.trim_matches('"').to_string()
                })
                .collect();
        }
        if let Some(lookup) = answered(name, "NS", ns) {
            records.ns_records = lookup.iter().map(|r| r.to_string()).collect();
        }
        if let Some(lookup) = answered(name, "CNAME", cname) {
            records.cname_records = lookup
                .iter()
                .filter_map(|rdata| match rdata {
                    RData::CNAME(target) => Some(target.to_string()),
                    _ => None,
                })
                .collect();
        }

        debug!(
            "DNS for {}: {} A, {} AAAA, {} MX, {} TXT, {} NS, {} CNAME",
            name,
            records.a_records.len(),
            records.aaaa_records.len(),
            records.mx_records.len(),
            records.txt_records.len(),
            records.ns_records.len(),
            records.cname_records.len()
        );
        records
    }
}

/// Missing records are normal; other resolver errors are logged and
/// treated the same way.
fn answered<T>(name: &str, record_type: &str, result: Result<T, ResolveError>) -> Option<T> {
    match result {
        Ok(lookup) => Some(lookup),
        Err(e) => {
            if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) {
                debug!("No {} records for {}", record_type, name);
            } else {
                warn!("{} lookup for {} failed: {}", record_type, name, e);
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_records_shape() {
        let d = Domain::parse("example.com").unwrap();
        let records = DnsRecords::empty(&d);
        assert_eq!(records.domain, "example.com");
        assert!(records.is_empty());
        assert_eq!(records.ip_count(), 0);

        let v = serde_json::to_value(&records).unwrap();
        for field in [
            "domain",
            "a_records",
            "aaaa_records",
            "mx_records",
            "txt_records",
            "ns_records",
            "cname_records",
        ] {
            assert!(v.get(field).is_some(), "missing field {}", field);
        }
    }

    #[test]
    fn test_mx_serialization() {
        let mx = MxRecord { priority: 10, host: "mail.example.com.".into() };
        let v = serde_json::to_value(&mx).unwrap();
        assert_eq!(v["priority"], 10);
        assert_eq!(v["host"], "mail.example.com.");
    }

    #[test]
    fn test_ip_count_uses_a_records() {
        let d = Domain::parse("example.com").unwrap();
        let mut records = DnsRecords::empty(&d);
        records.a_records = vec!["93.184.216.34".into(), "93.184.216.35".into()];
        records.aaaa_records = vec!["2606:2800:220:1:248:1893:25c8:1946".into()];
        assert_eq!(records.ip_count(), 2);
        assert!(!records.is_empty());
    }
}
