//! Full-domain scan: DNS, WHOIS and CT subdomain discovery in one result.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ScanConfig;
use crate::discover::SubdomainFinder;
use crate::dns::{DnsRecords, DnsScanner};
use crate::domain::Domain;
use crate::error::ScanError;
use crate::whois::{WhoisClient, WhoisInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub dns: bool,
    pub whois: bool,
    pub subdomains: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self { dns: true, whois: true, subdomains: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total_subdomains: usize,
    pub total_ip_addresses: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub target_domain: String,
    pub dns_info: DnsRecords,
    pub whois_info: WhoisInfo,
    pub subdomains: Vec<String>,
    pub summary: ScanSummary,
}

impl ScanResult {
    pub fn new(target: &Domain, dns_info: DnsRecords, whois_info: WhoisInfo, subdomains: Vec<String>) -> Self {
        let summary = ScanSummary {
            total_subdomains: subdomains.len(),
            total_ip_addresses: dns_info.ip_count(),
        };
        Self {
            target_domain: target.to_string(),
            dns_info,
            whois_info,
            subdomains,
            summary,
        }
    }
}

pub struct Scanner {
    dns: DnsScanner,
    whois: WhoisClient,
    finder: SubdomainFinder,
}

impl Scanner {
    pub fn new(config: &ScanConfig) -> Self {
        Self::with_parts(DnsScanner::new(config), WhoisClient::new(config), SubdomainFinder::new(config))
    }

    pub fn with_parts(dns: DnsScanner, whois: WhoisClient, finder: SubdomainFinder) -> Self {
        Self { dns, whois, finder }
    }

    /// Normalize and validate `input`, then run the enabled collectors
    /// concurrently. Only an invalid domain is an error; collector failures
    /// show up as empty sections (or `whois_info.error`).
    pub async fn scan_domain(
        &self,
        input: &str,
        options: ScanOptions,
        cancel: &CancellationToken,
    ) -> Result<ScanResult, ScanError> {
        let target = Domain::parse(input)?;
        info!("Scanning domain: {}", target);

        let dns = async {
            if options.dns {
                self.dns.get_dns_records(&target).await
            } else {
                DnsRecords::empty(&target)
            }
        };
        let whois = async {
            if options.whois {
                self.whois.lookup(&target).await
            } else {
                WhoisInfo::empty(target.as_str())
            }
        };
        let subdomains = async {
            if options.subdomains {
                self.finder.discover(&target, cancel).await
            } else {
                Vec::new()
            }
        };

        let (dns_info, whois_info, subdomains) = tokio::join!(dns, whois, subdomains);
        let result = ScanResult::new(&target, dns_info, whois_info, subdomains);

        info!(
            target = %result.target_domain,
            subdomains = result.summary.total_subdomains,
            ips = result.summary.total_ip_addresses,
            "Scan finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let d = Domain::parse("example.com").unwrap();
        let mut dns = DnsRecords::empty(&d);
        dns.a_records = vec!["192.0.2.1".into()];
        let result = ScanResult::new(
            &d,
            dns,
            WhoisInfo::empty("example.com"),
            vec!["a.example.com".into(), "b.example.com".into()],
        );
        assert_eq!(result.summary, ScanSummary { total_subdomains: 2, total_ip_addresses: 1 });
        assert_eq!(result.target_domain, "example.com");
    }

    #[test]
    fn test_result_json_keys() {
        let d = Domain::parse("example.com").unwrap();
        let result = ScanResult::new(&d, DnsRecords::empty(&d), WhoisInfo::empty("example.com"), vec![]);
        let v = serde_json::to_value(&result).unwrap();
        for key in ["target_domain", "dns_info", "whois_info", "subdomains", "summary"] {
            assert!(v.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(v["summary"]["total_subdomains"], 0);
    }
}
