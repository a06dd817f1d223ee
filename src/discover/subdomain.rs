use std::collections::BTreeSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::crtsh::{CrtShFetcher, FetchOutcome};
use super::extract::{entries_from_json, extract};
use crate::config::ScanConfig;
use crate::domain::Domain;

/// Which form of the crt.sh query a URL was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryVariant {
    /// `%.domain`, matches certificates for any subdomain
    Wildcard,
    /// the bare domain
    Plain,
}

impl QueryVariant {
    pub const ALL: [QueryVariant; 2] = [QueryVariant::Wildcard, QueryVariant::Plain];

    pub fn label(&self) -> &'static str {
        match self {
            QueryVariant::Wildcard => "wildcard",
            QueryVariant::Plain => "plain",
        }
    }
}

/// Passive subdomain discovery over Certificate Transparency logs.
pub struct SubdomainFinder {
    fetcher: CrtShFetcher,
    base_url: String,
}

impl SubdomainFinder {
    pub fn new(config: &ScanConfig) -> Self {
        Self::with_fetcher(CrtShFetcher::new(config), config)
    }

    pub fn with_fetcher(fetcher: CrtShFetcher, config: &ScanConfig) -> Self {
        Self {
            fetcher,
            base_url: config.ct_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn query_url(&self, target: &Domain, variant: QueryVariant) -> String {
        let encoded = urlencoding::encode(target.as_str());
        match variant {
            QueryVariant::Wildcard => format!("{}/?q=%25.{}&output=json", self.base_url, encoded),
            QueryVariant::Plain => format!("{}/?q={}&output=json", self.base_url, encoded),
        }
    }

    /// Query every variant in turn and return the merged, sorted subdomains.
    ///
    /// Never fails: a variant that cannot be fetched contributes nothing.
    /// Once `cancel` fires, remaining variants are skipped.
    pub async fn discover(&self, target: &Domain, cancel: &CancellationToken) -> Vec<String> {
        info!("Querying CT logs for subdomains of {}", target);
        let mut found: BTreeSet<String> = BTreeSet::new();

        for variant in QueryVariant::ALL {
            if cancel.is_cancelled() {
                warn!("Subdomain discovery for {} cancelled; skipping {} query", target, variant.label());
                break;
            }

            let url = self.query_url(target, variant);
            match self.fetcher.fetch(&url, cancel).await {
                FetchOutcome::Success(value) => {
                    let entries = entries_from_json(&value);
                    let names = extract(target, &entries);
                    debug!(
                        "{} query returned {} entries, {} usable subdomains",
                        variant.label(),
                        entries.len(),
                        names.len()
                    );
                    found.extend(names);
                }
                FetchOutcome::RetryableFailure(reason) | FetchOutcome::FatalFailure(reason) => {
                    warn!("crt.sh {} query for {} gave no data: {}", variant.label(), target, reason);
                }
            }
        }

        info!("CT log discovery found {} subdomains for {}", found.len(), target);
        found.into_iter().collect()
    }

    /// Validate `input` first; an invalid domain yields an empty list.
    pub async fn discover_str(&self, input: &str, cancel: &CancellationToken) -> Vec<String> {
        match Domain::parse(input) {
            Ok(target) => self.discover(&target, cancel).await,
            Err(e) => {
                warn!("Skipping subdomain discovery: {}", e);
                Vec::new()
            }
        }
    }

    /// Generate subdomain report
    pub fn generate_report(target: &Domain, subdomains: &[String]) -> String {
        let mut report = String::new();

        report.push_str("=== Subdomain Enumeration Results ===\n\n");
        report.push_str(&format!("Target: {}\n", target));
        report.push_str(&format!("Total subdomains found: {}\n", subdomains.len()));

        if subdomains.is_empty() {
            report.push_str("\n[-] No subdomains found in CT logs\n");
            return report;
        }

        report.push_str(&format!("\n[crt.sh] - {} subdomains:\n", subdomains.len()));
        for sub in subdomains {
            report.push_str(&format!("  - {}\n", sub));
        }

        let api_subdomains: Vec<_> = subdomains
            .iter()
            .filter(|s| is_api_related(s))
            .collect();

        if !api_subdomains.is_empty() {
            report.push_str(&format!("\n[!] API-related subdomains ({}):\n", api_subdomains.len()));
            for sub in api_subdomains {
                report.push_str(&format!("  [+] {}\n", sub));
            }
        }

        report
    }
}

fn is_api_related(host: &str) -> bool {
    ["api", "rest", "graphql", "gateway"]
        .iter()
        .any(|kw| host.contains(kw))
}
