pub mod config;
pub mod discover;
pub mod dns;
pub mod domain;
pub mod error;
pub mod output;
pub mod scan;
pub mod whois;

pub use crate::config::ScanConfig;
pub use crate::discover::{FetchOutcome, SubdomainFinder};
pub use crate::domain::{is_valid_domain, normalize, Domain};
pub use crate::error::ScanError;
pub use crate::scan::{ScanOptions, ScanResult, ScanSummary, Scanner};
