use thiserror::Error;

/// Errors surfaced by the scan entry points.
///
/// Collector failures (DNS, WHOIS, CT aggregator) are normally absorbed where
/// they happen; only `InvalidDomain` is expected to reach a caller of
/// [`crate::scan::Scanner::scan_domain`].
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid domain: {0:?}")]
    InvalidDomain(String),

    #[error("WHOIS error: {0}")]
    Whois(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;
