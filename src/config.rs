use std::time::Duration;
use tracing::warn;

pub const DEFAULT_USER_AGENT: &str = "NetScout OSINT Scanner 1.0";
pub const DEFAULT_CT_URL: &str = "https://crt.sh";
pub const MAX_HTTP_RETRIES: u32 = 10;

/// Runtime settings shared by the collectors.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Per-request timeout against the CT aggregator
    pub http_timeout: Duration,
    /// Attempts per CT query variant (1..=10)
    pub http_retries: u32,
    pub user_agent: String,
    pub dns_timeout: Duration,
    pub dns_retries: usize,
    pub whois_timeout: Duration,
    /// Aggregator base URL, without trailing slash
    pub ct_base_url: String,
    /// First backoff delay; doubled on every further attempt
    pub backoff_base: Duration,
    /// Upper bound for a single backoff delay
    pub backoff_cap: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(10),
            http_retries: 3,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            dns_timeout: Duration::from_secs(5),
            dns_retries: 3,
            whois_timeout: Duration::from_secs(10),
            ct_base_url: DEFAULT_CT_URL.to_string(),
            backoff_base: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(8),
        }
    }
}

impl ScanConfig {
    /// Defaults overlaid with `NETSCOUT_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Unparseable values are
    /// logged and skipped.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("NETSCOUT_HTTP_TIMEOUT") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.http_timeout = Duration::from_secs(secs),
                _ => warn!("Ignoring invalid NETSCOUT_HTTP_TIMEOUT value {:?}", raw),
            }
        }
        if let Some(raw) = lookup("NETSCOUT_HTTP_RETRIES") {
            match raw.trim().parse::<u32>() {
                Ok(n) => self = self.retries(n),
                Err(_) => warn!("Ignoring invalid NETSCOUT_HTTP_RETRIES value {:?}", raw),
            }
        }
        if let Some(ua) = lookup("NETSCOUT_USER_AGENT") {
            if !ua.trim().is_empty() {
                self.user_agent = ua.trim().to_string();
            }
        }
        if let Some(url) = lookup("NETSCOUT_CT_URL") {
            if !url.trim().is_empty() {
                self = self.ct_base_url(&url);
            }
        }
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.http_timeout = Duration::from_secs(secs.max(1));
        self
    }

    /// Set the attempt count, clamped to `1..=MAX_HTTP_RETRIES`.
    pub fn retries(mut self, n: u32) -> Self {
        self.http_retries = n.clamp(1, MAX_HTTP_RETRIES);
        self
    }

    pub fn ct_base_url(mut self, url: &str) -> Self {
        self.ct_base_url = url.trim().trim_end_matches('/').to_string();
        self
    }

    pub fn backoff(mut self, base: Duration, cap: Duration) -> Self {
        self.backoff_base = base;
        self.backoff_cap = cap;
        self
    }

    /// Sleep before the attempt following `attempt` (1-based):
    /// `min(base * 2^(attempt-1), cap)`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        self.backoff_base
            .checked_mul(1u32 << exp)
            .unwrap_or(self.backoff_cap)
            .min(self.backoff_cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let cfg = ScanConfig::default();
        assert_eq!(cfg.http_timeout, Duration::from_secs(10));
        assert_eq!(cfg.http_retries, 3);
        assert_eq!(cfg.user_agent, "NetScout OSINT Scanner 1.0");
        assert_eq!(cfg.ct_base_url, "https://crt.sh");
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let cfg = ScanConfig::default();
        assert_eq!(cfg.backoff_delay(1), Duration::from_secs(1));
        assert_eq!(cfg.backoff_delay(2), Duration::from_secs(2));
        assert_eq!(cfg.backoff_delay(3), Duration::from_secs(4));
        assert_eq!(cfg.backoff_delay(4), Duration::from_secs(8));
        assert_eq!(cfg.backoff_delay(5), Duration::from_secs(8));
        assert_eq!(cfg.backoff_delay(200), Duration::from_secs(8));
    }

    #[test]
    fn test_retries_clamped() {
        assert_eq!(ScanConfig::default().retries(0).http_retries, 1);
        assert_eq!(ScanConfig::default().retries(50).http_retries, 10);
        assert_eq!(ScanConfig::default().retries(5).http_retries, 5);
    }

    #[test]
    fn test_overrides_applied_and_invalid_skipped() {
        let env: HashMap<&str, &str> = [
            ("NETSCOUT_HTTP_TIMEOUT", "30"),
            ("NETSCOUT_HTTP_RETRIES", "not-a-number"),
            ("NETSCOUT_CT_URL", "http://127.0.0.1:8080/"),
        ]
        .into_iter()
        .collect();

        let cfg = ScanConfig::default().with_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.http_timeout, Duration::from_secs(30));
        assert_eq!(cfg.http_retries, 3);
        assert_eq!(cfg.ct_base_url, "http://127.0.0.1:8080");
        assert_eq!(cfg.user_agent, DEFAULT_USER_AGENT);
    }
}
