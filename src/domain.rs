//! Domain canonicalization and syntax checks.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

use crate::error::ScanError;

pub const MAX_DOMAIN_LEN: usize = 253;

static DOMAIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z0-9]([a-z0-9\-]{0,61}[a-z0-9])?\.)+[a-z]{2,}$").unwrap()
});

/// Strip scheme, leading `www.`, path and port; lowercase and trim.
///
/// Applied to a fixpoint, so `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(input: &str) -> String {
    let mut current = normalize_once(input);
    loop {
        let next = normalize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_once(input: &str) -> String {
    let mut s = input.trim().to_lowercase();

    for scheme in ["https://", "http://"] {
        if let Some(rest) = s.strip_prefix(scheme) {
            s = rest.to_string();
            break;
        }
    }
    if let Some(rest) = s.strip_prefix("www.") {
        s = rest.to_string();
    }
    if let Some(idx) = s.find('/') {
        s.truncate(idx);
    }
    if let Some(idx) = s.find(':') {
        s.truncate(idx);
    }

    s.trim().to_string()
}

pub fn is_valid_domain(input: &str) -> bool {
    is_valid_hostname(&normalize(input))
}

/// Syntax check on `name` exactly as given, with no normalization. Scheme,
/// port, path or uppercase characters make it invalid.
pub fn is_valid_hostname(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_DOMAIN_LEN {
        return false;
    }
    if name.contains("..") {
        return false;
    }
    DOMAIN_PATTERN.is_match(name)
}

/// A normalized, syntactically valid domain name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    pub fn parse(input: &str) -> Result<Self, ScanError> {
        let normalized = normalize(input);
        if !is_valid_domain(&normalized) {
            return Err(ScanError::InvalidDomain(input.trim().to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `"." + domain`, the suffix every subdomain must end with.
    pub fn subdomain_suffix(&self) -> String {
        format!(".{}", self.0)
    }

    pub fn is_strict_subdomain(&self, host: &str) -> bool {
        host != self.0 && host.ends_with(&self.subdomain_suffix())
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_decorations() {
        assert_eq!(normalize("https://www.Example.com/path?q=1"), "example.com");
        assert_eq!(normalize("http://example.com:8080"), "example.com");
        assert_eq!(normalize("  EXAMPLE.com  "), "example.com");
        assert_eq!(normalize("www.example.com"), "example.com");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_idempotent() {
        let inputs = [
            "",
            "   ",
            "example.com",
            " https://www.example.com/a/b",
            "www.www.example.com",
            "https:// www.example.com",
            "HTTP://EXAMPLE.COM:443/",
            "https://https://example.com",
            "foo bar.example.com",
            ":::",
            "///",
            "www.",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_is_valid_domain() {
        assert!(is_valid_domain("example.com"));
        assert!(is_valid_domain("api.example.co.uk"));
        assert!(is_valid_domain("https://www.example.com/login"));
        assert!(is_valid_domain("my-host.example.com"));

        assert!(!is_valid_domain(""));
        assert!(!is_valid_domain("a..b.com"));
        assert!(!is_valid_domain("localhost"));
        assert!(!is_valid_domain("-bad.example.com"));
        assert!(!is_valid_domain("bad-.example.com"));
        assert!(!is_valid_domain("example.c"));
        assert!(!is_valid_domain("foo bar.example.com"));
        assert!(!is_valid_domain("admin@example.com"));
    }

    #[test]
    fn test_is_valid_hostname_does_not_normalize() {
        assert!(is_valid_hostname("www.example.com"));
        assert!(!is_valid_hostname("https://api.example.com"));
        assert!(!is_valid_hostname("api.example.com:443"));
        assert!(!is_valid_hostname("api.example.com/path"));
        assert!(!is_valid_hostname("API.example.com"));
        assert!(is_valid_domain("https://api.example.com"));
    }

    #[test]
    fn test_length_limit() {
        let label = "a".repeat(60);
        let long = format!("{0}.{0}.{0}.{0}.{0}.com", label);
        assert!(long.len() > MAX_DOMAIN_LEN);
        assert!(!is_valid_domain(&long));
    }

    #[test]
    fn test_domain_parse() {
        let d = Domain::parse("https://www.Example.com/").unwrap();
        assert_eq!(d.as_str(), "example.com");
        assert_eq!(d.subdomain_suffix(), ".example.com");
        assert!(d.is_strict_subdomain("api.example.com"));
        assert!(!d.is_strict_subdomain("example.com"));
        assert!(!d.is_strict_subdomain("notexample.com"));

        assert!(matches!(Domain::parse("not a domain"), Err(ScanError::InvalidDomain(_))));
    }
}
