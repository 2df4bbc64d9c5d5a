//! Utility functions for domain processing and validation.

use crate::error::DomainIntelError;
use regex::Regex;

lazy_static::lazy_static! {
    // label(.label)+ with an alphabetic final label of at least two characters
    static ref DOMAIN_PATTERN: Regex =
        Regex::new(r"^[a-z0-9-]+(\.[a-z0-9-]+)*\.[a-z]{2,}$").expect("domain pattern compiles");
}

/// Trim and lower-case a domain exactly as every lookup does.
pub fn normalize_domain(domain: &str) -> String {
    domain.trim().to_lowercase()
}

/// Validate a domain name before any network call.
///
/// Accepts `label(.label)+` where the final label is alphabetic and at
/// least two characters long. Labels must be 1-63 characters, must not start
/// or end with a hyphen, and the whole name must fit in 253 characters.
///
/// # Returns
///
/// The normalized (trimmed, lower-cased) domain on success.
pub fn validate_domain(domain: &str) -> Result<String, DomainIntelError> {
    let normalized = normalize_domain(domain);

    if normalized.is_empty() {
        return Err(DomainIntelError::invalid_domain(
            domain,
            "Domain name cannot be empty",
        ));
    }

    if normalized.len() > 253 {
        return Err(DomainIntelError::invalid_domain(
            domain,
            "Domain name longer than 253 characters",
        ));
    }

    if !DOMAIN_PATTERN.is_match(&normalized) {
        return Err(DomainIntelError::invalid_domain(
            domain,
            "Expected labels separated by dots ending in an alphabetic TLD",
        ));
    }

    for label in normalized.split('.') {
        if label.len() > 63 {
            return Err(DomainIntelError::invalid_domain(
                domain,
                format!("Label '{}' exceeds 63 characters", label),
            ));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(DomainIntelError::invalid_domain(
                domain,
                format!("Label '{}' starts or ends with a hyphen", label),
            ));
        }
    }

    Ok(normalized)
}

/// Extract the final label of a domain (`"www.example.co.uk"` -> `"uk"`).
pub fn extract_tld(domain: &str) -> Option<&str> {
    domain
        .trim_end_matches('.')
        .rsplit('.')
        .next()
        .filter(|tld| !tld.is_empty() && *tld != domain)
}

/// Lower-case a hostname and drop its trailing root dot.
pub(crate) fn normalize_hostname(host: &str) -> String {
    host.trim().trim_end_matches('.').to_lowercase()
}
