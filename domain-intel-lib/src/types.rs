//! Core data types for domain lookups.
//!
//! This module defines the canonical record every source is normalized into,
//! the risk assessment derived from it, the raw per-source results, and the
//! lookup configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::time::Duration;

use crate::protocols::registry::{default_rdap_endpoints, RdapEndpoint};
use crate::risk::RiskPolicy;

/// Registrar placeholder used when only DNS evidence exists.
pub const DNS_UNKNOWN_REGISTRAR: &str = "Unknown (WHOIS Unavailable)";

/// Status token used when only DNS evidence exists.
pub const DNS_VERIFIED_STATUS: &str = "Active (DNS Verified)";

/// Default endpoint of the WhoisXML API.
pub const DEFAULT_WHOIS_API_URL: &str = "https://www.whoisxmlapi.com/whoisserver/WhoisService";

/// Which upstream source produced a record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SourceTag {
    /// Commercial WHOIS API
    #[serde(rename = "WhoisXML")]
    WhoisXml,

    /// Registration Data Access Protocol
    #[serde(rename = "RDAP")]
    Rdap,

    /// Existence-only evidence from DNS
    #[serde(rename = "DNS Fallback")]
    DnsFallback,
}

/// Normalized registration record, independent of the source it came from.
///
/// Absent fields stay `None`: the risk scorer branches on absence, so an
/// empty string is never used as a stand-in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    /// Always populated; falls back to the queried name
    pub domain_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrar_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrar_iana_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrar_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrar_abuse_email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_date: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<DateTime<Utc>>,

    /// Free-text status tokens in source order
    pub status: Vec<String>,

    /// Lower-cased hostnames without trailing dot
    pub name_servers: BTreeSet<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrant_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrant_organization: Option<String>,

    /// ISO-3166 alpha-2 when the source provides it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrant_country: Option<String>,

    /// The source flagged the record as privacy-masked
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub privacy_masked: bool,

    /// Source-native dump kept for display
    pub raw_text: String,

    pub source: SourceTag,
}

impl DomainRecord {
    /// Empty record for `domain` from `source`.
    pub fn new<D: Into<String>>(domain: D, source: SourceTag) -> Self {
        Self {
            domain_name: domain.into(),
            registrar_name: None,
            registrar_iana_id: None,
            registrar_url: None,
            registrar_abuse_email: None,
            created_date: None,
            expires_date: None,
            updated_date: None,
            status: Vec::new(),
            name_servers: BTreeSet::new(),
            registrant_name: None,
            registrant_organization: None,
            registrant_country: None,
            privacy_masked: false,
            raw_text: String::new(),
            source,
        }
    }

    /// Status tokens joined into one line for display.
    pub fn status_display(&self) -> String {
        self.status.join(" ")
    }
}

/// Qualitative risk bucket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Bucket a score: High at 60 and above, Medium at 30 and above.
    pub fn from_score(score: u32) -> Self {
        if score >= 60 {
            RiskLevel::High
        } else if score >= 30 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Heuristic risk derived from a [`DomainRecord`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub score: u32,
    pub level: RiskLevel,
    /// Explanations in evaluation order
    pub factors: Vec<String>,
    pub is_active: bool,
    /// Tracked for observability only, never scored
    pub privacy_protected: bool,
}

/// Successful lookup as returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupOutcome {
    pub raw: DomainRecord,
    pub analysis: RiskAssessment,
    pub source: SourceTag,

    /// The commercial source rejected the API key; operator-facing advisory
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub api_auth_error: bool,
}

/// Source-specific result before normalization.
#[derive(Debug, Clone)]
pub enum RawSourceResult {
    /// WhoisXML API response; `masked` marks a weak result
    WhoisXml {
        payload: serde_json::Value,
        masked: bool,
    },

    /// RDAP domain object and the endpoint that served it
    Rdap {
        payload: serde_json::Value,
        endpoint: String,
    },

    /// DNS existence evidence
    Dns {
        addresses: Vec<IpAddr>,
        name_servers: Vec<String>,
    },
}

impl RawSourceResult {
    /// Tag of the source that produced this result.
    pub fn tag(&self) -> SourceTag {
        match self {
            RawSourceResult::WhoisXml { .. } => SourceTag::WhoisXml,
            RawSourceResult::Rdap { .. } => SourceTag::Rdap,
            RawSourceResult::Dns { .. } => SourceTag::DnsFallback,
        }
    }

    /// Weak results are kept only as a fallback while better sources are tried.
    pub fn is_weak(&self) -> bool {
        matches!(self, RawSourceResult::WhoisXml { masked: true, .. })
    }
}

/// Pause between failed RDAP endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    /// Fixed delay after each failure
    pub delay: Duration,
    /// Upper bound of the random extra delay
    pub jitter: Duration,
}

impl BackoffPolicy {
    /// No pause at all; used by tests.
    pub fn none() -> Self {
        Self {
            delay: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(500),
            jitter: Duration::from_millis(250),
        }
    }
}

/// Configuration for a [`crate::DomainIntel`] instance.
///
/// Built once at startup and shared read-only by every lookup.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// WhoisXML API key; absent or placeholder skips the commercial source
    pub whois_api_key: Option<String>,

    /// WhoisXML service URL
    pub whois_api_url: String,

    /// Timeout for the WhoisXML request
    /// Default: 20 seconds
    pub whois_timeout: Duration,

    /// Timeout for each RDAP endpoint
    /// Default: 15 seconds
    pub rdap_timeout: Duration,

    /// RDAP endpoints in priority order
    pub rdap_endpoints: Vec<RdapEndpoint>,

    /// Pause between failed RDAP endpoints
    pub rdap_backoff: BackoffPolicy,

    /// Timeout for each DNS query
    /// Default: 15 seconds
    pub dns_timeout: Duration,

    /// Bound on the whole source cascade for one domain
    /// Default: 150 seconds
    pub lookup_timeout: Duration,

    /// Maximum number of concurrent lookups in `lookup_many`
    /// Default: 5, Range: 1-50
    pub concurrency: usize,

    /// Scoring lists and weights
    pub risk_policy: RiskPolicy,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            whois_api_key: None,
            whois_api_url: DEFAULT_WHOIS_API_URL.to_string(),
            whois_timeout: Duration::from_secs(20),
            rdap_timeout: Duration::from_secs(15),
            rdap_endpoints: default_rdap_endpoints(),
            rdap_backoff: BackoffPolicy::default(),
            dns_timeout: Duration::from_secs(15),
            lookup_timeout: Duration::from_secs(150),
            concurrency: 5,
            risk_policy: RiskPolicy::default(),
        }
    }
}

impl LookupConfig {
    /// Set the WhoisXML API key.
    pub fn with_api_key<K: Into<String>>(mut self, key: K) -> Self {
        self.whois_api_key = Some(key.into());
        self
    }

    /// Point the WhoisXML adapter at another URL.
    pub fn with_whois_api_url<U: Into<String>>(mut self, url: U) -> Self {
        self.whois_api_url = url.into();
        self
    }

    /// Replace the RDAP endpoint table.
    pub fn with_rdap_endpoints(mut self, endpoints: Vec<RdapEndpoint>) -> Self {
        self.rdap_endpoints = endpoints;
        self
    }

    /// Set the pause between failed RDAP endpoints.
    pub fn with_rdap_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.rdap_backoff = backoff;
        self
    }

    /// Set the bound on the whole cascade.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Set concurrency, capped to 1-50.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, 50);
        self
    }

    /// Replace the scoring policy.
    pub fn with_risk_policy(mut self, policy: RiskPolicy) -> Self {
        self.risk_policy = policy;
        self
    }

    /// The API key, if it looks like a real one.
    ///
    /// Keys of ten characters or fewer and template values such as
    /// `your_api_key_here` are treated as not configured.
    pub fn usable_api_key(&self) -> Option<&str> {
        let key = self.whois_api_key.as_deref()?.trim();
        let lower = key.to_lowercase();
        if key.len() <= 10
            || lower.starts_with("your")
            || lower.contains("placeholder")
            || lower.contains("changeme")
            || lower.contains("xxxx")
        {
            return None;
        }
        Some(key)
    }
}

impl std::fmt::Display for SourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceTag::WhoisXml => write!(f, "WhoisXML"),
            SourceTag::Rdap => write!(f, "RDAP"),
            SourceTag::DnsFallback => write!(f, "DNS Fallback"),
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_boundaries() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(29), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(30), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(59), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(60), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(80), RiskLevel::High);
    }

    #[test]
    fn test_usable_api_key() {
        assert_eq!(LookupConfig::default().usable_api_key(), None);
        assert_eq!(
            LookupConfig::default().with_api_key("short").usable_api_key(),
            None
        );
        assert_eq!(
            LookupConfig::default()
                .with_api_key("your_whois_api_key")
                .usable_api_key(),
            None
        );
        assert_eq!(
            LookupConfig::default()
                .with_api_key("  at_9f8e7d6c5b4a3  ")
                .usable_api_key(),
            Some("at_9f8e7d6c5b4a3")
        );
    }

    #[test]
    fn test_record_serialization_skips_absent_fields() {
        let mut record = DomainRecord::new("example.com", SourceTag::Rdap);
        record.status = vec!["active".to_string(), "client hold".to_string()];

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["domainName"], "example.com");
        assert_eq!(json["source"], "RDAP");
        assert!(json.get("registrarName").is_none());
        assert!(json.get("privacyMasked").is_none());
        assert_eq!(record.status_display(), "active client hold");
    }

    #[test]
    fn test_weak_result() {
        let masked = RawSourceResult::WhoisXml {
            payload: serde_json::json!({}),
            masked: true,
        };
        assert!(masked.is_weak());
        assert_eq!(masked.tag(), SourceTag::WhoisXml);

        let dns = RawSourceResult::Dns {
            addresses: vec![],
            name_servers: vec!["ns1.example.com".to_string()],
        };
        assert!(!dns.is_weak());
        assert_eq!(dns.tag(), SourceTag::DnsFallback);
    }
}
