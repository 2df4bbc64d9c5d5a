//! Lookup history seam.
//!
//! The library only announces successful lookups; persisting them is up to
//! whoever implements [`HistorySink`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DomainIntelError;
use crate::types::{LookupOutcome, RiskLevel};

const UNKNOWN: &str = "Unknown";

/// One successful lookup, keyed by the user who asked for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub user_id: String,
    pub domain: String,
    pub registrar: String,
    pub country: String,
    pub risk_level: RiskLevel,
}

impl HistoryEntry {
    /// Summarize `outcome` for `user_id`; absent registrar or country become `"Unknown"`.
    pub fn from_outcome<U: Into<String>>(user_id: U, outcome: &LookupOutcome) -> Self {
        Self {
            user_id: user_id.into(),
            domain: outcome.raw.domain_name.clone(),
            registrar: outcome
                .raw
                .registrar_name
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            country: outcome
                .raw
                .registrant_country
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            risk_level: outcome.analysis.level,
        }
    }
}

/// Destination for history entries.
#[async_trait]
pub trait HistorySink: Send + Sync {
    async fn append(&self, entry: HistoryEntry) -> Result<(), DomainIntelError>;
}

/// Sink that discards every entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHistory;

#[async_trait]
impl HistorySink for NoopHistory {
    async fn append(&self, _entry: HistoryEntry) -> Result<(), DomainIntelError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DomainRecord, RiskAssessment, SourceTag};

    fn outcome() -> LookupOutcome {
        let mut raw = DomainRecord::new("example.com", SourceTag::DnsFallback);
        raw.registrant_country = Some("DE".to_string());
        LookupOutcome {
            raw,
            analysis: RiskAssessment {
                score: 10,
                level: RiskLevel::Low,
                factors: vec!["registration date not clearly found".to_string()],
                is_active: true,
                privacy_protected: false,
            },
            source: SourceTag::DnsFallback,
            api_auth_error: false,
        }
    }

    #[test]
    fn test_entry_from_outcome() {
        let entry = HistoryEntry::from_outcome("user-42", &outcome());
        assert_eq!(entry.user_id, "user-42");
        assert_eq!(entry.domain, "example.com");
        assert_eq!(entry.registrar, "Unknown");
        assert_eq!(entry.country, "DE");
        assert_eq!(entry.risk_level, RiskLevel::Low);
    }

    #[tokio::test]
    async fn test_noop_history_accepts_entries() {
        let entry = HistoryEntry::from_outcome("user", &outcome());
        assert!(NoopHistory.append(entry).await.is_ok());
    }
}
