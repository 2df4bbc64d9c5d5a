//! Heuristic risk scoring.
//!
//! Rules are evaluated in a fixed order and each adds independently to the
//! score: registration age, registrant jurisdiction, registrar reputation.
//! Privacy protection is detected but never scored.
//!
//! Lists and weights are uncalibrated heuristics, so they live in
//! [`RiskPolicy`] and can be replaced from configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DomainRecord, RiskAssessment, RiskLevel};

const PRIVACY_MARKERS: [&str; 4] = ["privacy", "proxy", "protected", "redacted"];

/// Points added by each rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub very_new: u32,
    pub relatively_new: u32,
    pub missing_creation_date: u32,
    pub high_risk_country: u32,
    pub disposable_registrar: u32,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            very_new: 40,
            relatively_new: 20,
            missing_creation_date: 10,
            high_risk_country: 30,
            disposable_registrar: 10,
        }
    }
}

/// Scoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskPolicy {
    /// Country codes that add the jurisdiction weight (case-insensitive)
    pub high_risk_countries: Vec<String>,

    /// Registrar name fragments that add the registrar weight
    pub disposable_registrars: Vec<String>,

    pub weights: RiskWeights,

    /// Domains younger than this many days are "very new"
    pub very_new_days: i64,

    /// Domains younger than this many days are "relatively new"
    pub relatively_new_days: i64,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            high_risk_countries: ["RU", "CN", "KP", "IR"].map(String::from).to_vec(),
            disposable_registrars: ["Namecheap", "Freenom", "PublicDomainRegistry"]
                .map(String::from)
                .to_vec(),
            weights: RiskWeights::default(),
            very_new_days: 30,
            relatively_new_days: 180,
        }
    }
}

impl RiskPolicy {
    /// Score `record` as of `now`.
    ///
    /// Pure: the same record and `now` always give the same assessment.
    pub fn assess(&self, record: &DomainRecord, now: DateTime<Utc>) -> RiskAssessment {
        let mut score = 0u32;
        let mut factors = Vec::new();

        match record.created_date {
            None => {
                score = score.saturating_add(self.weights.missing_creation_date);
                factors.push("registration date not clearly found".to_string());
            }
            Some(created) => {
                let age_days = (now - created).num_days();
                if age_days < self.very_new_days {
                    score = score.saturating_add(self.weights.very_new);
                    factors.push(format!(
                        "domain is very new (less than {} days)",
                        self.very_new_days
                    ));
                } else if age_days < self.relatively_new_days {
                    score = score.saturating_add(self.weights.relatively_new);
                    factors.push(format!(
                        "domain is relatively new (less than {} months)",
                        self.relatively_new_days / 30
                    ));
                }
            }
        }

        if let Some(country) = record.registrant_country.as_deref() {
            if self
                .high_risk_countries
                .iter()
                .any(|c| c.eq_ignore_ascii_case(country.trim()))
            {
                score = score.saturating_add(self.weights.high_risk_country);
                factors.push(format!(
                    "high-risk jurisdiction detected: {}",
                    country.trim().to_uppercase()
                ));
            }
        }

        if let Some(registrar) = record.registrar_name.as_deref() {
            let lowered = registrar.to_lowercase();
            if self
                .disposable_registrars
                .iter()
                .any(|r| !r.trim().is_empty() && lowered.contains(&r.trim().to_lowercase()))
            {
                score = score.saturating_add(self.weights.disposable_registrar);
                factors.push(format!(
                    "registrar ({}) is frequently used for low-cost/disposable domains",
                    registrar
                ));
            }
        }

        RiskAssessment {
            score,
            level: RiskLevel::from_score(score),
            factors,
            is_active: is_active(record),
            privacy_protected: is_privacy_protected(record),
        }
    }

    /// Score `record` against the current time.
    pub fn score(&self, record: &DomainRecord) -> RiskAssessment {
        self.assess(record, Utc::now())
    }
}

/// At least one nameserver and no status token mentioning "inactive".
pub fn is_active(record: &DomainRecord) -> bool {
    !record.name_servers.is_empty()
        && !record
            .status
            .iter()
            .any(|s| s.to_lowercase().contains("inactive"))
}

/// Whether registrant data looks masked by a privacy or proxy service.
pub fn is_privacy_protected(record: &DomainRecord) -> bool {
    if record.privacy_masked {
        return true;
    }
    [&record.registrant_name, &record.registrant_organization]
        .into_iter()
        .flatten()
        .map(|value| value.to_lowercase())
        .any(|value| PRIVACY_MARKERS.iter().any(|m| value.contains(m)))
}
