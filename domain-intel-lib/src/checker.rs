//! Resolution orchestrator.
//!
//! This module provides [`DomainIntel`], which walks the source cascade for a
//! domain and turns the first usable answer into a [`LookupOutcome`]:
//!
//! 1. WhoisXML API, when a usable key is configured. A privacy-masked record
//!    is held as a weak result while better sources are tried.
//! 2. RDAP, probing the endpoint table in order.
//! 3. The held weak WhoisXML result, if any.
//! 4. DNS existence evidence.
//!
//! Adapter failures never end a lookup early; only exhaustion does.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::DomainIntelError;
use crate::history::{HistoryEntry, HistorySink, NoopHistory};
use crate::normalize::normalize;
use crate::protocols::{DnsProbe, RdapClient, SourceAdapter, WhoisApiClient};
use crate::types::{LookupConfig, LookupOutcome, RawSourceResult};
use crate::utils::validate_domain;

/// Main entry point for domain registration lookups.
///
/// Clients are built once and shared by every lookup; a `DomainIntel` can be
/// wrapped in an `Arc` and used from many tasks.
///
/// # Example
///
/// ```rust,no_run
/// use domain_intel_lib::{DomainIntel, LookupConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let intel = DomainIntel::with_config(LookupConfig::default())?;
///     let outcome = intel.lookup("example.com").await?;
///     println!("{} via {}: {}", outcome.raw.domain_name, outcome.source, outcome.analysis.level);
///     Ok(())
/// }
/// ```
pub struct DomainIntel {
    /// Configuration settings for this instance
    config: LookupConfig,
    /// Commercial WHOIS source, present only with a usable API key
    whois: Option<Arc<dyn SourceAdapter>>,
    rdap: Arc<dyn SourceAdapter>,
    dns: Arc<dyn SourceAdapter>,
    /// Receives an entry after each recorded lookup
    history: Arc<dyn HistorySink>,
}

/// What the cascade has learned from failed or weak sources so far.
#[derive(Default)]
struct CascadeState {
    weak: Option<RawSourceResult>,
    api_auth_error: bool,
    rate_limited: Option<DomainIntelError>,
}

impl CascadeState {
    /// Remember a source failure, or hand it back when it should abort the lookup.
    fn record_failure(
        &mut self,
        adapter: &dyn SourceAdapter,
        domain: &str,
        error: DomainIntelError,
    ) -> Result<(), DomainIntelError> {
        if !error.is_fallthrough() {
            warn!(source = adapter.name(), domain, error = %error, "aborting lookup");
            return Err(error);
        }
        match error {
            DomainIntelError::AuthInvalid { .. } => {
                self.api_auth_error = true;
            }
            DomainIntelError::RateLimited { .. } => {
                warn!(source = adapter.name(), domain, error = %error, "source is rate limiting");
                self.rate_limited = Some(error);
            }
            other => {
                warn!(source = adapter.name(), domain, error = %other, "source failed");
            }
        }
        Ok(())
    }
}

impl DomainIntel {
    /// Build every source client from `config`.
    ///
    /// The WhoisXML adapter is only created when the configured key looks
    /// real (see [`LookupConfig::usable_api_key`]).
    ///
    /// # Errors
    ///
    /// Returns `DomainIntelError::Internal` if an HTTP client or the system
    /// resolver cannot be created.
    pub fn with_config(config: LookupConfig) -> Result<Self, DomainIntelError> {
        let whois = match config.usable_api_key() {
            Some(key) => {
                let client =
                    WhoisApiClient::new(config.whois_api_url.clone(), key, config.whois_timeout)?;
                Some(Arc::new(client) as Arc<dyn SourceAdapter>)
            }
            None => {
                debug!("no usable WhoisXML API key configured");
                None
            }
        };

        let rdap = RdapClient::with_config(
            config.rdap_endpoints.clone(),
            config.rdap_timeout,
            config.rdap_backoff,
        )?;
        let dns = DnsProbe::system(config.dns_timeout)?;

        Ok(Self::from_adapters(config, whois, Arc::new(rdap), Arc::new(dns)))
    }

    /// Assemble an orchestrator from ready-made adapters.
    ///
    /// Only the scoring policy, lookup timeout and concurrency of `config`
    /// are used; the adapters carry their own settings.
    pub fn from_adapters(
        config: LookupConfig,
        whois: Option<Arc<dyn SourceAdapter>>,
        rdap: Arc<dyn SourceAdapter>,
        dns: Arc<dyn SourceAdapter>,
    ) -> Self {
        Self {
            config,
            whois,
            rdap,
            dns,
            history: Arc::new(NoopHistory),
        }
    }

    /// Send recorded lookups to `history`.
    pub fn with_history(mut self, history: Arc<dyn HistorySink>) -> Self {
        self.history = history;
        self
    }

    /// Look up one domain.
    ///
    /// # Errors
    ///
    /// - `InvalidDomain` before any network call
    /// - `NotFound` when every source is exhausted
    /// - `RateLimited` when exhausted and a source answered HTTP 429
    /// - `Timeout` when the whole cascade exceeds `lookup_timeout`
    pub async fn lookup(&self, domain: &str) -> Result<LookupOutcome, DomainIntelError> {
        let domain = validate_domain(domain)?;

        match tokio::time::timeout(self.config.lookup_timeout, self.resolve(&domain)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(domain = %domain, timeout = ?self.config.lookup_timeout, "lookup timed out");
                Err(DomainIntelError::timeout(
                    format!("lookup of {}", domain),
                    self.config.lookup_timeout,
                ))
            }
        }
    }

    /// Look up several domains with bounded concurrency.
    ///
    /// Failures are reported per domain; results keep the input order.
    pub async fn lookup_many(
        &self,
        domains: &[String],
    ) -> Vec<(String, Result<LookupOutcome, DomainIntelError>)> {
        let mut results: Vec<_> = stream::iter(domains.iter().enumerate())
            .map(|(index, domain)| async move {
                let result = self.lookup(domain).await;
                (index, domain.clone(), result)
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        results.sort_by_key(|(index, _, _)| *index);
        results
            .into_iter()
            .map(|(_, domain, result)| (domain, result))
            .collect()
    }

    /// Look up `domain` and append the result to the history sink.
    ///
    /// A failing sink is logged and does not fail the lookup.
    pub async fn lookup_and_record(
        &self,
        domain: &str,
        user_id: &str,
    ) -> Result<LookupOutcome, DomainIntelError> {
        let outcome = self.lookup(domain).await?;

        if let Err(e) = self
            .history
            .append(HistoryEntry::from_outcome(user_id, &outcome))
            .await
        {
            warn!(domain = %outcome.raw.domain_name, error = %e, "failed to record lookup history");
        }

        Ok(outcome)
    }

    /// Get the current configuration.
    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// Whether the commercial WHOIS source takes part in lookups.
    pub fn has_whois_api(&self) -> bool {
        self.whois.is_some()
    }

    async fn resolve(&self, domain: &str) -> Result<LookupOutcome, DomainIntelError> {
        let mut state = CascadeState::default();

        if let Some(whois) = &self.whois {
            match whois.fetch(domain).await {
                Ok(raw) if raw.is_weak() => {
                    info!(domain, "WhoisXML data is masked, trying RDAP");
                    state.weak = Some(raw);
                }
                Ok(raw) => return Ok(self.finish(domain, raw, false)),
                Err(e) => state.record_failure(whois.as_ref(), domain, e)?,
            }
        }

        match self.rdap.fetch(domain).await {
            Ok(raw) => return Ok(self.finish(domain, raw, state.api_auth_error)),
            Err(e) => state.record_failure(self.rdap.as_ref(), domain, e)?,
        }

        // Masked registration data still outranks bare DNS evidence.
        if let Some(raw) = state.weak.take() {
            return Ok(self.finish(domain, raw, state.api_auth_error));
        }

        match self.dns.fetch(domain).await {
            Ok(raw) => return Ok(self.finish(domain, raw, state.api_auth_error)),
            Err(e) => state.record_failure(self.dns.as_ref(), domain, e)?,
        }

        Err(state
            .rate_limited
            .unwrap_or_else(|| DomainIntelError::not_found(domain)))
    }

    fn finish(&self, domain: &str, raw: RawSourceResult, api_auth_error: bool) -> LookupOutcome {
        let source = raw.tag();
        let record = normalize(&raw, domain);
        let analysis = self.config.risk_policy.assess(&record, Utc::now());

        info!(
            domain,
            source = %source,
            score = analysis.score,
            level = %analysis.level,
            "lookup resolved"
        );

        LookupOutcome {
            raw: record,
            analysis,
            source,
            api_auth_error,
        }
    }
}
