//! RDAP (Registration Data Access Protocol) multi-endpoint prober.
//!
//! RDAP servers are federated and individually unreliable, so the prober walks
//! an ordered endpoint table, skipping servers scoped to other TLDs, and stops
//! at the first server that answers HTTP 200 with a JSON body. Probing is
//! strictly sequential with a short pause after each failure.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{ACCEPT, CACHE_CONTROL, USER_AGENT};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::DomainIntelError;
use crate::protocols::registry::{eligible_endpoints, RdapEndpoint};
use crate::protocols::SourceAdapter;
use crate::types::{BackoffPolicy, RawSourceResult, SourceTag};
use crate::utils::extract_tld;

const RDAP_ACCEPT: &str = "application/rdap+json, application/json";

/// Browser User-Agents rotated across requests; some RDAP servers reject
/// obvious library agents.
pub const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
];

/// RDAP client that probes a list of endpoints until one answers.
#[derive(Clone)]
pub struct RdapClient {
    /// HTTP client shared by every probe
    http_client: reqwest::Client,
    /// Endpoints in priority order
    endpoints: Vec<RdapEndpoint>,
    /// Timeout for each endpoint
    timeout: Duration,
    /// Pause after a failed endpoint
    backoff: BackoffPolicy,
}

impl RdapClient {
    /// Create a new RDAP client with custom settings.
    pub fn with_config(
        endpoints: Vec<RdapEndpoint>,
        timeout: Duration,
        backoff: BackoffPolicy,
    ) -> Result<Self, DomainIntelError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout + Duration::from_secs(2)) // Add buffer for HTTP timeout
            .build()
            .map_err(|e| {
                DomainIntelError::internal(format!("Failed to create RDAP HTTP client: {}", e))
            })?;

        Ok(Self::with_http_client(http_client, endpoints, timeout, backoff))
    }

    /// Create a client around an existing HTTP client.
    pub fn with_http_client(
        http_client: reqwest::Client,
        endpoints: Vec<RdapEndpoint>,
        timeout: Duration,
        backoff: BackoffPolicy,
    ) -> Self {
        Self {
            http_client,
            endpoints,
            timeout,
            backoff,
        }
    }

    /// The configured endpoint table.
    pub fn endpoints(&self) -> &[RdapEndpoint] {
        &self.endpoints
    }

    /// Probe eligible endpoints in order until one returns a domain object.
    ///
    /// # Returns
    ///
    /// The URL that answered and its decoded JSON payload.
    ///
    /// # Errors
    ///
    /// The error of the last endpoint tried once the table is exhausted, or
    /// `SourceUnavailable` when no endpoint accepts the domain's TLD.
    pub async fn probe(&self, domain: &str) -> Result<(String, serde_json::Value), DomainIntelError> {
        let candidates: Vec<&RdapEndpoint> = eligible_endpoints(&self.endpoints, domain).collect();
        let mut last_error: Option<DomainIntelError> = None;

        for (index, endpoint) in candidates.iter().enumerate() {
            let url = endpoint.url_for(domain);
            debug!(endpoint = %endpoint.name, %url, "trying RDAP server");

            match self.query_endpoint(endpoint, &url).await {
                Ok(payload) => {
                    info!(endpoint = %endpoint.name, domain, "RDAP server answered");
                    return Ok((url, payload));
                }
                Err(e) => {
                    warn!(endpoint = %endpoint.name, domain, error = %e, "RDAP server failed");
                    last_error = Some(e);

                    if index + 1 < candidates.len() {
                        let pause = backoff_delay(&self.backoff);
                        if !pause.is_zero() {
                            tokio::time::sleep(pause).await;
                        }
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            DomainIntelError::unavailable(
                "RDAP",
                format!(
                    "no RDAP endpoint accepts .{}",
                    extract_tld(domain).unwrap_or(domain)
                ),
            )
        }))
    }

    /// Make one RDAP request.
    async fn query_endpoint(
        &self,
        endpoint: &RdapEndpoint,
        url: &str,
    ) -> Result<serde_json::Value, DomainIntelError> {
        let service = format!("RDAP ({})", endpoint.name);

        let response = self
            .http_client
            .get(url)
            .header(ACCEPT, RDAP_ACCEPT)
            .header(USER_AGENT, pick_user_agent())
            .header(CACHE_CONTROL, "no-cache")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DomainIntelError::timeout(format!("{} request", service), self.timeout)
                } else {
                    DomainIntelError::unavailable(&service, format!("Request failed: {}", e))
                }
            })?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text().await.map_err(|e| {
                    DomainIntelError::unavailable(&service, format!("Failed to read body: {}", e))
                })?;

                if body.trim().is_empty() {
                    return Err(DomainIntelError::unavailable(&service, "Empty response body"));
                }

                serde_json::from_str(&body).map_err(|e| {
                    DomainIntelError::parse(format!("{} returned invalid JSON: {}", service, e))
                })
            }
            StatusCode::TOO_MANY_REQUESTS => Err(DomainIntelError::rate_limited(
                service,
                "RDAP server returned 429",
            )),
            code => Err(DomainIntelError::unavailable_with_status(
                service,
                format!("RDAP server returned {}", code),
                code.as_u16(),
            )),
        }
    }
}

#[async_trait]
impl SourceAdapter for RdapClient {
    fn name(&self) -> &'static str {
        "RDAP"
    }

    fn tag(&self) -> SourceTag {
        SourceTag::Rdap
    }

    async fn fetch(&self, domain: &str) -> Result<RawSourceResult, DomainIntelError> {
        let (endpoint, payload) = self.probe(domain).await?;
        Ok(RawSourceResult::Rdap { payload, endpoint })
    }
}

/// Pick a User-Agent from the pool at random.
pub(crate) fn pick_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Fixed delay plus a random share of the jitter bound.
pub(crate) fn backoff_delay(policy: &BackoffPolicy) -> Duration {
    let jitter_ms = policy.jitter.as_millis() as u64;
    if jitter_ms == 0 {
        return policy.delay;
    }
    policy.delay + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
}
