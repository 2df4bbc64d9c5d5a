//! WhoisXML API client.
//!
//! The commercial source is queried first when an API key is configured. Its
//! answers fall into three buckets:
//! - a usable record (strong success),
//! - a record flagged `MASKED_WHOIS_DATA` (weak success, kept as a fallback),
//! - anything else (failure, the next source is tried).
//!
//! A 401 is reported as [`DomainIntelError::AuthInvalid`] so the caller can
//! tell the operator their key is wrong.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::error::DomainIntelError;
use crate::protocols::SourceAdapter;
use crate::types::{RawSourceResult, SourceTag};

/// `dataError` value of privacy-masked records.
pub const MASKED_WHOIS_DATA: &str = "MASKED_WHOIS_DATA";

const SERVICE: &str = "WhoisXML";

/// Client for the WhoisXML `WhoisService` endpoint.
#[derive(Clone)]
pub struct WhoisApiClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl WhoisApiClient {
    /// Create a new client for `base_url` authenticated with `api_key`.
    pub fn new<U: Into<String>, K: Into<String>>(
        base_url: U,
        api_key: K,
        timeout: Duration,
    ) -> Result<Self, DomainIntelError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                DomainIntelError::internal(format!("Failed to create WHOIS API HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout,
        })
    }

    /// Query the API for `domain`.
    ///
    /// # Errors
    ///
    /// - `AuthInvalid` on HTTP 401
    /// - `RateLimited` on HTTP 429
    /// - `ParseError` when the body is not JSON
    /// - `SourceUnavailable` for timeouts, other statuses, an `ErrorMessage`
    ///   field or a missing `WhoisRecord`
    pub async fn lookup(&self, domain: &str) -> Result<RawSourceResult, DomainIntelError> {
        debug!(domain, "querying WhoisXML API");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("domainName", domain),
                ("outputFormat", "JSON"),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DomainIntelError::timeout("WhoisXML request", self.timeout)
                } else {
                    DomainIntelError::unavailable(SERVICE, format!("Request failed: {}", e))
                }
            })?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED => {
                error!("WhoisXML API returned 401: the API key is invalid or expired");
                return Err(DomainIntelError::auth_invalid(SERVICE));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(DomainIntelError::rate_limited(
                    SERVICE,
                    "WhoisXML API returned 429",
                ));
            }
            code => {
                return Err(DomainIntelError::unavailable_with_status(
                    SERVICE,
                    format!("WhoisXML API returned {}", code),
                    code.as_u16(),
                ));
            }
        }

        let body = response.text().await.map_err(|e| {
            DomainIntelError::unavailable(SERVICE, format!("Failed to read body: {}", e))
        })?;
        let payload: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| DomainIntelError::parse(format!("WhoisXML returned invalid JSON: {}", e)))?;

        classify_response(payload)
    }
}

/// Turn a decoded API response into a raw result or a failure.
pub(crate) fn classify_response(
    payload: serde_json::Value,
) -> Result<RawSourceResult, DomainIntelError> {
    if let Some(message) = payload.get("ErrorMessage") {
        let text = message
            .get("msg")
            .and_then(|m| m.as_str())
            .map(String::from)
            .unwrap_or_else(|| message.to_string());
        warn!(error = %text, "WhoisXML API reported an error");
        return Err(DomainIntelError::unavailable(SERVICE, text));
    }

    let record = match payload.get("WhoisRecord") {
        Some(record) if record.is_object() => record,
        _ => {
            return Err(DomainIntelError::unavailable(
                SERVICE,
                "response contains no WhoisRecord",
            ))
        }
    };

    let masked = record.get("dataError").and_then(|d| d.as_str()) == Some(MASKED_WHOIS_DATA);
    if masked {
        debug!("WhoisXML returned masked data");
    }

    Ok(RawSourceResult::WhoisXml { payload, masked })
}

#[async_trait]
impl SourceAdapter for WhoisApiClient {
    fn name(&self) -> &'static str {
        SERVICE
    }

    fn tag(&self) -> SourceTag {
        SourceTag::WhoisXml
    }

    async fn fetch(&self, domain: &str) -> Result<RawSourceResult, DomainIntelError> {
        self.lookup(domain).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_strong_record() {
        let result = classify_response(json!({
            "WhoisRecord": { "domainName": "example.com", "registrarName": "MarkMonitor Inc." }
        }))
        .unwrap();

        assert!(matches!(result, RawSourceResult::WhoisXml { masked: false, .. }));
        assert!(!result.is_weak());
    }

    #[test]
    fn test_classify_masked_record_is_weak() {
        let result = classify_response(json!({
            "WhoisRecord": { "domainName": "example.com", "dataError": "MASKED_WHOIS_DATA" }
        }))
        .unwrap();

        assert!(result.is_weak());
    }

    #[test]
    fn test_classify_error_message() {
        let err = classify_response(json!({
            "ErrorMessage": { "errorCode": "WHOIS_01", "msg": "Domain name is invalid" }
        }))
        .unwrap_err();

        assert!(matches!(err, DomainIntelError::SourceUnavailable { .. }));
        assert!(err.to_string().contains("Domain name is invalid"));
    }

    #[test]
    fn test_classify_missing_record() {
        let err = classify_response(json!({ "somethingElse": true })).unwrap_err();
        assert!(matches!(err, DomainIntelError::SourceUnavailable { .. }));

        let err = classify_response(json!({ "WhoisRecord": null })).unwrap_err();
        assert!(matches!(err, DomainIntelError::SourceUnavailable { .. }));
    }
}
