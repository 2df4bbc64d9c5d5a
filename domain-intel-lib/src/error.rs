//! Error handling for domain lookups.
//!
//! Adapter-level failures (`SourceUnavailable`, `AuthInvalid`, `RateLimited`,
//! `ParseError`, `Timeout`) are caught by the orchestrator and turned into
//! "try the next source". Only exhaustion of every source reaches the caller,
//! as `NotFound` or `RateLimited`.

use std::time::Duration;
use thiserror::Error;

/// Main error type for lookup operations.
#[derive(Debug, Clone, Error)]
pub enum DomainIntelError {
    /// Malformed domain, rejected before any network call
    #[error("Invalid domain '{domain}': {reason}")]
    InvalidDomain { domain: String, reason: String },

    /// Timeout, network error or unexpected HTTP status from one source
    #[error("{}", format_unavailable(.service, .message, .status_code))]
    SourceUnavailable {
        service: String,
        message: String,
        status_code: Option<u16>,
    },

    /// The commercial WHOIS source rejected the configured API key
    #[error("{service} rejected the API key (HTTP 401)")]
    AuthInvalid { service: String },

    /// Every source was exhausted without usable evidence
    #[error("No registration or DNS data found for '{domain}'")]
    NotFound { domain: String },

    /// A source answered HTTP 429
    #[error("Rate limited by {service}: {message}")]
    RateLimited { service: String, message: String },

    /// A source answered with a body that could not be decoded
    #[error("Parse error: {message}")]
    ParseError { message: String },

    /// Invalid configuration values
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// File I/O errors when reading configuration or domain lists
    #[error("File error at '{path}': {message}")]
    FileError { path: String, message: String },

    /// Timeout errors when operations take too long
    #[error("Timeout after {duration:?} during: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Generic internal errors that don't fit other categories
    #[error("Internal error: {message}")]
    Internal { message: String },
}

fn format_unavailable(service: &str, message: &str, status_code: &Option<u16>) -> String {
    match status_code {
        Some(code) => format!("{} unavailable (HTTP {}): {}", service, code, message),
        None => format!("{} unavailable: {}", service, message),
    }
}

impl DomainIntelError {
    /// Create a new invalid domain error.
    pub fn invalid_domain<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        Self::InvalidDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a new source-unavailable error.
    pub fn unavailable<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::SourceUnavailable {
            service: service.into(),
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a new source-unavailable error with HTTP status code.
    pub fn unavailable_with_status<S: Into<String>, M: Into<String>>(
        service: S,
        message: M,
        status_code: u16,
    ) -> Self {
        Self::SourceUnavailable {
            service: service.into(),
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a new authentication error.
    pub fn auth_invalid<S: Into<String>>(service: S) -> Self {
        Self::AuthInvalid {
            service: service.into(),
        }
    }

    /// Create a new not-found error.
    pub fn not_found<D: Into<String>>(domain: D) -> Self {
        Self::NotFound {
            domain: domain.into(),
        }
    }

    /// Create a new rate-limit error.
    pub fn rate_limited<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::RateLimited {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a new parse error.
    pub fn parse<M: Into<String>>(message: M) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether the orchestrator should move on to the next source after this error.
    ///
    /// Input and configuration problems are not source failures and abort the lookup.
    pub fn is_fallthrough(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. }
                | Self::AuthInvalid { .. }
                | Self::RateLimited { .. }
                | Self::ParseError { .. }
                | Self::Timeout { .. }
                | Self::NotFound { .. }
        )
    }

    /// HTTP status a transport layer should answer with for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidDomain { .. } => 400,
            Self::AuthInvalid { .. } => 401,
            Self::NotFound { .. } => 404,
            Self::RateLimited { .. } => 429,
            _ => 500,
        }
    }

    /// Message safe to show to an end user.
    ///
    /// Upstream details are collapsed into a generic message so that
    /// third-party error text never leaks to callers.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidDomain { .. } => {
                "Invalid domain format. Please enter a valid domain (e.g., example.com)."
            }
            Self::NotFound { .. } => "The domain is not present.",
            Self::AuthInvalid { .. } => {
                "Invalid WHOIS_API_KEY. Please check your WhoisXML API key."
            }
            Self::RateLimited { .. } => "Rate limit exceeded. Please try again later.",
            _ => "Failed to perform WHOIS lookup.",
        }
    }
}

// Timeouts carry no duration in reqwest errors; callers that know the
// configured timeout map the error themselves.
impl From<reqwest::Error> for DomainIntelError {
    fn from(err: reqwest::Error) -> Self {
        let service = "HTTP";
        if err.is_timeout() {
            Self::unavailable(service, format!("request timed out: {}", err))
        } else if err.is_connect() {
            Self::unavailable(service, format!("connection failed: {}", err))
        } else if let Some(status) = err.status() {
            Self::unavailable_with_status(service, err.to_string(), status.as_u16())
        } else {
            Self::unavailable(service, format!("request failed: {}", err))
        }
    }
}

impl From<serde_json::Error> for DomainIntelError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(format!("JSON parsing failed: {}", err))
    }
}

impl From<std::io::Error> for DomainIntelError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(format!("I/O error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_hide_upstream_details() {
        let err = DomainIntelError::unavailable_with_status("RDAP", "upstream stack trace", 502);
        assert_eq!(err.user_message(), "Failed to perform WHOIS lookup.");
        assert!(err.to_string().contains("HTTP 502"));

        assert_eq!(
            DomainIntelError::not_found("example.com").user_message(),
            "The domain is not present."
        );
        assert!(DomainIntelError::auth_invalid("WhoisXML")
            .user_message()
            .contains("WHOIS_API_KEY"));
        assert!(DomainIntelError::rate_limited("RDAP", "slow down")
            .user_message()
            .contains("Rate limit"));
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(DomainIntelError::invalid_domain("x", "bad").http_status(), 400);
        assert_eq!(DomainIntelError::auth_invalid("WhoisXML").http_status(), 401);
        assert_eq!(DomainIntelError::not_found("a.com").http_status(), 404);
        assert_eq!(DomainIntelError::rate_limited("RDAP", "").http_status(), 429);
        assert_eq!(DomainIntelError::internal("boom").http_status(), 500);
    }

    #[test]
    fn test_fallthrough_classification() {
        assert!(DomainIntelError::unavailable("RDAP", "down").is_fallthrough());
        assert!(DomainIntelError::auth_invalid("WhoisXML").is_fallthrough());
        assert!(DomainIntelError::timeout("RDAP", Duration::from_secs(15)).is_fallthrough());
        assert!(!DomainIntelError::invalid_domain("bad", "syntax").is_fallthrough());
        assert!(!DomainIntelError::config("nope").is_fallthrough());
    }
}
