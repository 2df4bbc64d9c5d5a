//! Source adapters for registration data.
//!
//! Each upstream source (commercial WHOIS API, RDAP, DNS) implements
//! [`SourceAdapter`]: it issues its own network requests and either returns a
//! raw, source-specific result or fails. The orchestrator never looks inside
//! a failure beyond its classification.

use async_trait::async_trait;

use crate::error::DomainIntelError;
use crate::types::{RawSourceResult, SourceTag};

/// DNS existence probe
pub mod dns;

/// RDAP multi-endpoint prober
pub mod rdap;

/// RDAP endpoint table
pub mod registry;

/// WhoisXML API client
pub mod whois_api;

/// One upstream source of registration evidence.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Tag of the records this adapter produces.
    fn tag(&self) -> SourceTag;

    /// Query the source for an already validated, lower-cased domain.
    async fn fetch(&self, domain: &str) -> Result<RawSourceResult, DomainIntelError>;
}

// Re-export commonly used types
pub use dns::{DnsProbe, HickoryLookup, NameLookup};
pub use rdap::RdapClient;
pub use registry::{default_rdap_endpoints, RdapEndpoint};
pub use whois_api::WhoisApiClient;
