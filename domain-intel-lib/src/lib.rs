//! # Domain Intel Library
//!
//! Registration intelligence for domain names: a cascade of upstream sources
//! (WhoisXML API, RDAP, DNS), normalization of their answers into one
//! canonical record, and a heuristic risk score.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domain_intel_lib::{DomainIntel, LookupConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let intel = DomainIntel::with_config(LookupConfig::default())?;
//!     let outcome = intel.lookup("example.com").await?;
//!
//!     println!("{} via {}", outcome.raw.domain_name, outcome.source);
//!     println!("risk: {} ({})", outcome.analysis.level, outcome.analysis.score);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Source cascade**: commercial WHOIS API first, then RDAP, then DNS
//! - **RDAP probing**: ordered, TLD-scoped endpoint table with backoff
//! - **Canonical records**: absent fields stay absent across every source
//! - **Risk scoring**: swappable lists and weights

// Re-export main public API types and functions
// This makes them available as domain_intel_lib::TypeName
pub use checker::DomainIntel;
pub use config::{
    load_env_config, parse_timeout_string, ConfigManager, DefaultsConfig, EnvConfig, FileConfig,
};
pub use error::DomainIntelError;
pub use history::{HistoryEntry, HistorySink, NoopHistory};
pub use normalize::{from_dns, from_rdap, from_whois_api, normalize, parse_date};
pub use protocols::{
    default_rdap_endpoints, DnsProbe, HickoryLookup, NameLookup, RdapClient, RdapEndpoint,
    SourceAdapter, WhoisApiClient,
};
pub use risk::{RiskPolicy, RiskWeights};
pub use types::{
    BackoffPolicy, DomainRecord, LookupConfig, LookupOutcome, RawSourceResult, RiskAssessment,
    RiskLevel, SourceTag, DNS_UNKNOWN_REGISTRAR, DNS_VERIFIED_STATUS,
};
pub use utils::{normalize_domain, validate_domain};

/// Typed accessors for RDAP entities and jCard data
pub mod vcard;

// Internal modules - these are not part of the public API
mod checker;
mod config;
mod error;
mod history;
mod normalize;
mod protocols;
mod risk;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, DomainIntelError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
