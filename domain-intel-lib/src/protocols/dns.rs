//! DNS existence probe.
//!
//! Last-resort evidence that a domain exists when no registration data can be
//! obtained. Address and nameserver lookups run concurrently and fail
//! independently: a failed lookup contributes an empty list.

use async_trait::async_trait;
use hickory_resolver::TokioResolver;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::DomainIntelError;
use crate::protocols::SourceAdapter;
use crate::types::{RawSourceResult, SourceTag};
use crate::utils::normalize_hostname;

/// The two record lookups the probe needs.
#[async_trait]
pub trait NameLookup: Send + Sync {
    /// IPv4 addresses of `domain`.
    async fn addresses(&self, domain: &str) -> Result<Vec<IpAddr>, DomainIntelError>;

    /// Nameserver hostnames of `domain`.
    async fn name_servers(&self, domain: &str) -> Result<Vec<String>, DomainIntelError>;
}

/// [`NameLookup`] backed by the system resolver configuration.
pub struct HickoryLookup {
    resolver: TokioResolver,
}

impl HickoryLookup {
    /// Create a resolver from the system configuration.
    pub fn from_system() -> Result<Self, DomainIntelError> {
        let resolver = TokioResolver::builder_tokio()
            .map_err(|e| DomainIntelError::internal(format!("failed to create resolver: {e}")))?
            .build();
        Ok(Self { resolver })
    }
}

#[async_trait]
impl NameLookup for HickoryLookup {
    async fn addresses(&self, domain: &str) -> Result<Vec<IpAddr>, DomainIntelError> {
        let response = self
            .resolver
            .ipv4_lookup(domain)
            .await
            .map_err(|e| DomainIntelError::unavailable("DNS", format!("A lookup failed: {e}")))?;

        Ok(response.iter().map(|a| IpAddr::V4(a.0)).collect())
    }

    async fn name_servers(&self, domain: &str) -> Result<Vec<String>, DomainIntelError> {
        let response = self
            .resolver
            .ns_lookup(domain)
            .await
            .map_err(|e| DomainIntelError::unavailable("DNS", format!("NS lookup failed: {e}")))?;

        Ok(response.iter().map(|ns| ns.to_string()).collect())
    }
}

/// Source adapter that reports a domain as existing when it has A or NS records.
#[derive(Clone)]
pub struct DnsProbe {
    lookup: Arc<dyn NameLookup>,
    timeout: Duration,
}

impl DnsProbe {
    /// Probe using the system resolver.
    pub fn system(timeout: Duration) -> Result<Self, DomainIntelError> {
        Ok(Self::with_lookup(Arc::new(HickoryLookup::from_system()?), timeout))
    }

    /// Probe using a custom lookup implementation.
    pub fn with_lookup(lookup: Arc<dyn NameLookup>, timeout: Duration) -> Self {
        Self { lookup, timeout }
    }

    async fn resolve_addresses(&self, domain: &str) -> Vec<IpAddr> {
        match tokio::time::timeout(self.timeout, self.lookup.addresses(domain)).await {
            Ok(Ok(addresses)) => addresses,
            Ok(Err(e)) => {
                debug!(domain, error = %e, "no address records");
                Vec::new()
            }
            Err(_) => {
                warn!(domain, timeout = ?self.timeout, "address lookup timed out");
                Vec::new()
            }
        }
    }

    async fn resolve_name_servers(&self, domain: &str) -> Vec<String> {
        match tokio::time::timeout(self.timeout, self.lookup.name_servers(domain)).await {
            Ok(Ok(hosts)) => {
                let mut hosts: Vec<String> = hosts.iter().map(|h| normalize_hostname(h)).collect();
                hosts.retain(|h| !h.is_empty());
                hosts.dedup();
                hosts
            }
            Ok(Err(e)) => {
                debug!(domain, error = %e, "no nameserver records");
                Vec::new()
            }
            Err(_) => {
                warn!(domain, timeout = ?self.timeout, "nameserver lookup timed out");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl SourceAdapter for DnsProbe {
    fn name(&self) -> &'static str {
        "DNS"
    }

    fn tag(&self) -> SourceTag {
        SourceTag::DnsFallback
    }

    async fn fetch(&self, domain: &str) -> Result<RawSourceResult, DomainIntelError> {
        let (addresses, name_servers) = tokio::join!(
            self.resolve_addresses(domain),
            self.resolve_name_servers(domain)
        );

        if addresses.is_empty() && name_servers.is_empty() {
            return Err(DomainIntelError::unavailable(
                "DNS",
                format!("no A or NS records for {}", domain),
            ));
        }

        debug!(
            domain,
            addresses = addresses.len(),
            name_servers = name_servers.len(),
            "DNS confirmed domain existence"
        );
        Ok(RawSourceResult::Dns {
            addresses,
            name_servers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    struct FakeLookup {
        addresses: Result<Vec<IpAddr>, DomainIntelError>,
        name_servers: Result<Vec<String>, DomainIntelError>,
    }

    #[async_trait]
    impl NameLookup for FakeLookup {
        async fn addresses(&self, _domain: &str) -> Result<Vec<IpAddr>, DomainIntelError> {
            self.addresses.clone()
        }

        async fn name_servers(&self, _domain: &str) -> Result<Vec<String>, DomainIntelError> {
            self.name_servers.clone()
        }
    }

    fn probe(lookup: FakeLookup) -> DnsProbe {
        DnsProbe::with_lookup(Arc::new(lookup), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_nameservers_only_is_success() {
        let probe = probe(FakeLookup {
            addresses: Err(DomainIntelError::unavailable("DNS", "NXDOMAIN")),
            name_servers: Ok(vec!["NS1.Example.NET.".to_string()]),
        });

        match probe.fetch("example.com").await.unwrap() {
            RawSourceResult::Dns {
                addresses,
                name_servers,
            } => {
                assert!(addresses.is_empty());
                assert_eq!(name_servers, vec!["ns1.example.net"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_addresses_only_is_success() {
        let probe = probe(FakeLookup {
            addresses: Ok(vec![IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34))]),
            name_servers: Err(DomainIntelError::unavailable("DNS", "SERVFAIL")),
        });

        assert!(probe.fetch("example.com").await.is_ok());
    }

    #[tokio::test]
    async fn test_no_records_is_failure() {
        let probe = probe(FakeLookup {
            addresses: Ok(vec![]),
            name_servers: Err(DomainIntelError::unavailable("DNS", "NXDOMAIN")),
        });

        let err = probe.fetch("missing.example").await.unwrap_err();
        assert!(matches!(err, DomainIntelError::SourceUnavailable { .. }));
    }
}
