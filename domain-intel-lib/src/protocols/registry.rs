//! RDAP endpoint table.
//!
//! RDAP is federated: no single server answers for every TLD, so lookups walk
//! an ordered list of servers. Some servers are authoritative only for a few
//! TLDs and are skipped for everything else.

use serde::{Deserialize, Serialize};

use crate::utils::extract_tld;

/// One RDAP server the prober may query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RdapEndpoint {
    /// Short name used in logs
    pub name: String,

    /// URL with a `{domain}` placeholder and an optional `{tld}` placeholder
    pub url_template: String,

    /// TLDs this server is limited to; `None` means any TLD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tlds: Option<Vec<String>>,
}

impl RdapEndpoint {
    /// Endpoint that accepts any TLD.
    pub fn new<N: Into<String>, U: Into<String>>(name: N, url_template: U) -> Self {
        Self {
            name: name.into(),
            url_template: url_template.into(),
            tlds: None,
        }
    }

    /// Endpoint limited to the given TLDs.
    pub fn scoped<N: Into<String>, U: Into<String>>(name: N, url_template: U, tlds: &[&str]) -> Self {
        Self {
            name: name.into(),
            url_template: url_template.into(),
            tlds: Some(tlds.iter().map(|t| t.to_string()).collect()),
        }
    }

    /// Whether this endpoint should be tried for `domain`.
    pub fn accepts(&self, domain: &str) -> bool {
        match &self.tlds {
            None => true,
            Some(scope) => match extract_tld(domain) {
                Some(tld) => scope.iter().any(|s| s.eq_ignore_ascii_case(tld)),
                None => false,
            },
        }
    }

    /// Request URL for `domain`.
    pub fn url_for(&self, domain: &str) -> String {
        let tld = extract_tld(domain).unwrap_or_default();
        self.url_template
            .replace("{tld}", tld)
            .replace("{domain}", domain)
    }
}

/// Built-in RDAP servers in priority order.
///
/// Registry-operated servers come first for the TLDs they own, followed by
/// the public redirectors and large back-end operators.
pub fn default_rdap_endpoints() -> Vec<RdapEndpoint> {
    vec![
        RdapEndpoint::scoped(
            "verisign",
            "https://rdap.verisign.com/{tld}/v1/domain/{domain}",
            &["com", "net"],
        ),
        RdapEndpoint::new("rdap.org", "https://rdap.org/domain/{domain}"),
        RdapEndpoint::new("iana", "https://rdap.iana.org/domain/{domain}"),
        RdapEndpoint::scoped(
            "pir",
            "https://rdap.publicinterestregistry.net/rdap/domain/{domain}",
            &["org"],
        ),
        RdapEndpoint::new("centralnic", "https://rdap.centralnic.com/rdap/domain/{domain}"),
        RdapEndpoint::new("google", "https://rdap.nic.google/domain/{domain}"),
        RdapEndpoint::new(
            "identitydigital",
            "https://rdap.identitydigital.services/rdap/domain/{domain}",
        ),
    ]
}

/// The endpoints of `endpoints` that will be tried for `domain`, in order.
pub fn eligible_endpoints<'a>(
    endpoints: &'a [RdapEndpoint],
    domain: &'a str,
) -> impl Iterator<Item = &'a RdapEndpoint> + 'a {
    endpoints.iter().filter(move |endpoint| endpoint.accepts(domain))
}
