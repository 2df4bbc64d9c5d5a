//! Normalization of source-specific results into [`DomainRecord`].
//!
//! Every function here is total: missing or oddly shaped fields become `None`
//! (or an empty collection) and never an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use std::net::IpAddr;
use tracing::debug;

use crate::types::{
    DomainRecord, RawSourceResult, SourceTag, DNS_UNKNOWN_REGISTRAR, DNS_VERIFIED_STATUS,
};
use crate::utils::normalize_hostname;
use crate::vcard::{
    entities, find_entity, non_blank, normalize_country, public_id, vcard_country, vcard_text,
};

/// Normalize any raw source result for the queried `domain`.
pub fn normalize(raw: &RawSourceResult, domain: &str) -> DomainRecord {
    match raw {
        RawSourceResult::WhoisXml { payload, masked } => from_whois_api(payload, domain, *masked),
        RawSourceResult::Rdap { payload, .. } => from_rdap(payload, domain),
        RawSourceResult::Dns {
            addresses,
            name_servers,
        } => from_dns(domain, addresses, name_servers),
    }
}

/// Map a WhoisXML API response.
///
/// Record-level fields win; `registryData` fills the gaps.
pub fn from_whois_api(payload: &Value, domain: &str, masked: bool) -> DomainRecord {
    let record = payload.get("WhoisRecord").unwrap_or(payload);
    let registry = record.get("registryData");

    let field = |key: &str| -> Option<String> {
        text_field(record, key).or_else(|| registry.and_then(|r| text_field(r, key)))
    };
    let date = |key: &str| field(key).as_deref().and_then(parse_date);

    let mut out = DomainRecord::new(
        field("domainName")
            .map(|d| d.to_lowercase())
            .unwrap_or_else(|| domain.to_string()),
        SourceTag::WhoisXml,
    );

    out.registrar_name = field("registrarName");
    out.registrar_iana_id = field("registrarIANAID");
    out.registrar_url = field("registrarURL").or_else(|| field("registrarUrl"));
    out.registrar_abuse_email = field("registrarAbuseContactEmail");
    out.created_date = date("createdDate");
    out.expires_date = date("expiresDate");
    out.updated_date = date("updatedDate");

    out.status = status_tokens(record.get("status"));
    if out.status.is_empty() {
        out.status = status_tokens(registry.and_then(|r| r.get("status")));
    }

    out.name_servers = host_names(record).into_iter().collect();
    if out.name_servers.is_empty() {
        out.name_servers = registry.map(host_names).unwrap_or_default().into_iter().collect();
    }

    if let Some(registrant) = record
        .get("registrant")
        .or_else(|| registry.and_then(|r| r.get("registrant")))
    {
        out.registrant_name = text_field(registrant, "name");
        out.registrant_organization = text_field(registrant, "organization");
        out.registrant_country = text_field(registrant, "countryCode")
            .or_else(|| text_field(registrant, "country"))
            .map(|c| normalize_country(&c));
    }

    out.privacy_masked = masked;
    out.raw_text = field("rawText").unwrap_or_else(|| pretty(payload));
    out
}

/// Map an RDAP domain object.
pub fn from_rdap(payload: &Value, domain: &str) -> DomainRecord {
    let mut out = DomainRecord::new(
        text_field(payload, "ldhName")
            .map(|d| d.to_lowercase())
            .unwrap_or_else(|| domain.to_string()),
        SourceTag::Rdap,
    );

    let all_entities = entities(payload);

    if let Some(registrar) = find_entity(all_entities, "registrar") {
        out.registrar_name = vcard_text(registrar, "fn");
        out.registrar_iana_id = public_id(registrar, "iana id");
        out.registrar_url = vcard_text(registrar, "url");
        out.registrar_abuse_email =
            find_entity(entities(registrar), "abuse").and_then(|abuse| vcard_text(abuse, "email"));
    }

    if let Some(registrant) = find_entity(all_entities, "registrant") {
        out.registrant_organization = vcard_text(registrant, "org");
        out.registrant_name = vcard_text(registrant, "fn");
    }

    // Country is read from the first listed entity, whatever its role.
    out.registrant_country = all_entities.first().and_then(vcard_country);

    out.created_date = rdap_event(payload, "registration");
    out.expires_date = rdap_event(payload, "expiration");
    out.updated_date = rdap_event(payload, "last changed");

    out.status = status_tokens(payload.get("status"));

    out.name_servers = payload
        .get("nameservers")
        .and_then(|ns| ns.as_array())
        .map(|list| {
            list.iter()
                .filter_map(|ns| text_field(ns, "ldhName"))
                .map(|host| normalize_hostname(&host))
                .collect()
        })
        .unwrap_or_default();

    out.raw_text = pretty(payload);
    out
}

/// Synthesize a minimal record from DNS evidence.
pub fn from_dns(domain: &str, addresses: &[IpAddr], name_servers: &[String]) -> DomainRecord {
    let mut out = DomainRecord::new(domain, SourceTag::DnsFallback);

    out.registrar_name = Some(DNS_UNKNOWN_REGISTRAR.to_string());
    out.status = vec![DNS_VERIFIED_STATUS.to_string()];
    out.name_servers = name_servers.iter().map(|h| normalize_hostname(h)).collect();

    let ips: Vec<String> = addresses.iter().map(|ip| ip.to_string()).collect();
    let hosts: Vec<&str> = out.name_servers.iter().map(String::as_str).collect();
    out.raw_text = format!(
        "WHOIS/RDAP data could not be retrieved, but the domain exists in DNS.\n\nIP Addresses: {}\nNameservers: {}",
        ips.join(", "),
        hosts.join(", ")
    );
    out
}

/// Parse the date formats registration sources emit.
///
/// Accepts RFC 3339, `2019-03-14T10:00:00-0700`, `2019-03-14 10:00:00 UTC`,
/// `2019-03-14T10:00:00` and `2019-03-14`; anything else is `None`.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S UTC", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    if let Some(naive) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Some(naive.and_utc());
    }

    debug!(value, "unrecognized date format");
    None
}

/// First event whose action matches `action`, as a timestamp.
fn rdap_event(payload: &Value, action: &str) -> Option<DateTime<Utc>> {
    payload
        .get("events")
        .and_then(|e| e.as_array())?
        .iter()
        .find(|event| {
            event
                .get("eventAction")
                .or_else(|| event.get("action"))
                .and_then(|a| a.as_str())
                .is_some_and(|a| a.eq_ignore_ascii_case(action))
        })
        .and_then(|event| event.get("eventDate"))
        .and_then(|d| d.as_str())
        .and_then(parse_date)
}

/// Status tokens from either a space-separated string or an array of strings.
fn status_tokens(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => s.split_whitespace().map(String::from).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|s| s.as_str())
            .filter_map(non_blank)
            .collect(),
        _ => Vec::new(),
    }
}

/// `nameServers.hostNames` of a WhoisXML record.
fn host_names(record: &Value) -> Vec<String> {
    record
        .get("nameServers")
        .and_then(|ns| ns.get("hostNames"))
        .and_then(|h| h.as_array())
        .map(|hosts| {
            hosts
                .iter()
                .filter_map(|h| h.as_str())
                .map(normalize_hostname)
                .filter(|h| !h.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Non-blank string (or number) field of an object.
fn text_field(object: &Value, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) => non_blank(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn pretty(payload: &Value) -> String {
    serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};
    use serde_json::json;

    fn rdap_fixture() -> Value {
        json!({
            "objectClassName": "domain",
            "ldhName": "EXAMPLE.COM",
            "status": ["client delete prohibited", "client transfer prohibited"],
            "entities": [
                {
                    "roles": ["registrar"],
                    "publicIds": [{ "type": "IANA Registrar ID", "identifier": "1" }, { "type": "iana id", "identifier": "376" }],
                    "vcardArray": ["vcard", [
                        ["version", {}, "text", "4.0"],
                        ["fn", {}, "text", "RESERVED-Internet Assigned Numbers Authority"],
                        ["adr", {}, "text", ["", "", "12025 Waterfront Drive", "Los Angeles", "CA", "90094", "US"]]
                    ]],
                    "entities": [{
                        "roles": ["abuse"],
                        "vcardArray": ["vcard", [
                            ["fn", {}, "text", "Abuse Desk"],
                            ["email", {}, "text", "abuse@iana.org"]
                        ]]
                    }]
                },
                {
                    "roles": ["registrant"],
                    "vcardArray": ["vcard", [
                        ["fn", {}, "text", "REDACTED FOR PRIVACY"],
                        ["org", {}, "text", "Internet Assigned Numbers Authority"]
                    ]]
                }
            ],
            "events": [
                { "eventAction": "registration", "eventDate": "1995-08-14T04:00:00Z" },
                { "eventAction": "expiration", "eventDate": "2026-08-13T04:00:00Z" },
                { "eventAction": "last changed", "eventDate": "2025-08-14T07:01:39Z" },
                { "eventAction": "last update of RDAP database", "eventDate": "2026-01-01T00:00:00Z" }
            ],
            "nameservers": [
                { "objectClassName": "nameserver", "ldhName": "A.IANA-SERVERS.NET" },
                { "objectClassName": "nameserver", "ldhName": "B.IANA-SERVERS.NET" }
            ]
        })
    }

    #[test]
    fn test_from_rdap_full() {
        let record = from_rdap(&rdap_fixture(), "example.com");

        assert_eq!(record.domain_name, "example.com");
        assert_eq!(record.source, SourceTag::Rdap);
        assert_eq!(
            record.registrar_name.as_deref(),
            Some("RESERVED-Internet Assigned Numbers Authority")
        );
        assert_eq!(record.registrar_iana_id.as_deref(), Some("376"));
        assert_eq!(record.registrar_abuse_email.as_deref(), Some("abuse@iana.org"));
        assert_eq!(
            record.registrant_organization.as_deref(),
            Some("Internet Assigned Numbers Authority")
        );
        assert_eq!(record.registrant_name.as_deref(), Some("REDACTED FOR PRIVACY"));
        assert_eq!(record.registrant_country.as_deref(), Some("US"));
        assert_eq!(
            record.created_date,
            Some(Utc.with_ymd_and_hms(1995, 8, 14, 4, 0, 0).unwrap())
        );
        assert_eq!(record.expires_date.map(|d| d.year()), Some(2026));
        assert_eq!(
            record.updated_date,
            Some(Utc.with_ymd_and_hms(2025, 8, 14, 7, 1, 39).unwrap())
        );
        assert_eq!(record.status.len(), 2);
        assert_eq!(
            record.status_display(),
            "client delete prohibited client transfer prohibited"
        );
        assert!(record.name_servers.contains("a.iana-servers.net"));
        assert_eq!(record.name_servers.len(), 2);
        assert!(record.raw_text.contains("\"ldhName\""));
    }

    #[test]
    fn test_from_rdap_accepts_action_field() {
        let payload = json!({
            "events": [{ "action": "registration", "eventDate": "2024-01-02T00:00:00Z" }]
        });
        let record = from_rdap(&payload, "example.net");
        assert_eq!(
            record.created_date,
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_from_rdap_empty_payload() {
        let record = from_rdap(&json!({}), "example.org");

        assert_eq!(record.domain_name, "example.org");
        assert_eq!(record.registrar_name, None);
        assert_eq!(record.registrar_abuse_email, None);
        assert_eq!(record.registrant_country, None);
        assert_eq!(record.created_date, None);
        assert!(record.status.is_empty());
        assert!(record.name_servers.is_empty());
    }

    #[test]
    fn test_from_rdap_wrong_shapes() {
        let payload = json!({
            "entities": "nope",
            "events": [{ "eventAction": 5 }, "junk"],
            "nameservers": [{ "ldhName": null }, 3],
            "status": "active"
        });
        let record = from_rdap(&payload, "example.org");
        assert_eq!(record.created_date, None);
        assert!(record.name_servers.is_empty());
        assert_eq!(record.status, vec!["active"]);
    }

    #[test]
    fn test_from_whois_api_full() {
        let payload = json!({
            "WhoisRecord": {
                "domainName": "example.com",
                "registrarName": "Namecheap Inc",
                "registrarIANAID": "1068",
                "createdDate": "2024-05-01T10:00:00Z",
                "expiresDate": "2025-05-01 10:00:00 UTC",
                "updatedDate": "2024-05-02T00:00:00+0000",
                "status": "clientTransferProhibited addPeriod",
                "nameServers": { "hostNames": ["DNS1.REGISTRAR-SERVERS.COM", "dns2.registrar-servers.com"] },
                "registrant": {
                    "name": "Withheld for Privacy Purposes",
                    "organization": "Privacy service provided by Withheld for Privacy ehf",
                    "countryCode": "is"
                },
                "rawText": "Domain Name: example.com"
            }
        });

        let record = from_whois_api(&payload, "example.com", false);
        assert_eq!(record.source, SourceTag::WhoisXml);
        assert_eq!(record.registrar_name.as_deref(), Some("Namecheap Inc"));
        assert_eq!(record.registrar_iana_id.as_deref(), Some("1068"));
        assert_eq!(
            record.created_date,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
        );
        assert_eq!(
            record.expires_date,
            Some(Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap())
        );
        assert!(record.updated_date.is_some());
        assert_eq!(record.status, vec!["clientTransferProhibited", "addPeriod"]);
        assert!(record.name_servers.contains("dns1.registrar-servers.com"));
        assert_eq!(record.registrant_country.as_deref(), Some("IS"));
        assert_eq!(record.raw_text, "Domain Name: example.com");
        assert!(!record.privacy_masked);
    }

    #[test]
    fn test_from_whois_api_registry_fallback() {
        let payload = json!({
            "WhoisRecord": {
                "dataError": "MASKED_WHOIS_DATA",
                "registryData": {
                    "createdDate": "2001-02-03",
                    "registrarName": "GoDaddy.com, LLC",
                    "nameServers": { "hostNames": ["ns1.example.net"] },
                    "rawText": "registry text"
                }
            }
        });

        let record = from_whois_api(&payload, "masked.com", true);
        assert_eq!(record.domain_name, "masked.com");
        assert_eq!(record.registrar_name.as_deref(), Some("GoDaddy.com, LLC"));
        assert_eq!(
            record.created_date,
            Some(Utc.with_ymd_and_hms(2001, 2, 3, 0, 0, 0).unwrap())
        );
        assert!(record.name_servers.contains("ns1.example.net"));
        assert_eq!(record.raw_text, "registry text");
        assert!(record.privacy_masked);
    }

    #[test]
    fn test_from_whois_api_missing_everything() {
        let record = from_whois_api(&json!({ "WhoisRecord": {} }), "bare.io", false);
        assert_eq!(record.domain_name, "bare.io");
        assert_eq!(record.registrar_name, None);
        assert_eq!(record.registrant_country, None);
        assert_eq!(record.registrant_organization, None);
        assert!(record.status.is_empty());
        assert!(!record.raw_text.is_empty());
    }

    #[test]
    fn test_from_whois_api_blank_strings_are_absent() {
        let payload = json!({
            "WhoisRecord": { "registrarName": "  ", "registrant": { "countryCode": "", "country": "RUSSIA" } }
        });
        let record = from_whois_api(&payload, "x.ru", false);
        assert_eq!(record.registrar_name, None);
        assert_eq!(record.registrant_country.as_deref(), Some("RUSSIA"));
    }

    #[test]
    fn test_from_dns() {
        let record = from_dns(
            "example.com",
            &["93.184.216.34".parse().unwrap()],
            &["A.IANA-SERVERS.NET.".to_string()],
        );

        assert_eq!(record.source, SourceTag::DnsFallback);
        assert_eq!(record.registrar_name.as_deref(), Some(DNS_UNKNOWN_REGISTRAR));
        assert_eq!(record.status, vec![DNS_VERIFIED_STATUS]);
        assert!(record.name_servers.contains("a.iana-servers.net"));
        assert!(record.raw_text.contains("93.184.216.34"));
        assert_eq!(record.created_date, None);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = Utc.with_ymd_and_hms(2019, 3, 14, 17, 0, 0).unwrap();
        assert_eq!(parse_date("2019-03-14T17:00:00Z"), Some(expected));
        assert_eq!(parse_date("2019-03-14T10:00:00-0700"), Some(expected));
        assert_eq!(parse_date("2019-03-14 17:00:00 UTC"), Some(expected));
        assert_eq!(parse_date("2019-03-14T17:00:00"), Some(expected));
        assert_eq!(
            parse_date("2019-03-14"),
            Some(Utc.with_ymd_and_hms(2019, 3, 14, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_date("14/03/2019"), None);
        assert_eq!(parse_date(""), None);
    }
}
