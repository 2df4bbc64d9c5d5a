//! Typed extraction from RDAP entities and their jCard (`vcardArray`) data.
//!
//! A jCard is `["vcard", [[name, params, type, value...], ...]]`. Every
//! accessor here returns `None` on any shape mismatch instead of indexing
//! blindly, and treats blank strings as absent.

use serde_json::Value;

/// Position of the country name inside an `adr` value (RFC 6350 §6.3.1).
const ADR_COUNTRY_INDEX: usize = 6;

/// Property arrays of an entity's vCard, or an empty slice.
fn properties(entity: &Value) -> &[Value] {
    entity
        .get("vcardArray")
        .and_then(|v| v.as_array())
        .and_then(|card| card.get(1))
        .and_then(|props| props.as_array())
        .map(|props| props.as_slice())
        .unwrap_or(&[])
}

/// First property named `name` (case-insensitive).
fn property<'a>(entity: &'a Value, name: &str) -> Option<&'a [Value]> {
    properties(entity).iter().find_map(|prop| {
        let items = prop.as_array()?;
        let prop_name = items.first()?.as_str()?;
        prop_name
            .eq_ignore_ascii_case(name)
            .then_some(items.as_slice())
    })
}

/// Non-blank trimmed string.
pub(crate) fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Text value of property `name` (`fn`, `org`, `url`, `email`, ...).
///
/// Structured values (such as a multi-component `org`) yield their first
/// non-blank component.
pub fn vcard_text(entity: &Value, name: &str) -> Option<String> {
    let value = property(entity, name)?.get(3)?;
    match value {
        Value::String(text) => non_blank(text),
        Value::Array(parts) => parts.iter().filter_map(|p| p.as_str()).find_map(non_blank),
        _ => None,
    }
}

/// Country of the entity's `adr` property.
///
/// Prefers the `cc` parameter (an ISO-3166 code) and falls back to the
/// country component of the address value.
pub fn vcard_country(entity: &Value) -> Option<String> {
    let adr = property(entity, "adr")?;

    let from_param = adr
        .get(1)
        .and_then(|params| params.get("cc"))
        .and_then(|cc| cc.as_str())
        .and_then(non_blank);

    from_param
        .or_else(|| {
            adr.get(3)
                .and_then(|value| value.as_array())
                .and_then(|components| components.get(ADR_COUNTRY_INDEX))
                .and_then(|country| country.as_str())
                .and_then(non_blank)
        })
        .map(|country| normalize_country(&country))
}

/// Upper-case two-letter codes, keep country names as given.
pub(crate) fn normalize_country(country: &str) -> String {
    let trimmed = country.trim();
    if trimmed.len() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        trimmed.to_ascii_uppercase()
    } else {
        trimmed.to_string()
    }
}

/// Whether the entity's `roles` contain `role`.
pub fn has_role(entity: &Value, role: &str) -> bool {
    entity
        .get("roles")
        .and_then(|r| r.as_array())
        .map(|roles| {
            roles
                .iter()
                .any(|r| r.as_str().is_some_and(|r| r.eq_ignore_ascii_case(role)))
        })
        .unwrap_or(false)
}

/// Entities listed under `entities` of a domain or entity object.
pub fn entities(object: &Value) -> &[Value] {
    object
        .get("entities")
        .and_then(|e| e.as_array())
        .map(|e| e.as_slice())
        .unwrap_or(&[])
}

/// First entity carrying `role`.
pub fn find_entity<'a>(entities: &'a [Value], role: &str) -> Option<&'a Value> {
    entities.iter().find(|entity| has_role(entity, role))
}

/// Identifier of the `publicIds` entry of type `id_type` (e.g. `"iana id"`).
pub fn public_id(entity: &Value, id_type: &str) -> Option<String> {
    entity
        .get("publicIds")
        .and_then(|ids| ids.as_array())?
        .iter()
        .find(|id| {
            id.get("type")
                .and_then(|t| t.as_str())
                .is_some_and(|t| t.eq_ignore_ascii_case(id_type))
        })
        .and_then(|id| id.get("identifier"))
        .and_then(|identifier| match identifier {
            Value::String(s) => non_blank(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registrar_entity() -> Value {
        json!({
            "roles": ["registrar"],
            "publicIds": [{ "type": "IANA ID", "identifier": "292" }],
            "vcardArray": ["vcard", [
                ["version", {}, "text", "4.0"],
                ["fn", {}, "text", "MarkMonitor Inc."],
                ["url", {}, "uri", "https://www.markmonitor.com"],
                ["adr", { "cc": "us" }, "text", ["", "", "", "", "", "", ""]]
            ]]
        })
    }

    #[test]
    fn test_vcard_text() {
        let entity = registrar_entity();
        assert_eq!(vcard_text(&entity, "fn"), Some("MarkMonitor Inc.".to_string()));
        assert_eq!(
            vcard_text(&entity, "url"),
            Some("https://www.markmonitor.com".to_string())
        );
        assert_eq!(vcard_text(&entity, "email"), None);
    }

    #[test]
    fn test_vcard_country_prefers_cc_param() {
        assert_eq!(vcard_country(&registrar_entity()), Some("US".to_string()));
    }

    #[test]
    fn test_vcard_country_from_address_component() {
        let entity = json!({
            "vcardArray": ["vcard", [
                ["adr", {}, "text", ["", "", "Tverskaya 1", "Moscow", "", "125009", "ru"]]
            ]]
        });
        assert_eq!(vcard_country(&entity), Some("RU".to_string()));
    }

    #[test]
    fn test_short_address_does_not_panic() {
        let entity = json!({
            "vcardArray": ["vcard", [["adr", {}, "text", ["", "Moscow"]]]]
        });
        assert_eq!(vcard_country(&entity), None);

        let garbage = json!({ "vcardArray": "not-an-array" });
        assert_eq!(vcard_country(&garbage), None);
        assert_eq!(vcard_text(&garbage, "fn"), None);

        let truncated = json!({ "vcardArray": ["vcard", [["fn"]]] });
        assert_eq!(vcard_text(&truncated, "fn"), None);
    }

    #[test]
    fn test_structured_org_value() {
        let entity = json!({
            "vcardArray": ["vcard", [["org", {}, "text", ["", "Example Holdings", "Legal"]]]]
        });
        assert_eq!(vcard_text(&entity, "org"), Some("Example Holdings".to_string()));
    }

    #[test]
    fn test_roles_and_public_ids() {
        let entity = registrar_entity();
        assert!(has_role(&entity, "registrar"));
        assert!(!has_role(&entity, "registrant"));
        assert_eq!(public_id(&entity, "iana id"), Some("292".to_string()));

        let list = vec![json!({ "roles": ["technical"] }), entity.clone()];
        assert_eq!(find_entity(&list, "registrar"), Some(&entity));
        assert_eq!(find_entity(&list, "registrant"), None);
    }
}
