//! Terminal rendering for domain-intel.
//!
//! Human-readable reports, per-domain error lines and the closing summary.
//! Styling uses the `console` crate; JSON output lives in `main.rs`.

use chrono::{DateTime, Utc};
use console::{pad_str, style, Alignment, StyledObject};
use domain_intel_lib::{DomainIntelError, LookupOutcome, RiskLevel};

const LABEL_WIDTH: usize = 14;

// ── Report ───────────────────────────────────────────────────────────────────

/// Print the full report for one successful lookup.
pub fn print_outcome(outcome: &LookupOutcome, debug: bool) {
    let record = &outcome.raw;
    let analysis = &outcome.analysis;

    println!(
        "{} {}",
        style(&record.domain_name).bold(),
        style(format!("via {}", outcome.source)).dim(),
    );

    print_field("Registrar", record.registrar_name.as_deref());
    print_field("IANA ID", record.registrar_iana_id.as_deref());
    print_field("Registrar URL", record.registrar_url.as_deref());
    print_field("Abuse email", record.registrar_abuse_email.as_deref());
    print_field("Created", format_date(record.created_date).as_deref());
    print_field("Expires", format_date(record.expires_date).as_deref());
    print_field("Updated", format_date(record.updated_date).as_deref());
    print_field("Registrant", record.registrant_organization.as_deref());
    print_field("Country", record.registrant_country.as_deref());

    let name_servers = record
        .name_servers
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    print_field("Nameservers", non_empty(&name_servers));
    print_field("Status", non_empty(&record.status_display()));

    println!(
        "  {} {} {}",
        label("Risk"),
        level_style(analysis.level, &analysis.level.to_string()).bold(),
        style(format!("(score {})", analysis.score)).dim(),
    );
    for factor in &analysis.factors {
        println!("  {} {}", " ".repeat(LABEL_WIDTH), style(format!("• {}", factor)).dim());
    }

    let active = if analysis.is_active {
        style("yes").green()
    } else {
        style("no").red()
    };
    println!("  {} {}", label("Active"), active);

    if analysis.privacy_protected {
        println!("  {} {}", label("Privacy"), style("registrant data is masked").dim());
    }

    if outcome.api_auth_error {
        println!(
            "  {} {}",
            style("⚠").yellow(),
            style("WhoisXML rejected the API key; results came from a fallback source. Check WHOIS_API_KEY.").yellow()
        );
    }

    if debug {
        println!("  {}", style("── raw ──").dim());
        for line in record.raw_text.lines() {
            println!("  {}", style(line).dim());
        }
    }
}

/// Print a failed lookup; `debug` shows the underlying error.
pub fn print_error(domain: &str, error: &DomainIntelError, debug: bool) {
    let message = if debug {
        error.to_string()
    } else {
        error.user_message().to_string()
    };

    let marker = match error {
        DomainIntelError::NotFound { .. } => style("✗").yellow(),
        _ => style("✗").red(),
    };
    eprintln!("{} {}  {}", marker, style(domain).bold(), message);
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print counts by risk level after a multi-domain run.
pub fn print_summary(outcomes: &[&LookupOutcome], failures: usize) {
    let count = |level: RiskLevel| {
        outcomes
            .iter()
            .filter(|o| o.analysis.level == level)
            .count()
    };

    println!(
        "{} {}  {}  {}  {}",
        style(format!("{} looked up:", outcomes.len() + failures)).bold(),
        level_style(RiskLevel::Low, &format!("{} low", count(RiskLevel::Low))),
        level_style(RiskLevel::Medium, &format!("{} medium", count(RiskLevel::Medium))),
        level_style(RiskLevel::High, &format!("{} high", count(RiskLevel::High))),
        style(format!("{} failed", failures)).dim(),
    );
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn print_field(name: &str, value: Option<&str>) {
    if let Some(value) = value {
        println!("  {} {}", label(name), value);
    }
}

fn label(name: &str) -> StyledObject<String> {
    style(pad_str(&format!("{}:", name), LABEL_WIDTH, Alignment::Left, None).into_owned()).cyan()
}

fn level_style(level: RiskLevel, text: &str) -> StyledObject<String> {
    let styled = style(text.to_string());
    match level {
        RiskLevel::Low => styled.green(),
        RiskLevel::Medium => styled.yellow(),
        RiskLevel::High => styled.red(),
    }
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

/// Date part of a timestamp, e.g. `2024-05-01`.
pub fn format_date(date: Option<DateTime<Utc>>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_date() {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap();
        assert_eq!(format_date(Some(date)), Some("2024-05-01".to_string()));
        assert_eq!(format_date(None), None);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(""), None);
        assert_eq!(non_empty("ns1.example.com"), Some("ns1.example.com"));
    }
}
