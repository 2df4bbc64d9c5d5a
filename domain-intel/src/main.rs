//! Domain Intel CLI Application
//!
//! A command-line interface for looking up domain registration data and its
//! risk score. This CLI application is a thin layer over domain-intel-lib:
//! it parses arguments, layers configuration, and renders results.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use domain_intel_lib::{
    load_env_config, parse_timeout_string, ConfigManager, DomainIntel, DomainIntelError,
    FileConfig, LookupConfig, LookupOutcome,
};
use std::process;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Exit code when a lookup failed for any reason other than "not found"
const EXIT_ERROR: i32 = 1;

/// Exit code when every failed lookup was "not found"
const EXIT_NOT_FOUND: i32 = 2;

/// CLI arguments for domain-intel
#[derive(Parser, Debug)]
#[command(name = "domain-intel")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Look up domain registration data and score its risk")]
#[command(
    long_about = "Look up domain registration data via the WhoisXML API, RDAP and DNS, in that order.\n\nEvery answer is normalized into one record and scored for risk (new registrations, high-risk jurisdictions, disposable registrars)."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Domain names to look up
    #[arg(value_name = "DOMAINS", help_heading = "Domain Selection")]
    pub domains: Vec<String>,

    /// Input file with domains (one per line)
    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        help_heading = "Domain Selection"
    )]
    pub file: Option<String>,

    /// Output results in JSON format
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// WhoisXML API key (overrides WHOIS_API_KEY)
    #[arg(long = "api-key", value_name = "KEY", help_heading = "Sources")]
    pub api_key: Option<String>,

    /// Skip the WhoisXML API even when a key is configured
    #[arg(long = "no-whois-api", help_heading = "Sources")]
    pub no_whois_api: bool,

    /// Bound on the whole lookup for one domain (e.g. 30s, 2m)
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Performance")]
    pub timeout: Option<String>,

    /// Max concurrent lookups (default: 5, max: 50)
    #[arg(short = 'c', long = "concurrency", help_heading = "Performance")]
    pub concurrency: Option<usize>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show detailed debug information and error messages
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Validate arguments
    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(EXIT_ERROR);
    }

    init_logging(args.verbose || args.debug);

    match run(args).await {
        Ok(0) => {}
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(EXIT_ERROR);
        }
    }
}

/// Send library logs to stderr so stdout stays clean for results.
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "domain_intel_lib=debug,domain_intel=debug"
    } else {
        "domain_intel_lib=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if args.domains.is_empty() && args.file.is_none() {
        return Err("No domains specified. Pass domain names or use --file.".to_string());
    }

    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > 50 {
            return Err("Concurrency must be between 1 and 50".to_string());
        }
    }

    if let Some(timeout) = &args.timeout {
        if !matches!(parse_timeout_string(timeout), Some(secs) if secs > 0) {
            return Err(format!(
                "Invalid timeout '{}'. Use format like '5s', '30s', '2m'",
                timeout
            ));
        }
    }

    if args.no_whois_api && args.api_key.is_some() {
        return Err("Cannot combine --api-key with --no-whois-api".to_string());
    }

    Ok(())
}

async fn run(args: Args) -> Result<i32, Box<dyn std::error::Error>> {
    let (config, json_default) = build_config(&args)?;
    let json = args.json || json_default;
    let domains = collect_domains(&args)?;

    let intel = DomainIntel::with_config(config)?;
    if args.verbose && !intel.has_whois_api() {
        eprintln!("No usable WhoisXML API key; starting with RDAP");
    }

    let results = intel.lookup_many(&domains).await;

    if json {
        display_json_results(&results)?;
    } else {
        display_text_results(&results, args.debug);
    }

    Ok(exit_code(&results))
}

/// Layer configuration: built-in defaults, config files, environment, CLI.
///
/// Returns the lookup configuration and the JSON output default.
fn build_config(args: &Args) -> Result<(LookupConfig, bool), DomainIntelError> {
    let env_config = load_env_config();
    let manager = ConfigManager::new(args.verbose);

    let file_config = match args.config.as_ref().or(env_config.config.as_ref()) {
        Some(path) => manager.load_file(path)?,
        None => manager.discover_and_load()?,
    };

    let config = file_config.apply_to(LookupConfig::default())?;
    let config = env_config.apply_to(config);
    let config = apply_cli_args(config, args)?;

    let json = env_config
        .json
        .or_else(|| json_from_file(&file_config))
        .unwrap_or(false);

    Ok((config, json))
}

fn json_from_file(file_config: &FileConfig) -> Option<bool> {
    file_config.defaults.as_ref().and_then(|d| d.json)
}

/// CLI flags take precedence over everything else.
fn apply_cli_args(mut config: LookupConfig, args: &Args) -> Result<LookupConfig, DomainIntelError> {
    if let Some(key) = &args.api_key {
        config.whois_api_key = Some(key.clone());
    }
    if args.no_whois_api {
        config.whois_api_key = None;
    }
    if let Some(timeout) = &args.timeout {
        let secs = parse_timeout_string(timeout)
            .filter(|secs| *secs > 0)
            .ok_or_else(|| DomainIntelError::config(format!("Invalid timeout '{}'", timeout)))?;
        config.lookup_timeout = Duration::from_secs(secs);
    }
    if let Some(concurrency) = args.concurrency {
        config = config.with_concurrency(concurrency);
    }
    Ok(config)
}

/// Domains from the command line followed by those from `--file`.
fn collect_domains(args: &Args) -> Result<Vec<String>, DomainIntelError> {
    let mut domains: Vec<String> = args
        .domains
        .iter()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect();

    if let Some(path) = &args.file {
        domains.extend(read_domains_from_file(path)?);
    }

    if domains.is_empty() {
        return Err(DomainIntelError::config("No domains to look up"));
    }
    Ok(domains)
}

/// Read domain names from a file, one per line.
///
/// Empty lines and `#` comments (whole-line or inline) are ignored.
fn read_domains_from_file(file_path: &str) -> Result<Vec<String>, DomainIntelError> {
    let content = std::fs::read_to_string(file_path)
        .map_err(|e| DomainIntelError::file_error(file_path, e.to_string()))?;

    let domains: Vec<String> = content
        .lines()
        .filter_map(|line| line.split('#').next())
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    if domains.is_empty() {
        return Err(DomainIntelError::file_error(
            file_path,
            "No domains found in the file",
        ));
    }

    Ok(domains)
}

type LookupResults = [(String, Result<LookupOutcome, DomainIntelError>)];

fn display_json_results(results: &LookupResults) -> Result<(), serde_json::Error> {
    let entries: Vec<serde_json::Value> = results
        .iter()
        .map(|(domain, result)| match result {
            Ok(outcome) => serde_json::to_value(outcome),
            Err(e) => Ok(serde_json::json!({
                "domain": domain,
                "error": e.user_message(),
                "status": e.http_status(),
            })),
        })
        .collect::<Result<_, _>>()?;

    let output = match entries.as_slice() {
        [single] => serde_json::to_string_pretty(single)?,
        _ => serde_json::to_string_pretty(&entries)?,
    };
    println!("{}", output);
    Ok(())
}

fn display_text_results(results: &LookupResults, debug: bool) {
    for (index, (domain, result)) in results.iter().enumerate() {
        if index > 0 {
            println!();
        }
        match result {
            Ok(outcome) => ui::print_outcome(outcome, debug),
            Err(e) => ui::print_error(domain, e, debug),
        }
    }

    if results.len() > 1 {
        let outcomes: Vec<&LookupOutcome> =
            results.iter().filter_map(|(_, r)| r.as_ref().ok()).collect();
        println!();
        ui::print_summary(&outcomes, results.len() - outcomes.len());
    }
}

/// 0 when every lookup succeeded, 2 when the only failures were "not found",
/// 1 otherwise.
fn exit_code(results: &LookupResults) -> i32 {
    let mut code = 0;
    for (_, result) in results {
        match result {
            Ok(_) => {}
            Err(DomainIntelError::NotFound { .. }) => code = code.max(EXIT_NOT_FOUND),
            Err(_) => return EXIT_ERROR,
        }
    }
    code
}
