//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and `DI_*`
//! environment variables, merging them with proper precedence rules, and
//! applying the result to a [`LookupConfig`].

use crate::error::DomainIntelError;
use crate::protocols::registry::RdapEndpoint;
use crate::risk::RiskPolicy;
use crate::types::LookupConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// WhoisXML API settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois: Option<WhoisConfig>,

    /// RDAP prober settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rdap: Option<RdapConfig>,

    /// DNS probe settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns: Option<DnsConfig>,

    /// Scoring lists and weights; replaces the built-in policy as a whole
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskPolicy>,

    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WhoisConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Request timeout (as string, e.g., "20s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RdapConfig {
    /// Per-endpoint timeout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Fixed pause after a failed endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoff_ms: Option<u64>,

    /// Upper bound of the random extra pause
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter_ms: Option<u64>,

    /// Replaces the built-in endpoint table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<Vec<RdapEndpoint>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DnsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Bound on the whole cascade for one domain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup_timeout: Option<String>,

    /// Default concurrency level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Default JSON output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

impl FileConfig {
    /// Apply every value set in this file on top of `config`.
    pub fn apply_to(&self, mut config: LookupConfig) -> Result<LookupConfig, DomainIntelError> {
        if let Some(whois) = &self.whois {
            if let Some(key) = &whois.api_key {
                config.whois_api_key = Some(key.clone());
            }
            if let Some(url) = &whois.base_url {
                config.whois_api_url = url.clone();
            }
            if let Some(timeout) = &whois.timeout {
                config.whois_timeout = parse_duration("whois.timeout", timeout)?;
            }
        }

        if let Some(rdap) = &self.rdap {
            if let Some(timeout) = &rdap.timeout {
                config.rdap_timeout = parse_duration("rdap.timeout", timeout)?;
            }
            let mut backoff = config.rdap_backoff;
            if let Some(ms) = rdap.backoff_ms {
                backoff.delay = Duration::from_millis(ms);
            }
            if let Some(ms) = rdap.jitter_ms {
                backoff.jitter = Duration::from_millis(ms);
            }
            config.rdap_backoff = backoff;
            if let Some(endpoints) = &rdap.endpoints {
                config.rdap_endpoints = endpoints.clone();
            }
        }

        if let Some(timeout) = self.dns.as_ref().and_then(|d| d.timeout.as_ref()) {
            config.dns_timeout = parse_duration("dns.timeout", timeout)?;
        }

        if let Some(policy) = &self.risk {
            config.risk_policy = policy.clone();
        }

        if let Some(defaults) = &self.defaults {
            if let Some(timeout) = &defaults.lookup_timeout {
                config.lookup_timeout = parse_duration("defaults.lookup_timeout", timeout)?;
            }
            if let Some(concurrency) = defaults.concurrency {
                config = config.with_concurrency(concurrency);
            }
        }

        Ok(config)
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to log which files were loaded
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The parsed configuration or an error if parsing fails.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, DomainIntelError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DomainIntelError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DomainIntelError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            DomainIntelError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;

        debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config, then `~/.domain-intel.toml`, then `./domain-intel.toml`;
    /// later files win. Files that fail to load are skipped with a warning.
    pub fn discover_and_load(&self) -> Result<FileConfig, DomainIntelError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "ignoring configuration file"),
            }
        }

        if self.verbose && loaded_files.len() > 1 {
            info!(
                files = ?loaded_files,
                "multiple config files found, later files take precedence"
            );
        }

        Ok(merged_config)
    }

    /// Get the local configuration file path.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./domain-intel.toml", "./.domain-intel.toml"]
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Get the global configuration file path.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".domain-intel.toml", "domain-intel.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Get the XDG configuration file path.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("domain-intel").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations with proper precedence.
    ///
    /// Values from `higher` take precedence over values from `lower`. The
    /// `[risk]` section and the RDAP endpoint list are replaced whole.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            whois: match (lower.whois, higher.whois) {
                (Some(lower), Some(higher)) => Some(WhoisConfig {
                    api_key: higher.api_key.or(lower.api_key),
                    base_url: higher.base_url.or(lower.base_url),
                    timeout: higher.timeout.or(lower.timeout),
                }),
                (lower, higher) => higher.or(lower),
            },
            rdap: match (lower.rdap, higher.rdap) {
                (Some(lower), Some(higher)) => Some(RdapConfig {
                    timeout: higher.timeout.or(lower.timeout),
                    backoff_ms: higher.backoff_ms.or(lower.backoff_ms),
                    jitter_ms: higher.jitter_ms.or(lower.jitter_ms),
                    endpoints: higher.endpoints.or(lower.endpoints),
                }),
                (lower, higher) => higher.or(lower),
            },
            dns: match (lower.dns, higher.dns) {
                (Some(lower), Some(higher)) => Some(DnsConfig {
                    timeout: higher.timeout.or(lower.timeout),
                }),
                (lower, higher) => higher.or(lower),
            },
            risk: higher.risk.or(lower.risk),
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower), Some(higher)) => Some(DefaultsConfig {
                    lookup_timeout: higher.lookup_timeout.or(lower.lookup_timeout),
                    concurrency: higher.concurrency.or(lower.concurrency),
                    json: higher.json.or(lower.json),
                }),
                (lower, higher) => higher.or(lower),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), DomainIntelError> {
        let timeouts = [
            ("whois.timeout", config.whois.as_ref().and_then(|w| w.timeout.as_ref())),
            ("rdap.timeout", config.rdap.as_ref().and_then(|r| r.timeout.as_ref())),
            ("dns.timeout", config.dns.as_ref().and_then(|d| d.timeout.as_ref())),
            (
                "defaults.lookup_timeout",
                config.defaults.as_ref().and_then(|d| d.lookup_timeout.as_ref()),
            ),
        ];
        for (field, value) in timeouts {
            if let Some(value) = value {
                parse_duration(field, value)?;
            }
        }

        if let Some(concurrency) = config.defaults.as_ref().and_then(|d| d.concurrency) {
            if concurrency == 0 || concurrency > 50 {
                return Err(DomainIntelError::config(
                    "Concurrency must be between 1 and 50",
                ));
            }
        }

        if let Some(whois) = &config.whois {
            if whois.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
                return Err(DomainIntelError::config("whois.api_key cannot be empty"));
            }
            if let Some(url) = &whois.base_url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(DomainIntelError::config(format!(
                        "Invalid whois.base_url '{}': must be an http(s) URL",
                        url
                    )));
                }
            }
        }

        if let Some(endpoints) = config.rdap.as_ref().and_then(|r| r.endpoints.as_ref()) {
            if endpoints.is_empty() {
                return Err(DomainIntelError::config(
                    "rdap.endpoints cannot be empty",
                ));
            }
            for endpoint in endpoints {
                if endpoint.name.trim().is_empty() {
                    return Err(DomainIntelError::config("RDAP endpoint names cannot be empty"));
                }
                if !endpoint.url_template.contains("{domain}") {
                    return Err(DomainIntelError::config(format!(
                        "RDAP endpoint '{}' must contain a {{domain}} placeholder",
                        endpoint.name
                    )));
                }
                if endpoint.tlds.as_ref().is_some_and(|tlds| {
                    tlds.iter()
                        .any(|tld| tld.is_empty() || tld.contains('.') || tld.contains(' '))
                }) {
                    return Err(DomainIntelError::config(format!(
                        "Invalid TLD scope for RDAP endpoint '{}'",
                        endpoint.name
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via `DI_*`
/// environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub whois_api_key: Option<String>,
    pub lookup_timeout: Option<Duration>,
    pub rdap_timeout: Option<Duration>,
    pub concurrency: Option<usize>,
    pub json: Option<bool>,
    pub config: Option<String>,
}

impl EnvConfig {
    /// Apply every value set in the environment on top of `config`.
    pub fn apply_to(&self, mut config: LookupConfig) -> LookupConfig {
        if let Some(key) = &self.whois_api_key {
            config.whois_api_key = Some(key.clone());
        }
        if let Some(timeout) = self.lookup_timeout {
            config.lookup_timeout = timeout;
        }
        if let Some(timeout) = self.rdap_timeout {
            config.rdap_timeout = timeout;
        }
        if let Some(concurrency) = self.concurrency {
            config = config.with_concurrency(concurrency);
        }
        config
    }
}

/// Load configuration from environment variables.
///
/// Parses all `DI_*` environment variables (and the plain `WHOIS_API_KEY`)
/// and returns a structured configuration. Invalid values are logged as
/// warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    env_config_from(|name| env::var(name).ok())
}

/// Build an [`EnvConfig`] from any variable source.
pub(crate) fn env_config_from<F>(var: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    // DI_WHOIS_API_KEY wins over WHOIS_API_KEY
    env_config.whois_api_key = ["DI_WHOIS_API_KEY", "WHOIS_API_KEY"]
        .iter()
        .filter_map(|name| var(name))
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty());

    for (name, slot) in [
        ("DI_TIMEOUT", &mut env_config.lookup_timeout),
        ("DI_RDAP_TIMEOUT", &mut env_config.rdap_timeout),
    ] {
        if let Some(value) = var(name) {
            match parse_timeout_string(&value) {
                Some(secs) if secs > 0 => {
                    debug!(name, value = %value, "using environment override");
                    *slot = Some(Duration::from_secs(secs));
                }
                _ => warn!(
                    name,
                    value = %value,
                    "invalid timeout, use format like '5s', '30s', '2m'"
                ),
            }
        }
    }

    if let Some(value) = var("DI_CONCURRENCY") {
        match value.trim().parse::<usize>() {
            Ok(concurrency) if (1..=50).contains(&concurrency) => {
                env_config.concurrency = Some(concurrency);
            }
            _ => warn!(value = %value, "invalid DI_CONCURRENCY, must be 1-50"),
        }
    }

    if let Some(value) = var("DI_JSON") {
        match value.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => env_config.json = Some(true),
            "false" | "0" | "no" | "off" => env_config.json = Some(false),
            _ => warn!(value = %value, "invalid DI_JSON, use true/false"),
        }
    }

    if let Some(path) = var("DI_CONFIG") {
        if !path.trim().is_empty() {
            env_config.config = Some(path);
        }
    }

    env_config
}

/// Parse a timeout string like "5s", "30s", "2m" into seconds.
///
/// A bare number is taken as seconds.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        timeout_str.parse::<u64>().ok()
    }
}

/// Parse a non-zero timeout for `field`.
fn parse_duration(field: &str, value: &str) -> Result<Duration, DomainIntelError> {
    match parse_timeout_string(value) {
        Some(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(DomainIntelError::config(format!(
            "Invalid {} '{}'. Use format like '5s', '30s', '2m'",
            field, value
        ))),
    }
}
