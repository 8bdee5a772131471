//! Configuration types for the DNS update system
//!
//! The configuration is a JSON file parsed once at startup. Each component
//! receives only the slice it needs: the provider its [`ProviderSettings`],
//! the mailer the [`SmtpConfig`], the driver a [`crate::driver::DriverConfig`].

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::driver::DriverConfig;
use crate::error::{Error, Result};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Log file used when the configuration does not name one
pub const DEFAULT_LOG_FILE: &str = "hetzner-dns-update.log";

/// Hetzner DNS API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://dns.hetzner.com/api/v1";

/// IPv4-only echo service
pub const DEFAULT_IPV4_SERVICE: &str = "https://api.ipify.org";

/// IPv6-only echo service
pub const DEFAULT_IPV6_SERVICE: &str = "https://api6.ipify.org";

/// Environment variables consulted, in order, for the configuration directory
pub const CONFIG_DIR_VARS: [&str; 2] = ["SNAP_USER_COMMON", "CONFIG_DIR"];

/// Main configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// DNS provider API token
    /// ⚠️ NEVER log this value
    pub api_token: String,

    /// Fully-qualified domain names to keep pointed at this host
    pub records: Vec<String>,

    /// TTL for created and updated records (seconds)
    pub ttl: u32,

    /// SMTP relay for operator notifications (omit to only log)
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,

    /// Append-only log file
    #[serde(default)]
    pub logfile: Option<String>,

    /// Public IP echo services
    #[serde(default)]
    pub ip_services: IpServicesConfig,

    /// Provider API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Exit non-zero when any domain or record family failed
    #[serde(default)]
    pub fail_on_domain_error: bool,
}

impl AppConfig {
    /// Parse a configuration from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&data)
            .map_err(|e| Error::config(format!("cannot parse {}: {}", path.display(), e)))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_token.trim().is_empty() {
            return Err(Error::config("api_token cannot be empty"));
        }

        if self.records.is_empty() {
            return Err(Error::config("No records configured"));
        }

        if self.ttl == 0 {
            return Err(Error::config("ttl must be > 0"));
        }

        if self.api_base_url.is_empty() {
            return Err(Error::config("api_base_url cannot be empty"));
        }

        self.ip_services.validate()?;

        if let Some(smtp) = &self.smtp {
            smtp.validate()?;
        }

        Ok(())
    }

    /// Settings handed to the provider client
    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            api_token: self.api_token.clone(),
            base_url: self.api_base_url.clone(),
        }
    }

    /// Settings handed to the driver
    ///
    /// # Parameters
    ///
    /// - `apply_changes`: `false` selects dry-run mode
    pub fn driver_config(&self, apply_changes: bool) -> DriverConfig {
        DriverConfig {
            records: self.records.clone(),
            ttl: self.ttl,
            apply_changes,
            ..DriverConfig::default()
        }
    }

    /// Path of the append-only log file
    pub fn log_path(&self) -> PathBuf {
        match self.logfile.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

// Custom Debug implementation that hides the API token
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_token", &"<REDACTED>")
            .field("records", &self.records)
            .field("ttl", &self.ttl)
            .field("smtp", &self.smtp)
            .field("logfile", &self.logfile)
            .field("ip_services", &self.ip_services)
            .field("api_base_url", &self.api_base_url)
            .field("fail_on_domain_error", &self.fail_on_domain_error)
            .finish()
    }
}

/// Locate the configuration file
///
/// The directory is taken from the first set variable in
/// [`CONFIG_DIR_VARS`], falling back to `cwd`.
///
/// # Parameters
///
/// - `filename`: File name inside the configuration directory
/// - `cwd`: Fallback directory
/// - `lookup`: Environment accessor (e.g. `|k| std::env::var(k).ok()`)
pub fn locate_config_file(
    filename: &str,
    cwd: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> PathBuf {
    let dir = CONFIG_DIR_VARS
        .iter()
        .filter_map(|var| lookup(var))
        .find(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| cwd.to_path_buf());
    dir.join(filename)
}

/// Provider client settings
#[derive(Clone)]
pub struct ProviderSettings {
    pub api_token: String,
    pub base_url: String,
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Public IP echo service URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpServicesConfig {
    /// Service answering with the caller's IPv4 address
    #[serde(default = "default_ipv4_service")]
    pub v4_url: String,

    /// Service answering with the caller's IPv6 address
    #[serde(default = "default_ipv6_service")]
    pub v6_url: String,
}

impl IpServicesConfig {
    /// Validate the service URLs
    pub fn validate(&self) -> Result<()> {
        for url in [&self.v4_url, &self.v6_url] {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(Error::config(format!(
                    "IP service URL must use HTTP or HTTPS scheme. Got: {url}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for IpServicesConfig {
    fn default() -> Self {
        Self {
            v4_url: default_ipv4_service(),
            v6_url: default_ipv6_service(),
        }
    }
}

/// SMTP relay settings
#[derive(Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// SMTP server host name
    pub server: String,

    /// SMTP submission port, as a number or numeric string
    #[serde(default = "default_smtp_port", deserialize_with = "deserialize_port")]
    pub port: u16,

    /// Login user, also the default sender
    pub user: String,

    /// Login password
    /// ⚠️ NEVER log this value
    pub password: String,

    /// Operator address receiving notifications
    pub recipient: String,

    /// Sender address, defaults to `user`
    #[serde(default)]
    pub sender: Option<String>,
}

impl SmtpConfig {
    /// Address used in the `From` header
    pub fn sender(&self) -> &str {
        self.sender.as_deref().unwrap_or(&self.user)
    }

    /// Validate the SMTP settings
    pub fn validate(&self) -> Result<()> {
        if self.server.is_empty() {
            return Err(Error::config("smtp.server cannot be empty"));
        }
        if self.recipient.is_empty() {
            return Err(Error::config("smtp.recipient cannot be empty"));
        }
        if self.sender().is_empty() {
            return Err(Error::config("smtp.user or smtp.sender must be set"));
        }
        if self.port == 0 {
            return Err(Error::config("smtp.port must be > 0"));
        }
        Ok(())
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<REDACTED>")
            .field("recipient", &self.recipient)
            .field("sender", &self.sender)
            .finish()
    }
}

/// Validate that a string is a valid domain name
///
/// Applied by the driver to each configured domain before any provider
/// call, so one malformed entry only skips that domain.
///
/// Basic RFC 1035 checks: total length, label length, characters, hyphen
/// placement, and at least two labels (a label inside some zone).
pub fn validate_domain_name(domain: &str) -> Result<()> {
    let name = domain.strip_suffix('.').unwrap_or(domain);

    if name.is_empty() {
        return Err(Error::config("Domain name cannot be empty"));
    }

    if name.len() > 253 {
        return Err(Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            name.len(),
            domain
        )));
    }

    if !name.contains('.') {
        return Err(Error::config(format!(
            "Domain name needs a label and a zone: '{domain}'"
        )));
    }

    for label in name.split('.') {
        if label.is_empty() {
            return Err(Error::config(format!("Domain name has empty label: '{domain}'")));
        }

        if label.len() > 63 {
            return Err(Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(Error::config(format!(
                "Domain label contains invalid characters. Label: '{label}'"
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{label}'"
            )));
        }
    }

    Ok(())
}

fn deserialize_port<'de, D>(deserializer: D) -> std::result::Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_ipv4_service() -> String {
    DEFAULT_IPV4_SERVICE.to_string()
}

fn default_ipv6_service() -> String {
    DEFAULT_IPV6_SERVICE.to_string()
}

fn default_smtp_port() -> u16 {
    587
}
