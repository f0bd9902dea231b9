//! # Server Configuration
//!
//! ## Load Order (later overrides earlier)
//! 1. Default values
//! 2. Config file (`KASIR_CONFIG`, or `kasir.toml` in the working directory)
//! 3. Environment variables (`KASIR_*`)
//!
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0:8080"
//!
//! [database]
//! path = "/var/lib/kasir/kasir.db"
//! max_connections = 5
//! busy_timeout_secs = 30    # must exceed gateway.timeout_secs
//!
//! [store]
//! currency = "IDR"
//! discount_percent = 0.0
//! tax_percent = 11.0
//! invoice_template = "INV/{YYYY}{MM}{DD}/{SEQ}"
//! sequence_reset = "daily"
//!
//! [gateway]
//! base_url = "https://app.sandbox.midtrans.com"
//! server_key = "SB-Mid-server-..."
//! webhook_secret = "..."
//! enabled_payments = ["qris"]
//! timeout_secs = 10
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use kasir_core::invoice::{DEFAULT_INVOICE_TEMPLATE, DEFAULT_SEQUENCE_WIDTH};
use kasir_core::{CoreError, SequenceReset, StoreSettings};
use kasir_db::DbConfig;
use kasir_gateway::SnapConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Configuration file used when `KASIR_CONFIG` is not set.
pub const DEFAULT_CONFIG_FILE: &str = "kasir.toml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    /// Store section rejected, e.g. an invoice template without `{SEQ}`.
    #[error("Invalid store settings: {0}")]
    Store(#[from] CoreError),
}

/// Server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub gateway: GatewaySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub bind_addr: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpSettings {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: PathBuf,
    pub max_connections: u32,
    /// How long a writer waits for SQLite's write lock. Wallet checkouts
    /// hold that lock across the gateway call.
    pub busy_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: 5,
            busy_timeout_secs: 30,
        }
    }
}

impl DatabaseSettings {
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.path.clone())
            .max_connections(self.max_connections)
            .busy_timeout(Duration::from_secs(self.busy_timeout_secs))
    }
}

/// `[store]` as written in the file; see [`ServerConfig::store_settings`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub currency: String,
    pub currency_decimals: u8,
    pub discount_percent: f64,
    pub tax_percent: f64,
    pub invoice_template: String,
    pub sequence_width: usize,
    pub sequence_reset: SequenceReset,
}

impl Default for StoreSection {
    fn default() -> Self {
        StoreSection {
            currency: "IDR".to_string(),
            currency_decimals: 0,
            discount_percent: 0.0,
            tax_percent: 0.0,
            invoice_template: DEFAULT_INVOICE_TEMPLATE.to_string(),
            sequence_width: DEFAULT_SEQUENCE_WIDTH,
            sequence_reset: SequenceReset::Daily,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    pub base_url: String,
    pub server_key: String,
    /// HMAC key for callback signatures.
    pub webhook_secret: String,
    pub timeout_secs: u64,
    /// Header carrying the callback signature.
    pub signature_header: String,
    pub enabled_payments: Vec<String>,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        GatewaySettings {
            base_url: "https://app.sandbox.midtrans.com".to_string(),
            server_key: String::new(),
            webhook_secret: String::new(),
            timeout_secs: 10,
            signature_header: "x-callback-signature".to_string(),
            enabled_payments: vec!["qris".to_string()],
        }
    }
}

impl GatewaySettings {
    pub fn snap_config(&self) -> SnapConfig {
        SnapConfig {
            base_url: self.base_url.clone(),
            server_key: self.server_key.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            enabled_payments: self.enabled_payments.clone(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// A missing file is not an error; an unreadable or invalid one is.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = config_path
            .or_else(|| std::env::var_os("KASIR_CONFIG").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.check_timeouts()?;
        config.store_settings()?;

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Applies `KASIR_*` overrides read through `lookup`.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(addr) = lookup("KASIR_BIND_ADDR") {
            self.server.bind_addr = addr;
        }

        if let Some(path) = lookup("KASIR_DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(max) = lookup("KASIR_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse("KASIR_DATABASE_MAX_CONNECTIONS", &max)?;
        }
        if let Some(secs) = lookup("KASIR_DATABASE_BUSY_TIMEOUT_SECS") {
            self.database.busy_timeout_secs = parse("KASIR_DATABASE_BUSY_TIMEOUT_SECS", &secs)?;
        }

        if let Some(currency) = lookup("KASIR_CURRENCY") {
            self.store.currency = currency;
        }
        if let Some(decimals) = lookup("KASIR_CURRENCY_DECIMALS") {
            self.store.currency_decimals = parse("KASIR_CURRENCY_DECIMALS", &decimals)?;
        }
        if let Some(pct) = lookup("KASIR_DISCOUNT_PERCENT") {
            self.store.discount_percent = parse("KASIR_DISCOUNT_PERCENT", &pct)?;
        }
        if let Some(pct) = lookup("KASIR_TAX_PERCENT") {
            self.store.tax_percent = parse("KASIR_TAX_PERCENT", &pct)?;
        }
        if let Some(template) = lookup("KASIR_INVOICE_TEMPLATE") {
            self.store.invoice_template = template;
        }
        if let Some(width) = lookup("KASIR_SEQUENCE_WIDTH") {
            self.store.sequence_width = parse("KASIR_SEQUENCE_WIDTH", &width)?;
        }
        if let Some(reset) = lookup("KASIR_SEQUENCE_RESET") {
            self.store.sequence_reset = match reset.to_lowercase().as_str() {
                "daily" => SequenceReset::Daily,
                "never" => SequenceReset::Never,
                _ => return Err(ConfigError::InvalidValue("KASIR_SEQUENCE_RESET".to_string())),
            };
        }

        if let Some(url) = lookup("KASIR_GATEWAY_BASE_URL") {
            self.gateway.base_url = url;
        }
        if let Some(key) = lookup("KASIR_GATEWAY_SERVER_KEY") {
            self.gateway.server_key = key;
        }
        if let Some(secret) = lookup("KASIR_WEBHOOK_SECRET") {
            self.gateway.webhook_secret = secret;
        }
        if let Some(secs) = lookup("KASIR_GATEWAY_TIMEOUT_SECS") {
            self.gateway.timeout_secs = parse("KASIR_GATEWAY_TIMEOUT_SECS", &secs)?;
        }

        Ok(())
    }

    /// A gateway call must give up before writers queued behind the open
    /// checkout transaction stop waiting for the lock.
    fn check_timeouts(&self) -> Result<(), ConfigError> {
        let gateway = self.gateway.timeout_secs;
        if gateway == 0 {
            return Err(ConfigError::InvalidValue("gateway.timeout_secs".to_string()));
        }
        if gateway >= self.database.busy_timeout_secs {
            return Err(ConfigError::InvalidValue(format!(
                "gateway.timeout_secs ({}s) must be below database.busy_timeout_secs ({}s)",
                gateway, self.database.busy_timeout_secs
            )));
        }
        Ok(())
    }

    /// The value object handed to every engine operation.
    pub fn store_settings(&self) -> Result<StoreSettings, ConfigError> {
        let store = &self.store;
        Ok(StoreSettings::new(
            store.currency.as_str(),
            store.currency_decimals,
            store.discount_percent,
            store.tax_percent,
            &store.invoice_template,
            store.sequence_width,
            store.sequence_reset,
        )?)
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("id", "kasir", "kasir")
        .map(|dirs| dirs.data_dir().join("kasir.db"))
        .unwrap_or_else(|| PathBuf::from("kasir.db"))
}
