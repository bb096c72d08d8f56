// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Civic Connect backend.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key fails
//! startup instead of silently falling back to a default.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
///
/// Every section is optional and defaults to values suitable for local
/// development. Credentials have no defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CivicConfig {
    /// HTTP listener and logging settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Identity provider settings.
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Payment gateway settings.
    #[serde(default)]
    pub payment: PaymentConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("civic").join("civic.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("civic.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Identity provider (Firebase Identity Toolkit) configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    /// Web API key of the identity project. `None` fails startup of `serve`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the Identity Toolkit REST API.
    #[serde(default = "default_identity_base_url")]
    pub base_url: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_identity_base_url(),
        }
    }
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn default_identity_base_url() -> String {
    "https://identitytoolkit.googleapis.com/v1".to_string()
}

/// Payment gateway (Stripe Checkout) configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentConfig {
    /// Secret API key. `None` fails startup of `serve`.
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Base URL of the gateway REST API.
    #[serde(default = "default_payment_base_url")]
    pub base_url: String,

    /// Public origin of the web client; checkout redirects land here.
    #[serde(default = "default_site_domain")]
    pub site_domain: String,

    /// ISO 4217 currency code, lowercase.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Price of a premium subscription, in major currency units.
    #[serde(default = "default_subscription_amount")]
    pub subscription_amount: i64,

    /// Price of boosting one issue, in major currency units.
    #[serde(default = "default_boost_amount")]
    pub boost_amount: i64,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            base_url: default_payment_base_url(),
            site_domain: default_site_domain(),
            currency: default_currency(),
            subscription_amount: default_subscription_amount(),
            boost_amount: default_boost_amount(),
        }
    }
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[redacted]"))
            .field("base_url", &self.base_url)
            .field("site_domain", &self.site_domain)
            .field("currency", &self.currency)
            .field("subscription_amount", &self.subscription_amount)
            .field("boost_amount", &self.boost_amount)
            .finish()
    }
}

fn default_payment_base_url() -> String {
    "https://api.stripe.com/v1".to_string()
}

fn default_site_domain() -> String {
    "http://localhost:5173".to_string()
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_subscription_amount() -> i64 {
    1000
}

fn default_boost_amount() -> i64 {
    100
}
