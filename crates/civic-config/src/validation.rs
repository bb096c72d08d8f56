// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express: non-empty addresses and
//! paths, positive prices, and well-formed redirect origins.

use crate::diagnostic::ConfigError;
use crate::model::CivicConfig;

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &CivicConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.payment.subscription_amount <= 0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "payment.subscription_amount must be positive, got {}",
                config.payment.subscription_amount
            ),
        });
    }

    if config.payment.boost_amount <= 0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "payment.boost_amount must be positive, got {}",
                config.payment.boost_amount
            ),
        });
    }

    let currency = &config.payment.currency;
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_lowercase()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "payment.currency `{currency}` must be a lowercase three-letter ISO 4217 code"
            ),
        });
    }

    for (key, url) in [
        ("payment.site_domain", &config.payment.site_domain),
        ("payment.base_url", &config.payment.base_url),
        ("identity.base_url", &config.identity.base_url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(ConfigError::Validation {
                message: format!("{key} `{url}` must start with http:// or https://"),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check that the external-service credentials needed by `serve` are present.
///
/// Kept apart from [`validate_config`] so that config checks and tests run
/// without secrets.
pub fn validate_credentials(config: &CivicConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.identity.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
        errors.push(ConfigError::MissingKey {
            key: "identity.api_key".to_string(),
        });
    }

    if config.payment.secret_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
        errors.push(ConfigError::MissingKey {
            key: "payment.secret_key".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
