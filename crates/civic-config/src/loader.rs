// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `./civic.toml` > `~/.config/civic/civic.toml` > `/etc/civic/civic.toml`,
//! with `CIVIC_` environment variables overriding all files.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::CivicConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/civic/civic.toml";

/// Config file in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "civic.toml";

/// Config file in the user's XDG config directory, if one exists.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("civic/civic.toml"))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/civic/civic.toml`
/// 3. `~/.config/civic/civic.toml`
/// 4. `./civic.toml`
/// 5. `CIVIC_*` environment variables
pub fn load_config() -> Result<CivicConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<CivicConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CivicConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CivicConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CivicConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment used by [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(CivicConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Sections that `CIVIC_<SECTION>_<KEY>` variables can address.
const ENV_SECTIONS: [&str; 4] = ["server", "storage", "identity", "payment"];

/// Environment provider mapping `CIVIC_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")`: keys such as
/// `secret_key` contain underscores themselves.
fn env_provider() -> Env {
    Env::prefixed("CIVIC_").map(|key| env_key_path(key.as_str()).into())
}

/// Figment hands the key to `map` before lowercasing it.
fn env_key_path(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    ENV_SECTIONS
        .iter()
        .find_map(|section| {
            key.strip_prefix(section)
                .and_then(|rest| rest.strip_prefix('_'))
                .map(|field| format!("{section}.{field}"))
        })
        .unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_overrides_defaults() {
        let config = load_config_from_str(
            r#"
[server]
port = 8080

[payment]
currency = "bdt"
boost_amount = 250
"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.payment.currency, "bdt");
        assert_eq!(config.payment.boost_amount, 250);
        assert_eq!(config.payment.subscription_amount, 1000);
    }

    #[test]
    fn env_vars_map_to_sections() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("CIVIC_PAYMENT_SECRET_KEY", "sk_test_env");
            jail.set_env("CIVIC_SERVER_PORT", "4100");
            jail.create_file("civic.toml", "[identity]\napi_key = \"from-file\"\n")?;

            let config = load_config_from_path(Path::new("civic.toml"))?;
            assert_eq!(config.payment.secret_key.as_deref(), Some("sk_test_env"));
            assert_eq!(config.server.port, 4100);
            assert_eq!(config.identity.api_key.as_deref(), Some("from-file"));
            Ok(())
        });
    }

    #[test]
    fn env_keys_map_case_insensitively() {
        assert_eq!(env_key_path("PAYMENT_SECRET_KEY"), "payment.secret_key");
        assert_eq!(env_key_path("STORAGE_DATABASE_PATH"), "storage.database_path");
        assert_eq!(env_key_path("identity_base_url"), "identity.base_url");
        assert_eq!(env_key_path("SERVER_LOG_LEVEL"), "server.log_level");
        assert_eq!(env_key_path("PAYMENTS"), "payments");
    }

    #[test]
    fn env_overrides_survive_validation() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("CIVIC_PAYMENT_SECRET_KEY", "sk_live_env");
            jail.set_env("CIVIC_IDENTITY_API_KEY", "AIza-env");
            jail.set_env("CIVIC_STORAGE_DATABASE_PATH", "/var/lib/civic/env.db");
            jail.create_file("civic.toml", "[payment]\ncurrency = \"bdt\"\n")?;

            let config = load_config_from_path(Path::new("civic.toml"))?;
            assert!(crate::validation::validate_config(&config).is_ok());
            assert!(crate::validation::validate_credentials(&config).is_ok());
            assert_eq!(config.storage.database_path, "/var/lib/civic/env.db");
            assert_eq!(config.payment.currency, "bdt");
            Ok(())
        });
    }
}
