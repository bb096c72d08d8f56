// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Civic Connect backend.
//!
//! TOML files in an XDG hierarchy, `CIVIC_` environment overrides, strict
//! unknown-key rejection, and miette diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use civic_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("listening on {}:{}", config.server.host, config.server.port);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::CivicConfig;
pub use validation::validate_credentials;

/// Load configuration from the standard hierarchy and validate it.
///
/// Figment errors are converted to diagnostics carrying source spans from
/// whichever TOML files exist.
pub fn load_and_validate() -> Result<CivicConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let toml_sources = collect_toml_sources();
            Err(diagnostic::figment_to_config_errors(err, &toml_sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<CivicConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = [diagnostic::ConfigSource::inline(toml_content)];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Read every existing config file so diagnostics can point into it.
fn collect_toml_sources() -> Vec<diagnostic::ConfigSource> {
    let mut candidates = vec![std::path::PathBuf::from(loader::LOCAL_CONFIG_PATH)];
    if let Some(user) = loader::user_config_path() {
        candidates.push(user);
    }
    candidates.push(std::path::PathBuf::from(loader::SYSTEM_CONFIG_PATH));

    candidates
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            let display = if path.is_relative() {
                std::env::current_dir()
                    .map(|d| d.join(&path).display().to_string())
                    .unwrap_or_else(|_| path.display().to_string())
            } else {
                path.display().to_string()
            };
            Some(diagnostic::ConfigSource::new(display, content))
        })
        .collect()
}
