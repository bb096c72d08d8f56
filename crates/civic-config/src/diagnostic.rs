// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config diagnostics.
//!
//! Figment failures become miette reports. Unknown keys and mistyped values
//! point back into the `civic.toml` table they came from, and unknown keys
//! carry a Jaro-Winkler "did you mean" suggestion.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Below this similarity no suggestion is offered.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Name given to TOML loaded from a string rather than a file.
pub const INLINE_SOURCE: &str = "<inline>";

/// A configuration problem, rendered by [`render_errors`].
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key or table the config model does not have.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(civic::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        /// Dotted path of the key, e.g. `payment.curency`.
        key: String,
        /// Closest valid name in the same table.
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not a civic setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid type for `{key}`: found {found}")]
    #[diagnostic(code(civic::config::invalid_type), help("`{key}` expects {expected}"))]
    InvalidType {
        key: String,
        found: String,
        expected: String,
        #[label("expected {expected}")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(civic::config::missing_key),
        help("set `{key}` in civic.toml or via {}", env_var_name(key))
    )]
    MissingKey { key: String },

    #[error("validation error: {message}")]
    #[diagnostic(code(civic::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(civic::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// `payment.secret_key` -> `CIVIC_PAYMENT_SECRET_KEY`.
pub fn env_var_name(key: &str) -> String {
    format!("CIVIC_{}", key.replace('.', "_").to_ascii_uppercase())
}

/// A TOML document that took part in loading, kept so errors can show it.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub name: String,
    pub content: String,
}

impl ConfigSource {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn inline(content: &str) -> Self {
        Self::new(INLINE_SOURCE, content)
    }

    /// Span of `field` inside the `[table]` named by `table`, or among the
    /// top-level keys and table headers when `table` is `None`.
    pub fn locate(&self, table: Option<&str>, field: &str) -> Option<SourceSpan> {
        let mut current: Option<&str> = None;
        let mut offset = 0;
        for line in self.content.split_inclusive('\n') {
            let indent = line.len() - line.trim_start().len();
            let trimmed = line.trim();
            if let Some(header) = trimmed.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
                let header = header.trim();
                if table.is_none() && header == field {
                    let at = offset + line.find(field).unwrap_or(indent);
                    return Some(SourceSpan::new(at.into(), field.len()));
                }
                current = Some(header);
            } else if current == table
                && let Some((name, _)) = trimmed.split_once('=')
                && name.trim_end() == field
            {
                return Some(SourceSpan::new((offset + indent).into(), field.len()));
            }
            offset += line.len();
        }
        None
    }

    fn named(&self) -> NamedSource<String> {
        NamedSource::new(&self.name, self.content.clone())
    }
}

/// Convert a figment error, which may hold several failures, into diagnostics.
///
/// `sources` are the TOML documents that were merged; failures that came from
/// one of them get a labelled span.
pub fn figment_to_config_errors(
    err: figment::Error,
    sources: &[ConfigSource],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| {
            let source = source_of(&error, sources);
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let mut table: Vec<String> = error.path.clone();
                    if table.last() == Some(field) {
                        table.pop();
                    }
                    let span = source
                        .and_then(|s| s.locate(table.first().map(String::as_str), field));
                    table.push(field.clone());
                    ConfigError::UnknownKey {
                        key: table.join("."),
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.join(", "),
                        src: span.and(source).map(ConfigSource::named),
                        span,
                    }
                }
                Kind::MissingField(field) => ConfigError::MissingKey {
                    key: qualified(&error.path, field),
                },
                Kind::InvalidType(actual, expected) => {
                    let span = match error.path.as_slice() {
                        [table, field] => {
                            source.and_then(|s| s.locate(Some(table.as_str()), field))
                        }
                        [field] => source.and_then(|s| s.locate(None, field)),
                        _ => None,
                    };
                    ConfigError::InvalidType {
                        key: error.path.join("."),
                        found: actual.to_string(),
                        expected: expected.clone(),
                        src: span.and(source).map(ConfigSource::named),
                        span,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn qualified(path: &[String], field: &str) -> String {
    match path.last() {
        Some(last) if last == field => path.join("."),
        _ if path.is_empty() => field.to_string(),
        _ => format!("{}.{field}", path.join(".")),
    }
}

/// The merged document a failure came from: a file matched by path, or the
/// inline source for string-loaded TOML. Environment values have none.
fn source_of<'a>(
    error: &figment::error::Error,
    sources: &'a [ConfigSource],
) -> Option<&'a ConfigSource> {
    let wanted = match error.metadata.as_ref()?.source.as_ref()? {
        figment::Source::File(path) => path.display().to_string(),
        figment::Source::Code(_) => INLINE_SOURCE.to_string(),
        _ => return None,
    };
    sources.iter().find(|s| s.name == wanted)
}

/// Best Jaro-Winkler match for `unknown` among `valid_keys`, if close enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Print every error to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        match handler.render_report(&mut buf, error) {
            Ok(()) => eprint!("{buf}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "port = 1\n\n[server]\nport = 3000\n\n[payment]\n  curency = \"usd\"\nport=2\n";

    #[test]
    fn suggests_currency_for_curency() {
        let valid = &["secret_key", "base_url", "site_domain", "currency"];
        assert_eq!(suggest_key("curency", valid), Some("currency".to_string()));
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn locate_stays_inside_the_named_table() {
        let source = ConfigSource::inline(SAMPLE);
        let span = source.locate(Some("payment"), "curency").unwrap();
        assert_eq!(&SAMPLE[span.offset()..span.offset() + 7], "curency");

        let server_port = source.locate(Some("server"), "port").unwrap();
        assert_eq!(server_port.offset(), SAMPLE.find("port = 3000").unwrap());

        let payment_port = source.locate(Some("payment"), "port").unwrap();
        assert_eq!(payment_port.offset(), SAMPLE.find("port=2").unwrap());

        assert_eq!(source.locate(None, "port").unwrap().offset(), 0);
        assert!(source.locate(Some("storage"), "port").is_none());
    }

    #[test]
    fn locate_finds_unknown_table_headers() {
        let content = "[server]\nport = 1\n\n[logging]\nlevel = \"debug\"\n";
        let span = ConfigSource::inline(content).locate(None, "logging").unwrap();
        assert_eq!(&content[span.offset()..span.offset() + 7], "logging");
    }

    #[test]
    fn env_var_names_follow_section_layout() {
        assert_eq!(env_var_name("payment.secret_key"), "CIVIC_PAYMENT_SECRET_KEY");
        assert_eq!(env_var_name("identity.api_key"), "CIVIC_IDENTITY_API_KEY");
    }

    #[test]
    fn unknown_field_carries_path_suggestion_and_span() {
        let toml = "[server]\nprot = 8080\n";
        let err = crate::loader::load_config_from_str(toml).unwrap_err();
        let errors = figment_to_config_errors(err, &[ConfigSource::inline(toml)]);
        let found = errors.iter().find_map(|e| match e {
            ConfigError::UnknownKey {
                key,
                suggestion,
                span,
                ..
            } => Some((key.clone(), suggestion.clone(), *span)),
            _ => None,
        });
        let (key, suggestion, span) = found.expect("unknown key diagnostic");
        assert_eq!(key, "server.prot");
        assert_eq!(suggestion.as_deref(), Some("port"));
        if let Some(span) = span {
            assert_eq!(&toml[span.offset()..span.offset() + 4], "prot");
        }
    }

    #[test]
    fn missing_key_help_names_the_env_var() {
        let error = ConfigError::MissingKey {
            key: "payment.secret_key".into(),
        };
        let help = error.help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("CIVIC_PAYMENT_SECRET_KEY"), "got: {help}");
    }
}
