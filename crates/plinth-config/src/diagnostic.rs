// SPDX-FileCopyrightText: 2026 Plinth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge with fuzzy match suggestions.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use plinth_core::PlinthError;
use thiserror::Error;

/// Minimum Jaro-Winkler similarity score to suggest a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with rich diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// An unknown key was found in the configuration.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(plinth::config::unknown_key),
        help("{}", format_unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A configuration value has the wrong type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(plinth::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A required configuration key is missing.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(plinth::config::missing_key),
        help("add `{key}` to your plinth.toml or plinthconfiguration.json")
    )]
    MissingKey { key: String },

    /// A semantic validation failure.
    #[error("validation error: {message}")]
    #[diagnostic(code(plinth::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(plinth::config::other))]
    Other(String),
}

impl From<ConfigError> for PlinthError {
    fn from(err: ConfigError) -> Self {
        PlinthError::Config(err.to_string())
    }
}

fn format_unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert a `figment::Error` into a list of `ConfigError` diagnostics.
///
/// A figment error may carry several underlying errors; each becomes one
/// diagnostic, with "did you mean" suggestions for unknown fields.
pub fn figment_to_config_errors(
    err: figment::Error,
    sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    let mut errors = Vec::new();

    for error in err {
        let config_error = match &error.kind {
            Kind::UnknownField(field, expected) => {
                let valid_keys: Vec<&str> = expected.to_vec();
                let suggestion = suggest_key(field, &valid_keys);
                let (span, src) = find_source_span(&error, field, sources);

                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion,
                    valid_keys: valid_keys.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.clone().into_owned(),
            },
            Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                key: error.path.join("."),
                detail: format!("found {actual}, expected {expected}"),
                expected: expected.to_string(),
                span: None,
                src: None,
            },
            _ => ConfigError::Other(format!("{error}")),
        };

        errors.push(config_error);
    }

    errors
}

fn find_source_span(
    error: &figment::error::Error,
    field: &str,
    sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let source_path = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    // Inline documents carry no file metadata; fall back to the single
    // source when only one was supplied.
    let source = match source_path {
        Some(path) => sources
            .iter()
            .find(|(p, _)| *p == path)
            .map(|(p, content)| (p.as_str(), content.as_str())),
        None if sources.len() == 1 => sources
            .first()
            .map(|(p, content)| (p.as_str(), content.as_str())),
        None => None,
    };

    if let Some((path, content)) = source {
        if let Some(offset) = find_key_offset(content, &error.path, field) {
            let span = SourceSpan::new(offset.into(), field.len());
            let named = NamedSource::new(path, content.to_string());
            return (Some(span), Some(named));
        }
    }

    (None, None)
}

/// Find the byte offset of a key in TOML or JSON content, relative to a
/// section path.
///
/// For `path = ["storage", "plugins"]` and `field = "s3"`, searches after
/// the first occurrence of the outermost section. Top-level fields are
/// searched from the start.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let search_start = match path.first() {
        None => 0,
        Some(section) => {
            let toml_header = format!("[{section}");
            let json_key = format!("\"{section}\"");
            content
                .find(&toml_header)
                .map(|pos| pos + toml_header.len())
                .or_else(|| content.find(&json_key).map(|pos| pos + json_key.len()))?
        }
    };

    let remaining = &content[search_start..];

    let mut byte_offset = 0;
    for line in remaining.lines() {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();
        if let Some(after) = trimmed.strip_prefix(field)
            && (after.starts_with(' ') || after.starts_with('=') || after.starts_with('\t'))
        {
            return Some(search_start + byte_offset + indent);
        }
        if let Some(after) = trimmed.strip_prefix('"').and_then(|t| t.strip_prefix(field))
            && after.starts_with('"')
        {
            return Some(search_start + byte_offset + indent + 1);
        }
        byte_offset += line.len() + 1;
    }

    None
}

/// Suggest a similar key name using Jaro-Winkler string similarity.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    let mut best_score = SUGGESTION_THRESHOLD;
    let mut best_match = None;

    for &key in valid_keys {
        let score = strsim::jaro_winkler(unknown, key);
        if score > best_score {
            best_score = score;
            best_match = Some(key.to_string());
        }
    }

    best_match
}

/// Render a list of `ConfigError`s to a string using miette's graphical handler.
pub fn render_to_string(errors: &[ConfigError]) -> String {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    let mut out = String::new();
    for error in errors {
        let mut buf = String::new();
        let diagnostic: &dyn Diagnostic = error;
        if handler.render_report(&mut buf, diagnostic).is_ok() {
            out.push_str(&buf);
        } else {
            out.push_str(&format!("Error: {error}\n"));
        }
    }
    out
}

/// Render a list of `ConfigError`s to stderr.
pub fn render_errors(errors: &[ConfigError]) {
    eprint!("{}", render_to_string(errors));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggest_storge_for_storage() {
        let valid = &["environment", "analytics", "api", "auth", "hub", "logging", "storage"];
        assert_eq!(suggest_key("storge", valid), Some("storage".to_string()));
    }

    #[test]
    fn suggest_plugin_for_plugins() {
        assert_eq!(suggest_key("plugin", &["plugins"]), Some("plugins".to_string()));
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        let valid = &["environment", "storage", "logging"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn find_key_offset_in_toml_section() {
        let content = "[storage]\nplugin = {}\n";
        let path = vec!["storage".to_string()];
        let o = find_key_offset(content, &path, "plugin").unwrap();
        assert_eq!(&content[o..o + 6], "plugin");
    }

    #[test]
    fn find_key_offset_in_json_object() {
        let content = "{\n  \"storage\": {\n    \"plugin\": {}\n  }\n}\n";
        let path = vec!["storage".to_string()];
        let o = find_key_offset(content, &path, "plugin").unwrap();
        assert_eq!(&content[o..o + 6], "plugin");
    }

    #[test]
    fn top_level_key_found_from_start() {
        let content = "environmnt = \"x\"\n";
        assert_eq!(find_key_offset(content, &[], "environmnt"), Some(0));
    }

    #[test]
    fn config_error_converts_to_plinth_error() {
        let err: PlinthError = ConfigError::Validation {
            message: "environment must not be empty".into(),
        }
        .into();
        assert!(matches!(err, PlinthError::Config(m) if m.contains("environment")));
    }

    #[test]
    fn rendered_report_carries_help() {
        let rendered = render_to_string(&[ConfigError::UnknownKey {
            key: "storge".into(),
            suggestion: Some("storage".into()),
            valid_keys: "storage".into(),
            span: None,
            src: None,
        }]);
        assert!(rendered.contains("storge"));
        assert!(rendered.contains("did you mean"));
    }
}
