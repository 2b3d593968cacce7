//! errors.rs - The validation error type for the `ghopt-core` library.
//!
//! Every validator returns `Result<Normalized, ValidationError>`, forcing each
//! call site to handle rejection explicitly. The error's `Display` output is
//! safe for terminals and issue bodies: it names the violated rule and the
//! input category, and never echoes a substring that could itself be a secret.
//!
//! License: MIT OR APACHE 2.0

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Discriminates which rule class a rejected input violated.
///
/// `#[non_exhaustive]` because new rule classes may be added; consumers should
/// treat unknown kinds as fatal rejections rather than matching exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ValidationErrorKind {
    /// The value does not match the category's format rule.
    InvalidFormat,
    /// The value exceeds the category's size cap.
    TooLong,
    /// The value matches a dangerous input pattern (injection, script, import).
    DangerousPattern,
    /// The URL scheme is not in the caller's allow-list.
    DisallowedScheme,
    /// The value contains a directory-traversal sequence.
    PathTraversal,
    /// The value contains a NUL byte or another control character.
    NullOrControlChar,
    /// A YAML document parsed, but its top level is not a mapping.
    NotAMapping,
    /// The value could not be parsed at all (malformed YAML or URL).
    ParseFailure,
}

impl ValidationErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "invalid format",
            Self::TooLong => "too long",
            Self::DangerousPattern => "dangerous pattern",
            Self::DisallowedScheme => "disallowed scheme",
            Self::PathTraversal => "path traversal",
            Self::NullOrControlChar => "null or control character",
            Self::NotAMapping => "not a mapping",
            Self::ParseFailure => "parse failure",
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The input category a validator was asked to check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum InputKind {
    Repository,
    FilePath,
    Filename,
    YamlDocument,
    Url,
    EnvName,
    EnvValue,
    BoundedString,
    GitRef,
    CommitSha,
    ShellArg,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Repository => "repository name",
            Self::FilePath => "file path",
            Self::Filename => "filename",
            Self::YamlDocument => "YAML document",
            Self::Url => "URL",
            Self::EnvName => "environment variable name",
            Self::EnvValue => "environment variable value",
            Self::BoundedString => "input",
            Self::GitRef => "git reference",
            Self::CommitSha => "commit SHA",
            Self::ShellArg => "shell argument",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rejected input.
///
/// Carries the rule class (`kind`), the category attempted (`input`), the name
/// of the first rule violated (`rule`), and a message that is safe to print.
/// Validators produce exactly one `ValidationError` per call; callers wanting
/// every violation fix the first and call again.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{input} rejected ({kind}): {message}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub input: InputKind,
    /// Stable identifier of the violated rule, e.g. `"path_traversal"`.
    pub rule: &'static str,
    /// Human-safe description. Never contains the rejected value when that
    /// value could carry a secret.
    pub message: String,
}

impl ValidationError {
    pub(crate) fn new(
        kind: ValidationErrorKind,
        input: InputKind,
        rule: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            input,
            rule,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_rule_class_and_category() {
        let err = ValidationError::new(
            ValidationErrorKind::PathTraversal,
            InputKind::Repository,
            "path_traversal",
            "value contains a blocked traversal sequence",
        );
        let rendered = err.to_string();
        assert!(rendered.contains("repository name"));
        assert!(rendered.contains("path traversal"));
        assert!(rendered.contains("blocked traversal sequence"));
    }

    #[test]
    fn test_kind_round_trips_through_as_str() {
        assert_eq!(ValidationErrorKind::TooLong.as_str(), "too long");
        assert_eq!(ValidationErrorKind::NotAMapping.to_string(), "not a mapping");
    }
}
