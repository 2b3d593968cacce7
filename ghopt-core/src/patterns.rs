//! patterns.rs - The shared pattern library for validation and sanitization.
//!
//! This module owns the canonical, ordered list of dangerous-pattern and
//! secret-pattern matchers. Dangerous patterns are checked on *input* by the
//! validators (reject on match); secret patterns are checked on *output* by
//! the sanitizer (redact on match). The table is pure data: adding a pattern
//! is a new `PatternSpec` row, not a new code path, and every row is covered
//! by a compile test plus a positive-match test.
//!
//! Compiled once into a process-wide singleton and shared read-only by every
//! caller. Matching is total over strings: a scan returns positions and
//! categories, never an error.
//!
//! License: MIT OR APACHE 2.0

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::fmt;

/// Maximum allowed length for a pattern source string; a guard against table
/// rows growing into un-reviewable regexes.
pub const MAX_PATTERN_LENGTH: usize = 500;

/// The category a pattern belongs to. The first four are dangerous input
/// shapes; the rest are secret output shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternCategory {
    Traversal,
    Injection,
    Script,
    DynamicImport,
    SecretToken,
    Bearer,
    PrivateKey,
    CloudCredential,
    GenericSecretAssignment,
}

impl PatternCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Traversal => "traversal",
            Self::Injection => "injection",
            Self::Script => "script",
            Self::DynamicImport => "dynamic-import",
            Self::SecretToken => "secret-token",
            Self::Bearer => "bearer",
            Self::PrivateKey => "private-key",
            Self::CloudCredential => "cloud-credential",
            Self::GenericSecretAssignment => "generic-secret-assignment",
        }
    }

    /// Input-rejecting categories, scanned by the validators.
    pub fn is_dangerous(&self) -> bool {
        matches!(
            self,
            Self::Traversal | Self::Injection | Self::Script | Self::DynamicImport
        )
    }

    /// Output-redacting categories, scanned by the sanitizer.
    pub fn is_secret(&self) -> bool {
        !self.is_dangerous()
    }
}

impl fmt::Display for PatternCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the pattern table.
///
/// Secret patterns may carry exactly one capture group marking the span to
/// redact; the surrounding context (key name, `Bearer `, `scheme://`) stays
/// visible. Patterns without a capture group redact the whole match.
/// Keyword patterns are case-insensitive via inline `(?i)`; structural token
/// prefixes (`ghp_`, `AKIA`, PEM markers) are case-sensitive.
#[derive(Debug, Clone, Copy)]
pub struct PatternSpec {
    pub name: &'static str,
    pub category: PatternCategory,
    pub pattern: &'static str,
}

/// The canonical pattern table, in reporting order: dangerous categories
/// first, then secret categories. Order matters for first-match reporting;
/// every pattern is still scanned on every call.
pub static PATTERN_SPECS: &[PatternSpec] = &[
    // -- dangerous input shapes ------------------------------------------
    PatternSpec {
        name: "path_traversal",
        category: PatternCategory::Traversal,
        pattern: r"\.\.[/\\]",
    },
    // Single-brace expansion only. The double-brace GitHub Actions
    // expression `${{ ... }}` is legitimate workflow syntax and must not
    // trip this row; see ALLOWED_SECRET_EXPRESSIONS for the audit-side
    // exception table.
    PatternSpec {
        name: "variable_expansion",
        category: PatternCategory::Injection,
        pattern: r"\$\{[^{}]{0,63}\}",
    },
    PatternSpec {
        name: "command_substitution",
        category: PatternCategory::Injection,
        pattern: r"\$\([^)]{0,64}\)",
    },
    PatternSpec {
        name: "backtick_command",
        category: PatternCategory::Injection,
        pattern: r"`[^`\n]{1,64}`",
    },
    PatternSpec {
        name: "eval_call",
        category: PatternCategory::Injection,
        pattern: r"(?i)\beval\s*\(",
    },
    PatternSpec {
        name: "exec_call",
        category: PatternCategory::Injection,
        pattern: r"(?i)\bexec\s*\(",
    },
    PatternSpec {
        name: "system_call",
        category: PatternCategory::Injection,
        pattern: r"(?i)\bsystem\s*\(",
    },
    PatternSpec {
        name: "script_tag",
        category: PatternCategory::Script,
        pattern: r"(?i)<script[>\s/]",
    },
    PatternSpec {
        name: "script_scheme",
        category: PatternCategory::Script,
        pattern: r"(?i)\b(?:javascript|vbscript):",
    },
    PatternSpec {
        name: "dunder_import",
        category: PatternCategory::DynamicImport,
        pattern: r"__import__",
    },
    PatternSpec {
        name: "dynamic_import_call",
        category: PatternCategory::DynamicImport,
        pattern: r"(?i)\bimport\s*\(",
    },
    // -- secret output shapes --------------------------------------------
    PatternSpec {
        name: "github_token",
        category: PatternCategory::SecretToken,
        pattern: r"\b(?:gh[oprsu]|github_pat)_[A-Za-z0-9_]{36,255}\b",
    },
    PatternSpec {
        name: "gitlab_token",
        category: PatternCategory::SecretToken,
        pattern: r"\bglpat-[A-Za-z0-9_=-]{20,}",
    },
    PatternSpec {
        name: "slack_token",
        category: PatternCategory::SecretToken,
        pattern: r"\bxox[aboprs]-(?:\d+-)+[a-z0-9]+",
    },
    PatternSpec {
        name: "url_userinfo",
        category: PatternCategory::SecretToken,
        pattern: r"(?i)\b[a-z][a-z0-9+.-]*://([^/@\s\[][^/@\s]{0,255})@",
    },
    PatternSpec {
        name: "url_token_param",
        category: PatternCategory::SecretToken,
        pattern: r"(?i)[?&](?:access_|api_|auth_)?token=([^&#\s\[][^&#\s]{0,255})",
    },
    PatternSpec {
        name: "bearer_token",
        category: PatternCategory::Bearer,
        pattern: r"(?i)\bbearer\s+([A-Za-z0-9._~+/=-]{8,512})",
    },
    PatternSpec {
        name: "authorization_header",
        category: PatternCategory::Bearer,
        pattern: r#"(?i)\bauthorization\s*:\s*([^\s\[][^\r\n]{3,510})"#,
    },
    PatternSpec {
        name: "private_key_block",
        category: PatternCategory::PrivateKey,
        pattern: r"(?s)-----BEGIN [A-Z0-9 ]{0,48}?PRIVATE KEY-----.{0,8192}?-----END [A-Z0-9 ]{0,48}?PRIVATE KEY-----",
    },
    // Truncated PEM material without an END marker: the body is still
    // redacted rather than leaked.
    PatternSpec {
        name: "private_key_marker",
        category: PatternCategory::PrivateKey,
        pattern: r"-----BEGIN [A-Z0-9 ]{0,48}PRIVATE KEY-----[A-Za-z0-9+/=\s]{0,8192}",
    },
    PatternSpec {
        name: "aws_access_key",
        category: PatternCategory::CloudCredential,
        pattern: r"\b(?:AKIA|ASIA)[0-9A-Z]{16}\b",
    },
    PatternSpec {
        name: "gcp_api_key",
        category: PatternCategory::CloudCredential,
        pattern: r"\bAIza[0-9A-Za-z_-]{35}",
    },
    PatternSpec {
        name: "generic_secret_assignment",
        category: PatternCategory::GenericSecretAssignment,
        pattern: r#"(?i)\b[a-z0-9_-]{0,40}(?:password|passwd|secret|token|api[_-]?key|apikey)['"]?\s*[:=]\s*['"]?([^\s'"\[][^\s'"]{0,254})"#,
    },
];

/// A single compiled pattern, ready for matching.
#[derive(Debug)]
pub struct CompiledPattern {
    pub name: &'static str,
    pub category: PatternCategory,
    pub regex: Regex,
}

lazy_static! {
    /// The compiled pattern table. Built once per process from
    /// `PATTERN_SPECS`; the table is literal data, so compilation cannot
    /// fail once the compile test below has run against it.
    static ref PATTERNS: Vec<CompiledPattern> = PATTERN_SPECS
        .iter()
        .map(|spec| {
            debug_assert!(spec.pattern.len() <= MAX_PATTERN_LENGTH);
            let regex = RegexBuilder::new(spec.pattern)
                .size_limit(10 * (1 << 20))
                .build()
                .expect("pattern table regex is valid");
            CompiledPattern {
                name: spec.name,
                category: spec.category,
                regex,
            }
        })
        .collect();
}

/// All compiled patterns, in table order.
pub fn all() -> &'static [CompiledPattern] {
    &PATTERNS
}

/// The input-rejecting subset, in table order.
pub fn dangerous() -> impl Iterator<Item = &'static CompiledPattern> {
    all().iter().filter(|p| p.category.is_dangerous())
}

/// The output-redacting subset, in table order.
pub fn secrets() -> impl Iterator<Item = &'static CompiledPattern> {
    all().iter().filter(|p| p.category.is_secret())
}

/// A dangerous-pattern hit: which rule fired and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DangerousHit {
    pub name: &'static str,
    pub category: PatternCategory,
    pub start: usize,
    pub end: usize,
}

/// Scans `text` against every dangerous pattern and reports the first hit in
/// table order, or `None` when the text is clean.
pub fn first_dangerous(text: &str) -> Option<DangerousHit> {
    for p in dangerous() {
        if let Some(m) = p.regex.find(text) {
            return Some(DangerousHit {
                name: p.name,
                category: p.category,
                start: m.start(),
                end: m.end(),
            });
        }
    }
    None
}

/// A secret span slated for redaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretSpan {
    pub start: usize,
    pub end: usize,
    pub name: &'static str,
    pub category: PatternCategory,
}

/// Scans `text` against every secret pattern and returns the redactable
/// spans, sorted by start position (longest first on ties). For patterns
/// with a capture group the span is the group; otherwise the whole match.
pub fn secret_spans(text: &str) -> Vec<SecretSpan> {
    let mut spans = Vec::new();
    for p in secrets() {
        for caps in p.regex.captures_iter(text) {
            let whole = match caps.get(0) {
                Some(m) => m,
                None => continue,
            };
            let m = caps.get(1).unwrap_or(whole);
            spans.push(SecretSpan {
                start: m.start(),
                end: m.end(),
                name: p.name,
                category: p.category,
            });
        }
    }
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    spans
}

/// Workflow expressions the security audit treats as safe direct-secret
/// usage. This is a policy allow-list, not a security derivation: changing it
/// is a data edit reviewed like any other rule change.
pub static ALLOWED_SECRET_EXPRESSIONS: &[&str] = &[
    "${{ secrets.GITHUB_TOKEN }}",
    "${{ github.token }}",
];

/// Whether a `${{ ... }}` expression is on the allow-list. Comparison is
/// whitespace- and case-insensitive so `${{secrets.GITHUB_TOKEN}}` and
/// `${{ Secrets.github_token }}` are both recognized.
pub fn is_allowed_secret_expression(expr: &str) -> bool {
    fn squash(s: &str) -> String {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase()
    }
    let needle = squash(expr);
    ALLOWED_SECRET_EXPRESSIONS.iter().any(|e| squash(e) == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_row_compiles() {
        // Forces the lazy singleton, which compiles every row.
        assert_eq!(all().len(), PATTERN_SPECS.len());
    }

    #[test]
    fn test_table_names_are_unique() {
        let mut names: Vec<&str> = PATTERN_SPECS.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), PATTERN_SPECS.len());
    }

    #[test]
    fn test_first_dangerous_reports_table_order() {
        // Both traversal and variable expansion are present; traversal is
        // earlier in the table.
        let hit = first_dangerous("../x ${HOME}").expect("should match");
        assert_eq!(hit.name, "path_traversal");
        assert_eq!(hit.category, PatternCategory::Traversal);
        assert_eq!(hit.start, 0);
    }

    #[test]
    fn test_github_expression_does_not_trip_variable_expansion() {
        assert!(first_dangerous("uses ${{ secrets.GITHUB_TOKEN }} here").is_none());
        assert!(first_dangerous("echo ${HOME}").is_some());
    }

    #[test]
    fn test_redaction_marker_matches_no_secret_pattern() {
        assert!(secret_spans("[REDACTED]").is_empty());
        assert!(first_dangerous("[REDACTED]").is_none());
    }

    #[test]
    fn test_allowed_secret_expressions() {
        assert!(is_allowed_secret_expression("${{ secrets.GITHUB_TOKEN }}"));
        assert!(is_allowed_secret_expression("${{secrets.GITHUB_TOKEN}}"));
        assert!(is_allowed_secret_expression("${{ github.token }}"));
        assert!(!is_allowed_secret_expression("${{ secrets.DEPLOY_KEY }}"));
    }

    #[test]
    fn test_secret_spans_prefer_capture_group() {
        let spans = secret_spans("password=hunter2hunter2");
        assert_eq!(spans.len(), 1);
        let span = spans[0];
        assert_eq!(span.category, PatternCategory::GenericSecretAssignment);
        // Only the value is slated for redaction, not the key.
        assert_eq!(
            &"password=hunter2hunter2"[span.start..span.end],
            "hunter2hunter2"
        );
    }
}
