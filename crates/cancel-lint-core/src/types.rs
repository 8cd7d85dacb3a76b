//! Core types for diagnostics, suppressions and results.

use miette::{Diagnostic as MietteDiagnostic, SourceSpan};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::model::DocumentId;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail lint.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Half-open byte range `[start, end)` into a document's text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl Span {
    /// Creates a span from two offsets.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Creates an empty span at `offset`.
    #[must_use]
    pub const fn empty(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    /// Length in bytes.
    #[must_use]
    pub const fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the span covers no bytes.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start >= self.end
    }

    /// Returns true if `other` lies entirely inside this span.
    #[must_use]
    pub const fn contains(self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        SourceSpan::from((span.start, span.len()))
    }
}

/// Source code location of a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Document the span belongs to.
    pub document: DocumentId,
    /// File path of the document.
    pub file: PathBuf,
    /// Byte range in the document.
    pub span: Span,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
}

impl Location {
    /// Creates a location, computing line and column from `text`.
    #[must_use]
    pub fn new(document: DocumentId, file: PathBuf, text: &str, span: Span) -> Self {
        let (line, column) = line_column(text, span.start);
        Self {
            document,
            file,
            span,
            line,
            column,
        }
    }
}

/// Computes the 1-indexed line and column of a byte offset.
#[must_use]
pub fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(text.len());
    let before = text.get(..offset).unwrap_or(text);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

/// A diagnostic reported by one of the cancellation rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Rule id (e.g., "CT001").
    pub code: String,
    /// Rule name (e.g., "missing-token-on-asynchronous-handle").
    pub rule: String,
    /// Severity of this diagnostic.
    pub severity: Severity,
    /// Primary location.
    pub location: Location,
    /// Human-readable message.
    pub message: String,
    /// Metadata used for message formatting and fix lookup.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl Diagnostic {
    /// Creates a new diagnostic.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        rule: impl Into<String>,
        severity: Severity,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            rule: rule.into(),
            severity,
            location,
            message: message.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Formats the diagnostic for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = format!(
            "{} {} at {}:{}:{}\n",
            self.code,
            self.rule,
            self.location.file.display(),
            self.location.line,
            self.location.column,
        );
        let _ = writeln!(output, "  {}: {}", self.severity, self.message);
        output
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} [{}] {}",
            self.location.file.display(),
            self.location.line,
            self.location.column,
            self.severity,
            self.code,
            self.message
        )
    }
}

/// A diagnostic previously reported by a third-party analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalDiagnostic {
    /// Third-party rule id (e.g., "CA2016").
    pub id: String,
    /// Document the diagnostic was reported in.
    pub document: DocumentId,
    /// Reported span.
    pub span: Span,
    /// Original message, if known.
    #[serde(default)]
    pub message: String,
}

/// Marks an external diagnostic as covered by one of our own rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suppression {
    /// Suppression id (e.g., "CTSP001").
    pub id: String,
    /// Id of the suppressed external rule.
    pub suppressed_id: String,
    /// Why the external diagnostic is not actionable.
    pub justification: String,
    /// The suppressed instance.
    pub diagnostic: ExternalDiagnostic,
}

/// Converts a [`Diagnostic`] to a miette diagnostic for rich error display.
#[derive(Debug, thiserror::Error, MietteDiagnostic)]
#[error("{message}")]
pub struct DiagnosticReport {
    message: String,
    #[help]
    help: Option<String>,
    #[label("{label_message}")]
    span: SourceSpan,
    label_message: String,
}

impl DiagnosticReport {
    /// Attaches a help line (e.g., the first offered fix title).
    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl From<&Diagnostic> for DiagnosticReport {
    fn from(d: &Diagnostic) -> Self {
        Self {
            message: format!("[{}] {}", d.code, d.message),
            help: None,
            span: d.location.span.into(),
            label_message: d.rule.clone(),
        }
    }
}

/// Result of running the analyzer over a compilation.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LintResult {
    /// All diagnostics found.
    pub diagnostics: Vec<Diagnostic>,
    /// External diagnostics suppressed in favour of ours.
    pub suppressions: Vec<Suppression>,
    /// Number of documents checked.
    pub documents_checked: usize,
}

impl LintResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Returns diagnostics with the given rule id.
    #[must_use]
    pub fn by_code(&self, code: &str) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.code == code).collect()
    }

    /// Counts diagnostics by severity.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        let count = |severity| {
            self.diagnostics
                .iter()
                .filter(|d| d.severity == severity)
                .count()
        };
        (
            count(Severity::Error),
            count(Severity::Warning),
            count(Severity::Info),
        )
    }

    /// Adds diagnostics and suppressions from another result.
    pub fn extend(&mut self, other: Self) {
        self.diagnostics.extend(other.diagnostics);
        self.suppressions.extend(other.suppressions);
        self.documents_checked += other.documents_checked;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_diagnostic(code: &str, severity: Severity) -> Diagnostic {
        let text = "class C\n{\n    Task RunAsync() {}\n}";
        Diagnostic::new(
            code,
            "missing-token-on-asynchronous-handle",
            severity,
            Location::new(DocumentId(0), PathBuf::from("C.cs"), text, Span::new(19, 27)),
            "Method returning Task/ValueTask should include an optional CancellationToken parameter",
        )
    }

    #[test]
    fn location_computes_line_and_column() {
        let d = make_diagnostic("CT001", Severity::Warning);
        assert_eq!(d.location.line, 3);
        assert_eq!(d.location.column, 10);
    }

    #[test]
    fn line_column_clamps_past_end() {
        assert_eq!(line_column("ab\ncd", 100), (2, 3));
        assert_eq!(line_column("", 0), (1, 1));
    }

    #[test]
    fn span_containment() {
        let outer = Span::new(10, 30);
        assert!(outer.contains(Span::new(10, 30)));
        assert!(outer.contains(Span::new(12, 20)));
        assert!(!outer.contains(Span::new(5, 20)));
        assert!(Span::empty(4).is_empty());
    }

    #[test]
    fn display_is_compact_single_line() {
        let d = make_diagnostic("CT001", Severity::Warning);
        assert_eq!(
            d.to_string(),
            "C.cs:3:10: warning [CT001] Method returning Task/ValueTask should include an optional CancellationToken parameter"
        );
    }

    #[test]
    fn count_and_filter() {
        let mut result = LintResult::new();
        result.diagnostics.push(make_diagnostic("CT001", Severity::Warning));
        result.diagnostics.push(make_diagnostic("CT003", Severity::Info));
        result.diagnostics.push(make_diagnostic("CT001", Severity::Error));

        assert_eq!(result.count_by_severity(), (1, 1, 1));
        assert_eq!(result.by_code("CT001").len(), 2);
        assert!(result.has_errors());
    }

    #[test]
    fn properties_are_skipped_when_empty() {
        let d = make_diagnostic("CT005", Severity::Warning);
        let json = serde_json::to_string(&d).unwrap();
        assert!(!json.contains("properties"));

        let d = d.with_property("targetMethodName", "Delay");
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains("\"targetMethodName\":\"Delay\""));
    }
}
