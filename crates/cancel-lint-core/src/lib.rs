//! # cancel-lint-core
//!
//! Core framework for cancellation-token linting over a resolved semantic model.
//!
//! This crate provides the foundational traits and types the rules build on:
//!
//! - [`model`]: symbols and already-resolved syntax, and the [`SymbolProvider`] seam
//! - [`AnalysisContext`]: immutable per-compilation state (well-known types, configuration)
//! - [`Rule`] and [`Suppressor`] traits, registered explicitly on an [`Analyzer`]
//! - [`utils`]: type classification, candidate discovery, overload matching
//! - [`edit`]: text edits, fixes and conflict-checked batch application
//!
//! ## Example
//!
//! ```ignore
//! use cancel_lint_core::{Analyzer, Compilation};
//!
//! let analyzer = Analyzer::builder()
//!     .rule(MyRule::new())
//!     .build()?;
//!
//! let compilation = Compilation::from_json(&std::fs::read_to_string("build.json")?)?;
//! let result = analyzer.analyze(&compilation)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod config;
mod context;
mod rule;
mod types;

/// Text edits and fixes.
pub mod edit;
/// Semantic model consumed by the rules.
pub mod model;
/// Utility modules for rule implementations.
pub mod utils;

pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerError};
pub use config::{
    parse_bool, Config, ConfigError, EngineConfiguration, RuleConfig, PREFER_SHORT_TYPE_NAMES,
    SUPPRESS_OVERLAP, SUPPRESS_OVERLAP_FALLBACK,
};
pub use context::{enclosing_declaration, enclosing_type, AnalysisContext, ContextError, FileContext};
pub use edit::{CancellationFlag, Fix, TextEdit};
pub use model::{
    Compilation, Document, DocumentId, Invocation, MethodDeclaration, MethodId, ModelError,
    SymbolProvider, TypeId,
};
pub use rule::{Rule, RuleBox, RuleDescriptor, SuppressionDescriptor, Suppressor, SuppressorBox};
pub use types::{
    line_column, Diagnostic, DiagnosticReport, ExternalDiagnostic, LintResult, Location, Severity,
    Span, Suppression,
};
