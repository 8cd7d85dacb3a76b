//! Core analyzer for orchestrating lint execution.

use crate::config::{Config, ConfigError};
use crate::context::{AnalysisContext, ContextError, FileContext};
use crate::model::{Compilation, Document, DocumentId, SymbolProvider};
use crate::rule::{Rule, RuleBox, RuleDescriptor, Suppressor, SuppressorBox};
use crate::types::{Diagnostic, ExternalDiagnostic, LintResult, Suppression};
use crate::utils::allowance::check_allow_with_reason;

use rayon::prelude::*;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, trace};

/// Errors that can occur during analysis.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The compilation lacks a type the rules depend on.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    rules: Vec<RuleBox>,
    suppressors: Vec<SuppressorBox>,
    config: Option<Config>,
    config_path: Option<PathBuf>,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rule.
    #[must_use]
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Registers a boxed rule.
    #[must_use]
    pub fn rule_box(mut self, rule: RuleBox) -> Self {
        self.rules.push(rule);
        self
    }

    /// Registers a suppressor.
    #[must_use]
    pub fn suppressor<S: Suppressor + 'static>(mut self, suppressor: S) -> Self {
        self.suppressors.push(Box::new(suppressor));
        self
    }

    /// Registers a boxed suppressor.
    #[must_use]
    pub fn suppressor_box(mut self, suppressor: SuppressorBox) -> Self {
        self.suppressors.push(suppressor);
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Loads the configuration from a TOML file at build time.
    #[must_use]
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be loaded.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let config = match (self.config, self.config_path) {
            (Some(config), _) => config,
            (None, Some(path)) => Config::from_file(&path)?,
            (None, None) => Config::default(),
        };

        Ok(Analyzer {
            rules: self.rules,
            suppressors: self.suppressors,
            config,
        })
    }
}

/// The main analyzer that orchestrates lint execution.
///
/// Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    rules: Vec<RuleBox>,
    suppressors: Vec<SuppressorBox>,
    config: Config,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Returns the registered rules.
    #[must_use]
    pub fn rules(&self) -> &[RuleBox] {
        &self.rules
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Builds the shared context for a compilation.
    ///
    /// # Errors
    ///
    /// Returns an error if a well-known type is missing.
    pub fn context<'a>(&self, symbols: &'a dyn SymbolProvider) -> Result<AnalysisContext<'a>, AnalyzerError> {
        Ok(AnalysisContext::new(symbols, self.config.engine())?)
    }

    /// Analyzes an in-memory compilation.
    ///
    /// # Errors
    ///
    /// Returns an error if a well-known type is missing.
    pub fn analyze(&self, compilation: &Compilation) -> Result<LintResult, AnalyzerError> {
        self.analyze_with(
            compilation,
            &compilation.documents,
            &compilation.external_diagnostics,
        )
    }

    /// Analyzes documents against an arbitrary symbol provider.
    ///
    /// Document ids are indices into `documents`.
    ///
    /// # Errors
    ///
    /// Returns an error if a well-known type is missing.
    pub fn analyze_with(
        &self,
        symbols: &dyn SymbolProvider,
        documents: &[Document],
        external: &[ExternalDiagnostic],
    ) -> Result<LintResult, AnalyzerError> {
        let ctx = self.context(symbols)?;
        info!(
            "Starting analysis of {} documents with {} rules",
            documents.len(),
            self.rules.len()
        );

        let per_document: Vec<Vec<Diagnostic>> = documents
            .par_iter()
            .enumerate()
            .map(|(i, document)| {
                let file = FileContext::new(&ctx, DocumentId(crate::model::index_to_u32(i)), document);
                self.analyze_document(&file)
            })
            .collect();

        let mut result = LintResult::new();
        result.documents_checked = documents.len();
        result.suppressions = self.run_suppressors(&ctx, documents, &per_document, external);
        result.diagnostics = per_document.into_iter().flatten().collect();

        result.diagnostics.sort_by(|a, b| {
            a.location
                .document
                .cmp(&b.location.document)
                .then(a.location.line.cmp(&b.location.line))
                .then(a.location.column.cmp(&b.location.column))
                .then(a.code.cmp(&b.code))
        });

        info!(
            "Analysis complete: {} diagnostics, {} suppressions in {} documents",
            result.diagnostics.len(),
            result.suppressions.len(),
            result.documents_checked
        );

        Ok(result)
    }

    /// Runs every rule over one document's nodes.
    fn analyze_document(&self, ctx: &FileContext<'_>) -> Vec<Diagnostic> {
        debug!("Analyzing: {}", ctx.document.path.display());
        let mut diagnostics = Vec::new();

        for rule in &self.rules {
            if !rule
                .descriptors()
                .iter()
                .any(|d| self.config.is_rule_enabled(d.code, d.name))
            {
                debug!("Skipping disabled rule: {}", rule.name());
                continue;
            }

            for declaration in &ctx.document.methods {
                diagnostics.extend(rule.check_declaration(ctx, declaration));
            }
            for invocation in &ctx.document.invocations {
                diagnostics.extend(rule.check_invocation(ctx, invocation));
            }
        }

        diagnostics
            .into_iter()
            .filter_map(|d| self.apply_config(ctx, d))
            .collect()
    }

    /// Applies enablement, severity overrides and inline allowances.
    fn apply_config(&self, ctx: &FileContext<'_>, mut diagnostic: Diagnostic) -> Option<Diagnostic> {
        if !self.config.is_rule_enabled(&diagnostic.code, &diagnostic.rule) {
            return None;
        }

        let allow = check_allow_with_reason(
            &ctx.document.text,
            diagnostic.location.line,
            &[diagnostic.code.as_str(), diagnostic.rule.as_str()],
        );
        if allow.is_allowed() {
            trace!(
                "{} allowed at {}:{} ({})",
                diagnostic.code,
                diagnostic.location.file.display(),
                diagnostic.location.line,
                allow.reason().unwrap_or("no reason")
            );
            return None;
        }

        if let Some(severity) = self.config.rule_severity(&diagnostic.code, &diagnostic.rule) {
            diagnostic.severity = severity;
        }
        Some(diagnostic)
    }

    fn run_suppressors(
        &self,
        ctx: &AnalysisContext<'_>,
        documents: &[Document],
        reported: &[Vec<Diagnostic>],
        external: &[ExternalDiagnostic],
    ) -> Vec<Suppression> {
        let mut suppressions = Vec::new();

        for suppressor in &self.suppressors {
            let descriptor = suppressor.descriptor();
            for diagnostic in external.iter().filter(|d| d.id == descriptor.suppressed_id) {
                let Some(document) = documents.get(diagnostic.document.index()) else {
                    debug!(
                        "{} refers to unknown document #{}",
                        diagnostic.id, diagnostic.document.0
                    );
                    continue;
                };
                let file = FileContext::new(ctx, diagnostic.document, document);
                let covering = reported
                    .get(diagnostic.document.index())
                    .map_or(&[][..], Vec::as_slice);
                if let Some(suppression) = suppressor.evaluate(&file, diagnostic, covering) {
                    debug!(
                        "{} suppressed {} in {}",
                        suppression.id,
                        suppression.suppressed_id,
                        document.path.display()
                    );
                    suppressions.push(suppression);
                }
            }
        }

        suppressions
    }

    /// Looks up the descriptor for a rule id across registered rules.
    #[must_use]
    pub fn descriptor(&self, code: &str) -> Option<&'static RuleDescriptor> {
        self.rules
            .iter()
            .flat_map(|r| r.descriptors())
            .find(|d| d.code == code)
    }
}
