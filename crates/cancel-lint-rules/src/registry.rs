//! Explicit registration of every rule and suppressor.

use cancel_lint_core::{AnalyzerBuilder, RuleBox, RuleDescriptor, SuppressionDescriptor, SuppressorBox};

use crate::fixes::FixDescriptor;
use crate::{EditGenerator, MissingTokenDeclaration, MissingTokenInvocation, OverlapSuppressor};

/// Returns all available rules.
///
/// Includes:
/// - `MissingTokenDeclaration` (CT001, CT002)
/// - `MissingTokenInvocation` (CT003, CT004, CT005)
#[must_use]
pub fn all_rules() -> Vec<RuleBox> {
    vec![
        Box::new(MissingTokenDeclaration::new()),
        Box::new(MissingTokenInvocation::new()),
    ]
}

/// Returns all available suppressors.
#[must_use]
pub fn all_suppressors() -> Vec<SuppressorBox> {
    vec![Box::new(OverlapSuppressor::new())]
}

/// Every diagnostic id in catalog order.
#[must_use]
pub fn rule_catalog() -> Vec<&'static RuleDescriptor> {
    let rules = all_rules();
    let mut catalog: Vec<&'static RuleDescriptor> = rules.iter().flat_map(|r| r.descriptors()).collect();
    catalog.sort_by_key(|d| d.code);
    catalog
}

/// Every kind of code fix, with its title and equivalence key.
#[must_use]
pub fn fix_catalog() -> &'static [FixDescriptor] {
    EditGenerator::new().descriptors()
}

/// Every suppression in catalog order.
#[must_use]
pub fn suppression_catalog() -> Vec<SuppressionDescriptor> {
    all_suppressors().iter().map(|s| s.descriptor()).collect()
}

/// Starts an analyzer with every rule and suppressor registered.
#[must_use]
pub fn analyzer_builder() -> AnalyzerBuilder {
    let builder = all_rules()
        .into_iter()
        .fold(AnalyzerBuilder::new(), AnalyzerBuilder::rule_box);
    all_suppressors()
        .into_iter()
        .fold(builder, AnalyzerBuilder::suppressor_box)
}
