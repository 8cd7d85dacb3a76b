//! Rule and suppressor traits.

use crate::context::FileContext;
use crate::model::{Invocation, MethodDeclaration};
use crate::types::{Diagnostic, ExternalDiagnostic, Severity, Suppression};

/// Catalog entry for one diagnostic id a rule can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleDescriptor {
    /// Stable rule id (e.g., "CT001").
    pub code: &'static str,
    /// Kebab-case name (e.g., "missing-token-on-asynchronous-handle").
    pub name: &'static str,
    /// Short title.
    pub title: &'static str,
    /// Message format; `{key}` placeholders are filled from diagnostic properties.
    pub message: &'static str,
    /// Default severity.
    pub severity: Severity,
}

impl RuleDescriptor {
    /// Formats the message, substituting `{key}` with each property value.
    #[must_use]
    pub fn format_message(&self, properties: &[(&str, &str)]) -> String {
        properties
            .iter()
            .fold(self.message.to_string(), |message, (key, value)| {
                message.replace(&format!("{{{key}}}"), value)
            })
    }
}

/// A lint rule evaluated per syntax node.
///
/// A rule may own several descriptors when its outcomes are mutually
/// exclusive views of the same check. Both hooks default to reporting
/// nothing, so a rule implements only the node kinds it inspects.
///
/// # Example
///
/// ```
/// use cancel_lint_core::{Diagnostic, FileContext, MethodDeclaration, Rule, RuleDescriptor, Severity};
///
/// const DESCRIPTOR: RuleDescriptor = RuleDescriptor {
///     code: "EX001",
///     name: "flag-everything",
///     title: "Flag every declaration",
///     message: "Declaration flagged",
///     severity: Severity::Info,
/// };
///
/// struct FlagEverything;
///
/// impl Rule for FlagEverything {
///     fn name(&self) -> &'static str { DESCRIPTOR.name }
///     fn descriptors(&self) -> &'static [RuleDescriptor] { std::slice::from_ref(&DESCRIPTOR) }
///
///     fn check_declaration(&self, ctx: &FileContext<'_>, decl: &MethodDeclaration) -> Vec<Diagnostic> {
///         vec![Diagnostic::new(
///             DESCRIPTOR.code,
///             DESCRIPTOR.name,
///             DESCRIPTOR.severity,
///             ctx.location(decl.name_span),
///             DESCRIPTOR.message,
///         )]
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// Returns the kebab-case name of this rule.
    fn name(&self) -> &'static str;

    /// Returns every diagnostic id this rule reports.
    fn descriptors(&self) -> &'static [RuleDescriptor];

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Checks a method declaration.
    fn check_declaration(
        &self,
        _ctx: &FileContext<'_>,
        _declaration: &MethodDeclaration,
    ) -> Vec<Diagnostic> {
        Vec::new()
    }

    /// Checks a call expression.
    fn check_invocation(&self, _ctx: &FileContext<'_>, _invocation: &Invocation) -> Vec<Diagnostic> {
        Vec::new()
    }
}

/// Type alias for boxed Rule trait objects.
pub type RuleBox = Box<dyn Rule>;

/// Catalog entry for a suppression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuppressionDescriptor {
    /// Suppression id (e.g., "CTSP001").
    pub id: &'static str,
    /// External rule id this suppresses.
    pub suppressed_id: &'static str,
    /// Why suppressed instances are not actionable.
    pub justification: &'static str,
}

impl SuppressionDescriptor {
    /// Builds a suppression record for one external diagnostic.
    #[must_use]
    pub fn suppress(&self, diagnostic: &ExternalDiagnostic) -> Suppression {
        Suppression {
            id: self.id.to_string(),
            suppressed_id: self.suppressed_id.to_string(),
            justification: self.justification.to_string(),
            diagnostic: diagnostic.clone(),
        }
    }
}

/// Reconciles diagnostics reported by another analyzer with ours.
pub trait Suppressor: Send + Sync {
    /// Returns the suppression this suppressor issues.
    fn descriptor(&self) -> SuppressionDescriptor;

    /// Decides whether one external diagnostic in `ctx.document` is suppressed.
    ///
    /// `reported` holds this document's diagnostics after rule enablement and
    /// inline allowances were applied.
    fn evaluate(
        &self,
        ctx: &FileContext<'_>,
        diagnostic: &ExternalDiagnostic,
        reported: &[Diagnostic],
    ) -> Option<Suppression>;
}

/// Type alias for boxed Suppressor trait objects.
pub type SuppressorBox = Box<dyn Suppressor>;

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: RuleDescriptor = RuleDescriptor {
        code: "CT005",
        name: "use-overload-with-cancellation-token",
        title: "Use overload with CancellationToken",
        message: "Call to '{targetMethodName}' should use an overload that accepts a CancellationToken",
        severity: Severity::Warning,
    };

    struct NoopRule;

    impl Rule for NoopRule {
        fn name(&self) -> &'static str {
            "noop"
        }
        fn descriptors(&self) -> &'static [RuleDescriptor] {
            std::slice::from_ref(&DESCRIPTOR)
        }
    }

    #[test]
    fn test_message_formatting() {
        assert_eq!(
            DESCRIPTOR.format_message(&[("targetMethodName", "ReadAsync")]),
            "Call to 'ReadAsync' should use an overload that accepts a CancellationToken"
        );
    }

    #[test]
    fn test_default_hooks_report_nothing() {
        let rule = NoopRule;
        assert_eq!(rule.descriptors()[0].code, "CT005");
        assert_eq!(rule.description(), "");
    }
}
