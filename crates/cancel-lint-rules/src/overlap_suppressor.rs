//! Suppresses CA2016 where our invocation rule already reports the call.
//!
//! CA2016 ("forward the CancellationToken parameter") overlaps CT003 to CT005.
//! When suppression is enabled, a CA2016 instance is marked as handled when
//! [`evaluate_invocation`] finds something at the same call and the matching
//! diagnostic was actually reported there. A finding whose rule is disabled
//! or allowed inline leaves CA2016 alone, so the call keeps one diagnostic.
//!
//! Enabled by `cancel_lint.suppress_ca2016`, falling back to
//! `build_property.cancellintsuppressca2016`. Off by default.

use cancel_lint_core::{
    Diagnostic, ExternalDiagnostic, FileContext, Span, Suppression, SuppressionDescriptor, Suppressor,
};
use tracing::trace;

use crate::missing_token_invocation::{evaluate_invocation, InvocationFinding};

/// Suppression id.
pub const SUPPRESSION_ID: &str = "CTSP001";
/// External rule id this suppresses.
pub const SUPPRESSED_ID: &str = "CA2016";

const DESCRIPTOR: SuppressionDescriptor = SuppressionDescriptor {
    id: SUPPRESSION_ID,
    suppressed_id: SUPPRESSED_ID,
    justification: "CancellationToken usage is handled by cancel-lint",
};

/// Marks overlapping CA2016 diagnostics as handled.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapSuppressor;

impl OverlapSuppressor {
    /// Creates a new suppressor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Suppressor for OverlapSuppressor {
    fn descriptor(&self) -> SuppressionDescriptor {
        DESCRIPTOR
    }

    fn evaluate(
        &self,
        ctx: &FileContext<'_>,
        diagnostic: &ExternalDiagnostic,
        reported: &[Diagnostic],
    ) -> Option<Suppression> {
        if !ctx.analysis.config().enable_overlap_suppression {
            return None;
        }

        let (_, invocation) = ctx.document.invocation_containing(diagnostic.span)?;
        let finding = evaluate_invocation(ctx.analysis, invocation)?;
        let spans: Vec<Span> = match &finding {
            InvocationFinding::UseRealToken { arguments } => arguments
                .iter()
                .filter_map(|&i| invocation.arguments.arguments.get(i).map(|a| a.span))
                .collect(),
            InvocationFinding::AddToken { .. } | InvocationFinding::UseOverload { .. } => vec![invocation.span],
        };
        let covered = reported.iter().any(|d| {
            d.code == finding.code()
                && d.location.document == ctx.document_id
                && spans.contains(&d.location.span)
        });
        if !covered {
            trace!("{} at {:?} has no reported {}", diagnostic.id, diagnostic.span, finding.code());
            return None;
        }
        trace!("{} overlaps {:?}", diagnostic.id, finding);
        Some(DESCRIPTOR.suppress(diagnostic))
    }
}
