//! Discovery of in-scope cancellation tokens usable at a call site.

use std::fmt;

use crate::context::{enclosing_declaration, enclosing_type, AnalysisContext};
use crate::model::{Accessibility, Document, Invocation};
use crate::utils::classify::is_cancellation_token;

/// Where a candidate token lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CandidateKind {
    /// A parameter of the enclosing method.
    Parameter,
    /// A field of the enclosing type.
    Field,
    /// A readable, non-private property of the enclosing type.
    Property,
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parameter => write!(f, "Parameter"),
            Self::Field => write!(f, "Field"),
            Self::Property => write!(f, "Property"),
        }
    }
}

/// A value in scope that carries a cancellation token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CancellationCandidate {
    /// Where the value lives.
    pub kind: CandidateKind,
    /// Identifier to reference at the call site.
    pub identifier: String,
}

impl CancellationCandidate {
    /// Creates a candidate.
    #[must_use]
    pub fn new(kind: CandidateKind, identifier: impl Into<String>) -> Self {
        Self {
            kind,
            identifier: identifier.into(),
        }
    }

    /// Key distinguishing this candidate among those offered at one call site.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}_{}", self.kind, self.identifier)
    }

    /// Display text, e.g. `parameter 'cancellationToken'`.
    #[must_use]
    pub fn description(&self) -> String {
        format!(
            "{} '{}'",
            self.kind.to_string().to_lowercase(),
            self.identifier
        )
    }
}

/// Lists the tokens usable at `invocation`.
///
/// Order: enclosing method parameters, then fields, then properties of the
/// enclosing type, each in declaration order.
#[must_use]
pub fn discover(
    ctx: &AnalysisContext<'_>,
    document: &Document,
    invocation: &Invocation,
) -> Vec<CancellationCandidate> {
    let mut candidates = Vec::new();

    if let Some(method) = enclosing_declaration(document, invocation).and_then(|d| ctx.declared_method(d)) {
        candidates.extend(
            method
                .parameters
                .iter()
                .filter(|p| is_cancellation_token(ctx, p.ty))
                .map(|p| CancellationCandidate::new(CandidateKind::Parameter, &p.name)),
        );
    }

    if let Some(ty) = enclosing_type(ctx, document, invocation).and_then(|id| ctx.symbols().type_symbol(id)) {
        candidates.extend(
            ty.fields
                .iter()
                .filter(|f| is_cancellation_token(ctx, f.ty))
                .map(|f| CancellationCandidate::new(CandidateKind::Field, &f.name)),
        );
        candidates.extend(
            ty.properties
                .iter()
                .filter(|p| {
                    is_cancellation_token(ctx, p.ty)
                        && p.has_getter
                        && p.accessibility != Accessibility::Private
                })
                .map(|p| CancellationCandidate::new(CandidateKind::Property, &p.name)),
        );
    }

    candidates
}
