//! Rule flagging asynchronous method declarations without a cancellation parameter.
//!
//! # Rationale
//!
//! A caller can only cancel work it can hand a token to. Methods returning an
//! awaitable handle, and `async void` methods, should accept an optional
//! `CancellationToken` so callers are able to propagate cancellation.
//!
//! # Exclusions
//!
//! - Methods implementing an interface member (the signature is not ours to change)
//! - Overrides
//! - Methods with a sibling overload taking the same parameters plus a trailing token
//!
//! # Suppression
//!
//! - `// cancel-lint: allow(CT001)` comment

use cancel_lint_core::utils::{
    has_cancellation_parameter, has_overload_with_cancellation_token, return_shape, ReturnShape,
};
use cancel_lint_core::{
    AnalysisContext, Diagnostic, FileContext, MethodDeclaration, MethodId, Rule, RuleDescriptor,
    Severity,
};
use cancel_lint_core::model::MethodSymbol;

/// Name of the rule as a whole, covering CT001 and CT002.
pub const RULE_NAME: &str = "declaration-cancellation-token";
/// Rule code for a handle-returning method without a token.
pub const CODE_HANDLE: &str = "CT001";
/// Rule name for a handle-returning method without a token.
pub const NAME_HANDLE: &str = "missing-token-on-asynchronous-handle";
/// Rule code for an `async void` method without a token.
pub const CODE_FIRE_AND_FORGET: &str = "CT002";
/// Rule name for an `async void` method without a token.
pub const NAME_FIRE_AND_FORGET: &str = "missing-token-on-fire-and-forget";

static DESCRIPTORS: [RuleDescriptor; 2] = [
    RuleDescriptor {
        code: CODE_HANDLE,
        name: NAME_HANDLE,
        title: "CancellationToken is missing",
        message: "Method returning Task/ValueTask should include an optional CancellationToken parameter",
        severity: Severity::Warning,
    },
    RuleDescriptor {
        code: CODE_FIRE_AND_FORGET,
        name: NAME_FIRE_AND_FORGET,
        title: "CancellationToken is missing",
        message: "Async void method should include an optional CancellationToken parameter",
        severity: Severity::Warning,
    },
];

/// Flags asynchronous declarations that cannot be cancelled.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingTokenDeclaration;

impl MissingTokenDeclaration {
    /// Creates a new rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for MissingTokenDeclaration {
    fn name(&self) -> &'static str {
        RULE_NAME
    }

    fn descriptors(&self) -> &'static [RuleDescriptor] {
        &DESCRIPTORS
    }

    fn description(&self) -> &'static str {
        "Asynchronous methods should accept an optional CancellationToken"
    }

    fn check_declaration(&self, ctx: &FileContext<'_>, declaration: &MethodDeclaration) -> Vec<Diagnostic> {
        let analysis = ctx.analysis;
        let (Some(id), Some(method)) = (declaration.symbol, analysis.declared_method(declaration)) else {
            return Vec::new();
        };

        let descriptor = match return_shape(analysis, method) {
            Some(ReturnShape::AsynchronousHandle) => &DESCRIPTORS[0],
            Some(ReturnShape::FireAndForget) => &DESCRIPTORS[1],
            Some(ReturnShape::Ordinary) | None => return Vec::new(),
        };

        if has_cancellation_parameter(analysis, method) || is_excluded(analysis, id, method) {
            return Vec::new();
        }

        vec![Diagnostic::new(
            descriptor.code,
            descriptor.name,
            descriptor.severity,
            ctx.location(declaration.name_span),
            descriptor.message,
        )]
    }
}

/// Interface implementations, overrides and methods with a token-taking overload.
fn is_excluded(ctx: &AnalysisContext<'_>, id: MethodId, method: &MethodSymbol) -> bool {
    method.is_override
        || implements_interface_member(ctx, id, method)
        || has_overload_with_cancellation_token(ctx, id)
}

fn implements_interface_member(ctx: &AnalysisContext<'_>, id: MethodId, method: &MethodSymbol) -> bool {
    let symbols = ctx.symbols();
    let owner = method.containing_type;

    symbols.all_interfaces(owner).into_iter().any(|interface| {
        symbols.type_symbol(interface).is_some_and(|symbol| {
            symbol
                .methods
                .iter()
                .any(|&member| symbols.find_implementation_for_interface_member(owner, member) == Some(id))
        })
    })
}
