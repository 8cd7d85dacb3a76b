//! Rule flagging calls that drop, stub out or could pass a cancellation token.
//!
//! # Detected Patterns
//!
//! - `CancellationToken.None` passed where the target takes a token (CT003)
//! - An optional token parameter left unbound (CT004)
//! - A sibling overload taking the same parameters plus a token exists (CT005)
//!
//! The three outcomes are mutually exclusive per call: once any argument is
//! bound to a token parameter, only CT003 can fire.
//!
//! # Suppression
//!
//! - `// cancel-lint: allow(CT004)` comment

use cancel_lint_core::utils::{
    bound_cancellation_arguments, overload_with_cancellation_token,
    unbound_optional_cancellation_parameter,
};
use cancel_lint_core::{
    AnalysisContext, Diagnostic, FileContext, Invocation, MethodId, Rule, RuleDescriptor, Severity,
};

/// Name of the rule as a whole, covering CT003 to CT005.
pub const RULE_NAME: &str = "call-site-cancellation-token";
/// Rule code for passing `CancellationToken.None`.
pub const CODE_USE_REAL_TOKEN: &str = "CT003";
/// Rule name for passing `CancellationToken.None`.
pub const NAME_USE_REAL_TOKEN: &str = "use-real-token";
/// Rule code for an unbound optional token.
pub const CODE_ADD_TOKEN: &str = "CT004";
/// Rule name for an unbound optional token.
pub const NAME_ADD_TOKEN: &str = "add-cancellation-token-to-call";
/// Rule code for an available token-taking overload.
pub const CODE_USE_OVERLOAD: &str = "CT005";
/// Rule name for an available token-taking overload.
pub const NAME_USE_OVERLOAD: &str = "use-overload-with-cancellation-token";

/// Diagnostic property naming the called method.
pub const TARGET_METHOD_NAME: &str = "targetMethodName";

static DESCRIPTORS: [RuleDescriptor; 3] = [
    RuleDescriptor {
        code: CODE_USE_REAL_TOKEN,
        name: NAME_USE_REAL_TOKEN,
        title: "Use real CancellationToken instead of CancellationToken.None",
        message: "Method call should pass a real CancellationToken instead of CancellationToken.None",
        severity: Severity::Info,
    },
    RuleDescriptor {
        code: CODE_ADD_TOKEN,
        name: NAME_ADD_TOKEN,
        title: "CancellationToken is missing in method call",
        message: "Method call should pass a CancellationToken",
        severity: Severity::Warning,
    },
    RuleDescriptor {
        code: CODE_USE_OVERLOAD,
        name: NAME_USE_OVERLOAD,
        title: "Use overload with CancellationToken",
        message: "Call to '{targetMethodName}' should use an overload that accepts a CancellationToken",
        severity: Severity::Warning,
    },
];

/// What a call site does wrong, if anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationFinding {
    /// Arguments (by index) passing `CancellationToken.None` to a token parameter.
    UseRealToken {
        /// Argument indices.
        arguments: Vec<usize>,
    },
    /// The target's optional token parameter (by index) is not passed.
    AddToken {
        /// Parameter index in the target.
        parameter: usize,
    },
    /// A sibling overload accepts a token.
    UseOverload {
        /// The token-taking overload.
        overload: MethodId,
    },
}

impl InvocationFinding {
    /// Rule code reported for this finding.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::UseRealToken { .. } => CODE_USE_REAL_TOKEN,
            Self::AddToken { .. } => CODE_ADD_TOKEN,
            Self::UseOverload { .. } => CODE_USE_OVERLOAD,
        }
    }
}

/// Evaluates one call site.
///
/// Returns `None` for unresolved targets and for calls that already pass a
/// real token. Shared by the rule and the overlap suppressor so both agree.
#[must_use]
pub fn evaluate_invocation(ctx: &AnalysisContext<'_>, invocation: &Invocation) -> Option<InvocationFinding> {
    let target = ctx.target(invocation)?;

    let bound = bound_cancellation_arguments(ctx, target, invocation);
    if !bound.is_empty() {
        let arguments: Vec<usize> = bound
            .iter()
            .filter(|b| b.is_none)
            .map(|b| b.argument)
            .collect();
        return (!arguments.is_empty()).then_some(InvocationFinding::UseRealToken { arguments });
    }

    if let Some(parameter) = unbound_optional_cancellation_parameter(ctx, target, invocation) {
        return Some(InvocationFinding::AddToken { parameter });
    }

    let id = invocation.target?;
    overload_with_cancellation_token(ctx, id).map(|overload| InvocationFinding::UseOverload { overload })
}

/// Flags call sites that do not propagate cancellation.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingTokenInvocation;

impl MissingTokenInvocation {
    /// Creates a new rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for MissingTokenInvocation {
    fn name(&self) -> &'static str {
        RULE_NAME
    }

    fn descriptors(&self) -> &'static [RuleDescriptor] {
        &DESCRIPTORS
    }

    fn description(&self) -> &'static str {
        "Calls should pass a real CancellationToken when the target accepts one"
    }

    fn check_invocation(&self, ctx: &FileContext<'_>, invocation: &Invocation) -> Vec<Diagnostic> {
        let Some(finding) = evaluate_invocation(ctx.analysis, invocation) else {
            return Vec::new();
        };

        let report = |descriptor: &RuleDescriptor, span, message: String| {
            Diagnostic::new(
                descriptor.code,
                descriptor.name,
                descriptor.severity,
                ctx.location(span),
                message,
            )
        };

        match finding {
            InvocationFinding::UseRealToken { arguments } => arguments
                .into_iter()
                .filter_map(|i| invocation.arguments.arguments.get(i))
                .map(|arg| report(&DESCRIPTORS[0], arg.span, DESCRIPTORS[0].message.to_string()))
                .collect(),
            InvocationFinding::AddToken { .. } => {
                vec![report(&DESCRIPTORS[1], invocation.span, DESCRIPTORS[1].message.to_string())]
            }
            InvocationFinding::UseOverload { .. } => {
                let target = ctx
                    .analysis
                    .target(invocation)
                    .map_or("", |m| m.name.as_str());
                let descriptor = &DESCRIPTORS[2];
                vec![report(
                    descriptor,
                    invocation.span,
                    descriptor.format_message(&[(TARGET_METHOD_NAME, target)]),
                )
                .with_property(TARGET_METHOD_NAME, target)]
            }
        }
    }
}
