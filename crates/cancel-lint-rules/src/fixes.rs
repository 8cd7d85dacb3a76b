//! Code fixes for the cancellation rules.
//!
//! Fixing is two-phase. [`EditGenerator::offers`] lists what can be done for
//! a diagnostic without touching text. [`EditGenerator::materialize`] turns
//! one offer into a [`Fix`] against the document snapshot; it checks the
//! [`CancellationFlag`] before every edit and hands back nothing when the
//! flag is set.
//!
//! | Diagnostic | Offers |
//! |------------|--------|
//! | CT001, CT002 | Add optional CancellationToken |
//! | CT003, CT005 | Pass each candidate, or introduce a parameter |
//! | CT004 | As above, plus `CancellationToken.None` at low priority |

mod shapes;

use cancel_lint_core::edit::EditError;
use cancel_lint_core::utils::{discover, CancellationCandidate};
use cancel_lint_core::{
    enclosing_declaration, CancellationFlag, Diagnostic, FileContext, Fix, Invocation, Span, TextEdit,
};
use tracing::debug;

use crate::missing_token_declaration::{CODE_FIRE_AND_FORGET, CODE_HANDLE};
use crate::missing_token_invocation::{CODE_ADD_TOKEN, CODE_USE_OVERLOAD, CODE_USE_REAL_TOKEN};
use shapes::Placement;

/// Equivalence key for adding a parameter to a flagged declaration.
pub const ADD_OPTIONAL_TOKEN_KEY: &str = "AddOptionalCancellationToken";
/// Equivalence key for passing an in-scope token.
pub const PASS_TOKEN_KEY: &str = "PassTokenFromMethod";
/// Equivalence key for introducing a parameter on the enclosing method.
pub const INTRODUCE_PARAMETER_KEY: &str = "IntroduceCancellationTokenParameter";
/// Equivalence key for passing `CancellationToken.None`.
pub const PASS_NONE_KEY: &str = "PassNoneCancellationToken";

/// Catalog entry for one kind of fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixDescriptor {
    /// Equivalence key shared by every offer of this kind. Candidate fixes
    /// append the candidate key when more than one candidate is in scope.
    pub equivalence_key: &'static str,
    /// Title template; `{candidate}` is replaced by the candidate description.
    pub title: &'static str,
    /// Diagnostic ids the fix is offered for.
    pub codes: &'static [&'static str],
    /// Ordering among offers for the same diagnostic.
    pub priority: FixPriority,
}

const ADD_OPTIONAL_TOKEN: FixDescriptor = FixDescriptor {
    equivalence_key: ADD_OPTIONAL_TOKEN_KEY,
    title: "Add optional CancellationToken",
    codes: &[CODE_HANDLE, CODE_FIRE_AND_FORGET],
    priority: FixPriority::Normal,
};

const PASS_TOKEN: FixDescriptor = FixDescriptor {
    equivalence_key: PASS_TOKEN_KEY,
    title: "Pass {candidate} as CancellationToken",
    codes: &[CODE_USE_REAL_TOKEN, CODE_ADD_TOKEN, CODE_USE_OVERLOAD],
    priority: FixPriority::Normal,
};

const INTRODUCE_PARAMETER: FixDescriptor = FixDescriptor {
    equivalence_key: INTRODUCE_PARAMETER_KEY,
    title: "Introduce CancellationToken parameter",
    codes: &[CODE_USE_REAL_TOKEN, CODE_ADD_TOKEN, CODE_USE_OVERLOAD],
    priority: FixPriority::Normal,
};

const PASS_NONE: FixDescriptor = FixDescriptor {
    equivalence_key: PASS_NONE_KEY,
    title: "Pass CancellationToken.None to express intent",
    codes: &[CODE_ADD_TOKEN],
    priority: FixPriority::Low,
};

static FIX_DESCRIPTORS: [FixDescriptor; 4] = [ADD_OPTIONAL_TOKEN, PASS_TOKEN, INTRODUCE_PARAMETER, PASS_NONE];

/// Errors materializing a fix.
#[derive(Debug, thiserror::Error)]
pub enum FixError {
    /// The cancellation flag was set; nothing was produced.
    #[error("fix computation was cancelled")]
    Cancelled,

    /// The node the offer refers to is not in the document.
    #[error("no {kind} at {span:?}")]
    NodeNotFound {
        /// Node kind searched for.
        kind: &'static str,
        /// Span searched at.
        span: Span,
    },

    /// The generated edits do not apply to the document.
    #[error(transparent)]
    Edit(#[from] EditError),
}

/// Ordering among offers for the same diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FixPriority {
    /// Preferred.
    Normal,
    /// Offered as an alternative only.
    Low,
}

/// What a fix does, with the node it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixAction {
    /// Add `CancellationToken cancellationToken = default` to a declaration.
    AddOptionalParameter {
        /// Span of the method name token.
        declaration: Span,
    },
    /// Pass an in-scope token at a call.
    PassCandidate {
        /// Diagnostic span inside the call.
        target: Span,
        /// Token to pass.
        candidate: CancellationCandidate,
    },
    /// Add a parameter to the enclosing method and pass it at a call.
    IntroduceParameter {
        /// Diagnostic span inside the call.
        target: Span,
    },
    /// Append `CancellationToken.None` to a call.
    PassNone {
        /// Diagnostic span inside the call.
        target: Span,
    },
}

/// A fix that can be materialized for a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOffer {
    /// Title shown to the user.
    pub title: String,
    /// Groups equivalent fixes for fix-all operations.
    pub equivalence_key: String,
    /// Ordering among offers for the same diagnostic.
    pub priority: FixPriority,
    /// What the fix does.
    pub action: FixAction,
}

impl FixOffer {
    fn new(descriptor: &FixDescriptor, action: FixAction) -> Self {
        Self {
            title: descriptor.title.to_string(),
            equivalence_key: descriptor.equivalence_key.to_string(),
            priority: descriptor.priority,
            action,
        }
    }
}

/// Returns the first normal-priority offer, else the first low-priority one.
#[must_use]
pub fn preferred(offers: &[FixOffer]) -> Option<&FixOffer> {
    offers.iter().min_by_key(|o| o.priority)
}

/// Builds fixes for diagnostics reported by this crate's rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditGenerator;

impl EditGenerator {
    /// Creates a generator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Every kind of fix this generator offers, in catalog order.
    #[must_use]
    pub fn descriptors(&self) -> &'static [FixDescriptor] {
        &FIX_DESCRIPTORS
    }

    /// Diagnostic ids this generator can fix.
    #[must_use]
    pub fn fixable_codes(&self) -> &'static [&'static str] {
        &[CODE_HANDLE, CODE_FIRE_AND_FORGET, CODE_USE_REAL_TOKEN, CODE_ADD_TOKEN, CODE_USE_OVERLOAD]
    }

    /// Lists the fixes available for `diagnostic` in `ctx.document`.
    ///
    /// Returns an empty list for diagnostics from another document or rule,
    /// and when the flagged node cannot be found.
    #[must_use]
    pub fn offers(&self, ctx: &FileContext<'_>, diagnostic: &Diagnostic) -> Vec<FixOffer> {
        if diagnostic.location.document != ctx.document_id {
            return Vec::new();
        }
        let span = diagnostic.location.span;

        match diagnostic.code.as_str() {
            CODE_HANDLE | CODE_FIRE_AND_FORGET => ctx
                .document
                .method_at(span)
                .map(|_| {
                    FixOffer::new(&ADD_OPTIONAL_TOKEN, FixAction::AddOptionalParameter { declaration: span })
                })
                .into_iter()
                .collect(),
            code @ (CODE_USE_REAL_TOKEN | CODE_ADD_TOKEN | CODE_USE_OVERLOAD) => {
                let Some((_, invocation)) = ctx.document.invocation_containing(span) else {
                    return Vec::new();
                };
                let candidates = discover(ctx.analysis, ctx.document, invocation);
                let mut offers: Vec<FixOffer> = candidates
                    .iter()
                    .map(|candidate| {
                        let mut offer = FixOffer::new(
                            &PASS_TOKEN,
                            FixAction::PassCandidate {
                                target: span,
                                candidate: candidate.clone(),
                            },
                        );
                        offer.title = PASS_TOKEN.title.replace("{candidate}", &candidate.description());
                        if candidates.len() > 1 {
                            offer.equivalence_key.push_str(&candidate.key());
                        }
                        offer
                    })
                    .collect();

                if candidates.is_empty() && enclosing_declaration(ctx.document, invocation).is_some() {
                    offers.push(FixOffer::new(
                        &INTRODUCE_PARAMETER,
                        FixAction::IntroduceParameter { target: span },
                    ));
                }
                if code == CODE_ADD_TOKEN {
                    offers.push(FixOffer::new(&PASS_NONE, FixAction::PassNone { target: span }));
                }
                offers
            }
            _ => Vec::new(),
        }
    }

    /// Computes the edits for one offer.
    ///
    /// # Errors
    ///
    /// Returns [`FixError::Cancelled`] if `cancel` is set before the fix is
    /// complete, [`FixError::NodeNotFound`] if the targeted node is gone, and
    /// [`FixError::Edit`] if the edits would not apply to the document.
    pub fn materialize(
        &self,
        ctx: &FileContext<'_>,
        offer: &FixOffer,
        cancel: &CancellationFlag,
    ) -> Result<Fix, FixError> {
        let config = ctx.analysis.config();
        let document = ctx.document;
        let mut edits = EditSink::new(cancel);

        match &offer.action {
            FixAction::AddOptionalParameter { declaration } => {
                let decl = document.method_at(*declaration).ok_or(FixError::NodeNotFound {
                    kind: "method declaration",
                    span: *declaration,
                })?;
                edits.push_optional(shapes::import(config, document))?;
                let name = shapes::free_parameter_name(decl);
                edits.push(shapes::parameter(decl, shapes::token_type(config), &name))?;
            }
            FixAction::PassCandidate { target, candidate } => {
                let (_, invocation) = invocation_at(ctx, *target)?;
                let placement = shapes::placement(ctx.analysis, invocation, *target);
                edits.push(shapes::argument(ctx.analysis, invocation, placement, &candidate.identifier))?;
            }
            FixAction::IntroduceParameter { target } => {
                let (_, invocation) = invocation_at(ctx, *target)?;
                let decl = enclosing_declaration(document, invocation).ok_or(FixError::NodeNotFound {
                    kind: "enclosing method declaration",
                    span: *target,
                })?;
                let name = shapes::free_parameter_name(decl);
                edits.push_optional(shapes::import(config, document))?;
                edits.push(shapes::parameter(decl, shapes::token_type(config), &name))?;
                let placement = shapes::placement(ctx.analysis, invocation, *target);
                edits.push(shapes::argument(ctx.analysis, invocation, placement, &name))?;
            }
            FixAction::PassNone { target } => {
                let (_, invocation) = invocation_at(ctx, *target)?;
                edits.push_optional(shapes::import(config, document))?;
                let sentinel = shapes::none_sentinel(config);
                edits.push(shapes::argument(ctx.analysis, invocation, Placement::Append, &sentinel))?;
            }
        }

        let edits = edits.finish()?;
        let fix = Fix {
            title: offer.title.clone(),
            equivalence_key: offer.equivalence_key.clone(),
            document: ctx.document_id,
            edits,
        };
        fix.apply(&document.text)?;
        debug!(
            "Materialized '{}' with {} edit(s) in {}",
            fix.title,
            fix.edits.len(),
            document.path.display()
        );
        Ok(fix)
    }
}

fn invocation_at<'a>(
    ctx: &FileContext<'a>,
    span: Span,
) -> Result<(usize, &'a Invocation), FixError> {
    ctx.document
        .invocation_containing(span)
        .ok_or(FixError::NodeNotFound { kind: "invocation", span })
}

/// Collects edits, stopping as soon as cancellation is requested.
struct EditSink<'c> {
    cancel: &'c CancellationFlag,
    edits: Vec<TextEdit>,
}

impl<'c> EditSink<'c> {
    fn new(cancel: &'c CancellationFlag) -> Self {
        Self {
            cancel,
            edits: Vec::new(),
        }
    }

    fn checkpoint(&self) -> Result<(), FixError> {
        if self.cancel.is_cancelled() {
            debug!("Fix computation cancelled after {} edit(s)", self.edits.len());
            return Err(FixError::Cancelled);
        }
        Ok(())
    }

    fn push(&mut self, edit: TextEdit) -> Result<(), FixError> {
        self.checkpoint()?;
        self.edits.push(edit);
        Ok(())
    }

    fn push_optional(&mut self, edit: Option<TextEdit>) -> Result<(), FixError> {
        match edit {
            Some(edit) => self.push(edit),
            None => self.checkpoint(),
        }
    }

    fn finish(self) -> Result<Vec<TextEdit>, FixError> {
        self.checkpoint()?;
        Ok(self.edits)
    }
}
