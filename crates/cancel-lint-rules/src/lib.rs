//! # cancel-lint-rules
//!
//! Built-in cancellation-token rules, the CA2016 overlap suppressor and the
//! code fixes for cancel-lint.
//!
//! ## Available Rules
//!
//! | Code | Name | Severity | Description |
//! |------|------|----------|-------------|
//! | CT001 | `missing-token-on-asynchronous-handle` | warning | `Task`/`ValueTask` method without a token parameter |
//! | CT002 | `missing-token-on-fire-and-forget` | warning | `async void` method without a token parameter |
//! | CT003 | `use-real-token` | info | Call passes `CancellationToken.None` |
//! | CT004 | `add-cancellation-token-to-call` | warning | Call leaves an optional token parameter unbound |
//! | CT005 | `use-overload-with-cancellation-token` | warning | A sibling overload accepts a token |
//!
//! CT001 and CT002 come from the `declaration-cancellation-token` rule, CT003
//! to CT005 from `call-site-cancellation-token`.
//!
//! ## Usage
//!
//! ```ignore
//! use cancel_lint_core::Compilation;
//! use cancel_lint_rules::analyzer_builder;
//!
//! let analyzer = analyzer_builder().config_file("cancel-lint.toml").build()?;
//! let result = analyzer.analyze(&Compilation::from_json(&json)?)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixes;
mod missing_token_declaration;
mod missing_token_invocation;
mod overlap_suppressor;
mod registry;

pub use fixes::{preferred, EditGenerator, FixAction, FixDescriptor, FixError, FixOffer, FixPriority};
pub use missing_token_declaration::MissingTokenDeclaration;
pub use missing_token_invocation::{evaluate_invocation, InvocationFinding, MissingTokenInvocation};
pub use overlap_suppressor::OverlapSuppressor;
pub use registry::{
    all_rules, all_suppressors, analyzer_builder, fix_catalog, rule_catalog, suppression_catalog,
};

/// Rule ids and names.
pub mod codes {
    pub use crate::missing_token_declaration::{
        CODE_FIRE_AND_FORGET, CODE_HANDLE, NAME_FIRE_AND_FORGET, NAME_HANDLE,
        RULE_NAME as DECLARATION_RULE_NAME,
    };
    pub use crate::missing_token_invocation::{
        CODE_ADD_TOKEN, CODE_USE_OVERLOAD, CODE_USE_REAL_TOKEN, NAME_ADD_TOKEN, NAME_USE_OVERLOAD,
        NAME_USE_REAL_TOKEN, RULE_NAME as INVOCATION_RULE_NAME, TARGET_METHOD_NAME,
    };
    pub use crate::overlap_suppressor::{SUPPRESSED_ID, SUPPRESSION_ID};
}

/// Re-export core types for convenience.
pub use cancel_lint_core::{Diagnostic, Rule, Severity, Suppressor};
