//! Type classification against the cached well-known types.

use crate::context::{AnalysisContext, ContextError};
use crate::model::{Expression, MethodSymbol, SymbolProvider, TypeId};

/// Metadata name of the non-generic task type.
pub const TASK: &str = "System.Threading.Tasks.Task";
/// Metadata name of the generic task type.
pub const TASK_OF_T: &str = "System.Threading.Tasks.Task`1";
/// Metadata name of the non-generic value task type.
pub const VALUE_TASK: &str = "System.Threading.Tasks.ValueTask";
/// Metadata name of the generic value task type.
pub const VALUE_TASK_OF_T: &str = "System.Threading.Tasks.ValueTask`1";
/// Metadata name of the cancellation token type.
pub const CANCELLATION_TOKEN: &str = "System.Threading.CancellationToken";
/// Metadata name of `void`.
pub const VOID: &str = "System.Void";

/// Member of the cancellation token type meaning "no cancellation".
pub const NONE_MEMBER: &str = "None";

/// Identities of the types the rules classify against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WellKnownTypes {
    /// `Task`.
    pub task: TypeId,
    /// `Task<T>` definition.
    pub task_of_t: TypeId,
    /// `ValueTask`.
    pub value_task: TypeId,
    /// `ValueTask<T>` definition.
    pub value_task_of_t: TypeId,
    /// `CancellationToken`.
    pub cancellation_token: TypeId,
    /// `void`.
    pub void: TypeId,
}

impl WellKnownTypes {
    /// Looks up every well-known type.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::MissingWellKnownType`] for the first absent type.
    pub fn resolve(symbols: &dyn SymbolProvider) -> Result<Self, ContextError> {
        let lookup = |name: &'static str| {
            symbols
                .type_by_metadata_name(name)
                .ok_or(ContextError::MissingWellKnownType(name))
        };
        Ok(Self {
            task: lookup(TASK)?,
            task_of_t: lookup(TASK_OF_T)?,
            value_task: lookup(VALUE_TASK)?,
            value_task_of_t: lookup(VALUE_TASK_OF_T)?,
            cancellation_token: lookup(CANCELLATION_TOKEN)?,
            void: lookup(VOID)?,
        })
    }

    /// The asynchronous-handle definitions.
    #[must_use]
    pub fn asynchronous_handles(&self) -> [TypeId; 4] {
        [
            self.task,
            self.task_of_t,
            self.value_task,
            self.value_task_of_t,
        ]
    }
}

/// How a method's result can be observed by its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    /// Synchronous, or asynchronous through a type we do not track.
    Ordinary,
    /// Returns an awaitable handle.
    AsynchronousHandle,
    /// `async void`: the caller cannot await or cancel it.
    FireAndForget,
}

/// Returns true if `ty` is one of the awaitable handle types, ignoring type arguments.
#[must_use]
pub fn is_asynchronous_handle(ctx: &AnalysisContext<'_>, ty: TypeId) -> bool {
    let definition = ctx.symbols().original_definition(ty);
    ctx.well_known().asynchronous_handles().contains(&definition)
}

/// Returns true if `ty` is the cancellation token type.
#[must_use]
pub fn is_cancellation_token(ctx: &AnalysisContext<'_>, ty: TypeId) -> bool {
    ty == ctx.well_known().cancellation_token
}

/// Classifies a method's return shape; `None` when the return type is unresolved.
#[must_use]
pub fn return_shape(ctx: &AnalysisContext<'_>, method: &MethodSymbol) -> Option<ReturnShape> {
    let ret = method.return_type?;
    let shape = if is_asynchronous_handle(ctx, ret) {
        ReturnShape::AsynchronousHandle
    } else if method.is_async && ret == ctx.well_known().void {
        ReturnShape::FireAndForget
    } else {
        ReturnShape::Ordinary
    };
    Some(shape)
}

/// Returns true if the method already takes a cancellation token anywhere.
#[must_use]
pub fn has_cancellation_parameter(ctx: &AnalysisContext<'_>, method: &MethodSymbol) -> bool {
    method
        .parameters
        .iter()
        .any(|p| is_cancellation_token(ctx, p.ty))
}

/// Returns true if the expression is `CancellationToken.None`.
#[must_use]
pub fn is_none_sentinel(ctx: &AnalysisContext<'_>, expression: &Expression) -> bool {
    expression.member_access.as_ref().is_some_and(|access| {
        access.member == NONE_MEMBER
            && access.receiver == Some(ctx.well_known().cancellation_token)
    })
}
