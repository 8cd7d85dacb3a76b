//! Argument binding and overload matching.

use crate::context::AnalysisContext;
use crate::model::{ArgumentSyntax, Invocation, MethodId, MethodSymbol, ParameterSymbol};
use crate::utils::classify::{is_cancellation_token, is_none_sentinel};

/// Returns the parameter an argument binds to, with its index.
///
/// Named arguments bind by name; positional ones by position.
#[must_use]
pub fn bound_parameter<'m>(
    method: &'m MethodSymbol,
    position: usize,
    argument: &ArgumentSyntax,
) -> Option<(usize, &'m ParameterSymbol)> {
    match &argument.name {
        Some(name) => method
            .parameters
            .iter()
            .enumerate()
            .find(|(_, p)| &p.name == name),
        None => method.parameters.get(position).map(|p| (position, p)),
    }
}

/// An argument bound to a cancellation-typed parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundToken {
    /// Index of the argument in the call.
    pub argument: usize,
    /// Index of the parameter in the target.
    pub parameter: usize,
    /// Whether the argument is `CancellationToken.None`.
    pub is_none: bool,
}

/// Lists the call's arguments bound to cancellation-typed parameters of `target`.
#[must_use]
pub fn bound_cancellation_arguments(
    ctx: &AnalysisContext<'_>,
    target: &MethodSymbol,
    invocation: &Invocation,
) -> Vec<BoundToken> {
    invocation
        .arguments
        .arguments
        .iter()
        .enumerate()
        .filter_map(|(i, arg)| {
            let (index, parameter) = bound_parameter(target, i, arg)?;
            is_cancellation_token(ctx, parameter.ty).then(|| BoundToken {
                argument: i,
                parameter: index,
                is_none: is_none_sentinel(ctx, &arg.expression),
            })
        })
        .collect()
}

/// Returns the index of an optional cancellation parameter no argument binds to.
#[must_use]
pub fn unbound_optional_cancellation_parameter(
    ctx: &AnalysisContext<'_>,
    target: &MethodSymbol,
    invocation: &Invocation,
) -> Option<usize> {
    let bound: Vec<usize> = invocation
        .arguments
        .arguments
        .iter()
        .enumerate()
        .filter_map(|(i, arg)| bound_parameter(target, i, arg).map(|(index, _)| index))
        .collect();

    target
        .parameters
        .iter()
        .enumerate()
        .find(|(i, p)| p.is_optional && is_cancellation_token(ctx, p.ty) && !bound.contains(i))
        .map(|(i, _)| i)
}

/// Finds a sibling of `method` taking the same parameters plus a trailing token.
///
/// Siblings share the name and containing type. Parameters compare
/// positionally by unconstructed type; modifiers are not considered.
#[must_use]
pub fn overload_with_cancellation_token(ctx: &AnalysisContext<'_>, method: MethodId) -> Option<MethodId> {
    let symbols = ctx.symbols();
    let this = symbols.method(method)?;
    let owner = symbols.type_symbol(this.containing_type)?;

    owner.methods.iter().copied().find(|&candidate| {
        if candidate == method {
            return false;
        }
        let Some(other) = symbols.method(candidate) else {
            return false;
        };
        let Some((last, leading)) = other.parameters.split_last() else {
            return false;
        };
        other.name == this.name
            && other.parameters.len() == this.parameters.len() + 1
            && is_cancellation_token(ctx, last.ty)
            && leading.iter().zip(&this.parameters).all(|(a, b)| {
                symbols.original_definition(a.ty) == symbols.original_definition(b.ty)
            })
    })
}

/// Returns true if [`overload_with_cancellation_token`] finds a sibling.
#[must_use]
pub fn has_overload_with_cancellation_token(ctx: &AnalysisContext<'_>, method: MethodId) -> bool {
    overload_with_cancellation_token(ctx, method).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfiguration;
    use crate::model::{Compilation, CompilationBuilder, DocumentBuilder, SymbolProvider, TypeId};

    struct Fixture {
        compilation: Compilation,
        delay: MethodId,
        delay_with_token: MethodId,
        list_of_int: TypeId,
        list_of_string: TypeId,
        class: TypeId,
    }

    fn fixture() -> Fixture {
        let mut b = CompilationBuilder::with_system_types();
        let ct = b.type_id("System.Threading.CancellationToken").unwrap();
        let int = b.type_id("System.Int32").unwrap();
        let task = b.type_id("System.Threading.Tasks.Task").unwrap();
        let list = b.class("System.Collections.Generic.List`1");
        let list_of_int = b.constructed(list, "System.Int32");
        let list_of_string = b.constructed(list, "System.String");
        let class = b.class("Scheduler");
        let delay = b.add_method(
            MethodSymbol::new("Delay", class, Some(task)).param(ParameterSymbol::new("ms", int)),
        );
        let delay_with_token = b.add_method(
            MethodSymbol::new("Delay", class, Some(task))
                .param(ParameterSymbol::new("ms", int))
                .param(ParameterSymbol::new("token", ct)),
        );
        Fixture {
            compilation: b.build().unwrap(),
            delay,
            delay_with_token,
            list_of_int,
            list_of_string,
            class,
        }
    }

    #[test]
    fn finds_overload_with_trailing_token() {
        let f = fixture();
        let ctx = AnalysisContext::new(&f.compilation, EngineConfiguration::default()).unwrap();
        assert_eq!(
            overload_with_cancellation_token(&ctx, f.delay),
            Some(f.delay_with_token)
        );
        assert!(!has_overload_with_cancellation_token(&ctx, f.delay_with_token));
    }

    #[test]
    fn generic_parameters_compare_by_definition() {
        let mut f = fixture();
        let ct = f
            .compilation
            .type_by_metadata_name("System.Threading.CancellationToken")
            .unwrap();

        let process = MethodSymbol::new("Process", f.class, None)
            .param(ParameterSymbol::new("items", f.list_of_int));
        let process_with_token = MethodSymbol::new("Process", f.class, None)
            .param(ParameterSymbol::new("items", f.list_of_string))
            .param(ParameterSymbol::new("token", ct));
        f.compilation.methods.push(process);
        f.compilation.methods.push(process_with_token);
        let first = MethodId(2);
        let second = MethodId(3);
        f.compilation.types[f.class.0 as usize].methods.extend([first, second]);

        let ctx = AnalysisContext::new(&f.compilation, EngineConfiguration::default()).unwrap();
        assert_eq!(overload_with_cancellation_token(&ctx, first), Some(second));
    }

    #[test]
    fn binding_prefers_names_over_positions() {
        let f = fixture();
        let ctx = AnalysisContext::new(&f.compilation, EngineConfiguration::default()).unwrap();
        let target = ctx.symbols().method(f.delay_with_token).unwrap();
        let ct = ctx.well_known().cancellation_token;

        let mut doc = DocumentBuilder::new("A.cs", "Delay(token: CancellationToken.None, ms: 10)");
        let _ = doc.invoke("Delay", Some(f.delay_with_token)).none_sentinel(0, ct);
        let document = doc.build().unwrap();
        let invocation = &document.invocations[0];

        let bound = bound_cancellation_arguments(&ctx, target, invocation);
        assert_eq!(
            bound,
            [BoundToken {
                argument: 0,
                parameter: 1,
                is_none: true
            }]
        );
    }

    #[test]
    fn unbound_optional_token_is_reported() {
        let mut f = fixture();
        f.compilation.methods[f.delay_with_token.0 as usize].parameters[1].is_optional = true;
        let ctx = AnalysisContext::new(&f.compilation, EngineConfiguration::default()).unwrap();
        let target = ctx.symbols().method(f.delay_with_token).unwrap();

        let mut doc = DocumentBuilder::new("A.cs", "Delay(10); Delay(10, token);");
        let _ = doc.invoke("Delay", Some(f.delay_with_token)).index();
        let _ = doc.invoke("Delay", Some(f.delay_with_token)).index();
        let document = doc.build().unwrap();

        assert_eq!(
            unbound_optional_cancellation_parameter(&ctx, target, &document.invocations[0]),
            Some(1)
        );
        assert_eq!(
            unbound_optional_cancellation_parameter(&ctx, target, &document.invocations[1]),
            None
        );
    }
}
