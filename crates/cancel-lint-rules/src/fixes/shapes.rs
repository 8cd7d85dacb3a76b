//! Text shapes inserted by the fixes.

use cancel_lint_core::model::{Document, Invocation, MethodDeclaration};
use cancel_lint_core::utils::{
    bound_cancellation_arguments, overload_with_cancellation_token, unbound_optional_cancellation_parameter,
};
use cancel_lint_core::{AnalysisContext, EngineConfiguration, Span, TextEdit};

const NAMESPACE: &str = "System.Threading";
const QUALIFIED_TYPE: &str = "System.Threading.CancellationToken";
const SHORT_TYPE: &str = "CancellationToken";
const PARAMETER_NAME: &str = "cancellationToken";

/// Type reference honoring the short-name preference.
pub(super) fn token_type(config: &EngineConfiguration) -> &'static str {
    if config.prefer_short_type_names {
        SHORT_TYPE
    } else {
        QUALIFIED_TYPE
    }
}

/// `CancellationToken.None`, qualified like [`token_type`].
pub(super) fn none_sentinel(config: &EngineConfiguration) -> String {
    format!("{}.None", token_type(config))
}

/// The `using System.Threading;` insertion, when short names need it.
pub(super) fn import(config: &EngineConfiguration, document: &Document) -> Option<TextEdit> {
    if !config.prefer_short_type_names || document.imports(NAMESPACE) {
        return None;
    }
    Some(match document.usings.iter().max_by_key(|u| u.span.end) {
        Some(last) => TextEdit::insert(last.span.end, format!("\nusing {NAMESPACE};")),
        None => TextEdit::insert(0, format!("using {NAMESPACE};\n")),
    })
}

/// First of `cancellationToken`, `cancellationToken1`, ... not already a parameter.
pub(super) fn free_parameter_name(declaration: &MethodDeclaration) -> String {
    let taken = |name: &str| declaration.parameter_list.parameters.iter().any(|p| p.name == name);
    if !taken(PARAMETER_NAME) {
        return PARAMETER_NAME.to_string();
    }
    (1..)
        .map(|i| format!("{PARAMETER_NAME}{i}"))
        .find(|name| !taken(name))
        .unwrap_or_else(|| PARAMETER_NAME.to_string())
}

/// Appends `{Type} {name} = default` to the declaration's parameter list.
pub(super) fn parameter(declaration: &MethodDeclaration, ty: &str, name: &str) -> TextEdit {
    let list = &declaration.parameter_list;
    let separator = if list.parameters.is_empty() { "" } else { ", " };
    TextEdit::insert(list.close, format!("{separator}{ty} {name} = default"))
}

/// Where a token argument goes in a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Placement {
    /// Replace the argument at this index.
    Replace(usize),
    /// Append after the last argument.
    Append,
}

/// Replaces the `CancellationToken.None` argument at `target`, else the first
/// one bound to a token parameter, else appends.
///
/// A `None` argument bound to any other parameter is left alone.
pub(super) fn placement(ctx: &AnalysisContext<'_>, invocation: &Invocation, target: Span) -> Placement {
    let Some(method) = ctx.target(invocation) else {
        return Placement::Append;
    };
    let arguments = &invocation.arguments.arguments;
    let replaceable: Vec<usize> = bound_cancellation_arguments(ctx, method, invocation)
        .into_iter()
        .filter(|b| b.is_none)
        .map(|b| b.argument)
        .collect();

    replaceable
        .iter()
        .copied()
        .find(|&i| arguments.get(i).is_some_and(|a| a.span == target))
        .or_else(|| replaceable.first().copied())
        .map_or(Placement::Append, Placement::Replace)
}

/// The parameter an appended token binds to, with its index in the callee.
///
/// That is the target's unbound optional token parameter, or the trailing
/// token of the overload the call should switch to.
fn appended_parameter(ctx: &AnalysisContext<'_>, invocation: &Invocation) -> Option<(usize, String)> {
    let target = ctx.target(invocation)?;
    if let Some(index) = unbound_optional_cancellation_parameter(ctx, target, invocation) {
        return target.parameters.get(index).map(|p| (index, p.name.clone()));
    }
    let overload = ctx.symbols().method(overload_with_cancellation_token(ctx, invocation.target?)?)?;
    let index = overload.parameters.len().checked_sub(1)?;
    overload.parameters.get(index).map(|p| (index, p.name.clone()))
}

/// Puts `expression` into the call's argument list.
///
/// Named arguments stay named. An appended argument is named when any
/// existing argument is, or when the parameter it binds to is not the next
/// position, since skipped optional parameters would otherwise capture it.
pub(super) fn argument(
    ctx: &AnalysisContext<'_>,
    invocation: &Invocation,
    placement: Placement,
    expression: &str,
) -> TextEdit {
    let list = &invocation.arguments;
    if let Placement::Replace(index) = placement {
        if let Some(existing) = list.arguments.get(index) {
            let text = match &existing.name {
                Some(name) => format!("{name}: {expression}"),
                None => expression.to_string(),
            };
            return TextEdit::replace(existing.span, text);
        }
    }

    let separator = if list.arguments.is_empty() { "" } else { ", " };
    let position = list.arguments.len();
    let named = list.arguments.iter().any(|a| a.name.is_some());
    let text = match appended_parameter(ctx, invocation) {
        Some((index, name)) if named || index != position => format!("{name}: {expression}"),
        _ => expression.to_string(),
    };
    TextEdit::insert(list.close, format!("{separator}{text}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cancel_lint_core::model::{ParameterList, ParameterSyntax, UsingDirective};

    fn declaration(names: &[&str]) -> MethodDeclaration {
        MethodDeclaration {
            symbol: None,
            name_span: Span::new(0, 3),
            parameter_list: ParameterList {
                open: 3,
                close: 4,
                parameters: names
                    .iter()
                    .map(|n| ParameterSyntax {
                        name: (*n).to_string(),
                        span: Span::new(3, 4),
                    })
                    .collect(),
            },
        }
    }

    #[test]
    fn test_free_parameter_name() {
        assert_eq!(free_parameter_name(&declaration(&[])), "cancellationToken");
        assert_eq!(
            free_parameter_name(&declaration(&["cancellationToken", "cancellationToken1"])),
            "cancellationToken2"
        );
    }

    #[test]
    fn test_parameter_separator() {
        let empty = parameter(&declaration(&[]), SHORT_TYPE, "ct");
        assert_eq!(empty.new_text, "CancellationToken ct = default");
        let one = parameter(&declaration(&["x"]), SHORT_TYPE, "ct");
        assert_eq!(one.new_text, ", CancellationToken ct = default");
        assert_eq!(one.span, Span::empty(4));
    }

    #[test]
    fn test_import_placement() {
        let short = EngineConfiguration {
            prefer_short_type_names: true,
            ..EngineConfiguration::default()
        };
        let mut document = Document::new("Test.cs", "using System;\nclass C {}");
        assert!(import(&EngineConfiguration::default(), &document).is_none());

        document.usings.push(UsingDirective {
            namespace: "System".to_string(),
            span: Span::new(0, 13),
        });
        let edit = import(&short, &document).unwrap();
        assert_eq!(edit, TextEdit::insert(13, "\nusing System.Threading;"));

        document.usings.push(UsingDirective {
            namespace: NAMESPACE.to_string(),
            span: Span::new(0, 13),
        });
        assert!(import(&short, &document).is_none());

        let bare = Document::new("Test.cs", "class C {}");
        assert_eq!(
            import(&short, &bare),
            Some(TextEdit::insert(0, "using System.Threading;\n"))
        );
    }

    #[test]
    fn test_type_names() {
        let short = EngineConfiguration {
            prefer_short_type_names: true,
            ..EngineConfiguration::default()
        };
        assert_eq!(none_sentinel(&short), "CancellationToken.None");
        assert_eq!(
            none_sentinel(&EngineConfiguration::default()),
            "System.Threading.CancellationToken.None"
        );
    }
}
