//! Already-resolved syntax nodes with spans into the document text.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::symbols::{MethodId, TypeId};
use crate::types::Span;

/// A source document and the nodes the rules evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Path of the document.
    pub path: PathBuf,
    /// Full text.
    pub text: String,
    /// Top-level using directives, in source order.
    #[serde(default)]
    pub usings: Vec<UsingDirective>,
    /// Method declarations.
    #[serde(default)]
    pub methods: Vec<MethodDeclaration>,
    /// Call expressions.
    #[serde(default)]
    pub invocations: Vec<Invocation>,
}

impl Document {
    /// Creates a document without nodes.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
            usings: Vec::new(),
            methods: Vec::new(),
            invocations: Vec::new(),
        }
    }

    /// Returns the source text covered by `span`, or `""` when out of range.
    #[must_use]
    pub fn slice(&self, span: Span) -> &str {
        self.text.get(span.start..span.end).unwrap_or("")
    }

    /// Returns true if a using directive imports `namespace` exactly.
    #[must_use]
    pub fn imports(&self, namespace: &str) -> bool {
        self.usings.iter().any(|u| u.namespace == namespace)
    }

    /// Finds the method declaration whose name token is at `span`.
    #[must_use]
    pub fn method_at(&self, span: Span) -> Option<&MethodDeclaration> {
        self.methods
            .iter()
            .find(|m| m.name_span == span)
            .or_else(|| self.methods.iter().find(|m| m.name_span.contains(span)))
    }

    /// Finds the innermost invocation whose span contains `span`.
    #[must_use]
    pub fn invocation_containing(&self, span: Span) -> Option<(usize, &Invocation)> {
        self.invocations
            .iter()
            .enumerate()
            .filter(|(_, inv)| inv.span.contains(span))
            .min_by_key(|(_, inv)| inv.span.len())
    }
}

/// A `using Namespace;` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsingDirective {
    /// Imported namespace.
    pub namespace: String,
    /// Span of the whole directive, including the semicolon.
    pub span: Span,
}

/// A method declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDeclaration {
    /// Declared symbol; `None` when it could not be resolved.
    pub symbol: Option<MethodId>,
    /// Span of the method name token.
    pub name_span: Span,
    /// Parameter list.
    pub parameter_list: ParameterList,
}

/// A parenthesized parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterList {
    /// Offset of `(`.
    pub open: usize,
    /// Offset of `)`.
    pub close: usize,
    /// Parameters in source order.
    #[serde(default)]
    pub parameters: Vec<ParameterSyntax>,
}

/// A parameter in a parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSyntax {
    /// Parameter identifier.
    pub name: String,
    /// Span of the whole parameter.
    pub span: Span,
}

/// A call expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// Span of the whole call expression.
    pub span: Span,
    /// Resolved target; `None` when overload resolution failed.
    pub target: Option<MethodId>,
    /// Argument list.
    pub arguments: ArgumentList,
    /// Index into [`Document::methods`] of the enclosing declaration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enclosing_method: Option<usize>,
    /// Enclosing type; derived from the enclosing method when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enclosing_type: Option<TypeId>,
}

/// A parenthesized argument list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentList {
    /// Offset of `(`.
    pub open: usize,
    /// Offset of `)`.
    pub close: usize,
    /// Arguments in source order.
    #[serde(default)]
    pub arguments: Vec<ArgumentSyntax>,
}

/// A call argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentSyntax {
    /// Span of the whole argument.
    pub span: Span,
    /// Parameter name for a named argument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Resolved expression information.
    #[serde(default)]
    pub expression: Expression,
}

/// Semantic facts about an argument expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    /// Resolved type of the expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<TypeId>,
    /// Present when the expression is `receiver.member`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_access: Option<MemberAccess>,
}

/// A `receiver.member` access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberAccess {
    /// Type named by the receiver, when the receiver resolves to a type.
    pub receiver: Option<TypeId>,
    /// Accessed member name.
    pub member: String,
}
