//! Builders that assemble a [`Compilation`] from source text.
//!
//! Nodes are located by searching the text, so a host (or a test) only has
//! to say *which* declaration or call it means and what it resolves to:
//!
//! ```
//! use cancel_lint_core::model::{CompilationBuilder, DocumentBuilder, MethodSymbol};
//!
//! let mut b = CompilationBuilder::with_system_types();
//! let task = b.type_id("System.Threading.Tasks.Task").unwrap();
//! let class = b.class("TestClass");
//! let run = b.add_method(MethodSymbol::new("RunAsync", class, Some(task)));
//!
//! let mut doc = DocumentBuilder::new("Test.cs", "class TestClass { Task RunAsync() => null; }");
//! doc.declare(Some(run), "RunAsync");
//! b.add_document(doc.build().unwrap());
//! let compilation = b.build().unwrap();
//! assert_eq!(compilation.documents[0].methods.len(), 1);
//! ```

use super::symbols::{
    DocumentId, FieldSymbol, InterfaceImplementation, MethodId, MethodSymbol, PropertySymbol,
    TypeId, TypeKind, TypeSymbol,
};
use super::syntax::{
    ArgumentList, ArgumentSyntax, Document, Expression, Invocation, MemberAccess,
    MethodDeclaration, ParameterList, ParameterSyntax, UsingDirective,
};
use super::{index_to_u32, Compilation, ModelError, SymbolProvider};
use crate::types::{ExternalDiagnostic, Span};

/// Runtime types every compilation references.
const SYSTEM_TYPES: &[(&str, TypeKind)] = &[
    ("System.Void", TypeKind::Struct),
    ("System.Int32", TypeKind::Struct),
    ("System.String", TypeKind::Class),
    ("System.Threading.Tasks.Task", TypeKind::Class),
    ("System.Threading.Tasks.Task`1", TypeKind::Class),
    ("System.Threading.Tasks.ValueTask", TypeKind::Struct),
    ("System.Threading.Tasks.ValueTask`1", TypeKind::Struct),
    ("System.Threading.CancellationToken", TypeKind::Struct),
];

/// Incrementally builds a [`Compilation`].
#[derive(Debug, Default)]
pub struct CompilationBuilder {
    compilation: Compilation,
}

impl CompilationBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder pre-populated with the runtime's well-known types.
    #[must_use]
    pub fn with_system_types() -> Self {
        let mut builder = Self::new();
        for (name, kind) in SYSTEM_TYPES {
            let mut symbol = TypeSymbol::new(*name);
            symbol.kind = *kind;
            builder.add_type(symbol);
        }
        builder
    }

    /// Adds a type symbol.
    pub fn add_type(&mut self, symbol: TypeSymbol) -> TypeId {
        self.compilation.types.push(symbol);
        TypeId(index_to_u32(self.compilation.types.len() - 1))
    }

    /// Adds an empty class.
    pub fn class(&mut self, name: &str) -> TypeId {
        self.add_type(TypeSymbol::new(name))
    }

    /// Adds an empty interface.
    pub fn interface(&mut self, name: &str) -> TypeId {
        let mut symbol = TypeSymbol::new(name);
        symbol.kind = TypeKind::Interface;
        self.add_type(symbol)
    }

    /// Adds a constructed generic type such as `Task<int>`.
    pub fn constructed(&mut self, definition: TypeId, arguments: &str) -> TypeId {
        let base = self
            .compilation
            .type_symbol(definition)
            .map_or_else(String::new, |t| t.name.clone());
        let mut symbol = TypeSymbol::new(format!("{base}[{arguments}]"));
        symbol.original_definition = Some(definition);
        self.add_type(symbol)
    }

    /// Looks up a type by metadata name.
    #[must_use]
    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        self.compilation.type_by_metadata_name(name)
    }

    /// Mutable access to a type symbol (base types, interfaces, kind).
    pub fn type_mut(&mut self, id: TypeId) -> Option<&mut TypeSymbol> {
        self.compilation.types.get_mut(id.index())
    }

    /// Adds a method and registers it on its containing type.
    pub fn add_method(&mut self, method: MethodSymbol) -> MethodId {
        let owner = method.containing_type;
        self.compilation.methods.push(method);
        let id = MethodId(index_to_u32(self.compilation.methods.len() - 1));
        if let Some(ty) = self.type_mut(owner) {
            ty.methods.push(id);
        }
        id
    }

    /// Adds a field to a type.
    pub fn add_field(&mut self, owner: TypeId, name: &str, ty: TypeId) {
        if let Some(symbol) = self.type_mut(owner) {
            symbol.fields.push(FieldSymbol {
                name: name.to_string(),
                ty,
            });
        }
    }

    /// Adds a property to a type.
    pub fn add_property(&mut self, owner: TypeId, property: PropertySymbol) {
        if let Some(symbol) = self.type_mut(owner) {
            symbol.properties.push(property);
        }
    }

    /// Records an explicit interface implementation.
    pub fn implement(&mut self, owner: TypeId, interface_member: MethodId, implementation: MethodId) {
        if let Some(symbol) = self.type_mut(owner) {
            symbol.interface_implementations.push(InterfaceImplementation {
                interface_member,
                implementation,
            });
        }
    }

    /// Adds a document.
    pub fn add_document(&mut self, document: Document) -> DocumentId {
        self.compilation.documents.push(document);
        DocumentId(index_to_u32(self.compilation.documents.len() - 1))
    }

    /// Records a diagnostic reported by a third-party analyzer.
    pub fn external_diagnostic(&mut self, diagnostic: ExternalDiagnostic) {
        self.compilation.external_diagnostics.push(diagnostic);
    }

    /// Validates and returns the compilation.
    ///
    /// # Errors
    ///
    /// Returns an error if any id or span is dangling.
    pub fn build(self) -> Result<Compilation, ModelError> {
        self.compilation.validate()?;
        Ok(self.compilation)
    }
}

/// Builds a [`Document`] by locating nodes in its text.
///
/// Searches start at a cursor that advances past every located node, so
/// repeated names resolve to successive occurrences.
#[derive(Debug)]
pub struct DocumentBuilder {
    document: Document,
    cursor: usize,
    error: Option<ModelError>,
}

impl DocumentBuilder {
    /// Starts a document.
    #[must_use]
    pub fn new(path: &str, text: &str) -> Self {
        Self {
            document: Document::new(path, text),
            cursor: 0,
            error: None,
        }
    }

    fn fail(&mut self, needle: &str) {
        if self.error.is_none() {
            self.error = Some(ModelError::NotFound {
                needle: needle.to_string(),
                path: self.document.path.display().to_string(),
            });
        }
    }

    fn find(&self, needle: &str) -> Option<usize> {
        self.document
            .text
            .get(self.cursor..)
            .and_then(|rest| rest.find(needle))
            .map(|i| i + self.cursor)
    }

    /// Registers the `using {namespace};` directive.
    pub fn using(&mut self, namespace: &str) -> &mut Self {
        let needle = format!("using {namespace};");
        match self.document.text.find(&needle) {
            Some(start) => self.document.usings.push(UsingDirective {
                namespace: namespace.to_string(),
                span: Span::new(start, start + needle.len()),
            }),
            None => self.fail(&needle),
        }
        self
    }

    /// Moves the cursor just past the next occurrence of `needle`.
    pub fn seek(&mut self, needle: &str) -> &mut Self {
        match self.find(needle) {
            Some(pos) => self.cursor = pos + needle.len(),
            None => self.fail(needle),
        }
        self
    }

    /// Declares the next method named `name`; returns its index.
    pub fn declare(&mut self, symbol: Option<MethodId>, name: &str) -> usize {
        let index = self.document.methods.len();
        let needle = format!("{name}(");
        let Some(start) = self.find(&needle) else {
            self.fail(&needle);
            return index;
        };
        let open = start + name.len();
        let Some(close) = matching_paren(&self.document.text, open) else {
            self.fail(&needle);
            return index;
        };

        let parameters = split_top_level(&self.document.text, open + 1, close, true)
            .into_iter()
            .map(|span| ParameterSyntax {
                name: parameter_name(&self.document.text[span.start..span.end]),
                span,
            })
            .collect();

        self.document.methods.push(MethodDeclaration {
            symbol,
            name_span: Span::new(start, open),
            parameter_list: ParameterList {
                open,
                close,
                parameters,
            },
        });
        self.cursor = open + 1;
        index
    }

    /// Locates the next call to `callee` (e.g. `"Task.Delay"`).
    ///
    /// The call is attached to the most recently declared method.
    pub fn invoke(&mut self, callee: &str, target: Option<MethodId>) -> InvocationBuilder<'_> {
        let needle = format!("{callee}(");
        let located = self.find(&needle).and_then(|start| {
            let open = start + callee.len();
            matching_paren(&self.document.text, open).map(|close| (start, open, close))
        });
        let Some((start, open, close)) = located else {
            self.fail(&needle);
            return InvocationBuilder {
                builder: self,
                index: None,
            };
        };

        let arguments = split_top_level(&self.document.text, open + 1, close, false)
            .into_iter()
            .map(|span| ArgumentSyntax {
                span,
                name: argument_name(&self.document.text[span.start..span.end]),
                expression: Expression::default(),
            })
            .collect();

        self.document.invocations.push(Invocation {
            span: Span::new(start, close + 1),
            target,
            arguments: ArgumentList {
                open,
                close,
                arguments,
            },
            enclosing_method: self.document.methods.len().checked_sub(1),
            enclosing_type: None,
        });
        self.cursor = open + 1;
        let index = Some(self.document.invocations.len() - 1);
        InvocationBuilder {
            builder: self,
            index,
        }
    }

    /// Returns the document, or the first lookup failure.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NotFound`] if any node could not be located.
    pub fn build(self) -> Result<Document, ModelError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.document),
        }
    }
}

/// Attaches semantic facts to a located call.
#[derive(Debug)]
pub struct InvocationBuilder<'a> {
    builder: &'a mut DocumentBuilder,
    index: Option<usize>,
}

impl InvocationBuilder<'_> {
    fn invocation(&mut self) -> Option<&mut Invocation> {
        self.index
            .and_then(|i| self.builder.document.invocations.get_mut(i))
    }

    fn argument(&mut self, position: usize) -> Option<&mut ArgumentSyntax> {
        self.invocation()
            .and_then(|inv| inv.arguments.arguments.get_mut(position))
    }

    /// Sets the enclosing method declaration (`None` for field initializers).
    #[must_use]
    pub fn within(mut self, method: Option<usize>) -> Self {
        if let Some(inv) = self.invocation() {
            inv.enclosing_method = method;
        }
        self
    }

    /// Sets the enclosing type explicitly.
    #[must_use]
    pub fn in_type(mut self, ty: TypeId) -> Self {
        if let Some(inv) = self.invocation() {
            inv.enclosing_type = Some(ty);
        }
        self
    }

    /// Records the resolved type of an argument expression.
    #[must_use]
    pub fn argument_type(mut self, position: usize, ty: TypeId) -> Self {
        if let Some(arg) = self.argument(position) {
            arg.expression.ty = Some(ty);
        }
        self
    }

    /// Marks an argument as `CancellationToken.None`.
    #[must_use]
    pub fn none_sentinel(mut self, position: usize, cancellation_token: TypeId) -> Self {
        if let Some(arg) = self.argument(position) {
            arg.expression = Expression {
                ty: Some(cancellation_token),
                member_access: Some(MemberAccess {
                    receiver: Some(cancellation_token),
                    member: "None".to_string(),
                }),
            };
        }
        self
    }

    /// Returns the invocation's index in the document.
    #[must_use]
    pub fn index(self) -> usize {
        self.index.unwrap_or(usize::MAX)
    }
}

fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'(') {
        return None;
    }
    let mut depth = 0usize;
    let mut in_string = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'"' => in_string = !in_string,
            b'(' if !in_string => depth += 1,
            b')' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits `text[start..end]` at top-level commas, returning trimmed spans.
fn split_top_level(text: &str, start: usize, end: usize, angle_brackets: bool) -> Vec<Span> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut piece_start = start;

    let mut push = |from: usize, to: usize| {
        let piece = &text[from..to];
        let leading = piece.len() - piece.trim_start().len();
        let trailing = piece.len() - piece.trim_end().len();
        if from + leading < to - trailing {
            spans.push(Span::new(from + leading, to - trailing));
        }
    };

    for i in start..end {
        match bytes[i] {
            b'"' => in_string = !in_string,
            b'(' | b'[' | b'{' if !in_string => depth += 1,
            b')' | b']' | b'}' if !in_string => depth -= 1,
            b'<' if angle_brackets && !in_string => depth += 1,
            b'>' if angle_brackets && !in_string => depth -= 1,
            b',' if depth == 0 && !in_string => {
                push(piece_start, i);
                piece_start = i + 1;
            }
            _ => {}
        }
    }
    push(piece_start, end);
    spans
}

fn parameter_name(parameter: &str) -> String {
    let declarator = parameter.split('=').next().unwrap_or(parameter);
    declarator
        .split_whitespace()
        .last()
        .unwrap_or_default()
        .to_string()
}

fn argument_name(argument: &str) -> Option<String> {
    let colon = argument.find(':')?;
    if argument[colon + 1..].starts_with(':') {
        return None;
    }
    let name = argument[..colon].trim();
    let is_identifier = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '@');
    is_identifier.then(|| name.to_string())
}
