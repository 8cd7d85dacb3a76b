//! Semantic model supplied by the host's parser and binder.
//!
//! The engine never parses source text. A host resolves a compilation into
//! symbol tables and span-annotated nodes and hands it over either as a
//! [`Compilation`] value or through its own [`SymbolProvider`].

mod builder;
mod symbols;
mod syntax;

pub use builder::{CompilationBuilder, DocumentBuilder, InvocationBuilder};
pub use symbols::{
    Accessibility, DocumentId, FieldSymbol, InterfaceImplementation, MethodId, MethodSymbol,
    ParameterSymbol, PropertySymbol, TypeId, TypeKind, TypeSymbol,
};
pub use syntax::{
    ArgumentList, ArgumentSyntax, Document, Expression, Invocation, MemberAccess,
    MethodDeclaration, ParameterList, ParameterSyntax, UsingDirective,
};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::types::ExternalDiagnostic;

/// Symbol lookups the rules need from the host.
pub trait SymbolProvider: Send + Sync {
    /// Looks up a type by fully qualified metadata name.
    fn type_by_metadata_name(&self, name: &str) -> Option<TypeId>;

    /// Returns the symbol for a type id.
    fn type_symbol(&self, id: TypeId) -> Option<&TypeSymbol>;

    /// Returns the symbol for a method id.
    fn method(&self, id: MethodId) -> Option<&MethodSymbol>;

    /// Returns every interface the type implements, including inherited ones.
    fn all_interfaces(&self, id: TypeId) -> Vec<TypeId>;

    /// Returns the method of `ty` that implements `interface_member`.
    fn find_implementation_for_interface_member(
        &self,
        ty: TypeId,
        interface_member: MethodId,
    ) -> Option<MethodId>;

    /// Returns the unconstructed definition of a type.
    fn original_definition(&self, id: TypeId) -> TypeId {
        self.type_symbol(id)
            .and_then(|t| t.original_definition)
            .unwrap_or(id)
    }
}

/// Errors loading or validating a compilation.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Malformed JSON.
    #[error("failed to parse compilation: {0}")]
    Json(#[from] serde_json::Error),

    /// A symbol refers to a type that does not exist.
    #[error("{context} refers to unknown type #{id}")]
    UnknownType {
        /// Where the reference was found.
        context: String,
        /// The dangling id.
        id: u32,
    },

    /// A symbol refers to a method that does not exist.
    #[error("{context} refers to unknown method #{id}")]
    UnknownMethod {
        /// Where the reference was found.
        context: String,
        /// The dangling id.
        id: u32,
    },

    /// A span lies outside its document or not on a character boundary.
    #[error("{context}: span {start}..{end} is not valid in {path}")]
    InvalidSpan {
        /// Where the span was found.
        context: String,
        /// Document path.
        path: String,
        /// Span start.
        start: usize,
        /// Span end.
        end: usize,
    },

    /// A builder could not locate a node in the document text.
    #[error("could not find `{needle}` in {path}")]
    NotFound {
        /// Text that was searched for.
        needle: String,
        /// Document path.
        path: String,
    },
}

/// An in-memory, serializable compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compilation {
    /// Type table, indexed by [`TypeId`].
    #[serde(default)]
    pub types: Vec<TypeSymbol>,
    /// Method table, indexed by [`MethodId`].
    #[serde(default)]
    pub methods: Vec<MethodSymbol>,
    /// Source documents, indexed by [`DocumentId`].
    #[serde(default)]
    pub documents: Vec<Document>,
    /// Diagnostics reported by third-party analyzers.
    #[serde(default)]
    pub external_diagnostics: Vec<ExternalDiagnostic>,
}

impl Compilation {
    /// Parses and validates a compilation from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or contains dangling ids.
    pub fn from_json(content: &str) -> Result<Self, ModelError> {
        let compilation: Self = serde_json::from_str(content)?;
        compilation.validate()?;
        Ok(compilation)
    }

    /// Serializes the compilation to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns the document for an id.
    #[must_use]
    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(id.index())
    }

    /// Iterates documents with their ids.
    pub fn documents(&self) -> impl Iterator<Item = (DocumentId, &Document)> {
        self.documents
            .iter()
            .enumerate()
            .map(|(i, d)| (DocumentId(index_to_u32(i)), d))
    }

    /// Checks that every id refers to an existing symbol and every span is valid.
    ///
    /// # Errors
    ///
    /// Returns the first dangling reference found.
    pub fn validate(&self) -> Result<(), ModelError> {
        let check_type = |context: &dyn Fn() -> String, id: TypeId| {
            if id.index() < self.types.len() {
                Ok(())
            } else {
                Err(ModelError::UnknownType {
                    context: context(),
                    id: id.0,
                })
            }
        };
        let check_method = |context: &dyn Fn() -> String, id: MethodId| {
            if id.index() < self.methods.len() {
                Ok(())
            } else {
                Err(ModelError::UnknownMethod {
                    context: context(),
                    id: id.0,
                })
            }
        };

        for (i, ty) in self.types.iter().enumerate() {
            let ctx = || format!("types[{i}] ({})", ty.name);
            for id in ty
                .original_definition
                .iter()
                .chain(ty.base_type.iter())
                .chain(ty.interfaces.iter())
                .chain(ty.fields.iter().map(|f| &f.ty))
                .chain(ty.properties.iter().map(|p| &p.ty))
            {
                check_type(&ctx, *id)?;
            }
            for id in ty.methods.iter().chain(
                ty.interface_implementations
                    .iter()
                    .flat_map(|m| [&m.interface_member, &m.implementation]),
            ) {
                check_method(&ctx, *id)?;
            }
        }

        for (i, method) in self.methods.iter().enumerate() {
            let ctx = || format!("methods[{i}] ({})", method.name);
            check_type(&ctx, method.containing_type)?;
            for id in method
                .return_type
                .iter()
                .chain(method.parameters.iter().map(|p| &p.ty))
            {
                check_type(&ctx, *id)?;
            }
        }

        for (i, doc) in self.documents.iter().enumerate() {
            let check_span = |context: String, span: crate::Span| {
                if span.start <= span.end && doc.text.get(span.start..span.end).is_some() {
                    Ok(())
                } else {
                    Err(ModelError::InvalidSpan {
                        context,
                        path: doc.path.display().to_string(),
                        start: span.start,
                        end: span.end,
                    })
                }
            };
            for (j, decl) in doc.methods.iter().enumerate() {
                let ctx = || format!("documents[{i}].methods[{j}]");
                if let Some(id) = decl.symbol {
                    check_method(&ctx, id)?;
                }
                check_span(ctx(), decl.name_span)?;
                check_span(
                    ctx(),
                    crate::Span::new(decl.parameter_list.open, decl.parameter_list.close),
                )?;
            }
            for (j, inv) in doc.invocations.iter().enumerate() {
                let ctx = || format!("documents[{i}].invocations[{j}]");
                if let Some(id) = inv.target {
                    check_method(&ctx, id)?;
                }
                if let Some(id) = inv.enclosing_type {
                    check_type(&ctx, id)?;
                }
                check_span(ctx(), inv.span)?;
                check_span(
                    ctx(),
                    crate::Span::new(inv.arguments.open, inv.arguments.close),
                )?;
                for arg in &inv.arguments.arguments {
                    check_span(ctx(), arg.span)?;
                    if let Some(id) = arg.expression.ty {
                        check_type(&ctx, id)?;
                    }
                }
            }
            for (j, using) in doc.usings.iter().enumerate() {
                check_span(format!("documents[{i}].usings[{j}]"), using.span)?;
            }
        }

        Ok(())
    }

    fn collect_interfaces(&self, id: TypeId, seen: &mut HashSet<TypeId>, out: &mut Vec<TypeId>) {
        let Some(ty) = self.type_symbol(id) else {
            return;
        };
        for &iface in &ty.interfaces {
            if seen.insert(iface) {
                out.push(iface);
                self.collect_interfaces(iface, seen, out);
            }
        }
        if let Some(base) = ty.base_type {
            if seen.insert(base) {
                self.collect_interfaces(base, seen, out);
            }
        }
    }

    fn same_parameter_types(&self, a: &MethodSymbol, b: &MethodSymbol) -> bool {
        a.parameters.len() == b.parameters.len()
            && a.parameters
                .iter()
                .zip(&b.parameters)
                .all(|(x, y)| self.original_definition(x.ty) == self.original_definition(y.ty))
    }
}

impl SymbolProvider for Compilation {
    fn type_by_metadata_name(&self, name: &str) -> Option<TypeId> {
        self.types
            .iter()
            .position(|t| t.name == name)
            .map(|i| TypeId(index_to_u32(i)))
    }

    fn type_symbol(&self, id: TypeId) -> Option<&TypeSymbol> {
        self.types.get(id.index())
    }

    fn method(&self, id: MethodId) -> Option<&MethodSymbol> {
        self.methods.get(id.index())
    }

    fn all_interfaces(&self, id: TypeId) -> Vec<TypeId> {
        let mut seen = HashSet::from([id]);
        let mut out = Vec::new();
        self.collect_interfaces(id, &mut seen, &mut out);
        out
    }

    fn find_implementation_for_interface_member(
        &self,
        ty: TypeId,
        interface_member: MethodId,
    ) -> Option<MethodId> {
        let member = self.method(interface_member)?;
        let mut current = Some(ty);
        let mut visited = HashSet::new();

        while let Some(id) = current {
            if !visited.insert(id) {
                break;
            }
            let symbol = self.type_symbol(id)?;

            if let Some(explicit) = symbol
                .interface_implementations
                .iter()
                .find(|m| m.interface_member == interface_member)
            {
                return Some(explicit.implementation);
            }

            let implicit = symbol.methods.iter().copied().find(|&candidate| {
                self.method(candidate).is_some_and(|m| {
                    m.name == member.name && self.same_parameter_types(m, member)
                })
            });
            if implicit.is_some() {
                return implicit;
            }

            current = symbol.base_type;
        }

        None
    }
}

pub(crate) fn index_to_u32(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compilation_with_interface() -> (Compilation, MethodId, MethodId) {
        let mut c = Compilation::default();
        c.types.push(TypeSymbol::new("System.Threading.Tasks.Task"));
        let mut iface = TypeSymbol::new("ITestInterface");
        iface.kind = TypeKind::Interface;
        iface.methods.push(MethodId(0));
        c.types.push(iface);
        let mut base = TypeSymbol::new("BaseClass");
        base.interfaces.push(TypeId(1));
        c.types.push(base);
        let mut derived = TypeSymbol::new("TestClass");
        derived.base_type = Some(TypeId(2));
        derived.methods.push(MethodId(1));
        c.types.push(derived);

        let method = |name: &str, owner: u32| MethodSymbol {
            name: name.to_string(),
            containing_type: TypeId(owner),
            return_type: Some(TypeId(0)),
            parameters: Vec::new(),
            is_async: false,
            is_override: false,
        };
        c.methods.push(method("InterfaceMethod", 1));
        c.methods.push(method("InterfaceMethod", 3));
        (c, MethodId(0), MethodId(1))
    }

    #[test]
    fn all_interfaces_includes_inherited() {
        let (c, _, _) = compilation_with_interface();
        assert_eq!(c.all_interfaces(TypeId(3)), vec![TypeId(1)]);
        assert!(c.all_interfaces(TypeId(0)).is_empty());
    }

    #[test]
    fn implicit_implementation_is_found_by_signature() {
        let (c, member, implementation) = compilation_with_interface();
        assert_eq!(
            c.find_implementation_for_interface_member(TypeId(3), member),
            Some(implementation)
        );
    }

    #[test]
    fn explicit_implementation_wins() {
        let (mut c, member, _) = compilation_with_interface();
        c.methods.push(MethodSymbol {
            name: "ITestInterface.InterfaceMethod".to_string(),
            containing_type: TypeId(3),
            return_type: Some(TypeId(0)),
            parameters: Vec::new(),
            is_async: false,
            is_override: false,
        });
        c.types[3].methods.push(MethodId(2));
        c.types[3].interface_implementations.push(InterfaceImplementation {
            interface_member: member,
            implementation: MethodId(2),
        });
        assert_eq!(
            c.find_implementation_for_interface_member(TypeId(3), member),
            Some(MethodId(2))
        );
    }

    #[test]
    fn original_definition_defaults_to_self() {
        let (mut c, _, _) = compilation_with_interface();
        let mut constructed = TypeSymbol::new("System.Threading.Tasks.Task`1[System.Int32]");
        constructed.original_definition = Some(TypeId(0));
        c.types.push(constructed);
        assert_eq!(c.original_definition(TypeId(4)), TypeId(0));
        assert_eq!(c.original_definition(TypeId(0)), TypeId(0));
    }

    #[test]
    fn validate_rejects_dangling_method() {
        let (mut c, _, _) = compilation_with_interface();
        c.types[3].methods.push(MethodId(42));
        let err = c.validate().unwrap_err();
        assert!(matches!(err, ModelError::UnknownMethod { id: 42, .. }));
    }

    #[test]
    fn json_round_trip_preserves_symbols() {
        let (c, _, _) = compilation_with_interface();
        let json = c.to_json().unwrap();
        let loaded = Compilation::from_json(&json).unwrap();
        assert_eq!(loaded, c);
    }

    #[test]
    fn from_json_reports_malformed_input() {
        let err = Compilation::from_json("{ \"types\": 3 }").unwrap_err();
        assert!(matches!(err, ModelError::Json(_)));
    }
}
