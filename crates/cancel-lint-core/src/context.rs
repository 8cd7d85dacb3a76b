//! Context types for rule execution.

use crate::config::EngineConfiguration;
use crate::model::{Document, DocumentId, Invocation, MethodDeclaration, MethodSymbol, SymbolProvider, TypeId};
use crate::types::{Location, Span};
use crate::utils::classify::WellKnownTypes;

/// Errors constructing an [`AnalysisContext`].
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// A type every analysis depends on is absent from the compilation.
    #[error("well-known type `{0}` is not defined in the compilation")]
    MissingWellKnownType(&'static str),
}

/// Immutable state shared by every evaluation over one compilation.
///
/// Built once before any rule runs and only ever handed out by shared
/// reference, so evaluations on different threads see the same values.
#[derive(Clone, Copy)]
pub struct AnalysisContext<'a> {
    symbols: &'a dyn SymbolProvider,
    well_known: WellKnownTypes,
    config: EngineConfiguration,
}

impl std::fmt::Debug for AnalysisContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisContext")
            .field("well_known", &self.well_known)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<'a> AnalysisContext<'a> {
    /// Resolves the well-known types and captures the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::MissingWellKnownType`] if a required type is absent.
    pub fn new(
        symbols: &'a dyn SymbolProvider,
        config: EngineConfiguration,
    ) -> Result<Self, ContextError> {
        Ok(Self {
            symbols,
            well_known: WellKnownTypes::resolve(symbols)?,
            config,
        })
    }

    /// Symbol lookups.
    #[must_use]
    pub fn symbols(&self) -> &'a dyn SymbolProvider {
        self.symbols
    }

    /// Cached well-known type identities.
    #[must_use]
    pub fn well_known(&self) -> &WellKnownTypes {
        &self.well_known
    }

    /// Engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfiguration {
        &self.config
    }

    /// Returns the method symbol for a declaration, if it resolved.
    #[must_use]
    pub fn declared_method(&self, declaration: &MethodDeclaration) -> Option<&'a MethodSymbol> {
        declaration.symbol.and_then(|id| self.symbols.method(id))
    }

    /// Returns the resolved target of a call, if any.
    #[must_use]
    pub fn target(&self, invocation: &Invocation) -> Option<&'a MethodSymbol> {
        invocation.target.and_then(|id| self.symbols.method(id))
    }
}

/// Context provided to rules for one document.
#[derive(Debug, Clone, Copy)]
pub struct FileContext<'a> {
    /// Compilation-wide state.
    pub analysis: &'a AnalysisContext<'a>,
    /// Id of the document being checked.
    pub document_id: DocumentId,
    /// The document being checked.
    pub document: &'a Document,
}

impl<'a> FileContext<'a> {
    /// Creates a new file context.
    #[must_use]
    pub fn new(analysis: &'a AnalysisContext<'a>, document_id: DocumentId, document: &'a Document) -> Self {
        Self {
            analysis,
            document_id,
            document,
        }
    }

    /// Builds a diagnostic location for a span in this document.
    #[must_use]
    pub fn location(&self, span: Span) -> Location {
        Location::new(
            self.document_id,
            self.document.path.clone(),
            &self.document.text,
            span,
        )
    }

    /// Returns the declaration enclosing a call.
    #[must_use]
    pub fn enclosing_declaration(&self, invocation: &Invocation) -> Option<&'a MethodDeclaration> {
        enclosing_declaration(self.document, invocation)
    }
}

/// Returns the declaration enclosing a call.
#[must_use]
pub fn enclosing_declaration<'d>(
    document: &'d Document,
    invocation: &Invocation,
) -> Option<&'d MethodDeclaration> {
    invocation
        .enclosing_method
        .and_then(|i| document.methods.get(i))
}

/// Returns the type enclosing a call: explicit, or the enclosing method's owner.
#[must_use]
pub fn enclosing_type(
    ctx: &AnalysisContext<'_>,
    document: &Document,
    invocation: &Invocation,
) -> Option<TypeId> {
    invocation.enclosing_type.or_else(|| {
        enclosing_declaration(document, invocation)
            .and_then(|d| ctx.declared_method(d))
            .map(|m| m.containing_type)
    })
}
