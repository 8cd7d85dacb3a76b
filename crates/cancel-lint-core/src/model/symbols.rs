//! Resolved symbols: types, methods, parameters and members.

use serde::{Deserialize, Serialize};

/// Index of a type in [`Compilation::types`](super::Compilation::types).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub u32);

/// Index of a method in [`Compilation::methods`](super::Compilation::methods).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodId(pub u32);

/// Index of a document in [`Compilation::documents`](super::Compilation::documents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub u32);

impl TypeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl MethodId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl DocumentId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Kind of a named type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// Reference type.
    #[default]
    Class,
    /// Value type.
    Struct,
    /// Interface.
    Interface,
}

/// Declared accessibility of a member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accessibility {
    /// Visible only inside the declaring type.
    #[default]
    Private,
    /// Visible to derived types.
    Protected,
    /// Visible inside the assembly.
    Internal,
    /// Visible everywhere.
    Public,
}

/// A named type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSymbol {
    /// Fully qualified metadata name (e.g., ``System.Threading.Tasks.Task`1``).
    pub name: String,
    /// Kind of type.
    #[serde(default)]
    pub kind: TypeKind,
    /// Unconstructed generic definition when this is a constructed type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_definition: Option<TypeId>,
    /// Base class, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_type: Option<TypeId>,
    /// Directly declared interfaces.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<TypeId>,
    /// Declared methods, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodId>,
    /// Declared fields, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldSymbol>,
    /// Declared properties, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertySymbol>,
    /// Explicit interface-member to implementation map.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interface_implementations: Vec<InterfaceImplementation>,
}

impl TypeSymbol {
    /// Creates an empty class symbol with the given metadata name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Class,
            original_definition: None,
            base_type: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            interface_implementations: Vec::new(),
        }
    }

    /// Returns the name without namespace or generic arity suffix.
    #[must_use]
    pub fn short_name(&self) -> &str {
        let name = self.name.rsplit('.').next().unwrap_or(&self.name);
        name.split('`').next().unwrap_or(name)
    }

    /// Returns the owning namespace, if the name is qualified.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.name.rfind('.').map(|i| &self.name[..i])
    }

    /// Returns the qualified name without the generic arity suffix.
    #[must_use]
    pub fn qualified_name(&self) -> &str {
        self.name.split('`').next().unwrap_or(&self.name)
    }
}

/// A field declared on a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSymbol {
    /// Field name.
    pub name: String,
    /// Field type.
    pub ty: TypeId,
}

/// A property declared on a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySymbol {
    /// Property name.
    pub name: String,
    /// Property type.
    pub ty: TypeId,
    /// Whether the property has a read accessor.
    #[serde(default = "default_true")]
    pub has_getter: bool,
    /// Declared accessibility.
    #[serde(default)]
    pub accessibility: Accessibility,
}

fn default_true() -> bool {
    true
}

/// Maps an interface member to the method implementing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceImplementation {
    /// The interface method.
    pub interface_member: MethodId,
    /// The implementing method on the type.
    pub implementation: MethodId,
}

/// A method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSymbol {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    pub ty: TypeId,
    /// Whether the parameter has a default value.
    #[serde(default)]
    pub is_optional: bool,
}

impl ParameterSymbol {
    /// Creates a required parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            is_optional: false,
        }
    }

    /// Creates a parameter with a default value.
    #[must_use]
    pub fn optional(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            is_optional: true,
            ..Self::new(name, ty)
        }
    }
}

/// A method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSymbol {
    /// Method name.
    pub name: String,
    /// Declaring type.
    pub containing_type: TypeId,
    /// Resolved return type; `None` when it could not be determined.
    pub return_type: Option<TypeId>,
    /// Parameters in declaration order.
    #[serde(default)]
    pub parameters: Vec<ParameterSymbol>,
    /// Whether the method carries the `async` modifier.
    #[serde(default)]
    pub is_async: bool,
    /// Whether the method overrides a base member.
    #[serde(default)]
    pub is_override: bool,
}

impl MethodSymbol {
    /// Creates a synchronous, non-overriding method without parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, containing_type: TypeId, return_type: Option<TypeId>) -> Self {
        Self {
            name: name.into(),
            containing_type,
            return_type,
            parameters: Vec::new(),
            is_async: false,
            is_override: false,
        }
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, parameter: ParameterSymbol) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Marks the method `async`.
    #[must_use]
    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }

    /// Marks the method as an override.
    #[must_use]
    pub fn overriding(mut self) -> Self {
        self.is_override = true;
        self
    }
}
