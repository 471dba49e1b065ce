//! Typed GraphQL introspection result.
//!
//! Mirrors the shape returned by the standard introspection query. Payloads
//! may arrive wrapped in a GraphQL response (`{"data": {"__schema": ...}}`)
//! or bare (`{"__schema": ...}`); both deserialize into [`Introspection`].

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// The standard introspection query sent to GraphQL endpoints.
pub const INTROSPECTION_QUERY: &str = r#"
  query IntrospectionQuery {
    __schema {
      queryType { name }
      mutationType { name }
      subscriptionType { name }
      types {
        ...FullType
      }
      directives {
        name
        description
        locations
        args {
          ...InputValue
        }
      }
    }
  }

  fragment FullType on __Type {
    kind
    name
    description
    fields(includeDeprecated: true) {
      name
      description
      args {
        ...InputValue
      }
      type {
        ...TypeRef
      }
      isDeprecated
      deprecationReason
    }
    inputFields {
      ...InputValue
    }
    interfaces {
      ...TypeRef
    }
    enumValues(includeDeprecated: true) {
      name
      description
      isDeprecated
      deprecationReason
    }
    possibleTypes {
      ...TypeRef
    }
  }

  fragment InputValue on __InputValue {
    name
    description
    type { ...TypeRef }
    defaultValue
  }

  fragment TypeRef on __Type {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
            ofType {
              kind
              name
              ofType {
                kind
                name
                ofType {
                  kind
                  name
                }
              }
            }
          }
        }
      }
    }
  }
"#;

/// Kind of a GraphQL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

impl TypeKind {
    /// Scalars and enums terminate a field path.
    pub fn is_leaf(self) -> bool {
        matches!(self, TypeKind::Scalar | TypeKind::Enum)
    }
}

/// Reference to a type, possibly wrapped in `LIST` / `NON_NULL`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    pub kind: TypeKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub of_type: Option<Box<TypeRef>>,
}

impl TypeRef {
    /// Unwrap list and non-null wrappers down to the named type.
    pub fn named_type(&self) -> &TypeRef {
        let mut current = self;
        while let Some(inner) = current.of_type.as_deref() {
            current = inner;
        }
        current
    }

    /// Name of the innermost named type.
    pub fn named_type_name(&self) -> Option<&str> {
        self.named_type().name.as_deref()
    }

    /// Render as GraphQL type notation, e.g. `[User!]!`.
    pub fn signature(&self) -> String {
        match (self.kind, self.of_type.as_deref()) {
            (TypeKind::NonNull, Some(inner)) => format!("{}!", inner.signature()),
            (TypeKind::List, Some(inner)) => format!("[{}]", inner.signature()),
            _ => self.name.clone().unwrap_or_default(),
        }
    }
}

/// Argument or input field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputValue {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(default)]
    pub default_value: Option<String>,
}

/// Output field of an object or interface type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub args: Vec<InputValue>,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub deprecation_reason: Option<String>,
}

/// Enum member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub deprecation_reason: Option<String>,
}

/// A named type with all of its members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullType {
    pub kind: TypeKind,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<Field>>,
    #[serde(default)]
    pub input_fields: Option<Vec<InputValue>>,
    #[serde(default)]
    pub interfaces: Option<Vec<TypeRef>>,
    #[serde(default)]
    pub enum_values: Option<Vec<EnumValue>>,
    #[serde(default)]
    pub possible_types: Option<Vec<TypeRef>>,
}

impl FullType {
    pub fn fields(&self) -> &[Field] {
        self.fields.as_deref().unwrap_or_default()
    }

    pub fn possible_types(&self) -> &[TypeRef] {
        self.possible_types.as_deref().unwrap_or_default()
    }

    pub fn interfaces(&self) -> &[TypeRef] {
        self.interfaces.as_deref().unwrap_or_default()
    }

    pub fn is_leaf(&self) -> bool {
        self.kind.is_leaf()
    }

    /// Built-in introspection types such as `__Schema`.
    pub fn is_introspection_type(&self) -> bool {
        self.name.starts_with("__")
    }
}

/// Reference to a root operation type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedTypeRef {
    pub name: String,
}

/// Directive definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub args: Vec<InputValue>,
}

/// Body of `__schema`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDescription {
    pub query_type: NamedTypeRef,
    #[serde(default)]
    pub mutation_type: Option<NamedTypeRef>,
    #[serde(default)]
    pub subscription_type: Option<NamedTypeRef>,
    #[serde(default)]
    pub types: Vec<FullType>,
    #[serde(default)]
    pub directives: Vec<Directive>,
}

/// A validated introspection result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Introspection {
    #[serde(rename = "__schema")]
    pub schema: SchemaDescription,
}

#[derive(Deserialize)]
struct Bare {
    #[serde(rename = "__schema")]
    schema: SchemaDescription,
}

#[derive(Deserialize)]
struct Wrapped {
    data: Bare,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AnyShape {
    Wrapped(Wrapped),
    Bare(Bare),
}

impl AnyShape {
    fn into_schema(self) -> SchemaDescription {
        match self {
            AnyShape::Wrapped(wrapped) => wrapped.data.schema,
            AnyShape::Bare(bare) => bare.schema,
        }
    }
}

/// Deserializing validates, so schemas carried inside events are checked too.
impl<'de> Deserialize<'de> for Introspection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let schema = AnyShape::deserialize(deserializer)?.into_schema();
        Self::new(schema).map_err(serde::de::Error::custom)
    }
}

impl Introspection {
    /// Validate a schema description assembled by hand or by another parser.
    pub fn new(schema: SchemaDescription) -> Result<Self, ParseError> {
        Self { schema }.validate()
    }

    /// Parse introspection JSON, wrapped or bare.
    pub fn from_json_str(text: &str) -> Result<Self, ParseError> {
        let shape: AnyShape =
            serde_json::from_str(text).map_err(|err| ParseError::InvalidIntrospection {
                message: err.to_string(),
            })?;
        Self::new(shape.into_schema())
    }

    /// Convert an already-decoded JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ParseError> {
        let shape: AnyShape =
            serde_json::from_value(value).map_err(|err| ParseError::InvalidIntrospection {
                message: err.to_string(),
            })?;
        Self::new(shape.into_schema())
    }

    fn validate(self) -> Result<Self, ParseError> {
        if self.schema.types.is_empty() {
            return Err(ParseError::EmptySchema);
        }
        let query = &self.schema.query_type.name;
        if self.type_by_name(query).is_none() {
            return Err(ParseError::MissingRootType {
                name: query.clone(),
            });
        }
        Ok(self)
    }

    pub fn types(&self) -> &[FullType] {
        &self.schema.types
    }

    pub fn type_by_name(&self, name: &str) -> Option<&FullType> {
        self.schema.types.iter().find(|t| t.name == name)
    }

    /// Name of the query root type.
    pub fn root_type_name(&self) -> &str {
        &self.schema.query_type.name
    }

    /// Whether `name` is one of the operation root types.
    pub fn is_operation_root(&self, name: &str) -> bool {
        self.schema.query_type.name == name
            || self
                .schema
                .mutation_type
                .as_ref()
                .is_some_and(|t| t.name == name)
            || self
                .schema
                .subscription_type
                .as_ref()
                .is_some_and(|t| t.name == name)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{json, Value};

    /// A small schema with a relay-style connection.
    pub fn sample_value() -> Value {
        json!({
            "__schema": {
                "queryType": { "name": "Query" },
                "mutationType": null,
                "subscriptionType": null,
                "types": [
                    {
                        "kind": "OBJECT",
                        "name": "Query",
                        "fields": [
                            { "name": "user", "args": [], "type": { "kind": "OBJECT", "name": "User" } },
                            { "name": "version", "args": [], "type": { "kind": "NON_NULL", "name": null,
                                "ofType": { "kind": "SCALAR", "name": "String" } } }
                        ]
                    },
                    {
                        "kind": "OBJECT",
                        "name": "User",
                        "fields": [
                            { "name": "id", "args": [], "type": { "kind": "SCALAR", "name": "ID" } },
                            { "name": "friends", "args": [], "type": { "kind": "LIST", "name": null,
                                "ofType": { "kind": "OBJECT", "name": "User" } } }
                        ]
                    },
                    { "kind": "SCALAR", "name": "ID" },
                    { "kind": "SCALAR", "name": "String" }
                ],
                "directives": []
            }
        })
    }
}
