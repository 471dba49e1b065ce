//! GraphQL SDL lowered into the introspection shape.
//!
//! `graphql-parser` does the parsing; this module only maps its document onto
//! [`SchemaDescription`] the way an introspection query would report it:
//! wrapped type references, union and interface `possibleTypes`, deprecation
//! from `@deprecated`, and the built-in scalars.

use std::collections::HashMap;

use graphql_parser::schema::{
    self as ast, Definition, DirectiveDefinition, SchemaDefinition, TypeDefinition, TypeExtension,
};
use tracing::debug;
use voyager_core::{
    Directive, EnumValue, Field, FullType, InputValue, Introspection, NamedTypeRef, ParseError,
    SchemaDescription, TypeKind, TypeRef,
};

use crate::parser::SchemaParser;

/// Scalars every schema has without declaring them.
const BUILTIN_SCALARS: &[&str] = &["String", "Int", "Float", "Boolean", "ID"];

const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

/// Parses SDL documents such as `type Query { me: User }`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdlParser;

impl SchemaParser for SdlParser {
    fn parse(&self, text: &str) -> Result<Introspection, ParseError> {
        let document = ast::parse_schema::<String>(text).map_err(|err| ParseError::Syntax {
            message: err.to_string(),
        })?;
        let schema = lower(&document.definitions)?;
        debug!(types = schema.types.len(), "Lowered SDL document");
        Introspection::new(schema)
    }
}

fn syntax(message: String) -> ParseError {
    ParseError::Syntax { message }
}

fn lower(definitions: &[Definition<'_, String>]) -> Result<SchemaDescription, ParseError> {
    let mut kinds = HashMap::new();
    for definition in definitions {
        if let Definition::TypeDefinition(def) = definition {
            let (name, kind) = type_header(def);
            if kinds.insert(name.to_string(), kind).is_some() {
                return Err(syntax(format!("type `{}` is defined more than once", name)));
            }
        }
    }
    for scalar in BUILTIN_SCALARS {
        kinds.entry(scalar.to_string()).or_insert(TypeKind::Scalar);
    }
    let refs = TypeRefs { kinds: &kinds };

    let mut types = Vec::new();
    let mut directives = Vec::new();
    let mut extensions = Vec::new();
    let mut schema_definition = None;

    for definition in definitions {
        match definition {
            Definition::TypeDefinition(def) => types.push(refs.full_type(def)?),
            Definition::TypeExtension(extension) => extensions.push(extension),
            Definition::DirectiveDefinition(def) => directives.push(refs.directive(def)?),
            Definition::SchemaDefinition(def) => {
                if schema_definition.replace(def).is_some() {
                    return Err(syntax("schema is defined more than once".to_string()));
                }
            }
        }
    }

    for extension in extensions {
        refs.extend(&mut types, extension)?;
    }
    for scalar in BUILTIN_SCALARS {
        if !types.iter().any(|t| t.name == *scalar) {
            types.push(empty_type(TypeKind::Scalar, scalar));
        }
    }
    link_implementations(&mut types);

    let (query, mutation, subscription) = root_names(schema_definition, &kinds);
    Ok(SchemaDescription {
        query_type: NamedTypeRef { name: query },
        mutation_type: mutation.map(|name| NamedTypeRef { name }),
        subscription_type: subscription.map(|name| NamedTypeRef { name }),
        types,
        directives,
    })
}

/// Root operation names. Without a `schema` block the conventional names
/// apply when such types exist.
fn root_names(
    schema: Option<&SchemaDefinition<'_, String>>,
    kinds: &HashMap<String, TypeKind>,
) -> (String, Option<String>, Option<String>) {
    match schema {
        Some(schema) => (
            schema.query.clone().unwrap_or_else(|| "Query".to_string()),
            schema.mutation.clone(),
            schema.subscription.clone(),
        ),
        None => {
            let conventional = |name: &str| kinds.contains_key(name).then(|| name.to_string());
            (
                "Query".to_string(),
                conventional("Mutation"),
                conventional("Subscription"),
            )
        }
    }
}

fn type_header<'d>(def: &'d TypeDefinition<'_, String>) -> (&'d str, TypeKind) {
    match def {
        TypeDefinition::Scalar(t) => (t.name.as_str(), TypeKind::Scalar),
        TypeDefinition::Object(t) => (t.name.as_str(), TypeKind::Object),
        TypeDefinition::Interface(t) => (t.name.as_str(), TypeKind::Interface),
        TypeDefinition::Union(t) => (t.name.as_str(), TypeKind::Union),
        TypeDefinition::Enum(t) => (t.name.as_str(), TypeKind::Enum),
        TypeDefinition::InputObject(t) => (t.name.as_str(), TypeKind::InputObject),
    }
}

fn empty_type(kind: TypeKind, name: &str) -> FullType {
    FullType {
        kind,
        name: name.to_string(),
        description: None,
        fields: None,
        input_fields: None,
        interfaces: None,
        enum_values: None,
        possible_types: None,
    }
}

/// Resolves names to kinds while building type references.
struct TypeRefs<'k> {
    kinds: &'k HashMap<String, TypeKind>,
}

impl TypeRefs<'_> {
    fn named(&self, name: &str) -> Result<TypeRef, ParseError> {
        let kind = self
            .kinds
            .get(name)
            .copied()
            .ok_or_else(|| syntax(format!("unknown type `{}`", name)))?;
        Ok(TypeRef {
            kind,
            name: Some(name.to_string()),
            of_type: None,
        })
    }

    fn named_refs(&self, names: &[String]) -> Result<Vec<TypeRef>, ParseError> {
        names.iter().map(|name| self.named(name)).collect()
    }

    fn type_ref(&self, ty: &ast::Type<'_, String>) -> Result<TypeRef, ParseError> {
        let (kind, inner) = match ty {
            ast::Type::NamedType(name) => return self.named(name),
            ast::Type::ListType(inner) => (TypeKind::List, inner),
            ast::Type::NonNullType(inner) => (TypeKind::NonNull, inner),
        };
        Ok(TypeRef {
            kind,
            name: None,
            of_type: Some(Box::new(self.type_ref(inner)?)),
        })
    }

    fn fields(&self, fields: &[ast::Field<'_, String>]) -> Result<Vec<Field>, ParseError> {
        fields
            .iter()
            .map(|field| {
                let (is_deprecated, deprecation_reason) = deprecation(&field.directives);
                Ok(Field {
                    name: field.name.clone(),
                    description: field.description.clone(),
                    args: self.input_values(&field.arguments)?,
                    type_ref: self.type_ref(&field.field_type)?,
                    is_deprecated,
                    deprecation_reason,
                })
            })
            .collect()
    }

    fn input_values(
        &self,
        values: &[ast::InputValue<'_, String>],
    ) -> Result<Vec<InputValue>, ParseError> {
        values
            .iter()
            .map(|value| {
                Ok(InputValue {
                    name: value.name.clone(),
                    description: value.description.clone(),
                    type_ref: self.type_ref(&value.value_type)?,
                    default_value: value.default_value.as_ref().map(print_value),
                })
            })
            .collect()
    }

    fn full_type(&self, def: &TypeDefinition<'_, String>) -> Result<FullType, ParseError> {
        Ok(match def {
            TypeDefinition::Scalar(t) => FullType {
                description: t.description.clone(),
                ..empty_type(TypeKind::Scalar, &t.name)
            },
            TypeDefinition::Object(t) => FullType {
                description: t.description.clone(),
                fields: Some(self.fields(&t.fields)?),
                interfaces: Some(self.named_refs(&t.implements_interfaces)?),
                ..empty_type(TypeKind::Object, &t.name)
            },
            TypeDefinition::Interface(t) => FullType {
                description: t.description.clone(),
                fields: Some(self.fields(&t.fields)?),
                interfaces: Some(Vec::new()),
                possible_types: Some(Vec::new()),
                ..empty_type(TypeKind::Interface, &t.name)
            },
            TypeDefinition::Union(t) => FullType {
                description: t.description.clone(),
                possible_types: Some(self.named_refs(&t.types)?),
                ..empty_type(TypeKind::Union, &t.name)
            },
            TypeDefinition::Enum(t) => FullType {
                description: t.description.clone(),
                enum_values: Some(t.values.iter().map(enum_value).collect()),
                ..empty_type(TypeKind::Enum, &t.name)
            },
            TypeDefinition::InputObject(t) => FullType {
                description: t.description.clone(),
                input_fields: Some(self.input_values(&t.fields)?),
                ..empty_type(TypeKind::InputObject, &t.name)
            },
        })
    }

    fn directive(&self, def: &DirectiveDefinition<'_, String>) -> Result<Directive, ParseError> {
        Ok(Directive {
            name: def.name.clone(),
            description: def.description.clone(),
            locations: def
                .locations
                .iter()
                .map(|location| location.as_str().to_string())
                .collect(),
            args: self.input_values(&def.arguments)?,
        })
    }

    /// Merge an `extend ...` block into the type it names.
    fn extend(
        &self,
        types: &mut [FullType],
        extension: &TypeExtension<'_, String>,
    ) -> Result<(), ParseError> {
        let name = match extension {
            TypeExtension::Scalar(e) => &e.name,
            TypeExtension::Object(e) => &e.name,
            TypeExtension::Interface(e) => &e.name,
            TypeExtension::Union(e) => &e.name,
            TypeExtension::Enum(e) => &e.name,
            TypeExtension::InputObject(e) => &e.name,
        };
        let target = types
            .iter_mut()
            .find(|t| t.name == *name)
            .ok_or_else(|| syntax(format!("cannot extend unknown type `{}`", name)))?;

        match extension {
            TypeExtension::Scalar(_) => {}
            TypeExtension::Object(e) => {
                let fields = self.fields(&e.fields)?;
                let interfaces = self.named_refs(&e.implements_interfaces)?;
                target.fields.get_or_insert_with(Vec::new).extend(fields);
                target.interfaces.get_or_insert_with(Vec::new).extend(interfaces);
            }
            TypeExtension::Interface(e) => {
                let fields = self.fields(&e.fields)?;
                target.fields.get_or_insert_with(Vec::new).extend(fields);
            }
            TypeExtension::Union(e) => {
                let members = self.named_refs(&e.types)?;
                target.possible_types.get_or_insert_with(Vec::new).extend(members);
            }
            TypeExtension::Enum(e) => {
                target
                    .enum_values
                    .get_or_insert_with(Vec::new)
                    .extend(e.values.iter().map(enum_value));
            }
            TypeExtension::InputObject(e) => {
                let fields = self.input_values(&e.fields)?;
                target.input_fields.get_or_insert_with(Vec::new).extend(fields);
            }
        }
        Ok(())
    }
}

/// Fill interface `possibleTypes` from the objects implementing them.
fn link_implementations(types: &mut [FullType]) {
    let implementations: Vec<(String, String)> = types
        .iter()
        .filter(|t| t.kind == TypeKind::Object)
        .flat_map(|object| {
            object
                .interfaces()
                .iter()
                .filter_map(|interface| interface.name.clone())
                .map(move |interface| (interface, object.name.clone()))
        })
        .collect();

    for (interface, object) in implementations {
        let target = types
            .iter_mut()
            .find(|t| t.kind == TypeKind::Interface && t.name == interface);
        if let Some(target) = target {
            target.possible_types.get_or_insert_with(Vec::new).push(TypeRef {
                kind: TypeKind::Object,
                name: Some(object),
                of_type: None,
            });
        }
    }
}

fn enum_value(value: &ast::EnumValue<'_, String>) -> EnumValue {
    let (is_deprecated, deprecation_reason) = deprecation(&value.directives);
    EnumValue {
        name: value.name.clone(),
        description: value.description.clone(),
        is_deprecated,
        deprecation_reason,
    }
}

fn deprecation(directives: &[ast::Directive<'_, String>]) -> (bool, Option<String>) {
    let Some(directive) = directives.iter().find(|d| d.name == "deprecated") else {
        return (false, None);
    };
    let reason = directive
        .arguments
        .iter()
        .find(|(name, _)| name == "reason")
        .and_then(|(_, value)| match value {
            ast::Value::String(reason) => Some(reason.clone()),
            _ => None,
        })
        .unwrap_or_else(|| DEFAULT_DEPRECATION_REASON.to_string());
    (true, Some(reason))
}

/// Default values in GraphQL notation, as introspection reports them.
fn print_value(value: &ast::Value<'_, String>) -> String {
    match value {
        ast::Value::Variable(name) => format!("${}", name),
        ast::Value::Int(number) => number
            .as_i64()
            .map(|n| n.to_string())
            .unwrap_or_default(),
        ast::Value::Float(number) => number.to_string(),
        ast::Value::String(text) => serde_json::Value::String(text.clone()).to_string(),
        ast::Value::Boolean(flag) => flag.to_string(),
        ast::Value::Null => "null".to_string(),
        ast::Value::Enum(name) => name.clone(),
        ast::Value::List(items) => {
            let items: Vec<String> = items.iter().map(print_value).collect();
            format!("[{}]", items.join(", "))
        }
        ast::Value::Object(fields) => {
            let fields: Vec<String> = fields
                .iter()
                .map(|(name, value)| format!("{}: {}", name, print_value(value)))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SDL: &str = r#"
        """The root."""
        type Query {
          me: User!
          search(term: String!, first: Int = 10): [SearchResult!]!
          node(id: ID!): Node
        }

        interface Node {
          id: ID!
        }

        type User implements Node {
          id: ID!
          name: String @deprecated(reason: "use handle")
          role: Role
        }

        type Post implements Node {
          id: ID!
          title: String
        }

        union SearchResult = User | Post

        enum Role {
          ADMIN
          GUEST @deprecated
        }

        extend type User {
          posts: [Post]
        }

        type Mutation {
          noop: Boolean
        }
    "#;

    fn parse(text: &str) -> Result<Introspection, ParseError> {
        SdlParser.parse(text)
    }

    #[test]
    fn test_lowers_types_and_roots() {
        let schema = parse(SDL).unwrap();

        assert_eq!(schema.root_type_name(), "Query");
        assert!(schema.is_operation_root("Mutation"));
        assert!(schema.schema.subscription_type.is_none());

        let query = schema.type_by_name("Query").unwrap();
        assert_eq!(query.description.as_deref(), Some("The root."));
        assert_eq!(query.fields()[0].type_ref.signature(), "User!");
        assert_eq!(query.fields()[1].type_ref.signature(), "[SearchResult!]!");
        assert_eq!(
            query.fields()[1].type_ref.named_type().kind,
            TypeKind::Union
        );
        assert_eq!(query.fields()[1].args[1].default_value.as_deref(), Some("10"));

        for scalar in BUILTIN_SCALARS {
            assert_eq!(schema.type_by_name(scalar).unwrap().kind, TypeKind::Scalar);
        }
    }

    #[test]
    fn test_possible_types_and_extensions() {
        let schema = parse(SDL).unwrap();

        let names = |t: &FullType| -> Vec<String> {
            t.possible_types()
                .iter()
                .filter_map(|r| r.name.clone())
                .collect()
        };
        assert_eq!(names(schema.type_by_name("SearchResult").unwrap()), ["User", "Post"]);
        assert_eq!(names(schema.type_by_name("Node").unwrap()), ["User", "Post"]);

        let user = schema.type_by_name("User").unwrap();
        assert_eq!(user.fields().last().unwrap().name, "posts");
        assert_eq!(user.interfaces()[0].name.as_deref(), Some("Node"));
    }

    #[test]
    fn test_deprecations() {
        let schema = parse(SDL).unwrap();

        let name = &schema.type_by_name("User").unwrap().fields()[1];
        assert!(name.is_deprecated);
        assert_eq!(name.deprecation_reason.as_deref(), Some("use handle"));

        let guest = &schema.type_by_name("Role").unwrap().enum_values.as_ref().unwrap()[1];
        assert!(guest.is_deprecated);
        assert_eq!(
            guest.deprecation_reason.as_deref(),
            Some(DEFAULT_DEPRECATION_REASON)
        );
    }

    #[test]
    fn test_schema_block_names_roots() {
        let schema = parse("schema { query: Root }\ntype Root { ok: Boolean }").unwrap();
        assert_eq!(schema.root_type_name(), "Root");
    }

    #[test]
    fn test_missing_query_root() {
        assert_eq!(
            parse("type User { id: ID }"),
            Err(ParseError::MissingRootType {
                name: "Query".into()
            })
        );
    }

    #[test]
    fn test_unknown_type_reference() {
        let err = parse("type Query { me: Ghost }").unwrap_err();
        assert!(err.to_string().contains("unknown type `Ghost`"));
    }

    #[test]
    fn test_bad_syntax() {
        assert!(matches!(
            parse("type Query {"),
            Err(ParseError::Syntax { .. })
        ));
    }
}
