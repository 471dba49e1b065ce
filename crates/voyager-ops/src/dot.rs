//! Graphviz DOT output for a schema graph.
//!
//! Nodes and edges carry the canonical ids from [`voyager_core::ids`] in their
//! `id` attribute so the SVG Graphviz produces can be matched back to the
//! selection in the store.

use std::collections::{HashSet, VecDeque};
use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use voyager_core::ids::{ID_SEPARATOR, TYPE_KIND};
use voyager_core::{
    DisplayOptions, EdgeId, Field, FullType, Introspection, NodeId, RenderedImage, TypeKind,
};

use crate::error::{OpsError, OpsResult};
use crate::render::GraphRenderer;

/// Kind prefix for union member and interface implementation edges.
const POSSIBLE_TYPE_EDGE_KIND: &str = "POSSIBLE_TYPE_EDGE";

const RELAY_PAGE_INFO: &str = "PageInfo";

/// Renders schemas as DOT text.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotRenderer;

#[async_trait]
impl GraphRenderer for DotRenderer {
    async fn render(
        &self,
        schema: Arc<Introspection>,
        options: DisplayOptions,
    ) -> OpsResult<RenderedImage> {
        render_dot(&schema, &options).map(RenderedImage::new)
    }
}

/// Draw `schema` as a DOT digraph according to `options`.
pub fn render_dot(schema: &Introspection, options: &DisplayOptions) -> OpsResult<String> {
    let graph = SchemaGraph::build(schema, options)?;
    Ok(graph.to_dot())
}

/// Where a field points once relay wrappers are looked through.
struct Target<'a> {
    type_name: &'a str,
    label: String,
}

struct SchemaGraph<'a> {
    schema: &'a Introspection,
    options: &'a DisplayOptions,
    root: &'a str,
    relay_hidden: HashSet<&'a str>,
    order: Vec<&'a FullType>,
}

impl<'a> SchemaGraph<'a> {
    fn build(schema: &'a Introspection, options: &'a DisplayOptions) -> OpsResult<Self> {
        let root = match &options.root_type_id {
            Some(id) => id.type_name().ok_or_else(|| {
                OpsError::Render(format!("`{}` is not a type node id", id))
            })?,
            None => schema.root_type_name(),
        };
        if schema.type_by_name(root).is_none() {
            return Err(OpsError::Render(format!(
                "root type `{}` is not defined in the schema",
                root
            )));
        }

        let relay_hidden = if options.skip_relay {
            relay_wrapper_types(schema)
        } else {
            HashSet::new()
        };

        let mut graph = Self {
            schema,
            options,
            root,
            relay_hidden,
            order: Vec::new(),
        };
        graph.order = graph.reachable();
        Ok(graph)
    }

    fn is_node_type(&self, ty: &FullType) -> bool {
        matches!(
            ty.kind,
            TypeKind::Object | TypeKind::Interface | TypeKind::Union
        ) && !ty.is_introspection_type()
            && !self.relay_hidden.contains(ty.name.as_str())
    }

    fn node_type(&self, name: &str) -> Option<&'a FullType> {
        self.schema
            .type_by_name(name)
            .filter(|ty| self.is_node_type(ty))
    }

    fn fields(&self, ty: &'a FullType) -> Vec<&'a Field> {
        let mut fields: Vec<&Field> = ty.fields().iter().collect();
        if self.options.sort_by_alphabet {
            fields.sort_by(|a, b| a.name.cmp(&b.name));
        }
        fields
    }

    fn target(&self, field: &'a Field) -> Option<Target<'a>> {
        let name = field.type_ref.named_type_name()?;

        if self.options.skip_relay {
            if let Some(node) = relay_node_type(self.schema, name) {
                return Some(Target {
                    type_name: node,
                    label: format!("[{}]", node),
                });
            }
        }

        Some(Target {
            type_name: name,
            label: field.type_ref.signature(),
        })
    }

    fn possible_types(&self, ty: &'a FullType) -> Vec<&'a str> {
        let mut names: Vec<&str> = ty
            .possible_types()
            .iter()
            .filter_map(|t| t.named_type_name())
            .filter(|name| self.node_type(name).is_some())
            .collect();
        if self.options.sort_by_alphabet {
            names.sort_unstable();
        }
        names
    }

    /// Node types reachable from the root, breadth first.
    fn reachable(&self) -> Vec<&'a FullType> {
        let Some(root) = self.schema.type_by_name(self.root) else {
            return Vec::new();
        };

        let mut seen: HashSet<&str> = HashSet::from([root.name.as_str()]);
        let mut queue = VecDeque::from([root]);
        let mut order = Vec::new();

        while let Some(ty) = queue.pop_front() {
            order.push(ty);

            let neighbours = self
                .fields(ty)
                .into_iter()
                .filter_map(|f| self.target(f).map(|t| t.type_name))
                .chain(self.possible_types(ty));

            for name in neighbours {
                if let Some(next) = self.node_type(name) {
                    if seen.insert(next.name.as_str()) {
                        queue.push_back(next);
                    }
                }
            }
        }

        order
    }

    fn to_dot(&self) -> String {
        let mut out = String::new();
        out.push_str("digraph {\n");
        out.push_str("  graph [rankdir=LR ranksep=2.0];\n");
        out.push_str("  node [shape=plaintext fontname=\"helvetica\" fontsize=12];\n");
        out.push_str("  edge [fontname=\"helvetica\" fontsize=10];\n");

        let drawn: HashSet<&str> = self
            .order
            .iter()
            .map(|ty| ty.name.as_str())
            .filter(|name| !(self.options.hide_root && *name == self.root))
            .collect();

        let visible = || {
            self.order
                .iter()
                .copied()
                .filter(|ty| drawn.contains(ty.name.as_str()))
        };
        for ty in visible() {
            self.write_node(&mut out, ty, &drawn);
        }
        for ty in visible() {
            self.write_edges(&mut out, ty, &drawn);
        }

        out.push_str("}\n");
        out
    }

    fn write_node(&self, out: &mut String, ty: &'a FullType, drawn: &HashSet<&str>) {
        let id = NodeId::for_type(&ty.name);
        let _ = write!(
            out,
            "  \"{id}\" [id=\"{id}\" label=<<TABLE BORDER=\"0\" CELLBORDER=\"1\" CELLSPACING=\"0\">"
        );
        let _ = write!(out, "<TR><TD><B>{}</B></TD></TR>", escape_html(&ty.name));

        for field in self.fields(ty) {
            let Some(target) = self.target(field) else {
                continue;
            };
            let links = drawn.contains(target.type_name);
            let is_node = self.node_type(target.type_name).is_some();
            if !is_node && !self.options.show_leaf_fields {
                continue;
            }
            // Edges to hidden nodes are dropped, but the field row stays.
            let port = if links {
                format!(" PORT=\"{}\"", escape_html(&field.name))
            } else {
                String::new()
            };
            let _ = write!(
                out,
                "<TR><TD ALIGN=\"LEFT\"{port}>{}: {}</TD></TR>",
                escape_html(&field.name),
                escape_html(&target.label)
            );
        }

        let members = self.possible_types(ty);
        if !members.is_empty() {
            let heading = match ty.kind {
                TypeKind::Union => "possible types",
                _ => "implementations",
            };
            let _ = write!(out, "<TR><TD><I>{}</I></TD></TR>", heading);
            for member in members {
                let _ = write!(
                    out,
                    "<TR><TD ALIGN=\"LEFT\" PORT=\"{0}\">{0}</TD></TR>",
                    escape_html(member)
                );
            }
        }

        out.push_str("</TABLE>>];\n");
    }

    fn write_edges(&self, out: &mut String, ty: &'a FullType, drawn: &HashSet<&str>) {
        let from = NodeId::for_type(&ty.name);

        for field in self.fields(ty) {
            let Some(target) = self.target(field) else {
                continue;
            };
            if !drawn.contains(target.type_name) {
                continue;
            }
            let edge = EdgeId::for_field(&ty.name, &field.name);
            let _ = writeln!(
                out,
                "  \"{from}\":\"{}\" -> \"{}\" [id=\"{edge}\"];",
                escape_html(&field.name),
                NodeId::for_type(target.type_name)
            );
        }

        for member in self.possible_types(ty) {
            if !drawn.contains(member) {
                continue;
            }
            let edge = format!(
                "{POSSIBLE_TYPE_EDGE_KIND}{ID_SEPARATOR}{}{ID_SEPARATOR}{member}",
                ty.name
            );
            let _ = writeln!(
                out,
                "  \"{from}\":\"{}\" -> \"{TYPE_KIND}{ID_SEPARATOR}{member}\" [id=\"{edge}\" style=dashed];",
                escape_html(member)
            );
        }
    }
}

/// The node type behind a relay connection type, if `name` is one.
fn relay_node_type<'a>(schema: &'a Introspection, name: &str) -> Option<&'a str> {
    if !name.ends_with("Connection") {
        return None;
    }
    let connection = schema.type_by_name(name)?;
    let edge_type = connection
        .fields()
        .iter()
        .find(|f| f.name == "edges")?
        .type_ref
        .named_type_name()?;
    relay_edge_node_type(schema, edge_type)
}

fn relay_edge_node_type<'a>(schema: &'a Introspection, name: &str) -> Option<&'a str> {
    if !name.ends_with("Edge") {
        return None;
    }
    schema
        .type_by_name(name)?
        .fields()
        .iter()
        .find(|f| f.name == "node")?
        .type_ref
        .named_type_name()
}

/// Connection, edge and page info types folded away by `skip_relay`.
fn relay_wrapper_types(schema: &Introspection) -> HashSet<&str> {
    let mut hidden = HashSet::new();
    for ty in schema.types() {
        if relay_node_type(schema, &ty.name).is_some() {
            hidden.insert(ty.name.as_str());
            if let Some(edges) = ty.fields().iter().find(|f| f.name == "edges") {
                if let Some(edge) = edges.type_ref.named_type_name() {
                    hidden.insert(edge);
                }
            }
        }
    }
    if schema.type_by_name(RELAY_PAGE_INFO).is_some() {
        hidden.insert(RELAY_PAGE_INFO);
    }
    hidden
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use voyager_core::DisplayOptionsPatch;

    fn named(kind: &str, name: &str) -> serde_json::Value {
        json!({ "kind": kind, "name": name })
    }

    fn field(name: &str, ty: serde_json::Value) -> serde_json::Value {
        json!({ "name": name, "args": [], "type": ty })
    }

    fn relay_schema() -> Introspection {
        let value = json!({ "__schema": {
            "queryType": { "name": "Query" },
            "types": [
                { "kind": "OBJECT", "name": "Query", "fields": [
                    field("user", named("OBJECT", "User")),
                    field("users", named("OBJECT", "UserConnection")),
                    field("search", json!({ "kind": "LIST", "name": null, "ofType": named("UNION", "SearchResult") })),
                    field("version", json!({ "kind": "NON_NULL", "name": null, "ofType": named("SCALAR", "String") })),
                ]},
                { "kind": "OBJECT", "name": "User", "fields": [
                    field("id", named("SCALAR", "ID")),
                    field("friends", named("OBJECT", "UserConnection")),
                ]},
                { "kind": "OBJECT", "name": "UserConnection", "fields": [
                    field("edges", json!({ "kind": "LIST", "name": null, "ofType": named("OBJECT", "UserEdge") })),
                    field("pageInfo", named("OBJECT", "PageInfo")),
                ]},
                { "kind": "OBJECT", "name": "UserEdge", "fields": [
                    field("node", named("OBJECT", "User")),
                    field("cursor", named("SCALAR", "String")),
                ]},
                { "kind": "OBJECT", "name": "PageInfo", "fields": [
                    field("hasNextPage", named("SCALAR", "Boolean")),
                ]},
                { "kind": "UNION", "name": "SearchResult", "possibleTypes": [
                    named("OBJECT", "User"), named("OBJECT", "Post"),
                ]},
                { "kind": "OBJECT", "name": "Post", "fields": [
                    field("title", named("SCALAR", "String")),
                ]},
                { "kind": "OBJECT", "name": "Orphan", "fields": [
                    field("x", named("SCALAR", "Int")),
                ]},
                { "kind": "SCALAR", "name": "ID" },
                { "kind": "SCALAR", "name": "String" },
                { "kind": "SCALAR", "name": "Boolean" },
                { "kind": "SCALAR", "name": "Int" },
            ]
        }});
        Introspection::from_value(value).unwrap()
    }

    fn render(patch: DisplayOptionsPatch) -> String {
        let options = DisplayOptions::default().merged(&patch);
        render_dot(&relay_schema(), &options).unwrap()
    }

    fn declares(dot: &str, type_name: &str) -> bool {
        dot.contains(&format!("\"TYPE::{}\" [id=", type_name))
    }

    #[test]
    fn test_default_collapses_relay_and_skips_unreachable() {
        let dot = render(DisplayOptionsPatch::default());

        assert!(declares(&dot, "Query"));
        assert!(declares(&dot, "User"));
        assert!(declares(&dot, "Post"));
        assert!(!declares(&dot, "UserConnection"));
        assert!(!declares(&dot, "PageInfo"));
        assert!(!declares(&dot, "Orphan"));

        assert!(dot.contains(
            "\"TYPE::Query\":\"users\" -> \"TYPE::User\" [id=\"FIELD_EDGE::Query::users\"]"
        ));
        assert!(dot.contains("users: [User]"));
    }

    #[test]
    fn test_relay_types_kept_without_skip() {
        let dot = render(DisplayOptionsPatch::default().skip_relay(false));

        assert!(declares(&dot, "UserConnection"));
        assert!(declares(&dot, "UserEdge"));
        assert!(declares(&dot, "PageInfo"));
        assert!(dot.contains("[id=\"FIELD_EDGE::UserEdge::node\"]"));
    }

    #[test]
    fn test_hide_root() {
        let dot = render(DisplayOptionsPatch::default().hide_root(true));
        assert!(!declares(&dot, "Query"));
        assert!(!dot.contains("FIELD_EDGE::Query::"));
        assert!(declares(&dot, "User"));
    }

    #[test]
    fn test_leaf_fields_toggle() {
        assert!(render(DisplayOptionsPatch::default()).contains("version: String!"));
        let dot = render(DisplayOptionsPatch::default().show_leaf_fields(false));
        assert!(!dot.contains("version"));
        assert!(dot.contains("user: User"));
    }

    #[test]
    fn test_sort_by_alphabet() {
        let unsorted = render(DisplayOptionsPatch::default());
        assert!(unsorted.find("PORT=\"user\"") < unsorted.find("PORT=\"search\""));

        let sorted = render(DisplayOptionsPatch::default().sort_by_alphabet(true));
        assert!(sorted.find("PORT=\"search\"") < sorted.find("PORT=\"user\""));
    }

    #[test]
    fn test_union_members_are_linked() {
        let dot = render(DisplayOptionsPatch::default());
        assert!(dot.contains("[id=\"POSSIBLE_TYPE_EDGE::SearchResult::Post\" style=dashed]"));
    }

    #[test]
    fn test_custom_root() {
        let dot = render(DisplayOptionsPatch::default().root_type(Some(NodeId::for_type("User"))));
        assert!(declares(&dot, "User"));
        assert!(!declares(&dot, "Query"));
        assert!(!declares(&dot, "Post"));
    }

    #[test]
    fn test_unknown_root_fails() {
        let options = DisplayOptions::default()
            .merged(&DisplayOptionsPatch::default().root_type(Some(NodeId::for_type("Nope"))));
        assert!(matches!(
            render_dot(&relay_schema(), &options),
            Err(OpsError::Render(_))
        ));
    }

    #[test]
    fn test_labels_are_escaped() {
        assert_eq!(escape_html("a<b>&\""), "a&lt;b&gt;&amp;&quot;");
    }
}
