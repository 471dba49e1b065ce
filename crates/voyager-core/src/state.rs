//! View-state value types.
//!
//! Everything here is plain data. [`ApplicationState`] is only ever replaced,
//! never edited in place, so snapshots handed to readers stay consistent.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ids::{EdgeId, NodeId, ScalarId};
use crate::introspection::Introspection;

/// Reserved preset name for pasted schema text.
pub const CUSTOM_PRESET: &str = "custom";

/// How the schema graph should be drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOptions {
    /// Type to render as root; the query type when absent.
    #[serde(default)]
    pub root_type_id: Option<NodeId>,
    pub skip_relay: bool,
    pub sort_by_alphabet: bool,
    pub show_leaf_fields: bool,
    pub hide_root: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            root_type_id: None,
            skip_relay: true,
            sort_by_alphabet: false,
            show_leaf_fields: true,
            hide_root: false,
        }
    }
}

impl DisplayOptions {
    /// Shallow merge: every field set in `patch` wins.
    pub fn merged(&self, patch: &DisplayOptionsPatch) -> Self {
        Self {
            root_type_id: match &patch.root_type_id {
                Some(root) => root.clone(),
                None => self.root_type_id.clone(),
            },
            skip_relay: patch.skip_relay.unwrap_or(self.skip_relay),
            sort_by_alphabet: patch.sort_by_alphabet.unwrap_or(self.sort_by_alphabet),
            show_leaf_fields: patch.show_leaf_fields.unwrap_or(self.show_leaf_fields),
            hide_root: patch.hide_root.unwrap_or(self.hide_root),
        }
    }
}

/// Partial [`DisplayOptions`]; unset fields leave the current value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOptionsPatch {
    /// `Some(None)` clears the root, `None` keeps it.
    #[serde(
        default,
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub root_type_id: Option<Option<NodeId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_relay: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by_alphabet: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_leaf_fields: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_root: Option<bool>,
}

/// Keeps a present `null` apart from an absent field.
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl DisplayOptionsPatch {
    pub fn root_type(mut self, root: Option<NodeId>) -> Self {
        self.root_type_id = Some(root);
        self
    }

    pub fn skip_relay(mut self, value: bool) -> Self {
        self.skip_relay = Some(value);
        self
    }

    pub fn sort_by_alphabet(mut self, value: bool) -> Self {
        self.sort_by_alphabet = Some(value);
        self
    }

    pub fn show_leaf_fields(mut self, value: bool) -> Self {
        self.show_leaf_fields = Some(value);
        self
    }

    pub fn hide_root(mut self, value: bool) -> Self {
        self.hide_root = Some(value);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// What the user has picked in the graph.
///
/// An edge selection always carries the node that owns the edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub current_node_id: Option<NodeId>,
    pub current_edge_id: Option<EdgeId>,
    pub scalar_id: Option<ScalarId>,
    /// Item shown in the type-info side panel.
    #[serde(default)]
    pub type_info: Option<String>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn node(node: Option<NodeId>, type_info: Option<String>) -> Self {
        Self {
            current_node_id: node,
            current_edge_id: None,
            scalar_id: None,
            type_info,
        }
    }

    pub fn edge(edge: EdgeId, type_info: Option<String>) -> Self {
        Self {
            current_node_id: Some(edge.owner_node()),
            current_edge_id: Some(edge),
            scalar_id: None,
            type_info,
        }
    }
}

/// Rendered graph artifact. Opaque to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderedImage(pub Arc<str>);

impl RenderedImage {
    pub fn new(content: impl Into<Arc<str>>) -> Self {
        Self(content.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Counter bumped every time the graph view is reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewRevision(pub u64);

impl ViewRevision {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Renderer-facing part of the state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphView {
    pub rendered_image: Option<RenderedImage>,
    /// Element the renderer has been asked to focus and not yet confirmed.
    pub focused_id: Option<String>,
    pub revision: ViewRevision,
    /// Number of focus requests so far. Survives resets so a repeated request
    /// for the same element is still told apart from the previous one.
    #[serde(default)]
    pub focus_requests: u64,
}

impl GraphView {
    /// Empty view for the next revision.
    pub fn reset(&self) -> Self {
        Self {
            rendered_image: None,
            focused_id: None,
            revision: self.revision.next(),
            focus_requests: self.focus_requests,
        }
    }
}

/// Token identifying one schema fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestToken(pub u64);

/// Value staged for a preset card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PresetValue {
    Introspection(Arc<Introspection>),
    Text(String),
}

impl PresetValue {
    /// Pasted text with empty input normalised to "nothing typed yet".
    pub fn from_text(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.is_empty() {
            None
        } else {
            Some(Self::Text(text))
        }
    }
}

/// A schema choice that has been made in the chooser but not applied yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StagedSchemaChoice {
    pub active_preset_name: Option<String>,
    pub preset_value: Option<PresetValue>,
}

impl StagedSchemaChoice {
    pub fn is_custom(&self) -> bool {
        self.active_preset_name.as_deref() == Some(CUSTOM_PRESET)
    }
}

/// The whole view state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationState {
    pub schema: Option<Arc<Introspection>>,
    pub display_options: DisplayOptions,
    pub selection: Selection,
    pub graph_view: GraphView,
    pub staged: Option<StagedSchemaChoice>,
    pub error_message: Option<String>,
    /// Preset the applied schema came from.
    pub active_preset: Option<String>,
    /// Latest schema fetch still awaiting its response.
    pub pending_request: Option<RequestToken>,
}

impl ApplicationState {
    pub fn has_schema(&self) -> bool {
        self.schema.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.pending_request.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = ApplicationState::default();
        assert!(state.schema.is_none());
        assert!(state.display_options.skip_relay);
        assert!(!state.display_options.sort_by_alphabet);
        assert!(state.display_options.show_leaf_fields);
        assert!(!state.display_options.hide_root);
        assert!(state.selection.is_empty());
        assert_eq!(state.graph_view, GraphView::default());
        assert!(state.error_message.is_none());
    }

    #[test]
    fn test_merge_patch_wins_per_field() {
        let base = DisplayOptions::default();
        let merged = base.merged(&DisplayOptionsPatch::default().sort_by_alphabet(true));

        assert!(merged.sort_by_alphabet);
        assert_eq!(merged.skip_relay, base.skip_relay);
        assert_eq!(merged.show_leaf_fields, base.show_leaf_fields);
    }

    #[test]
    fn test_merge_root_can_be_cleared() {
        let base = DisplayOptions {
            root_type_id: Some(NodeId::for_type("User")),
            ..Default::default()
        };

        let kept = base.merged(&DisplayOptionsPatch::default());
        assert_eq!(kept.root_type_id, Some(NodeId::for_type("User")));

        let cleared = base.merged(&DisplayOptionsPatch::default().root_type(None));
        assert_eq!(cleared.root_type_id, None);
    }

    #[test]
    fn test_patch_from_partial_json() {
        let patch: DisplayOptionsPatch =
            serde_json::from_str(r#"{"hide_root": true}"#).unwrap();
        assert_eq!(patch.hide_root, Some(true));
        assert_eq!(patch.skip_relay, None);
        assert_eq!(patch.root_type_id, None);

        let clear: DisplayOptionsPatch =
            serde_json::from_str(r#"{"root_type_id": null}"#).unwrap();
        assert_eq!(clear.root_type_id, Some(None));
    }

    #[test]
    fn test_empty_text_is_nothing_typed() {
        assert_eq!(PresetValue::from_text(""), None);
        assert_eq!(
            PresetValue::from_text("{}"),
            Some(PresetValue::Text("{}".to_string()))
        );
    }

    #[test]
    fn test_view_reset_bumps_revision() {
        let view = GraphView {
            rendered_image: Some(RenderedImage::new("digraph {}")),
            focused_id: Some("TYPE::User".into()),
            revision: ViewRevision(3),
            focus_requests: 2,
        };
        let reset = view.reset();
        assert!(reset.rendered_image.is_none());
        assert!(reset.focused_id.is_none());
        assert_eq!(reset.revision, ViewRevision(4));
        assert_eq!(reset.focus_requests, 2);
    }
}
