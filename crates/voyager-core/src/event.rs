//! Events that advance the view state.
//!
//! Serialized as `{"type": "...", "payload": ...}` so event logs and API
//! clients can submit them directly.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ids::{EdgeId, NodeId};
use crate::introspection::Introspection;
use crate::state::{DisplayOptionsPatch, PresetValue, RenderedImage, RequestToken, ViewRevision};

/// A discrete input to [`crate::reduce`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Event {
    /// A schema was chosen and should be shown.
    SchemaApplied {
        introspection: Arc<Introspection>,
        #[serde(default)]
        display_options: Option<DisplayOptionsPatch>,
    },
    DisplayOptionsChanged(DisplayOptionsPatch),
    /// The renderer produced an image. With a revision, only applies to that view.
    RenderCompleted {
        image: RenderedImage,
        #[serde(default)]
        revision: Option<ViewRevision>,
    },
    NodeSelected(Option<NodeId>),
    EdgeSelected(EdgeId),
    SelectionCleared,
    TypeInfoSelected(Option<String>),
    ElementFocusRequested(String),
    ElementFocusAcknowledged(String),
    ErrorReported(String),
    ErrorCleared,
    /// The schema chooser was opened with nothing picked yet.
    ChooserOpened,
    ChoiceStaged {
        name: String,
        #[serde(default)]
        value: Option<PresetValue>,
    },
    ChoiceDiscarded,
    ActivePresetChanged(Option<String>),
    /// A schema fetch was issued; only its token may complete it.
    SchemaRequested(RequestToken),
    SchemaFetched {
        token: RequestToken,
        introspection: Arc<Introspection>,
    },
    SchemaFetchFailed {
        token: RequestToken,
        message: String,
    },
}

impl Event {
    /// Apply a schema with default display options.
    pub fn schema_applied(introspection: Arc<Introspection>) -> Self {
        Self::SchemaApplied {
            introspection,
            display_options: None,
        }
    }

    /// Stable name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::SchemaApplied { .. } => "schema_applied",
            Event::DisplayOptionsChanged(_) => "display_options_changed",
            Event::RenderCompleted { .. } => "render_completed",
            Event::NodeSelected(_) => "node_selected",
            Event::EdgeSelected(_) => "edge_selected",
            Event::SelectionCleared => "selection_cleared",
            Event::TypeInfoSelected(_) => "type_info_selected",
            Event::ElementFocusRequested(_) => "element_focus_requested",
            Event::ElementFocusAcknowledged(_) => "element_focus_acknowledged",
            Event::ErrorReported(_) => "error_reported",
            Event::ErrorCleared => "error_cleared",
            Event::ChooserOpened => "chooser_opened",
            Event::ChoiceStaged { .. } => "choice_staged",
            Event::ChoiceDiscarded => "choice_discarded",
            Event::ActivePresetChanged(_) => "active_preset_changed",
            Event::SchemaRequested(_) => "schema_requested",
            Event::SchemaFetched { .. } => "schema_fetched",
            Event::SchemaFetchFailed { .. } => "schema_fetch_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let event = Event::EdgeSelected(EdgeId::from("Query.user"));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value, json!({ "type": "edge_selected", "payload": "Query.user" }));
        assert_eq!(event.kind(), "edge_selected");
    }

    #[test]
    fn test_unit_and_partial_payloads() {
        let cleared: Event = serde_json::from_value(json!({ "type": "selection_cleared" })).unwrap();
        assert_eq!(cleared, Event::SelectionCleared);

        let changed: Event = serde_json::from_value(json!({
            "type": "display_options_changed",
            "payload": { "sort_by_alphabet": true }
        }))
        .unwrap();
        assert_eq!(
            changed,
            Event::DisplayOptionsChanged(DisplayOptionsPatch::default().sort_by_alphabet(true))
        );
    }

    #[test]
    fn test_schema_payloads_are_validated() {
        let empty = json!({
            "type": "schema_applied",
            "payload": { "introspection": {
                "__schema": { "queryType": { "name": "Nope" }, "types": [] }
            } }
        });
        let err = serde_json::from_value::<Event>(empty).unwrap_err();
        assert!(err.to_string().contains("no types"));

        let missing_root = json!({
            "type": "schema_fetched",
            "payload": { "token": 1, "introspection": { "__schema": {
                "queryType": { "name": "Nope" },
                "types": [ { "kind": "SCALAR", "name": "String" } ]
            } } }
        });
        let err = serde_json::from_value::<Event>(missing_root).unwrap_err();
        assert!(err.to_string().contains("`Nope`"));

        let valid = json!({
            "type": "schema_applied",
            "payload": { "introspection": crate::introspection::fixtures::sample_value() }
        });
        let event: Event = serde_json::from_value(valid).unwrap();
        assert!(matches!(event, Event::SchemaApplied { .. }));
    }

    #[test]
    fn test_unknown_kind_rejected_at_boundary() {
        let result: Result<Event, _> = serde_json::from_value(json!({ "type": "teleport" }));
        assert!(result.is_err());
    }
}
