//! The pure transition function.
//!
//! [`reduce`] never mutates its input. When an event has no effect the very
//! same `Arc` comes back, so callers can detect "nothing changed" with
//! [`Arc::ptr_eq`].

use std::sync::Arc;

use crate::event::Event;
use crate::introspection::Introspection;
use crate::state::{
    ApplicationState, DisplayOptions, DisplayOptionsPatch, GraphView, PresetValue, Selection,
    StagedSchemaChoice, CUSTOM_PRESET,
};

/// Advance `state` by one event.
pub fn reduce(state: &Arc<ApplicationState>, event: Event) -> Arc<ApplicationState> {
    let previous = state.as_ref();

    let next = match event {
        Event::SchemaApplied {
            introspection,
            display_options,
        } => apply_schema(previous, introspection, display_options.as_ref()),

        Event::DisplayOptionsChanged(patch) => ApplicationState {
            display_options: previous.display_options.merged(&patch),
            graph_view: previous.graph_view.reset(),
            selection: Selection::default(),
            ..previous.clone()
        },

        Event::RenderCompleted { image, revision } => {
            if revision.is_some_and(|r| r != previous.graph_view.revision) {
                return Arc::clone(state);
            }
            ApplicationState {
                graph_view: GraphView {
                    rendered_image: Some(image),
                    ..previous.graph_view.clone()
                },
                ..previous.clone()
            }
        }

        Event::NodeSelected(node) => {
            if node == previous.selection.current_node_id {
                return Arc::clone(state);
            }
            ApplicationState {
                selection: Selection::node(node, previous.selection.type_info.clone()),
                ..previous.clone()
            }
        }

        Event::EdgeSelected(edge) => {
            let selection = if previous.selection.current_edge_id.as_ref() == Some(&edge) {
                // The node came with the edge, so it goes with it too.
                Selection::default()
            } else {
                Selection::edge(edge, previous.selection.type_info.clone())
            };
            ApplicationState {
                selection,
                ..previous.clone()
            }
        }

        Event::SelectionCleared => ApplicationState {
            selection: Selection::default(),
            ..previous.clone()
        },

        Event::TypeInfoSelected(type_info) => ApplicationState {
            selection: Selection {
                type_info,
                ..previous.selection.clone()
            },
            ..previous.clone()
        },

        Event::ElementFocusRequested(id) => ApplicationState {
            graph_view: GraphView {
                focused_id: Some(id),
                focus_requests: previous.graph_view.focus_requests.wrapping_add(1),
                ..previous.graph_view.clone()
            },
            ..previous.clone()
        },

        Event::ElementFocusAcknowledged(id) => {
            if previous.graph_view.focused_id.as_deref() != Some(id.as_str()) {
                return Arc::clone(state);
            }
            ApplicationState {
                graph_view: GraphView {
                    focused_id: None,
                    ..previous.graph_view.clone()
                },
                ..previous.clone()
            }
        }

        Event::ErrorReported(message) => ApplicationState {
            error_message: Some(message),
            ..previous.clone()
        },

        Event::ErrorCleared => ApplicationState {
            error_message: None,
            ..previous.clone()
        },

        Event::ChooserOpened => {
            if previous.staged.is_some() {
                return Arc::clone(state);
            }
            ApplicationState {
                staged: Some(StagedSchemaChoice::default()),
                ..previous.clone()
            }
        }

        Event::ChoiceStaged { name, value } => {
            let value = match value {
                Some(PresetValue::Text(text)) if name == CUSTOM_PRESET => {
                    PresetValue::from_text(text)
                }
                other => other,
            };
            ApplicationState {
                staged: Some(StagedSchemaChoice {
                    active_preset_name: Some(name),
                    preset_value: value,
                }),
                ..previous.clone()
            }
        }

        Event::ChoiceDiscarded => {
            if previous.staged.is_none() {
                return Arc::clone(state);
            }
            ApplicationState {
                staged: None,
                ..previous.clone()
            }
        }

        Event::ActivePresetChanged(name) => ApplicationState {
            active_preset: name,
            ..previous.clone()
        },

        Event::SchemaRequested(token) => ApplicationState {
            pending_request: Some(token),
            ..previous.clone()
        },

        Event::SchemaFetched {
            token,
            introspection,
        } => {
            if previous.pending_request != Some(token) {
                return Arc::clone(state);
            }
            apply_schema(previous, introspection, None)
        }

        Event::SchemaFetchFailed { token, message } => {
            if previous.pending_request != Some(token) {
                return Arc::clone(state);
            }
            ApplicationState {
                error_message: Some(message),
                pending_request: None,
                ..previous.clone()
            }
        }
    };

    Arc::new(next)
}

fn apply_schema(
    previous: &ApplicationState,
    introspection: Arc<Introspection>,
    display_options: Option<&DisplayOptionsPatch>,
) -> ApplicationState {
    let defaults = DisplayOptions::default();
    ApplicationState {
        schema: Some(introspection),
        display_options: match display_options {
            Some(patch) => defaults.merged(patch),
            None => defaults,
        },
        graph_view: previous.graph_view.reset(),
        selection: Selection::default(),
        // Whatever was in flight has been superseded.
        pending_request: None,
        ..previous.clone()
    }
}
