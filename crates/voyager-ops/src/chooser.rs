//! Staging and committing a schema choice.
//!
//! The chooser never touches the applied schema directly. It turns user
//! intent into events: staging produces `ChoiceStaged`, a successful commit
//! produces `ActivePresetChanged`, `SchemaApplied` and `ChoiceDiscarded`.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use voyager_core::{Event, Introspection, PresetValue, StagedSchemaChoice, CUSTOM_PRESET};

use crate::error::{CommitBlocked, OpsError, OpsResult};
use crate::parser::SchemaParser;
use crate::presets::Presets;

/// What the chooser's message area should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChooserStatus {
    /// Whether "commit" is enabled.
    pub valid: bool,
    /// Blocking reason, absent once the choice is valid.
    pub message: Option<String>,
    /// The message comes from a failed parse rather than missing input.
    pub is_error: bool,
}

/// Turns staged choices into schema applications.
#[derive(Clone)]
pub struct SchemaChooser {
    presets: Arc<Presets>,
    parser: Arc<dyn SchemaParser>,
}

impl std::fmt::Debug for SchemaChooser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaChooser")
            .field("presets", &self.presets.len())
            .finish()
    }
}

impl SchemaChooser {
    pub fn new(presets: Arc<Presets>, parser: Arc<dyn SchemaParser>) -> Self {
        Self { presets, parser }
    }

    pub fn presets(&self) -> &Presets {
        &self.presets
    }

    /// Event staging the preset called `name`.
    ///
    /// `custom` stages the free-text card with nothing typed yet.
    pub fn stage_preset(&self, name: &str) -> OpsResult<Event> {
        if name == CUSTOM_PRESET {
            return Ok(Event::ChoiceStaged {
                name: CUSTOM_PRESET.to_string(),
                value: None,
            });
        }

        let introspection = self
            .presets
            .get(name)
            .ok_or_else(|| OpsError::UnknownPreset {
                name: name.to_string(),
            })?;

        Ok(Event::ChoiceStaged {
            name: name.to_string(),
            value: Some(PresetValue::Introspection(introspection)),
        })
    }

    /// Event staging whatever is typed into the custom card.
    pub fn stage_text(&self, text: &str) -> Event {
        Event::ChoiceStaged {
            name: CUSTOM_PRESET.to_string(),
            value: PresetValue::from_text(text),
        }
    }

    /// Resolve a staged choice into a concrete schema.
    pub fn resolve(
        &self,
        staged: Option<&StagedSchemaChoice>,
    ) -> Result<Arc<Introspection>, CommitBlocked> {
        let Some(staged) = staged else {
            return Err(CommitBlocked::NoSource);
        };
        let Some(name) = staged.active_preset_name.as_deref() else {
            return Err(CommitBlocked::NoSource);
        };

        match &staged.preset_value {
            None if name == CUSTOM_PRESET => Err(CommitBlocked::NoText),
            None => self
                .presets
                .get(name)
                .ok_or(CommitBlocked::NoSource),
            Some(PresetValue::Introspection(introspection)) => Ok(Arc::clone(introspection)),
            Some(PresetValue::Text(text)) => self
                .parser
                .parse(text)
                .map(Arc::new)
                .map_err(CommitBlocked::Parse),
        }
    }

    /// Status shown next to the chooser for a staged choice.
    pub fn status(&self, staged: Option<&StagedSchemaChoice>) -> ChooserStatus {
        match self.resolve(staged) {
            Ok(_) => ChooserStatus {
                valid: true,
                message: None,
                is_error: false,
            },
            Err(blocked) => ChooserStatus {
                valid: false,
                is_error: matches!(blocked, CommitBlocked::Parse(_)),
                message: Some(blocked.to_string()),
            },
        }
    }

    /// Events that commit the staged choice, in dispatch order.
    pub fn commit(
        &self,
        staged: Option<&StagedSchemaChoice>,
    ) -> Result<Vec<Event>, CommitBlocked> {
        let introspection = self.resolve(staged)?;
        let name = staged.and_then(|s| s.active_preset_name.clone());
        debug!(preset = ?name, "Committing staged schema choice");

        Ok(vec![
            Event::ActivePresetChanged(name),
            Event::schema_applied(introspection),
            Event::ChoiceDiscarded,
        ])
    }

    /// Event dropping the staged choice.
    pub fn discard(&self) -> Event {
        Event::ChoiceDiscarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::IntrospectionJsonParser;
    use serde_json::json;
    use voyager_core::{reduce, ApplicationState};

    const CUSTOM_TEXT: &str = r#"{"__schema": {
        "queryType": {"name": "Query"},
        "types": [{"kind": "OBJECT", "name": "Query", "fields": []}]
    }}"#;

    fn chooser() -> SchemaChooser {
        let mut presets = Presets::new();
        let value = json!({ "__schema": {
            "queryType": { "name": "Root" },
            "types": [ { "kind": "OBJECT", "name": "Root", "fields": [] } ]
        } });
        presets
            .insert("swapi", Introspection::from_value(value).unwrap())
            .unwrap();
        SchemaChooser::new(Arc::new(presets), Arc::new(IntrospectionJsonParser))
    }

    fn staged(event: Event) -> StagedSchemaChoice {
        let state = reduce(&Arc::new(ApplicationState::default()), event);
        state.staged.clone().unwrap()
    }

    #[test]
    fn test_nothing_staged_asks_for_source() {
        let status = chooser().status(None);
        assert!(!status.valid);
        assert_eq!(
            status.message.as_deref(),
            Some("please select an introspection source.")
        );

        let empty = StagedSchemaChoice::default();
        assert_eq!(chooser().resolve(Some(&empty)), Err(CommitBlocked::NoSource));
    }

    #[test]
    fn test_custom_without_text_blocks_commit() {
        let chooser = chooser();
        let choice = staged(chooser.stage_preset(CUSTOM_PRESET).unwrap());

        assert_eq!(chooser.commit(Some(&choice)), Err(CommitBlocked::NoText));
        assert_eq!(
            chooser.status(Some(&choice)).message.as_deref(),
            Some("please paste your introspection")
        );
    }

    #[test]
    fn test_custom_with_bad_text_shows_parse_error() {
        let chooser = chooser();
        let choice = staged(chooser.stage_text("type Query { a: Int }"));
        let status = chooser.status(Some(&choice));

        assert!(!status.valid);
        assert!(status.is_error);
        assert!(status.message.unwrap().contains("SDL"));
    }

    #[test]
    fn test_custom_with_valid_text_commits() {
        let chooser = chooser();
        let choice = staged(chooser.stage_text(CUSTOM_TEXT));
        assert!(chooser.status(Some(&choice)).valid);

        let events = chooser.commit(Some(&choice)).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            Event::ActivePresetChanged(Some(CUSTOM_PRESET.into()))
        );
        assert!(matches!(events[1], Event::SchemaApplied { .. }));
        assert_eq!(events[2], Event::ChoiceDiscarded);
    }

    #[test]
    fn test_preset_commit_uses_preset_value() {
        let chooser = chooser();
        let choice = staged(chooser.stage_preset("swapi").unwrap());

        let events = chooser.commit(Some(&choice)).unwrap();
        let state = events
            .into_iter()
            .fold(Arc::new(ApplicationState::default()), |s, e| reduce(&s, e));

        assert_eq!(state.schema.as_ref().unwrap().root_type_name(), "Root");
        assert_eq!(state.active_preset.as_deref(), Some("swapi"));
        assert!(state.staged.is_none());
    }

    #[test]
    fn test_unknown_preset_rejected() {
        assert!(matches!(
            chooser().stage_preset("nope"),
            Err(OpsError::UnknownPreset { .. })
        ));
    }

    #[test]
    fn test_empty_text_means_nothing_typed() {
        let chooser = chooser();
        let choice = staged(chooser.stage_text(""));
        assert_eq!(choice.preset_value, None);
        assert_eq!(chooser.resolve(Some(&choice)), Err(CommitBlocked::NoText));
    }
}
