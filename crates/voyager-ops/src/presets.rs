//! Named introspection results offered as one-click choices.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};
use voyager_core::{Introspection, CUSTOM_PRESET};
use walkdir::WalkDir;

use crate::error::{OpsError, OpsResult};

/// Ordered mapping of preset name to introspection result.
#[derive(Debug, Clone, Default)]
pub struct Presets {
    entries: BTreeMap<String, Arc<Introspection>>,
}

impl Presets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load presets from a JSON object file or a directory of `*.json` files.
    ///
    /// In a directory each file stem becomes the preset name.
    pub fn load(path: impl AsRef<Path>) -> OpsResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(OpsError::preset_load(path, "path does not exist"));
        }

        let presets = if path.is_dir() {
            Self::load_dir(path)?
        } else {
            Self::load_file(path)?
        };

        info!(path = %path.display(), count = presets.len(), "Loaded schema presets");
        Ok(presets)
    }

    fn load_file(path: &Path) -> OpsResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let value: Value =
            serde_json::from_str(&contents).map_err(|e| OpsError::preset_load(path, e))?;

        let Value::Object(map) = value else {
            return Err(OpsError::preset_load(
                path,
                "expected an object mapping preset names to introspection results",
            ));
        };

        let mut presets = Self::new();
        for (name, value) in map {
            let introspection = Introspection::from_value(value)
                .map_err(|e| OpsError::preset_load(path, format!("preset `{}`: {}", name, e)))?;
            presets.insert(name, introspection)?;
        }
        Ok(presets)
    }

    fn load_dir(dir: &Path) -> OpsResult<Self> {
        let mut presets = Self::new();

        for entry in WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let contents = std::fs::read_to_string(path)?;
            let introspection = Introspection::from_json_str(&contents)
                .map_err(|e| OpsError::preset_load(path, e))?;
            debug!(preset = name, "Loaded preset file");
            presets.insert(name, introspection)?;
        }

        Ok(presets)
    }

    /// Add a preset. `custom` is reserved for pasted text.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        introspection: Introspection,
    ) -> OpsResult<()> {
        let name = name.into();
        if name == CUSTOM_PRESET {
            return Err(OpsError::configuration(format!(
                "`{}` is reserved and cannot be used as a preset name",
                CUSTOM_PRESET
            )));
        }
        self.entries.insert(name, Arc::new(introspection));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<Introspection>> {
        self.entries.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn schema_json(root: &str) -> Value {
        json!({ "__schema": {
            "queryType": { "name": root },
            "types": [ { "kind": "OBJECT", "name": root, "fields": [] } ]
        } })
    }

    #[test]
    fn test_load_mapping_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("presets.json");
        let mapping = json!({ "swapi": schema_json("Root"), "github": schema_json("Query") });
        std::fs::write(&path, mapping.to_string()).unwrap();

        let presets = Presets::load(&path).unwrap();
        assert_eq!(presets.names().collect::<Vec<_>>(), vec!["github", "swapi"]);
        assert_eq!(presets.get("swapi").unwrap().root_type_name(), "Root");
    }

    #[test]
    fn test_load_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("yelp.json"), schema_json("Query").to_string()).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let presets = Presets::load(dir.path()).unwrap();
        assert_eq!(presets.len(), 1);
        assert!(presets.contains("yelp"));
    }

    #[test]
    fn test_custom_name_reserved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("presets.json");
        std::fs::write(&path, json!({ "custom": schema_json("Query") }).to_string()).unwrap();

        assert!(matches!(
            Presets::load(&path),
            Err(OpsError::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_path_fails() {
        assert!(matches!(
            Presets::load("/definitely/not/here.json"),
            Err(OpsError::PresetLoad { .. })
        ));
    }

    #[test]
    fn test_bad_preset_reports_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("presets.json");
        std::fs::write(&path, json!({ "broken": { "nope": true } }).to_string()).unwrap();

        let err = Presets::load(&path).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }
}
