//! Read-only key-value access to an exported ggcov web database.
//!
//! Two keys matter here: `GI`, the diagram index mapping each diagram
//! name to its scene number and title, and `G<n>`, the scene records for
//! diagram number `n`.

use crate::error::{RequestError, StoreError};
use crate::ir::Scene;
use crate::parser::parse_scene;
use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::path::PathBuf;

pub const DIAGRAM_INDEX_KEY: &str = "GI";

pub fn scene_key(index: u32) -> String {
    format!("G{index}")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramEntry {
    pub name: String,
    pub index: u32,
    pub title: String,
}

/// Diagrams in database order; the first one is shown when a request
/// names none.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DiagramIndex {
    entries: Vec<DiagramEntry>,
}

impl DiagramIndex {
    pub fn from_value(value: &Value) -> Result<Self, StoreError> {
        let object = value
            .as_object()
            .ok_or_else(|| StoreError::BadIndex("expected an object".to_string()))?;
        let mut entries = Vec::with_capacity(object.len());
        for (name, entry) in object {
            let bad = || StoreError::BadIndex(format!("entry \"{name}\" must be [index, title]"));
            let fields = entry.as_array().filter(|f| f.len() == 2).ok_or_else(bad)?;
            let index = fields[0]
                .as_u64()
                .and_then(|i| u32::try_from(i).ok())
                .ok_or_else(bad)?;
            let title = fields[1].as_str().ok_or_else(bad)?;
            entries.push(DiagramEntry {
                name: name.clone(),
                index,
                title: title.to_string(),
            });
        }
        Ok(Self { entries })
    }

    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        for entry in &self.entries {
            object.insert(entry.name.clone(), json!([entry.index, entry.title]));
        }
        Value::Object(object)
    }

    pub fn entries(&self) -> &[DiagramEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&DiagramEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Looks up a requested diagram, defaulting to the first one. An
    /// unknown name is fatal for the request.
    pub fn resolve(&self, name: Option<&str>) -> Result<&DiagramEntry, RequestError> {
        match name {
            Some(name) => self
                .get(name)
                .ok_or_else(|| RequestError::UnknownDiagram(name.to_string())),
            None => self.entries.first().ok_or(RequestError::NoDiagrams),
        }
    }
}

pub trait SceneStore {
    fn fetch(&self, key: &str) -> Result<Value, StoreError>;

    fn diagram_index(&self) -> Result<DiagramIndex, StoreError> {
        DiagramIndex::from_value(&self.fetch(DIAGRAM_INDEX_KEY)?)
    }

    fn fetch_scene(&self, entry: &DiagramEntry) -> Result<Scene, StoreError> {
        let key = scene_key(entry.index);
        let value = self.fetch(&key)?;
        parse_scene(&value).map_err(|source| StoreError::Scene { key, source })
    }
}

/// All keys of a database exported as one JSON object. The file is read
/// on first fetch and kept for the lifetime of the store.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    data: OnceCell<Map<String, Value>>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            data: OnceCell::new(),
        }
    }

    fn load(&self) -> Result<&Map<String, Value>, StoreError> {
        self.data.get_or_try_init(|| {
            log::debug!("loading scene store {}", self.path.display());
            let contents = std::fs::read_to_string(&self.path).map_err(|source| StoreError::Open {
                path: self.path.clone(),
                source,
            })?;
            let value: Value = serde_json::from_str(&contents).map_err(|source| StoreError::Json {
                path: self.path.clone(),
                source,
            })?;
            match value {
                Value::Object(map) => Ok(map),
                _ => Err(StoreError::NotAnObject),
            }
        })
    }
}

impl SceneStore for JsonFileStore {
    fn fetch(&self, key: &str) -> Result<Value, StoreError> {
        self.load()?
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::MissingKey(key.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct MemoryStore {
    data: Map<String, Value>,
    index: DiagramIndex,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let index = DiagramIndex::default();
        let mut data = Map::new();
        data.insert(DIAGRAM_INDEX_KEY.to_string(), index.to_value());
        Self { data, index }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Appends a diagram to the index and stores its scene under the next
    /// scene number. Re-inserting a name replaces its title and scene.
    pub fn insert_diagram(&mut self, name: &str, title: &str, scene: &Scene) -> &mut Self {
        let index = match self.index.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.title = title.to_string();
                entry.index
            }
            None => {
                let index = self
                    .index
                    .entries
                    .iter()
                    .map(|e| e.index + 1)
                    .max()
                    .unwrap_or(0);
                self.index.entries.push(DiagramEntry {
                    name: name.to_string(),
                    index,
                    title: title.to_string(),
                });
                index
            }
        };
        self.data.insert(scene_key(index), scene.to_records());
        self.data
            .insert(DIAGRAM_INDEX_KEY.to_string(), self.index.to_value());
        self
    }

    /// The whole database as one JSON object, the format `JsonFileStore`
    /// reads.
    pub fn to_value(&self) -> Value {
        Value::Object(self.data.clone())
    }
}

impl SceneStore for MemoryStore {
    fn fetch(&self, key: &str) -> Result<Value, StoreError> {
        self.data
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::MissingKey(key.to_string()))
    }
}
