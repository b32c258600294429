//! document::schema
//!
//! Scene document schema (v1).
//!
//! # Schema Design
//!
//! A scene document is:
//! - Self-describing with `kind` and `schema_version`
//! - Strictly parsed (unknown top-level and object fields rejected)
//! - Validated after parsing: index ranges, unique ids, active id exists
//!
//! Mesh payloads carry durable data (geometry, flags, point attributes).
//! Objects in edit mode also carry their working layers, so a session that
//! spans several `mlk` invocations keeps its working state.
//!
//! # Example
//!
//! ```
//! use meshlock::document::schema::{parse_document, SceneDocument, DOCUMENT_KIND};
//! use meshlock::core::types::SelectMode;
//!
//! let doc = SceneDocument::new(SelectMode::Vertex);
//! let json = serde_json::to_string(&doc).unwrap();
//! let parsed = parse_document(&json).unwrap();
//! assert_eq!(parsed.kind, DOCUMENT_KIND);
//! assert!(parsed.objects.is_empty());
//! ```

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{ObjectId, SelectMode};
use crate::engine::WorkflowRegistry;
use crate::host::{MemoryMesh, MeshData};

/// The kind identifier for scene documents.
pub const DOCUMENT_KIND: &str = "meshlock.scene";

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors from document parsing and validation.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to parse scene document: {0}")]
    ParseError(String),

    #[error("invalid kind '{found}', expected '{}'", DOCUMENT_KIND)]
    InvalidKind { found: String },

    #[error("unsupported schema version {0}, supported: {SCHEMA_VERSION}")]
    UnsupportedVersion(u32),

    #[error("invalid scene document: {0}")]
    InvalidValue(String),

    #[error("scene has no active object")]
    NoActiveObject,

    #[error("failed to access '{path}': {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

/// Envelope for version dispatch before full parsing.
#[derive(Debug, Deserialize)]
struct DocumentEnvelope {
    kind: String,
    schema_version: u32,
}

/// Parse a scene document with version dispatch and validation.
pub fn parse_document(json: &str) -> Result<SceneDocument, DocumentError> {
    let envelope: DocumentEnvelope =
        serde_json::from_str(json).map_err(|e| DocumentError::ParseError(e.to_string()))?;

    if envelope.kind != DOCUMENT_KIND {
        return Err(DocumentError::InvalidKind {
            found: envelope.kind,
        });
    }

    match envelope.schema_version {
        1 => {
            let doc: SceneDocument = serde_json::from_str(json)
                .map_err(|e| DocumentError::ParseError(e.to_string()))?;
            doc.validate()?;
            Ok(doc)
        }
        v => Err(DocumentError::UnsupportedVersion(v)),
    }
}

/// Object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Mesh,
    Empty,
}

/// Interaction mode of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectMode {
    #[default]
    Object,
    Edit,
}

/// One object in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneObject {
    pub id: ObjectId,
    pub name: String,
    pub kind: ObjectKind,
    #[serde(default)]
    pub mode: ObjectMode,
    /// Mesh payload, present for mesh objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<MeshData>,
    /// Working layers of an open edit session
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub working: BTreeMap<String, Vec<i32>>,
}

impl SceneObject {
    /// A mesh object in object mode.
    pub fn mesh(name: impl Into<String>, data: MeshData) -> Self {
        Self {
            id: ObjectId::new(),
            name: name.into(),
            kind: ObjectKind::Mesh,
            mode: ObjectMode::Object,
            mesh: Some(data),
            working: BTreeMap::new(),
        }
    }

    /// An object without geometry.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            id: ObjectId::new(),
            name: name.into(),
            kind: ObjectKind::Empty,
            mode: ObjectMode::Object,
            mesh: None,
            working: BTreeMap::new(),
        }
    }

    /// Whether an edit session is open.
    pub fn is_editing(&self) -> bool {
        self.mode == ObjectMode::Edit
    }

    /// Open a mesh editor over this object.
    pub fn editor(&self, select_mode: SelectMode) -> MemoryMesh {
        let data = self.mesh.clone().unwrap_or_default();
        let mut editor = MemoryMesh::new(data)
            .with_id(self.id)
            .with_mode(select_mode);
        editor.set_is_mesh(self.kind == ObjectKind::Mesh);
        if self.is_editing() {
            for (name, values) in &self.working {
                editor.restore_layer(name, values.clone());
            }
        } else {
            editor.close_session();
        }
        editor
    }

    /// Take back the state of an editor opened with [`SceneObject::editor`].
    pub fn absorb(&mut self, editor: &MemoryMesh) {
        if self.kind == ObjectKind::Mesh {
            self.mesh = Some(editor.data().clone());
        }
        self.working = if self.is_editing() {
            editor.layers().clone()
        } else {
            BTreeMap::new()
        };
    }

    fn validate(&self) -> Result<(), DocumentError> {
        if self.name.trim().is_empty() {
            return Err(DocumentError::InvalidValue(format!(
                "object {} has an empty name",
                self.id
            )));
        }
        match (self.kind, &self.mesh) {
            (ObjectKind::Mesh, None) => {
                return Err(DocumentError::InvalidValue(format!(
                    "mesh object '{}' has no mesh data",
                    self.name
                )))
            }
            (ObjectKind::Empty, Some(_)) => {
                return Err(DocumentError::InvalidValue(format!(
                    "empty object '{}' carries mesh data",
                    self.name
                )))
            }
            (ObjectKind::Empty, None) if self.mode == ObjectMode::Edit => {
                return Err(DocumentError::InvalidValue(format!(
                    "empty object '{}' cannot be in edit mode",
                    self.name
                )))
            }
            _ => {}
        }

        if let Some(mesh) = &self.mesh {
            mesh.validate().map_err(|e| {
                DocumentError::InvalidValue(format!("object '{}': {}", self.name, e))
            })?;
            let count = mesh.verts.len();
            for (name, values) in mesh.attributes.iter().chain(self.working.iter()) {
                if values.len() > count {
                    return Err(DocumentError::InvalidValue(format!(
                        "object '{}': layer '{}' is longer than the vertex count",
                        self.name, name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A scene document (v1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDocument {
    /// Kind identifier (always "meshlock.scene")
    pub kind: String,

    /// Schema version (always 1 for this struct)
    pub schema_version: u32,

    /// When the document was last written
    pub saved_at: DateTime<Utc>,

    /// Active object, if any
    #[serde(default)]
    pub active: Option<ObjectId>,

    /// Host-wide selection mode
    #[serde(default)]
    pub select_mode: SelectMode,

    #[serde(default)]
    pub objects: Vec<SceneObject>,

    /// Unlock workflow state per object
    #[serde(default)]
    pub workflow: WorkflowRegistry,
}

impl SceneDocument {
    /// An empty scene.
    pub fn new(select_mode: SelectMode) -> Self {
        Self {
            kind: DOCUMENT_KIND.to_string(),
            schema_version: SCHEMA_VERSION,
            saved_at: Utc::now(),
            active: None,
            select_mode,
            objects: Vec::new(),
            workflow: WorkflowRegistry::new(),
        }
    }

    /// Add an object and make it active.
    pub fn add_active(&mut self, object: SceneObject) -> ObjectId {
        let id = object.id;
        self.objects.push(object);
        self.active = Some(id);
        id
    }

    /// Look up an object.
    pub fn find(&self, id: &ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == *id)
    }

    /// The active object.
    pub fn active(&self) -> Result<&SceneObject, DocumentError> {
        self.active
            .and_then(|id| self.find(&id))
            .ok_or(DocumentError::NoActiveObject)
    }

    /// The active object, mutably.
    pub fn active_mut(&mut self) -> Result<&mut SceneObject, DocumentError> {
        let id = self.active.ok_or(DocumentError::NoActiveObject)?;
        self.objects
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(DocumentError::NoActiveObject)
    }

    /// Validate the document structure.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.kind != DOCUMENT_KIND {
            return Err(DocumentError::InvalidKind {
                found: self.kind.clone(),
            });
        }
        if self.schema_version != SCHEMA_VERSION {
            return Err(DocumentError::UnsupportedVersion(self.schema_version));
        }

        let mut seen = HashSet::new();
        for object in &self.objects {
            if !seen.insert(object.id) {
                return Err(DocumentError::InvalidValue(format!(
                    "duplicate object id {}",
                    object.id
                )));
            }
            object.validate()?;
        }

        if let Some(active) = &self.active {
            if !seen.contains(active) {
                return Err(DocumentError::InvalidValue(format!(
                    "active object {} does not exist",
                    active
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ElemKind;
    use crate::host::MeshEditor;

    fn sample() -> SceneDocument {
        let mut doc = SceneDocument::new(SelectMode::Vertex);
        doc.add_active(SceneObject::mesh("Plane", MeshData::grid(1, 1)));
        doc.objects.push(SceneObject::empty("Empty"));
        doc
    }

    mod parsing {
        use super::*;

        #[test]
        fn roundtrip() {
            let doc = sample();
            let json = serde_json::to_string_pretty(&doc).unwrap();
            let parsed = parse_document(&json).unwrap();
            assert_eq!(parsed, doc);
        }

        #[test]
        fn wrong_kind() {
            let json = r#"{"kind": "other", "schema_version": 1}"#;
            assert!(matches!(
                parse_document(json),
                Err(DocumentError::InvalidKind { .. })
            ));
        }

        #[test]
        fn future_version() {
            let json = r#"{"kind": "meshlock.scene", "schema_version": 7}"#;
            assert!(matches!(
                parse_document(json),
                Err(DocumentError::UnsupportedVersion(7))
            ));
        }

        #[test]
        fn unknown_field_rejected() {
            let mut value = serde_json::to_value(sample()).unwrap();
            value["surprise"] = serde_json::json!(true);
            assert!(matches!(
                parse_document(&value.to_string()),
                Err(DocumentError::ParseError(_))
            ));
        }
    }

    mod validation {
        use super::*;

        #[test]
        fn duplicate_ids() {
            let mut doc = sample();
            let copy = doc.objects[0].clone();
            doc.objects.push(copy);
            assert!(doc.validate().is_err());
        }

        #[test]
        fn missing_active() {
            let mut doc = sample();
            doc.active = Some(ObjectId::new());
            assert!(doc.validate().is_err());
        }

        #[test]
        fn bad_topology() {
            let mut doc = sample();
            if let Some(mesh) = doc.objects[0].mesh.as_mut() {
                mesh.edges[0].verts = [0, 99];
            }
            assert!(doc.validate().is_err());
        }

        #[test]
        fn long_attribute() {
            let mut doc = sample();
            if let Some(mesh) = doc.objects[0].mesh.as_mut() {
                mesh.attributes.insert("lock".into(), vec![0; 10]);
            }
            assert!(doc.validate().is_err());
        }
    }

    mod editors {
        use super::*;

        #[test]
        fn object_mode_has_no_session() {
            let doc = sample();
            let editor = doc.active().unwrap().editor(doc.select_mode);
            assert!(!editor.is_editing());
            assert!(editor.is_mesh());
        }

        #[test]
        fn empty_is_not_a_mesh() {
            let doc = sample();
            assert!(!doc.objects[1].editor(SelectMode::Vertex).is_mesh());
        }

        #[test]
        fn working_layers_survive_absorb() {
            let mut doc = sample();
            let object = doc.active_mut().unwrap();
            object.mode = ObjectMode::Edit;

            let mut editor = object.editor(SelectMode::Vertex);
            editor.ensure_vert_layer("lock");
            editor.set_vert_layer_value("lock", 2, 1).unwrap();
            editor.set_hidden(ElemKind::Vert, 2, true).unwrap();
            object.absorb(&editor);

            let reopened = object.editor(SelectMode::Vertex);
            assert_eq!(reopened.layer("lock"), Some(&[0, 0, 1, 0][..]));
            assert!(reopened.flags(ElemKind::Vert, 2).unwrap().hidden);
        }
    }
}
