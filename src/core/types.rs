//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`ObjectId`] - Stable identity of a scene object
//! - [`LayerName`] - Validated name of the lock layer/attribute
//! - [`SelectMode`] - Host-wide selection granularity
//! - [`ElemKind`] - Vertex, edge or face
//! - [`ElemFlags`] - The `hidden`/`selected` pair every element carries
//! - [`FixupId`] - Stable identifier for a reconciler correction
//!
//! # Lock tags
//!
//! The lock bit is stored as an integer per vertex. Only the value `1` means
//! locked; every other value (including garbage written by external scripts)
//! reads as unlocked.
//!
//! # Examples
//!
//! ```
//! use meshlock::core::types::{LayerName, SelectMode};
//!
//! let layer = LayerName::new("mesh_lock_vert").unwrap();
//! assert_eq!(layer.as_str(), "mesh_lock_vert");
//! assert!(LayerName::new("has space").is_err());
//!
//! let mode: SelectMode = "edge".parse().unwrap();
//! assert_eq!(mode, SelectMode::Edge);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

/// Integer value of a locked vertex.
pub const LOCKED: i32 = 1;

/// Integer value of an unlocked vertex.
pub const UNLOCKED: i32 = 0;

/// Default name shared by the working layer and the persisted attribute.
pub const DEFAULT_LAYER_NAME: &str = "mesh_lock_vert";

/// Decode a stored lock tag.
pub fn is_locked(value: i32) -> bool {
    value == LOCKED
}

/// Encode a lock bit for storage.
pub fn lock_tag(locked: bool) -> i32 {
    if locked {
        LOCKED
    } else {
        UNLOCKED
    }
}

/// Count the locked entries of a tag array.
pub fn count_locked(tags: &[i32]) -> usize {
    tags.iter().filter(|v| is_locked(**v)).count()
}

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid layer name: {0}")]
    InvalidLayerName(String),

    #[error("invalid selection mode '{0}', expected vertex, edge or face")]
    InvalidSelectMode(String),

    #[error("invalid object id: {0}")]
    InvalidObjectId(String),
}

/// Stable identity of a scene object.
///
/// The unlock workflow is scoped per object, so the engine keys its state by
/// this id rather than by anything the host might reuse (names, indices).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ObjectId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| TypeError::InvalidObjectId(format!("{}: {}", s, e)))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated custom-data layer name.
///
/// Hosts commonly cap attribute names at 63 bytes and reject anything that is
/// not a plain identifier, so the same rules are enforced here:
/// - Cannot be empty or longer than 63 bytes
/// - ASCII letters, digits, `_` and `.` only
/// - Cannot start with a digit
///
/// # Example
///
/// ```
/// use meshlock::core::types::LayerName;
///
/// assert!(LayerName::new("lock_v2").is_ok());
/// assert!(LayerName::new("").is_err());
/// assert!(LayerName::new("9lives").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LayerName(String);

impl LayerName {
    /// Maximum accepted length in bytes.
    pub const MAX_LEN: usize = 63;

    /// Create a new validated layer name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidLayerName` if the name breaks the rules above.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidLayerName(
                "layer name cannot be empty".into(),
            ));
        }
        if name.len() > Self::MAX_LEN {
            return Err(TypeError::InvalidLayerName(format!(
                "layer name cannot exceed {} bytes",
                Self::MAX_LEN
            )));
        }
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(TypeError::InvalidLayerName(
                "layer name cannot start with a digit".into(),
            ));
        }
        if let Some(bad) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '.'))
        {
            return Err(TypeError::InvalidLayerName(format!(
                "layer name cannot contain '{}'",
                bad
            )));
        }
        Ok(())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LayerName {
    fn default() -> Self {
        Self(DEFAULT_LAYER_NAME.to_string())
    }
}

impl TryFrom<String> for LayerName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LayerName> for String {
    fn from(value: LayerName) -> Self {
        value.0
    }
}

impl fmt::Display for LayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host-wide selection granularity.
///
/// Read by the core, never written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectMode {
    #[default]
    Vertex,
    Edge,
    Face,
}

impl SelectMode {
    /// The element kind this mode selects.
    pub fn kind(self) -> ElemKind {
        match self {
            SelectMode::Vertex => ElemKind::Vert,
            SelectMode::Edge => ElemKind::Edge,
            SelectMode::Face => ElemKind::Face,
        }
    }
}

impl FromStr for SelectMode {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vertex" | "vert" => Ok(SelectMode::Vertex),
            "edge" => Ok(SelectMode::Edge),
            "face" => Ok(SelectMode::Face),
            _ => Err(TypeError::InvalidSelectMode(s.to_string())),
        }
    }
}

impl fmt::Display for SelectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectMode::Vertex => write!(f, "vertex"),
            SelectMode::Edge => write!(f, "edge"),
            SelectMode::Face => write!(f, "face"),
        }
    }
}

/// Mesh element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElemKind {
    Vert,
    Edge,
    Face,
}

impl fmt::Display for ElemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElemKind::Vert => write!(f, "vertex"),
            ElemKind::Edge => write!(f, "edge"),
            ElemKind::Face => write!(f, "face"),
        }
    }
}

/// Visibility and selection flags of one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElemFlags {
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub selected: bool,
}

impl ElemFlags {
    /// Flags of a visible, unselected element.
    pub const VISIBLE: ElemFlags = ElemFlags {
        hidden: false,
        selected: false,
    };

    /// Whether the element counts towards a selection (selected and not hidden).
    pub fn is_active(&self) -> bool {
        self.selected && !self.hidden
    }

    /// Whether a locked vertex with these flags satisfies "hidden and unselected".
    pub fn is_sealed(&self) -> bool {
        self.hidden && !self.selected
    }
}

/// A stable, deterministic identifier for a reconciler correction.
///
/// Formatted as `kind:hash(key)` so the same correction on the same object
/// produces the same id across runs.
///
/// # Example
///
/// ```
/// use meshlock::core::types::FixupId;
///
/// let id = FixupId::new("persisted-resynced", "some-object");
/// assert!(id.as_str().starts_with("persisted-resynced:"));
/// assert_eq!(id, FixupId::new("persisted-resynced", "some-object"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FixupId(String);

impl FixupId {
    /// Create an id from a correction kind and a key.
    pub fn new(kind: &str, key: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        let hash = hasher.finalize();
        let short_hash = hex::encode(&hash[..4]);
        Self(format!("{}:{}", kind, short_hash))
    }

    /// Get the string representation of the id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FixupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
