//! addon::keymap
//!
//! Key bindings for the lock operators.
//!
//! # Derivation
//!
//! [`Keymap::derive`] walks the host's native bindings and shadows the ones
//! that would bypass the guards:
//!
//! | Native binding                    | Override                          |
//! |-----------------------------------|-----------------------------------|
//! | `mesh.delete` on `X` (press)      | `mesh.lock_guard_delete_x`        |
//! | `mesh.delete` on `DEL`/`BACK_SPACE` | `mesh.lock_guard_delete_dialog` |
//! | `transform.translate` on `G`      | `mesh.lock_guard_translate`       |
//!
//! Overrides land in a keymap with the same scope as the native one and copy
//! its modifiers. Modal keymaps are skipped. Fallback bindings in the `Mesh`
//! keymap are always added, together with the lock and begin-unlock chords.
//!
//! # Example
//!
//! ```
//! use meshlock::addon::keymap::{KeyChord, Keymap, Operator};
//!
//! let lock: KeyChord = "ctrl+shift+L".parse().unwrap();
//! let begin: KeyChord = "ctrl+shift+U".parse().unwrap();
//! let keymap = Keymap::derive(&Keymap::default_native(), &lock, &begin);
//!
//! assert_eq!(keymap.resolve(&"X".parse().unwrap()), Some(Operator::GuardDeleteImmediate));
//! assert_eq!(keymap.resolve(&lock), Some(Operator::LockSelection));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Errors from key binding handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeymapError {
    /// The chord string could not be parsed.
    #[error("invalid key chord '{chord}': {reason}")]
    InvalidChord { chord: String, reason: String },

    /// The operator id is not one of ours.
    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    /// The registry does not know this handle.
    #[error("unknown binding handle: {0}")]
    UnknownHandle(u64),

    /// The registry refused a binding.
    #[error("binding rejected: {0}")]
    Rejected(String),
}

// =============================================================================
// Operators
// =============================================================================

/// Operators exposed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Operator {
    LockSelection,
    BeginUnlock,
    CommitUnlock,
    CancelUnlock,
    UnlockAll,
    GuardDeleteImmediate,
    GuardDeleteDialog,
    GuardTranslate,
}

impl Operator {
    /// Every operator, in registration order.
    pub const ALL: [Operator; 8] = [
        Operator::LockSelection,
        Operator::BeginUnlock,
        Operator::CommitUnlock,
        Operator::CancelUnlock,
        Operator::UnlockAll,
        Operator::GuardDeleteImmediate,
        Operator::GuardDeleteDialog,
        Operator::GuardTranslate,
    ];

    /// Stable operator id.
    pub fn id(&self) -> &'static str {
        match self {
            Operator::LockSelection => "mesh.lock_selection",
            Operator::BeginUnlock => "mesh.lock_begin_unlock_select",
            Operator::CommitUnlock => "mesh.unlock_selection",
            Operator::CancelUnlock => "mesh.lock_cancel_unlock_mode",
            Operator::UnlockAll => "mesh.unlock_all",
            Operator::GuardDeleteImmediate => "mesh.lock_guard_delete_x",
            Operator::GuardDeleteDialog => "mesh.lock_guard_delete_dialog",
            Operator::GuardTranslate => "mesh.lock_guard_translate",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Operator {
    type Err = KeymapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .into_iter()
            .find(|op| op.id() == s)
            .ok_or_else(|| KeymapError::UnknownOperator(s.to_string()))
    }
}

// =============================================================================
// Chords
// =============================================================================

/// Modifier keys held with a chord.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub oskey: bool,
    /// Matches regardless of other modifiers
    pub any: bool,
}

/// A key plus modifiers, written `ctrl+shift+L`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct KeyChord {
    /// Host key code (`A`-`Z`, `DEL`, `BACK_SPACE`, ...)
    pub key: String,
    pub modifiers: Modifiers,
}

/// Named keys accepted besides single letters and digits.
const NAMED_KEYS: &[(&str, &str)] = &[
    ("del", "DEL"),
    ("delete", "DEL"),
    ("back_space", "BACK_SPACE"),
    ("backspace", "BACK_SPACE"),
    ("tab", "TAB"),
    ("space", "SPACE"),
    ("ret", "RET"),
    ("enter", "RET"),
    ("esc", "ESC"),
];

impl KeyChord {
    /// A chord with no modifiers.
    pub fn plain(key: &str) -> Self {
        Self {
            key: key.to_string(),
            modifiers: Modifiers::default(),
        }
    }

    /// Whether a pressed chord triggers this binding.
    pub fn matches(&self, pressed: &KeyChord) -> bool {
        self.key == pressed.key && (self.modifiers.any || self.modifiers == pressed.modifiers)
    }

    fn parse_key(token: &str) -> Option<String> {
        let mut chars = token.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_alphanumeric() {
                return Some(c.to_ascii_uppercase().to_string());
            }
        }
        let lower = token.to_ascii_lowercase();
        if let Some((_, code)) = NAMED_KEYS.iter().find(|(name, _)| *name == lower) {
            return Some((*code).to_string());
        }
        let upper = token.to_ascii_uppercase();
        match upper.strip_prefix('F').and_then(|n| n.parse::<u8>().ok()) {
            Some(1..=12) => Some(upper),
            _ => None,
        }
    }
}

impl FromStr for KeyChord {
    type Err = KeymapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| KeymapError::InvalidChord {
            chord: s.to_string(),
            reason: reason.to_string(),
        };

        let tokens: Vec<&str> = s.split('+').map(str::trim).collect();
        let Some((key, mods)) = tokens.split_last() else {
            return Err(invalid("empty chord"));
        };
        if key.is_empty() {
            return Err(invalid("missing key"));
        }

        let mut modifiers = Modifiers::default();
        for m in mods {
            let slot = match m.to_ascii_lowercase().as_str() {
                "ctrl" => &mut modifiers.ctrl,
                "shift" => &mut modifiers.shift,
                "alt" => &mut modifiers.alt,
                "oskey" | "cmd" => &mut modifiers.oskey,
                "any" => &mut modifiers.any,
                _ => return Err(invalid(&format!("unknown modifier '{}'", m))),
            };
            if *slot {
                return Err(invalid(&format!("duplicate modifier '{}'", m)));
            }
            *slot = true;
        }

        let key = Self::parse_key(key).ok_or_else(|| invalid(&format!("unknown key '{}'", key)))?;
        Ok(Self { key, modifiers })
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.modifiers;
        for (held, name) in [
            (m.any, "any"),
            (m.ctrl, "ctrl"),
            (m.shift, "shift"),
            (m.alt, "alt"),
            (m.oskey, "oskey"),
        ] {
            if held {
                write!(f, "{}+", name)?;
            }
        }
        write!(f, "{}", self.key)
    }
}

// =============================================================================
// Bindings
// =============================================================================

/// Where a keymap applies in the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct KeymapScope {
    pub name: String,
    pub space_type: String,
    pub region_type: String,
}

impl KeymapScope {
    /// A scope with the default space and region.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            space_type: "EMPTY".to_string(),
            region_type: "WINDOW".to_string(),
        }
    }

    /// The `Mesh` keymap used for fallback bindings.
    pub fn mesh() -> Self {
        Self::named("Mesh")
    }
}

/// Key event kind of a native binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyAction {
    Press,
    Release,
    Click,
}

/// A binding from the host's default key configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeBinding {
    pub scope: KeymapScope,
    pub modal: bool,
    /// Host operator id, e.g. `mesh.delete`
    pub operator: String,
    pub chord: KeyChord,
    pub action: KeyAction,
}

impl NativeBinding {
    /// A non-modal press binding.
    pub fn press(scope: KeymapScope, operator: &str, chord: KeyChord) -> Self {
        Self {
            scope,
            modal: false,
            operator: operator.to_string(),
            chord,
            action: KeyAction::Press,
        }
    }

    fn override_for(&self) -> Option<Operator> {
        if self.modal || self.action != KeyAction::Press {
            return None;
        }
        match (self.operator.as_str(), self.chord.key.as_str()) {
            ("mesh.delete", "X") => Some(Operator::GuardDeleteImmediate),
            ("mesh.delete", "DEL" | "BACK_SPACE") => Some(Operator::GuardDeleteDialog),
            ("transform.translate", "G") => Some(Operator::GuardTranslate),
            _ => None,
        }
    }
}

/// One of our bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    pub scope: KeymapScope,
    pub operator: Operator,
    pub chord: KeyChord,
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chord = self.chord.to_string();
        write!(f, "{:<16} {:<12} {}", self.scope.name, chord, self.operator)
    }
}

/// The full set of bindings the add-on registers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keymap {
    bindings: Vec<Binding>,
}

impl Keymap {
    /// Derive overrides from native bindings, then add the fallbacks.
    pub fn derive(native: &[NativeBinding], lock: &KeyChord, begin_unlock: &KeyChord) -> Self {
        let mut bindings: Vec<Binding> = native
            .iter()
            .filter_map(|nb| {
                nb.override_for().map(|operator| Binding {
                    scope: nb.scope.clone(),
                    operator,
                    chord: nb.chord.clone(),
                })
            })
            .collect();

        let mesh = KeymapScope::mesh();
        let mut fallback = |operator, chord| {
            bindings.push(Binding {
                scope: mesh.clone(),
                operator,
                chord,
            })
        };
        fallback(Operator::GuardDeleteImmediate, KeyChord::plain("X"));
        fallback(Operator::GuardDeleteDialog, KeyChord::plain("DEL"));
        fallback(Operator::GuardDeleteDialog, KeyChord::plain("BACK_SPACE"));
        fallback(Operator::GuardTranslate, KeyChord::plain("G"));
        fallback(Operator::LockSelection, lock.clone());
        fallback(Operator::BeginUnlock, begin_unlock.clone());

        Self { bindings }
    }

    /// A stand-in for the host's default key configuration.
    pub fn default_native() -> Vec<NativeBinding> {
        let mesh = KeymapScope::mesh();
        let modal = NativeBinding {
            modal: true,
            ..NativeBinding::press(
                KeymapScope::named("Transform Modal Map"),
                "transform.translate",
                KeyChord::plain("G"),
            )
        };
        vec![
            NativeBinding::press(mesh.clone(), "mesh.delete", KeyChord::plain("X")),
            NativeBinding::press(mesh.clone(), "mesh.delete", KeyChord::plain("DEL")),
            NativeBinding::press(
                KeymapScope::named("3D View Generic"),
                "transform.translate",
                KeyChord::plain("G"),
            ),
            NativeBinding::press(mesh, "mesh.select_all", KeyChord::plain("A")),
            modal,
        ]
    }

    /// All bindings, derived overrides first.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// No bindings at all.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings that trigger an operator.
    pub fn for_operator(&self, operator: Operator) -> impl Iterator<Item = &Binding> {
        self.bindings.iter().filter(move |b| b.operator == operator)
    }

    /// Operator a pressed chord triggers, first match wins.
    pub fn resolve(&self, pressed: &KeyChord) -> Option<Operator> {
        self.bindings
            .iter()
            .find(|b| b.chord.matches(pressed))
            .map(|b| b.operator)
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Opaque handle for a registered binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingHandle(pub u64);

/// Where bindings get registered in the host.
pub trait BindingRegistry {
    /// Register a binding.
    fn register(&mut self, binding: &Binding) -> Result<BindingHandle, KeymapError>;

    /// Remove a previously registered binding.
    fn unregister(&mut self, handle: BindingHandle) -> Result<(), KeymapError>;
}

/// In-memory registry.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    next: u64,
    active: BTreeMap<BindingHandle, Binding>,
    reject: Option<Operator>,
}

impl MemoryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse bindings for an operator (for testing error paths).
    pub fn reject(&mut self, operator: Operator) {
        self.reject = Some(operator);
    }

    /// Currently registered bindings, in registration order.
    pub fn active(&self) -> impl Iterator<Item = &Binding> {
        self.active.values()
    }

    /// Number of registered bindings.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Nothing registered.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

impl BindingRegistry for MemoryRegistry {
    fn register(&mut self, binding: &Binding) -> Result<BindingHandle, KeymapError> {
        if self.reject == Some(binding.operator) {
            return Err(KeymapError::Rejected(binding.operator.id().to_string()));
        }
        let handle = BindingHandle(self.next);
        self.next += 1;
        self.active.insert(handle, binding.clone());
        Ok(handle)
    }

    fn unregister(&mut self, handle: BindingHandle) -> Result<(), KeymapError> {
        self.active
            .remove(&handle)
            .map(|_| ())
            .ok_or(KeymapError::UnknownHandle(handle.0))
    }
}
