//! Shortcut keymap.
//!
//! Chords are written as space-separated modifiers in the fixed order
//! `ctrl meta shift alt`, followed by the lowercased key: `"ctrl shift k"`.
//! Bindings come from the `[shortcuts]` table of `actions.toml`.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use brot_core::{ActionTemplate, ActionsConfig, ConfigError, PartialAction, RawPartialAction};

// =============================================================================
// Key Chord
// =============================================================================

/// A key press with its modifier state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct KeyChord {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,

    /// Key name, stored lowercased.
    pub key: String,
}

impl KeyChord {
    /// A chord with no modifiers.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into().to_lowercase(),
            ..Self::default()
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifiers = [
            (self.ctrl, "ctrl"),
            (self.meta, "meta"),
            (self.shift, "shift"),
            (self.alt, "alt"),
        ];
        for (_, name) in modifiers.iter().filter(|(on, _)| *on) {
            write!(f, "{} ", name)?;
        }
        f.write_str(&self.key.to_lowercase())
    }
}

impl FromStr for KeyChord {
    type Err = ConfigError;

    /// Parse a chord string. Modifiers may appear in any order; the last
    /// token is the key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens: Vec<&str> = s.split_whitespace().collect();
        let key = tokens
            .pop()
            .ok_or_else(|| ConfigError::InvalidShortcut(format!("Empty key chord '{}'", s)))?;

        let mut chord = KeyChord::new(key);
        for token in tokens {
            match token {
                "ctrl" => chord.ctrl = true,
                "meta" => chord.meta = true,
                "shift" => chord.shift = true,
                "alt" => chord.alt = true,
                other => {
                    return Err(ConfigError::InvalidShortcut(format!(
                        "Unknown modifier '{}' in '{}'",
                        other, s
                    )))
                }
            }
        }
        Ok(chord)
    }
}

// =============================================================================
// Shortcut Map
// =============================================================================

/// Chord to action bindings.
///
/// Keyed by the canonical chord string, so later bindings for the same chord
/// override earlier ones regardless of how the modifiers were written.
#[derive(Default)]
pub struct ShortcutMap {
    bindings: RwLock<HashMap<String, RawPartialAction>>,
}

impl ShortcutMap {
    /// Create a new empty shortcut map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `[shortcuts]` table. Unparseable chords are skipped.
    pub fn from_config(config: &ActionsConfig) -> Self {
        let map = Self::new();
        for (chord, template) in &config.shortcuts {
            match chord.parse::<KeyChord>() {
                Ok(chord) => map.set(&chord, template),
                Err(e) => tracing::warn!("Skipping shortcut: {}", e),
            }
        }
        map
    }

    /// Add a binding. If the chord is already bound, it's overwritten.
    pub fn set(&self, chord: &KeyChord, template: &ActionTemplate) {
        self.bindings
            .write()
            .insert(chord.to_string(), template.to_raw());
    }

    /// Delete a binding.
    ///
    /// Returns `true` if a binding was removed.
    pub fn del(&self, chord: &KeyChord) -> bool {
        self.bindings.write().remove(&chord.to_string()).is_some()
    }

    /// The raw action bound to `chord`.
    pub fn get(&self, chord: &KeyChord) -> Option<RawPartialAction> {
        self.bindings.read().get(&chord.to_string()).cloned()
    }

    /// Resolve `chord` to a typed partial action.
    ///
    /// Bindings that name an unknown action or carry unparseable arguments
    /// are logged and resolve to `None`.
    pub fn resolve(&self, chord: &KeyChord) -> Option<PartialAction> {
        let raw = self.get(chord)?;
        match PartialAction::try_from(&raw) {
            Ok(action) => Some(action),
            Err(e) => {
                tracing::warn!("Shortcut '{}' is invalid: {}", chord, e);
                None
            }
        }
    }

    /// Get the number of bindings.
    pub fn binding_count(&self) -> usize {
        self.bindings.read().len()
    }
}
