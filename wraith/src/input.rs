//! Translates physical keys into controller buttons.
//!
//! The translation is a pure lookup. Whether a key went down or up is decided by which keyboard
//! event fired, not by anything remembered here, so auto-repeated key-down events are forwarded as
//! repeated presses. Cores treat a repeated press as a no-op.

use std::collections::BTreeMap;

use crate::core::Buttons;

/// Which edge of a key press an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEdge {
    Down,
    Up,
}

impl KeyEdge {
    pub fn is_down(self) -> bool {
        matches!(self, KeyEdge::Down)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum KeyMapError {
    #[display("an empty key can not be bound")]
    EmptyKey,
    #[display("key {key:?} must be bound to exactly one button, not {buttons:?}")]
    NotSingleButton { key: String, buttons: Buttons },
}

/// An immutable table from key identifiers (browser `KeyboardEvent.key` names) to buttons. Every
/// key maps to at most one button; keys that are not in the table are inert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMap {
    keys: BTreeMap<String, Buttons>,
}

impl KeyMap {
    /// Builds a table, rejecting empty keys and masks that are not a single button.
    pub fn new<I, S>(bindings: I) -> Result<Self, KeyMapError>
    where
        I: IntoIterator<Item = (S, Buttons)>,
        S: Into<String>,
    {
        let mut keys = BTreeMap::new();
        for (key, buttons) in bindings {
            let key: String = key.into();
            let key = normalize(&key);
            if key.is_empty() {
                return Err(KeyMapError::EmptyKey);
            }
            if !buttons.is_single() {
                return Err(KeyMapError::NotSingleButton { key, buttons });
            }
            keys.insert(key, buttons);
        }
        Ok(Self { keys })
    }

    /// Looks up the button bound to a key. `None` means the event should be ignored entirely.
    pub fn resolve(&self, key: &str) -> Option<Buttons> {
        self.binding(key).map(|(_, buttons)| buttons)
    }

    /// Like [`KeyMap::resolve`], but also returns the key as it is spelled in the table.
    pub fn binding(&self, key: &str) -> Option<(&str, Buttons)> {
        match self.keys.get_key_value(key) {
            Some((key, buttons)) => Some((key.as_str(), *buttons)),
            None => self
                .keys
                .get_key_value(&normalize(key))
                .map(|(key, buttons)| (key.as_str(), *buttons)),
        }
    }

    /// The bound keys and their buttons, sorted by key.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, Buttons)> {
        self.keys.iter().map(|(key, buttons)| (key.as_str(), *buttons))
    }

    /// The bound keys, sorted. Used to build the key legend.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Default for KeyMap {
    /// The browser bindings (A, B, Start and Select on `a`, `b`, `z` and `x`) plus the arrow keys
    /// for the D-pad.
    fn default() -> Self {
        let keys = [
            ("a", Buttons::A),
            ("b", Buttons::B),
            ("z", Buttons::START),
            ("x", Buttons::SELECT),
            ("ArrowRight", Buttons::RIGHT),
            ("ArrowLeft", Buttons::LEFT),
            ("ArrowDown", Buttons::DOWN),
            ("ArrowUp", Buttons::UP),
        ]
        .into_iter()
        .map(|(key, buttons)| (key.to_owned(), buttons))
        .collect();
        Self { keys }
    }
}

/// Single characters are matched case-insensitively so a held shift key does not unbind them.
/// Named keys (`ArrowUp`, `Enter`, ...) are kept as they are.
fn normalize(key: &str) -> String {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.to_lowercase().collect(),
        _ => key.to_owned(),
    }
}
