//! Search session payloads.
//!
//! These types cross the boundary to the remote index. The session protocol
//! is generic over the payload; palettes carry [`PaletteAction`]s and
//! suggesters carry [`SuggestionValue`]s.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::partial::RawPartialAction;

/// Opaque session identifier assigned by the remote index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl From<u64> for SessionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// A search hit: highlight indices plus the domain payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matched<T> {
    /// Char positions in the searched text that matched the query.
    pub indices: Vec<u32>,

    pub payload: T,
}

impl<T> Matched<T> {
    pub fn new(indices: Vec<u32>, payload: T) -> Self {
        Self { indices, payload }
    }
}

/// One palette entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteAction {
    /// Display text, also the text the index matches against.
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Action started when the entry is chosen.
    pub action: RawPartialAction,
}

impl PaletteAction {
    pub fn new(title: impl Into<String>, action: RawPartialAction) -> Self {
        Self {
            title: title.into(),
            icon: None,
            action,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// A matched palette entry.
pub type MatchedPaletteAction = Matched<PaletteAction>;

/// Where a suggester draws its candidates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SuggesterSource {
    Tag,
}

/// One inline suggestion value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionValue {
    pub value: String,
}

impl SuggestionValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}
