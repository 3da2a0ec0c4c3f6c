//! Search session protocol for the Brot palette.
//!
//! This crate provides:
//! - The `PaletteBackend` trait, the contract with the remote index
//! - `SearchSession`, which owns session ids and recovers from eviction
//! - Palette and suggester sessions built on it
//! - Tag completion
//! - An in-memory backend for tests and the shell

pub mod backend;
pub mod memory;
pub mod session;
pub mod tag;

pub use backend::{PaletteBackend, TimeoutBackend};
pub use memory::{expand_tags, tags_from_notes, CallCounts, InMemoryBackend, TagNode};
pub use session::{
    palette_session, suggester_session, PaletteDomain, PaletteSession, SearchSession,
    SessionSource, SessionState, SuggesterDomain, SuggesterSession,
};
pub use tag::{current_word, Suggestion, TagSuggestions};
