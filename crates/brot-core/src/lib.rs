//! Core types for the Brot editor's action system.
//!
//! This crate contains the data structures shared by every Brot crate:
//! - Argument kinds, their parsers, and typed values
//! - The action catalog and partial actions
//! - Argument-set filters
//! - Search session payloads
//! - Configuration types
//! - Error types

mod arg;
mod catalog;
mod config;
mod error;
mod filter;
mod matched;
mod partial;

pub use arg::{ArgKind, ArgValue, FromArg, HeadingLevel, Insertion, Locater, MathRender};
pub use catalog::ActionKey;
pub use config::{
    actions_path, config_dir, ensure_config_dir, note_display_title, split_title_icon,
    ActionTemplate, ActionsConfig, ACTIONS_FILE, NOTE_LOCATER_PLACEHOLDER, NOTE_PATH_PLACEHOLDER,
};
pub use error::{ActionError, BackendError, ConfigError, ParseError};
pub use filter::{ArgsFilter, PartialActionFilter};
pub use matched::{
    Matched, MatchedPaletteAction, PaletteAction, SessionId, SuggesterSource, SuggestionValue,
};
pub use partial::{PartialAction, RawPartialAction};

pub use url::Url;
