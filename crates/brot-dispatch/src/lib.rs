//! Action dispatch for the Brot editor.
//!
//! This crate provides:
//! - The layered action registry manager with disablement predicates
//! - Typed handler constructors
//! - The continuation engine and last-action replay
//! - Shortcut keymap resolution
//! - The editor contributor adapter

pub mod editor;
pub mod engine;
pub mod keymap;
pub mod registry;

pub use editor::{add_editor_actions, CommandMode, EditorActions, EditorCommand};
pub use engine::{continue_partial_action, Continuation, Dispatcher};
pub use keymap::{KeyChord, ShortcutMap};
pub use registry::{
    handler, handler0, handler1, handler2, ActionHandler, ActionRegistry, ActionRegistryManager,
    Completion, DisablePredicate, DisabledRegistry,
};
