//! Sample workspace for the shell.
//!
//! Registers window-level handlers and a small editor so that every palette
//! entry in the built-in bindings has something to run.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use brot_core::{ActionKey, ActionsConfig, ArgValue, ArgsFilter, ConfigError, Insertion, Locater};
use brot_dispatch::{
    add_editor_actions, handler0, handler1, handler2, ActionRegistry, ActionRegistryManager,
    CommandMode, Completion, DisabledRegistry, EditorActions,
};

/// Bindings used when the user has no palettes configured.
pub const DEFAULT_ACTIONS: &str = r#"
[shortcuts]
"ctrl k" = { key = "openPalette", args = ["main"] }
"ctrl b" = "toggleBold"
"ctrl shift r" = "repeatLastAction"
"alt 2" = { key = "setHeading", args = ["2"] }
"ctrl s" = "saveNote"

[palettes.main]
"!bold Bold" = "toggleBold"
"Heading" = "setHeading"
"Insert link" = "setLink"
"Open note" = { key = "openPalette", args = ["notes"] }
"Pin note" = "addPinned"
"Unpin current" = "removeCurrentPinned"
"Rename note" = "renameNote"
"Save" = "saveNote"
"Undo" = "undo"
"Settings" = { key = "goto", args = ["false", "settings"] }

[palettes.notes]
"$note_locater" = { key = "goto", args = ["false", "$note_locater"] }
"Pin $note_path below" = { key = "addPinned", args = ["below", "$note_path"] }
"#;

pub fn default_config() -> Result<ActionsConfig, ConfigError> {
    ActionsConfig::from_toml(DEFAULT_ACTIONS)
}

/// Note paths served by the in-memory index. Title words starting with `-`
/// name the tags the suggester offers.
pub fn sample_notes() -> Vec<String> {
    vec![
        "journal/today_-work--urgent.md".to_string(),
        "projects/brot_-work--later.md".to_string(),
        "reading_list_-personal_-reading.md".to_string(),
    ]
}

// =============================================================================
// Window State
// =============================================================================

/// State the window-level handlers act on.
#[derive(Debug)]
pub struct Workspace {
    pub route: Mutex<String>,
    pub pinned: Mutex<Vec<String>>,
    pub title: Mutex<String>,

    /// Palette requested by `openPalette`, picked up by the shell loop.
    pub requested_palette: Mutex<Option<String>>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            route: Mutex::new(Locater::Pinned.to_route()),
            pinned: Mutex::new(Vec::new()),
            title: Mutex::new("Untitled".to_string()),
            requested_palette: Mutex::new(None),
        }
    }
}

/// Register the window-level handlers.
pub fn add_workspace_actions(manager: &ActionRegistryManager, workspace: Arc<Workspace>) {
    let ws = workspace.clone();
    let open_palette = handler1(move |key: String| {
        *ws.requested_palette.lock() = Some(key);
    });

    let ws = workspace.clone();
    let goto = handler2(move |new_window: bool, locater: Locater| {
        let route = locater.to_route();
        println!(
            "goto {}{}",
            route,
            if new_window { " (new window)" } else { "" }
        );
        if !new_window {
            *ws.route.lock() = route;
        }
    });

    let ws = workspace.clone();
    let add_pinned = handler2(move |insertion: Insertion, path: String| {
        let mut pinned = ws.pinned.lock();
        match insertion {
            Insertion::Above => pinned.insert(0, path),
            Insertion::Below => pinned.push(path),
        }
        println!("pinned: {:?}", *pinned);
    });

    let ws = workspace.clone();
    let remove_pinned = handler0(move || {
        let removed = ws.pinned.lock().pop();
        if let Some(path) = &removed {
            println!("unpinned {}", path);
        }
        removed.is_some()
    });

    let ws = workspace.clone();
    let rename = handler1(move |title: String| {
        println!("renamed to {:?}", title);
        *ws.title.lock() = title;
    });

    let ws = workspace.clone();
    let save = handler0(move || {
        let title = ws.title.lock().clone();
        Completion::pending(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            println!("saved {:?}", title);
        })
    });

    let registry = ActionRegistry::new()
        .on(ActionKey::OpenPalette, open_palette)
        .on(ActionKey::Goto, goto)
        .on(ActionKey::AddPinned, add_pinned)
        .on(ActionKey::RemoveCurrentPinned, remove_pinned)
        .on(ActionKey::RenameNote, rename)
        .on(ActionKey::SaveNote, save)
        .on(ActionKey::Refresh, handler0(|| println!("refreshed")));

    let ws = workspace;
    let disabled = DisabledRegistry::new().on(ActionKey::RemoveCurrentPinned, move || {
        if ws.pinned.lock().is_empty() {
            ArgsFilter::always_match()
        } else {
            ArgsFilter::never_match()
        }
    });

    manager.add(registry, Some(disabled));
}

// =============================================================================
// Editor
// =============================================================================

/// A one-line document with a selection flag and an undo stack.
#[derive(Debug, Default)]
pub struct DemoEditor {
    pub text: Mutex<String>,
    pub selected: Mutex<bool>,
    history: Mutex<Vec<String>>,
}

impl DemoEditor {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(text.into()),
            ..Self::default()
        }
    }

    fn apply(&self, edit: impl FnOnce(&str) -> String) {
        let mut text = self.text.lock();
        let next = edit(&text);
        self.history.lock().push(std::mem::replace(&mut *text, next));
        println!("document: {}", *text);
    }
}

pub fn editor_actions() -> EditorActions<DemoEditor> {
    EditorActions::new()
        .on(ActionKey::ToggleBold, |editor: &DemoEditor, _, mode| {
            if !*editor.selected.lock() {
                return false;
            }
            if mode == CommandMode::Run {
                editor.apply(|text| match text.strip_prefix("**") {
                    Some(rest) => rest.trim_end_matches("**").to_string(),
                    None => format!("**{}**", text),
                });
            }
            true
        })
        .on(ActionKey::SetHeading, |editor: &DemoEditor, args, mode| {
            if mode == CommandMode::Run {
                if let Some(ArgValue::Level(level)) = args.first() {
                    editor.apply(|text| {
                        format!(
                            "{} {}",
                            "#".repeat(level.get() as usize),
                            text.trim_start_matches(['#', ' '])
                        )
                    });
                }
            }
            true
        })
        .on(ActionKey::SetLink, |editor: &DemoEditor, args, mode| {
            if !*editor.selected.lock() {
                return false;
            }
            if mode == CommandMode::Run {
                if let Some(ArgValue::Url(url)) = args.first() {
                    editor.apply(|text| format!("[{}]({})", text, url));
                }
            }
            true
        })
        .on(ActionKey::Undo, |editor: &DemoEditor, _, mode| {
            let previous = {
                let mut history = editor.history.lock();
                match mode {
                    CommandMode::DryRun => return !history.is_empty(),
                    CommandMode::Run => history.pop(),
                }
            };
            let Some(previous) = previous else {
                return false;
            };
            let mut text = editor.text.lock();
            *text = previous;
            println!("document: {}", *text);
            true
        })
}

/// Register the editor's commands.
pub fn add_demo_editor(manager: &ActionRegistryManager, editor: Arc<DemoEditor>) {
    add_editor_actions(manager, editor, editor_actions());
}
