//! Configuration types.
//!
//! User bindings live in `actions.toml` inside the Brot config directory:
//!
//! ```toml
//! [shortcuts]
//! "ctrl b" = "toggleBold"
//! "ctrl 1" = { key = "focusPinnedNote", args = ["1"] }
//!
//! [palettes.actions]
//! "!bold Toggle bold" = "toggleBold"
//! "Open $note_path" = { key = "goto", args = ["false", "$note_path"] }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::partial::RawPartialAction;

/// File name of the bindings file inside [`config_dir`].
pub const ACTIONS_FILE: &str = "actions.toml";

/// Placeholder expanded to one palette entry per note, replaced by the path.
pub const NOTE_PATH_PLACEHOLDER: &str = "$note_path";

/// Like [`NOTE_PATH_PLACEHOLDER`], but the argument becomes `note:<path>`.
pub const NOTE_LOCATER_PLACEHOLDER: &str = "$note_locater";

/// A configured action: either a bare key or a key with arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TemplateRepr")]
pub struct ActionTemplate {
    pub key: String,
    pub args: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TemplateRepr {
    Key(String),
    Full {
        key: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

impl From<TemplateRepr> for ActionTemplate {
    fn from(repr: TemplateRepr) -> Self {
        match repr {
            TemplateRepr::Key(key) => Self {
                key,
                args: Vec::new(),
            },
            TemplateRepr::Full { key, args } => Self { key, args },
        }
    }
}

impl ActionTemplate {
    pub fn to_raw(&self) -> RawPartialAction {
        RawPartialAction::new(self.key.clone(), self.args.clone())
    }

    /// Expand a palette entry into concrete `(title, action)` pairs.
    ///
    /// Titles without a note placeholder yield exactly one entry. Titles with
    /// one yield an entry per note; the first argument equal to the
    /// placeholder is substituted.
    pub fn expand(&self, title: &str, notes: &[String]) -> Vec<(String, RawPartialAction)> {
        let placeholder = if title.contains(NOTE_LOCATER_PLACEHOLDER) {
            NOTE_LOCATER_PLACEHOLDER
        } else if title.contains(NOTE_PATH_PLACEHOLDER) {
            NOTE_PATH_PLACEHOLDER
        } else {
            return vec![(title.to_string(), self.to_raw())];
        };

        notes
            .iter()
            .map(|path| {
                let mut args = self.args.clone();
                if let Some(arg) = args.iter_mut().find(|a| *a == placeholder) {
                    *arg = if placeholder == NOTE_LOCATER_PLACEHOLDER {
                        format!("note:{}", path)
                    } else {
                        path.clone()
                    };
                }
                (
                    title.replace(placeholder, &note_display_title(path)),
                    RawPartialAction::new(self.key.clone(), args),
                )
            })
            .collect()
    }
}

/// Split a `"!icon title"` entry name into `(title, icon)`.
pub fn split_title_icon(title_with_icon: &str) -> (&str, Option<&str>) {
    match title_with_icon.strip_prefix('!') {
        Some(rest) => {
            let (icon, title) = rest.split_once(' ').unwrap_or((rest, ""));
            (title, Some(icon))
        }
        None => (title_with_icon, None),
    }
}

/// Display title for a note path.
///
/// Underscores become spaces and a trailing `.md` is dropped. The directory
/// is kept, so notes with the same file name stay distinguishable.
pub fn note_display_title(path: &str) -> String {
    let title = path.replace('_', " ");
    match title.strip_suffix(".md") {
        Some(stem) => stem.to_string(),
        None => title,
    }
}

/// Bindings loaded from `actions.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionsConfig {
    /// Key chord (e.g. `"ctrl shift k"`) to action.
    #[serde(default)]
    pub shortcuts: BTreeMap<String, ActionTemplate>,

    /// Palette key to (entry title to action).
    #[serde(default)]
    pub palettes: BTreeMap<String, BTreeMap<String, ActionTemplate>>,
}

impl ActionsConfig {
    /// Parse from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a file. A missing file yields the default config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No actions file at {:?}, using defaults", path);
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Load from the default location.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = actions_path().ok_or(ConfigError::NoConfigDir)?;
        Self::load(&path)
    }
}

/// Get the config directory path.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("brot"))
}

/// Get the path to actions.toml.
pub fn actions_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(ACTIONS_FILE))
}

/// Ensure the config directory exists.
pub fn ensure_config_dir() -> std::io::Result<()> {
    if let Some(dir) = config_dir() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[shortcuts]
"ctrl b" = "toggleBold"
"ctrl 1" = { key = "focusPinnedNote", args = ["1"] }

[palettes.actions]
"!bold Toggle bold" = "toggleBold"
"Heading" = { key = "setHeading" }
"#;

    #[test]
    fn test_template_forms() {
        let config = ActionsConfig::from_toml(SAMPLE).unwrap();

        assert_eq!(
            config.shortcuts["ctrl b"],
            ActionTemplate {
                key: "toggleBold".to_string(),
                args: vec![],
            }
        );
        assert_eq!(config.shortcuts["ctrl 1"].args, vec!["1".to_string()]);

        let actions = &config.palettes["actions"];
        assert_eq!(actions.len(), 2);
        assert!(actions["Heading"].args.is_empty());
    }

    #[test]
    fn test_split_title_icon() {
        assert_eq!(split_title_icon("!bold Toggle bold"), ("Toggle bold", Some("bold")));
        assert_eq!(split_title_icon("!bold"), ("", Some("bold")));
        assert_eq!(split_title_icon("Undo"), ("Undo", None));
    }

    #[test]
    fn test_note_display_title() {
        assert_eq!(note_display_title("journal/today.md"), "journal/today");
        assert_eq!(note_display_title("my_note.md"), "my note");
        assert_eq!(note_display_title("notes.txt"), "notes.txt");
        assert_eq!(note_display_title("plain"), "plain");
    }

    #[test]
    fn test_note_display_title_keeps_directory() {
        assert_ne!(
            note_display_title("work/today.md"),
            note_display_title("home/today.md")
        );
    }

    #[test]
    fn test_expand_without_placeholder() {
        let template = ActionTemplate {
            key: "toggleBold".to_string(),
            args: vec![],
        };
        let entries = template.expand("Bold", &["a.md".to_string()]);
        assert_eq!(
            entries,
            vec![("Bold".to_string(), RawPartialAction::new("toggleBold", vec![]))]
        );
    }

    #[test]
    fn test_expand_note_placeholders() {
        let notes = vec!["a.md".to_string(), "dir/b.md".to_string()];

        let template = ActionTemplate {
            key: "addPinned".to_string(),
            args: vec!["below".to_string(), "$note_path".to_string()],
        };
        let entries = template.expand("Pin $note_path", &notes);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].0, "Pin dir/b");
        assert_eq!(entries[1].1.args, vec!["below".to_string(), "dir/b.md".to_string()]);

        let template = ActionTemplate {
            key: "goto".to_string(),
            args: vec!["false".to_string(), "$note_locater".to_string()],
        };
        let entries = template.expand("Open $note_locater", &notes);
        assert_eq!(entries[0].0, "Open a");
        assert_eq!(entries[0].1.args[1], "note:a.md");

        assert!(template.expand("Open $note_locater", &[]).is_empty());
    }

    #[test]
    fn test_empty_config() {
        let config = ActionsConfig::from_toml("").unwrap();
        assert_eq!(config, ActionsConfig::default());
    }

    #[test]
    fn test_parse_error() {
        let result = ActionsConfig::from_toml("[shortcuts]\n\"ctrl b\" = 5\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = ActionsConfig::load(&dir.path().join(ACTIONS_FILE)).unwrap();
        assert_eq!(config, ActionsConfig::default());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ACTIONS_FILE);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = ActionsConfig::load(&path).unwrap();
        assert_eq!(config.shortcuts.len(), 2);
        assert_eq!(
            config.shortcuts["ctrl 1"].to_raw(),
            RawPartialAction::new("focusPinnedNote", vec!["1".to_string()])
        );
    }
}
