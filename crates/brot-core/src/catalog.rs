//! The action catalog.
//!
//! A static table from [`ActionKey`] to its argument signature. This is the
//! single source of truth for arity: the continuation engine, palette argument
//! requests, and argument collection all branch on [`ActionKey::signature`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::arg::ArgKind;
use crate::error::ActionError;

/// Declares the catalog: enum variants, wire names, and signatures in one place.
macro_rules! action_catalog {
    ($( $variant:ident => $name:literal [$($kind:ident),*] ),* $(,)?) => {
        /// Every action the application knows about.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ActionKey {
            $( $variant, )*
        }

        impl ActionKey {
            /// All keys, in catalog order.
            pub const ALL: &'static [ActionKey] = &[ $( ActionKey::$variant, )* ];

            /// Wire name of the action (camelCase).
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( ActionKey::$variant => $name, )*
                }
            }

            /// Ordered argument kinds for this action.
            pub fn signature(&self) -> &'static [ArgKind] {
                match self {
                    $( ActionKey::$variant => &[$(ArgKind::$kind),*], )*
                }
            }
        }

        impl FromStr for ActionKey {
            type Err = ActionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $name => Ok(ActionKey::$variant), )*
                    _ => Err(ActionError::UnknownKey(s.to_string())),
                }
            }
        }
    };
}

action_catalog! {
    OpenPalette => "openPalette" [Palette],
    EditNoteTitle => "editNoteTitle" [],
    RenameNote => "renameNote" [Title],
    Goto => "goto" [Boolean, Locater],
    AddPinned => "addPinned" [Insertion, NotePath],
    RemoveCurrentPinned => "removeCurrentPinned" [],
    ToggleNoteMinimized => "toggleNoteMinimized" [],
    SaveNote => "saveNote" [],
    SaveWindowState => "saveWindowState" [],
    Refresh => "refresh" [],
    RefreshPage => "refreshPage" [],
    EditorToggleBold => "editorToggleBold" [],
    ToggleFloating => "toggleFloating" [],
    FocusPinnedNote => "focusPinnedNote" [Number],
    FocusNote => "focusNote" [],
    CopyUrl => "copyUrl" [],
    PasteWithoutFormatting => "pasteWithoutFormatting" [],
    HistoryBack => "historyBack" [],
    HistoryForward => "historyForward" [],
    RepeatLastAction => "repeatLastAction" [],

    // editor
    UnsetAllMarks => "unsetAllMarks" [],
    SetLink => "setLink" [Url],
    UnsetLink => "unsetLink" [],
    InsertTable => "insertTable" [],
    AddColumnBefore => "addColumnBefore" [],
    AddColumnAfter => "addColumnAfter" [],
    DeleteColumn => "deleteColumn" [],
    AddRowBefore => "addRowBefore" [],
    AddRowAfter => "addRowAfter" [],
    DeleteRow => "deleteRow" [],
    DeleteTable => "deleteTable" [],
    MergeCells => "mergeCells" [],
    SplitCell => "splitCell" [],
    ToggleHeaderColumn => "toggleHeaderColumn" [],
    ToggleHeaderRow => "toggleHeaderRow" [],
    ToggleHeaderCell => "toggleHeaderCell" [],
    MergeOrSplit => "mergeOrSplit" [],
    ToggleBlockquote => "toggleBlockquote" [],
    SetBlockquote => "setBlockquote" [],
    UnsetBlockquote => "unsetBlockquote" [],
    SetHeading => "setHeading" [Level],
    ToggleHeading => "toggleHeading" [Level],
    SetHorizontalRule => "setHorizontalRule" [],
    SetParagraph => "setParagraph" [],
    SetCodeBlock => "setCodeBlock" [Lang],
    InsertInlineMath => "insertInlineMath" [Math],
    InsertBlockMath => "insertBlockMath" [Math],
    SetBold => "setBold" [],
    UnsetBold => "unsetBold" [],
    ToggleBold => "toggleBold" [],
    SetCode => "setCode" [],
    UnsetCode => "unsetCode" [],
    ToggleCode => "toggleCode" [],
    SetItalic => "setItalic" [],
    UnsetItalic => "unsetItalic" [],
    ToggleItalic => "toggleItalic" [],
    SetStrike => "setStrike" [],
    UnsetStrike => "unsetStrike" [],
    ToggleStrike => "toggleStrike" [],
    SetUnderline => "setUnderline" [],
    UnsetUnderline => "unsetUnderline" [],
    ToggleUnderline => "toggleUnderline" [],
    Undo => "undo" [],
    Redo => "redo" [],
}

impl ActionKey {
    /// Number of arguments a complete invocation carries.
    pub fn arity(&self) -> usize {
        self.signature().len()
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ActionKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActionKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
