//! Partial actions.
//!
//! A partial action is an action key plus the prefix of arguments collected so
//! far. Arguments are only ever appended, and each one is checked against the
//! catalog signature at the moment it is appended, so a [`PartialAction`] can
//! never hold a mistyped or out-of-order argument.

use serde::{Deserialize, Serialize};

use crate::arg::{ArgKind, ArgValue};
use crate::catalog::ActionKey;
use crate::error::ActionError;

// =============================================================================
// Wire Form
// =============================================================================

/// String form of a partial action, as exchanged with the backend and
/// stored in config files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawPartialAction {
    pub key: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl RawPartialAction {
    pub fn new(key: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            key: key.into(),
            args,
        }
    }
}

// =============================================================================
// Typed Form
// =============================================================================

/// An action key plus a type-checked prefix of its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialAction {
    key: ActionKey,
    args: Vec<ArgValue>,
}

impl PartialAction {
    /// Start an action with no arguments.
    pub fn new(key: ActionKey) -> Self {
        Self {
            key,
            args: Vec::new(),
        }
    }

    /// Build an action from a list of already-typed values.
    pub fn with_args(
        key: ActionKey,
        args: impl IntoIterator<Item = ArgValue>,
    ) -> Result<Self, ActionError> {
        let mut action = Self::new(key);
        for arg in args {
            action.push(arg)?;
        }
        Ok(action)
    }

    pub fn key(&self) -> ActionKey {
        self.key
    }

    /// Arguments collected so far, in append order.
    pub fn args(&self) -> &[ArgValue] {
        &self.args
    }

    /// True once every argument in the signature is present.
    pub fn is_complete(&self) -> bool {
        self.args.len() >= self.key.arity()
    }

    /// Kind of the next argument to collect, or `None` when complete.
    pub fn next_kind(&self) -> Option<ArgKind> {
        self.key.signature().get(self.args.len()).copied()
    }

    /// Append a typed argument.
    ///
    /// Fails if the action is already complete or the value has the wrong kind.
    pub fn push(&mut self, value: ArgValue) -> Result<(), ActionError> {
        let expected = self.next_kind().ok_or(ActionError::TooManyArgs {
            key: self.key,
            expected: self.key.arity(),
        })?;

        let found = value.kind();
        if found != expected {
            return Err(ActionError::KindMismatch {
                key: self.key,
                index: self.args.len(),
                expected,
                found,
            });
        }

        self.args.push(value);
        Ok(())
    }

    /// Parse a raw string as the next argument and append it.
    pub fn push_raw(&mut self, raw: &str) -> Result<(), ActionError> {
        let kind = self.next_kind().ok_or(ActionError::TooManyArgs {
            key: self.key,
            expected: self.key.arity(),
        })?;
        let value = kind.parse(raw)?;
        self.args.push(value);
        Ok(())
    }

    /// Builder-style [`push`](Self::push).
    pub fn arg(mut self, value: ArgValue) -> Result<Self, ActionError> {
        self.push(value)?;
        Ok(self)
    }

    /// Render to the wire form.
    pub fn to_raw(&self) -> RawPartialAction {
        RawPartialAction {
            key: self.key.as_str().to_string(),
            args: self.args.iter().map(ArgValue::render).collect(),
        }
    }
}

impl From<ActionKey> for PartialAction {
    fn from(key: ActionKey) -> Self {
        Self::new(key)
    }
}

impl TryFrom<&RawPartialAction> for PartialAction {
    type Error = ActionError;

    fn try_from(raw: &RawPartialAction) -> Result<Self, Self::Error> {
        let mut action = PartialAction::new(raw.key.parse()?);
        for arg in &raw.args {
            action.push_raw(arg)?;
        }
        Ok(action)
    }
}

impl TryFrom<RawPartialAction> for PartialAction {
    type Error = ActionError;

    fn try_from(raw: RawPartialAction) -> Result<Self, Self::Error> {
        PartialAction::try_from(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arg::{Insertion, Locater};

    #[test]
    fn test_new_is_incomplete() {
        let action = PartialAction::new(ActionKey::Goto);
        assert!(!action.is_complete());
        assert_eq!(action.next_kind(), Some(ArgKind::Boolean));
    }

    #[test]
    fn test_zero_arity_is_complete() {
        let action = PartialAction::new(ActionKey::ToggleBold);
        assert!(action.is_complete());
        assert_eq!(action.next_kind(), None);
    }

    #[test]
    fn test_push_in_signature_order() {
        let mut action = PartialAction::new(ActionKey::Goto);
        action.push(ArgValue::Boolean(true)).unwrap();
        assert_eq!(action.next_kind(), Some(ArgKind::Locater));
        action.push(ArgValue::Locater(Locater::Pinned)).unwrap();
        assert!(action.is_complete());
        assert_eq!(action.args().len(), 2);
    }

    #[test]
    fn test_push_wrong_kind() {
        let mut action = PartialAction::new(ActionKey::Goto);
        let err = action.push(ArgValue::Number(1.0)).unwrap_err();
        assert_eq!(
            err,
            ActionError::KindMismatch {
                key: ActionKey::Goto,
                index: 0,
                expected: ArgKind::Boolean,
                found: ArgKind::Number,
            }
        );
        assert!(action.args().is_empty());
    }

    #[test]
    fn test_push_past_arity() {
        let mut action = PartialAction::new(ActionKey::FocusPinnedNote);
        action.push_raw("2").unwrap();
        let err = action.push_raw("3").unwrap_err();
        assert_eq!(
            err,
            ActionError::TooManyArgs {
                key: ActionKey::FocusPinnedNote,
                expected: 1,
            }
        );
    }

    #[test]
    fn test_push_raw_parse_error_keeps_prefix() {
        let mut action = PartialAction::new(ActionKey::AddPinned);
        action.push_raw("above").unwrap();
        assert!(matches!(
            action.push_raw(""),
            Err(ActionError::Parse(_))
        ));
        assert_eq!(action.args(), &[ArgValue::Insertion(Insertion::Above)]);
    }

    #[test]
    fn test_raw_conversion() {
        let raw = RawPartialAction::new("addPinned", vec!["below".into(), "a.md".into()]);
        let action = PartialAction::try_from(&raw).unwrap();
        assert_eq!(action.key(), ActionKey::AddPinned);
        assert!(action.is_complete());
        assert_eq!(action.to_raw(), raw);

        let unknown = RawPartialAction::new("fly", vec![]);
        assert!(matches!(
            PartialAction::try_from(unknown),
            Err(ActionError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_raw_serde_default_args() {
        let raw: RawPartialAction = serde_json::from_str(r#"{"key":"undo"}"#).unwrap();
        assert_eq!(raw, RawPartialAction::new("undo", vec![]));
    }
}
