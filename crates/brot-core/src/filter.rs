//! Argument-set filters.
//!
//! Contributors report which concrete invocations of their actions are
//! currently inapplicable. The union of those reports becomes the filter set
//! handed to the backend when a palette session is created.

use serde::{Deserialize, Serialize};

use crate::partial::RawPartialAction;

/// One excluded invocation: an action key plus an argument prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartialActionFilter {
    pub key: String,
    pub args: Vec<String>,
}

impl PartialActionFilter {
    /// Prefix match: same key, and every filter arg equals the action arg at
    /// the same position. An empty arg list matches every invocation.
    pub fn matches(&self, action: &RawPartialAction) -> bool {
        self.key == action.key
            && self.args.len() <= action.args.len()
            && self.args.iter().zip(&action.args).all(|(f, a)| f == a)
    }
}

/// A finite list of argument tuples to exclude for one action key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArgsFilter {
    arg_sets: Vec<Vec<String>>,
}

impl ArgsFilter {
    pub fn new(arg_sets: Vec<Vec<String>>) -> Self {
        Self { arg_sets }
    }

    /// Excludes every invocation (the action is disabled).
    pub fn always_match() -> Self {
        Self {
            arg_sets: vec![Vec::new()],
        }
    }

    /// Excludes nothing (the action is enabled).
    pub fn never_match() -> Self {
        Self::default()
    }

    pub fn arg_sets(&self) -> &[Vec<String>] {
        &self.arg_sets
    }

    /// Expand into concrete filter entries for `key`.
    pub fn to_filters(&self, key: &str) -> Vec<PartialActionFilter> {
        self.arg_sets
            .iter()
            .map(|args| PartialActionFilter {
                key: key.to_string(),
                args: args.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(key: &str, args: &[&str]) -> RawPartialAction {
        RawPartialAction::new(key, args.iter().map(|a| a.to_string()).collect())
    }

    #[test]
    fn test_always_match_to_filters() {
        let filters = ArgsFilter::always_match().to_filters("toggleBold");
        assert_eq!(
            filters,
            vec![PartialActionFilter {
                key: "toggleBold".to_string(),
                args: vec![],
            }]
        );
    }

    #[test]
    fn test_never_match_to_filters() {
        assert!(ArgsFilter::never_match().to_filters("toggleBold").is_empty());
    }

    #[test]
    fn test_empty_args_matches_every_invocation() {
        let filter = PartialActionFilter {
            key: "setHeading".to_string(),
            args: vec![],
        };
        assert!(filter.matches(&raw("setHeading", &[])));
        assert!(filter.matches(&raw("setHeading", &["2"])));
        assert!(!filter.matches(&raw("toggleHeading", &["2"])));
    }

    #[test]
    fn test_prefix_match() {
        let filter = PartialActionFilter {
            key: "setHeading".to_string(),
            args: vec!["1".to_string()],
        };
        assert!(filter.matches(&raw("setHeading", &["1"])));
        assert!(!filter.matches(&raw("setHeading", &["2"])));
        assert!(!filter.matches(&raw("setHeading", &[])));
    }

    #[test]
    fn test_filter_serde_shape() {
        let filter = PartialActionFilter {
            key: "goto".to_string(),
            args: vec!["true".to_string()],
        };
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json, serde_json::json!({ "key": "goto", "args": ["true"] }));
    }
}
