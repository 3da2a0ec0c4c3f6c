//! Argument kinds and typed argument values.
//!
//! Every action argument travels as a string on the wire and in config files.
//! An [`ArgKind`] owns the parser that turns that string into an [`ArgValue`],
//! and every value can be rendered back so that
//! `kind.parse(&value.render()) == Ok(value)`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ParseError;

// =============================================================================
// Argument Kinds
// =============================================================================

/// The closed set of argument kinds an action signature can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArgKind {
    Boolean,
    Insertion,
    NotePath,
    Palette,
    Locater,
    Number,
    Url,
    Level,
    Lang,
    Math,
    Title,
}

impl ArgKind {
    /// All kinds, in declaration order.
    pub const ALL: [ArgKind; 11] = [
        ArgKind::Boolean,
        ArgKind::Insertion,
        ArgKind::NotePath,
        ArgKind::Palette,
        ArgKind::Locater,
        ArgKind::Number,
        ArgKind::Url,
        ArgKind::Level,
        ArgKind::Lang,
        ArgKind::Math,
        ArgKind::Title,
    ];

    /// Name used in config files and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArgKind::Boolean => "boolean",
            ArgKind::Insertion => "insertion",
            ArgKind::NotePath => "notePath",
            ArgKind::Palette => "palette",
            ArgKind::Locater => "locater",
            ArgKind::Number => "number",
            ArgKind::Url => "url",
            ArgKind::Level => "level",
            ArgKind::Lang => "lang",
            ArgKind::Math => "math",
            ArgKind::Title => "title",
        }
    }

    /// Closed set of raw values for enumerated kinds, offered as choices by
    /// argument collection. `None` means free text.
    pub fn choices(&self) -> Option<&'static [&'static str]> {
        match self {
            ArgKind::Boolean => Some(&["true", "false"]),
            ArgKind::Insertion => Some(&["above", "below"]),
            ArgKind::Level => Some(&["1", "2", "3", "4", "5", "6"]),
            _ => None,
        }
    }

    /// Parse a raw string as this kind.
    ///
    /// Total: every input yields either a value or a [`ParseError`].
    pub fn parse(&self, raw: &str) -> Result<ArgValue, ParseError> {
        let kind = *self;
        match kind {
            ArgKind::Boolean => match raw {
                "true" => Ok(ArgValue::Boolean(true)),
                "false" => Ok(ArgValue::Boolean(false)),
                _ => Err(ParseError::new(kind, "Expected 'true' or 'false'")),
            },
            ArgKind::Insertion => raw.parse().map(ArgValue::Insertion),
            ArgKind::NotePath => non_empty(kind, raw).map(ArgValue::NotePath),
            ArgKind::Palette => non_empty(kind, raw).map(ArgValue::Palette),
            ArgKind::Locater => raw.parse().map(ArgValue::Locater),
            ArgKind::Number => parse_number(raw).map(ArgValue::Number),
            ArgKind::Url => parse_url(raw).map(ArgValue::Url),
            ArgKind::Level => raw.parse().map(ArgValue::Level),
            ArgKind::Lang => parse_lang(raw).map(ArgValue::Lang),
            ArgKind::Math => raw.parse().map(ArgValue::Math),
            ArgKind::Title => parse_title(raw).map(ArgValue::Title),
        }
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Parsers
// =============================================================================

fn non_empty(kind: ArgKind, raw: &str) -> Result<String, ParseError> {
    if raw.is_empty() {
        return Err(ParseError::new(kind, "Empty string"));
    }
    Ok(raw.to_string())
}

fn parse_number(raw: &str) -> Result<f64, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::new(ArgKind::Number, "Empty string"));
    }
    match trimmed.parse::<f64>() {
        Ok(value) if !value.is_nan() => Ok(value),
        _ => Err(ParseError::new(ArgKind::Number, "Invalid number")),
    }
}

/// Absolute URLs parse as-is; anything else is retried as an `http://` host.
fn parse_url(raw: &str) -> Result<Url, ParseError> {
    if raw.trim().is_empty() {
        return Err(ParseError::new(ArgKind::Url, "Empty string"));
    }
    Url::parse(raw)
        .or_else(|_| Url::parse(&format!("http://{}", raw)))
        .map_err(|e| ParseError::new(ArgKind::Url, e.to_string()))
}

fn parse_lang(raw: &str) -> Result<String, ParseError> {
    if raw.is_empty() {
        return Err(ParseError::new(ArgKind::Lang, "Empty string"));
    }
    if raw.chars().any(char::is_whitespace) {
        return Err(ParseError::new(ArgKind::Lang, "Contains whitespace"));
    }
    Ok(raw.to_string())
}

fn parse_title(raw: &str) -> Result<String, ParseError> {
    if raw.is_empty() {
        return Err(ParseError::new(ArgKind::Title, "Empty string"));
    }
    if raw.trim().is_empty() {
        return Err(ParseError::new(ArgKind::Title, "Only contains whitespace"));
    }
    Ok(raw.to_string())
}

// =============================================================================
// Enumerated Values
// =============================================================================

/// Where to insert relative to the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Insertion {
    Above,
    Below,
}

impl Insertion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Insertion::Above => "above",
            Insertion::Below => "below",
        }
    }
}

impl FromStr for Insertion {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "above" => Ok(Insertion::Above),
            "below" => Ok(Insertion::Below),
            _ => Err(ParseError::new(
                ArgKind::Insertion,
                format!("Failed to verify value {}", s),
            )),
        }
    }
}

/// Heading level, always within 1..=6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    /// Create a level, rejecting anything outside 1..=6.
    pub fn new(level: u8) -> Option<Self> {
        (1..=6).contains(&level).then_some(Self(level))
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl FromStr for HeadingLevel {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(HeadingLevel::new)
            .ok_or_else(|| ParseError::new(ArgKind::Level, format!("Failed to verify value {}", s)))
    }
}

/// A location the window can navigate to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locater {
    Note { path: String },
    Pinned,
    Settings,
    New,
}

impl Locater {
    /// Route for this location inside the window.
    pub fn to_route(&self) -> String {
        match self {
            Locater::Note { path } => format!("/note?p={}", path),
            Locater::Pinned => "/".to_string(),
            Locater::Settings => "/settings".to_string(),
            Locater::New => "/new".to_string(),
        }
    }
}

impl fmt::Display for Locater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locater::Note { path } => write!(f, "note:{}", path),
            Locater::Pinned => f.write_str("pinned"),
            Locater::Settings => f.write_str("settings"),
            Locater::New => f.write_str("new"),
        }
    }
}

impl FromStr for Locater {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(path) = s.strip_prefix("note:") {
            if path.is_empty() {
                return Err(ParseError::new(ArgKind::Locater, "Empty note path"));
            }
            return Ok(Locater::Note {
                path: path.to_string(),
            });
        }
        match s {
            "pinned" => Ok(Locater::Pinned),
            "settings" => Ok(Locater::Settings),
            "new" => Ok(Locater::New),
            _ => Err(ParseError::new(
                ArgKind::Locater,
                format!("Invalid Locater string: {}", s),
            )),
        }
    }
}

/// A validated math expression ready for rendering.
///
/// Validation is limited to what can be checked without a typesetter:
/// the source must be non-blank and its braces balanced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MathRender {
    source: String,
}

impl MathRender {
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl FromStr for MathRender {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ParseError::new(ArgKind::Math, "Empty expression"));
        }

        let mut depth: usize = 0;
        let mut escaped = false;
        for (offset, c) in s.char_indices() {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '{' => depth += 1,
                '}' => {
                    depth = depth.checked_sub(1).ok_or_else(|| {
                        ParseError::new(
                            ArgKind::Math,
                            format!("Unexpected '}}' at offset {}", offset),
                        )
                    })?;
                }
                _ => {}
            }
        }
        if depth > 0 {
            return Err(ParseError::new(ArgKind::Math, "Unclosed '{'"));
        }

        Ok(Self {
            source: s.to_string(),
        })
    }
}

// =============================================================================
// Argument Values
// =============================================================================

/// A typed argument value. One variant per [`ArgKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Boolean(bool),
    Insertion(Insertion),
    NotePath(String),
    Palette(String),
    Locater(Locater),
    Number(f64),
    Url(Url),
    Level(HeadingLevel),
    Lang(String),
    Math(MathRender),
    Title(String),
}

impl ArgValue {
    /// The kind this value belongs to.
    pub fn kind(&self) -> ArgKind {
        match self {
            ArgValue::Boolean(_) => ArgKind::Boolean,
            ArgValue::Insertion(_) => ArgKind::Insertion,
            ArgValue::NotePath(_) => ArgKind::NotePath,
            ArgValue::Palette(_) => ArgKind::Palette,
            ArgValue::Locater(_) => ArgKind::Locater,
            ArgValue::Number(_) => ArgKind::Number,
            ArgValue::Url(_) => ArgKind::Url,
            ArgValue::Level(_) => ArgKind::Level,
            ArgValue::Lang(_) => ArgKind::Lang,
            ArgValue::Math(_) => ArgKind::Math,
            ArgValue::Title(_) => ArgKind::Title,
        }
    }

    /// String form used on the wire and in filters.
    pub fn render(&self) -> String {
        match self {
            ArgValue::Boolean(b) => b.to_string(),
            ArgValue::Insertion(i) => i.as_str().to_string(),
            ArgValue::NotePath(s)
            | ArgValue::Palette(s)
            | ArgValue::Lang(s)
            | ArgValue::Title(s) => s.clone(),
            ArgValue::Locater(l) => l.to_string(),
            ArgValue::Number(n) => n.to_string(),
            ArgValue::Url(u) => u.to_string(),
            ArgValue::Level(l) => l.get().to_string(),
            ArgValue::Math(m) => m.source().to_string(),
        }
    }
}

// =============================================================================
// Typed Extraction
// =============================================================================

/// Extract a concrete Rust type from an [`ArgValue`].
///
/// Used by typed action handlers to receive their arguments positionally.
pub trait FromArg: Sized {
    fn from_arg(value: &ArgValue) -> Option<Self>;
}

impl FromArg for bool {
    fn from_arg(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromArg for f64 {
    fn from_arg(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Any of the string-shaped kinds.
impl FromArg for String {
    fn from_arg(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::NotePath(s)
            | ArgValue::Palette(s)
            | ArgValue::Lang(s)
            | ArgValue::Title(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromArg for Insertion {
    fn from_arg(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Insertion(i) => Some(*i),
            _ => None,
        }
    }
}

impl FromArg for HeadingLevel {
    fn from_arg(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Level(l) => Some(*l),
            _ => None,
        }
    }
}

impl FromArg for Locater {
    fn from_arg(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Locater(l) => Some(l.clone()),
            _ => None,
        }
    }
}

impl FromArg for Url {
    fn from_arg(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Url(u) => Some(u.clone()),
            _ => None,
        }
    }
}

impl FromArg for MathRender {
    fn from_arg(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Math(m) => Some(m.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_parse() {
        assert_eq!(ArgKind::Boolean.parse("true"), Ok(ArgValue::Boolean(true)));
        assert_eq!(ArgKind::Boolean.parse("false"), Ok(ArgValue::Boolean(false)));
        assert!(ArgKind::Boolean.parse("yes").is_err());
        assert!(ArgKind::Boolean.parse("").is_err());
    }

    #[test]
    fn test_empty_input_rejected() {
        for kind in [
            ArgKind::NotePath,
            ArgKind::Palette,
            ArgKind::Url,
            ArgKind::Lang,
            ArgKind::Title,
            ArgKind::Number,
            ArgKind::Math,
            ArgKind::Level,
            ArgKind::Insertion,
            ArgKind::Locater,
        ] {
            let err = kind.parse("").unwrap_err();
            assert_eq!(err.kind, kind);
        }
    }

    #[test]
    fn test_number_parse() {
        assert_eq!(ArgKind::Number.parse("3"), Ok(ArgValue::Number(3.0)));
        assert_eq!(ArgKind::Number.parse(" 2.5 "), Ok(ArgValue::Number(2.5)));
        assert_eq!(ArgKind::Number.parse("-1e3"), Ok(ArgValue::Number(-1000.0)));

        let err = ArgKind::Number.parse("   ").unwrap_err();
        assert_eq!(err.message, "Empty string");

        let err = ArgKind::Number.parse("abc").unwrap_err();
        assert_eq!(err.message, "Invalid number");

        assert!(ArgKind::Number.parse("NaN").is_err());
    }

    #[test]
    fn test_insertion_closed_set() {
        assert_eq!(
            ArgKind::Insertion.parse("above"),
            Ok(ArgValue::Insertion(Insertion::Above))
        );
        assert_eq!(
            ArgKind::Insertion.parse("below"),
            Ok(ArgValue::Insertion(Insertion::Below))
        );
        assert!(ArgKind::Insertion.parse("left").is_err());
        assert!(ArgKind::Insertion.parse("Above").is_err());
    }

    #[test]
    fn test_level_closed_set() {
        for n in 1..=6u8 {
            let value = ArgKind::Level.parse(&n.to_string()).unwrap();
            assert_eq!(value, ArgValue::Level(HeadingLevel::new(n).unwrap()));
        }
        assert!(ArgKind::Level.parse("0").is_err());
        assert!(ArgKind::Level.parse("7").is_err());
        assert!(ArgKind::Level.parse("two").is_err());
    }

    #[test]
    fn test_url_parse_adds_scheme() {
        let value = ArgKind::Url.parse("example.com/a").unwrap();
        match value {
            ArgValue::Url(url) => assert_eq!(url.as_str(), "http://example.com/a"),
            other => panic!("unexpected value {:?}", other),
        }

        let value = ArgKind::Url.parse("https://example.com").unwrap();
        match value {
            ArgValue::Url(url) => assert_eq!(url.scheme(), "https"),
            other => panic!("unexpected value {:?}", other),
        }

        assert!(ArgKind::Url.parse("http://").is_err());
    }

    #[test]
    fn test_lang_rejects_whitespace() {
        assert_eq!(
            ArgKind::Lang.parse("rust"),
            Ok(ArgValue::Lang("rust".to_string()))
        );
        let err = ArgKind::Lang.parse("type script").unwrap_err();
        assert_eq!(err.message, "Contains whitespace");
    }

    #[test]
    fn test_title_rejects_blank() {
        let err = ArgKind::Title.parse("   ").unwrap_err();
        assert_eq!(err.message, "Only contains whitespace");
        assert!(ArgKind::Title.parse(" My note ").is_ok());
    }

    #[test]
    fn test_locater_parse() {
        assert_eq!(
            ArgKind::Locater.parse("note:journal/today.md"),
            Ok(ArgValue::Locater(Locater::Note {
                path: "journal/today.md".to_string()
            }))
        );
        assert_eq!(
            ArgKind::Locater.parse("pinned"),
            Ok(ArgValue::Locater(Locater::Pinned))
        );
        assert!(ArgKind::Locater.parse("note:").is_err());
        assert!(ArgKind::Locater.parse("elsewhere").is_err());
        assert_eq!(Locater::Settings.to_route(), "/settings");
    }

    #[test]
    fn test_math_braces() {
        assert!(ArgKind::Math.parse(r"\frac{a}{b}").is_ok());
        assert!(ArgKind::Math.parse(r"\{ x \}").is_ok());
        assert!(ArgKind::Math.parse(r"\frac{a}{b").is_err());
        assert!(ArgKind::Math.parse("a}").is_err());
    }

    #[test]
    fn test_render_round_trip() {
        let values = [
            ArgValue::Boolean(false),
            ArgValue::Insertion(Insertion::Below),
            ArgValue::NotePath("notes/a.md".to_string()),
            ArgValue::Locater(Locater::Note {
                path: "a.md".to_string(),
            }),
            ArgValue::Number(0.1),
            ArgValue::Number(42.0),
            ArgValue::Url(Url::parse("https://example.com/x?y=1").unwrap()),
            ArgValue::Level(HeadingLevel::new(3).unwrap()),
            ArgValue::Lang("python".to_string()),
            ArgValue::Math(r"e^{i\pi}".parse().unwrap()),
            ArgValue::Title("Hello".to_string()),
        ];

        for value in values {
            let rendered = value.render();
            assert_eq!(value.kind().parse(&rendered), Ok(value.clone()));
        }
    }

    #[test]
    fn test_choices_all_parse() {
        for kind in ArgKind::ALL {
            for choice in kind.choices().unwrap_or_default() {
                assert!(kind.parse(choice).is_ok(), "{} rejects {}", kind, choice);
            }
        }
        assert!(ArgKind::Title.choices().is_none());
    }

    #[test]
    fn test_from_arg() {
        assert_eq!(bool::from_arg(&ArgValue::Boolean(true)), Some(true));
        assert_eq!(f64::from_arg(&ArgValue::Boolean(true)), None);
        assert_eq!(
            String::from_arg(&ArgValue::Lang("go".to_string())),
            Some("go".to_string())
        );
        assert_eq!(
            Insertion::from_arg(&ArgValue::Insertion(Insertion::Above)),
            Some(Insertion::Above)
        );
    }
}
