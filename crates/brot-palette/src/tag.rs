//! Tag completion.
//!
//! Completes the word under the caret when it starts with `-`, using a tag
//! suggester session. Positions are char indices, not byte offsets.

use std::sync::Arc;

use brot_core::{BackendError, SuggesterSource};

use crate::backend::PaletteBackend;
use crate::session::{suggester_session, SuggesterSession};

/// Marker every tag starts with.
const TAG_PREFIX: char = '-';

/// Window requested from the suggester.
const SUGGESTION_WINDOW: std::ops::Range<u32> = 0..5;

/// One completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    /// Highlight positions within `display`.
    pub indices: Vec<u32>,

    pub display: String,

    /// The input text with the current word replaced by this suggestion.
    pub text: String,

    /// Caret position after the replacement, just past the inserted value.
    pub caret: usize,
}

/// The word ending at `caret`: scans back to the previous space.
///
/// Returns the `(start, end)` char range, or `None` if the caret is at the
/// start of the text or directly after a space.
pub fn current_word(text: &str, caret: usize) -> Option<(usize, usize)> {
    if caret == 0 {
        return None;
    }
    let before: Vec<char> = text.chars().take(caret).collect();
    if before.len() < caret || before.last() == Some(&' ') {
        return None;
    }
    let start = before
        .iter()
        .rposition(|c| *c == ' ')
        .map_or(0, |space| space + 1);
    Some((start, caret))
}

/// Tag suggestions backed by a suggester session.
pub struct TagSuggestions {
    session: SuggesterSession,
}

impl TagSuggestions {
    pub fn new(backend: Arc<dyn PaletteBackend>) -> Self {
        Self {
            session: suggester_session(backend, SuggesterSource::Tag),
        }
    }

    pub fn session(&self) -> &SuggesterSession {
        &self.session
    }

    /// Suggestions for the word ending at `caret`.
    pub async fn search(&self, text: &str, caret: usize) -> Result<Vec<Suggestion>, BackendError> {
        let Some((start, end)) = current_word(text, caret) else {
            return Ok(Vec::new());
        };

        let chars: Vec<char> = text.chars().collect();
        let word: String = chars[start..end].iter().collect();
        if !word.starts_with(TAG_PREFIX) {
            return Ok(Vec::new());
        }

        let head: String = chars[..start].iter().collect();
        let tail: String = chars[end..].iter().collect();

        let matches = self.session.search(&word, SUGGESTION_WINDOW).await?;
        Ok(matches
            .into_iter()
            .map(|matched| {
                let value = matched.payload.value;
                Suggestion {
                    indices: matched.indices,
                    text: format!("{}{}{}", head, value, tail),
                    caret: start + value.chars().count(),
                    display: value,
                }
            })
            .collect())
    }

    /// Release the suggester session.
    pub async fn stop(&self) -> Result<(), BackendError> {
        self.session.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockPaletteBackend;
    use brot_core::{Matched, SessionId, SuggestionValue};

    #[test]
    fn test_current_word() {
        assert_eq!(current_word("hello -wo", 9), Some((6, 9)));
        assert_eq!(current_word("-wo rest", 3), Some((0, 3)));
        assert_eq!(current_word("abc", 0), None);
        assert_eq!(current_word("abc ", 4), None);
        assert_eq!(current_word("abc", 10), None);
    }

    #[test]
    fn test_current_word_multibyte() {
        assert_eq!(current_word("ü -é", 4), Some((2, 4)));
    }

    fn tag_backend() -> MockPaletteBackend {
        let mut mock = MockPaletteBackend::new();
        mock.expect_create_suggester()
            .returning(|_| Box::pin(async { Ok(SessionId(1)) }));
        mock.expect_search_suggester().returning(|search, _| {
            let hits = ["-work", "-work--urgent"]
                .iter()
                .filter(|tag| tag.starts_with(search.as_str()))
                .map(|tag| Matched::new(vec![0, 1], SuggestionValue::new(*tag)))
                .collect::<Vec<_>>();
            Box::pin(async move { Ok(Some(hits)) })
        });
        mock
    }

    #[tokio::test]
    async fn test_replacement() {
        let tags = TagSuggestions::new(Arc::new(tag_backend()));
        let results = tags.search("todo -wo later", 8).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].display, "-work");
        assert_eq!(results[0].text, "todo -work later");
        assert_eq!(results[0].caret, 10);
        assert_eq!(results[1].text, "todo -work--urgent later");
    }

    #[tokio::test]
    async fn test_non_tag_word_skips_backend() {
        let mut mock = MockPaletteBackend::new();
        mock.expect_create_suggester().never();
        mock.expect_search_suggester().never();

        let tags = TagSuggestions::new(Arc::new(mock));
        assert!(tags.search("plain words", 5).await.unwrap().is_empty());
        assert!(tags.search("after space ", 12).await.unwrap().is_empty());
        assert!(tags.search("", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stop_without_session() {
        let mut mock = MockPaletteBackend::new();
        mock.expect_delete_suggester().never();
        let tags = TagSuggestions::new(Arc::new(mock));
        tags.stop().await.unwrap();
    }
}
