//! In-process index.
//!
//! `InMemoryBackend` implements [`PaletteBackend`] without a remote side. It
//! builds palettes from [`ActionsConfig`], serves tag suggestions derived from
//! the note paths, and can evict sessions on demand to exercise recovery paths.

use futures::future::BoxFuture;
use nucleo::pattern::{CaseMatching, Normalization, Pattern};
use nucleo::{Config, Matcher, Utf32Str};
use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::LazyLock;
use std::time::Duration;

use brot_core::{
    note_display_title, split_title_icon, ActionsConfig, BackendError, Matched,
    MatchedPaletteAction, PaletteAction, PartialActionFilter, SessionId, SuggesterSource,
    SuggestionValue,
};

use crate::backend::PaletteBackend;

/// Suggester searches always return at most this many matches.
pub const SUGGESTER_LIMIT: u32 = 5;

// =============================================================================
// Tags
// =============================================================================

/// A node in the tag tree. Children are addressed as `-parent--child`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagNode {
    pub name: String,
    pub children: Vec<TagNode>,
}

impl TagNode {
    pub fn new(name: impl Into<String>, children: Vec<TagNode>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }
}

static TAG_LEVEL_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{2,}").expect("tag level separator is a valid pattern"));

/// Tag units named by a note path.
///
/// Every title word starting with `-` is one unit, and runs of two or more
/// dashes separate its levels: `a_-work--urgent_-home.md` names
/// `[["work", "urgent"], ["home"]]`. A single dash stays inside a level.
fn tag_units(path: &str) -> Vec<Vec<String>> {
    note_display_title(path)
        .split_whitespace()
        .filter(|word| word.starts_with('-'))
        .map(|word| {
            TAG_LEVEL_SEPARATOR
                .split(word.trim_start_matches('-'))
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|parts| !parts.is_empty())
        .collect()
}

fn insert_tag_parts(parts: &[String], nodes: &mut Vec<TagNode>) {
    let [head, tail @ ..] = parts else {
        return;
    };
    let index = match nodes.iter().position(|node| node.name == *head) {
        Some(index) => index,
        None => {
            nodes.push(TagNode::new(head.clone(), Vec::new()));
            nodes.len() - 1
        }
    };
    insert_tag_parts(tail, &mut nodes[index].children);
}

/// Build the tag tree named by a set of note paths.
///
/// Units sharing a prefix merge into one branch; roots keep first-seen order.
pub fn tags_from_notes(notes: &[String]) -> Vec<TagNode> {
    let mut nodes = Vec::new();
    for path in notes {
        for parts in tag_units(path) {
            insert_tag_parts(&parts, &mut nodes);
        }
    }
    nodes
}

/// Flatten a tag tree into completion values, parents before children.
pub fn expand_tags(nodes: &[TagNode]) -> Vec<String> {
    nodes
        .iter()
        .flat_map(|node| {
            std::iter::once(format!("-{}", node.name)).chain(
                expand_tags(&node.children)
                    .into_iter()
                    .map(move |child| format!("-{}-{}", node.name, child)),
            )
        })
        .collect()
}

// =============================================================================
// Matching
// =============================================================================

/// Match `query` against every item, rank, and cut the `range` window.
///
/// An empty query matches everything in insertion order. Otherwise items are
/// fuzzy matched with smart case and ranked by score; ties keep insertion
/// order.
fn rank<T: Clone>(
    items: &[T],
    text: impl Fn(&T) -> &str,
    query: &str,
    range: Range<u32>,
) -> Vec<Matched<T>> {
    let mut hits: Vec<(u32, Matched<T>)> = if query.is_empty() {
        items
            .iter()
            .map(|item| (0, Matched::new(Vec::new(), item.clone())))
            .collect()
    } else {
        let pattern = Pattern::parse(query, CaseMatching::Smart, Normalization::Smart);
        let mut matcher = Matcher::new(Config::DEFAULT);
        let mut buf = Vec::new();
        items
            .iter()
            .filter_map(|item| {
                let haystack = Utf32Str::new(text(item), &mut buf);
                let mut indices = Vec::new();
                let score = pattern.indices(haystack, &mut matcher, &mut indices)?;
                indices.sort_unstable();
                indices.dedup();
                Some((score, Matched::new(indices, item.clone())))
            })
            .collect()
    };
    hits.sort_by(|a, b| b.0.cmp(&a.0));

    let end = (range.end as usize).min(hits.len());
    let start = (range.start as usize).min(end);
    hits.drain(start..end).map(|(_, matched)| matched).collect()
}

// =============================================================================
// Backend
// =============================================================================

/// Snapshot of how many calls each operation received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub creates: usize,
    pub searches: usize,
    pub deletes: usize,
}

#[derive(Default)]
struct Counters {
    creates: AtomicUsize,
    searches: AtomicUsize,
    deletes: AtomicUsize,
}

#[derive(Default)]
struct Sessions {
    palettes: HashMap<SessionId, Vec<PaletteAction>>,
    suggesters: HashMap<SessionId, Vec<SuggestionValue>>,
    last_id: u64,
}

impl Sessions {
    fn next_id(&mut self) -> SessionId {
        self.last_id += 1;
        SessionId(self.last_id)
    }
}

/// A [`PaletteBackend`] that keeps every session in memory.
#[derive(Default)]
pub struct InMemoryBackend {
    config: ActionsConfig,
    notes: Vec<String>,
    delay: Duration,
    sessions: Mutex<Sessions>,
    counters: Counters,
}

impl InMemoryBackend {
    pub fn new(config: ActionsConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Note paths used to expand `$note_path` entries and to derive tags.
    pub fn with_notes(mut self, notes: Vec<String>) -> Self {
        self.notes = notes;
        self
    }

    /// Delay every answer, to simulate round trips.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Drop a session as if the remote side had evicted it.
    ///
    /// Returns `true` if the session existed.
    pub fn evict(&self, id: SessionId) -> bool {
        let mut sessions = self.sessions.lock();
        let removed =
            sessions.palettes.remove(&id).is_some() || sessions.suggesters.remove(&id).is_some();
        if removed {
            tracing::debug!("Evicted session {}", id);
        }
        removed
    }

    /// Number of live sessions of either kind.
    pub fn session_count(&self) -> usize {
        let sessions = self.sessions.lock();
        sessions.palettes.len() + sessions.suggesters.len()
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            creates: self.counters.creates.load(Ordering::SeqCst),
            searches: self.counters.searches.load(Ordering::SeqCst),
            deletes: self.counters.deletes.load(Ordering::SeqCst),
        }
    }

    /// Every entry of `palette_key` not excluded by `filters`.
    pub fn palette_actions(
        &self,
        palette_key: &str,
        filters: &[PartialActionFilter],
    ) -> Result<Vec<PaletteAction>, BackendError> {
        let entries = self
            .config
            .palettes
            .get(palette_key)
            .ok_or_else(|| BackendError::UnknownPalette(palette_key.to_string()))?;

        Ok(entries
            .iter()
            .flat_map(|(title_with_icon, template)| {
                let (title, icon) = split_title_icon(title_with_icon);
                template
                    .expand(title, &self.notes)
                    .into_iter()
                    .map(move |(title, action)| PaletteAction {
                        title,
                        icon: icon.map(str::to_string),
                        action,
                    })
            })
            .filter(|entry| filters.iter().all(|filter| !filter.matches(&entry.action)))
            .collect())
    }

    fn reply<T: Send + 'static>(
        &self,
        result: Result<T, BackendError>,
    ) -> BoxFuture<'static, Result<T, BackendError>> {
        let delay = self.delay;
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            result
        })
    }
}

impl PaletteBackend for InMemoryBackend {
    fn create_palette(
        &self,
        palette_key: String,
        filters: Vec<PartialActionFilter>,
    ) -> BoxFuture<'static, Result<SessionId, BackendError>> {
        self.counters.creates.fetch_add(1, Ordering::SeqCst);
        let result = self.palette_actions(&palette_key, &filters).map(|actions| {
            let mut sessions = self.sessions.lock();
            let id = sessions.next_id();
            tracing::debug!(
                "Created palette {} for '{}' with {} entries",
                id,
                palette_key,
                actions.len()
            );
            sessions.palettes.insert(id, actions);
            id
        });
        self.reply(result)
    }

    fn search_palette(
        &self,
        search: String,
        id: SessionId,
        start: u32,
        end: u32,
    ) -> BoxFuture<'static, Result<Option<Vec<MatchedPaletteAction>>, BackendError>> {
        self.counters.searches.fetch_add(1, Ordering::SeqCst);
        let result = self.sessions.lock().palettes.get(&id).map(|actions| {
            rank(actions, |action| action.title.as_str(), &search, start..end)
        });
        self.reply(Ok(result))
    }

    fn delete_palette(&self, id: SessionId) -> BoxFuture<'static, Result<(), BackendError>> {
        self.counters.deletes.fetch_add(1, Ordering::SeqCst);
        self.sessions.lock().palettes.remove(&id);
        self.reply(Ok(()))
    }

    fn create_suggester(
        &self,
        source: SuggesterSource,
    ) -> BoxFuture<'static, Result<SessionId, BackendError>> {
        self.counters.creates.fetch_add(1, Ordering::SeqCst);
        let values = match source {
            SuggesterSource::Tag => expand_tags(&tags_from_notes(&self.notes))
                .into_iter()
                .map(SuggestionValue::new)
                .collect::<Vec<_>>(),
        };
        let mut sessions = self.sessions.lock();
        let id = sessions.next_id();
        sessions.suggesters.insert(id, values);
        self.reply(Ok(id))
    }

    fn search_suggester(
        &self,
        search: String,
        id: SessionId,
    ) -> BoxFuture<'static, Result<Option<Vec<Matched<SuggestionValue>>>, BackendError>> {
        self.counters.searches.fetch_add(1, Ordering::SeqCst);
        let result = self.sessions.lock().suggesters.get(&id).map(|values| {
            rank(values, |v| v.value.as_str(), &search, 0..SUGGESTER_LIMIT)
        });
        self.reply(Ok(result))
    }

    fn delete_suggester(&self, id: SessionId) -> BoxFuture<'static, Result<(), BackendError>> {
        self.counters.deletes.fetch_add(1, Ordering::SeqCst);
        self.sessions.lock().suggesters.remove(&id);
        self.reply(Ok(()))
    }
}
