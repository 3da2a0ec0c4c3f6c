//! Search sessions.
//!
//! A `SearchSession` wraps one remote, session-scoped search index. It owns
//! the session id lifecycle:
//!
//! ```text
//!                ensure()                 create ok
//! Uninitialized ─────────► Initializing ─────────────► Active(id)
//!       ▲                       │ create err               │
//!       └───────────────────────┘                          │ search -> None
//!                                                          ▼
//!                          Active(new) ◄──────────── Recovering
//!                                       create ok
//! ```
//!
//! Concurrent callers that find the session uninitialized (or recovering)
//! await one shared in-flight `create` instead of racing. A `search` that
//! finds its id invalid re-initializes exactly once and retries exactly once;
//! a second invalid result degrades to no results.

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::ops::Range;
use std::sync::Arc;

use brot_core::{
    BackendError, Matched, MatchedPaletteAction, PartialActionFilter, SessionId, SuggesterSource,
    SuggestionValue,
};
use brot_dispatch::ActionRegistryManager;

use crate::backend::PaletteBackend;

// =============================================================================
// Session Source
// =============================================================================

/// The three remote operations for one kind of session.
pub trait SessionSource: Send + Sync + 'static {
    /// One search hit.
    type Item: Send + 'static;

    /// Short name used in logs.
    fn name(&self) -> &str;

    fn create(&self) -> BoxFuture<'static, Result<SessionId, BackendError>>;

    /// `Ok(None)` means `id` is unknown to the remote side.
    fn search(
        &self,
        id: SessionId,
        query: String,
        range: Range<u32>,
    ) -> BoxFuture<'static, Result<Option<Vec<Self::Item>>, BackendError>>;

    fn delete(&self, id: SessionId) -> BoxFuture<'static, Result<(), BackendError>>;
}

/// Palette sessions: a palette key plus the filters fixed at creation.
pub struct PaletteDomain {
    backend: Arc<dyn PaletteBackend>,
    palette_key: String,
    filters: Vec<PartialActionFilter>,
}

impl PaletteDomain {
    pub fn new(
        backend: Arc<dyn PaletteBackend>,
        palette_key: impl Into<String>,
        filters: Vec<PartialActionFilter>,
    ) -> Self {
        Self {
            backend,
            palette_key: palette_key.into(),
            filters,
        }
    }

    pub fn palette_key(&self) -> &str {
        &self.palette_key
    }

    pub fn filters(&self) -> &[PartialActionFilter] {
        &self.filters
    }
}

impl SessionSource for PaletteDomain {
    type Item = MatchedPaletteAction;

    fn name(&self) -> &str {
        &self.palette_key
    }

    fn create(&self) -> BoxFuture<'static, Result<SessionId, BackendError>> {
        self.backend
            .create_palette(self.palette_key.clone(), self.filters.clone())
    }

    fn search(
        &self,
        id: SessionId,
        query: String,
        range: Range<u32>,
    ) -> BoxFuture<'static, Result<Option<Vec<Self::Item>>, BackendError>> {
        self.backend
            .search_palette(query, id, range.start, range.end)
    }

    fn delete(&self, id: SessionId) -> BoxFuture<'static, Result<(), BackendError>> {
        self.backend.delete_palette(id)
    }
}

/// Suggester sessions. The backend picks the result window, so the
/// requested range is not forwarded.
pub struct SuggesterDomain {
    backend: Arc<dyn PaletteBackend>,
    source: SuggesterSource,
}

impl SuggesterDomain {
    pub fn new(backend: Arc<dyn PaletteBackend>, source: SuggesterSource) -> Self {
        Self { backend, source }
    }
}

impl SessionSource for SuggesterDomain {
    type Item = Matched<SuggestionValue>;

    fn name(&self) -> &str {
        match self.source {
            SuggesterSource::Tag => "tag",
        }
    }

    fn create(&self) -> BoxFuture<'static, Result<SessionId, BackendError>> {
        self.backend.create_suggester(self.source)
    }

    fn search(
        &self,
        id: SessionId,
        query: String,
        _range: Range<u32>,
    ) -> BoxFuture<'static, Result<Option<Vec<Self::Item>>, BackendError>> {
        self.backend.search_suggester(query, id)
    }

    fn delete(&self, id: SessionId) -> BoxFuture<'static, Result<(), BackendError>> {
        self.backend.delete_suggester(id)
    }
}

// =============================================================================
// Session State
// =============================================================================

type InitFuture = Shared<BoxFuture<'static, Result<SessionId, BackendError>>>;

/// Observable session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Recovering,
    Active(SessionId),
}

enum Phase {
    Uninitialized,
    Initializing {
        fut: InitFuture,
        generation: u64,
        recovering: bool,
    },
    Active(SessionId),
}

struct Inner {
    phase: Phase,

    /// Bumped for every `create` started, so a finished initialization can
    /// tell whether it is still the current one.
    generation: u64,
}

/// Client side of one remote search session.
///
/// The owner must call [`close`](Self::close) when done; dropping the session
/// does not release the remote side.
pub struct SearchSession<S: SessionSource> {
    source: S,
    inner: Mutex<Inner>,
}

impl<S: SessionSource> SearchSession<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            inner: Mutex::new(Inner {
                phase: Phase::Uninitialized,
                generation: 0,
            }),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn state(&self) -> SessionState {
        match &self.inner.lock().phase {
            Phase::Uninitialized => SessionState::Uninitialized,
            Phase::Initializing {
                recovering: false, ..
            } => SessionState::Initializing,
            Phase::Initializing {
                recovering: true, ..
            } => SessionState::Recovering,
            Phase::Active(id) => SessionState::Active(*id),
        }
    }

    /// The current session id, if active.
    pub fn id(&self) -> Option<SessionId> {
        match self.state() {
            SessionState::Active(id) => Some(id),
            _ => None,
        }
    }

    /// Make sure a session exists, creating one if needed.
    pub async fn ensure(&self) -> Result<SessionId, BackendError> {
        let (fut, generation) = {
            let mut inner = self.inner.lock();
            let in_flight = match &inner.phase {
                Phase::Active(id) => return Ok(*id),
                Phase::Initializing {
                    fut, generation, ..
                } => Some((fut.clone(), *generation)),
                Phase::Uninitialized => None,
            };
            match in_flight {
                Some(joined) => joined,
                None => self.begin_init(&mut inner, false),
            }
        };
        self.finish_init(fut, generation).await
    }

    /// Search the session, returning the `range` window of matches.
    ///
    /// Recovers from an invalid id with one re-initialization and one retry.
    /// Transport errors are returned as-is.
    pub async fn search(
        &self,
        query: &str,
        range: Range<u32>,
    ) -> Result<Vec<S::Item>, BackendError> {
        let id = self.ensure().await?;
        if let Some(items) = self
            .source
            .search(id, query.to_string(), range.clone())
            .await?
        {
            return Ok(items);
        }

        tracing::debug!("Session {} ({}) is invalid, recovering", id, self.source.name());
        let id = self.recover(id).await?;
        match self.source.search(id, query.to_string(), range).await? {
            Some(items) => Ok(items),
            None => {
                tracing::warn!(
                    "Session {} ({}) invalid right after creation, returning no results",
                    id,
                    self.source.name()
                );
                self.invalidate(id);
                Ok(Vec::new())
            }
        }
    }

    /// Release the remote session.
    ///
    /// Waits for an in-flight initialization so its session is released too.
    /// A no-op when no session exists.
    pub async fn close(&self) -> Result<(), BackendError> {
        let phase = std::mem::replace(&mut self.inner.lock().phase, Phase::Uninitialized);
        let id = match phase {
            Phase::Uninitialized => return Ok(()),
            Phase::Active(id) => id,
            Phase::Initializing { fut, .. } => match fut.await {
                Ok(id) => id,
                Err(_) => return Ok(()),
            },
        };
        tracing::debug!("Closing session {} ({})", id, self.source.name());
        self.source.delete(id).await
    }

    /// Forget `id` if it is still the current session.
    ///
    /// Returns `false` when another caller already replaced it.
    pub fn invalidate(&self, id: SessionId) -> bool {
        let mut inner = self.inner.lock();
        match inner.phase {
            Phase::Active(current) if current == id => {
                inner.phase = Phase::Uninitialized;
                true
            }
            _ => false,
        }
    }

    /// Replace the failed session `failed`, or join whoever is already doing so.
    async fn recover(&self, failed: SessionId) -> Result<SessionId, BackendError> {
        let (fut, generation) = {
            let mut inner = self.inner.lock();
            let in_flight = match &inner.phase {
                Phase::Active(id) if *id != failed => return Ok(*id),
                Phase::Initializing {
                    fut, generation, ..
                } => Some((fut.clone(), *generation)),
                Phase::Active(_) | Phase::Uninitialized => None,
            };
            match in_flight {
                Some(joined) => joined,
                None => self.begin_init(&mut inner, true),
            }
        };
        self.finish_init(fut, generation).await
    }

    fn begin_init(&self, inner: &mut Inner, recovering: bool) -> (InitFuture, u64) {
        inner.generation += 1;
        let generation = inner.generation;
        tracing::debug!(
            "Creating session for {} (generation {})",
            self.source.name(),
            generation
        );
        let fut = self.source.create().shared();
        inner.phase = Phase::Initializing {
            fut: fut.clone(),
            generation,
            recovering,
        };
        (fut, generation)
    }

    /// Await an initialization and install its outcome if it is still current.
    async fn finish_init(
        &self,
        fut: InitFuture,
        generation: u64,
    ) -> Result<SessionId, BackendError> {
        let result = fut.await;

        let mut inner = self.inner.lock();
        if let Phase::Initializing {
            generation: current,
            ..
        } = inner.phase
        {
            if current == generation {
                inner.phase = match &result {
                    Ok(id) => Phase::Active(*id),
                    Err(_) => Phase::Uninitialized,
                };
            }
        }
        result
    }
}

// =============================================================================
// Constructors
// =============================================================================

/// A session over a palette.
pub type PaletteSession = SearchSession<PaletteDomain>;

/// A session over an inline suggester.
pub type SuggesterSession = SearchSession<SuggesterDomain>;

/// Open a palette session whose filters come from every contributor's
/// disablement predicates, evaluated now.
pub fn palette_session(
    backend: Arc<dyn PaletteBackend>,
    palette_key: impl Into<String>,
    manager: &ActionRegistryManager,
) -> PaletteSession {
    SearchSession::new(PaletteDomain::new(backend, palette_key, manager.filters()))
}

/// Open a suggester session.
pub fn suggester_session(
    backend: Arc<dyn PaletteBackend>,
    source: SuggesterSource,
) -> SuggesterSession {
    SearchSession::new(SuggesterDomain::new(backend, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockPaletteBackend;
    use brot_core::{ActionKey, ArgsFilter, PaletteAction, RawPartialAction};
    use brot_dispatch::{ActionRegistry, DisabledRegistry};
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    fn hit(title: &str, key: &str) -> MatchedPaletteAction {
        Matched::new(
            vec![0],
            PaletteAction::new(title, RawPartialAction::new(key, vec![])),
        )
    }

    /// Mock whose create hands out s1, s2, ... and counts calls.
    fn counting_creates(mock: &mut MockPaletteBackend) -> Arc<AtomicU64> {
        let next = Arc::new(AtomicU64::new(0));
        let counter = next.clone();
        mock.expect_create_palette().returning(move |_, _| {
            let id = SessionId(counter.fetch_add(1, Ordering::SeqCst) + 1);
            Box::pin(async move { Ok(id) })
        });
        next
    }

    fn session(mock: MockPaletteBackend) -> PaletteSession {
        SearchSession::new(PaletteDomain::new(Arc::new(mock), "actions", vec![]))
    }

    #[tokio::test]
    async fn test_search_initializes_once() {
        let mut mock = MockPaletteBackend::new();
        let creates = counting_creates(&mut mock);
        mock.expect_search_palette()
            .times(2)
            .returning(|_, _, _, _| Box::pin(async { Ok(Some(vec![hit("Bold", "toggleBold")])) }));

        let session = session(mock);
        assert_eq!(session.state(), SessionState::Uninitialized);

        assert_eq!(session.search("bol", 0..10).await.unwrap().len(), 1);
        assert_eq!(session.search("bo", 0..10).await.unwrap().len(), 1);
        assert_eq!(creates.load(Ordering::SeqCst), 1);
        assert_eq!(session.state(), SessionState::Active(SessionId(1)));
    }

    #[tokio::test]
    async fn test_search_forwards_query_and_window() {
        let mut mock = MockPaletteBackend::new();
        counting_creates(&mut mock);
        mock.expect_search_palette()
            .withf(|search, id, start, end| {
                search == "bol" && *id == SessionId(1) && *start == 5 && *end == 15
            })
            .times(1)
            .returning(|_, _, _, _| Box::pin(async { Ok(Some(vec![])) }));

        let session = session(mock);
        assert!(session.search("bol", 5..15).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recovers_from_invalid_id() {
        let mut mock = MockPaletteBackend::new();
        let creates = counting_creates(&mut mock);
        mock.expect_search_palette().returning(|_, id, _, _| {
            Box::pin(async move {
                if id == SessionId(1) {
                    Ok(None)
                } else {
                    Ok(Some(vec![hit("Bold", "toggleBold")]))
                }
            })
        });

        let session = session(mock);
        let results = session.search("bol", 0..10).await.unwrap();
        assert_eq!(results, vec![hit("Bold", "toggleBold")]);
        assert_eq!(creates.load(Ordering::SeqCst), 2);
        assert_eq!(session.id(), Some(SessionId(2)));
    }

    #[tokio::test]
    async fn test_persistent_invalid_degrades_to_empty() {
        let mut mock = MockPaletteBackend::new();
        let creates = counting_creates(&mut mock);
        let searches = Arc::new(AtomicUsize::new(0));
        let counter = searches.clone();
        mock.expect_search_palette().returning(move |_, _, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(None) })
        });

        let session = session(mock);
        let results = session.search("bol", 0..10).await.unwrap();
        assert!(results.is_empty());

        // Exactly one re-initialization and one retry.
        assert_eq!(creates.load(Ordering::SeqCst), 2);
        assert_eq!(searches.load(Ordering::SeqCst), 2);
        assert_eq!(session.state(), SessionState::Uninitialized);
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let mut mock = MockPaletteBackend::new();
        counting_creates(&mut mock);
        mock.expect_search_palette().returning(|_, _, _, _| {
            Box::pin(async { Err(BackendError::Transport("connection reset".to_string())) })
        });

        let session = session(mock);
        let err = session.search("bol", 0..10).await.unwrap_err();
        assert_eq!(err, BackendError::Transport("connection reset".to_string()));

        // The session itself is still considered valid.
        assert_eq!(session.id(), Some(SessionId(1)));
    }

    #[tokio::test]
    async fn test_failed_create_resets() {
        let mut mock = MockPaletteBackend::new();
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        mock.expect_create_palette().returning(move |_, _| {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if attempt == 0 {
                    Err(BackendError::Closed)
                } else {
                    Ok(SessionId(7))
                }
            })
        });

        let session = session(mock);
        assert_eq!(session.ensure().await, Err(BackendError::Closed));
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert_eq!(session.ensure().await, Ok(SessionId(7)));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut mock = MockPaletteBackend::new();
        counting_creates(&mut mock);
        mock.expect_delete_palette()
            .withf(|id| *id == SessionId(1))
            .times(1)
            .returning(|_| Box::pin(async { Ok(()) }));

        let session = session(mock);

        // Before any search: nothing to release.
        session.close().await.unwrap();

        session.ensure().await.unwrap();
        session.close().await.unwrap();
        session.close().await.unwrap();
        assert_eq!(session.state(), SessionState::Uninitialized);
    }

    #[tokio::test]
    async fn test_invalidate_compare_and_clear() {
        let mut mock = MockPaletteBackend::new();
        counting_creates(&mut mock);

        let session = session(mock);
        session.ensure().await.unwrap();

        assert!(!session.invalidate(SessionId(99)));
        assert_eq!(session.id(), Some(SessionId(1)));
        assert!(session.invalidate(SessionId(1)));
        assert_eq!(session.id(), None);
    }

    #[tokio::test]
    async fn test_stale_invalidate_keeps_new_session() {
        let mut mock = MockPaletteBackend::new();
        let creates = counting_creates(&mut mock);

        let session = session(mock);
        assert_eq!(session.ensure().await, Ok(SessionId(1)));
        assert!(session.invalidate(SessionId(1)));
        assert_eq!(session.ensure().await, Ok(SessionId(2)));

        // A caller still holding the first id must not clear its replacement.
        assert!(!session.invalidate(SessionId(1)));
        assert_eq!(session.state(), SessionState::Active(SessionId(2)));
        assert_eq!(creates.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_searches_recover_once() {
        let mut mock = MockPaletteBackend::new();
        let creates = Arc::new(AtomicU64::new(0));
        let counter = creates.clone();
        mock.expect_create_palette().returning(move |_, _| {
            let id = SessionId(counter.fetch_add(1, Ordering::SeqCst) + 1);
            Box::pin(async move {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                Ok(id)
            })
        });
        mock.expect_search_palette().returning(|_, id, _, _| {
            Box::pin(async move {
                if id == SessionId(1) {
                    Ok(None)
                } else {
                    Ok(Some(vec![hit("Bold", "toggleBold")]))
                }
            })
        });

        let session = session(mock);
        let (a, b) = tokio::join!(session.search("bol", 0..10), session.search("bo", 0..10));
        assert_eq!(a.unwrap(), vec![hit("Bold", "toggleBold")]);
        assert_eq!(b.unwrap(), vec![hit("Bold", "toggleBold")]);

        // One create for the first session, one shared recovery.
        assert_eq!(creates.load(Ordering::SeqCst), 2);
        assert_eq!(session.state(), SessionState::Active(SessionId(2)));
    }

    #[tokio::test]
    async fn test_close_during_init_releases_session() {
        let mut mock = MockPaletteBackend::new();
        mock.expect_create_palette().times(1).returning(|_, _| {
            Box::pin(async {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                Ok(SessionId(1))
            })
        });
        mock.expect_delete_palette()
            .withf(|id| *id == SessionId(1))
            .times(1)
            .returning(|_| Box::pin(async { Ok(()) }));

        let session = session(mock);
        let (ensured, closed) = tokio::join!(session.ensure(), session.close());
        assert_eq!(ensured, Ok(SessionId(1)));
        assert_eq!(closed, Ok(()));

        // The finished create must not reinstall the closed session.
        assert_eq!(session.state(), SessionState::Uninitialized);
    }

    #[tokio::test]
    async fn test_concurrent_ensure_shares_create() {
        let mut mock = MockPaletteBackend::new();
        let creates = Arc::new(AtomicUsize::new(0));
        let counter = creates.clone();
        mock.expect_create_palette().returning(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                Ok(SessionId(1))
            })
        });

        let session = session(mock);
        let (a, b, c) = tokio::join!(session.ensure(), session.ensure(), session.ensure());
        assert_eq!((a, b, c), (Ok(SessionId(1)), Ok(SessionId(1)), Ok(SessionId(1))));
        assert_eq!(creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_palette_session_uses_manager_filters() {
        let manager = ActionRegistryManager::new();
        manager.add(
            ActionRegistry::new(),
            Some(DisabledRegistry::new().on(ActionKey::ToggleBold, ArgsFilter::always_match)),
        );

        let mut mock = MockPaletteBackend::new();
        mock.expect_create_palette()
            .withf(|key, filters| {
                key == "actions"
                    && filters
                        == &[PartialActionFilter {
                            key: "toggleBold".to_string(),
                            args: vec![],
                        }]
            })
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(SessionId(1)) }));

        let session = palette_session(Arc::new(mock), "actions", &manager);
        assert_eq!(session.source().filters().len(), 1);
        assert_eq!(session.ensure().await, Ok(SessionId(1)));
    }

    #[tokio::test]
    async fn test_suggester_session() {
        let mut mock = MockPaletteBackend::new();
        mock.expect_create_suggester()
            .withf(|source| *source == SuggesterSource::Tag)
            .returning(|_| Box::pin(async { Ok(SessionId(3)) }));
        mock.expect_search_suggester().returning(|search, _| {
            let value = SuggestionValue::new(search);
            Box::pin(async move { Ok(Some(vec![Matched::new(vec![0], value)])) })
        });
        mock.expect_delete_suggester()
            .times(1)
            .returning(|_| Box::pin(async { Ok(()) }));

        let session = suggester_session(Arc::new(mock), SuggesterSource::Tag);
        let results = session.search("-wo", 0..5).await.unwrap();
        assert_eq!(results[0].payload.value, "-wo");
        session.close().await.unwrap();
    }
}
