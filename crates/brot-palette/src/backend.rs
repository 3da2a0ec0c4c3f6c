//! Remote index contract.
//!
//! The `PaletteBackend` trait is transport-independent and returns futures,
//! allowing the caller to drive them on whatever executor it uses. An invalid
//! or expired session id is reported as `Ok(None)`, never as an error; errors
//! are reserved for transport failures.

use futures::future::BoxFuture;
use std::time::Duration;

use brot_core::{
    BackendError, Matched, MatchedPaletteAction, PartialActionFilter, SessionId, SuggesterSource,
    SuggestionValue,
};

/// Operations the remote index exposes for palettes and suggesters.
#[cfg_attr(test, mockall::automock)]
pub trait PaletteBackend: Send + Sync {
    /// Create a palette session over `palette_key`, excluding `filters`.
    fn create_palette(
        &self,
        palette_key: String,
        filters: Vec<PartialActionFilter>,
    ) -> BoxFuture<'static, Result<SessionId, BackendError>>;

    /// Search a palette session, returning the `start..end` window of matches.
    fn search_palette(
        &self,
        search: String,
        id: SessionId,
        start: u32,
        end: u32,
    ) -> BoxFuture<'static, Result<Option<Vec<MatchedPaletteAction>>, BackendError>>;

    /// Release a palette session.
    fn delete_palette(&self, id: SessionId) -> BoxFuture<'static, Result<(), BackendError>>;

    /// Create an inline suggestion session.
    fn create_suggester(
        &self,
        source: SuggesterSource,
    ) -> BoxFuture<'static, Result<SessionId, BackendError>>;

    /// Search a suggester session. The backend decides the window size.
    fn search_suggester(
        &self,
        search: String,
        id: SessionId,
    ) -> BoxFuture<'static, Result<Option<Vec<Matched<SuggestionValue>>>, BackendError>>;

    /// Release a suggester session.
    fn delete_suggester(&self, id: SessionId) -> BoxFuture<'static, Result<(), BackendError>>;
}

// =============================================================================
// Timeout Wrapper
// =============================================================================

/// Bounds every backend call with a timeout.
///
/// An elapsed call fails with [`BackendError::Timeout`]; the inner request is
/// dropped, not retried.
pub struct TimeoutBackend<B> {
    inner: B,
    timeout: Duration,
}

impl<B: PaletteBackend> TimeoutBackend<B> {
    /// Wrap with the default five second timeout.
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            timeout: Duration::from_secs(5),
        }
    }

    /// Create with a custom timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get a reference to the wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

fn bounded<T: Send + 'static>(
    timeout: Duration,
    fut: BoxFuture<'static, Result<T, BackendError>>,
) -> BoxFuture<'static, Result<T, BackendError>> {
    Box::pin(async move {
        match tokio::time::timeout(timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout { duration: timeout }),
        }
    })
}

impl<B: PaletteBackend> PaletteBackend for TimeoutBackend<B> {
    fn create_palette(
        &self,
        palette_key: String,
        filters: Vec<PartialActionFilter>,
    ) -> BoxFuture<'static, Result<SessionId, BackendError>> {
        bounded(self.timeout, self.inner.create_palette(palette_key, filters))
    }

    fn search_palette(
        &self,
        search: String,
        id: SessionId,
        start: u32,
        end: u32,
    ) -> BoxFuture<'static, Result<Option<Vec<MatchedPaletteAction>>, BackendError>> {
        bounded(self.timeout, self.inner.search_palette(search, id, start, end))
    }

    fn delete_palette(&self, id: SessionId) -> BoxFuture<'static, Result<(), BackendError>> {
        bounded(self.timeout, self.inner.delete_palette(id))
    }

    fn create_suggester(
        &self,
        source: SuggesterSource,
    ) -> BoxFuture<'static, Result<SessionId, BackendError>> {
        bounded(self.timeout, self.inner.create_suggester(source))
    }

    fn search_suggester(
        &self,
        search: String,
        id: SessionId,
    ) -> BoxFuture<'static, Result<Option<Vec<Matched<SuggestionValue>>>, BackendError>> {
        bounded(self.timeout, self.inner.search_suggester(search, id))
    }

    fn delete_suggester(&self, id: SessionId) -> BoxFuture<'static, Result<(), BackendError>> {
        bounded(self.timeout, self.inner.delete_suggester(id))
    }
}
