//! Action Registry
//!
//! Maps action keys to executable handlers and disablement predicates.
//!
//! ## Layering
//!
//! ```text
//!  override manager (optional)      e.g. a modal scoping undo/redo
//!        │ miss
//!        ▼
//!  composed registry                contributor N shadows N-1 ... shadows 1
//! ```
//!
//! Contributors attach with [`ActionRegistryManager::add`]; later contributions
//! replace earlier ones key by key. An override, when installed, is consulted
//! first for every lookup and falls through to the composed registry for keys
//! it does not define.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use brot_core::{ActionKey, ArgValue, ArgsFilter, FromArg, PartialActionFilter};
use futures::future::{BoxFuture, FutureExt};

// =============================================================================
// Completion
// =============================================================================

/// What a handler did when invoked.
pub enum Completion {
    /// Ran synchronously.
    Ran,

    /// The handler exists but refused to run (e.g. the editor command is not
    /// applicable to the current selection).
    Declined,

    /// Started work that finishes when the future resolves.
    Pending(BoxFuture<'static, ()>),
}

impl Completion {
    /// Wrap an async completion.
    pub fn pending(fut: impl Future<Output = ()> + Send + 'static) -> Self {
        Self::Pending(fut.boxed())
    }

    /// Wait for the handler to finish. Returns `false` if it declined.
    pub async fn wait(self) -> bool {
        match self {
            Completion::Ran => true,
            Completion::Declined => false,
            Completion::Pending(fut) => {
                fut.await;
                true
            }
        }
    }

    pub fn is_declined(&self) -> bool {
        matches!(self, Completion::Declined)
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completion::Ran => f.write_str("Ran"),
            Completion::Declined => f.write_str("Declined"),
            Completion::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

impl From<()> for Completion {
    fn from(_: ()) -> Self {
        Completion::Ran
    }
}

impl From<bool> for Completion {
    fn from(ran: bool) -> Self {
        if ran {
            Completion::Ran
        } else {
            Completion::Declined
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// A stored action implementation. Receives the complete argument list in
/// signature order.
pub type ActionHandler = Arc<dyn Fn(&[ArgValue]) -> Completion + Send + Sync>;

/// A disablement predicate: which invocations are currently inapplicable.
pub type DisablePredicate = Arc<dyn Fn() -> ArgsFilter + Send + Sync>;

/// Wrap an untyped closure.
pub fn handler<F, R>(f: F) -> ActionHandler
where
    F: Fn(&[ArgValue]) -> R + Send + Sync + 'static,
    R: Into<Completion>,
{
    Arc::new(move |args: &[ArgValue]| f(args).into())
}

/// Wrap a closure for a zero-argument action.
pub fn handler0<F, R>(f: F) -> ActionHandler
where
    F: Fn() -> R + Send + Sync + 'static,
    R: Into<Completion>,
{
    Arc::new(move |_: &[ArgValue]| f().into())
}

/// Wrap a closure for a one-argument action.
pub fn handler1<A, F, R>(f: F) -> ActionHandler
where
    A: FromArg,
    F: Fn(A) -> R + Send + Sync + 'static,
    R: Into<Completion>,
{
    Arc::new(move |args: &[ArgValue]| match args.first().and_then(A::from_arg) {
        Some(a) => f(a).into(),
        None => {
            tracing::error!("Handler received mismatched arguments: {:?}", args);
            Completion::Declined
        }
    })
}

/// Wrap a closure for a two-argument action.
pub fn handler2<A, B, F, R>(f: F) -> ActionHandler
where
    A: FromArg,
    B: FromArg,
    F: Fn(A, B) -> R + Send + Sync + 'static,
    R: Into<Completion>,
{
    Arc::new(move |args: &[ArgValue]| {
        let a = args.first().and_then(A::from_arg);
        let b = args.get(1).and_then(B::from_arg);
        match (a, b) {
            (Some(a), Some(b)) => f(a, b).into(),
            _ => {
                tracing::error!("Handler received mismatched arguments: {:?}", args);
                Completion::Declined
            }
        }
    })
}

// =============================================================================
// Contributor Registries
// =============================================================================

/// One contributor's action implementations.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    handlers: HashMap<ActionKey, ActionHandler>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn on(mut self, key: ActionKey, handler: ActionHandler) -> Self {
        self.insert(key, handler);
        self
    }

    /// Add a handler. Replaces any earlier handler for the same key.
    pub fn insert(&mut self, key: ActionKey, handler: ActionHandler) {
        self.handlers.insert(key, handler);
    }

    pub fn get(&self, key: ActionKey) -> Option<ActionHandler> {
        self.handlers.get(&key).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// One contributor's disablement predicates.
#[derive(Clone, Default)]
pub struct DisabledRegistry {
    predicates: HashMap<ActionKey, DisablePredicate>,
}

impl DisabledRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn on<F>(mut self, key: ActionKey, predicate: F) -> Self
    where
        F: Fn() -> ArgsFilter + Send + Sync + 'static,
    {
        self.insert(key, Arc::new(predicate));
        self
    }

    pub fn insert(&mut self, key: ActionKey, predicate: DisablePredicate) {
        self.predicates.insert(key, predicate);
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

// =============================================================================
// Registry Manager
// =============================================================================

/// The composed registry plus an optional override.
///
/// Lookups clone the stored `Arc` out before returning, so handlers and
/// predicates always run with no registry lock held and may call back into
/// the manager.
#[derive(Default)]
pub struct ActionRegistryManager {
    /// Composed handlers, later contributors win.
    registry: RwLock<HashMap<ActionKey, ActionHandler>>,

    /// Composed disablement predicates, later contributors win.
    disabled: RwLock<HashMap<ActionKey, DisablePredicate>>,

    /// Full-registry override, consulted before the composed maps.
    override_manager: RwLock<Option<Arc<ActionRegistryManager>>>,
}

impl ActionRegistryManager {
    /// Create a new empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a contributor into the composed registry.
    ///
    /// Entries shadow earlier ones for the same key. Keys the contributor
    /// does not mention keep their current handler or predicate.
    pub fn add(&self, registry: ActionRegistry, disabled: Option<DisabledRegistry>) {
        tracing::debug!("Adding {} action handler(s)", registry.len());
        self.registry.write().extend(registry.handlers);

        if let Some(disabled) = disabled {
            tracing::debug!("Adding {} disablement predicate(s)", disabled.len());
            self.disabled.write().extend(disabled.predicates);
        }
    }

    /// Resolve the handler for `key`: override first, then composed.
    pub fn get(&self, key: ActionKey) -> Option<ActionHandler> {
        if let Some(handler) = self.current_override().and_then(|o| o.get(key)) {
            return Some(handler);
        }
        self.registry.read().get(&key).cloned()
    }

    /// Resolve the disablement predicate for `key`: override first, then composed.
    pub fn args_filter(&self, key: ActionKey) -> Option<DisablePredicate> {
        if let Some(predicate) = self.current_override().and_then(|o| o.args_filter(key)) {
            return Some(predicate);
        }
        self.disabled.read().get(&key).cloned()
    }

    /// Install an override, or clear it with `None`.
    ///
    /// The override must not (transitively) be this manager.
    pub fn set_override(&self, manager: Option<Arc<ActionRegistryManager>>) {
        tracing::debug!(
            "{} registry override",
            if manager.is_some() { "Setting" } else { "Clearing" }
        );
        *self.override_manager.write() = manager;
    }

    /// Check if an override is installed.
    pub fn has_override(&self) -> bool {
        self.override_manager.read().is_some()
    }

    /// Evaluate every resolved disablement predicate and collect the
    /// excluded invocations, in catalog order.
    pub fn filters(&self) -> Vec<PartialActionFilter> {
        ActionKey::ALL
            .iter()
            .filter_map(|key| self.args_filter(*key).map(|predicate| (key, predicate)))
            .flat_map(|(key, predicate)| predicate().to_filters(key.as_str()))
            .collect()
    }

    /// Number of handlers in the composed registry (override excluded).
    pub fn handler_count(&self) -> usize {
        self.registry.read().len()
    }

    fn current_override(&self) -> Option<Arc<ActionRegistryManager>> {
        self.override_manager.read().clone()
    }
}
