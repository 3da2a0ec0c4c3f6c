//! Continuation Engine
//!
//! Decides what happens to a partial action: dispatch it when complete, or
//! ask the argument-collection UI for the next kind when not.
//!
//! ```text
//! PartialAction
//!      │
//!      ▼
//! args.len() >= arity? ──no──► request_next_arg(signature[args.len()])
//!      │ yes
//!      ▼
//! manager.get(key) ──none──► log, Unregistered
//!      │ some
//!      ▼
//! handler(args) ──► Dispatched(Completion)
//! ```
//!
//! The engine never suspends and never performs IO. The only side channel is
//! the injected `request_next_arg` callback.

use parking_lot::Mutex;
use std::sync::Arc;

use brot_core::{ActionKey, ArgKind, PartialAction};

use crate::registry::{ActionRegistryManager, Completion};

/// Outcome of continuing a partial action.
#[derive(Debug)]
pub enum Continuation {
    /// Incomplete; `request_next_arg` was called with this kind.
    NeedsArg(ArgKind),

    /// Complete and handed to the registered handler.
    Dispatched(Completion),

    /// Complete, but nothing is registered for the key.
    Unregistered,
}

impl Continuation {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Continuation::Dispatched(_))
    }
}

/// Continue `action` against the manager's current handlers.
pub fn continue_partial_action(
    manager: &ActionRegistryManager,
    action: &PartialAction,
    request_next_arg: impl FnOnce(ArgKind),
) -> Continuation {
    let key = action.key();

    if let Some(kind) = action.next_kind() {
        tracing::debug!(
            "Action '{}' needs argument {} ({})",
            key,
            action.args().len(),
            kind
        );
        request_next_arg(kind);
        return Continuation::NeedsArg(kind);
    }

    match manager.get(key) {
        Some(handler) => {
            tracing::debug!("Dispatching action '{}'", key);
            Continuation::Dispatched(handler(action.args()))
        }
        None => {
            tracing::debug!("No implementation for action '{}', skipping", key);
            Continuation::Unregistered
        }
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Continuation engine plus the remembered last action.
///
/// `repeatLastAction` is handled here: it replays the stored action and is
/// never stored itself.
pub struct Dispatcher {
    manager: Arc<ActionRegistryManager>,

    /// Last complete action that reached a handler. In memory only.
    last: Mutex<Option<PartialAction>>,
}

impl Dispatcher {
    pub fn new(manager: Arc<ActionRegistryManager>) -> Self {
        Self {
            manager,
            last: Mutex::new(None),
        }
    }

    /// Get the registry manager (shared Arc).
    pub fn manager(&self) -> Arc<ActionRegistryManager> {
        self.manager.clone()
    }

    /// The action `repeatLastAction` would replay.
    pub fn last_action(&self) -> Option<PartialAction> {
        self.last.lock().clone()
    }

    /// Continue `action`, recording it as the last action when it reaches a
    /// handler.
    pub fn continue_action(
        &self,
        action: &PartialAction,
        request_next_arg: impl FnOnce(ArgKind),
    ) -> Continuation {
        if action.key() == ActionKey::RepeatLastAction {
            return self.repeat_last_action(request_next_arg);
        }

        let continuation = continue_partial_action(&self.manager, action, request_next_arg);
        if continuation.is_dispatched() {
            *self.last.lock() = Some(action.clone());
        }
        continuation
    }

    /// Replay the last action.
    pub fn repeat_last_action(&self, request_next_arg: impl FnOnce(ArgKind)) -> Continuation {
        let Some(last) = self.last_action() else {
            tracing::debug!("No last action to repeat");
            return Continuation::Unregistered;
        };
        tracing::debug!("Repeating last action '{}'", last.key());
        continue_partial_action(&self.manager, &last, request_next_arg)
    }
}
