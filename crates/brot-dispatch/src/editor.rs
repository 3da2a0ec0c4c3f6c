//! Editor contributor.
//!
//! Attaches a set of editor commands to the registry manager. Every command
//! doubles as its own disablement check: it is run in [`CommandMode::DryRun`]
//! with no arguments, and the action is disabled exactly when that dry run
//! reports it cannot execute.

use std::collections::HashMap;
use std::sync::Arc;

use brot_core::{ActionKey, ArgValue, ArgsFilter};

use crate::registry::{ActionRegistry, ActionRegistryManager, Completion, DisabledRegistry};

/// Whether an editor command should apply its change or only report if it could.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandMode {
    Run,
    DryRun,
}

/// An editor command. Returns `true` if it ran (or, in a dry run, could run).
///
/// Dry runs may receive fewer arguments than the signature declares.
pub type EditorCommand<E> = Arc<dyn Fn(&E, &[ArgValue], CommandMode) -> bool + Send + Sync>;

/// Commands an editor surface contributes, by action key.
pub struct EditorActions<E> {
    commands: HashMap<ActionKey, EditorCommand<E>>,
}

impl<E> Default for EditorActions<E> {
    fn default() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }
}

impl<E> EditorActions<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(mut self, key: ActionKey, command: F) -> Self
    where
        F: Fn(&E, &[ArgValue], CommandMode) -> bool + Send + Sync + 'static,
    {
        self.commands.insert(key, Arc::new(command));
        self
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Attach `actions`, bound to `editor`, to the manager.
pub fn add_editor_actions<E>(
    manager: &ActionRegistryManager,
    editor: Arc<E>,
    actions: EditorActions<E>,
) where
    E: Send + Sync + 'static,
{
    let mut registry = ActionRegistry::new();
    let mut disabled = DisabledRegistry::new();

    for (key, command) in actions.commands {
        let run_editor = editor.clone();
        let run = command.clone();
        registry.insert(
            key,
            Arc::new(move |args: &[ArgValue]| {
                Completion::from(run(&*run_editor, args, CommandMode::Run))
            }),
        );

        let check_editor = editor.clone();
        disabled.insert(
            key,
            Arc::new(move || {
                if command(&*check_editor, &[], CommandMode::DryRun) {
                    ArgsFilter::never_match()
                } else {
                    ArgsFilter::always_match()
                }
            }),
        );
    }

    tracing::debug!("Attaching {} editor action(s)", registry.len());
    manager.add(registry, Some(disabled));
}
