//! The interactive loop.
//!
//! Reads one command per line. Anything that needs an argument prompts for it
//! on the following line, offering the closed set of values when the kind has
//! one.

use std::io::BufRead;
use std::sync::Arc;

use brot_core::{
    ActionKey, ActionsConfig, ArgKind, MatchedPaletteAction, PartialAction, RawPartialAction,
};
use brot_dispatch::{ActionRegistryManager, Continuation, Dispatcher, KeyChord, ShortcutMap};
use brot_palette::{
    palette_session, InMemoryBackend, PaletteBackend, PaletteSession, TagSuggestions,
    TimeoutBackend,
};
use tokio::runtime::Runtime;

use crate::demo::{self, DemoEditor, Workspace};

/// Palette opened at startup.
const MAIN_PALETTE: &str = "main";

/// Number of palette results shown per query.
const PAGE_SIZE: u32 = 10;

const HELP: &str = "\
commands:
  ? <query>       search the open palette
  run <n>         run result n of the last search
  open <palette>  open another palette
  do <key> [args] run an action by name
  key <chord>     press a shortcut, e.g. `key ctrl b`
  !               repeat the last action
  tag <text>      complete the tag at the end of <text>
  select          toggle the editor selection
  evict           drop the palette session on the index side
  status          show window and session state
  quit";

pub struct Shell {
    runtime: Runtime,
    backend: Arc<TimeoutBackend<InMemoryBackend>>,
    dispatcher: Dispatcher,
    shortcuts: ShortcutMap,
    palette: PaletteSession,
    tags: TagSuggestions,
    results: Vec<MatchedPaletteAction>,
    workspace: Arc<Workspace>,
    editor: Arc<DemoEditor>,
}

impl Shell {
    pub fn new(runtime: Runtime, config: ActionsConfig) -> Self {
        let manager = Arc::new(ActionRegistryManager::new());
        let workspace = Arc::new(Workspace::default());
        let editor = Arc::new(DemoEditor::new("hello brot"));
        demo::add_workspace_actions(&manager, workspace.clone());
        demo::add_demo_editor(&manager, editor.clone());
        tracing::info!("Registered {} action handler(s)", manager.handler_count());

        let shortcuts = ShortcutMap::from_config(&config);
        tracing::info!("Loaded {} shortcut(s)", shortcuts.binding_count());

        let backend = Arc::new(TimeoutBackend::new(
            InMemoryBackend::new(config)
                .with_notes(demo::sample_notes()),
        ));
        let remote: Arc<dyn PaletteBackend> = backend.clone();

        Self {
            runtime,
            palette: palette_session(remote.clone(), MAIN_PALETTE, &manager),
            tags: TagSuggestions::new(remote),
            backend,
            dispatcher: Dispatcher::new(manager),
            shortcuts,
            results: Vec::new(),
            workspace,
            editor,
        }
    }

    /// Run until `quit` or end of input.
    pub fn run(&mut self, input: &mut impl BufRead) {
        println!("{}", HELP);
        while let Some(line) = read_line(input) {
            if !self.handle(&line, input) {
                break;
            }
        }
        self.shutdown();
    }

    /// Handle one command. Returns `false` to stop.
    pub fn handle(&mut self, line: &str, input: &mut impl BufRead) -> bool {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match command {
            "" => {}
            "?" => self.search(rest),
            "run" => match rest.parse::<usize>() {
                Ok(n) => self.run_result(n, input),
                Err(_) => println!("usage: run <n>"),
            },
            "open" if !rest.is_empty() => self.open_palette(rest),
            "do" => self.run_named(rest, input),
            "key" => self.press(rest, input),
            "!" => self.run_action(PartialAction::new(ActionKey::RepeatLastAction), input),
            "tag" => self.complete_tag(rest),
            "select" => {
                let mut selected = self.editor.selected.lock();
                *selected = !*selected;
                println!("selection {}", if *selected { "on" } else { "off" });
            }
            "evict" => self.evict(),
            "status" => self.status(),
            "help" => println!("{}", HELP),
            "quit" | "exit" => return false,
            _ => println!("unknown command: {}", command),
        }
        true
    }

    // =========================================================================
    // Palette
    // =========================================================================

    fn search(&mut self, query: &str) {
        match self
            .runtime
            .block_on(self.palette.search(query, 0..PAGE_SIZE))
        {
            Ok(results) => {
                for (n, matched) in results.iter().enumerate() {
                    let entry = &matched.payload;
                    println!(
                        "{:>3}  {}{}  ({})",
                        n,
                        entry
                            .icon
                            .as_deref()
                            .map(|icon| format!("[{}] ", icon))
                            .unwrap_or_default(),
                        highlight(&entry.title, &matched.indices),
                        entry.action.key
                    );
                }
                if results.is_empty() {
                    println!("no results");
                }
                self.results = results;
            }
            Err(e) => {
                tracing::error!("Palette search failed: {}", e);
                println!("search failed: {}", e);
            }
        }
    }

    fn open_palette(&mut self, key: &str) {
        if let Err(e) = self.runtime.block_on(self.palette.close()) {
            tracing::warn!("Failed to close palette: {}", e);
        }
        let remote: Arc<dyn PaletteBackend> = self.backend.clone();
        self.palette = palette_session(remote, key, &self.dispatcher.manager());
        self.results.clear();
        println!("opened palette '{}'", key);
    }

    fn run_result(&mut self, n: usize, input: &mut impl BufRead) {
        let Some(matched) = self.results.get(n) else {
            println!("no result {}", n);
            return;
        };
        let raw = matched.payload.action.clone();
        self.run_raw(&raw, input);
    }

    fn evict(&mut self) {
        match self.palette.id() {
            Some(id) if self.backend.inner().evict(id) => {
                println!("evicted session {}; the next search recovers", id)
            }
            _ => println!("no live palette session"),
        }
    }

    fn complete_tag(&mut self, text: &str) {
        let caret = text.chars().count();
        match self.runtime.block_on(self.tags.search(text, caret)) {
            Ok(suggestions) if suggestions.is_empty() => println!("no suggestions"),
            Ok(suggestions) => {
                for suggestion in suggestions {
                    println!(
                        "  {}  -> {:?} (caret {})",
                        highlight(&suggestion.display, &suggestion.indices),
                        suggestion.text,
                        suggestion.caret
                    );
                }
            }
            Err(e) => println!("suggestions failed: {}", e),
        }
    }

    // =========================================================================
    // Actions
    // =========================================================================

    fn run_named(&mut self, rest: &str, input: &mut impl BufRead) {
        let mut words = rest.split_whitespace();
        let Some(key) = words.next() else {
            println!("usage: do <key> [args]");
            return;
        };
        let raw = RawPartialAction::new(key, words.map(str::to_string).collect());
        self.run_raw(&raw, input);
    }

    fn press(&mut self, chord: &str, input: &mut impl BufRead) {
        let chord = match chord.parse::<KeyChord>() {
            Ok(chord) => chord,
            Err(e) => {
                println!("{}", e);
                return;
            }
        };
        match self.shortcuts.resolve(&chord) {
            Some(action) => self.run_action(action, input),
            None => println!("'{}' is not bound", chord),
        }
    }

    fn run_raw(&mut self, raw: &RawPartialAction, input: &mut impl BufRead) {
        match PartialAction::try_from(raw) {
            Ok(action) => self.run_action(action, input),
            Err(e) => println!("invalid action: {}", e),
        }
    }

    /// Continue `action`, prompting for arguments until it dispatches.
    fn run_action(&mut self, mut action: PartialAction, input: &mut impl BufRead) {
        loop {
            match self.dispatcher.continue_action(&action, |_| {}) {
                Continuation::NeedsArg(kind) => {
                    let Some(raw) = prompt(kind, input) else {
                        println!("cancelled");
                        return;
                    };
                    if let Err(e) = action.push_raw(&raw) {
                        println!("{}", e);
                        return;
                    }
                }
                Continuation::Dispatched(completion) => {
                    if !self.runtime.block_on(completion.wait()) {
                        println!("'{}' is not applicable right now", action.key());
                    }
                    break;
                }
                Continuation::Unregistered => {
                    println!("nothing to do for '{}'", action.key());
                    return;
                }
            }
        }

        let requested = self.workspace.requested_palette.lock().take();
        if let Some(key) = requested {
            self.open_palette(&key);
        }
    }

    fn status(&self) {
        println!("route:   {}", self.workspace.route.lock());
        println!("title:   {}", self.workspace.title.lock());
        println!("pinned:  {:?}", self.workspace.pinned.lock());
        println!("doc:     {}", self.editor.text.lock());
        println!(
            "palette: {} {:?}",
            self.palette.source().palette_key(),
            self.palette.state()
        );
        println!("tags:    {:?}", self.tags.session().state());
        match self.dispatcher.last_action() {
            Some(last) => println!("last:    {:?}", last.to_raw()),
            None => println!("last:    none"),
        }
    }

    fn shutdown(&mut self) {
        if let Err(e) = self.runtime.block_on(self.palette.close()) {
            tracing::warn!("Failed to close palette: {}", e);
        }
        if let Err(e) = self.runtime.block_on(self.tags.stop()) {
            tracing::warn!("Failed to close tag suggester: {}", e);
        }
        tracing::info!(
            "Shell stopped, {} session(s) still open",
            self.backend.inner().session_count()
        );
    }
}

fn read_line(input: &mut impl BufRead) -> Option<String> {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        Err(e) => {
            tracing::error!("Failed to read input: {}", e);
            None
        }
    }
}

fn prompt(kind: ArgKind, input: &mut impl BufRead) -> Option<String> {
    match kind.choices() {
        Some(choices) => println!("{} ({}):", kind, choices.join("/")),
        None => println!("{}:", kind),
    }
    read_line(input)
}

/// Wrap matched chars in brackets.
fn highlight(text: &str, indices: &[u32]) -> String {
    text.chars()
        .enumerate()
        .map(|(i, c)| {
            if indices.contains(&(i as u32)) {
                format!("[{}]", c)
            } else {
                c.to_string()
            }
        })
        .collect()
}
