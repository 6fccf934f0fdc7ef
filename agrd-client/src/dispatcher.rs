//! Debounced query dispatcher
//!
//! Owns the search input and turns keystrokes into at most one backend call
//! per quiet window. State machine:
//!
//! ```text
//! Idle --input--> Pending(q) --quiet window--> Loading(q) --response--> Settled(q, results)
//!   ^                |  ^                          |
//!   +--blank/dismiss-+  +---------input------------+
//! ```
//!
//! Every input change and every dismissal bumps a generation counter. A timer
//! or response belonging to an older generation does nothing, so the results
//! on screen always belong to the last query that was sent for the current
//! input. A new keystroke aborts the pending timer but never an in-flight
//! call; that call finds its generation stale when it resolves and drops its
//! answer.
//!
//! Observers follow [`Snapshot`]s through a `tokio::sync::watch` channel.

use agrd_common::{GameSummary, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::backend::SearchBackend;
use crate::selection::SelectionStore;

/// Default quiet window before a search is sent
pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_millis(600);

/// Where the dispatcher stands for the current input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// No query (blank input or dismissed)
    Idle,
    /// Waiting for the quiet window to pass
    Pending { query: String },
    /// Search sent, waiting for the answer
    Loading { query: String },
    /// Answer received for `query`
    Settled {
        query: String,
        results: Vec<GameSummary>,
    },
}

/// What an observer renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub input: String,
    pub generation: u64,
    pub phase: Phase,
    /// Non-fatal message from the last failed search
    pub notice: Option<String>,
}

impl Snapshot {
    /// Results to display; empty outside `Settled`
    pub fn results(&self) -> &[GameSummary] {
        match &self.phase {
            Phase::Settled { results, .. } => results,
            _ => &[],
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading { .. })
    }
}

struct Machine {
    input: String,
    generation: u64,
    phase: Phase,
    notice: Option<String>,
    /// Pending debounce timer; cleared once the search is in flight
    timer: Option<JoinHandle<()>>,
}

impl Machine {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            input: self.input.clone(),
            generation: self.generation,
            phase: self.phase.clone(),
            notice: self.notice.clone(),
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

struct Shared {
    backend: Arc<dyn SearchBackend>,
    quiet_window: Duration,
    machine: Mutex<Machine>,
    view_tx: watch::Sender<Snapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Machine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, machine: &Machine) {
        self.view_tx.send_replace(machine.snapshot());
    }
}

/// Debounced search front end over a [`SearchBackend`]
///
/// Cheap to clone; clones drive the same state. Must be used inside a Tokio
/// runtime since timers are spawned tasks.
#[derive(Clone)]
pub struct Dispatcher {
    shared: Arc<Shared>,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self::with_quiet_window(backend, DEFAULT_QUIET_WINDOW)
    }

    pub fn with_quiet_window(backend: Arc<dyn SearchBackend>, quiet_window: Duration) -> Self {
        let machine = Machine {
            input: String::new(),
            generation: 0,
            phase: Phase::Idle,
            notice: None,
            timer: None,
        };
        let (view_tx, _) = watch::channel(machine.snapshot());

        Self {
            shared: Arc::new(Shared {
                backend,
                quiet_window,
                machine: Mutex::new(machine),
                view_tx,
            }),
        }
    }

    pub fn quiet_window(&self) -> Duration {
        self.shared.quiet_window
    }

    /// Replace the input text (one keystroke)
    ///
    /// Blank text goes straight to `Idle` with no network call. Anything else
    /// restarts the quiet window.
    pub fn set_input(&self, text: impl Into<String>) {
        let text = text.into();
        let mut machine = self.shared.lock();

        machine.generation += 1;
        machine.cancel_timer();
        machine.notice = None;
        machine.input = text.clone();

        if text.trim().is_empty() {
            machine.phase = Phase::Idle;
        } else {
            machine.phase = Phase::Pending {
                query: text.clone(),
            };
            let generation = machine.generation;
            let shared = Arc::clone(&self.shared);
            machine.timer = Some(tokio::spawn(run_search(shared, generation, text)));
        }

        self.shared.publish(&machine);
    }

    /// Hide results (focus lost, click elsewhere)
    ///
    /// Keeps the input text. A search already in flight runs to completion and
    /// its answer is dropped.
    pub fn dismiss(&self) {
        let mut machine = self.shared.lock();
        machine.generation += 1;
        machine.cancel_timer();
        machine.phase = Phase::Idle;
        machine.notice = None;
        self.shared.publish(&machine);
    }

    /// Move result `index` into `store`, then clear the input
    ///
    /// Returns the picked game, or `None` when no settled result has that
    /// index. The input is cleared even if persisting the backlog fails; the
    /// error is still returned.
    pub fn pick(&self, index: usize, store: &mut SelectionStore) -> Result<Option<GameSummary>> {
        let picked = self.snapshot().results().get(index).cloned();
        let Some(game) = picked else {
            return Ok(None);
        };

        let added = store.add(game.clone());
        self.set_input("");
        added.map(|_| Some(game))
    }

    /// Current state
    pub fn snapshot(&self) -> Snapshot {
        self.shared.view_tx.borrow().clone()
    }

    /// Follow state changes
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.shared.view_tx.subscribe()
    }
}

/// Debounce timer body for one generation
async fn run_search(shared: Arc<Shared>, generation: u64, query: String) {
    tokio::time::sleep(shared.quiet_window).await;

    {
        let mut machine = shared.lock();
        if machine.generation != generation {
            return;
        }
        machine.phase = Phase::Loading {
            query: query.clone(),
        };
        // In flight from here on; later keystrokes must not abort the call
        machine.timer = None;
        shared.publish(&machine);
    }

    debug!(generation, query = %query, "Dispatching search");
    let outcome = shared.backend.search(&query).await;

    let mut machine = shared.lock();
    if machine.generation != generation {
        debug!(
            generation,
            current = machine.generation,
            "Dropping answer for superseded query"
        );
        return;
    }

    match outcome {
        Ok(results) => {
            debug!(generation, count = results.len(), "Search settled");
            machine.notice = None;
            machine.phase = Phase::Settled { query, results };
        }
        Err(e) => {
            warn!(generation, error = %e, "Search failed");
            machine.notice = Some(format!("Search failed: {}", e));
            machine.phase = Phase::Settled {
                query,
                results: Vec::new(),
            };
        }
    }
    shared.publish(&machine);
}
