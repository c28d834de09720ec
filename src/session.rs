use std::collections::BTreeSet;
use std::num::NonZeroU8;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

use crate::board::{Board, BoardError};
use crate::constraint;
use crate::epoch::Epoch;
use crate::solver;
use crate::view::BoardView;

/// Terminal status of one solve attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveOutcome {
    Solved,
    Unsolvable,
    Cancelled,
}

/// Messages posted by the session towards the view-owning thread. The
/// search thread never touches the view directly; it only sends these.
#[derive(Debug)]
pub enum SolveEvent {
    /// A solve started; the grid must be locked against edits.
    Locked,
    /// Throttled snapshot of the board mid-search.
    Progress(Board),
    /// The givens conflict with each other; the solver never ran. Carries
    /// the full set of offending coordinates.
    Rejected(BTreeSet<(usize, usize)>),
    /// The solve attempt ended; the grid must be unlocked and repainted.
    Finished { outcome: SolveOutcome, board: Board },
}

// Events travel tagged with the epoch value of the attempt that produced
// them. Starting a new solve supersedes the previous one, and the receiver
// drops anything the superseded search still manages to send, so a stale
// terminal event can never unlock the grid under a newer search.
struct Envelope {
    attempt: u64,
    event: SolveEvent,
}

/// Orchestrates one solve attempt at a time: validates givens, runs the
/// search on a background thread, and owns the cancellation epoch.
///
/// Starting a new solve implicitly invalidates any solve already in
/// flight, so at most one search can ever report success.
pub struct SolveSession {
    epoch: Arc<Epoch>,
    // Epoch value of the most recently spawned search; events from older
    // attempts are dropped by the receiver.
    latest_started: Arc<AtomicU64>,
    events: mpsc::Sender<Envelope>,
}

/// Receiving end of the session's event stream, owned by the thread that
/// drives the [BoardView]. Events from a search that has been superseded
/// by a newer `start` are silently discarded.
pub struct SolveEvents {
    latest_started: Arc<AtomicU64>,
    receiver: mpsc::Receiver<Envelope>,
}

impl SolveSession {
    pub fn new() -> (Self, SolveEvents) {
        let (events, receiver) = mpsc::channel();
        let latest_started = Arc::new(AtomicU64::new(0));
        let session = Self {
            epoch: Arc::new(Epoch::new()),
            latest_started: Arc::clone(&latest_started),
            events,
        };
        (
            session,
            SolveEvents {
                latest_started,
                receiver,
            },
        )
    }

    /// Starts a solve over a dense column-major snapshot of the visible
    /// grid (`None` = empty cell).
    ///
    /// Board construction errors are returned synchronously. Conflicting
    /// givens are not an `Err`: they surface as a [SolveEvent::Rejected]
    /// event so the view can flag every offending cell, and the search
    /// thread is never spawned. Otherwise the search runs in the
    /// background and this call returns immediately.
    pub fn start(&self, size: usize, givens: &[Option<NonZeroU8>]) -> Result<(), BoardError> {
        let epoch_snapshot = self.epoch.bump();
        let mut board = Board::from_givens(size, givens)?;

        let conflicts = constraint::find_conflicts(&board);
        if !conflicts.is_empty() {
            debug!("rejecting solve request: {} conflicting givens", conflicts.len());
            let _ = self.events.send(Envelope {
                attempt: epoch_snapshot,
                event: SolveEvent::Rejected(conflicts),
            });
            return Ok(());
        }

        let num_givens = board.size() * board.size() - board.num_empty();
        debug!("starting solve: size={size}, givens={num_givens}");
        self.latest_started.store(epoch_snapshot, Ordering::Relaxed);
        let _ = self.events.send(Envelope {
            attempt: epoch_snapshot,
            event: SolveEvent::Locked,
        });

        let epoch = Arc::clone(&self.epoch);
        let events = self.events.clone();
        thread::spawn(move || {
            let solved = solver::solve(&mut board, &epoch, epoch_snapshot, &mut |snapshot| {
                let _ = events.send(Envelope {
                    attempt: epoch_snapshot,
                    event: SolveEvent::Progress(snapshot.clone()),
                });
            });

            // `false` alone can't tell an exhausted search from a
            // cancelled one; the epoch disambiguates. Cancellation wins
            // even if the search had just run out of candidates.
            let outcome = if epoch.current() != epoch_snapshot {
                SolveOutcome::Cancelled
            } else if solved {
                debug_assert!(constraint::is_solved(&board));
                SolveOutcome::Solved
            } else {
                SolveOutcome::Unsolvable
            };
            debug!("solve finished: {outcome:?}");
            let _ = events.send(Envelope {
                attempt: epoch_snapshot,
                event: SolveEvent::Finished { outcome, board },
            });
        });

        Ok(())
    }

    /// Requests cancellation of the in-flight search. Non-blocking; the
    /// search observes the epoch change on its own schedule, at its next
    /// cell visit.
    pub fn cancel(&self) {
        self.epoch.bump();
        debug!("cancel requested");
    }
}

impl Drop for SolveSession {
    fn drop(&mut self) {
        // Leave no search running for a session nobody can observe.
        self.epoch.bump();
    }
}

impl SolveEvents {
    pub fn try_recv(&self) -> Option<SolveEvent> {
        loop {
            let envelope = self.receiver.try_recv().ok()?;
            if let Some(event) = self.accept(envelope) {
                return Some(event);
            }
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<SolveEvent> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let envelope = self.receiver.recv_timeout(remaining).ok()?;
            if let Some(event) = self.accept(envelope) {
                return Some(event);
            }
        }
    }

    // A rejection never spawned a search and always reaches the view; any
    // other event is only valid while its attempt is still the latest one
    // started. A plain cancel doesn't start anything, so the cancelled
    // search still delivers its terminal event and unlocks the grid.
    fn accept(&self, envelope: Envelope) -> Option<SolveEvent> {
        match &envelope.event {
            SolveEvent::Rejected(_) => Some(envelope.event),
            _ if envelope.attempt == self.latest_started.load(Ordering::Relaxed) => {
                Some(envelope.event)
            }
            _ => None,
        }
    }

    /// Drains all pending events and applies them to the view. Returns the
    /// terminal search outcome if one was seen. A rejected-givens event is
    /// reported through [BoardView::report_validation_failure] and yields
    /// no outcome.
    pub fn pump(&self, view: &mut impl BoardView) -> Option<SolveOutcome> {
        let mut terminal = None;
        while let Some(event) = self.try_recv() {
            match event {
                SolveEvent::Locked => view.set_editable(false),
                SolveEvent::Progress(board) => view.render(&board),
                SolveEvent::Rejected(conflicts) => {
                    view.flag_invalid(&conflicts);
                    view.report_validation_failure();
                }
                SolveEvent::Finished { outcome, board } => {
                    view.render(&board);
                    view.set_editable(true);
                    if outcome == SolveOutcome::Unsolvable {
                        view.report_unsolvable();
                    }
                    // Cancellation stays silent, a solved grid speaks for
                    // itself.
                    terminal = Some(outcome);
                }
            }
        }
        terminal
    }
}
