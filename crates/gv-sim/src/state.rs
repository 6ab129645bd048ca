//! Clock state machine and the transition handshake.

use std::collections::HashMap;
use std::sync::{Condvar, Mutex};

use crate::error::{SimError, SimResult};

/// The clock's externally visible states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimState {
    /// No compiled graph, simulation time zero. The only state in which
    /// topology edits are allowed.
    #[default]
    Reset,
    /// The worker is advancing the clock.
    Running,
    /// The clock is paused; the compiled graph and state are retained.
    Stopped,
}

impl std::fmt::Display for SimState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SimState::Reset => "reset",
            SimState::Running => "running",
            SimState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Default)]
struct Inner {
    current: SimState,
    requested: Option<Request>,
    /// Outcomes of finished requests, keyed by sequence number until the
    /// requester collects its own. Two concurrent requesters must each see
    /// the acknowledgement of their own transition, not the other's.
    finished: HashMap<u64, Outcome>,
    next_seq: u64,
}

#[derive(Debug, Clone, Copy)]
struct Request {
    seq: u64,
    target: SimState,
}

#[derive(Debug)]
struct Outcome {
    reached: SimState,
    error: Option<SimError>,
}

/// Request/acknowledge cell between callers and the clock worker.
///
/// A caller publishes a desired state and blocks until the worker applies
/// the transition (or refuses it with an error). Only one transition is
/// pending at a time; a second caller waits for the first to drain.
#[derive(Debug, Default)]
pub struct StateCell {
    inner: Mutex<Inner>,
    cv: Condvar,
}

impl StateCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> SimState {
        self.inner.lock().unwrap().current
    }

    /// Block until the worker acknowledges `target`. Returns the state the
    /// machine actually reached, which differs from `target` when the worker
    /// refuses the transition (a failed compile leaves it in Reset).
    pub fn request(&self, target: SimState) -> SimResult<SimState> {
        let mut g = self.inner.lock().unwrap();
        while g.requested.is_some() {
            g = self.cv.wait(g).unwrap();
        }
        let seq = g.next_seq;
        g.next_seq += 1;
        g.requested = Some(Request { seq, target });
        self.cv.notify_all();
        loop {
            if let Some(outcome) = g.finished.remove(&seq) {
                return match outcome.error {
                    Some(e) => Err(e),
                    None => Ok(outcome.reached),
                };
            }
            g = self.cv.wait(g).unwrap();
        }
    }

    /// Worker side: peek the pending transition request, if any.
    pub fn take_request(&self) -> Option<SimState> {
        // The request stays posted until acknowledge(); peeking keeps the
        // caller blocked while the worker works on it.
        self.inner.lock().unwrap().requested.map(|r| r.target)
    }

    /// Worker side: finish the pending transition, waking the requester.
    pub fn acknowledge(&self, reached: SimState, error: Option<SimError>) {
        let mut g = self.inner.lock().unwrap();
        g.current = reached;
        if let Some(req) = g.requested.take() {
            g.finished.insert(req.seq, Outcome { reached, error });
        }
        self.cv.notify_all();
    }

    /// Worker side: transition without a pending request (auto-stop on run
    /// duration or step-count exhaustion).
    pub fn publish(&self, state: SimState) {
        let mut g = self.inner.lock().unwrap();
        g.current = state;
        self.cv.notify_all();
    }
}
