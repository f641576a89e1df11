use newwork_types::{RestartPhase, RestartProgress};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, trace};
use uuid::Uuid;

const PROGRESS_CHANNEL_CAPACITY: usize = 64;

/// Identifies one orchestration run. Transitions carrying a ticket from an
/// abandoned run are rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunTicket {
    pub run_id: Uuid,
    generation: u64,
}

struct PhaseState {
    generation: u64,
    current: RestartProgress,
}

/// The orchestrator's single source of truth for the current phase.
///
/// Every accepted transition is published while the lock is held, so
/// subscribers see progress in the same order the state changed.
pub struct PhaseMachine {
    state: Mutex<PhaseState>,
    tx: broadcast::Sender<RestartProgress>,
}

impl PhaseMachine {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(PROGRESS_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(PhaseState {
                generation: 0,
                current: RestartProgress::idle(),
            }),
            tx,
        }
    }

    /// Starts a run in `phase`. Returns `None` while another run is active.
    pub fn begin(&self, phase: RestartPhase, progress: f64, message: &str) -> Option<RunTicket> {
        let mut state = self.state.lock();
        if state.current.phase.is_active() || !state.current.phase.can_transition_to(phase) {
            return None;
        }

        state.generation += 1;
        let ticket = RunTicket {
            run_id: Uuid::new_v4(),
            generation: state.generation,
        };

        debug!("Restart run {} started in {}", ticket.run_id, phase);
        self.publish(&mut state, RestartProgress::new(ticket.run_id, phase, progress, message));
        Some(ticket)
    }

    pub fn advance(&self, ticket: &RunTicket, phase: RestartPhase, progress: f64, message: &str) -> bool {
        let mut state = self.state.lock();
        if !Self::owns(&state, ticket) || !state.current.phase.can_transition_to(phase) {
            return false;
        }

        let progress = progress.max(state.current.progress);
        self.publish(&mut state, RestartProgress::new(ticket.run_id, phase, progress, message));
        true
    }

    /// Progress update within the current phase.
    pub fn report(&self, ticket: &RunTicket, progress: f64, message: &str) -> bool {
        let mut state = self.state.lock();
        if !Self::owns(&state, ticket) || !state.current.phase.is_active() {
            return false;
        }

        let phase = state.current.phase;
        let progress = progress.max(state.current.progress);
        self.publish(&mut state, RestartProgress::new(ticket.run_id, phase, progress, message));
        true
    }

    pub fn complete(&self, ticket: &RunTicket, message: &str) -> bool {
        self.advance(ticket, RestartPhase::Completed, 1.0, message)
    }

    pub fn fail(&self, ticket: &RunTicket, reason: &str) -> bool {
        let mut state = self.state.lock();
        if !Self::owns(&state, ticket) || !state.current.phase.is_active() {
            return false;
        }

        let progress = state.current.progress;
        self.publish(&mut state, RestartProgress::failed(ticket.run_id, progress, reason));
        true
    }

    /// Resets to idle. An active run gets its single `failed` event and its
    /// ticket stops being honoured. Returns the abandoned run, if any.
    pub fn force_idle(&self, reason: &str) -> Option<Uuid> {
        let mut state = self.state.lock();
        let abandoned = if state.current.phase.is_active() {
            let run_id = state.current.run_id;
            let progress = state.current.progress;
            self.publish(&mut state, RestartProgress::failed(run_id, progress, reason));
            Some(run_id)
        } else {
            None
        };

        state.generation += 1;
        state.current = RestartProgress::idle();
        abandoned
    }

    pub fn phase(&self) -> RestartPhase {
        self.state.lock().current.phase
    }

    pub fn progress(&self) -> RestartProgress {
        self.state.lock().current.clone()
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().current.phase.is_active()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RestartProgress> {
        self.tx.subscribe()
    }

    fn owns(state: &PhaseState, ticket: &RunTicket) -> bool {
        state.generation == ticket.generation && state.current.run_id == ticket.run_id
    }

    fn publish(&self, state: &mut PhaseState, next: RestartProgress) {
        trace!(
            "Restart {} -> {} ({:.0}%)",
            state.current.phase,
            next.phase,
            next.progress * 100.0
        );
        state.current = next.clone();
        let _ = self.tx.send(next);
    }
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}
