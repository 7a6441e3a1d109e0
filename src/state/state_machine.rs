use thiserror::Error;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Every question answered correctly.
    Completed,
    /// An incorrect answer; one mistake ends the game.
    WrongAnswer,
    /// The per-question countdown ran out.
    TimeExpired,
}

/// Lifecycle phase of a game session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session running; a game can be started.
    Idle,
    /// Questions are being fetched from the supplier.
    Loading,
    /// The player is answering questions against the clock.
    InProgress,
    /// The session ended; the final scoreboard is shown.
    GameOver(EndReason),
    /// The supplier failed; the session is inert until an external retry.
    Failed,
}

/// Events that drive the session lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Player asked to start (or restart) a game.
    StartRequested,
    /// The supplier delivered a question batch.
    QuestionsLoaded,
    /// The supplier failed.
    LoadFailed,
    /// Gameplay ended for the given reason.
    Finish(EndReason),
}

/// Error returned when an event cannot be applied in the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event arrived.
    pub from: SessionPhase,
    /// The event that cannot be applied from this phase.
    pub event: SessionEvent,
}

/// Point-in-time view of the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase.
    pub phase: SessionPhase,
    /// Transition counter; increments on each applied event.
    pub version: usize,
}

/// State machine enforcing the session lifecycle.
///
/// Exactly one `Finish` can ever be applied per playthrough: once the phase
/// is `GameOver`, a second ending path (e.g. the clock racing a wrong
/// answer) is rejected as an invalid transition and must be dropped by the
/// caller.
#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    phase: SessionPhase,
    version: usize,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            version: 0,
        }
    }
}

impl SessionStateMachine {
    /// Create a state machine initialised in the idle phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase.clone()
    }

    /// Create a snapshot of the current state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase.clone(),
            version: self.version,
        }
    }

    /// Apply an event, returning the phase it moved the machine into.
    pub fn apply(&mut self, event: SessionEvent) -> Result<SessionPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next.clone();
        self.version += 1;
        Ok(next)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: SessionEvent) -> Result<SessionPhase, InvalidTransition> {
        let next = match (self.phase.clone(), event) {
            // A start request from any resting phase resets the session.
            (SessionPhase::Idle, SessionEvent::StartRequested) => SessionPhase::Loading,
            (SessionPhase::Failed, SessionEvent::StartRequested) => SessionPhase::Loading,
            (SessionPhase::GameOver(_), SessionEvent::StartRequested) => SessionPhase::Loading,
            (SessionPhase::Loading, SessionEvent::QuestionsLoaded) => SessionPhase::InProgress,
            (SessionPhase::Loading, SessionEvent::LoadFailed) => SessionPhase::Failed,
            (SessionPhase::InProgress, SessionEvent::Finish(reason)) => {
                SessionPhase::GameOver(reason)
            }
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut SessionStateMachine, event: SessionEvent) -> SessionPhase {
        sm.apply(event).unwrap()
    }

    #[test]
    fn initial_state_is_idle() {
        let sm = SessionStateMachine::new();
        assert_eq!(sm.phase(), SessionPhase::Idle);
    }

    #[test]
    fn full_happy_path_through_session() {
        let mut sm = SessionStateMachine::new();

        assert_eq!(
            apply(&mut sm, SessionEvent::StartRequested),
            SessionPhase::Loading
        );
        assert_eq!(
            apply(&mut sm, SessionEvent::QuestionsLoaded),
            SessionPhase::InProgress
        );
        assert_eq!(
            apply(&mut sm, SessionEvent::Finish(EndReason::Completed)),
            SessionPhase::GameOver(EndReason::Completed)
        );
        assert_eq!(
            apply(&mut sm, SessionEvent::StartRequested),
            SessionPhase::Loading
        );
    }

    #[test]
    fn supplier_failure_leads_to_failed_and_retry_reloads() {
        let mut sm = SessionStateMachine::new();
        apply(&mut sm, SessionEvent::StartRequested);

        assert_eq!(apply(&mut sm, SessionEvent::LoadFailed), SessionPhase::Failed);
        assert_eq!(
            apply(&mut sm, SessionEvent::StartRequested),
            SessionPhase::Loading
        );
    }

    #[test]
    fn only_one_finish_is_accepted() {
        let mut sm = SessionStateMachine::new();
        apply(&mut sm, SessionEvent::StartRequested);
        apply(&mut sm, SessionEvent::QuestionsLoaded);
        apply(&mut sm, SessionEvent::Finish(EndReason::WrongAnswer));

        let err = sm.apply(SessionEvent::Finish(EndReason::TimeExpired)).unwrap_err();
        assert_eq!(err.from, SessionPhase::GameOver(EndReason::WrongAnswer));
        assert_eq!(err.event, SessionEvent::Finish(EndReason::TimeExpired));
    }

    #[test]
    fn finish_requires_a_running_session() {
        let mut sm = SessionStateMachine::new();
        let err = sm
            .apply(SessionEvent::Finish(EndReason::Completed))
            .unwrap_err();
        assert_eq!(err.from, SessionPhase::Idle);
    }

    #[test]
    fn version_counts_applied_transitions() {
        let mut sm = SessionStateMachine::new();
        apply(&mut sm, SessionEvent::StartRequested);
        apply(&mut sm, SessionEvent::QuestionsLoaded);

        assert_eq!(sm.snapshot().version, 2);

        // Rejected events leave the version untouched.
        let _ = sm.apply(SessionEvent::QuestionsLoaded);
        assert_eq!(sm.snapshot().version, 2);
    }
}
