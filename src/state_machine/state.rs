use std::fmt;

use serde::{Deserialize, Serialize};

use super::outcome::{ReadySignal, SendResult};
use crate::printer::PrinterSnapshot;

/// The four states of the job handoff state machine.
///
/// A job flows through: BUSY → READY → PENDING → INTERACTION → BUSY
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentState {
    /// The printer is mid-job. Also the state used on first run.
    #[default]
    Busy,
    /// Idle with no outstanding request to the backend.
    Ready,
    /// A readiness request is in flight.
    Pending,
    /// The backend offered a job and the printer is showing its confirmation dialog.
    Interaction,
}

impl AgentState {
    #[cfg(test)]
    pub const ALL: [AgentState; 4] = [
        AgentState::Busy,
        AgentState::Ready,
        AgentState::Pending,
        AgentState::Interaction,
    ];
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentState::Busy => write!(f, "BUSY"),
            AgentState::Ready => write!(f, "READY"),
            AgentState::Pending => write!(f, "PENDING"),
            AgentState::Interaction => write!(f, "INTERACTION"),
        }
    }
}

/// The decision taken for one tick, before any outward call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Keep the current state; nothing to call.
    Stay,
    /// Move to another state without calling the backend.
    Advance(AgentState),
    /// Enter PENDING and ask the backend for the next job.
    RequestReadiness,
    /// The operator cleared the dialog; tell the backend to send the job.
    DispatchJob,
}

/// Pure transition logic for the agent.
pub struct StateMachine;

impl StateMachine {
    /// Decide what one tick should do given the current state and a fresh snapshot.
    ///
    /// - `BUSY` becomes `READY` once the printer is idle.
    /// - `READY` with an idle printer asks the backend for work.
    /// - `PENDING` never acts; its request settles within the tick that made it.
    /// - `INTERACTION` waits while the dialog is up, whatever the status says,
    ///   because the firmware reports the dialog itself as busy. Once the
    ///   dialog is cleared it dispatches on an idle printer, and a busy one
    ///   means the job is already running.
    /// - Any other state with a non-idle printer becomes `BUSY`.
    pub fn decide(state: AgentState, snapshot: &PrinterSnapshot) -> Step {
        let idle = snapshot.is_idle();
        let msg = snapshot.message_box_present;

        match state {
            AgentState::Pending => Step::Stay,
            AgentState::Interaction => match (idle, msg) {
                (_, true) => Step::Stay,
                (true, false) => Step::DispatchJob,
                (false, false) => Step::Advance(AgentState::Busy),
            },
            AgentState::Busy if idle => Step::Advance(AgentState::Ready),
            AgentState::Busy => Step::Stay,
            AgentState::Ready if idle => Step::RequestReadiness,
            AgentState::Ready => Step::Advance(AgentState::Busy),
        }
    }

    /// The state a readiness request settles into.
    pub fn after_readiness(signal: ReadySignal) -> AgentState {
        match signal {
            ReadySignal::JobOffered => AgentState::Interaction,
            ReadySignal::NoJob { .. } => AgentState::Ready,
        }
    }

    /// The state a dispatch settles into. A rejection forces a fresh readiness
    /// cycle instead of retrying the send.
    pub fn after_dispatch(result: SendResult) -> AgentState {
        match result {
            SendResult::Dispatched => AgentState::Busy,
            SendResult::Rejected { .. } => AgentState::Ready,
        }
    }
}
