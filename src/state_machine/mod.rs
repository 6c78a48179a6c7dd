mod outcome;
mod state;

pub use outcome::{ReadySignal, SendResult};
pub use state::{AgentState, StateMachine, Step};
