//! Connection lifecycle of the agent.
//!
//! ```text
//!  Disconnected ──Dial──▶ Connecting ──SignupSent──▶ AwaitingAck
//!       ▲                     │                          │
//!       │                     │                        Acked(id)
//!       │                     │                          ▼
//!       └──────── Lost ───────┴──────── Lost ───────  Registered
//! ```

use shared_types::ValidatorId;

/// Where the agent is in its session with the hub.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AgentState {
    #[default]
    Disconnected,
    Connecting,
    AwaitingAck,
    Registered { validator_id: ValidatorId },
}

/// Events that move the agent between states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    Dial,
    SignupSent,
    Acked(ValidatorId),
    /// Socket closed, failed, or the ack never came.
    Lost,
}

impl AgentState {
    /// Next state, or `None` if `event` is not valid here.
    pub fn on(&self, event: AgentEvent) -> Option<AgentState> {
        match (self, event) {
            (AgentState::Disconnected, AgentEvent::Dial) => Some(AgentState::Connecting),
            (AgentState::Connecting, AgentEvent::SignupSent) => Some(AgentState::AwaitingAck),
            (AgentState::AwaitingAck, AgentEvent::Acked(validator_id)) => {
                Some(AgentState::Registered { validator_id })
            }
            (_, AgentEvent::Lost) => Some(AgentState::Disconnected),
            _ => None,
        }
    }

    pub fn validator_id(&self) -> Option<&ValidatorId> {
        match self {
            AgentState::Registered { validator_id } => Some(validator_id),
            _ => None,
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, AgentState::Registered { .. })
    }
}
