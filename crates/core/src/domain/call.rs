// Call Domain Model
//
// Per-call lifecycle: Idle -> Sent -> {Matched(Success), Matched(Error), TimedOut, ConnectionLost}

use std::fmt;

use super::error::{DomainError, Result};

/// How a matched call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Success,
    Error,
}

/// Call State
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Sent,
    Matched(MatchOutcome),
    TimedOut,
    ConnectionLost,
}

impl CallState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CallState::Idle | CallState::Sent)
    }

    /// Request written to the connection
    pub fn send(self) -> Result<Self> {
        self.transition(CallState::Sent)
    }

    /// Matching response arrived
    pub fn matched(self, outcome: MatchOutcome) -> Result<Self> {
        self.transition(CallState::Matched(outcome))
    }

    pub fn time_out(self) -> Result<Self> {
        self.transition(CallState::TimedOut)
    }

    /// Connection failed; legal before or after the request was written
    pub fn lose_connection(self) -> Result<Self> {
        self.transition(CallState::ConnectionLost)
    }

    fn transition(self, to: CallState) -> Result<Self> {
        let allowed = match (self, to) {
            (CallState::Idle, CallState::Sent) => true,
            (CallState::Idle, CallState::ConnectionLost) => true,
            (CallState::Idle, CallState::TimedOut) => true,
            (CallState::Sent, CallState::Matched(_)) => true,
            (CallState::Sent, CallState::TimedOut) => true,
            (CallState::Sent, CallState::ConnectionLost) => true,
            _ => false,
        };

        if !allowed {
            return Err(DomainError::InvalidStateTransition {
                from: self.to_string(),
                to: to.to_string(),
            });
        }
        Ok(to)
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallState::Idle => write!(f, "IDLE"),
            CallState::Sent => write!(f, "SENT"),
            CallState::Matched(MatchOutcome::Success) => write!(f, "MATCHED_SUCCESS"),
            CallState::Matched(MatchOutcome::Error) => write!(f, "MATCHED_ERROR"),
            CallState::TimedOut => write!(f, "TIMED_OUT"),
            CallState::ConnectionLost => write!(f, "CONNECTION_LOST"),
        }
    }
}
