//! Error types for chaser-motor

use chaser_core::Command;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Command '{0}' timed out")]
    Timeout(Command),

    #[error("Command '{command}' rejected with HTTP {status}")]
    Status { command: Command, status: u16 },

    #[error("Command '{command}' transport error: {reason}")]
    Transport { command: Command, reason: String },
}

impl DeliveryError {
    pub fn command(&self) -> Command {
        match self {
            DeliveryError::Timeout(command) => *command,
            DeliveryError::Status { command, .. } => *command,
            DeliveryError::Transport { command, .. } => *command,
        }
    }

    pub(crate) fn from_reqwest(command: Command, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DeliveryError::Timeout(command)
        } else {
            DeliveryError::Transport {
                command,
                reason: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_error_display() {
        assert_eq!(
            DeliveryError::Timeout(Command::Stop).to_string(),
            "Command 'stop' timed out"
        );
        let err = DeliveryError::Status {
            command: Command::LedOn,
            status: 404,
        };
        assert_eq!(err.to_string(), "Command 'led=on' rejected with HTTP 404");
    }

    #[test]
    fn test_delivery_error_command() {
        let err = DeliveryError::Transport {
            command: Command::Left,
            reason: "connection refused".to_string(),
        };
        assert_eq!(err.command(), Command::Left);
    }
}
