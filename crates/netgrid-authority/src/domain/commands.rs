//! Commands for the Command Execution Authority.

use netgrid_core::command::Command;
use uuid::Uuid;

/// Command to execute a catalog command for a player.
#[derive(Debug, Clone)]
pub struct ExecuteCommand {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The invoking player (supplied by the gateway, never the body).
    pub player_id: Uuid,
    /// The catalog command to run.
    pub command_id: String,
    /// Caller-generated idempotency token, unique per logical attempt.
    pub trace_id: String,
}

impl Command for ExecuteCommand {
    fn command_type(&self) -> &'static str {
        "authority.execute_command"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to buy a lesson, unlocking a catalog command.
#[derive(Debug, Clone)]
pub struct PurchaseLesson {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The purchasing player.
    pub player_id: Uuid,
    /// The command the lesson teaches.
    pub command_id: String,
}

impl Command for PurchaseLesson {
    fn command_type(&self) -> &'static str {
        "authority.purchase_lesson"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to create a player account on first authentication.
#[derive(Debug, Clone)]
pub struct EnrollPlayer {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The enrolling player.
    pub player_id: Uuid,
    /// Display handle.
    pub handle: String,
}

impl Command for EnrollPlayer {
    fn command_type(&self) -> &'static str {
        "authority.enroll_player"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
