//! The cross-window wire contract: store key names and the one-shot
//! command sub-protocol. Key names and value shapes must match between the
//! control panel (writer) and every display (reader).

use crate::error::Result;
use crate::storage::StoreHandle;

/// Store keys shared by writer and readers.
pub mod keys {
    /// Canonical state, written by the control panel only.
    pub const LOTTERY_STATE: &str = "lottery-state";
    /// Derived display projection, the only key a renderer needs.
    pub const DRAWING_STATE: &str = "drawing-state";

    pub const CMD_START: &str = "start";
    pub const CMD_STOP: &str = "stop";
    pub const CMD_STOP_REDRAW: &str = "stop-redraw";
    pub const CMD_REDRAW_PREFIX: &str = "redraw-request:";
}

/// One-shot imperative commands, distinguished from continuous state
/// projections. A cleared key is not a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StartDraw,
    StopDraw,
    RedrawRequest(String),
    StopRedraw,
}

impl Command {
    pub fn key(&self) -> String {
        match self {
            Command::StartDraw => keys::CMD_START.to_string(),
            Command::StopDraw => keys::CMD_STOP.to_string(),
            Command::RedrawRequest(winner_id) => {
                format!("{}{}", keys::CMD_REDRAW_PREFIX, winner_id)
            }
            Command::StopRedraw => keys::CMD_STOP_REDRAW.to_string(),
        }
    }

    /// Interpret a store change as a command. Removals (`value == None`) are
    /// the clear half of the clear-then-set cycle and never fire.
    pub fn parse(key: &str, value: Option<&str>) -> Option<Command> {
        value?;
        match key {
            keys::CMD_START => Some(Command::StartDraw),
            keys::CMD_STOP => Some(Command::StopDraw),
            keys::CMD_STOP_REDRAW => Some(Command::StopRedraw),
            _ => key
                .strip_prefix(keys::CMD_REDRAW_PREFIX)
                .filter(|id| !id.is_empty())
                .map(|id| Command::RedrawRequest(id.to_string())),
        }
    }
}

/// Sender side of the command sub-protocol.
pub struct CommandChannel {
    handle: StoreHandle,
}

impl CommandChannel {
    pub fn new(handle: StoreHandle) -> Self {
        Self { handle }
    }

    /// Clear the key first so a fresh notification fires even when the new
    /// value equals the previous one.
    pub async fn send(&self, command: &Command) -> Result<()> {
        let key = command.key();
        self.handle.remove(&key).await?;
        self.handle.set(&key, "true").await?;
        tracing::debug!("sent command {:?}", command);
        Ok(())
    }
}
