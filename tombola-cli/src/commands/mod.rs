mod display;
mod draw;
mod event;
mod export;
mod prize;

pub use display::run_display;
pub use draw::{handle_draw_command, DrawCommands};
pub use event::{handle_event_command, EventCommands};
pub use export::handle_export;
pub use prize::{handle_prize_command, PrizeCommands};

use tombola_core::{keys, LotteryState, Result, StoreHub};

/// Read-only state load for commands that must not disturb a live draw
/// owned by another panel process.
pub(crate) async fn load_state(hub: &StoreHub) -> Result<LotteryState> {
    let handle = hub.attach();
    match handle.get(keys::LOTTERY_STATE).await? {
        Some(raw) => match serde_json::from_str(&raw) {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::warn!("stored state is malformed: {}", e);
                Ok(LotteryState::default())
            }
        },
        None => Ok(LotteryState::default()),
    }
}
