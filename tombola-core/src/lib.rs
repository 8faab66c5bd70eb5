//! Tombola - core engine for a two-window prize-draw tool
//!
//! An operator control panel owns the canonical lottery state and drives an
//! audience display window through randomized slot-machine animations. The
//! two contexts communicate exclusively through a shared persistent
//! key-value store plus change notifications.

pub mod display;
pub mod error;
pub mod export;
pub mod images;
pub mod lottery;
pub mod pool;
pub mod protocol;
pub mod storage;
pub mod types;

pub use display::{DisplayFrame, DisplayWindow, PrizeGroup, SlotPhase, SlotView};
pub use error::{Result, TombolaError};
pub use lottery::Lottery;
pub use protocol::{keys, Command, CommandChannel};
pub use storage::{SharedStore, StoreHandle, StoreHub};
pub use types::{DisplayProjection, DrawMode, LotteryState, Prize, Winner};

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_panel_bootstrap() {
        let dir = tempdir().unwrap();
        let store = SharedStore::open(&dir.path().join("tombola.db")).await.unwrap();
        let hub = StoreHub::new(store);

        let lottery = Lottery::open(hub.attach()).await.unwrap();
        let prize = lottery.add_prize("Bike", 1, None).await.unwrap();

        let state = lottery.snapshot().await;
        assert_eq!(state.prize(&prize.id).unwrap().name, "Bike");
        assert!(!state.is_global_drawing);
    }
}
