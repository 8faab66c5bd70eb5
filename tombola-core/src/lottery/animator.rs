//! The draw animator: a repeating sampler that publishes animated values
//! for winner slots while a draw or redraw is running.
//!
//! Ticks write only while the machine lock is held and only while their
//! epoch is current. Stop paths bump the epoch under the same lock, so once
//! a stop returns no late tick can overwrite the committed final values.

use super::LotteryInner;
use crate::pool;
use std::sync::Weak;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub(crate) enum AnimationTarget {
    AllSlots,
    Slot(String),
}

/// The pool is snapshotted by the caller when the animation starts; ticks
/// sample with replacement across slots within the same tick.
pub(crate) fn spawn(
    inner: Weak<LotteryInner>,
    epoch: u64,
    pool: Vec<String>,
    target: AnimationTarget,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let Some(strong) = inner.upgrade() else {
            return;
        };
        let mut ticker = tokio::time::interval(strong.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        drop(strong);

        loop {
            ticker.tick().await;

            let Some(inner) = inner.upgrade() else {
                break;
            };
            let mut machine = inner.machine.lock().await;
            if machine.draw_epoch != epoch {
                break;
            }

            {
                let mut rng = rand::thread_rng();
                match &target {
                    AnimationTarget::AllSlots => {
                        let next = machine
                            .state
                            .winners
                            .iter()
                            .map(|w| (w.id.clone(), pool::sample_one(&pool, &mut rng)))
                            .collect();
                        machine.state.drawing_numbers = next;
                    }
                    AnimationTarget::Slot(winner_id) => {
                        let value = pool::sample_one(&pool, &mut rng);
                        machine.state.drawing_numbers.insert(winner_id.clone(), value);
                    }
                }
            }

            if let Err(e) = inner.flush(&machine).await {
                tracing::warn!("animator could not publish frame: {}", e);
            }
        }
    })
}
