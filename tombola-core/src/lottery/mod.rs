//! The lottery state machine. Owns the canonical state, drives the draw
//! animator, and mirrors every mutation into the shared store for the
//! display window.

mod animator;

use crate::error::{Result, TombolaError};
use crate::images;
use crate::pool;
use crate::protocol::{keys, Command, CommandChannel};
use crate::storage::StoreHandle;
use crate::types::{LotteryState, Prize};
use animator::AnimationTarget;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

pub(crate) struct Machine {
    pub(crate) state: LotteryState,
    /// Bumped on every animation start and stop. An animator tick whose
    /// epoch no longer matches exits without writing.
    pub(crate) draw_epoch: u64,
}

pub(crate) struct LotteryInner {
    pub(crate) machine: Mutex<Machine>,
    store: StoreHandle,
    commands: CommandChannel,
    animator: parking_lot::Mutex<Option<JoinHandle<()>>>,
    pub(crate) tick: Duration,
}

impl LotteryInner {
    /// Serialize canonical state and its projection into the store. Callers
    /// hold the machine lock, so store writes happen in mutation order.
    pub(crate) async fn flush(&self, machine: &Machine) -> Result<()> {
        let canonical = serde_json::to_string(&machine.state)?;
        let projection = serde_json::to_string(&machine.state.projection())?;
        self.store.set(keys::LOTTERY_STATE, &canonical).await?;
        self.store.set(keys::DRAWING_STATE, &projection).await?;
        Ok(())
    }
}

impl Drop for LotteryInner {
    fn drop(&mut self) {
        if let Some(handle) = self.animator.lock().take() {
            handle.abort();
        }
    }
}

/// The control-panel context object. Exactly one exists per panel; the
/// display window never holds one.
#[derive(Clone)]
pub struct Lottery {
    inner: Arc<LotteryInner>,
}

impl Lottery {
    pub async fn open(handle: StoreHandle) -> Result<Self> {
        Self::open_with_tick(handle, DEFAULT_TICK).await
    }

    pub async fn open_with_tick(handle: StoreHandle, tick: Duration) -> Result<Self> {
        let mut state = match handle.get(keys::LOTTERY_STATE).await? {
            Some(raw) => match serde_json::from_str::<LotteryState>(&raw) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!("discarding malformed stored state: {}", e);
                    LotteryState::default()
                }
            },
            None => LotteryState::default(),
        };
        // A previous panel may have crashed mid-draw.
        state.reset_transient();

        let commands = CommandChannel::new(handle.clone());
        let lottery = Self {
            inner: Arc::new(LotteryInner {
                machine: Mutex::new(Machine {
                    state,
                    draw_epoch: 0,
                }),
                store: handle,
                commands,
                animator: parking_lot::Mutex::new(None),
                tick,
            }),
        };

        let machine = lottery.inner.machine.lock().await;
        lottery.inner.flush(&machine).await?;
        drop(machine);

        tracing::info!("lottery state machine ready");
        Ok(lottery)
    }

    /// Clone of the canonical state for inspection and rendering on the
    /// panel side.
    pub async fn snapshot(&self) -> LotteryState {
        self.inner.machine.lock().await.state.clone()
    }

    /// The live participant pool for the current mode, minus assigned values.
    pub async fn current_pool(&self) -> Vec<String> {
        let machine = self.inner.machine.lock().await;
        pool::participant_pool(&machine.state)
    }

    /// Convenience final settlement for the whole winner set, drawn without
    /// replacement within the batch so settled values never collide.
    pub async fn sample_final_numbers(&self) -> HashMap<String, String> {
        let machine = self.inner.machine.lock().await;
        let pool = pool::participant_pool(&machine.state);
        let mut rng = rand::thread_rng();
        let values = pool::sample_unique(&pool, machine.state.winners.len(), &mut rng);
        machine
            .state
            .winners
            .iter()
            .map(|w| w.id.clone())
            .zip(values)
            .collect()
    }

    // ---- prize and settings operations ----

    pub async fn add_prize(
        &self,
        name: &str,
        quantity: u32,
        image: Option<&[u8]>,
    ) -> Result<Prize> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TombolaError::validation("prize name must not be empty"));
        }
        if quantity < 1 {
            return Err(TombolaError::validation("prize quantity must be at least 1"));
        }
        let image = image.map(images::to_stored_form).transpose()?;

        let mut machine = self.inner.machine.lock().await;
        ensure_not_drawing(&machine, "add a prize")?;
        let prize = Prize::new(name, quantity, image);
        machine.state.prizes.push(prize.clone());
        self.inner.flush(&machine).await?;

        tracing::info!("added prize '{}' x{}", prize.name, prize.quantity);
        Ok(prize)
    }

    pub async fn update_prize(
        &self,
        prize_id: &str,
        name: Option<&str>,
        quantity: Option<u32>,
        image: Option<&[u8]>,
    ) -> Result<()> {
        if let Some(name) = name {
            if name.trim().is_empty() {
                return Err(TombolaError::validation("prize name must not be empty"));
            }
        }
        if quantity.is_some_and(|q| q < 1) {
            return Err(TombolaError::validation("prize quantity must be at least 1"));
        }
        let image = image.map(images::to_stored_form).transpose()?;

        let mut machine = self.inner.machine.lock().await;
        ensure_not_drawing(&machine, "edit a prize")?;
        let Some(prize) = machine.state.prizes.iter_mut().find(|p| p.id == prize_id) else {
            tracing::warn!("update_prize: unknown prize {}", prize_id);
            return Ok(());
        };
        if let Some(name) = name {
            prize.name = name.trim().to_string();
        }
        if let Some(quantity) = quantity {
            prize.quantity = quantity;
        }
        if let Some(image) = image {
            prize.image = Some(image);
        }
        self.inner.flush(&machine).await
    }

    /// Deleting a prize cascades to every winner slot referencing it.
    pub async fn delete_prize(&self, prize_id: &str) -> Result<()> {
        let mut machine = self.inner.machine.lock().await;
        ensure_not_drawing(&machine, "delete a prize")?;
        let before = machine.state.prizes.len();
        machine.state.prizes.retain(|p| p.id != prize_id);
        if machine.state.prizes.len() == before {
            tracing::warn!("delete_prize: unknown prize {}", prize_id);
            return Ok(());
        }
        machine.state.winners.retain(|w| w.prize_id != prize_id);
        machine.state.selected_prize_ids.retain(|id| id != prize_id);
        self.inner.flush(&machine).await
    }

    pub async fn set_event_name(&self, name: &str) -> Result<()> {
        self.mutate(|state| state.event_name = name.trim().to_string())
            .await
    }

    pub async fn set_participant_range(&self, range: &str) -> Result<()> {
        self.mutate(|state| state.participant_range = range.trim().to_string())
            .await
    }

    pub async fn set_draw_mode(&self, mode: crate::types::DrawMode) -> Result<()> {
        self.mutate(|state| state.draw_mode = mode).await
    }

    pub async fn set_participant_names(&self, names: &str) -> Result<()> {
        self.mutate(|state| state.participant_names = names.to_string())
            .await
    }

    pub async fn set_background_image(&self, image: Option<&[u8]>) -> Result<()> {
        let stored = image.map(images::to_stored_form).transpose()?;
        self.mutate(|state| state.background_image = stored).await
    }

    // ---- draw session operations ----

    /// Regenerate the full winner set for a prize selection. An empty
    /// selection clears the set and creates nothing.
    pub async fn select_prizes_for_draw(&self, prize_ids: &[String]) -> Result<()> {
        let mut machine = self.inner.machine.lock().await;
        ensure_not_drawing(&machine, "change the prize selection")?;
        machine.state.rebuild_winner_slots(prize_ids);
        tracing::info!(
            "prize selection rebuilt: {} slots across {} prizes",
            machine.state.winners.len(),
            machine.state.selected_prize_ids.len()
        );
        self.inner.flush(&machine).await
    }

    pub async fn start_global_drawing(&self, prize_ids: &[String]) -> Result<()> {
        let mut machine = self.inner.machine.lock().await;
        if machine.state.current_redraw_winner_id.is_some() {
            return Err(TombolaError::invalid_state(
                "a single-slot redraw is still running",
            ));
        }
        if machine.state.is_global_drawing {
            tracing::warn!("start_global_drawing: draw already running");
            return Ok(());
        }

        let selected = machine
            .state
            .prizes
            .iter()
            .filter(|p| prize_ids.contains(&p.id))
            .count();
        if selected == 0 {
            return Err(TombolaError::validation(
                "select at least one prize before drawing",
            ));
        }

        if machine.state.winners.is_empty() {
            machine.state.rebuild_winner_slots(prize_ids);
        }

        let pool = pool::participant_pool(&machine.state);
        if pool.is_empty() {
            return Err(TombolaError::validation(
                "participant pool is empty for the current draw mode",
            ));
        }

        machine.state.is_global_drawing = true;
        machine.draw_epoch += 1;
        let epoch = machine.draw_epoch;
        self.inner.flush(&machine).await?;
        drop(machine);

        self.start_animation(epoch, pool, AnimationTarget::AllSlots);
        self.inner.commands.send(&Command::StartDraw).await?;
        tracing::info!("global draw started");
        Ok(())
    }

    /// Settle every slot from `final_numbers`. The map must cover every
    /// current winner; a missing entry is an input-contract violation and
    /// mutates nothing. A no-op when no draw is running.
    pub async fn stop_global_drawing(
        &self,
        final_numbers: &HashMap<String, String>,
    ) -> Result<()> {
        let mut machine = self.inner.machine.lock().await;
        if !machine.state.is_global_drawing {
            return Ok(());
        }

        if let Some(missing) = machine
            .state
            .winners
            .iter()
            .find(|w| !final_numbers.contains_key(&w.id))
        {
            return Err(TombolaError::validation(format!(
                "no final value supplied for winner slot {}",
                missing.slot_index
            )));
        }

        machine.draw_epoch += 1;
        self.cancel_animation();
        for winner in &mut machine.state.winners {
            if let Some(value) = final_numbers.get(&winner.id) {
                winner.participant_number = value.clone();
            }
        }
        machine.state.is_global_drawing = false;
        machine.state.drawing_numbers.clear();
        // Command first, then the settled projection: a listening display
        // arms its celebration right before the final frame arrives.
        self.inner.commands.send(&Command::StopDraw).await?;
        self.inner.flush(&machine).await?;

        tracing::info!("global draw settled");
        Ok(())
    }

    /// Re-run the draw for one settled slot. The slot loses its confirmed
    /// flag and animates alone until [`Lottery::stop_individual_redraw`].
    pub async fn start_individual_redraw(&self, winner_id: &str) -> Result<()> {
        let mut machine = self.inner.machine.lock().await;
        if machine.state.is_global_drawing {
            return Err(TombolaError::invalid_state("a global draw is running"));
        }
        if let Some(current) = &machine.state.current_redraw_winner_id {
            return Err(TombolaError::invalid_state(format!(
                "winner {} is already being redrawn",
                current
            )));
        }
        let Some(winner) = machine.state.winners.iter_mut().find(|w| w.id == winner_id) else {
            tracing::warn!("start_individual_redraw: unknown winner {}", winner_id);
            return Ok(());
        };
        winner.confirmed = false;
        machine.state.current_redraw_winner_id = Some(winner_id.to_string());

        // Excludes every assigned value, including this slot's current one.
        let pool = pool::participant_pool(&machine.state);
        if pool.is_empty() {
            tracing::warn!("redraw pool is empty, slot will animate a placeholder");
        }
        machine.draw_epoch += 1;
        let epoch = machine.draw_epoch;
        self.inner.flush(&machine).await?;
        drop(machine);

        self.start_animation(epoch, pool, AnimationTarget::Slot(winner_id.to_string()));
        self.inner
            .commands
            .send(&Command::RedrawRequest(winner_id.to_string()))
            .await?;
        tracing::info!("redraw started for winner {}", winner_id);
        Ok(())
    }

    /// Settle the redrawn slot. The operator confirms separately, so the
    /// slot stays unconfirmed. A no-op unless this winner is the one
    /// currently redrawing.
    pub async fn stop_individual_redraw(&self, winner_id: &str, final_number: &str) -> Result<()> {
        let mut machine = self.inner.machine.lock().await;
        if machine.state.current_redraw_winner_id.as_deref() != Some(winner_id) {
            return Ok(());
        }

        machine.draw_epoch += 1;
        self.cancel_animation();
        machine.state.current_redraw_winner_id = None;
        machine.state.drawing_numbers.remove(winner_id);
        if let Some(winner) = machine.state.winners.iter_mut().find(|w| w.id == winner_id) {
            winner.participant_number = final_number.to_string();
            winner.confirmed = false;
        }
        self.inner.commands.send(&Command::StopRedraw).await?;
        self.inner.flush(&machine).await?;

        tracing::info!("redraw settled for winner {}", winner_id);
        Ok(())
    }

    /// Idempotent; requires a settled, non-animating slot.
    pub async fn confirm_winner(&self, winner_id: &str) -> Result<()> {
        let mut machine = self.inner.machine.lock().await;
        let animating = machine.state.is_global_drawing
            || machine.state.current_redraw_winner_id.as_deref() == Some(winner_id)
            || machine.state.drawing_numbers.contains_key(winner_id);
        let Some(winner) = machine.state.winners.iter_mut().find(|w| w.id == winner_id) else {
            tracing::warn!("confirm_winner: unknown winner {}", winner_id);
            return Ok(());
        };
        if animating {
            return Err(TombolaError::invalid_state("slot is still animating"));
        }
        if winner.participant_number.is_empty() {
            return Err(TombolaError::validation("slot has no drawn value to confirm"));
        }
        winner.confirmed = true;
        self.inner.flush(&machine).await
    }

    /// Wipe the winner set and all draw-session state. Also the abnormal
    /// stop path: any running animation is cancelled first.
    pub async fn clear_winners(&self) -> Result<()> {
        let mut machine = self.inner.machine.lock().await;
        machine.draw_epoch += 1;
        self.cancel_animation();
        machine.state.winners.clear();
        machine.state.drawing_numbers.clear();
        machine.state.selected_prize_ids.clear();
        machine.state.is_global_drawing = false;
        machine.state.current_redraw_winner_id = None;
        self.inner.flush(&machine).await?;
        tracing::info!("winner set cleared");
        Ok(())
    }

    // ---- internals ----

    async fn mutate<F: FnOnce(&mut LotteryState)>(&self, f: F) -> Result<()> {
        let mut machine = self.inner.machine.lock().await;
        f(&mut machine.state);
        self.inner.flush(&machine).await
    }

    fn start_animation(&self, epoch: u64, pool: Vec<String>, target: AnimationTarget) {
        let handle = animator::spawn(Arc::downgrade(&self.inner), epoch, pool, target);
        let mut slot = self.inner.animator.lock();
        if let Some(old) = slot.replace(handle) {
            old.abort();
        }
    }

    fn cancel_animation(&self) {
        if let Some(handle) = self.inner.animator.lock().take() {
            handle.abort();
        }
    }
}

fn ensure_not_drawing(machine: &Machine, what: &str) -> Result<()> {
    if machine.state.is_global_drawing || machine.state.current_redraw_winner_id.is_some() {
        return Err(TombolaError::invalid_state(format!(
            "cannot {} while a draw is running",
            what
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{SharedStore, StoreHub};
    use crate::types::{DisplayProjection, DrawMode};
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};
    use tokio::time::sleep;

    const TEST_TICK: Duration = Duration::from_millis(10);

    async fn setup() -> (TempDir, StoreHub, Lottery) {
        let dir = tempdir().unwrap();
        let store = SharedStore::open(&dir.path().join("kv.db")).await.unwrap();
        let hub = StoreHub::new(store);
        let lottery = Lottery::open_with_tick(hub.attach(), TEST_TICK)
            .await
            .unwrap();
        (dir, hub, lottery)
    }

    async fn bike_selection(lottery: &Lottery) -> (String, Vec<String>) {
        lottery.set_participant_range("1-5").await.unwrap();
        let prize = lottery.add_prize("Bike", 3, None).await.unwrap();
        let ids = vec![prize.id.clone()];
        lottery.select_prizes_for_draw(&ids).await.unwrap();
        (prize.id, ids)
    }

    #[tokio::test]
    async fn selection_creates_contiguous_slots() {
        let (_dir, _hub, lottery) = setup().await;
        let (_, _ids) = bike_selection(&lottery).await;

        let state = lottery.snapshot().await;
        assert_eq!(state.winners.len(), 3);
        let indices: Vec<u32> = state.winners.iter().map(|w| w.slot_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(state
            .winners
            .iter()
            .all(|w| w.prize_name == "Bike" && w.participant_number.is_empty()));
    }

    #[tokio::test]
    async fn global_draw_settles_supplied_numbers() {
        let (_dir, _hub, lottery) = setup().await;
        let (_, ids) = bike_selection(&lottery).await;

        lottery.start_global_drawing(&ids).await.unwrap();
        assert!(lottery.snapshot().await.is_global_drawing);

        let winners = lottery.snapshot().await.winners;
        let finals: HashMap<String, String> = winners
            .iter()
            .zip(["2", "5", "1"])
            .map(|(w, n)| (w.id.clone(), n.to_string()))
            .collect();
        lottery.stop_global_drawing(&finals).await.unwrap();

        let state = lottery.snapshot().await;
        assert!(!state.is_global_drawing);
        assert!(state.drawing_numbers.is_empty());
        let numbers: Vec<&str> = state
            .winners
            .iter()
            .map(|w| w.participant_number.as_str())
            .collect();
        assert_eq!(numbers, vec!["2", "5", "1"]);
    }

    #[tokio::test]
    async fn stop_rejects_incomplete_final_numbers() {
        let (_dir, _hub, lottery) = setup().await;
        let (_, ids) = bike_selection(&lottery).await;
        lottery.start_global_drawing(&ids).await.unwrap();

        let winners = lottery.snapshot().await.winners;
        let mut finals: HashMap<String, String> = winners
            .iter()
            .map(|w| (w.id.clone(), "1".to_string()))
            .collect();
        finals.remove(&winners[1].id);

        let err = lottery.stop_global_drawing(&finals).await.unwrap_err();
        assert!(matches!(err, TombolaError::Validation(_)));
        // Nothing was mutated, the draw is still running.
        let state = lottery.snapshot().await;
        assert!(state.is_global_drawing);
        assert!(state.winners.iter().all(|w| w.participant_number.is_empty()));

        lottery.clear_winners().await.unwrap();
    }

    #[tokio::test]
    async fn stop_when_not_drawing_is_a_no_op() {
        let (_dir, _hub, lottery) = setup().await;
        let (_, _ids) = bike_selection(&lottery).await;

        let before = lottery.snapshot().await;
        lottery.stop_global_drawing(&HashMap::new()).await.unwrap();
        assert_eq!(lottery.snapshot().await, before);
    }

    #[tokio::test]
    async fn redraw_runs_for_exactly_one_slot() {
        let (_dir, _hub, lottery) = setup().await;
        let (_, ids) = bike_selection(&lottery).await;
        lottery.start_global_drawing(&ids).await.unwrap();
        let finals = lottery.sample_final_numbers().await;
        lottery.stop_global_drawing(&finals).await.unwrap();

        let target = lottery.snapshot().await.winners[1].clone();
        lottery.start_individual_redraw(&target.id).await.unwrap();

        let state = lottery.snapshot().await;
        assert_eq!(state.current_redraw_winner_id.as_deref(), Some(target.id.as_str()));
        assert!(!state.winner(&target.id).unwrap().confirmed);

        sleep(TEST_TICK * 5).await;
        let state = lottery.snapshot().await;
        assert!(state.drawing_numbers.contains_key(&target.id));
        assert_eq!(state.drawing_numbers.len(), 1);

        lottery.stop_individual_redraw(&target.id, "3").await.unwrap();
        let state = lottery.snapshot().await;
        assert_eq!(state.current_redraw_winner_id, None);
        assert!(state.drawing_numbers.is_empty());
        let winner = state.winner(&target.id).unwrap();
        assert_eq!(winner.participant_number, "3");
        assert!(!winner.confirmed);
    }

    #[tokio::test]
    async fn draws_are_mutually_exclusive() {
        let (_dir, _hub, lottery) = setup().await;
        let (_, ids) = bike_selection(&lottery).await;
        lottery.start_global_drawing(&ids).await.unwrap();

        let winner_id = lottery.snapshot().await.winners[0].id.clone();
        let err = lottery.start_individual_redraw(&winner_id).await.unwrap_err();
        assert!(matches!(err, TombolaError::InvalidState(_)));

        let finals = lottery.sample_final_numbers().await;
        lottery.stop_global_drawing(&finals).await.unwrap();

        lottery.start_individual_redraw(&winner_id).await.unwrap();
        let other = lottery.snapshot().await.winners[1].id.clone();
        assert!(matches!(
            lottery.start_individual_redraw(&other).await.unwrap_err(),
            TombolaError::InvalidState(_)
        ));
        assert!(matches!(
            lottery.start_global_drawing(&ids).await.unwrap_err(),
            TombolaError::InvalidState(_)
        ));

        lottery.stop_individual_redraw(&winner_id, "4").await.unwrap();
    }

    #[tokio::test]
    async fn confirm_requires_settled_value_and_is_idempotent() {
        let (_dir, _hub, lottery) = setup().await;
        let (_, ids) = bike_selection(&lottery).await;

        let unsettled = lottery.snapshot().await.winners[0].id.clone();
        assert!(matches!(
            lottery.confirm_winner(&unsettled).await.unwrap_err(),
            TombolaError::Validation(_)
        ));

        lottery.start_global_drawing(&ids).await.unwrap();
        let finals = lottery.sample_final_numbers().await;
        lottery.stop_global_drawing(&finals).await.unwrap();

        lottery.confirm_winner(&unsettled).await.unwrap();
        lottery.confirm_winner(&unsettled).await.unwrap();
        let state = lottery.snapshot().await;
        assert!(state.winner(&unsettled).unwrap().confirmed);

        // Unknown ids are tolerated, stale ids are expected across windows.
        lottery.confirm_winner("missing").await.unwrap();
    }

    #[tokio::test]
    async fn animator_publishes_pool_values_until_stopped() {
        let (_dir, hub, lottery) = setup().await;
        let (_, ids) = bike_selection(&lottery).await;

        lottery.start_global_drawing(&ids).await.unwrap();
        sleep(TEST_TICK * 6).await;

        let state = lottery.snapshot().await;
        assert_eq!(state.drawing_numbers.len(), 3);
        let pool: Vec<String> = (1..=5).map(|i| i.to_string()).collect();
        assert!(state.drawing_numbers.values().all(|v| pool.contains(v)));

        let finals = lottery.sample_final_numbers().await;
        lottery.stop_global_drawing(&finals).await.unwrap();

        // No animator write may land after stop returns.
        let reader = hub.attach();
        let settled = reader.get(keys::DRAWING_STATE).await.unwrap().unwrap();
        sleep(TEST_TICK * 6).await;
        let later = reader.get(keys::DRAWING_STATE).await.unwrap().unwrap();
        assert_eq!(settled, later);
    }

    #[tokio::test]
    async fn clearing_mid_draw_cancels_the_animation() {
        let (_dir, hub, lottery) = setup().await;
        let (_, ids) = bike_selection(&lottery).await;
        lottery.start_global_drawing(&ids).await.unwrap();
        sleep(TEST_TICK * 3).await;

        lottery.clear_winners().await.unwrap();

        let state = lottery.snapshot().await;
        assert!(state.winners.is_empty());
        assert!(state.drawing_numbers.is_empty());
        assert!(!state.is_global_drawing);
        assert!(state.selected_prize_ids.is_empty());

        let reader = hub.attach();
        let cleared = reader.get(keys::DRAWING_STATE).await.unwrap().unwrap();
        sleep(TEST_TICK * 6).await;
        assert_eq!(
            reader.get(keys::DRAWING_STATE).await.unwrap().unwrap(),
            cleared
        );
    }

    #[tokio::test]
    async fn settled_values_leave_the_pool() {
        let (_dir, _hub, lottery) = setup().await;
        lottery.set_participant_range("1-3").await.unwrap();
        let prize = lottery.add_prize("Bike", 2, None).await.unwrap();
        let ids = vec![prize.id.clone()];
        lottery.select_prizes_for_draw(&ids).await.unwrap();

        lottery.start_global_drawing(&ids).await.unwrap();
        let winners = lottery.snapshot().await.winners;
        let finals: HashMap<String, String> = winners
            .iter()
            .zip(["1", "3"])
            .map(|(w, n)| (w.id.clone(), n.to_string()))
            .collect();
        lottery.stop_global_drawing(&finals).await.unwrap();

        assert_eq!(lottery.current_pool().await, vec!["2"]);
    }

    #[tokio::test]
    async fn empty_name_pool_animates_placeholders_without_crashing() {
        let (_dir, _hub, lottery) = setup().await;
        lottery.set_draw_mode(DrawMode::Name).await.unwrap();
        lottery.set_participant_names("Andi\nBudi").await.unwrap();
        let prize = lottery.add_prize("Bike", 2, None).await.unwrap();
        let ids = vec![prize.id.clone()];
        lottery.select_prizes_for_draw(&ids).await.unwrap();

        assert_eq!(lottery.current_pool().await, vec!["Andi", "Budi"]);

        lottery.start_global_drawing(&ids).await.unwrap();
        let winners = lottery.snapshot().await.winners;
        let finals: HashMap<String, String> = winners
            .iter()
            .zip(["Andi", "Budi"])
            .map(|(w, n)| (w.id.clone(), n.to_string()))
            .collect();
        lottery.stop_global_drawing(&finals).await.unwrap();

        // Both names are assigned, the pool is dry.
        assert!(lottery.current_pool().await.is_empty());

        // A further global draw is refused up front...
        lottery.clear_winners().await.unwrap();
        lottery.select_prizes_for_draw(&ids).await.unwrap();
        let state = lottery.snapshot().await;
        assert!(!state.winners.is_empty());

        // ...but a redraw of a dry pool degrades to empty animated values.
        lottery.start_global_drawing(&ids).await.unwrap();
        let winners = lottery.snapshot().await.winners;
        let finals: HashMap<String, String> = winners
            .iter()
            .zip(["Andi", "Budi"])
            .map(|(w, n)| (w.id.clone(), n.to_string()))
            .collect();
        lottery.stop_global_drawing(&finals).await.unwrap();

        let target = lottery.snapshot().await.winners[0].id.clone();
        lottery.start_individual_redraw(&target).await.unwrap();
        sleep(TEST_TICK * 5).await;
        let state = lottery.snapshot().await;
        assert_eq!(state.drawing_numbers.get(&target).map(String::as_str), Some(""));
        lottery.stop_individual_redraw(&target, "").await.unwrap();
    }

    #[tokio::test]
    async fn empty_pool_refuses_to_start_a_global_draw() {
        let (_dir, _hub, lottery) = setup().await;
        lottery.set_draw_mode(DrawMode::Name).await.unwrap();
        lottery.set_participant_names("").await.unwrap();
        let prize = lottery.add_prize("Bike", 1, None).await.unwrap();
        let ids = vec![prize.id.clone()];
        lottery.select_prizes_for_draw(&ids).await.unwrap();

        assert!(matches!(
            lottery.start_global_drawing(&ids).await.unwrap_err(),
            TombolaError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn empty_selection_refuses_to_start() {
        let (_dir, _hub, lottery) = setup().await;
        lottery.set_participant_range("1-5").await.unwrap();
        assert!(matches!(
            lottery.start_global_drawing(&[]).await.unwrap_err(),
            TombolaError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn deleting_a_prize_cascades_to_its_winners() {
        let (_dir, _hub, lottery) = setup().await;
        lottery.set_participant_range("1-9").await.unwrap();
        let bike = lottery.add_prize("Bike", 2, None).await.unwrap();
        let phone = lottery.add_prize("Phone", 1, None).await.unwrap();
        let ids = vec![bike.id.clone(), phone.id.clone()];
        lottery.select_prizes_for_draw(&ids).await.unwrap();

        lottery.delete_prize(&bike.id).await.unwrap();

        let state = lottery.snapshot().await;
        assert_eq!(state.prizes.len(), 1);
        assert!(state.winners.iter().all(|w| w.prize_id == phone.id));
        assert_eq!(state.selected_prize_ids, vec![phone.id.clone()]);
    }

    #[tokio::test]
    async fn projection_in_store_matches_canonical_state() {
        let (_dir, hub, lottery) = setup().await;
        let (_, ids) = bike_selection(&lottery).await;
        lottery.set_event_name("Year End Gala").await.unwrap();
        lottery.start_global_drawing(&ids).await.unwrap();
        let finals = lottery.sample_final_numbers().await;
        lottery.stop_global_drawing(&finals).await.unwrap();

        let reader = hub.attach();
        let raw = reader.get(keys::DRAWING_STATE).await.unwrap().unwrap();
        let projection: DisplayProjection = serde_json::from_str(&raw).unwrap();
        assert_eq!(projection, lottery.snapshot().await.projection());
    }

    #[tokio::test]
    async fn reopening_resets_transient_draw_flags() {
        let dir = tempdir().unwrap();
        let store = SharedStore::open(&dir.path().join("kv.db")).await.unwrap();
        let hub = StoreHub::new(store);

        let mut stuck = LotteryState::default();
        stuck.event_name = "Gala".into();
        stuck.is_global_drawing = true;
        stuck.current_redraw_winner_id = Some("w1".into());
        stuck.drawing_numbers.insert("w1".into(), "7".into());
        let writer = hub.attach();
        writer
            .set(keys::LOTTERY_STATE, &serde_json::to_string(&stuck).unwrap())
            .await
            .unwrap();

        let lottery = Lottery::open_with_tick(hub.attach(), TEST_TICK)
            .await
            .unwrap();
        let state = lottery.snapshot().await;
        assert_eq!(state.event_name, "Gala");
        assert!(!state.is_global_drawing);
        assert_eq!(state.current_redraw_winner_id, None);
        assert!(state.drawing_numbers.is_empty());
    }

    #[tokio::test]
    async fn malformed_stored_state_is_discarded() {
        let dir = tempdir().unwrap();
        let store = SharedStore::open(&dir.path().join("kv.db")).await.unwrap();
        let hub = StoreHub::new(store);
        let writer = hub.attach();
        writer.set(keys::LOTTERY_STATE, "{not json").await.unwrap();

        let lottery = Lottery::open_with_tick(hub.attach(), TEST_TICK)
            .await
            .unwrap();
        assert_eq!(lottery.snapshot().await, LotteryState::default());
    }

    #[tokio::test]
    async fn sampled_finals_cover_every_slot_without_collision() {
        let (_dir, _hub, lottery) = setup().await;
        lottery.set_participant_range("1-3").await.unwrap();
        let prize = lottery.add_prize("Bike", 3, None).await.unwrap();
        let ids = vec![prize.id.clone()];
        lottery.select_prizes_for_draw(&ids).await.unwrap();
        lottery.start_global_drawing(&ids).await.unwrap();

        let finals = lottery.sample_final_numbers().await;
        assert_eq!(finals.len(), 3);
        let mut values: Vec<&String> = finals.values().collect();
        values.sort();
        values.dedup();
        assert_eq!(values.len(), 3);

        lottery.stop_global_drawing(&finals).await.unwrap();
    }
}
