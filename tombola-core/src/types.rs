use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A prize that can be drawn. `quantity` units means `quantity` winner slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prize {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Prize {
    pub fn new(name: impl Into<String>, quantity: u32, image: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            quantity,
            image,
        }
    }
}

/// A single winner slot, tied to one unit of a prize's quantity.
///
/// `participant_number` stays empty until the slot settles. `prize_name` is
/// denormalized at creation time so the slot survives later prize renames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Winner {
    pub id: String,
    pub prize_id: String,
    pub prize_name: String,
    pub participant_number: String,
    pub confirmed: bool,
    pub slot_index: u32,
}

/// How the participant pool is specified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawMode {
    #[default]
    Number,
    Name,
}

/// Canonical lottery state, owned exclusively by the control-panel machine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LotteryState {
    pub event_name: String,
    pub participant_range: String,
    pub background_image: Option<String>,
    pub prizes: Vec<Prize>,
    pub winners: Vec<Winner>,
    pub is_global_drawing: bool,
    pub current_redraw_winner_id: Option<String>,
    pub drawing_numbers: HashMap<String, String>,
    pub selected_prize_ids: Vec<String>,
    pub draw_mode: DrawMode,
    pub participant_names: String,
}

impl LotteryState {
    pub fn prize(&self, id: &str) -> Option<&Prize> {
        self.prizes.iter().find(|p| p.id == id)
    }

    pub fn winner(&self, id: &str) -> Option<&Winner> {
        self.winners.iter().find(|w| w.id == id)
    }

    /// Derive the read-only snapshot consumed by the display window.
    pub fn projection(&self) -> DisplayProjection {
        DisplayProjection {
            drawing_numbers: self.drawing_numbers.clone(),
            is_global_drawing: self.is_global_drawing,
            current_redraw_winner_id: self.current_redraw_winner_id.clone(),
            winners: self.winners.clone(),
            selected_prize_ids: self.selected_prize_ids.clone(),
            prizes: self.prizes.clone(),
            event_name: self.event_name.clone(),
            background_image: self.background_image.clone(),
        }
    }

    /// Replace the entire winner set for the given selection: one slot per
    /// unit of quantity, in prize-list order, slot indices contiguous from 0.
    /// An empty selection clears the set and creates nothing.
    pub(crate) fn rebuild_winner_slots(&mut self, prize_ids: &[String]) {
        let selected: Vec<Prize> = self
            .prizes
            .iter()
            .filter(|p| prize_ids.contains(&p.id))
            .cloned()
            .collect();

        let mut winners = Vec::new();
        let mut slot_index = 0u32;
        for prize in &selected {
            for _ in 0..prize.quantity {
                winners.push(Winner {
                    id: Uuid::new_v4().to_string(),
                    prize_id: prize.id.clone(),
                    prize_name: prize.name.clone(),
                    participant_number: String::new(),
                    confirmed: false,
                    slot_index,
                });
                slot_index += 1;
            }
        }

        self.winners = winners;
        self.selected_prize_ids = selected.iter().map(|p| p.id.clone()).collect();
        self.drawing_numbers.clear();
    }

    /// Reset the transient draw flags. Applied on every load so a crashed
    /// context cannot leave the system stuck mid-draw.
    pub(crate) fn reset_transient(&mut self) {
        self.is_global_drawing = false;
        self.current_redraw_winner_id = None;
        self.drawing_numbers.clear();
    }
}

/// The projection written to the shared store for the display window.
/// Strictly derived from [`LotteryState`], never edited by the display side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayProjection {
    pub drawing_numbers: HashMap<String, String>,
    pub is_global_drawing: bool,
    pub current_redraw_winner_id: Option<String>,
    pub winners: Vec<Winner>,
    pub selected_prize_ids: Vec<String>,
    pub prizes: Vec<Prize>,
    pub event_name: String,
    pub background_image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_prizes() -> LotteryState {
        let mut state = LotteryState::default();
        state.prizes = vec![
            Prize::new("Bike", 3, None),
            Prize::new("Phone", 2, None),
            Prize::new("Voucher", 1, None),
        ];
        state
    }

    #[test]
    fn rebuild_creates_one_slot_per_quantity_unit() {
        let mut state = state_with_prizes();
        let ids = vec![state.prizes[0].id.clone(), state.prizes[2].id.clone()];
        state.rebuild_winner_slots(&ids);

        assert_eq!(state.winners.len(), 4);
        let indices: Vec<u32> = state.winners.iter().map(|w| w.slot_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(state.winners[0].prize_name, "Bike");
        assert_eq!(state.winners[3].prize_name, "Voucher");
        assert!(state.winners.iter().all(|w| w.participant_number.is_empty()));
        assert!(state.winners.iter().all(|w| !w.confirmed));
    }

    #[test]
    fn rebuild_follows_prize_list_order_not_argument_order() {
        let mut state = state_with_prizes();
        let ids = vec![state.prizes[1].id.clone(), state.prizes[0].id.clone()];
        state.rebuild_winner_slots(&ids);

        assert_eq!(state.winners[0].prize_name, "Bike");
        assert_eq!(state.selected_prize_ids[0], state.prizes[0].id);
    }

    #[test]
    fn rebuild_with_empty_selection_clears_everything() {
        let mut state = state_with_prizes();
        state.rebuild_winner_slots(&[state.prizes[0].id.clone()]);
        assert!(!state.winners.is_empty());

        state.rebuild_winner_slots(&[]);
        assert!(state.winners.is_empty());
        assert!(state.selected_prize_ids.is_empty());
    }

    #[test]
    fn projection_round_trips_through_json() {
        let mut state = state_with_prizes();
        state.event_name = "Year End Gala".into();
        state.rebuild_winner_slots(&[state.prizes[0].id.clone()]);
        state.drawing_numbers
            .insert(state.winners[0].id.clone(), "042".into());
        state.is_global_drawing = true;

        let raw = serde_json::to_string(&state).unwrap();
        let parsed: LotteryState = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.projection(), state.projection());
    }

    #[test]
    fn partial_payload_parses_with_defaults() {
        let parsed: LotteryState =
            serde_json::from_str(r#"{"event_name":"Gala","prizes":[]}"#).unwrap();
        assert_eq!(parsed.event_name, "Gala");
        assert_eq!(parsed.draw_mode, DrawMode::Number);
        assert!(parsed.winners.is_empty());
    }
}
