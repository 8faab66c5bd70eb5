//! The display window: a pure consumer of the projection key.
//!
//! It listens for change notifications and polls the store as a fallback,
//! de-duplicates by content hash, tolerates malformed payloads by keeping
//! the last good projection, and never writes canonical state back.

use crate::error::Result;
use crate::protocol::{keys, Command};
use crate::storage::StoreHandle;
use crate::types::{DisplayProjection, Prize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_POLL: Duration = Duration::from_millis(100);

pub const PLACEHOLDER: &str = "---";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPhase {
    /// No value yet, shows the placeholder.
    Empty,
    /// A draw or a redraw of this slot is running.
    Animating,
    Settled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotView {
    pub winner_id: String,
    /// 1-based position within the prize, for captions.
    pub winner_index: u32,
    pub value: String,
    pub phase: SlotPhase,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrizeGroup {
    pub prize: Prize,
    pub slots: Vec<SlotView>,
}

/// What one render pass shows, derived entirely from the projection.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFrame {
    pub event_name: String,
    pub background_image: Option<String>,
    pub is_drawing: bool,
    pub groups: Vec<PrizeGroup>,
    /// Winner ids whose slot just settled; the celebratory transition.
    pub celebrating: Vec<String>,
}

/// Group winner slots by prize, in prize-list order restricted to the
/// selection, and compute each slot's display value.
pub fn build_frame(projection: &DisplayProjection) -> DisplayFrame {
    let mut groups = Vec::new();
    let mut slot_index = 0u32;

    for prize in projection
        .prizes
        .iter()
        .filter(|p| projection.selected_prize_ids.contains(&p.id))
    {
        let mut slots = Vec::new();
        for i in 0..prize.quantity {
            let winner = projection
                .winners
                .iter()
                .find(|w| w.prize_id == prize.id && w.slot_index == slot_index);

            let slot = match winner {
                Some(winner) => {
                    let animating = projection.is_global_drawing
                        || projection.current_redraw_winner_id.as_deref() == Some(&winner.id);
                    let animated = projection
                        .drawing_numbers
                        .get(&winner.id)
                        .filter(|v| !v.is_empty());
                    let (value, phase) = match (animated, winner.participant_number.as_str()) {
                        (Some(animated), _) => (animated.clone(), SlotPhase::Animating),
                        (None, "") if animating => (PLACEHOLDER.to_string(), SlotPhase::Animating),
                        (None, "") => (PLACEHOLDER.to_string(), SlotPhase::Empty),
                        (None, settled) if animating => {
                            (format_value(settled), SlotPhase::Animating)
                        }
                        (None, settled) => (format_value(settled), SlotPhase::Settled),
                    };
                    SlotView {
                        winner_id: winner.id.clone(),
                        winner_index: i + 1,
                        value,
                        phase,
                    }
                }
                // The winner set may lag the selection by one update.
                None => SlotView {
                    winner_id: format!("slot_{}", slot_index),
                    winner_index: i + 1,
                    value: PLACEHOLDER.to_string(),
                    phase: SlotPhase::Empty,
                },
            };
            slots.push(slot);
            slot_index += 1;
        }
        groups.push(PrizeGroup {
            prize: prize.clone(),
            slots,
        });
    }

    DisplayFrame {
        event_name: projection.event_name.clone(),
        background_image: projection.background_image.clone(),
        is_drawing: projection.is_global_drawing
            || projection.current_redraw_winner_id.is_some(),
        groups,
        celebrating: Vec::new(),
    }
}

/// All-digit values are zero padded to 3, names shown verbatim.
fn format_value(value: &str) -> String {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        format!("{:0>3}", value)
    } else {
        value.to_string()
    }
}

pub struct DisplayWindow {
    handle: StoreHandle,
    poll: Duration,
    last_hash: Option<String>,
    last_phases: HashMap<String, SlotPhase>,
    celebrate_pending: bool,
}

impl DisplayWindow {
    pub fn new(handle: StoreHandle) -> Self {
        Self::with_poll(handle, DEFAULT_POLL)
    }

    pub fn with_poll(handle: StoreHandle, poll: Duration) -> Self {
        Self {
            handle,
            poll,
            last_hash: None,
            last_phases: HashMap::new(),
            celebrate_pending: false,
        }
    }

    /// Ingest one raw projection payload. Returns a frame only when the
    /// content actually changed; malformed payloads are dropped and the
    /// last good projection stays on screen.
    pub fn ingest(&mut self, raw: &str) -> Option<DisplayFrame> {
        let hash = content_hash(raw);
        if self.last_hash.as_deref() == Some(hash.as_str()) {
            return None;
        }

        let projection: DisplayProjection = match serde_json::from_str(raw) {
            Ok(projection) => projection,
            Err(e) => {
                tracing::warn!("ignoring malformed projection: {}", e);
                return None;
            }
        };
        self.last_hash = Some(hash);

        let mut frame = build_frame(&projection);
        let phases: HashMap<String, SlotPhase> = frame
            .groups
            .iter()
            .flat_map(|g| g.slots.iter())
            .map(|s| (s.winner_id.clone(), s.phase))
            .collect();

        let mut celebrating: Vec<String> = frame
            .groups
            .iter()
            .flat_map(|g| g.slots.iter())
            .filter(|s| {
                s.phase == SlotPhase::Settled
                    && self.last_phases.get(&s.winner_id) == Some(&SlotPhase::Animating)
            })
            .map(|s| s.winner_id.clone())
            .collect();

        // A stop command covers a display that attached mid-draw and never
        // saw the animating phase.
        if celebrating.is_empty() && self.celebrate_pending {
            celebrating = frame
                .groups
                .iter()
                .flat_map(|g| g.slots.iter())
                .filter(|s| s.phase == SlotPhase::Settled)
                .map(|s| s.winner_id.clone())
                .collect();
        }
        self.celebrate_pending = false;

        self.last_phases = phases;
        frame.celebrating = celebrating;
        Some(frame)
    }

    pub fn observe_command(&mut self, command: &Command) {
        match command {
            Command::StopDraw | Command::StopRedraw => self.celebrate_pending = true,
            Command::StartDraw | Command::RedrawRequest(_) => self.celebrate_pending = false,
        }
    }

    /// Render loop: notifications plus the polling fallback. `on_frame`
    /// fires once per content change.
    pub async fn run<F: FnMut(DisplayFrame)>(&mut self, mut on_frame: F) -> Result<()> {
        let mut sub = self.handle.subscribe();
        let mut ticker = tokio::time::interval(self.poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        if let Some(raw) = self.handle.get(keys::DRAWING_STATE).await? {
            if let Some(frame) = self.ingest(&raw) {
                on_frame(frame);
            }
        }

        loop {
            tokio::select! {
                notification = sub.recv() => match notification {
                    Some((key, value)) => {
                        if key == keys::DRAWING_STATE {
                            if let Some(raw) = value {
                                if let Some(frame) = self.ingest(&raw) {
                                    on_frame(frame);
                                }
                            }
                        } else if let Some(command) = Command::parse(&key, value.as_deref()) {
                            self.observe_command(&command);
                        }
                    }
                    None => break,
                },
                _ = ticker.tick() => {
                    if let Some(raw) = self.handle.get(keys::DRAWING_STATE).await? {
                        if let Some(frame) = self.ingest(&raw) {
                            on_frame(frame);
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

fn content_hash(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}
