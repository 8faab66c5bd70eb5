//! CSV export of the winner list. Consumed by the operator surface; not
//! part of the draw protocol.

use crate::types::LotteryState;
use chrono::Utc;

/// Render the current winner list as delimited text, one row per slot.
pub fn winners_csv(state: &LotteryState) -> String {
    let mut out = String::from("slot,prize,participant,confirmed\n");
    for winner in &state.winners {
        out.push_str(&format!(
            "{},{},{},{}\n",
            winner.slot_index,
            csv_field(&winner.prize_name),
            csv_field(&winner.participant_number),
            winner.confirmed
        ));
    }
    out
}

/// Timestamped default file name for an export.
pub fn default_export_name(event_name: &str) -> String {
    let slug: String = event_name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let slug = slug.trim_matches('-');
    let stamp = Utc::now().format("%Y%m%d-%H%M%S");
    if slug.is_empty() {
        format!("winners-{}.csv", stamp)
    } else {
        format!("{}-winners-{}.csv", slug, stamp)
    }
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
