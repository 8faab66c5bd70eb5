//! The participant pool is derived on demand, never stored.
//!
//! Number mode parses a range spec; name mode splits a newline list. Either
//! way the pool excludes every value already assigned to a winner slot,
//! confirmed or not: drawing is without replacement across slots.

use crate::types::{DrawMode, LotteryState};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Parse a range spec into participant values.
///
/// Accepted forms: a single number `N` (1 through N), an inclusive range
/// `a-b`, or a comma list of explicit values. An empty or unparsable spec
/// falls back to 1 through 100 so a fresh profile can draw immediately.
pub fn parse_range_spec(spec: &str) -> Vec<String> {
    let spec = spec.trim();
    if spec.is_empty() {
        return default_range();
    }

    if spec.contains('-') {
        if let Some((a, b)) = spec.split_once('-') {
            if let (Ok(start), Ok(end)) = (a.trim().parse::<u32>(), b.trim().parse::<u32>()) {
                if start <= end {
                    return (start..=end).map(|n| n.to_string()).collect();
                }
            }
        }
        return default_range();
    }

    if spec.contains(',') {
        let values: Vec<String> = spec
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect();
        if !values.is_empty() {
            return values;
        }
        return default_range();
    }

    match spec.parse::<u32>() {
        Ok(n) if n > 0 => (1..=n).map(|i| i.to_string()).collect(),
        _ => default_range(),
    }
}

fn default_range() -> Vec<String> {
    (1..=100).map(|i| i.to_string()).collect()
}

/// Split a newline-delimited name list, trimming and dropping blanks.
pub fn parse_name_list(names: &str) -> Vec<String> {
    names
        .lines()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

/// The live pool for the current draw mode, minus values already assigned
/// to any winner slot.
pub fn participant_pool(state: &LotteryState) -> Vec<String> {
    let all = match state.draw_mode {
        DrawMode::Number => parse_range_spec(&state.participant_range),
        DrawMode::Name => parse_name_list(&state.participant_names),
    };

    let assigned: HashSet<&str> = state
        .winners
        .iter()
        .map(|w| w.participant_number.as_str())
        .filter(|n| !n.is_empty())
        .collect();

    all.into_iter()
        .filter(|value| !assigned.contains(value.as_str()))
        .collect()
}

/// One uniform sample. An empty pool yields an empty value instead of an
/// error; the degenerate case must animate a placeholder, not crash.
pub fn sample_one<R: Rng>(pool: &[String], rng: &mut R) -> String {
    pool.choose(rng).cloned().unwrap_or_default()
}

/// `count` samples without replacement within the batch. When the pool is
/// smaller than the batch the remainder comes back empty.
pub fn sample_unique<R: Rng>(pool: &[String], count: usize, rng: &mut R) -> Vec<String> {
    let mut shuffled: Vec<&String> = pool.iter().collect();
    shuffled.shuffle(rng);
    (0..count)
        .map(|i| shuffled.get(i).map(|v| (*v).clone()).unwrap_or_default())
        .collect()
}
