//! Spin engine: winner draw, target rotation and animation timing.
//!
//! Wedge `i` spans `[rotation + i * step, rotation + (i + 1) * step)` on the
//! client wheel. The pointer sits at the top of the wheel (`-PI / 2`), so the
//! winning wedge's center has to land there.

use rand::Rng;
use std::f64::consts::{PI, TAU};
use std::ops::{Range, RangeInclusive};

use crate::types::SpinResult;

/// Pointer position on the wheel
pub const ALIGN_ANGLE: f64 = -PI / 2.0;

/// Full turns added on top of the minimum forward rotation
pub const EXTRA_TURNS: RangeInclusive<u32> = 3..=6;

pub const DURATION_MS: Range<u64> = 5000..8000;

/// Rotations beyond this are reduced to one turn before spinning. Far past it a
/// full turn falls below f64 precision.
pub const REBASE_LIMIT: f64 = 1e12;

/// Smallest rotation that puts `winner_index`'s wedge center under the pointer
/// and is strictly greater than `current`, plus `extra_turns` full turns.
///
/// A `current` beyond [`REBASE_LIMIT`] is rebased into `[0, TAU)` first.
pub fn target_rotation(
    winner_index: usize,
    ticket_count: usize,
    current: f64,
    extra_turns: u32,
) -> f64 {
    let current = if !current.is_finite() {
        0.0
    } else if current.abs() > REBASE_LIMIT {
        current.rem_euclid(TAU)
    } else {
        current
    };
    let step = TAU / ticket_count as f64;
    let mut target = ALIGN_ANGLE - (winner_index as f64 + 0.5) * step;

    if target <= current {
        target += (((current - target) / TAU).floor() + 1.0) * TAU;
        // Rounding can land exactly on `current`
        if target <= current {
            target += TAU;
        }
    }

    target + TAU * extra_turns as f64
}

/// Draw a winner and compute the wheel's terminal rotation.
///
/// Returns `None` when there are no tickets.
pub fn spin_with<R: Rng>(tickets: &[String], current: f64, rng: &mut R) -> Option<SpinResult> {
    if tickets.is_empty() {
        return None;
    }

    let winner_index = rng.random_range(0..tickets.len());
    let extra_turns = rng.random_range(EXTRA_TURNS);
    let duration_ms = rng.random_range(DURATION_MS);

    Some(SpinResult {
        winner_index,
        winner_name: tickets[winner_index].clone(),
        rotation: target_rotation(winner_index, tickets.len(), current, extra_turns),
        duration_ms,
    })
}

/// Spin using the thread-local CSPRNG
pub fn spin(tickets: &[String], current: f64) -> Option<SpinResult> {
    spin_with(tickets, current, &mut rand::rng())
}
