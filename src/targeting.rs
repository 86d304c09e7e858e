//! Target Prioritization
//!
//! Ranks a batch of zone readings by composite risk score and applies the
//! threshold gate that decides whether a zone merits focused monitoring.

use crate::risk_scorer;
use crate::types::{stable_sort_by_key, Result, RiskScore, SwarmError, ZoneReading, MAX_ZONES};
use heapless::Vec;

/// Rank readings by risk score, descending, keeping the top `top_n`.
///
/// Returns exactly `min(top_n, readings.len())` entries. The sort is
/// stable: equal scores preserve the original relative order. That
/// stability is part of the contract, not incidental.
pub fn prioritize(
    readings: &[ZoneReading],
    top_n: usize,
) -> Result<Vec<(ZoneReading, RiskScore), MAX_ZONES>> {
    let mut scored: Vec<(ZoneReading, RiskScore), MAX_ZONES> = Vec::new();
    for reading in readings {
        scored
            .push((reading.clone(), risk_scorer::score(reading)))
            .map_err(|_| SwarmError::BufferFull)?;
    }
    // Ascending sort on the negated score gives a stable descending order.
    stable_sort_by_key(&mut scored, |entry| -entry.1);
    scored.truncate(top_n);
    Ok(scored)
}

/// Decide whether a zone qualifies for increased monitoring focus
pub fn should_zoom(reading: &ZoneReading, threshold: f32) -> bool {
    risk_scorer::score(reading) >= threshold
}
