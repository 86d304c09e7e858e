//! Composite Risk Scoring
//!
//! Maps a zone reading to a normalized composite risk value in [0, 1].
//! Five weighted terms, each independently normalized against a fixed cap.
//! Pure and infallible; missing sensor values are already defaulted to 0.0
//! at reading construction.

use crate::types::{RiskScore, ZoneReading};

/// Term weights for CAPE, vorticity, humidity, vertical velocity and
/// anomaly score; sums to exactly 1.0
pub const WEIGHTS: [f32; 5] = [0.25, 0.25, 0.15, 0.15, 0.20];

/// Normalization caps for the same five terms
pub const NORM_CAPS: [f32; 5] = [4000.0, 0.0015, 1.0, 3.0, 1.0];

/// Score a zone reading.
///
/// Each sensor value is divided by its cap and clamped to a maximum of
/// 1.0; there is no floor clamp, so negative inputs pull the score down.
/// The weighted sum is rounded to 3 decimal places.
pub fn score(reading: &ZoneReading) -> RiskScore {
    let features = reading.sensor_features();
    let mut total = 0.0f32;
    for i in 0..WEIGHTS.len() {
        total += WEIGHTS[i] * (features[i] / NORM_CAPS[i]).min(1.0);
    }
    round3(total)
}

/// Round to 3 decimal places
fn round3(value: f32) -> f32 {
    libm::roundf(value * 1000.0) / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        let sum: f32 = WEIGHTS.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_all_zero_scores_zero() {
        let reading = ZoneReading::new(0.0, 0.0);
        assert_eq!(score(&reading), 0.0);
    }

    #[test]
    fn test_saturated_input_scores_one() {
        let reading = ZoneReading::new(0.0, 0.0).with_sensors(4000.0, 0.0015, 1.0, 3.0, 1.0);
        assert_eq!(score(&reading), 1.0);
    }

    #[test]
    fn test_above_cap_still_scores_one() {
        let reading = ZoneReading::new(0.0, 0.0).with_sensors(9000.0, 0.5, 2.0, 10.0, 5.0);
        assert_eq!(score(&reading), 1.0);
    }

    #[test]
    fn test_score_in_unit_interval_for_nonnegative_inputs() {
        let reading = ZoneReading::new(0.0, 0.0).with_sensors(2000.0, 0.0008, 0.8, 1.5, 0.4);
        let s = score(&reading);
        assert!((0.0..=1.0).contains(&s));
    }

    #[test]
    fn test_score_rounded_to_three_decimals() {
        let reading = ZoneReading::new(0.0, 0.0).with_sensors(1234.0, 0.0007, 0.77, 1.1, 0.33);
        let s = score(&reading);
        assert_eq!(s, libm::roundf(s * 1000.0) / 1000.0);
    }

    #[test]
    fn test_negative_input_propagates() {
        let reading = ZoneReading::new(0.0, 0.0).with_sensors(-4000.0, 0.0, 0.0, 0.0, 0.0);
        assert!(score(&reading) < 0.0);
    }
}
