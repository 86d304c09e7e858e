//! Mesh Unit Behaviours
//!
//! Turbulence sampling pattern selection and execution for mesh-linked
//! units. Pattern parameters come from the injected random source and
//! every action is reported to the telemetry sink.

use crate::rng::RandomSource;
use crate::telemetry::{EventPayload, EventType, TelemetryEvent, TelemetrySink};
use crate::types::UnitId;
use serde::{Deserialize, Serialize};

/// Humidity above which the zigzag pattern is preferred
pub const ZIGZAG_HUMIDITY_THRESHOLD: f32 = 0.75;

const ALTITUDES_M: [u16; 3] = [480, 500, 520];

const DIRECTIONS: [SweepDirection; 6] = [
    SweepDirection::NorthEast,
    SweepDirection::SouthWest,
    SweepDirection::East,
    SweepDirection::West,
    SweepDirection::Spiral,
    SweepDirection::Crosscut,
];

/// Turbulence sampling pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurbulencePattern {
    /// Sharp alternating traversal, used in high humidity
    Zigzag,
    /// Expanding spiral traversal
    Spiral,
}

/// Sweep direction for a pattern run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepDirection {
    /// Toward the northeast
    NorthEast,
    /// Toward the southwest
    SouthWest,
    /// Due east
    East,
    /// Due west
    West,
    /// Spiral sweep
    Spiral,
    /// Perpendicular crosscut
    Crosscut,
}

/// Local conditions a behaviour decision is based on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalConditions {
    /// Relative humidity (0-1)
    pub humidity: f32,
    /// Barometric pressure in hPa, if measured
    pub pressure_hpa: Option<f32>,
}

/// A selected and executed pattern run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternBehaviour {
    /// Executing unit
    pub unit_id: UnitId,
    /// Pattern flown
    pub pattern: TurbulencePattern,
    /// Intensity in [0.6, 1.0], 2 decimals
    pub intensity: f32,
    /// Sweep direction
    pub direction: SweepDirection,
    /// Altitude band in meters
    pub altitude_m: u16,
}

/// Execute a turbulence pattern and report it.
///
/// Intensity, direction and altitude band are drawn from the injected
/// random source.
pub fn execute_turbulence_pattern<R: RandomSource, S: TelemetrySink>(
    unit_id: &UnitId,
    pattern: TurbulencePattern,
    timestamp_ms: u64,
    rng: &mut R,
    sink: &mut S,
) -> PatternBehaviour {
    let behaviour = PatternBehaviour {
        unit_id: unit_id.clone(),
        pattern,
        intensity: round2(rng.next_f32_range(0.6, 1.0)),
        direction: DIRECTIONS[rng.next_index(DIRECTIONS.len())],
        altitude_m: ALTITUDES_M[rng.next_index(ALTITUDES_M.len())],
    };
    sink.emit(&TelemetryEvent::new(
        timestamp_ms,
        unit_id,
        EventType::TurbulencePatternExecuted,
        EventPayload::TurbulencePatternExecuted {
            behaviour: behaviour.clone(),
        },
    ));
    behaviour
}

/// Choose a pattern from local conditions, execute it and report the
/// decision.
///
/// High humidity selects zigzag, everything else spirals.
pub fn adjust_behaviour<R: RandomSource, S: TelemetrySink>(
    unit_id: &UnitId,
    conditions: &LocalConditions,
    timestamp_ms: u64,
    rng: &mut R,
    sink: &mut S,
) -> PatternBehaviour {
    let pattern = if conditions.humidity > ZIGZAG_HUMIDITY_THRESHOLD {
        TurbulencePattern::Zigzag
    } else {
        TurbulencePattern::Spiral
    };
    let behaviour = execute_turbulence_pattern(unit_id, pattern, timestamp_ms, rng, sink);
    sink.emit(&TelemetryEvent::new(
        timestamp_ms,
        unit_id,
        EventType::AdaptivePatternDecision,
        EventPayload::AdaptivePatternDecision {
            unit_id: unit_id.clone(),
            pattern,
            conditions: *conditions,
        },
    ));
    behaviour
}

/// Round to 2 decimal places
fn round2(value: f32) -> f32 {
    libm::roundf(value * 100.0) / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SplitMix64;
    use crate::telemetry::MemorySink;

    #[test]
    fn test_high_humidity_selects_zigzag() {
        let mut rng = SplitMix64::new(1);
        let mut sink = MemorySink::new();
        let unit = UnitId::new("D087");
        let conditions = LocalConditions {
            humidity: 0.81,
            pressure_hpa: Some(997.0),
        };
        let behaviour = adjust_behaviour(&unit, &conditions, 0, &mut rng, &mut sink);
        assert_eq!(behaviour.pattern, TurbulencePattern::Zigzag);
        assert_eq!(sink.count_of(EventType::TurbulencePatternExecuted), 1);
        assert_eq!(sink.count_of(EventType::AdaptivePatternDecision), 1);
    }

    #[test]
    fn test_low_humidity_selects_spiral() {
        let mut rng = SplitMix64::new(1);
        let mut sink = MemorySink::new();
        let unit = UnitId::new("D087");
        let conditions = LocalConditions {
            humidity: 0.4,
            pressure_hpa: None,
        };
        let behaviour = adjust_behaviour(&unit, &conditions, 0, &mut rng, &mut sink);
        assert_eq!(behaviour.pattern, TurbulencePattern::Spiral);
    }

    #[test]
    fn test_pattern_parameters_within_ranges() {
        let mut rng = SplitMix64::new(17);
        let mut sink = MemorySink::new();
        let unit = UnitId::new("D1");
        for _ in 0..20 {
            let behaviour = execute_turbulence_pattern(
                &unit,
                TurbulencePattern::Spiral,
                0,
                &mut rng,
                &mut sink,
            );
            assert!((0.6..=1.0).contains(&behaviour.intensity));
            assert!(ALTITUDES_M.contains(&behaviour.altitude_m));
        }
    }

    #[test]
    fn test_deterministic_under_fixed_seed() {
        let unit = UnitId::new("D1");
        let mut sink = MemorySink::new();
        let a = execute_turbulence_pattern(
            &unit,
            TurbulencePattern::Zigzag,
            0,
            &mut SplitMix64::new(99),
            &mut sink,
        );
        let b = execute_turbulence_pattern(
            &unit,
            TurbulencePattern::Zigzag,
            0,
            &mut SplitMix64::new(99),
            &mut sink,
        );
        assert_eq!(a, b);
    }
}
