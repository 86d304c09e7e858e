//! Synthetic Readings
//!
//! Generates simulated zone readings and labeled training records from an
//! injected random source, for tests and demos. Value ranges mirror the
//! atmospheric envelopes the scorer and classifier are tuned for.

use crate::classifier::{TrainingRecord, MAX_TRAINING_SAMPLES};
use crate::rng::RandomSource;
use crate::types::{AlignmentMode, AngleMeta, Result, SwarmError, ZoneReading, MAX_ZONES};
use heapless::Vec;

const SIM_ALIGNMENTS: [AlignmentMode; 3] = [
    AlignmentMode::Crosswind,
    AlignmentMode::Upwind,
    AlignmentMode::Downwind,
];

/// Simulate a grid of zone readings
pub fn simulate_grid<R: RandomSource>(
    rng: &mut R,
    zones: usize,
) -> Result<Vec<ZoneReading, MAX_ZONES>> {
    let mut grid: Vec<ZoneReading, MAX_ZONES> = Vec::new();
    for _ in 0..zones {
        let reading = ZoneReading::new(
            rng.next_f32_range(-5.0, 5.0),
            rng.next_f32_range(-5.0, 5.0),
        )
        .with_sensors(
            rng.next_f32_range(1000.0, 4500.0),
            rng.next_f32_range(0.0002, 0.0016),
            rng.next_f32_range(0.6, 1.0),
            rng.next_f32_range(0.2, 3.2),
            rng.next_f32_range(0.0, 1.0),
        )
        .with_wind(rng.next_f32_range(0.0, 360.0), rng.next_f32_range(0.0, 20.0));
        grid.push(reading).map_err(|_| SwarmError::BufferFull)?;
    }
    Ok(grid)
}

/// Simulate labeled outcome records for classifier training.
///
/// Every third record carries orientation metadata, matching the mix of
/// instrumented and bare readings seen in the field.
pub fn simulate_outcomes<R: RandomSource>(
    rng: &mut R,
    count: usize,
) -> Result<Vec<TrainingRecord, MAX_TRAINING_SAMPLES>> {
    let mut dataset: Vec<TrainingRecord, MAX_TRAINING_SAMPLES> = Vec::new();
    for i in 0..count {
        let mut reading = ZoneReading::new(0.0, 0.0).with_sensors(
            rng.next_f32_range(1000.0, 4000.0),
            rng.next_f32_range(0.0003, 0.0015),
            rng.next_f32_range(0.6, 1.0),
            rng.next_f32_range(0.2, 2.5),
            rng.next_f32_range(0.2, 0.95),
        );
        if i % 3 == 0 {
            reading = reading.with_angle_meta(AngleMeta {
                heading_deg: Some(rng.next_f32_range(0.0, 360.0)),
                bank_deg: Some(rng.next_f32_range(0.0, 10.0)),
                angle_of_attack_deg: Some(rng.next_f32_range(0.0, 6.0)),
                formation_yaw_offset_deg: Some(rng.next_f32_range(0.0, 25.0)),
                alignment_mode: SIM_ALIGNMENTS[rng.next_index(SIM_ALIGNMENTS.len())],
            });
        }
        let outcome = rng.next_u32() % 2 == 0;
        dataset
            .push(TrainingRecord { reading, outcome })
            .map_err(|_| SwarmError::BufferFull)?;
    }
    Ok(dataset)
}
