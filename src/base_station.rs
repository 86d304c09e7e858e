//! Base Station Operations
//!
//! Fleet-level coordination that runs off-swarm: rotation scheduling for
//! recharge and mission envelope updates, each reported to the telemetry
//! sink.

use crate::cluster_manager::recommend_rotation_schedule;
use crate::telemetry::{EventPayload, EventType, TelemetryEvent, TelemetrySink};
use crate::types::{Result, UnitId, UnitRecord, MAX_UNITS};
use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

/// Maximum altitude bands in a mission envelope
pub const MAX_ALTITUDE_BANDS: usize = 8;

/// Mission envelope parameters pushed to the fleet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionEnvelope {
    /// Operating region label
    pub region: String<32>,
    /// Permitted altitude bands in meters
    pub altitudes_m: Vec<f32, MAX_ALTITUDE_BANDS>,
}

impl MissionEnvelope {
    /// Create an envelope for a region with the given altitude bands.
    ///
    /// At least one altitude band is required.
    pub fn new(region: &str, altitudes_m: &[f32]) -> Result<Self> {
        if altitudes_m.is_empty() {
            return Err(crate::types::SwarmError::InvalidParameter);
        }
        let mut label = String::new();
        for c in region.chars() {
            if label.push(c).is_err() {
                break;
            }
        }
        let mut bands = Vec::new();
        for &alt in altitudes_m {
            bands
                .push(alt)
                .map_err(|_| crate::types::SwarmError::BufferFull)?;
        }
        Ok(Self {
            region: label,
            altitudes_m: bands,
        })
    }
}

/// Fleet-level coordinator
#[derive(Debug)]
pub struct BaseStation {
    origin: UnitId,
}

impl BaseStation {
    /// Create a base station with the given origin id
    pub fn new(origin: &str) -> Self {
        Self {
            origin: UnitId::new(origin),
        }
    }

    /// Compute and report a rotation plan, lowest battery first.
    ///
    /// The ordering rule is the cluster manager's; this wrapper publishes
    /// the plan as a `rotation_schedule` event.
    pub fn rotation_schedule<S: TelemetrySink>(
        &self,
        units: &[UnitRecord],
        timestamp_ms: u64,
        sink: &mut S,
    ) -> Result<Vec<UnitRecord, MAX_UNITS>> {
        let ordered = recommend_rotation_schedule(units)?;
        let mut order: Vec<UnitId, MAX_UNITS> = Vec::new();
        for unit in &ordered {
            order
                .push(unit.id.clone())
                .map_err(|_| crate::types::SwarmError::BufferFull)?;
        }
        sink.emit(&TelemetryEvent::new(
            timestamp_ms,
            &self.origin,
            EventType::RotationSchedule,
            EventPayload::RotationSchedule { order },
        ));
        Ok(ordered)
    }

    /// Push new mission parameters and report the change
    pub fn update_mission_envelope<S: TelemetrySink>(
        &self,
        envelope: &MissionEnvelope,
        timestamp_ms: u64,
        sink: &mut S,
    ) {
        sink.emit(&TelemetryEvent::new(
            timestamp_ms,
            &self.origin,
            EventType::MissionEnvelopeUpdate,
            EventPayload::MissionEnvelopeUpdate {
                envelope: envelope.clone(),
            },
        ));
    }
}
