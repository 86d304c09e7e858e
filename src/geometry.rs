//! Flight Geometry Advisor
//!
//! Derives an orientation recommendation (heading, formation yaw offset,
//! bank, angle of attack) from wind and shear inputs. Feeds classifier
//! feature extraction and unit heading bias, never control decisions.
//! Pure, no failure path.

use crate::types::{AlignmentMode, ZoneReading};
use serde::{Deserialize, Serialize};

/// Default angles used when the caller has no mission-specific values
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeometryDefaults {
    /// Base formation yaw offset in degrees
    pub yaw_deg: f32,
    /// Base bank angle in degrees
    pub bank_deg: f32,
    /// Angle of attack in degrees, passed through unchanged
    pub aoa_deg: f32,
}

impl Default for GeometryDefaults {
    fn default() -> Self {
        Self {
            yaw_deg: 10.0,
            bank_deg: 5.0,
            aoa_deg: 2.0,
        }
    }
}

/// Orientation recommendation for a zone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryRecommendation {
    /// Desired heading in degrees, absent when no wind direction was measured
    pub desired_heading_deg: Option<f32>,
    /// Formation yaw offset in degrees
    pub formation_yaw_offset_deg: f32,
    /// Bank angle in degrees
    pub bank_deg: f32,
    /// Angle of attack in degrees
    pub angle_of_attack_deg: f32,
    /// Wind-relative alignment the recommendation was computed for
    pub alignment_mode: AlignmentMode,
}

/// Normalize an angle into [0, 360)
pub fn normalize_deg(deg: f32) -> f32 {
    let r = deg % 360.0;
    if r < 0.0 {
        r + 360.0
    } else {
        r
    }
}

/// Derive a heading from the wind-from direction.
///
/// 0 = North, clockwise positive. Upwind is the identity, downwind adds
/// 180, crosswind (and the `None` mode) adds 90; all mod 360.
pub fn heading_from_wind_from(wind_from_deg: f32, mode: AlignmentMode) -> f32 {
    let wind_from = normalize_deg(wind_from_deg);
    match mode {
        AlignmentMode::Upwind => wind_from,
        AlignmentMode::Downwind => normalize_deg(wind_from + 180.0),
        AlignmentMode::Crosswind | AlignmentMode::None => normalize_deg(wind_from + 90.0),
    }
}

/// Produce a geometry recommendation for a zone reading.
///
/// Heading comes from the wind-from direction when measured, else stays
/// absent. Yaw gets a modest boost under higher shear, bank a small bump
/// for stronger vorticity. All outputs rounded to 1 decimal.
pub fn suggest_geometry(
    reading: &ZoneReading,
    mode: AlignmentMode,
    defaults: &GeometryDefaults,
) -> GeometryRecommendation {
    let desired_heading = reading
        .wind_direction_deg
        .map(|wind_from| round1(heading_from_wind_from(wind_from, mode)));

    let shear = reading.wind_shear.unwrap_or(0.0);
    let yaw = defaults.yaw_deg + (shear / 5.0).min(10.0);
    let bank = defaults.bank_deg + (reading.vorticity * 500.0).min(3.0);

    GeometryRecommendation {
        desired_heading_deg: desired_heading,
        formation_yaw_offset_deg: round1(yaw),
        bank_deg: round1(bank),
        angle_of_attack_deg: round1(defaults.aoa_deg),
        alignment_mode: mode,
    }
}

/// Round to 1 decimal place
fn round1(value: f32) -> f32 {
    libm::roundf(value * 10.0) / 10.0
}
