//! Configuration for the swarm coordination loop

use crate::types::UnitId;

/// Control-loop configuration
#[derive(Debug, Clone)]
pub struct SwarmConfig {
    /// Origin identifier stamped on emitted telemetry
    pub origin: UnitId,
    /// Risk score threshold for focused monitoring
    pub zoom_threshold: f32,
    /// Minimum battery percent for priority-zone mesh duty
    pub priority_battery_min: f32,
    /// Number of top-ranked zones considered per decision cycle
    pub top_n: usize,
}

impl SwarmConfig {
    /// Create a configuration with reference defaults
    pub fn new(origin: &str) -> Self {
        Self {
            origin: UnitId::new(origin),
            zoom_threshold: 0.65,
            priority_battery_min: 60.0,
            top_n: 3,
        }
    }
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self::new("BASE")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = SwarmConfig::default();
        assert_eq!(config.origin.as_str(), "BASE");
        assert!((config.zoom_threshold - 0.65).abs() < f32::EPSILON);
        assert!((config.priority_battery_min - 60.0).abs() < f32::EPSILON);
        assert_eq!(config.top_n, 3);
    }
}
