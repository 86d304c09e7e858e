//! # AetherNet Swarm
//!
//! Coordination and target-prioritization core for an autonomous
//! atmospheric sensing swarm. Zone readings are scored for convective
//! risk, ranked, corroborated by an onboard adaptive classifier, and the
//! highest-risk zones get a mesh cluster of units assigned to them.
//!
//! ## Features
//!
//! - **Risk scoring**: weighted, capped normalization of five sensor
//!   channels into a single composite score
//! - **Geometry advice**: wind-relative heading, bank and angle-of-attack
//!   recommendations per zone
//! - **Target prioritization**: stable risk-descending ranking with
//!   threshold-gated zoom decisions
//! - **Adaptive classification**: bagged decision-tree ensemble trained
//!   on observed outcomes, with a conservative rule fallback
//! - **Cluster management**: role assignment, formation, failure
//!   recovery and battery-ordered rotation
//! - **Telemetry**: structured, serializable events through a pluggable
//!   sink boundary
//!
//! The crate is `no_std` compatible (disable the default `std` feature)
//! and keeps all state in fixed-capacity structures. Randomness is always
//! injected through [`rng::RandomSource`], so every decision path is
//! reproducible under a fixed seed.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_range_loop)]

pub mod base_station;
pub mod behaviours;
pub mod classifier;
pub mod cluster_manager;
pub mod config;
pub mod controller;
pub mod geometry;
pub mod risk_scorer;
pub mod rng;
pub mod sim;
pub mod targeting;
pub mod telemetry;
pub mod types;

pub use classifier::{AdaptiveClassifier, FocusPrediction, TrainOutcome, TrainingRecord};
pub use cluster_manager::{ClusterManager, ClusterMode, ClusterRecord, ClusterStatus};
pub use config::SwarmConfig;
pub use controller::{CycleReport, FocusDecision, SwarmController};
pub use geometry::{GeometryDefaults, GeometryRecommendation};
pub use rng::{RandomSource, SplitMix64};
pub use telemetry::{MemorySink, NullSink, TelemetryEvent, TelemetrySink};
pub use types::{
    Result, RiskScore, SwarmError, UnitId, UnitRecord, UnitRole, UnitStatus, ZoneReading,
};
