//! Persisted specification records consumed at startup: train fleets,
//! named routes, runnable scenarios and golden update cases.
//!
//! Each file is a JSON mapping from alias to record; everything loads
//! through [`SerdeAPI`]. Timestamps are RFC3339; the setpoint value uses
//! `"inf"`/`"-inf"` strings for the non-finite cases; durations are
//! `{secs, nanos}` objects.

use crate::imports::*;
use crate::track::TrackSegment;
use crate::train::{Sensors, Setpoint, Train};

/// Alias-to-record mapping in `trains.json`.
pub type Trains = HashMap<String, Train>;

/// Alias-to-record mapping in `tracks.json`: each entry is an ordered
/// route of segments.
pub type Routes = HashMap<String, Vec<TrackSegment>>;

/// A named initial condition: which train runs which route, seeded with
/// which sensor state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub train: String,
    pub route: String,
    pub sensors: Sensors,
}

impl SerdeAPI for Scenario {}

/// Alias-to-record mapping in `scenarios.json`.
pub type Scenarios = HashMap<String, Scenario>;

/// One golden case for the engine: starting from `scenario`, one update
/// under `setpoint` up to `expected.time` must reproduce `expected`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateCase {
    pub scenario: String,
    pub setpoint: Setpoint,
    pub expected: Sensors,
}

impl SerdeAPI for UpdateCase {}

/// Alias-to-record mapping in `updateSensorsAcceleration.json`.
pub type UpdateCases = HashMap<String, UpdateCase>;
