//! Convenient imports for downstream users.

pub use crate::atp::{stopped, Atp, AtpConfig, Snapshot, Status};
pub use crate::error::Error;
pub use crate::scenario::{Routes, Scenario, Scenarios, Trains, UpdateCase, UpdateCases};
pub use crate::track::{Route, TrackSegment};
pub use crate::traits::{EqDefault, SerdeAPI, Valid};
pub use crate::train::{
    Alert, BoundKind, Engine, Heartbeat, OutOfBounds, Sensors, Setpoint, Train, Warnings,
};
