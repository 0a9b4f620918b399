//! Train specification and everything a moving train produces: sensor
//! telemetry, warning/alarm records, and the dynamics engine itself.

mod alert;
pub(crate) mod engine;
mod resistance;
mod sensors;

pub use alert::{Alert, BoundKind, Heartbeat, OutOfBounds, Warnings};
pub use engine::Engine;
pub use sensors::{Sensors, Setpoint};

use crate::imports::*;
use std::marker::PhantomData;

/// Mean mass accounted per passenger on board.
pub const MEAN_PASSENGER_MASS: si::Mass = si::Mass {
    dimension: PhantomData,
    units: PhantomData,
    value: 70.0,
};

/// Physical limits and resistance coefficients of one train unit. Frozen
/// after construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Train {
    pub id: u32,
    /// Empty vehicle mass, without passengers.
    pub mass: si::Mass,
    /// Rotational-inertia multiplier applied to the translating mass.
    pub mass_factor: si::Ratio,
    pub length: si::Length,
    /// Largest tractive force the powertrain can exert.
    pub max_traction: si::Force,
    /// Largest braking force the brake system can exert.
    pub max_brake: si::Force,
    pub max_velocity: si::Velocity,
    /// Linear Davis coefficient, per unit of train mass.
    pub resistance_lin: si::Acceleration,
    /// Quadratic Davis coefficient, per unit of train mass.
    pub resistance_qua: si::LinearNumberDensity,
}

impl SerdeAPI for Train {}

impl Valid for Train {
    fn valid() -> Self {
        Self {
            id: 1,
            mass: 50_000.0 * uc::KG,
            mass_factor: 1.05 * uc::R,
            length: 75.0 * uc::M,
            max_traction: 200_000.0 * uc::N,
            max_brake: 150_000.0 * uc::N,
            max_velocity: 20.0 * uc::MPS,
            resistance_lin: 0.002 * uc::MPS2,
            resistance_qua: 3.75e-5 * uc::PER_M,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_fields_are_flat_numbers() {
        let train = Train::valid();
        let json = train.to_json().unwrap();
        let raw: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(raw["mass"], serde_json::json!(50_000.0));
        assert_eq!(raw["resistance_qua"], serde_json::json!(3.75e-5));
        assert_eq!(Train::from_json(json).unwrap(), train);
    }

    #[test]
    fn passenger_mass_is_seventy_kilograms() {
        assert_eq!(MEAN_PASSENGER_MASS, 70.0 * uc::KG);
    }
}
