//! Import the uom si system and re-export the quantities and units used
//! throughout the crate.
//! Zero values should be created with standard uom syntax ($Quantity::ZERO)
//! after adding "use crate::imports::*"; non-zero values with unit-constant
//! multiplication syntax ($value * $UNIT_CONSTANT) from [`crate::uc`].

use uom::si;

pub use si::acceleration::meter_per_second_squared;
pub use si::angle::radian;
pub use si::available_energy::joule_per_kilogram;
pub use si::f64::{
    Acceleration, Angle, AvailableEnergy as SpecificEnergy, Force, Length, LinearNumberDensity,
    Mass, Power, Ratio, Time, Velocity,
};
pub use si::force::newton;
pub use si::length::meter;
pub use si::linear_number_density::per_meter;
pub use si::mass::kilogram;
pub use si::power::watt;
pub use si::ratio::ratio;
pub use si::time::second;
pub use si::velocity::meter_per_second;
