//! Unit constants, so that quantities can be built with multiplication
//! syntax: `0.5 * uc::MPS2`, `1000.0 * uc::M`.

use crate::si;
use std::marker::PhantomData;

/// 1 meter
pub const M: si::Length = si::Length {
    dimension: PhantomData,
    units: PhantomData,
    value: 1.0,
};

/// 1 second
pub const S: si::Time = si::Time {
    dimension: PhantomData,
    units: PhantomData,
    value: 1.0,
};

/// 1 kilogram
pub const KG: si::Mass = si::Mass {
    dimension: PhantomData,
    units: PhantomData,
    value: 1.0,
};

/// 1 meter per second
pub const MPS: si::Velocity = si::Velocity {
    dimension: PhantomData,
    units: PhantomData,
    value: 1.0,
};

/// 1 meter per second squared
pub const MPS2: si::Acceleration = si::Acceleration {
    dimension: PhantomData,
    units: PhantomData,
    value: 1.0,
};

/// 1 newton
pub const N: si::Force = si::Force {
    dimension: PhantomData,
    units: PhantomData,
    value: 1.0,
};

/// 1 watt
pub const W: si::Power = si::Power {
    dimension: PhantomData,
    units: PhantomData,
    value: 1.0,
};

/// 1 radian
pub const RAD: si::Angle = si::Angle {
    dimension: PhantomData,
    units: PhantomData,
    value: 1.0,
};

/// unity ratio
pub const R: si::Ratio = si::Ratio {
    dimension: PhantomData,
    units: PhantomData,
    value: 1.0,
};

/// 1 joule per kilogram
pub const J_PER_KG: si::SpecificEnergy = si::SpecificEnergy {
    dimension: PhantomData,
    units: PhantomData,
    value: 1.0,
};

/// 1 per meter
pub const PER_M: si::LinearNumberDensity = si::LinearNumberDensity {
    dimension: PhantomData,
    units: PhantomData,
    value: 1.0,
};

/// Standard gravity
pub const ACC_GRAV: si::Acceleration = si::Acceleration {
    dimension: PhantomData,
    units: PhantomData,
    value: 9.806_65,
};
