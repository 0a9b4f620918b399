//! Live telemetry of the train, recomputed wholesale on every engine tick.

use crate::imports::*;
use crate::train::alert::Warnings;

/// Commanded acceleration, stamped with the instant it was issued.
/// Negative infinity commands the emergency brake.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Setpoint {
    #[serde(with = "serde_setpoint_value")]
    pub value: si::Acceleration,
    pub time: DateTime<Utc>,
}

impl Setpoint {
    pub fn new(value: si::Acceleration, time: DateTime<Utc>) -> Self {
        Self { value, time }
    }

    /// The setpoint that engages the emergency brake, stamped now.
    pub fn emergency_brake() -> Self {
        Self {
            value: f64::NEG_INFINITY * uc::MPS2,
            time: Utc::now(),
        }
    }

    pub fn is_emergency_brake(&self) -> bool {
        self.value == f64::NEG_INFINITY * uc::MPS2
    }
}

impl Default for Setpoint {
    fn default() -> Self {
        Self {
            value: si::Acceleration::ZERO,
            time: DateTime::UNIX_EPOCH,
        }
    }
}

impl SerdeAPI for Setpoint {}

/// JSON numbers cannot carry ±∞, so the setpoint value crosses the wire as
/// a plain number when finite and as the strings `"inf"`/`"-inf"` otherwise.
mod serde_setpoint_value {
    use crate::{si, uc};
    use serde::{de, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &si::Acceleration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let raw = value.get::<si::meter_per_second_squared>();
        if raw == f64::NEG_INFINITY {
            serializer.serialize_str("-inf")
        } else if raw == f64::INFINITY {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_f64(raw)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<si::Acceleration, D::Error> {
        struct RawVisitor;

        impl<'de> de::Visitor<'de> for RawVisitor {
            type Value = f64;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a number, or one of the strings \"inf\" and \"-inf\"")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
                Ok(v)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
                Ok(v as f64)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
                Ok(v as f64)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
                match v {
                    "inf" => Ok(f64::INFINITY),
                    "-inf" => Ok(f64::NEG_INFINITY),
                    _ => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
                }
            }
        }

        Ok(deserializer.deserialize_any(RawVisitor)? * uc::MPS2)
    }
}

/// Everything the train knows about itself at one instant. Produced by the
/// engine each tick and replaced as a whole; no field is updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sensors {
    pub time: DateTime<Utc>,
    /// The setpoint in effect when this snapshot was computed.
    pub setpoint: Setpoint,
    /// Distance travelled along the route since the datum.
    pub position: si::Length,
    pub velocity: si::Velocity,
    pub acceleration: si::Acceleration,
    pub traction_force: si::Force,
    pub braking_force: si::Force,
    pub traction_power: si::Power,
    pub braking_power: si::Power,
    /// Train mass including passengers.
    pub mass: si::Mass,
    pub track_id: u32,
    /// Distance into the current segment.
    pub rel_position: si::Length,
    pub slope: si::Angle,
    pub bend_radius: si::Length,
    pub tunnel: bool,
    pub basic_res: si::Force,
    pub slope_res: si::Force,
    pub curve_res: si::Force,
    pub tunnel_res: si::Force,
    /// Slope + curve + tunnel resistance.
    pub line_res: si::Force,
    /// Basic + line resistance.
    pub resistance: si::Force,
    pub num_passengers: u32,
    #[serde(skip_serializing_if = "EqDefault::eq_default")]
    pub warnings: Warnings,
    #[serde(skip_serializing_if = "EqDefault::eq_default")]
    pub alarms: Warnings,
}

impl Default for Sensors {
    fn default() -> Self {
        Self {
            time: DateTime::UNIX_EPOCH,
            setpoint: Setpoint::default(),
            position: si::Length::ZERO,
            velocity: si::Velocity::ZERO,
            acceleration: si::Acceleration::ZERO,
            traction_force: si::Force::ZERO,
            braking_force: si::Force::ZERO,
            traction_power: si::Power::ZERO,
            braking_power: si::Power::ZERO,
            mass: si::Mass::ZERO,
            track_id: 0,
            rel_position: si::Length::ZERO,
            slope: si::Angle::ZERO,
            bend_radius: si::Length::ZERO,
            tunnel: false,
            basic_res: si::Force::ZERO,
            slope_res: si::Force::ZERO,
            curve_res: si::Force::ZERO,
            tunnel_res: si::Force::ZERO,
            line_res: si::Force::ZERO,
            resistance: si::Force::ZERO,
            num_passengers: 0,
            warnings: Warnings::default(),
            alarms: Warnings::default(),
        }
    }
}

impl SerdeAPI for Sensors {}

impl Valid for Sensors {
    fn valid() -> Self {
        Self {
            mass: 50_000.0 * uc::KG,
            track_id: 1,
            bend_radius: 100_055.0 * uc::M,
            ..Self::default()
        }
    }
}

impl Sensors {
    /// Field-wise tolerance comparison: floating fields compare through
    /// [`almost_eq`], everything else exactly.
    pub fn almost_eq(&self, other: &Self, epsilon: Option<f64>) -> bool {
        let feq = |a: f64, b: f64| almost_eq(a, b, epsilon);
        self.time == other.time
            && self.setpoint == other.setpoint
            && self.track_id == other.track_id
            && self.tunnel == other.tunnel
            && self.num_passengers == other.num_passengers
            && self.warnings == other.warnings
            && self.alarms == other.alarms
            && feq(
                self.position.get::<si::meter>(),
                other.position.get::<si::meter>(),
            )
            && feq(
                self.velocity.get::<si::meter_per_second>(),
                other.velocity.get::<si::meter_per_second>(),
            )
            && feq(
                self.acceleration.get::<si::meter_per_second_squared>(),
                other.acceleration.get::<si::meter_per_second_squared>(),
            )
            && feq(
                self.traction_force.get::<si::newton>(),
                other.traction_force.get::<si::newton>(),
            )
            && feq(
                self.braking_force.get::<si::newton>(),
                other.braking_force.get::<si::newton>(),
            )
            && feq(
                self.traction_power.get::<si::watt>(),
                other.traction_power.get::<si::watt>(),
            )
            && feq(
                self.braking_power.get::<si::watt>(),
                other.braking_power.get::<si::watt>(),
            )
            && feq(
                self.mass.get::<si::kilogram>(),
                other.mass.get::<si::kilogram>(),
            )
            && feq(
                self.rel_position.get::<si::meter>(),
                other.rel_position.get::<si::meter>(),
            )
            && feq(self.slope.get::<si::radian>(), other.slope.get::<si::radian>())
            && feq(
                self.bend_radius.get::<si::meter>(),
                other.bend_radius.get::<si::meter>(),
            )
            && feq(
                self.basic_res.get::<si::newton>(),
                other.basic_res.get::<si::newton>(),
            )
            && feq(
                self.slope_res.get::<si::newton>(),
                other.slope_res.get::<si::newton>(),
            )
            && feq(
                self.curve_res.get::<si::newton>(),
                other.curve_res.get::<si::newton>(),
            )
            && feq(
                self.tunnel_res.get::<si::newton>(),
                other.tunnel_res.get::<si::newton>(),
            )
            && feq(
                self.line_res.get::<si::newton>(),
                other.line_res.get::<si::newton>(),
            )
            && feq(
                self.resistance.get::<si::newton>(),
                other.resistance.get::<si::newton>(),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_serialize_as_rfc3339() {
        let sensors = Sensors::valid();
        let raw: serde_json::Value =
            serde_json::from_str(&sensors.to_json().unwrap()).unwrap();
        assert_eq!(raw["time"], serde_json::json!("1970-01-01T00:00:00Z"));
        assert_eq!(raw["setpoint"]["value"], serde_json::json!(0.0));
    }

    #[test]
    fn emergency_brake_survives_a_json_round_trip() {
        let setpoint = Setpoint::emergency_brake();
        let json = setpoint.to_json().unwrap();
        assert!(json.contains("\"-inf\""));

        let back = Setpoint::from_json(json).unwrap();
        assert!(back.is_emergency_brake());
        assert_eq!(back, setpoint);
    }

    #[test]
    fn finite_setpoints_stay_numbers() {
        let setpoint = Setpoint::new(0.5 * uc::MPS2, DateTime::UNIX_EPOCH);
        let raw: serde_json::Value =
            serde_json::from_str(&setpoint.to_json().unwrap()).unwrap();
        assert_eq!(raw["value"], serde_json::json!(0.5));
        assert_eq!(Setpoint::from_json(setpoint.to_json().unwrap()).unwrap(), setpoint);
    }

    #[test]
    fn empty_warning_sets_are_omitted_from_json() {
        let json = Sensors::valid().to_json().unwrap();
        assert!(!json.contains("warnings"));
        assert!(!json.contains("alarms"));
    }

    #[test]
    fn almost_eq_tolerates_float_noise() {
        let a = Sensors::valid();
        let mut b = a.clone();
        b.resistance = 1e-12 * uc::N;
        assert!(a.almost_eq(&b, Some(1e-6)));

        b.track_id = 9;
        assert!(!a.almost_eq(&b, Some(1e-6)));
    }
}
