//! Discrete-time forward integration of one train along its route.

use crate::imports::*;
use crate::track::{Route, TrackSegment};
use crate::train::alert::{BoundKind, Heartbeat, OutOfBounds, Warnings};
use crate::train::resistance;
use crate::train::sensors::{Sensors, Setpoint};
use crate::train::{Train, MEAN_PASSENGER_MASS};
use std::marker::PhantomData;

/// Velocities below this count as standstill; trains do not reverse.
pub(crate) const CREEP_VELOCITY: si::Velocity = si::Velocity {
    dimension: PhantomData,
    units: PhantomData,
    value: 0.01,
};

/// Owns the train specification, the route ahead and the latest sensor
/// snapshot, and advances them tick by tick. Purely functional per call:
/// given the same previous sensors, setpoint and target instant it always
/// produces the same snapshot, and it performs no IO beyond advisory logs.
#[derive(Debug, Clone)]
pub struct Engine {
    train: Train,
    route: Route,
    sensors: Sensors,
    /// Longest tolerated silence between setpoints, supplied by the owner.
    heartbeat_timeout: Duration,
}

impl Engine {
    pub fn new(
        train: Train,
        route: Vec<TrackSegment>,
        sensors: Sensors,
        heartbeat_timeout: Duration,
    ) -> Self {
        Self {
            train,
            route: Route::new(route),
            sensors,
            heartbeat_timeout,
        }
    }

    pub fn train(&self) -> &Train {
        &self.train
    }

    /// The snapshot computed by the most recent update.
    pub fn sensors(&self) -> &Sensors {
        &self.sensors
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Replaces the route ahead. While a route is loaded, the replacement
    /// must begin with the segment the train is currently on.
    pub fn set_route(&mut self, segments: Vec<TrackSegment>) -> Result<(), Error> {
        if !self.route.is_empty() {
            match segments.first() {
                Some(head) if head.id == self.sensors.track_id => {}
                other => {
                    return Err(Error::InvalidRoute {
                        expected: self.sensors.track_id,
                        found: other.map(|segment| segment.id),
                    });
                }
            }
        }
        self.route = Route::new(segments);
        Ok(())
    }

    /// Integrates the train state forward to wall-clock `until` under
    /// `setpoint`, replacing and returning the sensor snapshot.
    ///
    /// Limit violations are recorded as warnings in the returned sensors;
    /// a stale setpoint records a heartbeat alarm. Errors mean the engine
    /// can no longer produce a valid state and the caller must treat the
    /// train as lost.
    pub fn update(&mut self, setpoint: Setpoint, until: DateTime<Utc>) -> Result<Sensors, Error> {
        let prev = &self.sensors;
        let train = &self.train;

        let dt = until
            .signed_duration_since(prev.time)
            .to_std()
            .map_err(|_| {
                Error::NegativeTimeStep((until - prev.time).num_milliseconds() as f64 / 1e3)
            })?
            .as_secs_f64()
            * uc::S;

        // The head segment is consumed one tick after the train ran past
        // its end (strictly beyond; stopping exactly on the joint stays).
        let mut segment = *self.route.head()?;
        let entered_new_segment = prev.rel_position > segment.length;
        if entered_new_segment {
            segment = *self.route.advance()?;
        }

        let mut warnings = Warnings::default();
        let mut alarms = Warnings::default();

        let num_passengers = prev.num_passengers;
        let mass = train.mass + num_passengers as f64 * MEAN_PASSENGER_MASS;

        let mut velocity = (prev.velocity + dt * prev.acceleration).max(si::Velocity::ZERO);
        if velocity > train.max_velocity {
            warn!(
                "velocity {:.3} m/s exceeds the train maximum {:.3} m/s",
                velocity.get::<si::meter_per_second>(),
                train.max_velocity.get::<si::meter_per_second>()
            );
            warnings.push(OutOfBounds {
                kind: BoundKind::Velocity,
                min: 0.0,
                max: train.max_velocity.get::<si::meter_per_second>(),
                value: velocity.get::<si::meter_per_second>(),
            });
        }
        if velocity > segment.max_velocity {
            warn!(
                "velocity {:.3} m/s exceeds the line limit {:.3} m/s on segment {}",
                velocity.get::<si::meter_per_second>(),
                segment.max_velocity.get::<si::meter_per_second>(),
                segment.id
            );
            warnings.push(OutOfBounds {
                kind: BoundKind::Velocity,
                min: 0.0,
                max: segment.max_velocity.get::<si::meter_per_second>(),
                value: velocity.get::<si::meter_per_second>(),
            });
        }

        let travelled = 0.5 * (prev.velocity + velocity) * dt;
        let position = prev.position + travelled;
        let rel_position = if entered_new_segment {
            travelled
        } else {
            prev.rel_position + travelled
        };

        let slope_res = resistance::slope(mass, segment.slope);
        let basic_res = resistance::basic(train, mass, segment.slope, velocity);
        let curve_res = resistance::curve(mass, segment.bend_radius, velocity);
        let tunnel_res = resistance::tunnel(&segment, rel_position, velocity);
        let line_res = slope_res + curve_res + tunnel_res;
        let total_res = basic_res + line_res;

        let inertial_mass = mass * train.mass_factor;
        let a_max = (train.max_traction - total_res) / inertial_mass;
        let a_min = (-train.max_brake - total_res) / inertial_mass;
        let commanded = setpoint.value;
        let mut acceleration = if commanded > a_max {
            warn!(
                "setpoint {:.3} m/s2 exceeds the feasible maximum {:.3} m/s2",
                commanded.get::<si::meter_per_second_squared>(),
                a_max.get::<si::meter_per_second_squared>()
            );
            warnings.push(OutOfBounds {
                kind: BoundKind::Acceleration,
                min: a_min.get::<si::meter_per_second_squared>(),
                max: a_max.get::<si::meter_per_second_squared>(),
                value: commanded.get::<si::meter_per_second_squared>(),
            });
            a_max
        } else if commanded < a_min {
            // Saturating the emergency brake is intended, not a warning.
            if !setpoint.is_emergency_brake() {
                warn!(
                    "setpoint {:.3} m/s2 exceeds the feasible minimum {:.3} m/s2",
                    commanded.get::<si::meter_per_second_squared>(),
                    a_min.get::<si::meter_per_second_squared>()
                );
                warnings.push(OutOfBounds {
                    kind: BoundKind::Acceleration,
                    min: a_min.get::<si::meter_per_second_squared>(),
                    max: a_max.get::<si::meter_per_second_squared>(),
                    value: commanded.get::<si::meter_per_second_squared>(),
                });
            }
            a_min
        } else {
            commanded
        };

        // There is no reverse gear: braking commands at standstill hold the
        // train instead of backing it up.
        if commanded < si::Acceleration::ZERO && velocity < CREEP_VELOCITY {
            acceleration = si::Acceleration::ZERO;
            velocity = si::Velocity::ZERO;
        }
        // A reading exactly at creep speed must not keep decelerating.
        if velocity == CREEP_VELOCITY && acceleration < si::Acceleration::ZERO {
            acceleration = si::Acceleration::ZERO;
        }

        let force = inertial_mass * acceleration + total_res;
        let (traction_force, braking_force) = if force >= si::Force::ZERO {
            if force > train.max_traction {
                warn!(
                    "traction force {:.0} N exceeds the maximum {:.0} N",
                    force.get::<si::newton>(),
                    train.max_traction.get::<si::newton>()
                );
                warnings.push(OutOfBounds {
                    kind: BoundKind::Force,
                    min: 0.0,
                    max: train.max_traction.get::<si::newton>(),
                    value: force.get::<si::newton>(),
                });
            }
            (force.min(train.max_traction), si::Force::ZERO)
        } else {
            if -force > train.max_brake {
                warn!(
                    "braking force {:.0} N exceeds the maximum {:.0} N",
                    (-force).get::<si::newton>(),
                    train.max_brake.get::<si::newton>()
                );
                warnings.push(OutOfBounds {
                    kind: BoundKind::Force,
                    min: 0.0,
                    max: train.max_brake.get::<si::newton>(),
                    value: (-force).get::<si::newton>(),
                });
            }
            (si::Force::ZERO, (-force).min(train.max_brake))
        };

        if let Ok(elapsed) = until.signed_duration_since(setpoint.time).to_std() {
            if elapsed >= self.heartbeat_timeout {
                alarms.push(Heartbeat {
                    last_time: setpoint.time,
                    threshold: self.heartbeat_timeout,
                });
            }
        }

        let new = Sensors {
            time: until,
            setpoint,
            position,
            velocity,
            acceleration,
            traction_force,
            braking_force,
            traction_power: traction_force * velocity,
            braking_power: braking_force * velocity,
            mass,
            track_id: segment.id,
            rel_position,
            slope: segment.slope,
            bend_radius: segment.bend_radius,
            tunnel: segment.tunnel,
            basic_res,
            slope_res,
            curve_res,
            tunnel_res,
            line_res,
            resistance: total_res,
            num_passengers,
            warnings,
            alarms,
        };
        self.sensors = new.clone();
        Ok(new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use chrono::TimeDelta;

    const HEARTBEAT: Duration = Duration::from_secs(5);

    fn epoch() -> DateTime<Utc> {
        DateTime::UNIX_EPOCH
    }

    fn after(seconds: i64) -> DateTime<Utc> {
        epoch() + TimeDelta::seconds(seconds)
    }

    fn flat_engine(sensors: Sensors) -> Engine {
        Engine::new(
            Train::valid(),
            vec![TrackSegment::valid()],
            sensors,
            HEARTBEAT,
        )
    }

    fn setpoint(value: si::Acceleration) -> Setpoint {
        Setpoint::new(value, epoch())
    }

    #[test]
    fn golden_update_cases() {
        let cases = testing::update_cases();
        assert!(!cases.is_empty());
        for (alias, case) in cases {
            let (train, route, sensors) = testing::scenario(&case.scenario);
            let mut engine = Engine::new(train, route, sensors, HEARTBEAT);
            let got = engine.update(case.setpoint, case.expected.time).unwrap();
            assert!(
                got.almost_eq(&case.expected, Some(1e-6)),
                "case {alias}: got {got:#?}, expected {:#?}",
                case.expected
            );
        }
    }

    #[test]
    fn zero_time_step_changes_nothing() {
        let mut sensors = Sensors::valid();
        sensors.velocity = 5.0 * uc::MPS;
        let mut engine = flat_engine(sensors);

        let got = engine.update(setpoint(si::Acceleration::ZERO), epoch()).unwrap();
        assert_eq!(got.time, epoch());
        assert_eq!(got.velocity, 5.0 * uc::MPS);
        assert_eq!(got.position, si::Length::ZERO);
        assert_eq!(got.acceleration, si::Acceleration::ZERO);
    }

    #[test]
    fn a_backwards_clock_is_rejected() {
        let mut sensors = Sensors::valid();
        sensors.time = after(10);
        let mut engine = flat_engine(sensors);

        let err = engine
            .update(setpoint(si::Acceleration::ZERO), after(9))
            .unwrap_err();
        assert!(matches!(err, Error::NegativeTimeStep(_)));
    }

    #[test]
    fn stopping_exactly_on_the_joint_does_not_advance() {
        let mut short = TrackSegment::valid();
        short.id = 11;
        short.length = 10.0 * uc::M;
        let mut second = TrackSegment::valid();
        second.id = 12;

        let mut sensors = Sensors::valid();
        sensors.track_id = 11;
        sensors.rel_position = 10.0 * uc::M;
        sensors.position = 10.0 * uc::M;

        let mut engine = Engine::new(Train::valid(), vec![short, second], sensors, HEARTBEAT);
        let got = engine.update(setpoint(si::Acceleration::ZERO), after(1)).unwrap();
        assert_eq!(got.track_id, 11);
    }

    #[test]
    fn running_past_the_joint_advances_next_tick() {
        let mut short = TrackSegment::valid();
        short.id = 11;
        short.length = 10.0 * uc::M;
        let mut second = TrackSegment::valid();
        second.id = 12;

        let mut sensors = Sensors::valid();
        sensors.track_id = 11;
        sensors.velocity = 2.0 * uc::MPS;
        sensors.rel_position = 10.5 * uc::M;
        sensors.position = 10.5 * uc::M;

        let mut engine = Engine::new(Train::valid(), vec![short, second], sensors, HEARTBEAT);
        let got = engine.update(setpoint(si::Acceleration::ZERO), after(1)).unwrap();
        assert_eq!(got.track_id, 12);
        // Distance into the fresh segment restarts at this tick's travel.
        assert_eq!(got.rel_position, 2.0 * uc::M);
        assert_eq!(got.position, 12.5 * uc::M);
    }

    #[test]
    fn running_out_of_segments_is_fatal() {
        let mut short = TrackSegment::valid();
        short.length = 10.0 * uc::M;

        let mut sensors = Sensors::valid();
        sensors.rel_position = 10.5 * uc::M;

        let mut engine = Engine::new(Train::valid(), vec![short], sensors, HEARTBEAT);
        let err = engine
            .update(setpoint(si::Acceleration::ZERO), after(1))
            .unwrap_err();
        assert_eq!(err, Error::OutOfRails);
    }

    #[test]
    fn passengers_add_to_the_train_mass() {
        let mut sensors = Sensors::valid();
        sensors.num_passengers = 100;
        let mut engine = flat_engine(sensors);

        let got = engine.update(setpoint(si::Acceleration::ZERO), after(1)).unwrap();
        assert_eq!(got.mass, 57_000.0 * uc::KG);
        assert_eq!(got.num_passengers, 100);
    }

    #[test]
    fn braking_at_standstill_holds_the_train() {
        let mut sensors = Sensors::valid();
        sensors.velocity = 0.005 * uc::MPS;
        sensors.acceleration = -0.5 * uc::MPS2;
        let mut engine = flat_engine(sensors);

        let got = engine.update(setpoint(-0.5 * uc::MPS2), after(1)).unwrap();
        assert_eq!(got.velocity, si::Velocity::ZERO);
        assert_eq!(got.acceleration, si::Acceleration::ZERO);
        assert_eq!(got.traction_force, si::Force::ZERO);
        assert_eq!(got.braking_force, si::Force::ZERO);
    }

    #[test]
    fn a_creep_speed_reading_stops_decelerating() {
        let mut sensors = Sensors::valid();
        sensors.velocity = 0.01 * uc::MPS;
        let mut engine = flat_engine(sensors);

        let got = engine.update(setpoint(-0.5 * uc::MPS2), after(1)).unwrap();
        assert_eq!(got.velocity, 0.01 * uc::MPS);
        assert_eq!(got.acceleration, si::Acceleration::ZERO);
    }

    #[test]
    fn the_emergency_brake_saturates_without_warnings() {
        let mut sensors = Sensors::valid();
        sensors.velocity = 5.0 * uc::MPS;
        let mut engine = flat_engine(sensors);

        let mut emergency = Setpoint::emergency_brake();
        emergency.time = epoch();
        let got = engine.update(emergency, after(1)).unwrap();

        assert!(!got
            .warnings
            .out_of_bounds
            .iter()
            .any(|w| w.kind == BoundKind::Acceleration));
        assert!(got.acceleration < si::Acceleration::ZERO);
        assert_eq!(got.traction_force, si::Force::ZERO);
        // Full saturation commands exactly the brake limit.
        assert!(almost_eq(
            got.braking_force.get::<si::newton>(),
            Train::valid().max_brake.get::<si::newton>(),
            None
        ));
    }

    #[test]
    fn a_setpoint_exactly_at_the_limit_is_accepted() {
        let train = Train::valid();
        // At rest on level straight track the resistance is zero.
        let a_max = train.max_traction / (train.mass * train.mass_factor);

        let accel_warnings = |sensors: &Sensors| {
            sensors
                .warnings
                .out_of_bounds
                .iter()
                .filter(|w| w.kind == BoundKind::Acceleration)
                .count()
        };

        let mut engine = flat_engine(Sensors::valid());
        let got = engine.update(setpoint(a_max), after(1)).unwrap();
        assert_eq!(accel_warnings(&got), 0);
        assert_eq!(got.acceleration, a_max);

        let mut engine = flat_engine(Sensors::valid());
        let got = engine.update(setpoint(1.01 * a_max), after(1)).unwrap();
        assert_eq!(accel_warnings(&got), 1);
        assert_eq!(got.acceleration, a_max);
    }

    #[test]
    fn overspeed_records_one_warning_per_exceeded_limit() {
        let mut slow = TrackSegment::valid();
        slow.id = 3;
        slow.max_velocity = 0.1 * uc::MPS;

        let mut sensors = Sensors::valid();
        sensors.track_id = 3;
        sensors.velocity = 25.0 * uc::MPS;

        let mut engine = Engine::new(Train::valid(), vec![slow], sensors, HEARTBEAT);
        let got = engine.update(setpoint(si::Acceleration::ZERO), after(1)).unwrap();

        let oob = &got.warnings.out_of_bounds;
        assert_eq!(oob.len(), 2);
        assert_eq!(oob[0].max, 20.0);
        assert_eq!(oob[1].max, 0.1);
        assert!(oob.iter().all(|w| w.kind == BoundKind::Velocity && w.value == 25.0));
    }

    #[test]
    fn a_stale_setpoint_records_a_heartbeat_alarm() {
        let mut engine = flat_engine(Sensors::valid());
        let got = engine.update(setpoint(si::Acceleration::ZERO), after(6)).unwrap();
        assert_eq!(got.alarms.heartbeat.len(), 1);
        assert_eq!(got.alarms.heartbeat[0].last_time, epoch());
        assert_eq!(got.alarms.heartbeat[0].threshold, HEARTBEAT);

        let mut engine = flat_engine(Sensors::valid());
        let got = engine.update(setpoint(si::Acceleration::ZERO), after(4)).unwrap();
        assert!(got.alarms.is_empty());
    }

    #[test]
    fn forces_stay_exclusive_and_position_monotone() {
        let mut engine = flat_engine(Sensors::valid());
        let commands = [2.0, 2.0, 0.0, -1.0, -2.0, -2.0];
        let mut last_position = si::Length::ZERO;
        for (i, a) in commands.into_iter().enumerate() {
            let got = engine
                .update(Setpoint::new(a * uc::MPS2, after(i as i64)), after(i as i64 + 1))
                .unwrap();
            assert!(got.velocity >= si::Velocity::ZERO);
            assert!(got.traction_force * got.braking_force == si::Force::ZERO * si::Force::ZERO);
            assert!(got.traction_force <= Train::valid().max_traction);
            assert!(got.braking_force <= Train::valid().max_brake);
            assert!(got.position >= last_position);
            last_position = got.position;
        }
    }

    #[test]
    fn route_swap_requires_a_matching_head() {
        let mut engine = flat_engine(Sensors::valid());

        let mut stranger = TrackSegment::valid();
        stranger.id = 9;
        assert_eq!(
            engine.set_route(vec![stranger]),
            Err(Error::InvalidRoute {
                expected: 1,
                found: Some(9),
            })
        );
        assert_eq!(
            engine.set_route(Vec::new()),
            Err(Error::InvalidRoute {
                expected: 1,
                found: None,
            })
        );

        let mut extension = TrackSegment::valid();
        extension.id = 9;
        engine
            .set_route(vec![TrackSegment::valid(), extension])
            .unwrap();
        let ids: Vec<u32> = engine.route().segments().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 9]);
    }

    #[test]
    fn any_route_may_be_loaded_onto_an_empty_engine() {
        let mut engine = Engine::new(Train::valid(), Vec::new(), Sensors::valid(), HEARTBEAT);
        let mut stranger = TrackSegment::valid();
        stranger.id = 9;
        engine.set_route(vec![stranger]).unwrap();
        assert_eq!(engine.route().head().unwrap().id, 9);
    }
}
