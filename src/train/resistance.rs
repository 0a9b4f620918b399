//! Per-tick resistance decomposition: basic (Davis), slope, curve and
//! tunnel contributions, each as a pure function of the current geometry
//! and speed.

use crate::imports::*;
use crate::track::TrackSegment;
use crate::train::Train;
use std::marker::PhantomData;

/// Bend radii at or below this bound have no valid reading in the empirical
/// curve formula; such segments are hazardous at speed.
pub const MIN_SAFE_BEND_RADIUS: si::Length = si::Length {
    dimension: PhantomData,
    units: PhantomData,
    value: 100.0,
};

/// Below this radius the tight-curve coefficient applies.
const TIGHT_BEND_RADIUS: si::Length = si::Length {
    dimension: PhantomData,
    units: PhantomData,
    value: 300.0,
};

/// Empirical offset subtracted from the bend radius in the curve formula.
const CURVE_RADIUS_OFFSET: si::Length = si::Length {
    dimension: PhantomData,
    units: PhantomData,
    value: 55.0,
};

/// Davis rolling/mechanical drag. Vanishes for a train at rest on level
/// track.
pub(crate) fn basic(
    train: &Train,
    mass: si::Mass,
    angle: si::Angle,
    velocity: si::Velocity,
) -> si::Force {
    if angle == si::Angle::ZERO && velocity == si::Velocity::ZERO {
        return si::Force::ZERO;
    }
    mass * (train.resistance_lin + train.resistance_qua * (velocity * velocity))
}

/// Gravity component along the track.
pub(crate) fn slope(mass: si::Mass, angle: si::Angle) -> si::Force {
    mass * uc::ACC_GRAV * angle.sin()
}

/// Curve drag from flange contact. Only applies while moving.
pub(crate) fn curve(mass: si::Mass, bend_radius: si::Length, velocity: si::Velocity) -> si::Force {
    if velocity == si::Velocity::ZERO {
        return si::Force::ZERO;
    }
    if bend_radius <= MIN_SAFE_BEND_RADIUS {
        // TODO: raise a dedicated alarm for sub-100 m bends instead of
        // silently reporting zero drag.
        si::Force::ZERO
    } else if bend_radius < TIGHT_BEND_RADIUS {
        4.91 * uc::J_PER_KG * mass / (bend_radius - CURVE_RADIUS_OFFSET)
    } else {
        6.3 * uc::J_PER_KG * mass / (bend_radius - CURVE_RADIUS_OFFSET)
    }
}

/// Aerodynamic drag from the tunnel section still ahead of the train.
pub(crate) fn tunnel(
    segment: &TrackSegment,
    rel_position: si::Length,
    velocity: si::Velocity,
) -> si::Force {
    if !segment.tunnel {
        return si::Force::ZERO;
    }
    let remaining = (segment.length - rel_position).max(si::Length::ZERO);
    // The empirical coefficient carries kg·s²/m³, a dimension with no named
    // quantity; the product is assembled from raw SI magnitudes.
    si::Force::new::<si::newton>(
        1.296e-9
            * remaining.get::<si::meter>()
            * uc::ACC_GRAV.get::<si::meter_per_second_squared>()
            * velocity.get::<si::meter_per_second>().powi(2),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MASS: si::Mass = si::Mass {
        dimension: PhantomData,
        units: PhantomData,
        value: 50_000.0,
    };

    #[test]
    fn basic_vanishes_at_rest_on_level_track() {
        let train = Train::valid();
        assert_eq!(
            basic(&train, MASS, si::Angle::ZERO, si::Velocity::ZERO),
            si::Force::ZERO
        );
    }

    #[test]
    fn basic_applies_at_rest_on_a_grade() {
        let train = Train::valid();
        let res = basic(&train, MASS, 0.2 * uc::RAD, si::Velocity::ZERO);
        // Only the linear term: 50000 kg * 0.002 N/kg.
        assert_relative_eq!(res.get::<si::newton>(), 100.0, max_relative = 1e-12);
    }

    #[test]
    fn basic_grows_with_the_square_of_speed() {
        let train = Train::valid();
        let res = basic(&train, MASS, si::Angle::ZERO, 5.0 * uc::MPS);
        // 50000 * (0.002 + 3.75e-5 * 25)
        assert_relative_eq!(res.get::<si::newton>(), 146.875, max_relative = 1e-12);
    }

    #[test]
    fn slope_is_the_along_track_weight_component() {
        let res = slope(MASS, 0.2 * uc::RAD);
        let expected = 50_000.0 * 9.806_65 * 0.2f64.sin();
        assert_relative_eq!(res.get::<si::newton>(), expected, max_relative = 1e-12);
    }

    #[test]
    fn curve_is_zero_while_standing() {
        assert_eq!(
            curve(MASS, 255.0 * uc::M, si::Velocity::ZERO),
            si::Force::ZERO
        );
    }

    #[test]
    fn dangerous_bends_report_zero_drag() {
        assert_eq!(curve(MASS, 90.0 * uc::M, 5.0 * uc::MPS), si::Force::ZERO);
        assert_eq!(curve(MASS, 100.0 * uc::M, 5.0 * uc::MPS), si::Force::ZERO);
    }

    #[test]
    fn tight_bends_use_the_low_coefficient() {
        // 4.91 * 50000 / (255 - 55)
        let res = curve(MASS, 255.0 * uc::M, 5.0 * uc::MPS);
        assert_relative_eq!(res.get::<si::newton>(), 1227.5, max_relative = 1e-12);
    }

    #[test]
    fn wide_bends_use_the_high_coefficient() {
        // 6.3 * 50000 / (100055 - 55)
        let res = curve(MASS, 100_055.0 * uc::M, 5.0 * uc::MPS);
        assert_relative_eq!(res.get::<si::newton>(), 3.15, max_relative = 1e-12);
    }

    #[test]
    fn tunnel_drag_decays_toward_the_exit() {
        let mut segment = TrackSegment::valid();
        segment.tunnel = true;

        let near_entry = tunnel(&segment, 100.0 * uc::M, 10.0 * uc::MPS);
        let near_exit = tunnel(&segment, 900.0 * uc::M, 10.0 * uc::MPS);
        assert!(near_entry > near_exit);

        let expected = 1.296e-9 * 900.0 * 9.806_65 * 100.0;
        assert_relative_eq!(
            near_entry.get::<si::newton>(),
            expected,
            max_relative = 1e-12
        );
    }

    #[test]
    fn tunnel_drag_clamps_past_the_segment_end() {
        let mut segment = TrackSegment::valid();
        segment.tunnel = true;
        assert_eq!(
            tunnel(&segment, 1100.0 * uc::M, 10.0 * uc::MPS),
            si::Force::ZERO
        );
    }

    #[test]
    fn open_track_has_no_tunnel_drag() {
        let segment = TrackSegment::valid();
        assert_eq!(
            tunnel(&segment, 100.0 * uc::M, 10.0 * uc::MPS),
            si::Force::ZERO
        );
    }
}
