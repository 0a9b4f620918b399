//! Shared fixtures: loads the JSON pack under `testdata/` and resolves
//! scenario aliases into ready-to-run pieces.

use crate::imports::*;
use crate::scenario::{Routes, Scenarios, Trains, UpdateCases};
use crate::track::TrackSegment;
use crate::train::{Sensors, Train};

fn testdata(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join(name)
}

pub(crate) fn trains() -> Trains {
    Trains::from_file(testdata("trains.json")).unwrap()
}

pub(crate) fn routes() -> Routes {
    Routes::from_file(testdata("tracks.json")).unwrap()
}

pub(crate) fn scenarios() -> Scenarios {
    Scenarios::from_file(testdata("scenarios.json")).unwrap()
}

pub(crate) fn update_cases() -> UpdateCases {
    UpdateCases::from_file(testdata("updateSensorsAcceleration.json")).unwrap()
}

/// Resolves a scenario alias into its train, route and seeded sensors.
pub(crate) fn scenario(alias: &str) -> (Train, Vec<TrackSegment>, Sensors) {
    let scenarios = scenarios();
    let scenario = scenarios
        .get(alias)
        .unwrap_or_else(|| panic!("scenario {alias} does not exist"));
    let train = trains()
        .remove(&scenario.train)
        .unwrap_or_else(|| panic!("train {} does not exist", scenario.train));
    let route = routes()
        .remove(&scenario.route)
        .unwrap_or_else(|| panic!("route {} does not exist", scenario.route));
    (train, route, scenario.sensors.clone())
}
