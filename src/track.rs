//! Track geometry specifications and the route ahead of the train.

use crate::imports::*;

/// Geometry and limits of one stretch of track. Frozen after construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackSegment {
    pub id: u32,
    pub length: si::Length,
    /// Line speed limit on this segment.
    pub max_velocity: si::Velocity,
    /// Gradient, positive uphill.
    pub slope: si::Angle,
    /// Curvature radius; a very large value means effectively straight.
    pub bend_radius: si::Length,
    pub tunnel: bool,
}

impl SerdeAPI for TrackSegment {}

impl Valid for TrackSegment {
    fn valid() -> Self {
        Self {
            id: 1,
            length: 1000.0 * uc::M,
            max_velocity: 20.0 * uc::MPS,
            slope: si::Angle::ZERO,
            bend_radius: 100_055.0 * uc::M,
            tunnel: false,
        }
    }
}

/// The ordered queue of segments the train still has to cover. The head is
/// always the segment under the train; segments leave only from the head as
/// the train runs past their end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Route {
    segments: VecDeque<TrackSegment>,
}

impl Route {
    pub fn new(segments: impl Into<VecDeque<TrackSegment>>) -> Self {
        Self {
            segments: segments.into(),
        }
    }

    /// The segment the train is currently on.
    pub fn head(&self) -> Result<&TrackSegment, Error> {
        self.segments.front().ok_or(Error::OutOfRails)
    }

    /// Drops the head segment and returns the new head.
    pub fn advance(&mut self) -> Result<&TrackSegment, Error> {
        self.segments.pop_front();
        self.segments.front().ok_or(Error::OutOfRails)
    }

    pub fn segments(&self) -> &VecDeque<TrackSegment> {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl From<Vec<TrackSegment>> for Route {
    fn from(segments: Vec<TrackSegment>) -> Self {
        Self::new(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_segments() -> Vec<TrackSegment> {
        let mut second = TrackSegment::valid();
        second.id = 2;
        vec![TrackSegment::valid(), second]
    }

    #[test]
    fn head_is_first_segment() {
        let route = Route::new(two_segments());
        assert_eq!(route.head().unwrap().id, 1);
        assert_eq!(route.len(), 2);
    }

    #[test]
    fn advance_consumes_from_the_head() {
        let mut route = Route::new(two_segments());
        assert_eq!(route.advance().unwrap().id, 2);
        assert_eq!(route.len(), 1);
    }

    #[test]
    fn advancing_past_the_last_segment_is_out_of_rails() {
        let mut route = Route::new(vec![TrackSegment::valid()]);
        assert_eq!(route.advance(), Err(Error::OutOfRails));
    }

    #[test]
    fn empty_route_has_no_head() {
        let route = Route::default();
        assert_eq!(route.head(), Err(Error::OutOfRails));
    }

    #[test]
    fn segment_json_round_trip() {
        let segment = TrackSegment::valid();
        let json = segment.to_json().unwrap();
        assert_eq!(TrackSegment::from_json(json).unwrap(), segment);
    }
}
