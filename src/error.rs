//! Custom error types

use crate::atp::Status;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The route queue has no segment left ahead of the train. Fatal: the
    /// supervisor answers this with a panic.
    #[error("route exhausted: no segment ahead of the train")]
    OutOfRails,
    /// The state machine rejected a transition. Always a programming error.
    #[error("illegal transition from {from:?} to {to:?}")]
    IllegalTransition { from: Status, to: Status },
    /// An update was requested for an instant earlier than the last sensor
    /// reading.
    #[error("sensor time would run backwards by {0} s")]
    NegativeTimeStep(f64),
    /// A replacement route does not begin with the segment the train is on.
    #[error("route head {found:?} does not match the current segment {expected}")]
    InvalidRoute { expected: u32, found: Option<u32> },
    /// `start` was requested in a state that cannot accept it.
    #[error("not ready to start: {0}")]
    NotReady(&'static str),
}
