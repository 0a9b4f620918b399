//! Warning and alarm records that the engine embeds in each sensor snapshot.
//!
//! These are observations, not errors: the supervisor reads them to decide
//! state transitions, and readers see them in the published sensors.

use crate::imports::*;

/// Quantity observed out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundKind {
    Velocity,
    Acceleration,
    Force,
}

/// A recoverable out-of-limits observation. Bounds and value are raw SI
/// magnitudes of the observed quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutOfBounds {
    pub kind: BoundKind,
    #[serde(default)]
    pub min: f64,
    #[serde(default)]
    pub max: f64,
    pub value: f64,
}

impl fmt::Display for OutOfBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {} out of bounds. Min: {}, Max: {}.",
            self.kind, self.value, self.min, self.max
        )
    }
}

/// Raised when no fresh setpoint arrived within the allowed window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub last_time: DateTime<Utc>,
    pub threshold: Duration,
}

impl fmt::Display for Heartbeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No setpoint received for more than {:?}. Last one was at {}.",
            self.threshold, self.last_time
        )
    }
}

/// Either record kind, for type-routed insertion into [`Warnings`].
#[derive(Debug, Clone, PartialEq, From)]
pub enum Alert {
    OutOfBounds(OutOfBounds),
    Heartbeat(Heartbeat),
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::OutOfBounds(oob) => oob.fmt(f),
            Alert::Heartbeat(hb) => hb.fmt(f),
        }
    }
}

/// Ordered collections of every record raised during one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Warnings {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub out_of_bounds: Vec<OutOfBounds>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub heartbeat: Vec<Heartbeat>,
}

impl Warnings {
    /// True if at least one record of any kind is present.
    pub fn any(&self) -> bool {
        !self.out_of_bounds.is_empty() || !self.heartbeat.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.any()
    }

    /// Appends a record to the sequence of its kind.
    pub fn push(&mut self, alert: impl Into<Alert>) {
        let alert = alert.into();
        debug!("{alert}");
        match alert {
            Alert::OutOfBounds(oob) => self.out_of_bounds.push(oob),
            Alert::Heartbeat(hb) => self.heartbeat.push(hb),
        }
    }
}
