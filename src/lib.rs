//! Train motion dynamics with an automatic train protection (ATP) layer.
//!
//! The crate has two tightly coupled halves:
//!
//! - [`train::Engine`] — a discrete-time integrator that advances a
//!   train's [`Sensors`](train::Sensors) along a [`Route`](track::Route)
//!   of track segments under a commanded acceleration
//!   [`Setpoint`](train::Setpoint), clamping against the physical limits
//!   of the [`Train`](train::Train) and the line, and recording
//!   out-of-limits observations inline in the produced sensors.
//! - [`atp::Atp`] — a supervisor task that owns the engine, steps it on a
//!   fixed tick, reclassifies its state from the produced warnings and
//!   alarms, overrides the setpoint with the emergency brake during
//!   alarms, and serves client requests over message channels.
//!
//! All physical quantities are strongly typed SI values; wall-clock
//! timestamps are RFC3339 on the wire. See [`scenario`] for the persisted
//! specification formats.

pub mod atp;
pub mod error;
mod imports;
pub mod prelude;
pub mod scenario;
pub mod si;
pub mod track;
pub mod traits;
pub mod train;
pub mod uc;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
