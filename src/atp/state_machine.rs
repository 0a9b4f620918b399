//! The supervisor's finite-state machine.

use crate::imports::*;

/// Operating state of the protection layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Pre-start placeholder, only ever visible as a previous state.
    Init,
    /// Powered and standing by; setpoints are stored but not followed.
    On,
    /// Following driver setpoints.
    Active,
    /// An out-of-limits observation is pending; dwell escalates to alarm.
    Warning,
    /// The supervisor has seized control and brakes to a stop.
    Alarm,
    /// Unrecoverable fault; the process terminates.
    Panic,
    /// Graceful stop in progress.
    Shutdown,
    /// Terminated; no further requests are served.
    Off,
}

/// Not internally synchronized: the supervisor task is its only owner.
#[derive(Debug, Clone)]
pub(crate) struct StateMachine {
    status: Status,
    prev: Status,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            status: Status::On,
            prev: Status::Init,
        }
    }

    pub fn get(&self) -> Status {
        self.status
    }

    pub fn prev(&self) -> Status {
        self.prev
    }

    fn can_set(&self, to: Status) -> bool {
        use Status::*;
        let from = self.status;
        from == to
            || matches!(to, Alarm | Panic | Shutdown)
            || matches!(
                (from, to),
                (On, Active)
                    | (On, Warning)
                    | (Active, On)
                    | (Active, Warning)
                    | (Warning, Active)
                    | (Warning, On)
                    | (Alarm, On)
                    | (Shutdown, Off)
            )
    }

    /// Moves to `to` if the transition relation allows it. Setting the
    /// current state again is an accepted no-op that leaves `prev` alone.
    pub fn set(&mut self, to: Status) -> Result<(), Error> {
        let from = self.status;
        if from == to {
            return Ok(());
        }
        if !self.can_set(to) {
            warn!("attempt to set state {to:?} from {from:?}");
            return Err(Error::IllegalTransition { from, to });
        }
        self.prev = from;
        self.status = to;
        info!("ATP state set to {to:?}");
        Ok(())
    }
}
