//! Automatic train protection: a supervision layer over train movement.
//!
//! One long-lived task owns the dynamics engine and a small state machine,
//! integrates the train forward on a fixed tick, and reclassifies the state
//! from the warnings and alarms each tick produces:
//!
//! - `On`: powered and standing by. Setpoints are accepted and stored but
//!   not followed until [`Atp::start`] is called.
//! - `Active`: the most recent driver setpoint is fed to the engine.
//! - `Warning`: the sensors carry an out-of-limits observation. The train
//!   keeps running; if the observation persists beyond the warning dwell,
//!   the state escalates to `Alarm`.
//! - `Alarm`: the supervisor seizes control, ignores driver setpoints and
//!   holds the emergency brake until standstill, then returns to `On`.
//! - `Shutdown`: graceful stop. A moving train cannot shut down and
//!   escalates to `Alarm` instead.
//! - `Off`: the loop has terminated; requests become no-ops.
//! - `Panic`: an unrecoverable engine fault; the process exits nonzero.
//!
//! Clients talk to the task over bounded single-item channels, one request
//! of each kind being drained per tick; replies travel over one-shot
//! channels, so no shared state needs locking.

mod config;
mod state_machine;

pub use config::AtpConfig;
pub use state_machine::Status;

use crate::imports::*;
use crate::track::TrackSegment;
use crate::train::engine::{Engine, CREEP_VELOCITY};
use crate::train::{Sensors, Setpoint, Train};
use state_machine::StateMachine;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

/// Exit code of the process after an unrecoverable fault.
const PANIC_EXIT_CODE: i32 = 1;

/// The sensor snapshot served to readers, paired with the supervisor state
/// it was taken under.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub sensors: Sensors,
    pub state: Status,
}

/// True once the train is at standstill: negligible speed and no commanded
/// acceleration left.
pub fn stopped(sensors: &Sensors) -> bool {
    sensors.velocity < CREEP_VELOCITY && sensors.acceleration < 0.01 * uc::MPS2
}

type Reply<T> = oneshot::Sender<T>;

/// Client-side senders, one bounded single-item channel per request kind.
#[derive(Clone)]
struct Api {
    start: mpsc::Sender<Reply<Result<(), Error>>>,
    stop: mpsc::Sender<()>,
    kill: mpsc::Sender<()>,
    get_sensors: mpsc::Sender<Reply<Snapshot>>,
    set_setpoint: mpsc::Sender<Setpoint>,
    set_route: mpsc::Sender<(Vec<TrackSegment>, Reply<Result<(), Error>>)>,
}

/// Supervisor-side receivers.
struct Requests {
    start: mpsc::Receiver<Reply<Result<(), Error>>>,
    stop: mpsc::Receiver<()>,
    kill: mpsc::Receiver<()>,
    get_sensors: mpsc::Receiver<Reply<Snapshot>>,
    set_setpoint: mpsc::Receiver<Setpoint>,
    set_route: mpsc::Receiver<(Vec<TrackSegment>, Reply<Result<(), Error>>)>,
}

/// Handle to a running supervisor. Cloneable; every method is an
/// asynchronous message exchange with the supervisor task. After the
/// supervisor reaches `Off`, reads return the final snapshot and writes
/// become no-ops.
#[derive(Clone)]
pub struct Atp {
    api: Api,
    terminal: watch::Receiver<Option<Snapshot>>,
}

impl Atp {
    /// Builds the engine from the given specifications, classifies the
    /// seeded sensors (pending warnings or alarms enter the matching
    /// state directly) and spawns the supervisor task.
    pub fn spawn(
        train: Train,
        route: Vec<TrackSegment>,
        mut sensors: Sensors,
        config: AtpConfig,
    ) -> Result<Self, Error> {
        // Fresh stamps so a dormant spec file does not trip the heartbeat.
        let now = Utc::now();
        sensors.time = now;
        sensors.setpoint.time = now;

        let mut state = StateMachine::new();
        if sensors.warnings.any() {
            state.set(Status::Warning)?;
        }
        if sensors.alarms.any() {
            state.set(Status::Alarm)?;
        }

        let setpoint = sensors.setpoint;
        let engine = Engine::new(train, route, sensors.clone(), config.heartbeat_timeout);

        let (start_tx, start_rx) = mpsc::channel(1);
        let (stop_tx, stop_rx) = mpsc::channel(1);
        let (kill_tx, kill_rx) = mpsc::channel(1);
        let (get_tx, get_rx) = mpsc::channel(1);
        let (setpoint_tx, setpoint_rx) = mpsc::channel(1);
        let (route_tx, route_rx) = mpsc::channel(1);
        let (terminal_tx, terminal_rx) = watch::channel(None);

        let supervisor = Supervisor {
            engine,
            state,
            user_setpoint: None,
            setpoint,
            next_alarm: None,
            last: sensors,
            config,
            requests: Requests {
                start: start_rx,
                stop: stop_rx,
                kill: kill_rx,
                get_sensors: get_rx,
                set_setpoint: setpoint_rx,
                set_route: route_rx,
            },
            terminal: terminal_tx,
        };
        tokio::spawn(supervisor.run());
        info!("ATP supervisor started");

        Ok(Self {
            api: Api {
                start: start_tx,
                stop: stop_tx,
                kill: kill_tx,
                get_sensors: get_tx,
                set_setpoint: setpoint_tx,
                set_route: route_tx,
            },
            terminal: terminal_rx,
        })
    }

    /// Sensor snapshot as of the most recent completed tick, never a
    /// half-updated state.
    pub async fn sensors(&self) -> Snapshot {
        if let Some(snapshot) = self.terminal.borrow().clone() {
            return snapshot;
        }
        let (tx, rx) = oneshot::channel();
        if self.api.get_sensors.send(tx).await.is_ok() {
            if let Ok(snapshot) = rx.await {
                return snapshot;
            }
        }
        // The supervisor wound down mid-request; its final snapshot is
        // published (or about to be) on the terminal channel.
        let mut terminal = self.terminal.clone();
        if let Ok(published) = terminal.wait_for(|snapshot| snapshot.is_some()).await {
            if let Some(snapshot) = published.clone() {
                return snapshot;
            }
        }
        // Only reachable if the task died without publishing, which the
        // shutdown path never does.
        Snapshot {
            sensors: Sensors::default(),
            state: Status::Off,
        }
    }

    pub async fn status(&self) -> Status {
        self.sensors().await.state
    }

    /// Replaces the pending driver setpoint. Its timestamp is overwritten
    /// with the current instant.
    pub async fn set_setpoint(&self, mut setpoint: Setpoint) {
        if self.is_off() {
            return;
        }
        setpoint.time = Utc::now();
        let _ = self.api.set_setpoint.send(setpoint).await;
    }

    /// Hands a new route to the engine; the head must match the segment
    /// the train is on.
    pub async fn set_route(&self, route: Vec<TrackSegment>) -> Result<(), Error> {
        if self.is_off() {
            return Ok(());
        }
        let (tx, rx) = oneshot::channel();
        if self.api.set_route.send((route, tx)).await.is_err() {
            return Ok(());
        }
        rx.await.unwrap_or(Ok(()))
    }

    /// Starts following driver setpoints. Succeeds only from `On` and
    /// only after a setpoint has been submitted.
    pub async fn start(&self) -> Result<(), Error> {
        if self.is_off() {
            return Ok(());
        }
        let (tx, rx) = oneshot::channel();
        if self.api.start.send(tx).await.is_err() {
            return Ok(());
        }
        rx.await.unwrap_or(Ok(()))
    }

    /// Requests a graceful stop; a moving train escalates to `Alarm`
    /// instead of shutting down.
    pub async fn stop(&self) {
        if self.is_off() {
            return;
        }
        let _ = self.api.stop.send(()).await;
    }

    /// Hard preemption: terminates the supervisor at its next
    /// request-handling point without waiting for standstill.
    pub async fn kill(&self) {
        warn!("ATP kill requested");
        if self.is_off() {
            return;
        }
        let _ = self.api.kill.send(()).await;
    }

    fn is_off(&self) -> bool {
        self.terminal.borrow().is_some()
    }
}

/// The supervisor task state. Exactly one task owns the engine, the state
/// machine and the cached snapshot; everything mutates inside `run`.
struct Supervisor {
    engine: Engine,
    state: StateMachine,
    /// Most recent setpoint submitted by the driver; adopted while Active.
    user_setpoint: Option<Setpoint>,
    /// The setpoint actually fed to the engine each tick.
    setpoint: Setpoint,
    /// Deadline armed while warnings persist; firing escalates to Alarm.
    next_alarm: Option<Instant>,
    /// Snapshot served to readers, scrubbed of suppressed alarms.
    last: Sensors,
    config: AtpConfig,
    requests: Requests,
    terminal: watch::Sender<Option<Snapshot>>,
}

impl Supervisor {
    async fn run(mut self) {
        loop {
            let outcome = match self.state.get() {
                Status::On => self.on_routine(),
                Status::Active => self.active_routine(),
                Status::Warning => self.warning_routine(),
                Status::Alarm => self.alarm_routine(),
                Status::Shutdown => match self.shutdown_routine() {
                    Ok(true) => match self.state.set(Status::Off) {
                        // Skip request handling and go straight to teardown.
                        Ok(()) => continue,
                        Err(err) => Err(err),
                    },
                    Ok(false) => Ok(()),
                    Err(err) => Err(err),
                },
                Status::Off => {
                    self.off_routine();
                    return;
                }
                // Init is never re-entered and Panic exits the process
                // before the loop comes back around.
                Status::Init | Status::Panic => Ok(()),
            };
            if let Err(err) = outcome {
                self.fail(err);
            }

            self.get_routine();
            self.set_routine();
            self.signals_routine();

            tokio::time::sleep(self.config.tick).await;
        }
    }

    /// One physics step. Heartbeat alarms are discarded while `On`: a train
    /// that is not commanded to move cannot miss setpoints.
    fn update_sensors(&mut self) -> Result<Sensors, Error> {
        let mut sensors = self.engine.update(self.setpoint, Utc::now())?;
        if self.state.get() == Status::On && !sensors.alarms.heartbeat.is_empty() {
            sensors.alarms.heartbeat.clear();
        }
        self.last = sensors.clone();
        Ok(sensors)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            sensors: self.last.clone(),
            state: self.state.get(),
        }
    }

    fn on_routine(&mut self) -> Result<(), Error> {
        let sensors = self.update_sensors()?;
        if sensors.warnings.any() {
            self.state.set(Status::Warning)?;
        }
        if sensors.alarms.any() {
            self.state.set(Status::Alarm)?;
        }
        Ok(())
    }

    fn active_routine(&mut self) -> Result<(), Error> {
        if let Some(setpoint) = self.user_setpoint {
            self.setpoint = setpoint;
        }
        self.on_routine()
    }

    fn warning_routine(&mut self) -> Result<(), Error> {
        self.active_routine()?;

        // The step above may already have escalated.
        if self.state.get() != Status::Warning {
            return Ok(());
        }

        if self.last.warnings.any() {
            if self.next_alarm.is_none() {
                self.next_alarm = Some(Instant::now() + self.config.warning_timeout);
            }
        } else {
            self.next_alarm = None;
            let prev = self.state.prev();
            if prev == Status::On || prev == Status::Active {
                self.state.set(prev)?;
                return Ok(());
            }
        }

        if self.next_alarm.is_some_and(|deadline| Instant::now() >= deadline) {
            warn!("warnings persisted beyond the dwell; escalating");
            self.state.set(Status::Alarm)?;
            self.next_alarm = None;
        }
        Ok(())
    }

    fn alarm_routine(&mut self) -> Result<(), Error> {
        // The supervisor holds control; driver setpoints stay ignored
        // until the train is at standstill.
        self.setpoint = Setpoint::emergency_brake();
        let sensors = self.update_sensors()?;
        if stopped(&sensors) {
            self.next_alarm = None;
            self.state.set(Status::On)?;
        }
        Ok(())
    }

    /// Returns true once the train may power down.
    fn shutdown_routine(&mut self) -> Result<bool, Error> {
        let sensors = self.update_sensors()?;
        if !stopped(&sensors) {
            // A moving train cannot shut down.
            self.state.set(Status::Alarm)?;
            return Ok(false);
        }
        Ok(true)
    }

    fn off_routine(&mut self) {
        let _ = self.terminal.send(Some(self.snapshot()));

        // Serve whatever was already queued, then let the channels close.
        while let Ok(reply) = self.requests.get_sensors.try_recv() {
            let _ = reply.send(self.snapshot());
        }
        while let Ok(reply) = self.requests.start.try_recv() {
            let _ = reply.send(Ok(()));
        }
        while let Ok((_route, reply)) = self.requests.set_route.try_recv() {
            let _ = reply.send(Ok(()));
        }
        while self.requests.set_setpoint.try_recv().is_ok() {}
        while self.requests.stop.try_recv().is_ok() {}
        while self.requests.kill.try_recv().is_ok() {}

        info!("ATP supervisor off");
    }

    fn get_routine(&mut self) {
        if let Ok(reply) = self.requests.get_sensors.try_recv() {
            let _ = reply.send(self.snapshot());
        }
    }

    fn set_routine(&mut self) {
        if let Ok(setpoint) = self.requests.set_setpoint.try_recv() {
            self.user_setpoint = Some(setpoint);
        }
        if let Ok((route, reply)) = self.requests.set_route.try_recv() {
            let _ = reply.send(self.engine.set_route(route));
        }
    }

    fn signals_routine(&mut self) {
        if let Ok(reply) = self.requests.start.try_recv() {
            let _ = reply.send(self.start_signal());
        } else if self.requests.stop.try_recv().is_ok() {
            if self.state.get() != Status::Shutdown {
                if let Err(err) = self.state.set(Status::Shutdown) {
                    self.fail(err);
                }
            }
        } else if self.requests.kill.try_recv().is_ok() {
            // Hard preemption: run the graceful chain without waiting for
            // standstill.
            if let Err(err) = self
                .state
                .set(Status::Shutdown)
                .and_then(|_| self.state.set(Status::Off))
            {
                self.fail(err);
            }
        }
    }

    fn start_signal(&mut self) -> Result<(), Error> {
        if self.state.get() != Status::On {
            warn!("start requested while not On");
            return Err(Error::NotReady("state is not On"));
        }
        if self.user_setpoint.is_none() {
            warn!("start requested before any setpoint");
            return Err(Error::NotReady("no setpoint has been submitted"));
        }
        self.state.set(Status::Active)?;
        Ok(())
    }

    /// Unrecoverable fault: record it, then take the whole process down.
    fn fail(&mut self, err: Error) -> ! {
        let _ = self.state.set(Status::Panic);
        error!("unrecoverable ATP fault: {err}");
        std::process::exit(PANIC_EXIT_CODE);
    }
}
