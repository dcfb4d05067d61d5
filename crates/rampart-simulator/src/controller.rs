//! Time-stepped simulation controller
//!
//! State machine `STOPPED → RUNNING ⇄ PAUSED → STOPPED` driving a
//! [`SimulationEngine`] on a dedicated worker thread.
//!
//! # Locking
//!
//! Uses `parking_lot` primitives:
//! 1. One `Mutex` guards the run state, the engine and the worker handle.
//!    Every transition and every tick runs under it, so a command never
//!    observes a half-applied tick. A worker is spawned and its handle stored
//!    under the same guard, so a start issued from an observer always sees
//!    the newest handle.
//! 2. A `Condvar` wakes the worker on pause, resume and stop, and wakes
//!    `wait_until_stopped` callers.
//! 3. Notifications are queued while the state lock is held and delivered
//!    after it is released. Queue order is transition order. Whichever
//!    thread finds the queue idle delivers everything pending, so observers
//!    may call back into the controller without deadlocking.
//! 4. A second `Condvar` signals when the queue goes idle, so
//!    `wait_until_stopped` returns only after the final notifications of a
//!    run have been delivered.
//!
//! Invalid transitions return `false` and leave the state unchanged.

use parking_lot::{Condvar, Mutex, RwLock};
use rampart_core::Network;
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn};

use crate::config::{ConfigValidation, SimulationConfig};
use crate::engine::SimulationEngine;
use crate::errors::{Result, SimulatorError};
use crate::metrics::{ControlEvent, Notification, ObserverId, RunState, SimulationObserver};
use crate::session::{SessionCheckpoint, SimulationSession};

struct ControlInner {
    state: RunState,
    engine: Option<SimulationEngine>,
    /// Bumped on every start and stop; a worker exits once it sees a
    /// generation other than its own
    generation: u64,
    last_report: Option<SimulationSession>,
    /// Worker of the current or most recent run, until joined
    worker: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct DispatchQueue {
    pending: VecDeque<Notification>,
    /// Thread currently delivering, if any
    dispatcher: Option<ThreadId>,
}

impl DispatchQueue {
    fn is_idle(&self) -> bool {
        self.dispatcher.is_none() && self.pending.is_empty()
    }
}

struct Shared {
    network: Arc<Network>,
    config: Arc<SimulationConfig>,
    inner: Mutex<ControlInner>,
    wake: Condvar,
    queue: Mutex<DispatchQueue>,
    idle: Condvar,
    observers: RwLock<Vec<(ObserverId, Arc<dyn SimulationObserver>)>>,
    next_observer: AtomicU64,
}

impl Shared {
    fn enqueue(&self, notification: Notification) {
        self.queue.lock().pending.push_back(notification);
    }

    /// Deliver pending notifications unless another thread already is
    fn drain(&self) {
        {
            let mut queue = self.queue.lock();
            if queue.dispatcher.is_some() {
                return;
            }
            queue.dispatcher = Some(thread::current().id());
        }
        loop {
            let next = {
                let mut queue = self.queue.lock();
                match queue.pending.pop_front() {
                    Some(n) => n,
                    None => {
                        queue.dispatcher = None;
                        self.idle.notify_all();
                        return;
                    }
                }
            };
            let observers: Vec<Arc<dyn SimulationObserver>> =
                self.observers.read().iter().map(|(_, o)| o.clone()).collect();
            for observer in observers {
                if catch_unwind(AssertUnwindSafe(|| observer.notify(&next))).is_err() {
                    error!("observer panicked while handling a notification");
                }
            }
        }
    }

    /// Move to STOPPED and archive the session. Caller holds `inner`.
    fn finish(&self, inner: &mut ControlInner, event: ControlEvent) {
        inner.state = RunState::Stopped;
        inner.generation += 1;
        if let Some(engine) = inner.engine.take() {
            let session = engine.into_session();
            info!(
                session_id = %session.id(),
                ticks = session.tick(),
                event = ?event,
                "simulation stopped"
            );
            inner.last_report = Some(session);
        }
        self.enqueue(Notification::StateChanged {
            event,
            state: RunState::Stopped,
        });
        self.wake.notify_all();
    }
}

/// Pausable, resumable real-time driver of a simulation run
pub struct SimulationController {
    shared: Arc<Shared>,
}

impl SimulationController {
    /// Controller for `network` under a validated `config`
    pub fn new(network: Network, config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Shared {
                network: Arc::new(network),
                config: Arc::new(config),
                inner: Mutex::new(ControlInner {
                    state: RunState::Stopped,
                    engine: None,
                    generation: 0,
                    last_report: None,
                    worker: None,
                }),
                wake: Condvar::new(),
                queue: Mutex::new(DispatchQueue::default()),
                idle: Condvar::new(),
                observers: RwLock::new(Vec::new()),
                next_observer: AtomicU64::new(1),
            }),
        })
    }

    /// Register an observer
    pub fn subscribe(&self, observer: Arc<dyn SimulationObserver>) -> ObserverId {
        let id = ObserverId(self.shared.next_observer.fetch_add(1, Ordering::Relaxed));
        self.shared.observers.write().push((id, observer));
        id
    }

    /// Register a closure as an observer
    pub fn subscribe_fn<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(callback))
    }

    /// Remove an observer. Returns whether it was registered.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut observers = self.shared.observers.write();
        let before = observers.len();
        observers.retain(|(oid, _)| *oid != id);
        observers.len() != before
    }

    /// Current run state
    pub fn state(&self) -> RunState {
        self.shared.inner.lock().state
    }

    /// STOPPED → RUNNING with a fresh session
    pub fn start(&self) -> bool {
        match SimulationEngine::new(self.shared.network.clone(), self.shared.config.clone()) {
            Ok(engine) => self.launch(engine),
            Err(e) => {
                error!(error = %e, "failed to create simulation engine");
                false
            }
        }
    }

    /// STOPPED → RUNNING continuing from a checkpoint.
    ///
    /// Fails if the checkpoint does not fit this controller's network.
    /// Returns `Ok(false)` if the controller is not stopped.
    pub fn start_from(&self, checkpoint: SessionCheckpoint) -> Result<bool> {
        let engine = SimulationEngine::from_checkpoint(
            self.shared.network.clone(),
            self.shared.config.clone(),
            checkpoint,
        )?;
        Ok(self.launch(engine))
    }

    fn launch(&self, engine: SimulationEngine) -> bool {
        let session_id = engine.session().id();
        let (previous, launched) = {
            let mut inner = self.shared.inner.lock();
            if inner.state != RunState::Stopped {
                warn!(state = %inner.state, "start rejected");
                return false;
            }
            inner.generation += 1;
            inner.engine = Some(engine);
            inner.state = RunState::Running;
            self.shared.enqueue(Notification::StateChanged {
                event: ControlEvent::Started,
                state: RunState::Running,
            });
            info!(session_id = %session_id, "simulation started");

            // The new worker blocks on `inner` until this guard drops.
            let previous = inner.worker.take();
            let shared = self.shared.clone();
            let generation = inner.generation;
            let spawned = thread::Builder::new()
                .name("rampart-sim".to_string())
                .spawn(move || run_worker(shared, generation, session_id));
            match spawned {
                Ok(handle) => {
                    inner.worker = Some(handle);
                    (previous, true)
                }
                Err(e) => {
                    error!(error = %e, "failed to spawn simulation worker");
                    self.shared.finish(&mut inner, ControlEvent::Failed);
                    (previous, false)
                }
            }
        };

        // A previous worker has already seen the generation change.
        if let Some(handle) = previous {
            join_handle(handle);
        }
        self.shared.drain();
        launched
    }

    /// RUNNING → PAUSED. Simulated time stops advancing.
    pub fn pause(&self) -> bool {
        self.transition(RunState::Running, RunState::Paused, ControlEvent::Paused)
    }

    /// PAUSED → RUNNING from the suspended simulated time
    pub fn resume(&self) -> bool {
        self.transition(RunState::Paused, RunState::Running, ControlEvent::Resumed)
    }

    fn transition(&self, from: RunState, to: RunState, event: ControlEvent) -> bool {
        {
            let mut inner = self.shared.inner.lock();
            if inner.state != from {
                warn!(state = %inner.state, requested = ?event, "transition rejected");
                return false;
            }
            inner.state = to;
            if let Some(engine) = inner.engine.as_mut() {
                match event {
                    ControlEvent::Paused => engine.session_mut().mark_paused(),
                    ControlEvent::Resumed => engine.session_mut().mark_resumed(),
                    _ => {}
                }
            }
            self.shared.enqueue(Notification::StateChanged { event, state: to });
            info!(from = %from, to = %to, "simulation state changed");
        }
        self.shared.wake.notify_all();
        self.shared.drain();
        true
    }

    /// RUNNING or PAUSED → STOPPED.
    ///
    /// Safe from any state and from observer callbacks. Returns `false` if
    /// the controller was already stopped. Work from a tick in flight is
    /// kept.
    pub fn stop(&self) -> bool {
        let stopped = {
            let mut inner = self.shared.inner.lock();
            match inner.state {
                RunState::Running | RunState::Paused => {
                    self.shared.finish(&mut inner, ControlEvent::Stopped);
                    true
                }
                RunState::Stopped => {
                    debug!("stop requested while already stopped");
                    false
                }
            }
        };
        self.shared.drain();
        self.join_worker();
        stopped
    }

    fn join_worker(&self) {
        let handle = self.shared.inner.lock().worker.take();
        if let Some(handle) = handle {
            join_handle(handle);
        }
    }

    /// Block until the controller is STOPPED and every notification queued
    /// so far has been delivered, or until `timeout` elapses. Returns whether
    /// it is stopped.
    ///
    /// From inside an observer callback only the state is awaited.
    pub fn wait_until_stopped(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        {
            let mut inner = self.shared.inner.lock();
            while inner.state != RunState::Stopped {
                if self.shared.wake.wait_until(&mut inner, deadline).timed_out() {
                    return inner.state == RunState::Stopped;
                }
            }
        }

        let me = thread::current().id();
        let mut queue = self.shared.queue.lock();
        while !queue.is_idle() && queue.dispatcher != Some(me) {
            if self.shared.idle.wait_until(&mut queue, deadline).timed_out() {
                break;
            }
        }
        true
    }

    /// Copy of the live session, if a run is active
    pub fn snapshot(&self) -> Option<SimulationSession> {
        self.shared
            .inner
            .lock()
            .engine
            .as_ref()
            .map(|e| e.session().clone())
    }

    /// Checkpoint of the live session, if a run is active
    pub fn checkpoint(&self) -> Option<SessionCheckpoint> {
        self.shared.inner.lock().engine.as_ref().map(SimulationEngine::checkpoint)
    }

    /// Finalised session of the most recent run
    pub fn last_report(&self) -> Option<SimulationSession> {
        self.shared.inner.lock().last_report.clone()
    }

    /// Configuration every run uses
    pub fn config(&self) -> &SimulationConfig {
        &self.shared.config
    }

    /// Network every run simulates
    pub fn network(&self) -> &Network {
        &self.shared.network
    }
}

impl Drop for SimulationController {
    fn drop(&mut self) {
        self.stop();
    }
}

fn join_handle(handle: JoinHandle<()>) {
    if handle.thread().id() == thread::current().id() {
        // Called from an observer on the worker; it exits on its own.
        return;
    }
    if handle.join().is_err() {
        error!("simulation worker panicked");
    }
}

fn run_worker(shared: Arc<Shared>, generation: u64, session_id: uuid::Uuid) {
    let span = info_span!("simulation_run", session_id = %session_id);
    let _entered = span.enter();

    let interval = shared.config.tick_interval();
    let mut next_tick = Instant::now() + interval;

    loop {
        let mut inner = shared.inner.lock();
        loop {
            if inner.generation != generation || inner.state == RunState::Stopped {
                debug!("worker exiting");
                return;
            }
            if inner.state == RunState::Paused {
                shared.wake.wait(&mut inner);
                next_tick = Instant::now() + interval;
                continue;
            }
            if Instant::now() >= next_tick {
                break;
            }
            shared.wake.wait_until(&mut inner, next_tick);
        }
        next_tick = (next_tick + interval).max(Instant::now());

        let Some(engine) = inner.engine.as_mut() else {
            return;
        };
        let tick = engine.session().tick() + 1;
        let outcome = catch_unwind(AssertUnwindSafe(|| engine.step()))
            .unwrap_or_else(|panic| {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "tick panicked".to_string());
                Err(SimulatorError::Tick { tick, message })
            });

        let finished = match outcome {
            Ok(metrics) => {
                shared.enqueue(Notification::Tick(metrics));
                if engine.is_complete() {
                    shared.finish(&mut inner, ControlEvent::Completed);
                    true
                } else {
                    false
                }
            }
            Err(e) => {
                error!(tick, error = %e, "tick failed, stopping simulation");
                shared.enqueue(Notification::Failed { tick, error: e });
                shared.finish(&mut inner, ControlEvent::Failed);
                true
            }
        };
        drop(inner);
        shared.drain();
        if finished {
            return;
        }
    }
}
