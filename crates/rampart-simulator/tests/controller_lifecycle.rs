//! Controller state machine, notifications and threading

use rampart_core::AnalysisConfig;
use rampart_simulator::{
    ControlEvent, Notification, RunState, SimulationConfig, SimulationController, SimulatorError,
};
use rampart_testkit::{complete_network, init_test_tracing, RecordingObserver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(10);

fn controller(config: SimulationConfig) -> (SimulationController, Arc<RecordingObserver>) {
    init_test_tracing();
    let controller = SimulationController::new(complete_network(5), config).unwrap();
    let observer = Arc::new(RecordingObserver::new());
    controller.subscribe(observer.clone());
    (controller, observer)
}

#[test]
fn test_state_sequence() {
    let (controller, observer) = controller(SimulationConfig::testing_defaults());

    assert!(!controller.pause());
    assert!(!controller.resume());
    assert!(!controller.stop());
    assert_eq!(controller.state(), RunState::Stopped);

    assert!(controller.start());
    assert!(!controller.start());
    assert!(controller.pause());
    assert!(!controller.pause());
    assert!(controller.resume());
    assert!(controller.stop());
    assert_eq!(controller.state(), RunState::Stopped);

    assert_eq!(
        observer.states(),
        vec![
            RunState::Running,
            RunState::Paused,
            RunState::Running,
            RunState::Stopped
        ]
    );
    let report = controller.last_report().unwrap();
    assert_eq!(report.pause_count(), 1);
    assert!(report.is_finished());
    assert!(controller.snapshot().is_none());
}

#[test]
fn test_pause_freezes_simulated_time() {
    let (controller, observer) = controller(SimulationConfig::testing_defaults());
    assert!(controller.start());
    thread::sleep(Duration::from_millis(40));

    assert!(controller.pause());
    let frozen = controller.snapshot().unwrap();
    thread::sleep(Duration::from_millis(40));
    let still = controller.snapshot().unwrap();
    assert_eq!(still.tick(), frozen.tick());
    assert_eq!(still.sim_time(), frozen.sim_time());
    // the worker may still be delivering ticks queued before the pause
    assert!(observer.tick_count() as u64 <= frozen.tick());

    assert!(controller.resume());
    thread::sleep(Duration::from_millis(40));
    assert!(controller.stop());

    let report = controller.last_report().unwrap();
    assert!(report.tick() >= frozen.tick());
    assert_eq!(report.pause_count(), 1);
    assert!(report.paused_duration() >= Duration::from_millis(30));

    // ticks are delivered in order without gaps
    let ticks: Vec<u64> = observer.ticks().iter().map(|m| m.tick).collect();
    assert!(ticks.windows(2).all(|w| w[1] == w[0] + 1));
}

#[test]
fn test_bounded_run_completes() {
    let config = SimulationConfig::testing_defaults().with_timing(20, 2);
    let (controller, observer) = controller(config);
    assert!(controller.start());
    assert!(controller.wait_until_stopped(WAIT));

    assert_eq!(observer.tick_count(), 10);
    assert_eq!(
        observer.notifications().last(),
        Some(&Notification::StateChanged {
            event: ControlEvent::Completed,
            state: RunState::Stopped,
        })
    );
    let report = controller.last_report().unwrap();
    assert_eq!(report.tick(), 10);
    assert_eq!(report.metrics().len(), 10);
    assert!(report.reliability_series().iter().all(|r| (0.0..=1.0).contains(r)));

    // a completed controller can run again
    observer.clear();
    assert!(controller.start());
    assert!(controller.wait_until_stopped(WAIT));
    assert_eq!(observer.tick_count(), 10);
}

#[test]
fn test_tick_failure_stops_and_notifies() {
    let config = SimulationConfig::testing_defaults()
        .with_analysis(AnalysisConfig::default().with_max_exact_nodes(4));
    let (controller, observer) = controller(config);
    assert!(controller.start());
    assert!(controller.wait_until_stopped(WAIT));

    let failures = observer.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, 1);
    assert_eq!(observer.tick_count(), 0);

    let notifications = observer.notifications();
    assert!(matches!(
        &notifications[notifications.len() - 2],
        Notification::Failed {
            error: SimulatorError::Core(_),
            ..
        }
    ));
    assert_eq!(
        notifications.last(),
        Some(&Notification::StateChanged {
            event: ControlEvent::Failed,
            state: RunState::Stopped,
        })
    );

    let report = controller.last_report().unwrap();
    assert_eq!(report.tick(), 0);
    assert_eq!(report.events().len(), 3);
}

#[test]
fn test_stop_from_observer_callback() {
    init_test_tracing();
    let controller = Arc::new(
        SimulationController::new(complete_network(4), SimulationConfig::testing_defaults())
            .unwrap(),
    );
    let observer = Arc::new(RecordingObserver::new());
    controller.subscribe(observer.clone());

    let weak = Arc::downgrade(&controller);
    controller.subscribe_fn(move |n: &Notification| {
        if let Notification::Tick(metrics) = n {
            if metrics.tick == 3 {
                if let Some(c) = weak.upgrade() {
                    c.stop();
                }
            }
        }
    });

    assert!(controller.start());
    assert!(controller.wait_until_stopped(WAIT));
    assert!(observer.tick_count() >= 3);
    assert!(observer.notifications().contains(&Notification::StateChanged {
        event: ControlEvent::Stopped,
        state: RunState::Stopped,
    }));
}

#[test]
fn test_restart_from_observer_callback() {
    init_test_tracing();
    let config = SimulationConfig::testing_defaults().with_timing(6, 2);
    let controller = Arc::new(SimulationController::new(complete_network(4), config).unwrap());
    let observer = Arc::new(RecordingObserver::new());
    controller.subscribe(observer.clone());

    let restarts = Arc::new(AtomicUsize::new(0));
    let weak = Arc::downgrade(&controller);
    let counter = restarts.clone();
    controller.subscribe_fn(move |n: &Notification| {
        if let Notification::StateChanged {
            event: ControlEvent::Completed,
            ..
        } = n
        {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                if let Some(c) = weak.upgrade() {
                    assert!(c.start());
                }
            }
        }
    });

    assert!(controller.start());
    let deadline = Instant::now() + WAIT;
    while restarts.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(2));
    }
    assert!(controller.wait_until_stopped(WAIT));
    assert_eq!(controller.state(), RunState::Stopped);

    let completed = observer
        .notifications()
        .iter()
        .filter(|n| {
            matches!(
                n,
                Notification::StateChanged {
                    event: ControlEvent::Completed,
                    ..
                }
            )
        })
        .count();
    assert_eq!(completed, 3);
    assert_eq!(observer.tick_count(), 9);
    assert_eq!(controller.last_report().unwrap().tick(), 3);
    assert!(!controller.stop());
}

#[test]
fn test_panicking_observer_is_isolated() {
    let config = SimulationConfig::testing_defaults().with_timing(10, 2);
    let (controller, observer) = controller(config);
    let id = controller.subscribe_fn(|n: &Notification| {
        if matches!(n, Notification::Tick(_)) {
            panic!("observer failure");
        }
    });

    assert!(controller.start());
    assert!(controller.wait_until_stopped(WAIT));
    assert_eq!(observer.tick_count(), 5);
    assert!(controller.unsubscribe(id));
    assert!(!controller.unsubscribe(id));
}

#[test]
fn test_invalid_config_rejected() {
    let config = SimulationConfig::testing_defaults().with_timing(1_000, 0);
    assert!(matches!(
        SimulationController::new(complete_network(3), config),
        Err(SimulatorError::Configuration { .. })
    ));
}
