//! Integration tests for the engine lifecycle
//!
//! These tests validate the complete session workflow against scripted
//! transport fakes:
//! - Scan, discovery filtering, and connect requests
//! - Presence-driven connection establishment and removal
//! - Recording start/stop and live sample delivery
//! - Forget and shutdown

mod common;

use common::builders;
use common::fakes::{RecordingReporter, ScriptedDiscovery, ScriptedMds};
use skisense::config::{EngineConfig, SinkMode};
use skisense::engine::{EngineEvent, SessionEngine};
use skisense::protocol;
use skisense::types::{ScanState, SignalGroup};
use skisense::units::scale_acc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use uuid::Uuid;

const SERIAL: &str = "174630000192";

struct TestRig {
    mds: Arc<ScriptedMds>,
    handle: skisense::engine::EngineHandle,
    reporter: RecordingReporter,
    worker: thread::JoinHandle<()>,
}

fn spawn_engine(config: EngineConfig, discovery: Arc<ScriptedDiscovery>) -> TestRig {
    common::init_tracing();
    let mds = ScriptedMds::new();
    mds.respond(
        &protocol::app_info_path(SERIAL),
        builders::app_info("Skisensor", "1.9.2", "Suunto"),
    );
    mds.respond(
        &protocol::info_path(SERIAL),
        builders::sensor_info(SERIAL, "2.1.0"),
    );

    let reporter = RecordingReporter::default();
    let (engine, handle) = SessionEngine::new(
        config,
        discovery,
        Arc::clone(&mds) as Arc<dyn skisense::transport::MdsClient>,
        Arc::new(reporter.clone()),
    )
    .expect("engine creation");

    let worker = thread::spawn(move || engine.run());
    thread::sleep(common::settle_time());

    TestRig {
        mds,
        handle,
        reporter,
        worker,
    }
}

#[test]
fn test_scan_filters_and_connect_requests() {
    let movesense_id = Uuid::new_v4();
    let discovery = ScriptedDiscovery::advertising(vec![
        (movesense_id, "Movesense 174630000192"),
        (Uuid::new_v4(), "Polar H10"),
    ]);
    let rig = spawn_engine(EngineConfig::default(), discovery);

    rig.handle.start_scan();
    thread::sleep(common::settle_time());

    let events = rig.handle.drain();
    assert!(events
        .iter()
        .any(|e| matches!(e, EngineEvent::ScanState(ScanState::On))));

    let list = events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::DeviceList(list) => Some(list),
            _ => None,
        })
        .last()
        .expect("device list emitted");
    assert_eq!(list.len(), 1, "non-vendor advertisement must be filtered");
    assert_eq!(list[0].id, movesense_id);

    rig.handle.connect(movesense_id);
    thread::sleep(common::settle_time());
    assert_eq!(
        rig.mds.connect_requests.lock().unwrap().as_slice(),
        &[movesense_id]
    );

    rig.handle.shutdown();
    rig.worker.join().unwrap();
}

#[test]
fn test_presence_establishes_and_removes_connection() {
    let rig = spawn_engine(
        EngineConfig::default(),
        ScriptedDiscovery::advertising(vec![]),
    );

    assert!(rig.mds.is_subscribed(protocol::CONNECTED_DEVICES_PATH));

    rig.mds.push(
        protocol::CONNECTED_DEVICES_PATH,
        builders::presence_post(SERIAL),
    );
    thread::sleep(common::settle_time());

    let events = rig.handle.drain();
    let conn = events
        .iter()
        .find_map(|e| match e {
            EngineEvent::ConnectionEstablished(conn) => Some(conn),
            _ => None,
        })
        .expect("connection established");
    assert_eq!(conn.serial, SERIAL);
    assert_eq!(conn.firmware_name, "Skisensor");
    assert_eq!(conn.firmware_version, "1.9.2");
    assert_eq!(conn.firmware_manufacturer, "Suunto");
    assert_eq!(conn.bootloader_version, "2.1.0");
    assert!(conn.last_measurement.is_none());

    rig.mds.push(
        protocol::CONNECTED_DEVICES_PATH,
        builders::presence_delete(SERIAL),
    );
    thread::sleep(common::settle_time());

    assert!(rig
        .handle
        .drain()
        .iter()
        .any(|e| matches!(e, EngineEvent::ConnectionRemoved(s) if s == SERIAL)));

    rig.handle.shutdown();
    rig.worker.join().unwrap();
}

#[test]
fn test_recording_delivers_scaled_live_samples() {
    let rig = spawn_engine(
        EngineConfig::default(),
        ScriptedDiscovery::advertising(vec![]),
    );

    rig.handle.start_recording(SERIAL);
    thread::sleep(common::settle_time());

    let sample_path = protocol::sample_path(SERIAL);
    assert!(rig.mds.is_subscribed(&sample_path));

    rig.mds.push(
        &sample_path,
        builders::measurement(SERIAL, 12500, (16383, 0, 0), (0, 100, 0), (0, 0, 50)),
    );
    thread::sleep(common::settle_time());

    let events = rig.handle.drain();
    assert!(events
        .iter()
        .any(|e| matches!(e, EngineEvent::RecordingStarted(s) if s == SERIAL)));

    let acc = events
        .iter()
        .find_map(|e| match e {
            EngineEvent::LiveSamples {
                serial,
                group: SignalGroup::Acc,
                samples,
            } if serial == SERIAL => Some(samples),
            _ => None,
        })
        .expect("acc live samples delivered");
    assert_eq!(acc[0].axis, "ax");
    common::assert_float_eq(acc[0].timestamp, 12.5, 1e-9);
    common::assert_float_eq(acc[0].value, scale_acc(16383), 1e-12);

    // One LiveSamples notification per signal group
    let groups: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::LiveSamples { group, .. } => Some(*group),
            _ => None,
        })
        .collect();
    assert_eq!(groups.len(), 3);

    rig.handle.stop_recording(SERIAL);
    thread::sleep(common::settle_time());
    assert!(!rig.mds.is_subscribed(&sample_path));
    assert!(rig
        .handle
        .drain()
        .iter()
        .any(|e| matches!(e, EngineEvent::RecordingStopped(s) if s == SERIAL)));

    rig.handle.shutdown();
    rig.worker.join().unwrap();
}

#[test]
fn test_persisting_engine_records_session_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("sessions.db");

    let mut config = EngineConfig::default();
    config.sink = SinkMode::LiveAndPersist;
    config.database_path = Some(db_path.clone());

    let rig = spawn_engine(config, ScriptedDiscovery::advertising(vec![]));

    rig.handle.start_recording(SERIAL);
    thread::sleep(common::settle_time());

    let sample_path = protocol::sample_path(SERIAL);
    // Peaks at one g on the x axis
    let full_g = (i16::MAX as f64 / 8.0).round() as i16;
    for (i, acc_x) in [full_g / 2, full_g, full_g / 4].iter().enumerate() {
        rig.mds.push(
            &sample_path,
            builders::measurement(SERIAL, 1000 + i as i64, (*acc_x, 0, 0), (0, 0, 0), (0, 0, 0)),
        );
    }
    thread::sleep(common::settle_time());

    rig.handle.stop_recording(SERIAL);
    rig.handle.shutdown();
    rig.worker.join().unwrap();

    // Reopen the database the way a session browser would
    let store = skisense::SessionStore::open(&db_path).unwrap();
    let sessions = store.list_sessions().unwrap();
    assert_eq!(sessions.len(), 1);

    let session = sessions[0].0;
    let series = store.accelerations(session, SERIAL).unwrap();
    assert_eq!(series.len(), 3);

    let max = store.max_acceleration_magnitude(session).unwrap();
    // Scaled peak: full_g raw on x is about 8/8 of the configured range
    assert!(max > 0.9 && max < 1.1, "expected ~1 g, got {max}");

    assert!(rig.reporter.reports.lock().unwrap().is_empty());
}

#[test]
fn test_forget_removes_connection() {
    let rig = spawn_engine(
        EngineConfig::default(),
        ScriptedDiscovery::advertising(vec![]),
    );

    rig.mds.push(
        protocol::CONNECTED_DEVICES_PATH,
        builders::presence_post(SERIAL),
    );
    thread::sleep(common::settle_time());

    let handle_id = rig
        .handle
        .drain()
        .iter()
        .find_map(|e| match e {
            EngineEvent::ConnectionEstablished(conn) => Some(conn.handle),
            _ => None,
        })
        .expect("connection established");

    rig.handle.forget(SERIAL, handle_id);
    thread::sleep(common::settle_time());

    assert!(rig
        .handle
        .drain()
        .iter()
        .any(|e| matches!(e, EngineEvent::ConnectionRemoved(s) if s == SERIAL)));
    assert_eq!(
        rig.mds.forgotten.lock().unwrap().as_slice(),
        &[SERIAL.to_string()]
    );

    rig.handle.shutdown();
    rig.worker.join().unwrap();
}

#[test]
fn test_scan_stops_after_timeout() {
    let mut config = EngineConfig::default();
    config.scan_timeout_secs = 1;

    let discovery = ScriptedDiscovery::advertising(vec![]);
    let rig = spawn_engine(config, Arc::clone(&discovery));

    rig.handle.start_scan();
    thread::sleep(Duration::from_millis(1500));

    let events = rig.handle.drain();
    assert!(events
        .iter()
        .any(|e| matches!(e, EngineEvent::ScanState(ScanState::On))));
    assert!(events
        .iter()
        .any(|e| matches!(e, EngineEvent::ScanState(ScanState::Off))));
    assert!(*discovery.stop_count.lock().unwrap() >= 1);

    rig.handle.shutdown();
    rig.worker.join().unwrap();
}

#[test]
fn test_failed_info_fetch_is_reported_not_fatal() {
    common::init_tracing();
    let mds = ScriptedMds::new(); // no canned responses: every GET 404s
    let reporter = RecordingReporter::default();
    let (engine, handle) = SessionEngine::new(
        EngineConfig::default(),
        ScriptedDiscovery::advertising(vec![]),
        Arc::clone(&mds) as Arc<dyn skisense::transport::MdsClient>,
        Arc::new(reporter.clone()),
    )
    .unwrap();
    let worker = thread::spawn(move || engine.run());
    thread::sleep(common::settle_time());

    mds.push(
        protocol::CONNECTED_DEVICES_PATH,
        builders::presence_post(SERIAL),
    );
    thread::sleep(Duration::from_millis(400));

    assert!(reporter.contains("404"));
    assert!(!handle
        .drain()
        .iter()
        .any(|e| matches!(e, EngineEvent::ConnectionEstablished(_))));

    handle.shutdown();
    worker.join().unwrap();
}
