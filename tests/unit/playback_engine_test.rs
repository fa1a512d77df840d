//! Unit tests for the playback engine on a paused clock.

use crossbeam::channel::Receiver;
use std::time::Duration;
use trailmap::playback::{
    expected_duration, segment_delays, PlaybackError, PlaybackEvent, PlaybackState,
};
use trailmap::{GeoPoint, PlaybackEngine};

/// Walking speed used in most tests (10 km/h).
const SPEED: f64 = 2.78;

fn seven_point_path() -> Vec<GeoPoint> {
    (0..7)
        .map(|i| GeoPoint::new(45.064 + 0.001 * i as f64, 7.692 + 0.001 * i as f64))
        .collect()
}

fn drain(rx: &Receiver<PlaybackEvent>) -> Vec<PlaybackEvent> {
    rx.try_iter().collect()
}

fn positions(events: &[PlaybackEvent]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|e| match e {
            PlaybackEvent::Position { index, .. } => Some(*index),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_two_point_path_emits_end_then_completed() {
    let path = vec![GeoPoint::new(45.064, 7.692), GeoPoint::new(45.065, 7.693)];
    let engine = PlaybackEngine::new();
    let rx = engine.subscribe();

    let run = engine.start(&path, SPEED).unwrap();
    tokio::time::sleep(Duration::from_secs(120)).await;

    let events = drain(&rx);
    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], PlaybackEvent::Started { total_points: 2, .. }));

    match &events[1] {
        PlaybackEvent::Position {
            index,
            position,
            elapsed,
            ..
        } => {
            assert_eq!(*index, 1);
            assert_eq!(*position, path[1]);
            let secs = elapsed.as_secs_f64();
            assert!(secs > 44.0 && secs < 53.0, "elapsed was {}s", secs);
        }
        other => panic!("expected a position, got {:?}", other),
    }
    assert!(matches!(events[2], PlaybackEvent::Completed { run: r, .. } if r == run));
    assert_eq!(engine.state(), PlaybackState::Completed);
    assert_eq!(engine.current_index(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_seven_point_path_emits_six_positions_in_order() {
    let path = seven_point_path();
    let engine = PlaybackEngine::new();
    let rx = engine.subscribe();

    engine.start(&path, SPEED).unwrap();
    tokio::time::sleep(Duration::from_secs(600)).await;

    let events = drain(&rx);
    assert_eq!(positions(&events), vec![1, 2, 3, 4, 5, 6]);
    assert!(matches!(events.last(), Some(PlaybackEvent::Completed { .. })));

    for event in &events {
        if let PlaybackEvent::Position {
            index, position, ..
        } = event
        {
            assert_eq!(*position, path[*index]);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_completion_time_matches_path_length() {
    let path = seven_point_path();
    let expected: Duration = segment_delays(&path, SPEED).unwrap().iter().sum();

    let engine = PlaybackEngine::new();
    let rx = engine.subscribe();
    engine.start(&path, SPEED).unwrap();
    tokio::time::sleep(expected * 2).await;

    let elapsed = drain(&rx)
        .into_iter()
        .find_map(|e| match e {
            PlaybackEvent::Completed { elapsed, .. } => Some(elapsed),
            _ => None,
        })
        .expect("run should complete");

    // Timer resolution is one millisecond per segment
    let diff = elapsed.as_secs_f64() - expected.as_secs_f64();
    assert!(diff.abs() < 0.05, "elapsed {:?}, expected {:?}", elapsed, expected);
}

#[tokio::test(start_paused = true)]
async fn test_nothing_emitted_before_first_delay() {
    let path = seven_point_path();
    let delays = segment_delays(&path, SPEED).unwrap();
    let engine = PlaybackEngine::new();
    let rx = engine.subscribe();

    engine.start(&path, SPEED).unwrap();
    tokio::time::sleep(delays[0] / 2).await;

    let events = drain(&rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], PlaybackEvent::Started { .. }));
    assert_eq!(engine.current_index(), 0);
    assert_eq!(engine.state(), PlaybackState::Running);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_after_third_position_stops_feed() {
    let path = seven_point_path();
    let delays = segment_delays(&path, SPEED).unwrap();
    let engine = PlaybackEngine::new();
    let rx = engine.subscribe();

    let run = engine.start(&path, SPEED).unwrap();
    let third: Duration = delays[..3].iter().sum();
    tokio::time::sleep(third + delays[3] / 2).await;

    assert_eq!(engine.cancel(), Some(run));
    tokio::time::sleep(Duration::from_secs(600)).await;

    let events = drain(&rx);
    assert_eq!(positions(&events), vec![1, 2, 3]);

    let finals: Vec<&PlaybackEvent> = events.iter().filter(|e| e.is_final()).collect();
    assert_eq!(finals.len(), 1);
    assert_eq!(*finals[0], PlaybackEvent::Cancelled { run, index: 3 });
    assert_eq!(events.last(), Some(&PlaybackEvent::Cancelled { run, index: 3 }));

    assert_eq!(engine.state(), PlaybackState::Cancelled);
    assert_eq!(engine.current_index(), 3);
    assert_eq!(engine.active_run(), None);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_twice_is_noop() {
    let engine = PlaybackEngine::new();
    let rx = engine.subscribe();

    engine.start(&seven_point_path(), SPEED).unwrap();
    assert!(engine.cancel().is_some());
    assert_eq!(engine.cancel(), None);

    let cancelled = drain(&rx)
        .iter()
        .filter(|e| matches!(e, PlaybackEvent::Cancelled { .. }))
        .count();
    assert_eq!(cancelled, 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_after_completion_is_noop() {
    let path = vec![GeoPoint::new(45.064, 7.692), GeoPoint::new(45.065, 7.693)];
    let engine = PlaybackEngine::new();

    engine.start(&path, SPEED).unwrap();
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert_eq!(engine.cancel(), None);
    assert_eq!(engine.state(), PlaybackState::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_restart_abandons_previous_run() {
    let path = seven_point_path();
    let delays = segment_delays(&path, SPEED).unwrap();
    let engine = PlaybackEngine::new();
    let rx = engine.subscribe();

    let first = engine.start(&path, SPEED).unwrap();
    tokio::time::sleep(delays[0] + delays[1] / 2).await;

    let second = engine.start(&path, SPEED).unwrap();
    assert!(second > first);
    tokio::time::sleep(Duration::from_secs(600)).await;

    let events = drain(&rx);
    let first_positions = events
        .iter()
        .filter(|e| e.run() == first && matches!(e, PlaybackEvent::Position { .. }))
        .count();
    assert_eq!(first_positions, 1);
    assert!(events.contains(&PlaybackEvent::Cancelled {
        run: first,
        index: 1
    }));

    let second_events: Vec<PlaybackEvent> =
        events.into_iter().filter(|e| e.run() == second).collect();
    assert_eq!(positions(&second_events), vec![1, 2, 3, 4, 5, 6]);
    assert!(matches!(
        second_events.last(),
        Some(PlaybackEvent::Completed { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_every_subscriber_sees_every_event() {
    let path = vec![GeoPoint::new(45.064, 7.692), GeoPoint::new(45.065, 7.693)];
    let engine = PlaybackEngine::new();
    let a = engine.subscribe();
    let b = engine.subscribe();

    engine.start(&path, SPEED).unwrap();
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert_eq!(drain(&a), drain(&b));
}

#[tokio::test(start_paused = true)]
async fn test_start_rejects_invalid_input() {
    let engine = PlaybackEngine::new();
    let single = vec![GeoPoint::new(45.064, 7.692)];

    assert!(engine.start(&single, SPEED).is_err());
    assert!(engine.start(&seven_point_path(), 0.0).is_err());
    assert!(engine.start(&seven_point_path(), -1.0).is_err());
    assert_eq!(engine.state(), PlaybackState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_start_rejects_speed_with_unreachable_deadline() {
    let engine = PlaybackEngine::new();
    let rx = engine.subscribe();
    let short = vec![GeoPoint::new(45.064, 7.692), GeoPoint::new(45.065, 7.693)];

    // Each delay fits a Duration but the run would end past any Instant
    let result = engine.start(&short, 1e-17);
    assert!(matches!(result, Err(PlaybackError::InvalidSpeed(_))));

    // Segment delays that only overflow once summed
    let result = engine.start(&seven_point_path(), 1e-17);
    assert!(matches!(result, Err(PlaybackError::InvalidSpeed(_))));
    assert!(expected_duration(&seven_point_path(), 1e-17).is_err());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(engine.state(), PlaybackState::Idle);
    assert_eq!(engine.active_run(), None);
    assert!(drain(&rx).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_slow_speed_still_completes() {
    let engine = PlaybackEngine::new();
    let rx = engine.subscribe();
    let short = vec![GeoPoint::new(45.064, 7.692), GeoPoint::new(45.065, 7.693)];

    // About 136 m at 1 mm/s is under two days
    engine.start(&short, 0.001).unwrap();
    tokio::time::sleep(Duration::from_secs(3 * 24 * 3600)).await;

    assert_eq!(engine.state(), PlaybackState::Completed);
    assert!(matches!(
        drain(&rx).last(),
        Some(PlaybackEvent::Completed { .. })
    ));
}
