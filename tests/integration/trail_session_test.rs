//! Integration tests for a full start, end and review flow.

use std::time::Duration;
use trailmap::session::{RunOutcome, SessionError};
use trailmap::storage::{Database, StoreError};
use trailmap::trails::{TrailId, UserId};
use trailmap::{PlaybackEngine, TrailSession};

/// Fast enough that every seeded trail finishes within a few simulated minutes.
const SPEED: f64 = 5.0;

fn completions(db: &Database) -> usize {
    db.reviews()
        .unwrap()
        .completions_for_user(UserId(1))
        .unwrap()
        .len()
}

#[tokio::test(start_paused = true)]
async fn test_completed_run_records_completion_once() {
    let db = Database::open_in_memory().unwrap();
    let engine = PlaybackEngine::new();

    let mut session =
        TrailSession::start(&db, &engine, UserId(1), TrailId(3), SPEED).unwrap();
    assert_eq!(session.trail().name(), "Advanced Politecnico Trail");

    tokio::time::sleep(Duration::from_secs(3600)).await;
    session.poll();
    assert_eq!(session.outcome(), RunOutcome::Completed);

    assert!(session.record_completion(&db).unwrap());
    assert!(!session.record_completion(&db).unwrap());
    assert_eq!(completions(&db), 3);
    assert!(db
        .reviews()
        .unwrap()
        .has_completed(UserId(1), TrailId(3))
        .unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_review_rejected_while_running() {
    let db = Database::open_in_memory().unwrap();
    let engine = PlaybackEngine::new();

    let mut session =
        TrailSession::start(&db, &engine, UserId(1), TrailId(2), SPEED).unwrap();

    let err = session.submit_review(&db, 4, "halfway").unwrap_err();
    assert!(matches!(err, SessionError::StillRunning));
    assert!(!session.record_completion(&db).unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_ended_run_is_abandoned_without_completion() {
    let db = Database::open_in_memory().unwrap();
    let engine = PlaybackEngine::new();

    let mut session =
        TrailSession::start(&db, &engine, UserId(1), TrailId(2), SPEED).unwrap();
    tokio::time::sleep(Duration::from_secs(20)).await;

    assert_eq!(session.end(), RunOutcome::Abandoned);
    assert!(!session.record_completion(&db).unwrap());
    assert_eq!(completions(&db), 2);

    // Abandoned runs may still be reviewed
    session.submit_review(&db, 2, "gave up").unwrap();
    assert_eq!(
        db.reviews()
            .unwrap()
            .reviews_for_trail(TrailId(2))
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test(start_paused = true)]
async fn test_end_after_completion_keeps_outcome() {
    let db = Database::open_in_memory().unwrap();
    let engine = PlaybackEngine::new();

    let mut session =
        TrailSession::start(&db, &engine, UserId(1), TrailId(1), SPEED).unwrap();
    tokio::time::sleep(Duration::from_secs(3600)).await;

    assert_eq!(session.end(), RunOutcome::Completed);
    assert!(session.record_completion(&db).unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_invalid_review_after_completion_is_rejected() {
    let db = Database::open_in_memory().unwrap();
    let engine = PlaybackEngine::new();

    let mut session =
        TrailSession::start(&db, &engine, UserId(1), TrailId(1), SPEED).unwrap();
    tokio::time::sleep(Duration::from_secs(3600)).await;

    let err = session.submit_review(&db, 6, "too good").unwrap_err();
    assert!(matches!(
        err,
        SessionError::Store(StoreError::Validation(_))
    ));
    session.submit_review(&db, 5, "").unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_missing_trail_does_not_start() {
    let db = Database::open_in_memory().unwrap();
    let engine = PlaybackEngine::new();

    let result = TrailSession::start(&db, &engine, UserId(1), TrailId(7), SPEED);
    assert!(matches!(
        result,
        Err(SessionError::Store(StoreError::NotFound(_)))
    ));
    assert_eq!(engine.active_run(), None);
}
