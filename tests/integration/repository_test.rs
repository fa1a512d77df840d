//! Integration tests for the trail, review and user repositories.

use trailmap::storage::{Database, StoreError};
use trailmap::trails::{Difficulty, TrailId, UserId};

fn db() -> Database {
    Database::open_in_memory().unwrap()
}

#[test]
fn test_every_seeded_trail_starts_and_ends_on_its_endpoints() {
    let db = db();
    let trails = db.trails().unwrap();

    for summary in trails.list_trails().unwrap() {
        let trail = trails.get_trail(summary.id).unwrap();
        assert_eq!(trail.path.first(), trail.start_point, "trail {}", summary.id);
        assert_eq!(trail.path.last(), trail.end_point, "trail {}", summary.id);
        assert!(trail.path.len() >= 2);
    }
}

#[test]
fn test_seeded_trail_summaries() {
    let db = db();
    let summaries = db.trails().unwrap().list_trails().unwrap();

    let names: Vec<&str> = summaries.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Alternate Trail",
            "Politecnico Trail",
            "Advanced Politecnico Trail"
        ]
    );
    assert_eq!(summaries[1].difficulty, Difficulty::Beginner);
    assert_eq!(summaries[1].location.city, "Torino");
}

#[test]
fn test_search_by_city() {
    let db = db();
    let torino = db.trails().unwrap().search_trails("torino").unwrap();
    assert_eq!(torino.len(), 2);
}

#[test]
fn test_missing_trail_is_not_found() {
    let db = db();
    let err = db.trails().unwrap().get_trail(TrailId(42)).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn test_ratings_one_to_five_are_accepted() {
    let db = db();
    let reviews = db.reviews().unwrap();

    for rating in 1..=5 {
        reviews
            .add_review(UserId(1), TrailId(1), rating, "fine")
            .unwrap();
    }
    assert_eq!(reviews.reviews_for_trail(TrailId(1)).unwrap().len(), 6);
}

#[test]
fn test_ratings_outside_range_are_rejected() {
    let db = db();
    let reviews = db.reviews().unwrap();

    for rating in [0, 6] {
        let err = reviews
            .add_review(UserId(1), TrailId(1), rating, "nope")
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)), "rating {}", rating);
    }
    assert_eq!(reviews.reviews_for_trail(TrailId(1)).unwrap().len(), 1);
}

#[test]
fn test_review_for_missing_trail_is_reference_error() {
    let db = db();
    let err = db
        .reviews()
        .unwrap()
        .add_review(UserId(1), TrailId(99), 4, "where?")
        .unwrap_err();
    assert!(matches!(err, StoreError::Reference(_)));
}

#[test]
fn test_mark_completed_allows_repeats() {
    let db = db();
    let reviews = db.reviews().unwrap();

    assert!(!reviews.has_completed(UserId(1), TrailId(3)).unwrap());
    let first = reviews.mark_completed(UserId(1), TrailId(3)).unwrap();
    let second = reviews.mark_completed(UserId(1), TrailId(3)).unwrap();

    assert_ne!(first, second);
    assert!(reviews.has_completed(UserId(1), TrailId(3)).unwrap());
    assert_eq!(reviews.completions_for_user(UserId(1)).unwrap().len(), 4);
}

#[test]
fn test_seeded_user_lookup() {
    let db = db();
    let users = db.users().unwrap();

    let user = users.get_user(UserId(1)).unwrap();
    assert_eq!(user.name, "marco");

    let found = users
        .find_user_by_email("Marco.Sportelli@studenti.polito.it")
        .unwrap();
    assert_eq!(found.map(|u| u.id), Some(UserId(1)));
    assert!(users.find_user_by_email("nobody@example.com").unwrap().is_none());
}
