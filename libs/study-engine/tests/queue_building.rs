//! Queue builder tests.

mod common;

use chrono::Duration;
use common::fixtures::{self, t0, user};
use common::MemoryStore;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use study_engine::{build_queue, shuffle, QueueOptions};

/// Most overdue due cards first, then new cards, each under its own cap.
#[tokio::test]
async fn due_cards_precede_new_under_caps() {
    let store = MemoryStore::new(5);
    let catalog = fixtures::catalog(5);

    store.seed_record(fixtures::review_record(user(), 1, t0() - Duration::days(3), 5.0, 5.0));
    store.seed_record(fixtures::review_record(user(), 2, t0() - Duration::days(2), 5.0, 5.0));
    store.seed_record(fixtures::review_record(user(), 3, t0() - Duration::days(1), 5.0, 5.0));

    let options = QueueOptions {
        new_per_day: 1,
        max_reviews: 2,
        ..QueueOptions::default()
    };
    let queue = build_queue(&store, user(), &catalog, t0(), &options)
        .await
        .unwrap();

    assert_eq!(queue.card_ids(), &[1, 2, 4]);
}

/// A zero new-card cap yields only due cards.
#[tokio::test]
async fn zero_new_cap_excludes_new_cards() {
    let store = MemoryStore::new(3);
    let catalog = fixtures::catalog(3);
    store.seed_record(fixtures::review_record(user(), 1, t0() - Duration::days(1), 5.0, 5.0));

    let options = QueueOptions {
        new_per_day: 0,
        ..QueueOptions::default()
    };
    let queue = build_queue(&store, user(), &catalog, t0(), &options)
        .await
        .unwrap();

    assert_eq!(queue.card_ids(), &[1]);
}

/// A zero review cap yields only new cards.
#[tokio::test]
async fn zero_review_cap_excludes_due_cards() {
    let store = MemoryStore::new(3);
    let catalog = fixtures::catalog(3);
    store.seed_record(fixtures::review_record(user(), 1, t0() - Duration::days(1), 5.0, 5.0));

    let options = QueueOptions {
        max_reviews: 0,
        ..QueueOptions::default()
    };
    let queue = build_queue(&store, user(), &catalog, t0(), &options)
        .await
        .unwrap();

    assert_eq!(queue.card_ids(), &[2, 3]);
}

/// Nothing due and nothing new is a legal, empty queue.
#[tokio::test]
async fn empty_sources_build_empty_queue() {
    let store = MemoryStore::new(0);
    let queue = build_queue(&store, user(), &[], t0(), &QueueOptions::default())
        .await
        .unwrap();

    assert!(queue.is_empty());
}

/// Cards due in the future stay out of the queue.
#[tokio::test]
async fn future_due_cards_are_not_queued() {
    let store = MemoryStore::new(1);
    let catalog = fixtures::catalog(1);
    store.seed_record(fixtures::review_record(user(), 1, t0() + Duration::days(2), 5.0, 5.0));

    let options = QueueOptions {
        new_per_day: 0,
        ..QueueOptions::default()
    };
    let queue = build_queue(&store, user(), &catalog, t0(), &options)
        .await
        .unwrap();

    assert!(queue.is_empty());
}

/// Tag filters restrict both sets before truncation, so a matching card
/// behind a non-matching one still makes the cut.
#[tokio::test]
async fn tag_filter_applies_before_truncation() {
    let store = MemoryStore::new(5);
    let catalog = vec![
        fixtures::card(1, "skeletal", &["bones"], None),
        fixtures::card(2, "muscular", &["muscles"], None),
        fixtures::card(3, "muscular", &["muscles"], None),
        fixtures::card(4, "skeletal", &["bones"], None),
        fixtures::card(5, "muscular", &["muscles"], None),
    ];

    // Card 1 is the most overdue but carries the wrong tag.
    store.seed_record(fixtures::review_record(user(), 1, t0() - Duration::days(5), 5.0, 5.0));
    store.seed_record(fixtures::review_record(user(), 2, t0() - Duration::days(2), 5.0, 5.0));
    store.seed_record(fixtures::review_record(user(), 3, t0() - Duration::days(1), 5.0, 5.0));

    let options = QueueOptions {
        new_per_day: 1,
        max_reviews: 2,
        tags: Some(vec!["muscles".to_string()]),
        structures: None,
    };
    let queue = build_queue(&store, user(), &catalog, t0(), &options)
        .await
        .unwrap();

    assert_eq!(queue.card_ids(), &[2, 3, 5]);
}

/// Structure filters keep only cards anchored to a requested structure.
#[tokio::test]
async fn structure_filter_restricts_new_cards() {
    let store = MemoryStore::new(3);
    let catalog = vec![
        fixtures::card(1, "skeletal", &[], Some("femur")),
        fixtures::card(2, "skeletal", &[], Some("tibia")),
        fixtures::card(3, "skeletal", &[], None),
    ];

    let options = QueueOptions {
        structures: Some(vec!["tibia".to_string()]),
        ..QueueOptions::default()
    };
    let queue = build_queue(&store, user(), &catalog, t0(), &options)
        .await
        .unwrap();

    assert_eq!(queue.card_ids(), &[2]);
}

/// Shuffle permutes in place without losing cards; a seeded RNG makes the
/// order reproducible.
#[tokio::test]
async fn shuffle_preserves_contents() {
    let store = MemoryStore::new(10);
    let catalog = fixtures::catalog(10);
    let mut queue = build_queue(&store, user(), &catalog, t0(), &QueueOptions::default())
        .await
        .unwrap();

    let mut rng = StdRng::seed_from_u64(7);
    shuffle(&mut queue, &mut rng);

    let mut ids = queue.card_ids().to_vec();
    ids.sort_unstable();
    assert_eq!(ids, (1..=10).collect::<Vec<i64>>());

    let mut rng = StdRng::seed_from_u64(7);
    let mut again = build_queue(&store, user(), &catalog, t0(), &QueueOptions::default())
        .await
        .unwrap();
    shuffle(&mut again, &mut rng);
    assert_eq!(queue.card_ids(), again.card_ids());
}
