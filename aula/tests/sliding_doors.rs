//! Combinable-room exclusion scenarios.
//!
//! A combined hall and its halves are linked through room
//! dependencies: a booking in any related room blocks the whole set,
//! while sibling halves stay independent of each other.

mod common;

use common::{day_range, hour_range, open_test_database, request};

use aula::availability;
use aula::workflow::{self, BookingDecision, CreateBookingOptions};
use aula::Room;

struct Partition {
    half_a: Room,
    half_b: Room,
    combined: Room,
}

fn build_partition(db: &aula::Database) -> Partition {
    let half_a = db.create_room("Hall A", 20).unwrap();
    let half_b = db.create_room("Hall B", 20).unwrap();
    let combined = db.create_room("Hall AB", 45).unwrap();
    db.link_rooms(combined.id, half_a.id).unwrap();
    db.link_rooms(combined.id, half_b.id).unwrap();
    Partition {
        half_a,
        half_b,
        combined,
    }
}

fn book(db: &mut aula::Database, client: &str, room_id: i64, period: aula::TimeRange) -> i64 {
    match workflow::create_booking(
        db,
        &CreateBookingOptions::new(request(client, Some(room_id), period)),
    )
    .unwrap()
    {
        BookingDecision::Booked { booking_id, .. } => booking_id,
        BookingDecision::Conflicts(c) => panic!("unexpected conflicts: {c:?}"),
    }
}

#[test]
fn test_combined_booking_blocks_both_halves() {
    let mut db = open_test_database();
    let partition = build_partition(&db);

    book(&mut db, "Acme Corp", partition.combined.id, day_range(2));

    for half in [&partition.half_a, &partition.half_b] {
        let conflicts =
            availability::room_conflicts(&db, half.id, &day_range(2), None).unwrap();
        assert_eq!(conflicts.len(), 1, "half {} should be blocked", half.name);
        assert_eq!(conflicts[0].room_id, partition.combined.id);
    }
}

#[test]
fn test_half_booking_blocks_the_combined_room() {
    let mut db = open_test_database();
    let partition = build_partition(&db);

    book(&mut db, "Acme Corp", partition.half_a.id, day_range(2));

    let decision = workflow::create_booking(
        &mut db,
        &CreateBookingOptions::new(request(
            "Rival Inc",
            Some(partition.combined.id),
            day_range(2),
        )),
    )
    .unwrap();
    assert!(matches!(decision, BookingDecision::Conflicts(_)));
}

#[test]
fn test_siblings_are_independent() {
    let mut db = open_test_database();
    let partition = build_partition(&db);

    book(&mut db, "Acme Corp", partition.half_a.id, day_range(2));
    // The other half is still free; only the combined hall is blocked.
    book(&mut db, "Rival Inc", partition.half_b.id, day_range(2));

    assert!(
        !availability::check_room(&db, partition.combined.id, &day_range(2), None)
            .unwrap()
            .is_available()
    );
}

#[test]
fn test_related_set_is_symmetric() {
    let db = open_test_database();
    let partition = build_partition(&db);

    let from_half = db.related_rooms(partition.half_a.id).unwrap();
    assert!(from_half.contains(&partition.combined.id));
    assert!(!from_half.contains(&partition.half_b.id));

    let from_combined = db.related_rooms(partition.combined.id).unwrap();
    assert!(from_combined.contains(&partition.half_a.id));
    assert!(from_combined.contains(&partition.half_b.id));
}

#[test]
fn test_exclusion_respects_time_not_just_rooms() {
    let mut db = open_test_database();
    let partition = build_partition(&db);

    book(
        &mut db,
        "Morning Group",
        partition.combined.id,
        hour_range(2, 9, 12),
    );

    // The halves are free again in the afternoon.
    book(
        &mut db,
        "Afternoon Group",
        partition.half_a.id,
        hour_range(2, 12, 16),
    );
    book(
        &mut db,
        "Second Afternoon",
        partition.half_b.id,
        hour_range(2, 12, 16),
    );
}

#[test]
fn test_unlinked_rooms_never_interact() {
    let mut db = open_test_database();
    let partition = build_partition(&db);
    let unrelated = db.create_room("Cedar", 10).unwrap();

    book(&mut db, "Acme Corp", partition.combined.id, day_range(2));
    book(&mut db, "Rival Inc", unrelated.id, day_range(2));
}
