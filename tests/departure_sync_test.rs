//! Departure management and derived-field sync tests.

use chrono::{Duration, Utc};
use std::sync::Arc;
use trailbook::mocks::{MemoryInventoryStore, RecordingNotifier};
use trailbook::providers::InventoryStore;
use trailbook::types::{DepartureStatus, RequestMeta, Trip, TripBookingStatus, TripId};
use trailbook::workflow::{
    sync, BookingWorkflow, CreateBooking, DeparturePatch, DepartureService, NewDeparture,
};
use trailbook::BookingError;

fn trip() -> Trip {
    let now = Utc::now();
    Trip {
        id: TripId::new(),
        name: "Sahara Expedition".into(),
        category: "desert".into(),
        difficulty: "moderate".into(),
        min_group: 2,
        max_group: 10,
        price: None,
        next_departure: None,
        booking_status: TripBookingStatus::Open,
        created_at: now,
        updated_at: now,
    }
}

fn new_departure(trip_id: TripId, days_ahead: i64, price: f64, spots: i32) -> NewDeparture {
    NewDeparture {
        trip_id,
        date: Utc::now() + Duration::days(days_ahead),
        price,
        max_spots: spots,
    }
}

fn service() -> (MemoryInventoryStore, DepartureService<MemoryInventoryStore>) {
    let store = MemoryInventoryStore::new();
    (store.clone(), DepartureService::new(store))
}

#[tokio::test]
async fn test_create_initializes_spots_and_syncs_trip_cache() {
    let (store, service) = service();
    let t = trip();
    store.insert_trip(t.clone());

    let d = service.create(new_departure(t.id, 60, 2100.0, 8)).await.unwrap();
    assert_eq!(d.spots_left, 8);
    assert_eq!(d.status, DepartureStatus::Available);

    let cached = store.trip(t.id).await.unwrap();
    assert_eq!(cached.price, Some(2100.0));
    assert_eq!(cached.next_departure, Some(d.date));
}

#[tokio::test]
async fn test_recompute_is_idempotent() {
    let (store, service) = service();
    let t = trip();
    store.insert_trip(t.clone());

    service.create(new_departure(t.id, 20, 2400.0, 8)).await.unwrap();
    service.create(new_departure(t.id, 50, 1800.0, 8)).await.unwrap();

    let first = store.trip(t.id).await.unwrap();

    // Repeated runs with unchanged departures write the same values.
    sync::recompute(&store, t.id).await.unwrap();
    sync::recompute(&store, t.id).await.unwrap();

    let after = store.trip(t.id).await.unwrap();
    assert_eq!(after.price, first.price);
    assert_eq!(after.next_departure, first.next_departure);
}

#[tokio::test]
async fn test_cache_tracks_cheapest_price_and_soonest_date() {
    let (store, service) = service();
    let t = trip();
    store.insert_trip(t.clone());

    // The soonest departure is not the cheapest one.
    let soonest = service.create(new_departure(t.id, 20, 2400.0, 8)).await.unwrap();
    service.create(new_departure(t.id, 50, 1800.0, 8)).await.unwrap();
    let cheapest = service.create(new_departure(t.id, 90, 1500.0, 8)).await.unwrap();

    let cached = store.trip(t.id).await.unwrap();
    assert_eq!(cached.price, Some(1500.0));
    assert_eq!(cached.next_departure, Some(soonest.date));

    // Deleting the cheapest re-derives from what remains.
    service.delete(cheapest.id).await.unwrap();
    let cached = store.trip(t.id).await.unwrap();
    assert_eq!(cached.price, Some(1800.0));
    assert_eq!(cached.next_departure, Some(soonest.date));
}

#[tokio::test]
async fn test_cache_clears_when_no_future_departure_remains() {
    let (store, service) = service();
    let t = trip();
    store.insert_trip(t.clone());

    let d = service.create(new_departure(t.id, 30, 1800.0, 8)).await.unwrap();
    assert!(store.trip(t.id).await.unwrap().price.is_some());

    service.delete(d.id).await.unwrap();
    let cached = store.trip(t.id).await.unwrap();
    assert_eq!(cached.price, None);
    assert_eq!(cached.next_departure, None);
}

#[tokio::test]
async fn test_cancelled_departure_leaves_the_cache() {
    let (store, service) = service();
    let t = trip();
    store.insert_trip(t.clone());

    let d = service.create(new_departure(t.id, 30, 1800.0, 8)).await.unwrap();
    service
        .update(
            d.id,
            DeparturePatch {
                status: Some(DepartureStatus::Cancelled),
                ..DeparturePatch::default()
            },
        )
        .await
        .unwrap();

    let cached = store.trip(t.id).await.unwrap();
    assert_eq!(cached.price, None);
    assert_eq!(cached.next_departure, None);
}

#[tokio::test]
async fn test_cancelled_is_sticky_until_spots_change() {
    let (store, service) = service();
    let t = trip();
    store.insert_trip(t.clone());

    let d = service.create(new_departure(t.id, 30, 1800.0, 8)).await.unwrap();
    service
        .update(
            d.id,
            DeparturePatch {
                status: Some(DepartureStatus::Cancelled),
                ..DeparturePatch::default()
            },
        )
        .await
        .unwrap();

    // A price edit alone does not revive the departure.
    let updated = service
        .update(
            d.id,
            DeparturePatch {
                price: Some(1900.0),
                ..DeparturePatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, DepartureStatus::Cancelled);

    // Touching the spot fields re-derives the status.
    let revived = service
        .update(
            d.id,
            DeparturePatch {
                spots_left: Some(2),
                ..DeparturePatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(revived.status, DepartureStatus::Limited);
    assert_eq!(store.trip(t.id).await.unwrap().price, Some(1900.0));
}

#[tokio::test]
async fn test_duplicate_date_for_same_trip_rejected() {
    let (store, service) = service();
    let t = trip();
    store.insert_trip(t.clone());

    let date = Utc::now() + Duration::days(30);
    service
        .create(NewDeparture {
            trip_id: t.id,
            date,
            price: 1800.0,
            max_spots: 8,
        })
        .await
        .unwrap();

    let result = service
        .create(NewDeparture {
            trip_id: t.id,
            date,
            price: 1950.0,
            max_spots: 4,
        })
        .await;
    assert_eq!(result.unwrap_err(), BookingError::DuplicateDeparture);

    // The same date on a different trip is fine.
    let other = trip();
    store.insert_trip(other.clone());
    assert!(service
        .create(NewDeparture {
            trip_id: other.id,
            date,
            price: 900.0,
            max_spots: 6,
        })
        .await
        .is_ok());
}

#[tokio::test]
async fn test_create_validates_inputs_and_trip_existence() {
    let (store, service) = service();
    let t = trip();
    store.insert_trip(t.clone());

    assert!(matches!(
        service.create(new_departure(t.id, 30, 1800.0, 0)).await,
        Err(BookingError::Validation(_))
    ));
    assert!(matches!(
        service.create(new_departure(t.id, 30, -5.0, 8)).await,
        Err(BookingError::Validation(_))
    ));
    assert_eq!(
        service
            .create(new_departure(TripId::new(), 30, 1800.0, 8))
            .await
            .unwrap_err(),
        BookingError::TripNotFound
    );
}

#[tokio::test]
async fn test_update_validates_spot_range() {
    let (store, service) = service();
    let t = trip();
    store.insert_trip(t.clone());
    let d = service.create(new_departure(t.id, 30, 1800.0, 8)).await.unwrap();

    let result = service
        .update(
            d.id,
            DeparturePatch {
                spots_left: Some(12),
                ..DeparturePatch::default()
            },
        )
        .await;
    assert!(matches!(result, Err(BookingError::Validation(_))));
}

#[tokio::test]
async fn test_delete_blocked_by_active_bookings() {
    let (store, service) = service();
    let t = trip();
    store.insert_trip(t.clone());
    let d = service.create(new_departure(t.id, 30, 1800.0, 8)).await.unwrap();

    let workflow = BookingWorkflow::new(store.clone(), Arc::new(RecordingNotifier::new()));
    let created = workflow
        .create(
            CreateBooking {
                trip_id: t.id,
                departure_id: Some(d.id),
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: "ada@example.com".into(),
                phone: None,
                travelers: 2,
                special_requests: None,
            },
            RequestMeta::default(),
        )
        .await
        .unwrap();

    assert_eq!(
        service.delete(d.id).await.unwrap_err(),
        BookingError::HasActiveBookings
    );

    // Cancelled bookings no longer block deletion.
    workflow.cancel(created.booking.id, None).await.unwrap();
    assert!(service.delete(d.id).await.is_ok());
    assert_eq!(
        store.departure(d.id).await.unwrap_err(),
        BookingError::DepartureNotFound
    );
}

#[tokio::test]
async fn test_list_for_trip_reports_bookable_with_counts() {
    let (store, service) = service();
    let t = trip();
    store.insert_trip(t.clone());

    let d1 = service.create(new_departure(t.id, 10, 1800.0, 8)).await.unwrap();
    let d2 = service.create(new_departure(t.id, 40, 1700.0, 8)).await.unwrap();
    // Cancelled departures are not offered.
    service
        .update(
            d2.id,
            DeparturePatch {
                status: Some(DepartureStatus::Cancelled),
                ..DeparturePatch::default()
            },
        )
        .await
        .unwrap();

    let workflow = BookingWorkflow::new(store.clone(), Arc::new(RecordingNotifier::new()));
    workflow
        .create(
            CreateBooking {
                trip_id: t.id,
                departure_id: Some(d1.id),
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: "ada@example.com".into(),
                phone: None,
                travelers: 2,
                special_requests: None,
            },
            RequestMeta::default(),
        )
        .await
        .unwrap();

    let listed = service.list_for_trip(t.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].departure.id, d1.id);
    assert_eq!(listed[0].active_bookings, 1);

    assert_eq!(
        service.list_for_trip(TripId::new()).await.unwrap_err(),
        BookingError::TripNotFound
    );
}
