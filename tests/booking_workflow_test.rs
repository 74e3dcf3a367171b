//! Booking workflow tests over the in-memory store.

use chrono::{Duration, Utc};
use std::sync::Arc;
use trailbook::mocks::{MemoryInventoryStore, NotifierCall, RecordingNotifier};
use trailbook::providers::InventoryStore;
use trailbook::types::{
    BookingStatus, Departure, DepartureId, DepartureStatus, PaymentStatus, RequestMeta, Trip,
    TripBookingStatus, TripId,
};
use trailbook::workflow::{BookingPatch, BookingWorkflow, CreateBooking};
use trailbook::BookingError;

fn trip(booking_status: TripBookingStatus) -> Trip {
    let now = Utc::now();
    Trip {
        id: TripId::new(),
        name: "Annapurna Circuit".into(),
        category: "trekking".into(),
        difficulty: "challenging".into(),
        min_group: 2,
        max_group: 14,
        price: None,
        next_departure: None,
        booking_status,
        created_at: now,
        updated_at: now,
    }
}

fn departure(trip_id: TripId, days_ahead: i64, price: f64, spots: i32) -> Departure {
    let now = Utc::now();
    Departure {
        id: DepartureId::new(),
        trip_id,
        date: now + Duration::days(days_ahead),
        price,
        max_spots: spots,
        spots_left: spots,
        status: DepartureStatus::derive(spots),
        created_at: now,
        updated_at: now,
    }
}

fn request(trip_id: TripId, departure_id: Option<DepartureId>, travelers: i32) -> CreateBooking {
    CreateBooking {
        trip_id,
        departure_id,
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: "ada@example.com".into(),
        phone: Some("+33 6 12 34 56 78".into()),
        travelers,
        special_requests: None,
    }
}

struct Fixture {
    store: MemoryInventoryStore,
    notifier: Arc<RecordingNotifier>,
    workflow: BookingWorkflow<MemoryInventoryStore, RecordingNotifier>,
}

fn fixture() -> Fixture {
    let store = MemoryInventoryStore::new();
    let notifier = Arc::new(RecordingNotifier::new());
    let workflow = BookingWorkflow::new(store.clone(), Arc::clone(&notifier));
    Fixture {
        store,
        notifier,
        workflow,
    }
}

#[tokio::test]
async fn test_create_booking_decrements_spots_and_prices_total() {
    let f = fixture();
    let t = trip(TripBookingStatus::Open);
    f.store.insert_trip(t.clone());
    let d = departure(t.id, 45, 1450.0, 10);
    f.store.insert_departure(&d).await.unwrap();

    let created = f
        .workflow
        .create(
            request(t.id, Some(d.id), 3),
            RequestMeta {
                ip: Some("203.0.113.7".into()),
                user_agent: Some("test-agent".into()),
            },
        )
        .await
        .unwrap();

    assert_eq!(created.booking.status, BookingStatus::Pending);
    assert_eq!(created.booking.payment_status, PaymentStatus::Pending);
    assert_eq!(created.booking.total_price, 4350.0);
    assert!(created.booking.booking_number.starts_with("TB-"));
    assert_eq!(created.booking.ip.as_deref(), Some("203.0.113.7"));

    let stored = f.store.departure(d.id).await.unwrap();
    assert_eq!(stored.spots_left, 7);
    assert_eq!(stored.status, DepartureStatus::Available);

    let calls = f.notifier.wait_for_calls(1).await;
    assert_eq!(
        calls,
        vec![NotifierCall::Created {
            booking_number: created.booking.booking_number.clone(),
            with_departure: true,
        }]
    );
}

#[tokio::test]
async fn test_create_booking_flips_status_to_limited_and_sold_out() {
    let f = fixture();
    let t = trip(TripBookingStatus::Open);
    f.store.insert_trip(t.clone());
    let d = departure(t.id, 30, 900.0, 5);
    f.store.insert_departure(&d).await.unwrap();

    f.workflow
        .create(request(t.id, Some(d.id), 2), RequestMeta::default())
        .await
        .unwrap();
    assert_eq!(
        f.store.departure(d.id).await.unwrap().status,
        DepartureStatus::Limited
    );

    f.workflow
        .create(request(t.id, Some(d.id), 3), RequestMeta::default())
        .await
        .unwrap();
    let stored = f.store.departure(d.id).await.unwrap();
    assert_eq!(stored.spots_left, 0);
    assert_eq!(stored.status, DepartureStatus::SoldOut);

    // Sold out departures reject further bookings.
    let result = f
        .workflow
        .create(request(t.id, Some(d.id), 1), RequestMeta::default())
        .await;
    assert_eq!(result.unwrap_err(), BookingError::SlotUnavailable);
}

#[tokio::test]
async fn test_create_booking_rejects_insufficient_capacity_atomically() {
    let f = fixture();
    let t = trip(TripBookingStatus::Open);
    f.store.insert_trip(t.clone());
    let d = departure(t.id, 30, 900.0, 2);
    f.store.insert_departure(&d).await.unwrap();

    let result = f
        .workflow
        .create(request(t.id, Some(d.id), 5), RequestMeta::default())
        .await;
    assert_eq!(result.unwrap_err(), BookingError::SlotUnavailable);

    // Nothing persisted: the insert rolled back with the failed decrement.
    assert_eq!(f.store.departure(d.id).await.unwrap().spots_left, 2);
    assert_eq!(f.store.booking_stats().await.unwrap().total_bookings, 0);
}

#[tokio::test]
async fn test_create_booking_without_departure_uses_trip_price() {
    let f = fixture();
    let mut t = trip(TripBookingStatus::Open);
    t.price = Some(1200.0);
    f.store.insert_trip(t.clone());

    let created = f
        .workflow
        .create(request(t.id, None, 2), RequestMeta::default())
        .await
        .unwrap();
    assert_eq!(created.booking.total_price, 2400.0);
    assert!(created.departure.is_none());
}

#[tokio::test]
async fn test_create_booking_requires_a_price_source() {
    let f = fixture();
    // No cached price and no departure chosen.
    let t = trip(TripBookingStatus::Open);
    f.store.insert_trip(t.clone());

    let result = f
        .workflow
        .create(request(t.id, None, 2), RequestMeta::default())
        .await;
    assert_eq!(result.unwrap_err(), BookingError::NotBookable);
}

#[tokio::test]
async fn test_create_booking_rejects_closed_trip() {
    let f = fixture();
    let t = trip(TripBookingStatus::Closed);
    f.store.insert_trip(t.clone());

    let result = f
        .workflow
        .create(request(t.id, None, 2), RequestMeta::default())
        .await;
    assert_eq!(result.unwrap_err(), BookingError::NotBookable);
}

#[tokio::test]
async fn test_create_booking_validation() {
    let f = fixture();
    let t = trip(TripBookingStatus::Open);
    f.store.insert_trip(t.clone());

    for travelers in [0, 21] {
        let result = f
            .workflow
            .create(request(t.id, None, travelers), RequestMeta::default())
            .await;
        assert!(matches!(result, Err(BookingError::Validation(_))));
    }

    let mut bad_email = request(t.id, None, 2);
    bad_email.email = "not-an-email".into();
    assert!(matches!(
        f.workflow.create(bad_email, RequestMeta::default()).await,
        Err(BookingError::Validation(_))
    ));

    let mut blank_name = request(t.id, None, 2);
    blank_name.first_name = "   ".into();
    assert!(matches!(
        f.workflow.create(blank_name, RequestMeta::default()).await,
        Err(BookingError::Validation(_))
    ));
}

#[tokio::test]
async fn test_create_booking_rejects_departure_of_another_trip() {
    let f = fixture();
    let t = trip(TripBookingStatus::Open);
    let other = trip(TripBookingStatus::Open);
    f.store.insert_trip(t.clone());
    f.store.insert_trip(other.clone());
    let d = departure(other.id, 30, 900.0, 5);
    f.store.insert_departure(&d).await.unwrap();

    let result = f
        .workflow
        .create(request(t.id, Some(d.id), 2), RequestMeta::default())
        .await;
    assert!(matches!(result, Err(BookingError::Validation(_))));
}

#[tokio::test]
async fn test_failed_commit_leaves_no_partial_state() {
    let f = fixture();
    let t = trip(TripBookingStatus::Open);
    f.store.insert_trip(t.clone());
    let d = departure(t.id, 30, 900.0, 10);
    f.store.insert_departure(&d).await.unwrap();

    f.store.fail_next_commit();
    let result = f
        .workflow
        .create(request(t.id, Some(d.id), 4), RequestMeta::default())
        .await;
    assert!(matches!(result, Err(BookingError::Database(_))));

    assert_eq!(f.store.departure(d.id).await.unwrap().spots_left, 10);
    assert_eq!(f.store.booking_stats().await.unwrap().total_bookings, 0);
}

#[tokio::test]
async fn test_cancel_restores_capacity_and_refunds() {
    let f = fixture();
    let t = trip(TripBookingStatus::Open);
    f.store.insert_trip(t.clone());
    let d = departure(t.id, 30, 900.0, 5);
    f.store.insert_departure(&d).await.unwrap();

    let created = f
        .workflow
        .create(request(t.id, Some(d.id), 4), RequestMeta::default())
        .await
        .unwrap();
    assert_eq!(f.store.departure(d.id).await.unwrap().spots_left, 1);

    let cancelled = f
        .workflow
        .cancel(created.booking.id, Some("change of plans".into()))
        .await
        .unwrap();

    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.payment_status, PaymentStatus::Refunded);
    assert_eq!(
        cancelled.special_requests.as_deref(),
        Some("Cancellation reason: change of plans")
    );

    let stored = f.store.departure(d.id).await.unwrap();
    assert_eq!(stored.spots_left, 5);
    assert_eq!(stored.status, DepartureStatus::Available);
}

#[tokio::test]
async fn test_cancel_confirmed_booking_revives_sold_out_departure() {
    let f = fixture();
    let t = trip(TripBookingStatus::Open);
    f.store.insert_trip(t.clone());
    let d = departure(t.id, 30, 900.0, 3);
    f.store.insert_departure(&d).await.unwrap();

    let created = f
        .workflow
        .create(request(t.id, Some(d.id), 3), RequestMeta::default())
        .await
        .unwrap();
    assert_eq!(
        f.store.departure(d.id).await.unwrap().status,
        DepartureStatus::SoldOut
    );

    f.workflow
        .update_status(
            created.booking.id,
            BookingPatch {
                status: Some(BookingStatus::Confirmed),
                payment_status: Some(PaymentStatus::Paid),
                ..BookingPatch::default()
            },
        )
        .await
        .unwrap();

    // Cancelling a confirmed booking releases its capacity too.
    let cancelled = f.workflow.cancel(created.booking.id, None).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.payment_status, PaymentStatus::Refunded);

    let stored = f.store.departure(d.id).await.unwrap();
    assert_eq!(stored.spots_left, 3);
    assert_eq!(stored.status, DepartureStatus::Limited);
}

#[tokio::test]
async fn test_cancel_after_capacity_shrink_clamps_the_restore() {
    let f = fixture();
    let t = trip(TripBookingStatus::Open);
    f.store.insert_trip(t.clone());
    let d = departure(t.id, 30, 900.0, 5);
    f.store.insert_departure(&d).await.unwrap();

    let created = f
        .workflow
        .create(request(t.id, Some(d.id), 4), RequestMeta::default())
        .await
        .unwrap();
    assert_eq!(f.store.departure(d.id).await.unwrap().spots_left, 1);

    // Admin shrinks the departure while the booking is live.
    let mut shrunk = f.store.departure(d.id).await.unwrap();
    shrunk.max_spots = 3;
    f.store.update_departure(&shrunk).await.unwrap();

    // The restore clamps at the new capacity instead of failing.
    let cancelled = f.workflow.cancel(created.booking.id, None).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    let stored = f.store.departure(d.id).await.unwrap();
    assert_eq!(stored.spots_left, 3);
    assert_eq!(stored.status, DepartureStatus::Limited);
}

#[tokio::test]
async fn test_cancel_twice_is_rejected() {
    let f = fixture();
    let t = trip(TripBookingStatus::Open);
    f.store.insert_trip(t.clone());
    let d = departure(t.id, 30, 900.0, 5);
    f.store.insert_departure(&d).await.unwrap();

    let created = f
        .workflow
        .create(request(t.id, Some(d.id), 2), RequestMeta::default())
        .await
        .unwrap();

    f.workflow.cancel(created.booking.id, None).await.unwrap();
    let result = f.workflow.cancel(created.booking.id, None).await;
    assert_eq!(result.unwrap_err(), BookingError::AlreadyCancelled);

    // Capacity restored exactly once.
    assert_eq!(f.store.departure(d.id).await.unwrap().spots_left, 5);
}

#[tokio::test]
async fn test_confirmation_transition_dispatches_once() {
    let f = fixture();
    let t = trip(TripBookingStatus::Open);
    f.store.insert_trip(t.clone());
    let d = departure(t.id, 30, 900.0, 5);
    f.store.insert_departure(&d).await.unwrap();

    let created = f
        .workflow
        .create(request(t.id, Some(d.id), 2), RequestMeta::default())
        .await
        .unwrap();
    f.notifier.wait_for_calls(1).await;

    let patch = BookingPatch {
        status: Some(BookingStatus::Confirmed),
        payment_status: Some(PaymentStatus::Paid),
        payment_method: Some("card".into()),
        special_requests: None,
    };
    let updated = f
        .workflow
        .update_status(created.booking.id, patch.clone())
        .await
        .unwrap();
    assert_eq!(updated.status, BookingStatus::Confirmed);
    assert_eq!(updated.payment_method.as_deref(), Some("card"));

    let calls = f.notifier.wait_for_calls(2).await;
    assert_eq!(
        calls.last(),
        Some(&NotifierCall::Confirmed {
            booking_number: created.booking.booking_number.clone(),
        })
    );

    // Re-applying confirmed is not a transition; no extra dispatch.
    f.workflow
        .update_status(created.booking.id, patch)
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(30)).await;
    assert_eq!(f.notifier.calls().len(), 2);
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_creation() {
    let f = fixture();
    let mut t = trip(TripBookingStatus::Open);
    t.price = Some(1200.0);
    f.store.insert_trip(t.clone());
    f.notifier.fail_all();

    let created = f
        .workflow
        .create(request(t.id, None, 1), RequestMeta::default())
        .await;
    assert!(created.is_ok());
}

#[tokio::test]
async fn test_stats_track_statuses_and_revenue() {
    let f = fixture();
    let mut t = trip(TripBookingStatus::Open);
    t.price = Some(100.0);
    f.store.insert_trip(t.clone());

    let first = f
        .workflow
        .create(request(t.id, None, 1), RequestMeta::default())
        .await
        .unwrap();
    let second = f
        .workflow
        .create(request(t.id, None, 2), RequestMeta::default())
        .await
        .unwrap();
    f.workflow
        .create(request(t.id, None, 3), RequestMeta::default())
        .await
        .unwrap();

    f.workflow
        .update_status(
            first.booking.id,
            BookingPatch {
                status: Some(BookingStatus::Confirmed),
                ..BookingPatch::default()
            },
        )
        .await
        .unwrap();
    f.workflow.cancel(second.booking.id, None).await.unwrap();

    let stats = f.workflow.stats().await.unwrap();
    assert_eq!(stats.total_bookings, 3);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.confirmed, 1);
    assert_eq!(stats.cancelled, 1);
    assert_eq!(stats.completed, 0);
    // Revenue counts confirmed/completed only.
    assert_eq!(stats.revenue, 100.0);
}

#[tokio::test]
async fn test_get_by_number_round_trip() {
    let f = fixture();
    let mut t = trip(TripBookingStatus::Open);
    t.price = Some(100.0);
    f.store.insert_trip(t.clone());

    let created = f
        .workflow
        .create(request(t.id, None, 1), RequestMeta::default())
        .await
        .unwrap();

    let fetched = f
        .workflow
        .get_by_number(&created.booking.booking_number)
        .await
        .unwrap();
    assert_eq!(fetched.id, created.booking.id);

    let missing = f.workflow.get_by_number("TB-19700101-XXXXXX").await;
    assert_eq!(missing.unwrap_err(), BookingError::BookingNotFound);
}
