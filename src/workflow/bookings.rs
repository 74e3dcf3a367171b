//! The transactional booking workflow.
//!
//! Creation and cancellation run inside one [`BookingSession`] unit of
//! work: the booking row and the departure capacity change land together or
//! not at all. Notification dispatch and the derived-field resync happen
//! after commit, off the request's critical path.

use crate::constants::{MAX_TRAVELERS, MIN_TRAVELERS};
use crate::error::{BookingError, Result};
use crate::providers::{BookingNotifier, BookingSession, InventoryStore};
use crate::types::{
    Booking, BookingFilter, BookingId, BookingPage, BookingStats, BookingStatus, Departure,
    DepartureId, PaymentStatus, RequestMeta, Trip, TripBookingStatus, TripId,
};
use crate::utils::{generate_booking_number, validate_email};
use crate::workflow::sync;
use chrono::Utc;
use std::sync::Arc;

/// Input for creating a booking.
#[derive(Debug, Clone)]
pub struct CreateBooking {
    /// Trip to book.
    pub trip_id: TripId,
    /// Specific departure, when the customer picked a date.
    pub departure_id: Option<DepartureId>,
    /// Customer first name.
    pub first_name: String,
    /// Customer last name.
    pub last_name: String,
    /// Customer email.
    pub email: String,
    /// Customer phone.
    pub phone: Option<String>,
    /// Number of travelers.
    pub travelers: i32,
    /// Free-text special requests.
    pub special_requests: Option<String>,
}

/// Admin patch for a booking's status and payment fields.
#[derive(Debug, Clone, Default)]
pub struct BookingPatch {
    /// New lifecycle status.
    pub status: Option<BookingStatus>,
    /// New payment status.
    pub payment_status: Option<PaymentStatus>,
    /// Payment method label.
    pub payment_method: Option<String>,
    /// Replacement special-requests text.
    pub special_requests: Option<String>,
}

/// A created booking with its display context.
#[derive(Debug, Clone)]
pub struct CreatedBooking {
    /// The persisted booking.
    pub booking: Booking,
    /// The booked trip.
    pub trip: Trip,
    /// The booked departure as written (post-decrement), if one was chosen.
    pub departure: Option<Departure>,
}

/// Booking workflow over an inventory store and a notifier.
///
/// Constructed once at startup with its collaborators passed in; cloning is
/// cheap (the store is a pool handle, the notifier an `Arc`).
#[derive(Clone)]
pub struct BookingWorkflow<S, N> {
    store: S,
    notifier: Arc<N>,
}

impl<S, N> BookingWorkflow<S, N>
where
    S: InventoryStore,
    N: BookingNotifier,
{
    /// Create a new workflow.
    pub fn new(store: S, notifier: Arc<N>) -> Self {
        Self { store, notifier }
    }

    /// Create a booking.
    ///
    /// Inside one transaction: validates that the trip is open and the
    /// departure (if given) is bookable, computes the total price, inserts
    /// the booking (status pending, payment pending) and decrements the
    /// departure's spots. Any failure rolls everything back.
    ///
    /// After commit: schedules the created-notification and resyncs the
    /// trip's cached fields when capacity changed.
    pub async fn create(&self, request: CreateBooking, meta: RequestMeta) -> Result<CreatedBooking> {
        Self::validate(&request)?;

        let mut session = self.store.begin().await?;

        let trip = session.trip(request.trip_id).await?;
        if trip.booking_status != TripBookingStatus::Open {
            return Err(BookingError::NotBookable);
        }

        let departure = match request.departure_id {
            Some(id) => {
                let departure = session.departure(id).await?;
                if departure.trip_id != request.trip_id {
                    return Err(BookingError::Validation(
                        "departure does not belong to the requested trip".into(),
                    ));
                }
                if !departure.status.is_bookable() {
                    return Err(BookingError::SlotUnavailable);
                }
                Some(departure)
            }
            None => None,
        };

        let unit_price = match &departure {
            Some(departure) => departure.price,
            None => trip.price.ok_or(BookingError::NotBookable)?,
        };

        let now = Utc::now();
        let booking = Booking {
            id: BookingId::new(),
            booking_number: generate_booking_number(),
            trip_id: request.trip_id,
            departure_id: request.departure_id,
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            phone: request.phone,
            travelers: request.travelers,
            total_price: unit_price * f64::from(request.travelers),
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            special_requests: request.special_requests,
            ip: meta.ip,
            user_agent: meta.user_agent,
            created_at: now,
            updated_at: now,
        };

        session.insert_booking(&booking).await?;

        let departure = match departure {
            Some(departure) => Some(session.adjust_spots(departure.id, -booking.travelers).await?),
            None => None,
        };

        session.commit().await?;

        tracing::info!(
            booking_number = %booking.booking_number,
            trip = %trip.name,
            travelers = booking.travelers,
            total_price = booking.total_price,
            "booking created"
        );

        if departure.is_some() {
            self.resync_after_capacity_change(booking.trip_id).await;
        }
        self.dispatch_created(booking.clone(), trip.clone(), departure.clone());

        Ok(CreatedBooking {
            booking,
            trip,
            departure,
        })
    }

    /// Cancel a booking, restoring departure capacity.
    ///
    /// Sets status cancelled and payment refunded, appends the reason to
    /// the special-requests text, and increments the departure's spots when
    /// the booking held any — all in one transaction.
    pub async fn cancel(&self, id: BookingId, reason: Option<String>) -> Result<Booking> {
        let mut session = self.store.begin().await?;

        let mut booking = session.booking(id).await?;
        if booking.status == BookingStatus::Cancelled {
            return Err(BookingError::AlreadyCancelled);
        }

        booking.status = BookingStatus::Cancelled;
        booking.payment_status = PaymentStatus::Refunded;
        if let Some(reason) = reason.filter(|r| !r.trim().is_empty()) {
            let note = format!("Cancellation reason: {reason}");
            booking.special_requests = Some(match booking.special_requests.take() {
                Some(existing) => format!("{existing}\n{note}"),
                None => note,
            });
        }
        booking.updated_at = Utc::now();

        session.update_booking(&booking).await?;

        if let Some(departure_id) = booking.departure_id {
            session.adjust_spots(departure_id, booking.travelers).await?;
        }

        session.commit().await?;

        tracing::info!(
            booking_number = %booking.booking_number,
            "booking cancelled"
        );

        if booking.departure_id.is_some() {
            self.resync_after_capacity_change(booking.trip_id).await;
        }

        Ok(booking)
    }

    /// Apply an admin patch to a booking's status and payment fields.
    ///
    /// No capacity side effects on this path; only create and cancel touch
    /// departure spots. A transition into confirmed schedules the
    /// confirmation notification.
    pub async fn update_status(&self, id: BookingId, patch: BookingPatch) -> Result<Booking> {
        let mut session = self.store.begin().await?;

        let mut booking = session.booking(id).await?;
        let was_confirmed = booking.status == BookingStatus::Confirmed;

        if let Some(status) = patch.status {
            booking.status = status;
        }
        if let Some(payment_status) = patch.payment_status {
            booking.payment_status = payment_status;
        }
        if let Some(payment_method) = patch.payment_method {
            booking.payment_method = Some(payment_method);
        }
        if let Some(special_requests) = patch.special_requests {
            booking.special_requests = Some(special_requests);
        }
        booking.updated_at = Utc::now();

        session.update_booking(&booking).await?;
        session.commit().await?;

        if booking.status == BookingStatus::Confirmed && !was_confirmed {
            self.dispatch_confirmed(booking.clone());
        }

        Ok(booking)
    }

    /// Fetch a booking by id.
    pub async fn get(&self, id: BookingId) -> Result<Booking> {
        self.store.booking(id).await
    }

    /// Fetch a booking by its human-readable booking number.
    pub async fn get_by_number(&self, number: &str) -> Result<Booking> {
        self.store.booking_by_number(number).await
    }

    /// List bookings with filtering, pagination and deterministic order.
    pub async fn list(&self, filter: &BookingFilter) -> Result<BookingPage> {
        self.store.list_bookings(filter).await
    }

    /// Aggregate booking counters.
    pub async fn stats(&self) -> Result<BookingStats> {
        self.store.booking_stats().await
    }

    fn validate(request: &CreateBooking) -> Result<()> {
        if !(MIN_TRAVELERS..=MAX_TRAVELERS).contains(&request.travelers) {
            return Err(BookingError::Validation(format!(
                "travelers must be between {MIN_TRAVELERS} and {MAX_TRAVELERS}"
            )));
        }
        if request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
            return Err(BookingError::Validation(
                "first and last name are required".into(),
            ));
        }
        validate_email(&request.email)
    }

    /// Capacity changes can flip a departure's bookable state, which feeds
    /// the trip's cached price/next-departure. Best effort: the booking has
    /// already committed, so failures are logged, not surfaced.
    async fn resync_after_capacity_change(&self, trip_id: TripId) {
        if let Err(error) = sync::recompute(&self.store, trip_id).await {
            tracing::warn!(%trip_id, %error, "trip cache resync failed after booking change");
        }
    }

    fn dispatch_created(&self, booking: Booking, trip: Trip, departure: Option<Departure>) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(error) = notifier
                .booking_created(&booking, &trip, departure.as_ref())
                .await
            {
                tracing::warn!(
                    booking_number = %booking.booking_number,
                    %error,
                    "booking-created notification failed"
                );
            }
        });
    }

    fn dispatch_confirmed(&self, booking: Booking) {
        let store = self.store.clone();
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            let trip = match store.trip(booking.trip_id).await {
                Ok(trip) => trip,
                Err(error) => {
                    tracing::warn!(
                        booking_number = %booking.booking_number,
                        %error,
                        "could not load trip for confirmation notification"
                    );
                    return;
                }
            };
            if let Err(error) = notifier.booking_confirmed(&booking, &trip).await {
                tracing::warn!(
                    booking_number = %booking.booking_number,
                    %error,
                    "booking-confirmed notification failed"
                );
            }
        });
    }
}
