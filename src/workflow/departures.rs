//! Availability slot management.
//!
//! Admin CRUD over departures. Every mutation is followed by a synchronous
//! derived-field sync for the parent trip, since a create, a price/date
//! edit or a delete can change which departure is cheapest or next.

use crate::error::{BookingError, Result};
use crate::providers::InventoryStore;
use crate::types::{
    Departure, DepartureAvailability, DepartureId, DepartureStatus, TripId,
};
use crate::workflow::sync;
use chrono::{DateTime, Utc};

/// Input for creating a departure.
#[derive(Debug, Clone)]
pub struct NewDeparture {
    /// Parent trip.
    pub trip_id: TripId,
    /// Departure date.
    pub date: DateTime<Utc>,
    /// Price per traveler.
    pub price: f64,
    /// Total capacity; `spots_left` starts here.
    pub max_spots: i32,
}

/// Admin patch for a departure.
///
/// An explicit `status` wins over derivation; otherwise a change to the
/// spot fields re-derives the status (which is how a cancelled departure
/// comes back once spots are replenished).
#[derive(Debug, Clone, Default)]
pub struct DeparturePatch {
    /// New date.
    pub date: Option<DateTime<Utc>>,
    /// New price per traveler.
    pub price: Option<f64>,
    /// New total capacity.
    pub max_spots: Option<i32>,
    /// New remaining capacity.
    pub spots_left: Option<i32>,
    /// Explicit status override (e.g. cancelling a departure).
    pub status: Option<DepartureStatus>,
}

/// Departure management service.
#[derive(Clone)]
pub struct DepartureService<S> {
    store: S,
}

impl<S: InventoryStore> DepartureService<S> {
    /// Create a new service.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create a departure for a trip.
    ///
    /// Rejects a second departure on the same date for the same trip with
    /// `DuplicateDeparture`. `spots_left` is initialized to `max_spots`.
    pub async fn create(&self, request: NewDeparture) -> Result<Departure> {
        if request.max_spots < 1 {
            return Err(BookingError::Validation(
                "max_spots must be at least 1".into(),
            ));
        }
        if !request.price.is_finite() || request.price <= 0.0 {
            return Err(BookingError::Validation(
                "price must be a positive number".into(),
            ));
        }

        // Existence check up front so a bad trip id reports NOT_FOUND
        // rather than a foreign-key failure.
        self.store.trip(request.trip_id).await?;

        let now = Utc::now();
        let departure = Departure {
            id: DepartureId::new(),
            trip_id: request.trip_id,
            date: request.date,
            price: request.price,
            max_spots: request.max_spots,
            spots_left: request.max_spots,
            status: DepartureStatus::derive(request.max_spots),
            created_at: now,
            updated_at: now,
        };

        self.store.insert_departure(&departure).await?;
        self.resync(departure.trip_id).await?;

        tracing::info!(
            departure_id = %departure.id,
            trip_id = %departure.trip_id,
            date = %departure.date,
            "departure created"
        );

        Ok(departure)
    }

    /// Apply an admin patch to a departure.
    pub async fn update(&self, id: DepartureId, patch: DeparturePatch) -> Result<Departure> {
        let mut departure = self.store.departure(id).await?;

        let spots_touched = patch.max_spots.is_some() || patch.spots_left.is_some();

        if let Some(date) = patch.date {
            departure.date = date;
        }
        if let Some(price) = patch.price {
            if !price.is_finite() || price <= 0.0 {
                return Err(BookingError::Validation(
                    "price must be a positive number".into(),
                ));
            }
            departure.price = price;
        }
        if let Some(max_spots) = patch.max_spots {
            departure.max_spots = max_spots;
        }
        if let Some(spots_left) = patch.spots_left {
            departure.spots_left = spots_left;
        }
        if departure.max_spots < 1 || !(0..=departure.max_spots).contains(&departure.spots_left) {
            return Err(BookingError::Validation(
                "spots_left must be between 0 and max_spots".into(),
            ));
        }

        departure.status = match patch.status {
            Some(status) => status,
            None if spots_touched => DepartureStatus::derive(departure.spots_left),
            None => departure.status,
        };
        departure.updated_at = Utc::now();

        self.store.update_departure(&departure).await?;
        self.resync(departure.trip_id).await?;

        Ok(departure)
    }

    /// Delete a departure.
    ///
    /// Blocked with `HasActiveBookings` while any pending or confirmed
    /// booking references it; cancelled/completed bookings do not block.
    pub async fn delete(&self, id: DepartureId) -> Result<()> {
        let departure = self.store.departure(id).await?;

        if self.store.active_booking_count(id).await? > 0 {
            return Err(BookingError::HasActiveBookings);
        }

        self.store.delete_departure(id).await?;
        self.resync(departure.trip_id).await?;

        tracing::info!(departure_id = %id, "departure deleted");
        Ok(())
    }

    /// Fetch a single departure.
    pub async fn get(&self, id: DepartureId) -> Result<Departure> {
        self.store.departure(id).await
    }

    /// All departures, date-ascending. Admin listing.
    pub async fn list_all(&self) -> Result<Vec<Departure>> {
        self.store.all_departures().await
    }

    /// Future bookable departures of a trip, date-ascending, each annotated
    /// with its live count of pending/confirmed bookings.
    pub async fn list_for_trip(&self, trip_id: TripId) -> Result<Vec<DepartureAvailability>> {
        self.store.trip(trip_id).await?;

        let departures = self.store.bookable_departures(trip_id, Utc::now()).await?;
        let mut annotated = Vec::with_capacity(departures.len());
        for departure in departures {
            let active_bookings = self.store.active_booking_count(departure.id).await?;
            annotated.push(DepartureAvailability {
                departure,
                active_bookings,
            });
        }
        Ok(annotated)
    }

    async fn resync(&self, trip_id: TripId) -> Result<()> {
        sync::recompute(&self.store, trip_id).await
    }
}
