//! Inventory store trait and its transactional session.
//!
//! [`InventoryStore`] is the persistence seam for trips, departures and
//! bookings. Read-side queries and single-statement departure mutations go
//! straight through the store; the booking create/cancel/patch paths go
//! through a [`BookingSession`] — an explicit unit of work whose writes land
//! together on `commit` or not at all.

use crate::error::Result;
use crate::types::{
    Booking, BookingFilter, BookingId, BookingPage, BookingStats, Departure, DepartureId, Trip,
    TripId,
};
use chrono::{DateTime, Utc};
use std::future::Future;

/// Persistence seam for the booking service.
///
/// Implementations must be cheap to clone (a connection pool handle, or an
/// `Arc` around shared state).
pub trait InventoryStore: Clone + Send + Sync + 'static {
    /// The unit-of-work type produced by [`InventoryStore::begin`].
    type Session: BookingSession;

    /// Open a transactional session.
    ///
    /// All writes performed through the session become visible only after
    /// [`BookingSession::commit`]; dropping the session discards them.
    fn begin(&self) -> impl Future<Output = Result<Self::Session>> + Send;

    // ── Trips ──────────────────────────────────────────────────────────

    /// Fetch a trip. Fails with `TripNotFound` when absent.
    fn trip(&self, id: TripId) -> impl Future<Output = Result<Trip>> + Send;

    /// Overwrite a trip's cached cheapest price and next departure date.
    ///
    /// Only the derived-field sync calls this.
    fn set_trip_cache(
        &self,
        trip_id: TripId,
        price: Option<f64>,
        next_departure: Option<DateTime<Utc>>,
    ) -> impl Future<Output = Result<()>> + Send;

    // ── Departures ─────────────────────────────────────────────────────

    /// Fetch a departure. Fails with `DepartureNotFound` when absent.
    fn departure(&self, id: DepartureId) -> impl Future<Output = Result<Departure>> + Send;

    /// Insert a new departure.
    ///
    /// Fails with `DuplicateDeparture` when one already exists for the same
    /// `(trip, date)` pair.
    fn insert_departure(&self, departure: &Departure)
        -> impl Future<Output = Result<()>> + Send;

    /// Persist an updated departure.
    ///
    /// Fails with `DepartureNotFound` when absent and `DuplicateDeparture`
    /// when a date change collides with another departure of the trip.
    fn update_departure(&self, departure: &Departure)
        -> impl Future<Output = Result<()>> + Send;

    /// Delete a departure. Fails with `DepartureNotFound` when absent.
    ///
    /// Callers are responsible for the live-booking guard; the store only
    /// removes the row.
    fn delete_departure(&self, id: DepartureId) -> impl Future<Output = Result<()>> + Send;

    /// All departures, date-ascending. Admin listing.
    fn all_departures(&self) -> impl Future<Output = Result<Vec<Departure>>> + Send;

    /// Future bookable (available/limited) departures of a trip, strictly
    /// after `after`, date-ascending.
    fn bookable_departures(
        &self,
        trip_id: TripId,
        after: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<Departure>>> + Send;

    /// Count of pending/confirmed bookings referencing a departure.
    fn active_booking_count(&self, id: DepartureId)
        -> impl Future<Output = Result<u64>> + Send;

    // ── Bookings (read side) ───────────────────────────────────────────

    /// Fetch a booking. Fails with `BookingNotFound` when absent.
    fn booking(&self, id: BookingId) -> impl Future<Output = Result<Booking>> + Send;

    /// Fetch a booking by its booking number. Fails with `BookingNotFound`
    /// when absent.
    fn booking_by_number(&self, number: &str)
        -> impl Future<Output = Result<Booking>> + Send;

    /// One page of bookings matching the filter, plus the total count.
    fn list_bookings(
        &self,
        filter: &BookingFilter,
    ) -> impl Future<Output = Result<BookingPage>> + Send;

    /// Aggregate booking counters.
    fn booking_stats(&self) -> impl Future<Output = Result<BookingStats>> + Send;
}

/// Transactional unit of work for booking mutations.
///
/// Reads performed through the session observe the transaction's own
/// writes. `commit` consumes the session; a session dropped without commit
/// rolls back.
pub trait BookingSession: Send {
    /// Fetch a trip inside the transaction. Fails with `TripNotFound`.
    fn trip(&mut self, id: TripId) -> impl Future<Output = Result<Trip>> + Send;

    /// Fetch a departure inside the transaction. Fails with
    /// `DepartureNotFound`.
    fn departure(&mut self, id: DepartureId) -> impl Future<Output = Result<Departure>> + Send;

    /// Fetch a booking inside the transaction. Fails with `BookingNotFound`.
    fn booking(&mut self, id: BookingId) -> impl Future<Output = Result<Booking>> + Send;

    /// Insert a new booking row.
    fn insert_booking(&mut self, booking: &Booking)
        -> impl Future<Output = Result<()>> + Send;

    /// Persist an updated booking row. Fails with `BookingNotFound`.
    fn update_booking(&mut self, booking: &Booking)
        -> impl Future<Output = Result<()>> + Send;

    /// Adjust a departure's remaining spots by `delta` (negative on booking
    /// creation, positive on cancellation) and re-derive its status.
    ///
    /// A decrement is conditional: it fails with `SlotUnavailable` (without
    /// writing) if the result would drop below zero. Checking the condition
    /// and applying the write are one atomic statement, which closes the
    /// oversell race between concurrent creations. An increment clamps at
    /// `max_spots`, so a cancellation succeeds even after an admin shrank
    /// the capacity under the booked count.
    ///
    /// Returns the departure as written.
    fn adjust_spots(
        &mut self,
        id: DepartureId,
        delta: i32,
    ) -> impl Future<Output = Result<Departure>> + Send;

    /// Commit all writes performed through this session.
    fn commit(self) -> impl Future<Output = Result<()>> + Send;
}
