//! In-memory inventory store.
//!
//! Backs tests with the same trait surface as the Postgres store. The
//! transactional session clones the entire state at `begin` and swaps the
//! mutated copy back on `commit`, so a dropped or failed session leaves the
//! shared state untouched.

use crate::error::{BookingError, Result};
use crate::providers::{BookingSession, InventoryStore};
use crate::types::{
    Booking, BookingFilter, BookingId, BookingPage, BookingSortField, BookingStats, Departure,
    DepartureId, SortOrder, Trip, TripId,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default, Clone)]
struct MemoryState {
    trips: HashMap<TripId, Trip>,
    departures: HashMap<DepartureId, Departure>,
    bookings: HashMap<BookingId, Booking>,
}

impl MemoryState {
    fn duplicate_departure(&self, candidate: &Departure) -> bool {
        self.departures.values().any(|existing| {
            existing.id != candidate.id
                && existing.trip_id == candidate.trip_id
                && existing.date == candidate.date
        })
    }

    fn sorted_departures(&self) -> Vec<Departure> {
        let mut departures: Vec<_> = self.departures.values().cloned().collect();
        departures.sort_by(|a, b| (a.date, a.created_at).cmp(&(b.date, b.created_at)));
        departures
    }
}

/// Clonable in-memory store sharing one state between clones.
#[derive(Clone, Default)]
pub struct MemoryInventoryStore {
    inner: Arc<Mutex<MemoryState>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl MemoryInventoryStore {
    /// Fresh empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a trip.
    pub fn insert_trip(&self, trip: Trip) {
        self.lock().trips.insert(trip.id, trip);
    }

    /// Make the next session commit fail with a database error.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InventoryStore for MemoryInventoryStore {
    type Session = MemorySession;

    async fn begin(&self) -> Result<MemorySession> {
        Ok(MemorySession {
            shared: Arc::clone(&self.inner),
            working: self.lock().clone(),
            fail_next_commit: Arc::clone(&self.fail_next_commit),
        })
    }

    async fn trip(&self, id: TripId) -> Result<Trip> {
        self.lock()
            .trips
            .get(&id)
            .cloned()
            .ok_or(BookingError::TripNotFound)
    }

    async fn set_trip_cache(
        &self,
        trip_id: TripId,
        price: Option<f64>,
        next_departure: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut state = self.lock();
        let trip = state
            .trips
            .get_mut(&trip_id)
            .ok_or(BookingError::TripNotFound)?;
        trip.price = price;
        trip.next_departure = next_departure;
        trip.updated_at = Utc::now();
        Ok(())
    }

    async fn departure(&self, id: DepartureId) -> Result<Departure> {
        self.lock()
            .departures
            .get(&id)
            .cloned()
            .ok_or(BookingError::DepartureNotFound)
    }

    async fn insert_departure(&self, departure: &Departure) -> Result<()> {
        let mut state = self.lock();
        if state.duplicate_departure(departure) {
            return Err(BookingError::DuplicateDeparture);
        }
        state.departures.insert(departure.id, departure.clone());
        Ok(())
    }

    async fn update_departure(&self, departure: &Departure) -> Result<()> {
        let mut state = self.lock();
        if !state.departures.contains_key(&departure.id) {
            return Err(BookingError::DepartureNotFound);
        }
        if state.duplicate_departure(departure) {
            return Err(BookingError::DuplicateDeparture);
        }
        state.departures.insert(departure.id, departure.clone());
        Ok(())
    }

    async fn delete_departure(&self, id: DepartureId) -> Result<()> {
        self.lock()
            .departures
            .remove(&id)
            .map(|_| ())
            .ok_or(BookingError::DepartureNotFound)
    }

    async fn all_departures(&self) -> Result<Vec<Departure>> {
        Ok(self.lock().sorted_departures())
    }

    async fn bookable_departures(
        &self,
        trip_id: TripId,
        after: DateTime<Utc>,
    ) -> Result<Vec<Departure>> {
        Ok(self
            .lock()
            .sorted_departures()
            .into_iter()
            .filter(|d| d.trip_id == trip_id && d.date > after && d.status.is_bookable())
            .collect())
    }

    async fn active_booking_count(&self, id: DepartureId) -> Result<u64> {
        Ok(self
            .lock()
            .bookings
            .values()
            .filter(|b| b.departure_id == Some(id) && b.status.is_active())
            .count() as u64)
    }

    async fn booking(&self, id: BookingId) -> Result<Booking> {
        self.lock()
            .bookings
            .get(&id)
            .cloned()
            .ok_or(BookingError::BookingNotFound)
    }

    async fn booking_by_number(&self, number: &str) -> Result<Booking> {
        self.lock()
            .bookings
            .values()
            .find(|b| b.booking_number == number)
            .cloned()
            .ok_or(BookingError::BookingNotFound)
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> Result<BookingPage> {
        let state = self.lock();

        let needle = filter.email.as_deref().map(str::to_lowercase);
        let mut matching: Vec<_> = state
            .bookings
            .values()
            .filter(|b| filter.status.map_or(true, |status| b.status == status))
            .filter(|b| {
                needle
                    .as_deref()
                    .map_or(true, |needle| b.email.to_lowercase().contains(needle))
            })
            .filter(|b| filter.trip_id.map_or(true, |trip_id| b.trip_id == trip_id))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            let ordering = match filter.sort_by {
                BookingSortField::CreatedAt => a.created_at.cmp(&b.created_at),
                BookingSortField::TotalPrice => a.total_price.total_cmp(&b.total_price),
                BookingSortField::Email => a.email.cmp(&b.email),
            };
            match filter.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit() as usize)
            .collect();

        Ok(BookingPage {
            items,
            total,
            page: filter.page(),
            limit: filter.limit(),
        })
    }

    async fn booking_stats(&self) -> Result<BookingStats> {
        let state = self.lock();
        let count = |status| {
            state
                .bookings
                .values()
                .filter(|b| b.status == status)
                .count() as u64
        };
        Ok(BookingStats {
            total_bookings: state.bookings.len() as u64,
            pending: count(crate::types::BookingStatus::Pending),
            confirmed: count(crate::types::BookingStatus::Confirmed),
            cancelled: count(crate::types::BookingStatus::Cancelled),
            completed: count(crate::types::BookingStatus::Completed),
            revenue: state
                .bookings
                .values()
                .filter(|b| {
                    matches!(
                        b.status,
                        crate::types::BookingStatus::Confirmed
                            | crate::types::BookingStatus::Completed
                    )
                })
                .map(|b| b.total_price)
                .sum(),
        })
    }
}

/// Session over a cloned snapshot of the store state.
pub struct MemorySession {
    shared: Arc<Mutex<MemoryState>>,
    working: MemoryState,
    fail_next_commit: Arc<AtomicBool>,
}

impl BookingSession for MemorySession {
    async fn trip(&mut self, id: TripId) -> Result<Trip> {
        self.working
            .trips
            .get(&id)
            .cloned()
            .ok_or(BookingError::TripNotFound)
    }

    async fn departure(&mut self, id: DepartureId) -> Result<Departure> {
        self.working
            .departures
            .get(&id)
            .cloned()
            .ok_or(BookingError::DepartureNotFound)
    }

    async fn booking(&mut self, id: BookingId) -> Result<Booking> {
        self.working
            .bookings
            .get(&id)
            .cloned()
            .ok_or(BookingError::BookingNotFound)
    }

    async fn insert_booking(&mut self, booking: &Booking) -> Result<()> {
        self.working.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn update_booking(&mut self, booking: &Booking) -> Result<()> {
        if !self.working.bookings.contains_key(&booking.id) {
            return Err(BookingError::BookingNotFound);
        }
        self.working.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn adjust_spots(&mut self, id: DepartureId, delta: i32) -> Result<Departure> {
        let departure = self
            .working
            .departures
            .get_mut(&id)
            .ok_or(BookingError::DepartureNotFound)?;

        let adjusted = departure.spots_left + delta;
        if adjusted < 0 {
            return Err(BookingError::SlotUnavailable);
        }
        // Restores clamp at max_spots (capacity may have shrunk since the
        // booking was made).
        let adjusted = adjusted.min(departure.max_spots);

        departure.spots_left = adjusted;
        departure.status = crate::types::DepartureStatus::derive(adjusted);
        departure.updated_at = Utc::now();
        Ok(departure.clone())
    }

    async fn commit(self) -> Result<()> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(BookingError::Database("commit failed".into()));
        }
        *self
            .shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = self.working;
        Ok(())
    }
}
