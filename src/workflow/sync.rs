//! Derived-field sync.
//!
//! A trip carries two cached fields — cheapest upcoming price and next
//! departure date — that are a pure function of its future bookable
//! departures. This module recomputes them after every departure mutation.
//! The recomputation runs outside the mutating transaction: a crash between
//! commit and sync leaves the cache stale until the next mutation, which is
//! acceptable for display fields and keeps slot writes short.

use crate::error::Result;
use crate::providers::InventoryStore;
use crate::types::{Departure, TripId};
use chrono::{DateTime, Utc};

/// Cheapest price and soonest date over a date-ascending departure list.
///
/// Returns `(None, None)` for an empty list. Date ties keep the earliest
/// row in the given order; no secondary tie-break is imposed.
#[must_use]
pub fn cheapest_and_next(departures: &[Departure]) -> (Option<f64>, Option<DateTime<Utc>>) {
    let price = departures.iter().map(|d| d.price).reduce(f64::min);
    let next = departures.first().map(|d| d.date);
    (price, next)
}

/// Recompute a trip's cached price and next-departure fields.
///
/// Idempotent: with unchanged departures, repeated runs write the same
/// values.
pub async fn recompute<S: InventoryStore>(store: &S, trip_id: TripId) -> Result<()> {
    let departures = store.bookable_departures(trip_id, Utc::now()).await?;
    let (price, next_departure) = cheapest_and_next(&departures);

    tracing::debug!(
        %trip_id,
        candidates = departures.len(),
        ?price,
        ?next_departure,
        "recomputed trip departure cache"
    );

    store.set_trip_cache(trip_id, price, next_departure).await
}
