//! Application state shared across HTTP handlers.

use crate::config::RateLimitConfig;
use crate::providers::{BookingNotifier, InventoryStore, RateLimiter};
use crate::workflow::{BookingWorkflow, DepartureService};
use std::sync::Arc;

/// Shared state for the HTTP layer.
///
/// Generic over the injected providers so tests can run the full router
/// over the in-memory store. Cloned (cheaply, via `Arc`s and pool handles)
/// for each request.
pub struct AppState<S, N, R> {
    /// Booking workflow.
    pub bookings: Arc<BookingWorkflow<S, N>>,
    /// Departure management service.
    pub departures: Arc<DepartureService<S>>,
    /// Rate limiter for booking creation.
    pub limiter: Arc<R>,
    /// Rate-limit parameters.
    pub rate_limit: RateLimitConfig,
}

impl<S, N, R> Clone for AppState<S, N, R> {
    fn clone(&self) -> Self {
        Self {
            bookings: Arc::clone(&self.bookings),
            departures: Arc::clone(&self.departures),
            limiter: Arc::clone(&self.limiter),
            rate_limit: self.rate_limit.clone(),
        }
    }
}

impl<S, N, R> AppState<S, N, R>
where
    S: InventoryStore,
    N: BookingNotifier,
    R: RateLimiter,
{
    /// Assemble the application state from its collaborators.
    pub fn new(store: S, notifier: Arc<N>, limiter: Arc<R>, rate_limit: RateLimitConfig) -> Self {
        Self {
            bookings: Arc::new(BookingWorkflow::new(store.clone(), notifier)),
            departures: Arc::new(DepartureService::new(store)),
            limiter,
            rate_limit,
        }
    }
}
