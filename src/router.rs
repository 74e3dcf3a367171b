//! HTTP router assembly.
//!
//! Builds the full API surface over an [`AppState`]; generic over the
//! injected providers so integration tests can run the exact production
//! router over the in-memory store.

use crate::handlers::{bookings, departures, health};
use crate::providers::{BookingNotifier, InventoryStore, RateLimiter};
use crate::state::AppState;
use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the application router.
pub fn api_router<S, N, R>(state: AppState<S, N, R>) -> Router
where
    S: InventoryStore,
    N: BookingNotifier,
    R: RateLimiter,
{
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/bookings",
            post(bookings::create::<S, N, R>).get(bookings::list::<S, N, R>),
        )
        .route("/api/bookings/stats", get(bookings::stats::<S, N, R>))
        .route(
            "/api/bookings/number/:number",
            get(bookings::get_by_number::<S, N, R>),
        )
        .route(
            "/api/bookings/:id",
            get(bookings::get::<S, N, R>).patch(bookings::update::<S, N, R>),
        )
        .route("/api/bookings/:id/cancel", post(bookings::cancel::<S, N, R>))
        .route(
            "/api/departures",
            post(departures::create::<S, N, R>).get(departures::list::<S, N, R>),
        )
        .route(
            "/api/departures/:id",
            patch(departures::update::<S, N, R>).delete(departures::delete::<S, N, R>),
        )
        .route(
            "/api/trips/:trip_id/departures",
            get(departures::list_for_trip::<S, N, R>),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
