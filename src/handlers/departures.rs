//! Departure (availability slot) API endpoints.
//!
//! - `POST /api/departures` — create a slot
//! - `GET /api/departures` — admin listing of all slots
//! - `PATCH /api/departures/:id` — edit date/price/capacity/status
//! - `DELETE /api/departures/:id` — delete (blocked by active bookings)
//! - `GET /api/trips/:trip_id/departures` — public availability for a trip

use crate::providers::{BookingNotifier, InventoryStore, RateLimiter};
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;
use crate::types::{Departure, DepartureAvailability, DepartureId, DepartureStatus, TripId};
use crate::workflow::{DeparturePatch, NewDeparture};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

// ============================================================================
// Request Types
// ============================================================================

/// Request body for creating a departure.
#[derive(Debug, Deserialize)]
pub struct CreateDepartureRequest {
    /// Parent trip.
    pub trip_id: Uuid,
    /// Departure date.
    pub date: DateTime<Utc>,
    /// Price per traveler.
    pub price: f64,
    /// Total capacity.
    pub max_spots: i32,
}

/// Request body for patching a departure.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateDepartureRequest {
    /// New date.
    pub date: Option<DateTime<Utc>>,
    /// New price per traveler.
    pub price: Option<f64>,
    /// New total capacity.
    pub max_spots: Option<i32>,
    /// New remaining capacity.
    pub spots_left: Option<i32>,
    /// Explicit status override, as its wire string.
    pub status: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a departure.
pub async fn create<S, N, R>(
    State(state): State<AppState<S, N, R>>,
    Json(request): Json<CreateDepartureRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Departure>>), ApiError>
where
    S: InventoryStore,
    N: BookingNotifier,
    R: RateLimiter,
{
    let departure = state
        .departures
        .create(NewDeparture {
            trip_id: TripId::from_uuid(request.trip_id),
            date: request.date,
            price: request.price,
            max_spots: request.max_spots,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Departure created", departure)),
    ))
}

/// All departures, date-ascending.
pub async fn list<S, N, R>(
    State(state): State<AppState<S, N, R>>,
) -> Result<Json<ApiResponse<Vec<Departure>>>, ApiError>
where
    S: InventoryStore,
    N: BookingNotifier,
    R: RateLimiter,
{
    let departures = state.departures.list_all().await?;
    Ok(Json(ApiResponse::ok("Departures", departures)))
}

/// Patch a departure.
pub async fn update<S, N, R>(
    State(state): State<AppState<S, N, R>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDepartureRequest>,
) -> Result<Json<ApiResponse<Departure>>, ApiError>
where
    S: InventoryStore,
    N: BookingNotifier,
    R: RateLimiter,
{
    let patch = DeparturePatch {
        date: request.date,
        price: request.price,
        max_spots: request.max_spots,
        spots_left: request.spots_left,
        status: request
            .status
            .as_deref()
            .map(DepartureStatus::parse)
            .transpose()?,
    };

    let departure = state
        .departures
        .update(DepartureId::from_uuid(id), patch)
        .await?;
    Ok(Json(ApiResponse::ok("Departure updated", departure)))
}

/// Delete a departure.
pub async fn delete<S, N, R>(
    State(state): State<AppState<S, N, R>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError>
where
    S: InventoryStore,
    N: BookingNotifier,
    R: RateLimiter,
{
    state.departures.delete(DepartureId::from_uuid(id)).await?;
    Ok(Json(ApiResponse::message("Departure deleted")))
}

/// Future bookable departures of a trip, with live booking counts.
pub async fn list_for_trip<S, N, R>(
    State(state): State<AppState<S, N, R>>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<DepartureAvailability>>>, ApiError>
where
    S: InventoryStore,
    N: BookingNotifier,
    R: RateLimiter,
{
    let departures = state
        .departures
        .list_for_trip(TripId::from_uuid(trip_id))
        .await?;
    Ok(Json(ApiResponse::ok("Trip departures", departures)))
}
