//! Booking API endpoints.
//!
//! - `POST /api/bookings` — create a booking (rate-limited per client IP)
//! - `GET /api/bookings` — filtered, paginated list
//! - `GET /api/bookings/stats` — aggregate counters
//! - `GET /api/bookings/:id` — detail
//! - `GET /api/bookings/number/:number` — detail by booking number
//! - `PATCH /api/bookings/:id` — admin status/payment patch
//! - `POST /api/bookings/:id/cancel` — cancel, restoring capacity

use crate::providers::{BookingNotifier, InventoryStore, RateLimiter};
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;
use crate::types::{
    Booking, BookingFilter, BookingId, BookingPage, BookingSortField, BookingStats, BookingStatus,
    PaymentStatus, RequestMeta, SortOrder, TripId,
};
use crate::workflow::{BookingPatch, CreateBooking};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a booking.
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    /// Trip to book.
    pub trip_id: Uuid,
    /// Specific departure, optional.
    pub departure_id: Option<Uuid>,
    /// Customer first name.
    pub first_name: String,
    /// Customer last name.
    pub last_name: String,
    /// Customer email.
    pub email: String,
    /// Customer phone.
    pub phone: Option<String>,
    /// Number of travelers (1..=20).
    pub travelers: i32,
    /// Free-text special requests.
    pub special_requests: Option<String>,
}

/// Response body after creating a booking.
#[derive(Debug, Serialize)]
pub struct BookingCreatedResponse {
    /// Booking identifier.
    pub id: Uuid,
    /// Human-readable booking number.
    pub booking_number: String,
    /// Lifecycle status (pending on creation).
    pub status: BookingStatus,
    /// Computed total price.
    pub total_price: f64,
    /// Booked trip name, for display.
    pub trip_name: String,
}

/// Query parameters for the booking list.
#[derive(Debug, Default, Deserialize)]
pub struct ListBookingsQuery {
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
    /// Status filter.
    pub status: Option<String>,
    /// Email substring filter.
    pub email: Option<String>,
    /// Trip filter.
    pub trip_id: Option<Uuid>,
    /// Sort field: `created_at` (default), `total_price`, `email`.
    pub sort_by: Option<String>,
    /// Sort order: `asc` or `desc` (default).
    pub sort_order: Option<String>,
}

/// Request body for the admin booking patch.
///
/// Enum fields arrive as strings and are parsed explicitly so a bad value
/// reports a 400 validation error with the offending input.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateBookingRequest {
    /// New lifecycle status.
    pub status: Option<String>,
    /// New payment status.
    pub payment_status: Option<String>,
    /// Payment method label.
    pub payment_method: Option<String>,
    /// Replacement special-requests text.
    pub special_requests: Option<String>,
}

/// Request body for cancellation.
#[derive(Debug, Default, Deserialize)]
pub struct CancelBookingRequest {
    /// Optional cancellation reason, appended to the booking's notes.
    pub reason: Option<String>,
}

fn request_meta(headers: &HeaderMap) -> RequestMeta {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string)
    };
    RequestMeta {
        ip: header("x-forwarded-for")
            .map(|raw| raw.split(',').next().unwrap_or(&raw).trim().to_string()),
        user_agent: header("user-agent"),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a booking.
pub async fn create<S, N, R>(
    State(state): State<AppState<S, N, R>>,
    headers: HeaderMap,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BookingCreatedResponse>>), ApiError>
where
    S: InventoryStore,
    N: BookingNotifier,
    R: RateLimiter,
{
    let meta = request_meta(&headers);

    let key = meta.ip.clone().unwrap_or_else(|| "unknown".to_string());
    state
        .limiter
        .check_and_record(&key, state.rate_limit.max_attempts, state.rate_limit.window())
        .await?;

    let created = state
        .bookings
        .create(
            CreateBooking {
                trip_id: TripId::from_uuid(request.trip_id),
                departure_id: request.departure_id.map(crate::types::DepartureId::from_uuid),
                first_name: request.first_name,
                last_name: request.last_name,
                email: request.email,
                phone: request.phone,
                travelers: request.travelers,
                special_requests: request.special_requests,
            },
            meta,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "Booking created",
            BookingCreatedResponse {
                id: created.booking.id.0,
                booking_number: created.booking.booking_number,
                status: created.booking.status,
                total_price: created.booking.total_price,
                trip_name: created.trip.name,
            },
        )),
    ))
}

/// List bookings.
pub async fn list<S, N, R>(
    State(state): State<AppState<S, N, R>>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<ApiResponse<BookingPage>>, ApiError>
where
    S: InventoryStore,
    N: BookingNotifier,
    R: RateLimiter,
{
    let filter = BookingFilter {
        status: query
            .status
            .as_deref()
            .map(BookingStatus::parse)
            .transpose()?,
        email: query.email,
        trip_id: query.trip_id.map(TripId::from_uuid),
        page: query.page,
        limit: query.limit,
        sort_by: query
            .sort_by
            .as_deref()
            .map(BookingSortField::parse)
            .transpose()?
            .unwrap_or_default(),
        sort_order: query
            .sort_order
            .as_deref()
            .map(SortOrder::parse)
            .transpose()?
            .unwrap_or_default(),
    };

    let page = state.bookings.list(&filter).await?;
    Ok(Json(ApiResponse::ok("Bookings", page)))
}

/// Aggregate booking counters.
pub async fn stats<S, N, R>(
    State(state): State<AppState<S, N, R>>,
) -> Result<Json<ApiResponse<BookingStats>>, ApiError>
where
    S: InventoryStore,
    N: BookingNotifier,
    R: RateLimiter,
{
    let stats = state.bookings.stats().await?;
    Ok(Json(ApiResponse::ok("Booking stats", stats)))
}

/// Booking detail by id.
pub async fn get<S, N, R>(
    State(state): State<AppState<S, N, R>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Booking>>, ApiError>
where
    S: InventoryStore,
    N: BookingNotifier,
    R: RateLimiter,
{
    let booking = state.bookings.get(BookingId::from_uuid(id)).await?;
    Ok(Json(ApiResponse::ok("Booking", booking)))
}

/// Booking detail by booking number.
pub async fn get_by_number<S, N, R>(
    State(state): State<AppState<S, N, R>>,
    Path(number): Path<String>,
) -> Result<Json<ApiResponse<Booking>>, ApiError>
where
    S: InventoryStore,
    N: BookingNotifier,
    R: RateLimiter,
{
    let booking = state.bookings.get_by_number(&number).await?;
    Ok(Json(ApiResponse::ok("Booking", booking)))
}

/// Admin patch of status/payment fields.
pub async fn update<S, N, R>(
    State(state): State<AppState<S, N, R>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBookingRequest>,
) -> Result<Json<ApiResponse<Booking>>, ApiError>
where
    S: InventoryStore,
    N: BookingNotifier,
    R: RateLimiter,
{
    let patch = BookingPatch {
        status: request
            .status
            .as_deref()
            .map(BookingStatus::parse)
            .transpose()?,
        payment_status: request
            .payment_status
            .as_deref()
            .map(PaymentStatus::parse)
            .transpose()?,
        payment_method: request.payment_method,
        special_requests: request.special_requests,
    };

    let booking = state
        .bookings
        .update_status(BookingId::from_uuid(id), patch)
        .await?;
    Ok(Json(ApiResponse::ok("Booking updated", booking)))
}

/// Cancel a booking.
pub async fn cancel<S, N, R>(
    State(state): State<AppState<S, N, R>>,
    Path(id): Path<Uuid>,
    body: Option<Json<CancelBookingRequest>>,
) -> Result<Json<ApiResponse<Booking>>, ApiError>
where
    S: InventoryStore,
    N: BookingNotifier,
    R: RateLimiter,
{
    let reason = body.and_then(|Json(request)| request.reason);
    let booking = state
        .bookings
        .cancel(BookingId::from_uuid(id), reason)
        .await?;
    Ok(Json(ApiResponse::ok("Booking cancelled", booking)))
}
