//! Domain types for trips, departures and bookings.
//!
//! Identifiers are UUID newtypes; statuses are closed enums that parse
//! to/from the snake_case strings stored in the database and exposed over
//! the API.

use crate::constants::{DEFAULT_PAGE_LIMIT, LIMITED_SPOTS_THRESHOLD, MAX_PAGE_LIMIT};
use crate::error::BookingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Access the inner UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id! {
    /// Identifier of a trip (a sellable tour template).
    TripId
}

uuid_id! {
    /// Identifier of a departure (one dated instance of a trip).
    DepartureId
}

uuid_id! {
    /// Identifier of a booking.
    BookingId
}

// ============================================================================
// Status enums
// ============================================================================

/// Whether a trip accepts new bookings at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripBookingStatus {
    /// Trip accepts bookings.
    Open,
    /// Trip is closed for booking.
    Closed,
    /// Trip is temporarily suspended.
    Suspended,
}

impl TripBookingStatus {
    /// Stable string form, used for storage.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Suspended => "suspended",
        }
    }

    /// Parse from the stable string form.
    pub fn parse(s: &str) -> Result<Self, BookingError> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            "suspended" => Ok(Self::Suspended),
            other => Err(BookingError::Validation(format!(
                "unknown trip booking status: {other}"
            ))),
        }
    }
}

/// Availability state of a departure.
///
/// Except for [`DepartureStatus::Cancelled`], the status is a pure function
/// of `spots_left` — see [`DepartureStatus::derive`]. Cancellation is
/// sticky until spots are replenished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepartureStatus {
    /// Plenty of spots left.
    Available,
    /// Three or fewer spots left.
    Limited,
    /// No spots left.
    SoldOut,
    /// Explicitly cancelled by an operator.
    Cancelled,
}

impl DepartureStatus {
    /// Derive the status from the remaining spot count.
    #[must_use]
    pub const fn derive(spots_left: i32) -> Self {
        if spots_left <= 0 {
            Self::SoldOut
        } else if spots_left <= LIMITED_SPOTS_THRESHOLD {
            Self::Limited
        } else {
            Self::Available
        }
    }

    /// Whether a booking may target a departure in this state.
    pub const fn is_bookable(self) -> bool {
        matches!(self, Self::Available | Self::Limited)
    }

    /// Stable string form, used for storage.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Limited => "limited",
            Self::SoldOut => "sold_out",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse from the stable string form.
    pub fn parse(s: &str) -> Result<Self, BookingError> {
        match s {
            "available" => Ok(Self::Available),
            "limited" => Ok(Self::Limited),
            "sold_out" => Ok(Self::SoldOut),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(BookingError::Validation(format!(
                "unknown departure status: {other}"
            ))),
        }
    }
}

/// Lifecycle state of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Created, awaiting confirmation.
    Pending,
    /// Confirmed by an operator or a payment event.
    Confirmed,
    /// Cancelled; capacity has been restored. Terminal.
    Cancelled,
    /// Trip has taken place. Terminal.
    Completed,
}

impl BookingStatus {
    /// Stable string form, used for storage.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Parse from the stable string form.
    pub fn parse(s: &str) -> Result<Self, BookingError> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => Err(BookingError::Validation(format!(
                "unknown booking status: {other}"
            ))),
        }
    }

    /// Whether a booking in this state still holds departure capacity.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

/// Payment state of a booking, independent of [`BookingStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Payment not yet received.
    Pending,
    /// Payment received.
    Paid,
    /// Payment refunded after cancellation.
    Refunded,
    /// Payment attempt failed.
    Failed,
}

impl PaymentStatus {
    /// Stable string form, used for storage.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Refunded => "refunded",
            Self::Failed => "failed",
        }
    }

    /// Parse from the stable string form.
    pub fn parse(s: &str) -> Result<Self, BookingError> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "refunded" => Ok(Self::Refunded),
            "failed" => Ok(Self::Failed),
            other => Err(BookingError::Validation(format!(
                "unknown payment status: {other}"
            ))),
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// A sellable trip template.
///
/// `price` and `next_departure` are a denormalized cache over the trip's
/// future bookable departures, rewritten only by the derived-field sync.
/// Both are legitimately `None` when no future departure exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    /// Trip identifier.
    pub id: TripId,
    /// Display name.
    pub name: String,
    /// Category slug (e.g. "trekking", "safari").
    pub category: String,
    /// Difficulty label (e.g. "easy", "challenging").
    pub difficulty: String,
    /// Smallest group the trip runs with.
    pub min_group: i32,
    /// Largest group the trip runs with.
    pub max_group: i32,
    /// Cached cheapest upcoming price, if any future departure exists.
    pub price: Option<f64>,
    /// Cached date of the soonest upcoming departure, if any.
    pub next_departure: Option<DateTime<Utc>>,
    /// Whether the trip accepts bookings.
    pub booking_status: TripBookingStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// One dated, capacity-bounded bookable instance of a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Departure {
    /// Departure identifier.
    pub id: DepartureId,
    /// Parent trip.
    pub trip_id: TripId,
    /// Departure date.
    pub date: DateTime<Utc>,
    /// Price per traveler for this departure.
    pub price: f64,
    /// Total capacity.
    pub max_spots: i32,
    /// Remaining capacity. Invariant: `0 <= spots_left <= max_spots`.
    pub spots_left: i32,
    /// Availability state.
    pub status: DepartureStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A customer reservation against a trip, optionally pinned to a departure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Booking identifier.
    pub id: BookingId,
    /// Human-readable unique booking number (e.g. `TB-20260825-X7K2QD`).
    pub booking_number: String,
    /// Booked trip.
    pub trip_id: TripId,
    /// Booked departure, if the customer picked a specific date.
    pub departure_id: Option<DepartureId>,
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
    /// Total price: unit price × travelers.
    pub total_price: f64,
    /// Lifecycle state.
    pub status: BookingStatus,
    /// Payment state.
    pub payment_status: PaymentStatus,
    /// Payment method label, when known.
    pub payment_method: Option<String>,
    /// Free-text special requests; cancellation reasons are appended here.
    pub special_requests: Option<String>,
    /// Client IP captured at creation.
    pub ip: Option<String>,
    /// Client user agent captured at creation.
    pub user_agent: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Request metadata captured for the booking audit fields.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    /// Client IP address.
    pub ip: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
}

/// A bookable departure annotated with its live active-booking count.
#[derive(Debug, Clone, Serialize)]
pub struct DepartureAvailability {
    /// The departure itself.
    #[serde(flatten)]
    pub departure: Departure,
    /// Count of pending/confirmed bookings against this departure.
    pub active_bookings: u64,
}

// ============================================================================
// Queries
// ============================================================================

/// Sort field for booking lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookingSortField {
    /// Sort by creation time (default).
    #[default]
    CreatedAt,
    /// Sort by total price.
    TotalPrice,
    /// Sort by customer email.
    Email,
}

impl BookingSortField {
    /// Parse from the query-string form.
    pub fn parse(s: &str) -> Result<Self, BookingError> {
        match s {
            "created_at" => Ok(Self::CreatedAt),
            "total_price" => Ok(Self::TotalPrice),
            "email" => Ok(Self::Email),
            other => Err(BookingError::Validation(format!(
                "unknown sort field: {other}"
            ))),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending (default).
    #[default]
    Desc,
}

impl SortOrder {
    /// Parse from the query-string form.
    pub fn parse(s: &str) -> Result<Self, BookingError> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(BookingError::Validation(format!(
                "unknown sort order: {other}"
            ))),
        }
    }
}

/// Filter, pagination and ordering for booking lists.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    /// Only bookings in this state.
    pub status: Option<BookingStatus>,
    /// Case-insensitive substring match on the customer email.
    pub email: Option<String>,
    /// Only bookings for this trip.
    pub trip_id: Option<TripId>,
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
    /// Sort field.
    pub sort_by: BookingSortField,
    /// Sort direction.
    pub sort_order: SortOrder,
}

impl BookingFilter {
    /// Effective 1-based page number.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Effective page size, clamped to the configured maximum.
    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }

    /// Offset implied by page and limit.
    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.limit())
    }
}

/// One page of bookings, with the total count matching the filter.
#[derive(Debug, Clone, Serialize)]
pub struct BookingPage {
    /// Bookings in this page.
    pub items: Vec<Booking>,
    /// Total matching bookings across all pages.
    pub total: u64,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
}

/// Aggregate booking counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingStats {
    /// Total bookings ever created.
    pub total_bookings: u64,
    /// Bookings currently pending.
    pub pending: u64,
    /// Bookings currently confirmed.
    pub confirmed: u64,
    /// Bookings cancelled.
    pub cancelled: u64,
    /// Bookings completed.
    pub completed: u64,
    /// Sum of `total_price` over confirmed and completed bookings.
    pub revenue: f64,
}
