//! Error types for booking and inventory operations.

use thiserror::Error;

/// Result type alias for booking operations.
pub type Result<T> = std::result::Result<T, BookingError>;

/// Error taxonomy for the booking service.
///
/// Organized by category: missing resources, business-rule rejections,
/// rate limiting, and system failures. The HTTP boundary maps each variant
/// to a status code and a stable error code string.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BookingError {
    // ═══════════════════════════════════════════════════════════
    // Missing Resources
    // ═══════════════════════════════════════════════════════════

    /// Referenced trip does not exist.
    #[error("Trip not found")]
    TripNotFound,

    /// Referenced departure does not exist.
    #[error("Departure not found")]
    DepartureNotFound,

    /// Referenced booking does not exist.
    #[error("Booking not found")]
    BookingNotFound,

    // ═══════════════════════════════════════════════════════════
    // Business-Rule Rejections
    // ═══════════════════════════════════════════════════════════

    /// Trip is closed or suspended for booking.
    #[error("Trip is not open for booking")]
    NotBookable,

    /// Departure is sold out, cancelled, or has fewer spots than requested.
    #[error("Departure is not available for booking")]
    SlotUnavailable,

    /// A departure already exists for this trip and date.
    #[error("A departure for this trip and date already exists")]
    DuplicateDeparture,

    /// Departure deletion blocked by pending or confirmed bookings.
    #[error("Departure has active bookings")]
    HasActiveBookings,

    /// Booking is already cancelled.
    #[error("Booking is already cancelled")]
    AlreadyCancelled,

    /// Malformed or out-of-range input.
    #[error("Validation failed: {0}")]
    Validation(String),

    // ═══════════════════════════════════════════════════════════
    // Rate Limiting
    // ═══════════════════════════════════════════════════════════

    /// Too many booking attempts from one client.
    #[error("Too many booking attempts, please retry after {retry_after:?}")]
    TooManyAttempts {
        /// Duration to wait before retrying.
        retry_after: std::time::Duration,
    },

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Data store operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Email delivery failed.
    #[error("Email error: {0}")]
    Email(String),
}

impl BookingError {
    /// Stable error code string, exposed in API responses.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::TripNotFound | Self::DepartureNotFound | Self::BookingNotFound => "NOT_FOUND",
            Self::NotBookable => "NOT_BOOKABLE",
            Self::SlotUnavailable => "SLOT_UNAVAILABLE",
            Self::DuplicateDeparture => "DUPLICATE_SLOT",
            Self::HasActiveBookings => "HAS_BOOKINGS",
            Self::AlreadyCancelled => "ALREADY_CANCELLED",
            Self::Validation(_) => "VALIDATION",
            Self::TooManyAttempts { .. } => "RATE_LIMITED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Email(_) => "EMAIL_ERROR",
        }
    }

    /// Returns `true` if this error is caused by the caller's input or a
    /// business rule, as opposed to a system failure.
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Database(_) | Self::Email(_))
    }
}
