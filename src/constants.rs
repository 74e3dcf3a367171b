//! Domain constants used throughout the booking service.

/// A departure with this many spots or fewer (but more than zero) is
/// reported as `limited`.
pub const LIMITED_SPOTS_THRESHOLD: i32 = 3;

/// Minimum travelers per booking.
pub const MIN_TRAVELERS: i32 = 1;

/// Maximum travelers per booking.
pub const MAX_TRAVELERS: i32 = 20;

/// Default page size for booking lists.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Upper bound on requested page size.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Prefix for generated booking numbers.
pub const BOOKING_NUMBER_PREFIX: &str = "TB";

/// Length of the random suffix in a booking number.
pub const BOOKING_NUMBER_SUFFIX_LEN: usize = 6;
