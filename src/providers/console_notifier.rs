//! Console notifier: logs instead of sending.

use crate::error::Result;
use crate::providers::BookingNotifier;
use crate::types::{Booking, Departure, Trip};

/// Notifier that writes booking emails to the log.
///
/// Useful for development and tests; the production deployment swaps in
/// [`crate::providers::SmtpNotifier`].
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    /// Create a new console notifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl BookingNotifier for ConsoleNotifier {
    async fn booking_created(
        &self,
        booking: &Booking,
        trip: &Trip,
        departure: Option<&Departure>,
    ) -> Result<()> {
        tracing::info!(
            booking_number = %booking.booking_number,
            email = %booking.email,
            trip = %trip.name,
            departure = ?departure.map(|d| d.date),
            travelers = booking.travelers,
            total_price = booking.total_price,
            "📧 [console] booking created notification"
        );
        Ok(())
    }

    async fn booking_confirmed(&self, booking: &Booking, trip: &Trip) -> Result<()> {
        tracing::info!(
            booking_number = %booking.booking_number,
            email = %booking.email,
            trip = %trip.name,
            "📧 [console] booking confirmed notification"
        );
        Ok(())
    }
}
