//! Booking notifier trait.

use crate::error::Result;
use crate::types::{Booking, Departure, Trip};
use std::future::Future;

/// Notification dispatcher for booking lifecycle emails.
///
/// This trait abstracts over delivery channels (SMTP, console, a future
/// transactional-email API). All calls are best-effort from the workflow's
/// point of view: the workflow dispatches after commit and logs failures
/// instead of surfacing them.
pub trait BookingNotifier: Send + Sync + 'static {
    /// Send the "booking received" emails to the customer and the operator.
    ///
    /// # Arguments
    ///
    /// - `booking`: the freshly created booking
    /// - `trip`: the booked trip, for display fields
    /// - `departure`: the booked departure, when one was chosen
    ///
    /// # Errors
    ///
    /// Returns error if the underlying channel rejects the message. Callers
    /// log and move on.
    fn booking_created(
        &self,
        booking: &Booking,
        trip: &Trip,
        departure: Option<&Departure>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Send the "booking confirmed" email to the customer.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying channel rejects the message.
    fn booking_confirmed(
        &self,
        booking: &Booking,
        trip: &Trip,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Runtime-selected notifier: SMTP when configured, console otherwise.
///
/// Keeps the workflow generic over a single concrete type while the choice
/// of channel stays a deployment concern.
#[derive(Clone)]
pub enum AnyNotifier {
    /// Log-only notifier for development and single-box setups.
    Console(super::ConsoleNotifier),
    /// Real SMTP delivery.
    Smtp(super::SmtpNotifier),
}

impl BookingNotifier for AnyNotifier {
    async fn booking_created(
        &self,
        booking: &Booking,
        trip: &Trip,
        departure: Option<&Departure>,
    ) -> Result<()> {
        match self {
            Self::Console(inner) => inner.booking_created(booking, trip, departure).await,
            Self::Smtp(inner) => inner.booking_created(booking, trip, departure).await,
        }
    }

    async fn booking_confirmed(&self, booking: &Booking, trip: &Trip) -> Result<()> {
        match self {
            Self::Console(inner) => inner.booking_confirmed(booking, trip).await,
            Self::Smtp(inner) => inner.booking_confirmed(booking, trip).await,
        }
    }
}
