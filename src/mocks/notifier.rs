//! Recording notifier.

use crate::error::{BookingError, Result};
use crate::providers::BookingNotifier;
use crate::types::{Booking, Departure, Trip};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// One captured notification.
#[derive(Debug, Clone, PartialEq)]
pub enum NotifierCall {
    /// `booking_created` was dispatched.
    Created {
        /// Booking number of the new booking.
        booking_number: String,
        /// Whether a departure was attached.
        with_departure: bool,
    },
    /// `booking_confirmed` was dispatched.
    Confirmed {
        /// Booking number of the confirmed booking.
        booking_number: String,
    },
}

/// Notifier that records every call instead of sending anything.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    calls: Arc<Mutex<Vec<NotifierCall>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingNotifier {
    /// Fresh recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail, for exercising the best-effort path.
    pub fn fail_all(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Snapshot of the captured calls.
    #[must_use]
    pub fn calls(&self) -> Vec<NotifierCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Spin until at least `n` calls are captured, with a short timeout.
    ///
    /// Notifications are dispatched from spawned tasks, so tests wait for
    /// them instead of racing.
    pub async fn wait_for_calls(&self, n: usize) -> Vec<NotifierCall> {
        for _ in 0..200 {
            let calls = self.calls();
            if calls.len() >= n {
                return calls;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        self.calls()
    }

    fn record(&self, call: NotifierCall) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BookingError::Email("recording notifier set to fail".into()));
        }
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
        Ok(())
    }
}

impl BookingNotifier for RecordingNotifier {
    async fn booking_created(
        &self,
        booking: &Booking,
        _trip: &Trip,
        departure: Option<&Departure>,
    ) -> Result<()> {
        self.record(NotifierCall::Created {
            booking_number: booking.booking_number.clone(),
            with_departure: departure.is_some(),
        })
    }

    async fn booking_confirmed(&self, booking: &Booking, _trip: &Trip) -> Result<()> {
        self.record(NotifierCall::Confirmed {
            booking_number: booking.booking_number.clone(),
        })
    }
}
