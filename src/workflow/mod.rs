//! Domain workflows.
//!
//! - [`bookings`] — the transactional booking workflow
//! - [`departures`] — availability slot management
//! - [`sync`] — derived-field sync for trip price/next-departure caches

pub mod bookings;
pub mod departures;
pub mod sync;

pub use bookings::{BookingPatch, BookingWorkflow, CreateBooking, CreatedBooking};
pub use departures::{DeparturePatch, DepartureService, NewDeparture};
