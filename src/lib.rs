//! # Trailbook
//!
//! Tour booking and departure inventory service for a travel agency.
//!
//! The service owns three persisted records — trips, departures (dated,
//! capacity-bounded instances of a trip) and bookings — and the workflows
//! that connect them:
//!
//! - **Booking workflow**: validates availability, computes the price,
//!   persists the booking and decrements departure capacity inside a single
//!   unit of work. Cancellation restores capacity the same way.
//! - **Departure management**: admin CRUD over departures with duplicate
//!   and live-booking guards.
//! - **Derived-field sync**: recomputes a trip's cached cheapest price and
//!   next departure date from its future bookable departures after every
//!   departure mutation.
//! - **Notifications**: best-effort booking emails dispatched after commit,
//!   never on the request's critical path.
//!
//! ## Architecture
//!
//! All external collaborators are injected behind traits in [`providers`]:
//! the inventory store (with its transactional [`providers::BookingSession`]
//! unit of work), the booking notifier, and the rate limiter. Production
//! implementations live in [`stores`] and [`providers`]; in-memory doubles
//! for tests live in [`mocks`].

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod mocks;
pub mod providers;
pub mod response;
pub mod router;
pub mod state;
pub mod stores;
pub mod types;
pub mod utils;
pub mod workflow;

pub use config::Config;
pub use error::{BookingError, Result};
pub use state::AppState;
pub use types::{Booking, BookingId, Departure, DepartureId, Trip, TripId};
