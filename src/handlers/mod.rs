//! HTTP handlers.
//!
//! Handlers are generic over the injected providers, mirroring the router's
//! type parameters; tests drive them over the in-memory store.

pub mod bookings;
pub mod departures;
pub mod health;
