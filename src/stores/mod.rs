//! Production storage implementations.
//!
//! - **Inventory store** (`PostgreSQL`) — trips, departures, bookings, and
//!   the transactional booking session
//! - **Rate limiter** (in-memory) — sliding window for the single-instance
//!   deployment

pub mod postgres;
pub mod rate_limiter_memory;

pub use postgres::PostgresInventoryStore;
pub use rate_limiter_memory::MemoryRateLimiter;
