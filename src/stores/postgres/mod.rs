//! `PostgreSQL` inventory store.

mod store;

pub use store::{PgBookingSession, PostgresInventoryStore};
