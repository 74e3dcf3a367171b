//! Injected collaborator traits.
//!
//! This module defines traits for every external dependency of the booking
//! workflows: the inventory store (with its transactional session), the
//! notification dispatcher, and the rate limiter. The workflows depend only
//! on these traits; concrete implementations are wired in at startup.
//!
//! This enables:
//! - **Testing**: in-memory doubles run the full workflow at memory speed
//! - **Production**: `PostgreSQL` store, SMTP notifier, in-process limiter
//! - **Deployment changes**: swapping the limiter for a shared store needs
//!   no workflow change

pub mod console_notifier;
pub mod notifier;
pub mod rate_limiter;
pub mod smtp_notifier;
pub mod store;

pub use console_notifier::ConsoleNotifier;
pub use notifier::{AnyNotifier, BookingNotifier};
pub use rate_limiter::RateLimiter;
pub use smtp_notifier::SmtpNotifier;
pub use store::{BookingSession, InventoryStore};
