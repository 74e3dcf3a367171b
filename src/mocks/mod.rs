//! In-memory test doubles.
//!
//! [`MemoryInventoryStore`] backs the workflow and HTTP tests without a
//! database; [`RecordingNotifier`] captures dispatched notifications for
//! assertions.

pub mod notifier;
pub mod store;

pub use notifier::{NotifierCall, RecordingNotifier};
pub use store::MemoryInventoryStore;
