//! Project progress: durable store and terminal-aware observation.

pub mod observer;
pub mod store;

pub use observer::{ProgressObserver, ProgressView};
pub use store::ProgressStore;
