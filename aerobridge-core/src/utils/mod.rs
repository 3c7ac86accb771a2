//! Shared utilities: logging setup and monotonic time.

pub mod clock;
pub mod logger;

pub use clock::{now_us, BroadcastThrottle};
pub use logger::init_logger;
