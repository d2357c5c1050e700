//! Network availability and wall-clock time.
//!
//! The publisher only asks two questions of the host: is the link up, and
//! what time is it (if known). Both are traits so tests can script them.

mod clock;
mod link;

pub use clock::SystemClock;
pub use link::InterfaceLink;

use crate::publish::Timestamp;

/// Reports whether the network link needed for publishing is up.
pub trait NetworkLink: Send {
    fn is_available(&self) -> bool;
}

/// Supplies event timestamps. Never blocks waiting for synchronization.
pub trait TimeSource: Send {
    fn now(&self) -> Timestamp;
}
