//! Transition events and their publication.

mod event;
mod publisher;
mod transport;

pub use event::{Timestamp, TransitionEvent};
pub use publisher::{EventPublisher, PublishOutcome};
pub use transport::Transport;
