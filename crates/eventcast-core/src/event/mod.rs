//! Identidades y tipos de evento.

mod id;
mod types;

pub use id::EventId;
pub use types::{AbortReason, Event, EventKind, StreamEvent};
