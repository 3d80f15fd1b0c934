//! Motor asíncrono del stream.
//!
//! `EventStream::builder()` configura sinks y opciones y lanza el actor;
//! el `StreamHandle` devuelto se clona entre productores.

mod builder;
mod core;
mod options;

pub use builder::StreamBuilder;
pub use self::core::{StreamHandle, StreamSummary};
pub use options::StreamOptions;

/// Punto de entrada del motor.
pub struct EventStream;

impl EventStream {
    pub fn builder() -> StreamBuilder {
        StreamBuilder::default()
    }
}
