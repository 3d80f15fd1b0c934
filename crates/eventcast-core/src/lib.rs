//! eventcast-core: stream ordenado de eventos de una ejecución.
//!
//! Los engines envían eventos en cualquier orden; el streamer los publica a
//! los sinks respetando prerequisitos, de forma que cada evento publicado
//! (salvo el primero) fue anunciado antes como hijo de otro, y al terminar
//! todo lo anunciado queda publicado.
pub mod buffer;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod ledger;
pub mod named_set;
pub mod output;
pub mod sink;
pub mod streamer;
mod timer;

pub use engine::{EventStream, StreamBuilder, StreamHandle, StreamOptions, StreamSummary};
pub use errors::{SinkError, StreamError};
pub use event::{AbortReason, Event, EventId, EventKind, StreamEvent};
pub use named_set::{NamedSet, NamedSetNamer, SetName};
pub use output::{CapturedOutput, OutErr, OutErrProvider};
pub use sink::{CloseOutcome, CloseReport, LogNotifier, Notifier, Sink, SinkFanout};
pub use streamer::{DetailFilter, EventFilter, EventStreamer};
