//! Errores específicos del core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::EventId;

/// Fallos de protocolo del stream. Indican un bug aguas arriba (el engine que
/// emite eventos), nunca un problema de los sinks.
#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum StreamError {
    #[error("event {0} was already posted")]
    DuplicateEvent(EventId),
    #[error("event {0} uses an identity or kind reserved to the streamer")]
    ReservedEvent(EventId),
    #[error("stream already finished")]
    Finished,
    #[error("stream actor is no longer running")]
    Closed,
}

/// Errores reportados por un sink. Se aíslan por sink: nunca abortan la
/// entrega al resto ni la contabilidad del ledger.
#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum SinkError {
    #[error("sink io: {0}")]
    Io(String),
    #[error("sink rejected event: {0}")]
    Rejected(String),
    #[error("sink already closed")]
    AlreadyClosed,
}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_event_mentions_id() {
        let err = StreamError::DuplicateEvent(EventId::key("stage/compile"));
        assert_eq!(err.to_string(), "event key:stage/compile was already posted");
    }

    #[test]
    fn io_error_converts_into_sink_error() {
        let err: SinkError = std::io::Error::other("disk full").into();
        assert_eq!(err, SinkError::Io("disk full".into()));
    }
}
