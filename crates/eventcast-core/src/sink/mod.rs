//! Contrato de los sinks (transportes) y canal de diagnóstico.
//!
//! Un sink recibe cada `StreamEvent` en el orden del ledger y se cierra una
//! única vez, de forma asíncrona (puede tener que vaciar buffers por red).

mod fanout;

use async_trait::async_trait;

use crate::errors::SinkError;
use crate::event::StreamEvent;

pub use fanout::{CloseOutcome, CloseReport, SinkCloseResult, SinkFanout};

#[async_trait]
pub trait Sink: Send + Sync {
    fn name(&self) -> &str;

    /// Entrega un evento. No debe bloquear indefinidamente: si el sink tiene
    /// back-pressure debe encolar internamente.
    fn accept(&self, event: &StreamEvent) -> Result<(), SinkError>;

    /// Cierra el sink. Se llama exactamente una vez, tras el último `accept`.
    async fn close(&self) -> Result<(), SinkError>;
}

/// Canal de mensajes visibles para el operador (distinto del stream).
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// `Notifier` por defecto: reenvía a `log::info!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        log::info!("{message}");
    }
}
