use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use eventcast_core::{EventId, Sink, SinkError, StreamEvent};

/// Sink en memoria. Permite simular un cierre lento y fallos de entrega.
#[derive(Debug, Default)]
pub struct MemorySink {
    name: String,
    events: Mutex<Vec<StreamEvent>>,
    close_delay: Duration,
    fail_accept: bool,
    closed: AtomicBool,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(),
               ..Self::default() }
    }

    /// `close` tarda `delay` en completarse.
    pub fn with_close_delay(mut self, delay: Duration) -> Self {
        self.close_delay = delay;
        self
    }

    /// Todo `accept` falla con `SinkError::Rejected`.
    pub fn failing(mut self) -> Self {
        self.fail_accept = true;
        self
    }

    /// Copia de lo recibido hasta ahora.
    pub fn events(&self) -> Vec<StreamEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn ids(&self) -> Vec<EventId> {
        self.events().into_iter().map(|e| e.id).collect()
    }

    /// Posición de entrega de `id`, si llegó.
    pub fn position(&self, id: &EventId) -> Option<usize> {
        self.events().iter().position(|e| &e.id == id)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn accept(&self, event: &StreamEvent) -> Result<(), SinkError> {
        if self.fail_accept {
            return Err(SinkError::Rejected(format!("{} refuses {}", self.name, event.id)));
        }
        if self.is_closed() {
            return Err(SinkError::AlreadyClosed);
        }
        let mut events = self.events
                             .lock()
                             .map_err(|_| SinkError::Io("memory sink poisoned".into()))?;
        events.push(event.clone());
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        if !self.close_delay.is_zero() {
            tokio::time::sleep(self.close_delay).await;
        }
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(SinkError::AlreadyClosed);
        }
        Ok(())
    }
}
