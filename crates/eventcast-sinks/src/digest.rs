use std::sync::Mutex;

use async_trait::async_trait;
use eventcast_core::hashing::StreamHasher;
use eventcast_core::{Sink, SinkError, StreamEvent};

/// Mantiene un digest blake3 del contenido entregado. Dos ejecuciones que
/// publican la misma secuencia producen el mismo digest.
#[derive(Debug, Default)]
pub struct DigestSink {
    state: Mutex<DigestState>,
}

#[derive(Debug, Default)]
struct DigestState {
    hasher: StreamHasher,
    digest: Option<String>,
}

impl DigestSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Digest hex; `None` hasta que el sink se cierra.
    pub fn digest(&self) -> Option<String> {
        self.state.lock().ok().and_then(|s| s.digest.clone())
    }

    pub fn events(&self) -> u64 {
        self.state.lock().map(|s| s.hasher.events()).unwrap_or(0)
    }
}

#[async_trait]
impl Sink for DigestSink {
    fn name(&self) -> &str {
        "digest"
    }

    fn accept(&self, event: &StreamEvent) -> Result<(), SinkError> {
        let mut state = self.state
                            .lock()
                            .map_err(|_| SinkError::Io("digest state poisoned".into()))?;
        if state.digest.is_some() {
            return Err(SinkError::AlreadyClosed);
        }
        state.hasher.update(event);
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        let mut state = self.state
                            .lock()
                            .map_err(|_| SinkError::Io("digest state poisoned".into()))?;
        if state.digest.is_some() {
            return Err(SinkError::AlreadyClosed);
        }
        state.digest = Some(state.hasher.hex());
        Ok(())
    }
}
