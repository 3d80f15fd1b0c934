//! Digest blake3 del stream publicado.

use blake3::Hasher;
use serde_json::json;

use super::to_canonical_json;
use crate::event::StreamEvent;

/// Digest incremental de un stream publicado.
///
/// Sólo cubre el contenido ordenado (seq, id, hijos, tipo, sets, payload,
/// `last_message`); `run_id` y timestamps quedan fuera, de modo que dos
/// ejecuciones con la misma secuencia producen el mismo digest.
#[derive(Debug, Clone, Default)]
pub struct StreamHasher {
    inner: Hasher,
    events: u64,
}

impl StreamHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, event: &StreamEvent) {
        let content = json!({
            "seq": event.seq,
            "id": event.id,
            "children": event.children,
            "kind": event.kind,
            "named_sets": event.named_sets,
            "payload": event.payload,
            "last_message": event.last_message,
        });
        self.inner.update(to_canonical_json(&content).as_bytes());
        self.inner.update(b"\n");
        self.events += 1;
    }

    pub fn events(&self) -> u64 {
        self.events
    }

    /// Digest hex de lo acumulado hasta ahora (no consume el hasher).
    pub fn hex(&self) -> String {
        self.inner.finalize().to_hex().to_string()
    }
}
