//! Cierre del stream (fin normal o aborto).
//!
//! Orden fijo:
//! 1. Si hay eventos retenidos esperando a `RunStarted`, se publica un
//!    `RunStarted` abortado que los anuncia junto al placeholder de progreso.
//! 2. Se drena el buffer: un sustituto abortado por cada clave pendiente.
//! 3. Se cierra cada id anunciado y no publicado (snapshot tomado una vez),
//!    salvo el eslabón de progreso que cierra el paso 4.
//! 4. Se publica el progreso final con la salida capturada restante.
use log::{debug, warn};

use super::EventStreamer;
use crate::constants::INITIAL_PROGRESS;
use crate::errors::StreamError;
use crate::event::{AbortReason, Event, EventId, StreamEvent};
use crate::output::OutErr;

impl EventStreamer {
    /// Termina el stream. `reason` es `None` para un fin normal (se usa el
    /// último motivo anotado o `Incomplete`). Al volver, `announced ==
    /// posted` y el buffer está vacío.
    pub fn finish(&mut self, reason: Option<AbortReason>, out: &mut Vec<StreamEvent>) -> Result<(), StreamError> {
        if self.finished {
            return Err(StreamError::Finished);
        }
        if let Some(reason) = reason {
            self.abort_reason = Some(reason);
        }
        let reason = self.abort_reason.unwrap_or_default();
        let mut first_err = None;

        let waiting = self.buffer.waiting_on(&EventId::RunStarted);
        if !waiting.is_empty() {
            debug!("closing run start for {} waiting event(s)", waiting.len());
            let mut children = vec![EventId::Progress(INITIAL_PROGRESS)];
            children.extend(waiting);
            let started = Event::aborted(EventId::RunStarted, reason, children);
            if let Err(e) = self.substitute(started, out) {
                first_err.get_or_insert(e);
            }
        }

        while let Some(key) = self.buffer.next_drain_key() {
            debug!("aborting missing prerequisite {key}");
            if let Err(e) = self.substitute(Event::aborted(key.clone(), reason, Vec::new()), out) {
                first_err.get_or_insert(e);
            }
            // una clave publicada nunca vuelve a indexar entradas
            assert_ne!(self.buffer.next_drain_key().as_ref(), Some(&key), "prerequisite {key} was not released");
        }

        let pending_progress = EventId::Progress(self.progress_count);
        let unposted: Vec<EventId> = self.ledger
                                         .unposted()
                                         .into_iter()
                                         .filter(|id| *id != pending_progress)
                                         .collect();
        if !unposted.is_empty() {
            warn!("closing {} announced event(s) that never arrived ({reason:?})", unposted.len());
        }
        for id in unposted {
            if let Err(e) = self.substitute(Event::aborted(id, reason, Vec::new()), out) {
                first_err.get_or_insert(e);
            }
        }

        let mut chunks = std::mem::take(&mut self.buffered_out_err);
        if let Some(provider) = &self.out_err {
            chunks.push(provider.take_out_err());
        }
        let tail = OutErr::concat(chunks);
        let end = Event::progress(self.progress_count, tail.stdout, tail.stderr, Vec::new());
        assert!(!self.ledger.is_posted(&end.id), "{} was posted before the end of the stream", end.id);
        self.progress_count += 1;
        if let Err(e) = self.process(end, out) {
            first_err.get_or_insert(e);
        }

        self.finished = true;
        debug_assert!(self.ledger.is_complete(), "stream incomplete after finish");
        first_err.map_or(Ok(()), Err)
    }

    /// Publica un sustituto abortado. Si el evento real sale después del
    /// buffer con el mismo id, se descarta sin error.
    fn substitute(&mut self, event: Event, out: &mut Vec<StreamEvent>) -> Result<(), StreamError> {
        self.substituted.insert(event.id.clone());
        self.process(event, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use serde_json::Value;
    use uuid::Uuid;

    #[test]
    fn empty_run_finishes_with_a_single_progress_event() {
        let mut streamer = EventStreamer::new(Uuid::new_v4());
        let mut out = Vec::new();
        streamer.finish(None, &mut out).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, EventId::Progress(0));
        assert!(out[0].last_message);
        assert!(streamer.ledger().is_complete());
    }

    #[test]
    fn finish_twice_is_an_error() {
        let mut streamer = EventStreamer::new(Uuid::new_v4());
        let mut out = Vec::new();
        streamer.finish(None, &mut out).unwrap();
        assert_eq!(streamer.finish(None, &mut out), Err(StreamError::Finished));
        assert_eq!(streamer.submit(Event::new("late", Value::Null), &mut out), Err(StreamError::Finished));
    }

    #[test]
    fn noted_reason_is_used_on_normal_completion() {
        let mut streamer = EventStreamer::new(Uuid::new_v4());
        let mut out = Vec::new();
        streamer.submit(Event::new(EventId::RunStarted, Value::Null).with_children(["never"]), &mut out)
                .unwrap();
        streamer.note_abort_reason(AbortReason::Timeout);
        streamer.finish(None, &mut out).unwrap();
        let never = out.iter()
                       .find(|e| e.id == EventId::key("never"))
                       .unwrap();
        assert!(matches!(never.kind, EventKind::Aborted { reason: AbortReason::Timeout, .. }));
    }
}
