//! `EventStreamer`: máquina de estados síncrona que ordena el stream.
//!
//! Rol en el flujo:
//! - Recibe eventos del engine (`submit`) en cualquier orden.
//! - Los retiene en el `PrerequisiteBuffer` hasta que su `order_after` está
//!   publicado, declara los named sets que referencian y sintetiza eventos de
//!   enlace cuando su id todavía no fue anunciado.
//! - Cada evento publicado se añade a `out` en el orden exacto en que cruza
//!   `Ledger::mark_posted`; quien llama lo reparte a los sinks.
//! - `finish` (ver `finish.rs`) cierra todo lo anunciado y deja el stream
//!   sintácticamente completo.
//!
//! No hace IO ni bloquea: el actor (`engine`) lo envuelve, pero también puede
//! usarse directamente desde un único hilo.

mod filter;
mod finish;

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use chrono::Utc;
use log::{debug, error};
use uuid::Uuid;

use crate::buffer::{Admission, PrerequisiteBuffer};
use crate::constants::INITIAL_PROGRESS;
use crate::errors::StreamError;
use crate::event::{AbortReason, Event, EventId, StreamEvent};
use crate::ledger::Ledger;
use crate::named_set::{NamedSetNamer, SetName};
use crate::output::{OutErr, OutErrProvider};

pub use filter::{DetailFilter, EventFilter};

pub struct EventStreamer {
    run_id: Uuid,
    ledger: Ledger,
    buffer: PrerequisiteBuffer,
    namer: NamedSetNamer,
    filter: Box<dyn EventFilter>,
    out_err: Option<Arc<dyn OutErrProvider>>,
    /// Salida capturada antes de que el stream arrancara.
    buffered_out_err: Vec<OutErr>,
    progress_count: u32,
    next_seq: u64,
    abort_reason: Option<AbortReason>,
    /// Ids cerrados por `finish` con un sustituto abortado.
    substituted: HashSet<EventId>,
    finished: bool,
}

impl EventStreamer {
    pub fn new(run_id: Uuid) -> Self {
        Self { run_id,
               ledger: Ledger::new(),
               buffer: PrerequisiteBuffer::new(),
               namer: NamedSetNamer::new(),
               filter: Box::new(DetailFilter::default()),
               out_err: None,
               buffered_out_err: Vec::new(),
               progress_count: INITIAL_PROGRESS,
               next_seq: 0,
               abort_reason: None,
               substituted: HashSet::new(),
               finished: false }
    }

    pub fn with_filter(mut self, filter: Box<dyn EventFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn namer(&self) -> &NamedSetNamer {
        &self.namer
    }

    /// Eventos retenidos esperando prerequisitos.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn delivered(&self) -> u64 {
        self.next_seq
    }

    pub fn register_output_capture(&mut self, provider: Arc<dyn OutErrProvider>) {
        self.out_err = Some(provider);
    }

    /// Registra un motivo de aborto; `finish` lo usa si no recibe otro.
    pub fn note_abort_reason(&mut self, reason: AbortReason) {
        self.abort_reason = Some(reason);
    }

    /// Punto de entrada del engine. Los eventos publicados (incluidos los
    /// sintéticos y los liberados del buffer) se añaden a `out` aunque
    /// devuelva error: el error sólo describe el evento rechazado.
    pub fn submit(&mut self, event: Event, out: &mut Vec<StreamEvent>) -> Result<(), StreamError> {
        if self.finished {
            return Err(StreamError::Finished);
        }
        if event.id.is_reserved() || event.kind.is_synthetic() {
            return Err(StreamError::ReservedEvent(event.id));
        }
        if event.children.iter().chain(&event.order_after).any(EventId::is_reserved) {
            return Err(StreamError::ReservedEvent(event.id));
        }
        if !self.filter.should_publish(&event) {
            debug!("filtered event {} kind={}", event.id, event.kind.variant_name());
            return Ok(());
        }
        self.process(event, out)
    }

    /// Sondea el proveedor de salida. Antes del primer evento acumula; después
    /// publica un evento de progreso por cada fragmento no vacío.
    pub fn flush_output(&mut self, out: &mut Vec<StreamEvent>) -> Result<(), StreamError> {
        if self.finished {
            return Ok(());
        }
        let Some(provider) = &self.out_err else {
            return Ok(());
        };
        let chunk = provider.take_out_err();
        if chunk.is_empty() {
            return Ok(());
        }
        if !self.ledger.is_started() {
            self.buffered_out_err.push(chunk);
            return Ok(());
        }
        let mut posted = Vec::new();
        self.post_progress(chunk, out, &mut posted);
        let released: Vec<Event> = posted.iter()
                                         .flat_map(|id| self.buffer.release(id, &self.ledger))
                                         .collect();
        self.drive(released.into(), out)
    }

    fn process(&mut self, event: Event, out: &mut Vec<StreamEvent>) -> Result<(), StreamError> {
        self.drive(VecDeque::from([event]), out)
    }

    /// Recorre la cola en profundidad: los dependientes liberados por un
    /// evento se procesan antes que el siguiente hermano ya en cola.
    fn drive(&mut self, mut work: VecDeque<Event>, out: &mut Vec<StreamEvent>) -> Result<(), StreamError> {
        let mut first_err = None;
        while let Some(event) = work.pop_front() {
            let event = match self.buffer.try_admit(event, &self.ledger) {
                Admission::Ready(event) => event,
                Admission::Buffered(key) => {
                    debug!("buffering until {key} is posted");
                    continue;
                }
            };
            match self.post(event, out) {
                Ok(posted) => {
                    let mut released = Vec::new();
                    for id in &posted {
                        released.extend(self.buffer.release(id, &self.ledger));
                    }
                    for ev in released.into_iter().rev() {
                        work.push_front(ev);
                    }
                }
                Err(e) => {
                    error!("rejected event: {e}");
                    first_err.get_or_insert(e);
                }
            }
        }
        debug_assert!(self.ledger.posted_is_subset());
        first_err.map_or(Ok(()), Err)
    }

    /// Publica `event` con sus declaraciones y enlaces previos. Devuelve los
    /// ids publicados en esta llamada.
    ///
    /// Las declaraciones de named sets salen antes que `event`. Si `event` es
    /// el primero del stream, la primera declaración siembra el ledger y
    /// `event` llega precedido de un evento de enlace.
    fn post(&mut self, event: Event, out: &mut Vec<StreamEvent>) -> Result<Vec<EventId>, StreamError> {
        let mut posted = Vec::new();
        if self.ledger.is_posted(&event.id) {
            if event.kind.is_info() {
                debug!("dropping repeated info event {}", event.id);
                return Ok(posted);
            }
            if self.substituted.contains(&event.id) {
                debug!("{} was already closed by an abort substitute", event.id);
                return Ok(posted);
            }
            return Err(StreamError::DuplicateEvent(event.id));
        }

        for set in &event.named_sets {
            for declaration in self.namer.emit_naming_events(set) {
                self.post_one(declaration, Vec::new(), out, &mut posted);
            }
        }
        let named_sets = event.named_sets
                              .iter()
                              .filter_map(|s| self.namer.name_of(s))
                              .collect();
        self.post_one(event, named_sets, out, &mut posted);
        Ok(posted)
    }

    fn post_one(&mut self, event: Event, named_sets: Vec<SetName>, out: &mut Vec<StreamEvent>, posted: &mut Vec<EventId>) {
        let first = !self.ledger.is_started();
        if first {
            self.ledger.seed(&event.id);
        } else if !self.ledger.is_announced(&event.id) {
            self.post_link(&event.id, out, posted);
        }

        self.ledger.mark_posted(&event.id);
        self.ledger.announce(event.children.iter().cloned());
        posted.push(event.id.clone());
        let last = self.ledger.is_complete();
        let stamped = self.stamp(event, named_sets, last);
        out.push(stamped);

        if first {
            for chunk in std::mem::take(&mut self.buffered_out_err) {
                self.post_progress(chunk, out, posted);
            }
        }
    }

    /// Evento de enlace: eslabón de progreso que anuncia `target`.
    fn post_link(&mut self, target: &EventId, out: &mut Vec<StreamEvent>, posted: &mut Vec<EventId>) {
        debug!("linking unannounced event {target}");
        self.post_chained(OutErr::default(), Some(target.clone()), out, posted);
    }

    fn post_progress(&mut self, chunk: OutErr, out: &mut Vec<StreamEvent>, posted: &mut Vec<EventId>) {
        self.post_chained(chunk, None, out, posted);
    }

    fn post_chained(&mut self, chunk: OutErr, target: Option<EventId>, out: &mut Vec<StreamEvent>, posted: &mut Vec<EventId>) {
        let index = self.progress_count;
        self.progress_count += 1;
        let mut children = vec![EventId::Progress(self.progress_count)];
        children.extend(target);
        let event = Event::progress(index, chunk.stdout, chunk.stderr, children);

        self.ledger.mark_posted(&event.id);
        self.ledger.announce(event.children.iter().cloned());
        posted.push(event.id.clone());
        let stamped = self.stamp(event, Vec::new(), false);
        out.push(stamped);
    }

    fn stamp(&mut self, event: Event, named_sets: Vec<SetName>, last_message: bool) -> StreamEvent {
        let seq = self.next_seq;
        self.next_seq += 1;
        StreamEvent { seq,
                      run_id: self.run_id,
                      id: event.id,
                      children: event.children,
                      kind: event.kind,
                      named_sets,
                      payload: event.payload,
                      last_message,
                      ts: Utc::now() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::named_set::NamedSet;
    use crate::output::CapturedOutput;
    use serde_json::{json, Value};

    fn ids(events: &[StreamEvent]) -> Vec<EventId> {
        events.iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn first_event_is_seeded_without_link() {
        let mut streamer = EventStreamer::new(Uuid::new_v4());
        let mut out = Vec::new();
        streamer.submit(Event::new(EventId::RunStarted, json!({})).with_children(["a"]), &mut out)
                .unwrap();
        assert_eq!(ids(&out), vec![EventId::RunStarted]);
        assert_eq!(out[0].seq, 0);
        assert!(!out[0].last_message);
    }

    #[test]
    fn unannounced_event_gets_a_linking_progress_event() {
        let mut streamer = EventStreamer::new(Uuid::new_v4());
        let mut out = Vec::new();
        streamer.submit(Event::new(EventId::RunStarted, Value::Null), &mut out).unwrap();
        streamer.submit(Event::new("surprise", Value::Null), &mut out).unwrap();

        assert_eq!(ids(&out), vec![EventId::RunStarted, EventId::Progress(0), EventId::key("surprise")]);
        assert_eq!(out[1].children, vec![EventId::Progress(1), EventId::key("surprise")]);
        assert!(matches!(out[1].kind, EventKind::Progress { .. }));
    }

    #[test]
    fn duplicate_standard_event_is_rejected_but_info_is_merged() {
        let mut streamer = EventStreamer::new(Uuid::new_v4());
        let mut out = Vec::new();
        streamer.submit(Event::new(EventId::RunStarted, Value::Null).with_children(["status"]), &mut out)
                .unwrap();
        streamer.submit(Event::info("status", json!({"n": 1})), &mut out).unwrap();
        streamer.submit(Event::info("status", json!({"n": 2})), &mut out).unwrap();
        assert_eq!(out.len(), 2);

        let err = streamer.submit(Event::new(EventId::RunStarted, Value::Null), &mut out)
                          .unwrap_err();
        assert_eq!(err, StreamError::DuplicateEvent(EventId::RunStarted));
    }

    #[test]
    fn reserved_identities_are_rejected() {
        let mut streamer = EventStreamer::new(Uuid::new_v4());
        let mut out = Vec::new();
        let err = streamer.submit(Event::new(EventId::Progress(3), Value::Null), &mut out)
                          .unwrap_err();
        assert_eq!(err, StreamError::ReservedEvent(EventId::Progress(3)));
        assert!(out.is_empty());
    }

    #[test]
    fn named_sets_are_declared_before_reference() {
        let mut streamer = EventStreamer::new(Uuid::new_v4());
        let mut out = Vec::new();
        streamer.submit(Event::new(EventId::RunStarted, Value::Null).with_children(["compile"]), &mut out)
                .unwrap();
        let headers = NamedSet::leaf(["a.h"]);
        let objects = NamedSet::new(["a.o"], vec![headers.clone()]);
        streamer.submit(Event::new("compile", Value::Null).referencing(&objects), &mut out)
                .unwrap();

        let compile = out.iter()
                         .position(|e| e.id == EventId::key("compile"))
                         .unwrap();
        let decls: Vec<usize> = out.iter()
                                   .enumerate()
                                   .filter(|(_, e)| matches!(e.kind, EventKind::NamedSetDeclaration { .. }))
                                   .map(|(i, _)| i)
                                   .collect();
        assert_eq!(decls.len(), 2);
        assert!(decls.iter().all(|i| *i < compile));
        assert_eq!(out[compile].named_sets, vec![streamer.namer().name_of(&objects).unwrap()]);
    }

    #[test]
    fn output_before_start_is_flushed_after_first_event() {
        let capture = Arc::new(CapturedOutput::new());
        let mut streamer = EventStreamer::new(Uuid::new_v4());
        streamer.register_output_capture(capture.clone());
        let mut out = Vec::new();

        capture.append_stdout("loading\n");
        streamer.flush_output(&mut out).unwrap();
        assert!(out.is_empty());

        streamer.submit(Event::new(EventId::RunStarted, Value::Null), &mut out).unwrap();
        assert_eq!(ids(&out), vec![EventId::RunStarted, EventId::Progress(0)]);
        match &out[1].kind {
            EventKind::Progress { stdout, .. } => assert_eq!(stdout, "loading\n"),
            other => panic!("unexpected {other:?}"),
        }

        capture.append_stderr("warn\n");
        streamer.flush_output(&mut out).unwrap();
        assert_eq!(out.last().map(|e| e.id.clone()), Some(EventId::Progress(1)));
    }

    #[test]
    fn filtered_details_never_reach_the_ledger() {
        let mut streamer = EventStreamer::new(Uuid::new_v4()).with_filter(Box::new(DetailFilter { publish_all_details: false }));
        let mut out = Vec::new();
        streamer.submit(Event::new(EventId::RunStarted, Value::Null), &mut out).unwrap();
        streamer.submit(Event::detail("action/1", Value::Null), &mut out).unwrap();
        assert_eq!(ids(&out), vec![EventId::RunStarted]);
        assert!(!streamer.ledger().is_announced(&EventId::key("action/1")));
    }
}
