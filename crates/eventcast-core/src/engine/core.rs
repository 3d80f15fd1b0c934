//! Actor del stream: una tarea tokio es dueña del `EventStreamer` y del
//! `SinkFanout`; los productores sólo ven un `StreamHandle` clonable.
//!
//! Rol en el flujo:
//! - Serializa submit/flush/finish en el orden de llegada al canal.
//! - Sondea la salida capturada cada `flush_interval`.
//! - Al terminar cierra los sinks y responde con un `StreamSummary`.
use std::sync::Arc;

use log::{debug, error, info, warn};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, Interval};
use uuid::Uuid;

use super::StreamOptions;
use crate::errors::StreamError;
use crate::event::{AbortReason, Event, StreamEvent};
use crate::output::OutErrProvider;
use crate::sink::{CloseReport, Notifier, SinkFanout};
use crate::streamer::EventStreamer;
use crate::timer::{next_tick, ticker};

/// Resumen devuelto por `complete`/`abort`.
#[derive(Debug, Clone, Serialize)]
pub struct StreamSummary {
    pub run_id: Uuid,
    pub delivered: u64,
    /// Errores de protocolo de los productores (duplicados, ids reservados).
    pub protocol_faults: Vec<StreamError>,
    pub accept_failures: Vec<(String, u64)>,
    pub close: CloseReport,
}

enum Command {
    Submit(Event),
    RegisterOutput(Arc<dyn OutErrProvider>),
    Flush,
    NoteAbortReason(AbortReason),
    Finish {
        reason: Option<AbortReason>,
        reply: oneshot::Sender<StreamSummary>,
    },
}

/// Handle de productor. Los métodos síncronos sólo encolan: los errores de
/// protocolo se registran en el actor y aparecen en `StreamSummary`.
#[derive(Clone)]
pub struct StreamHandle {
    tx: mpsc::UnboundedSender<Command>,
    run_id: Uuid,
}

impl StreamHandle {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn submit(&self, event: Event) -> Result<(), StreamError> {
        self.send(Command::Submit(event))
    }

    pub fn register_output_capture(&self, provider: Arc<dyn OutErrProvider>) -> Result<(), StreamError> {
        self.send(Command::RegisterOutput(provider))
    }

    pub fn flush_output(&self) -> Result<(), StreamError> {
        self.send(Command::Flush)
    }

    pub fn note_abort_reason(&self, reason: AbortReason) -> Result<(), StreamError> {
        self.send(Command::NoteAbortReason(reason))
    }

    /// Fin normal del run. Espera al cierre de todos los sinks.
    pub async fn complete(self) -> Result<StreamSummary, StreamError> {
        self.finish(None).await
    }

    pub async fn abort(self, reason: AbortReason) -> Result<StreamSummary, StreamError> {
        self.finish(Some(reason)).await
    }

    async fn finish(self, reason: Option<AbortReason>) -> Result<StreamSummary, StreamError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Finish { reason, reply })?;
        // el actor descarta `reply` si otro handle ya cerró el stream
        rx.await.map_err(|_| StreamError::Finished)
    }

    fn send(&self, command: Command) -> Result<(), StreamError> {
        self.tx.send(command).map_err(|_| StreamError::Closed)
    }
}

pub(crate) struct StreamActor {
    streamer: EventStreamer,
    fanout: SinkFanout,
    notifier: Arc<dyn Notifier>,
    options: StreamOptions,
    faults: Vec<StreamError>,
    flush_ticker: Option<Interval>,
}

impl StreamActor {
    pub(crate) fn new(streamer: EventStreamer, fanout: SinkFanout, notifier: Arc<dyn Notifier>, options: StreamOptions) -> Self {
        Self { streamer,
               fanout,
               notifier,
               options,
               faults: Vec::new(),
               flush_ticker: None }
    }

    pub(crate) fn start(self) -> StreamHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let run_id = self.streamer.run_id();
        tokio::spawn(self.run(rx));
        StreamHandle { tx, run_id }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        info!("stream {} started with {} sink(s)", self.streamer.run_id(), self.fanout.len());
        loop {
            let command = tokio::select! {
                command = rx.recv() => command,
                _ = next_tick(&mut self.flush_ticker) => Some(Command::Flush),
            };
            match command {
                Some(Command::Submit(event)) => self.apply(|s, out| s.submit(event, out)),
                Some(Command::RegisterOutput(provider)) => {
                    self.streamer.register_output_capture(provider);
                    self.flush_ticker = ticker(Instant::now(), self.options.flush_interval);
                }
                Some(Command::Flush) => self.apply(|s, out| s.flush_output(out)),
                Some(Command::NoteAbortReason(reason)) => self.streamer.note_abort_reason(reason),
                Some(Command::Finish { reason, reply }) => {
                    let summary = self.finish(reason).await;
                    if reply.send(summary).is_err() {
                        debug!("stream summary dropped by caller");
                    }
                    break;
                }
                None => {
                    warn!("all handles dropped before the stream was finished, aborting");
                    self.finish(Some(AbortReason::Internal)).await;
                    break;
                }
            }
        }
        // Los Finish que lleguen después no obtienen respuesta.
        rx.close();
    }

    fn apply<F>(&mut self, step: F)
        where F: FnOnce(&mut EventStreamer, &mut Vec<StreamEvent>) -> Result<(), StreamError>
    {
        let mut out = Vec::new();
        let result = step(&mut self.streamer, &mut out);
        for event in &out {
            self.fanout.accept(event);
        }
        if let Err(e) = result {
            error!("stream {}: {e}", self.streamer.run_id());
            self.faults.push(e);
        }
    }

    async fn finish(&mut self, reason: Option<AbortReason>) -> StreamSummary {
        self.flush_ticker = None;
        self.apply(|s, out| s.finish(reason, out));
        let close = self.fanout
                        .close_all(self.notifier.as_ref(), self.options.heartbeat_interval, self.options.close_deadline)
                        .await;
        info!("stream {} finished: {} event(s) delivered in {:?} of closing",
              self.streamer.run_id(),
              self.streamer.delivered(),
              close.elapsed);
        StreamSummary { run_id: self.streamer.run_id(),
                        delivered: self.streamer.delivered(),
                        protocol_faults: std::mem::take(&mut self.faults),
                        accept_failures: self.fanout.accept_failures(),
                        close }
    }
}
