//! Reparto a los sinks y cierre concurrente.
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use log::{debug, warn};
use serde::Serialize;
use tokio::time::{self, Instant};

use super::{Notifier, Sink};
use crate::errors::SinkError;
use crate::event::StreamEvent;
use crate::timer::{next_tick, ticker};

/// Resultado del cierre de un sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CloseOutcome {
    Closed,
    Failed(SinkError),
    /// La tarea de cierre terminó con panic.
    Panicked,
    /// Seguía abierto al vencer el plazo de cierre (la tarea no se cancela).
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SinkCloseResult {
    pub name: String,
    pub outcome: CloseOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CloseReport {
    pub sinks: Vec<SinkCloseResult>,
    pub elapsed: Duration,
}

impl CloseReport {
    pub fn all_closed(&self) -> bool {
        self.sinks.iter().all(|s| s.outcome == CloseOutcome::Closed)
    }

    pub fn timed_out(&self) -> Vec<&str> {
        self.sinks
            .iter()
            .filter(|s| s.outcome == CloseOutcome::TimedOut)
            .map(|s| s.name.as_str())
            .collect()
    }
}

pub struct SinkFanout {
    sinks: Vec<Arc<dyn Sink>>,
    accept_failures: Vec<u64>,
}

impl SinkFanout {
    pub fn new(sinks: Vec<Arc<dyn Sink>>) -> Self {
        let accept_failures = vec![0; sinks.len()];
        Self { sinks,
               accept_failures }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Entrega `event` a cada sink en orden de registro. El fallo de un sink
    /// se registra y no afecta al resto.
    pub fn accept(&mut self, event: &StreamEvent) {
        for (i, sink) in self.sinks.iter().enumerate() {
            if let Err(e) = sink.accept(event) {
                self.accept_failures[i] += 1;
                warn!("sink {} rejected event {} (seq={}): {e}", sink.name(), event.id, event.seq);
            }
        }
    }

    /// Fallos de `accept` por sink, en orden de registro.
    pub fn accept_failures(&self) -> Vec<(String, u64)> {
        self.sinks
            .iter()
            .zip(&self.accept_failures)
            .map(|(s, n)| (s.name().to_string(), *n))
            .collect()
    }

    /// Cierra todos los sinks a la vez (una tarea por sink) y espera a que
    /// terminen. Mientras tanto emite un heartbeat por `notifier` cada
    /// `heartbeat` (un periodo nulo lo desactiva). Sin `deadline` espera
    /// indefinidamente.
    pub async fn close_all(&self, notifier: &dyn Notifier, heartbeat: Duration, deadline: Option<Duration>) -> CloseReport {
        if self.sinks.is_empty() {
            return CloseReport::default();
        }
        let started = Instant::now();
        let total = self.sinks.len();
        let slots: Arc<Mutex<Vec<Option<CloseOutcome>>>> = Arc::new(Mutex::new(vec![None; total]));

        let handles: Vec<_> = self.sinks
                                  .iter()
                                  .enumerate()
                                  .map(|(index, sink)| {
                                      let sink = Arc::clone(sink);
                                      let slots = Arc::clone(&slots);
                                      tokio::spawn(async move {
                                          let outcome = match sink.close().await {
                                              Ok(()) => CloseOutcome::Closed,
                                              Err(e) => CloseOutcome::Failed(e),
                                          };
                                          if let Ok(mut slots) = slots.lock() {
                                              slots[index] = Some(outcome);
                                          }
                                      })
                                  })
                                  .collect();

        let all = join_all(handles);
        tokio::pin!(all);
        let expired = async {
            match deadline {
                Some(limit) => time::sleep_until(started + limit).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(expired);
        let mut notices = ticker(started, Some(heartbeat));

        let joined = loop {
            tokio::select! {
                results = &mut all => break Some(results),
                _ = next_tick(&mut notices) => {
                    let open = slots.lock().map(|s| s.iter().filter(|o| o.is_none()).count()).unwrap_or(total);
                    notifier.notify(&format!("Waiting for {open} of {total} sink(s) to close: {}s elapsed",
                                             started.elapsed().as_secs()));
                }
                _ = &mut expired => break None,
            }
        };

        let finished = slots.lock().map(|s| s.clone()).unwrap_or_else(|_| vec![None; total]);
        let outcomes = self.sinks
                           .iter()
                           .zip(finished)
                           .enumerate()
                           .map(|(i, (sink, outcome))| {
                               let outcome = match (outcome, &joined) {
                                   (Some(o), _) => o,
                                   (None, Some(results)) if results[i].is_err() => CloseOutcome::Panicked,
                                   (None, _) => CloseOutcome::TimedOut,
                               };
                               match &outcome {
                                   CloseOutcome::Closed => debug!("sink {} closed", sink.name()),
                                   other => warn!("sink {} did not close cleanly: {other:?}", sink.name()),
                               }
                               SinkCloseResult { name: sink.name().to_string(),
                                                 outcome }
                           })
                           .collect();

        CloseReport { sinks: outcomes,
                      elapsed: started.elapsed() }
    }
}
