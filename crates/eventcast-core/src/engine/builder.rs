//! Builder para el actor de streaming.
//!
//! ```ignore
//! let handle = EventStream::builder()
//!     .options(StreamOptions::default())
//!     .sink(jsonl.clone())
//!     .sink(digest.clone())
//!     .spawn();
//! ```

use std::sync::Arc;

use uuid::Uuid;

use super::core::{StreamActor, StreamHandle};
use super::StreamOptions;
use crate::output::OutErrProvider;
use crate::sink::{LogNotifier, Notifier, Sink, SinkFanout};
use crate::streamer::{DetailFilter, EventFilter, EventStreamer};

pub struct StreamBuilder {
    options: StreamOptions,
    sinks: Vec<Arc<dyn Sink>>,
    notifier: Arc<dyn Notifier>,
    filter: Option<Box<dyn EventFilter>>,
    output: Option<Arc<dyn OutErrProvider>>,
    run_id: Option<Uuid>,
}

impl Default for StreamBuilder {
    fn default() -> Self {
        Self { options: StreamOptions::default(),
               sinks: Vec::new(),
               notifier: Arc::new(LogNotifier),
               filter: None,
               output: None,
               run_id: None }
    }
}

impl StreamBuilder {
    pub fn options(mut self, options: StreamOptions) -> Self {
        self.options = options;
        self
    }

    /// Registra un sink; los eventos se entregan en orden de registro.
    pub fn sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Sustituye el filtro derivado de `publish_all_details`.
    pub fn filter(mut self, filter: Box<dyn EventFilter>) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn output_capture(mut self, provider: Arc<dyn OutErrProvider>) -> Self {
        self.output = Some(provider);
        self
    }

    pub fn run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Lanza el actor en el runtime tokio actual y devuelve su handle.
    ///
    /// # Panics
    /// Fuera de un runtime tokio.
    pub fn spawn(self) -> StreamHandle {
        let run_id = self.run_id.unwrap_or_else(Uuid::new_v4);
        let filter = self.filter
                         .unwrap_or_else(|| Box::new(DetailFilter { publish_all_details: self.options.publish_all_details }));
        let streamer = EventStreamer::new(run_id).with_filter(filter);
        let actor = StreamActor::new(streamer, SinkFanout::new(self.sinks), self.notifier, self.options);
        let handle = actor.start();
        if let Some(provider) = self.output {
            // el canal recién creado no puede estar cerrado
            let _ = handle.register_output_capture(provider);
        }
        handle
    }
}
