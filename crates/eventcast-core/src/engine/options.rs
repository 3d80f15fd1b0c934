use std::time::Duration;

use crate::constants::{HEARTBEAT_INTERVAL_MS, OUTPUT_FLUSH_INTERVAL_MS};

/// Parámetros de ejecución del actor de streaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOptions {
    /// Periodo del heartbeat mientras se cierran los sinks.
    pub heartbeat_interval: Duration,
    /// Periodo de sondeo de la salida capturada; `None` sólo vacía al cerrar
    /// o con `flush_output`.
    pub flush_interval: Option<Duration>,
    /// Plazo máximo de cierre de los sinks; `None` espera indefinidamente.
    pub close_deadline: Option<Duration>,
    /// Publica también los eventos `Detail`.
    pub publish_all_details: bool,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self { heartbeat_interval: Duration::from_millis(HEARTBEAT_INTERVAL_MS),
               flush_interval: Some(Duration::from_millis(OUTPUT_FLUSH_INTERVAL_MS)),
               close_deadline: None,
               publish_all_details: true }
    }
}
