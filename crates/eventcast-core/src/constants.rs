//! Constantes del streamer.
//!
//! Valores por defecto que usan `StreamOptions` y la configuración del crate
//! raíz. Cambiar `HEARTBEAT_INTERVAL_MS` sólo afecta a la frecuencia de los
//! mensajes de diagnóstico durante el cierre, nunca al contenido del stream.

/// Versión del formato de `StreamEvent` entregado a los sinks. Los sinks que
/// persisten eventos (JSONL) la incluyen en su cabecera.
pub const STREAM_FORMAT_VERSION: &str = "1.0";

/// Periodo del heartbeat que se emite mientras se espera el cierre de los
/// sinks.
pub const HEARTBEAT_INTERVAL_MS: u64 = 1_000;

/// Periodo por defecto del flush de stdout/stderr capturado.
pub const OUTPUT_FLUSH_INTERVAL_MS: u64 = 500;

/// Primer índice de la cadena de progreso (placeholder inicial).
pub const INITIAL_PROGRESS: u32 = 0;
