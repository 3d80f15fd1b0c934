//! eventcast-sinks: transportes de referencia para el stream.
//!
//! - `MemorySink`: guarda en memoria lo entregado (tests y demos).
//! - `JsonlSink`: una línea JSON por evento en un fichero.
//! - `DigestSink`: digest blake3 incremental del stream.
pub mod digest;
pub mod jsonl;
pub mod memory;

pub use digest::DigestSink;
pub use jsonl::JsonlSink;
pub use memory::MemorySink;
