//! eventcast
//!
//! Este crate une el motor (`eventcast-core`) con los sinks de referencia:
//! - Expone `config` para leer la configuración desde el entorno.
//! - Expone `errors` con el error de aplicación.
//! - Expone `pipeline`, una ejecución simulada usada por el binario de demo.

pub mod config;
pub mod errors;
pub mod pipeline;

pub use config::{AppConfig, CONFIG};
pub use errors::AppError;
