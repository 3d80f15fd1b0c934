use eventcast_core::{SinkError, StreamError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error del stream: {0}")]
    Stream(#[from] StreamError),
    #[error("Error de sink: {0}")]
    Sink(#[from] SinkError),
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error de serialización: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Error de configuración: {0}")]
    Config(String),
}
