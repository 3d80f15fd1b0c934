//! Errores de la aplicación (binario y configuración).

pub mod app_error;

pub use app_error::AppError;
