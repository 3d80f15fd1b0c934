//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) y expone una estructura inmutable (`CONFIG`).
//! `AppConfig::stream_options` la traduce a las opciones del motor.
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use eventcast_core::constants::{HEARTBEAT_INTERVAL_MS, OUTPUT_FLUSH_INTERVAL_MS};
use eventcast_core::StreamOptions;
use log::warn;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::errors::AppError;

/// Configuración global de la aplicación.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppConfig {
    /// Periodo del heartbeat durante el cierre de sinks (ms).
    pub heartbeat_ms: u64,
    /// Periodo de sondeo de la salida capturada (ms); 0 lo desactiva.
    pub flush_ms: u64,
    /// Plazo de cierre de sinks en segundos; `None` espera indefinidamente.
    pub close_deadline_secs: Option<u64>,
    pub publish_all_details: bool,
    /// Si está definido se añade un `JsonlSink` en esa ruta.
    pub jsonl_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { heartbeat_ms: HEARTBEAT_INTERVAL_MS,
               flush_ms: OUTPUT_FLUSH_INTERVAL_MS,
               close_deadline_secs: None,
               publish_all_details: true,
               jsonl_path: None }
    }
}

impl AppConfig {
    /// Lee `.env` (si existe) y las variables `EVENTCAST_*`.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construye la configuración a partir de una función de consulta; las
    /// variables ausentes toman su valor por defecto.
    pub fn from_lookup<F>(get: F) -> Result<Self, AppError>
        where F: Fn(&str) -> Option<String>
    {
        let defaults = Self::default();
        let heartbeat_ms = parse_or(&get, "EVENTCAST_HEARTBEAT_MS", defaults.heartbeat_ms)?;
        if heartbeat_ms == 0 {
            return Err(AppError::Config("EVENTCAST_HEARTBEAT_MS: must be greater than zero".into()));
        }
        Ok(Self { heartbeat_ms,
                  flush_ms: parse_or(&get, "EVENTCAST_FLUSH_MS", defaults.flush_ms)?,
                  close_deadline_secs: parse_opt(&get, "EVENTCAST_CLOSE_DEADLINE_SECS")?,
                  publish_all_details: parse_or(&get, "EVENTCAST_PUBLISH_ALL_DETAILS", defaults.publish_all_details)?,
                  jsonl_path: get("EVENTCAST_JSONL_PATH").filter(|p| !p.trim().is_empty())
                                                         .map(PathBuf::from) })
    }

    pub fn stream_options(&self) -> StreamOptions {
        StreamOptions { heartbeat_interval: Duration::from_millis(self.heartbeat_ms),
                        flush_interval: (self.flush_ms > 0).then(|| Duration::from_millis(self.flush_ms)),
                        close_deadline: self.close_deadline_secs.map(Duration::from_secs),
                        publish_all_details: self.publish_all_details }
    }
}

fn parse_opt<F, T>(get: &F, key: &str) -> Result<Option<T>, AppError>
    where F: Fn(&str) -> Option<String>,
          T: FromStr
{
    match get(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim()
                        .parse()
                        .map(Some)
                        .map_err(|_| AppError::Config(format!("{key}: invalid value {raw:?}"))),
    }
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> Result<T, AppError>
    where F: Fn(&str) -> Option<String>,
          T: FromStr
{
    Ok(parse_opt(get, key)?.unwrap_or(default))
}

/// Instancia global perezosa de configuración, evaluada una sola vez. Con
/// valores inválidos se registra un aviso y se usan los valores por defecto.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    AppConfig::from_env().unwrap_or_else(|e| {
                             warn!("{e}; using default configuration");
                             AppConfig::default()
                         })
});
