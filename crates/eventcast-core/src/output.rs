//! Captura de stdout/stderr.
//!
//! El streamer no escribe en la consola: consulta periódicamente un
//! `OutErrProvider` y convierte lo capturado en eventos de progreso. Antes de
//! que el stream arranque, lo capturado se acumula y se publica justo después
//! del primer evento.
use std::sync::Mutex;

/// Texto capturado desde el último sondeo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutErr {
    pub stdout: String,
    pub stderr: String,
}

impl OutErr {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self { stdout: stdout.into(),
               stderr: stderr.into() }
    }

    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }

    /// Concatena varios fragmentos manteniendo el orden.
    pub fn concat<I>(parts: I) -> Self
        where I: IntoIterator<Item = OutErr>
    {
        parts.into_iter().fold(Self::default(), |mut acc, part| {
                             acc.stdout.push_str(&part.stdout);
                             acc.stderr.push_str(&part.stderr);
                             acc
                         })
    }
}

/// Fuente de salida capturada, consultada en cada flush.
pub trait OutErrProvider: Send + Sync {
    /// Devuelve (y vacía) lo capturado desde la última llamada.
    fn take_out_err(&self) -> OutErr;
}

/// Implementación en memoria, segura entre hilos.
#[derive(Debug, Default)]
pub struct CapturedOutput {
    inner: Mutex<OutErr>,
}

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_stdout(&self, text: &str) {
        if let Ok(mut buf) = self.inner.lock() {
            buf.stdout.push_str(text);
        }
    }

    pub fn append_stderr(&self, text: &str) {
        if let Ok(mut buf) = self.inner.lock() {
            buf.stderr.push_str(text);
        }
    }
}

impl OutErrProvider for CapturedOutput {
    fn take_out_err(&self) -> OutErr {
        self.inner
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }
}
