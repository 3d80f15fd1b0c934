use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use eventcast_core::constants::STREAM_FORMAT_VERSION;
use eventcast_core::{Sink, SinkError, StreamEvent};
use log::debug;
use serde_json::json;

/// Escribe una cabecera con la versión del formato y después cada evento
/// como una línea JSON. `close` vacía el buffer y sincroniza el fichero;
/// después cualquier `accept` falla.
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl JsonlSink {
    /// Crea (o trunca) el fichero en `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(&mut writer, &json!({ "format_version": STREAM_FORMAT_VERSION }))
            .map_err(|e| SinkError::Io(e.to_string()))?;
        writer.write_all(b"\n")?;
        Ok(Self { path,
                  writer: Mutex::new(Some(writer)) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Sink for JsonlSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn accept(&self, event: &StreamEvent) -> Result<(), SinkError> {
        let mut guard = self.writer
                            .lock()
                            .map_err(|_| SinkError::Io("jsonl writer poisoned".into()))?;
        let writer = guard.as_mut().ok_or(SinkError::AlreadyClosed)?;
        serde_json::to_writer(&mut *writer, event).map_err(|e| SinkError::Rejected(e.to_string()))?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        let writer = self.writer
                         .lock()
                         .map_err(|_| SinkError::Io("jsonl writer poisoned".into()))?
                         .take();
        let mut writer = writer.ok_or(SinkError::AlreadyClosed)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        debug!("jsonl stream written to {}", self.path.display());
        Ok(())
    }
}
