//! Tipos de evento del stream.
//!
//! Rol en el flujo:
//! - El engine construye `Event`s y los envía al streamer en cualquier orden.
//! - El streamer los ordena y los entrega a los sinks como `StreamEvent`s,
//!   ya sellados con `seq`, `run_id` y timestamp.
//! - `EventKind` es el conjunto cerrado de etiquetas de control: el streamer
//!   nunca inspecciona el `payload`, sólo la etiqueta.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::EventId;
use crate::named_set::{NamedSet, SetName};

/// Motivo con el que se cierra un evento anunciado que nunca llegó.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    Unknown,
    UserInterrupted,
    Timeout,
    RemoteEnvironmentFailure,
    Internal,
    OutOfMemory,
    Skipped,
    /// La ejecución terminó sin producir el evento (valor por defecto).
    #[default]
    Incomplete,
}

impl AbortReason {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Unknown => "aborted for an unknown reason",
            Self::UserInterrupted => "interrupted by the user",
            Self::Timeout => "run timed out",
            Self::RemoteEnvironmentFailure => "remote environment failure",
            Self::Internal => "internal error",
            Self::OutOfMemory => "out of memory",
            Self::Skipped => "skipped",
            Self::Incomplete => "run finished without producing this event",
        }
    }
}

/// Etiquetas de control reconocidas por el streamer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Evento ordinario del engine.
    Standard,
    /// Evento idempotente: sólo la primera publicación cuenta.
    Info,
    /// Evento de bajo valor; el filtro de publicación puede descartarlo.
    Detail,
    /// Progreso (o enlace) sintético. Anuncia el siguiente eslabón.
    Progress {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        stdout: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        stderr: String,
    },
    /// Definición de un named set: miembros directos y nombres de sus hijos.
    NamedSetDeclaration { members: Vec<String>, children: Vec<SetName> },
    /// Sustituto terminal de un evento que nunca se publicó.
    Aborted { reason: AbortReason, description: String },
}

impl EventKind {
    pub fn is_info(&self) -> bool {
        matches!(self, Self::Info)
    }

    pub fn is_detail(&self) -> bool {
        matches!(self, Self::Detail)
    }

    /// Etiquetas que sólo el streamer puede producir.
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::Progress { .. } | Self::NamedSetDeclaration { .. } | Self::Aborted { .. })
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Info => "info",
            Self::Detail => "detail",
            Self::Progress { .. } => "progress",
            Self::NamedSetDeclaration { .. } => "named_set",
            Self::Aborted { .. } => "aborted",
        }
    }
}

/// Evento tal como lo envía el engine.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: EventId,
    /// Ids que este evento promete publicar más adelante.
    pub children: Vec<EventId>,
    /// Ids que deben estar publicados antes de entregar este evento.
    pub order_after: Vec<EventId>,
    pub kind: EventKind,
    /// Named sets referenciados; se declaran antes de entregar el evento.
    pub named_sets: Vec<NamedSet>,
    pub payload: Value,
}

impl Event {
    pub fn new(id: impl Into<EventId>, payload: Value) -> Self {
        Self { id: id.into(),
               children: Vec::new(),
               order_after: Vec::new(),
               kind: EventKind::Standard,
               named_sets: Vec::new(),
               payload }
    }

    pub fn info(id: impl Into<EventId>, payload: Value) -> Self {
        Self::new(id, payload).with_kind(EventKind::Info)
    }

    pub fn detail(id: impl Into<EventId>, payload: Value) -> Self {
        Self::new(id, payload).with_kind(EventKind::Detail)
    }

    pub fn with_kind(mut self, kind: EventKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_children<I, T>(mut self, children: I) -> Self
        where I: IntoIterator<Item = T>,
              T: Into<EventId>
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn after<I, T>(mut self, prerequisites: I) -> Self
        where I: IntoIterator<Item = T>,
              T: Into<EventId>
    {
        self.order_after.extend(prerequisites.into_iter().map(Into::into));
        self
    }

    pub fn referencing(mut self, set: &NamedSet) -> Self {
        self.named_sets.push(set.clone());
        self
    }

    pub(crate) fn synthetic(id: EventId, kind: EventKind, children: Vec<EventId>) -> Self {
        Self { id,
               children,
               order_after: Vec::new(),
               kind,
               named_sets: Vec::new(),
               payload: Value::Null }
    }

    pub(crate) fn aborted(id: EventId, reason: AbortReason, children: Vec<EventId>) -> Self {
        let kind = EventKind::Aborted { reason,
                                        description: reason.description().to_string() };
        Self::synthetic(id, kind, children)
    }

    pub(crate) fn progress(index: u32, stdout: String, stderr: String, children: Vec<EventId>) -> Self {
        Self::synthetic(EventId::Progress(index), EventKind::Progress { stdout, stderr }, children)
    }
}

/// Evento entregado a los sinks, en el orden total calculado por el ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    pub seq: u64, // índice de entrega, idéntico en todos los sinks
    pub run_id: Uuid,
    pub id: EventId,
    pub children: Vec<EventId>,
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub named_sets: Vec<SetName>,
    pub payload: Value,
    /// `true` sólo en el evento cuya publicación completó el stream.
    #[serde(default)]
    pub last_message: bool,
    pub ts: DateTime<Utc>, // metadato, no participa en el orden
}
