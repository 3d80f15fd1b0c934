use std::fmt;

use serde::{Deserialize, Serialize};

use crate::named_set::SetName;

/// Identidad de un evento dentro de una ejecución.
///
/// `RunStarted`, `Progress` y `NamedSet` son identidades que el streamer
/// conoce; `Progress` y `NamedSet` además sólo las puede producir el propio
/// streamer. Todo lo que emite el engine usa `Key`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventId {
    /// Identificador distinguido de inicio de ejecución.
    RunStarted,
    /// Eslabón `n` de la cadena de progreso.
    Progress(u32),
    /// Declaración de un named set.
    NamedSet(SetName),
    /// Identidad opaca definida por el engine.
    Key(String),
}

impl EventId {
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }

    /// `true` para identidades que un engine no puede enviar.
    pub fn is_reserved(&self) -> bool {
        matches!(self, Self::Progress(_) | Self::NamedSet(_))
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunStarted => write!(f, "run-started"),
            Self::Progress(n) => write!(f, "progress:{n}"),
            Self::NamedSet(name) => write!(f, "named-set:{name}"),
            Self::Key(key) => write!(f, "key:{key}"),
        }
    }
}

impl From<&str> for EventId {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}
