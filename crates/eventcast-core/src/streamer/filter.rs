use std::fmt::Debug;

use crate::event::Event;

/// Política de publicación para eventos del engine. Se aplica antes del
/// buffer de prerequisitos; los eventos sintéticos nunca pasan por aquí.
pub trait EventFilter: Send + Sync + Debug {
    fn should_publish(&self, event: &Event) -> bool;
}

/// Descarta los eventos `Detail` salvo que se pida publicarlo todo.
///
/// Un `Detail` descartado que otro evento había anunciado se cerrará como
/// abortado al terminar el stream.
#[derive(Debug, Clone, Copy)]
pub struct DetailFilter {
    pub publish_all_details: bool,
}

impl Default for DetailFilter {
    fn default() -> Self {
        Self { publish_all_details: true }
    }
}

impl EventFilter for DetailFilter {
    fn should_publish(&self, event: &Event) -> bool {
        self.publish_all_details || !event.kind.is_detail()
    }
}
