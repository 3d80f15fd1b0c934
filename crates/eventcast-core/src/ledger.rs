//! Ledger de anuncios y publicaciones.
//!
//! Invariante: `posted ⊆ announced` en todo momento. Con eso, comparar
//! tamaños basta para saber si el stream está completo. Ambos conjuntos son
//! `IndexSet` para que cualquier recorrido (por ejemplo el snapshot de ids
//! pendientes al abortar) siga el orden de anuncio y sea determinista.
use indexmap::IndexSet;

use crate::constants::INITIAL_PROGRESS;
use crate::event::EventId;

#[derive(Debug, Default)]
pub struct Ledger {
    announced: IndexSet<EventId>,
    posted: IndexSet<EventId>,
    started: bool,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inicializa el ledger con el primer evento del stream: queda anunciado
    /// implícitamente (un stream completo nunca está vacío) junto con el
    /// placeholder inicial de progreso.
    pub fn seed(&mut self, first: &EventId) {
        debug_assert!(!self.started, "ledger seeded twice");
        self.started = true;
        self.announced.insert(first.clone());
        self.announced.insert(EventId::Progress(INITIAL_PROGRESS));
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn announce<I>(&mut self, ids: I)
        where I: IntoIterator<Item = EventId>
    {
        self.announced.extend(ids);
    }

    /// Marca `id` como publicado. Devuelve `true` la primera vez.
    ///
    /// # Panics
    /// Si `id` no fue anunciado: el streamer siempre enlaza antes de publicar,
    /// así que esto sólo ocurre por un error de programación.
    pub fn mark_posted(&mut self, id: &EventId) -> bool {
        assert!(self.announced.contains(id), "posting unannounced event {id}");
        self.posted.insert(id.clone())
    }

    pub fn is_announced(&self, id: &EventId) -> bool {
        self.announced.contains(id)
    }

    pub fn is_posted(&self, id: &EventId) -> bool {
        self.posted.contains(id)
    }

    pub fn is_complete(&self) -> bool {
        self.started && self.announced.len() == self.posted.len()
    }

    /// Snapshot estable de `announced − posted`, en orden de anuncio.
    pub fn unposted(&self) -> Vec<EventId> {
        self.announced
            .iter()
            .filter(|id| !self.posted.contains(*id))
            .cloned()
            .collect()
    }

    pub fn announced_len(&self) -> usize {
        self.announced.len()
    }

    pub fn posted_len(&self) -> usize {
        self.posted.len()
    }

    /// Comprueba el invariante completo (sólo para tests y `debug_assert!`).
    pub fn posted_is_subset(&self) -> bool {
        self.posted.iter().all(|id| self.announced.contains(id))
    }
}
