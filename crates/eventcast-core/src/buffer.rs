//! Buffer de prerequisitos.
//!
//! Retiene los eventos cuyo `order_after` todavía no está publicado. Cada
//! entrada se indexa por su primer prerequisito pendiente (la "clave de
//! buffering"). Cuando esa clave se publica, `release` devuelve las entradas
//! ya satisfechas en orden FIFO de llegada y re-indexa las que aún esperan a
//! otro prerequisito.
use indexmap::{IndexMap, IndexSet};

use crate::event::{Event, EventId};
use crate::ledger::Ledger;

/// Evento retenido y los prerequisitos que le faltaban al admitirlo.
#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub event: Event,
    pub unmet: IndexSet<EventId>,
}

/// Resultado de `try_admit`.
#[derive(Debug)]
pub enum Admission {
    /// Todos los prerequisitos están publicados.
    Ready(Event),
    /// El evento quedó retenido bajo la clave indicada.
    Buffered(EventId),
}

#[derive(Debug, Default)]
pub struct PrerequisiteBuffer {
    pending: IndexMap<EventId, Vec<PendingEntry>>,
}

impl PrerequisiteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_admit(&mut self, event: Event, ledger: &Ledger) -> Admission {
        let unmet: IndexSet<EventId> = event.order_after
                                            .iter()
                                            .filter(|id| !ledger.is_posted(id))
                                            .cloned()
                                            .collect();
        match unmet.first().cloned() {
            None => Admission::Ready(event),
            Some(key) => {
                self.pending
                    .entry(key.clone())
                    .or_default()
                    .push(PendingEntry { event, unmet });
                Admission::Buffered(key)
            }
        }
    }

    /// Libera las entradas indexadas por `id` (recién publicado).
    pub fn release(&mut self, id: &EventId, ledger: &Ledger) -> Vec<Event> {
        let Some(entries) = self.pending.shift_remove(id) else {
            return Vec::new();
        };
        let mut ready = Vec::with_capacity(entries.len());
        for mut entry in entries {
            entry.unmet.retain(|p| !ledger.is_posted(p));
            match entry.unmet.first().cloned() {
                None => ready.push(entry.event),
                Some(next) => self.pending.entry(next).or_default().push(entry),
            }
        }
        ready
    }

    /// Ids de los eventos retenidos bajo `key`.
    pub fn waiting_on(&self, key: &EventId) -> Vec<EventId> {
        self.pending
            .get(key)
            .map(|entries| entries.iter().map(|e| e.event.id.clone()).collect())
            .unwrap_or_default()
    }

    /// Próxima clave a cerrar durante el drenado. Se prefiere una clave que
    /// no sea a la vez el id de un evento retenido; si todas lo son (ciclo de
    /// prerequisitos) se toma la primera.
    pub fn next_drain_key(&self) -> Option<EventId> {
        let buffered: IndexSet<&EventId> = self.pending
                                               .values()
                                               .flatten()
                                               .map(|e| &e.event.id)
                                               .collect();
        self.pending
            .keys()
            .find(|k| !buffered.contains(k))
            .or_else(|| self.pending.keys().next())
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
