use std::collections::HashMap;

use super::{NamedSet, SetHandle, SetName};
use crate::event::{Event, EventId, EventKind};

/// Asigna nombres una única vez por identidad de set y planifica las
/// declaraciones que deben preceder a la primera referencia.
#[derive(Debug, Default)]
pub struct NamedSetNamer {
    names: HashMap<SetHandle, SetName>,
    next: u64,
}

impl NamedSetNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Devuelve un nombre nuevo si el set no tenía uno; `None` si ya estaba
    /// nombrado.
    pub fn maybe_assign_name(&mut self, set: &NamedSet) -> Option<SetName> {
        if self.names.contains_key(&set.handle()) {
            return None;
        }
        let name = SetName(self.next);
        self.next += 1;
        self.names.insert(set.handle(), name);
        Some(name)
    }

    pub fn name_of(&self, set: &NamedSet) -> Option<SetName> {
        self.names.get(&set.handle()).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Declaraciones a publicar antes de un evento que referencia `set`, en
    /// orden de emisión: los hijos nuevos siempre antes que su padre. Un set ya
    /// nombrado no aporta nada, tampoco su subárbol (se declaró entero la
    /// primera vez).
    pub fn emit_naming_events(&mut self, set: &NamedSet) -> Vec<Event> {
        let mut out = Vec::new();
        self.visit(set, &mut out);
        out
    }

    fn visit(&mut self, set: &NamedSet, out: &mut Vec<Event>) {
        let Some(name) = self.maybe_assign_name(set) else {
            return;
        };
        for child in set.children() {
            self.visit(child, out);
        }
        let children = set.children()
                          .iter()
                          .filter_map(|c| self.name_of(c))
                          .collect();
        let kind = EventKind::NamedSetDeclaration { members: set.members().to_vec(),
                                                    children };
        out.push(Event::synthetic(EventId::NamedSet(name), kind, Vec::new()));
    }
}
