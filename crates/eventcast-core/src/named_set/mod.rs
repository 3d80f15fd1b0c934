//! Colecciones compartidas y recursivas (named sets).
//!
//! Un `NamedSet` agrupa miembros directos (por ejemplo rutas de outputs) y
//! otros named sets. La identidad es por *instancia*, no por contenido: cada
//! nodo recibe un `SetHandle` estable al crearse y los clones comparten ese
//! handle. Dos sets con el mismo contenido creados por separado son sets
//! distintos y recibirán nombres distintos; evitamos así un hashing
//! estructural caro.
//!
//! Los nodos son inmutables y sólo pueden referenciar sets ya existentes, por
//! lo que el grafo es siempre acíclico.

mod namer;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use namer::NamedSetNamer;

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(0);

/// Identidad estable de un nodo, asignada al crearlo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SetHandle(u64);

/// Nombre simbólico asignado por el namer la primera vez que un evento
/// referencia el set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SetName(pub u64);

impl fmt::Display for SetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
struct NamedSetNode {
    handle: SetHandle,
    members: Vec<String>,
    children: Vec<NamedSet>,
}

#[derive(Debug, Clone)]
pub struct NamedSet {
    node: Arc<NamedSetNode>,
}

impl NamedSet {
    pub fn new<I, S>(members: I, children: Vec<NamedSet>) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        let handle = SetHandle(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed));
        let node = NamedSetNode { handle,
                                  members: members.into_iter().map(Into::into).collect(),
                                  children };
        Self { node: Arc::new(node) }
    }

    pub fn leaf<I, S>(members: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        Self::new(members, Vec::new())
    }

    pub fn handle(&self) -> SetHandle {
        self.node.handle
    }

    pub fn members(&self) -> &[String] {
        &self.node.members
    }

    pub fn children(&self) -> &[NamedSet] {
        &self.node.children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_identity_but_equal_content_does_not() {
        let a = NamedSet::leaf(["lib.a"]);
        let b = NamedSet::leaf(["lib.a"]);
        assert_eq!(a.handle(), a.clone().handle());
        assert_ne!(a.handle(), b.handle());
    }
}
