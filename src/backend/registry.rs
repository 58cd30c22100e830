//! Ordered backend registry.

use tracing::{debug, warn};

use super::traits::{Backend, BackendId};

/// Backends in load order. Search order everywhere in the core is this order.
#[derive(Default)]
pub struct BackendRegistry {
    backends: Vec<Box<dyn Backend>>,
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.backends.iter().map(|b| b.name())).finish()
    }
}

impl BackendRegistry {
    #[allow(missing_docs)]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a backend. A second backend with an already registered name is
    /// dropped with a warning and the existing id is returned.
    pub fn register(&mut self, backend: Box<dyn Backend>) -> BackendId {
        if let Some(existing) = self.find(backend.name()) {
            warn!(backend = backend.name(), "backend already registered; ignoring");
            return existing;
        }

        let id = BackendId::from_index(self.backends.len());
        debug!(backend = backend.name(), %id, "registered backend");
        backend.on_registered(id);
        self.backends.push(backend);
        id
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn get(&self, id: BackendId) -> Option<&dyn Backend> {
        self.backends.get(id.index()).map(AsRef::as_ref)
    }

    /// Id of the backend registered under `name`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<BackendId> {
        self.backends
            .iter()
            .position(|b| b.name() == name)
            .map(BackendId::from_index)
    }

    /// The first registered backend, which owns simulator-wide operations.
    #[must_use]
    pub fn first(&self) -> Option<(BackendId, &dyn Backend)> {
        self.iter().next()
    }

    /// All backends in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (BackendId, &dyn Backend)> {
        self.backends
            .iter()
            .enumerate()
            .map(|(i, b)| (BackendId::from_index(i), b.as_ref()))
    }

    /// All backends except `skip`, in registration order.
    pub fn others(&self, skip: BackendId) -> impl Iterator<Item = (BackendId, &dyn Backend)> {
        self.iter().filter(move |(id, _)| *id != skip)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
