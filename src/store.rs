//! Handle identity store.
//!
//! Maps a fully-qualified hierarchical name to exactly one live object. The
//! store owns every object it accepted until [`HandleStore::clear`] runs at
//! finalize; interpreter code keeps [`ObjId`] tokens for the whole run, so
//! nothing is evicted earlier.

use std::collections::HashMap;

use crate::object::{GpiObj, ObjId};

/// Outcome of [`HandleStore::check_and_store`].
#[derive(Debug)]
pub enum Stored {
    /// The candidate was new and is now the canonical object.
    New(ObjId),
    /// An object with the same name already existed. The candidate is handed
    /// back so its backend can release the native reference.
    Existing {
        /// The canonical object.
        id: ObjId,
        /// The rejected candidate.
        discarded: GpiObj,
    },
}

impl Stored {
    /// The canonical id either way.
    #[must_use]
    pub const fn id(&self) -> ObjId {
        match self {
            Self::New(id) | Self::Existing { id, .. } => *id,
        }
    }
}

/// Name-keyed owner of every discovered object.
#[derive(Debug, Default)]
pub struct HandleStore {
    objects: Vec<GpiObj>,
    by_name: HashMap<String, ObjId>,
}

impl HandleStore {
    #[allow(missing_docs)]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `candidate` unless its fully-qualified name is already known.
    pub fn check_and_store(&mut self, candidate: GpiObj) -> Stored {
        if let Some(&id) = self.by_name.get(candidate.fullname()) {
            return Stored::Existing {
                id,
                discarded: candidate,
            };
        }

        let id = ObjId::from_index(self.objects.len());
        self.by_name.insert(candidate.fullname().to_string(), id);
        self.objects.push(candidate);
        Stored::New(id)
    }

    /// Look up a stored object.
    #[must_use]
    pub fn get(&self, id: ObjId) -> Option<&GpiObj> {
        self.objects.get(id.index())
    }

    /// Find the canonical id for a fully-qualified name.
    #[must_use]
    pub fn find(&self, fullname: &str) -> Option<ObjId> {
        self.by_name.get(fullname).copied()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Destroy every stored object, returning them for native release.
    pub fn clear(&mut self) -> Vec<GpiObj> {
        self.by_name.clear();
        std::mem::take(&mut self.objects)
    }
}
