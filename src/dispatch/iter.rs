//! Interpreter-facing iterator handle.

use std::fmt;

use crate::backend::{BackendId, BackendIterator, IterStep};
use crate::object::GpiObj;

/// Cursor over the children of one object (or over packages).
///
/// Advance it with [`Gpi::next`](super::Gpi::next).
pub struct GpiIterator {
    backend: BackendId,
    parent: Option<GpiObj>,
    inner: Box<dyn BackendIterator>,
    done: bool,
}

impl fmt::Debug for GpiIterator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpiIterator")
            .field("backend", &self.backend)
            .field("parent", &self.parent.as_ref().map(GpiObj::fullname))
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl GpiIterator {
    pub(crate) fn new(backend: BackendId, parent: Option<GpiObj>, inner: Box<dyn BackendIterator>) -> Self {
        Self {
            backend,
            parent,
            inner,
            done: false,
        }
    }

    /// Backend that produced this iterator.
    #[must_use]
    pub const fn backend(&self) -> BackendId {
        self.backend
    }

    pub(crate) const fn parent(&self) -> Option<&GpiObj> {
        self.parent.as_ref()
    }

    /// True once every category is exhausted.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// Next raw step; `None` after [`IterStep::End`] was delivered once.
    pub(crate) fn step(&mut self) -> Option<IterStep> {
        if self.done {
            return None;
        }
        let step = self.inner.next_step();
        if matches!(step, IterStep::End) {
            self.done = true;
        }
        Some(step)
    }
}
