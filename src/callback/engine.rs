//! Callback bookkeeping and the re-entrancy-safe dispatcher.
//!
//! Every vendor firing enters through [`CallbackEngine::dispatch`]. While one
//! reaction is running, further firings are queued and drained in arrival
//! order once it returns, so user functions never nest.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use tracing::{debug, error, trace, warn};

use crate::backend::{BackendId, Removal};
use crate::dispatch::Gpi;
use crate::error::{GpiError, GpiResult};
use crate::object::{RawHandle, SignalValue, ValueFormat};

use super::handle::{CallbackKind, CbHandle, CbId, CbState, RemoveOutcome, UserCallback};

/// How a vendor user-data word decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// A registered callback.
    Live(CbId),
    /// Issued by this engine, since retired.
    Stale(CbId),
    /// Not a word this engine ever produced.
    Corrupt,
}

/// What a firing resolved to once the handle table was consulted.
enum Firing {
    Invoke {
        kind: CallbackKind,
        func: UserCallback,
    },
    Teardown {
        backend: BackendId,
        native: Option<RawHandle>,
        removal: Removal,
    },
    Skip,
}

/// Owner of every callback handle.
#[derive(Debug, Default)]
pub struct CallbackEngine {
    handles: RefCell<HashMap<CbId, CbHandle>>,
    next_serial: Cell<u64>,
    reacting: Cell<bool>,
    pending: RefCell<VecDeque<CbId>>,
    deferred: RefCell<Vec<(CbId, Removal)>>,
}

impl CallbackEngine {
    #[allow(missing_docs)]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle in `Free` state.
    pub(crate) fn create(&self, backend: BackendId, kind: CallbackKind, func: UserCallback) -> CbId {
        let serial = self.next_serial.get() + 1;
        self.next_serial.set(serial);
        let id = CbId::from_serial(serial);
        self.handles.borrow_mut().insert(
            id,
            CbHandle {
                backend,
                kind,
                state: CbState::Free,
                native: None,
                func: Some(func),
            },
        );
        id
    }

    /// Record the vendor handle and move to `Primed`.
    pub(crate) fn arm(&self, id: CbId, native: RawHandle) {
        if let Some(handle) = self.handles.borrow_mut().get_mut(&id) {
            handle.native = Some(native);
            handle.state = CbState::Primed;
        }
    }

    /// Forget a handle whose vendor registration failed.
    pub(crate) fn discard(&self, id: CbId) {
        self.handles.borrow_mut().remove(&id);
    }

    /// Decode a vendor user-data word.
    #[must_use]
    pub fn decode(&self, word: u64) -> Decoded {
        let Some(id) = CbId::from_user_data(word) else {
            return Decoded::Corrupt;
        };
        if id.serial() == 0 || id.serial() > self.next_serial.get() {
            return Decoded::Corrupt;
        }
        if self.handles.borrow().contains_key(&id) {
            Decoded::Live(id)
        } else {
            Decoded::Stale(id)
        }
    }

    /// Current state of a callback, `None` once retired.
    #[must_use]
    pub fn state(&self, id: CbId) -> Option<CbState> {
        self.handles.borrow().get(&id).map(|h| h.state)
    }

    /// What a callback waits for.
    #[must_use]
    pub fn kind(&self, id: CbId) -> Option<CallbackKind> {
        self.handles.borrow().get(&id).map(|h| h.kind)
    }

    /// Vendor handle of an armed callback.
    #[must_use]
    pub fn native(&self, id: CbId) -> Option<RawHandle> {
        self.handles.borrow().get(&id).and_then(|h| h.native)
    }

    /// True while a user function is running.
    #[must_use]
    pub fn is_reacting(&self) -> bool {
        self.reacting.get()
    }

    /// Firings waiting for the current reaction to finish.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Number of live handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.borrow().len()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.borrow().is_empty()
    }

    /// Drop every handle and queued firing.
    pub(crate) fn clear(&self) {
        self.handles.borrow_mut().clear();
        self.pending.borrow_mut().clear();
        self.deferred.borrow_mut().clear();
    }

    /// Entry point for every vendor firing.
    ///
    /// A firing that arrives while a reaction is running is queued. The
    /// outermost call drains the queue in arrival order, then flushes
    /// removals the vendor would not accept mid-reaction.
    pub(crate) fn dispatch(&self, gpi: &Gpi, id: CbId) {
        if self.reacting.get() {
            trace!(%id, "queued behind running reaction");
            self.pending.borrow_mut().push_back(id);
            return;
        }

        self.reacting.set(true);
        self.run(gpi, id);
        loop {
            let next = self.pending.borrow_mut().pop_front();
            match next {
                Some(queued) => self.run(gpi, queued),
                None => break,
            }
        }
        self.reacting.set(false);

        self.flush_deferred(gpi);
    }

    fn run(&self, gpi: &Gpi, id: CbId) {
        match self.prepare(gpi, id) {
            Firing::Skip => {}
            Firing::Teardown {
                backend,
                native,
                removal,
            } => self.teardown(gpi, id, backend, native, removal),
            Firing::Invoke { kind, func } => self.invoke(gpi, id, kind, func),
        }
    }

    fn prepare(&self, gpi: &Gpi, id: CbId) -> Firing {
        let (backend, kind, state, native) = {
            let handles = self.handles.borrow();
            let Some(handle) = handles.get(&id) else {
                debug!(%id, "firing for retired callback");
                return Firing::Skip;
            };
            (handle.backend, handle.kind, handle.state, handle.native)
        };

        match state {
            CbState::Primed => {}
            CbState::Delete => {
                trace!(%id, "firing suppressed; callback removed");
                return Firing::Teardown {
                    backend,
                    native,
                    removal: retirement_for(kind),
                };
            }
            other => {
                warn!(%id, state = ?other, "firing in unexpected state");
                return Firing::Skip;
            }
        }

        if gpi.is_ending() && !matches!(kind, CallbackKind::Phase(_)) {
            trace!(%id, "simulation ending; user function skipped");
            self.set_state(id, CbState::Delete);
            return Firing::Teardown {
                backend,
                native,
                removal: retirement_for(kind),
            };
        }

        if let CallbackKind::ValueChange { signal, edge } = kind {
            match gpi.get_signal_value(signal, ValueFormat::BinStr) {
                Ok(SignalValue::BinStr(bits)) if !edge.accepts(&bits) => {
                    trace!(%id, ?edge, "edge filter rejected value change");
                    return Firing::Skip;
                }
                Ok(_) => {}
                Err(e) => debug!(%id, error = %e, "edge filter could not read signal"),
            }
        }

        let mut handles = self.handles.borrow_mut();
        let Some(handle) = handles.get_mut(&id) else {
            return Firing::Skip;
        };
        let Some(func) = handle.func.take() else {
            warn!(%id, "callback has no user function");
            return Firing::Skip;
        };
        handle.state = CbState::PreCall;
        Firing::Invoke { kind, func }
    }

    fn invoke(&self, gpi: &Gpi, id: CbId, kind: CallbackKind, mut func: UserCallback) {
        gpi.context().to_user();
        let result = func(gpi);
        gpi.context().to_simulator();

        let next = {
            let mut handles = self.handles.borrow_mut();
            match handles.get_mut(&id) {
                // Finalize ran inside the user function.
                None => None,
                Some(handle) => match handle.state {
                    CbState::Delete => {
                        drop(func);
                        Some((handle.backend, handle.native, retirement_for(kind)))
                    }
                    _ => {
                        handle.state = CbState::PostCall;
                        if kind.is_recurring() {
                            handle.func = Some(func);
                            handle.state = CbState::Primed;
                            None
                        } else {
                            Some((handle.backend, handle.native, Removal::Fired))
                        }
                    }
                },
            }
        };

        if let Some((backend, native, removal)) = next {
            self.teardown(gpi, id, backend, native, removal);
        }

        if let Err(e) = result {
            error!(%id, error = %e, "callback failed; ending simulation");
            gpi.sim_end();
        }
    }

    /// Retire a handle with its vendor, or leave it in `Delete` when the
    /// vendor refuses or cannot be asked yet.
    fn teardown(&self, gpi: &Gpi, id: CbId, backend: BackendId, native: Option<RawHandle>, removal: Removal) {
        let Some(native) = native else {
            self.handles.borrow_mut().remove(&id);
            return;
        };

        if removal == Removal::Armed && self.reacting.get() && !gpi.backend_capabilities(backend).removal_in_callback {
            self.set_state(id, CbState::Delete);
            self.deferred.borrow_mut().push((id, removal));
            debug!(%id, "vendor removal deferred until reaction ends");
            return;
        }

        if gpi.remove_native_callback(backend, native, removal) {
            self.handles.borrow_mut().remove(&id);
        } else {
            debug!(%id, "vendor refused removal; callback left in delete state");
            self.set_state(id, CbState::Delete);
        }
    }

    fn flush_deferred(&self, gpi: &Gpi) {
        let deferred = std::mem::take(&mut *self.deferred.borrow_mut());
        for (id, removal) in deferred {
            let target = {
                let handles = self.handles.borrow();
                handles
                    .get(&id)
                    .filter(|h| h.state == CbState::Delete)
                    .map(|h| (h.backend, h.native))
            };
            if let Some((backend, native)) = target {
                self.teardown(gpi, id, backend, native, removal);
            }
        }
    }

    /// Remove a callback at user request.
    pub(crate) fn remove(&self, gpi: &Gpi, id: CbId) -> GpiResult<RemoveOutcome> {
        let (backend, state, native) = {
            let handles = self.handles.borrow();
            let handle = handles.get(&id).ok_or(GpiError::InvalidCallback(id))?;
            (handle.backend, handle.state, handle.native)
        };

        match state {
            CbState::Free => {
                self.handles.borrow_mut().remove(&id);
                Ok(RemoveOutcome::Removed)
            }
            CbState::Delete => Ok(RemoveOutcome::Deferred),
            CbState::PreCall | CbState::PostCall => {
                // Removing itself from inside its own user function.
                self.set_state(id, CbState::Delete);
                Ok(RemoveOutcome::Deferred)
            }
            CbState::Primed => {
                self.teardown(gpi, id, backend, native, Removal::Armed);
                if self.handles.borrow().contains_key(&id) {
                    Ok(RemoveOutcome::Deferred)
                } else {
                    Ok(RemoveOutcome::Removed)
                }
            }
        }
    }

    fn set_state(&self, id: CbId, state: CbState) {
        if let Some(handle) = self.handles.borrow_mut().get_mut(&id) {
            handle.state = state;
            if state == CbState::Delete {
                handle.func = None;
            }
        }
    }
}

/// How a handle in `Delete` must be torn down with its vendor.
const fn retirement_for(kind: CallbackKind) -> Removal {
    if kind.is_recurring() {
        Removal::Armed
    } else {
        Removal::Fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_classifies_words() {
        let engine = CallbackEngine::new();
        let id = engine.create(BackendId::from_index(0), CallbackKind::ReadOnly, Box::new(|_| Ok(())));

        assert_eq!(engine.decode(id.to_user_data()), Decoded::Live(id));
        assert_eq!(engine.decode(0x1234), Decoded::Corrupt);
        assert_eq!(engine.decode(CbId::from_serial(99).to_user_data()), Decoded::Corrupt);
        assert_eq!(engine.decode(CbId::from_serial(0).to_user_data()), Decoded::Corrupt);

        engine.discard(id);
        assert_eq!(engine.decode(id.to_user_data()), Decoded::Stale(id));
    }

    #[test]
    fn test_arm_moves_to_primed() {
        let engine = CallbackEngine::new();
        let id = engine.create(BackendId::from_index(0), CallbackKind::NextTime, Box::new(|_| Ok(())));
        assert_eq!(engine.state(id), Some(CbState::Free));

        engine.arm(id, RawHandle::new(7));
        assert_eq!(engine.state(id), Some(CbState::Primed));
        assert_eq!(engine.native(id), Some(RawHandle::new(7)));
        assert_eq!(engine.kind(id), Some(CallbackKind::NextTime));
    }

    #[test]
    fn test_serials_are_unique() {
        let engine = CallbackEngine::new();
        let a = engine.create(BackendId::from_index(0), CallbackKind::ReadOnly, Box::new(|_| Ok(())));
        let b = engine.create(BackendId::from_index(0), CallbackKind::ReadOnly, Box::new(|_| Ok(())));
        assert_ne!(a, b);
        assert_eq!(engine.len(), 2);

        engine.clear();
        assert!(engine.is_empty());
        assert_eq!(engine.decode(a.to_user_data()), Decoded::Stale(a));
    }
}
