//! The dispatch core.
//!
//! [`Gpi`] owns the backend registry, the identity store, and the callback
//! engine. Every interpreter-facing operation enters here and is routed to the
//! backend owning the object it concerns, falling back to the other backends
//! in registration order where the operation allows it.
//!
//! All state is single-threaded interior mutability. No `RefCell` borrow is
//! held across a call into a user function, so user code may call back into
//! any operation while a callback is running.

mod callbacks;
mod global;
mod iter;

use std::cell::{Cell, RefCell};
use std::fmt;

use tracing::{debug, info, trace};

use crate::backend::{index::join_name, Backend, BackendId, BackendRegistry, Capabilities, IterStep, Removal, SimTime};
use crate::callback::CallbackEngine;
use crate::config::GpiConfig;
use crate::context::ContextGuard;
use crate::embed::{EmbedBridge, EmbedPhase};
use crate::error::{GpiError, GpiResult};
use crate::object::{
    GpiObj, IndexRange, IterSelector, LookupMode, ObjId, ObjType, RangeDirection, RawHandle, SetAction, SignalValue,
    ValueFormat,
};
use crate::store::{HandleStore, Stored};

pub use global::{bootstrap_from_env, init_global, teardown_global, with_global};
pub use iter::GpiIterator;

/// The dispatch core: one per simulation run.
pub struct Gpi {
    registry: RefCell<BackendRegistry>,
    store: RefCell<HandleStore>,
    callbacks: CallbackEngine,
    context: ContextGuard,
    embed: RefCell<Option<Box<dyn EmbedBridge>>>,
    embed_phase: Cell<EmbedPhase>,
    lookups_started: Cell<bool>,
    ending: Cell<bool>,
    config: GpiConfig,
}

impl fmt::Debug for Gpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gpi")
            .field("registry", &self.registry)
            .field("objects", &self.store.borrow().len())
            .field("callbacks", &self.callbacks.len())
            .field("context", &self.context.current())
            .field("ending", &self.ending.get())
            .finish_non_exhaustive()
    }
}

impl Default for Gpi {
    fn default() -> Self {
        Self::new()
    }
}

impl Gpi {
    #[allow(missing_docs)]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(GpiConfig::default())
    }

    /// Create a core that loads `config.users` at simulation start.
    #[must_use]
    pub fn with_config(config: GpiConfig) -> Self {
        Self {
            registry: RefCell::new(BackendRegistry::new()),
            store: RefCell::new(HandleStore::new()),
            callbacks: CallbackEngine::new(),
            context: ContextGuard::new(),
            embed: RefCell::new(None),
            embed_phase: Cell::new(EmbedPhase::Idle),
            lookups_started: Cell::new(false),
            ending: Cell::new(false),
            config,
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn config(&self) -> &GpiConfig {
        &self.config
    }

    /// The simulator/interpreter context token.
    #[must_use]
    pub const fn context(&self) -> &ContextGuard {
        &self.context
    }

    /// Callback bookkeeping, for inspection.
    #[must_use]
    pub const fn callbacks(&self) -> &CallbackEngine {
        &self.callbacks
    }

    // ------------------------------------------------------------------
    // Backends
    // ------------------------------------------------------------------

    /// Append a backend to the search order.
    ///
    /// Registration closes once the first handle lookup ran; a later
    /// backend would change what earlier lookups should have found.
    pub fn register_backend(&self, backend: Box<dyn Backend>) -> GpiResult<BackendId> {
        if self.lookups_started.get() {
            return Err(GpiError::RegistrationClosed {
                name: backend.name().to_string(),
            });
        }
        Ok(self.registry.borrow_mut().register(backend))
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn backend_count(&self) -> usize {
        self.registry.borrow().len()
    }

    /// Registry name of a backend.
    #[must_use]
    pub fn backend_name(&self, id: BackendId) -> Option<String> {
        self.registry.borrow().get(id).map(|b| b.name().to_string())
    }

    /// Id of the backend registered under `name`.
    #[must_use]
    pub fn find_backend(&self, name: &str) -> Option<BackendId> {
        self.registry.borrow().find(name)
    }

    /// Vendor code to text, as reported by `backend`.
    #[must_use]
    pub fn reason_to_string(&self, backend: BackendId, reason: i32) -> &'static str {
        self.registry
            .borrow()
            .get(backend)
            .map_or("unknown", |b| b.reason_to_string(reason))
    }

    pub(crate) fn backend_capabilities(&self, id: BackendId) -> Capabilities {
        self.registry
            .borrow()
            .get(id)
            .map(|b| b.capabilities())
            .unwrap_or_default()
    }

    pub(crate) fn remove_native_callback(&self, id: BackendId, native: RawHandle, removal: Removal) -> bool {
        // A backend that vanished cannot hold the callback any more.
        self.registry
            .borrow()
            .get(id)
            .map_or(true, |b| b.remove_callback(native, removal))
    }

    fn with_backend<R>(&self, id: BackendId, f: impl FnOnce(&dyn Backend) -> R) -> GpiResult<R> {
        let registry = self.registry.borrow();
        let backend = registry.get(id).ok_or(GpiError::NoBackend)?;
        Ok(f(backend))
    }

    fn first_backend(&self) -> GpiResult<BackendId> {
        self.registry
            .borrow()
            .first()
            .map(|(id, _)| id)
            .ok_or(GpiError::NoBackend)
    }

    // ------------------------------------------------------------------
    // Simulator-wide queries
    // ------------------------------------------------------------------

    /// Current simulation time.
    pub fn sim_time(&self) -> GpiResult<SimTime> {
        self.with_backend(self.first_backend()?, |b| b.sim_time())
    }

    /// Time precision as a power of ten.
    pub fn sim_precision(&self) -> GpiResult<i32> {
        self.with_backend(self.first_backend()?, |b| b.sim_precision())
    }

    #[allow(missing_docs)]
    pub fn simulator_product(&self) -> GpiResult<String> {
        self.with_backend(self.first_backend()?, |b| b.simulator_product())
    }

    #[allow(missing_docs)]
    pub fn simulator_version(&self) -> GpiResult<String> {
        self.with_backend(self.first_backend()?, |b| b.simulator_version())
    }

    /// Ask the simulator to finish. Only the first request reaches the vendor.
    pub fn sim_end(&self) {
        if self.ending.replace(true) {
            debug!("simulation end already requested");
            return;
        }
        info!("requesting end of simulation");
        if let Ok(id) = self.first_backend() {
            let _ = self.with_backend(id, |b| b.sim_end());
        }
    }

    /// True once [`Gpi::sim_end`] was called.
    #[must_use]
    pub fn is_ending(&self) -> bool {
        self.ending.get()
    }

    // ------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------

    /// Bind a backend-built candidate and run it through the identity store.
    fn adopt(&self, backend: BackendId, mut obj: GpiObj) -> ObjId {
        obj.bind(backend);
        let stored = self.store.borrow_mut().check_and_store(obj);
        match stored {
            Stored::New(id) => {
                trace!(%id, "stored new object");
                id
            }
            Stored::Existing { id, discarded } => {
                if let Some(owner) = discarded.backend() {
                    let _ = self.with_backend(owner, |b| b.release_handle(&discarded));
                }
                id
            }
        }
    }

    fn object(&self, id: ObjId) -> GpiResult<GpiObj> {
        self.store
            .borrow()
            .get(id)
            .cloned()
            .ok_or(GpiError::InvalidHandle(id))
    }

    /// Borrow a stored object.
    ///
    /// `f` must not call back into this instance.
    pub fn with_object<R>(&self, id: ObjId, f: impl FnOnce(&GpiObj) -> R) -> GpiResult<R> {
        let store = self.store.borrow();
        let obj = store.get(id).ok_or(GpiError::InvalidHandle(id))?;
        Ok(f(obj))
    }

    /// Number of live objects.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.store.borrow().len()
    }

    /// Identity-store lookup without touching any backend.
    #[must_use]
    pub fn find_cached(&self, fullname: &str) -> Option<ObjId> {
        self.store.borrow().find(fullname)
    }

    #[allow(missing_docs)]
    pub fn obj_type(&self, id: ObjId) -> GpiResult<ObjType> {
        self.with_object(id, GpiObj::obj_type)
    }

    #[allow(missing_docs)]
    pub fn name(&self, id: ObjId) -> GpiResult<String> {
        self.with_object(id, |o| o.name().to_string())
    }

    #[allow(missing_docs)]
    pub fn fullname(&self, id: ObjId) -> GpiResult<String> {
        self.with_object(id, |o| o.fullname().to_string())
    }

    /// Vendor type string.
    pub fn type_str(&self, id: ObjId) -> GpiResult<String> {
        self.with_object(id, |o| o.type_str().to_string())
    }

    #[allow(missing_docs)]
    pub fn definition_name(&self, id: ObjId) -> GpiResult<Option<String>> {
        self.with_object(id, |o| o.definition_name().map(str::to_string))
    }

    #[allow(missing_docs)]
    pub fn definition_file(&self, id: ObjId) -> GpiResult<Option<String>> {
        self.with_object(id, |o| o.definition_file().map(str::to_string))
    }

    #[allow(missing_docs)]
    pub fn is_constant(&self, id: ObjId) -> GpiResult<bool> {
        self.with_object(id, GpiObj::is_const)
    }

    #[allow(missing_docs)]
    pub fn is_indexable(&self, id: ObjId) -> GpiResult<bool> {
        self.with_object(id, GpiObj::is_indexable)
    }

    /// Element count, when the vendor reports one.
    pub fn num_elems(&self, id: ObjId) -> GpiResult<Option<usize>> {
        self.with_object(id, GpiObj::num_elems)
    }

    #[allow(missing_docs)]
    pub fn range(&self, id: ObjId) -> GpiResult<Option<IndexRange>> {
        self.with_object(id, GpiObj::range)
    }

    #[allow(missing_docs)]
    pub fn range_left(&self, id: ObjId) -> GpiResult<Option<i32>> {
        Ok(self.range(id)?.map(|r| r.left))
    }

    #[allow(missing_docs)]
    pub fn range_right(&self, id: ObjId) -> GpiResult<Option<i32>> {
        Ok(self.range(id)?.map(|r| r.right))
    }

    #[allow(missing_docs)]
    pub fn range_direction(&self, id: ObjId) -> GpiResult<RangeDirection> {
        Ok(self.range(id)?.map_or(RangeDirection::Undetermined, |r| r.direction))
    }

    // ------------------------------------------------------------------
    // Discovery
    // ------------------------------------------------------------------

    /// First top-level object any backend reports, optionally by name.
    ///
    /// `None` is reported at debug level; the caller decides what it means.
    pub fn get_root_handle(&self, name: Option<&str>) -> Option<ObjId> {
        self.lookups_started.set(true);

        let found = {
            let registry = self.registry.borrow();
            let hit = registry
                .iter()
                .find_map(|(id, backend)| backend.root_handle(name).map(|obj| (id, obj)));
            hit
        };

        match found {
            Some((backend, obj)) => Some(self.adopt(backend, obj)),
            None => {
                debug!(name = name.unwrap_or("<any>"), "no backend found a root handle");
                None
            }
        }
    }

    /// Resolve `name` below `parent`.
    ///
    /// The parent's own backend is asked first. With [`LookupMode::Auto`]
    /// every other backend is then tried in registration order, which is how
    /// a child in another language is found below a mixed-language parent.
    pub fn get_handle_by_name(&self, parent: ObjId, name: &str, mode: LookupMode) -> GpiResult<Option<ObjId>> {
        self.lookups_started.set(true);

        let parent_obj = self.object(parent)?;
        let owner = parent_obj.backend().ok_or(GpiError::InvalidHandle(parent))?;

        let fullname = join_name(parent_obj.fullname(), name);
        if let Some(id) = self.cached_for(&fullname, owner, mode) {
            return Ok(Some(id));
        }

        let found = {
            let registry = self.registry.borrow();
            let native = registry
                .get(owner)
                .and_then(|b| b.native_check_create_by_name(name, &parent_obj))
                .map(|obj| (owner, obj));
            match (native, mode) {
                (Some(hit), _) => Some(hit),
                (None, LookupMode::Native) => None,
                (None, LookupMode::Auto) => registry
                    .others(owner)
                    .find_map(|(id, b)| b.native_check_create_by_name(name, &parent_obj).map(|obj| (id, obj))),
            }
        };

        match found {
            Some((backend, obj)) => {
                let id = self.adopt(backend, obj);
                // The store may already hold this name under another backend.
                if mode == LookupMode::Native && self.with_object(id, GpiObj::backend)? != Some(owner) {
                    debug!(parent = parent_obj.fullname(), name, "name is owned by another backend");
                    return Ok(None);
                }
                Ok(Some(id))
            }
            None => {
                debug!(parent = parent_obj.fullname(), name, "no backend resolved child");
                Ok(None)
            }
        }
    }

    fn cached_for(&self, fullname: &str, owner: BackendId, mode: LookupMode) -> Option<ObjId> {
        let store = self.store.borrow();
        let id = store.find(fullname)?;
        match mode {
            LookupMode::Auto => Some(id),
            LookupMode::Native => store.get(id).filter(|o| o.backend() == Some(owner)).map(|_| id),
        }
    }

    /// Resolve element `index` of `parent`.
    ///
    /// Only the parent's backend is asked; array elements never change
    /// language.
    pub fn get_handle_by_index(&self, parent: ObjId, index: i32) -> GpiResult<Option<ObjId>> {
        self.lookups_started.set(true);

        let parent_obj = self.object(parent)?;
        let owner = parent_obj.backend().ok_or(GpiError::InvalidHandle(parent))?;
        let found = self.with_backend(owner, |b| b.native_check_create_by_index(index, &parent_obj))?;

        match found {
            Some(obj) => Ok(Some(self.adopt(owner, obj))),
            None => {
                debug!(parent = parent_obj.fullname(), index, "index did not resolve");
                Ok(None)
            }
        }
    }

    /// Start iterating the children of `parent`.
    ///
    /// `Ok(None)` when the owning backend has nothing to iterate for this
    /// object type.
    pub fn iterate(&self, parent: ObjId, selector: IterSelector) -> GpiResult<Option<GpiIterator>> {
        self.lookups_started.set(true);

        let parent_obj = self.object(parent)?;
        let owner = parent_obj.backend().ok_or(GpiError::InvalidHandle(parent))?;
        let inner = self.with_backend(owner, |b| b.iterate_handle(&parent_obj, selector))?;
        Ok(inner.map(|inner| GpiIterator::new(owner, Some(parent_obj), inner)))
    }

    /// Start iterating packages, through the first backend that supports it.
    pub fn iterate_packages(&self) -> Option<GpiIterator> {
        self.lookups_started.set(true);

        let registry = self.registry.borrow();
        let found = registry
            .iter()
            .find_map(|(id, b)| b.iterate_packages().map(|inner| GpiIterator::new(id, None, inner)));
        found
    }

    /// Advance an iterator.
    ///
    /// Children the owning backend could not build are offered to every
    /// other backend, by name or by raw reference. Children no backend can
    /// build are skipped. `Ok(None)` once the iterator is exhausted.
    pub fn next(&self, it: &mut GpiIterator) -> GpiResult<Option<ObjId>> {
        while let Some(step) = it.step() {
            match step {
                IterStep::Native(obj) => return Ok(Some(self.adopt(it.backend(), obj))),
                IterStep::NativeNoName => trace!("skipping nameless child"),
                IterStep::NotNative { name, raw } => {
                    if let Some(id) = self.resolve_foreign(it, |b, parent| b.native_check_create_by_name(&name, parent)) {
                        return Ok(Some(id));
                    }
                    debug!(name = %name, %raw, "no backend could build child");
                }
                IterStep::NotNativeNoName(raw) => {
                    if let Some(id) = self.resolve_foreign(it, |b, parent| b.native_check_create_by_raw(raw, parent)) {
                        return Ok(Some(id));
                    }
                    debug!(%raw, "no backend could build nameless child");
                }
                IterStep::End => {}
            }
        }
        Ok(None)
    }

    fn resolve_foreign(
        &self,
        it: &GpiIterator,
        create: impl Fn(&dyn Backend, &GpiObj) -> Option<GpiObj>,
    ) -> Option<ObjId> {
        let parent = it.parent()?;
        let found = {
            let registry = self.registry.borrow();
            let hit = registry
                .others(it.backend())
                .find_map(|(id, b)| create(b, parent).map(|obj| (id, obj)));
            hit
        };
        found.map(|(backend, obj)| self.adopt(backend, obj))
    }

    /// Drain an iterator into a list.
    pub fn children(&self, parent: ObjId, selector: IterSelector) -> GpiResult<Vec<ObjId>> {
        let Some(mut it) = self.iterate(parent, selector)? else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        while let Some(id) = self.next(&mut it)? {
            out.push(id);
        }
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------

    /// Read a signal.
    pub fn get_signal_value(&self, id: ObjId, format: ValueFormat) -> GpiResult<SignalValue> {
        let obj = self.signal(id, "get_signal_value")?;
        let owner = obj.backend().ok_or(GpiError::InvalidHandle(id))?;
        self.with_backend(owner, |b| b.get_signal_value(&obj, format))?
    }

    /// Write a signal.
    pub fn set_signal_value(&self, id: ObjId, value: &SignalValue, action: SetAction) -> GpiResult<()> {
        let obj = self.signal(id, "set_signal_value")?;
        if obj.is_const() {
            return Err(GpiError::Unsupported {
                operation: "set_signal_value",
                obj_type: obj.obj_type(),
            });
        }
        let owner = obj.backend().ok_or(GpiError::InvalidHandle(id))?;
        self.with_backend(owner, |b| b.set_signal_value(&obj, value, action))?
    }

    fn signal(&self, id: ObjId, operation: &'static str) -> GpiResult<GpiObj> {
        let obj = self.object(id)?;
        if obj.is_signal() {
            Ok(obj)
        } else {
            Err(GpiError::Unsupported {
                operation,
                obj_type: obj.obj_type(),
            })
        }
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    /// Destroy every object and callback.
    ///
    /// Every [`ObjId`] and callback id issued so far is invalid afterwards.
    pub fn finalize(&self) {
        let objects = self.store.borrow_mut().clear();
        let released = objects.len();
        {
            let registry = self.registry.borrow();
            for obj in &objects {
                if let Some(backend) = obj.backend().and_then(|id| registry.get(id)) {
                    backend.release_handle(obj);
                }
            }
        }
        self.callbacks.clear();
        info!(objects = released, "finalized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operations_without_backend() {
        let gpi = Gpi::new();
        assert!(matches!(gpi.sim_time(), Err(GpiError::NoBackend)));
        assert_eq!(gpi.get_root_handle(None), None);
        assert!(gpi.iterate_packages().is_none());
        // Without a backend there is nothing to tell to stop.
        gpi.sim_end();
        assert!(gpi.is_ending());
    }

    #[test]
    fn test_stale_object_id_is_invalid_handle() {
        let gpi = Gpi::new();
        let bogus = ObjId::from_index(3);
        assert!(matches!(gpi.name(bogus), Err(GpiError::InvalidHandle(_))));
        assert!(matches!(
            gpi.get_handle_by_name(bogus, "x", LookupMode::Auto),
            Err(GpiError::InvalidHandle(_))
        ));
    }
}
