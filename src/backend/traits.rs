//! The capability contract every vendor backend implements.
//!
//! One implementation exists per vendor procedural interface. They are
//! siblings: the dispatch core selects among them through the ordered
//! registry at runtime, never through compile-time dispatch.

use std::fmt;

use crate::callback::CbId;
use crate::error::GpiResult;
use crate::object::{GpiObj, IterSelector, RawHandle, SetAction, SignalValue, ValueFormat};

/// Simulation time in simulator precision units.
pub type SimTime = u64;

/// Position of a backend in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BackendId(usize);

impl BackendId {
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub(crate) const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "backend#{}", self.0)
    }
}

/// How a backend discovers packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackageScan {
    /// The vendor enumerates packages directly.
    #[default]
    Direct,
    /// The vendor only enumerates top-level instances; packages are filtered
    /// out of that over-approximation.
    FilterInstances,
}

/// Vendor quirks the core must accommodate, keyed per backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The vendor accepts callback removal while any callback is firing.
    /// When false, removals requested during a reaction are deferred until
    /// the outermost reaction has drained.
    pub removal_in_callback: bool,
    /// Generate scopes are recognised by their `label[index]` names rather
    /// than through a dedicated scope-array object.
    pub gen_scope_name_heuristic: bool,
    /// Package discovery strategy.
    pub package_scan: PackageScan,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            removal_in_callback: true,
            gen_scope_name_heuristic: false,
            package_scan: PackageScan::Direct,
        }
    }
}

/// Simulation lifecycle phases a backend can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimPhase {
    /// Elaboration finished, time zero about to run.
    Start,
    /// The simulator is shutting down.
    End,
}

/// Why a native callback is being torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Removal {
    /// Still armed; the vendor must deregister it.
    Armed,
    /// A one-shot that already delivered its event; only bookkeeping remains.
    Fired,
}

/// Classification of one scanned native child.
#[derive(Debug)]
pub enum IterStep {
    /// Fully resolved by the owning backend.
    Native(GpiObj),
    /// Found but nameless; skipped.
    NativeNoName,
    /// Named, but the owning backend could not build it; other backends
    /// retry by name.
    NotNative {
        /// Short name reported by the vendor.
        name: String,
        /// Native reference, for diagnostics.
        raw: RawHandle,
    },
    /// Neither named nor buildable; other backends retry by raw reference.
    NotNativeNoName(RawHandle),
    /// Every relationship category is exhausted.
    End,
}

/// Lazy, one-directional cursor over one backend's children.
pub trait BackendIterator {
    /// Advance to the next classified child.
    ///
    /// Implementations move through their ordered relationship categories
    /// internally and only report [`IterStep::End`] once all are exhausted.
    fn next_step(&mut self) -> IterStep;
}

/// Capability contract for a vendor backend.
///
/// `native_check_create_*` return `None` when the child does not exist under
/// this backend; that is an expected outcome the dispatch core uses to try the
/// next backend, never an error.
pub trait Backend {
    /// Unique registry name (`"VPI"`, `"VHPI"`, ...).
    fn name(&self) -> &str;

    /// Vendor quirks.
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// Called once when the registry accepts this backend.
    ///
    /// Lookups may hand a backend a parent owned by another backend; the id
    /// lets it tell the two apart.
    fn on_registered(&self, _id: BackendId) {}

    /// Ask the simulator to finish.
    fn sim_end(&self);

    /// Current simulation time.
    fn sim_time(&self) -> SimTime;

    /// Time precision as a power of ten (e.g. `-12` for ps).
    fn sim_precision(&self) -> i32;

    #[allow(missing_docs)]
    fn simulator_product(&self) -> String;

    #[allow(missing_docs)]
    fn simulator_version(&self) -> String;

    /// Simulator command line, passed to the interpreter at startup.
    fn sim_args(&self) -> Vec<String> {
        Vec::new()
    }

    /// Find a top-level object, optionally by name.
    fn root_handle(&self, name: Option<&str>) -> Option<GpiObj>;

    /// Resolve `name` below `parent`.
    fn native_check_create_by_name(&self, name: &str, parent: &GpiObj) -> Option<GpiObj>;

    /// Resolve element `index` of `parent`.
    fn native_check_create_by_index(&self, index: i32, parent: &GpiObj) -> Option<GpiObj>;

    /// Build an object from a native reference found below `parent`.
    fn native_check_create_by_raw(&self, raw: RawHandle, parent: &GpiObj) -> Option<GpiObj>;

    /// Start iterating the children of `parent`.
    fn iterate_handle(&self, parent: &GpiObj, selector: IterSelector) -> Option<Box<dyn BackendIterator>>;

    /// Start iterating packages. Backends without package support return `None`.
    fn iterate_packages(&self) -> Option<Box<dyn BackendIterator>> {
        None
    }

    /// One-shot callback after `delay` time units.
    fn register_timed_callback(&self, cb: CbId, delay: SimTime) -> GpiResult<RawHandle>;

    /// Recurring callback on every value change of `signal`.
    fn register_value_change_callback(&self, cb: CbId, signal: &GpiObj) -> GpiResult<RawHandle>;

    /// One-shot callback in the read-only phase of the current time step.
    fn register_readonly_callback(&self, cb: CbId) -> GpiResult<RawHandle>;

    /// One-shot callback at the start of the next time step.
    fn register_nexttime_callback(&self, cb: CbId) -> GpiResult<RawHandle>;

    /// One-shot callback in the read-write phase of the current time step.
    fn register_readwrite_callback(&self, cb: CbId) -> GpiResult<RawHandle>;

    /// One-shot callback at a simulation lifecycle phase.
    fn register_phase_callback(&self, cb: CbId, phase: SimPhase) -> GpiResult<RawHandle>;

    /// Tear down a native callback. Returns false when the vendor refused.
    fn remove_callback(&self, native: RawHandle, removal: Removal) -> bool;

    /// Read a signal value in the requested format.
    fn get_signal_value(&self, signal: &GpiObj, format: ValueFormat) -> GpiResult<SignalValue>;

    /// Write a signal value.
    fn set_signal_value(&self, signal: &GpiObj, value: &SignalValue, action: SetAction) -> GpiResult<()>;

    /// Release the native reference of a candidate the identity store rejected.
    fn release_handle(&self, _obj: &GpiObj) {}

    /// Human-readable name of a vendor callback reason code.
    fn reason_to_string(&self, reason: i32) -> &'static str;
}
