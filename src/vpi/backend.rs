//! Backend over the Verilog procedural interface.

#![allow(non_upper_case_globals)]

use std::cell::Cell;

use tracing::{debug, trace};

use crate::backend::index::{child_fullname, indexed_name, join_name, split_indexed_label, IndexStyle};
use crate::backend::{Backend, BackendId, BackendIterator, Capabilities, PackageScan, Removal, SimPhase, SimTime};
use crate::callback::CbId;
use crate::error::{GpiError, GpiResult};
use crate::logging::{log_at, LogLevel};
use crate::object::{GpiObj, IndexRange, IterSelector, ObjType, RawHandle, SetAction, SignalValue, ValueFormat};

use super::api::{VpiApi, VpiCbData};
use super::defs::*;
use super::iter::{VpiIterator, VpiPackageIterator};

/// Registry name of the VPI backend.
pub const VPI_BACKEND_NAME: &str = "VPI";

/// Relationships scanned below a module, in order.
const MODULE_RELATIONS: &[i32] = &[
    vpiNet,
    vpiNetArray,
    vpiReg,
    vpiRegArray,
    vpiMemory,
    vpiIntegerVar,
    vpiIntVar,
    vpiLongIntVar,
    vpiRealVar,
    vpiStringVar,
    vpiEnumNet,
    vpiEnumVar,
    vpiStructNet,
    vpiStructVar,
    vpiBitVar,
    vpiParameter,
    vpiInterface,
    vpiInterfaceArray,
    vpiInternalScope,
];

/// Map a `vpi_chk_error` level onto the crate's severity scale.
#[must_use]
pub fn severity(level: i32) -> LogLevel {
    match level {
        vpiNotice => LogLevel::Info,
        vpiWarning => LogLevel::Warning,
        vpiSystem | vpiInternal => LogLevel::Critical,
        _ => LogLevel::Error,
    }
}

/// VPI implementation of [`Backend`].
#[derive(Debug, Clone)]
pub struct VpiBackend<A> {
    api: A,
    caps: Capabilities,
    id: Cell<Option<BackendId>>,
}

impl<A: VpiApi> VpiBackend<A> {
    /// Backend with the usual VPI quirks: removal inside callbacks is fine,
    /// generate scopes are found by name, packages hide among instances.
    #[must_use]
    pub fn new(api: A) -> Self {
        Self {
            api,
            caps: Capabilities {
                removal_in_callback: true,
                gen_scope_name_heuristic: true,
                package_scan: PackageScan::FilterInstances,
            },
            id: Cell::new(None),
        }
    }

    /// Override the vendor quirks, for simulators that deviate.
    #[must_use]
    pub fn with_capabilities(mut self, caps: Capabilities) -> Self {
        self.caps = caps;
        self
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Whether `obj` carries a handle from this backend's vendor.
    fn owns(&self, obj: &GpiObj) -> bool {
        match (self.id.get(), obj.backend()) {
            (Some(me), Some(owner)) => me == owner,
            _ => true,
        }
    }

    /// Log a pending vendor error at its mapped severity.
    fn check_error(&self) -> Option<String> {
        let info = self.api.chk_error()?;
        let location = match &info.file {
            Some(file) => format!(" ({file}:{})", info.line),
            None => String::new(),
        };
        log_at(severity(info.level), "vpi", &format!("{}{location}", info.message));
        Some(info.message)
    }

    fn vendor_error(&self, what: &str) -> GpiError {
        match self.check_error() {
            Some(message) => GpiError::vendor(VPI_BACKEND_NAME, format!("{what}: {message}")),
            None => GpiError::vendor(VPI_BACKEND_NAME, what),
        }
    }

    /// Unified type of a vendor object, plus whether it is constant.
    fn map_type(&self, raw: RawHandle, vpi_type: i32) -> Option<(ObjType, bool)> {
        let size = self.api.get(vpiSize, Some(raw));
        let vector = size > 1 || self.api.get(vpiVector, Some(raw)) == 1;

        let obj_type = match vpi_type {
            vpiNet | vpiNetBit | vpiReg | vpiRegBit | vpiMemoryWord | vpiBitVar => {
                if vector {
                    ObjType::LogicArray
                } else {
                    ObjType::Logic
                }
            }
            vpiIntegerVar | vpiIntVar | vpiLongIntVar => ObjType::Integer,
            vpiRealVar => ObjType::Real,
            vpiStringVar => ObjType::String,
            vpiEnumNet | vpiEnumVar => ObjType::Enum,
            vpiStructNet | vpiStructVar => ObjType::Structure,
            vpiNetArray | vpiRegArray | vpiMemory | vpiInterfaceArray => ObjType::Array,
            vpiGenScopeArray => ObjType::GenArray,
            vpiModule | vpiInterface | vpiGenScope | vpiNamedBegin | vpiNamedFork => ObjType::Module,
            vpiPackage => ObjType::Package,
            vpiParameter | vpiConstant => {
                let const_type = match self.api.get(vpiConstType, Some(raw)) {
                    vpiRealConst => ObjType::Real,
                    vpiStringConst => ObjType::String,
                    _ if vector => ObjType::LogicArray,
                    _ => ObjType::Logic,
                };
                return Some((const_type, true));
            }
            _ => return None,
        };
        Some((obj_type, false))
    }

    /// Build a candidate object, `None` for vendor types with no unified
    /// counterpart.
    pub(crate) fn create_obj(&self, raw: RawHandle, vpi_type: i32, name: &str, fullname: String) -> Option<GpiObj> {
        let Some((obj_type, is_const)) = self.map_type(raw, vpi_type) else {
            trace!(vpi_type, name, "no unified type for VPI object");
            return None;
        };

        let mut obj = GpiObj::new(raw, obj_type, name, fullname).constant(is_const);
        if let Some(type_str) = self.api.get_str(vpiType, raw) {
            obj = obj.with_type_str(type_str);
        }
        if obj_type.is_indexable() {
            if let Some((left, right)) = self.api.range(raw) {
                obj = obj.with_range(IndexRange::new(left, right));
            }
        }
        if obj_type == ObjType::Module {
            obj = obj.with_definition(self.api.get_str(vpiDefName, raw), self.api.get_str(vpiDefFile, raw));
        }
        Some(obj)
    }

    /// One pseudo-region standing for every `label[i]` scope below `parent`.
    pub(crate) fn pseudo_region(&self, native: RawHandle, label: &str, parent: &GpiObj) -> GpiObj {
        GpiObj::new(native, ObjType::GenArray, label, join_name(parent.fullname(), label))
            .with_type_str("vpiGenScopeArray")
    }

    /// Whether `parent` holds generate scopes named `label[i]`.
    fn has_generate_instances(&self, parent: &GpiObj, label: &str) -> bool {
        let Some(iter) = self.api.iterate(vpiInternalScope, Some(parent.native())) else {
            return false;
        };
        while let Some(scope) = self.api.scan(iter) {
            let is_instance = self.api.get(vpiType, Some(scope)) == vpiGenScope
                && self
                    .api
                    .get_str(vpiName, scope)
                    .is_some_and(|name| split_indexed_label(&name).is_some_and(|(l, _)| l == label));
            if is_instance {
                self.api.release_handle(iter);
                return true;
            }
        }
        false
    }

    fn register(&self, cb: CbId, reason: i32, obj: Option<RawHandle>, delay: Option<SimTime>) -> GpiResult<RawHandle> {
        let data = VpiCbData {
            reason,
            obj,
            delay,
            user_data: cb.to_user_data(),
        };
        self.api
            .register_cb(&data)
            .ok_or_else(|| self.vendor_error(&format!("{} registration failed", self.reason_to_string(reason))))
    }
}

impl<A: VpiApi> Backend for VpiBackend<A> {
    fn name(&self) -> &str {
        VPI_BACKEND_NAME
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn on_registered(&self, id: BackendId) {
        self.id.set(Some(id));
    }

    fn sim_end(&self) {
        if !self.api.control(vpiFinish) {
            self.check_error();
        }
    }

    fn sim_time(&self) -> SimTime {
        self.api.get_time()
    }

    fn sim_precision(&self) -> i32 {
        self.api.get(vpiTimePrecision, None)
    }

    fn simulator_product(&self) -> String {
        self.api.vlog_info().product
    }

    fn simulator_version(&self) -> String {
        self.api.vlog_info().version
    }

    fn sim_args(&self) -> Vec<String> {
        self.api.vlog_info().argv
    }

    fn root_handle(&self, name: Option<&str>) -> Option<GpiObj> {
        let Some(iter) = self.api.iterate(vpiModule, None) else {
            debug!("VPI reports no top-level modules");
            self.check_error();
            return None;
        };

        while let Some(root) = self.api.scan(iter) {
            let root_name = self.api.get_str(vpiName, root).unwrap_or_default();
            if name.is_some_and(|wanted| wanted != root_name) {
                self.api.release_handle(root);
                continue;
            }
            self.api.release_handle(iter);
            let fullname = self.api.get_str(vpiFullName, root).unwrap_or_else(|| root_name.clone());
            return self.create_obj(root, vpiModule, &root_name, fullname);
        }

        debug!(name = name.unwrap_or("<any>"), "no matching VPI root");
        None
    }

    fn native_check_create_by_name(&self, name: &str, parent: &GpiObj) -> Option<GpiObj> {
        if parent.obj_type() == ObjType::GenArray {
            // Instances of a pseudo-region are reached by index only.
            return None;
        }

        let fullname = join_name(parent.fullname(), name);
        if let Some(raw) = self.api.handle_by_name(&fullname, None) {
            let vpi_type = self.api.get(vpiType, Some(raw));
            if vpi_type == vpiGenScopeArray {
                return Some(self.pseudo_region(raw, name, parent));
            }
            let obj = self.create_obj(raw, vpi_type, name, fullname);
            if obj.is_none() {
                self.api.release_handle(raw);
            }
            return obj;
        }

        // Scanning for generate scopes needs a VPI scope handle.
        if self.caps.gen_scope_name_heuristic && self.owns(parent) && self.has_generate_instances(parent, name) {
            return Some(self.pseudo_region(parent.native(), name, parent));
        }
        None
    }

    fn native_check_create_by_index(&self, index: i32, parent: &GpiObj) -> Option<GpiObj> {
        let name = indexed_name(parent.name(), index, IndexStyle::Square);
        let fullname = indexed_name(parent.fullname(), index, IndexStyle::Square);

        let raw = if parent.obj_type() == ObjType::GenArray {
            // Loop generates cannot be indexed directly everywhere; go by name.
            self.api.handle_by_name(&fullname, None)?
        } else {
            if !parent.is_indexable() {
                return None;
            }
            if parent.range().is_some_and(|r| r.offset_of(index).is_none()) {
                debug!(parent = parent.fullname(), index, "index outside declared range");
                return None;
            }
            self.api
                .handle_by_index(parent.native(), index)
                .or_else(|| self.api.handle_by_name(&fullname, None))?
        };

        let vpi_type = self.api.get(vpiType, Some(raw));
        self.create_obj(raw, vpi_type, &name, fullname)
    }

    fn native_check_create_by_raw(&self, raw: RawHandle, parent: &GpiObj) -> Option<GpiObj> {
        let vpi_type = self.api.get(vpiType, Some(raw));
        if vpi_type == vpiUndefined {
            return None;
        }
        let name = self.api.get_str(vpiName, raw)?;
        let fullname = child_fullname(parent, &name, IndexStyle::Square);
        self.create_obj(raw, vpi_type, &name, fullname)
    }

    fn iterate_handle(&self, parent: &GpiObj, selector: IterSelector) -> Option<Box<dyn BackendIterator>> {
        let (relations, label) = match selector {
            IterSelector::Drivers | IterSelector::Loads if !parent.is_signal() => return None,
            IterSelector::Drivers => (vec![vpiDriver], None),
            IterSelector::Loads => (vec![vpiLoad], None),
            IterSelector::Objects => match parent.obj_type() {
                ObjType::Module => (MODULE_RELATIONS.to_vec(), None),
                ObjType::GenArray => (vec![vpiInternalScope], Some(parent.name().to_string())),
                ObjType::Structure => (vec![vpiMember], None),
                ObjType::Array | ObjType::NetArray | ObjType::Memory => {
                    let element = match self.api.get(vpiType, Some(parent.native())) {
                        vpiNetArray => vpiNet,
                        vpiRegArray => vpiReg,
                        vpiInterfaceArray => vpiInterface,
                        _ => vpiMemoryWord,
                    };
                    (vec![element], None)
                }
                other => {
                    trace!(obj_type = %other, "nothing to iterate");
                    return None;
                }
            },
        };

        Some(Box::new(VpiIterator::new(self.clone(), parent.clone(), relations, label)))
    }

    fn iterate_packages(&self) -> Option<Box<dyn BackendIterator>> {
        let (relation, filter) = match self.caps.package_scan {
            PackageScan::Direct => (vpiPackage, false),
            PackageScan::FilterInstances => (vpiInstance, true),
        };
        let iter = self.api.iterate(relation, None)?;
        Some(Box::new(VpiPackageIterator::new(self.clone(), iter, filter)))
    }

    fn register_timed_callback(&self, cb: CbId, delay: SimTime) -> GpiResult<RawHandle> {
        self.register(cb, cbAfterDelay, None, Some(delay))
    }

    fn register_value_change_callback(&self, cb: CbId, signal: &GpiObj) -> GpiResult<RawHandle> {
        self.register(cb, cbValueChange, Some(signal.native()), None)
    }

    fn register_readonly_callback(&self, cb: CbId) -> GpiResult<RawHandle> {
        self.register(cb, cbReadOnlySynch, None, Some(0))
    }

    fn register_nexttime_callback(&self, cb: CbId) -> GpiResult<RawHandle> {
        self.register(cb, cbNextSimTime, None, None)
    }

    fn register_readwrite_callback(&self, cb: CbId) -> GpiResult<RawHandle> {
        self.register(cb, cbReadWriteSynch, None, Some(0))
    }

    fn register_phase_callback(&self, cb: CbId, phase: SimPhase) -> GpiResult<RawHandle> {
        let reason = match phase {
            SimPhase::Start => cbStartOfSimulation,
            SimPhase::End => cbEndOfSimulation,
        };
        self.register(cb, reason, None, None)
    }

    fn remove_callback(&self, native: RawHandle, removal: Removal) -> bool {
        match removal {
            Removal::Armed => {
                let removed = self.api.remove_cb(native);
                if !removed {
                    self.check_error();
                }
                removed
            }
            Removal::Fired => {
                self.api.release_handle(native);
                true
            }
        }
    }

    fn get_signal_value(&self, signal: &GpiObj, format: ValueFormat) -> GpiResult<SignalValue> {
        self.api
            .get_value(signal.native(), format)
            .ok_or_else(|| self.vendor_error(&format!("reading {}", signal.fullname())))
    }

    fn set_signal_value(&self, signal: &GpiObj, value: &SignalValue, action: SetAction) -> GpiResult<()> {
        let flags = match action {
            SetAction::Deposit => vpiInertialDelay,
            SetAction::NoDelay => vpiNoDelay,
            SetAction::Force => vpiForceFlag,
            SetAction::Release => vpiReleaseFlag,
        };
        if self.api.put_value(signal.native(), value, flags) {
            Ok(())
        } else {
            Err(self.vendor_error(&format!("writing {}", signal.fullname())))
        }
    }

    fn release_handle(&self, obj: &GpiObj) {
        // Pseudo-regions may share their parent's native handle.
        if obj.obj_type() == ObjType::GenArray || !obj.partial_indices().is_empty() {
            return;
        }
        self.api.release_handle(obj.native());
    }

    fn reason_to_string(&self, reason: i32) -> &'static str {
        match reason {
            cbValueChange => "cbValueChange",
            cbAfterDelay => "cbAfterDelay",
            cbReadWriteSynch => "cbReadWriteSynch",
            cbReadOnlySynch => "cbReadOnlySynch",
            cbNextSimTime => "cbNextSimTime",
            cbStartOfSimulation => "cbStartOfSimulation",
            cbEndOfSimulation => "cbEndOfSimulation",
            _ => "unknown",
        }
    }
}
