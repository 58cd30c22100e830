//! Backend over the VHDL procedural interface.

#![allow(non_upper_case_globals)]

use std::cell::Cell;

use tracing::{debug, trace};

use crate::backend::index::{flatten_index, indexed_name, join_name, split_indexed_label, IndexStyle};
use crate::backend::{Backend, BackendId, BackendIterator, Capabilities, PackageScan, Removal, SimPhase, SimTime};
use crate::callback::CbId;
use crate::error::{GpiError, GpiResult};
use crate::logging::{log_at, LogLevel};
use crate::object::{GpiObj, IndexRange, IterSelector, ObjType, RawHandle, SetAction, SignalValue, ValueFormat};

use super::api::{VhpiApi, VhpiCbData};
use super::defs::*;
use super::iter::{VhpiIterator, VhpiPackageIterator};

/// Registry name of the VHPI backend.
pub const VHPI_BACKEND_NAME: &str = "VHPI";

/// Relationships scanned below a design region, in order.
const REGION_RELATIONS: &[i32] = &[
    vhpiSigDecls,
    vhpiPortDecls,
    vhpiGenericDecls,
    vhpiConstDecls,
    vhpiInternalRegions,
];

/// Enumeration types treated as logic values.
const LOGIC_TYPES: &[&str] = &["STD_ULOGIC", "STD_LOGIC", "BIT"];

/// Map a `vhpi_check_error` severity onto the crate's severity scale.
#[must_use]
pub fn severity(level: i32) -> LogLevel {
    match level {
        vhpiNote => LogLevel::Info,
        vhpiWarning => LogLevel::Warning,
        vhpiFailure | vhpiSystem | vhpiInternal => LogLevel::Critical,
        _ => LogLevel::Error,
    }
}

/// VHPI implementation of [`Backend`].
#[derive(Debug, Clone)]
pub struct VhpiBackend<A> {
    api: A,
    caps: Capabilities,
    id: Cell<Option<BackendId>>,
}

impl<A: VhpiApi> VhpiBackend<A> {
    /// Backend with the usual VHPI quirks: callbacks cannot be removed while
    /// one is firing, packages are enumerated directly.
    #[must_use]
    pub fn new(api: A) -> Self {
        Self {
            api,
            caps: Capabilities {
                removal_in_callback: false,
                gen_scope_name_heuristic: false,
                package_scan: PackageScan::Direct,
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

    fn check_error(&self) -> Option<String> {
        let info = self.api.check_error()?;
        let location = match &info.file {
            Some(file) => format!(" ({file}:{})", info.line),
            None => String::new(),
        };
        log_at(severity(info.severity), "vhpi", &format!("{}{location}", info.message));
        Some(info.message)
    }

    fn vendor_error(&self, what: &str) -> GpiError {
        match self.check_error() {
            Some(message) => GpiError::vendor(VHPI_BACKEND_NAME, format!("{what}: {message}")),
            None => GpiError::vendor(VHPI_BACKEND_NAME, what),
        }
    }

    /// Case-preserving name, falling back to the normalised one.
    pub(crate) fn name_of(&self, raw: RawHandle) -> Option<String> {
        self.api
            .get_str(vhpiCaseNameP, raw)
            .or_else(|| self.api.get_str(vhpiNameP, raw))
    }

    /// Unified type of a value-carrying object, from its base type.
    fn value_type(&self, raw: RawHandle) -> Option<ObjType> {
        let base = self.api.handle(vhpiBaseType, Some(raw))?;
        let type_name = |handle| {
            self.api
                .get_str(vhpiNameP, handle)
                .map(|n| n.to_ascii_uppercase())
                .unwrap_or_default()
        };

        let obj_type = match self.api.get(vhpiKindP, Some(base)) {
            vhpiEnumTypeDeclK if LOGIC_TYPES.contains(&type_name(base).as_str()) => ObjType::Logic,
            vhpiEnumTypeDeclK => ObjType::Enum,
            vhpiIntTypeDeclK | vhpiPhysTypeDeclK => ObjType::Integer,
            vhpiFloatTypeDeclK => ObjType::Real,
            vhpiRecordTypeDeclK => ObjType::Structure,
            vhpiArrayTypeDeclK => {
                let dims = self.api.get(vhpiNumDimensionsP, Some(base));
                let elem = self.api.handle(vhpiElemType, Some(base)).map(type_name).unwrap_or_default();
                match elem.as_str() {
                    _ if dims > 1 => ObjType::Array,
                    "CHARACTER" => ObjType::String,
                    e if LOGIC_TYPES.contains(&e) => ObjType::LogicArray,
                    _ => ObjType::Array,
                }
            }
            _ => return None,
        };
        Some(obj_type)
    }

    fn map_type(&self, raw: RawHandle, kind: i32) -> Option<(ObjType, bool)> {
        match kind {
            vhpiRootInstK | vhpiCompInstStmtK | vhpiBlockStmtK | vhpiIfGenerateK | vhpiForGenerateK => {
                Some((ObjType::Module, false))
            }
            vhpiPackInstK => Some((ObjType::Package, false)),
            vhpiSigDeclK | vhpiPortDeclK | vhpiVarDeclK | vhpiIndexedNameK | vhpiSelectedNameK => {
                self.value_type(raw).map(|t| (t, false))
            }
            vhpiConstDeclK | vhpiGenericDeclK => self.value_type(raw).map(|t| (t, true)),
            _ => None,
        }
    }

    /// Index constraints of an array object.
    pub(crate) fn dims(&self, raw: RawHandle) -> Vec<IndexRange> {
        self.api
            .constraints(raw)
            .into_iter()
            .map(|(left, right)| IndexRange::new(left, right))
            .collect()
    }

    pub(crate) fn create_obj(&self, raw: RawHandle, kind: i32, name: &str, fullname: String) -> Option<GpiObj> {
        let Some((obj_type, is_const)) = self.map_type(raw, kind) else {
            trace!(kind, name, "no unified type for VHPI object");
            return None;
        };

        let mut obj = GpiObj::new(raw, obj_type, name, fullname).constant(is_const);
        if let Some(kind_str) = self.api.get_str(vhpiKindStrP, raw) {
            obj = obj.with_type_str(kind_str);
        }
        match obj_type {
            ObjType::Array | ObjType::LogicArray => {
                if let Some(&outer) = self.dims(raw).first() {
                    obj = obj.with_range(outer);
                }
            }
            ObjType::Module => {
                obj = obj.with_definition(self.api.get_str(vhpiDefNameP, raw), self.api.get_str(vhpiFileNameP, raw));
            }
            _ => {}
        }
        Some(obj)
    }

    pub(crate) fn pseudo_region(&self, parent: &GpiObj, label: &str) -> GpiObj {
        GpiObj::new(parent.native(), ObjType::GenArray, label, join_name(parent.fullname(), label))
            .with_type_str("vhpiForGenerateK")
    }

    /// Declared label of the for-generate instances below `parent` that
    /// match `label` in any case.
    fn generate_label(&self, parent: &GpiObj, label: &str) -> Option<String> {
        let iter = self.api.iterator(vhpiInternalRegions, Some(parent.native()))?;
        while let Some(region) = self.api.scan(iter) {
            if self.api.get(vhpiKindP, Some(region)) != vhpiForGenerateK {
                continue;
            }
            let declared = self.name_of(region).and_then(|name| {
                split_indexed_label(&name)
                    .filter(|(l, _)| l.eq_ignore_ascii_case(label))
                    .map(|(l, _)| l.to_string())
            });
            if declared.is_some() {
                self.api.release_handle(iter);
                return declared;
            }
        }
        None
    }

    /// Element `index` of a (possibly partially indexed) array.
    ///
    /// Multi-dimensional arrays are only addressable by flat position. Until
    /// every dimension has an index the result is an intermediate object
    /// sharing the array's native handle.
    fn index_array(&self, index: i32, parent: &GpiObj, name: String, fullname: String) -> Option<GpiObj> {
        let dims = self.dims(parent.native());
        if dims.is_empty() {
            return None;
        }

        let mut indices = parent.partial_indices().to_vec();
        indices.push(index);
        let flat = flatten_index(&dims, &indices)?;

        if indices.len() < dims.len() {
            let sub = GpiObj::new(parent.native(), ObjType::Array, name, fullname)
                .with_range(dims[indices.len()])
                .with_type_str(parent.type_str())
                .with_partial_indices(indices);
            return Some(sub);
        }

        let raw = self
            .api
            .handle_by_index(vhpiIndexedNames, parent.native(), i32::try_from(flat).ok()?)?;
        let kind = self.api.get(vhpiKindP, Some(raw));
        self.create_obj(raw, kind, &name, fullname)
    }

    fn register(&self, cb: CbId, reason: i32, obj: Option<RawHandle>, delay: Option<SimTime>) -> GpiResult<RawHandle> {
        let data = VhpiCbData {
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

impl<A: VhpiApi> Backend for VhpiBackend<A> {
    fn name(&self) -> &str {
        VHPI_BACKEND_NAME
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn on_registered(&self, id: BackendId) {
        self.id.set(Some(id));
    }

    fn sim_end(&self) {
        if !self.api.control(vhpiFinish) {
            self.check_error();
        }
    }

    fn sim_time(&self) -> SimTime {
        self.api.get_time()
    }

    fn sim_precision(&self) -> i32 {
        self.api.get(vhpiResolutionLimitP, None)
    }

    fn simulator_product(&self) -> String {
        self.api.tool_info().product
    }

    fn simulator_version(&self) -> String {
        self.api.tool_info().version
    }

    fn sim_args(&self) -> Vec<String> {
        self.api.tool_info().argv
    }

    fn root_handle(&self, name: Option<&str>) -> Option<GpiObj> {
        let Some(root) = self.api.handle(vhpiRootInst, None) else {
            debug!("VHPI reports no root instance");
            self.check_error();
            return None;
        };

        let root_name = self.name_of(root).unwrap_or_default();
        // VHDL identifiers are case-insensitive.
        if name.is_some_and(|wanted| !wanted.eq_ignore_ascii_case(&root_name)) {
            debug!(wanted = name.unwrap_or_default(), found = %root_name, "VHPI root name mismatch");
            self.api.release_handle(root);
            return None;
        }
        self.create_obj(root, vhpiRootInstK, &root_name, root_name.clone())
    }

    fn native_check_create_by_name(&self, name: &str, parent: &GpiObj) -> Option<GpiObj> {
        if parent.obj_type() == ObjType::GenArray || !parent.partial_indices().is_empty() {
            return None;
        }

        let native_parent = self.owns(parent);
        let raw = if native_parent {
            self.api.handle_by_name(name, Some(parent.native()))
        } else {
            // A foreign parent's handle means nothing to VHPI; go by full path.
            self.api.handle_by_name(&join_name(parent.fullname(), name), None)
        };

        if let Some(raw) = raw {
            let kind = self.api.get(vhpiKindP, Some(raw));
            // Identifiers are case-insensitive; key the object by its declared spelling.
            let declared = self.name_of(raw).unwrap_or_else(|| name.to_string());
            let fullname = join_name(parent.fullname(), &declared);
            let obj = self.create_obj(raw, kind, &declared, fullname);
            if obj.is_none() {
                self.api.release_handle(raw);
            }
            return obj;
        }

        if !native_parent {
            return None;
        }
        // A for-generate label is not itself an object.
        let label = self.generate_label(parent, name)?;
        Some(self.pseudo_region(parent, &label))
    }

    fn native_check_create_by_index(&self, index: i32, parent: &GpiObj) -> Option<GpiObj> {
        let name = indexed_name(parent.name(), index, IndexStyle::Paren);
        let fullname = indexed_name(parent.fullname(), index, IndexStyle::Paren);

        match parent.obj_type() {
            ObjType::GenArray => {
                let raw = self.api.handle_by_name(&name, Some(parent.native()))?;
                let kind = self.api.get(vhpiKindP, Some(raw));
                self.create_obj(raw, kind, &name, fullname)
            }
            ObjType::Array | ObjType::LogicArray => self.index_array(index, parent, name, fullname),
            other => {
                trace!(obj_type = %other, "not indexable under VHPI");
                None
            }
        }
    }

    fn native_check_create_by_raw(&self, raw: RawHandle, parent: &GpiObj) -> Option<GpiObj> {
        let kind = self.api.get(vhpiKindP, Some(raw));
        if kind == vhpiUndefined {
            return None;
        }
        let name = self.name_of(raw)?;
        let fullname = crate::backend::index::child_fullname(parent, &name, IndexStyle::Paren);
        self.create_obj(raw, kind, &name, fullname)
    }

    fn iterate_handle(&self, parent: &GpiObj, selector: IterSelector) -> Option<Box<dyn BackendIterator>> {
        let (relations, label) = match selector {
            IterSelector::Drivers if parent.is_signal() => (vec![vhpiDrivers], None),
            IterSelector::Drivers | IterSelector::Loads => {
                trace!(?selector, "relationship not available under VHPI");
                return None;
            }
            IterSelector::Objects => match parent.obj_type() {
                _ if !parent.partial_indices().is_empty() => return None,
                ObjType::Module => (REGION_RELATIONS.to_vec(), None),
                ObjType::GenArray => (vec![vhpiInternalRegions], Some(parent.name().to_string())),
                ObjType::Structure => (vec![vhpiSelectedNames], None),
                ObjType::Array => (vec![vhpiIndexedNames], None),
                other => {
                    trace!(obj_type = %other, "nothing to iterate");
                    return None;
                }
            },
        };

        Some(Box::new(VhpiIterator::new(self.clone(), parent.clone(), relations, label)))
    }

    fn iterate_packages(&self) -> Option<Box<dyn BackendIterator>> {
        let (relation, filter) = match self.caps.package_scan {
            PackageScan::Direct => (vhpiPackInsts, false),
            PackageScan::FilterInstances => (vhpiInternalRegions, true),
        };
        let iter = self.api.iterator(relation, None)?;
        Some(Box::new(VhpiPackageIterator::new(self.clone(), iter, filter)))
    }

    fn register_timed_callback(&self, cb: CbId, delay: SimTime) -> GpiResult<RawHandle> {
        self.register(cb, vhpiCbAfterDelay, None, Some(delay))
    }

    fn register_value_change_callback(&self, cb: CbId, signal: &GpiObj) -> GpiResult<RawHandle> {
        self.register(cb, vhpiCbValueChange, Some(signal.native()), None)
    }

    fn register_readonly_callback(&self, cb: CbId) -> GpiResult<RawHandle> {
        self.register(cb, vhpiCbLastKnownDeltaCycle, None, None)
    }

    fn register_nexttime_callback(&self, cb: CbId) -> GpiResult<RawHandle> {
        self.register(cb, vhpiCbNextTimeStep, None, None)
    }

    fn register_readwrite_callback(&self, cb: CbId) -> GpiResult<RawHandle> {
        self.register(cb, vhpiCbEndOfProcesses, None, None)
    }

    fn register_phase_callback(&self, cb: CbId, phase: SimPhase) -> GpiResult<RawHandle> {
        let reason = match phase {
            SimPhase::Start => vhpiCbStartOfSimulation,
            SimPhase::End => vhpiCbEndOfSimulation,
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
        let mode = match action {
            SetAction::Deposit => vhpiDeposit,
            SetAction::NoDelay => vhpiDepositPropagate,
            SetAction::Force => vhpiForcePropagate,
            SetAction::Release => vhpiRelease,
        };
        if self.api.put_value(signal.native(), value, mode) {
            Ok(())
        } else {
            Err(self.vendor_error(&format!("writing {}", signal.fullname())))
        }
    }

    fn release_handle(&self, obj: &GpiObj) {
        if obj.obj_type() == ObjType::GenArray || !obj.partial_indices().is_empty() {
            return;
        }
        self.api.release_handle(obj.native());
    }

    fn reason_to_string(&self, reason: i32) -> &'static str {
        match reason {
            vhpiCbValueChange => "vhpiCbValueChange",
            vhpiCbAfterDelay => "vhpiCbAfterDelay",
            vhpiCbEndOfProcesses => "vhpiCbEndOfProcesses",
            vhpiCbNextTimeStep => "vhpiCbNextTimeStep",
            vhpiCbLastKnownDeltaCycle => "vhpiCbLastKnownDeltaCycle",
            vhpiCbStartOfSimulation => "vhpiCbStartOfSimulation",
            vhpiCbEndOfSimulation => "vhpiCbEndOfSimulation",
            _ => "unknown",
        }
    }
}
