//! Shared fixtures: in-memory vendor models and a scripted backend.

#![allow(dead_code, non_upper_case_globals)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use simgpi::backend::index::join_name;
use simgpi::vhpi::defs::*;
use simgpi::vhpi::{ToolInfo, VhpiApi, VhpiCbData, VhpiErrorInfo};
use simgpi::vpi::defs::*;
use simgpi::vpi::{VlogInfo, VpiApi, VpiCbData, VpiErrorInfo};
use simgpi::{
    Backend, BackendIterator, Capabilities, CbId, EmbedBridge, Gpi, GpiError, GpiObj, GpiResult, IterSelector,
    IterStep, ObjType, RawHandle, Removal, SetAction, SignalValue, SimEvent, SimPhase, SimTime, ValueFormat,
};

const ITER_BASE: u64 = 10_000;
const CB_BASE: u64 = 20_000;

// ----------------------------------------------------------------------
// VPI model
// ----------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct VpiNode {
    pub name: Option<String>,
    pub fullname: String,
    pub vpi_type: i32,
    /// Relationship of the parent this node is found through.
    pub relation: i32,
    pub parent: Option<u64>,
    pub size: i32,
    pub range: Option<(i32, i32)>,
    pub value: String,
}

#[derive(Debug, Default)]
pub struct VpiModel {
    pub nodes: Vec<VpiNode>,
    pub iterators: HashMap<u64, VecDeque<u64>>,
    pub next_iter: u64,
    pub callbacks: Vec<(u64, VpiCbData)>,
    pub removed: Vec<u64>,
    pub released: Vec<u64>,
    pub finished: u32,
    pub time: u64,
    pub refuse_removal: bool,
    pub puts: Vec<(u64, SignalValue, i32)>,
}

/// In-memory VPI. Handles are node positions plus one.
#[derive(Debug, Clone, Default)]
pub struct FakeVpi {
    pub model: Rc<RefCell<VpiModel>>,
}

impl FakeVpi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; top-level when `parent` is `None`.
    pub fn add(&self, parent: Option<u64>, name: &str, vpi_type: i32) -> u64 {
        let mut model = self.model.borrow_mut();
        let fullname = match parent {
            Some(p) => {
                let parent = &model.nodes[(p - 1) as usize];
                // Array words are named `mem[3]` and live at `top.mem[3]`.
                match (parent.name.as_deref(), name.find('[')) {
                    (Some(label), Some(at)) if &name[..at] == label && parent.vpi_type != vpiModule => {
                        format!("{}{}", parent.fullname, &name[at..])
                    }
                    _ => join_name(&parent.fullname, name),
                }
            }
            None => name.to_string(),
        };
        let relation = match vpi_type {
            vpiGenScope | vpiGenScopeArray | vpiModule => vpiInternalScope,
            other => other,
        };
        model.nodes.push(VpiNode {
            name: Some(name.to_string()),
            fullname,
            vpi_type,
            relation,
            parent,
            size: 1,
            range: None,
            value: "0".to_string(),
        });
        model.nodes.len() as u64
    }

    /// A child owned by another language: VPI sees it but cannot type it.
    pub fn add_foreign(&self, parent: u64, name: &str) -> u64 {
        let handle = self.add(Some(parent), name, vpiUndefined);
        self.model.borrow_mut().nodes[(handle - 1) as usize].relation = vpiInternalScope;
        handle
    }

    pub fn add_nameless(&self, parent: u64, vpi_type: i32) -> u64 {
        let handle = self.add(Some(parent), "", vpi_type);
        self.model.borrow_mut().nodes[(handle - 1) as usize].name = None;
        handle
    }

    pub fn set_size(&self, handle: u64, size: i32) {
        self.model.borrow_mut().nodes[(handle - 1) as usize].size = size;
    }

    pub fn set_range(&self, handle: u64, left: i32, right: i32) {
        self.model.borrow_mut().nodes[(handle - 1) as usize].range = Some((left, right));
    }

    pub fn set_value(&self, handle: u64, value: &str) {
        self.model.borrow_mut().nodes[(handle - 1) as usize].value = value.to_string();
    }

    pub fn value(&self, handle: u64) -> String {
        self.model.borrow().nodes[(handle - 1) as usize].value.clone()
    }

    /// Fire every registered callback with `reason`, returning how many fired.
    pub fn fire_reason(&self, gpi: &Gpi, reason: i32) -> usize {
        let words: Vec<u64> = self
            .model
            .borrow()
            .callbacks
            .iter()
            .filter(|(_, data)| data.reason == reason)
            .map(|(_, data)| data.user_data)
            .collect();
        for word in &words {
            let _ = gpi.handle_raw_callback(*word);
        }
        words.len()
    }

    fn node(&self, handle: RawHandle) -> Option<VpiNode> {
        let index = handle.get().checked_sub(1)? as usize;
        self.model.borrow().nodes.get(index).cloned()
    }

    fn open_iter(&self, members: VecDeque<u64>) -> Option<RawHandle> {
        if members.is_empty() {
            return None;
        }
        let mut model = self.model.borrow_mut();
        model.next_iter += 1;
        let handle = ITER_BASE + model.next_iter;
        model.iterators.insert(handle, members);
        Some(RawHandle::new(handle))
    }
}

impl VpiApi for FakeVpi {
    fn handle_by_name(&self, name: &str, _scope: Option<RawHandle>) -> Option<RawHandle> {
        let model = self.model.borrow();
        model
            .nodes
            .iter()
            .position(|n| n.fullname == name)
            .map(|i| RawHandle::new(i as u64 + 1))
    }

    fn handle_by_index(&self, obj: RawHandle, index: i32) -> Option<RawHandle> {
        let parent = self.node(obj)?;
        let wanted = format!("{}[{index}]", parent.fullname);
        self.handle_by_name(&wanted, None)
    }

    fn iterate(&self, relation: i32, obj: Option<RawHandle>) -> Option<RawHandle> {
        let members: VecDeque<u64> = {
            let model = self.model.borrow();
            model
                .nodes
                .iter()
                .enumerate()
                .filter(|(_, n)| match obj {
                    Some(parent) => n.parent == Some(parent.get()) && n.relation == relation,
                    None if relation == vpiInstance => {
                        n.parent.is_none() && matches!(n.vpi_type, vpiModule | vpiPackage)
                    }
                    None => n.parent.is_none() && n.vpi_type == relation,
                })
                .map(|(i, _)| i as u64 + 1)
                .collect()
        };
        self.open_iter(members)
    }

    fn scan(&self, iterator: RawHandle) -> Option<RawHandle> {
        let mut model = self.model.borrow_mut();
        let queue = model.iterators.get_mut(&iterator.get())?;
        match queue.pop_front() {
            Some(next) => Some(RawHandle::new(next)),
            None => {
                model.iterators.remove(&iterator.get());
                None
            }
        }
    }

    fn get(&self, property: i32, obj: Option<RawHandle>) -> i32 {
        if property == vpiTimePrecision {
            return -12;
        }
        let Some(node) = obj.and_then(|h| self.node(h)) else {
            return vpiUndefined;
        };
        match property {
            vpiType => node.vpi_type,
            vpiSize => node.size,
            vpiVector => i32::from(node.size > 1),
            _ => vpiUndefined,
        }
    }

    fn get_str(&self, property: i32, obj: RawHandle) -> Option<String> {
        let node = self.node(obj)?;
        match property {
            vpiName => node.name,
            vpiFullName => Some(node.fullname),
            vpiType => Some(format!("vpiType{}", node.vpi_type)),
            vpiDefName if node.vpi_type == vpiModule => Some(format!("{}_def", node.name?)),
            _ => None,
        }
    }

    fn range(&self, obj: RawHandle) -> Option<(i32, i32)> {
        self.node(obj)?.range
    }

    fn get_time(&self) -> SimTime {
        self.model.borrow().time
    }

    fn register_cb(&self, data: &VpiCbData) -> Option<RawHandle> {
        let mut model = self.model.borrow_mut();
        let handle = CB_BASE + model.callbacks.len() as u64 + 1;
        model.callbacks.push((handle, *data));
        Some(RawHandle::new(handle))
    }

    fn remove_cb(&self, cb: RawHandle) -> bool {
        let mut model = self.model.borrow_mut();
        if model.refuse_removal {
            return false;
        }
        model.callbacks.retain(|(h, _)| *h != cb.get());
        model.removed.push(cb.get());
        true
    }

    fn release_handle(&self, obj: RawHandle) -> bool {
        let mut model = self.model.borrow_mut();
        model.iterators.remove(&obj.get());
        model.callbacks.retain(|(h, _)| *h != obj.get());
        model.released.push(obj.get());
        true
    }

    fn control(&self, command: i32) -> bool {
        if command == vpiFinish {
            self.model.borrow_mut().finished += 1;
        }
        true
    }

    fn chk_error(&self) -> Option<VpiErrorInfo> {
        None
    }

    fn get_value(&self, obj: RawHandle, format: ValueFormat) -> Option<SignalValue> {
        let node = self.node(obj)?;
        match format {
            ValueFormat::BinStr => Some(SignalValue::BinStr(node.value)),
            ValueFormat::Str => Some(SignalValue::Str(node.value)),
            ValueFormat::Long => i64::from_str_radix(&node.value, 2).ok().map(SignalValue::Long),
            ValueFormat::Real => None,
        }
    }

    fn put_value(&self, obj: RawHandle, value: &SignalValue, flags: i32) -> bool {
        let text = match value {
            SignalValue::BinStr(s) | SignalValue::Str(s) => s.clone(),
            SignalValue::Long(v) => format!("{v:b}"),
            SignalValue::Real(_) => return false,
        };
        let mut model = self.model.borrow_mut();
        let Some(node) = (obj.get() as usize).checked_sub(1).and_then(|i| model.nodes.get_mut(i)) else {
            return false;
        };
        node.value = text;
        model.puts.push((obj.get(), value.clone(), flags));
        true
    }

    fn vlog_info(&self) -> VlogInfo {
        VlogInfo {
            product: "FakeVerilog".to_string(),
            version: "1.0".to_string(),
            argv: vec!["fakesim".to_string(), "+vpi".to_string()],
        }
    }
}

// ----------------------------------------------------------------------
// VHPI model
// ----------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct VhpiNode {
    pub name: String,
    pub kind: i32,
    pub relation: i32,
    pub parent: Option<u64>,
    pub base_type: Option<u64>,
    pub elem_type: Option<u64>,
    pub dims: Vec<(i32, i32)>,
    pub value: String,
}

#[derive(Debug, Default)]
pub struct VhpiModel {
    pub nodes: Vec<VhpiNode>,
    pub iterators: HashMap<u64, VecDeque<u64>>,
    pub next_iter: u64,
    pub callbacks: Vec<(u64, VhpiCbData)>,
    pub removed: Vec<u64>,
    pub released: Vec<u64>,
    pub finished: u32,
    pub puts: Vec<(u64, i32)>,
}

/// In-memory VHPI. Handles are node positions plus one.
#[derive(Debug, Clone, Default)]
pub struct FakeVhpi {
    pub model: Rc<RefCell<VhpiModel>>,
}

impl FakeVhpi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, parent: Option<u64>, name: &str, kind: i32, relation: i32) -> u64 {
        let mut model = self.model.borrow_mut();
        model.nodes.push(VhpiNode {
            name: name.to_string(),
            kind,
            relation,
            parent,
            base_type: None,
            elem_type: None,
            dims: Vec::new(),
            value: "0".to_string(),
        });
        model.nodes.len() as u64
    }

    /// A type declaration.
    pub fn add_type(&self, name: &str, kind: i32) -> u64 {
        self.add(None, name, kind, vhpiUndefined)
    }

    /// An array type with `dims` dimensions of `elem`.
    pub fn add_array_type(&self, name: &str, elem: u64, dims: usize) -> u64 {
        let handle = self.add_type(name, vhpiArrayTypeDeclK);
        let mut model = self.model.borrow_mut();
        let node = &mut model.nodes[(handle - 1) as usize];
        node.elem_type = Some(elem);
        node.dims = vec![(0, 0); dims];
        handle
    }

    /// A declared object of type `base`.
    pub fn add_decl(&self, parent: u64, name: &str, kind: i32, relation: i32, base: u64) -> u64 {
        let handle = self.add(Some(parent), name, kind, relation);
        self.model.borrow_mut().nodes[(handle - 1) as usize].base_type = Some(base);
        handle
    }

    pub fn set_dims(&self, handle: u64, dims: &[(i32, i32)]) {
        self.model.borrow_mut().nodes[(handle - 1) as usize].dims = dims.to_vec();
    }

    /// Element objects of `array`, in flat order.
    pub fn add_elements(&self, array: u64, count: usize, elem_type: u64) -> Vec<u64> {
        (0..count)
            .map(|i| self.add_decl(array, &format!("elem{i}"), vhpiIndexedNameK, vhpiIndexedNames, elem_type))
            .collect()
    }

    pub fn set_value(&self, handle: u64, value: &str) {
        self.model.borrow_mut().nodes[(handle - 1) as usize].value = value.to_string();
    }

    fn node(&self, handle: RawHandle) -> Option<VhpiNode> {
        let index = handle.get().checked_sub(1)? as usize;
        self.model.borrow().nodes.get(index).cloned()
    }

    fn children(&self, parent: u64, relation: i32) -> Vec<u64> {
        self.model
            .borrow()
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.parent == Some(parent) && n.relation == relation)
            .map(|(i, _)| i as u64 + 1)
            .collect()
    }
}

impl VhpiApi for FakeVhpi {
    fn handle_by_name(&self, name: &str, scope: Option<RawHandle>) -> Option<RawHandle> {
        let model = self.model.borrow();
        let child_of = |parent: Option<u64>, label: &str| {
            model
                .nodes
                .iter()
                .position(|n| n.parent == parent && n.name.eq_ignore_ascii_case(label))
                .map(|i| i as u64 + 1)
        };
        match scope {
            Some(scope) => child_of(Some(scope.get()), name).map(RawHandle::new),
            // Without a scope the name is a full path from a top-level node.
            None => {
                let mut segments = name.split('.');
                let first = child_of(None, segments.next()?)?;
                segments
                    .try_fold(first, |parent, label| child_of(Some(parent), label))
                    .map(RawHandle::new)
            }
        }
    }

    fn handle_by_index(&self, relation: i32, parent: RawHandle, index: i32) -> Option<RawHandle> {
        let index = usize::try_from(index).ok()?;
        self.children(parent.get(), relation)
            .get(index)
            .map(|&h| RawHandle::new(h))
    }

    fn handle(&self, relation: i32, object: Option<RawHandle>) -> Option<RawHandle> {
        match relation {
            vhpiRootInst => {
                let model = self.model.borrow();
                model
                    .nodes
                    .iter()
                    .position(|n| n.kind == vhpiRootInstK)
                    .map(|i| RawHandle::new(i as u64 + 1))
            }
            vhpiBaseType => self.node(object?)?.base_type.map(RawHandle::new),
            vhpiElemType => self.node(object?)?.elem_type.map(RawHandle::new),
            _ => None,
        }
    }

    fn iterator(&self, relation: i32, object: Option<RawHandle>) -> Option<RawHandle> {
        let members: VecDeque<u64> = match object {
            Some(parent) => self.children(parent.get(), relation).into(),
            None => {
                let model = self.model.borrow();
                model
                    .nodes
                    .iter()
                    .enumerate()
                    .filter(|(_, n)| n.parent.is_none() && n.relation == relation)
                    .map(|(i, _)| i as u64 + 1)
                    .collect()
            }
        };
        if members.is_empty() {
            return None;
        }
        let mut model = self.model.borrow_mut();
        model.next_iter += 1;
        let handle = ITER_BASE + model.next_iter;
        model.iterators.insert(handle, members);
        Some(RawHandle::new(handle))
    }

    fn scan(&self, iterator: RawHandle) -> Option<RawHandle> {
        let mut model = self.model.borrow_mut();
        let queue = model.iterators.get_mut(&iterator.get())?;
        match queue.pop_front() {
            Some(next) => Some(RawHandle::new(next)),
            None => {
                model.iterators.remove(&iterator.get());
                None
            }
        }
    }

    fn get(&self, property: i32, object: Option<RawHandle>) -> i32 {
        if property == vhpiResolutionLimitP {
            return -15;
        }
        let Some(node) = object.and_then(|h| self.node(h)) else {
            return vhpiUndefined;
        };
        match property {
            vhpiKindP => node.kind,
            vhpiNumDimensionsP => node.dims.len() as i32,
            _ => vhpiUndefined,
        }
    }

    fn get_str(&self, property: i32, object: RawHandle) -> Option<String> {
        let node = self.node(object)?;
        match property {
            vhpiCaseNameP | vhpiNameP => Some(node.name),
            vhpiKindStrP => Some(format!("vhpiKind{}", node.kind)),
            vhpiDefNameP if node.kind == vhpiRootInstK => Some(format!("{}_ent", node.name.to_ascii_lowercase())),
            _ => None,
        }
    }

    fn constraints(&self, object: RawHandle) -> Vec<(i32, i32)> {
        self.node(object).map(|n| n.dims).unwrap_or_default()
    }

    fn get_time(&self) -> SimTime {
        0
    }

    fn register_cb(&self, data: &VhpiCbData) -> Option<RawHandle> {
        let mut model = self.model.borrow_mut();
        let handle = CB_BASE + model.callbacks.len() as u64 + 1;
        model.callbacks.push((handle, *data));
        Some(RawHandle::new(handle))
    }

    fn remove_cb(&self, cb: RawHandle) -> bool {
        let mut model = self.model.borrow_mut();
        model.callbacks.retain(|(h, _)| *h != cb.get());
        model.removed.push(cb.get());
        true
    }

    fn release_handle(&self, object: RawHandle) -> bool {
        let mut model = self.model.borrow_mut();
        model.iterators.remove(&object.get());
        model.released.push(object.get());
        true
    }

    fn control(&self, command: i32) -> bool {
        if command == vhpiFinish {
            self.model.borrow_mut().finished += 1;
        }
        true
    }

    fn check_error(&self) -> Option<VhpiErrorInfo> {
        None
    }

    fn get_value(&self, object: RawHandle, format: ValueFormat) -> Option<SignalValue> {
        let node = self.node(object)?;
        match format {
            ValueFormat::BinStr => Some(SignalValue::BinStr(node.value)),
            _ => None,
        }
    }

    fn put_value(&self, object: RawHandle, value: &SignalValue, mode: i32) -> bool {
        let SignalValue::BinStr(text) = value else {
            return false;
        };
        let mut model = self.model.borrow_mut();
        let Some(node) = (object.get() as usize).checked_sub(1).and_then(|i| model.nodes.get_mut(i)) else {
            return false;
        };
        node.value = text.clone();
        model.puts.push((object.get(), mode));
        true
    }

    fn tool_info(&self) -> ToolInfo {
        ToolInfo {
            product: "FakeVhdl".to_string(),
            version: "2.0".to_string(),
            argv: vec!["fakevhdl".to_string()],
        }
    }
}

// ----------------------------------------------------------------------
// Scripted backend
// ----------------------------------------------------------------------

/// How a scripted parent reports one of its children during iteration.
#[derive(Debug, Clone)]
pub enum Child {
    /// Built by this backend; must also be declared with `add_object`.
    Native(String),
    /// Found but nameless.
    Nameless,
    /// Named, but only another backend can build it.
    Foreign(String),
    /// Nameless; another backend may build it from the raw reference.
    ForeignRaw(u64),
}

#[derive(Debug, Default)]
pub struct ScriptState {
    pub root: Option<String>,
    pub objects: HashMap<String, (u64, ObjType)>,
    pub raw_objects: HashMap<u64, (String, ObjType)>,
    pub children: HashMap<String, Vec<Child>>,
    pub values: HashMap<u64, String>,
    pub next_handle: u64,
    /// Armed native callback handle to its user-data word.
    pub armed: HashMap<u64, u64>,
    pub registrations: Vec<(u64, &'static str)>,
    pub removals: Vec<(u64, Removal)>,
    pub refuse_removal: bool,
    pub refuse_registration: bool,
    pub end_requests: u32,
    pub released: Vec<u64>,
    pub name_lookups: u32,
}

/// A backend whose world is declared by the test.
#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    name: String,
    caps: Capabilities,
    pub state: Rc<RefCell<ScriptState>>,
}

impl ScriptedBackend {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            caps: Capabilities::default(),
            state: Rc::new(RefCell::new(ScriptState {
                next_handle: 100,
                ..ScriptState::default()
            })),
        }
    }

    pub fn with_capabilities(mut self, caps: Capabilities) -> Self {
        self.caps = caps;
        self
    }

    pub fn boxed(&self) -> Box<dyn Backend> {
        Box::new(self.clone())
    }

    pub fn set_root(&self, name: &str) -> RawHandle {
        self.state.borrow_mut().root = Some(name.to_string());
        self.add_object(name, ObjType::Module)
    }

    /// Declare an object this backend can build by name.
    pub fn add_object(&self, fullname: &str, obj_type: ObjType) -> RawHandle {
        let mut state = self.state.borrow_mut();
        state.next_handle += 1;
        let handle = state.next_handle;
        state.objects.insert(fullname.to_string(), (handle, obj_type));
        RawHandle::new(handle)
    }

    /// Declare an object this backend can build from a raw reference.
    pub fn add_raw(&self, raw: u64, name: &str, obj_type: ObjType) {
        self.state
            .borrow_mut()
            .raw_objects
            .insert(raw, (name.to_string(), obj_type));
    }

    pub fn set_children(&self, parent: &str, children: Vec<Child>) {
        self.state.borrow_mut().children.insert(parent.to_string(), children);
    }

    pub fn set_value(&self, native: RawHandle, value: &str) {
        self.state.borrow_mut().values.insert(native.get(), value.to_string());
    }

    /// Native handles registered for `reason`, oldest first.
    pub fn registered(&self, reason: &str) -> Vec<RawHandle> {
        self.state
            .borrow()
            .registrations
            .iter()
            .filter(|(_, r)| *r == reason)
            .map(|(h, _)| RawHandle::new(*h))
            .collect()
    }

    /// Deliver a vendor firing for an armed native callback.
    pub fn fire(&self, gpi: &Gpi, native: RawHandle) -> GpiResult<()> {
        let word = self.state.borrow().armed.get(&native.get()).copied();
        match word {
            Some(word) => gpi.handle_raw_callback(word),
            None => Ok(()),
        }
    }

    /// Fire the vendor callback behind `id`.
    pub fn fire_cb(&self, gpi: &Gpi, id: CbId) -> GpiResult<()> {
        match gpi.callbacks().native(id) {
            Some(native) => self.fire(gpi, native),
            None => Ok(()),
        }
    }

    pub fn removals(&self) -> Vec<(u64, Removal)> {
        self.state.borrow().removals.clone()
    }

    pub fn end_requests(&self) -> u32 {
        self.state.borrow().end_requests
    }

    fn build(&self, name: &str, fullname: String) -> Option<GpiObj> {
        let state = self.state.borrow();
        let &(handle, obj_type) = state.objects.get(&fullname)?;
        Some(GpiObj::new(RawHandle::new(handle), obj_type, name, fullname))
    }

    fn arm(&self, cb: CbId, reason: &'static str) -> GpiResult<RawHandle> {
        let mut state = self.state.borrow_mut();
        if state.refuse_registration {
            return Err(GpiError::vendor(self.name.clone(), format!("{reason} refused")));
        }
        state.next_handle += 1;
        let handle = state.next_handle;
        state.armed.insert(handle, cb.to_user_data());
        state.registrations.push((handle, reason));
        Ok(RawHandle::new(handle))
    }
}

struct ScriptedIterator {
    steps: VecDeque<IterStep>,
}

impl BackendIterator for ScriptedIterator {
    fn next_step(&mut self) -> IterStep {
        self.steps.pop_front().unwrap_or(IterStep::End)
    }
}

impl Backend for ScriptedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn sim_end(&self) {
        self.state.borrow_mut().end_requests += 1;
    }

    fn sim_time(&self) -> SimTime {
        42
    }

    fn sim_precision(&self) -> i32 {
        -12
    }

    fn simulator_product(&self) -> String {
        format!("{}-sim", self.name)
    }

    fn simulator_version(&self) -> String {
        "0.1".to_string()
    }

    fn sim_args(&self) -> Vec<String> {
        vec!["sim".to_string(), "+test".to_string()]
    }

    fn root_handle(&self, name: Option<&str>) -> Option<GpiObj> {
        let root = self.state.borrow().root.clone()?;
        if name.is_some_and(|wanted| wanted != root) {
            return None;
        }
        self.build(&root, root.clone())
    }

    fn native_check_create_by_name(&self, name: &str, parent: &GpiObj) -> Option<GpiObj> {
        self.state.borrow_mut().name_lookups += 1;
        self.build(name, join_name(parent.fullname(), name))
    }

    fn native_check_create_by_index(&self, index: i32, parent: &GpiObj) -> Option<GpiObj> {
        self.build(&format!("{}[{index}]", parent.name()), format!("{}[{index}]", parent.fullname()))
    }

    fn native_check_create_by_raw(&self, raw: RawHandle, parent: &GpiObj) -> Option<GpiObj> {
        let (name, obj_type) = self.state.borrow().raw_objects.get(&raw.get()).cloned()?;
        let fullname = join_name(parent.fullname(), &name);
        Some(GpiObj::new(raw, obj_type, name, fullname))
    }

    fn iterate_handle(&self, parent: &GpiObj, selector: IterSelector) -> Option<Box<dyn BackendIterator>> {
        if selector != IterSelector::Objects {
            return None;
        }
        let children = self.state.borrow().children.get(parent.fullname()).cloned()?;
        let steps = children
            .into_iter()
            .map(|child| match child {
                Child::Native(name) => {
                    let fullname = join_name(parent.fullname(), &name);
                    self.build(&name, fullname)
                        .map_or(IterStep::NativeNoName, IterStep::Native)
                }
                Child::Nameless => IterStep::NativeNoName,
                Child::Foreign(name) => IterStep::NotNative {
                    name,
                    raw: RawHandle::new(0),
                },
                Child::ForeignRaw(raw) => IterStep::NotNativeNoName(RawHandle::new(raw)),
            })
            .collect();
        Some(Box::new(ScriptedIterator { steps }))
    }

    fn register_timed_callback(&self, cb: CbId, _delay: SimTime) -> GpiResult<RawHandle> {
        self.arm(cb, "timed")
    }

    fn register_value_change_callback(&self, cb: CbId, _signal: &GpiObj) -> GpiResult<RawHandle> {
        self.arm(cb, "value_change")
    }

    fn register_readonly_callback(&self, cb: CbId) -> GpiResult<RawHandle> {
        self.arm(cb, "readonly")
    }

    fn register_nexttime_callback(&self, cb: CbId) -> GpiResult<RawHandle> {
        self.arm(cb, "nexttime")
    }

    fn register_readwrite_callback(&self, cb: CbId) -> GpiResult<RawHandle> {
        self.arm(cb, "readwrite")
    }

    fn register_phase_callback(&self, cb: CbId, phase: SimPhase) -> GpiResult<RawHandle> {
        match phase {
            SimPhase::Start => self.arm(cb, "start"),
            SimPhase::End => self.arm(cb, "end"),
        }
    }

    fn remove_callback(&self, native: RawHandle, removal: Removal) -> bool {
        let mut state = self.state.borrow_mut();
        state.removals.push((native.get(), removal));
        if removal == Removal::Armed && state.refuse_removal {
            return false;
        }
        state.armed.remove(&native.get());
        true
    }

    fn get_signal_value(&self, signal: &GpiObj, format: ValueFormat) -> GpiResult<SignalValue> {
        let state = self.state.borrow();
        let value = state
            .values
            .get(&signal.native().get())
            .cloned()
            .ok_or_else(|| GpiError::vendor(self.name.clone(), format!("no value for {}", signal.fullname())))?;
        match format {
            ValueFormat::BinStr => Ok(SignalValue::BinStr(value)),
            _ => Ok(SignalValue::Str(value)),
        }
    }

    fn set_signal_value(&self, signal: &GpiObj, value: &SignalValue, _action: SetAction) -> GpiResult<()> {
        let text = match value {
            SignalValue::BinStr(s) | SignalValue::Str(s) => s.clone(),
            SignalValue::Long(v) => v.to_string(),
            SignalValue::Real(v) => v.to_string(),
        };
        self.state.borrow_mut().values.insert(signal.native().get(), text);
        Ok(())
    }

    fn release_handle(&self, obj: &GpiObj) {
        self.state.borrow_mut().released.push(obj.native().get());
    }

    fn reason_to_string(&self, _reason: i32) -> &'static str {
        "scripted"
    }
}

// ----------------------------------------------------------------------
// Interpreter bridge
// ----------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct BridgeLog {
    pub inits: Vec<Vec<String>>,
    pub ends: Vec<String>,
    pub events: Vec<(SimEvent, String)>,
}

/// Records every notice it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingBridge {
    pub log: Rc<RefCell<BridgeLog>>,
}

impl EmbedBridge for RecordingBridge {
    fn embed_init(&mut self, args: &[String]) -> GpiResult<()> {
        self.log.borrow_mut().inits.push(args.to_vec());
        Ok(())
    }

    fn embed_end(&mut self, message: &str) {
        self.log.borrow_mut().ends.push(message.to_string());
    }

    fn embed_event(&mut self, event: SimEvent, message: &str) {
        self.log.borrow_mut().events.push((event, message.to_string()));
    }
}
