//! VPI child and package iterators.

use std::collections::{HashSet, VecDeque};

use crate::backend::index::{child_fullname, split_indexed_label, IndexStyle};
use crate::backend::{Backend, BackendIterator, IterStep};
use crate::object::{GpiObj, ObjType, RawHandle};

use super::api::VpiApi;
use super::backend::VpiBackend;
use super::defs::*;

/// Walks the relationships of one parent in order.
pub struct VpiIterator<A: VpiApi> {
    backend: VpiBackend<A>,
    parent: GpiObj,
    relations: VecDeque<i32>,
    current: Option<RawHandle>,
    /// Set when iterating a pseudo-region: only scopes with this label.
    label: Option<String>,
    seen_labels: HashSet<String>,
}

impl<A: VpiApi> VpiIterator<A> {
    pub(crate) fn new(backend: VpiBackend<A>, parent: GpiObj, relations: Vec<i32>, label: Option<String>) -> Self {
        Self {
            backend,
            parent,
            relations: relations.into(),
            current: None,
            label,
            seen_labels: HashSet::new(),
        }
    }

    /// Next vendor handle, moving through the relationships as each runs dry.
    fn scan_next(&mut self) -> Option<RawHandle> {
        let api = self.backend.api();
        loop {
            let iter = match self.current {
                Some(iter) => iter,
                None => {
                    let relation = self.relations.pop_front()?;
                    // An empty relationship has no iterator at all.
                    let Some(iter) = api.iterate(relation, Some(self.parent.native())) else {
                        continue;
                    };
                    self.current = Some(iter);
                    iter
                }
            };
            match api.scan(iter) {
                Some(raw) => return Some(raw),
                None => self.current = None,
            }
        }
    }

    /// Classify one scanned handle; `None` to skip it silently.
    fn classify(&mut self, raw: RawHandle) -> Option<IterStep> {
        let api = self.backend.api();
        let vpi_type = api.get(vpiType, Some(raw));

        let Some(name) = api.get_str(vpiName, raw) else {
            return Some(if vpi_type == vpiUndefined {
                IterStep::NotNativeNoName(raw)
            } else {
                IterStep::NativeNoName
            });
        };

        if let Some(label) = &self.label {
            let belongs = split_indexed_label(&name).is_some_and(|(l, _)| l == label);
            if !belongs {
                return None;
            }
        } else if vpi_type == vpiGenScopeArray {
            if !self.seen_labels.insert(name.clone()) {
                return None;
            }
            return Some(IterStep::Native(self.backend.pseudo_region(raw, &name, &self.parent)));
        } else if vpi_type == vpiGenScope && self.backend.capabilities().gen_scope_name_heuristic {
            if let Some((label, _)) = split_indexed_label(&name) {
                if !self.seen_labels.insert(label.to_string()) {
                    return None;
                }
                let region = self.backend.pseudo_region(self.parent.native(), label, &self.parent);
                return Some(IterStep::Native(region));
            }
        }

        let fullname = child_fullname(&self.parent, &name, IndexStyle::Square);
        Some(match self.backend.create_obj(raw, vpi_type, &name, fullname) {
            Some(obj) => IterStep::Native(obj),
            None => IterStep::NotNative { name, raw },
        })
    }
}

impl<A: VpiApi> BackendIterator for VpiIterator<A> {
    fn next_step(&mut self) -> IterStep {
        while let Some(raw) = self.scan_next() {
            if let Some(step) = self.classify(raw) {
                return step;
            }
        }
        IterStep::End
    }
}

// An iterator dropped before it ran dry still holds a vendor cursor.
impl<A: VpiApi> Drop for VpiIterator<A> {
    fn drop(&mut self) {
        if let Some(iter) = self.current.take() {
            self.backend.api().release_handle(iter);
        }
    }
}

/// Walks packages, optionally filtering them out of the instance list.
pub struct VpiPackageIterator<A: VpiApi> {
    backend: VpiBackend<A>,
    iter: Option<RawHandle>,
    filter: bool,
}

impl<A: VpiApi> VpiPackageIterator<A> {
    pub(crate) fn new(backend: VpiBackend<A>, iter: RawHandle, filter: bool) -> Self {
        Self {
            backend,
            iter: Some(iter),
            filter,
        }
    }
}

impl<A: VpiApi> BackendIterator for VpiPackageIterator<A> {
    fn next_step(&mut self) -> IterStep {
        let api = self.backend.api();
        while let Some(iter) = self.iter {
            let Some(raw) = api.scan(iter) else {
                self.iter = None;
                break;
            };
            if self.filter && api.get(vpiType, Some(raw)) != vpiPackage {
                continue;
            }
            let Some(name) = api.get_str(vpiName, raw) else {
                return IterStep::NativeNoName;
            };
            let fullname = api.get_str(vpiFullName, raw).unwrap_or_else(|| name.clone());
            let obj = GpiObj::new(raw, ObjType::Package, name, fullname).with_type_str("vpiPackage");
            return IterStep::Native(obj);
        }
        IterStep::End
    }
}

impl<A: VpiApi> Drop for VpiPackageIterator<A> {
    fn drop(&mut self) {
        if let Some(iter) = self.iter.take() {
            self.backend.api().release_handle(iter);
        }
    }
}
