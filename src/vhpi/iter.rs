//! VHPI child and package iterators.

use std::collections::{HashSet, VecDeque};

use crate::backend::index::{child_fullname, split_indexed_label, IndexStyle};
use crate::backend::{BackendIterator, IterStep};
use crate::object::{GpiObj, ObjType, RawHandle};

use super::api::VhpiApi;
use super::backend::VhpiBackend;
use super::defs::*;

/// Walks the relationships of one parent in order.
pub struct VhpiIterator<A: VhpiApi> {
    backend: VhpiBackend<A>,
    parent: GpiObj,
    relations: VecDeque<i32>,
    current: Option<RawHandle>,
    /// Set when iterating a pseudo-region: only for-generate instances with
    /// this label.
    label: Option<String>,
    seen_labels: HashSet<String>,
}

impl<A: VhpiApi> VhpiIterator<A> {
    pub(crate) fn new(backend: VhpiBackend<A>, parent: GpiObj, relations: Vec<i32>, label: Option<String>) -> Self {
        Self {
            backend,
            parent,
            relations: relations.into(),
            current: None,
            label,
            seen_labels: HashSet::new(),
        }
    }

    fn scan_next(&mut self) -> Option<RawHandle> {
        let api = self.backend.api();
        loop {
            let iter = match self.current {
                Some(iter) => iter,
                None => {
                    let relation = self.relations.pop_front()?;
                    let Some(iter) = api.iterator(relation, Some(self.parent.native())) else {
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

    fn classify(&mut self, raw: RawHandle) -> Option<IterStep> {
        let kind = self.backend.api().get(vhpiKindP, Some(raw));

        let Some(name) = self.backend.name_of(raw) else {
            return Some(if kind == vhpiUndefined {
                IterStep::NotNativeNoName(raw)
            } else {
                IterStep::NativeNoName
            });
        };

        if kind == vhpiForGenerateK {
            if let Some((label, _)) = split_indexed_label(&name) {
                match &self.label {
                    Some(wanted) if !label.eq_ignore_ascii_case(wanted) => return None,
                    Some(_) => {}
                    None => {
                        // Instances of one loop collapse into one pseudo-region.
                        if !self.seen_labels.insert(label.to_ascii_lowercase()) {
                            return None;
                        }
                        return Some(IterStep::Native(self.backend.pseudo_region(&self.parent, label)));
                    }
                }
            }
        } else if self.label.is_some() {
            return None;
        }

        let fullname = child_fullname(&self.parent, &name, IndexStyle::Paren);
        Some(match self.backend.create_obj(raw, kind, &name, fullname) {
            Some(obj) => IterStep::Native(obj),
            None => IterStep::NotNative { name, raw },
        })
    }
}

impl<A: VhpiApi> BackendIterator for VhpiIterator<A> {
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
impl<A: VhpiApi> Drop for VhpiIterator<A> {
    fn drop(&mut self) {
        if let Some(iter) = self.current.take() {
            self.backend.api().release_handle(iter);
        }
    }
}

/// Walks package instances.
pub struct VhpiPackageIterator<A: VhpiApi> {
    backend: VhpiBackend<A>,
    iter: Option<RawHandle>,
    filter: bool,
}

impl<A: VhpiApi> VhpiPackageIterator<A> {
    pub(crate) fn new(backend: VhpiBackend<A>, iter: RawHandle, filter: bool) -> Self {
        Self {
            backend,
            iter: Some(iter),
            filter,
        }
    }
}

impl<A: VhpiApi> BackendIterator for VhpiPackageIterator<A> {
    fn next_step(&mut self) -> IterStep {
        while let Some(iter) = self.iter {
            let api = self.backend.api();
            let Some(raw) = api.scan(iter) else {
                self.iter = None;
                break;
            };
            if self.filter && api.get(vhpiKindP, Some(raw)) != vhpiPackInstK {
                continue;
            }
            let Some(name) = self.backend.name_of(raw) else {
                return IterStep::NativeNoName;
            };
            let obj = GpiObj::new(raw, ObjType::Package, name.clone(), name).with_type_str("vhpiPackInstK");
            return IterStep::Native(obj);
        }
        IterStep::End
    }
}

impl<A: VhpiApi> Drop for VhpiPackageIterator<A> {
    fn drop(&mut self) {
        if let Some(iter) = self.iter.take() {
            self.backend.api().release_handle(iter);
        }
    }
}
