//! Discovered simulation objects.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::backend::BackendId;

use super::types::{IndexRange, ObjType};

/// Opaque vendor-owned reference (a `vpiHandle`, `vhpiHandleT`, ...).
///
/// Backends convert their native pointer type to and from this word; the core
/// never dereferences it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawHandle(u64);

impl RawHandle {
    /// Wrap a native word.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The native word.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Identity of a stored object.
///
/// Two lookups that resolve to the same fully-qualified name yield equal ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjId(u32);

impl ObjId {
    pub(crate) const fn from_index(index: usize) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        Self(index as u32)
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

/// Whether an object carries a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjKind {
    /// Scopes, arrays, structures.
    Object,
    /// Get/set value and value-change callbacks are available.
    Signal,
}

/// One discovered simulation entity.
///
/// Backends construct candidates; the dispatch core binds the owning backend
/// and hands them to the identity store, which owns them until finalize.
#[derive(Debug, Clone, PartialEq)]
pub struct GpiObj {
    native: RawHandle,
    backend: Option<BackendId>,
    obj_type: ObjType,
    kind: ObjKind,
    is_const: bool,
    indexable: bool,
    num_elems: Option<usize>,
    range: Option<IndexRange>,
    name: String,
    fullname: String,
    type_str: String,
    definition_name: Option<String>,
    definition_file: Option<String>,
    partial_indices: Vec<i32>,
}

impl GpiObj {
    /// A candidate object. Signal kind and indexability follow from `obj_type`.
    #[must_use]
    pub fn new(native: RawHandle, obj_type: ObjType, name: impl Into<String>, fullname: impl Into<String>) -> Self {
        let kind = if obj_type.is_signal() {
            ObjKind::Signal
        } else {
            ObjKind::Object
        };
        Self {
            native,
            backend: None,
            obj_type,
            kind,
            is_const: false,
            indexable: obj_type.is_indexable(),
            num_elems: None,
            range: None,
            name: name.into(),
            fullname: fullname.into(),
            type_str: String::new(),
            definition_name: None,
            definition_file: None,
            partial_indices: Vec::new(),
        }
    }

    /// Mark as constant (parameters, generics, literals).
    #[must_use]
    pub fn constant(mut self, is_const: bool) -> Self {
        self.is_const = is_const;
        self
    }

    /// Attach the declared range; also fixes the element count.
    #[must_use]
    pub fn with_range(mut self, range: IndexRange) -> Self {
        self.num_elems = Some(range.len());
        self.range = Some(range);
        self
    }

    /// Override the element count.
    #[must_use]
    pub fn with_num_elems(mut self, n: usize) -> Self {
        self.num_elems = Some(n);
        self
    }

    /// Vendor's own name for the object's type.
    #[must_use]
    pub fn with_type_str(mut self, s: impl Into<String>) -> Self {
        self.type_str = s.into();
        self
    }

    /// Definition (module/entity) name and source file, when known.
    #[must_use]
    pub fn with_definition(mut self, name: Option<String>, file: Option<String>) -> Self {
        self.definition_name = name;
        self.definition_file = file;
        self
    }

    /// Indices already applied on the way to a multi-dimensional element.
    #[must_use]
    pub fn with_partial_indices(mut self, indices: Vec<i32>) -> Self {
        self.partial_indices = indices;
        self
    }

    /// Force indexability regardless of type.
    #[must_use]
    pub fn indexable(mut self, indexable: bool) -> Self {
        self.indexable = indexable;
        self
    }

    pub(crate) fn bind(&mut self, backend: BackendId) {
        self.backend = Some(backend);
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn native(&self) -> RawHandle {
        self.native
    }

    /// Owning backend; `None` until the dispatch core accepted the candidate.
    #[must_use]
    pub const fn backend(&self) -> Option<BackendId> {
        self.backend
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn obj_type(&self) -> ObjType {
        self.obj_type
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn kind(&self) -> ObjKind {
        self.kind
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn is_signal(&self) -> bool {
        matches!(self.kind, ObjKind::Signal)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn is_const(&self) -> bool {
        self.is_const
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn is_indexable(&self) -> bool {
        self.indexable
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn num_elems(&self) -> Option<usize> {
        self.num_elems
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn range(&self) -> Option<IndexRange> {
        self.range
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully-qualified hierarchical name; the identity key.
    #[must_use]
    pub fn fullname(&self) -> &str {
        &self.fullname
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn type_str(&self) -> &str {
        &self.type_str
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn definition_name(&self) -> Option<&str> {
        self.definition_name.as_deref()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn definition_file(&self) -> Option<&str> {
        self.definition_file.as_deref()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn partial_indices(&self) -> &[i32] {
        &self.partial_indices
    }
}
