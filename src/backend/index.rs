//! Name and index translation shared by backends.
//!
//! Generate loops surface as sibling scopes whose labels differ only by a
//! trailing index (`gen[3]` in Verilog, `gen(3)` in VHDL). Multi-dimensional
//! arrays may only be addressable through one flat index. Both cases need
//! translating before the vendor can be asked.

use std::sync::OnceLock;

use regex::Regex;

use crate::object::{GpiObj, IndexRange};

/// Bracket style used by a vendor for indexed names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStyle {
    /// `name[idx]`
    Square,
    /// `name(idx)`
    Paren,
}

fn indexed_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Label, then one trailing index in either bracket style.
        Regex::new(r"^(?P<label>.+?)(?:\[(?P<sq>-?\d+)\]|\((?P<pa>-?\d+)\))$").expect("indexed label pattern is valid")
    })
}

/// Split `gen[3]` / `gen(3)` into `("gen", 3)`.
#[must_use]
pub fn split_indexed_label(name: &str) -> Option<(&str, i32)> {
    let caps = indexed_label_re().captures(name)?;
    let label = caps.name("label")?.as_str();
    let index = caps.name("sq").or_else(|| caps.name("pa"))?.as_str().parse().ok()?;
    Some((label, index))
}

/// Append an index to a name.
#[must_use]
pub fn indexed_name(base: &str, index: i32, style: IndexStyle) -> String {
    match style {
        IndexStyle::Square => format!("{base}[{index}]"),
        IndexStyle::Paren => format!("{base}({index})"),
    }
}

/// Hierarchical child name.
#[must_use]
pub fn join_name(parent_fullname: &str, name: &str) -> String {
    if parent_fullname.is_empty() {
        name.to_string()
    } else {
        format!("{parent_fullname}.{name}")
    }
}

/// Fully-qualified name of a child called `name` below `parent`.
///
/// Array elements report names like `mem[3]`; below an indexable parent
/// called `mem` they become `parent[3]` rather than `parent.mem[3]`.
#[must_use]
pub fn child_fullname(parent: &GpiObj, name: &str, style: IndexStyle) -> String {
    if parent.is_indexable() {
        if let Some((label, index)) = split_indexed_label(name) {
            if label == parent.name() {
                return indexed_name(parent.fullname(), index, style);
            }
        }
    }
    join_name(parent.fullname(), name)
}

/// Row-major flat position of `indices` within `dims`.
///
/// `indices` may address a prefix of the dimensions, in which case the
/// position of the first element of that sub-array is returned. Any index
/// outside its dimension yields `None`.
#[must_use]
pub fn flatten_index(dims: &[IndexRange], indices: &[i32]) -> Option<usize> {
    if indices.len() > dims.len() {
        return None;
    }

    let mut flat = 0usize;
    for (dim, &index) in dims.iter().zip(indices) {
        flat = flat.checked_mul(dim.len())?;
        flat = flat.checked_add(dim.offset_of(index)?)?;
    }
    for dim in &dims[indices.len()..] {
        flat = flat.checked_mul(dim.len())?;
    }
    Some(flat)
}
