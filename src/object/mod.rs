//! Object model: the handles every backend produces.

/// Discovered objects and their identity tokens.
pub mod obj;
/// Type taxonomy, ranges, selectors, values.
pub mod types;

pub use obj::{GpiObj, ObjId, ObjKind, RawHandle};
pub use types::{
    Edge, IndexRange, IterSelector, LookupMode, ObjType, RangeDirection, SetAction, SignalValue,
    ValueFormat,
};
