//! The VPI calls the backend needs, one method per vendor function.
//!
//! A simulator binding implements this over the C interface; the in-memory
//! model under `tests/common` implements it for tests. Handles are opaque
//! [`RawHandle`] words and `None` stands for a null `vpiHandle`.

use crate::backend::SimTime;
use crate::object::{RawHandle, SignalValue, ValueFormat};

/// Arguments of `vpi_register_cb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VpiCbData {
    /// `cb*` reason.
    pub reason: i32,
    /// Watched object, for value-change callbacks.
    pub obj: Option<RawHandle>,
    /// Delay in simulator time units, for timed callbacks.
    pub delay: Option<SimTime>,
    /// Opaque word handed back on firing.
    pub user_data: u64,
}

/// Result of `vpi_chk_error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpiErrorInfo {
    /// `vpiNotice` .. `vpiInternal`.
    pub level: i32,
    #[allow(missing_docs)]
    pub message: String,
    #[allow(missing_docs)]
    pub product: String,
    /// Source file the vendor attributes the error to.
    pub file: Option<String>,
    #[allow(missing_docs)]
    pub line: i32,
}

/// Result of `vpi_get_vlog_info`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VlogInfo {
    #[allow(missing_docs)]
    pub product: String,
    #[allow(missing_docs)]
    pub version: String,
    /// Simulator command line.
    pub argv: Vec<String>,
}

/// Vendor VPI entry points.
///
/// Implementations are cheap handles to the simulator (usually zero-sized),
/// cloned into iterators.
pub trait VpiApi: Clone + 'static {
    /// `vpi_handle_by_name`.
    fn handle_by_name(&self, name: &str, scope: Option<RawHandle>) -> Option<RawHandle>;

    /// `vpi_handle_by_index`.
    fn handle_by_index(&self, object: RawHandle, index: i32) -> Option<RawHandle>;

    /// `vpi_iterate`. `None` when the relationship is empty.
    fn iterate(&self, relation: i32, object: Option<RawHandle>) -> Option<RawHandle>;

    /// `vpi_scan`. The vendor frees the iterator when it returns `None`.
    fn scan(&self, iterator: RawHandle) -> Option<RawHandle>;

    /// `vpi_get`; `vpiUndefined` when the property does not apply.
    fn get(&self, property: i32, object: Option<RawHandle>) -> i32;

    /// `vpi_get_str`.
    fn get_str(&self, property: i32, object: RawHandle) -> Option<String>;

    /// Evaluated `vpiLeftRange` / `vpiRightRange` of a vector or array.
    fn range(&self, object: RawHandle) -> Option<(i32, i32)>;

    /// `vpi_get_time` in simulator units.
    fn get_time(&self) -> SimTime;

    /// `vpi_register_cb`.
    fn register_cb(&self, data: &VpiCbData) -> Option<RawHandle>;

    /// `vpi_remove_cb`.
    fn remove_cb(&self, cb: RawHandle) -> bool;

    /// `vpi_release_handle` / `vpi_free_object`.
    fn release_handle(&self, object: RawHandle) -> bool;

    /// `vpi_control`.
    fn control(&self, operation: i32) -> bool;

    /// `vpi_chk_error`; `None` when the last call succeeded.
    fn chk_error(&self) -> Option<VpiErrorInfo>;

    /// `vpi_get_value`.
    fn get_value(&self, object: RawHandle, format: ValueFormat) -> Option<SignalValue>;

    /// `vpi_put_value` with a `vpi*Flag`.
    fn put_value(&self, object: RawHandle, value: &SignalValue, flags: i32) -> bool;

    /// `vpi_get_vlog_info`.
    fn vlog_info(&self) -> VlogInfo;
}
