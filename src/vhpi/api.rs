//! The VHPI calls the backend needs, one method per vendor function.

use crate::backend::SimTime;
use crate::object::{RawHandle, SignalValue, ValueFormat};

/// Arguments of `vhpi_register_cb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VhpiCbData {
    /// `vhpiCb*` reason.
    pub reason: i32,
    /// Watched object, for value-change callbacks.
    pub obj: Option<RawHandle>,
    /// Delay in simulator time units, for timed callbacks.
    pub delay: Option<SimTime>,
    /// Opaque word handed back on firing.
    pub user_data: u64,
}

/// Result of `vhpi_check_error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VhpiErrorInfo {
    /// `vhpiNote` .. `vhpiFailure`.
    pub severity: i32,
    #[allow(missing_docs)]
    pub message: String,
    /// Source file the vendor attributes the error to.
    pub file: Option<String>,
    #[allow(missing_docs)]
    pub line: i32,
}

/// Tool information from the `vhpiTool` handle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolInfo {
    #[allow(missing_docs)]
    pub product: String,
    #[allow(missing_docs)]
    pub version: String,
    /// Simulator command line.
    pub argv: Vec<String>,
}

/// Vendor VHPI entry points.
///
/// Handles are opaque [`RawHandle`] words and `None` stands for a null
/// `vhpiHandleT`.
pub trait VhpiApi: Clone + 'static {
    /// `vhpi_handle_by_name`, relative to `scope` when given.
    fn handle_by_name(&self, name: &str, scope: Option<RawHandle>) -> Option<RawHandle>;

    /// `vhpi_handle_by_index` with a flat position.
    fn handle_by_index(&self, relation: i32, parent: RawHandle, index: i32) -> Option<RawHandle>;

    /// `vhpi_handle` for one-to-one relationships.
    fn handle(&self, relation: i32, object: Option<RawHandle>) -> Option<RawHandle>;

    /// `vhpi_iterator`. `None` when the relationship is empty.
    fn iterator(&self, relation: i32, object: Option<RawHandle>) -> Option<RawHandle>;

    /// `vhpi_scan`. The vendor frees the iterator when it returns `None`.
    fn scan(&self, iterator: RawHandle) -> Option<RawHandle>;

    /// `vhpi_get`; `vhpiUndefined` when the property does not apply.
    fn get(&self, property: i32, object: Option<RawHandle>) -> i32;

    /// `vhpi_get_str`.
    fn get_str(&self, property: i32, object: RawHandle) -> Option<String>;

    /// Left and right bound of every index constraint, outermost first.
    fn constraints(&self, object: RawHandle) -> Vec<(i32, i32)>;

    /// `vhpi_get_time` in simulator units.
    fn get_time(&self) -> SimTime;

    /// `vhpi_register_cb`.
    fn register_cb(&self, data: &VhpiCbData) -> Option<RawHandle>;

    /// `vhpi_remove_cb`.
    fn remove_cb(&self, cb: RawHandle) -> bool;

    /// `vhpi_release_handle`.
    fn release_handle(&self, object: RawHandle) -> bool;

    /// `vhpi_control`.
    fn control(&self, command: i32) -> bool;

    /// `vhpi_check_error`; `None` when the last call succeeded.
    fn check_error(&self) -> Option<VhpiErrorInfo>;

    /// `vhpi_get_value`.
    fn get_value(&self, object: RawHandle, format: ValueFormat) -> Option<SignalValue>;

    /// `vhpi_put_value` with a `vhpi*` mode.
    fn put_value(&self, object: RawHandle, value: &SignalValue, mode: i32) -> bool;

    /// Product, version, and arguments of the running tool.
    fn tool_info(&self) -> ToolInfo;
}
