//! VHDL procedural interface (VHPI) backend.
//!
//! [`VhpiBackend`] speaks to the simulator through a [`VhpiApi`] adapter.
//! A simulator binding registers `vhpi_callback_trampoline` as the callback
//! function of every `vhpiCbDataT` it installs.

mod api;
mod backend;
pub mod defs;
mod iter;

use tracing::warn;

use crate::dispatch::with_global;

pub use api::{ToolInfo, VhpiApi, VhpiCbData, VhpiErrorInfo};
pub use backend::{severity, VhpiBackend, VHPI_BACKEND_NAME};
pub use iter::{VhpiIterator, VhpiPackageIterator};

/// Route a VHPI callback firing into this thread's dispatch core.
///
/// VHPI callbacks return nothing; failures surface through the core's own
/// error handling.
pub fn vhpi_callback_trampoline(user_data: u64) {
    if with_global(|gpi| gpi.handle_raw_callback(user_data)).is_none() {
        warn!("VHPI callback fired without a dispatch core");
    }
}
