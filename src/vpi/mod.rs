//! Verilog procedural interface (VPI) backend.
//!
//! [`VpiBackend`] speaks to the simulator through a [`VpiApi`] adapter. A
//! simulator binding registers `vpi_callback_trampoline` as the routine of
//! every callback it installs, passing through the user-data word.

mod api;
mod backend;
pub mod defs;
mod iter;

use tracing::warn;

use crate::dispatch::with_global;

pub use api::{VlogInfo, VpiApi, VpiCbData, VpiErrorInfo};
pub use backend::{severity, VpiBackend, VPI_BACKEND_NAME};
pub use iter::{VpiIterator, VpiPackageIterator};

/// Route a VPI callback firing into this thread's dispatch core.
///
/// Returns the value a `cb_rtn` should hand back to the simulator.
pub fn vpi_callback_trampoline(user_data: u64) -> i32 {
    match with_global(|gpi| gpi.handle_raw_callback(user_data)) {
        Some(Ok(())) => 0,
        Some(Err(_)) => -1,
        None => {
            warn!("VPI callback fired without a dispatch core");
            0
        }
    }
}
