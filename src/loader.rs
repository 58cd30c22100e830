//! Dynamic loading of extra libraries and user entry points.
//!
//! Each entry names a shared library and an `extern "C" fn()` inside it. The
//! library is opened, the function called once, and the library kept loaded
//! until the process exits: whatever the entry point registered (backends,
//! callbacks) points into its code.

use std::sync::{Mutex, PoisonError};

use libloading::{Library, Symbol};
use tracing::info;

use crate::config::EntryPoint;
use crate::error::{GpiError, GpiResult};

type EntryFn = unsafe extern "C" fn();

static RESIDENT: Mutex<Vec<Library>> = Mutex::new(Vec::new());

/// Load and call every entry point, in order. Stops at the first failure.
pub fn load_entry_points(entries: &[EntryPoint]) -> GpiResult<()> {
    for entry in entries {
        load_entry_point(entry)?;
    }
    Ok(())
}

/// Load one library and call its entry point.
pub fn load_entry_point(entry: &EntryPoint) -> GpiResult<()> {
    info!(library = %entry.library, symbol = %entry.symbol, "loading entry point");

    let load_err = |message: String| GpiError::Load {
        path: entry.library.clone(),
        message,
    };

    // SAFETY: loading runs the library's initializers; the caller configured
    // this path as a simulator extension.
    let lib = unsafe { Library::new(&entry.library) }.map_err(|e| load_err(e.to_string()))?;

    {
        // SAFETY: entry points are declared as `extern "C" fn()`.
        let func: Symbol<EntryFn> = unsafe { lib.get(entry.symbol.as_bytes()) }
            .map_err(|e| load_err(format!("symbol '{}': {e}", entry.symbol)))?;
        unsafe { func() };
    }

    RESIDENT.lock().unwrap_or_else(PoisonError::into_inner).push(lib);
    Ok(())
}

/// Number of libraries kept loaded.
#[must_use]
pub fn resident_count() -> usize {
    RESIDENT.lock().unwrap_or_else(PoisonError::into_inner).len()
}
