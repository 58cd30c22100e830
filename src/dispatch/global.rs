//! The process-wide instance.
//!
//! Vendor callbacks arrive through C trampolines with nothing but a user-data
//! word, so they need a well-known place to find the dispatch core. The
//! instance lives in thread-local storage: only the simulator's thread ever
//! sees it.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::config::GpiConfig;
use crate::error::{GpiError, GpiResult};
use crate::logging;

use super::Gpi;

thread_local! {
    static INSTANCE: RefCell<Option<Rc<Gpi>>> = const { RefCell::new(None) };
}

/// Install `gpi` as this thread's instance.
///
/// Fails if one is already installed.
pub fn init_global(gpi: Gpi) -> GpiResult<()> {
    INSTANCE.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_some() {
            return Err(GpiError::config("dispatch core already initialized"));
        }
        *slot = Some(Rc::new(gpi));
        debug!("dispatch core initialized");
        Ok(())
    })
}

/// Read the boundary environment, install logging and the instance.
///
/// Vendor startup routines call this before registering their backends.
/// A second call on the same thread is a no-op.
pub fn bootstrap_from_env() -> GpiResult<()> {
    if with_global(|_| ()).is_some() {
        return Ok(());
    }
    let config = GpiConfig::from_env()?;
    logging::init(config.log_level);
    debug!(
        extra = config.extra_libs.len(),
        users = config.users.len(),
        "boundary configuration read"
    );
    init_global(Gpi::with_config(config))
}

/// Run `f` against this thread's instance; `None` if there is none.
///
/// The slot is not borrowed while `f` runs, so `f` may re-enter.
pub fn with_global<R>(f: impl FnOnce(&Gpi) -> R) -> Option<R> {
    let gpi = INSTANCE.with(|slot| slot.borrow().clone())?;
    Some(f(&gpi))
}

/// Finalize and drop this thread's instance.
///
/// Returns false when there was nothing to tear down.
pub fn teardown_global() -> bool {
    let Some(gpi) = INSTANCE.with(|slot| slot.borrow_mut().take()) else {
        return false;
    };
    gpi.finalize();
    if Rc::strong_count(&gpi) > 1 {
        warn!("dispatch core torn down while still in use");
    }
    true
}
