//! Callback handles and their lifecycle states.

use std::fmt;

use crate::backend::{BackendId, SimPhase, SimTime};
use crate::dispatch::Gpi;
use crate::error::GpiResult;
use crate::object::{Edge, ObjId, RawHandle};

/// Upper 16 bits of every user-data word handed to a vendor.
const CB_TAG: u64 = 0x4342 << 48;
const CB_TAG_MASK: u64 = 0xffff << 48;
const CB_SERIAL_MASK: u64 = !CB_TAG_MASK;

/// Identity of one callback registration.
///
/// Travels through the vendor as the callback's user-data word. The word is
/// tagged so a corrupted or foreign pointer is recognised on the way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CbId(u64);

impl CbId {
    pub(crate) const fn from_serial(serial: u64) -> Self {
        Self(serial & CB_SERIAL_MASK)
    }

    pub(crate) const fn serial(self) -> u64 {
        self.0
    }

    /// Encode as a vendor user-data word.
    #[must_use]
    pub const fn to_user_data(self) -> u64 {
        CB_TAG | self.0
    }

    /// Decode a vendor user-data word; `None` if the tag check fails.
    #[must_use]
    pub const fn from_user_data(word: u64) -> Option<Self> {
        if word & CB_TAG_MASK == CB_TAG {
            Some(Self(word & CB_SERIAL_MASK))
        } else {
            None
        }
    }
}

impl fmt::Display for CbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cb#{}", self.0)
    }
}

/// Lifecycle state of a callback.
///
/// `Free -> Primed` on arm, `Primed -> PreCall` when the vendor fires,
/// `PreCall -> PostCall` when the user function returns, then back to
/// `Primed` (recurring) or retired (one-shot). `Delete` marks a handle whose
/// removal is pending; a firing in that state never reaches the user function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CbState {
    /// Created, not yet installed with the vendor.
    Free,
    /// Installed and waiting.
    Primed,
    /// User function running.
    PreCall,
    /// User function returned; cleanup pending.
    PostCall,
    /// Removed; awaiting vendor teardown.
    Delete,
}

/// What a callback waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    /// After a delay.
    Timed {
        /// Delay in simulator precision units.
        delay: SimTime,
    },
    /// On value change of a signal.
    ValueChange {
        /// Watched signal.
        signal: ObjId,
        /// Filter applied to the new value.
        edge: Edge,
    },
    /// Read-only phase of the current step.
    ReadOnly,
    /// Start of the next time step.
    NextTime,
    /// Read-write phase of the current step.
    ReadWrite,
    /// Simulation start or end.
    Phase(SimPhase),
}

impl CallbackKind {
    /// Recurring callbacks stay armed after firing.
    #[must_use]
    pub const fn is_recurring(self) -> bool {
        matches!(self, Self::ValueChange { .. })
    }
}

/// Result of a removal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The vendor callback is gone.
    Removed,
    /// The handle is marked removed; vendor teardown happens later. It will
    /// never invoke its user function again.
    Deferred,
}

/// User function invoked when a callback fires.
///
/// Returning `Err` requests end of simulation.
pub type UserCallback = Box<dyn FnMut(&Gpi) -> GpiResult<()>>;

/// One armed callback.
pub(crate) struct CbHandle {
    pub(crate) backend: BackendId,
    pub(crate) kind: CallbackKind,
    pub(crate) state: CbState,
    pub(crate) native: Option<RawHandle>,
    pub(crate) func: Option<UserCallback>,
}

impl fmt::Debug for CbHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CbHandle")
            .field("backend", &self.backend)
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("native", &self.native)
            .field("has_func", &self.func.is_some())
            .finish()
    }
}
