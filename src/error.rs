//! Error types for simgpi.
//!
//! All errors are strongly typed using thiserror. Expected absence (a child
//! that does not exist under some backend) is never an error: lookups return
//! `Ok(None)` for that case. `GpiError` is reserved for conditions a caller
//! must react to.

use thiserror::Error;

use crate::callback::CbId;
use crate::context::SimContext;
use crate::object::{ObjId, ObjType};

/// A strict context transition was requested from the wrong side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("context switch to {requested} requested while already in {current}")]
pub struct ContextViolation {
    /// Context that was active when the transition was requested.
    pub current: SimContext,
    /// Context the caller tried to enter.
    pub requested: SimContext,
}

/// Top-level error type for simgpi.
#[derive(Debug, Error)]
pub enum GpiError {
    /// The id does not name a live object.
    #[error("Invalid object handle: {0}")]
    InvalidHandle(ObjId),

    /// The id does not name a registered callback.
    #[error("Invalid callback handle: {0}")]
    InvalidCallback(CbId),

    /// A vendor trampoline delivered a word that is not one of our ids.
    #[error("Callback user data {user_data:#018x} failed consistency check")]
    CorruptCallback {
        /// Raw word as the simulator returned it.
        user_data: u64,
    },

    /// The simulator rejected a call.
    #[error("{backend} error: {message}")]
    Vendor {
        /// Name of the backend that made the call.
        backend: String,
        /// Vendor error text, or what was being attempted.
        message: String,
    },

    /// No backend has been registered yet.
    #[error("No backend registered")]
    NoBackend,

    /// Backends must be registered before the first handle lookup.
    #[error("Backend '{name}' registered after handle lookups started")]
    RegistrationClosed {
        /// Name of the rejected backend.
        name: String,
    },

    /// The object type has no such operation.
    #[error("Operation '{operation}' not supported on {obj_type} object")]
    Unsupported {
        /// Operation that was attempted.
        operation: &'static str,
        /// Type of the object it was attempted on.
        obj_type: ObjType,
    },

    /// Simulation end was already requested; nothing new is scheduled.
    #[error("Simulation end has been requested")]
    SimulationEnding,

    /// A strict context transition was out of order.
    #[error("Context violation: {0}")]
    Context(#[from] ContextViolation),

    /// Bad environment variable or configuration file.
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong with it.
        message: String,
    },

    /// A dynamic library or its entry point could not be loaded.
    #[error("Failed to load '{path}': {message}")]
    Load {
        /// Library path as configured.
        path: String,
        /// Loader error text.
        message: String,
    },

    /// A user callback function returned an error.
    #[error("User callback failed: {message}")]
    Callback {
        /// Error text from the callback.
        message: String,
    },

    /// The embedded interpreter bridge failed.
    #[error("Embedded interpreter error: {message}")]
    Embed {
        /// Error text from the bridge.
        message: String,
    },
}

impl GpiError {
    /// Creates a vendor error attributed to a backend.
    #[must_use]
    pub fn vendor(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Vendor {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Creates a user callback failure.
    #[must_use]
    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true if this error must end the simulation.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::CorruptCallback { .. } | Self::Context(_))
    }

    /// Returns true if the vendor API itself reported the failure.
    #[must_use]
    pub const fn is_vendor(&self) -> bool {
        matches!(self, Self::Vendor { .. })
    }
}

/// Result type alias for simgpi operations.
pub type GpiResult<T> = Result<T, GpiError>;
