//! # simgpi - Generic Procedural Interface core
//!
//! simgpi sits between a simulator's procedural interfaces (VPI for Verilog,
//! VHPI for VHDL) and an embedded testbench interpreter. It presents one
//! object model and one callback engine regardless of which vendor interface
//! owns a given object.
//!
//! ## Core Concepts
//!
//! - **Backend**: one implementation per vendor interface, registered in an
//!   ordered registry that doubles as the search order for lookups
//! - **Object**: a discovered simulation entity, deduplicated by its
//!   fully-qualified name and referred to through an [`ObjId`]
//! - **Callback**: a user function armed on a simulator event, tracked by a
//!   [`CbId`] through an explicit lifecycle
//! - **Context**: whether control currently belongs to the simulator or to
//!   user code; crossing it the wrong way aborts the process
//!
//! ## Usage
//!
//! ```rust,ignore
//! use simgpi::{Edge, Gpi, IterSelector, LookupMode};
//! use simgpi::vpi::VpiBackend;
//!
//! let gpi = Gpi::new();
//! gpi.register_backend(Box::new(VpiBackend::new(adapter)))?;
//!
//! let top = gpi.get_root_handle(None).ok_or(simgpi::GpiError::NoBackend)?;
//! let clk = gpi.get_handle_by_name(top, "clk", LookupMode::Auto)?.expect("clk exists");
//! gpi.register_value_change_callback(clk, Edge::Rising, |gpi| {
//!     println!("rising edge at {}", gpi.sim_time()?);
//!     Ok(())
//! })?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Ambient: errors, logging, configuration
pub mod config;
pub mod error;
pub mod logging;

// Object model and identity
pub mod object;
pub mod store;

// Backend contract and the dispatch core
pub mod backend;
pub mod callback;
pub mod context;
pub mod dispatch;
pub mod embed;
pub mod loader;

// Vendor backends
pub mod vhpi;
pub mod vpi;

// Re-export primary types at crate root for convenience
pub use backend::{
    Backend, BackendId, BackendIterator, BackendRegistry, Capabilities, IterStep, PackageScan, Removal, SimPhase,
    SimTime,
};
pub use callback::{CallbackEngine, CallbackKind, CbId, CbState, Decoded, RemoveOutcome, UserCallback};
pub use config::{EntryPoint, GpiConfig};
pub use context::{ContextGuard, SimContext};
pub use dispatch::{bootstrap_from_env, init_global, teardown_global, with_global, Gpi, GpiIterator};
pub use embed::{EmbedBridge, SimEvent};
pub use error::{ContextViolation, GpiError, GpiResult};
pub use logging::LogLevel;
pub use object::{
    Edge, GpiObj, IndexRange, IterSelector, LookupMode, ObjId, ObjKind, ObjType, RangeDirection, RawHandle,
    SetAction, SignalValue, ValueFormat,
};
pub use store::{HandleStore, Stored};
