//! Vendor backend contract and registry.

pub mod index;
mod registry;
mod traits;

pub use registry::BackendRegistry;
pub use traits::{
    Backend, BackendId, BackendIterator, Capabilities, IterStep, PackageScan, Removal, SimPhase, SimTime,
};
