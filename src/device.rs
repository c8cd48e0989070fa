//! Device abstraction layer: descriptors, state snapshots, handlers, and the registry.
//!
//! `descriptor` and `state` hold the wire shapes, `source` defines where a device's
//! attribute values come from, `handler` is the closed set of device kinds, and `registry`
//! owns handlers keyed by external device id and fans out refreshes.

pub mod descriptor;
pub mod handler;
pub mod registry;
pub mod source;
pub mod state;

pub use descriptor::*;
pub use handler::*;
pub use registry::*;
pub use source::*;
pub use state::*;
