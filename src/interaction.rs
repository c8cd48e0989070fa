//! Partner interaction protocol: envelopes, payloads, and the dispatcher.

pub mod dispatcher;
pub mod envelope;
pub mod payload;

pub use dispatcher::*;
pub use envelope::*;
pub use payload::*;
