//! Token material issued by the local authorization server.

pub mod secret;
pub mod signer;
