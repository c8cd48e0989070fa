//! Identity identifiers, token secrets, and access-token signing.

pub mod id;
pub mod token;

pub use id::*;
pub use token::{secret::*, signer::*};
