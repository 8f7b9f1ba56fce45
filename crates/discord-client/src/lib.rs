//! Discord HTTP interactions: wire types, request verification and the
//! webhook client used to finish deferred responses.

mod client;
mod error;
mod types;
mod verify;

pub use client::{DiscordClient, DEFAULT_API_BASE};
pub use error::DiscordError;
pub use types::*;
pub use verify::{SignatureVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER};
