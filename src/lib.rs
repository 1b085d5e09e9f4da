//! Client-side synchronization engine for the `localnetv1` endpoints watch
//! API.
//!
//! Keeps an ordered, eventually-consistent snapshot of services and their
//! endpoints, fed by a bidirectional stream of diffs. Transport failures are
//! never surfaced: the client reconnects and retries until a round completes
//! or it is canceled.

mod client;
mod config;
mod constants;
mod errors;
mod network;
pub mod proto;
#[cfg(unix)]
pub mod signal;
pub mod store;

pub use client::*;
pub use config::*;
pub use errors::*;
pub use network::*;


//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub(crate) mod test_utils;
