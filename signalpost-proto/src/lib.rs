//! Shared protocol definitions for the Signalpost signaling relay.
//!
//! Peers talk to the relay with small JSON documents. [`signal`] holds the
//! request side (the closed [`signal::Signal`] variant and the opaque
//! [`signal::Envelope`] it relays), [`api`] holds the response bodies.

pub mod api;
pub mod signal;

pub use signal::{DEFAULT_ROOM, Envelope, Presence, Signal, SignalError, SignalKind};
