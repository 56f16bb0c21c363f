//! Signalpost relay server library.
//!
//! Exposes the relay for use in tests and embedding. Peers join rooms,
//! post offers, answers and ICE candidates addressed to each other, and
//! poll for whatever was addressed to them. The relay keeps everything in
//! memory and never inspects the negotiation payloads it carries.

pub mod config;
pub mod error;
pub mod relay;
pub mod rooms;
pub mod server;
pub mod store;
