//! ICP network endpoint configuration
//!
//! This crate resolves logical endpoint addresses (`quic://host:port`,
//! `tcp+tls://host`, ...) against a protocol registry and builds validated
//! TLS contexts from pluggable certificate, key and revocation sources.
//! The transport layer that performs socket I/O consumes both.

pub mod net;
pub mod tls;
