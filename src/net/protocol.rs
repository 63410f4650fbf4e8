//! Protocol metadata
//!
//! This module defines the protocol definition value type, the protocol name
//! normalisation rule and the `ProtocolProvider` trait that registries implement.

use super::address::LogicalAddress;
use super::{Error, Result};
use std::fmt;

/// Network transport underneath a protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// QUIC over UDP
    Quic,
    /// Binary protocol over TCP/IP
    Tcp,
    /// HTTP REST encoded as JSON
    Http,
}

impl Transport {
    /// Get transport as string
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Quic => "QUIC",
            Transport::Tcp => "TCP",
            Transport::Http => "HTTP",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message encoding carried by a protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageEncoding {
    Binary,
    Text,
}

/// Normalize a protocol name to its canonical form (lowercase, trimmed)
///
/// Fails with `Error::InvalidArgument` if nothing is left after trimming.
pub fn normalize_protocol_name(raw: &str) -> Result<String> {
    let trimmed = raw.trim_matches(|c: char| c.is_ascii_whitespace() || c == '\x0b');
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument(
            "Protocol name cannot be empty".to_string(),
        ));
    }
    Ok(trimmed.to_ascii_lowercase())
}

/// Metadata about a protocol: default port, transport, TLS support and encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolDefinition {
    name: String,
    default_port: u16,
    transport: Transport,
    tls_supported: bool,
    message_encoding: MessageEncoding,
}

impl ProtocolDefinition {
    /// Create a new protocol definition; the name is normalized
    pub fn new(
        name: &str,
        default_port: u16,
        transport: Transport,
        tls_supported: bool,
        message_encoding: MessageEncoding,
    ) -> Result<Self> {
        Ok(ProtocolDefinition {
            name: normalize_protocol_name(name)?,
            default_port,
            transport,
            tls_supported,
            message_encoding,
        })
    }

    /// Definition for a name already in canonical form
    pub(crate) fn canonical(
        name: &'static str,
        default_port: u16,
        transport: Transport,
        tls_supported: bool,
        message_encoding: MessageEncoding,
    ) -> Self {
        debug_assert_eq!(name, name.trim().to_ascii_lowercase());
        ProtocolDefinition {
            name: name.to_string(),
            default_port,
            transport,
            tls_supported,
            message_encoding,
        }
    }

    /// Canonical protocol name, e.g. `tcp+tls`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Port used when an address does not carry one
    pub fn default_port(&self) -> u16 {
        self.default_port
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Whether the protocol runs over TLS; insecure and TLS variants are separate protocols
    pub fn is_tls_supported(&self) -> bool {
        self.tls_supported
    }

    pub fn message_encoding(&self) -> MessageEncoding {
        self.message_encoding
    }
}

/// Source of supported protocol definitions
///
/// Implementations are immutable once built so lookups can be shared across threads.
pub trait ProtocolProvider: fmt::Debug + Send + Sync {
    /// All supported protocols, in registration order
    fn supported_protocols(&self) -> &[ProtocolDefinition];

    /// Look up a protocol by name (normalized before lookup)
    fn protocol_definition(&self, protocol: &str) -> Result<&ProtocolDefinition>;

    /// Test whether the protocol is supported; empty names are never supported
    fn is_supported(&self, protocol: &str) -> bool;

    /// Parse a URL into a logical address in the context of this provider
    fn create_address(&self, url: &str) -> Result<LogicalAddress<'_>>
    where
        Self: Sized,
    {
        LogicalAddress::parse(url, self)
    }
}
