//! Protocol and address resolution
//!
//! This module turns logical address strings into host/port/protocol triples,
//! using a registry of supported protocols for validation and default ports.
//!
//! # Examples
//!
//! ```
//! use icp_net::net::{ProtocolProvider, ProtocolRegistry};
//!
//! let registry = ProtocolRegistry::standard();
//! let address = registry.create_address("quic://localhost").unwrap();
//!
//! assert_eq!(address.protocol(), "quic");
//! assert_eq!(address.host(), "localhost");
//! assert_eq!(address.port(), 8080);
//! assert!(address.definition().is_tls_supported());
//! ```

pub mod address;
pub mod protocol;
pub mod registry;

pub use address::LogicalAddress;
pub use protocol::{
    normalize_protocol_name, MessageEncoding, ProtocolDefinition, ProtocolProvider, Transport,
};
pub use registry::ProtocolRegistry;

/// Result type for address resolution
pub type Result<T> = std::result::Result<T, Error>;

/// Address resolution errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Port out of range: {0}")]
    OutOfRange(String),

    #[error("Unsupported protocol: {0}")]
    UnsupportedProtocol(String),
}

/// Default QUIC port
pub const DEFAULT_QUIC_PORT: u16 = 8080;

/// Default TCP port (plain and TLS)
pub const DEFAULT_TCP_PORT: u16 = 8090;

/// Default HTTP port (plain and TLS)
pub const DEFAULT_HTTP_PORT: u16 = 3000;

pub const QUIC_PROTOCOL: &str = "quic";
pub const TCP_PROTOCOL: &str = "tcp";
pub const TCP_TLS_PROTOCOL: &str = "tcp+tls";
pub const HTTP_PROTOCOL: &str = "http";
pub const HTTP_TLS_PROTOCOL: &str = "http+tls";
