//! Logical addresses
//!
//! A logical address names the protocol, host and optional port of an endpoint
//! in one compact URL, e.g. `tcp+tls://broker.local:8090`. Parsing is generic
//! (scheme/host/port); the protocol provider supplies validation and defaults.

use super::protocol::{normalize_protocol_name, ProtocolDefinition, ProtocolProvider};
use super::{Error, Result};
use std::fmt;
use url::Url;

/// Address resolved against a protocol provider
///
/// Borrows its protocol definition from the provider it was created from;
/// the provider must outlive it.
#[derive(Debug, Clone)]
pub struct LogicalAddress<'r> {
    protocol: String,
    host: String,
    port: u16,
    definition: &'r ProtocolDefinition,
}

impl<'r> LogicalAddress<'r> {
    /// Parse a URL in the context of a protocol provider
    ///
    /// Fails with `InvalidArgument` if the URL cannot be parsed or has no host,
    /// `UnsupportedProtocol` if the scheme is not a supported protocol and
    /// `OutOfRange` if an explicit numeric port does not fit in 16 bits.
    ///
    /// A port equal to the scheme's well-known port is dropped by the URL
    /// parser, so `http://host:80` resolves to the `http` default port.
    pub fn parse(url: &str, provider: &'r dyn ProtocolProvider) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| match e {
            url::ParseError::InvalidPort if has_numeric_port(url) => {
                Error::OutOfRange(format!("Port number out of range in URL: {}", url))
            }
            _ => Error::InvalidArgument(format!("Invalid URL: {}: {}", url, e)),
        })?;

        let protocol = normalize_protocol_name(parsed.scheme())?;
        let definition = provider.protocol_definition(&protocol)?;

        let host = match parsed.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "URL has no host: {}",
                    url
                )))
            }
        };

        // url::Url::port() is None both when no port was given and when the
        // given port equals the scheme's well-known port (e.g. 80 for http).
        let port = parsed.port().unwrap_or_else(|| definition.default_port());

        Ok(LogicalAddress {
            protocol,
            host,
            port,
            definition,
        })
    }

    /// Protocol name; always one of the provider's supported protocols
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Hostname or raw IP address to connect to
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port to connect to; the protocol default if the URL did not carry one
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Protocol metadata from the provider
    pub fn definition(&self) -> &'r ProtocolDefinition {
        self.definition
    }

    /// Whether the endpoint must be reached over TLS
    pub fn requires_tls(&self) -> bool {
        self.definition().is_tls_supported()
    }
}

/// Whether the authority's port component is all ASCII digits
fn has_numeric_port(url: &str) -> bool {
    let Some((_, rest)) = url.split_once("://") else {
        return false;
    };
    let authority = rest
        .split(|c: char| matches!(c, '/' | '?' | '#'))
        .next()
        .unwrap_or_default();
    let host_end = authority.rfind(']').unwrap_or(0);
    match authority[host_end..].rsplit_once(':') {
        Some((_, port)) => !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

impl PartialEq for LogicalAddress<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.protocol == other.protocol && self.host == other.host && self.port == other.port
    }
}

impl Eq for LogicalAddress<'_> {}

impl fmt::Display for LogicalAddress<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.protocol, self.host, self.port)
    }
}
