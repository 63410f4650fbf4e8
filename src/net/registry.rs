//! Protocol registry
//!
//! The standard registry declares the five protocols the client library speaks:
//! `quic`, `tcp`, `tcp+tls` (binary messaging) and `http`, `http+tls` (JSON messaging).

use super::protocol::{
    normalize_protocol_name, MessageEncoding, ProtocolDefinition, ProtocolProvider, Transport,
};
use super::{
    Error, Result, DEFAULT_HTTP_PORT, DEFAULT_QUIC_PORT, DEFAULT_TCP_PORT, HTTP_PROTOCOL,
    HTTP_TLS_PROTOCOL, QUIC_PROTOCOL, TCP_PROTOCOL, TCP_TLS_PROTOCOL,
};
use std::collections::HashMap;

/// Immutable table of protocol definitions indexed by normalized name
#[derive(Debug, Clone)]
pub struct ProtocolRegistry {
    protocols: Vec<ProtocolDefinition>,
    index: HashMap<String, usize>,
}

impl ProtocolRegistry {
    /// Build a registry from a list of definitions
    ///
    /// Registration order is preserved. Duplicate names are rejected.
    pub fn new(protocols: Vec<ProtocolDefinition>) -> Result<Self> {
        let mut index = HashMap::with_capacity(protocols.len());
        for (pos, def) in protocols.iter().enumerate() {
            if index.insert(def.name().to_string(), pos).is_some() {
                return Err(Error::InvalidArgument(format!(
                    "Duplicate protocol definition: {}",
                    def.name()
                )));
            }
        }

        Ok(ProtocolRegistry { protocols, index })
    }

    /// Registry with all protocols supported by the client library
    pub fn standard() -> Self {
        let protocols = [
            (QUIC_PROTOCOL, DEFAULT_QUIC_PORT, Transport::Quic, true, MessageEncoding::Binary),
            (TCP_PROTOCOL, DEFAULT_TCP_PORT, Transport::Tcp, false, MessageEncoding::Binary),
            (TCP_TLS_PROTOCOL, DEFAULT_TCP_PORT, Transport::Tcp, true, MessageEncoding::Binary),
            (HTTP_PROTOCOL, DEFAULT_HTTP_PORT, Transport::Http, false, MessageEncoding::Text),
            (HTTP_TLS_PROTOCOL, DEFAULT_HTTP_PORT, Transport::Http, true, MessageEncoding::Text),
        ];

        let protocols: Vec<ProtocolDefinition> = protocols
            .into_iter()
            .map(|(name, port, transport, tls, encoding)| {
                ProtocolDefinition::canonical(name, port, transport, tls, encoding)
            })
            .collect();
        let index = protocols
            .iter()
            .enumerate()
            .map(|(pos, def)| (def.name().to_string(), pos))
            .collect();

        ProtocolRegistry { protocols, index }
    }

    /// Number of registered protocols
    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }
}

impl Default for ProtocolRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl ProtocolProvider for ProtocolRegistry {
    fn supported_protocols(&self) -> &[ProtocolDefinition] {
        &self.protocols
    }

    fn protocol_definition(&self, protocol: &str) -> Result<&ProtocolDefinition> {
        let name = normalize_protocol_name(protocol)
            .map_err(|_| Error::UnsupportedProtocol(protocol.to_string()))?;
        self.index
            .get(&name)
            .map(|&pos| &self.protocols[pos])
            .ok_or_else(|| Error::UnsupportedProtocol(protocol.to_string()))
    }

    fn is_supported(&self, protocol: &str) -> bool {
        match normalize_protocol_name(protocol) {
            Ok(name) => self.index.contains_key(&name),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_protocols() {
        let registry = ProtocolRegistry::standard();
        assert_eq!(registry.len(), 5);

        let names: Vec<&str> = registry
            .supported_protocols()
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(names, vec!["quic", "tcp", "tcp+tls", "http", "http+tls"]);
    }

    #[test]
    fn test_supported_definitions() {
        let registry = ProtocolRegistry::standard();
        let table = [
            ("quic", true, 8080),
            ("tcp", false, 8090),
            ("tcp+tls", true, 8090),
            ("http", false, 3000),
            ("http+tls", true, 3000),
        ];

        for (name, tls, port) in table {
            assert!(registry.is_supported(name), "{} should be supported", name);
            let def = registry.protocol_definition(name).unwrap();
            assert_eq!(def.name(), normalize_protocol_name(name).unwrap());
            assert_eq!(def.is_tls_supported(), tls);
            assert_eq!(def.default_port(), port);
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = ProtocolRegistry::standard();
        assert!(registry.is_supported(" TCP+TLS "));
        assert_eq!(registry.protocol_definition("Quic").unwrap().name(), "quic");
    }

    #[test]
    fn test_unsupported_protocol() {
        let registry = ProtocolRegistry::standard();
        assert!(!registry.is_supported("ftp"));
        assert!(!registry.is_supported(""));
        assert!(matches!(
            registry.protocol_definition("ftp"),
            Err(Error::UnsupportedProtocol(_))
        ));
        assert!(matches!(
            registry.protocol_definition("  "),
            Err(Error::UnsupportedProtocol(_))
        ));
    }

    #[test]
    fn test_duplicate_definitions_rejected() {
        let defs = vec![
            ProtocolDefinition::new("tcp", 1, Transport::Tcp, false, MessageEncoding::Binary).unwrap(),
            ProtocolDefinition::new("TCP", 2, Transport::Tcp, false, MessageEncoding::Binary).unwrap(),
        ];
        assert!(matches!(
            ProtocolRegistry::new(defs),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_custom_registry_keeps_order() {
        let defs = vec![
            ProtocolDefinition::new("wss", 443, Transport::Http, true, MessageEncoding::Text).unwrap(),
            ProtocolDefinition::new("ws", 80, Transport::Http, false, MessageEncoding::Text).unwrap(),
        ];
        let registry = ProtocolRegistry::new(defs).unwrap();
        assert_eq!(registry.supported_protocols()[0].name(), "wss");
        assert_eq!(registry.supported_protocols()[1].name(), "ws");
        assert!(!registry.is_supported("quic"));
    }
}
