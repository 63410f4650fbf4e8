//! TLS options
//!
//! This module provides the peer role, protocol version and cipher settings used
//! to build a TLS context, plus the errors shared by the TLS module.

use std::fmt;

/// TLS version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TlsVersion {
    /// TLS 1.0 (never accepted for new contexts)
    Tls10,
    /// TLS 1.1 (never accepted for new contexts)
    Tls11,
    /// TLS 1.2
    Tls12,
    /// TLS 1.3
    Tls13,
}

impl TlsVersion {
    /// Parse TLS version from string (case-insensitive)
    pub fn from_str(s: &str) -> Result<Self, TlsError> {
        match s.to_uppercase().as_str() {
            "TLSV1.0" | "TLS1.0" | "TLSV1" | "TLS1" => Ok(TlsVersion::Tls10),
            "TLSV1.1" | "TLS1.1" | "TLSV1_1" => Ok(TlsVersion::Tls11),
            "TLSV1.2" | "TLS1.2" | "TLSV1_2" => Ok(TlsVersion::Tls12),
            "TLSV1.3" | "TLS1.3" | "TLSV1_3" => Ok(TlsVersion::Tls13),
            _ => Err(TlsError::InvalidVersion(s.to_string())),
        }
    }

    /// Get OpenSSL protocol version constant
    pub fn to_openssl_version(&self) -> openssl::ssl::SslVersion {
        use openssl::ssl::SslVersion;
        match self {
            TlsVersion::Tls10 => SslVersion::TLS1,
            TlsVersion::Tls11 => SslVersion::TLS1_1,
            TlsVersion::Tls12 => SslVersion::TLS1_2,
            TlsVersion::Tls13 => SslVersion::TLS1_3,
        }
    }

    /// Get version as string
    pub fn as_str(&self) -> &'static str {
        match self {
            TlsVersion::Tls10 => "TLSv1.0",
            TlsVersion::Tls11 => "TLSv1.1",
            TlsVersion::Tls12 => "TLSv1.2",
            TlsVersion::Tls13 => "TLSv1.3",
        }
    }

    /// Whether new contexts may be built with this version as their minimum
    pub fn is_supported(&self) -> bool {
        *self >= TlsVersion::Tls12
    }
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of the local end of the connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerType {
    Client,
    Server,
}

/// TLS errors
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid TLS version: {0}")]
    InvalidVersion(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Certificate error: {0}")]
    Certificate(String),

    #[error("Failed to allocate TLS context: {0}")]
    Allocation(String),

    #[error("TLS configuration rejected: {0}")]
    Configuration(String),
}

const TLS13_CIPHERS: &[&str] = &[
    "TLS_AES_128_GCM_SHA256",
    "TLS_AES_256_GCM_SHA384",
    "TLS_CHACHA20_POLY1305_SHA256",
];

const TLS12_CIPHERS: &[&str] = &[
    "ECDHE-ECDSA-AES128-GCM-SHA256",
    "ECDHE-RSA-AES128-GCM-SHA256",
    "ECDHE-ECDSA-AES256-GCM-SHA384",
    "ECDHE-RSA-AES256-GCM-SHA384",
    "ECDHE-ECDSA-CHACHA20-POLY1305",
    "ECDHE-RSA-CHACHA20-POLY1305",
];

/// Options for building a TLS context
///
/// Defaults describe a strict TLS 1.3 client. Talking to servers that have not
/// been hardened may require lowering the minimum version and validating with
/// `strict = false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SslOptions {
    peer_type: PeerType,
    peer_certificate_path: Option<String>,
    private_key_path: Option<String>,
    minimum_supported_protocol_version: TlsVersion,
    ciphers: Vec<String>,
}

impl SslOptions {
    /// Default options for a TLS 1.3 client
    pub fn client() -> Self {
        Self::new(PeerType::Client)
    }

    /// Default options for a TLS 1.3 server; a certificate path is still required
    pub fn server() -> Self {
        Self::new(PeerType::Server)
    }

    pub fn new(peer_type: PeerType) -> Self {
        SslOptions {
            peer_type,
            peer_certificate_path: None,
            private_key_path: None,
            minimum_supported_protocol_version: TlsVersion::Tls13,
            ciphers: TLS13_CIPHERS.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Recommended cipher suites for a protocol version
    ///
    /// TLS 1.3 gets the AEAD suites, TLS 1.2 the ECDHE suites (OpenSSL names).
    /// See <https://ssl-config.mozilla.org> and the OWASP TLS cheat sheet.
    pub fn default_cipher_list(version: TlsVersion) -> Result<Vec<String>, TlsError> {
        let ciphers = match version {
            TlsVersion::Tls13 => TLS13_CIPHERS,
            TlsVersion::Tls12 => TLS12_CIPHERS,
            other => {
                return Err(TlsError::Unsupported(format!(
                    "No cipher list for protocol version {}",
                    other
                )))
            }
        };
        Ok(ciphers.iter().map(|c| c.to_string()).collect())
    }

    pub fn peer_type(&self) -> PeerType {
        self.peer_type
    }

    pub fn set_peer_type(&mut self, peer_type: PeerType) {
        self.peer_type = peer_type;
    }

    /// Path, in the certificate store, of this peer's own certificate
    pub fn peer_certificate_path(&self) -> Option<&str> {
        self.peer_certificate_path.as_deref()
    }

    pub fn set_peer_certificate_path(&mut self, path: impl Into<String>) {
        self.peer_certificate_path = Some(path.into());
    }

    /// Path, in the key store, of this peer's private key
    ///
    /// When unset the key is read from the certificate path, which suits PEM
    /// bundles holding both certificate and key.
    pub fn private_key_path(&self) -> Option<&str> {
        self.private_key_path.as_deref()
    }

    pub fn set_private_key_path(&mut self, path: impl Into<String>) {
        self.private_key_path = Some(path.into());
    }

    pub fn minimum_supported_protocol_version(&self) -> TlsVersion {
        self.minimum_supported_protocol_version
    }

    pub fn set_minimum_supported_protocol_version(&mut self, version: TlsVersion) {
        self.minimum_supported_protocol_version = version;
    }

    /// Requested cipher suites; checked by the TLS library when the context is built
    pub fn ciphers(&self) -> &[String] {
        &self.ciphers
    }

    pub fn set_ciphers<I, S>(&mut self, ciphers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ciphers = ciphers.into_iter().map(Into::into).collect();
    }

    /// Set the certificate path (builder style)
    pub fn with_peer_certificate_path(mut self, path: impl Into<String>) -> Self {
        self.set_peer_certificate_path(path);
        self
    }

    /// Set the private key path (builder style)
    pub fn with_private_key_path(mut self, path: impl Into<String>) -> Self {
        self.set_private_key_path(path);
        self
    }

    /// Set the minimum protocol version (builder style)
    pub fn with_minimum_version(mut self, version: TlsVersion) -> Self {
        self.set_minimum_supported_protocol_version(version);
        self
    }

    /// Set the cipher list (builder style)
    pub fn with_ciphers<I, S>(mut self, ciphers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_ciphers(ciphers);
        self
    }

    /// Sanity check the combination of options
    ///
    /// A server must have a certificate path. With `strict`, the minimum
    /// version must be TLS 1.3. Versions below TLS 1.2 are never accepted.
    pub fn validate(&self, strict: bool) -> Result<(), TlsError> {
        let version = self.minimum_supported_protocol_version;
        if !version.is_supported() {
            return Err(TlsError::Unsupported(format!(
                "Protocol version {} is not supported",
                version
            )));
        }
        if strict && version != TlsVersion::Tls13 {
            return Err(TlsError::InvalidConfig(
                "Only TLS 1.3 is supported in strict mode".to_string(),
            ));
        }
        if self.peer_type == PeerType::Server && self.peer_certificate_path.is_none() {
            return Err(TlsError::InvalidConfig(
                "Server mode requires a peer certificate path".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SslOptions {
    fn default() -> Self {
        Self::client()
    }
}
