//! Certificate authority and revocation policy
//!
//! A `CertificateAuthority` decides which peers are trusted: certificates chaining
//! to a CA (the platform store, or an override CA certificate) plus any pinned
//! peer certificates. Revocation is checked through CRLs or OCSP.

use std::path::{Path, PathBuf};
use url::Url;

/// Certificate revocation list (CRL) settings
///
/// With neither a path nor a URL, CRLs are expected in the CA trust material.
/// For the platform CA store that is OpenSSL's hashed certificate directory
/// (`<hash>.r0` files); an override CA needs an explicit `crl_path`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Crl {
    crl_path: Option<PathBuf>,
    crl_url: Option<Url>,
}

impl Crl {
    pub fn new(crl_path: Option<PathBuf>, crl_url: Option<Url>) -> Self {
        Crl { crl_path, crl_url }
    }

    /// Filesystem path to a PEM CRL file
    ///
    /// Unlike certificates and keys this is not read through the PKI
    /// environment's stores: OpenSSL loads it directly from the local
    /// filesystem, so relative paths resolve against the working directory.
    pub fn crl_path(&self) -> Option<&Path> {
        self.crl_path.as_deref()
    }

    /// HTTP URL the CRL is published at
    pub fn crl_url(&self) -> Option<&Url> {
        self.crl_url.as_ref()
    }
}

/// Online Certificate Status Protocol (OCSP) settings
///
/// Without an override URL, the responder named in the certificate is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ocsp {
    override_url: Option<Url>,
    stapling_enabled: bool,
}

impl Ocsp {
    pub fn new(override_url: Option<Url>, stapling_enabled: bool) -> Self {
        Ocsp {
            override_url,
            stapling_enabled,
        }
    }

    pub fn override_url(&self) -> Option<&Url> {
        self.override_url.as_ref()
    }

    /// Whether servers staple cached OCSP responses into the handshake
    pub fn is_stapling_enabled(&self) -> bool {
        self.stapling_enabled
    }
}

impl Default for Ocsp {
    fn default() -> Self {
        Ocsp::new(None, true)
    }
}

/// Mechanism used to check whether a certificate was revoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevocationMethod {
    Crl(Crl),
    Ocsp(Ocsp),
}

impl Default for RevocationMethod {
    fn default() -> Self {
        RevocationMethod::Ocsp(Ocsp::default())
    }
}

impl From<Crl> for RevocationMethod {
    fn from(crl: Crl) -> Self {
        RevocationMethod::Crl(crl)
    }
}

impl From<Ocsp> for RevocationMethod {
    fn from(ocsp: Ocsp) -> Self {
        RevocationMethod::Ocsp(ocsp)
    }
}

/// Authority for verifying peer certificates
///
/// The defaults use the platform CA store with OCSP revocation checking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateAuthority {
    override_ca_certificate_path: Option<String>,
    trusted_peer_certificate_paths: Vec<String>,
    revocation_method: RevocationMethod,
}

impl CertificateAuthority {
    pub fn new(
        override_ca_certificate_path: Option<String>,
        revocation_method: RevocationMethod,
    ) -> Self {
        CertificateAuthority {
            override_ca_certificate_path,
            trusted_peer_certificate_paths: Vec::new(),
            revocation_method,
        }
    }

    /// Path, in the certificate store, of a CA certificate replacing the platform store
    pub fn override_ca_certificate_path(&self) -> Option<&str> {
        self.override_ca_certificate_path.as_deref()
    }

    /// Pinned peer certificate paths, in the order they were added
    pub fn trusted_peer_certificate_paths(&self) -> &[String] {
        &self.trusted_peer_certificate_paths
    }

    /// Trust a peer certificate directly, in addition to CA-verified ones
    pub fn add_trusted_peer_certificate(&mut self, cert_path: impl Into<String>) {
        self.trusted_peer_certificate_paths.push(cert_path.into());
    }

    pub fn revocation_method(&self) -> &RevocationMethod {
        &self.revocation_method
    }
}
