//! PKI environment
//!
//! The PKI environment bundles where trust and credentials come from: the
//! certificate authority, the certificate store and the key store. The defaults
//! read PEM files from the current working directory and trust the platform CA
//! store with OCSP revocation checking.

use super::authority::CertificateAuthority;
use super::config::TlsError;
use super::store::{CertificateStore, KeyStore, LocalCertificateStore, LocalKeyStore};
use std::sync::Arc;

/// Installs settings into a TLS library handle
///
/// `H` is the library-specific handle being configured; each supported TLS
/// back end provides its own implementations.
pub trait Configurable<H> {
    fn configure(&self, handle: &mut H, pki_env: &PkiEnvironment) -> Result<(), TlsError>;
}

/// Trust and credential sources for a TLS context
#[derive(Debug, Clone)]
pub struct PkiEnvironment {
    cert_auth: CertificateAuthority,
    cert_store: Arc<dyn CertificateStore>,
    key_store: Arc<dyn KeyStore>,
}

impl PkiEnvironment {
    /// Environment using the default authority and the shared local stores
    pub fn new() -> Result<Self, TlsError> {
        Ok(PkiEnvironment {
            cert_auth: CertificateAuthority::default(),
            cert_store: LocalCertificateStore::shared()?,
            key_store: LocalKeyStore::shared()?,
        })
    }

    pub fn with_stores(
        cert_auth: CertificateAuthority,
        cert_store: Arc<dyn CertificateStore>,
        key_store: Arc<dyn KeyStore>,
    ) -> Self {
        PkiEnvironment {
            cert_auth,
            cert_store,
            key_store,
        }
    }

    /// Authority used to verify peer certificates
    pub fn certificate_authority(&self) -> &CertificateAuthority {
        &self.cert_auth
    }

    pub fn certificate_authority_mut(&mut self) -> &mut CertificateAuthority {
        &mut self.cert_auth
    }

    /// Replace the authority, e.g. with a private CA
    pub fn set_certificate_authority(&mut self, cert_auth: CertificateAuthority) {
        self.cert_auth = cert_auth;
    }

    /// Store for this peer's certificate, CA overrides and pinned peer certificates
    pub fn certificate_store(&self) -> &dyn CertificateStore {
        self.cert_store.as_ref()
    }

    pub fn set_certificate_store(&mut self, cert_store: Arc<dyn CertificateStore>) {
        self.cert_store = cert_store;
    }

    /// Store for private key material
    pub fn key_store(&self) -> &dyn KeyStore {
        self.key_store.as_ref()
    }

    pub fn set_key_store(&mut self, key_store: Arc<dyn KeyStore>) {
        self.key_store = key_store;
    }
}

/// Trust settings always go in before any credential is loaded.
impl<H> Configurable<H> for PkiEnvironment
where
    CertificateAuthority: Configurable<H>,
{
    fn configure(&self, handle: &mut H, pki_env: &PkiEnvironment) -> Result<(), TlsError> {
        self.cert_auth.configure(handle, pki_env)
    }
}
