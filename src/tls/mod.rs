//! TLS context configuration
//!
//! This module builds native TLS contexts for ICP clients and servers. Settings
//! are split the same way for both roles:
//!
//! 1. `SslOptions` holds the peer role, minimum protocol version, cipher list
//!    and the paths of this peer's own certificate and key
//! 2. `PkiEnvironment` holds the `CertificateAuthority` (trusted CAs, pinned
//!    peers, revocation method) and the stores credentials are read from
//! 3. `TlsContext` combines the two into a native handle and owns it
//!
//! Every settings type installs itself into the native library through the
//! `Configurable` trait, so a second TLS library only needs a `TlsBackend`
//! implementation plus `Configurable` impls for its builder type.
//!
//! # Examples
//!
//! ## Client trusting a private CA
//!
//! ```no_run
//! use icp_net::tls::{CertificateAuthority, PkiEnvironment, RevocationMethod, SslOptions, TlsContext};
//!
//! let mut pki_env = PkiEnvironment::new().unwrap();
//! pki_env.set_certificate_authority(CertificateAuthority::new(
//!     Some("certs/ca.pem".to_string()),
//!     RevocationMethod::default(),
//! ));
//!
//! let ctx = TlsContext::new(SslOptions::client(), pki_env).unwrap();
//! let ssl = openssl::ssl::Ssl::new(ctx.native_handle().unwrap()).unwrap();
//! ```
//!
//! ## TLS 1.2 server
//!
//! ```no_run
//! use icp_net::tls::{PkiEnvironment, SslOptions, TlsContext, TlsVersion};
//!
//! let options = SslOptions::server()
//!     .with_peer_certificate_path("certs/server.pem")
//!     .with_private_key_path("keys/server.key")
//!     .with_minimum_version(TlsVersion::Tls12)
//!     .with_ciphers(SslOptions::default_cipher_list(TlsVersion::Tls12).unwrap());
//! options.validate(false).unwrap();
//!
//! let ctx = TlsContext::new(options, PkiEnvironment::new().unwrap()).unwrap();
//! ```

pub mod authority;
pub mod cert;
pub mod config;
pub mod context;
pub mod native;
pub mod pki;
pub mod store;

pub use authority::{CertificateAuthority, Crl, Ocsp, RevocationMethod};
pub use cert::{CertInfo, CertificateFormat};
pub use config::{PeerType, SslOptions, TlsError, TlsVersion};
pub use context::{ContextState, TlsBackend, TlsContext};
pub use native::{NativeBuilder, OpenSsl};
pub use pki::{Configurable, PkiEnvironment};
pub use store::{CertificateStore, KeyStore, LocalCertificateStore, LocalKeyStore};

use once_cell::sync::OnceCell;

/// Result type for TLS operations
pub type Result<T> = std::result::Result<T, TlsError>;

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// Initialise the TLS library once per process
///
/// Context construction calls this itself; calling it earlier only moves the
/// cost to a predictable point.
pub fn ensure_initialized() {
    INITIALIZED.get_or_init(|| {
        openssl::init();
        tracing::debug!(version = openssl::version::version(), "initialized OpenSSL");
    });
}

pub fn is_initialized() -> bool {
    INITIALIZED.get().is_some()
}
