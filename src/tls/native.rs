//! OpenSSL back end
//!
//! Builds `openssl::ssl::SslContext` handles. The cipher list is split by name:
//! entries starting with `TLS_` are TLS 1.3 suites and go to
//! `set_ciphersuites`, everything else is passed to `set_cipher_list`.

use super::authority::{CertificateAuthority, Crl, Ocsp, RevocationMethod};
use super::cert::{decode_certificates, decode_private_key, CertInfo};
use super::config::{PeerType, SslOptions, TlsError, TlsVersion};
use super::context::{TlsBackend, TlsContext};
use super::pki::{Configurable, PkiEnvironment};
use openssl::ocsp::{OcspResponse, OcspResponseStatus};
use openssl::ssl::{SslContext, SslContextBuilder, SslFiletype, SslMethod, SslVerifyMode};
use openssl::x509::store::{X509Lookup, X509StoreRef};
use openssl::x509::verify::X509VerifyFlags;
use openssl::x509::X509;

/// The OpenSSL TLS library
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenSsl;

/// An OpenSSL context under construction
pub struct NativeBuilder {
    builder: SslContextBuilder,
    peer_type: PeerType,
}

impl NativeBuilder {
    pub fn peer_type(&self) -> PeerType {
        self.peer_type
    }

    /// Raw OpenSSL builder, for settings this crate does not cover
    pub fn builder_mut(&mut self) -> &mut SslContextBuilder {
        &mut self.builder
    }
}

impl TlsBackend for OpenSsl {
    type Builder = NativeBuilder;
    type Handle = SslContext;

    fn ensure_initialized() {
        super::ensure_initialized();
    }

    fn allocate(peer_type: PeerType, version: TlsVersion) -> Result<NativeBuilder, TlsError> {
        let method = match peer_type {
            PeerType::Client => SslMethod::tls_client(),
            PeerType::Server => SslMethod::tls_server(),
        };
        let mut builder =
            SslContextBuilder::new(method).map_err(|e| TlsError::Allocation(e.to_string()))?;

        builder
            .set_min_proto_version(Some(version.to_openssl_version()))
            .map_err(|e| {
                TlsError::Configuration(format!("Failed to set minimum version {}: {}", version, e))
            })?;

        Ok(NativeBuilder { builder, peer_type })
    }

    fn install_ciphers(handle: &mut NativeBuilder, ciphers: &[String]) -> Result<(), TlsError> {
        let (tls13, legacy): (Vec<&str>, Vec<&str>) = ciphers
            .iter()
            .map(String::as_str)
            .partition(|c| c.starts_with("TLS_"));

        // An empty list still goes to OpenSSL, which rejects it
        if !legacy.is_empty() || tls13.is_empty() {
            let list = legacy.join(":");
            handle.builder.set_cipher_list(&list).map_err(|e| {
                TlsError::Configuration(format!("Cipher list '{}' rejected: {}", list, e))
            })?;
        }
        if !tls13.is_empty() {
            let list = tls13.join(":");
            handle.builder.set_ciphersuites(&list).map_err(|e| {
                TlsError::Configuration(format!("Cipher suites '{}' rejected: {}", list, e))
            })?;
        }

        tracing::trace!(tls13 = ?tls13, legacy = ?legacy, "installed ciphers");
        Ok(())
    }

    fn finish(handle: NativeBuilder) -> SslContext {
        handle.builder.build()
    }
}

impl TlsContext<OpenSsl> {
    /// Trusted certificate store of the live context
    pub fn cert_manager(&self) -> Option<&X509StoreRef> {
        self.native_handle().map(|ctx| ctx.cert_store())
    }
}

fn load_certificates(pki_env: &PkiEnvironment, cert_path: &str) -> Result<Vec<X509>, TlsError> {
    let store = pki_env.certificate_store();
    let data = store.get_certificate(cert_path)?;
    decode_certificates(&data, store.format())
}

fn trust(handle: &mut NativeBuilder, certs: Vec<X509>, cert_path: &str) -> Result<(), TlsError> {
    for cert in certs {
        let info = CertInfo::from_x509(&cert);
        tracing::debug!(path = cert_path, subject = %info.subject, issuer = %info.issuer, "trusting certificate");
        handle.builder.cert_store_mut().add_cert(cert)?;
    }
    Ok(())
}

impl Configurable<NativeBuilder> for CertificateAuthority {
    fn configure(&self, handle: &mut NativeBuilder, pki_env: &PkiEnvironment) -> Result<(), TlsError> {
        match self.override_ca_certificate_path() {
            Some(ca_path) => {
                let certs = load_certificates(pki_env, ca_path)?;
                trust(handle, certs, ca_path)?;
            }
            None => {
                tracing::debug!("using platform CA store");
                handle.builder.set_default_verify_paths()?;
            }
        }

        for peer_path in self.trusted_peer_certificate_paths() {
            let certs = load_certificates(pki_env, peer_path)?;
            trust(handle, certs, peer_path)?;
        }

        let mode = match handle.peer_type {
            PeerType::Client => SslVerifyMode::PEER,
            PeerType::Server if !self.trusted_peer_certificate_paths().is_empty() => {
                SslVerifyMode::PEER | SslVerifyMode::FAIL_IF_NO_PEER_CERT
            }
            PeerType::Server => SslVerifyMode::NONE,
        };
        handle.builder.set_verify(mode);

        self.revocation_method().configure(handle, pki_env)
    }
}

impl Configurable<NativeBuilder> for RevocationMethod {
    fn configure(&self, handle: &mut NativeBuilder, pki_env: &PkiEnvironment) -> Result<(), TlsError> {
        match self {
            RevocationMethod::Crl(crl) => crl.configure(handle, pki_env),
            RevocationMethod::Ocsp(ocsp) => ocsp.configure(handle, pki_env),
        }
    }
}

impl Configurable<NativeBuilder> for Crl {
    fn configure(&self, handle: &mut NativeBuilder, pki_env: &PkiEnvironment) -> Result<(), TlsError> {
        if let Some(url) = self.crl_url() {
            tracing::debug!(%url, "CRL distribution point");
        }

        let store = handle.builder.cert_store_mut();
        match self.crl_path() {
            Some(crl_path) => {
                if !crl_path.is_file() {
                    return Err(TlsError::InvalidArgument(format!(
                        "CRL file does not exist: {}",
                        crl_path.display()
                    )));
                }
                tracing::debug!(path = %crl_path.display(), "loading CRL");
                store
                    .add_lookup(X509Lookup::file())?
                    .load_crl_file(crl_path, SslFiletype::PEM)
                    .map_err(|e| {
                        TlsError::Certificate(format!(
                            "Failed to load CRL {}: {}",
                            crl_path.display(),
                            e
                        ))
                    })?;
            }
            // Override CAs arrive as bytes from the certificate store; CRLs
            // bundled with them cannot reach the X509 store, so every peer
            // would fail verification.
            None if pki_env
                .certificate_authority()
                .override_ca_certificate_path()
                .is_some() =>
            {
                return Err(TlsError::Configuration(
                    "CRL checking with an override CA requires a CRL file".to_string(),
                ));
            }
            None => {
                tracing::debug!("expecting CRLs alongside the platform CA certificates");
            }
        }

        store.set_flags(X509VerifyFlags::CRL_CHECK | X509VerifyFlags::CRL_CHECK_ALL)?;
        Ok(())
    }
}

impl Configurable<NativeBuilder> for Ocsp {
    fn configure(&self, handle: &mut NativeBuilder, _pki_env: &PkiEnvironment) -> Result<(), TlsError> {
        if let Some(url) = self.override_url() {
            tracing::debug!(%url, "OCSP responder override");
        }

        if !self.is_stapling_enabled() {
            return Ok(());
        }

        match handle.peer_type {
            // Sessions opt in with `SslRef::set_status_type`; without a
            // staple the handshake proceeds on the chain check alone.
            PeerType::Client => {
                handle.builder.set_status_callback(|ssl| match ssl.ocsp_status() {
                    Some(der) => {
                        let response = OcspResponse::from_der(der)?;
                        let ok = response.status() == OcspResponseStatus::SUCCESSFUL;
                        if !ok {
                            tracing::debug!("stapled OCSP response was not successful");
                        }
                        Ok(ok)
                    }
                    None => Ok(true),
                })?;
            }
            PeerType::Server => {
                tracing::trace!("OCSP stapling enabled; responses are supplied per session");
            }
        }
        Ok(())
    }
}

/// Loads this peer's certificate chain and private key.
impl Configurable<NativeBuilder> for SslOptions {
    fn configure(&self, handle: &mut NativeBuilder, pki_env: &PkiEnvironment) -> Result<(), TlsError> {
        let Some(cert_path) = self.peer_certificate_path() else {
            return Ok(());
        };

        let mut chain = load_certificates(pki_env, cert_path)?.into_iter();
        let leaf = chain.next().ok_or_else(|| {
            TlsError::Certificate(format!("No certificate found in {}", cert_path))
        })?;

        let info = CertInfo::from_x509(&leaf);
        tracing::debug!(
            path = cert_path,
            subject = %info.subject,
            sans = ?info.subject_alt_names,
            "loading peer certificate"
        );
        handle.builder.set_certificate(&leaf)?;
        for intermediate in chain {
            handle.builder.add_extra_chain_cert(intermediate)?;
        }

        let key_path = self.private_key_path().unwrap_or(cert_path);
        let key_store = pki_env.key_store();
        let key = decode_private_key(&key_store.get_private_key(key_path)?, key_store.format())?;
        handle
            .builder
            .set_private_key(&key)
            .and_then(|_| handle.builder.check_private_key())
            .map_err(|e| {
                TlsError::Certificate(format!("Private key does not match certificate: {}", e))
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tls::cert::tests::self_signed_pem;
    use crate::tls::context::ContextState;
    use crate::tls::store::{LocalCertificateStore, LocalKeyStore};
    use std::fs;
    use std::sync::Arc;

    /// Environment whose stores read from `dir`
    fn environment(dir: &std::path::Path, cert_auth: CertificateAuthority) -> PkiEnvironment {
        PkiEnvironment::with_stores(
            cert_auth,
            Arc::new(LocalCertificateStore::new(Some(dir)).unwrap()),
            Arc::new(LocalKeyStore::new(Some(dir)).unwrap()),
        )
    }

    fn write_credentials(dir: &std::path::Path) {
        let (cert, key) = self_signed_pem();
        fs::write(dir.join("server.pem"), &cert).unwrap();
        fs::write(dir.join("server.key"), &key).unwrap();
    }

    #[test]
    fn test_default_client_context() {
        let ctx = TlsContext::new(SslOptions::client(), PkiEnvironment::new().unwrap()).unwrap();
        assert_eq!(ctx.state(), ContextState::Ready);

        let handle = ctx.native_handle().unwrap();
        assert_eq!(handle.verify_mode(), SslVerifyMode::PEER);
        assert!(ctx.cert_manager().is_some());
    }

    #[test]
    fn test_tls12_minimum() {
        let options = SslOptions::client()
            .with_minimum_version(TlsVersion::Tls12)
            .with_ciphers(SslOptions::default_cipher_list(TlsVersion::Tls12).unwrap());
        let ctx = TlsContext::new(options, PkiEnvironment::new().unwrap()).unwrap();
        assert_eq!(ctx.state(), ContextState::Ready);
    }

    #[test]
    fn test_allocate_sets_minimum_version() {
        for version in [TlsVersion::Tls12, TlsVersion::Tls13] {
            let mut handle = OpenSsl::allocate(PeerType::Client, version).unwrap();
            assert_eq!(handle.peer_type(), PeerType::Client);
            assert_eq!(
                handle.builder_mut().min_proto_version(),
                Some(version.to_openssl_version())
            );
        }
    }

    #[test]
    fn test_unknown_cipher_rejected() {
        let options = SslOptions::client()
            .with_minimum_version(TlsVersion::Tls12)
            .with_ciphers(["NOT-A-CIPHER"]);
        let result = TlsContext::new(options, PkiEnvironment::new().unwrap());
        assert!(matches!(result, Err(TlsError::Configuration(_))));
    }

    #[test]
    fn test_empty_cipher_list_rejected() {
        let options = SslOptions::client().with_ciphers(Vec::<String>::new());
        let result = TlsContext::new(options, PkiEnvironment::new().unwrap());
        assert!(matches!(result, Err(TlsError::Configuration(_))));
    }

    #[test]
    fn test_tls11_unsupported() {
        let options = SslOptions::client().with_minimum_version(TlsVersion::Tls11);
        let result = TlsContext::new(options, PkiEnvironment::new().unwrap());
        assert!(matches!(result, Err(TlsError::Unsupported(_))));
    }

    #[test]
    fn test_clone_is_independent() {
        let ctx = TlsContext::new(SslOptions::client(), PkiEnvironment::new().unwrap()).unwrap();
        let copy = ctx.try_clone().unwrap();

        let a: *const SslContext = ctx.native_handle().unwrap();
        let b: *const SslContext = copy.native_handle().unwrap();
        assert!(!std::ptr::eq(a, b));
        assert_eq!(ctx.options(), copy.options());

        drop(ctx);
        assert_eq!(copy.state(), ContextState::Ready);
    }

    #[test]
    fn test_move_then_drop_source() {
        let mut source =
            TlsContext::new(SslOptions::client(), PkiEnvironment::new().unwrap()).unwrap();
        let moved = source.take();

        assert!(source.native_handle().is_none());
        assert!(source.cert_manager().is_none());
        drop(source);
        assert!(moved.native_handle().is_some());
    }

    #[test]
    fn test_server_with_separate_key() {
        let tmp = tempfile::tempdir().unwrap();
        write_credentials(tmp.path());

        let options = SslOptions::server()
            .with_peer_certificate_path("server.pem")
            .with_private_key_path("server.key");
        let ctx = TlsContext::new(options, environment(tmp.path(), CertificateAuthority::default()))
            .unwrap();

        let handle = ctx.native_handle().unwrap();
        assert!(handle.certificate().is_some());
        assert!(handle.private_key().is_some());
        assert_eq!(handle.verify_mode(), SslVerifyMode::NONE);
    }

    #[test]
    fn test_server_with_bundle() {
        let tmp = tempfile::tempdir().unwrap();
        let (cert, key) = self_signed_pem();
        fs::write(tmp.path().join("bundle.pem"), [cert, key].concat()).unwrap();

        let options = SslOptions::server().with_peer_certificate_path("bundle.pem");
        let ctx = TlsContext::new(options, environment(tmp.path(), CertificateAuthority::default()))
            .unwrap();
        assert!(ctx.native_handle().unwrap().certificate().is_some());
    }

    #[test]
    fn test_missing_peer_certificate() {
        let tmp = tempfile::tempdir().unwrap();
        let options = SslOptions::server().with_peer_certificate_path("absent.pem");
        let result =
            TlsContext::new(options, environment(tmp.path(), CertificateAuthority::default()));
        assert!(matches!(result, Err(TlsError::InvalidArgument(_))));
    }

    #[test]
    fn test_mismatched_key() {
        let tmp = tempfile::tempdir().unwrap();
        write_credentials(tmp.path());
        let (_, other_key) = self_signed_pem();
        fs::write(tmp.path().join("other.key"), other_key).unwrap();

        let options = SslOptions::server()
            .with_peer_certificate_path("server.pem")
            .with_private_key_path("other.key");
        let result =
            TlsContext::new(options, environment(tmp.path(), CertificateAuthority::default()));
        assert!(matches!(result, Err(TlsError::Certificate(_))));
    }

    #[test]
    #[allow(deprecated)]
    fn test_ca_override_is_trusted() {
        let tmp = tempfile::tempdir().unwrap();
        write_credentials(tmp.path());

        let ca = CertificateAuthority::new(Some("server.pem".to_string()), RevocationMethod::default());
        let ctx = TlsContext::new(SslOptions::client(), environment(tmp.path(), ca)).unwrap();

        let store = ctx.cert_manager().unwrap();
        let subjects: Vec<String> = store
            .objects()
            .iter()
            .filter_map(|o| o.x509())
            .map(|c| CertInfo::from_x509(c).subject)
            .collect();
        assert_eq!(subjects, vec!["localhost".to_string()]);
    }

    #[test]
    fn test_pinned_peers_require_client_certificates() {
        let tmp = tempfile::tempdir().unwrap();
        write_credentials(tmp.path());
        let (peer, _) = self_signed_pem();
        fs::write(tmp.path().join("peer.pem"), peer).unwrap();

        let mut ca = CertificateAuthority::default();
        ca.add_trusted_peer_certificate("peer.pem");
        let options = SslOptions::server()
            .with_peer_certificate_path("server.pem")
            .with_private_key_path("server.key");
        let ctx = TlsContext::new(options, environment(tmp.path(), ca)).unwrap();

        assert_eq!(
            ctx.native_handle().unwrap().verify_mode(),
            SslVerifyMode::PEER | SslVerifyMode::FAIL_IF_NO_PEER_CERT
        );
    }

    #[test]
    fn test_crl_file_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let crl = Crl::new(Some(tmp.path().join("absent.crl")), None);
        let ca = CertificateAuthority::new(None, crl.into());
        let result = TlsContext::new(SslOptions::client(), environment(tmp.path(), ca));
        assert!(matches!(result, Err(TlsError::InvalidArgument(_))));
    }

    #[test]
    fn test_crl_from_platform_store() {
        let tmp = tempfile::tempdir().unwrap();
        let ca = CertificateAuthority::new(None, Crl::default().into());
        let ctx = TlsContext::new(SslOptions::client(), environment(tmp.path(), ca)).unwrap();
        assert_eq!(ctx.state(), ContextState::Ready);
    }

    #[test]
    fn test_crl_with_override_ca_needs_file() {
        let tmp = tempfile::tempdir().unwrap();
        write_credentials(tmp.path());

        let ca = CertificateAuthority::new(Some("server.pem".to_string()), Crl::default().into());
        let result = TlsContext::new(SslOptions::client(), environment(tmp.path(), ca));
        assert!(matches!(result, Err(TlsError::Configuration(_))));
    }

    #[test]
    fn test_ocsp_without_stapling() {
        let tmp = tempfile::tempdir().unwrap();
        let ca = CertificateAuthority::new(None, Ocsp::new(None, false).into());
        let ctx = TlsContext::new(SslOptions::client(), environment(tmp.path(), ca)).unwrap();
        assert_eq!(ctx.state(), ContextState::Ready);
    }
}
