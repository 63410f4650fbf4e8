//! TLS context lifecycle
//!
//! A `TlsContext` owns one native TLS context handle built from `SslOptions`
//! and a `PkiEnvironment`. Both are retained so the context can be rebuilt.
//!
//! - `try_clone()` builds a fresh, independent handle with the same settings;
//!   native contexts are never aliased.
//! - `take()` moves the handle into a new `TlsContext` and leaves the source
//!   released, its `native_handle()` returning `None`.
//! - Dropping (or `release()`) frees a live handle exactly once.

use super::config::{PeerType, SslOptions, TlsError, TlsVersion};
use super::native::OpenSsl;
use super::pki::{Configurable, PkiEnvironment};
use std::fmt;

/// A native TLS library usable behind `TlsContext`
pub trait TlsBackend {
    /// Mutable context under construction
    type Builder;
    /// Finished context handed to the transport layer
    type Handle;

    /// Run the library's process-wide initialisation; idempotent
    fn ensure_initialized();

    /// Allocate a context for the peer role with the given minimum protocol version
    fn allocate(peer_type: PeerType, version: TlsVersion) -> Result<Self::Builder, TlsError>;

    /// Install the cipher list, failing with `Configuration` if the library rejects it
    fn install_ciphers(builder: &mut Self::Builder, ciphers: &[String]) -> Result<(), TlsError>;

    fn finish(builder: Self::Builder) -> Self::Handle;
}

/// Lifecycle state of a `TlsContext`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Holds a live native handle
    Ready,
    /// Handle moved out or freed
    Released,
}

/// An SSL/TLS context for secure communication
pub struct TlsContext<B: TlsBackend = OpenSsl> {
    options: SslOptions,
    pki_env: PkiEnvironment,
    handle: Option<B::Handle>,
}

impl TlsContext {
    /// Build an OpenSSL context
    pub fn new(options: SslOptions, pki_env: PkiEnvironment) -> Result<Self, TlsError> {
        Self::create(options, pki_env)
    }

    /// Build an OpenSSL context for a strict TLS 1.3 client with the default PKI environment
    pub fn with_defaults() -> Result<Self, TlsError> {
        Self::create(SslOptions::default(), PkiEnvironment::new()?)
    }
}

impl<B> TlsContext<B>
where
    B: TlsBackend,
    SslOptions: Configurable<B::Builder>,
    PkiEnvironment: Configurable<B::Builder>,
{
    /// Build a context on an explicit back end
    pub fn create(options: SslOptions, pki_env: PkiEnvironment) -> Result<Self, TlsError> {
        let handle = Self::build(&options, &pki_env)?;
        Ok(TlsContext {
            options,
            pki_env,
            handle: Some(handle),
        })
    }

    /// Build an independent context with the same configuration
    pub fn try_clone(&self) -> Result<Self, TlsError> {
        Self::create(self.options.clone(), self.pki_env.clone())
    }

    // A failure at any step drops the partially configured builder, which
    // frees the native context.
    fn build(options: &SslOptions, pki_env: &PkiEnvironment) -> Result<B::Handle, TlsError> {
        B::ensure_initialized();

        let version = options.minimum_supported_protocol_version();
        if !version.is_supported() {
            return Err(TlsError::Unsupported(format!(
                "Unsupported protocol version: {}",
                version
            )));
        }

        let mut builder = B::allocate(options.peer_type(), version)?;
        B::install_ciphers(&mut builder, options.ciphers())?;

        // CA and revocation settings first, then this peer's credentials
        pki_env.configure(&mut builder, pki_env)?;
        options.configure(&mut builder, pki_env)?;

        tracing::debug!(
            peer_type = ?options.peer_type(),
            min_version = %version,
            ciphers = options.ciphers().len(),
            "built TLS context"
        );
        Ok(B::finish(builder))
    }
}

impl<B: TlsBackend> TlsContext<B> {
    /// The native handle, or `None` once the context was moved out or released
    pub fn native_handle(&self) -> Option<&B::Handle> {
        self.handle.as_ref()
    }

    pub fn state(&self) -> ContextState {
        if self.handle.is_some() {
            ContextState::Ready
        } else {
            ContextState::Released
        }
    }

    pub fn options(&self) -> &SslOptions {
        &self.options
    }

    pub fn pki_environment(&self) -> &PkiEnvironment {
        &self.pki_env
    }

    /// Move the native handle into a new context, leaving this one released
    pub fn take(&mut self) -> Self {
        TlsContext {
            options: self.options.clone(),
            pki_env: self.pki_env.clone(),
            handle: self.handle.take(),
        }
    }

    /// Free the native handle now; a no-op when already released
    pub fn release(&mut self) {
        if self.handle.take().is_some() {
            tracing::trace!("released TLS context");
        }
    }
}

impl<B: TlsBackend> Drop for TlsContext<B> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<B: TlsBackend> fmt::Debug for TlsContext<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsContext")
            .field("state", &self.state())
            .field("options", &self.options)
            .field("pki_env", &self.pki_env)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tls::authority::CertificateAuthority;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Back end whose handles count how often they are freed
    struct CountingBackend;

    struct CountingHandle {
        id: usize,
        frees: Arc<AtomicUsize>,
    }

    impl Drop for CountingHandle {
        fn drop(&mut self) {
            self.frees.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct CountingBuilder {
        frees: Arc<AtomicUsize>,
    }

    static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

    thread_local! {
        static FREES: Arc<AtomicUsize> = Arc::new(AtomicUsize::new(0));
    }

    fn frees() -> Arc<AtomicUsize> {
        FREES.with(Arc::clone)
    }

    impl TlsBackend for CountingBackend {
        type Builder = CountingBuilder;
        type Handle = CountingHandle;

        fn ensure_initialized() {}

        fn allocate(_peer_type: PeerType, _version: TlsVersion) -> Result<CountingBuilder, TlsError> {
            Ok(CountingBuilder { frees: frees() })
        }

        fn install_ciphers(_builder: &mut CountingBuilder, ciphers: &[String]) -> Result<(), TlsError> {
            if ciphers.iter().any(|c| c == "BOGUS") {
                return Err(TlsError::Configuration("no cipher match".to_string()));
            }
            Ok(())
        }

        fn finish(builder: CountingBuilder) -> CountingHandle {
            CountingHandle {
                id: NEXT_ID.fetch_add(1, Ordering::SeqCst),
                frees: builder.frees,
            }
        }
    }

    impl Configurable<CountingBuilder> for SslOptions {
        fn configure(&self, _handle: &mut CountingBuilder, _pki_env: &PkiEnvironment) -> Result<(), TlsError> {
            Ok(())
        }
    }

    impl Configurable<CountingBuilder> for CertificateAuthority {
        fn configure(&self, _handle: &mut CountingBuilder, _pki_env: &PkiEnvironment) -> Result<(), TlsError> {
            Ok(())
        }
    }

    fn context() -> TlsContext<CountingBackend> {
        TlsContext::create(SslOptions::client(), PkiEnvironment::new().unwrap()).unwrap()
    }

    #[test]
    fn test_drop_frees_once() {
        let before = frees().load(Ordering::SeqCst);
        let ctx = context();
        assert_eq!(ctx.state(), ContextState::Ready);
        drop(ctx);
        assert_eq!(frees().load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn test_take_leaves_sentinel() {
        let before = frees().load(Ordering::SeqCst);
        let mut source = context();
        let id = source.native_handle().unwrap().id;

        let moved = source.take();
        assert!(source.native_handle().is_none());
        assert_eq!(source.state(), ContextState::Released);
        assert_eq!(moved.native_handle().unwrap().id, id);

        // dropping the moved-from source frees nothing
        drop(source);
        assert_eq!(frees().load(Ordering::SeqCst), before);

        drop(moved);
        assert_eq!(frees().load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn test_release_is_idempotent() {
        let before = frees().load(Ordering::SeqCst);
        let mut ctx = context();
        ctx.release();
        ctx.release();
        assert_eq!(ctx.state(), ContextState::Released);
        drop(ctx);
        assert_eq!(frees().load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn test_try_clone_builds_new_handle() {
        let ctx = context();
        let copy = ctx.try_clone().unwrap();
        assert_ne!(
            ctx.native_handle().unwrap().id,
            copy.native_handle().unwrap().id
        );
        assert_eq!(ctx.options(), copy.options());
    }

    #[test]
    fn test_rejected_ciphers_fail_construction() {
        let options = SslOptions::client().with_ciphers(["BOGUS"]);
        let result = TlsContext::<CountingBackend>::create(options, PkiEnvironment::new().unwrap());
        assert!(matches!(result, Err(TlsError::Configuration(_))));
    }

    #[test]
    fn test_old_version_rejected_before_allocation() {
        let options = SslOptions::client().with_minimum_version(TlsVersion::Tls10);
        let result = TlsContext::<CountingBackend>::create(options, PkiEnvironment::new().unwrap());
        assert!(matches!(result, Err(TlsError::Unsupported(_))));
    }
}
