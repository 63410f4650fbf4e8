//! Credential stores
//!
//! Certificates and private keys are loaded through the `CertificateStore` and
//! `KeyStore` traits so that they can come from the filesystem, a database or a
//! secret vault. Paths are slash-delimited abstract paths that each backend
//! translates to its own addressing scheme.
//!
//! The local stores read from a base directory on every call; nothing is cached,
//! so rotated credentials are picked up without a restart.

use super::cert::CertificateFormat;
use super::config::TlsError;
use once_cell::sync::OnceCell;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A source of public key certificates
pub trait CertificateStore: fmt::Debug + Send + Sync {
    /// Retrieve the raw certificate bytes stored under `cert_path`
    fn get_certificate(&self, cert_path: &str) -> Result<Vec<u8>, TlsError>;

    /// Encoding of the bytes returned by `get_certificate`
    fn format(&self) -> CertificateFormat {
        CertificateFormat::Pem
    }
}

/// A source of private key material
pub trait KeyStore: fmt::Debug + Send + Sync {
    /// Retrieve the raw private key bytes stored under `key_path`
    fn get_private_key(&self, key_path: &str) -> Result<Vec<u8>, TlsError>;

    /// Encoding of the bytes returned by `get_private_key`
    fn format(&self) -> CertificateFormat {
        CertificateFormat::Pem
    }
}

/// Certificate store backed by a local directory
#[derive(Debug, Clone)]
pub struct LocalCertificateStore {
    cert_dir: PathBuf,
    format: CertificateFormat,
}

impl LocalCertificateStore {
    /// Open a store rooted at `cert_dir`, or the current working directory
    ///
    /// Fails with `InvalidArgument` if the directory does not exist or is not a directory.
    pub fn new<P: AsRef<Path>>(cert_dir: Option<P>) -> Result<Self, TlsError> {
        let cert_dir = resolve_dir(cert_dir.as_ref().map(|p| p.as_ref()), "certificate")?;
        tracing::debug!(dir = %cert_dir.display(), "loading certificates from directory");
        Ok(LocalCertificateStore {
            cert_dir,
            format: CertificateFormat::Pem,
        })
    }

    /// Shared store rooted at the current working directory
    ///
    /// Created on first use and reused for the rest of the process.
    pub fn shared() -> Result<Arc<Self>, TlsError> {
        static DEFAULT: OnceCell<Arc<LocalCertificateStore>> = OnceCell::new();
        DEFAULT
            .get_or_try_init(|| Self::new(None::<&Path>).map(Arc::new))
            .map(Arc::clone)
    }

    /// Declare the encoding of the files in this store
    pub fn with_format(mut self, format: CertificateFormat) -> Self {
        self.format = format;
        self
    }

    /// Absolute base directory
    pub fn cert_dir(&self) -> &Path {
        &self.cert_dir
    }
}

impl CertificateStore for LocalCertificateStore {
    fn get_certificate(&self, cert_path: &str) -> Result<Vec<u8>, TlsError> {
        read_file(&self.cert_dir, cert_path, "certificate")
    }

    fn format(&self) -> CertificateFormat {
        self.format
    }
}

/// Key store backed by a local directory
#[derive(Debug, Clone)]
pub struct LocalKeyStore {
    key_dir: PathBuf,
    format: CertificateFormat,
}

impl LocalKeyStore {
    /// Open a store rooted at `key_dir`, or the current working directory
    ///
    /// Fails with `InvalidArgument` if the directory does not exist or is not a directory.
    pub fn new<P: AsRef<Path>>(key_dir: Option<P>) -> Result<Self, TlsError> {
        let key_dir = resolve_dir(key_dir.as_ref().map(|p| p.as_ref()), "key")?;
        tracing::debug!(dir = %key_dir.display(), "loading private keys from directory");
        Ok(LocalKeyStore {
            key_dir,
            format: CertificateFormat::Pem,
        })
    }

    /// Shared store rooted at the current working directory
    pub fn shared() -> Result<Arc<Self>, TlsError> {
        static DEFAULT: OnceCell<Arc<LocalKeyStore>> = OnceCell::new();
        DEFAULT
            .get_or_try_init(|| Self::new(None::<&Path>).map(Arc::new))
            .map(Arc::clone)
    }

    /// Declare the encoding of the files in this store
    pub fn with_format(mut self, format: CertificateFormat) -> Self {
        self.format = format;
        self
    }

    /// Absolute base directory
    pub fn key_dir(&self) -> &Path {
        &self.key_dir
    }
}

impl KeyStore for LocalKeyStore {
    fn get_private_key(&self, key_path: &str) -> Result<Vec<u8>, TlsError> {
        read_file(&self.key_dir, key_path, "private key")
    }

    fn format(&self) -> CertificateFormat {
        self.format
    }
}

fn resolve_dir(dir: Option<&Path>, kind: &str) -> Result<PathBuf, TlsError> {
    let cwd = std::env::current_dir()?;
    let dir = match dir {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => cwd.join(dir),
        None => cwd,
    };

    if !dir.exists() {
        return Err(TlsError::InvalidArgument(format!(
            "{} directory does not exist: {}",
            kind,
            dir.display()
        )));
    }
    if !dir.is_dir() {
        return Err(TlsError::InvalidArgument(format!(
            "{} directory is not a valid directory: {}",
            kind,
            dir.display()
        )));
    }
    Ok(dir)
}

fn read_file(base: &Path, rel_path: &str, kind: &str) -> Result<Vec<u8>, TlsError> {
    if Path::new(rel_path).is_absolute() {
        return Err(TlsError::InvalidArgument(format!(
            "{} path must be relative to the store: {}",
            kind, rel_path
        )));
    }

    let file = base.join(rel_path);
    tracing::debug!(path = %file.display(), "loading {}", kind);
    if !file.exists() {
        return Err(TlsError::InvalidArgument(format!(
            "{} file does not exist: {}",
            kind,
            file.display()
        )));
    }

    let mut data = Vec::new();
    File::open(&file)?.read_to_end(&mut data)?;
    if data.is_empty() {
        return Err(TlsError::InvalidData(format!(
            "Invalid {} file (empty): {}",
            kind,
            file.display()
        )));
    }
    Ok(data)
}
