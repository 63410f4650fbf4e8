//! Certificate and key decoding
//!
//! Credential stores hand out raw bytes; this module turns them into OpenSSL
//! objects according to their `CertificateFormat` and summarises certificates
//! for logging.

use super::config::TlsError;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::x509::{X509NameRef, X509Ref, X509};

/// Encoding of certificate and key bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CertificateFormat {
    /// Base64 text with `-----BEGIN ...-----` armour
    #[default]
    Pem,
    /// Raw DER (ASN.1) encoding
    Asn1,
}

/// Decode one or more certificates
///
/// PEM input may hold a chain; the leaf comes first. DER input holds exactly one.
pub fn decode_certificates(data: &[u8], format: CertificateFormat) -> Result<Vec<X509>, TlsError> {
    let certs = match format {
        CertificateFormat::Pem => X509::stack_from_pem(data),
        CertificateFormat::Asn1 => X509::from_der(data).map(|cert| vec![cert]),
    }
    .map_err(|e| TlsError::Certificate(format!("Failed to load certificate: {}", e)))?;

    if certs.is_empty() {
        return Err(TlsError::Certificate(
            "No certificate found in certificate data".to_string(),
        ));
    }
    Ok(certs)
}

/// Decode a private key
pub fn decode_private_key(data: &[u8], format: CertificateFormat) -> Result<PKey<Private>, TlsError> {
    match format {
        CertificateFormat::Pem => PKey::private_key_from_pem(data),
        CertificateFormat::Asn1 => PKey::private_key_from_der(data),
    }
    .map_err(|e| TlsError::Certificate(format!("Failed to load private key: {}", e)))
}

/// Certificate information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertInfo {
    /// Certificate subject (Common Name)
    pub subject: String,
    /// Certificate issuer (Common Name)
    pub issuer: String,
    /// Subject Alternative Names (DNS names and IP addresses)
    pub subject_alt_names: Vec<String>,
}

impl CertInfo {
    /// Extract certificate information from an X.509 certificate
    pub fn from_x509(cert: &X509Ref) -> Self {
        CertInfo {
            subject: Self::get_cn(cert.subject_name()),
            issuer: Self::get_cn(cert.issuer_name()),
            subject_alt_names: Self::get_subject_alt_names(cert),
        }
    }

    fn get_cn(name: &X509NameRef) -> String {
        name.entries_by_nid(Nid::COMMONNAME)
            .next()
            .and_then(|entry| entry.data().as_utf8().ok())
            .map(|s| s.to_string())
            .unwrap_or_else(|| "<undef>".to_string())
    }

    fn get_subject_alt_names(cert: &X509Ref) -> Vec<String> {
        let mut names = Vec::new();

        if let Some(san_ext) = cert.subject_alt_names() {
            for name in san_ext {
                if let Some(dns) = name.dnsname() {
                    names.push(format!("DNS:{}", dns));
                } else if let Some(ip) = name.ipaddress() {
                    match ip.len() {
                        4 => {
                            let octets: [u8; 4] = [ip[0], ip[1], ip[2], ip[3]];
                            names.push(format!("IP:{}", std::net::Ipv4Addr::from(octets)));
                        }
                        16 => {
                            let mut octets = [0u8; 16];
                            octets.copy_from_slice(ip);
                            names.push(format!("IP:{}", std::net::Ipv6Addr::from(octets)));
                        }
                        _ => {}
                    }
                }
            }
        }

        names
    }
}
