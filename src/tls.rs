//! Certificate inspection for the HTTPS UI.

use std::path::Path;

use tracing::debug;
use x509_parser::{parse_x509_certificate, pem::parse_x509_pem};

/// Whether the certificate at `cert_path` is self-signed (subject equals issuer).
///
/// Unreadable or unparsable certificates are reported as not self-signed; the TLS
/// layer rejects them on its own.
pub fn is_self_signed(cert_path: &Path) -> bool {
    match std::fs::read(cert_path) {
        Ok(raw) => certificate_is_self_signed(&raw),
        Err(err) => {
            debug!(path = %cert_path.display(), error = %err, "cannot read certificate");
            false
        }
    }
}

/// Same as [`is_self_signed`] for a PEM or DER encoded certificate held in memory.
pub fn certificate_is_self_signed(raw: &[u8]) -> bool {
    let der = match parse_x509_pem(raw) {
        Ok((_, pem)) => pem.contents,
        Err(_) => raw.to_vec(),
    };
    match parse_x509_certificate(&der) {
        Ok((_, cert)) => cert.subject().as_raw() == cert.issuer().as_raw(),
        Err(_) => false,
    }
}
