//! Trust bundle held by the registration authority.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::pem::parse_certificates;
use crate::types::{Certificate, PrivateKey};

/// Root and chain material appended to issued certificates.
///
/// Immutable after construction, so any number of signing calls may read it
/// concurrently without locking.
pub struct TrustBundle {
    root_cert_pem: Vec<u8>,
    cert_chain_pem: Vec<u8>,
    signing_key: Option<PrivateKey>,
    root_certs: Vec<Certificate>,
}

impl TrustBundle {
    /// Loads a bundle holding only the root certificate(s) read from `path`.
    ///
    /// An empty path yields a bundle with no root material.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CaInitFail`] if the file cannot be read or does not
    /// contain at least one valid certificate.
    pub fn from_root_cert_file(path: &Path) -> Result<Self> {
        if path.as_os_str().is_empty() {
            warn!("no root certificate file configured, trust bundle is empty");
            return Ok(Self::empty());
        }

        info!(path = %path.display(), "Loading root certificate");

        let root_cert_pem = std::fs::read(path).map_err(|e| {
            Error::CaInitFail(format!(
                "failed to read root certificate file {}: {e}",
                path.display()
            ))
        })?;

        Self::from_pem(&root_cert_pem, &[], None)
    }

    /// Builds a bundle from in-memory PEM material.
    ///
    /// # Arguments
    ///
    /// * `root_cert_pem` - One or more root certificates.
    /// * `cert_chain_pem` - Intermediate chain appended to issued leaves; may be empty.
    /// * `signing_key_pem` - Optional key material for the chain's signing certificate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CaInitFail`] if the root holds no certificate or any
    /// block fails to parse.
    pub fn from_pem(
        root_cert_pem: &[u8],
        cert_chain_pem: &[u8],
        signing_key_pem: Option<&[u8]>,
    ) -> Result<Self> {
        let root_certs = parse_certificates(root_cert_pem)
            .map_err(|e| Error::CaInitFail(format!("invalid root certificate: {e}")))?;
        if root_certs.is_empty() {
            return Err(Error::CaInitFail(
                "root certificate material contains no certificate".into(),
            ));
        }

        let chain = parse_certificates(cert_chain_pem)
            .map_err(|e| Error::CaInitFail(format!("invalid certificate chain: {e}")))?;

        debug!(
            roots = root_certs.len(),
            chain = chain.len(),
            "trust bundle loaded"
        );

        Ok(Self {
            root_cert_pem: root_cert_pem.to_vec(),
            cert_chain_pem: cert_chain_pem.to_vec(),
            signing_key: signing_key_pem.map(|key| PrivateKey::new(key.to_vec())),
            root_certs,
        })
    }

    fn empty() -> Self {
        Self {
            root_cert_pem: Vec::new(),
            cert_chain_pem: Vec::new(),
            signing_key: None,
            root_certs: Vec::new(),
        }
    }

    /// Returns the root certificate PEM bytes.
    #[must_use]
    pub fn root_cert_pem(&self) -> &[u8] {
        &self.root_cert_pem
    }

    /// Returns the chain PEM bytes appended to issued leaves.
    #[must_use]
    pub fn cert_chain_pem(&self) -> &[u8] {
        &self.cert_chain_pem
    }

    /// Returns the signing key, if the bundle holds one.
    #[must_use]
    pub const fn signing_key(&self) -> Option<&PrivateKey> {
        self.signing_key.as_ref()
    }

    /// Returns the parsed root certificates.
    #[must_use]
    pub fn root_certificates(&self) -> &[Certificate] {
        &self.root_certs
    }
}

impl std::fmt::Debug for TrustBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustBundle")
            .field("root_certs", &self.root_certs.len())
            .field("cert_chain_len", &self.cert_chain_pem.len())
            .field("signing_key", &self.signing_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
