//! RA configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

const MAX_CERT_TTL_SECS: u64 = 90 * 24 * 60 * 60;

/// Serializable RA settings.
///
/// ```json
/// {
///   "ca_cert_file": "/etc/claw/ra/root-cert.pem",
///   "cert_signer_domain": "clawbernetes.io",
///   "ca_signer": "clawbernetes.io/workloads"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaConfig {
    /// Root certificate file loaded into the trust bundle.
    pub ca_cert_file: PathBuf,
    /// Domain used to qualify per-request signer overrides.
    pub cert_signer_domain: String,
    /// Signer used when a request names none. May be empty when every
    /// request carries a signer override.
    pub ca_signer: String,
    /// Largest lifetime a request may ask for.
    pub max_cert_ttl_secs: u64,
    /// Check issued certificates against the request before returning them.
    pub verify_issued_certificate: bool,
}

impl Default for RaConfig {
    fn default() -> Self {
        Self {
            ca_cert_file: PathBuf::new(),
            cert_signer_domain: String::new(),
            ca_signer: String::new(),
            max_cert_ttl_secs: MAX_CERT_TTL_SECS,
            verify_issued_certificate: false,
        }
    }
}

impl RaConfig {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalConfig`] if the JSON is malformed or invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::IllegalConfig(format!("failed to parse RA config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalConfig`] if the file cannot be read or is invalid.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "reading RA config");
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::IllegalConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalConfig`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.ca_signer.chars().any(char::is_whitespace) {
            return Err(Error::IllegalConfig(format!(
                "ca_signer '{}' contains whitespace",
                self.ca_signer
            )));
        }
        if self.cert_signer_domain.starts_with('/') || self.cert_signer_domain.ends_with('/') {
            return Err(Error::IllegalConfig(format!(
                "cert_signer_domain '{}' must not start or end with '/'",
                self.cert_signer_domain
            )));
        }
        if self.max_cert_ttl_secs == 0 {
            return Err(Error::IllegalConfig(
                "max_cert_ttl_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Returns the signer domain, or `None` when unset.
    #[must_use]
    pub fn signer_domain(&self) -> Option<&str> {
        Some(self.cert_signer_domain.as_str()).filter(|d| !d.is_empty())
    }

    /// Returns the maximum certificate lifetime.
    #[must_use]
    pub const fn max_cert_ttl(&self) -> Duration {
        Duration::from_secs(self.max_cert_ttl_secs)
    }
}
