//! Request validation before signing and reconciliation of issued certificates.

use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::pem::{csr_identities, parse_certificates};
use crate::types::{Certificate, SignOptions, SubjectAltName};

/// Gate run on every request before anything is sent to the cluster.
///
/// The RA returns the validator's error unchanged, so implementations pick
/// the error variant callers will see.
pub trait PreSignValidator: Send + Sync {
    /// Validates the CSR and signing intent.
    ///
    /// # Errors
    ///
    /// Returns an error if the request must not be signed.
    fn validate(&self, csr_pem: &[u8], options: &SignOptions) -> Result<()>;
}

/// Default workload policy.
///
/// Refuses CA requests, requires every identity in the CSR to be one of the
/// caller's subject IDs, and caps the requested TTL.
#[derive(Debug, Clone)]
pub struct PolicyValidator {
    max_cert_ttl: Duration,
}

impl PolicyValidator {
    /// Creates a validator allowing lifetimes up to `max_cert_ttl`.
    #[must_use]
    pub const fn new(max_cert_ttl: Duration) -> Self {
        Self { max_cert_ttl }
    }
}

impl PreSignValidator for PolicyValidator {
    fn validate(&self, csr_pem: &[u8], options: &SignOptions) -> Result<()> {
        if options.for_ca {
            return Err(Error::Csr("unable to generate CA certificates".into()));
        }

        let identities = csr_identities(csr_pem).map_err(|e| Error::Csr(e.to_string()))?;
        if let Some(unknown) = identities
            .iter()
            .map(SubjectAltName::identity)
            .find(|id| !options.subject_ids.contains(id))
        {
            return Err(Error::Csr(format!(
                "csr's host doesn't match with subjectIDs: {unknown} not in {:?}",
                options.subject_ids
            )));
        }

        if options.ttl > self.max_cert_ttl {
            return Err(Error::Ttl(format!(
                "requested TTL {}s is greater than the max allowed TTL {}s",
                options.ttl.as_secs(),
                self.max_cert_ttl.as_secs()
            )));
        }

        Ok(())
    }
}

/// Checks a certificate returned by the signer against the request.
///
/// The first PEM block is the leaf. It must be currently valid, must not be a
/// CA certificate, and may only name identities from `subject_ids`.
///
/// # Errors
///
/// Returns [`Error::CertGen`] describing the mismatch.
pub fn verify_issued_certificate(cert_pem: &[u8], subject_ids: &[String]) -> Result<()> {
    let certs = parse_certificates(cert_pem)
        .map_err(|e| Error::CertGen(format!("signer returned an invalid certificate: {e}")))?;
    let leaf = certs
        .first()
        .ok_or_else(|| Error::CertGen("signer returned no certificate".into()))?;

    debug!(subject = leaf.subject(), "reconciling issued certificate");

    if is_expired(leaf) {
        return Err(Error::CertGen(format!(
            "issued certificate expired at {}",
            leaf.not_after()
        )));
    }
    if is_not_yet_valid(leaf) {
        return Err(Error::CertGen(format!(
            "issued certificate not valid before {}",
            leaf.not_before()
        )));
    }
    if leaf.is_ca() {
        return Err(Error::CertGen(
            "signer issued a CA certificate for a workload request".into(),
        ));
    }
    if let Some(unknown) = leaf
        .san()
        .iter()
        .map(SubjectAltName::identity)
        .find(|id| !subject_ids.contains(id))
    {
        return Err(Error::CertGen(format!(
            "issued certificate names {unknown}, which was not requested"
        )));
    }

    Ok(())
}

/// Checks if a certificate is expired.
#[must_use]
pub fn is_expired(cert: &Certificate) -> bool {
    cert.not_after() < Utc::now()
}

/// Checks if a certificate is not yet valid.
#[must_use]
pub fn is_not_yet_valid(cert: &Certificate) -> bool {
    cert.not_before() > Utc::now()
}
