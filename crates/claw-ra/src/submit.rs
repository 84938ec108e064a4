//! Boundary to the cluster CSR API.
//!
//! The CSR lifecycle (create, wait for approval, fetch the issued certificate)
//! belongs to the [`CsrSubmitter`] implementation. The RA sees a single
//! blocking call that yields one terminal outcome.

use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::types::{CsrKeyUsage, SignerName};

/// A CSR ready to be handed to the cluster CSR API.
#[derive(Debug, Clone, Copy)]
pub struct CsrSubmission<'a> {
    /// PEM-encoded certificate signing request.
    pub csr_pem: &'a [u8],
    /// Signer the request is addressed to.
    pub signer_name: &'a SignerName,
    /// Key usages to request.
    pub usages: &'a [CsrKeyUsage],
    /// Requested certificate lifetime.
    pub requested_lifetime: Duration,
    /// Root certificate file the submitter may use to verify or extend the result.
    pub ca_cert_file: &'a Path,
    /// Return only the leaf certificate.
    pub leaf_only: bool,
    /// Append the CA certificate to the returned chain.
    pub append_ca_cert: bool,
}

/// Terminal success from the cluster CSR API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCertificate {
    /// PEM-encoded certificate bytes.
    pub certificate_pem: Vec<u8>,
    /// Name of the CSR object created in the cluster, if known.
    pub csr_name: Option<String>,
}

/// Terminal failures from the cluster CSR API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// An approver denied the request.
    #[error("certificate signing request {name} was denied: {reason}")]
    Denied {
        /// CSR object name.
        name: String,
        /// Reason given by the approver.
        reason: String,
    },

    /// The signer marked the request as failed.
    #[error("certificate signing request {name} failed: {reason}")]
    Failed {
        /// CSR object name.
        name: String,
        /// Reason given by the signer.
        reason: String,
    },

    /// No terminal condition was observed in time.
    #[error("timed out after {elapsed:?} waiting for certificate signing request {name}")]
    Timeout {
        /// CSR object name.
        name: String,
        /// How long the submitter waited.
        elapsed: Duration,
    },

    /// The request was approved but carried no certificate.
    #[error("certificate signing request {name} was approved but no certificate was issued")]
    NoCertificate {
        /// CSR object name.
        name: String,
    },

    /// The cluster API could not be reached or rejected the call.
    #[error("CSR API error: {0}")]
    Api(String),
}

/// Submits CSRs to an external signer and blocks until a terminal outcome.
///
/// Implementations own all polling, backoff and timeout behaviour.
pub trait CsrSubmitter: Send + Sync {
    /// Submits the CSR and waits for it to be approved and issued.
    ///
    /// # Errors
    ///
    /// Returns the terminal failure reported by the cluster.
    fn submit_and_approve(
        &self,
        submission: &CsrSubmission<'_>,
    ) -> std::result::Result<IssuedCertificate, SubmissionError>;
}
