//! PEM handling for certificate bundles and CSRs.

use x509_parser::pem::Pem;
use x509_parser::prelude::*;

use crate::error::{Error, Result};
use crate::types::{subject_alt_names, Certificate, SubjectAltName};

const CERTIFICATE_LABEL: &str = "CERTIFICATE";
const CSR_LABELS: [&str; 2] = ["CERTIFICATE REQUEST", "NEW CERTIFICATE REQUEST"];

/// Splits PEM input into its blocks.
fn blocks(input: &[u8]) -> Result<Vec<Pem>> {
    Pem::iter_from_buffer(input)
        .map(|block| block.map_err(|e| Error::Parse(format!("malformed PEM block: {e}"))))
        .collect()
}

/// Parses every block of `input` as a certificate, in order.
///
/// Empty input yields an empty list. Blocks with any other label are rejected.
///
/// # Errors
///
/// Returns [`Error::Parse`] if a block is malformed or not a valid certificate.
pub fn parse_certificates(input: &[u8]) -> Result<Vec<Certificate>> {
    blocks(input)?
        .iter()
        .map(|block| {
            if block.label != CERTIFICATE_LABEL {
                return Err(Error::Parse(format!(
                    "unexpected PEM block '{}', expected {CERTIFICATE_LABEL}",
                    block.label
                )));
            }
            Certificate::from_der(&block.contents)
        })
        .collect()
}

/// Parses a PEM CSR, checks its self-signature and returns the identities
/// requested in its subject alternative name extension.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the CSR is missing, malformed or badly signed.
pub fn csr_identities(csr_pem: &[u8]) -> Result<Vec<SubjectAltName>> {
    let block = blocks(csr_pem)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Parse("no PEM block found in CSR".into()))?;
    if !CSR_LABELS.contains(&block.label.as_str()) {
        return Err(Error::Parse(format!(
            "unexpected PEM block '{}', expected a certificate request",
            block.label
        )));
    }

    let (_, csr) = X509CertificationRequest::from_der(&block.contents)
        .map_err(|e| Error::Parse(format!("failed to parse CSR: {e}")))?;
    csr.verify_signature()
        .map_err(|e| Error::Parse(format!("CSR signature is invalid: {e}")))?;

    let mut ids = Vec::new();
    if let Some(extensions) = csr.requested_extensions() {
        for extension in extensions {
            if let ParsedExtension::SubjectAlternativeName(san) = extension {
                ids.extend(subject_alt_names(&san.general_names));
            }
        }
    }
    Ok(ids)
}
