//! Registration Authority for Clawbernetes.
#![forbid(unsafe_code)]
//!
//! This crate turns workload certificate signing requests into signed,
//! chained certificates by routing them through the cluster CSR API to an
//! external signer. It never generates keys or signs anything itself.
//!
//! # Overview
//!
//! The `claw-ra` crate provides:
//! - A [`TrustBundle`] loaded once from the root certificate file
//! - Signer resolution: per-request overrides qualified with the configured domain
//! - Pre-sign validation of CSR identities, TTL and CA requests
//! - Delegation to a blocking [`CsrSubmitter`] and chain assembly of the result
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use claw_ra::{
//!     CsrSubmission, CsrSubmitter, IssuedCertificate, KubernetesRa, RaConfig, RaOptions,
//!     SignOptions, SubmissionError,
//! };
//!
//! struct ClusterClient;
//!
//! impl CsrSubmitter for ClusterClient {
//!     fn submit_and_approve(
//!         &self,
//!         submission: &CsrSubmission<'_>,
//!     ) -> Result<IssuedCertificate, SubmissionError> {
//!         // Create the CSR object, wait for approval, read status.certificate.
//!         Err(SubmissionError::Api(format!("no cluster for {}", submission.signer_name)))
//!     }
//! }
//!
//! let config = RaConfig::from_json(
//!     r#"{
//!         "ca_cert_file": "/etc/claw/ra/root-cert.pem",
//!         "cert_signer_domain": "clawbernetes.io",
//!         "ca_signer": "clawbernetes.io/workloads"
//!     }"#,
//! )
//! .unwrap();
//! let options = RaOptions::new(config, Arc::new(ClusterClient)).unwrap();
//! let ra = KubernetesRa::new(options).unwrap();
//!
//! let csr_pem = std::fs::read("/run/claw/web.csr").unwrap();
//! let request = SignOptions::builder()
//!     .subject_id("spiffe://cluster.local/ns/default/sa/web")
//!     .ttl(Duration::from_secs(3600))
//!     .cert_signer("mesh")
//!     .build();
//!
//! // Leaf first, then the bundle's chain.
//! let chain = ra.sign_with_cert_chain(&csr_pem, &request).unwrap();
//! ```
//!
//! # Modules
//!
//! - [`ra`] - The signing facade and its options
//! - [`bundle`] - Trust bundle holder
//! - [`signer`] - Signer name resolution
//! - [`submit`] - Boundary to the cluster CSR API
//! - [`validation`] - Pre-sign validation and issued-certificate checks
//! - [`config`] - Serializable configuration
//! - [`pem`] - PEM parsing for certificates and CSRs
//! - [`types`] - Core types (`SignOptions`, `SignerName`, `Certificate`, etc.)
//! - [`error`] - Error types

pub mod bundle;
pub mod config;
pub mod error;
pub mod pem;
pub mod ra;
pub mod signer;
pub mod submit;
pub mod types;
pub mod validation;

#[cfg(test)]
mod testing;

// Re-export commonly used types at crate root
pub use bundle::TrustBundle;
pub use config::RaConfig;
pub use error::{Error, ErrorKind, Result};
pub use ra::{KubernetesRa, RaOptions};
pub use signer::resolve_signer_name;
pub use submit::{CsrSubmission, CsrSubmitter, IssuedCertificate, SubmissionError};
pub use types::{
    Certificate, CsrKeyUsage, PrivateKey, SignOptions, SignOptionsBuilder, SignerName,
    SubjectAltName, WORKLOAD_KEY_USAGES,
};
pub use validation::{verify_issued_certificate, PolicyValidator, PreSignValidator};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, RecordingSubmitter, TestCa};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn full_workflow_test() {
        // 1. Root file on disk and a signer standing in for the cluster
        let dir = tempfile::tempdir().unwrap();
        let root = TestCa::new("Clawbernetes Root CA");
        let root_path = testing::write_file(dir.path(), "root-cert.pem", root.pem().as_bytes());
        let submitter = Arc::new(RecordingSubmitter::signing_with(TestCa::new("Mesh Signer")));

        // 2. Configure and build the RA
        let config = RaConfig::from_json(&format!(
            r#"{{
                "ca_cert_file": {:?},
                "cert_signer_domain": "clawbernetes.io",
                "ca_signer": "clawbernetes.io/workloads",
                "verify_issued_certificate": true
            }}"#,
            root_path.display().to_string()
        ))
        .unwrap();
        let client: Arc<dyn CsrSubmitter> = submitter.clone();
        let ra = KubernetesRa::new(RaOptions::new(config, client).unwrap()).unwrap();

        // 3. Sign a workload CSR routed to a named signer
        let id = "spiffe://cluster.local/ns/default/sa/web";
        let csr = testing::csr_pem(&[id]);
        let request = SignOptions::builder()
            .subject_id(id)
            .ttl(Duration::from_secs(3600))
            .cert_signer("mesh")
            .build();

        let leaf = ra.sign(&csr, &request).unwrap();

        // 4. The leaf carries the requested identity
        let certs = pem::parse_certificates(&leaf).unwrap();
        assert_eq!(certs.len(), 1);
        assert!(certs[0].issuer().contains("Mesh Signer"));
        assert_eq!(certs[0].san(), &[SubjectAltName::Uri(id.into())]);
        assert_eq!(submitter.last_signer().as_deref(), Some("clawbernetes.io/mesh"));

        // 5. Root material is exposed read-only
        assert_eq!(ra.ca_key_cert_bundle().root_cert_pem(), root.pem().as_bytes());
    }

    #[test]
    fn chained_workflow_puts_leaf_first() {
        let root = TestCa::new("Root CA");
        let intermediate = TestCa::new("Intermediate CA");
        let chain = format!("{}{}", intermediate.pem(), root.pem());
        let bundle =
            TrustBundle::from_pem(root.pem().as_bytes(), chain.as_bytes(), None).unwrap();

        let submitter = Arc::new(RecordingSubmitter::signing_with(intermediate));
        let client: Arc<dyn CsrSubmitter> = submitter.clone();
        let config = RaConfig {
            ca_signer: "clawbernetes.io/workloads".into(),
            ..RaConfig::default()
        };
        let ra = KubernetesRa::from_bundle(RaOptions::new(config, client).unwrap(), bundle);

        let id = "web.default.svc";
        let request = SignOptions::builder().subject_id(id).build();
        let pem_bytes = ra
            .sign_with_cert_chain(&testing::csr_pem(&[id]), &request)
            .unwrap();

        let certs = pem::parse_certificates(&pem_bytes).unwrap();
        assert_eq!(certs.len(), 3);
        assert!(!certs[0].is_ca());
        assert!(certs[0].issuer().contains("Intermediate CA"));
        assert!(certs[1].subject().contains("Intermediate CA"));
        assert!(certs[2].subject().contains("Root CA"));
        assert!(pem_bytes.ends_with(chain.as_bytes()));
    }

    #[test]
    fn error_kinds_distinguish_request_from_infrastructure() {
        let dir = tempfile::tempdir().unwrap();
        let root = TestCa::new("Root CA");
        let root_path = testing::write_file(dir.path(), "root-cert.pem", root.pem().as_bytes());
        let submitter = Arc::new(RecordingSubmitter::failing(SubmissionError::Api(
            "connection refused".into(),
        )));
        let client: Arc<dyn CsrSubmitter> = submitter.clone();
        let config = RaConfig {
            ca_cert_file: root_path,
            ca_signer: "clawbernetes.io/workloads".into(),
            ..RaConfig::default()
        };
        let ra = KubernetesRa::new(RaOptions::new(config, client).unwrap()).unwrap();
        let id = "web.default.svc";
        let csr = testing::csr_pem(&[id]);

        let bad_request = SignOptions::builder().subject_id(id).for_ca(true).build();
        assert_eq!(ra.sign(&csr, &bad_request).unwrap_err().kind(), ErrorKind::Csr);

        let good_request = SignOptions::builder().subject_id(id).build();
        let err = ra.sign(&csr, &good_request).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CertGen);
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(submitter.calls(), 1);
    }
}
