//! Test fixtures: an in-process CA, CSR minting and a recording submitter.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rcgen::{
    BasicConstraints, CertificateParams, CertificateSigningRequestParams, DnType, Ia5String,
    IsCa, KeyPair, KeyUsagePurpose, SanType,
};

use crate::submit::{CsrSubmission, CsrSubmitter, IssuedCertificate, SubmissionError};
use crate::types::CsrKeyUsage;

/// Self-signed CA used to mint fixtures and to play the external signer.
pub struct TestCa {
    pub cert: rcgen::Certificate,
    pub key: KeyPair,
}

impl TestCa {
    pub fn new(name: &str) -> Self {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::default();
        params.distinguished_name.push(DnType::CommonName, name);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        let cert = params.self_signed(&key).unwrap();
        Self { cert, key }
    }

    pub fn pem(&self) -> String {
        self.cert.pem()
    }

    pub fn issue_leaf(&self, ids: &[&str]) -> rcgen::Certificate {
        self.issue_leaf_with(leaf_params(ids))
    }

    pub fn issue_leaf_valid_between(
        &self,
        ids: &[&str],
        not_before: DateTime<Utc>,
        not_after: DateTime<Utc>,
    ) -> rcgen::Certificate {
        let mut params = leaf_params(ids);
        params.not_before = to_offset(not_before);
        params.not_after = to_offset(not_after);
        self.issue_leaf_with(params)
    }

    fn issue_leaf_with(&self, params: CertificateParams) -> rcgen::Certificate {
        let key = KeyPair::generate().unwrap();
        params.signed_by(&key, &self.cert, &self.key).unwrap()
    }

    /// Signs a PEM CSR the way an external signer would.
    pub fn sign_csr(&self, csr_pem: &[u8]) -> String {
        let csr = std::str::from_utf8(csr_pem).unwrap();
        let params = CertificateSigningRequestParams::from_pem(csr).unwrap();
        params.signed_by(&self.cert, &self.key).unwrap().pem()
    }
}

fn to_offset(dt: DateTime<Utc>) -> time::OffsetDateTime {
    time::OffsetDateTime::from_unix_timestamp(dt.timestamp()).unwrap()
}

fn leaf_params(ids: &[&str]) -> CertificateParams {
    let mut params = CertificateParams::default();
    params.distinguished_name.push(DnType::CommonName, "workload");
    params.is_ca = IsCa::NoCa;
    params.subject_alt_names = ids.iter().map(|id| san(id)).collect();
    params
}

fn san(id: &str) -> SanType {
    if id.contains("://") {
        SanType::URI(Ia5String::try_from(id.to_string()).unwrap())
    } else if let Ok(ip) = id.parse() {
        SanType::IpAddress(ip)
    } else {
        SanType::DnsName(Ia5String::try_from(id.to_string()).unwrap())
    }
}

/// Mints a PEM CSR requesting the given identities.
pub fn csr_pem(ids: &[&str]) -> Vec<u8> {
    let key = KeyPair::generate().unwrap();
    let mut params = CertificateParams::default();
    params.subject_alt_names = ids.iter().map(|id| san(id)).collect();
    params
        .serialize_request(&key)
        .unwrap()
        .pem()
        .unwrap()
        .into_bytes()
}

pub fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Owned copy of a [`CsrSubmission`].
#[derive(Debug, Clone)]
pub struct RecordedSubmission {
    pub csr_pem: Vec<u8>,
    pub signer_name: String,
    pub usages: Vec<CsrKeyUsage>,
    pub requested_lifetime: Duration,
    pub ca_cert_file: PathBuf,
    pub leaf_only: bool,
    pub append_ca_cert: bool,
}

enum Behaviour {
    Issue(Vec<u8>),
    Fail(SubmissionError),
    Sign(TestCa),
}

/// Submitter that records every call and answers from a fixed behaviour.
pub struct RecordingSubmitter {
    behaviour: Behaviour,
    calls: AtomicUsize,
    submissions: Mutex<Vec<RecordedSubmission>>,
}

impl RecordingSubmitter {
    fn with(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            calls: AtomicUsize::new(0),
            submissions: Mutex::new(Vec::new()),
        }
    }

    /// Always returns `leaf` as the issued certificate.
    pub fn issuing(leaf: &[u8]) -> Self {
        Self::with(Behaviour::Issue(leaf.to_vec()))
    }

    /// Always fails with `err`.
    pub fn failing(err: SubmissionError) -> Self {
        Self::with(Behaviour::Fail(err))
    }

    /// Signs submitted CSRs with `ca`.
    pub fn signing_with(ca: TestCa) -> Self {
        Self::with(Behaviour::Sign(ca))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<RecordedSubmission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn last_signer(&self) -> Option<String> {
        self.submissions().last().map(|s| s.signer_name.clone())
    }
}

impl CsrSubmitter for RecordingSubmitter {
    fn submit_and_approve(
        &self,
        submission: &CsrSubmission<'_>,
    ) -> Result<IssuedCertificate, SubmissionError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.submissions.lock().unwrap().push(RecordedSubmission {
            csr_pem: submission.csr_pem.to_vec(),
            signer_name: submission.signer_name.to_string(),
            usages: submission.usages.to_vec(),
            requested_lifetime: submission.requested_lifetime,
            ca_cert_file: submission.ca_cert_file.to_path_buf(),
            leaf_only: submission.leaf_only,
            append_ca_cert: submission.append_ca_cert,
        });

        let certificate_pem = match &self.behaviour {
            Behaviour::Issue(leaf) => leaf.clone(),
            Behaviour::Fail(err) => return Err(err.clone()),
            Behaviour::Sign(ca) => ca.sign_csr(submission.csr_pem).into_bytes(),
        };
        Ok(IssuedCertificate {
            certificate_pem,
            csr_name: Some(format!("csr-{n}")),
        })
    }
}
