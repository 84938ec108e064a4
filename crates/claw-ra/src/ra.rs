//! Registration authority backed by the cluster CSR API.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::bundle::TrustBundle;
use crate::config::RaConfig;
use crate::error::{Error, Result};
use crate::signer::resolve_signer_name;
use crate::submit::{CsrSubmission, CsrSubmitter};
use crate::types::{SignOptions, SignerName, WORKLOAD_KEY_USAGES};
use crate::validation::{verify_issued_certificate, PolicyValidator, PreSignValidator};

/// Settings and cluster client captured when the RA is built.
#[derive(Clone)]
pub struct RaOptions {
    config: RaConfig,
    client: Arc<dyn CsrSubmitter>,
}

impl RaOptions {
    /// Bundles a validated configuration with the CSR API client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalConfig`] if the configuration is invalid.
    pub fn new(config: RaConfig, client: Arc<dyn CsrSubmitter>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, client })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &RaConfig {
        &self.config
    }

    /// Returns the CSR API client.
    #[must_use]
    pub fn client(&self) -> &Arc<dyn CsrSubmitter> {
        &self.client
    }
}

impl std::fmt::Debug for RaOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RaOptions")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// RA that has workload CSRs signed by an external signer through the
/// cluster CSR API.
///
/// Each call is independent: validate, resolve the signer, submit, and return
/// what the signer issued. Nothing is retried or cached.
pub struct KubernetesRa {
    options: RaOptions,
    bundle: TrustBundle,
    validator: Box<dyn PreSignValidator>,
}

impl KubernetesRa {
    /// Creates an RA, loading the trust bundle from the configured root file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CaInitFail`] if the root certificate cannot be loaded.
    pub fn new(options: RaOptions) -> Result<Self> {
        let bundle = TrustBundle::from_root_cert_file(&options.config.ca_cert_file).map_err(
            |e| match e {
                Error::CaInitFail(msg) => Error::CaInitFail(format!(
                    "error processing certificate bundle for Kubernetes RA: {msg}"
                )),
                other => other,
            },
        )?;
        Ok(Self::from_bundle(options, bundle))
    }

    /// Creates an RA around an already loaded trust bundle.
    #[must_use]
    pub fn from_bundle(options: RaOptions, bundle: TrustBundle) -> Self {
        info!(
            ca_signer = %options.config.ca_signer,
            signer_domain = options.config.signer_domain().unwrap_or(""),
            "Kubernetes RA initialized"
        );
        let validator: Box<dyn PreSignValidator> =
            Box::new(PolicyValidator::new(options.config.max_cert_ttl()));
        Self {
            options,
            bundle,
            validator,
        }
    }

    /// Replaces the pre-sign validator.
    #[must_use]
    pub fn with_validator(mut self, validator: impl PreSignValidator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    /// Signs a PEM CSR and returns the issued leaf certificate.
    ///
    /// Validation errors are returned unchanged. Signer resolution and
    /// submission failures are returned as [`Error::CertGen`]. Blocks until
    /// the submitter reports a terminal outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is invalid or no certificate is issued.
    pub fn sign(&self, csr_pem: &[u8], options: &SignOptions) -> Result<Vec<u8>> {
        self.validator.validate(csr_pem, options)?;

        let config = &self.options.config;
        let signer = resolve_signer_name(
            config.signer_domain(),
            options.signer_override(),
            &config.ca_signer,
        )?;

        self.kubernetes_sign(csr_pem, &signer, options)
    }

    /// Signs a PEM CSR and returns the leaf followed by the bundle's chain.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`KubernetesRa::sign`].
    pub fn sign_with_cert_chain(&self, csr_pem: &[u8], options: &SignOptions) -> Result<Vec<u8>> {
        let mut cert = self.sign(csr_pem, options)?;
        let chain = self.bundle.cert_chain_pem();
        if !chain.is_empty() {
            cert.extend_from_slice(chain);
        }
        Ok(cert)
    }

    /// Returns the trust bundle held by this RA.
    #[must_use]
    pub const fn ca_key_cert_bundle(&self) -> &TrustBundle {
        &self.bundle
    }

    fn kubernetes_sign(
        &self,
        csr_pem: &[u8],
        signer: &SignerName,
        options: &SignOptions,
    ) -> Result<Vec<u8>> {
        let config = &self.options.config;
        let submission = CsrSubmission {
            csr_pem,
            signer_name: signer,
            usages: &WORKLOAD_KEY_USAGES,
            requested_lifetime: options.ttl,
            ca_cert_file: &config.ca_cert_file,
            leaf_only: true,
            append_ca_cert: false,
        };

        debug!(
            signer = %signer,
            ttl_secs = options.ttl.as_secs(),
            "submitting CSR"
        );

        let issued = self
            .options
            .client
            .submit_and_approve(&submission)
            .map_err(|e| {
                warn!(signer = %signer, error = %e, "CSR was not signed");
                Error::CertGen(e.to_string())
            })?;

        if config.verify_issued_certificate {
            verify_issued_certificate(&issued.certificate_pem, &options.subject_ids)?;
        }

        info!(
            signer = %signer,
            csr = issued.csr_name.as_deref().unwrap_or("unknown"),
            "certificate issued"
        );

        Ok(issued.certificate_pem)
    }
}

impl std::fmt::Debug for KubernetesRa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubernetesRa")
            .field("options", &self.options)
            .field("bundle", &self.bundle)
            .finish_non_exhaustive()
    }
}
