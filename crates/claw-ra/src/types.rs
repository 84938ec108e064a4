//! Core RA types: signer names, key usages, signing options and parsed certificates.

use std::net::IpAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use x509_parser::extensions::GeneralName;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

/// Name of the external signer a CSR is routed to, e.g. `example.com/workloads`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignerName(String);

impl SignerName {
    /// Wraps an already-resolved signer name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the signer name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SignerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SignerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key usages that can be requested through the cluster CSR API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CsrKeyUsage {
    /// Digital signature.
    DigitalSignature,
    /// Key encipherment.
    KeyEncipherment,
    /// TLS server authentication.
    ServerAuth,
    /// TLS client authentication.
    ClientAuth,
}

impl CsrKeyUsage {
    /// Returns the usage string understood by the cluster CSR API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DigitalSignature => "digital signature",
            Self::KeyEncipherment => "key encipherment",
            Self::ServerAuth => "server auth",
            Self::ClientAuth => "client auth",
        }
    }
}

impl std::fmt::Display for CsrKeyUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Usages requested for every workload certificate (mTLS capable).
pub const WORKLOAD_KEY_USAGES: [CsrKeyUsage; 4] = [
    CsrKeyUsage::DigitalSignature,
    CsrKeyUsage::KeyEncipherment,
    CsrKeyUsage::ServerAuth,
    CsrKeyUsage::ClientAuth,
];

/// Signing intent supplied with each CSR.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignOptions {
    /// Identities the caller is entitled to, e.g. SPIFFE URIs.
    pub subject_ids: Vec<String>,
    /// Requested certificate lifetime. Zero means "use the configured default".
    pub ttl: Duration,
    /// Whether a CA certificate is being requested.
    pub for_ca: bool,
    /// Signer to route this request to, relative to the configured signer domain.
    pub cert_signer: Option<String>,
}

impl SignOptions {
    /// Creates a new sign options builder.
    #[must_use]
    pub fn builder() -> SignOptionsBuilder {
        SignOptionsBuilder::default()
    }

    /// Returns the signer override, treating an empty name as absent.
    #[must_use]
    pub fn signer_override(&self) -> Option<&str> {
        self.cert_signer.as_deref().filter(|s| !s.is_empty())
    }
}

/// Builder for [`SignOptions`].
#[derive(Debug, Default)]
pub struct SignOptionsBuilder {
    options: SignOptions,
}

impl SignOptionsBuilder {
    /// Adds a subject identity.
    #[must_use]
    pub fn subject_id(mut self, id: impl Into<String>) -> Self {
        self.options.subject_ids.push(id.into());
        self
    }

    /// Adds several subject identities.
    #[must_use]
    pub fn subject_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.subject_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Sets the requested lifetime.
    #[must_use]
    pub const fn ttl(mut self, ttl: Duration) -> Self {
        self.options.ttl = ttl;
        self
    }

    /// Marks the request as asking for a CA certificate.
    #[must_use]
    pub const fn for_ca(mut self, for_ca: bool) -> Self {
        self.options.for_ca = for_ca;
        self
    }

    /// Routes the request to a specific signer under the configured domain.
    #[must_use]
    pub fn cert_signer(mut self, signer: impl Into<String>) -> Self {
        self.options.cert_signer = Some(signer.into());
        self
    }

    /// Builds the options.
    #[must_use]
    pub fn build(self) -> SignOptions {
        self.options
    }
}

/// Subject Alternative Name types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectAltName {
    /// DNS name.
    Dns(String),
    /// IP address.
    Ip(IpAddr),
    /// Email address.
    Email(String),
    /// URI.
    Uri(String),
}

impl SubjectAltName {
    /// Returns the identity string this name is matched against subject IDs with.
    #[must_use]
    pub fn identity(&self) -> String {
        match self {
            Self::Dns(s) | Self::Email(s) | Self::Uri(s) => s.clone(),
            Self::Ip(ip) => ip.to_string(),
        }
    }
}

/// A parsed X.509 certificate with the metadata the RA inspects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    /// DER-encoded certificate bytes.
    der: Vec<u8>,
    /// Certificate validity start time.
    not_before: DateTime<Utc>,
    /// Certificate validity end time.
    not_after: DateTime<Utc>,
    /// Subject distinguished name.
    subject: String,
    /// Issuer distinguished name.
    issuer: String,
    /// Subject alternative names.
    san: Vec<SubjectAltName>,
    /// Whether basic constraints mark this as a CA certificate.
    is_ca: bool,
}

impl Certificate {
    /// Parses a certificate from DER-encoded bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        use x509_parser::prelude::*;

        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| Error::Parse(format!("failed to parse certificate: {e}")))?;

        let not_before = DateTime::from_timestamp(cert.validity().not_before.timestamp(), 0)
            .ok_or_else(|| Error::Parse("invalid not_before timestamp".into()))?;
        let not_after = DateTime::from_timestamp(cert.validity().not_after.timestamp(), 0)
            .ok_or_else(|| Error::Parse("invalid not_after timestamp".into()))?;

        let san = match cert.subject_alternative_name() {
            Ok(Some(ext)) => subject_alt_names(&ext.value.general_names),
            Ok(None) => Vec::new(),
            Err(e) => return Err(Error::Parse(format!("invalid SAN extension: {e}"))),
        };

        Ok(Self {
            der: der.to_vec(),
            not_before,
            not_after,
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            san,
            is_ca: cert.is_ca(),
        })
    }

    /// Returns the DER-encoded certificate bytes.
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Returns the certificate validity start time.
    #[must_use]
    pub const fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    /// Returns the certificate validity end time.
    #[must_use]
    pub const fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    /// Returns the subject distinguished name.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns the issuer distinguished name.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Returns the subject alternative names.
    #[must_use]
    pub fn san(&self) -> &[SubjectAltName] {
        &self.san
    }

    /// Returns whether this is a CA certificate.
    #[must_use]
    pub const fn is_ca(&self) -> bool {
        self.is_ca
    }
}

/// Converts parsed general names into SANs, skipping kinds the RA does not match on.
pub(crate) fn subject_alt_names(names: &[GeneralName<'_>]) -> Vec<SubjectAltName> {
    names
        .iter()
        .filter_map(|name| match name {
            GeneralName::DNSName(dns) => Some(SubjectAltName::Dns((*dns).to_string())),
            GeneralName::IPAddress(ip_bytes) => parse_ip_bytes(ip_bytes).map(SubjectAltName::Ip),
            GeneralName::RFC822Name(email) => Some(SubjectAltName::Email((*email).to_string())),
            GeneralName::URI(uri) => Some(SubjectAltName::Uri((*uri).to_string())),
            _ => None,
        })
        .collect()
}

/// Parses IP address bytes into an `IpAddr`.
fn parse_ip_bytes(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => {
            let octets: [u8; 4] = bytes.try_into().ok()?;
            Some(IpAddr::from(octets))
        }
        16 => {
            let octets: [u8; 16] = bytes.try_into().ok()?;
            Some(IpAddr::from(octets))
        }
        _ => None,
    }
}

/// PEM-encoded private key material, zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    pem: Vec<u8>,
}

impl PrivateKey {
    /// Wraps PEM-encoded key bytes.
    #[must_use]
    pub const fn new(pem: Vec<u8>) -> Self {
        Self { pem }
    }

    /// Returns the PEM-encoded key bytes.
    #[must_use]
    pub fn pem(&self) -> &[u8] {
        &self.pem
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("pem", &"[REDACTED]")
            .finish()
    }
}

impl Clone for PrivateKey {
    fn clone(&self) -> Self {
        Self {
            pem: self.pem.clone(),
        }
    }
}
