//! Signer name resolution.

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::SignerName;

/// Resolves the signer a request is routed to.
///
/// An override is only usable when a signer domain is configured; it is then
/// qualified as `domain/override`. Without an override the default signer is
/// used as-is, even when a domain is configured. Empty strings count as absent.
///
/// # Errors
///
/// Returns [`Error::CertGen`] when an override is given without a domain, or
/// when no override is given and the default signer is empty.
pub fn resolve_signer_name(
    domain: Option<&str>,
    signer_override: Option<&str>,
    default_signer: &str,
) -> Result<SignerName> {
    let domain = domain.filter(|d| !d.is_empty());
    let signer_override = signer_override.filter(|s| !s.is_empty());

    let name = match (domain, signer_override) {
        (None, Some(signer)) => {
            return Err(Error::CertGen(format!(
                "certSignerDomain is required for signer {signer}"
            )));
        }
        (Some(domain), Some(signer)) => format!("{domain}/{signer}"),
        (_, None) if default_signer.is_empty() => {
            return Err(Error::CertGen(
                "no signer requested and no default signer configured".into(),
            ));
        }
        (_, None) => default_signer.to_string(),
    };

    debug!(signer = %name, "resolved signer name");
    Ok(SignerName::new(name))
}
