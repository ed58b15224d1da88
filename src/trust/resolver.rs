//! Certificate lookup by thumbprint.

use std::fmt;
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};

use crate::trust::store::{CertificateError, TrustStore};
use crate::trust::thumbprint::Thumbprint;

/// A certificate chain with its private key, as resolved from a trust store.
pub struct Certificate {
    thumbprint: Thumbprint,
    label: String,
    chain: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
}

impl Certificate {
    pub fn new(label: impl Into<String>, chain: Vec<CertificateDer<'static>>, key: PrivateKeyDer<'static>) -> Self {
        let thumbprint = chain
            .first()
            .map(|leaf| Thumbprint::of_der(leaf))
            .unwrap_or_else(|| Thumbprint::of_der(&[]));
        Self {
            thumbprint,
            label: label.into(),
            chain,
            key,
        }
    }

    pub fn thumbprint(&self) -> &Thumbprint {
        &self.thumbprint
    }

    /// Store-specific name of the entry the certificate came from.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn chain(&self) -> &[CertificateDer<'static>] {
        &self.chain
    }

    pub fn leaf(&self) -> Option<&CertificateDer<'static>> {
        self.chain.first()
    }

    pub fn private_key(&self) -> &PrivateKeyDer<'static> {
        &self.key
    }

    pub fn into_parts(self) -> (Vec<CertificateDer<'static>>, PrivateKeyDer<'static>) {
        (self.chain, self.key)
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("thumbprint", &self.thumbprint)
            .field("label", &self.label)
            .field("chain_len", &self.chain.len())
            .finish()
    }
}

/// Resolves certificates by thumbprint from a trust store.
#[derive(Clone)]
pub struct CertificateResolver {
    store: Arc<dyn TrustStore>,
}

impl fmt::Debug for CertificateResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateResolver")
            .field("store", &self.store.location())
            .finish()
    }
}

impl CertificateResolver {
    pub fn new(store: Arc<dyn TrustStore>) -> Self {
        Self { store }
    }

    /// Find the certificate whose leaf has the given thumbprint.
    ///
    /// The store is opened read-only and closed again before this returns,
    /// whatever the outcome. If several entries share the thumbprint the first
    /// one in enumeration order is returned.
    pub fn resolve(&self, thumbprint: &Thumbprint) -> Result<Certificate, CertificateError> {
        let location = self.store.location();
        let mut handle = self.store.open()?;

        let mut matched = None;
        for entry in handle.entries() {
            match entry {
                Ok(entry) => match entry.leaf().map(|leaf| Thumbprint::of_der(leaf) == *thumbprint) {
                    Some(true) => {
                        matched = Some(entry);
                        break;
                    }
                    Some(false) => {}
                    None => {
                        tracing::warn!(
                            store = %location,
                            entry = %entry.label,
                            "Skipping trust store entry without certificates"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(store = %location, error = %e, "Skipping unreadable trust store entry");
                }
            }
        }

        let entry = matched.ok_or(CertificateError::CertificateNotFound(thumbprint.clone()))?;
        let key = handle.private_key(&entry)?;
        drop(handle);

        tracing::info!(
            store = %location,
            thumbprint = %thumbprint,
            entry = %entry.label,
            chain_len = entry.chain.len(),
            "Certificate resolved"
        );

        Ok(Certificate {
            thumbprint: thumbprint.clone(),
            label: entry.label,
            chain: entry.chain,
            key,
        })
    }
}
