//! Trust store abstraction.
//!
//! # Responsibilities
//! - Define the seam between certificate lookup and certificate storage
//! - Scope store access: `open()` hands out a handle, dropping it closes the store
//! - Define the certificate error taxonomy shared by all stores

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use thiserror::Error;

use crate::trust::thumbprint::Thumbprint;

/// Errors raised while opening a store or resolving a certificate.
#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("no certificate with thumbprint {0} in the trust store")]
    CertificateNotFound(Thumbprint),
    #[error("cannot open trust store {location}: {source}")]
    StoreAccessDenied {
        location: String,
        #[source]
        source: std::io::Error,
    },
    #[error("trust store entry {entry} is unreadable: {reason}")]
    UnreadableEntry { entry: String, reason: String },
    #[error("trust store entry {entry} has no private key")]
    NoPrivateKey { entry: String },
}

/// A certificate chain as enumerated from a store, leaf first.
#[derive(Debug, Clone)]
pub struct StoreEntry {
    /// Store-specific name of the entry (file name, friendly name).
    pub label: String,
    /// Certificate chain, leaf first.
    pub chain: Vec<CertificateDer<'static>>,
}

impl StoreEntry {
    /// The end-entity certificate, if the entry holds any certificate.
    pub fn leaf(&self) -> Option<&CertificateDer<'static>> {
        self.chain.first()
    }
}

/// A certificate store that can be opened read-only.
pub trait TrustStore: Send + Sync {
    /// Human readable location, used in logs and errors.
    fn location(&self) -> String;

    /// Open the store read-only. The store is closed when the handle is dropped.
    fn open(&self) -> Result<Box<dyn StoreHandle + '_>, CertificateError>;
}

/// An open, read-only view of a trust store.
pub trait StoreHandle {
    /// Every entry in enumeration order. Entries that cannot be parsed are
    /// reported individually so callers can skip them.
    fn entries(&mut self) -> Vec<Result<StoreEntry, CertificateError>>;

    /// Load the private key belonging to an entry returned by `entries`.
    fn private_key(&mut self, entry: &StoreEntry) -> Result<PrivateKeyDer<'static>, CertificateError>;
}
