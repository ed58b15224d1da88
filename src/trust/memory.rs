//! In-memory trust store.
//!
//! Used by tests and by embedders that already hold certificates in memory.
//! The store counts open handles so callers can check that every lookup
//! released the store again.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::{RwLock, RwLockReadGuard};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};

use crate::trust::store::{CertificateError, StoreEntry, StoreHandle, TrustStore};

struct MemoryEntry {
    label: String,
    chain: Vec<CertificateDer<'static>>,
    key: Option<PrivateKeyDer<'static>>,
}

/// A trust store held entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<Vec<MemoryEntry>>,
    open_handles: AtomicUsize,
    opened_total: AtomicUsize,
    access_denied: AtomicBool,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.entries.read().len())
            .field("open_handles", &self.open_handles())
            .finish()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a certificate chain with its private key.
    pub fn insert(
        &self,
        label: impl Into<String>,
        chain: Vec<CertificateDer<'static>>,
        key: PrivateKeyDer<'static>,
    ) {
        self.push(label.into(), chain, Some(key));
    }

    /// Append a certificate chain without a private key.
    pub fn insert_without_key(&self, label: impl Into<String>, chain: Vec<CertificateDer<'static>>) {
        self.push(label.into(), chain, None);
    }

    /// Append an entry that cannot be read back.
    pub fn insert_corrupt(&self, label: impl Into<String>) {
        self.push(label.into(), Vec::new(), None);
    }

    /// Make subsequent `open()` calls fail as if permission were denied.
    pub fn deny_access(&self, denied: bool) {
        self.access_denied.store(denied, Ordering::SeqCst);
    }

    /// Handles currently open.
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }

    /// Handles opened over the store's lifetime.
    pub fn opened_total(&self) -> usize {
        self.opened_total.load(Ordering::SeqCst)
    }

    fn push(&self, label: String, chain: Vec<CertificateDer<'static>>, key: Option<PrivateKeyDer<'static>>) {
        self.entries.write().push(MemoryEntry { label, chain, key });
    }
}

impl TrustStore for MemoryStore {
    fn location(&self) -> String {
        "memory".to_string()
    }

    fn open(&self) -> Result<Box<dyn StoreHandle + '_>, CertificateError> {
        if self.access_denied.load(Ordering::SeqCst) {
            return Err(CertificateError::StoreAccessDenied {
                location: self.location(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            });
        }

        self.open_handles.fetch_add(1, Ordering::SeqCst);
        self.opened_total.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryHandle {
            entries: self.entries.read(),
            open_handles: &self.open_handles,
        }))
    }
}

struct MemoryHandle<'a> {
    entries: RwLockReadGuard<'a, Vec<MemoryEntry>>,
    open_handles: &'a AtomicUsize,
}

impl StoreHandle for MemoryHandle<'_> {
    fn entries(&mut self) -> Vec<Result<StoreEntry, CertificateError>> {
        self.entries
            .iter()
            .map(|entry| {
                if entry.chain.is_empty() {
                    return Err(CertificateError::UnreadableEntry {
                        entry: entry.label.clone(),
                        reason: "no certificates in entry".to_string(),
                    });
                }
                Ok(StoreEntry {
                    label: entry.label.clone(),
                    chain: entry.chain.clone(),
                })
            })
            .collect()
    }

    fn private_key(&mut self, entry: &StoreEntry) -> Result<PrivateKeyDer<'static>, CertificateError> {
        self.entries
            .iter()
            .find(|candidate| candidate.label == entry.label && candidate.chain == entry.chain)
            .and_then(|candidate| candidate.key.as_ref())
            .map(|key| key.clone_key())
            .ok_or_else(|| CertificateError::NoPrivateKey {
                entry: entry.label.clone(),
            })
    }
}

impl Drop for MemoryHandle<'_> {
    fn drop(&mut self) {
        self.open_handles.fetch_sub(1, Ordering::SeqCst);
    }
}
