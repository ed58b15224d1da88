//! Directory-backed machine certificate store.
//!
//! Each certificate lives in its own PEM file: either one bundle carrying the
//! chain and the private key, or a `name.crt` / `name.pem` chain next to a
//! `name.key`. Binary `name.cer` / `name.der` files hold a single DER
//! certificate and always take their key from the sibling `name.key`.
//! Entries are enumerated in file-name order so lookups are deterministic.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use rustls::pki_types::{CertificateDer, PrivateKeyDer};

use crate::trust::store::{CertificateError, StoreEntry, StoreHandle, TrustStore};

const CERTIFICATE_EXTENSIONS: [&str; 4] = ["pem", "crt", "cer", "der"];
const DER_EXTENSIONS: [&str; 2] = ["cer", "der"];

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext.to_ascii_lowercase().as_str()))
}

// A DER certificate is one ASN.1 SEQUENCE; PEM text never starts with 0x30.
fn is_der(path: &Path, contents: &[u8]) -> bool {
    has_extension(path, &DER_EXTENSIONS) && contents.first() == Some(&0x30)
}

/// A trust store rooted at a directory on the local machine.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TrustStore for DirectoryStore {
    fn location(&self) -> String {
        self.root.display().to_string()
    }

    fn open(&self) -> Result<Box<dyn StoreHandle + '_>, CertificateError> {
        let denied = |source| CertificateError::StoreAccessDenied {
            location: self.location(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(denied)? {
            let path = entry.map_err(denied)?.path();
            if has_extension(&path, &CERTIFICATE_EXTENSIONS) && path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        tracing::debug!(store = %self.root.display(), entries = files.len(), "Trust store opened");
        Ok(Box::new(DirectoryHandle {
            root: &self.root,
            files,
        }))
    }
}

struct DirectoryHandle<'a> {
    root: &'a Path,
    files: Vec<PathBuf>,
}

impl DirectoryHandle<'_> {
    fn read_chain(path: &Path, label: &str) -> Result<Vec<CertificateDer<'static>>, CertificateError> {
        let unreadable = |reason: String| CertificateError::UnreadableEntry {
            entry: label.to_string(),
            reason,
        };

        let contents = fs::read(path).map_err(|e| unreadable(e.to_string()))?;

        if is_der(path, &contents) {
            return Ok(vec![CertificateDer::from(contents)]);
        }

        let chain = rustls_pemfile::certs(&mut contents.as_slice())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| unreadable(e.to_string()))?;
        if chain.is_empty() {
            return Err(unreadable("no certificates found in file".to_string()));
        }
        Ok(chain)
    }

    fn read_key(path: &Path, label: &str) -> Result<Option<PrivateKeyDer<'static>>, CertificateError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CertificateError::UnreadableEntry {
                    entry: label.to_string(),
                    reason: e.to_string(),
                })
            }
        };
        rustls_pemfile::private_key(&mut BufReader::new(file)).map_err(|e| {
            CertificateError::UnreadableEntry {
                entry: label.to_string(),
                reason: e.to_string(),
            }
        })
    }
}

impl StoreHandle for DirectoryHandle<'_> {
    fn entries(&mut self) -> Vec<Result<StoreEntry, CertificateError>> {
        self.files
            .iter()
            .map(|path| {
                let label = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let chain = Self::read_chain(path, &label)?;
                Ok(StoreEntry { label, chain })
            })
            .collect()
    }

    fn private_key(&mut self, entry: &StoreEntry) -> Result<PrivateKeyDer<'static>, CertificateError> {
        let bundle = self.root.join(&entry.label);
        let binary = fs::read(&bundle).is_ok_and(|contents| is_der(&bundle, &contents));
        if !binary {
            if let Some(key) = Self::read_key(&bundle, &entry.label)? {
                return Ok(key);
            }
        }

        let sibling = bundle.with_extension("key");
        if let Some(key) = Self::read_key(&sibling, &entry.label)? {
            return Ok(key);
        }

        Err(CertificateError::NoPrivateKey {
            entry: entry.label.clone(),
        })
    }
}

impl Drop for DirectoryHandle<'_> {
    fn drop(&mut self) {
        tracing::trace!(store = %self.root.display(), "Trust store closed");
    }
}
