//! Certificate trust store subsystem.
//!
//! # Data Flow
//! ```text
//! Https.CertificateThumbprint
//!     → thumbprint.rs (normalise & decode to 20 bytes)
//!     → resolver.rs (open store read-only, match SHA-1 of each leaf)
//!     → store.rs (TrustStore / StoreHandle seam)
//!         → directory.rs (machine store: directory of PEM bundles)
//!         → memory.rs (in-process store)
//!     → Certificate (chain + private key) handed to the TLS layer
//! ```
//!
//! # Design Decisions
//! - The store is only ever read; certificates are never installed or renewed here
//! - Store handles are scoped: dropping the handle closes the store
//! - First match in enumeration order wins, duplicates are not an error

pub mod directory;
pub mod memory;
pub mod resolver;
pub mod store;
pub mod thumbprint;

pub use directory::DirectoryStore;
pub use memory::MemoryStore;
pub use resolver::{Certificate, CertificateResolver};
pub use store::{CertificateError, StoreEntry, StoreHandle, TrustStore};
pub use thumbprint::{Thumbprint, ThumbprintError};
