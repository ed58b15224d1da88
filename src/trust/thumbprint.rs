//! Certificate thumbprints.
//!
//! A thumbprint is the SHA-1 digest of a certificate's DER encoding, usually
//! written as 40 hex digits. Values copied out of certificate managers often
//! carry spaces, colons or an invisible left-to-right mark; all of those are
//! dropped and the rest is uppercased. Beyond that the value is taken as
//! given: a thumbprint of the wrong length or with stray characters is still
//! a valid query, it just matches no certificate.

use std::fmt;
use std::str::FromStr;

use sha1::{Digest, Sha1};
use thiserror::Error;

/// Length of a SHA-1 thumbprint in bytes.
pub const THUMBPRINT_LEN: usize = 20;

/// Error returned when a thumbprint string cannot be used as a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThumbprintError {
    #[error("thumbprint is empty")]
    Empty,
}

/// Normalised certificate thumbprint.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Thumbprint(String);

impl Thumbprint {
    /// Normalise a thumbprint, ignoring case and separators.
    pub fn parse(input: &str) -> Result<Self, ThumbprintError> {
        let digits: String = input
            .chars()
            .filter(|c| !is_separator(*c))
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if digits.is_empty() {
            return Err(ThumbprintError::Empty);
        }
        Ok(Self(digits))
    }

    /// Thumbprint of a DER-encoded certificate.
    pub fn of_der(der: &[u8]) -> Self {
        Self(hex::encode_upper(Sha1::digest(der)))
    }

    /// Whether the value has the shape of a SHA-1 digest. Anything else can
    /// never match a stored certificate.
    pub fn is_sha1(&self) -> bool {
        self.0.len() == THUMBPRINT_LEN * 2 && self.0.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Normalised uppercase digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Whitespace, colon separators and the format characters certificate
// managers prepend when a thumbprint is copied to the clipboard.
fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, ':' | '\u{200E}' | '\u{200F}' | '\u{FEFF}')
}

impl FromStr for Thumbprint {
    type Err = ThumbprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Thumbprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Thumbprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Thumbprint({})", self)
    }
}
