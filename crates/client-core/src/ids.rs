//! Identifier and path value types shared across the client.
//!
//! Vault ids and key fingerprints are opaque strings assigned by the
//! daemon; the client never generates or rewrites them.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdError {
    #[error("Vault id must not be empty")]
    EmptyVaultId,
    #[error("Fingerprint must not be empty")]
    EmptyFingerprint,
}

/// Opaque identifier of a vault, assigned by the daemon on creation.
///
/// Immutable once assigned; renames change vault metadata, never the id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct VaultId(String);

impl VaultId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for VaultId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VaultId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdError::EmptyVaultId);
        }
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for VaultId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier of a user's public key.
///
/// Stored and transmitted as the raw string the daemon reports;
/// `grouped` renders the spaced form used in key listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render in groups of four characters separated by spaces,
    /// e.g. `"413ab180…"` becomes `"413A B180 …"`.
    pub fn grouped(&self) -> String {
        self.0
            .to_ascii_uppercase()
            .as_bytes()
            .chunks(4)
            .map(|c| std::str::from_utf8(c).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdError::EmptyFingerprint);
        }
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for Fingerprint {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A filesystem path as an ordered list of segments.
///
/// The daemon reports folders as platform-native strings; the folder
/// chooser builds them segment by segment and joins with the separator
/// of the platform the client runs on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderPath {
    segments: Vec<String>,
}

/// Path separator of the platform the client is compiled for.
#[cfg(windows)]
pub const NATIVE_SEPARATOR: &str = "\\";
#[cfg(not(windows))]
pub const NATIVE_SEPARATOR: &str = "/";

impl FolderPath {
    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Join with an explicit separator.
    pub fn join_with(&self, separator: &str) -> String {
        self.segments.join(separator)
    }

    /// Join with the platform-native separator.
    pub fn join_native(&self) -> String {
        self.join_with(NATIVE_SEPARATOR)
    }
}

impl Display for FolderPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join_native())
    }
}
