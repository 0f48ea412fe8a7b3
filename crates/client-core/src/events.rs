//! History and log wire types streamed or fetched from the daemon.
//!
//! Enum decoding is strict: an unknown operation or log level is a
//! decode failure, never silently mapped to a fallback variant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{Fingerprint, VaultId};

/// One synced-file operation in a vault's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub revision_id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub operation: HistoryOp,
    #[serde(default)]
    pub path: Option<String>,
    pub user_email: String,
    pub fingerprint: Fingerprint,
    pub verified: bool,
}

/// Operation kinds appearing in vault history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryOp {
    #[serde(rename = "OP_CREATE_VAULT")]
    CreateVault,
    #[serde(rename = "OP_SET_METADATA")]
    SetMetadata,
    #[serde(rename = "OP_ADD_USER")]
    AddUser,
    #[serde(rename = "OP_REMOVE_USER")]
    RemoveUser,
    #[serde(rename = "OP_ADD_USER_KEY")]
    AddUserKey,
    #[serde(rename = "OP_REMOVE_USER_KEY")]
    RemoveUserKey,
    #[serde(rename = "OP_UPLOAD")]
    Upload,
    #[serde(rename = "OP_RENAME_FILE")]
    RenameFile,
    #[serde(rename = "OP_REMOVE_FILE")]
    RemoveFile,
    #[serde(rename = "OP_DELETE_FILE_REVISION")]
    DeleteFileRevision,
    #[serde(rename = "OP_RESTORE_FILE")]
    RestoreFile,
}

/// Severity of a daemon or vault log line.
///
/// The daemon emits levels in varying case (`"DEBUG"`, `"Debug"`,
/// `"debug"`); decoding is case-insensitive but still strict about the
/// set of known levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LogLevel {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        match raw.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(serde::de::Error::custom(format!(
                "unknown log level: {}",
                other
            ))),
        }
    }
}

/// One log line from the daemon or a vault's log stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogItem {
    pub level: LogLevel,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub message: String,
    /// Absent on daemon-wide log lines.
    #[serde(default)]
    pub vault_id: Option<VaultId>,
}

/// Generic `{"status": ..., "text": ...}` daemon response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl StatusResponse {
    pub fn success(&self) -> bool {
        self.status == "ok"
    }
}

/// Response of a vault export, carrying the written package filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportResponse {
    pub status: String,
    #[serde(default)]
    pub filename: Option<String>,
}

impl ExportResponse {
    pub fn success(&self) -> bool {
        self.status == "ok"
    }
}
