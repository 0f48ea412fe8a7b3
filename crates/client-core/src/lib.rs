//! client-core: Domain model and state cache for the Syncrypt desktop client.
//!
//! This crate provides the network-free half of the client:
//! - Vault, user, key, history and log wire types with JSON codecs
//! - The four-state remote-request cell and error taxonomy
//! - Per-vault dialog state reconciling local edits with server state
//!
//! Everything that talks to the daemon lives in the daemon-client crate.

pub mod config;
pub mod dialog;
pub mod events;
pub mod ids;
pub mod remote;
pub mod user;
pub mod vault;

pub use config::{DaemonConfig, DaemonStats, GuiConfig, GuiConfigPatch, LoginState};
pub use dialog::{
    BoundedLog, CloneStatus, DialogSeed, SavePlan, VaultDialogState, VaultDialogs, VaultRequest,
    DAEMON_LOG_CAP,
};
pub use events::{ExportResponse, HistoryItem, HistoryOp, LogItem, LogLevel, StatusResponse};
pub use ids::{Fingerprint, FolderPath, VaultId};
pub use remote::{ApiError, Latest, RemoteData};
pub use user::{User, UserKey};
pub use vault::{CryptoInfo, FlyingVault, HasIdentity, Vault, VaultMetadata, VaultStatus};
