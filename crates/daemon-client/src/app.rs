//! Application state and the single-dispatch update loop.
//!
//! All cross-cutting client state lives in one owned `AppState`.
//! Network completions, stream items and poll ticks arrive as
//! `AppEvent`s processed one at a time; `update` mutates the state and
//! returns follow-up `Command`s for the executor instead of doing I/O
//! itself. Stale responses are dropped via per-endpoint `Latest` guards
//! since in-flight requests are never cancelled.

use client_core::{
    ApiError, BoundedLog, DaemonConfig, DaemonStats, DialogSeed, Fingerprint, FlyingVault,
    HistoryItem, Latest, LogItem, LoginState, RemoteData, User, UserKey, Vault, VaultDialogs,
    VaultId, VaultRequest,
};
use tracing::{debug, warn};

/// Endpoints refreshed by the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Vaults,
    FlyingVaults,
    Stats,
    Config,
}

/// One event on the dispatch queue.
#[derive(Debug)]
pub enum AppEvent {
    /// The poll schedule for an endpoint came due.
    PollDue(Endpoint),
    VaultsFetched {
        seq: u64,
        result: Result<Vec<Vault>, ApiError>,
    },
    FlyingVaultsFetched {
        seq: u64,
        result: Result<Vec<FlyingVault>, ApiError>,
    },
    StatsFetched {
        seq: u64,
        result: Result<DaemonStats, ApiError>,
    },
    ConfigFetched {
        seq: u64,
        result: Result<DaemonConfig, ApiError>,
    },
    LoginUserFetched {
        result: Result<User, ApiError>,
    },
    VaultUsersFetched {
        vault_id: VaultId,
        result: Result<Vec<User>, ApiError>,
    },
    FingerprintsFetched {
        vault_id: VaultId,
        result: Result<Vec<Fingerprint>, ApiError>,
    },
    HistoryFetched {
        vault_id: VaultId,
        result: Result<Vec<HistoryItem>, ApiError>,
    },
    KeySearchCompleted {
        vault_id: VaultId,
        email: String,
        result: Result<Vec<UserKey>, ApiError>,
    },
    /// A user-facing vault operation (create, clone, update, invite)
    /// finished; failures here are notification-worthy.
    VaultOperationCompleted {
        description: String,
        result: Result<(), ApiError>,
    },
    DaemonLogReceived(LogItem),
    VaultLogReceived {
        vault_id: VaultId,
        item: LogItem,
    },
    VaultHistoryReceived {
        vault_id: VaultId,
        item: HistoryItem,
    },
    StreamDecodeFailed {
        reason: String,
    },
}

/// A follow-up effect for the command executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    FetchVaults { seq: u64 },
    FetchFlyingVaults { seq: u64 },
    FetchStats { seq: u64 },
    FetchConfig { seq: u64 },
    FetchLoginUser,
    SearchKeys { vault_id: VaultId, email: String },
    /// A dialog-produced request (fetches, create/clone, updates, invites).
    Vault(VaultRequest),
}

/// The client's entire mutable state, owned by the dispatch loop.
#[derive(Debug, Default)]
pub struct AppState {
    pub vaults: RemoteData<Vec<Vault>>,
    pub flying_vaults: RemoteData<Vec<FlyingVault>>,
    pub stats: RemoteData<DaemonStats>,
    pub config: RemoteData<DaemonConfig>,
    pub login: LoginState,
    pub daemon_log: BoundedLog,
    pub dialogs: VaultDialogs,
    vaults_guard: Latest,
    flying_guard: Latest,
    stats_guard: Latest,
    config_guard: Latest,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands to issue once at startup, before the first poll tick.
    pub fn startup(&mut self) -> Vec<Command> {
        vec![Command::FetchLoginUser]
    }

    /// Process one event; returns the follow-up commands.
    pub fn update(&mut self, event: AppEvent) -> Vec<Command> {
        match event {
            AppEvent::PollDue(endpoint) => self.on_poll_due(endpoint),

            AppEvent::VaultsFetched { seq, result } => {
                if self.vaults_guard.try_complete(seq) {
                    self.vaults = RemoteData::from_result(result);
                } else {
                    debug!("Dropping stale vault list response (seq {})", seq);
                }
                Vec::new()
            }
            AppEvent::FlyingVaultsFetched { seq, result } => {
                if self.flying_guard.try_complete(seq) {
                    self.flying_vaults = RemoteData::from_result(result);
                } else {
                    debug!("Dropping stale flying-vault response (seq {})", seq);
                }
                Vec::new()
            }
            AppEvent::StatsFetched { seq, result } => {
                if self.stats_guard.try_complete(seq) {
                    self.stats = RemoteData::from_result(result);
                }
                Vec::new()
            }
            AppEvent::ConfigFetched { seq, result } => {
                if self.config_guard.try_complete(seq) {
                    self.config = RemoteData::from_result(result);
                }
                Vec::new()
            }

            AppEvent::LoginUserFetched { result } => {
                match result {
                    Ok(user) => {
                        self.login = LoginState::LoggedIn { email: user.email };
                    }
                    Err(ApiError::Status { .. }) => {
                        self.login = LoginState::LoggedOut;
                    }
                    Err(e) => {
                        // Transport trouble says nothing about the session.
                        warn!("Could not determine login state: {}", e);
                    }
                }
                Vec::new()
            }

            AppEvent::VaultUsersFetched { vault_id, result } => {
                if let Some(dialog) = self.dialogs.get_mut(&vault_id) {
                    dialog.apply_users(result);
                }
                Vec::new()
            }
            AppEvent::FingerprintsFetched { vault_id, result } => {
                if let Some(dialog) = self.dialogs.get_mut(&vault_id) {
                    dialog.apply_fingerprints(result);
                }
                Vec::new()
            }
            AppEvent::HistoryFetched { vault_id, result } => {
                match result {
                    Ok(items) => {
                        if let Some(dialog) = self.dialogs.get_mut(&vault_id) {
                            dialog.apply_history(items);
                        }
                    }
                    Err(e) => warn!("History fetch for {} failed: {}", vault_id, e),
                }
                Vec::new()
            }
            AppEvent::KeySearchCompleted {
                vault_id,
                email,
                result,
            } => {
                if let Some(dialog) = self.dialogs.get_mut(&vault_id) {
                    dialog.apply_key_search(&email, result);
                }
                Vec::new()
            }

            AppEvent::VaultOperationCompleted {
                description,
                result,
            } => {
                match result {
                    Ok(()) => debug!("{} succeeded", description),
                    Err(e) => warn!("{} failed: {}", description, e),
                }
                Vec::new()
            }

            AppEvent::DaemonLogReceived(item) => {
                self.daemon_log.prepend(item);
                Vec::new()
            }
            AppEvent::VaultLogReceived { vault_id, item } => {
                if let Some(dialog) = self.dialogs.get_mut(&vault_id) {
                    dialog.merge_log_item(item);
                }
                Vec::new()
            }
            AppEvent::VaultHistoryReceived { vault_id, item } => {
                if let Some(dialog) = self.dialogs.get_mut(&vault_id) {
                    dialog.merge_history_item(item);
                }
                Vec::new()
            }
            AppEvent::StreamDecodeFailed { reason } => {
                warn!("Dropping undecodable stream message: {}", reason);
                Vec::new()
            }
        }
    }

    fn on_poll_due(&mut self, endpoint: Endpoint) -> Vec<Command> {
        let command = match endpoint {
            Endpoint::Vaults => {
                let seq = self.vaults_guard.begin();
                if self.vaults.is_not_asked() {
                    self.vaults = RemoteData::Loading;
                }
                Command::FetchVaults { seq }
            }
            Endpoint::FlyingVaults => {
                let seq = self.flying_guard.begin();
                if self.flying_vaults.is_not_asked() {
                    self.flying_vaults = RemoteData::Loading;
                }
                Command::FetchFlyingVaults { seq }
            }
            Endpoint::Stats => {
                let seq = self.stats_guard.begin();
                Command::FetchStats { seq }
            }
            Endpoint::Config => {
                let seq = self.config_guard.begin();
                Command::FetchConfig { seq }
            }
        };
        vec![command]
    }

    // ---- dialog entry points (driven by the UI layer) ----

    /// Open the dialog for `id`, seeding from the fetched lists.
    pub fn open_vault_dialog(&mut self, id: &VaultId) -> Vec<Command> {
        let seed = if let Some(vault) = self
            .vaults
            .success()
            .and_then(|vaults| vaults.iter().find(|v| &v.id == id))
        {
            DialogSeed::Vault(vault)
        } else if let Some(flying) = self
            .flying_vaults
            .success()
            .and_then(|flying| flying.iter().find(|f| &f.id == id))
        {
            DialogSeed::Flying(flying)
        } else {
            DialogSeed::New
        };

        let requests = self.dialogs.open(id, seed);
        requests.into_iter().map(Command::Vault).collect()
    }

    /// Save the dialog for `id`: plan the requests and drop the edits.
    pub fn save_vault_dialog(&mut self, id: &VaultId) -> Vec<Command> {
        let Some(plan) = self.dialogs.save(id) else {
            return Vec::new();
        };
        plan.into_iter()
            .flat_map(|request| match request {
                // The list refresh goes through the guarded fetch path.
                VaultRequest::RefreshList => vec![
                    Command::FetchVaults {
                        seq: self.vaults_guard.begin(),
                    },
                    Command::FetchFlyingVaults {
                        seq: self.flying_guard.begin(),
                    },
                ],
                other => vec![Command::Vault(other)],
            })
            .collect()
    }

    pub fn cancel_vault_dialog(&mut self, id: &VaultId) {
        self.dialogs.cancel(id);
    }

    /// Search keys for `email` in the dialog for `id`, unless an equal
    /// search is already in flight or completed.
    pub fn search_vault_keys(&mut self, id: &VaultId, email: &str, force: bool) -> Vec<Command> {
        let Some(dialog) = self.dialogs.get_mut(id) else {
            return Vec::new();
        };
        if dialog.search_keys(email, force) {
            vec![Command::SearchKeys {
                vault_id: id.clone(),
                email: email.to_string(),
            }]
        } else {
            Vec::new()
        }
    }

    pub fn is_vault_owner(&self, id: &VaultId) -> bool {
        self.dialogs.is_owner(id, &self.login)
    }
}
