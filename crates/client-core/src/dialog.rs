//! Per-vault dialog state: local edits reconciled against server state.
//!
//! The dialog map is the sole owner of in-flight edits. Server-derived
//! lists (vaults, users, history) are replaced wholesale on fetch, while
//! pending edits live only here and survive background refreshes. All
//! operations are pure mutations returning request descriptors; network
//! I/O happens in the daemon-client crate.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use tracing::debug;

use crate::config::LoginState;
use crate::events::{HistoryItem, LogItem, LogLevel};
use crate::ids::{Fingerprint, FolderPath, VaultId};
use crate::remote::{ApiError, RemoteData};
use crate::user::{User, UserKey};
use crate::vault::{FlyingVault, Vault};

/// Daemon-wide log retention.
pub const DAEMON_LOG_CAP: usize = 500;

/// Lifecycle of a vault relative to this machine.
///
/// `New` and `NotCloned` both converge on `Cloned` after a successful
/// create or clone; `Cloned` is the steady state and stays re-enterable
/// for edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneStatus {
    /// Being created locally, not yet on the server.
    New,
    /// Known via a flying vault, not yet cloned to this machine.
    NotCloned,
    /// Fully synced entity.
    Cloned,
}

/// Sort order for the dialog's event listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EventSort {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// A request the dialog layer wants the daemon client to issue.
///
/// Descriptors only; execution and failure handling live with the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultRequest {
    FetchUsers(VaultId),
    FetchFingerprints(VaultId),
    FetchHistory(VaultId),
    Create {
        folder: String,
        ignore_paths: Vec<String>,
    },
    CloneRemote {
        id: VaultId,
        folder: String,
    },
    UpdateMetadata {
        id: VaultId,
        name: Option<String>,
        icon: Option<String>,
    },
    UpdateIgnorePaths {
        id: VaultId,
        ignore_paths: Vec<String>,
    },
    AddUser {
        id: VaultId,
        email: String,
        fingerprints: Vec<Fingerprint>,
    },
    RefreshList,
}

/// Requests produced by a save, in issue order.
pub type SavePlan = Vec<VaultRequest>;

/// Client-side state of one open vault dialog.
#[derive(Debug, Clone)]
pub struct VaultDialogState {
    pub clone_status: CloneStatus,
    /// Pending rename; `None` means the server name is untouched.
    pub name_input: Option<String>,
    pub icon_input: Option<String>,
    /// Folder chosen for create/clone.
    pub folder_input: Option<FolderPath>,
    /// Current ignore selection, seeded from the server record on open.
    pub ignored_paths: BTreeSet<String>,
    /// Folders expanded in the file tree.
    pub expanded_folders: BTreeSet<String>,
    /// Invitations not yet sent: email -> selected key fingerprints.
    pub pending_invites: BTreeMap<String, Vec<Fingerprint>>,
    pub users: RemoteData<Vec<User>>,
    /// Key-search results per email, deduplicated by `search_keys`.
    pub key_search: HashMap<String, RemoteData<Vec<UserKey>>>,
    pub fingerprints: RemoteData<Vec<Fingerprint>>,
    /// Most-recent-first; replaced by fetches, prepended by the stream.
    pub history: Vec<HistoryItem>,
    /// Per-vault log lines, most-recent-first, uncapped.
    pub log: Vec<LogItem>,
    /// Hide log lines below this level; `None` shows everything.
    pub filter_level: Option<LogLevel>,
    pub sort: EventSort,
    pub has_changes: bool,
}

impl VaultDialogState {
    fn empty(clone_status: CloneStatus) -> Self {
        Self {
            clone_status,
            name_input: None,
            icon_input: None,
            folder_input: None,
            ignored_paths: BTreeSet::new(),
            expanded_folders: BTreeSet::new(),
            pending_invites: BTreeMap::new(),
            users: RemoteData::NotAsked,
            key_search: HashMap::new(),
            fingerprints: RemoteData::NotAsked,
            history: Vec::new(),
            log: Vec::new(),
            filter_level: None,
            sort: EventSort::default(),
            has_changes: false,
        }
    }

    fn for_vault(vault: &Vault) -> Self {
        let mut state = Self::empty(CloneStatus::Cloned);
        state.ignored_paths = vault.ignore_paths.iter().cloned().collect();
        state
    }

    fn for_flying(_flying: &FlyingVault) -> Self {
        Self::empty(CloneStatus::NotCloned)
    }

    // ---- local edits ----

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name_input = Some(name.into());
        self.has_changes = true;
    }

    pub fn set_icon(&mut self, icon: impl Into<String>) {
        self.icon_input = Some(icon.into());
        self.has_changes = true;
    }

    pub fn set_folder(&mut self, folder: FolderPath) {
        self.folder_input = Some(folder);
        self.has_changes = true;
    }

    pub fn add_ignored_path(&mut self, path: impl Into<String>) {
        self.ignored_paths.insert(path.into());
        self.has_changes = true;
    }

    pub fn remove_ignored_path(&mut self, path: &str) {
        self.ignored_paths.remove(path);
        self.has_changes = true;
    }

    pub fn toggle_folder(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.expanded_folders.remove(&path) {
            self.expanded_folders.insert(path);
        }
        self.has_changes = true;
    }

    /// Queue an invitation for `email` with the selected key fingerprints.
    /// Re-adding the same email replaces the previous key selection.
    pub fn add_invite(&mut self, email: impl Into<String>, keys: Vec<Fingerprint>) {
        self.pending_invites.insert(email.into(), keys);
        self.has_changes = true;
    }

    pub fn remove_invite(&mut self, email: &str) {
        self.pending_invites.remove(email);
        self.has_changes = true;
    }

    // ---- server results ----

    pub fn apply_users(&mut self, result: Result<Vec<User>, ApiError>) {
        self.users = RemoteData::from_result(result);
    }

    pub fn apply_fingerprints(&mut self, result: Result<Vec<Fingerprint>, ApiError>) {
        self.fingerprints = RemoteData::from_result(result);
    }

    /// Replace the history with a freshly fetched list, newest first.
    pub fn apply_history(&mut self, mut items: Vec<HistoryItem>) {
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.history = items;
    }

    pub fn apply_key_search(&mut self, email: &str, result: Result<Vec<UserKey>, ApiError>) {
        self.key_search
            .insert(email.to_string(), RemoteData::from_result(result));
    }

    /// Whether a key search for `email` should be issued. A search that
    /// is already in flight or completed is not repeated unless forced.
    pub fn search_keys(&mut self, email: &str, force: bool) -> bool {
        if !force {
            match self.key_search.get(email) {
                Some(RemoteData::Loading) | Some(RemoteData::Success(_)) => return false,
                _ => {}
            }
        }
        self.key_search
            .insert(email.to_string(), RemoteData::Loading);
        true
    }

    // ---- stream merges ----

    pub fn merge_log_item(&mut self, item: LogItem) {
        self.log.insert(0, item);
    }

    pub fn merge_history_item(&mut self, item: HistoryItem) {
        self.history.insert(0, item);
    }

    /// Log lines at or above the filter level, in the selected order.
    pub fn filtered_log(&self) -> Vec<&LogItem> {
        let iter = self
            .log
            .iter()
            .filter(|item| self.filter_level.map_or(true, |min| item.level >= min));
        match self.sort {
            EventSort::NewestFirst => iter.collect(),
            EventSort::OldestFirst => {
                let mut items: Vec<_> = iter.collect();
                items.reverse();
                items
            }
        }
    }

    fn save_plan(&self, id: &VaultId) -> SavePlan {
        let folder = self
            .folder_input
            .as_ref()
            .map(|f| f.join_native())
            .unwrap_or_default();

        let mut plan = Vec::new();
        match self.clone_status {
            CloneStatus::New => {
                plan.push(VaultRequest::Create {
                    folder,
                    ignore_paths: self.ignored_paths.iter().cloned().collect(),
                });
            }
            CloneStatus::NotCloned => {
                plan.push(VaultRequest::CloneRemote {
                    id: id.clone(),
                    folder,
                });
            }
            CloneStatus::Cloned => {
                if self.name_input.is_some() || self.icon_input.is_some() {
                    plan.push(VaultRequest::UpdateMetadata {
                        id: id.clone(),
                        name: self.name_input.clone(),
                        icon: self.icon_input.clone(),
                    });
                }
                plan.push(VaultRequest::UpdateIgnorePaths {
                    id: id.clone(),
                    ignore_paths: self.ignored_paths.iter().cloned().collect(),
                });
                // One request per invitation; a failing one must not
                // block the others, so they are independent entries.
                for (email, keys) in &self.pending_invites {
                    plan.push(VaultRequest::AddUser {
                        id: id.clone(),
                        email: email.clone(),
                        fingerprints: keys.clone(),
                    });
                }
            }
        }
        plan.push(VaultRequest::RefreshList);
        plan
    }
}

/// What an `open` call seeds the dialog from.
#[derive(Debug, Clone, Copy)]
pub enum DialogSeed<'a> {
    /// A vault being created; nothing exists server-side yet, so the
    /// caller keys it with a placeholder id and no fetches are issued.
    New,
    Vault(&'a Vault),
    Flying(&'a FlyingVault),
}

/// All open vault dialogs, keyed by vault id.
#[derive(Debug, Clone, Default)]
pub struct VaultDialogs {
    dialogs: HashMap<VaultId, VaultDialogState>,
}

impl VaultDialogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &VaultId) -> Option<&VaultDialogState> {
        self.dialogs.get(id)
    }

    pub fn get_mut(&mut self, id: &VaultId) -> Option<&mut VaultDialogState> {
        self.dialogs.get_mut(id)
    }

    pub fn is_open(&self, id: &VaultId) -> bool {
        self.dialogs.contains_key(id)
    }

    /// Open the dialog for `id`. Creates default state on first open and
    /// returns the background fetches to issue; re-opening an existing
    /// dialog keeps its edits and issues nothing.
    pub fn open(&mut self, id: &VaultId, seed: DialogSeed<'_>) -> Vec<VaultRequest> {
        if self.dialogs.contains_key(id) {
            return Vec::new();
        }

        let (state, requests) = match seed {
            DialogSeed::New => (VaultDialogState::empty(CloneStatus::New), Vec::new()),
            DialogSeed::Vault(vault) => (
                VaultDialogState::for_vault(vault),
                vec![
                    VaultRequest::FetchUsers(id.clone()),
                    VaultRequest::FetchFingerprints(id.clone()),
                    VaultRequest::FetchHistory(id.clone()),
                ],
            ),
            DialogSeed::Flying(flying) => (
                VaultDialogState::for_flying(flying),
                vec![
                    VaultRequest::FetchUsers(id.clone()),
                    VaultRequest::FetchFingerprints(id.clone()),
                    VaultRequest::FetchHistory(id.clone()),
                ],
            ),
        };

        debug!("Opening vault dialog for {}", id);
        let mut state = state;
        if !requests.is_empty() {
            state.users = RemoteData::Loading;
            state.fingerprints = RemoteData::Loading;
        }
        self.dialogs.insert(id.clone(), state);
        requests
    }

    /// Build the save plan for `id` and discard the cached edit state.
    ///
    /// The entry is removed immediately, before any of the planned
    /// requests run; their later success or failure never resurrects it.
    pub fn save(&mut self, id: &VaultId) -> Option<SavePlan> {
        let state = self.dialogs.remove(id)?;
        let plan = state.save_plan(id);
        debug!("Planned {} request(s) saving vault {}", plan.len(), id);
        Some(plan)
    }

    /// Discard the cached edit state without any network call.
    pub fn cancel(&mut self, id: &VaultId) {
        self.dialogs.remove(id);
    }

    /// Whether the current viewer owns the vault: a vault still being
    /// created is treated permissively as owned; otherwise the first
    /// fetched member must match the logged-in email.
    pub fn is_owner(&self, id: &VaultId, login: &LoginState) -> bool {
        let Some(state) = self.dialogs.get(id) else {
            return false;
        };
        if state.clone_status == CloneStatus::New {
            return true;
        }
        let Some(email) = login.email() else {
            return false;
        };
        state
            .users
            .success()
            .and_then(|users| users.first())
            .map(|first| first.email == email)
            .unwrap_or(false)
    }

    pub fn open_ids(&self) -> impl Iterator<Item = &VaultId> {
        self.dialogs.keys()
    }
}

/// Bounded most-recent-first log buffer for the daemon-wide stream.
#[derive(Debug, Clone)]
pub struct BoundedLog {
    items: VecDeque<LogItem>,
    cap: usize,
}

impl Default for BoundedLog {
    fn default() -> Self {
        Self::new(DAEMON_LOG_CAP)
    }
}

impl BoundedLog {
    pub fn new(cap: usize) -> Self {
        Self {
            items: VecDeque::new(),
            cap,
        }
    }

    /// Prepend an item, evicting the oldest once the cap is reached.
    pub fn prepend(&mut self, item: LogItem) {
        self.items.push_front(item);
        self.items.truncate(self.cap);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogItem> {
        self.items.iter()
    }
}
