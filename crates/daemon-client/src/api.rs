//! Typed wrappers for the daemon's REST endpoints.
//!
//! One async method per endpoint; each builds its fixed path, attaches
//! the auth header via the shared plumbing and decodes the typed
//! response. Nothing here blocks and nothing panics; every outcome is a
//! `Result` the caller folds into its `RemoteData` cells.

use client_core::{
    ApiError, DaemonConfig, DaemonStats, ExportResponse, Fingerprint, FlyingVault,
    GuiConfigPatch, HistoryItem, StatusResponse, User, UserKey, Vault, VaultId,
};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::http::{ApiConfig, HttpClient};

/// Wire wrapper around a vault's history listing.
#[derive(Debug, Deserialize)]
struct HistoryResponse {
    items: Vec<HistoryItem>,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    version: String,
}

/// Client for the daemon's REST API.
#[derive(Debug, Clone)]
pub struct DaemonApi {
    http: HttpClient,
}

impl DaemonApi {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        Ok(Self {
            http: HttpClient::new(config)?,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        self.http.config()
    }

    // ---- daemon ----

    pub async fn stats(&self) -> Result<DaemonStats, ApiError> {
        self.http.get("stats").await
    }

    pub async fn version(&self) -> Result<String, ApiError> {
        let response: VersionResponse = self.http.get("version").await?;
        Ok(response.version)
    }

    pub async fn daemon_config(&self) -> Result<DaemonConfig, ApiError> {
        self.http.get("config").await
    }

    /// Partially update the GUI section of the daemon config.
    pub async fn patch_gui_config(
        &self,
        patch: &GuiConfigPatch,
    ) -> Result<DaemonConfig, ApiError> {
        self.http
            .request(Method::PATCH, "config", Some(json!({ "gui": patch })))
            .await
    }

    pub async fn send_feedback(&self, text: &str) -> Result<StatusResponse, ApiError> {
        self.http
            .request(Method::POST, "feedback", Some(json!({ "feedback": text })))
            .await
    }

    // ---- vaults ----

    pub async fn vaults(&self) -> Result<Vec<Vault>, ApiError> {
        self.http.get("vault").await
    }

    pub async fn vault(&self, id: &VaultId) -> Result<Vault, ApiError> {
        self.http.get(&format!("vault/{}", id)).await
    }

    pub async fn flying_vaults(&self) -> Result<Vec<FlyingVault>, ApiError> {
        self.http.get("flying-vault").await
    }

    pub async fn flying_vault(&self, id: &VaultId) -> Result<FlyingVault, ApiError> {
        self.http.get(&format!("flying-vault/{}", id)).await
    }

    /// Create a new vault from a local folder.
    pub async fn create_vault(
        &self,
        folder: &str,
        ignore_paths: &[String],
    ) -> Result<Vault, ApiError> {
        self.http
            .request(
                Method::POST,
                "vault",
                Some(json!({ "folder": folder, "ignore_paths": ignore_paths })),
            )
            .await
    }

    /// Clone a remote vault into a local folder.
    pub async fn clone_vault(&self, id: &VaultId, folder: &str) -> Result<Vault, ApiError> {
        self.http
            .request(
                Method::POST,
                "vault",
                Some(json!({ "id": id, "folder": folder })),
            )
            .await
    }

    /// Import a vault from an exported key package.
    pub async fn import_vault(
        &self,
        folder: &str,
        import_package: &str,
    ) -> Result<Vault, ApiError> {
        self.http
            .request(
                Method::POST,
                "vault",
                Some(json!({ "folder": folder, "import_package": import_package })),
            )
            .await
    }

    pub async fn update_vault_metadata(
        &self,
        id: &VaultId,
        name: Option<&str>,
        icon: Option<&str>,
    ) -> Result<StatusResponse, ApiError> {
        self.http
            .request(
                Method::PUT,
                &format!("vault/{}", id),
                Some(json!({ "metadata": { "name": name, "icon": icon } })),
            )
            .await
    }

    pub async fn update_vault_ignore_paths(
        &self,
        id: &VaultId,
        ignore_paths: &[String],
    ) -> Result<StatusResponse, ApiError> {
        self.http
            .request(
                Method::PUT,
                &format!("vault/{}", id),
                Some(json!({ "ignore_paths": ignore_paths })),
            )
            .await
    }

    /// Permanently delete a vault and its server-side data.
    pub async fn delete_vault(&self, id: &VaultId) -> Result<StatusResponse, ApiError> {
        self.http
            .request(Method::DELETE, &format!("vault/{}?wipe=1", id), None)
            .await
    }

    /// Remove a vault from local sync, keeping it on the server.
    pub async fn remove_vault(&self, id: &VaultId) -> Result<StatusResponse, ApiError> {
        self.http
            .request(
                Method::DELETE,
                &format!("vault/{}", id),
                Some(json!({ "wipe": false })),
            )
            .await
    }

    pub async fn export_vault(
        &self,
        id: &VaultId,
        path: &str,
    ) -> Result<ExportResponse, ApiError> {
        self.http
            .request(
                Method::POST,
                &format!("vault/{}/export", id),
                Some(json!({ "path": path })),
            )
            .await
    }

    pub async fn resync_vault(&self, id: &VaultId) -> Result<StatusResponse, ApiError> {
        self.http.get(&format!("vault/{}/resync", id)).await
    }

    pub async fn vault_history(&self, id: &VaultId) -> Result<Vec<HistoryItem>, ApiError> {
        let response: HistoryResponse = self.http.get(&format!("vault/{}/history", id)).await?;
        Ok(response.items)
    }

    pub async fn vault_fingerprints(&self, id: &VaultId) -> Result<Vec<Fingerprint>, ApiError> {
        self.http.get(&format!("vault/{}/fingerprints", id)).await
    }

    // ---- vault members ----

    pub async fn vault_users(&self, id: &VaultId) -> Result<Vec<User>, ApiError> {
        self.http.get(&format!("vault/{}/users", id)).await
    }

    pub async fn vault_user(&self, id: &VaultId, email: &str) -> Result<User, ApiError> {
        self.http.get(&format!("vault/{}/users/{}", id, email)).await
    }

    /// Invite a user, granting access to the given key fingerprints.
    pub async fn add_vault_user(
        &self,
        id: &VaultId,
        email: &str,
        fingerprints: &[Fingerprint],
    ) -> Result<StatusResponse, ApiError> {
        self.http
            .request(
                Method::POST,
                &format!("vault/{}/users", id),
                Some(json!({ "email": email, "fingerprints": fingerprints })),
            )
            .await
    }

    pub async fn remove_vault_user(
        &self,
        id: &VaultId,
        email: &str,
    ) -> Result<StatusResponse, ApiError> {
        self.http
            .request(Method::DELETE, &format!("vault/{}/users/{}", id, email), None)
            .await
    }

    pub async fn user_keys(&self, email: &str) -> Result<Vec<UserKey>, ApiError> {
        self.http.get(&format!("user/{}/keys", email)).await
    }

    // ---- auth ----

    pub async fn login(&self, email: &str, password: &str) -> Result<StatusResponse, ApiError> {
        self.http
            .request(
                Method::POST,
                "auth/login",
                Some(json!({ "email": email, "password": password })),
            )
            .await
    }

    pub async fn login_check(&self) -> Result<StatusResponse, ApiError> {
        self.http.get("auth/check").await
    }

    pub async fn logout(&self) -> Result<StatusResponse, ApiError> {
        self.http.get("auth/logout").await
    }

    /// The currently logged-in user's profile.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.http.get("auth/user").await
    }

    /// Export the user's identity key package to a local path.
    pub async fn export_user_key(&self, path: &str) -> Result<ExportResponse, ApiError> {
        self.http
            .request(Method::POST, "identity/export", Some(json!({ "path": path })))
            .await
    }
}
