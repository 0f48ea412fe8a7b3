//! Vault wire types: the vault record reported by the daemon, the
//! not-yet-cloned "flying" vault, and the immutable crypto parameters.
//!
//! All types round-trip through serde; enum decoding is strict, an
//! unrecognized state string is a decode failure rather than a default.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{Fingerprint, VaultId};

/// Synchronization state of a vault as reported by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VaultStatus {
    Uninitialized,
    Unsynced,
    Syncing,
    Initializing,
    Synced,
    Ready,
    Failure,
}

/// Crypto parameters of a vault, fixed at creation.
///
/// The client only displays these; it never mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoInfo {
    pub aes_key_len: u32,
    pub rsa_key_len: u32,
    pub key_algo: String,
    pub transfer_algo: String,
    pub hash_algo: String,
    pub fingerprint: Option<Fingerprint>,
}

/// User-editable vault metadata, nested under `metadata` on the wire.
/// The whole object may be absent for vaults that were never named.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// A vault cloned and synced on this machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vault {
    pub id: VaultId,
    /// Stable across renames; distinct from `id` after re-clones.
    pub remote_id: VaultId,
    #[serde(default)]
    pub metadata: VaultMetadata,
    pub size: u64,
    pub state: VaultStatus,
    pub user_count: u32,
    pub file_count: u32,
    pub revision_count: u32,
    pub resource_uri: String,
    /// Local folder the vault is synced into; absent for stubs built
    /// from flying vaults.
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub modification_date: Option<DateTime<Utc>>,
    pub crypt_info: CryptoInfo,
    #[serde(default)]
    pub ignore_paths: Vec<String>,
}

/// A vault known to the server but not yet cloned to this machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlyingVault {
    pub id: VaultId,
    pub remote_id: VaultId,
    #[serde(default)]
    pub metadata: VaultMetadata,
    pub size: u64,
    pub user_count: u32,
    pub file_count: u32,
    pub revision_count: u32,
    pub resource_uri: String,
    #[serde(default)]
    pub modification_date: Option<DateTime<Utc>>,
    pub crypt_info: CryptoInfo,
}

impl FlyingVault {
    /// Convert to a vault stub: unsynced, with no local folder.
    pub fn as_vault(&self) -> Vault {
        Vault {
            id: self.id.clone(),
            remote_id: self.remote_id.clone(),
            metadata: self.metadata.clone(),
            size: self.size,
            state: VaultStatus::Unsynced,
            user_count: self.user_count,
            file_count: self.file_count,
            revision_count: self.revision_count,
            resource_uri: self.resource_uri.clone(),
            folder: None,
            modification_date: self.modification_date,
            crypt_info: self.crypt_info.clone(),
            ignore_paths: Vec::new(),
        }
    }
}

/// Common identity of cloned and flying vaults.
///
/// The display name falls back to the raw vault id for vaults without
/// metadata, so listings always have something to show.
pub trait HasIdentity {
    fn vault_id(&self) -> &VaultId;
    fn display_name(&self) -> &str;
}

impl HasIdentity for Vault {
    fn vault_id(&self) -> &VaultId {
        &self.id
    }

    fn display_name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or(self.id.as_str())
    }
}

impl HasIdentity for FlyingVault {
    fn vault_id(&self) -> &VaultId {
        &self.id
    }

    fn display_name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or(self.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crypto() -> CryptoInfo {
        CryptoInfo {
            aes_key_len: 256,
            rsa_key_len: 4096,
            key_algo: "RSA".into(),
            transfer_algo: "AES".into(),
            hash_algo: "SHA256".into(),
            fingerprint: None,
        }
    }

    fn vault() -> Vault {
        Vault {
            id: VaultId::from("abc123"),
            remote_id: VaultId::from("abc123"),
            metadata: VaultMetadata {
                name: Some("Photos".into()),
                icon: None,
            },
            size: 10,
            state: VaultStatus::Ready,
            user_count: 1,
            file_count: 2,
            revision_count: 3,
            resource_uri: "/v1/vault/abc123".into(),
            folder: Some("/home/u/v".into()),
            modification_date: None,
            crypt_info: crypto(),
            ignore_paths: vec![".git".into()],
        }
    }

    // ==================== Status decoding ====================

    #[test]
    fn test_status_decodes_all_known_values() {
        let cases = [
            ("uninitialized", VaultStatus::Uninitialized),
            ("unsynced", VaultStatus::Unsynced),
            ("syncing", VaultStatus::Syncing),
            ("initializing", VaultStatus::Initializing),
            ("synced", VaultStatus::Synced),
            ("ready", VaultStatus::Ready),
            ("failure", VaultStatus::Failure),
        ];
        for (wire, expected) in cases {
            let parsed: VaultStatus =
                serde_json::from_str(&format!("\"{}\"", wire)).unwrap();
            assert_eq!(parsed, expected);
        }
    }

    #[test]
    fn test_status_rejects_unknown_value() {
        assert!(serde_json::from_str::<VaultStatus>("\"exploded\"").is_err());
        assert!(serde_json::from_str::<VaultStatus>("\"READY\"").is_err());
    }

    // ==================== Vault codec ====================

    #[test]
    fn test_vault_roundtrip() {
        let original = vault();
        let json = serde_json::to_string(&original).unwrap();
        let parsed: Vault = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_vault_decodes_without_metadata() {
        let json = r#"{
            "id": "abc123",
            "remote_id": "abc123",
            "size": 10,
            "state": "ready",
            "user_count": 1,
            "file_count": 2,
            "revision_count": 3,
            "resource_uri": "/v1/vault/abc123",
            "folder": "/home/u/v",
            "ignore_paths": [],
            "crypt_info": {
                "aes_key_len": 256,
                "rsa_key_len": 4096,
                "key_algo": "RSA",
                "transfer_algo": "AES",
                "hash_algo": "SHA256",
                "fingerprint": null
            }
        }"#;
        let parsed: Vault = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.state, VaultStatus::Ready);
        assert_eq!(parsed.crypt_info.aes_key_len, 256);
        assert!(parsed.metadata.name.is_none());
        assert!(parsed.modification_date.is_none());
    }

    #[test]
    fn test_vault_rejects_bad_state() {
        let json = r#"{"id": "a", "remote_id": "a", "size": 0, "state": "wat",
            "user_count": 0, "file_count": 0, "revision_count": 0,
            "resource_uri": "", "crypt_info": {"aes_key_len": 1,
            "rsa_key_len": 1, "key_algo": "", "transfer_algo": "",
            "hash_algo": "", "fingerprint": null}}"#;
        assert!(serde_json::from_str::<Vault>(json).is_err());
    }

    // ==================== Flying vaults ====================

    #[test]
    fn test_flying_vault_as_vault_stub() {
        let flying = FlyingVault {
            id: VaultId::from("fly1"),
            remote_id: VaultId::from("fly1"),
            metadata: VaultMetadata::default(),
            size: 42,
            user_count: 2,
            file_count: 9,
            revision_count: 4,
            resource_uri: "/v1/flying-vault/fly1".into(),
            modification_date: None,
            crypt_info: crypto(),
        };

        let stub = flying.as_vault();
        assert_eq!(stub.state, VaultStatus::Unsynced);
        assert!(stub.folder.is_none());
        assert!(stub.ignore_paths.is_empty());
        assert_eq!(stub.revision_count, 4);
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let mut v = vault();
        assert_eq!(v.display_name(), "Photos");
        v.metadata.name = None;
        assert_eq!(v.display_name(), "abc123");
        assert_eq!(v.vault_id(), &VaultId::from("abc123"));
    }
}
