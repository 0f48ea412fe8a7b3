//! Vault member and user-key wire types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::Fingerprint;

/// A member of a vault.
///
/// Identified by email, case-sensitive as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub access_granted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Full name for listings, falling back to the email when the
    /// profile has no name set.
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }
}

/// A public key belonging to a user. The fingerprint is the unique
/// identifier; a user may hold one key per device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserKey {
    pub fingerprint: Fingerprint,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name() {
        let user = User {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.org".into(),
            access_granted_at: None,
        };
        assert_eq!(user.full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_full_name_falls_back_to_email() {
        let user = User {
            first_name: "".into(),
            last_name: "".into(),
            email: "ada@example.org".into(),
            access_granted_at: None,
        };
        assert_eq!(user.full_name(), "ada@example.org");
    }

    #[test]
    fn test_user_decodes_minimal() {
        let user: User = serde_json::from_str(r#"{"email": "a@b.c"}"#).unwrap();
        assert_eq!(user.email, "a@b.c");
        assert!(user.access_granted_at.is_none());
    }

    #[test]
    fn test_user_key_roundtrip() {
        let key = UserKey {
            fingerprint: Fingerprint::from("413ab1802de1"),
            description: "laptop".into(),
            created_at: None,
        };
        let json = serde_json::to_string(&key).unwrap();
        let parsed: UserKey = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, key);
    }
}
