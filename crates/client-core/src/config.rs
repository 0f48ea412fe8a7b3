//! Daemon configuration and statistics wire types, plus the client's
//! view of the login session.

use serde::{Deserialize, Serialize};

/// Transfer counters reported by `GET stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonStats {
    #[serde(default)]
    pub uploads: u64,
    #[serde(default)]
    pub downloads: u64,
    #[serde(default)]
    pub open_connections: u64,
}

/// GUI-relevant daemon configuration, nested under `gui` on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuiConfig {
    #[serde(default)]
    pub is_first_launch: bool,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub gui: GuiConfig,
}

/// Partial update sent with `PATCH config`. Only the set fields are
/// transmitted, so an unset field leaves the daemon's value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GuiConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_first_launch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Login session as far as this client knows.
///
/// Starts out `Unknown` until the first `auth/check` or `auth/user`
/// response arrives; ownership checks treat `Unknown` as not-owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoginState {
    #[default]
    Unknown,
    LoggedOut,
    LoggedIn {
        email: String,
    },
}

impl LoginState {
    pub fn email(&self) -> Option<&str> {
        match self {
            LoginState::LoggedIn { email } => Some(email),
            _ => None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self, LoginState::LoggedIn { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_decodes_with_missing_counters() {
        let stats: DaemonStats = serde_json::from_str(r#"{"uploads": 3}"#).unwrap();
        assert_eq!(stats.uploads, 3);
        assert_eq!(stats.downloads, 0);
    }

    #[test]
    fn test_gui_patch_skips_unset_fields() {
        let patch = GuiConfigPatch {
            is_first_launch: Some(false),
            language: None,
        };
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"is_first_launch":false}"#);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = DaemonConfig {
            gui: GuiConfig {
                is_first_launch: true,
                language: Some("de".into()),
            },
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: DaemonConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_login_state_email() {
        assert!(LoginState::Unknown.email().is_none());
        assert!(!LoginState::LoggedOut.is_logged_in());
        let logged_in = LoginState::LoggedIn {
            email: "ada@example.org".into(),
        };
        assert_eq!(logged_in.email(), Some("ada@example.org"));
    }
}
