//! Viewer session persistence
//!
//! Owns the stored profile and API tokens on disk and is the single source of
//! truth for "who is signed in". Both records live in the shared config
//! directory as JSON files.

mod events;

pub use events::{AuthEvent, AuthEvents, Subscription};

use std::path::PathBuf;
use std::sync::RwLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const PROFILE_FILE: &str = "profile.json";
const TOKENS_FILE: &str = "tokens.json";

/// Stored profile record
///
/// Older installs wrote the viewer id under `id`; `user_id` wins when both
/// are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl ProfileRecord {
    fn viewer_id(&self) -> Option<i64> {
        self.user_id.or(self.id)
    }
}

/// Stored API credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredTokens {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Session state backed by JSON files in the config directory
pub struct SessionStore {
    dir: PathBuf,
    events: AuthEvents,
    profile: RwLock<Option<ProfileRecord>>,
    tokens: RwLock<Option<StoredTokens>>,
}

impl SessionStore {
    /// Open the session store in the shared config directory
    pub fn new() -> Result<Self> {
        let dir = config::ensure_config_dir()?;
        Ok(Self::with_dir(dir))
    }

    /// Open the session store rooted at an explicit directory
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let profile = config::load_json_file(&dir.join(PROFILE_FILE)).ok();
        let tokens = config::load_json_file(&dir.join(TOKENS_FILE)).ok();
        Self {
            dir,
            events: AuthEvents::new(),
            profile: RwLock::new(profile),
            tokens: RwLock::new(tokens),
        }
    }

    /// The auth event bus for this session
    pub fn events(&self) -> &AuthEvents {
        &self.events
    }

    /// The signed-in viewer's id, if any
    pub fn viewer_id(&self) -> Option<i64> {
        self.profile
            .read()
            .ok()
            .and_then(|p| p.as_ref().and_then(ProfileRecord::viewer_id))
    }

    /// The signed-in viewer's display name, if known
    pub fn display_name(&self) -> Option<String> {
        self.profile
            .read()
            .ok()
            .and_then(|p| p.as_ref().and_then(|r| r.display_name.clone()))
    }

    /// The current access token, if a session is stored
    pub fn access_token(&self) -> Option<String> {
        self.tokens
            .read()
            .ok()
            .and_then(|t| t.as_ref().map(|t| t.access_token.clone()))
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// Persist a new session and announce the sign-in
    pub fn store_session(&self, profile: ProfileRecord, tokens: StoredTokens) -> Result<()> {
        config::save_json_file(&self.dir.join(PROFILE_FILE), &profile)?;
        config::save_json_file(&self.dir.join(TOKENS_FILE), &tokens)?;

        let viewer_id = profile.viewer_id();
        if let Ok(mut slot) = self.profile.write() {
            *slot = Some(profile);
        }
        if let Ok(mut slot) = self.tokens.write() {
            *slot = Some(tokens);
        }

        if let Some(viewer_id) = viewer_id {
            self.events.emit(&AuthEvent::SignedIn { viewer_id });
        }
        Ok(())
    }

    /// Drop the stored session and announce the sign-out
    pub fn clear(&self) -> Result<()> {
        config::remove_file(&self.dir.join(PROFILE_FILE))?;
        config::remove_file(&self.dir.join(TOKENS_FILE))?;

        if let Ok(mut slot) = self.profile.write() {
            *slot = None;
        }
        if let Ok(mut slot) = self.tokens.write() {
            *slot = None;
        }

        self.events.emit(&AuthEvent::SignedOut);
        Ok(())
    }

    /// Re-read both records from disk, replacing the cached copies
    pub fn reload(&self) -> Result<()> {
        let profile = match config::load_json_file(&self.dir.join(PROFILE_FILE)) {
            Ok(record) => Some(record),
            Err(_) => None,
        };
        let tokens = match config::load_json_file(&self.dir.join(TOKENS_FILE)) {
            Ok(record) => Some(record),
            Err(_) => None,
        };

        let mut profile_slot = self
            .profile
            .write()
            .ok()
            .context("session profile lock poisoned")?;
        *profile_slot = profile;
        drop(profile_slot);

        let mut tokens_slot = self
            .tokens
            .write()
            .ok()
            .context("session tokens lock poisoned")?;
        *tokens_slot = tokens;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn sample_profile() -> ProfileRecord {
        ProfileRecord {
            user_id: Some(42),
            id: None,
            display_name: Some("Alice".to_string()),
        }
    }

    fn sample_tokens() -> StoredTokens {
        StoredTokens {
            access_token: "tok-1".to_string(),
            refresh_token: None,
        }
    }

    #[test]
    fn test_empty_dir_means_signed_out() {
        let dir = TempDir::new().unwrap();
        let session = SessionStore::with_dir(dir.path());
        assert!(!session.is_authenticated());
        assert!(session.viewer_id().is_none());
    }

    #[test]
    fn test_store_and_reopen_session() {
        let dir = TempDir::new().unwrap();
        let session = SessionStore::with_dir(dir.path());
        session
            .store_session(sample_profile(), sample_tokens())
            .unwrap();

        assert_eq!(session.viewer_id(), Some(42));
        assert_eq!(session.access_token(), Some("tok-1".to_string()));

        // A fresh store over the same dir sees the persisted session
        let reopened = SessionStore::with_dir(dir.path());
        assert_eq!(reopened.viewer_id(), Some(42));
        assert_eq!(reopened.display_name(), Some("Alice".to_string()));
    }

    #[test]
    fn test_legacy_id_field_fallback() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(PROFILE_FILE), r#"{"id": 7}"#).unwrap();
        let session = SessionStore::with_dir(dir.path());
        assert_eq!(session.viewer_id(), Some(7));
    }

    #[test]
    fn test_clear_removes_files_and_emits() {
        let dir = TempDir::new().unwrap();
        let session = SessionStore::with_dir(dir.path());
        session
            .store_session(sample_profile(), sample_tokens())
            .unwrap();

        let signed_out = Arc::new(AtomicUsize::new(0));
        let seen = signed_out.clone();
        let _sub = session.events().subscribe(move |event| {
            if *event == AuthEvent::SignedOut {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });

        session.clear().unwrap();
        assert!(!session.is_authenticated());
        assert!(!dir.path().join(TOKENS_FILE).exists());
        assert_eq!(signed_out.load(Ordering::SeqCst), 1);

        // Clearing twice is fine
        session.clear().unwrap();
    }

    #[test]
    fn test_store_emits_signed_in() {
        let dir = TempDir::new().unwrap();
        let session = SessionStore::with_dir(dir.path());

        let seen_id = Arc::new(AtomicUsize::new(0));
        let slot = seen_id.clone();
        let _sub = session.events().subscribe(move |event| {
            if let AuthEvent::SignedIn { viewer_id } = event {
                slot.store(*viewer_id as usize, Ordering::SeqCst);
            }
        });

        session
            .store_session(sample_profile(), sample_tokens())
            .unwrap();
        assert_eq!(seen_id.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn test_reload_picks_up_external_changes() {
        let dir = TempDir::new().unwrap();
        let session = SessionStore::with_dir(dir.path());
        assert!(session.viewer_id().is_none());

        config::save_json_file(&dir.path().join(PROFILE_FILE), &sample_profile()).unwrap();
        session.reload().unwrap();
        assert_eq!(session.viewer_id(), Some(42));
    }
}
