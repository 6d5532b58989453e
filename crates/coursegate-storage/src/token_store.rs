//! High-level API for credentials and short-lived flow state.

use crate::{KeyValueStore, StorageError, StorageKeys, StorageResult, StoredEntry};
use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Which persisted token to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn key(self) -> &'static str {
        match self {
            TokenKind::Access => StorageKeys::ACCESS_TOKEN,
            TokenKind::Refresh => StorageKeys::REFRESH_TOKEN,
        }
    }
}

/// Access and refresh token as written by login or refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Persisted credentials, role hint and flow state.
///
/// Reads never fail: a broken backend reads as "absent" and is logged.
/// Writes report errors so callers can decide whether the session survives.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn KeyValueStore>,
    credential_ttl_secs: u64,
    pending_flow_ttl_secs: u64,
}

impl TokenStore {
    /// Create a token store over the given backend.
    pub fn new(backend: Arc<dyn KeyValueStore>, credential_ttl_secs: u64, pending_flow_ttl_secs: u64) -> Self {
        Self {
            backend,
            credential_ttl_secs,
            pending_flow_ttl_secs,
        }
    }

    fn credential_expiry(&self) -> StorageResult<DateTime<Utc>> {
        expiry_after(self.credential_ttl_secs)
    }

    fn pending_expiry(&self) -> StorageResult<DateTime<Utc>> {
        expiry_after(self.pending_flow_ttl_secs)
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.backend.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                tracing::warn!(key, error = %e, "Storage read failed, treating as absent");
                None
            }
        }
    }

    // ==========================================
    // Tokens
    // ==========================================

    /// Current value of a token, if any.
    pub fn get(&self, kind: TokenKind) -> Option<String> {
        self.read(kind.key())
    }

    /// Both tokens, only when both are present.
    pub fn credentials(&self) -> Option<CredentialPair> {
        Some(CredentialPair {
            access_token: self.get(TokenKind::Access)?,
            refresh_token: self.get(TokenKind::Refresh)?,
        })
    }

    /// Overwrite both tokens in a single backend write.
    pub fn set(&self, access_token: &str, refresh_token: &str) -> StorageResult<()> {
        let expires_at = Some(self.credential_expiry()?);
        self.backend.set_entries(&[
            (StorageKeys::ACCESS_TOKEN, StoredEntry::new(access_token, expires_at)),
            (StorageKeys::REFRESH_TOKEN, StoredEntry::new(refresh_token, expires_at)),
        ])?;
        tracing::debug!("Stored credential pair");
        Ok(())
    }

    /// Remove both tokens. Idempotent.
    pub fn clear(&self) -> StorageResult<()> {
        self.backend.remove(StorageKeys::ACCESS_TOKEN)?;
        self.backend.remove(StorageKeys::REFRESH_TOKEN)?;
        tracing::debug!("Cleared credential pair");
        Ok(())
    }

    // ==========================================
    // Role hint
    // ==========================================

    /// Role recorded at the last successful profile load.
    pub fn role(&self) -> Option<String> {
        self.read(StorageKeys::USER_ROLE)
    }

    pub fn set_role(&self, role: &str) -> StorageResult<()> {
        self.backend
            .set(StorageKeys::USER_ROLE, role, Some(self.credential_expiry()?))
    }

    pub fn clear_role(&self) -> StorageResult<()> {
        self.backend.remove(StorageKeys::USER_ROLE)?;
        Ok(())
    }

    // ==========================================
    // JSON values (session snapshot, pending flows)
    // ==========================================

    /// Read and decode a JSON value. Undecodable values read as absent.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.read(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "Stored value is not valid JSON");
                None
            }
        }
    }

    /// Persist a value that lives as long as the credentials.
    pub fn put_session_json<T: Serialize>(&self, key: &str, value: &T) -> StorageResult<()> {
        self.put_json(key, value, self.credential_expiry()?)
    }

    /// Persist a value that expires with the pending-flow window.
    pub fn put_pending_json<T: Serialize>(&self, key: &str, value: &T) -> StorageResult<()> {
        self.put_json(key, value, self.pending_expiry()?)
    }

    /// Persist a plain string for the pending-flow window.
    pub fn put_pending(&self, key: &str, value: &str) -> StorageResult<()> {
        self.backend
            .set(key, value, Some(self.pending_expiry()?))
    }

    /// Read a plain string value.
    pub fn get_value(&self, key: &str) -> Option<String> {
        self.read(key)
    }

    /// Expiry recorded for a key, if the key is present.
    pub fn expires_at(&self, key: &str) -> Option<DateTime<Utc>> {
        match self.backend.get_entry(key) {
            Ok(entry) => entry.and_then(|e| e.expires_at),
            Err(e) => {
                tracing::warn!(key, error = %e, "Storage read failed");
                None
            }
        }
    }

    /// Remove any key. Idempotent.
    pub fn remove(&self, key: &str) -> StorageResult<()> {
        self.backend.remove(key)?;
        Ok(())
    }

    fn put_json<T: Serialize>(&self, key: &str, value: &T, expires_at: DateTime<Utc>) -> StorageResult<()> {
        let encoded = serde_json::to_string(value).map_err(|e| StorageError::Encoding(e.to_string()))?;
        self.backend.set(key, &encoded, Some(expires_at))
    }
}

/// `now + ttl_secs`, or an error when the result is not representable.
fn expiry_after(ttl_secs: u64) -> StorageResult<DateTime<Utc>> {
    i64::try_from(ttl_secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .ok_or(StorageError::Lifetime(ttl_secs))
}
