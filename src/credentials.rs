//! Durable storage for the session token and UI language.
//!
//! Both values live as single-line files under the configured state
//! directory, written atomically (temp file + fsync + rename) so that a
//! crash mid-write never leaves a truncated token behind. A store that
//! cannot be read is reported as empty rather than failing the caller:
//! the worst outcome of lost credentials is a fresh login.

use crate::types::Language;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{debug, warn};

const TOKEN_FILE: &str = "token";
const LANGUAGE_FILE: &str = "language";

/// Credential store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Other(String),
}

/// Atomically write data to a file using write-to-temp + fsync + rename.
async fn atomic_write(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    let parent = path
        .parent()
        .ok_or_else(|| StoreError::Other("Cannot atomic-write to a path with no parent".into()))?
        .to_path_buf();
    let path = path.to_path_buf();
    let data = data.to_vec();

    tokio::task::spawn_blocking(move || {
        let mut tmp = NamedTempFile::new_in(&parent)?;
        tmp.write_all(&data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| StoreError::Other(format!("spawn_blocking join failed: {}", e)))?
}

/// File-backed store for the bearer token and language preference.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    dir: PathBuf,
}

impl CredentialStore {
    /// Open (and create if needed) the store at the given directory.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn token_path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }

    fn language_path(&self) -> PathBuf {
        self.dir.join(LANGUAGE_FILE)
    }

    /// Read the persisted token, if any.
    ///
    /// A missing, empty, or unreadable file all mean "no stored
    /// credentials"; corruption here must never block startup.
    pub async fn load_token(&self) -> Option<String> {
        match fs::read_to_string(self.token_path()).await {
            Ok(raw) => {
                let token = raw.trim();
                if token.is_empty() {
                    None
                } else {
                    Some(token.to_string())
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(error = %e, "credential store unreadable, treating as logged out");
                None
            }
        }
    }

    /// Persist a token, replacing any previous one.
    pub async fn store_token(&self, token: &str) -> Result<(), StoreError> {
        atomic_write(&self.token_path(), token.as_bytes()).await?;
        debug!("Stored session token");
        Ok(())
    }

    /// Remove the persisted token. Idempotent.
    pub async fn clear_token(&self) -> Result<(), StoreError> {
        match fs::remove_file(self.token_path()).await {
            Ok(()) => {
                debug!("Cleared session token");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the persisted language preference, defaulting when absent
    /// or unparseable.
    pub async fn load_language(&self) -> Language {
        match fs::read_to_string(self.language_path()).await {
            Ok(raw) => match raw.trim().parse() {
                Ok(lang) => lang,
                Err(e) => {
                    warn!(error = %e, "stored language invalid, using default");
                    Language::default()
                }
            },
            Err(_) => Language::default(),
        }
    }

    /// Persist the language preference.
    pub async fn store_language(&self, lang: Language) -> Result<(), StoreError> {
        atomic_write(&self.language_path(), lang.as_str().as_bytes()).await?;
        debug!(language = %lang, "Stored language preference");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn token_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = CredentialStore::open(dir.path()).await.unwrap();
            store.store_token("abc.def.ghi").await.unwrap();
        }
        // A fresh store over the same directory sees the token.
        let store = CredentialStore::open(dir.path()).await.unwrap();
        assert_eq!(store.load_token().await.as_deref(), Some("abc.def.ghi"));
    }

    #[tokio::test]
    async fn clear_is_durable_and_idempotent() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::open(dir.path()).await.unwrap();
        store.store_token("tok").await.unwrap();
        store.clear_token().await.unwrap();
        store.clear_token().await.unwrap();

        let reopened = CredentialStore::open(dir.path()).await.unwrap();
        assert_eq!(reopened.load_token().await, None);
    }

    #[tokio::test]
    async fn missing_token_reads_as_none() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::open(dir.path()).await.unwrap();
        assert_eq!(store.load_token().await, None);
    }

    #[tokio::test]
    async fn corrupt_token_file_reads_as_none() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::open(dir.path()).await.unwrap();
        // Invalid UTF-8 makes read_to_string fail.
        std::fs::write(dir.path().join(TOKEN_FILE), [0xff, 0xfe, 0x80]).unwrap();
        assert_eq!(store.load_token().await, None);
    }

    #[tokio::test]
    async fn blank_token_file_reads_as_none() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::open(dir.path()).await.unwrap();
        std::fs::write(dir.path().join(TOKEN_FILE), "  \n").unwrap();
        assert_eq!(store.load_token().await, None);
    }

    #[tokio::test]
    async fn language_round_trips_with_default() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::open(dir.path()).await.unwrap();
        assert_eq!(store.load_language().await, Language::Ru);

        store.store_language(Language::Kz).await.unwrap();
        assert_eq!(store.load_language().await, Language::Kz);

        std::fs::write(dir.path().join(LANGUAGE_FILE), "klingon").unwrap();
        assert_eq!(store.load_language().await, Language::Ru);
    }
}
