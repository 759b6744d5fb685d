//! Persistence of a party's public key so peers on the same host can find it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use consent_crypto::Key32;

use crate::errors::KeyStoreError;

#[async_trait]
pub trait KeyStore: Send + Sync {
    async fn write(&self, public_key: &Key32) -> Result<(), KeyStoreError>;

    async fn read(&self) -> Result<Key32, KeyStoreError>;

    /// Remove the stored key. Succeeds if nothing is stored.
    async fn clean(&self) -> Result<(), KeyStoreError>;
}

/// Stores the key as a JSON hex string in one file.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<temp dir>/consent_key32.json`
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join("consent_key32.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl KeyStore for FileKeyStore {
    async fn write(&self, public_key: &Key32) -> Result<(), KeyStoreError> {
        let body = serde_json::to_vec(public_key)
            .map_err(|e| KeyStoreError::Malformed(e.to_string()))?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&self.path).await?;
        file.write_all(&body).await?;
        file.flush().await?;
        debug!(path = %self.path.display(), "public key stored");
        Ok(())
    }

    async fn read(&self) -> Result<Key32, KeyStoreError> {
        let body = match tokio::fs::read(&self.path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(KeyStoreError::NotFound),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&body).map_err(|e| KeyStoreError::Malformed(e.to_string()))
    }

    async fn clean(&self) -> Result<(), KeyStoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "public key removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
