//! Key-addressed page store.
//!
//! [`LocalStore`] keeps one `<key>.json` file per page in a directory per
//! resource/media pair, plus an `_index.json` of content hashes. A put whose
//! content hash matches the indexed one leaves the stored file untouched, so
//! refetching unchanged pages does not rewrite them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::types::{MediaKind, PageBody, ResourceKind};

const INDEX_FILE: &str = "_index.json";
const VALUE_EXT: &str = "json";
const COPY_BUFFER_SIZE: usize = 8 * 1024;

/// Storage for the pages of one listing
#[async_trait::async_trait]
pub trait PageStore: Send + Sync {
    /// Consume `body` and store it under `key`, returning the bytes written
    async fn put(&self, key: &str, body: PageBody) -> Result<u64>;

    /// Open the value stored under `key`
    async fn get(&self, key: &str) -> Result<PageBody>;

    /// Whether a value is stored under `key`
    async fn contains(&self, key: &str) -> bool;

    /// All stored keys
    async fn keys(&self) -> Result<Vec<String>>;
}

/// Opens the store for a resource/media pair
#[async_trait::async_trait]
pub trait StoreProvider: Send + Sync {
    /// Open (creating if needed) the store for these coordinates
    async fn open(&self, kind: ResourceKind, media: MediaKind) -> Result<Arc<dyn PageStore>>;
}

/// Index entry for one stored value
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// SHA-256 of the stored bytes, lowercase hex
    pub hash: String,
    /// When the stored bytes last changed
    pub modified: DateTime<Utc>,
}

/// Directory-backed [`PageStore`]
pub struct LocalStore {
    dir: PathBuf,
    index: Mutex<BTreeMap<String, IndexRecord>>,
}

impl LocalStore {
    /// Open the store rooted at `dir`, creating the directory and loading its index
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;

        let index_path = dir.join(INDEX_FILE);
        let index: BTreeMap<String, IndexRecord> = match tokio::fs::read(&index_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(Error::Io(e)),
        };

        tracing::debug!(dir = %dir.display(), "Opened page store");
        Ok(Self {
            dir,
            index: Mutex::new(index),
        })
    }

    /// Directory holding the values
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Index entry for `key`, if stored
    pub async fn record(&self, key: &str) -> Option<IndexRecord> {
        self.index.lock().await.get(key).cloned()
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{VALUE_EXT}"))
    }

    /// Stream `body` into `tmp`, returning the byte count and content hash
    async fn write_temp(tmp: &Path, mut body: PageBody) -> std::io::Result<(u64, String)> {
        let mut file = tokio::fs::File::create(tmp).await?;
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; COPY_BUFFER_SIZE];
        let mut written = 0u64;

        loop {
            let n = body.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            file.write_all(&buf[..n]).await?;
            written += n as u64;
        }
        file.flush().await?;

        Ok((written, format!("{:x}", hasher.finalize())))
    }

    async fn save_index(&self, index: &BTreeMap<String, IndexRecord>) -> std::io::Result<()> {
        let bytes = serde_json::to_vec_pretty(index).map_err(std::io::Error::other)?;
        let tmp = self.dir.join(format!("{INDEX_FILE}.tmp"));
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, self.dir.join(INDEX_FILE)).await
    }

    async fn put_inner(&self, key: &str, body: PageBody) -> std::io::Result<u64> {
        let target = self.value_path(key);
        let tmp = self.dir.join(format!("{key}.{VALUE_EXT}.tmp"));

        let (written, hash) = match Self::write_temp(&tmp, body).await {
            Ok(result) => result,
            Err(e) => {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(e);
            }
        };

        let mut index = self.index.lock().await;
        let unchanged = index.get(key).is_some_and(|r| r.hash == hash)
            && tokio::fs::try_exists(&target).await.unwrap_or(false);
        if unchanged {
            tokio::fs::remove_file(&tmp).await?;
            tracing::debug!(key, "Page unchanged, keeping stored copy");
            return Ok(written);
        }

        tokio::fs::rename(&tmp, &target).await?;
        index.insert(
            key.to_string(),
            IndexRecord {
                hash,
                modified: Utc::now(),
            },
        );
        self.save_index(&index).await?;
        Ok(written)
    }
}

/// Keys become file names, so they must be plain names
fn check_key(key: &str) -> std::io::Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with(['.', '_'])
        && !key.contains(['/', '\\'])
        && key != INDEX_FILE;
    if valid {
        Ok(())
    } else {
        Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid store key {key:?}"),
        ))
    }
}

#[async_trait::async_trait]
impl PageStore for LocalStore {
    async fn put(&self, key: &str, body: PageBody) -> Result<u64> {
        let result = match check_key(key) {
            Ok(()) => self.put_inner(key, body).await,
            Err(e) => Err(e),
        };
        result.map_err(|source| Error::StoreWrite {
            key: key.to_string(),
            source,
        })
    }

    async fn get(&self, key: &str) -> Result<PageBody> {
        let opened = match check_key(key) {
            Ok(()) => tokio::fs::File::open(self.value_path(key)).await,
            Err(e) => Err(e),
        };
        match opened {
            Ok(file) => Ok(Box::pin(file)),
            Err(source) => Err(Error::StoreRead {
                key: key.to_string(),
                source,
            }),
        }
    }

    async fn contains(&self, key: &str) -> bool {
        self.index.lock().await.contains_key(key)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.index.lock().await.keys().cloned().collect())
    }
}

/// Opens a [`LocalStore`] at `<root>/<resource-kind>/<media-kind>`
#[derive(Clone, Debug)]
pub struct LocalStoreProvider {
    root: PathBuf,
}

impl LocalStoreProvider {
    /// Provider rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory used for a resource/media pair
    pub fn dir_for(&self, kind: ResourceKind, media: MediaKind) -> PathBuf {
        self.root.join(kind.as_str()).join(media.as_str())
    }
}

#[async_trait::async_trait]
impl StoreProvider for LocalStoreProvider {
    async fn open(&self, kind: ResourceKind, media: MediaKind) -> Result<Arc<dyn PageStore>> {
        let store = LocalStore::open(self.dir_for(kind, media)).await?;
        Ok(Arc::new(store))
    }
}
