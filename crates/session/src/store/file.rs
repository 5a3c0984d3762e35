// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential persistence: a flat JSON document rewritten atomically on every change.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use tokio::sync::Mutex;

use super::{CredentialKey, CredentialStore};

type Entries = BTreeMap<String, String>;

/// Durable store backed by `<state_dir>/credentials.json`.
///
/// The document mirrors the persisted layout one-to-one:
/// `{"accessToken": "...", "refreshToken": "...", "userId": "..."}`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<Entries>,
}

impl FileStore {
    /// Open the store at `path`, loading whatever is already there.
    ///
    /// A missing file is an empty store. An unreadable or corrupt file is
    /// logged and also treated as empty; it is replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match load(&path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %path.display(), err = %e, "ignoring unreadable credential file");
                Entries::new()
            }
        };
        Self { path, entries: Mutex::new(entries) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `mutate` to a copy of the entries, persist it, then commit.
    async fn update(&self, mutate: impl FnOnce(&mut Entries)) -> anyhow::Result<()> {
        let mut entries = self.entries.lock().await;
        let mut next = entries.clone();
        mutate(&mut next);
        save(&self.path, &next).await?;
        *entries = next;
        Ok(())
    }
}

impl CredentialStore for FileStore {
    async fn get(&self, key: CredentialKey) -> Option<String> {
        self.entries.lock().await.get(key.as_str()).filter(|v| !v.is_empty()).cloned()
    }

    async fn set(&self, key: CredentialKey, value: &str) -> anyhow::Result<()> {
        self.update(|entries| {
            entries.insert(key.as_str().to_owned(), value.to_owned());
        })
        .await
    }

    async fn remove(&self, key: CredentialKey) -> anyhow::Result<()> {
        self.update(|entries| {
            entries.remove(key.as_str());
        })
        .await
    }

    /// Forgets the credentials in this process even when the file cannot be rewritten.
    async fn clear(&self) -> anyhow::Result<()> {
        let mut entries = self.entries.lock().await;
        for key in CredentialKey::ALL {
            entries.remove(key.as_str());
        }
        save(&self.path, &entries).await
    }

    async fn set_many(&self, pairs: &[(CredentialKey, &str)]) -> anyhow::Result<()> {
        self.update(|entries| {
            for (key, value) in pairs {
                entries.insert(key.as_str().to_owned(), (*value).to_owned());
            }
        })
        .await
    }
}

fn load(path: &Path) -> anyhow::Result<Entries> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_str(&contents)?)
}

/// Save atomically (write tmp + rename).
///
/// The temp name carries PID and a counter so concurrent stores on the same
/// path never share a `.tmp` file.
async fn save(path: &Path, entries: &Entries) -> anyhow::Result<()> {
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(entries)?;
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(
        "{}.{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id(),
        seq,
    );
    let tmp_path = path.with_file_name(tmp_name);
    tokio::fs::write(&tmp_path, json).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
