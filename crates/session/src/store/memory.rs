// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{CredentialKey, CredentialStore};

/// In-process store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<CredentialKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    async fn get(&self, key: CredentialKey) -> Option<String> {
        self.entries.read().await.get(&key).filter(|v| !v.is_empty()).cloned()
    }

    async fn set(&self, key: CredentialKey, value: &str) -> anyhow::Result<()> {
        self.entries.write().await.insert(key, value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: CredentialKey) -> anyhow::Result<()> {
        self.entries.write().await.remove(&key);
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        let mut entries = self.entries.write().await;
        for key in CredentialKey::ALL {
            entries.remove(&key);
        }
        Ok(())
    }

    async fn set_many(&self, pairs: &[(CredentialKey, &str)]) -> anyhow::Result<()> {
        let mut entries = self.entries.write().await;
        for (key, value) in pairs {
            entries.insert(*key, (*value).to_owned());
        }
        Ok(())
    }
}
