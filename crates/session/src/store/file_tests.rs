// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn missing_file_is_empty_store() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = FileStore::open(dir.path().join("credentials.json"));
    assert_eq!(store.get(CredentialKey::AccessToken).await, None);
    assert!(!store.path().exists());
    Ok(())
}

#[tokio::test]
async fn values_survive_reopen() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested/state/credentials.json");

    let store = FileStore::open(&path);
    store
        .set_many(&[
            (CredentialKey::AccessToken, "a1"),
            (CredentialKey::RefreshToken, "r1"),
            (CredentialKey::UserId, "u1"),
        ])
        .await?;
    drop(store);

    let reopened = FileStore::open(&path);
    assert_eq!(reopened.get(CredentialKey::AccessToken).await.as_deref(), Some("a1"));
    assert_eq!(reopened.get(CredentialKey::RefreshToken).await.as_deref(), Some("r1"));
    assert_eq!(reopened.get(CredentialKey::UserId).await.as_deref(), Some("u1"));
    Ok(())
}

#[tokio::test]
async fn document_uses_persisted_key_names() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("credentials.json");
    let store = FileStore::open(&path);
    store.set(CredentialKey::UserId, "u-7").await?;

    let doc: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(doc["userId"], "u-7");
    Ok(())
}

#[tokio::test]
async fn clear_removes_credentials_from_disk() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("credentials.json");
    let store = FileStore::open(&path);
    store.set(CredentialKey::AccessToken, "a").await?;
    store.set(CredentialKey::UserId, "u").await?;
    store.clear().await?;

    let reopened = FileStore::open(&path);
    assert_eq!(reopened.load().await, crate::store::StoredCredentials::default());
    Ok(())
}

#[tokio::test]
async fn failed_clear_still_forgets_credentials() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let state = dir.path().join("state");
    let store = FileStore::open(state.join("credentials.json"));
    store.set(CredentialKey::AccessToken, "a").await?;
    store.set(CredentialKey::UserId, "u").await?;

    // The state directory becomes a plain file, so the rewrite cannot land.
    std::fs::remove_dir_all(&state)?;
    std::fs::write(&state, "not a directory")?;

    assert!(store.clear().await.is_err());
    assert_eq!(store.load().await, crate::store::StoredCredentials::default());
    Ok(())
}

#[tokio::test]
async fn failed_set_keeps_previous_value() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let state = dir.path().join("state");
    let store = FileStore::open(state.join("credentials.json"));
    store.set(CredentialKey::AccessToken, "a").await?;

    std::fs::remove_dir_all(&state)?;
    std::fs::write(&state, "not a directory")?;

    assert!(store.set(CredentialKey::AccessToken, "b").await.is_err());
    assert_eq!(store.get(CredentialKey::AccessToken).await.as_deref(), Some("a"));
    Ok(())
}

#[tokio::test]
async fn corrupt_file_reads_as_empty_and_is_replaced() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("credentials.json");
    std::fs::write(&path, "{not json")?;

    let store = FileStore::open(&path);
    assert_eq!(store.get(CredentialKey::AccessToken).await, None);

    store.set(CredentialKey::AccessToken, "fresh").await?;
    let reopened = FileStore::open(&path);
    assert_eq!(reopened.get(CredentialKey::AccessToken).await.as_deref(), Some("fresh"));
    Ok(())
}

#[tokio::test]
async fn no_temp_files_left_behind() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = FileStore::open(dir.path().join("credentials.json"));
    for i in 0..5 {
        store.set(CredentialKey::AccessToken, &format!("a{i}")).await?;
    }
    let names: Vec<String> = std::fs::read_dir(dir.path())?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["credentials.json".to_owned()]);
    Ok(())
}
