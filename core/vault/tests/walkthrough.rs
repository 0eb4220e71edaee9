//! End-to-end vault walkthrough against an on-disk record.

use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use strongbox_common::{Error, Passphrase};
use strongbox_storage::{LocalStore, MemoryStore, RecordStore};
use strongbox_vault::{
    AutoLockMonitor, ItemKind, LockState, MonitorConfig, NewItem, VaultController, VaultRecord,
    VaultSettings,
};

fn pass(s: &str) -> Passphrase {
    Passphrase::new(s)
}

#[tokio::test]
async fn test_create_add_reveal_lock_wrong_unlock() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("vault.json");
    let store = Arc::new(LocalStore::new(&path));

    let mut vault = VaultController::open(store.clone()).await.unwrap();
    assert_eq!(vault.state(), LockState::Uninitialized);

    // 1. create
    vault
        .create_vault(
            &pass("secret123"),
            &pass("secret123"),
            VaultSettings::without_auto_lock(),
        )
        .await
        .unwrap();
    assert_eq!(vault.state(), LockState::Unlocked);
    let record = VaultRecord::from_bytes(&store.read().await.unwrap().unwrap()).unwrap();
    assert!(record.items.is_empty());

    // 2. add
    let meta = vault
        .add_item(
            NewItem::new("Passport", ItemKind::Note, "ABC123")
                .description("")
                .tags([""]),
        )
        .await
        .unwrap();
    assert_eq!(vault.list_items().len(), 1);
    assert!(meta.tags.is_empty());

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(!raw.contains("ABC123"));
    let record = VaultRecord::from_bytes(raw.as_bytes()).unwrap();
    assert!(!record.items[0].encrypted_payload.is_empty());
    assert_ne!(record.items[0].encrypted_payload, "ABC123");

    // 3. reveal with the original session
    let revealed = vault.reveal_item(&meta.id).unwrap();
    assert_eq!(revealed.content.as_str(), Some("ABC123"));

    // 4. lock
    vault.lock();
    assert!(matches!(vault.reveal_item(&meta.id), Err(Error::VaultLocked)));
    assert_eq!(vault.list_items()[0].name, "Passport");

    // 5. wrong passphrase unlocks and reveals garbage without error
    vault.unlock(&pass("wrongpass")).await.unwrap();
    let garbled = vault.reveal_item(&meta.id).unwrap();
    assert_eq!(garbled.content.len(), "ABC123".len());
    assert_ne!(garbled.content.as_bytes(), b"ABC123");
}

#[tokio::test]
async fn test_record_survives_reopen() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(LocalStore::new(temp.path().join("vault.json")));

    let id = {
        let mut vault = VaultController::open(store.clone()).await.unwrap();
        vault
            .create_vault(&pass("secret123"), &pass("secret123"), VaultSettings::default())
            .await
            .unwrap();
        vault
            .add_item(NewItem::new("Wifi", ItemKind::Note, "hunter22").tags(["home"]))
            .await
            .unwrap()
            .id
    };

    let mut vault = VaultController::open(store).await.unwrap();
    assert_eq!(vault.state(), LockState::Locked);
    assert_eq!(vault.list_items()[0].tags.len(), 1);

    vault.unlock(&pass("secret123")).await.unwrap();
    let revealed = vault.reveal_item(&id).unwrap();
    assert_eq!(revealed.content.as_str(), Some("hunter22"));
}

#[tokio::test]
async fn test_second_instance_stale_write_rejected() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(LocalStore::new(temp.path().join("vault.json")));

    let mut first = VaultController::open(store.clone()).await.unwrap();
    first
        .create_vault(&pass("secret123"), &pass("secret123"), VaultSettings::default())
        .await
        .unwrap();
    first.lock();

    let mut second = VaultController::open(store.clone()).await.unwrap();
    second.unlock(&pass("secret123")).await.unwrap();
    first.unlock(&pass("secret123")).await.unwrap();

    second
        .add_item(NewItem::new("from second", ItemKind::Note, "2"))
        .await
        .unwrap();
    let result = first
        .add_item(NewItem::new("from first", ItemKind::Note, "1"))
        .await;

    assert!(matches!(result, Err(Error::PersistenceFailure(_))));
    assert!(first.is_dirty());

    let reopened = VaultController::open(store).await.unwrap();
    let names: Vec<_> = reopened.list_items().into_iter().map(|m| m.name).collect();
    assert_eq!(names, vec!["from second".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_auto_lock_after_idle_minute() {
    let mut vault = VaultController::open(Arc::new(MemoryStore::new()))
        .await
        .unwrap();
    vault
        .create_vault(
            &pass("secret123"),
            &pass("secret123"),
            VaultSettings::auto_lock_after(1),
        )
        .await
        .unwrap();
    vault.lock();

    // 6. unlock, idle 61 simulated seconds, next tick locks
    vault.unlock(&pass("secret123")).await.unwrap();
    let vault = vault.into_handle();
    let mut rx = vault.lock().await.subscribe();
    let monitor = AutoLockMonitor::spawn(
        vault.clone(),
        MonitorConfig {
            poll_interval: Duration::from_secs(30),
        },
    );

    tokio::time::sleep(Duration::from_secs(61)).await;
    let locked = tokio::time::timeout(
        Duration::from_secs(60),
        rx.wait_for(|s| *s == LockState::Locked),
    )
    .await
    .map(|r| r.is_ok())
    .unwrap_or(false);

    assert!(locked);
    monitor.shutdown().await;
}
