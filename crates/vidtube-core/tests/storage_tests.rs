use vidtube_core::storage::{store_upload, LocalStorage, StorageBackend, UploadPart};

fn temp_storage() -> LocalStorage {
    LocalStorage::new(std::env::temp_dir().join(format!("vidtube-storage-{}", uuid::Uuid::new_v4())))
}

#[tokio::test]
async fn test_local_store_exists_delete() {
    let storage = temp_storage();

    let media = storage
        .store("Clip.MP4", "video/mp4", b"not really a video")
        .await
        .unwrap();
    assert!(media.key.ends_with(".mp4"));
    assert_eq!(media.url, format!("/media/{}", media.key));
    assert_eq!(media.content_type, "video/mp4");
    assert_eq!(media.size, 18);

    let on_disk = tokio::fs::read(storage.upload_dir.join(&media.key)).await.unwrap();
    assert_eq!(on_disk, b"not really a video");
    assert!(storage.exists(&media.key).await.unwrap());

    storage.delete(&media.key).await.unwrap();
    assert!(!storage.exists(&media.key).await.unwrap());
}

#[tokio::test]
async fn test_deleting_missing_file_is_ok() {
    let storage = temp_storage();
    storage.ensure_dir().await.unwrap();

    storage.delete("never-stored.png").await.unwrap();
}

#[tokio::test]
async fn test_same_filename_gets_distinct_keys() {
    let storage = temp_storage();

    let a = storage.store("avatar.png", "image/png", b"a").await.unwrap();
    let b = storage.store("avatar.png", "image/png", b"b").await.unwrap();

    assert_ne!(a.key, b.key);
}

#[tokio::test]
async fn test_traversal_keys_are_rejected() {
    let storage = temp_storage();

    assert!(storage.delete("../etc/passwd").await.is_err());
    assert!(storage.exists("a/b.png").await.is_err());
}

#[tokio::test]
async fn test_store_upload_checks_media_family() {
    let storage = temp_storage();
    let part = UploadPart {
        filename: "notes.txt".to_string(),
        content_type: "text/plain".to_string(),
        data: b"hello".to_vec(),
    };

    assert!(store_upload(&storage, &part, &["image/"]).await.is_err());
    assert!(store_upload(&storage, &part, &["text/"]).await.is_ok());
}
