use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use vidtube_core::auth::{PrincipalStore, SeaPrincipalStore};
use vidtube_core::db;
use vidtube_core::migrations::Migrator;
use vidtube_core::models::user;

async fn setup() -> (DatabaseConnection, SeaPrincipalStore) {
    let conn = db::connect_url("sqlite::memory:", false).await.unwrap();
    Migrator::up(&conn, None).await.unwrap();
    (conn.clone(), SeaPrincipalStore::new(conn))
}

async fn insert_user(conn: &DatabaseConnection, username: &str) -> Uuid {
    let now = chrono::Utc::now().naive_utc();
    let id = Uuid::new_v4();
    user::ActiveModel {
        id: Set(id),
        username: Set(username.to_string()),
        email: Set(format!("{}@example.com", username)),
        fullname: Set(username.to_string()),
        avatar_url: Set("/media/a.png".to_string()),
        avatar_key: Set("a.png".to_string()),
        cover_image_url: Set(None),
        cover_image_key: Set(None),
        password_hash: Set("unused".to_string()),
        refresh_token_hash: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
    .unwrap();
    id
}

async fn stored_hash(store: &SeaPrincipalStore, id: Uuid) -> Option<String> {
    store
        .find_by_id(id)
        .await
        .unwrap()
        .unwrap()
        .refresh_token_hash
}

#[tokio::test]
async fn test_swap_replaces_matching_digest() {
    let (conn, store) = setup().await;
    let id = insert_user(&conn, "alice").await;
    assert!(store.set_refresh_token_hash(id, Some("first")).await.unwrap());

    assert!(store.swap_refresh_token_hash(id, "first", "second").await.unwrap());
    assert_eq!(stored_hash(&store, id).await.as_deref(), Some("second"));
}

#[tokio::test]
async fn test_swap_with_stale_digest_changes_nothing() {
    let (conn, store) = setup().await;
    let id = insert_user(&conn, "alice").await;
    store.set_refresh_token_hash(id, Some("first")).await.unwrap();
    store
        .swap_refresh_token_hash(id, "first", "second")
        .await
        .unwrap();

    // A second caller still holding "first" loses the race.
    let swapped = store
        .swap_refresh_token_hash(id, "first", "third")
        .await
        .unwrap();

    assert!(!swapped);
    assert_eq!(stored_hash(&store, id).await.as_deref(), Some("second"));
}

#[tokio::test]
async fn test_swap_after_clear_fails() {
    let (conn, store) = setup().await;
    let id = insert_user(&conn, "alice").await;
    store.set_refresh_token_hash(id, Some("first")).await.unwrap();
    store.set_refresh_token_hash(id, None).await.unwrap();

    assert!(!store.swap_refresh_token_hash(id, "first", "second").await.unwrap());
    assert_eq!(stored_hash(&store, id).await, None);
}

#[tokio::test]
async fn test_swap_only_touches_its_own_row() {
    let (conn, store) = setup().await;
    let alice = insert_user(&conn, "alice").await;
    let bob = insert_user(&conn, "bob").await;
    store.set_refresh_token_hash(alice, Some("same")).await.unwrap();
    store.set_refresh_token_hash(bob, Some("same")).await.unwrap();

    assert!(store.swap_refresh_token_hash(alice, "same", "next").await.unwrap());
    assert_eq!(stored_hash(&store, bob).await.as_deref(), Some("same"));
}

#[tokio::test]
async fn test_writes_to_unknown_principal_report_false() {
    let (_conn, store) = setup().await;
    let ghost = Uuid::new_v4();

    assert!(!store.set_refresh_token_hash(ghost, Some("x")).await.unwrap());
    assert!(!store.swap_refresh_token_hash(ghost, "x", "y").await.unwrap());
}

#[tokio::test]
async fn test_lookup_by_username_or_email_ignores_case() {
    let (conn, store) = setup().await;
    let id = insert_user(&conn, "alice").await;

    let by_name = store.find_by_username_or_email(" ALICE ").await.unwrap();
    let by_email = store
        .find_by_username_or_email("Alice@Example.com")
        .await
        .unwrap();

    assert_eq!(by_name.map(|u| u.id), Some(id));
    assert_eq!(by_email.map(|u| u.id), Some(id));
}
