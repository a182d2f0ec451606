use inotebook_core::db::open_db_in_memory;
use inotebook_core::model::account::NewAccount;
use inotebook_core::model::image::MAX_IMAGE_BYTES;
use inotebook_core::{
    AccountId, AccountRepository, Epoch, ErrorCode, FsBlobStore, ImageService, ImageUpload,
    SqliteAccountRepository, SqliteImageRepository,
};
use rusqlite::Connection;
use std::path::PathBuf;
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:4000/uploads";

fn create_account(conn: &Connection, email: &str) -> AccountId {
    let repo = SqliteAccountRepository::try_new(conn).unwrap();
    let account = NewAccount {
        id: Uuid::new_v4(),
        user_name: "Owner".to_string(),
        email: email.to_string(),
        password_hash: "not-a-real-hash".to_string(),
        phone: "5551234567".to_string(),
        epoch: Epoch::from_millis(1),
    };
    repo.create_account(&account, 1).unwrap().id
}

fn png(name: &str, len: usize) -> ImageUpload {
    ImageUpload {
        file_name: name.to_string(),
        content_type: "image/png".to_string(),
        bytes: vec![0x89; len],
    }
}

fn blob_path(store: &FsBlobStore, url: &str) -> PathBuf {
    store.root().join(url.rsplit('/').next().unwrap())
}

#[test]
fn upload_fetch_and_delete_round_trip() {
    let conn = open_db_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let store = FsBlobStore::open(dir.path(), BASE_URL).unwrap();
    let owner = create_account(&conn, "owner@example.com");
    let service = ImageService::new(SqliteImageRepository::try_new(&conn).unwrap(), &store);

    let image = service.upload(owner, &png("me.png", 16)).unwrap();
    assert!(image.image_url.starts_with(BASE_URL));
    assert!(image.image_url.ends_with("me.png"));
    assert_eq!(std::fs::read(blob_path(&store, &image.image_url)).unwrap().len(), 16);

    assert_eq!(service.fetch(owner).unwrap().id, image.id);

    service.delete(owner, image.id).unwrap();
    assert!(!blob_path(&store, &image.image_url).exists());
    assert_eq!(service.fetch(owner).unwrap_err().code(), ErrorCode::NotFound);
}

#[test]
fn fetch_returns_the_earliest_image() {
    let conn = open_db_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let store = FsBlobStore::open(dir.path(), BASE_URL).unwrap();
    let owner = create_account(&conn, "owner@example.com");
    let service = ImageService::new(SqliteImageRepository::try_new(&conn).unwrap(), &store);

    let first = service.upload(owner, &png("first.png", 4)).unwrap();
    service.upload(owner, &png("second.png", 4)).unwrap();

    assert_eq!(service.fetch(owner).unwrap().id, first.id);
}

#[test]
fn upload_rejects_wrong_type_and_oversized_files() {
    let conn = open_db_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let store = FsBlobStore::open(dir.path(), BASE_URL).unwrap();
    let owner = create_account(&conn, "owner@example.com");
    let service = ImageService::new(SqliteImageRepository::try_new(&conn).unwrap(), &store);

    let gif = ImageUpload {
        content_type: "image/gif".to_string(),
        ..png("anim.gif", 4)
    };
    assert_eq!(service.upload(owner, &gif).unwrap_err().code(), ErrorCode::Validation);

    let huge = png("huge.png", MAX_IMAGE_BYTES + 1);
    assert_eq!(
        service.upload(owner, &huge).unwrap_err().code(),
        ErrorCode::PayloadTooLarge
    );

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn jpg_alias_is_accepted() {
    let conn = open_db_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let store = FsBlobStore::open(dir.path(), BASE_URL).unwrap();
    let owner = create_account(&conn, "owner@example.com");
    let service = ImageService::new(SqliteImageRepository::try_new(&conn).unwrap(), &store);

    let jpg = ImageUpload {
        content_type: "image/jpg".to_string(),
        ..png("photo.jpg", 4)
    };
    assert!(service.upload(owner, &jpg).is_ok());
}

#[test]
fn delete_by_another_account_is_not_found_and_keeps_the_file() {
    let conn = open_db_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let store = FsBlobStore::open(dir.path(), BASE_URL).unwrap();
    let owner = create_account(&conn, "owner@example.com");
    let intruder = create_account(&conn, "intruder@example.com");
    let service = ImageService::new(SqliteImageRepository::try_new(&conn).unwrap(), &store);

    let image = service.upload(owner, &png("me.png", 4)).unwrap();
    assert_eq!(
        service.delete(intruder, image.id).unwrap_err().code(),
        ErrorCode::NotFound
    );
    assert!(blob_path(&store, &image.image_url).exists());
    assert_eq!(service.fetch(owner).unwrap().id, image.id);
}

#[test]
fn failed_blob_removal_keeps_the_record() {
    let conn = open_db_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let store = FsBlobStore::open(dir.path(), BASE_URL).unwrap();
    let owner = create_account(&conn, "owner@example.com");
    let service = ImageService::new(SqliteImageRepository::try_new(&conn).unwrap(), &store);

    let image = service.upload(owner, &png("me.png", 4)).unwrap();
    std::fs::remove_file(blob_path(&store, &image.image_url)).unwrap();

    let err = service.delete(owner, image.id).unwrap_err();
    assert_eq!(err.code(), ErrorCode::StorageFailure);
    assert_eq!(service.fetch(owner).unwrap().id, image.id);
}

#[test]
fn configured_limit_is_enforced() {
    let conn = open_db_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let store = FsBlobStore::open(dir.path(), BASE_URL).unwrap();
    let owner = create_account(&conn, "owner@example.com");
    let service = ImageService::new(SqliteImageRepository::try_new(&conn).unwrap(), &store)
        .with_max_bytes(8);

    assert!(service.upload(owner, &png("small.png", 8)).is_ok());
    assert_eq!(
        service.upload(owner, &png("big.png", 9)).unwrap_err().code(),
        ErrorCode::PayloadTooLarge
    );
}

#[test]
fn discard_blobs_removes_files_of_listed_images() {
    let conn = open_db_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let store = FsBlobStore::open(dir.path(), BASE_URL).unwrap();
    let owner = create_account(&conn, "owner@example.com");
    let service = ImageService::new(SqliteImageRepository::try_new(&conn).unwrap(), &store);

    service.upload(owner, &png("a.png", 4)).unwrap();
    service.upload(owner, &png("b.png", 4)).unwrap();
    let stored = service.list(owner).unwrap();
    assert_eq!(stored.len(), 2);

    std::fs::remove_file(blob_path(&store, &stored[0].image_url)).unwrap();
    assert_eq!(service.discard_blobs(&stored), 1);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
