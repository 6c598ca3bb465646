use std::sync::Arc;

use ::common::storage::{
    BlobBackend, MediaStore, MemoryTextBackend, RawBlobBackend, StorageError, storage_key,
};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use uuid::Uuid;

use crate::common::{MAX_UPLOAD_SIZE, TestApp, routes};

const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0xFF];

mod upload {
    use super::*;

    #[tokio::test]
    async fn photo_upload_get_delete_round_trip() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app.upload_media("photo.png", PNG_BYTES.to_vec(), &token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let id = res.id();
        assert_eq!(res.body["fileId"].as_str().unwrap(), format!("{id}-photo.png"));
        assert!(Uuid::parse_str(&id).is_ok());

        let got = app.get_bytes_with_token(&routes::media(&id), &token).await;
        assert_eq!(got.status, 200);
        assert_eq!(got.content_type.as_deref(), Some("application/octet-stream"));
        assert_eq!(got.bytes, PNG_BYTES);

        let del = app.delete_with_token(&routes::media(&id), &token).await;
        assert_eq!(del.status, 204, "{}", del.text);

        let gone = app.get_with_token(&routes::media(&id), &token).await;
        assert_eq!(gone.status, 404);
        assert_eq!(gone.body["code"], "NOT_FOUND");
        assert_eq!(app.media_count().await, 0);
        assert!(app.blobs().is_empty());
    }

    #[tokio::test]
    async fn raw_backend_receives_bytes_under_storage_key() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app.upload_media("photo.png", PNG_BYTES.to_vec(), &token).await;
        assert_eq!(res.status, 200);

        let id = Uuid::parse_str(&res.id()).unwrap();
        assert_eq!(app.blobs().calls().puts(), 1);
        assert!(app.blobs().contains(&storage_key(&id, "photo.png")));
    }

    #[tokio::test]
    async fn missing_file_field_is_rejected_before_storage() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let form = reqwest::multipart::Form::new().text("note", "no file here");
        let res = app.send_form(routes::MEDIA, form, &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(app.blobs().calls().puts(), 0);
        assert_eq!(app.media_count().await, 0);
    }

    #[tokio::test]
    async fn same_filename_twice_gets_distinct_keys() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let first = app.upload_media("log.txt", b"first".to_vec(), &token).await;
        let second = app.upload_media("log.txt", b"second".to_vec(), &token).await;
        assert_eq!(first.status, 200);
        assert_eq!(second.status, 200);
        assert_ne!(first.id(), second.id());
        assert_ne!(first.body["fileId"], second.body["fileId"]);

        let a = app.get_bytes_with_token(&routes::media(&first.id()), &token).await;
        let b = app.get_bytes_with_token(&routes::media(&second.id()), &token).await;
        assert_eq!(a.bytes, b"first");
        assert_eq!(b.bytes, b"second");
    }

    #[tokio::test]
    async fn empty_file_round_trips() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app.upload_media("empty.bin", Vec::new(), &token).await;
        assert_eq!(res.status, 200);

        let got = app.get_bytes_with_token(&routes::media(&res.id()), &token).await;
        assert_eq!(got.status, 200);
        assert!(got.bytes.is_empty());
    }

    #[tokio::test]
    async fn hidden_filename_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app.upload_media(".env", b"SECRET=1".to_vec(), &token).await;
        assert_eq!(res.status, 400);
        assert_eq!(app.blobs().calls().puts(), 0);
    }

    #[tokio::test]
    async fn oversized_file_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let data = vec![7u8; MAX_UPLOAD_SIZE as usize + 1];
        let res = app.upload_media("big.bin", data, &token).await;
        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(app.media_count().await, 0);
        assert_eq!(app.blobs().calls().puts(), 0);
    }

    #[tokio::test]
    async fn upload_requires_token() {
        let app = TestApp::spawn().await;

        let part = reqwest::multipart::Part::bytes(PNG_BYTES.to_vec()).file_name("photo.png");
        let res = app
            .client
            .post(format!("http://{}{}", app.addr, routes::MEDIA))
            .multipart(reqwest::multipart::Form::new().part("file", part))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 401);
    }
}

mod not_found {
    use super::*;

    #[tokio::test]
    async fn unknown_id_is_404_for_get_and_delete() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let id = Uuid::new_v4().to_string();

        let get = app.get_with_token(&routes::media(&id), &token).await;
        let del = app.delete_with_token(&routes::media(&id), &token).await;
        assert_eq!(get.status, 404);
        assert_eq!(del.status, 404);
        assert_eq!(app.blobs().calls().gets(), 0);
        assert_eq!(app.blobs().calls().removes(), 0);
    }

    #[tokio::test]
    async fn malformed_id_is_404() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app.get_with_token(&routes::media("not-a-uuid"), &token).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn record_without_blob_is_404() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app.upload_media("photo.png", PNG_BYTES.to_vec(), &token).await;
        let key = res.body["fileId"].as_str().unwrap().to_string();
        app.blobs().remove(&key).await.unwrap();

        let got = app.get_with_token(&routes::media(&res.id()), &token).await;
        assert_eq!(got.status, 404);
    }
}

mod text_backend {
    use super::*;

    #[tokio::test]
    async fn payloads_are_base64_encoded_and_decoded() {
        let backend = Arc::new(MemoryTextBackend::new());
        let app = TestApp::spawn_with_media(MediaStore::text(backend.clone())).await;
        let token = app.admin_token().await;

        let res = app.upload_media("photo.png", PNG_BYTES.to_vec(), &token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let key = res.body["fileId"].as_str().unwrap();

        assert_eq!(backend.stored_text(key).unwrap(), STANDARD.encode(PNG_BYTES));

        let got = app.get_bytes_with_token(&routes::media(&res.id()), &token).await;
        assert_eq!(got.bytes, PNG_BYTES);

        let del = app.delete_with_token(&routes::media(&res.id()), &token).await;
        assert_eq!(del.status, 204);
        assert!(backend.stored_text(key).is_none());
    }
}

mod filesystem {
    use ::common::storage::StorageConfig;
    use server::utils::filename::MAX_FILENAME_LEN;

    use super::*;

    async fn spawn_on(dir: &std::path::Path) -> TestApp {
        let config = StorageConfig {
            kind: Some("filesystem".into()),
            filesystem: ::common::storage::FilesystemConfig {
                path: dir.to_path_buf(),
            },
            ..Default::default()
        };
        let store = MediaStore::from_config(&config).await.unwrap();
        TestApp::spawn_with_media(store).await
    }

    #[tokio::test]
    async fn blob_lands_on_disk_and_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let app = spawn_on(dir.path()).await;
        let token = app.admin_token().await;

        let res = app.upload_media("photo.png", PNG_BYTES.to_vec(), &token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let key = res.body["fileId"].as_str().unwrap().to_string();
        assert_eq!(std::fs::read(dir.path().join(&key)).unwrap(), PNG_BYTES);

        let got = app.get_bytes_with_token(&routes::media(&res.id()), &token).await;
        assert_eq!(got.bytes, PNG_BYTES);

        let del = app.delete_with_token(&routes::media(&res.id()), &token).await;
        assert_eq!(del.status, 204);
        assert!(!dir.path().join(&key).exists());
    }

    #[tokio::test]
    async fn longest_accepted_filename_is_stored() {
        let dir = tempfile::tempdir().unwrap();
        let app = spawn_on(dir.path()).await;
        let token = app.admin_token().await;

        let longest = format!("{}.png", "x".repeat(MAX_FILENAME_LEN - 4));
        let res = app.upload_media(&longest, PNG_BYTES.to_vec(), &token).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let too_long = format!("{}.png", "x".repeat(MAX_FILENAME_LEN - 3));
        let res = app.upload_media(&too_long, PNG_BYTES.to_vec(), &token).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(app.media_count().await, 1);
    }
}

/// Stores bytes but refuses every removal.
#[derive(Default)]
struct UndeletableBackend {
    inner: ::common::storage::MemoryBlobBackend,
}

#[async_trait]
impl BlobBackend for UndeletableBackend {
    fn name(&self) -> &'static str {
        "undeletable"
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Backend {
            backend: "undeletable",
            message: "access denied".into(),
        })
    }
}

#[async_trait]
impl RawBlobBackend for UndeletableBackend {
    async fn put_raw(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.inner.put_raw(key, data).await
    }

    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.inner.get_raw(key).await
    }
}

#[tokio::test]
async fn failed_blob_delete_still_removes_record() {
    let backend = Arc::new(UndeletableBackend::default());
    let app = TestApp::spawn_with_media(MediaStore::raw(backend.clone())).await;
    let token = app.admin_token().await;

    let res = app.upload_media("photo.png", PNG_BYTES.to_vec(), &token).await;
    let del = app.delete_with_token(&routes::media(&res.id()), &token).await;
    assert_eq!(del.status, 500);
    assert_eq!(del.body["code"], "INTERNAL_ERROR");

    assert_eq!(app.media_count().await, 0);
    assert_eq!(backend.inner.len(), 1);
    let got = app.get_bytes_with_token(&routes::media(&res.id()), &token).await;
    assert_eq!(got.status, 404);
}
