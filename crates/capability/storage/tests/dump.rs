use lora_storage::{FileDumpStore, RawPayloadStore, StorageError};

#[tokio::test]
async fn dump_writes_body_to_folder() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileDumpStore::new(dir.path());

    let location = store.persist(b"{\"fCnt\": 1}").await.expect("persist");
    assert!(location.ends_with(".dump"));
    let written = tokio::fs::read(&location).await.expect("read back");
    assert_eq!(written, b"{\"fCnt\": 1}");
}

#[tokio::test]
async fn dump_never_overwrites_previous_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileDumpStore::new(dir.path());

    let mut locations = Vec::new();
    for index in 0..5 {
        let body = format!("body-{}", index);
        locations.push(store.persist(body.as_bytes()).await.expect("persist"));
    }
    let mut unique = locations.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 5);

    for (index, location) in locations.iter().enumerate() {
        let written = tokio::fs::read_to_string(location).await.expect("read back");
        assert_eq!(written, format!("body-{}", index));
    }
}

#[tokio::test]
async fn dump_into_missing_folder_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileDumpStore::new(dir.path().join("missing"));
    let err = store.persist(b"x").await.expect_err("missing folder");
    assert!(matches!(err, StorageError::Io(ref io) if io.kind() == std::io::ErrorKind::NotFound));
    assert!(err.to_string().starts_with("io error: "));
}
