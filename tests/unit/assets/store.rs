use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "stardream_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

#[test]
fn content_id_is_sha256_hex() {
    let id = content_id(b"abc");
    assert_eq!(
        id.as_str(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    assert!(is_content_id(&id));
    assert!(!is_content_id(&ImageId::new("../etc/passwd")));
}

#[test]
fn memory_store_dedups_and_tracks_metadata() {
    let mut store = MemoryImageStore::new();
    let a = store.save(b"one", "one.png").unwrap();
    let b = store.save(b"one", "again.png").unwrap();
    assert_eq!(a, b);
    assert_eq!(store.list().unwrap(), vec![a.clone()]);

    let meta = store.metadata(&a).unwrap().unwrap();
    assert_eq!(meta.size, 3);
    assert_eq!(meta.original_name, "one.png");
    assert_eq!(store.load(&a).unwrap().as_deref(), Some(&b"one"[..]));

    assert!(store.delete(&a).unwrap());
    assert!(!store.delete(&a).unwrap());
    assert!(store.load(&a).unwrap().is_none());
}

#[test]
fn memory_store_insert_uses_given_id() {
    let mut store = MemoryImageStore::new();
    let id = store.insert("imgA", vec![1, 2, 3]);
    assert_eq!(id.as_str(), "imgA");
    assert_eq!(store.load(&id).unwrap(), Some(vec![1, 2, 3]));
}

#[test]
fn image_meta_serializes_camel_case() {
    let meta = ImageMeta {
        size: 10,
        original_name: "x.png".to_string(),
        timestamp: 5,
    };
    let v = serde_json::to_value(&meta).unwrap();
    assert_eq!(v["originalName"], "x.png");
    assert_eq!(v["size"], 10);
    assert_eq!(v["timestamp"], 5);
}

#[test]
fn dir_store_persists_blobs_and_sidecars() {
    let dir = temp_dir("dir_image_store");
    let mut store = DirImageStore::open(&dir).unwrap();
    let id = store.save(b"pixels", "photo.jpg").unwrap();
    assert!(dir.join(format!("{id}.img")).exists());
    assert!(dir.join(format!("{id}.json")).exists());

    let reopened = DirImageStore::open(&dir).unwrap();
    assert_eq!(reopened.list().unwrap(), vec![id.clone()]);
    assert_eq!(reopened.load(&id).unwrap(), Some(b"pixels".to_vec()));
    assert_eq!(
        reopened.metadata(&id).unwrap().unwrap().original_name,
        "photo.jpg"
    );
    assert!(reopened.load(&ImageId::new("missing")).unwrap().is_none());

    assert!(store.delete(&id).unwrap());
    assert!(store.list().unwrap().is_empty());
    assert!(store.metadata(&id).unwrap().is_none());

    std::fs::remove_dir_all(&dir).ok();
}
