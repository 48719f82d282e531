use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use sha2::Digest as _;

use crate::{
    config::slot::ImageId,
    foundation::error::{StardreamError, StardreamResult},
};

/// Metadata recorded alongside every stored image.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMeta {
    /// Byte length of the stored blob.
    pub size: u64,
    pub original_name: String,
    /// Unix time in milliseconds at import.
    pub timestamp: u64,
}

/// Blob store for imported images, keyed by opaque [`ImageId`]s.
///
/// Implementations must be shareable across threads: texture resolution reads from the store in
/// parallel.
pub trait ImageStore: Send + Sync {
    /// Store `bytes` and return their id. Saving identical bytes again returns the same id.
    fn save(&mut self, bytes: &[u8], original_name: &str) -> StardreamResult<ImageId>;
    fn load(&self, id: &ImageId) -> StardreamResult<Option<Vec<u8>>>;
    /// All stored ids, sorted.
    fn list(&self) -> StardreamResult<Vec<ImageId>>;
    /// Returns `false` when the id was not present.
    fn delete(&mut self, id: &ImageId) -> StardreamResult<bool>;
    fn metadata(&self, id: &ImageId) -> StardreamResult<Option<ImageMeta>>;
}

/// Content-addressed id: lowercase hex SHA-256 of the bytes.
pub fn content_id(bytes: &[u8]) -> ImageId {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    ImageId(out)
}

fn is_content_id(id: &ImageId) -> bool {
    id.as_str().len() == 64
        && id
            .as_str()
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// In-memory image store.
#[derive(Debug, Default)]
pub struct MemoryImageStore {
    entries: BTreeMap<ImageId, (Vec<u8>, ImageMeta)>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert bytes under a caller-chosen id, bypassing content addressing.
    pub fn insert(&mut self, id: impl Into<String>, bytes: Vec<u8>) -> ImageId {
        let id = ImageId::new(id);
        let meta = ImageMeta {
            size: bytes.len() as u64,
            original_name: id.to_string(),
            timestamp: now_millis(),
        };
        self.entries.insert(id.clone(), (bytes, meta));
        id
    }
}

impl ImageStore for MemoryImageStore {
    fn save(&mut self, bytes: &[u8], original_name: &str) -> StardreamResult<ImageId> {
        let id = content_id(bytes);
        let meta = ImageMeta {
            size: bytes.len() as u64,
            original_name: original_name.to_string(),
            timestamp: now_millis(),
        };
        self.entries
            .entry(id.clone())
            .or_insert_with(|| (bytes.to_vec(), meta));
        Ok(id)
    }

    fn load(&self, id: &ImageId) -> StardreamResult<Option<Vec<u8>>> {
        Ok(self.entries.get(id).map(|(b, _)| b.clone()))
    }

    fn list(&self) -> StardreamResult<Vec<ImageId>> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn delete(&mut self, id: &ImageId) -> StardreamResult<bool> {
        Ok(self.entries.remove(id).is_some())
    }

    fn metadata(&self, id: &ImageId) -> StardreamResult<Option<ImageMeta>> {
        Ok(self.entries.get(id).map(|(_, m)| m.clone()))
    }
}

/// Directory-backed image store: `<id>.img` blobs with `<id>.json` metadata sidecars.
#[derive(Debug, Clone)]
pub struct DirImageStore {
    root: PathBuf,
}

impl DirImageStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StardreamResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("create image store dir '{}'", root.display()))
            .map_err(persistence)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, id: &ImageId) -> PathBuf {
        self.root.join(format!("{id}.img"))
    }

    fn meta_path(&self, id: &ImageId) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }
}

fn persistence(e: anyhow::Error) -> StardreamError {
    StardreamError::persistence(format!("{e:#}"))
}

fn read_optional(path: &Path) -> StardreamResult<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(b) => Ok(Some(b)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StardreamError::persistence(format!(
            "read '{}': {e}",
            path.display()
        ))),
    }
}

impl ImageStore for DirImageStore {
    fn save(&mut self, bytes: &[u8], original_name: &str) -> StardreamResult<ImageId> {
        let id = content_id(bytes);
        let blob = self.blob_path(&id);
        if blob.exists() {
            tracing::debug!(%id, "image already stored");
            return Ok(id);
        }
        let meta = ImageMeta {
            size: bytes.len() as u64,
            original_name: original_name.to_string(),
            timestamp: now_millis(),
        };
        let meta_json = serde_json::to_vec_pretty(&meta)
            .map_err(|e| StardreamError::persistence(format!("serialize image metadata: {e}")))?;
        std::fs::write(self.meta_path(&id), meta_json)
            .with_context(|| format!("write metadata for {id}"))
            .map_err(persistence)?;
        std::fs::write(&blob, bytes)
            .with_context(|| format!("write '{}'", blob.display()))
            .map_err(persistence)?;
        tracing::info!(%id, name = original_name, bytes = bytes.len(), "stored image");
        Ok(id)
    }

    fn load(&self, id: &ImageId) -> StardreamResult<Option<Vec<u8>>> {
        if !is_content_id(id) {
            return Ok(None);
        }
        read_optional(&self.blob_path(id))
    }

    fn list(&self) -> StardreamResult<Vec<ImageId>> {
        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("list '{}'", self.root.display()))
            .map_err(persistence)?;
        let mut ids = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("list '{}'", self.root.display()))
                .map_err(persistence)?
                .path();
            if path.extension().is_some_and(|e| e == "img")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                let id = ImageId::new(stem);
                if is_content_id(&id) {
                    ids.push(id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn delete(&mut self, id: &ImageId) -> StardreamResult<bool> {
        if !is_content_id(id) {
            return Ok(false);
        }
        let blob = self.blob_path(id);
        let existed = match std::fs::remove_file(&blob) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                return Err(StardreamError::persistence(format!(
                    "remove '{}': {e}",
                    blob.display()
                )));
            }
        };
        std::fs::remove_file(self.meta_path(id)).ok();
        Ok(existed)
    }

    fn metadata(&self, id: &ImageId) -> StardreamResult<Option<ImageMeta>> {
        if !is_content_id(id) {
            return Ok(None);
        }
        let Some(bytes) = read_optional(&self.meta_path(id))? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            StardreamError::persistence(format!("parse metadata for {id}: {e}"))
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
