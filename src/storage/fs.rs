//! Filesystem-backed object store for local and debug runs.
//!
//! Layout: `{root}/{container}/{key}`. Metadata is written next to the
//! object as `{key}.metadata.json`.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::error::StorageError;
use crate::pipeline::types::ObjectRef;
use crate::storage::{ObjectMetadata, ObjectStore};

/// Suffix of the metadata sidecar file.
const METADATA_SUFFIX: &str = ".metadata.json";

/// Object store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an object reference to a path under the root.
    ///
    /// Rejects keys that would escape the container directory.
    pub fn resolve(&self, object: &ObjectRef) -> Result<PathBuf, StorageError> {
        let relative = Path::new(&object.key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if object.key.is_empty() || escapes || object.container.contains(['/', '\\']) {
            return Err(invalid_key(object));
        }
        Ok(self.root.join(&object.container).join(relative))
    }

    /// Path of the metadata sidecar for an object.
    pub fn metadata_path(&self, object: &ObjectRef) -> Result<PathBuf, StorageError> {
        let mut path = self.resolve(object)?.into_os_string();
        path.push(METADATA_SUFFIX);
        Ok(PathBuf::from(path))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn get_object(&self, object: &ObjectRef) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(object)?;
        fs::read(&path).await.map_err(|e| not_found_or_io(object, e))
    }

    async fn copy_object(
        &self,
        source: &ObjectRef,
        dest: &ObjectRef,
        metadata: &ObjectMetadata,
    ) -> Result<(), StorageError> {
        let from = self.resolve(source)?;
        let to = self.resolve(dest)?;

        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(&from, &to)
            .await
            .map_err(|e| not_found_or_io(source, e))?;

        if !metadata.is_empty() {
            let json = serde_json::to_vec_pretty(metadata).map_err(|e| StorageError::Request {
                operation: "copy_object",
                container: dest.container.clone(),
                key: dest.key.clone(),
                reason: format!("metadata serialization failed: {e}"),
            })?;
            fs::write(self.metadata_path(dest)?, json).await?;
        }

        debug!(from = %from.display(), to = %to.display(), "Copied object");
        Ok(())
    }

    async fn delete_object(&self, object: &ObjectRef) -> Result<(), StorageError> {
        let path = self.resolve(object)?;
        fs::remove_file(&path)
            .await
            .map_err(|e| not_found_or_io(object, e))?;
        debug!(path = %path.display(), "Deleted object");
        Ok(())
    }
}

fn invalid_key(object: &ObjectRef) -> StorageError {
    StorageError::Request {
        operation: "resolve",
        container: object.container.clone(),
        key: object.key.clone(),
        reason: "key must be a relative path inside the container".into(),
    }
}

fn not_found_or_io(object: &ObjectRef, e: std::io::Error) -> StorageError {
    if e.kind() == ErrorKind::NotFound {
        StorageError::NotFound {
            container: object.container.clone(),
            key: object.key.clone(),
        }
    } else {
        StorageError::Io(e)
    }
}
