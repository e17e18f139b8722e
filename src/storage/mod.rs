//! Object-storage collaborator.
//!
//! The pipeline only needs three operations: fetch, copy (optionally with
//! metadata) and delete. One logical object per key; no versioning.

pub mod fs;
pub mod s3;

pub use fs::FsObjectStore;
pub use s3::S3ObjectStore;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::pipeline::types::ObjectRef;

/// User metadata attached to a copied object.
pub type ObjectMetadata = BTreeMap<String, String>;

/// Metadata key carrying the extracted OTP.
pub const OTP_METADATA_KEY: &str = "otp";

/// Backend-agnostic object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Read the whole object.
    async fn get_object(&self, object: &ObjectRef) -> Result<Vec<u8>, StorageError>;

    /// Copy `source` to `dest`, replacing the destination's metadata when
    /// `metadata` is non-empty.
    async fn copy_object(
        &self,
        source: &ObjectRef,
        dest: &ObjectRef,
        metadata: &ObjectMetadata,
    ) -> Result<(), StorageError>;

    /// Remove the object.
    async fn delete_object(&self, object: &ObjectRef) -> Result<(), StorageError>;
}
