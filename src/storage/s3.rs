//! S3 object store.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::MetadataDirective;
use tracing::debug;

use crate::error::StorageError;
use crate::pipeline::types::ObjectRef;
use crate::storage::{ObjectMetadata, ObjectStore};

/// Object store backed by an S3 client.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the ambient AWS environment (region, credentials).
    pub async fn from_env() -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(Client::new(&config))
    }
}

/// `CopySource` value for an object in the same partition.
///
/// The key is percent-encoded with `/` left as is; the SDK sends the value
/// verbatim in `x-amz-copy-source`.
pub fn copy_source(source: &ObjectRef) -> String {
    let key = urlencoding::encode(&source.key).replace("%2F", "/");
    format!("{}/{}", source.container, key)
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn name(&self) -> &str {
        "s3"
    }

    async fn get_object(&self, object: &ObjectRef) -> Result<Vec<u8>, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&object.container)
            .key(&object.key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    StorageError::NotFound {
                        container: object.container.clone(),
                        key: object.key.clone(),
                    }
                } else {
                    request_error("get_object", object, &e)
                }
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| request_error("get_object", object, &e))?;
        Ok(data.into_bytes().to_vec())
    }

    async fn copy_object(
        &self,
        source: &ObjectRef,
        dest: &ObjectRef,
        metadata: &ObjectMetadata,
    ) -> Result<(), StorageError> {
        let mut request = self
            .client
            .copy_object()
            .bucket(&dest.container)
            .key(&dest.key)
            .copy_source(copy_source(source));

        if !metadata.is_empty() {
            let metadata: HashMap<String, String> = metadata.clone().into_iter().collect();
            request = request
                .metadata_directive(MetadataDirective::Replace)
                .set_metadata(Some(metadata));
        }

        request
            .send()
            .await
            .map_err(|e| request_error("copy_object", dest, &e))?;
        debug!(source = %source, dest = %dest, "Copied S3 object");
        Ok(())
    }

    async fn delete_object(&self, object: &ObjectRef) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&object.container)
            .key(&object.key)
            .send()
            .await
            .map_err(|e| request_error("delete_object", object, &e))?;
        debug!(object = %object, "Deleted S3 object");
        Ok(())
    }
}

fn request_error<E>(operation: &'static str, object: &ObjectRef, e: &E) -> StorageError
where
    E: std::error::Error,
{
    StorageError::Request {
        operation,
        container: object.container.clone(),
        key: object.key.clone(),
        reason: DisplayErrorContext(e).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_source_joins_bucket_and_key() {
        let source = ObjectRef::new("mail-bucket", "inbox/abc123").unwrap();
        assert_eq!(copy_source(&source), "mail-bucket/inbox/abc123");
    }

    #[test]
    fn copy_source_encodes_key() {
        let source = ObjectRef::new("mail-bucket", "inbox/a b+c%d?e#f").unwrap();
        assert_eq!(
            copy_source(&source),
            "mail-bucket/inbox/a%20b%2Bc%25d%3Fe%23f"
        );

        let source = ObjectRef::new("mail-bucket", "sorted/josé@example.com/1.00").unwrap();
        assert_eq!(
            copy_source(&source),
            "mail-bucket/sorted/jos%C3%A9%40example.com/1.00"
        );
    }
}
