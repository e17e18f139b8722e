//! Trigger payloads: object-created notifications naming one stored email.

use serde::Deserialize;
use tokio::io::AsyncReadExt;

use crate::error::TriggerError;
use crate::pipeline::types::ObjectRef;

/// Object-created notification: `{"Records": [{"s3": {...}}]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<StorageRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageRecord {
    pub s3: StorageEntity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageEntity {
    pub bucket: BucketEntity,
    pub object: ObjectEntity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BucketEntity {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectEntity {
    pub key: String,
}

impl StorageEvent {
    /// Reference to the object named by the first record.
    pub fn first_object(&self) -> Result<ObjectRef, TriggerError> {
        let record = self.records.first().ok_or(TriggerError::NoRecords)?;
        ObjectRef::new(&record.s3.bucket.name, &record.s3.object.key)
            .ok_or(TriggerError::EmptyContainer)
    }
}

/// Parse a notification and return the object it names.
///
/// Keys are used verbatim.
pub fn parse_event(json: &str) -> Result<ObjectRef, TriggerError> {
    let event: StorageEvent = serde_json::from_str(json)?;
    event.first_object()
}

/// Read a JSON payload from a file, or from stdin when `path` is `-`.
pub async fn read_payload(path: &str) -> Result<String, TriggerError> {
    if path == "-" {
        let mut payload = String::new();
        tokio::io::stdin().read_to_string(&mut payload).await?;
        Ok(payload)
    } else {
        Ok(tokio::fs::read_to_string(path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENT: &str = r#"{
        "Records": [
            {
                "eventSource": "aws:s3",
                "eventName": "ObjectCreated:Put",
                "s3": {
                    "bucket": { "name": "mail-bucket", "arn": "arn:aws:s3:::mail-bucket" },
                    "object": { "key": "inbox/abc123", "size": 2048 }
                }
            },
            {
                "s3": {
                    "bucket": { "name": "other-bucket" },
                    "object": { "key": "inbox/second" }
                }
            }
        ]
    }"#;

    #[test]
    fn first_record_wins() {
        let object = parse_event(EVENT).unwrap();
        assert_eq!(object.container, "mail-bucket");
        assert_eq!(object.key, "inbox/abc123");
    }

    #[test]
    fn empty_records_rejected() {
        let err = parse_event(r#"{"Records": []}"#).unwrap_err();
        assert!(matches!(err, TriggerError::NoRecords));
        let err = parse_event("{}").unwrap_err();
        assert!(matches!(err, TriggerError::NoRecords));
    }

    #[test]
    fn empty_bucket_rejected() {
        let json = r#"{"Records":[{"s3":{"bucket":{"name":""},"object":{"key":"k"}}}]}"#;
        let err = parse_event(json).unwrap_err();
        assert!(matches!(err, TriggerError::EmptyContainer));
    }

    #[test]
    fn invalid_json_rejected() {
        let err = parse_event("not json").unwrap_err();
        assert!(matches!(err, TriggerError::Json(_)));
    }

    #[tokio::test]
    async fn payload_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("event.json");
        tokio::fs::write(&path, EVENT).await.unwrap();

        let payload = read_payload(path.to_str().unwrap()).await.unwrap();
        assert_eq!(parse_event(&payload).unwrap().key, "inbox/abc123");
    }

    #[tokio::test]
    async fn missing_payload_file_is_io_error() {
        let err = read_payload("/nonexistent/event.json").await.unwrap_err();
        assert!(matches!(err, TriggerError::Io(_)));
    }
}
