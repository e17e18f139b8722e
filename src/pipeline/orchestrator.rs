//! Pipeline orchestrator: one stored email, end to end.
//!
//! Flow:
//! 1. Fetch the source object
//! 2. Parse into an `Envelope` (empty body → `Skipped`, source untouched)
//! 3. Classify
//! 4. Act: forward the notification, or nothing extra for sorted mail
//! 5. Copy to the destination key, then delete the source
//!
//! Nothing is retried and nothing is rolled back. On the forward path the
//! copy happens whatever the send outcome, so an unconfirmed send still
//! ends with the object archived under `wins/`.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::error::{PipelineError, SendError, StorageError};
use crate::mail::{MailComposer, MailSender, send_forward};
use crate::message::{Envelope, parse_envelope};
use crate::pipeline::classifier::Classifier;
use crate::pipeline::keys::KeyRouter;
use crate::pipeline::types::{ObjectRef, Outcome, RoutingDecision, Stage};
use crate::storage::{OTP_METADATA_KEY, ObjectMetadata, ObjectStore};

/// Runs the routing pipeline against injected collaborators.
pub struct Pipeline {
    store: Arc<dyn ObjectStore>,
    mailer: Arc<dyn MailSender>,
    classifier: Classifier,
    keys: KeyRouter,
    composer: MailComposer,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        mailer: Arc<dyn MailSender>,
        classifier: Classifier,
        keys: KeyRouter,
        composer: MailComposer,
    ) -> Self {
        Self {
            store,
            mailer,
            classifier,
            keys,
            composer,
        }
    }

    /// Process the object at `source`.
    pub async fn run(&self, source: &ObjectRef) -> Result<Outcome, PipelineError> {
        info!(source = %source, store = self.store.name(), "Processing stored email");

        let raw = self
            .store
            .get_object(source)
            .await
            .map_err(|e| storage_failure(Stage::Fetched, source, e))?;
        debug!(source = %source, stage = %Stage::Fetched, bytes = raw.len(), "Stage complete");

        let envelope = parse_envelope(&raw).map_err(|e| {
            error!(source = %source, stage = %Stage::Failed, error = %e, "Could not parse email");
            PipelineError::from(e)
        })?;
        debug!(source = %source, stage = %Stage::Parsed, "Stage complete");

        if !envelope.has_body() {
            warn!(
                source = %source,
                stage = %Stage::Skipped,
                multipart = envelope.is_multipart,
                "No usable body text, leaving object in place"
            );
            return Ok(Outcome::Skipped {
                source: source.clone(),
            });
        }

        info!(
            from = %envelope.sender,
            to = %envelope.recipient,
            subject = %envelope.subject,
            "Parsed email"
        );

        let decision = self.classifier.classify(&envelope);
        debug!(
            source = %source,
            stage = %Stage::Classified,
            decision = decision.label(),
            "Stage complete"
        );

        match &decision {
            RoutingDecision::ForwardGiveaway {
                from_address,
                to_addresses,
            } => {
                let message_id = self
                    .forward(&envelope, from_address, to_addresses)
                    .await;
                debug!(source = %source, stage = %Stage::Acted, "Stage complete");

                let destination =
                    source.sibling(self.keys.destination_key(&decision, &envelope.recipient));
                self.relocate(source, &destination, &ObjectMetadata::new())
                    .await?;

                Ok(Outcome::Forwarded {
                    destination,
                    message_id,
                })
            }
            RoutingDecision::Sort { otp } => {
                debug!(source = %source, stage = %Stage::Acted, "Stage complete");

                let destination =
                    source.sibling(self.keys.destination_key(&decision, &envelope.recipient));
                let mut metadata = ObjectMetadata::new();
                if let Some(otp) = otp {
                    metadata.insert(OTP_METADATA_KEY.to_string(), otp.clone());
                }
                self.relocate(source, &destination, &metadata).await?;

                Ok(Outcome::Sorted {
                    destination,
                    otp: otp.clone(),
                })
            }
        }
    }

    /// Compose and send the forward. Returns the confirmed message id, if any.
    ///
    /// Failures are logged and reported as `None`; they never stop the run.
    async fn forward(
        &self,
        envelope: &Envelope,
        from_address: &str,
        to_addresses: &[String],
    ) -> Option<String> {
        let result = match self.composer.compose(
            from_address,
            to_addresses,
            &envelope.subject,
            None,
            Some(&envelope.body_text),
            &[],
        ) {
            Ok(message) => send_forward(self.mailer.as_ref(), &message).await,
            Err(e) => Err(SendError::from(e)),
        };

        match result {
            Ok(receipt) if receipt.is_confirmed() => {
                info!(
                    from = %from_address,
                    to = %to_addresses.join(", "),
                    message_id = receipt.message_id.as_deref().unwrap_or_default(),
                    mailer = self.mailer.name(),
                    "Forwarded notification"
                );
                receipt.message_id
            }
            Ok(_) => {
                warn!(error = %SendError::Unconfirmed, "Error sending email");
                None
            }
            Err(e) => {
                warn!(error = %e, "Error sending email");
                None
            }
        }
    }

    /// Copy `source` to `destination`, then delete `source`.
    async fn relocate(
        &self,
        source: &ObjectRef,
        destination: &ObjectRef,
        metadata: &ObjectMetadata,
    ) -> Result<(), PipelineError> {
        self.store
            .copy_object(source, destination, metadata)
            .await
            .map_err(|e| storage_failure(Stage::Relocated, source, e))?;
        self.store
            .delete_object(source)
            .await
            .map_err(|e| storage_failure(Stage::Done, source, e))?;
        info!(
            from = %source,
            to = %destination,
            stage = %Stage::Done,
            "Moved email"
        );
        Ok(())
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("store", &self.store.name())
            .field("mailer", &self.mailer.name())
            .field("classifier", &self.classifier)
            .finish_non_exhaustive()
    }
}

/// `stage` is the stage the run was trying to reach.
fn storage_failure(stage: Stage, source: &ObjectRef, source_err: StorageError) -> PipelineError {
    error!(
        source = %source,
        stage = %Stage::Failed,
        failed_reaching = %stage,
        error = %source_err,
        "Storage operation failed"
    );
    PipelineError::Storage {
        stage,
        source: source_err,
    }
}

/// Map a run result onto the binary process contract: 0 handled, 1 anomaly.
pub fn exit_code(result: &Result<Outcome, PipelineError>) -> i32 {
    match result {
        Ok(outcome) => outcome.exit_code(),
        Err(_) => 1,
    }
}
