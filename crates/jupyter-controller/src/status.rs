//! Status reporting
//!
//! One reporter is created per reconcile pass. It starts from the status the
//! parent was read with and only writes when the phase, message, observed
//! generation, or a condition actually changes. Status writes produce watch
//! events on the parent, so an unconditional write would requeue forever.

use jupyter_common::crd::{
    Condition, ConditionStatus, JupyterResourceStatus, ResourcePhase, CONDITION_READY,
    CONDITION_REFERENCE_RESOLVED,
};
use jupyter_common::retry::{retry_with_backoff, RetryConfig};
use jupyter_common::{Error, Result};
use tracing::debug;

use crate::store::{JupyterKind, ObjectKey, StatusWriter};

/// Writes the status of one parent object
pub struct StatusReporter<'a> {
    writer: &'a dyn StatusWriter,
    retry: &'a RetryConfig,
    kind: JupyterKind,
    key: &'a ObjectKey,
    generation: Option<i64>,
    tracks_references: bool,
    current: JupyterResourceStatus,
}

impl<'a> StatusReporter<'a> {
    /// Create a reporter for the parent at `key`.
    ///
    /// `tracks_references` adds a `ReferenceResolved` condition to every
    /// write.
    pub fn new(
        writer: &'a dyn StatusWriter,
        retry: &'a RetryConfig,
        kind: JupyterKind,
        key: &'a ObjectKey,
        current: Option<&JupyterResourceStatus>,
        generation: Option<i64>,
        tracks_references: bool,
    ) -> Self {
        Self {
            writer,
            retry,
            kind,
            key,
            generation,
            tracks_references,
            current: current.cloned().unwrap_or_default(),
        }
    }

    /// Status as last written (or as read, if nothing was written)
    pub fn current(&self) -> &JupyterResourceStatus {
        &self.current
    }

    /// A referenced object does not exist yet
    pub async fn pending(&mut self, error: &Error) -> Result<()> {
        let message = format!("waiting on reference: {error}");
        self.write(
            ResourcePhase::Pending,
            message.clone(),
            ConditionStatus::False,
            error.reason(),
            Some((ConditionStatus::False, error.reason(), message)),
        )
        .await
    }

    /// The spec can never produce a workload as written
    pub async fn failed(&mut self, error: &Error) -> Result<()> {
        let resolved = match error {
            Error::AmbiguousReference { .. } => {
                Some((ConditionStatus::False, error.reason(), error.to_string()))
            }
            _ => Some((ConditionStatus::True, "Resolved", String::new())),
        };
        self.write(
            ResourcePhase::Error,
            error.to_string(),
            ConditionStatus::False,
            error.reason(),
            resolved,
        )
        .await
    }

    /// A child is about to be created
    pub async fn creating(&mut self, message: String) -> Result<()> {
        self.write(
            ResourcePhase::Creating,
            message,
            ConditionStatus::False,
            "Creating",
            Some((ConditionStatus::True, "Resolved", String::new())),
        )
        .await
    }

    /// A child is about to be updated
    pub async fn updating(&mut self, message: String) -> Result<()> {
        self.write(
            ResourcePhase::Updating,
            message,
            ConditionStatus::False,
            "Updating",
            Some((ConditionStatus::True, "Resolved", String::new())),
        )
        .await
    }

    /// Every child matches the desired state
    pub async fn ready(&mut self, message: String) -> Result<()> {
        self.write(
            ResourcePhase::Ready,
            message,
            ConditionStatus::True,
            "Ready",
            Some((ConditionStatus::True, "Resolved", String::new())),
        )
        .await
    }

    async fn write(
        &mut self,
        phase: ResourcePhase,
        message: String,
        ready: ConditionStatus,
        reason: &str,
        resolved: Option<(ConditionStatus, &str, String)>,
    ) -> Result<()> {
        let mut next = self.current.clone();
        next.phase = phase;
        next.message = Some(message.clone());
        next.observed_generation = self.generation;
        next.set_condition(Condition::new(CONDITION_READY, ready, reason, message));
        if self.tracks_references {
            if let Some((status, reason, message)) = resolved {
                next.set_condition(Condition::new(
                    CONDITION_REFERENCE_RESOLVED,
                    status,
                    reason,
                    message,
                ));
            }
        }

        if next.same_state(&self.current) {
            debug!(kind = %self.kind, object = %self.key, %phase, "status unchanged, skipping write");
            return Ok(());
        }

        retry_with_backoff(self.retry, "patch_status", Error::is_retryable, || {
            self.writer.patch_status(self.kind, self.key, &next)
        })
        .await?;
        debug!(kind = %self.kind, object = %self.key, %phase, "status written");
        self.current = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockStatusWriter;
    use std::sync::{Arc, Mutex};

    fn key() -> ObjectKey {
        ObjectKey::new("default", "nb")
    }

    fn capture() -> (MockStatusWriter, Arc<Mutex<Vec<JupyterResourceStatus>>>) {
        let writes = Arc::new(Mutex::new(Vec::new()));
        let sink = writes.clone();
        let mut writer = MockStatusWriter::new();
        writer.expect_patch_status().returning(move |_, _, status| {
            sink.lock().unwrap().push(status.clone());
            Ok(())
        });
        (writer, writes)
    }

    #[tokio::test]
    async fn ready_is_written_once() {
        let (writer, writes) = capture();
        let retry = RetryConfig::with_max_attempts(1);
        let key = key();
        let mut reporter = StatusReporter::new(
            &writer,
            &retry,
            JupyterKind::Notebook,
            &key,
            None,
            Some(3),
            true,
        );

        reporter.ready("up to date".to_string()).await.unwrap();
        reporter.ready("up to date".to_string()).await.unwrap();

        let writes = writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        let status = &writes[0];
        assert_eq!(status.phase, ResourcePhase::Ready);
        assert_eq!(status.observed_generation, Some(3));
        assert_eq!(
            status.condition(CONDITION_READY).unwrap().status,
            ConditionStatus::True
        );
        assert_eq!(
            status.condition(CONDITION_REFERENCE_RESOLVED).unwrap().status,
            ConditionStatus::True
        );
    }

    #[tokio::test]
    async fn unchanged_status_from_the_api_is_not_rewritten() {
        let mut writer = MockStatusWriter::new();
        writer.expect_patch_status().never();

        let retry = RetryConfig::with_max_attempts(1);
        let key = key();
        let mut stored = JupyterResourceStatus {
            phase: ResourcePhase::Ready,
            message: Some("up to date".to_string()),
            observed_generation: Some(1),
            conditions: vec![],
        };
        stored.set_condition(Condition::new(
            CONDITION_READY,
            ConditionStatus::True,
            "Ready",
            "up to date",
        ));

        let mut reporter = StatusReporter::new(
            &writer,
            &retry,
            JupyterKind::KernelTemplate,
            &key,
            Some(&stored),
            Some(1),
            false,
        );
        reporter.ready("up to date".to_string()).await.unwrap();
    }

    #[tokio::test]
    async fn pending_then_ready_flips_reference_condition() {
        let (writer, writes) = capture();
        let retry = RetryConfig::with_max_attempts(1);
        let key = key();
        let mut reporter = StatusReporter::new(
            &writer,
            &retry,
            JupyterKind::Notebook,
            &key,
            None,
            Some(1),
            true,
        );

        let missing = Error::not_found("JupyterGateway", "default", "gateway");
        reporter.pending(&missing).await.unwrap();
        reporter.ready("up to date".to_string()).await.unwrap();

        let writes = writes.lock().unwrap();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].phase, ResourcePhase::Pending);
        assert_eq!(
            writes[0].message.as_deref(),
            Some("waiting on reference: JupyterGateway default/gateway not found")
        );
        let resolved = writes[0].condition(CONDITION_REFERENCE_RESOLVED).unwrap();
        assert_eq!(resolved.status, ConditionStatus::False);
        assert_eq!(resolved.reason, "ReferenceNotFound");

        assert_eq!(writes[1].phase, ResourcePhase::Ready);
        assert_eq!(writes[1].conditions.len(), 2);
    }

    #[tokio::test]
    async fn failed_records_reason() {
        let (writer, writes) = capture();
        let retry = RetryConfig::with_max_attempts(1);
        let key = key();
        let mut reporter = StatusReporter::new(
            &writer,
            &retry,
            JupyterKind::Notebook,
            &key,
            None,
            None,
            false,
        );

        let err = Error::validation_for("default/nb", "no gateway and template applied");
        reporter.failed(&err).await.unwrap();

        let writes = writes.lock().unwrap();
        assert_eq!(writes[0].phase, ResourcePhase::Error);
        let ready = writes[0].condition(CONDITION_READY).unwrap();
        assert_eq!(ready.reason, "ValidationFailed");
        assert!(ready.message.contains("no gateway and template applied"));
        assert!(writes[0].condition(CONDITION_REFERENCE_RESOLVED).is_none());
    }
}
