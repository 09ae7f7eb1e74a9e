//! Generic reconciliation loop
//!
//! Every Jupyter kind is reconciled the same way:
//!
//! 1. Fetch the parent. Gone means nothing to do.
//! 2. Resolve its references. A missing target parks the parent in
//!    `Pending` and re-checks it after a fixed delay.
//! 3. Generate the desired children. An invalid spec parks the parent in
//!    `Error` until it is edited.
//! 4. Create missing children and replace drifted ones, then report `Ready`.
//!
//! Transient API failures are retried in place with backoff. A write
//! conflict aborts the pass and is handed back to the controller, which
//! requeues the whole reconcile after a short jittered delay.

use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::runtime::controller::Action;
use kube::runtime::events::EventType;
use kube::{Resource, ResourceExt};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use jupyter_common::crd::{JupyterResourceStatus, ResourcePhase};
use jupyter_common::events::{actions, reasons};
use jupyter_common::retry::{jittered, retry_with_backoff};
use jupyter_common::{Error, Result};
use jupyter_workload::{ChildResource, GenerateError, WorkloadDefaults};

use crate::context::Context;
use crate::owner::owner_reference;
use crate::resolver::Resolver;
use crate::status::StatusReporter;
use crate::store::{JupyterKind, ObjectKey, SpecStore};

/// What a kind contributes to the generic reconcile loop
#[async_trait]
pub trait ManagedResource:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Kind reconciled
    const KIND: JupyterKind;

    /// Referenced objects the generator needs
    type Resolved: Send + Sync;

    /// Read the current object
    async fn fetch(specs: &dyn SpecStore, key: &ObjectKey) -> Result<Option<Self>>;

    /// Whether this object references other objects
    fn has_references(&self) -> bool;

    /// Resolve every reference this object makes
    async fn resolve(&self, key: &ObjectKey, resolver: &Resolver<'_>) -> Result<Self::Resolved>;

    /// Desired children, without owner references
    fn generate(
        &self,
        resolved: &Self::Resolved,
        defaults: &WorkloadDefaults,
    ) -> std::result::Result<Vec<ChildResource>, GenerateError>;

    /// Status as last stored
    fn status(&self) -> Option<&JupyterResourceStatus>;
}

/// Outcome of syncing one child
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildOutcome {
    /// The child did not exist and was created
    Created,
    /// The child had drifted and was replaced
    Updated,
    /// The child already matched
    Unchanged,
}

/// Reconciler for one kind
pub struct Reconciler<K> {
    ctx: Arc<Context>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ManagedResource> Reconciler<K> {
    /// Create a reconciler sharing `ctx`
    pub fn new(ctx: Arc<Context>) -> Self {
        Self {
            ctx,
            _kind: PhantomData,
        }
    }

    /// Drive the object at `key` toward its desired state
    pub async fn reconcile(&self, key: &ObjectKey) -> Result<Action> {
        let config = &self.ctx.config;
        let specs = self.ctx.specs.as_ref();

        let parent = retry_with_backoff(
            &config.api_retry,
            "fetch_parent",
            Error::is_retryable,
            || K::fetch(specs, key),
        )
        .await?;
        let Some(parent) = parent else {
            debug!(kind = %K::KIND, object = %key, "object no longer exists");
            return Ok(Action::await_change());
        };

        info!(kind = %K::KIND, object = %key, "reconciling");

        let mut reporter = StatusReporter::new(
            self.ctx.status.as_ref(),
            &config.api_retry,
            K::KIND,
            key,
            parent.status(),
            parent.meta().generation,
            parent.has_references(),
        );

        let resolver = Resolver::new(specs, &config.api_retry);
        let resolved = match parent.resolve(key, &resolver).await {
            Ok(resolved) => resolved,
            Err(e @ Error::NotFound { .. }) => {
                info!(kind = %K::KIND, object = %key, error = %e, "reference not found, waiting");
                if reporter.current().phase != ResourcePhase::Pending {
                    self.publish(&parent, EventType::Normal, reasons::REFERENCE_NOT_FOUND, e.to_string())
                        .await;
                }
                reporter.pending(&e).await?;
                return Ok(Action::requeue(config.reference_retry));
            }
            Err(e) if e.is_terminal() => return self.park_invalid(&parent, &mut reporter, e).await,
            Err(e) => return Err(e),
        };

        let desired = match parent.generate(&resolved, &config.defaults) {
            Ok(children) => children,
            Err(generate_error) => {
                let e = Error::validation_for(key.to_string(), generate_error.to_string());
                return self.park_invalid(&parent, &mut reporter, e).await;
            }
        };

        let owner = owner_reference(&parent)?;
        let mut created = 0usize;
        let mut updated = 0usize;
        for child in desired {
            let child = child.with_owner(owner.clone());
            match self.sync_child(&parent, &mut reporter, child).await? {
                ChildOutcome::Created => created += 1,
                ChildOutcome::Updated => updated += 1,
                ChildOutcome::Unchanged => {}
            }
        }

        if created + updated > 0 {
            info!(kind = %K::KIND, object = %key, created, updated, "children converged");
        } else {
            debug!(kind = %K::KIND, object = %key, "children already up to date");
        }
        reporter.ready("all generated resources are up to date".to_string()).await?;
        Ok(Action::requeue(config.resync_interval))
    }

    /// Bring one child in line with its desired state
    async fn sync_child(
        &self,
        parent: &K,
        reporter: &mut StatusReporter<'_>,
        desired: ChildResource,
    ) -> Result<ChildOutcome> {
        let retry = &self.ctx.config.api_retry;
        let children = self.ctx.children.as_ref();
        let kind = desired.kind();
        let key = ObjectKey::new(desired.namespace(), desired.name());

        let live = retry_with_backoff(retry, "get_child", Error::is_retryable, || {
            children.get(kind, &key)
        })
        .await?;

        match live {
            None => {
                reporter.creating(format!("creating {kind} {key}")).await?;
                retry_with_backoff(retry, "create_child", Error::is_retryable, || {
                    children.create(&desired)
                })
                .await?;
                info!(kind = %K::KIND, child_kind = %kind, child = %key, "created child");
                self.publish(
                    parent,
                    EventType::Normal,
                    reasons::CHILD_CREATED,
                    format!("Created {kind} {key}"),
                )
                .await;
                Ok(ChildOutcome::Created)
            }
            Some(live) if desired.differs_from(&live) => {
                reporter.updating(format!("updating {kind} {key}")).await?;
                let replacement = desired.apply_onto(&live);
                retry_with_backoff(retry, "replace_child", Error::is_retryable, || {
                    children.replace(&replacement)
                })
                .await?;
                info!(kind = %K::KIND, child_kind = %kind, child = %key, "updated drifted child");
                self.publish(
                    parent,
                    EventType::Normal,
                    reasons::CHILD_UPDATED,
                    format!("Updated {kind} {key}"),
                )
                .await;
                Ok(ChildOutcome::Updated)
            }
            Some(_) => Ok(ChildOutcome::Unchanged),
        }
    }

    /// Record a spec error and wait for the spec to change
    async fn park_invalid(
        &self,
        parent: &K,
        reporter: &mut StatusReporter<'_>,
        error: Error,
    ) -> Result<Action> {
        warn!(kind = %K::KIND, object = %parent.name_any(), error = %error, "invalid spec");
        if reporter.current().message.as_deref() != Some(error.to_string().as_str()) {
            self.publish(parent, EventType::Warning, error.reason(), error.to_string())
                .await;
        }
        reporter.failed(&error).await?;
        Ok(Action::await_change())
    }

    async fn publish(&self, parent: &K, type_: EventType, reason: &str, note: String) {
        let reference = parent.object_ref(&());
        self.ctx
            .events
            .publish(&reference, type_, reason, actions::RECONCILE, Some(note))
            .await;
    }
}

/// Reconcile entry point for `kube::runtime::Controller`
pub async fn reconcile<K: ManagedResource>(obj: Arc<K>, ctx: Arc<Context>) -> Result<Action> {
    let key = ObjectKey::for_object(obj.as_ref())?;
    Reconciler::<K>::new(ctx).reconcile(&key).await
}

/// Error policy for `kube::runtime::Controller`.
///
/// Conflicts are retried quickly with jitter; everything else after the
/// configured error delay.
pub fn error_policy<K: ManagedResource>(obj: Arc<K>, error: &Error, ctx: Arc<Context>) -> Action {
    let config = &ctx.config;
    match error {
        Error::Conflict { .. } => {
            debug!(kind = %K::KIND, object = %obj.name_any(), error = %error, "write conflict, requeueing");
            Action::requeue(jittered(config.conflict_requeue))
        }
        _ => {
            warn!(kind = %K::KIND, object = %obj.name_any(), error = %error, "reconcile failed, will retry");
            Action::requeue(config.error_requeue)
        }
    }
}
