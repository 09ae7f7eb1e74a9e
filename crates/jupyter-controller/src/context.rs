//! Shared controller context and configuration

use std::sync::Arc;
use std::time::Duration;

use kube::Client;

use jupyter_common::events::{EventPublisher, KubeEventPublisher};
use jupyter_common::retry::RetryConfig;
use jupyter_workload::WorkloadDefaults;

use crate::kube_store::KubeStore;
use crate::store::{ChildStore, SpecStore, StatusWriter};

/// Reporting component name for events
pub const CONTROLLER_NAME: &str = "elastic-jupyter-operator";

/// Default delay before re-checking a missing reference
pub const DEFAULT_REFERENCE_RETRY: Duration = Duration::from_secs(10);

/// Default number of attempts for a single API call
pub const DEFAULT_MAX_API_ATTEMPTS: u32 = 5;

/// Default delay before retrying a reconcile that failed
pub const DEFAULT_ERROR_REQUEUE: Duration = Duration::from_secs(30);

/// Default base delay before retrying after a write conflict
pub const DEFAULT_CONFLICT_REQUEUE: Duration = Duration::from_secs(1);

/// Default interval between periodic re-checks of a converged object
pub const DEFAULT_RESYNC_INTERVAL: Duration = Duration::from_secs(300);

/// Tunables for the reconcilers
#[derive(Clone, Debug, PartialEq)]
pub struct ControllerConfig {
    /// Delay before re-checking a missing reference
    pub reference_retry: Duration,
    /// In-place retry policy for individual API calls
    pub api_retry: RetryConfig,
    /// Requeue delay after a failed reconcile
    pub error_requeue: Duration,
    /// Base requeue delay after a write conflict (jittered)
    pub conflict_requeue: Duration,
    /// Requeue delay after a successful reconcile
    pub resync_interval: Duration,
    /// Images used when a spec does not pick one
    pub defaults: WorkloadDefaults,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            reference_retry: DEFAULT_REFERENCE_RETRY,
            api_retry: RetryConfig::with_max_attempts(DEFAULT_MAX_API_ATTEMPTS),
            error_requeue: DEFAULT_ERROR_REQUEUE,
            conflict_requeue: DEFAULT_CONFLICT_REQUEUE,
            resync_interval: DEFAULT_RESYNC_INTERVAL,
            defaults: WorkloadDefaults::default(),
        }
    }
}

/// Dependencies shared by every reconcile
///
/// Use [`ContextBuilder`] to construct instances:
///
/// ```text
/// let ctx = Context::builder(client)
///     .config(config)
///     .build();
/// ```
pub struct Context {
    /// Spec object reads
    pub specs: Arc<dyn SpecStore>,
    /// Generated child reads and writes
    pub children: Arc<dyn ChildStore>,
    /// Status writes
    pub status: Arc<dyn StatusWriter>,
    /// Kubernetes event publishing
    pub events: Arc<dyn EventPublisher>,
    /// Tunables
    pub config: ControllerConfig,
}

impl Context {
    /// Create a builder for constructing a Context
    pub fn builder(client: Client) -> ContextBuilder {
        ContextBuilder::new(client)
    }

    /// Create a context for testing with custom stores
    ///
    /// Events go nowhere.
    #[cfg(test)]
    pub fn for_testing(
        specs: Arc<dyn SpecStore>,
        children: Arc<dyn ChildStore>,
        status: Arc<dyn StatusWriter>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            specs,
            children,
            status,
            events: Arc::new(jupyter_common::events::NoopEventPublisher),
            config,
        }
    }
}

/// Builder for constructing [`Context`] instances
pub struct ContextBuilder {
    client: Client,
    config: ControllerConfig,
    events: Option<Arc<dyn EventPublisher>>,
}

impl ContextBuilder {
    fn new(client: Client) -> Self {
        Self {
            client,
            config: ControllerConfig::default(),
            events: None,
        }
    }

    /// Override the controller configuration
    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the event publisher
    pub fn event_publisher(mut self, events: Arc<dyn EventPublisher>) -> Self {
        self.events = Some(events);
        self
    }

    /// Build the Context
    pub fn build(self) -> Context {
        let store = Arc::new(KubeStore::new(self.client.clone()));
        Context {
            specs: store.clone(),
            children: store.clone(),
            status: store,
            events: self
                .events
                .unwrap_or_else(|| Arc::new(KubeEventPublisher::new(self.client, CONTROLLER_NAME))),
            config: self.config,
        }
    }
}
