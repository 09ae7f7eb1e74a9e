//! In-memory API server stand-in and fixtures for reconciler tests

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use jupyter_common::crd::{
    JupyterGateway, JupyterKernel, JupyterKernelSpec, JupyterKernelTemplate, JupyterNotebook,
    JupyterNotebookSpec, JupyterResourceStatus, ResourceRef,
};
use jupyter_common::retry::RetryConfig;
use jupyter_common::{Error, Result};
use jupyter_workload::{ChildKind, ChildResource};

use crate::context::ControllerConfig;
use crate::store::{ChildStore, JupyterKind, ObjectKey, SpecStore, StatusWriter};

pub(crate) fn fast_config() -> ControllerConfig {
    ControllerConfig {
        api_retry: RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
        },
        ..Default::default()
    }
}

pub(crate) fn unavailable() -> Error {
    Error::from(kube::Error::Api(kube::error::ErrorResponse {
        status: "Failure".to_string(),
        message: "the server is currently unable to handle the request".to_string(),
        reason: "ServiceUnavailable".to_string(),
        code: 503,
    }))
}

pub(crate) fn conflict(kind: &str, name: &str) -> Error {
    Error::from_write(
        kind,
        name,
        kube::Error::Api(kube::error::ErrorResponse {
            status: "Failure".to_string(),
            message: "the object has been modified".to_string(),
            reason: "Conflict".to_string(),
            code: 409,
        }),
    )
}

fn stored_meta(name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some("default".to_string()),
        uid: Some(format!("uid-{name}")),
        generation: Some(1),
        ..Default::default()
    }
}

pub(crate) fn notebook_with_template() -> JupyterNotebook {
    let mut nb = JupyterNotebook::new(
        "jupyternotebook-sample",
        JupyterNotebookSpec {
            template: Some(PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(BTreeMap::from([(
                        "app".to_string(),
                        "notebook".to_string(),
                    )])),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: "notebook".to_string(),
                        image: Some("busysandbox".to_string()),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            }),
            ..Default::default()
        },
    );
    nb.metadata = stored_meta("jupyternotebook-sample");
    nb
}

pub(crate) fn notebook_with_gateway() -> JupyterNotebook {
    let mut nb = JupyterNotebook::new(
        "jupyternotebook-sample",
        JupyterNotebookSpec {
            gateway: Some(ResourceRef::named("gateway")),
            ..Default::default()
        },
    );
    nb.metadata = stored_meta("jupyternotebook-sample");
    nb
}

#[derive(Default)]
struct State {
    notebooks: BTreeMap<ObjectKey, JupyterNotebook>,
    gateways: BTreeMap<ObjectKey, JupyterGateway>,
    kernel_templates: BTreeMap<ObjectKey, JupyterKernelTemplate>,
    kernel_specs: BTreeMap<ObjectKey, JupyterKernelSpec>,
    kernels: BTreeMap<ObjectKey, JupyterKernel>,
    children: HashMap<(ChildKind, ObjectKey), ChildResource>,
    statuses: HashMap<(JupyterKind, ObjectKey), JupyterResourceStatus>,
}

/// Single-threaded API server: objects keyed by kind and name,
/// resourceVersions checked on replace.
#[derive(Default)]
pub(crate) struct FakeCluster {
    state: Mutex<State>,
    next_version: AtomicUsize,
    creates: AtomicUsize,
    replaces: AtomicUsize,
    status_writes: AtomicUsize,
}

fn key_of(meta: &ObjectMeta) -> ObjectKey {
    ObjectKey::new(
        meta.namespace.clone().unwrap_or_default(),
        meta.name.clone().unwrap_or_default(),
    )
}

impl FakeCluster {
    fn bump(&self) -> String {
        (self.next_version.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    pub(crate) fn put_notebook(&self, nb: JupyterNotebook) {
        let key = key_of(&nb.metadata);
        self.state.lock().unwrap().notebooks.insert(key, nb);
    }

    pub(crate) fn put_gateway(&self, gw: JupyterGateway) {
        let key = key_of(&gw.metadata);
        self.state.lock().unwrap().gateways.insert(key, gw);
    }

    pub(crate) fn put_kernel_template(&self, t: JupyterKernelTemplate) {
        let key = key_of(&t.metadata);
        self.state.lock().unwrap().kernel_templates.insert(key, t);
    }

    pub(crate) fn put_kernel_spec(&self, ks: JupyterKernelSpec) {
        let key = key_of(&ks.metadata);
        self.state.lock().unwrap().kernel_specs.insert(key, ks);
    }

    pub(crate) fn put_kernel(&self, k: JupyterKernel) {
        let key = key_of(&k.metadata);
        self.state.lock().unwrap().kernels.insert(key, k);
    }

    pub(crate) fn child(&self, kind: ChildKind, key: &ObjectKey) -> Option<ChildResource> {
        self.state
            .lock()
            .unwrap()
            .children
            .get(&(kind, key.clone()))
            .cloned()
    }

    /// Edit a live child the way another client would, bumping its version
    pub(crate) fn mutate_child(
        &self,
        kind: ChildKind,
        key: &ObjectKey,
        f: impl FnOnce(&mut ChildResource),
    ) {
        let version = self.bump();
        let mut state = self.state.lock().unwrap();
        let child = state
            .children
            .get_mut(&(kind, key.clone()))
            .expect("child exists");
        f(child);
        child.metadata_mut().resource_version = Some(version);
    }

    pub(crate) fn status_of(
        &self,
        kind: JupyterKind,
        key: &ObjectKey,
    ) -> Option<JupyterResourceStatus> {
        self.state
            .lock()
            .unwrap()
            .statuses
            .get(&(kind, key.clone()))
            .cloned()
    }

    pub(crate) fn notebook_status(&self, key: &ObjectKey) -> Option<JupyterResourceStatus> {
        self.status_of(JupyterKind::Notebook, key)
    }

    pub(crate) fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub(crate) fn replaces(&self) -> usize {
        self.replaces.load(Ordering::SeqCst)
    }

    /// All writes: creates, replaces, and status patches
    pub(crate) fn writes(&self) -> usize {
        self.creates() + self.replaces() + self.status_writes.load(Ordering::SeqCst)
    }

    fn with_status<T: Clone>(
        &self,
        kind: JupyterKind,
        key: &ObjectKey,
        mut obj: T,
        set: impl FnOnce(&mut T, Option<JupyterResourceStatus>),
    ) -> T {
        set(&mut obj, self.status_of(kind, key));
        obj
    }
}

#[async_trait]
impl SpecStore for FakeCluster {
    async fn get_notebook(&self, key: &ObjectKey) -> Result<Option<JupyterNotebook>> {
        let found = self.state.lock().unwrap().notebooks.get(key).cloned();
        Ok(found.map(|nb| {
            self.with_status(JupyterKind::Notebook, key, nb, |o, s| o.status = s)
        }))
    }

    async fn get_gateway(&self, key: &ObjectKey) -> Result<Option<JupyterGateway>> {
        let found = self.state.lock().unwrap().gateways.get(key).cloned();
        Ok(found.map(|gw| self.with_status(JupyterKind::Gateway, key, gw, |o, s| o.status = s)))
    }

    async fn get_kernel_template(
        &self,
        key: &ObjectKey,
    ) -> Result<Option<JupyterKernelTemplate>> {
        let found = self.state.lock().unwrap().kernel_templates.get(key).cloned();
        Ok(found.map(|t| {
            self.with_status(JupyterKind::KernelTemplate, key, t, |o, s| o.status = s)
        }))
    }

    async fn get_kernel_spec(&self, key: &ObjectKey) -> Result<Option<JupyterKernelSpec>> {
        let found = self.state.lock().unwrap().kernel_specs.get(key).cloned();
        Ok(found.map(|ks| {
            self.with_status(JupyterKind::KernelSpec, key, ks, |o, s| o.status = s)
        }))
    }

    async fn get_kernel(&self, key: &ObjectKey) -> Result<Option<JupyterKernel>> {
        let found = self.state.lock().unwrap().kernels.get(key).cloned();
        Ok(found.map(|k| self.with_status(JupyterKind::Kernel, key, k, |o, s| o.status = s)))
    }
}

#[async_trait]
impl ChildStore for FakeCluster {
    async fn get(&self, kind: ChildKind, key: &ObjectKey) -> Result<Option<ChildResource>> {
        Ok(self.child(kind, key))
    }

    async fn create(&self, child: &ChildResource) -> Result<ChildResource> {
        let key = ObjectKey::new(child.namespace(), child.name());
        let version = self.bump();
        let mut state = self.state.lock().unwrap();
        if state.children.contains_key(&(child.kind(), key.clone())) {
            return Err(conflict(child.kind().as_str(), child.name()));
        }
        let mut stored = child.clone();
        let meta = stored.metadata_mut();
        meta.resource_version = Some(version);
        meta.uid = Some(format!("uid-{}-{}", child.kind(), child.name()));
        state
            .children
            .insert((child.kind(), key), stored.clone());
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(stored)
    }

    async fn replace(&self, child: &ChildResource) -> Result<ChildResource> {
        let key = ObjectKey::new(child.namespace(), child.name());
        let version = self.bump();
        let mut state = self.state.lock().unwrap();
        let Some(live) = state.children.get(&(child.kind(), key.clone())) else {
            return Err(Error::not_found(child.kind().as_str(), &key.namespace, &key.name));
        };
        if live.metadata().resource_version != child.metadata().resource_version {
            return Err(conflict(child.kind().as_str(), child.name()));
        }
        let mut stored = child.clone();
        stored.metadata_mut().resource_version = Some(version);
        state
            .children
            .insert((child.kind(), key), stored.clone());
        self.replaces.fetch_add(1, Ordering::SeqCst);
        Ok(stored)
    }
}

#[async_trait]
impl StatusWriter for FakeCluster {
    async fn patch_status(
        &self,
        kind: JupyterKind,
        key: &ObjectKey,
        status: &JupyterResourceStatus,
    ) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .statuses
            .insert((kind, key.clone()), status.clone());
        self.status_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
