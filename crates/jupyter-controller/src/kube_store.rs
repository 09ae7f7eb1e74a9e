//! Production store backed by the Kubernetes API

use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;

use jupyter_common::crd::{
    JupyterGateway, JupyterKernel, JupyterKernelSpec, JupyterKernelTemplate, JupyterNotebook,
    JupyterResourceStatus,
};
use jupyter_common::{Error, Result, FIELD_MANAGER};
use jupyter_workload::{ChildKind, ChildResource};

use crate::store::{ChildStore, JupyterKind, ObjectKey, SpecStore, StatusWriter};

/// Store implementation talking to the API server
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    /// Wrap a kube client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        <K as Resource>::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn get_opt<K>(&self, key: &ObjectKey) -> Result<Option<K>>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        Ok(self.api::<K>(&key.namespace).get_opt(&key.name).await?)
    }

    async fn create_typed<K>(&self, obj: &K) -> Result<K>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Serialize + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let meta = obj.meta();
        let namespace = meta.namespace.as_deref().unwrap_or_default();
        let name = meta.name.as_deref().unwrap_or_default();
        self.api::<K>(namespace)
            .create(&post_params(), obj)
            .await
            .map_err(|e| Error::from_write(&K::kind(&Default::default()), name, e))
    }

    async fn replace_typed<K>(&self, obj: &K) -> Result<K>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Serialize + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let meta = obj.meta();
        let namespace = meta.namespace.as_deref().unwrap_or_default();
        let name = meta.name.as_deref().unwrap_or_default();
        self.api::<K>(namespace)
            .replace(name, &post_params(), obj)
            .await
            .map_err(|e| Error::from_write(&K::kind(&Default::default()), name, e))
    }

    async fn patch_status_typed<K>(&self, key: &ObjectKey, status: &JupyterResourceStatus) -> Result<()>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let patch = serde_json::json!({ "status": status });
        self.api::<K>(&key.namespace)
            .patch_status(&key.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| Error::from_write(&K::kind(&Default::default()), &key.name, e))?;
        Ok(())
    }
}

fn post_params() -> PostParams {
    PostParams {
        dry_run: false,
        field_manager: Some(FIELD_MANAGER.to_string()),
    }
}

#[async_trait]
impl SpecStore for KubeStore {
    async fn get_notebook(&self, key: &ObjectKey) -> Result<Option<JupyterNotebook>> {
        self.get_opt(key).await
    }

    async fn get_gateway(&self, key: &ObjectKey) -> Result<Option<JupyterGateway>> {
        self.get_opt(key).await
    }

    async fn get_kernel_template(
        &self,
        key: &ObjectKey,
    ) -> Result<Option<JupyterKernelTemplate>> {
        self.get_opt(key).await
    }

    async fn get_kernel_spec(&self, key: &ObjectKey) -> Result<Option<JupyterKernelSpec>> {
        self.get_opt(key).await
    }

    async fn get_kernel(&self, key: &ObjectKey) -> Result<Option<JupyterKernel>> {
        self.get_opt(key).await
    }
}

#[async_trait]
impl ChildStore for KubeStore {
    async fn get(&self, kind: ChildKind, key: &ObjectKey) -> Result<Option<ChildResource>> {
        Ok(match kind {
            ChildKind::Deployment => self.get_opt::<Deployment>(key).await?.map(Into::into),
            ChildKind::Service => self.get_opt::<Service>(key).await?.map(Into::into),
            ChildKind::ConfigMap => self.get_opt::<ConfigMap>(key).await?.map(Into::into),
        })
    }

    async fn create(&self, child: &ChildResource) -> Result<ChildResource> {
        Ok(match child {
            ChildResource::Deployment(d) => self.create_typed(d).await?.into(),
            ChildResource::Service(s) => self.create_typed(s).await?.into(),
            ChildResource::ConfigMap(c) => self.create_typed(c).await?.into(),
        })
    }

    async fn replace(&self, child: &ChildResource) -> Result<ChildResource> {
        Ok(match child {
            ChildResource::Deployment(d) => self.replace_typed(d).await?.into(),
            ChildResource::Service(s) => self.replace_typed(s).await?.into(),
            ChildResource::ConfigMap(c) => self.replace_typed(c).await?.into(),
        })
    }
}

#[async_trait]
impl StatusWriter for KubeStore {
    async fn patch_status(
        &self,
        kind: JupyterKind,
        key: &ObjectKey,
        status: &JupyterResourceStatus,
    ) -> Result<()> {
        match kind {
            JupyterKind::Notebook => self.patch_status_typed::<JupyterNotebook>(key, status).await,
            JupyterKind::Gateway => self.patch_status_typed::<JupyterGateway>(key, status).await,
            JupyterKind::KernelTemplate => {
                self.patch_status_typed::<JupyterKernelTemplate>(key, status)
                    .await
            }
            JupyterKind::KernelSpec => {
                self.patch_status_typed::<JupyterKernelSpec>(key, status)
                    .await
            }
            JupyterKind::Kernel => self.patch_status_typed::<JupyterKernel>(key, status).await,
        }
    }
}
