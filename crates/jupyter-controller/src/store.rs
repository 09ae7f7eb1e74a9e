//! Object store abstraction
//!
//! The reconciler reads spec objects, reads and writes generated children,
//! and writes status through these traits. Production code uses
//! [`KubeStore`](crate::kube_store::KubeStore); tests use mocks or the
//! in-memory fake.

use async_trait::async_trait;
use kube::ResourceExt;

#[cfg(test)]
use mockall::automock;

use jupyter_common::crd::{
    JupyterGateway, JupyterKernel, JupyterKernelSpec, JupyterKernelTemplate, JupyterNotebook,
    JupyterResourceStatus,
};
use jupyter_common::{Error, Result};
use jupyter_workload::{ChildKind, ChildResource};

/// Namespace and name of a namespaced object
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    /// Namespace
    pub namespace: String,
    /// Name
    pub name: String,
}

impl ObjectKey {
    /// Build a key from its parts
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of an object read from the API server
    pub fn for_object<K: kube::Resource>(obj: &K) -> Result<Self> {
        let namespace = obj.namespace().ok_or_else(|| {
            Error::validation_for(obj.name_any(), "resource must be namespaced")
        })?;
        Ok(Self::new(namespace, obj.name_any()))
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// The five Jupyter kinds the operator reconciles
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JupyterKind {
    /// JupyterNotebook
    Notebook,
    /// JupyterGateway
    Gateway,
    /// JupyterKernelTemplate
    KernelTemplate,
    /// JupyterKernelSpec
    KernelSpec,
    /// JupyterKernel
    Kernel,
}

impl JupyterKind {
    /// Kubernetes kind name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Notebook => "JupyterNotebook",
            Self::Gateway => "JupyterGateway",
            Self::KernelTemplate => "JupyterKernelTemplate",
            Self::KernelSpec => "JupyterKernelSpec",
            Self::Kernel => "JupyterKernel",
        }
    }
}

impl std::fmt::Display for JupyterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only access to the Jupyter spec objects
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SpecStore: Send + Sync {
    /// Get a notebook, `None` if it does not exist
    async fn get_notebook(&self, key: &ObjectKey) -> Result<Option<JupyterNotebook>>;

    /// Get a gateway, `None` if it does not exist
    async fn get_gateway(&self, key: &ObjectKey) -> Result<Option<JupyterGateway>>;

    /// Get a kernel template, `None` if it does not exist
    async fn get_kernel_template(&self, key: &ObjectKey)
        -> Result<Option<JupyterKernelTemplate>>;

    /// Get a kernel spec, `None` if it does not exist
    async fn get_kernel_spec(&self, key: &ObjectKey) -> Result<Option<JupyterKernelSpec>>;

    /// Get a kernel, `None` if it does not exist
    async fn get_kernel(&self, key: &ObjectKey) -> Result<Option<JupyterKernel>>;
}

/// Access to generated children
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChildStore: Send + Sync {
    /// Get a live child, `None` if it does not exist
    async fn get(&self, kind: ChildKind, key: &ObjectKey) -> Result<Option<ChildResource>>;

    /// Create a child. Fails with `Conflict` if it already exists.
    async fn create(&self, child: &ChildResource) -> Result<ChildResource>;

    /// Replace a child. The child must carry the `resourceVersion` it was
    /// read at; a stale version fails with `Conflict`.
    async fn replace(&self, child: &ChildResource) -> Result<ChildResource>;
}

/// Status subresource writes
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StatusWriter: Send + Sync {
    /// Overwrite the status of a Jupyter object
    async fn patch_status(
        &self,
        kind: JupyterKind,
        key: &ObjectKey,
        status: &JupyterResourceStatus,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use jupyter_common::crd::JupyterNotebookSpec;

    #[test]
    fn key_from_namespaced_object() {
        let mut nb = JupyterNotebook::new("nb", JupyterNotebookSpec::default());
        assert!(ObjectKey::for_object(&nb).is_err());

        nb.metadata.namespace = Some("default".to_string());
        let key = ObjectKey::for_object(&nb).unwrap();
        assert_eq!(key, ObjectKey::new("default", "nb"));
        assert_eq!(key.to_string(), "default/nb");
    }

    #[test]
    fn kind_names_match_crds() {
        use kube::Resource;
        assert_eq!(JupyterKind::Notebook.as_str(), JupyterNotebook::kind(&()));
        assert_eq!(JupyterKind::KernelSpec.as_str(), JupyterKernelSpec::kind(&()));
        assert_eq!(JupyterKind::Kernel.to_string(), "JupyterKernel");
    }
}
