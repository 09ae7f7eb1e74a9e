use async_trait::async_trait;

use jupyter_common::crd::{JupyterGateway, JupyterNotebook, JupyterResourceStatus};
use jupyter_common::Result;
use jupyter_workload::{generate_notebook, ChildResource, GenerateError, WorkloadDefaults};

use crate::reconciler::ManagedResource;
use crate::resolver::Resolver;
use crate::store::{JupyterKind, ObjectKey, SpecStore};

#[async_trait]
impl ManagedResource for JupyterNotebook {
    const KIND: JupyterKind = JupyterKind::Notebook;

    /// The gateway only has to exist; nothing is read from it
    type Resolved = Option<JupyterGateway>;

    async fn fetch(specs: &dyn SpecStore, key: &ObjectKey) -> Result<Option<Self>> {
        specs.get_notebook(key).await
    }

    fn has_references(&self) -> bool {
        self.spec.gateway.is_some()
    }

    async fn resolve(&self, key: &ObjectKey, resolver: &Resolver<'_>) -> Result<Self::Resolved> {
        match &self.spec.gateway {
            Some(gateway) => Ok(Some(resolver.gateway(&key.namespace, gateway).await?)),
            None => Ok(None),
        }
    }

    fn generate(
        &self,
        _resolved: &Self::Resolved,
        defaults: &WorkloadDefaults,
    ) -> std::result::Result<Vec<ChildResource>, GenerateError> {
        Ok(vec![generate_notebook(Some(self), defaults)?.into()])
    }

    fn status(&self) -> Option<&JupyterResourceStatus> {
        self.status.as_ref()
    }
}
