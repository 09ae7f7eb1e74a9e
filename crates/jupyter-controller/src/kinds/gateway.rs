use async_trait::async_trait;

use jupyter_common::crd::{JupyterGateway, JupyterResourceStatus, ResourceRef};
use jupyter_common::Result;
use jupyter_workload::{generate_gateway, ChildResource, GenerateError, WorkloadDefaults};

use crate::reconciler::ManagedResource;
use crate::resolver::Resolver;
use crate::store::{JupyterKind, ObjectKey, SpecStore};

#[async_trait]
impl ManagedResource for JupyterGateway {
    const KIND: JupyterKind = JupyterKind::Gateway;

    /// Listed kernel specs must exist, or their ConfigMap mounts would
    /// keep the gateway pod from starting.
    type Resolved = ();

    async fn fetch(specs: &dyn SpecStore, key: &ObjectKey) -> Result<Option<Self>> {
        specs.get_gateway(key).await
    }

    fn has_references(&self) -> bool {
        !self.spec.kernels.is_empty()
    }

    async fn resolve(&self, key: &ObjectKey, resolver: &Resolver<'_>) -> Result<()> {
        for kernel in &self.spec.kernels {
            let reference = ResourceRef::named(kernel.as_str());
            resolver.kernel_spec(&key.namespace, &reference).await?;
        }
        Ok(())
    }

    fn generate(
        &self,
        _resolved: &(),
        defaults: &WorkloadDefaults,
    ) -> std::result::Result<Vec<ChildResource>, GenerateError> {
        let workload = generate_gateway(self, defaults)?;
        Ok(vec![workload.deployment.into(), workload.service.into()])
    }

    fn status(&self) -> Option<&JupyterResourceStatus> {
        self.status.as_ref()
    }
}
