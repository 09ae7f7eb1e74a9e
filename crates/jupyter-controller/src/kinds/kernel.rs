use async_trait::async_trait;

use jupyter_common::crd::{
    JupyterKernel, JupyterKernelSpec, JupyterKernelTemplate, JupyterResourceStatus,
};
use jupyter_common::Result;
use jupyter_workload::{generate_kernel, ChildResource, GenerateError, WorkloadDefaults};

use crate::reconciler::ManagedResource;
use crate::resolver::Resolver;
use crate::store::{JupyterKind, ObjectKey, SpecStore};

#[async_trait]
impl ManagedResource for JupyterKernel {
    const KIND: JupyterKind = JupyterKind::Kernel;

    type Resolved = (JupyterKernelSpec, JupyterKernelTemplate);

    async fn fetch(specs: &dyn SpecStore, key: &ObjectKey) -> Result<Option<Self>> {
        specs.get_kernel(key).await
    }

    fn has_references(&self) -> bool {
        true
    }

    async fn resolve(&self, key: &ObjectKey, resolver: &Resolver<'_>) -> Result<Self::Resolved> {
        resolver
            .kernel_chain(&key.namespace, &self.spec.kernel_spec)
            .await
    }

    fn generate(
        &self,
        (kernel_spec, template): &Self::Resolved,
        _defaults: &WorkloadDefaults,
    ) -> std::result::Result<Vec<ChildResource>, GenerateError> {
        Ok(vec![generate_kernel(self, kernel_spec, template)?.into()])
    }

    fn status(&self) -> Option<&JupyterResourceStatus> {
        self.status.as_ref()
    }
}
