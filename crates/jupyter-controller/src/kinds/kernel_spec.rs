use async_trait::async_trait;

use jupyter_common::crd::{JupyterKernelSpec, JupyterKernelTemplate, JupyterResourceStatus};
use jupyter_common::Result;
use jupyter_workload::{generate_kernel_spec, ChildResource, GenerateError, WorkloadDefaults};

use crate::reconciler::ManagedResource;
use crate::resolver::Resolver;
use crate::store::{JupyterKind, ObjectKey, SpecStore};

#[async_trait]
impl ManagedResource for JupyterKernelSpec {
    const KIND: JupyterKind = JupyterKind::KernelSpec;

    type Resolved = JupyterKernelTemplate;

    async fn fetch(specs: &dyn SpecStore, key: &ObjectKey) -> Result<Option<Self>> {
        specs.get_kernel_spec(key).await
    }

    fn has_references(&self) -> bool {
        true
    }

    async fn resolve(
        &self,
        key: &ObjectKey,
        resolver: &Resolver<'_>,
    ) -> Result<JupyterKernelTemplate> {
        resolver
            .kernel_template(&key.namespace, &self.spec.template)
            .await
    }

    fn generate(
        &self,
        template: &JupyterKernelTemplate,
        _defaults: &WorkloadDefaults,
    ) -> std::result::Result<Vec<ChildResource>, GenerateError> {
        Ok(vec![generate_kernel_spec(self, template)?.into()])
    }

    fn status(&self) -> Option<&JupyterResourceStatus> {
        self.status.as_ref()
    }
}
