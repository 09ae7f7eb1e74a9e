use async_trait::async_trait;

use jupyter_common::crd::{JupyterKernelTemplate, JupyterResourceStatus};
use jupyter_common::Result;
use jupyter_workload::{validate_kernel_template, ChildResource, GenerateError, WorkloadDefaults};

use crate::reconciler::ManagedResource;
use crate::resolver::Resolver;
use crate::store::{JupyterKind, ObjectKey, SpecStore};

/// Templates own no children; reconciling one only validates it and
/// reports the result.
#[async_trait]
impl ManagedResource for JupyterKernelTemplate {
    const KIND: JupyterKind = JupyterKind::KernelTemplate;

    type Resolved = ();

    async fn fetch(specs: &dyn SpecStore, key: &ObjectKey) -> Result<Option<Self>> {
        specs.get_kernel_template(key).await
    }

    fn has_references(&self) -> bool {
        false
    }

    async fn resolve(&self, _key: &ObjectKey, _resolver: &Resolver<'_>) -> Result<()> {
        Ok(())
    }

    fn generate(
        &self,
        _resolved: &(),
        _defaults: &WorkloadDefaults,
    ) -> std::result::Result<Vec<ChildResource>, GenerateError> {
        validate_kernel_template(self)?;
        Ok(Vec::new())
    }

    fn status(&self) -> Option<&JupyterResourceStatus> {
        self.status.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jupyter_common::crd::{JupyterKernelTemplateSpec, ResourcePhase};

    use super::*;
    use crate::context::Context;
    use crate::reconciler::Reconciler;
    use crate::testing::{fast_config, FakeCluster};

    #[tokio::test]
    async fn empty_template_is_rejected_and_valid_one_is_ready() {
        let cluster = Arc::new(FakeCluster::default());
        let mut template =
            JupyterKernelTemplate::new("python-base", JupyterKernelTemplateSpec::default());
        template.metadata.namespace = Some("default".to_string());
        template.metadata.uid = Some("uid-template".to_string());
        cluster.put_kernel_template(template.clone());

        let ctx = Arc::new(Context::for_testing(
            cluster.clone(),
            cluster.clone(),
            cluster.clone(),
            fast_config(),
        ));
        let key = ObjectKey::new("default", "python-base");
        let reconciler = Reconciler::<JupyterKernelTemplate>::new(ctx);

        reconciler.reconcile(&key).await.unwrap();
        let status = cluster.status_of(JupyterKind::KernelTemplate, &key).unwrap();
        assert_eq!(status.phase, ResourcePhase::Error);
        assert!(status.message.unwrap().contains("defines no containers"));

        template.spec.template.spec = Some(k8s_openapi::api::core::v1::PodSpec {
            containers: vec![k8s_openapi::api::core::v1::Container {
                name: "kernel".to_string(),
                image: Some("elyra/kernel-py:2.5.0".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        });
        cluster.put_kernel_template(template);
        reconciler.reconcile(&key).await.unwrap();
        assert_eq!(
            cluster.status_of(JupyterKind::KernelTemplate, &key).unwrap().phase,
            ResourcePhase::Ready
        );
        assert_eq!(cluster.creates(), 0);
    }
}
