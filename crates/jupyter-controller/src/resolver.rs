//! Cross-reference resolution
//!
//! Notebooks reference gateways, kernel specs reference kernel templates,
//! and kernels reference kernel specs. A reference that names nothing is a
//! spec error; a reference whose target does not exist yet is transient.

use jupyter_common::crd::{
    JupyterGateway, JupyterKernelSpec, JupyterKernelTemplate, ResourceRef,
};
use jupyter_common::retry::{retry_with_backoff, RetryConfig};
use jupyter_common::{Error, Result};
use tracing::debug;

use crate::store::{JupyterKind, ObjectKey, SpecStore};

/// Looks up referenced spec objects
pub struct Resolver<'a> {
    specs: &'a dyn SpecStore,
    retry: &'a RetryConfig,
}

impl<'a> Resolver<'a> {
    /// Resolve through `specs`, retrying transient read failures per `retry`
    pub fn new(specs: &'a dyn SpecStore, retry: &'a RetryConfig) -> Self {
        Self { specs, retry }
    }

    /// Resolve a gateway reference made from `referrer_namespace`
    pub async fn gateway(
        &self,
        referrer_namespace: &str,
        reference: &ResourceRef,
    ) -> Result<JupyterGateway> {
        let key = reference_key(JupyterKind::Gateway, referrer_namespace, reference)?;
        let found = retry_with_backoff(
            self.retry,
            "get_gateway",
            Error::is_retryable,
            || self.specs.get_gateway(&key),
        )
        .await?;
        found.ok_or_else(|| not_found(JupyterKind::Gateway, &key))
    }

    /// Resolve a kernel template reference made from `referrer_namespace`
    pub async fn kernel_template(
        &self,
        referrer_namespace: &str,
        reference: &ResourceRef,
    ) -> Result<JupyterKernelTemplate> {
        let key = reference_key(JupyterKind::KernelTemplate, referrer_namespace, reference)?;
        let found = retry_with_backoff(
            self.retry,
            "get_kernel_template",
            Error::is_retryable,
            || self.specs.get_kernel_template(&key),
        )
        .await?;
        found.ok_or_else(|| not_found(JupyterKind::KernelTemplate, &key))
    }

    /// Resolve a kernel spec reference made from `referrer_namespace`
    pub async fn kernel_spec(
        &self,
        referrer_namespace: &str,
        reference: &ResourceRef,
    ) -> Result<JupyterKernelSpec> {
        let key = reference_key(JupyterKind::KernelSpec, referrer_namespace, reference)?;
        let found = retry_with_backoff(
            self.retry,
            "get_kernel_spec",
            Error::is_retryable,
            || self.specs.get_kernel_spec(&key),
        )
        .await?;
        found.ok_or_else(|| not_found(JupyterKind::KernelSpec, &key))
    }

    /// Resolve a kernel's full chain: its kernel spec, then the template
    /// that kernel spec builds on.
    ///
    /// The template reference is relative to the kernel spec's namespace.
    pub async fn kernel_chain(
        &self,
        referrer_namespace: &str,
        reference: &ResourceRef,
    ) -> Result<(JupyterKernelSpec, JupyterKernelTemplate)> {
        let kernel_spec = self.kernel_spec(referrer_namespace, reference).await?;
        let spec_namespace = reference.namespace_or(referrer_namespace);
        let template = self
            .kernel_template(spec_namespace, &kernel_spec.spec.template)
            .await?;
        Ok((kernel_spec, template))
    }
}

/// Validate a reference and compute the key it points at
fn reference_key(
    expected: JupyterKind,
    referrer_namespace: &str,
    reference: &ResourceRef,
) -> Result<ObjectKey> {
    if reference.name.trim().is_empty() {
        return Err(Error::ambiguous_reference(
            expected.as_str(),
            "reference has an empty name",
        ));
    }
    if let Some(kind) = reference.kind.as_deref().filter(|k| !k.is_empty()) {
        if kind != expected.as_str() {
            return Err(Error::ambiguous_reference(
                expected.as_str(),
                format!(
                    "reference to '{}' names kind {kind}, expected {expected}",
                    reference.name
                ),
            ));
        }
    }
    let key = ObjectKey::new(reference.namespace_or(referrer_namespace), &reference.name);
    debug!(kind = %expected, reference = %key, "resolving reference");
    Ok(key)
}

fn not_found(kind: JupyterKind, key: &ObjectKey) -> Error {
    Error::not_found(kind.as_str(), &key.namespace, &key.name)
}
