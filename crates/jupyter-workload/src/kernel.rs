//! Kernel workload generation
//!
//! A kernel runs as a single-replica Deployment stamped from its kernel
//! spec's template, with the kernel spec's overrides applied on top.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::Deployment;

use jupyter_common::crd::{JupyterKernel, JupyterKernelSpec, JupyterKernelTemplate};

use crate::error::GenerateError;
use crate::kernel_spec::{kernel_image, LABEL_KERNEL_SPEC};
use crate::template::{
    first_container_mut, identity, merge_map, single_replica_deployment, template_metadata,
    upsert_env,
};

const KIND: &str = "JupyterKernel";

/// Label injected into every kernel pod
pub const LABEL_KERNEL: &str = "kernel";

/// Generate the Deployment for a kernel
pub fn generate_kernel(
    kernel: &JupyterKernel,
    kernel_spec: &JupyterKernelSpec,
    template: &JupyterKernelTemplate,
) -> Result<Deployment, GenerateError> {
    let id = identity(&kernel.metadata, KIND)?;
    let spec_name = kernel_spec.metadata.name.clone().unwrap_or_default();
    let ks = &kernel_spec.spec;

    let image = kernel_image(kernel_spec, template).ok_or_else(|| GenerateError::MissingImage {
        name: spec_name.clone(),
    })?;

    let mut pod = template.spec.template.clone();
    let labels = merge_map(
        pod.metadata.as_ref().and_then(|m| m.labels.as_ref()),
        [
            (LABEL_KERNEL.to_string(), id.name.to_string()),
            (LABEL_KERNEL_SPEC.to_string(), spec_name.clone()),
        ],
    );
    let annotations = pod
        .metadata
        .as_ref()
        .and_then(|m| m.annotations.clone())
        .unwrap_or_default();

    let template_name = template.metadata.name.as_deref().unwrap_or_default();
    let container = first_container_mut(&mut pod, "JupyterKernelTemplate", template_name)?;
    container.image = Some(image);
    if ks.resources.is_some() {
        container.resources = ks.resources.clone();
    }
    if !ks.command.is_empty() {
        container.command = Some(ks.command.clone());
    }

    let mut env: Vec<(String, String)> = ks
        .env
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let kernel_id = kernel
        .spec
        .kernel_id
        .clone()
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| id.name.to_string());
    env.push(("KERNEL_ID".to_string(), kernel_id));
    env.push(("KERNEL_LANGUAGE".to_string(), ks.language().to_string()));
    if let Some(timeout) = kernel.spec.idle_timeout {
        env.push(("KERNEL_IDLE_TIMEOUT".to_string(), timeout.to_string()));
    }
    if let Some(notebook) = &kernel.spec.notebook {
        env.push(("KERNEL_NOTEBOOK".to_string(), notebook.clone()));
    }
    if let Some(session) = &kernel.spec.session {
        env.push(("KERNEL_SESSION".to_string(), session.clone()));
    }
    upsert_env(container, env);

    pod.metadata = Some(template_metadata(labels, annotations));

    let selector = BTreeMap::from([(LABEL_KERNEL.to_string(), id.name.to_string())]);
    Ok(single_replica_deployment(&id, selector, pod))
}
