//! Kernel spec publication
//!
//! A JupyterKernelSpec is published as a ConfigMap holding a Jupyter
//! `kernel.json`, which gateways mount into their kernels directory.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Serialize;

use jupyter_common::crd::{JupyterKernelSpec, JupyterKernelTemplate};
use jupyter_common::{LABEL_MANAGED_BY, LABEL_MANAGED_BY_VALUE};

use crate::error::GenerateError;
use crate::template::{ensure_containers, identity};

const KIND: &str = "JupyterKernelSpec";

/// ConfigMap key holding the kernel description
pub const KERNEL_JSON_KEY: &str = "kernel.json";

/// Label carrying the kernel spec name on its ConfigMap
pub const LABEL_KERNEL_SPEC: &str = "kernel-spec";

/// Kernel command used when the spec does not set one
pub const DEFAULT_ARGV: [&str; 5] = [
    "python",
    "-m",
    "ipykernel_launcher",
    "-f",
    "{connection_file}",
];

/// Name of the ConfigMap a kernel spec is published under
pub fn kernel_spec_config_map_name(kernel_spec: &str) -> String {
    format!("kernelspec-{kernel_spec}")
}

/// Image a kernel spec runs: its own override, else the template's first
/// container image.
pub fn kernel_image(
    kernel_spec: &JupyterKernelSpec,
    template: &JupyterKernelTemplate,
) -> Option<String> {
    kernel_spec
        .spec
        .image
        .clone()
        .filter(|i| !i.is_empty())
        .or_else(|| {
            template
                .spec
                .template
                .spec
                .as_ref()
                .and_then(|pod| pod.containers.first())
                .and_then(|c| c.image.clone())
                .filter(|i| !i.is_empty())
        })
}

/// Check that a kernel template can run a kernel
pub fn validate_kernel_template(template: &JupyterKernelTemplate) -> Result<(), GenerateError> {
    let name = template.metadata.name.as_deref().unwrap_or_default();
    ensure_containers(&template.spec.template, "JupyterKernelTemplate", name)
}

#[derive(Serialize)]
struct KernelJson<'a> {
    display_name: &'a str,
    language: &'a str,
    argv: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    env: BTreeMap<String, String>,
    metadata: KernelMetadata<'a>,
}

#[derive(Serialize)]
struct KernelMetadata<'a> {
    process_proxy: ProcessProxy<'a>,
}

#[derive(Serialize)]
struct ProcessProxy<'a> {
    class_name: &'a str,
    config: ProcessProxyConfig,
}

#[derive(Serialize)]
struct ProcessProxyConfig {
    image_name: String,
}

/// Generate the ConfigMap publishing a kernel spec
pub fn generate_kernel_spec(
    kernel_spec: &JupyterKernelSpec,
    template: &JupyterKernelTemplate,
) -> Result<ConfigMap, GenerateError> {
    let id = identity(&kernel_spec.metadata, KIND)?;
    validate_kernel_template(template)?;

    let image = kernel_image(kernel_spec, template).ok_or_else(|| GenerateError::MissingImage {
        name: id.name.to_string(),
    })?;

    let spec = &kernel_spec.spec;
    let argv = if spec.command.is_empty() {
        DEFAULT_ARGV.iter().map(|s| s.to_string()).collect()
    } else {
        spec.command.clone()
    };
    let doc = KernelJson {
        display_name: spec.display_name.as_deref().unwrap_or(id.name),
        language: spec.language(),
        argv,
        env: spec.env.clone(),
        metadata: KernelMetadata {
            process_proxy: ProcessProxy {
                class_name: spec.class_name(),
                config: ProcessProxyConfig { image_name: image },
            },
        },
    };
    let json = serde_json::to_string_pretty(&doc).map_err(|e| GenerateError::KernelJson {
        name: id.name.to_string(),
        message: e.to_string(),
    })?;

    Ok(ConfigMap {
        metadata: ObjectMeta {
            name: Some(kernel_spec_config_map_name(id.name)),
            namespace: Some(id.namespace.to_string()),
            labels: Some(BTreeMap::from([
                (LABEL_KERNEL_SPEC.to_string(), id.name.to_string()),
                (
                    LABEL_MANAGED_BY.to_string(),
                    LABEL_MANAGED_BY_VALUE.to_string(),
                ),
            ])),
            ..Default::default()
        },
        data: Some(BTreeMap::from([(KERNEL_JSON_KEY.to_string(), json)])),
        ..Default::default()
    })
}
