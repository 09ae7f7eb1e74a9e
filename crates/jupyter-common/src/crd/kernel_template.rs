//! JupyterKernelTemplate CRD types

use k8s_openapi::api::core::v1::PodTemplateSpec;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::JupyterResourceStatus;

/// Reusable pod template that kernel specs build on
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "kubeflow.tkestack.io",
    version = "v1alpha1",
    kind = "JupyterKernelTemplate",
    plural = "jupyterkerneltemplates",
    shortname = "jkt",
    namespaced,
    status = "JupyterResourceStatus",
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct JupyterKernelTemplateSpec {
    /// Pod template for kernels; the first container runs the kernel
    #[serde(default)]
    pub template: PodTemplateSpec,
}
