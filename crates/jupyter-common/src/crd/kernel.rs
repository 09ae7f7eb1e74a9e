//! JupyterKernel CRD types
//!
//! A kernel is one running instance of a `JupyterKernelSpec`, usually created
//! on behalf of a notebook session.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{JupyterResourceStatus, ResourceRef};

/// Running Jupyter kernel
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "kubeflow.tkestack.io",
    version = "v1alpha1",
    kind = "JupyterKernel",
    plural = "jupyterkernels",
    shortname = "jk",
    namespaced,
    status = "JupyterResourceStatus",
    printcolumn = r#"{"name":"KernelSpec","type":"string","jsonPath":".spec.kernelSpec.name"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct JupyterKernelResourceSpec {
    /// The JupyterKernelSpec this kernel instantiates
    pub kernel_spec: ResourceRef,

    /// Kernel id as known to the gateway (defaults to the object name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel_id: Option<String>,

    /// Seconds the kernel may stay idle before it is culled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout: Option<u32>,

    /// Notebook that owns this kernel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notebook: Option<String>,

    /// Notebook session that owns this kernel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
}
