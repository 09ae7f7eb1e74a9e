//! JupyterKernelSpec CRD types
//!
//! A kernel spec layers overrides on top of a `JupyterKernelTemplate` and is
//! published to gateways as a Jupyter `kernel.json`.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ResourceRequirements;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{JupyterResourceStatus, ResourceRef};

/// Process proxy used when the spec does not name one
pub const DEFAULT_PROCESS_PROXY_CLASS: &str =
    "enterprise_gateway.services.processproxies.k8s.KubernetesProcessProxy";

/// Kernel language used when the spec does not name one
pub const DEFAULT_KERNEL_LANGUAGE: &str = "python";

/// Jupyter kernel specification
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "kubeflow.tkestack.io",
    version = "v1alpha1",
    kind = "JupyterKernelSpec",
    plural = "jupyterkernelspecs",
    shortname = "jks",
    namespaced,
    status = "JupyterResourceStatus",
    printcolumn = r#"{"name":"Language","type":"string","jsonPath":".spec.language"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct JupyterKernelSpecSpec {
    /// The JupyterKernelTemplate this spec builds on
    pub template: ResourceRef,

    /// Kernel image, overrides the template image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Resource requirements, override the template container's
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,

    /// Kernel language (defaults to python)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Name shown in the notebook UI (defaults to the object name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Kernel command line (`argv` in kernel.json)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,

    /// Environment variables for the kernel
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Enterprise gateway process-proxy class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

impl JupyterKernelSpecSpec {
    /// Language with default fallback
    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_KERNEL_LANGUAGE)
    }

    /// Process-proxy class with default fallback
    pub fn class_name(&self) -> &str {
        self.class_name
            .as_deref()
            .unwrap_or(DEFAULT_PROCESS_PROXY_CLASS)
    }
}
