//! JupyterNotebook CRD types
//!
//! A notebook either runs its own kernels from an inline pod template, or
//! delegates kernel execution to a `JupyterGateway`. Both may be set, in
//! which case the template supplies the container and the gateway supplies
//! the `--gateway-url` argument.

use k8s_openapi::api::core::v1::PodTemplateSpec;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{JupyterResourceStatus, ResourceRef};

/// Authentication settings for the notebook server
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JupyterAuth {
    /// Plaintext password passed to the notebook server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Jupyter notebook server
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "kubeflow.tkestack.io",
    version = "v1alpha1",
    kind = "JupyterNotebook",
    plural = "jupyternotebooks",
    shortname = "jnb",
    namespaced,
    status = "JupyterResourceStatus",
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct JupyterNotebookSpec {
    /// Pod template for the notebook server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PodTemplateSpec>,

    /// Gateway the notebook sends kernel requests to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<ResourceRef>,

    /// Authentication settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<JupyterAuth>,
}

impl JupyterNotebookSpec {
    /// Password from the auth block, if any
    pub fn password(&self) -> Option<&str> {
        self.auth.as_ref().and_then(|a| a.password.as_deref())
    }
}
