//! JupyterGateway CRD types
//!
//! A gateway runs Jupyter Enterprise Gateway so that notebooks can launch
//! kernels remotely. It is reachable at `http://<name>.<namespace>:8888`.

use k8s_openapi::api::core::v1::{PodTemplateSpec, ResourceRequirements};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::JupyterResourceStatus;

/// Port every gateway listens on
pub const GATEWAY_PORT: u16 = 8888;

/// Remote kernel gateway
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "kubeflow.tkestack.io",
    version = "v1alpha1",
    kind = "JupyterGateway",
    plural = "jupytergateways",
    shortname = "jgw",
    namespaced,
    status = "JupyterResourceStatus",
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct JupyterGatewaySpec {
    /// Pod template for the gateway's own workload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PodTemplateSpec>,

    /// Gateway image, takes precedence over the template image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Names of the JupyterKernelSpecs this gateway serves
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kernels: Vec<String>,

    /// Kernel started when a client does not ask for one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_kernel: Option<String>,

    /// Seconds a kernel may stay idle before it is culled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cull_idle_timeout: Option<u32>,

    /// Seconds between idle-kernel checks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cull_interval: Option<u32>,

    /// Gateway log level (DEBUG, INFO, WARN, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Service account the gateway runs as (needs rights to create kernels)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,

    /// Resource requirements for the gateway container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}
