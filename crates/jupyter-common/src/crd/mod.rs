//! Custom Resource Definitions for the Jupyter operator
//!
//! Inheritance chain for kernels: `JupyterKernelTemplate` (base pod template)
//! → `JupyterKernelSpec` (overrides) → `JupyterKernel` (runtime parameters).

mod gateway;
mod kernel;
mod kernel_spec;
mod kernel_template;
mod notebook;
mod types;

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::CustomResourceExt;

pub use gateway::{JupyterGateway, JupyterGatewaySpec, GATEWAY_PORT};
pub use kernel::{JupyterKernel, JupyterKernelResourceSpec};
pub use kernel_spec::{
    JupyterKernelSpec, JupyterKernelSpecSpec, DEFAULT_KERNEL_LANGUAGE,
    DEFAULT_PROCESS_PROXY_CLASS,
};
pub use kernel_template::{JupyterKernelTemplate, JupyterKernelTemplateSpec};
pub use notebook::{JupyterAuth, JupyterNotebook, JupyterNotebookSpec};
pub use types::{
    Condition, ConditionStatus, JupyterResourceStatus, ResourcePhase, ResourceRef,
    CONDITION_READY, CONDITION_REFERENCE_RESOLVED,
};

/// API group of every Jupyter CRD
pub const API_GROUP: &str = "kubeflow.tkestack.io";

/// All CRDs served by the operator, in dependency order (referenced kinds first)
pub fn all_crds() -> Vec<CustomResourceDefinition> {
    vec![
        JupyterKernelTemplate::crd(),
        JupyterKernelSpec::crd(),
        JupyterGateway::crd(),
        JupyterNotebook::crd(),
        JupyterKernel::crd(),
    ]
}
