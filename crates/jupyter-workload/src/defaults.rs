//! Default images and well-known names used by the generators

/// Image for notebooks that delegate kernels to a gateway
pub const DEFAULT_NOTEBOOK_IMAGE: &str = "jupyter/base-notebook:python-3.9.7";

/// Jupyter Enterprise Gateway image
pub const DEFAULT_GATEWAY_IMAGE: &str = "elyra/enterprise-gateway:2.5.0";

/// Images the generators fall back to when a spec does not pick one.
///
/// Kept as a value rather than constants so operators can point a cluster at
/// a mirror registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkloadDefaults {
    /// Gateway-capable notebook image
    pub notebook_image: String,
    /// Enterprise gateway image
    pub gateway_image: String,
}

impl Default for WorkloadDefaults {
    fn default() -> Self {
        Self {
            notebook_image: DEFAULT_NOTEBOOK_IMAGE.to_string(),
            gateway_image: DEFAULT_GATEWAY_IMAGE.to_string(),
        }
    }
}
