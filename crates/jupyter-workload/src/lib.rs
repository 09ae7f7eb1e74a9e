//! Workload generation for the Jupyter operator
//!
//! Each generator is a pure function from a resolved Jupyter resource (plus
//! the resources it references) to the Kubernetes objects that realize it.
//! Generators never talk to the API server and never set owner references;
//! the controller does both.

pub mod children;
pub mod defaults;
pub mod error;
pub mod gateway;
pub mod kernel;
pub mod kernel_spec;
pub mod notebook;
mod template;

pub use children::{ChildKind, ChildResource};
pub use defaults::WorkloadDefaults;
pub use error::GenerateError;
pub use gateway::{generate_gateway, GatewayWorkload};
pub use kernel::generate_kernel;
pub use kernel_spec::{generate_kernel_spec, kernel_spec_config_map_name, validate_kernel_template};
pub use notebook::{generate_notebook, NotebookGenerator};
