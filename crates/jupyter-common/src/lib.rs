//! Common types for the elastic Jupyter operator: CRDs, errors, and utilities

#![deny(missing_docs)]

pub mod crd;
pub mod error;
pub mod events;
pub mod retry;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Field manager / reporting component name used for every write
pub const FIELD_MANAGER: &str = "elastic-jupyter-operator";

/// Label key identifying the component that manages a generated resource
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Value of [`LABEL_MANAGED_BY`] on resources this operator generates
pub const LABEL_MANAGED_BY_VALUE: &str = "elastic-jupyter-operator";
