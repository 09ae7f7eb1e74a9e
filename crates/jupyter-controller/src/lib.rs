//! Reconciliation for the Jupyter CRDs
//!
//! One generic [`Reconciler`] drives every kind toward the state its
//! generator describes. Kinds plug in through [`ManagedResource`]; storage
//! sits behind the traits in [`store`] so the loop can be exercised without
//! an API server.

#![deny(missing_docs)]

pub mod context;
mod kinds;
pub mod kube_store;
pub mod owner;
pub mod reconciler;
pub mod resolver;
pub mod status;
pub mod store;

#[cfg(test)]
mod testing;

pub use context::{Context, ContextBuilder, ControllerConfig};
pub use reconciler::{error_policy, reconcile, ManagedResource, Reconciler};
pub use store::{JupyterKind, ObjectKey};
