//! Per-kind plumbing for the generic reconciler
//!
//! Each submodule implements [`ManagedResource`](crate::reconciler::ManagedResource)
//! for one Jupyter kind: where to read it, what it references, and which
//! generator turns it into children.

mod gateway;
mod kernel;
mod kernel_spec;
mod kernel_template;
mod notebook;
