//! Generator error types
//!
//! Every variant describes a spec that can never produce a workload as
//! written; the controller records it as a terminal validation failure.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    #[error("the notebook is null")]
    NullNotebook,

    #[error("no gateway and template applied")]
    NoGatewayOrTemplate,

    #[error("{kind} '{name}' template defines no containers")]
    NoContainers { kind: &'static str, name: String },

    #[error("{kind} is missing metadata.{field}")]
    MissingMetadata {
        kind: &'static str,
        field: &'static str,
    },

    #[error("kernel spec '{name}' has no image: set spec.image or an image on the template container")]
    MissingImage { name: String },

    #[error("failed to encode kernel.json for '{name}': {message}")]
    KernelJson { name: String, message: String },
}
