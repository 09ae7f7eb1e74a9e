//! Error types for the Jupyter operator
//!
//! Errors carry enough context (resource kind, namespace, name) to be useful
//! in controller logs. The variants map one-to-one onto how the reconciler
//! handles them:
//!
//! - `Validation` / `AmbiguousReference` - terminal until the spec is edited
//! - `NotFound` - a referenced object does not exist yet, retried on a fixed delay
//! - `Conflict` - optimistic-concurrency collision, the whole reconcile is retried
//! - `Kube` - transport or API failure, retried with exponential backoff

use thiserror::Error;

/// Main error type for Jupyter operator operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// The spec is structurally invalid
    #[error("validation error for {resource}: {message}")]
    Validation {
        /// Name of the resource with invalid configuration
        resource: String,
        /// Description of what's invalid
        message: String,
    },

    /// A referenced object does not exist (yet)
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        /// Kind of the referenced object
        kind: String,
        /// Namespace the lookup was made in
        namespace: String,
        /// Name of the referenced object
        name: String,
    },

    /// A reference is structurally invalid and can never resolve
    #[error("ambiguous {kind} reference: {message}")]
    AmbiguousReference {
        /// Kind the reference was expected to point at
        kind: String,
        /// Description of what's wrong with the reference
        message: String,
    },

    /// Write rejected because the object changed since it was read
    #[error("conflict writing {kind} {name}: {message}")]
    Conflict {
        /// Kind of the object being written
        kind: String,
        /// Name of the object being written
        name: String,
        /// Message returned by the API server
        message: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
    },

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Context where the error occurred (e.g., "reconciler", "owner")
        context: String,
    },
}

impl Error {
    /// Create a validation error for a named resource
    pub fn validation_for(resource: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            resource: resource.into(),
            message: msg.into(),
        }
    }

    /// Create a not-found error for a referenced object
    pub fn not_found(
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Create an ambiguous reference error
    pub fn ambiguous_reference(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::AmbiguousReference {
            kind: kind.into(),
            message: msg.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(
        kind: impl Into<String>,
        name: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            kind: kind.into(),
            name: name.into(),
            message: msg.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
        }
    }

    /// Create an internal error with context
    pub fn internal_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Convert a kube error raised while writing `kind/name`.
    ///
    /// HTTP 409 becomes [`Error::Conflict`]; everything else stays a
    /// [`Error::Kube`].
    pub fn from_write(kind: &str, name: &str, source: kube::Error) -> Self {
        match source {
            kube::Error::Api(ref ae) if ae.code == 409 => {
                Self::conflict(kind, name, ae.message.clone())
            }
            other => Self::Kube { source: other },
        }
    }

    /// Check if this error may succeed if the same call is simply repeated.
    ///
    /// Only connection-level failures (including timeouts) and 5xx/429
    /// responses qualify. Decode and request-building errors repeat
    /// identically. Conflicts need a re-read and regenerate instead.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube { source } => match source {
                kube::Error::Api(ae) => ae.code == 429 || ae.code >= 500,
                kube::Error::HyperError(_)
                | kube::Error::Service(_)
                | kube::Error::ReadEvents(_) => true,
                _ => false,
            },
            Error::Validation { .. } => false,
            Error::NotFound { .. } => false,
            Error::AmbiguousReference { .. } => false,
            Error::Conflict { .. } => false,
            Error::Serialization { .. } => false,
            Error::Internal { .. } => false,
        }
    }

    /// Check if this error can only be fixed by editing the spec
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Error::Validation { .. } | Error::AmbiguousReference { .. }
        )
    }

    /// Short machine-readable reason, used for conditions and events
    pub fn reason(&self) -> &'static str {
        match self {
            Error::Kube { .. } => "ApiError",
            Error::Validation { .. } => "ValidationFailed",
            Error::NotFound { .. } => "ReferenceNotFound",
            Error::AmbiguousReference { .. } => "AmbiguousReference",
            Error::Conflict { .. } => "Conflict",
            Error::Serialization { .. } => "SerializationFailed",
            Error::Internal { .. } => "InternalError",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::serialization(e.to_string())
    }
}
