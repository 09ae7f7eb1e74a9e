//! Shared types used across the Jupyter CRDs

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Canonical condition type reported on every managed resource
pub const CONDITION_READY: &str = "Ready";

/// Condition type reporting whether cross-references resolved
pub const CONDITION_REFERENCE_RESOLVED: &str = "ReferenceResolved";

// =============================================================================
// Phase
// =============================================================================

/// Lifecycle phase of a managed Jupyter resource
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum ResourcePhase {
    /// No generated child exists yet, or a reference is still missing
    #[default]
    Pending,
    /// Generated children are being created
    Creating,
    /// Generated children exist and match the desired state
    Ready,
    /// Drift was detected and children are being updated
    Updating,
    /// The spec is invalid; nothing will happen until it is edited
    Error,
}

impl std::fmt::Display for ResourcePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Creating => write!(f, "Creating"),
            Self::Ready => write!(f, "Ready"),
            Self::Updating => write!(f, "Updating"),
            Self::Error => write!(f, "Error"),
        }
    }
}

// =============================================================================
// Conditions
// =============================================================================

/// Condition status following Kubernetes conventions
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionStatus {
    /// Condition is true
    True,
    /// Condition is false
    False,
    /// Condition status is unknown
    #[default]
    Unknown,
}

impl std::fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::True => write!(f, "True"),
            Self::False => write!(f, "False"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Kubernetes-style condition for status reporting
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct Condition {
    /// Type of condition (e.g., Ready, ReferenceResolved)
    #[serde(rename = "type")]
    pub type_: String,

    /// Status of the condition (True, False, Unknown)
    pub status: ConditionStatus,

    /// Machine-readable reason for the condition
    pub reason: String,

    /// Human-readable message
    pub message: String,

    /// Last time the condition transitioned
    #[serde(rename = "lastTransitionTime")]
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    /// Create a new condition with the current timestamp
    pub fn new(
        type_: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            type_: type_.into(),
            status,
            reason: reason.into(),
            message: message.into(),
            last_transition_time: Utc::now(),
        }
    }

    /// True when both conditions say the same thing, ignoring timestamps
    pub fn same_state(&self, other: &Condition) -> bool {
        self.type_ == other.type_
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }
}

// =============================================================================
// Status
// =============================================================================

/// Observed state shared by every Jupyter resource
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JupyterResourceStatus {
    /// Current phase
    #[serde(default)]
    pub phase: ResourcePhase,

    /// Human-readable message describing the phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Generation of the spec last acted upon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Conditions, at most one per type
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl JupyterResourceStatus {
    /// Look up a condition by type
    pub fn condition(&self, type_: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.type_ == type_)
    }

    /// Insert or overwrite the condition of the same type.
    ///
    /// The existing `lastTransitionTime` is kept when the condition status
    /// does not change.
    pub fn set_condition(&mut self, mut condition: Condition) {
        match self
            .conditions
            .iter_mut()
            .find(|c| c.type_ == condition.type_)
        {
            Some(existing) => {
                if existing.status == condition.status {
                    condition.last_transition_time = existing.last_transition_time;
                }
                *existing = condition;
            }
            None => self.conditions.push(condition),
        }
    }

    /// True when both statuses say the same thing, ignoring timestamps
    pub fn same_state(&self, other: &JupyterResourceStatus) -> bool {
        self.phase == other.phase
            && self.message == other.message
            && self.observed_generation == other.observed_generation
            && self.conditions.len() == other.conditions.len()
            && self.conditions.iter().all(|c| {
                other
                    .condition(&c.type_)
                    .map(|o| o.same_state(c))
                    .unwrap_or(false)
            })
    }
}

// =============================================================================
// References
// =============================================================================

/// Reference from one Jupyter resource to another
///
/// An empty namespace means "same namespace as the referrer". `kind`, when
/// present, must match the kind the field expects.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    /// Kind of the referenced object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Namespace of the referenced object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Name of the referenced object
    #[serde(default)]
    pub name: String,
}

impl ResourceRef {
    /// Reference an object by name in the referrer's namespace
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            kind: None,
            namespace: None,
            name: name.into(),
        }
    }

    /// Set an explicit namespace
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set an explicit kind
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Namespace to look the reference up in
    pub fn namespace_or<'a>(&'a self, referrer_namespace: &'a str) -> &'a str {
        match self.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => ns,
            _ => referrer_namespace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_condition_overwrites_same_type() {
        let mut status = JupyterResourceStatus::default();
        status.set_condition(Condition::new(
            CONDITION_READY,
            ConditionStatus::False,
            "Pending",
            "waiting",
        ));
        status.set_condition(Condition::new(
            CONDITION_REFERENCE_RESOLVED,
            ConditionStatus::True,
            "Resolved",
            "",
        ));
        status.set_condition(Condition::new(
            CONDITION_READY,
            ConditionStatus::True,
            "Ready",
            "done",
        ));

        assert_eq!(status.conditions.len(), 2);
        let ready = status.condition(CONDITION_READY).unwrap();
        assert_eq!(ready.status, ConditionStatus::True);
        assert_eq!(ready.message, "done");
    }

    #[test]
    fn transition_time_kept_when_status_unchanged() {
        let mut status = JupyterResourceStatus::default();
        let first = Condition::new(CONDITION_READY, ConditionStatus::False, "Pending", "a");
        let first_time = first.last_transition_time;
        status.set_condition(first);

        let mut second = Condition::new(CONDITION_READY, ConditionStatus::False, "Pending", "b");
        second.last_transition_time = first_time + chrono::Duration::seconds(60);
        status.set_condition(second);

        let ready = status.condition(CONDITION_READY).unwrap();
        assert_eq!(ready.last_transition_time, first_time);
        assert_eq!(ready.message, "b");
    }

    #[test]
    fn same_state_ignores_timestamps() {
        let mut a = JupyterResourceStatus {
            phase: ResourcePhase::Ready,
            ..Default::default()
        };
        let mut b = a.clone();
        let mut cond = Condition::new(CONDITION_READY, ConditionStatus::True, "Ready", "");
        a.set_condition(cond.clone());
        cond.last_transition_time = cond.last_transition_time + chrono::Duration::seconds(5);
        b.set_condition(cond);
        assert!(a.same_state(&b));

        b.phase = ResourcePhase::Updating;
        assert!(!a.same_state(&b));
    }

    #[test]
    fn reference_namespace_defaults_to_referrer() {
        let r = ResourceRef::named("gateway");
        assert_eq!(r.namespace_or("team-a"), "team-a");

        let r = r.in_namespace("default");
        assert_eq!(r.namespace_or("team-a"), "default");

        let r = ResourceRef {
            namespace: Some(String::new()),
            ..ResourceRef::named("gateway")
        };
        assert_eq!(r.namespace_or("team-a"), "team-a");
    }

    #[test]
    fn phase_serializes_as_pascal_case() {
        let json = serde_json::to_string(&ResourcePhase::Updating).unwrap();
        assert_eq!(json, "\"Updating\"");
    }
}
