//! Generated child objects and drift detection
//!
//! The API server defaults many fields the generators never set (probes,
//! termination paths, cluster IPs, ...). Comparing whole objects would
//! therefore always report drift, so [`ChildResource::differs_from`] only
//! looks at the fields the generators own.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Container, PodTemplateSpec, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};

/// Kind of a generated child
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChildKind {
    /// apps/v1 Deployment
    Deployment,
    /// v1 Service
    Service,
    /// v1 ConfigMap
    ConfigMap,
}

impl ChildKind {
    /// Kubernetes kind name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deployment => "Deployment",
            Self::Service => "Service",
            Self::ConfigMap => "ConfigMap",
        }
    }
}

impl std::fmt::Display for ChildKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One object generated for a parent resource
#[derive(Clone, Debug, PartialEq)]
pub enum ChildResource {
    /// Workload
    Deployment(Deployment),
    /// Network endpoint
    Service(Service),
    /// Published configuration
    ConfigMap(ConfigMap),
}

impl From<Deployment> for ChildResource {
    fn from(d: Deployment) -> Self {
        Self::Deployment(d)
    }
}

impl From<Service> for ChildResource {
    fn from(s: Service) -> Self {
        Self::Service(s)
    }
}

impl From<ConfigMap> for ChildResource {
    fn from(c: ConfigMap) -> Self {
        Self::ConfigMap(c)
    }
}

impl ChildResource {
    /// Kind of this child
    pub fn kind(&self) -> ChildKind {
        match self {
            Self::Deployment(_) => ChildKind::Deployment,
            Self::Service(_) => ChildKind::Service,
            Self::ConfigMap(_) => ChildKind::ConfigMap,
        }
    }

    /// Object metadata
    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Self::Deployment(d) => &d.metadata,
            Self::Service(s) => &s.metadata,
            Self::ConfigMap(c) => &c.metadata,
        }
    }

    /// Mutable object metadata
    pub fn metadata_mut(&mut self) -> &mut ObjectMeta {
        match self {
            Self::Deployment(d) => &mut d.metadata,
            Self::Service(s) => &mut s.metadata,
            Self::ConfigMap(c) => &mut c.metadata,
        }
    }

    /// Object name, empty if unset
    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    /// Object namespace, empty if unset
    pub fn namespace(&self) -> &str {
        self.metadata().namespace.as_deref().unwrap_or_default()
    }

    /// Make `owner` the only owner of this child
    pub fn with_owner(mut self, owner: OwnerReference) -> Self {
        self.metadata_mut().owner_references = Some(vec![owner]);
        self
    }

    /// Whether the live object has drifted from this desired object
    pub fn differs_from(&self, live: &ChildResource) -> bool {
        if !owners_match(self.metadata(), live.metadata())
            || !labels_contained(self.metadata(), live.metadata())
        {
            return true;
        }
        match (self, live) {
            (Self::Deployment(desired), Self::Deployment(live)) => {
                deployment_differs(desired, live)
            }
            (Self::Service(desired), Self::Service(live)) => service_differs(desired, live),
            (Self::ConfigMap(desired), Self::ConfigMap(live)) => desired.data != live.data,
            _ => true,
        }
    }

    /// Overlay the generated fields onto a copy of the live object.
    ///
    /// The result keeps the live `resourceVersion` and any server-populated
    /// fields, so it can be sent as a replace.
    pub fn apply_onto(&self, live: &ChildResource) -> ChildResource {
        let mut merged = match (self, live) {
            (Self::Deployment(desired), Self::Deployment(live)) => {
                let mut out = live.clone();
                let spec = out.spec.get_or_insert_with(Default::default);
                if let Some(want) = &desired.spec {
                    spec.replicas = want.replicas;
                    spec.template = want.template.clone();
                }
                Self::Deployment(out)
            }
            (Self::Service(desired), Self::Service(live)) => {
                let mut out = live.clone();
                let spec = out.spec.get_or_insert_with(Default::default);
                if let Some(want) = &desired.spec {
                    spec.selector = want.selector.clone();
                    spec.ports = want.ports.clone();
                }
                Self::Service(out)
            }
            (Self::ConfigMap(desired), Self::ConfigMap(live)) => {
                let mut out = live.clone();
                out.data = desired.data.clone();
                Self::ConfigMap(out)
            }
            _ => {
                let mut out = self.clone();
                out.metadata_mut().resource_version = live.metadata().resource_version.clone();
                return out;
            }
        };

        let desired = self.metadata();
        let meta = merged.metadata_mut();
        if let Some(labels) = &desired.labels {
            meta.labels
                .get_or_insert_with(BTreeMap::new)
                .extend(labels.clone());
        }
        if desired.owner_references.is_some() {
            meta.owner_references = desired.owner_references.clone();
        }
        merged
    }
}

fn owners_match(desired: &ObjectMeta, live: &ObjectMeta) -> bool {
    let live_uids: Vec<&str> = live
        .owner_references
        .iter()
        .flatten()
        .map(|o| o.uid.as_str())
        .collect();
    desired
        .owner_references
        .iter()
        .flatten()
        .all(|o| live_uids.contains(&o.uid.as_str()))
}

fn labels_contained(desired: &ObjectMeta, live: &ObjectMeta) -> bool {
    let empty = BTreeMap::new();
    let live = live.labels.as_ref().unwrap_or(&empty);
    desired
        .labels
        .iter()
        .flatten()
        .all(|(k, v)| live.get(k) == Some(v))
}

fn deployment_differs(desired: &Deployment, live: &Deployment) -> bool {
    let (Some(want), Some(have)) = (&desired.spec, &live.spec) else {
        return desired.spec.is_some();
    };
    want.replicas.unwrap_or(1) != have.replicas.unwrap_or(1)
        || template_differs(&want.template, &have.template)
}

fn template_differs(want: &PodTemplateSpec, have: &PodTemplateSpec) -> bool {
    if pod_labels(want) != pod_labels(have) || pod_annotations(want) != pod_annotations(have) {
        return true;
    }

    let empty = Vec::new();
    let want_containers = want.spec.as_ref().map_or(&empty, |s| &s.containers);
    let have_containers = have.spec.as_ref().map_or(&empty, |s| &s.containers);
    want_containers.len() != have_containers.len()
        || want_containers
            .iter()
            .zip(have_containers)
            .any(|(w, h)| container_differs(w, h))
}

fn pod_labels(t: &PodTemplateSpec) -> BTreeMap<String, String> {
    t.metadata
        .as_ref()
        .and_then(|m| m.labels.clone())
        .unwrap_or_default()
}

fn pod_annotations(t: &PodTemplateSpec) -> BTreeMap<String, String> {
    t.metadata
        .as_ref()
        .and_then(|m| m.annotations.clone())
        .unwrap_or_default()
}

fn container_differs(want: &Container, have: &Container) -> bool {
    fn list<T: Clone>(v: &Option<Vec<T>>) -> Vec<T> {
        v.clone().unwrap_or_default()
    }
    // The API server drops empty env values on write.
    let env = |c: &Container| -> Vec<(String, Option<String>)> {
        list(&c.env)
            .into_iter()
            .map(|e| (e.name, e.value.filter(|v| !v.is_empty())))
            .collect()
    };
    let mounts = |c: &Container| -> Vec<(String, String, bool)> {
        list(&c.volume_mounts)
            .into_iter()
            .map(|m| (m.name, m.mount_path, m.read_only.unwrap_or(false)))
            .collect()
    };

    want.name != have.name
        || want.image != have.image
        || list(&want.args) != list(&have.args)
        || list(&want.command) != list(&have.command)
        || env(want) != env(have)
        || mounts(want) != mounts(have)
}

fn service_differs(desired: &Service, live: &Service) -> bool {
    let (Some(want), Some(have)) = (&desired.spec, &live.spec) else {
        return desired.spec.is_some();
    };
    let ports = |s: &k8s_openapi::api::core::v1::ServiceSpec| {
        s.ports
            .iter()
            .flatten()
            .map(|p| (p.name.clone(), p.port, p.target_port.clone()))
            .collect::<Vec<_>>()
    };
    want.selector.clone().unwrap_or_default() != have.selector.clone().unwrap_or_default()
        || ports(want) != ports(have)
}
