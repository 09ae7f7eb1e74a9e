//! Pod template helpers shared by the generators

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{Container, EnvVar, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use jupyter_common::{LABEL_MANAGED_BY, LABEL_MANAGED_BY_VALUE};

use crate::error::GenerateError;

/// Name and namespace of the source object
pub(crate) struct Identity<'a> {
    pub name: &'a str,
    pub namespace: &'a str,
}

/// Extract name and namespace, both of which every generator needs
pub(crate) fn identity<'a>(
    meta: &'a ObjectMeta,
    kind: &'static str,
) -> Result<Identity<'a>, GenerateError> {
    let name = meta
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .ok_or(GenerateError::MissingMetadata {
            kind,
            field: "name",
        })?;
    let namespace = meta
        .namespace
        .as_deref()
        .filter(|n| !n.is_empty())
        .ok_or(GenerateError::MissingMetadata {
            kind,
            field: "namespace",
        })?;
    Ok(Identity { name, namespace })
}

/// Copy `overrides` into `base`; later writes win
pub(crate) fn merge_map(
    base: Option<&BTreeMap<String, String>>,
    overrides: impl IntoIterator<Item = (String, String)>,
) -> BTreeMap<String, String> {
    let mut merged = base.cloned().unwrap_or_default();
    merged.extend(overrides);
    merged
}

/// First container of a template, or `NoContainers`
pub(crate) fn first_container_mut<'a>(
    template: &'a mut PodTemplateSpec,
    kind: &'static str,
    name: &str,
) -> Result<&'a mut Container, GenerateError> {
    template
        .spec
        .as_mut()
        .and_then(|spec| spec.containers.first_mut())
        .ok_or_else(|| GenerateError::NoContainers {
            kind,
            name: name.to_string(),
        })
}

/// Check that a template has at least one container
pub(crate) fn ensure_containers(
    template: &PodTemplateSpec,
    kind: &'static str,
    name: &str,
) -> Result<(), GenerateError> {
    let has_containers = template
        .spec
        .as_ref()
        .map(|spec| !spec.containers.is_empty())
        .unwrap_or(false);
    if has_containers {
        Ok(())
    } else {
        Err(GenerateError::NoContainers {
            kind,
            name: name.to_string(),
        })
    }
}

/// Set or replace environment variables on a container, keeping order
pub(crate) fn upsert_env(container: &mut Container, vars: Vec<(String, String)>) {
    let env = container.env.get_or_insert_with(Vec::new);
    for (name, value) in vars {
        let var = EnvVar {
            name: name.clone(),
            value: Some(value),
            ..Default::default()
        };
        match env.iter_mut().find(|e| e.name == name) {
            Some(existing) => *existing = var,
            None => env.push(var),
        }
    }
}

/// Wrap a pod template into a single-replica Deployment.
///
/// `selector` must be a subset of the template labels.
pub(crate) fn single_replica_deployment(
    id: &Identity<'_>,
    selector: BTreeMap<String, String>,
    template: PodTemplateSpec,
) -> Deployment {
    let mut labels = template
        .metadata
        .as_ref()
        .and_then(|m| m.labels.clone())
        .unwrap_or_default();
    labels.insert(
        LABEL_MANAGED_BY.to_string(),
        LABEL_MANAGED_BY_VALUE.to_string(),
    );

    Deployment {
        metadata: ObjectMeta {
            name: Some(id.name.to_string()),
            namespace: Some(id.namespace.to_string()),
            labels: Some(labels),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(selector),
                ..Default::default()
            },
            template,
            ..Default::default()
        }),
        status: None,
    }
}

/// Pod template metadata with the given labels and annotations.
///
/// Empty annotation maps are dropped so the result compares equal to what
/// the API server hands back.
pub(crate) fn template_metadata(
    labels: BTreeMap<String, String>,
    annotations: BTreeMap<String, String>,
) -> ObjectMeta {
    ObjectMeta {
        labels: Some(labels),
        annotations: if annotations.is_empty() {
            None
        } else {
            Some(annotations)
        },
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::PodSpec;

    #[test]
    fn merge_map_later_writes_win() {
        let base = BTreeMap::from([
            ("app".to_string(), "notebook".to_string()),
            ("notebook".to_string(), "stale".to_string()),
        ]);
        let merged = merge_map(
            Some(&base),
            [("notebook".to_string(), "fresh".to_string())],
        );
        assert_eq!(merged["app"], "notebook");
        assert_eq!(merged["notebook"], "fresh");
    }

    #[test]
    fn upsert_env_replaces_existing_values() {
        let mut container = Container {
            name: "kernel".to_string(),
            env: Some(vec![EnvVar {
                name: "KERNEL_ID".to_string(),
                value: Some("old".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        };
        upsert_env(
            &mut container,
            vec![
                ("KERNEL_ID".to_string(), "new".to_string()),
                ("KERNEL_LANGUAGE".to_string(), "python".to_string()),
            ],
        );
        let env = container.env.unwrap();
        assert_eq!(env.len(), 2);
        assert_eq!(env[0].value.as_deref(), Some("new"));
        assert_eq!(env[1].name, "KERNEL_LANGUAGE");
    }

    #[test]
    fn empty_template_has_no_containers() {
        let template = PodTemplateSpec {
            metadata: None,
            spec: Some(PodSpec::default()),
        };
        assert_eq!(
            ensure_containers(&template, "JupyterKernelTemplate", "base"),
            Err(GenerateError::NoContainers {
                kind: "JupyterKernelTemplate",
                name: "base".to_string()
            })
        );
    }

    #[test]
    fn missing_namespace_is_reported() {
        let meta = ObjectMeta {
            name: Some("nb".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            identity(&meta, "JupyterNotebook"),
            Err(GenerateError::MissingMetadata {
                field: "namespace",
                ..
            })
        ));
    }
}
