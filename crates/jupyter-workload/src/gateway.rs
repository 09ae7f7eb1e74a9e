//! Gateway workload generation
//!
//! A gateway becomes a Deployment running Jupyter Enterprise Gateway plus a
//! ClusterIP Service exposing it on port 8888. Every kernel the gateway
//! serves is mounted from the ConfigMap its JupyterKernelSpec publishes.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, Container, ContainerPort, PodSpec, PodTemplateSpec, Service,
    ServicePort, ServiceSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use jupyter_common::crd::{JupyterGateway, GATEWAY_PORT};
use jupyter_common::{LABEL_MANAGED_BY, LABEL_MANAGED_BY_VALUE};

use crate::defaults::WorkloadDefaults;
use crate::error::GenerateError;
use crate::kernel_spec::kernel_spec_config_map_name;
use crate::template::{
    first_container_mut, identity, merge_map, single_replica_deployment, template_metadata,
    upsert_env,
};

const KIND: &str = "JupyterGateway";

/// Name of the gateway container
pub const GATEWAY_CONTAINER_NAME: &str = "gateway";

/// Label injected into every gateway pod
pub const LABEL_GATEWAY: &str = "gateway";

/// Command used when the template does not set one
pub const GATEWAY_COMMAND: [&str; 2] = ["jupyter", "enterprisegateway"];

/// Directory kernel specs are mounted under
pub const KERNELS_DIR: &str = "/usr/local/share/jupyter/kernels";

/// Desired children of one gateway
#[derive(Clone, Debug, PartialEq)]
pub struct GatewayWorkload {
    /// Enterprise gateway Deployment
    pub deployment: Deployment,
    /// Service in front of the Deployment
    pub service: Service,
}

/// Generate the Deployment and Service for a gateway
pub fn generate_gateway(
    gateway: &JupyterGateway,
    defaults: &WorkloadDefaults,
) -> Result<GatewayWorkload, GenerateError> {
    let id = identity(&gateway.metadata, KIND)?;
    let spec = &gateway.spec;

    let mut template = spec.template.clone().unwrap_or_else(|| PodTemplateSpec {
        metadata: None,
        spec: Some(PodSpec {
            containers: vec![Container {
                name: GATEWAY_CONTAINER_NAME.to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }),
    });

    let labels = merge_map(
        template.metadata.as_ref().and_then(|m| m.labels.as_ref()),
        [(LABEL_GATEWAY.to_string(), id.name.to_string())],
    );
    let annotations = template
        .metadata
        .as_ref()
        .and_then(|m| m.annotations.clone())
        .unwrap_or_default();

    let container = first_container_mut(&mut template, KIND, id.name)?;
    let template_image = container.image.clone().filter(|i| !i.is_empty());
    container.image = Some(
        spec.image
            .clone()
            .filter(|i| !i.is_empty())
            .or(template_image)
            .unwrap_or_else(|| defaults.gateway_image.clone()),
    );
    if container.command.as_ref().map_or(true, Vec::is_empty) {
        container.command = Some(GATEWAY_COMMAND.iter().map(|s| s.to_string()).collect());
    }
    container
        .args
        .get_or_insert_with(Vec::new)
        .extend(gateway_args(gateway));
    upsert_env(
        container,
        vec![("EG_NAMESPACE".to_string(), id.namespace.to_string())],
    );
    if spec.resources.is_some() {
        container.resources = spec.resources.clone();
    }
    let ports = container.ports.get_or_insert_with(Vec::new);
    if !ports.iter().any(|p| p.container_port == i32::from(GATEWAY_PORT)) {
        ports.push(ContainerPort {
            name: Some("http".to_string()),
            container_port: i32::from(GATEWAY_PORT),
            ..Default::default()
        });
    }
    if !spec.kernels.is_empty() {
        let mounts = container.volume_mounts.get_or_insert_with(Vec::new);
        for kernel in &spec.kernels {
            mounts.push(VolumeMount {
                name: kernel_spec_config_map_name(kernel),
                mount_path: format!("{KERNELS_DIR}/{kernel}"),
                read_only: Some(true),
                ..Default::default()
            });
        }
    }

    if let Some(pod) = template.spec.as_mut() {
        if spec.service_account_name.is_some() {
            pod.service_account_name = spec.service_account_name.clone();
        }
        if !spec.kernels.is_empty() {
            let volumes = pod.volumes.get_or_insert_with(Vec::new);
            for kernel in &spec.kernels {
                volumes.push(Volume {
                    name: kernel_spec_config_map_name(kernel),
                    config_map: Some(ConfigMapVolumeSource {
                        name: kernel_spec_config_map_name(kernel),
                        ..Default::default()
                    }),
                    ..Default::default()
                });
            }
        }
    }

    template.metadata = Some(template_metadata(labels, annotations));

    let selector = BTreeMap::from([(LABEL_GATEWAY.to_string(), id.name.to_string())]);
    let deployment = single_replica_deployment(&id, selector.clone(), template);

    let service = Service {
        metadata: ObjectMeta {
            name: Some(id.name.to_string()),
            namespace: Some(id.namespace.to_string()),
            labels: Some(BTreeMap::from([
                (LABEL_GATEWAY.to_string(), id.name.to_string()),
                (
                    LABEL_MANAGED_BY.to_string(),
                    LABEL_MANAGED_BY_VALUE.to_string(),
                ),
            ])),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(selector),
            ports: Some(vec![ServicePort {
                name: Some("http".to_string()),
                port: i32::from(GATEWAY_PORT),
                target_port: Some(IntOrString::Int(i32::from(GATEWAY_PORT))),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        status: None,
    };

    Ok(GatewayWorkload {
        deployment,
        service,
    })
}

/// Enterprise gateway command-line arguments
fn gateway_args(gateway: &JupyterGateway) -> Vec<String> {
    let spec = &gateway.spec;
    let mut args = vec![
        "--EnterpriseGatewayApp.ip=0.0.0.0".to_string(),
        format!("--EnterpriseGatewayApp.port={GATEWAY_PORT}"),
    ];
    if !spec.kernels.is_empty() {
        let quoted: Vec<String> = spec.kernels.iter().map(|k| format!("'{k}'")).collect();
        args.push(format!(
            "--KernelSpecManager.whitelist=[{}]",
            quoted.join(",")
        ));
    }
    if let Some(kernel) = spec.default_kernel.as_deref().filter(|k| !k.is_empty()) {
        args.push(format!("--MappingKernelManager.default_kernel_name={kernel}"));
    }
    if let Some(timeout) = spec.cull_idle_timeout {
        args.push(format!("--MappingKernelManager.cull_idle_timeout={timeout}"));
    }
    if let Some(interval) = spec.cull_interval {
        args.push(format!("--MappingKernelManager.cull_interval={interval}"));
    }
    if let Some(level) = spec.log_level.as_deref().filter(|l| !l.is_empty()) {
        args.push(format!("--log-level={level}"));
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use jupyter_common::crd::JupyterGatewaySpec;

    fn gateway(spec: JupyterGatewaySpec) -> JupyterGateway {
        let mut gw = JupyterGateway::new("gateway", spec);
        gw.metadata.namespace = Some("default".to_string());
        gw
    }

    fn container(w: &GatewayWorkload) -> &Container {
        &w.deployment
            .spec
            .as_ref()
            .unwrap()
            .template
            .spec
            .as_ref()
            .unwrap()
            .containers[0]
    }

    #[test]
    fn minimal_gateway_uses_defaults() {
        let w = generate_gateway(
            &gateway(JupyterGatewaySpec::default()),
            &WorkloadDefaults::default(),
        )
        .unwrap();

        let c = container(&w);
        assert_eq!(c.name, GATEWAY_CONTAINER_NAME);
        assert_eq!(
            c.image.as_deref(),
            Some(crate::defaults::DEFAULT_GATEWAY_IMAGE)
        );
        assert_eq!(
            c.command.clone().unwrap(),
            vec!["jupyter".to_string(), "enterprisegateway".to_string()]
        );
        assert_eq!(
            c.args.clone().unwrap(),
            vec![
                "--EnterpriseGatewayApp.ip=0.0.0.0".to_string(),
                "--EnterpriseGatewayApp.port=8888".to_string(),
            ]
        );
        let env = c.env.clone().unwrap();
        assert_eq!(env[0].name, "EG_NAMESPACE");
        assert_eq!(env[0].value.as_deref(), Some("default"));
    }

    #[test]
    fn service_selects_gateway_pods_on_8888() {
        let w = generate_gateway(
            &gateway(JupyterGatewaySpec::default()),
            &WorkloadDefaults::default(),
        )
        .unwrap();

        assert_eq!(w.service.metadata.name.as_deref(), Some("gateway"));
        let spec = w.service.spec.as_ref().unwrap();
        assert_eq!(spec.selector.as_ref().unwrap()[LABEL_GATEWAY], "gateway");
        let port = &spec.ports.as_ref().unwrap()[0];
        assert_eq!(port.port, 8888);
        assert_eq!(port.target_port, Some(IntOrString::Int(8888)));

        let pod_labels = w
            .deployment
            .spec
            .as_ref()
            .unwrap()
            .template
            .metadata
            .as_ref()
            .unwrap()
            .labels
            .clone()
            .unwrap();
        assert_eq!(pod_labels[LABEL_GATEWAY], "gateway");
    }

    #[test]
    fn kernels_are_whitelisted_and_mounted() {
        let w = generate_gateway(
            &gateway(JupyterGatewaySpec {
                kernels: vec!["python".to_string(), "r".to_string()],
                default_kernel: Some("python".to_string()),
                cull_idle_timeout: Some(3600),
                cull_interval: Some(60),
                log_level: Some("DEBUG".to_string()),
                ..Default::default()
            }),
            &WorkloadDefaults::default(),
        )
        .unwrap();

        let c = container(&w);
        let args = c.args.clone().unwrap();
        assert!(args.contains(&"--KernelSpecManager.whitelist=['python','r']".to_string()));
        assert!(args.contains(&"--MappingKernelManager.default_kernel_name=python".to_string()));
        assert!(args.contains(&"--MappingKernelManager.cull_idle_timeout=3600".to_string()));
        assert!(args.contains(&"--MappingKernelManager.cull_interval=60".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("--log-level=DEBUG"));

        let mounts = c.volume_mounts.clone().unwrap();
        assert_eq!(mounts.len(), 2);
        assert_eq!(mounts[0].name, "kernelspec-python");
        assert_eq!(mounts[0].mount_path, "/usr/local/share/jupyter/kernels/python");

        let volumes = w
            .deployment
            .spec
            .as_ref()
            .unwrap()
            .template
            .spec
            .as_ref()
            .unwrap()
            .volumes
            .clone()
            .unwrap();
        assert_eq!(
            volumes[1].config_map.as_ref().unwrap().name,
            "kernelspec-r".to_string()
        );
    }

    #[test]
    fn spec_image_beats_template_image() {
        let template = PodTemplateSpec {
            metadata: None,
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: "eg".to_string(),
                    image: Some("template/eg:1".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            }),
        };

        let mut spec = JupyterGatewaySpec {
            template: Some(template),
            ..Default::default()
        };
        let w = generate_gateway(&gateway(spec.clone()), &WorkloadDefaults::default()).unwrap();
        assert_eq!(container(&w).image.as_deref(), Some("template/eg:1"));
        assert_eq!(container(&w).name, "eg");

        spec.image = Some("custom/eg:2".to_string());
        let w = generate_gateway(&gateway(spec), &WorkloadDefaults::default()).unwrap();
        assert_eq!(container(&w).image.as_deref(), Some("custom/eg:2"));
    }

    #[test]
    fn service_account_and_resources_are_applied() {
        use k8s_openapi::api::core::v1::ResourceRequirements;
        use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

        let resources = ResourceRequirements {
            limits: Some(BTreeMap::from([(
                "memory".to_string(),
                Quantity("1Gi".to_string()),
            )])),
            ..Default::default()
        };
        let w = generate_gateway(
            &gateway(JupyterGatewaySpec {
                service_account_name: Some("enterprise-gateway-sa".to_string()),
                resources: Some(resources.clone()),
                ..Default::default()
            }),
            &WorkloadDefaults::default(),
        )
        .unwrap();

        let pod = w
            .deployment
            .spec
            .as_ref()
            .unwrap()
            .template
            .spec
            .as_ref()
            .unwrap();
        assert_eq!(
            pod.service_account_name.as_deref(),
            Some("enterprise-gateway-sa")
        );
        assert_eq!(container(&w).resources.as_ref(), Some(&resources));
    }

    #[test]
    fn template_without_containers_is_rejected() {
        let err = generate_gateway(
            &gateway(JupyterGatewaySpec {
                template: Some(PodTemplateSpec {
                    metadata: None,
                    spec: Some(PodSpec::default()),
                }),
                ..Default::default()
            }),
            &WorkloadDefaults::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GenerateError::NoContainers { .. }));
    }
}
