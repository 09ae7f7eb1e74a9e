//! Notebook workload generation
//!
//! Turns a `JupyterNotebook` into a single-replica Deployment. Precedence:
//!
//! - `template` present: its containers, labels, and annotations seed the pod,
//!   and the first container keeps its image (falling back to the default
//!   image only when the template leaves it empty).
//! - `template` absent: a single `notebook` container runs the default
//!   gateway-capable image and is started with `start-notebook.sh`.
//! - `gateway` present: `--gateway-url http://<name>.<namespace>:8888`.
//! - `auth.password` present: `--password <value>`.
//!
//! Argument conditions are independent and append in that order.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Container, ContainerPort, PodSpec, PodTemplateSpec};

use jupyter_common::crd::{JupyterNotebook, GATEWAY_PORT};

use crate::defaults::WorkloadDefaults;
use crate::error::GenerateError;
use crate::template::{
    first_container_mut, identity, merge_map, single_replica_deployment, template_metadata,
    Identity,
};

const KIND: &str = "JupyterNotebook";

/// Name of the synthesized container when the notebook has no template
pub const DEFAULT_CONTAINER_NAME: &str = "notebook";

/// Port the notebook server listens on
pub const NOTEBOOK_PORT: i32 = 8888;

/// Label injected into every notebook pod
pub const LABEL_NOTEBOOK: &str = "notebook";

/// Command token that starts the notebook server in gateway-only mode
pub const LAUNCH_COMMAND: &str = "start-notebook.sh";

/// Argument that points the notebook server at a gateway
pub const ARG_GATEWAY_URL: &str = "--gateway-url";

/// Argument that sets the notebook server password
pub const ARG_PASSWORD: &str = "--password";

/// Generate the desired Deployment for a notebook.
///
/// The result carries no owner reference; the controller attaches one.
pub fn generate_notebook(
    notebook: Option<&JupyterNotebook>,
    defaults: &WorkloadDefaults,
) -> Result<Deployment, GenerateError> {
    NotebookGenerator::new(notebook, defaults)?.desired_deployment()
}

/// Generator bound to one notebook
#[derive(Debug)]
pub struct NotebookGenerator<'a> {
    notebook: &'a JupyterNotebook,
    defaults: &'a WorkloadDefaults,
}

impl<'a> NotebookGenerator<'a> {
    /// Bind a generator; fails on a missing notebook
    pub fn new(
        notebook: Option<&'a JupyterNotebook>,
        defaults: &'a WorkloadDefaults,
    ) -> Result<Self, GenerateError> {
        let notebook = notebook.ok_or(GenerateError::NullNotebook)?;
        Ok(Self { notebook, defaults })
    }

    /// Build the Deployment
    pub fn desired_deployment(&self) -> Result<Deployment, GenerateError> {
        let spec = &self.notebook.spec;
        if spec.template.is_none() && spec.gateway.is_none() {
            return Err(GenerateError::NoGatewayOrTemplate);
        }

        let id = identity(&self.notebook.metadata, KIND)?;
        let mut template = self.base_template();
        let args = self.args(&id);
        let labels = self.labels();
        let annotations = template
            .metadata
            .as_ref()
            .and_then(|m| m.annotations.clone())
            .unwrap_or_default();

        let container = first_container_mut(&mut template, KIND, id.name)?;
        if container.image.as_deref().map_or(true, str::is_empty) {
            container.image = Some(self.defaults.notebook_image.clone());
        }
        if !args.is_empty() {
            container.args.get_or_insert_with(Vec::new).extend(args);
        }

        template.metadata = Some(template_metadata(labels, annotations));

        let selector = BTreeMap::from([(LABEL_NOTEBOOK.to_string(), id.name.to_string())]);
        Ok(single_replica_deployment(&id, selector, template))
    }

    /// Pod labels: template labels plus `notebook=<name>`
    pub fn labels(&self) -> BTreeMap<String, String> {
        let name = self.notebook.metadata.name.clone().unwrap_or_default();
        merge_map(
            self.notebook
                .spec
                .template
                .as_ref()
                .and_then(|t| t.metadata.as_ref())
                .and_then(|m| m.labels.as_ref()),
            [(LABEL_NOTEBOOK.to_string(), name)],
        )
    }

    /// Gateway endpoint, when the notebook references one
    pub fn gateway_url(&self, notebook_namespace: &str) -> Option<String> {
        self.notebook.spec.gateway.as_ref().map(|gateway| {
            format!(
                "http://{}.{}:{}",
                gateway.name,
                gateway.namespace_or(notebook_namespace),
                GATEWAY_PORT
            )
        })
    }

    fn args(&self, id: &Identity<'_>) -> Vec<String> {
        let spec = &self.notebook.spec;
        let mut args = Vec::new();
        if spec.template.is_none() {
            args.push(LAUNCH_COMMAND.to_string());
        }
        if let Some(url) = self.gateway_url(id.namespace) {
            args.push(ARG_GATEWAY_URL.to_string());
            args.push(url);
        }
        if let Some(password) = spec.password() {
            args.push(ARG_PASSWORD.to_string());
            args.push(password.to_string());
        }
        args
    }

    fn base_template(&self) -> PodTemplateSpec {
        match &self.notebook.spec.template {
            Some(template) => template.clone(),
            None => PodTemplateSpec {
                metadata: None,
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: DEFAULT_CONTAINER_NAME.to_string(),
                        image: Some(self.defaults.notebook_image.clone()),
                        ports: Some(vec![ContainerPort {
                            name: Some(DEFAULT_CONTAINER_NAME.to_string()),
                            container_port: NOTEBOOK_PORT,
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
        }
    }
}
