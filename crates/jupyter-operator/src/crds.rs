//! CRD manifests and startup installation

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};

use jupyter_common::crd::all_crds;
use jupyter_common::FIELD_MANAGER;

/// All CRDs as one multi-document YAML stream
pub fn crd_manifests() -> Result<String, serde_yaml::Error> {
    let docs = all_crds()
        .iter()
        .map(serde_yaml::to_string)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(docs.join("---\n"))
}

/// Ensure all Jupyter CRDs are installed
///
/// Uses server-side apply so the installed schema always matches this
/// build of the operator.
pub async fn ensure_crds_installed(client: &Client) -> anyhow::Result<()> {
    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    let params = PatchParams::apply(FIELD_MANAGER).force();

    for crd in all_crds() {
        let name = crd.name_any();
        tracing::info!(crd = %name, "installing CRD");
        crds.patch(&name, &params, &Patch::Apply(&crd))
            .await
            .map_err(|e| anyhow::anyhow!("failed to install CRD {name}: {e}"))?;
    }

    tracing::info!("all Jupyter CRDs installed");
    Ok(())
}
