//! Controller construction
//!
//! One kube-rs `Controller` per Jupyter kind, all driving the same generic
//! reconciler. Each controller owns the child kinds its generator emits and
//! watches the kinds it references, so a referrer parked in `Pending` is
//! requeued as soon as the object it waits on shows up.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use k8s_openapi::NamespaceResourceScope;
use kube::runtime::reflector::ObjectRef;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Api, Client, Resource, ResourceExt};

use jupyter_common::crd::{
    JupyterGateway, JupyterKernel, JupyterKernelSpec, JupyterKernelTemplate, JupyterNotebook,
    ResourceRef,
};
use jupyter_controller::{error_policy, reconcile, Context};

/// Timeout for watch requests (must be less than client read_timeout)
const WATCH_TIMEOUT_SECS: u32 = 25;

type ControllerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

fn watcher_config() -> WatcherConfig {
    WatcherConfig::default().timeout(WATCH_TIMEOUT_SECS)
}

/// Api handle scoped to one namespace, or cluster-wide when `namespace` is `None`
fn scoped_api<K>(client: &Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<Scope = NamespaceResourceScope>,
    <K as Resource>::DynamicType: Default,
{
    match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    }
}

/// Whether `reference`, written on an object in `referrer_namespace`, points at `target`
fn points_at<T: ResourceExt>(reference: &ResourceRef, referrer_namespace: &str, target: &T) -> bool {
    reference.name == target.name_any()
        && Some(reference.namespace_or(referrer_namespace)) == target.namespace().as_deref()
}

/// Objects in `referrers` for which `refers` reports a reference to `target`
fn referrers_of<P, T>(
    referrers: Vec<Arc<P>>,
    target: &T,
    refers: impl Fn(&P, &T) -> bool,
) -> Vec<ObjectRef<P>>
where
    P: Resource<DynamicType = ()>,
    T: ResourceExt,
{
    referrers
        .iter()
        .filter(|p| refers(p.as_ref(), target))
        .map(|p| ObjectRef::from_obj(p.as_ref()))
        .collect()
}

fn notebook_uses_gateway(nb: &JupyterNotebook, gw: &JupyterGateway) -> bool {
    let ns = nb.namespace().unwrap_or_default();
    nb.spec
        .gateway
        .as_ref()
        .is_some_and(|r| points_at(r, &ns, gw))
}

fn gateway_serves_kernel_spec(gw: &JupyterGateway, ks: &JupyterKernelSpec) -> bool {
    gw.namespace() == ks.namespace() && gw.spec.kernels.contains(&ks.name_any())
}

fn kernel_spec_uses_template(ks: &JupyterKernelSpec, t: &JupyterKernelTemplate) -> bool {
    let ns = ks.namespace().unwrap_or_default();
    points_at(&ks.spec.template, &ns, t)
}

fn kernel_uses_kernel_spec(k: &JupyterKernel, ks: &JupyterKernelSpec) -> bool {
    let ns = k.namespace().unwrap_or_default();
    points_at(&k.spec.kernel_spec, &ns, ks)
}

/// Build all Jupyter controller futures
///
/// `namespace` restricts every watch to one namespace; `None` watches the
/// whole cluster.
pub fn build_controllers(
    client: Client,
    namespace: Option<&str>,
    ctx: Arc<Context>,
) -> Vec<ControllerFuture> {
    let deployments = || scoped_api::<Deployment>(&client, namespace);

    let notebooks = Controller::new(
        scoped_api::<JupyterNotebook>(&client, namespace),
        watcher_config(),
    );
    let notebook_store = notebooks.store();
    let notebook_ctrl = notebooks
        .owns(deployments(), watcher_config())
        .watches(
            scoped_api::<JupyterGateway>(&client, namespace),
            watcher_config(),
            move |gw| referrers_of(notebook_store.state(), &gw, notebook_uses_gateway),
        )
        .shutdown_on_signal()
        .run(
            reconcile::<JupyterNotebook>,
            error_policy::<JupyterNotebook>,
            ctx.clone(),
        )
        .for_each(log_reconcile_result("JupyterNotebook"));

    let gateways = Controller::new(
        scoped_api::<JupyterGateway>(&client, namespace),
        watcher_config(),
    );
    let gateway_store = gateways.store();
    let gateway_ctrl = gateways
        .owns(deployments(), watcher_config())
        .owns(scoped_api::<Service>(&client, namespace), watcher_config())
        .watches(
            scoped_api::<JupyterKernelSpec>(&client, namespace),
            watcher_config(),
            move |ks| referrers_of(gateway_store.state(), &ks, gateway_serves_kernel_spec),
        )
        .shutdown_on_signal()
        .run(
            reconcile::<JupyterGateway>,
            error_policy::<JupyterGateway>,
            ctx.clone(),
        )
        .for_each(log_reconcile_result("JupyterGateway"));

    let template_ctrl = Controller::new(
        scoped_api::<JupyterKernelTemplate>(&client, namespace),
        watcher_config(),
    )
    .shutdown_on_signal()
    .run(
        reconcile::<JupyterKernelTemplate>,
        error_policy::<JupyterKernelTemplate>,
        ctx.clone(),
    )
    .for_each(log_reconcile_result("JupyterKernelTemplate"));

    let kernel_specs = Controller::new(
        scoped_api::<JupyterKernelSpec>(&client, namespace),
        watcher_config(),
    );
    let kernel_spec_store = kernel_specs.store();
    let kernel_spec_ctrl = kernel_specs
        .owns(scoped_api::<ConfigMap>(&client, namespace), watcher_config())
        .watches(
            scoped_api::<JupyterKernelTemplate>(&client, namespace),
            watcher_config(),
            move |t| referrers_of(kernel_spec_store.state(), &t, kernel_spec_uses_template),
        )
        .shutdown_on_signal()
        .run(
            reconcile::<JupyterKernelSpec>,
            error_policy::<JupyterKernelSpec>,
            ctx.clone(),
        )
        .for_each(log_reconcile_result("JupyterKernelSpec"));

    let kernels = Controller::new(
        scoped_api::<JupyterKernel>(&client, namespace),
        watcher_config(),
    );
    let kernel_store = kernels.store();
    let kernel_ctrl = kernels
        .owns(deployments(), watcher_config())
        .watches(
            scoped_api::<JupyterKernelSpec>(&client, namespace),
            watcher_config(),
            move |ks| referrers_of(kernel_store.state(), &ks, kernel_uses_kernel_spec),
        )
        .shutdown_on_signal()
        .run(
            reconcile::<JupyterKernel>,
            error_policy::<JupyterKernel>,
            ctx,
        )
        .for_each(log_reconcile_result("JupyterKernel"));

    tracing::info!(namespace = namespace.unwrap_or("<all>"), "starting controllers");
    tracing::info!("- JupyterNotebook controller");
    tracing::info!("- JupyterGateway controller");
    tracing::info!("- JupyterKernelTemplate controller");
    tracing::info!("- JupyterKernelSpec controller");
    tracing::info!("- JupyterKernel controller");

    vec![
        Box::pin(notebook_ctrl),
        Box::pin(gateway_ctrl),
        Box::pin(template_ctrl),
        Box::pin(kernel_spec_ctrl),
        Box::pin(kernel_ctrl),
    ]
}

/// Creates a closure for logging reconciliation results.
fn log_reconcile_result<T: std::fmt::Debug, E: std::fmt::Debug>(
    controller_name: &'static str,
) -> impl Fn(Result<T, E>) -> std::future::Ready<()> {
    move |result| {
        match result {
            Ok(action) => tracing::debug!(?action, "{} reconciliation completed", controller_name),
            Err(e) => tracing::error!(error = ?e, "{} reconciliation error", controller_name),
        }
        std::future::ready(())
    }
}
