//! Owner references from generated children to their parent
//!
//! Deletion is left to the Kubernetes garbage collector: once the parent is
//! gone, every child carrying its controller reference is removed with it.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{Resource, ResourceExt};

use jupyter_common::{Error, Result};

/// Controller owner reference pointing at `parent`.
///
/// The parent must have been read from the API server; without a UID it
/// cannot own anything.
pub fn owner_reference<K>(parent: &K) -> Result<OwnerReference>
where
    K: Resource<DynamicType = ()>,
{
    let Some(uid) = parent.uid().filter(|uid| !uid.is_empty()) else {
        return Err(Error::internal_with_context(
            "owner",
            format!("{} {} has no UID", K::kind(&()), parent.name_any()),
        ));
    };
    Ok(OwnerReference {
        api_version: K::api_version(&()).to_string(),
        kind: K::kind(&()).to_string(),
        name: parent.name_any(),
        uid,
        controller: Some(true),
        block_owner_deletion: Some(true),
    })
}
