use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::{Patch, PatchParams};

use super::{
    Labels, constants::APP_KUBERNETES_IO_MANAGED_BY_VALUE, resource::Resource,
};

use crate::{Error, Result};

/// A custom resource reconciled by one of the operator's controllers.
pub trait Object: Resource {
    const APP_KUBERNETES_IO_COMPONENT_VALUE: &'static str;

    type Status: PartialEq + serde::Serialize;

    fn patch_status(&self, status: Self::Status) -> Patch<serde_json::Value> {
        Patch::Merge(serde_json::json!({ "status": status }))
    }

    fn patch_status_params(&self) -> PatchParams {
        PatchParams::apply(APP_KUBERNETES_IO_MANAGED_BY_VALUE)
    }

    fn status(&self) -> &Option<Self::Status>;

    fn try_owner_reference(&self) -> Result<OwnerReference> {
        self.try_name()?;
        self.try_uid()?;
        self.controller_owner_ref(&())
            .ok_or_else(|| Error::MissingObjectKey(".metadata.uid"))
    }

    /// Labels inherited by the resources this object owns.
    fn owned_labels(&self) -> Labels {
        self.labels().clone().into()
    }
}
