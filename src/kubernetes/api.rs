use kube::api::PostParams;

use crate::{Error, Result, metrics::Metrics};

use super::{
    Object, Resource, ResourceName, Store, constants::APP_KUBERNETES_IO_MANAGED_BY_VALUE,
};

/// Namespaced kube API that records every request it makes.
pub struct Api<R> {
    api: kube::Api<R>,
    metrics: Metrics,
}

impl<R> Api<R> {
    pub fn new(api: kube::Api<R>, metrics: Metrics) -> Self {
        Self { api, metrics }
    }
}

fn post_params() -> PostParams {
    PostParams {
        dry_run: false,
        field_manager: Some(APP_KUBERNETES_IO_MANAGED_BY_VALUE.into()),
    }
}

impl<R> Store<R> for Api<R>
where
    R: Resource
        + Clone
        + std::fmt::Debug
        + serde::de::DeserializeOwned
        + serde::Serialize
        + Send
        + Sync
        + 'static,
{
    async fn create(&self, resource: &R) -> Result<R, kube::Error> {
        self.metrics.kubernetes_api_usage_count::<R>("create");
        self.api.create(&post_params(), resource).await
    }

    async fn get(&self, name: &ResourceName) -> Result<R, kube::Error> {
        self.metrics.kubernetes_api_usage_count::<R>("get");
        self.api.get(name).await
    }

    async fn replace(&self, name: &ResourceName, resource: &R) -> Result<R, kube::Error> {
        self.metrics.kubernetes_api_usage_count::<R>("update");
        self.api.replace(name, &post_params(), resource).await
    }
}

impl<R> Api<R>
where
    R: Object + Clone + std::fmt::Debug + serde::de::DeserializeOwned + serde::Serialize,
{
    pub async fn update_status(&self, object: &R, status: R::Status) -> Result<()> {
        match object.status() {
            Some(api_status) if &status == api_status => {}
            _ => {
                self.metrics.kubernetes_api_usage_count::<R>("patch");
                self.api
                    .patch_status(
                        &object.try_name()?,
                        &object.patch_status_params(),
                        &object.patch_status(status),
                    )
                    .await
                    .map_err(Error::Kube)?;
            }
        }

        Ok(())
    }
}
