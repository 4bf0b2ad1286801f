use std::{sync::Arc, time::Duration};

use futures::StreamExt;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{
    Client, CustomResource, CustomResourceExt,
    runtime::{Controller, controller::Action, watcher::Config as WatcherConfig},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    kubernetes::{self, Api, Object, Resource as KubernetesResource, error_policy},
    metrics::Metrics,
    prometheus_rule::{self, PrometheusRule},
};

/*
 * ============================================================================
 * Custom Resource Definition
 * ============================================================================
 */
/// # Elasticsearch
///
/// An Elasticsearch cluster managed by the Elasticsearch Operator.
///
/// For every managed cluster the operator maintains a Prometheus Rule named
/// `<name>-prometheus-rules` in the same namespace, holding the alerting and
/// recording rules shipped with the operator. The rule is owned by the
/// cluster and deleted together with it.
#[allow(clippy::module_name_repetitions)]
#[derive(CustomResource, JsonSchema, Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[kube(
    group = "logging.openshift.io",
    kind = "Elasticsearch",
    namespaced,
    plural = "elasticsearches",
    printcolumn = r#"{"name":"Management State", "type":"string", "description":"Whether the operator manages the cluster", "jsonPath":".spec.managementState"}"#,
    printcolumn = r#"{"name":"Prometheus Rule", "type":"string", "description":"Name of the managed prometheus rule", "jsonPath":".status.prometheusRule"}"#,
    printcolumn = r#"{"name":"State", "type":"string", "description":"Human readable description of state", "jsonPath":".status.state"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#,
    status = "ElasticsearchStatus",
    version = "v1"
)]
#[serde(rename_all = "camelCase")]
pub struct ElasticsearchSpec {
    /// # Management State
    ///
    /// Whether the operator manages the cluster. default: Managed.
    ///
    /// An `Unmanaged` cluster is left untouched: its Prometheus Rule is
    /// neither created nor updated.
    pub management_state: Option<ManagementState>,
}

#[derive(JsonSchema, Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ManagementState {
    #[default]
    Managed,
    Unmanaged,
}

#[allow(clippy::module_name_repetitions)]
#[derive(JsonSchema, Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ElasticsearchStatus {
    /// Name of the managed Prometheus Rule.
    pub prometheus_rule: Option<String>,

    /// Human readable description of state.
    ///
    /// Possible values:
    ///
    ///  - unmanaged
    ///  - prometheus rules reconciled
    pub state: String,
}

impl Elasticsearch {
    #[must_use]
    pub fn management_state(&self) -> ManagementState {
        self.spec.management_state.unwrap_or_default()
    }
}

impl KubernetesResource for Elasticsearch {}

impl Object for Elasticsearch {
    const APP_KUBERNETES_IO_COMPONENT_VALUE: &'static str = "elasticsearch";

    type Status = ElasticsearchStatus;

    fn status(&self) -> &Option<Self::Status> {
        &self.status
    }
}

#[must_use]
pub fn generate_custom_resource_definition() -> CustomResourceDefinition {
    Elasticsearch::crd()
}

/*
 * ============================================================================
 * Config
 * ============================================================================
 */
pub struct Config {
    pub prometheus_rule: prometheus_rule::Config,
}

/*
 * ============================================================================
 * Controller
 * ============================================================================
 */
pub async fn run_controller(client: Client, config: Config, metrics: Metrics) {
    metrics.kubernetes_api_usage_count::<Elasticsearch>("watch");
    metrics.kubernetes_api_usage_count::<PrometheusRule>("watch");
    Controller::new(
        kube::Api::<Elasticsearch>::all(client.clone()),
        WatcherConfig::default(),
    )
    .owns(
        kube::Api::<PrometheusRule>::all(client.clone()),
        WatcherConfig::default(),
    )
    .shutdown_on_signal()
    .run(
        reconciler,
        error_policy,
        Arc::new(Context {
            client,
            config,
            metrics,
        }),
    )
    .for_each(|_| async {})
    .await;
}

/*
 * ============================================================================
 * Context
 * ============================================================================
 */
struct Context {
    client: Client,
    config: Config,
    metrics: Metrics,
}

impl kubernetes::Context for Context {
    fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/*
 * ============================================================================
 * Reconciler
 * ============================================================================
 */
#[tracing::instrument(skip(object, ctx))]
async fn reconciler(object: Arc<Elasticsearch>, ctx: Arc<Context>) -> Result<Action> {
    let _timer = ctx
        .metrics
        .count_and_measure(Elasticsearch::APP_KUBERNETES_IO_COMPONENT_VALUE);
    tracing::info!("reconciling");

    let namespace = object.try_namespace()?;

    let state = match object.management_state() {
        ManagementState::Unmanaged => State::Unmanaged,
        ManagementState::Managed => {
            // prometheus rule
            let prometheus_rule = prometheus_rule::reconcile(
                &Api::new(
                    kube::Api::namespaced(ctx.client.clone(), &namespace),
                    ctx.metrics.clone(),
                ),
                object.as_ref(),
                &ctx.config.prometheus_rule,
            )
            .await?;

            State::PrometheusRulesReconciled(prometheus_rule.try_name()?.to_string())
        }
    };

    // elasticsearch
    reconcile_elasticsearch(
        &Api::new(
            kube::Api::namespaced(ctx.client.clone(), &namespace),
            ctx.metrics.clone(),
        ),
        &object,
        &state,
    )
    .await?;

    tracing::info!(state =% state, "reconciled");

    Ok(Action::requeue(Duration::from_secs(3600)))
}

async fn reconcile_elasticsearch(
    api: &Api<Elasticsearch>,
    object: &Elasticsearch,
    state: &State,
) -> Result<()> {
    api.update_status(object, generate_status(state)).await
}

fn generate_status(state: &State) -> ElasticsearchStatus {
    ElasticsearchStatus {
        prometheus_rule: match state {
            State::PrometheusRulesReconciled(name) => Some(name.clone()),
            State::Unmanaged => None,
        },
        state: state.to_string(),
    }
}

enum State {
    Unmanaged,
    PrometheusRulesReconciled(String),
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            State::Unmanaged => write!(f, "unmanaged"),
            State::PrometheusRulesReconciled(_) => write!(f, "prometheus rules reconciled"),
        }
    }
}
