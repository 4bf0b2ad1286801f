use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::{CustomResource, core::ObjectMeta};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    kubernetes::{Object, Resource, ResourceName, RetryPolicy, Store, create_or_update},
};

/*
 * ============================================================================
 * Custom Resource Definition
 * ============================================================================
 */
/// # Prometheus Rule
///
/// Alerting and recording rules evaluated by the Prometheus Operator. The
/// definition itself is installed by the Prometheus Operator, the
/// Elasticsearch Operator only manages instances of it.
#[allow(clippy::module_name_repetitions)]
#[derive(
    CustomResource, JsonSchema, Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq,
)]
#[kube(
    group = "monitoring.coreos.com",
    kind = "PrometheusRule",
    namespaced,
    version = "v1"
)]
pub struct PrometheusRuleSpec {
    /// Content of Prometheus rule file.
    #[serde(default)]
    pub groups: Vec<RuleGroup>,
}

/// A named set of rules evaluated together.
#[derive(JsonSchema, Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RuleGroup {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_offset: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,

    #[serde(
        rename = "partial_response_strategy",
        skip_serializing_if = "Option::is_none"
    )]
    pub partial_response_strategy: Option<String>,

    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// An alerting rule when `alert` is set, a recording rule when `record` is.
#[derive(JsonSchema, Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,

    pub expr: IntOrString,

    #[serde(rename = "for", skip_serializing_if = "Option::is_none")]
    pub for_: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_firing_for: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

impl Resource for PrometheusRule {}

/*
 * ============================================================================
 * Config
 * ============================================================================
 */
pub const DEFAULT_ALERTS_FILE_PATH: &str =
    "/etc/elasticsearch-operator/files/prometheus_alerts.yml";

pub const DEFAULT_RULES_FILE_PATH: &str = "/etc/elasticsearch-operator/files/prometheus_rules.yml";

const NAME_SUFFIX: &str = "prometheus-rules";

pub struct Config {
    pub alerts_file_path: PathBuf,
    pub rules_file_path: PathBuf,
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alerts_file_path: DEFAULT_ALERTS_FILE_PATH.into(),
            rules_file_path: DEFAULT_RULES_FILE_PATH.into(),
            retry: RetryPolicy::default(),
        }
    }
}

/*
 * ============================================================================
 * Error
 * ============================================================================
 */
#[derive(Debug)]
pub enum RuleFileError {
    Empty,
    Open(std::io::Error),
    DecodeJson(serde_json::Error),
    DecodeYaml(serde_yaml::Error),
}

impl std::error::Error for RuleFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RuleFileError::Empty => None,
            RuleFileError::Open(e) => Some(e),
            RuleFileError::DecodeJson(e) => Some(e),
            RuleFileError::DecodeYaml(e) => Some(e),
        }
    }
}

impl std::fmt::Display for RuleFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleFileError::Empty => write!(f, "failed to decode rule spec from file: no document"),
            RuleFileError::Open(e) => write!(f, "failed to open file: {e}"),
            RuleFileError::DecodeJson(e) => write!(f, "failed to decode rule spec from file: {e}"),
            RuleFileError::DecodeYaml(e) => write!(f, "failed to decode rule spec from file: {e}"),
        }
    }
}

/*
 * ============================================================================
 * Reconciler
 * ============================================================================
 */
/// Ensures the Prometheus rule owned by `owner` exists and its spec matches
/// the rule files named in `config`.
///
/// The `spec` of an existing rule is always overwritten; its labels and owner
/// references are left as they were created.
///
/// # Errors
///
/// Will return `Err` if a rule file cannot be read or decoded, in which case
/// no request is made, or if the rule could not be created or updated.
pub async fn reconcile<O, S>(store: &S, owner: &O, config: &Config) -> Result<PrometheusRule>
where
    O: Object,
    S: Store<PrometheusRule> + Sync,
{
    let desired = build_prometheus_rule(owner, config).await?;

    create_or_update(
        store,
        &config.retry,
        &desired,
        |current: &mut PrometheusRule, desired: &PrometheusRule| {
            current.spec = desired.spec.clone();
        },
    )
    .await
}

/// # Errors
///
/// Will return `Err` if the owner is missing its name, namespace or uid, or
/// if the rule spec could not be built.
pub async fn build_prometheus_rule<O>(owner: &O, config: &Config) -> Result<PrometheusRule>
where
    O: Object,
{
    let name = generate_name(owner)?;
    let namespace = owner.try_namespace()?;

    let spec = build_rule_spec(config).await?;

    PrometheusRule {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(owner.owned_labels().into()),
            ..Default::default()
        },
        spec,
    }
    .try_with_owner(owner)
}

/// Alert groups followed by rule groups, in file order.
///
/// # Errors
///
/// Will return `Err` if either file cannot be read or decoded.
pub async fn build_rule_spec(config: &Config) -> Result<PrometheusRuleSpec> {
    let mut spec = rule_spec(&config.alerts_file_path).await?;
    let rules = rule_spec(&config.rules_file_path).await?;

    spec.groups.extend(rules.groups);

    Ok(spec)
}

/// # Errors
///
/// Will return `Err` if the file cannot be read or is neither a YAML nor a
/// JSON encoded rule spec.
pub async fn rule_spec(path: &Path) -> Result<PrometheusRuleSpec> {
    let error = |source| Error::RuleFile {
        path: path.to_path_buf(),
        source,
    };

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| error(RuleFileError::Open(e)))?;

    decode(&content).map_err(error)
}

/// Decodes the first document of a YAML stream, or the first value of a JSON
/// stream when the content starts with `{`. Anything after it is ignored.
fn decode(content: &str) -> Result<PrometheusRuleSpec, RuleFileError> {
    if content.trim().is_empty() {
        return Err(RuleFileError::Empty);
    }

    if content.trim_start().starts_with('{') {
        serde_json::Deserializer::from_str(content)
            .into_iter::<PrometheusRuleSpec>()
            .next()
            .ok_or(RuleFileError::Empty)?
            .map_err(RuleFileError::DecodeJson)
    } else {
        let document = serde_yaml::Deserializer::from_str(content)
            .next()
            .ok_or(RuleFileError::Empty)?;
        PrometheusRuleSpec::deserialize(document).map_err(RuleFileError::DecodeYaml)
    }
}

fn generate_name(owner: &impl Resource) -> Result<ResourceName> {
    owner
        .try_name()
        .map(|name| ResourceName::new(format!("{name}-{NAME_SUFFIX}")))
}
