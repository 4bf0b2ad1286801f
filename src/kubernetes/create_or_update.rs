use crate::{Error, Result};

use super::{Resource, RetryPolicy, Store, is_already_exists, is_conflict};

/// Creates `desired`, or when a resource with the same name already exists,
/// applies `mutate` to a freshly read copy of it and writes that back.
///
/// Write conflicts on the update path are retried according to `policy`,
/// re-reading the resource before every attempt. Every other failure is
/// returned to the caller.
pub async fn create_or_update<R, S, F>(
    store: &S,
    policy: &RetryPolicy,
    desired: &R,
    mutate: F,
) -> Result<R>
where
    R: Resource + Sync,
    S: Store<R> + Sync,
    F: Fn(&mut R, &R) + Sync,
{
    let name = desired.try_name()?;

    match store.create(desired).await {
        Ok(created) => return Ok(created),
        Err(error) if is_already_exists(&error) => {}
        Err(source) => {
            return Err(Error::Create {
                kind: R::kind(&()).to_string(),
                name: name.to_string(),
                source,
            });
        }
    }

    let name_ref = &name;
    let mutate = &mutate;
    policy
        .retry(is_conflict, move || async move {
            let mut current = store.get(name_ref).await?;
            mutate(&mut current, desired);
            store.replace(name_ref, &current).await
        })
        .await
        .map_err(|source| Error::Update {
            kind: R::kind(&()).to_string(),
            name: name.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, time::Duration};

    use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
    use kube::{ResourceExt, core::ObjectMeta};

    use crate::{
        Error,
        kubernetes::{
            RetryPolicy,
            fake_store::{FakeStore, api_error},
        },
        prometheus_rule::{PrometheusRule, PrometheusRuleSpec, Rule, RuleGroup},
    };

    use super::create_or_update;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            steps: 5,
            duration: Duration::from_millis(1),
            factor: 1.0,
            jitter: 0.1,
        }
    }

    fn rule(group: &str, labels: &[(&str, &str)]) -> PrometheusRule {
        PrometheusRule {
            metadata: ObjectMeta {
                name: Some("elasticsearch-prometheus-rules".into()),
                namespace: Some("openshift-logging".into()),
                labels: Some(
                    labels
                        .iter()
                        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
                        .collect::<BTreeMap<_, _>>(),
                ),
                ..Default::default()
            },
            spec: PrometheusRuleSpec {
                groups: vec![RuleGroup {
                    name: group.into(),
                    interval: None,
                    query_offset: None,
                    limit: None,
                    partial_response_strategy: None,
                    rules: vec![Rule {
                        record: None,
                        alert: Some("ElasticsearchClusterNotHealthy".into()),
                        expr: IntOrString::String("es_cluster_status == 2".into()),
                        for_: Some("7m".into()),
                        keep_firing_for: None,
                        labels: None,
                        annotations: None,
                    }],
                }],
            },
        }
    }

    fn replace_spec(current: &mut PrometheusRule, desired: &PrometheusRule) {
        current.spec = desired.spec.clone();
    }

    #[tokio::test]
    async fn creates_missing_resource() {
        // arrange
        let store = FakeStore::default();
        let desired = rule("desired", &[]);

        // act
        let result = create_or_update(&store, &policy(), &desired, replace_spec).await;

        // assert
        assert!(result.is_ok());
        assert_eq!(vec!["create"], store.calls());
        assert_eq!(
            desired.spec,
            store.object("elasticsearch-prometheus-rules").unwrap().spec
        );
    }

    #[tokio::test]
    async fn updates_existing_resource() {
        // arrange
        let store = FakeStore::default().with_object(rule("stale", &[("created", "first")]));
        let desired = rule("desired", &[("created", "second")]);

        // act
        let result = create_or_update(&store, &policy(), &desired, replace_spec).await;

        // assert
        assert!(result.is_ok());
        assert_eq!(vec!["create", "get", "replace"], store.calls());

        let stored = store.object("elasticsearch-prometheus-rules").unwrap();
        assert_eq!(desired.spec, stored.spec);
        assert_eq!(Some(&"first".to_string()), stored.labels().get("created"));
    }

    #[tokio::test]
    async fn retries_update_on_conflict() {
        // arrange
        let store = FakeStore::default()
            .with_object(rule("stale", &[]))
            .with_replace_errors([api_error(409, "Conflict"), api_error(409, "Conflict")]);
        let desired = rule("desired", &[]);

        // act
        let result = create_or_update(&store, &policy(), &desired, replace_spec).await;

        // assert
        assert!(result.is_ok());
        assert_eq!(1, store.count("create"));
        assert_eq!(3, store.count("get"));
        assert_eq!(3, store.count("replace"));
        assert_eq!(
            desired.spec,
            store.object("elasticsearch-prometheus-rules").unwrap().spec
        );
    }

    #[tokio::test]
    async fn gives_up_after_persistent_conflicts() {
        // arrange
        let store = FakeStore::default()
            .with_object(rule("stale", &[]))
            .with_replace_errors((0..5).map(|_| api_error(409, "Conflict")));
        let desired = rule("desired", &[]);

        // act
        let result = create_or_update(&store, &policy(), &desired, replace_spec).await;

        // assert
        assert!(matches!(
            result,
            Err(Error::Update { ref name, .. }) if name == "elasticsearch-prometheus-rules"
        ));
        assert_eq!(5, store.count("get"));
        assert_eq!(5, store.count("replace"));
    }

    #[tokio::test]
    async fn create_failure_is_fatal() {
        // arrange
        let store = FakeStore::default().with_create_error(api_error(403, "Forbidden"));
        let desired = rule("desired", &[]);

        // act
        let result = create_or_update(&store, &policy(), &desired, replace_spec).await;

        // assert
        assert!(matches!(
            result,
            Err(Error::Create { ref kind, ref name, .. })
                if kind == "PrometheusRule" && name == "elasticsearch-prometheus-rules"
        ));
        assert_eq!(vec!["create"], store.calls());
    }

    #[tokio::test]
    async fn get_failure_is_not_retried() {
        // arrange
        let store = FakeStore::default()
            .with_object(rule("stale", &[]))
            .with_get_error(api_error(500, "InternalError"));
        let desired = rule("desired", &[]);

        // act
        let result = create_or_update(&store, &policy(), &desired, replace_spec).await;

        // assert
        assert!(matches!(result, Err(Error::Update { .. })));
        assert_eq!(vec!["create", "get"], store.calls());
        assert_eq!(
            "stale",
            store.object("elasticsearch-prometheus-rules").unwrap().spec.groups[0].name
        );
    }
}
