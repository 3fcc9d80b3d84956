//! Best-effort cleanup after the scenario groups.
//!
//! Re-lists the collection and deletes each object one at a time, waiting
//! for every response before the next request. Each result is collected in
//! a [`TeardownReport`]; failures are logged and never fail the suite.

use crate::config::TeardownScope;
use crate::report::{TeardownFailure, TeardownReport};
use crate::resource::{object_id, CreatedNames, ResourceClient};
use crate::transport::{excerpt, Transport};

pub async fn run<T: Transport>(
    client: &ResourceClient<'_, T>,
    scope: TeardownScope,
    created: &CreatedNames,
) -> TeardownReport {
    let mut report = TeardownReport::default();

    let objects = match client.fetch_all().await {
        Ok(objects) => objects,
        Err(e) => {
            tracing::error!(collection = %client.collection_url(), error = %e, "teardown listing failed");
            report.list_error = Some(e.to_string());
            return report;
        }
    };
    report.listed = objects.len();

    for object in &objects {
        if scope == TeardownScope::Created {
            let name = object.get("Name").and_then(|n| n.as_str()).unwrap_or("");
            if !created.contains(name) {
                continue;
            }
        }

        let id = match object_id(object) {
            Some(id) => id,
            None => {
                tracing::error!(%object, "teardown skipped object without a numeric Id");
                report.failed.push(TeardownFailure {
                    id: None,
                    reason: format!("object has no numeric Id: {}", object),
                });
                continue;
            }
        };

        match client.delete_by_id(id).await {
            Ok(response) if response.status == 200 => report.deleted.push(id),
            Ok(response) => {
                let reason = format!(
                    "DELETE returned status {}: {}",
                    response.status,
                    excerpt(&response.body)
                );
                tracing::error!(id, %reason, "teardown delete failed");
                report.failed.push(TeardownFailure {
                    id: Some(id),
                    reason,
                });
            }
            Err(e) => {
                tracing::error!(id, error = %e, "teardown delete failed");
                report.failed.push(TeardownFailure {
                    id: Some(id),
                    reason: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        collection = %client.collection_url(),
        listed = report.listed,
        deleted = report.deleted.len(),
        failed = report.failed.len(),
        "teardown finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConformanceError, ConformanceResult};
    use crate::transport::{ApiRequest, ApiResponse, Method};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Lists a fixed collection; deletes succeed except for the ids in `refuse`.
    struct ScriptedApi {
        listing: &'static str,
        refuse: Vec<i64>,
        unreachable: Vec<i64>,
        deletes: Mutex<Vec<String>>,
    }

    impl ScriptedApi {
        fn new(listing: &'static str) -> Self {
            ScriptedApi {
                listing,
                refuse: vec![],
                unreachable: vec![],
                deletes: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl Transport for ScriptedApi {
        async fn send(&self, request: ApiRequest) -> ConformanceResult<ApiResponse> {
            match request.method {
                Method::Get => Ok(ApiResponse::new(200, self.listing)),
                Method::Delete => {
                    self.deletes.lock().unwrap().push(request.url.clone());
                    let id: i64 = request.url.rsplit('/').next().unwrap().parse().unwrap();
                    if self.unreachable.contains(&id) {
                        Err(ConformanceError::Transport {
                            method: "DELETE".to_string(),
                            url: request.url,
                            message: "connection reset".to_string(),
                        })
                    } else if self.refuse.contains(&id) {
                        Ok(ApiResponse::new(500, "boom"))
                    } else {
                        Ok(ApiResponse::new(200, ""))
                    }
                }
                Method::Post => Ok(ApiResponse::new(405, "")),
            }
        }
    }

    const LISTING: &str =
        r#"[{"Id": 1, "Name": "keep"}, {"Id": 2, "Name": "widget_name_1"}, {"Id": 3, "Name": "widget_name_2"}]"#;

    #[tokio::test]
    async fn deletes_everything_in_order_by_default() {
        let api = ScriptedApi::new(LISTING);
        let client = ResourceClient::new(&api, "http://api/widgets", None);
        let report = run(&client, TeardownScope::All, &CreatedNames::default()).await;

        assert_eq!(report.listed, 3);
        assert_eq!(report.deleted, vec![1, 2, 3]);
        assert!(report.is_clean());
        assert_eq!(
            *api.deletes.lock().unwrap(),
            vec![
                "http://api/widgets/id/1",
                "http://api/widgets/id/2",
                "http://api/widgets/id/3"
            ]
        );
    }

    #[tokio::test]
    async fn created_scope_leaves_foreign_objects() {
        let api = ScriptedApi::new(LISTING);
        let client = ResourceClient::new(&api, "http://api/widgets", None);
        let created = CreatedNames::default();
        created.record("widget_name_2");

        let report = run(&client, TeardownScope::Created, &created).await;
        assert_eq!(report.deleted, vec![3]);
        assert_eq!(api.deletes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failures_are_collected_and_the_pass_continues() {
        let mut api = ScriptedApi::new(LISTING);
        api.refuse = vec![1];
        api.unreachable = vec![2];
        let client = ResourceClient::new(&api, "http://api/widgets", None);

        let report = run(&client, TeardownScope::All, &CreatedNames::default()).await;
        assert_eq!(report.deleted, vec![3]);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].id, Some(1));
        assert!(report.failed[0].reason.contains("500"));
        assert!(report.failed[1].reason.contains("connection reset"));
    }

    #[tokio::test]
    async fn unreadable_listing_is_reported() {
        let api = ScriptedApi::new("not json");
        let client = ResourceClient::new(&api, "http://api/widgets", None);
        let report = run(&client, TeardownScope::All, &CreatedNames::default()).await;
        assert!(report.list_error.is_some());
        assert!(report.deleted.is_empty());
    }

    #[tokio::test]
    async fn objects_without_id_are_reported() {
        let api = ScriptedApi::new(r#"[{"Name": "orphan"}]"#);
        let client = ResourceClient::new(&api, "http://api/widgets", None);
        let report = run(&client, TeardownScope::All, &CreatedNames::default()).await;
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].id, None);
    }
}
