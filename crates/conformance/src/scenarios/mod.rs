//! The scenario matrix, one module per operation family.
//!
//! Every scenario is an async function over a [`ScenarioContext`] that
//! returns `Ok(())` or the first oracle that did not hold. Scenarios never
//! retry and never swallow a transport error.

pub mod create;
pub mod delete;
pub mod get_by_id;
pub mod list;
pub mod unauthorized;

use serde::Serialize;

use crate::config::SuiteConfig;
use crate::error::ConformanceResult;
use crate::naming::NameGenerator;
use crate::report::ScenarioGroup;
use crate::resource::{CreatedNames, ResourceClient};
use crate::transport::Transport;

/// Everything a scenario may touch.
///
/// `client` carries the bearer credential for the authorized group; the
/// unauthorized scenarios call [`ResourceClient::anonymous`] on it.
pub struct ScenarioContext<'a, T: Transport> {
    pub client: ResourceClient<'a, T>,
    pub names: &'a NameGenerator,
    pub created: &'a CreatedNames,
    pub config: &'a SuiteConfig,
}

impl<'a, T: Transport> ScenarioContext<'a, T> {
    /// Next generated name, recorded for teardown before it is ever sent.
    pub fn fresh_name(&self) -> String {
        let name = self.names.next();
        self.created.record(&name);
        name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioId {
    CreateOne,
    CreateTwo,
    DuplicateNameRejected,
    MissingNameRejected,
    ListAll,
    GetByIdValid,
    GetByIdInvalid,
    DeleteValid,
    DeleteInvalid,
    UnauthorizedList,
    UnauthorizedGetById,
    UnauthorizedCreate,
    UnauthorizedDelete,
}

impl ScenarioId {
    /// Run in this order, sharing one credential.
    pub const AUTHORIZED: [ScenarioId; 9] = [
        ScenarioId::CreateOne,
        ScenarioId::CreateTwo,
        ScenarioId::DuplicateNameRejected,
        ScenarioId::MissingNameRejected,
        ScenarioId::ListAll,
        ScenarioId::GetByIdValid,
        ScenarioId::GetByIdInvalid,
        ScenarioId::DeleteValid,
        ScenarioId::DeleteInvalid,
    ];

    pub const UNAUTHORIZED: [ScenarioId; 4] = [
        ScenarioId::UnauthorizedList,
        ScenarioId::UnauthorizedGetById,
        ScenarioId::UnauthorizedCreate,
        ScenarioId::UnauthorizedDelete,
    ];

    pub fn group(&self) -> ScenarioGroup {
        if Self::UNAUTHORIZED.contains(self) {
            ScenarioGroup::Unauthorized
        } else {
            ScenarioGroup::Authorized
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            ScenarioId::CreateOne => "create_one",
            ScenarioId::CreateTwo => "create_two",
            ScenarioId::DuplicateNameRejected => "duplicate_name_rejected",
            ScenarioId::MissingNameRejected => "missing_name_rejected",
            ScenarioId::ListAll => "list_all",
            ScenarioId::GetByIdValid => "get_by_id_valid",
            ScenarioId::GetByIdInvalid => "get_by_id_invalid",
            ScenarioId::DeleteValid => "delete_valid",
            ScenarioId::DeleteInvalid => "delete_invalid",
            ScenarioId::UnauthorizedList => "unauthorized_list",
            ScenarioId::UnauthorizedGetById => "unauthorized_get_by_id",
            ScenarioId::UnauthorizedCreate => "unauthorized_create",
            ScenarioId::UnauthorizedDelete => "unauthorized_delete",
        }
    }

    /// Human-readable case title for a given endpoint and resource name.
    pub fn title(&self, endpoint: &str, resource: &str) -> String {
        match self {
            ScenarioId::CreateOne => format!("creates a new {} on POST /{}", resource, endpoint),
            ScenarioId::CreateTwo => format!("creates more than one {} in a row", resource),
            ScenarioId::DuplicateNameRejected => {
                format!("rejects a second {} with the same Name", resource)
            }
            ScenarioId::MissingNameRejected => {
                format!("rejects a {} without a Name field", resource)
            }
            ScenarioId::ListAll => format!("lists all {} as {{Id, Name}} objects", endpoint),
            ScenarioId::GetByIdValid => format!("returns a created {} by Id", resource),
            ScenarioId::GetByIdInvalid => {
                format!("returns 404 for a {} with an unknown Id", resource)
            }
            ScenarioId::DeleteValid => format!("deletes an existing {}", resource),
            ScenarioId::DeleteInvalid => {
                format!("returns 404 deleting a {} with an unknown Id", resource)
            }
            ScenarioId::UnauthorizedList => format!("returns 401 on GET /{}", endpoint),
            ScenarioId::UnauthorizedGetById => format!("returns 401 on GET /{}/id/{{id}}", endpoint),
            ScenarioId::UnauthorizedCreate => format!("returns 401 on POST /{}", endpoint),
            ScenarioId::UnauthorizedDelete => {
                format!("returns 401 on DELETE /{}/id/{{id}}", endpoint)
            }
        }
    }

    pub async fn run<T: Transport>(&self, ctx: &ScenarioContext<'_, T>) -> ConformanceResult<()> {
        match self {
            ScenarioId::CreateOne => create::create_one(ctx).await,
            ScenarioId::CreateTwo => create::create_two(ctx).await,
            ScenarioId::DuplicateNameRejected => create::duplicate_name_rejected(ctx).await,
            ScenarioId::MissingNameRejected => create::missing_name_rejected(ctx).await,
            ScenarioId::ListAll => list::list_all(ctx).await,
            ScenarioId::GetByIdValid => get_by_id::get_by_id_valid(ctx).await,
            ScenarioId::GetByIdInvalid => get_by_id::get_by_id_invalid(ctx).await,
            ScenarioId::DeleteValid => delete::delete_valid(ctx).await,
            ScenarioId::DeleteInvalid => delete::delete_invalid(ctx).await,
            ScenarioId::UnauthorizedList => unauthorized::list(ctx).await,
            ScenarioId::UnauthorizedGetById => unauthorized::get_by_id(ctx).await,
            ScenarioId::UnauthorizedCreate => unauthorized::create(ctx).await,
            ScenarioId::UnauthorizedDelete => unauthorized::delete(ctx).await,
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::Credential;
    use crate::error::ConformanceError;
    use crate::transport::{ApiRequest, ApiResponse, Method};
    use async_trait::async_trait;
    use std::collections::HashSet;

    /// Accepts every POST with an empty 200 and always lists an empty collection.
    struct Forgetful;

    #[async_trait]
    impl Transport for Forgetful {
        async fn send(&self, request: ApiRequest) -> ConformanceResult<ApiResponse> {
            match request.method {
                Method::Post => Ok(ApiResponse::new(200, "")),
                Method::Get => Ok(ApiResponse::new(200, "[]")),
                Method::Delete => Ok(ApiResponse::new(404, "")),
            }
        }
    }

    async fn run_forgetful(id: ScenarioId) -> ConformanceError {
        let transport = Forgetful;
        let credential = Credential::from_token("tok");
        let names = NameGenerator::new("widget");
        let created = CreatedNames::default();
        let config = SuiteConfig::new("http://api", "http://api/token");
        let ctx = ScenarioContext {
            client: ResourceClient::new(&transport, "http://api/widgets", Some(&credential)),
            names: &names,
            created: &created,
            config: &config,
        };
        id.run(&ctx).await.unwrap_err()
    }

    #[tokio::test]
    async fn creates_that_do_not_persist_fail_the_count_oracle() {
        let err = run_forgetful(ScenarioId::CreateOne).await;
        assert_eq!(
            err.to_string(),
            "after one create: expected 1 objects (0 before + 1), found 0"
        );
        let err = run_forgetful(ScenarioId::CreateTwo).await;
        assert!(err.to_string().contains("expected 2 objects"));
    }

    #[tokio::test]
    async fn accepting_everything_fails_the_rejection_scenarios() {
        for id in [ScenarioId::DuplicateNameRejected, ScenarioId::MissingNameRejected] {
            let err = run_forgetful(id).await;
            assert!(
                err.to_string().contains("expected status 400, got 200"),
                "{}: {}",
                id,
                err
            );
        }
    }

    #[tokio::test]
    async fn unfindable_created_object_fails_the_round_trip() {
        let err = run_forgetful(ScenarioId::GetByIdValid).await;
        assert!(err.to_string().contains("lists no objects"), "{}", err);
    }

    #[test]
    fn groups_partition_the_matrix() {
        let all: HashSet<ScenarioId> = ScenarioId::AUTHORIZED
            .iter()
            .chain(ScenarioId::UNAUTHORIZED.iter())
            .copied()
            .collect();
        assert_eq!(all.len(), 13);
        assert!(ScenarioId::AUTHORIZED
            .iter()
            .all(|id| id.group() == ScenarioGroup::Authorized));
        assert!(ScenarioId::UNAUTHORIZED
            .iter()
            .all(|id| id.group() == ScenarioGroup::Unauthorized));
    }

    #[test]
    fn titles_mention_endpoint_or_resource() {
        assert_eq!(
            ScenarioId::CreateOne.title("widgets", "widget"),
            "creates a new widget on POST /widgets"
        );
        assert_eq!(
            ScenarioId::UnauthorizedDelete.title("widgets", "widget"),
            "returns 401 on DELETE /widgets/id/{id}"
        );
    }

    #[test]
    fn slug_matches_serialized_name() {
        for id in ScenarioId::AUTHORIZED.iter().chain(ScenarioId::UNAUTHORIZED.iter()) {
            let value = serde_json::to_value(id).unwrap();
            assert_eq!(value, id.slug());
        }
    }
}
