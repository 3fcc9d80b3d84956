//! The resource suite lifecycle and the `resource_conformance_tests!` macro.
//!
//! A run goes: suite lock, credential, authorized group, unauthorized
//! group, teardown, credential release. Scenario order within a run is
//! significant because the count oracle assumes nothing else mutates the
//! collection in between.

use std::sync::OnceLock;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::config::SuiteConfig;
use crate::credential::Credential;
use crate::naming::NameGenerator;
use crate::report::{Outcome, SuiteReport};
use crate::resource::{CreatedNames, ResourceClient};
use crate::scenarios::{ScenarioContext, ScenarioId};
use crate::teardown;
use crate::transport::{Transport, UreqTransport};

/// Held for the whole of [`ResourceSuite::run`], so suites in one process never overlap.
fn suite_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// The scenario matrix for one `(endpoint, resource)` pair.
#[derive(Debug, Clone)]
pub struct ResourceSuite {
    endpoint: String,
    resource: String,
    config: SuiteConfig,
}

impl ResourceSuite {
    pub fn new(
        endpoint: impl Into<String>,
        resource: impl Into<String>,
        config: SuiteConfig,
    ) -> Self {
        ResourceSuite {
            endpoint: endpoint.into().trim_matches('/').to_string(),
            resource: resource.into(),
            config,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Run over real HTTP with a `ureq` transport.
    pub async fn run_http(&self) -> SuiteReport {
        let transport = UreqTransport::new(Duration::from_secs(self.config.timeout_secs));
        self.run(&transport).await
    }

    /// Run every scenario through `transport` and collect the outcomes.
    pub async fn run<T: Transport>(&self, transport: &T) -> SuiteReport {
        let _guard = suite_lock().lock().await;
        tracing::info!(endpoint = %self.endpoint, resource = %self.resource, "conformance suite started");

        let mut report = SuiteReport::new(&self.endpoint, &self.resource);
        let names = NameGenerator::new(&self.resource);
        let created = CreatedNames::default();
        let collection_url = self.config.collection_url(&self.endpoint);

        let credential = match Credential::acquire(transport, &self.config).await {
            Ok(credential) => Some(credential),
            Err(e) => {
                tracing::error!(endpoint = %self.endpoint, error = %e, "suite setup failed");
                report.setup_error = Some(e.to_string());
                None
            }
        };

        let ctx = ScenarioContext {
            client: ResourceClient::new(transport, collection_url, credential.as_ref()),
            names: &names,
            created: &created,
            config: &self.config,
        };

        for id in ScenarioId::AUTHORIZED {
            let outcome = match report.setup_error {
                Some(ref error) => Outcome::NotRun {
                    reason: format!("no credential: {}", error),
                },
                None => self.run_scenario(id, &ctx).await,
            };
            report.record(id, outcome);
        }

        for id in ScenarioId::UNAUTHORIZED {
            let outcome = self.run_scenario(id, &ctx).await;
            report.record(id, outcome);
        }

        if credential.is_some() {
            report.teardown = Some(teardown::run(&ctx.client, self.config.teardown, &created).await);
        }
        drop(ctx);
        if let Some(credential) = credential {
            credential.release();
        }

        tracing::info!(
            endpoint = %self.endpoint,
            passed = report.passed_count(),
            failed = report.failure_count(),
            "conformance suite finished"
        );
        report
    }

    async fn run_scenario<T: Transport>(
        &self,
        id: ScenarioId,
        ctx: &ScenarioContext<'_, T>,
    ) -> Outcome {
        let result = id.run(ctx).await;
        match result {
            Ok(()) => tracing::debug!(scenario = %id, "passed"),
            Err(ref e) => {
                tracing::warn!(endpoint = %self.endpoint, scenario = %id, error = %e, "scenario failed")
            }
        }
        Outcome::from_result(result)
    }
}

/// Generate one `#[tokio::test]` per resource, each running the full suite.
///
/// The config expression is evaluated inside the generated async test, so it
/// may `.await`. A test fails with the report's failure summary when setup or
/// any scenario fails; teardown problems are only logged.
///
/// # Usage
///
/// ```rust,ignore
/// use crudcheck_conformance::{resource_conformance_tests, SuiteConfig};
///
/// resource_conformance_tests! {
///     SuiteConfig::from_env().expect("CRUDCHECK_* variables");
///     widgets_conform => ("widgets", "widget"),
///     gadgets_conform => ("gadgets", "gadget"),
/// }
/// ```
#[macro_export]
macro_rules! resource_conformance_tests {
    ($config:expr; $( $test_name:ident => ($endpoint:expr, $resource:expr) ),+ $(,)?) => {
        $(
            #[tokio::test(flavor = "multi_thread")]
            async fn $test_name() {
                let config: $crate::SuiteConfig = $config;
                let report = $crate::ResourceSuite::new($endpoint, $resource, config)
                    .run_http()
                    .await;
                assert!(report.passed(), "{}", report.failure_summary());
            }
        )+
    };
}
