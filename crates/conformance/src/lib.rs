//! Black-box conformance suite for token-authenticated REST CRUD resources.
//!
//! Given an endpoint path and a resource name, [`ResourceSuite`] runs the
//! same scenario matrix against `{base_url}/{endpoint}`: credential
//! acquisition, creation, listing, lookup by id, deletion, unauthenticated
//! access, and a final cleanup pass. Results come back as a
//! [`SuiteReport`]; the [`resource_conformance_tests!`] macro turns a list
//! of resources into `#[tokio::test]` functions.
//!
//! The suite assumes it is the only writer to the collection while it runs.
//! Suites are serialized process-wide, so several generated tests in one
//! binary never race on the count oracle.

pub mod config;
pub mod credential;
pub mod error;
pub mod naming;
pub mod report;
pub mod resource;
pub mod scenarios;
pub mod suite;
pub mod teardown;
pub mod transport;

pub use config::{ResourceTarget, RunConfig, SuiteConfig, TeardownScope};
pub use credential::Credential;
pub use error::{ConformanceError, ConformanceResult, FailureKind};
pub use naming::NameGenerator;
pub use report::{Outcome, ScenarioGroup, ScenarioReport, SuiteReport, TeardownReport};
pub use resource::ResourceClient;
pub use scenarios::ScenarioId;
pub use suite::ResourceSuite;
pub use transport::{ApiRequest, ApiResponse, Method, RequestBody, Transport, UreqTransport};
