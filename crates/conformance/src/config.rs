//! Suite configuration: where the API lives, how to log in, and the oracle constants.
//!
//! Values come from a TOML run file ([`RunConfig::from_file`]) or from
//! `CRUDCHECK_*` environment variables ([`SuiteConfig::from_env`]).

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConformanceError, ConformanceResult};

pub const DEFAULT_USERNAME: &str = "usernameTest";
pub const DEFAULT_PASSWORD: &str = "qwerty123";

/// Id that no live object is expected to have.
pub const DEFAULT_MISSING_ID: i64 = 1_000_000;

/// Id used by the unauthenticated item probes.
pub const DEFAULT_PROBE_ID: i64 = 1;

pub const DEFAULT_DUPLICATE_MESSAGE: &str = "Duplicate results found for identifier.";
pub const DEFAULT_INVALID_MESSAGE: &str = "Invalid request.";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_BASE_URL: &str = "CRUDCHECK_BASE_URL";
pub const ENV_TOKEN_URL: &str = "CRUDCHECK_TOKEN_URL";
pub const ENV_USERNAME: &str = "CRUDCHECK_USERNAME";
pub const ENV_PASSWORD: &str = "CRUDCHECK_PASSWORD";
pub const ENV_TEARDOWN: &str = "CRUDCHECK_TEARDOWN";

/// Run-file fields that fall back to an environment variable.
const ENV_FIELDS: [(&str, &str); 5] = [
    ("base_url", ENV_BASE_URL),
    ("token_url", ENV_TOKEN_URL),
    ("username", ENV_USERNAME),
    ("password", ENV_PASSWORD),
    ("teardown", ENV_TEARDOWN),
];

/// Which objects the cleanup pass deletes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeardownScope {
    /// Every object the collection lists after the run.
    #[default]
    All,
    /// Only objects whose name was generated during this run.
    Created,
}

impl FromStr for TeardownScope {
    type Err = ConformanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TeardownScope::All),
            "created" => Ok(TeardownScope::Created),
            other => Err(ConformanceError::Config(format!(
                "unknown teardown scope '{}' (expected 'all' or 'created')",
                other
            ))),
        }
    }
}

fn default_username() -> String {
    DEFAULT_USERNAME.to_string()
}

fn default_password() -> String {
    DEFAULT_PASSWORD.to_string()
}

fn default_missing_id() -> i64 {
    DEFAULT_MISSING_ID
}

fn default_probe_id() -> i64 {
    DEFAULT_PROBE_ID
}

fn default_duplicate_message() -> String {
    DEFAULT_DUPLICATE_MESSAGE.to_string()
}

fn default_invalid_message() -> String {
    DEFAULT_INVALID_MESSAGE.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Everything one resource suite needs besides the endpoint and resource name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Base URL of the API under test, e.g. `http://localhost:5000/api`.
    pub base_url: String,
    /// Token issuer URL; receives the password-grant form POST as-is.
    pub token_url: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_missing_id")]
    pub missing_id: i64,
    #[serde(default = "default_probe_id")]
    pub probe_id: i64,
    /// Exact body text expected when a duplicate `Name` is rejected.
    #[serde(default = "default_duplicate_message")]
    pub duplicate_message: String,
    /// Exact body text expected when `Name` is missing.
    #[serde(default = "default_invalid_message")]
    pub invalid_message: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub teardown: TeardownScope,
}

impl SuiteConfig {
    pub fn new(base_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        SuiteConfig {
            base_url: base_url.into(),
            token_url: token_url.into(),
            username: default_username(),
            password: default_password(),
            missing_id: DEFAULT_MISSING_ID,
            probe_id: DEFAULT_PROBE_ID,
            duplicate_message: default_duplicate_message(),
            invalid_message: default_invalid_message(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            teardown: TeardownScope::default(),
        }
    }

    /// Build a config from `CRUDCHECK_*` environment variables.
    pub fn from_env() -> ConformanceResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. `from_env` delegates here.
    pub fn from_lookup<F>(lookup: F) -> ConformanceResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConformanceError::Config(format!("{} is not set", key)))
        };

        let mut config = SuiteConfig::new(require(ENV_BASE_URL)?, require(ENV_TOKEN_URL)?);
        if let Some(username) = lookup(ENV_USERNAME) {
            config.username = username;
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            config.password = password;
        }
        if let Some(scope) = lookup(ENV_TEARDOWN) {
            config.teardown = scope.parse()?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject configs that cannot possibly address an API.
    pub fn validate(&self) -> ConformanceResult<()> {
        for (field, value) in [("base_url", &self.base_url), ("token_url", &self.token_url)] {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(ConformanceError::Config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    field, value
                )));
            }
        }
        if self.timeout_secs == 0 {
            return Err(ConformanceError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// `{base_url}/{endpoint}` with redundant slashes removed.
    pub fn collection_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_matches('/')
        )
    }
}

/// `{collection_url}/id/{id}`
pub fn item_url(collection_url: &str, id: i64) -> String {
    format!("{}/id/{}", collection_url, id)
}

/// One resource type to run the suite against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTarget {
    pub endpoint: String,
    pub name: String,
}

impl FromStr for ResourceTarget {
    type Err = ConformanceError;

    /// Parses `ENDPOINT:NAME`; a bare `ENDPOINT` reuses the endpoint as the name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (endpoint, name) = match s.split_once(':') {
            Some((endpoint, name)) => (endpoint.trim(), name.trim()),
            None => (s.trim(), s.trim()),
        };
        if endpoint.is_empty() || name.is_empty() {
            return Err(ConformanceError::Config(format!(
                "invalid resource '{}' (expected ENDPOINT:NAME)",
                s
            )));
        }
        Ok(ResourceTarget {
            endpoint: endpoint.trim_matches('/').to_string(),
            name: name.to_string(),
        })
    }
}

/// A TOML run file: shared suite settings plus the resources to check.
///
/// ```toml
/// base_url = "http://localhost:5000/api"
/// token_url = "http://localhost:5000/token"
///
/// [[resources]]
/// endpoint = "widgets"
/// name = "widget"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(flatten)]
    pub suite: SuiteConfig,
    #[serde(default)]
    pub resources: Vec<ResourceTarget>,
}

impl RunConfig {
    pub fn from_file(path: &Path) -> ConformanceResult<Self> {
        Self::from_file_over(path, |_| None)
    }

    /// Load a run file; fields it leaves unset are taken from `lookup`
    /// (keyed by the `CRUDCHECK_*` names) before the built-in defaults.
    pub fn from_file_over<F>(path: &Path, lookup: F) -> ConformanceResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConformanceError::Config(format!("could not read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_over(&content, lookup)
            .map_err(|e| ConformanceError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        Self::from_toml_over(content, |_| None)
    }

    pub fn from_toml_over<F>(content: &str, lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut table: toml::Table = content.parse().map_err(|e: toml::de::Error| e.to_string())?;
        for (field, key) in ENV_FIELDS {
            if table.contains_key(field) {
                continue;
            }
            if let Some(value) = lookup(key) {
                let value = if field == "teardown" {
                    value.trim().to_ascii_lowercase()
                } else {
                    value
                };
                table.insert(field.to_string(), toml::Value::String(value));
            }
        }

        let config: RunConfig = toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| e.to_string())?;
        config.suite.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }

    pub fn ensure_resources(&self) -> ConformanceResult<()> {
        if self.resources.is_empty() {
            return Err(ConformanceError::Config(
                "no resources configured (add [[resources]] or pass --resource)".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn new_fills_defaults() {
        let config = SuiteConfig::new("http://api", "http://auth/token");
        assert_eq!(config.username, "usernameTest");
        assert_eq!(config.password, "qwerty123");
        assert_eq!(config.missing_id, 1_000_000);
        assert_eq!(config.duplicate_message, "Duplicate results found for identifier.");
        assert_eq!(config.invalid_message, "Invalid request.");
        assert_eq!(config.teardown, TeardownScope::All);
    }

    #[test]
    fn lookup_requires_base_url() {
        let err = SuiteConfig::from_lookup(lookup_from(&[(ENV_TOKEN_URL, "http://t")]))
            .unwrap_err();
        assert!(err.to_string().contains("CRUDCHECK_BASE_URL"));
    }

    #[test]
    fn lookup_overrides_credentials_and_scope() {
        let config = SuiteConfig::from_lookup(lookup_from(&[
            (ENV_BASE_URL, "http://localhost:5000/api"),
            (ENV_TOKEN_URL, "http://localhost:5000/token"),
            (ENV_USERNAME, "alice"),
            (ENV_PASSWORD, "secret"),
            (ENV_TEARDOWN, "Created"),
        ]))
        .unwrap();
        assert_eq!(config.username, "alice");
        assert_eq!(config.password, "secret");
        assert_eq!(config.teardown, TeardownScope::Created);
    }

    #[test]
    fn validate_rejects_non_http_urls() {
        let config = SuiteConfig::new("localhost:5000", "http://t");
        assert!(matches!(config.validate(), Err(ConformanceError::Config(_))));
    }

    #[test]
    fn collection_url_normalizes_slashes() {
        let config = SuiteConfig::new("http://api/v1/", "http://t");
        assert_eq!(config.collection_url("/widgets/"), "http://api/v1/widgets");
        assert_eq!(
            item_url(&config.collection_url("widgets"), 7),
            "http://api/v1/widgets/id/7"
        );
    }

    #[test]
    fn resource_target_parsing() {
        let target: ResourceTarget = "widgets:widget".parse().unwrap();
        assert_eq!(target.endpoint, "widgets");
        assert_eq!(target.name, "widget");

        let bare: ResourceTarget = "gadgets".parse().unwrap();
        assert_eq!(bare.name, "gadgets");

        assert!(":widget".parse::<ResourceTarget>().is_err());
    }

    #[test]
    fn run_config_from_toml() {
        let config = RunConfig::from_toml_str(
            r#"
            base_url = "http://localhost:5000/api"
            token_url = "http://localhost:5000/token"
            teardown = "created"
            missing_id = 424242

            [[resources]]
            endpoint = "widgets"
            name = "widget"

            [[resources]]
            endpoint = "gadgets"
            name = "gadget"
            "#,
        )
        .unwrap();
        assert_eq!(config.resources.len(), 2);
        assert_eq!(config.suite.teardown, TeardownScope::Created);
        assert_eq!(config.suite.missing_id, 424242);
        assert_eq!(config.suite.username, DEFAULT_USERNAME);
    }

    #[test]
    fn run_config_without_resources_is_rejected_on_demand() {
        let config = RunConfig::from_toml_str(
            r#"
            base_url = "http://a"
            token_url = "http://b"
            "#,
        )
        .unwrap();
        assert!(config.ensure_resources().is_err());
    }

    #[test]
    fn run_config_from_file_names_the_file_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.toml");
        std::fs::write(
            &good,
            "base_url = \"http://a\"\ntoken_url = \"http://b\"\n[[resources]]\nendpoint = \"widgets\"\nname = \"widget\"\n",
        )
        .unwrap();
        assert_eq!(RunConfig::from_file(&good).unwrap().resources.len(), 1);

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "base_url = \"ftp://a\"\ntoken_url = \"http://b\"\n").unwrap();
        let err = RunConfig::from_file(&bad).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn environment_fills_fields_the_file_leaves_unset() {
        let lookup = lookup_from(&[
            (ENV_TOKEN_URL, "http://env/token"),
            (ENV_USERNAME, "env-user"),
            (ENV_PASSWORD, "env-pass"),
            (ENV_TEARDOWN, "Created"),
        ]);
        let config = RunConfig::from_toml_over(
            r#"
            base_url = "http://file/api"
            username = "file-user"
            "#,
            lookup,
        )
        .unwrap();
        assert_eq!(config.suite.base_url, "http://file/api");
        assert_eq!(config.suite.token_url, "http://env/token");
        assert_eq!(config.suite.username, "file-user");
        assert_eq!(config.suite.password, "env-pass");
        assert_eq!(config.suite.teardown, TeardownScope::Created);
    }

    #[test]
    fn run_config_from_missing_file() {
        let err = RunConfig::from_file(Path::new("/nonexistent/crudcheck.toml")).unwrap_err();
        assert!(matches!(err, ConformanceError::Config(_)));
    }
}
