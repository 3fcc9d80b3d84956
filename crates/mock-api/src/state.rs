//! Shared state: users, issued tokens, and the per-endpoint collections.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use tokio::sync::RwLock;

/// Deviations from the conforming behaviour, for testing suites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    /// Accept a create whose `Name` already exists.
    AllowDuplicateNames,
    /// Skip bearer-token checks entirely.
    OpenAccess,
    /// Add a `CreatedAt` field to listed objects.
    ExtraListField,
    /// Answer a successful create with an empty body instead of the object.
    OmitCreatedId,
    /// List objects newest first.
    ReverseListing,
    /// Refuse every delete with 500.
    RejectDeletes,
    /// Answer a create with 200 and the object, but never store it.
    DropCreates,
    /// Reject duplicates and missing names with a generic 400 body.
    WrongErrorText,
    /// Store a create that has no `Name`, under an empty name.
    AcceptMissingName,
    /// Answer 200 for ids the collection never issued.
    FoundForMissingId,
    /// Return a different `Name` from GET by id than the one stored.
    WrongNameOnGet,
}

#[derive(Debug, Clone)]
pub struct MockConfig {
    pub endpoints: Vec<String>,
    pub username: String,
    pub password: String,
    pub faults: HashSet<Fault>,
    /// How long an issued token stays valid.
    pub token_lifetime: Duration,
}

impl MockConfig {
    /// Conforming API with the default test user `usernameTest` / `qwerty123`.
    pub fn new<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MockConfig {
            endpoints: endpoints.into_iter().map(Into::into).collect(),
            username: "usernameTest".to_string(),
            password: "qwerty123".to_string(),
            faults: HashSet::new(),
            token_lifetime: Duration::from_secs(crate::TOKEN_LIFETIME_SECS),
        }
    }

    pub fn with_user(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub fn with_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.faults.insert(fault);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Name")]
    pub name: String,
}

/// Why a create was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateError {
    Duplicate,
}

#[derive(Debug, Default)]
struct Collection {
    next_id: i64,
    items: Vec<StoredObject>,
}

pub struct MockState {
    config: MockConfig,
    /// Issued tokens and when they were issued.
    tokens: RwLock<HashMap<String, Instant>>,
    collections: RwLock<HashMap<String, Collection>>,
}

impl MockState {
    pub fn new(config: MockConfig) -> Self {
        let collections = config
            .endpoints
            .iter()
            .map(|e| (e.clone(), Collection::default()))
            .collect();
        MockState {
            config,
            tokens: RwLock::new(HashMap::new()),
            collections: RwLock::new(collections),
        }
    }

    pub fn has_fault(&self, fault: Fault) -> bool {
        self.config.faults.contains(&fault)
    }

    pub fn serves(&self, endpoint: &str) -> bool {
        self.config.endpoints.iter().any(|e| e == endpoint)
    }

    /// Issue a fresh token when the credentials match the configured user.
    pub async fn issue_token(&self, username: &str, password: &str) -> Option<String> {
        if username != self.config.username || password != self.config.password {
            return None;
        }
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let lifetime = self.config.token_lifetime;
        let mut tokens = self.tokens.write().await;
        tokens.retain(|_, issued| issued.elapsed() < lifetime);
        tokens.insert(token.clone(), Instant::now());
        Some(token)
    }

    /// True for a token this server issued that has not yet expired.
    pub async fn is_valid_token(&self, token: &str) -> bool {
        self.tokens
            .read()
            .await
            .get(token)
            .is_some_and(|issued| issued.elapsed() < self.config.token_lifetime)
    }

    pub fn token_lifetime(&self) -> Duration {
        self.config.token_lifetime
    }

    /// Objects in insertion order. `None` for an endpoint this API does not serve.
    pub async fn list(&self, endpoint: &str) -> Option<Vec<StoredObject>> {
        let collections = self.collections.read().await;
        collections.get(endpoint).map(|c| c.items.clone())
    }

    pub async fn count(&self, endpoint: &str) -> usize {
        self.list(endpoint).await.map(|items| items.len()).unwrap_or(0)
    }

    /// Store a new object. Unknown endpoints are the caller's concern.
    pub async fn create(&self, endpoint: &str, name: &str) -> Result<StoredObject, CreateError> {
        let mut collections = self.collections.write().await;
        let collection = collections.entry(endpoint.to_string()).or_default();

        if !self.has_fault(Fault::AllowDuplicateNames)
            && collection.items.iter().any(|o| o.name == name)
        {
            return Err(CreateError::Duplicate);
        }

        collection.next_id += 1;
        let object = StoredObject {
            id: collection.next_id,
            name: name.to_string(),
        };
        if !self.has_fault(Fault::DropCreates) {
            collection.items.push(object.clone());
        }
        Ok(object)
    }

    /// Whether `id` was ever handed out for `endpoint`, deleted or not.
    pub async fn was_issued(&self, endpoint: &str, id: i64) -> bool {
        let collections = self.collections.read().await;
        collections
            .get(endpoint)
            .is_some_and(|c| id >= 1 && id <= c.next_id)
    }

    pub async fn get(&self, endpoint: &str, id: i64) -> Option<StoredObject> {
        let collections = self.collections.read().await;
        collections
            .get(endpoint)
            .and_then(|c| c.items.iter().find(|o| o.id == id).cloned())
    }

    /// Remove an object; `false` when there was nothing to remove.
    pub async fn delete(&self, endpoint: &str, id: i64) -> bool {
        let mut collections = self.collections.write().await;
        match collections.get_mut(endpoint) {
            Some(collection) => {
                let before = collection.items.len();
                collection.items.retain(|o| o.id != id);
                collection.items.len() != before
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ids_are_assigned_in_order_and_never_reused() {
        let state = MockState::new(MockConfig::new(["widgets"]));
        let a = state.create("widgets", "a").await.unwrap();
        let b = state.create("widgets", "b").await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        assert!(state.delete("widgets", 2).await);
        let c = state.create("widgets", "c").await.unwrap();
        assert_eq!(c.id, 3);
        assert_eq!(state.count("widgets").await, 2);
    }

    #[tokio::test]
    async fn tokens_expire_after_their_lifetime() {
        let state = MockState::new(
            MockConfig::new(["widgets"]).with_token_lifetime(Duration::from_millis(50)),
        );
        let token = state.issue_token("usernameTest", "qwerty123").await.unwrap();
        assert!(state.is_valid_token(&token).await);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(!state.is_valid_token(&token).await);

        let fresh = state.issue_token("usernameTest", "qwerty123").await.unwrap();
        assert!(state.is_valid_token(&fresh).await);
        assert_eq!(state.tokens.read().await.len(), 1);
    }

    #[tokio::test]
    async fn dropped_creates_issue_ids_but_store_nothing() {
        let state = MockState::new(MockConfig::new(["widgets"]).with_fault(Fault::DropCreates));
        let a = state.create("widgets", "a").await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(state.count("widgets").await, 0);
        assert!(state.was_issued("widgets", 1).await);
        assert!(!state.was_issued("widgets", 2).await);
        assert!(state.create("widgets", "a").await.is_ok());
    }

    #[tokio::test]
    async fn duplicate_names_are_refused_unless_faulted() {
        let strict = MockState::new(MockConfig::new(["widgets"]));
        strict.create("widgets", "a").await.unwrap();
        assert_eq!(strict.create("widgets", "a").await, Err(CreateError::Duplicate));

        let lax = MockState::new(MockConfig::new(["widgets"]).with_fault(Fault::AllowDuplicateNames));
        lax.create("widgets", "a").await.unwrap();
        assert!(lax.create("widgets", "a").await.is_ok());
    }

    #[tokio::test]
    async fn tokens_only_for_matching_credentials() {
        let state = MockState::new(MockConfig::new(["widgets"]).with_user("u", "p"));
        assert!(state.issue_token("u", "wrong").await.is_none());
        let token = state.issue_token("u", "p").await.unwrap();
        assert_eq!(token.len(), 32);
        assert!(state.is_valid_token(&token).await);
        assert!(!state.is_valid_token("forged").await);
    }

    #[tokio::test]
    async fn unknown_endpoint_lists_nothing() {
        let state = MockState::new(MockConfig::new(["widgets"]));
        assert!(state.list("gadgets").await.is_none());
        assert!(!state.delete("gadgets", 1).await);
    }
}
