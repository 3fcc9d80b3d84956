//! Bearer credential fixture.
//!
//! One credential is acquired per resource suite with a password-grant form
//! POST to the token issuer, passed by reference to the authorized group and
//! teardown, then released when the suite ends. There is no retry: a failed
//! exchange is fatal to the authorized group.

use std::time::Instant;

use crate::config::SuiteConfig;
use crate::error::{ConformanceError, ConformanceResult};
use crate::transport::{excerpt, ApiRequest, Transport};

/// An opaque bearer token plus when it was obtained.
#[derive(Debug)]
pub struct Credential {
    token: String,
    acquired_at: Instant,
}

impl Credential {
    /// Wrap a token obtained elsewhere.
    pub fn from_token(token: impl Into<String>) -> Self {
        Credential {
            token: token.into(),
            acquired_at: Instant::now(),
        }
    }

    /// Exchange the configured username/password for a bearer token.
    ///
    /// Requires status 200 and a non-empty string `access_token` field.
    pub async fn acquire<T: Transport>(
        transport: &T,
        config: &SuiteConfig,
    ) -> ConformanceResult<Credential> {
        let request = ApiRequest::post(&config.token_url).form(&[
            ("username", config.username.as_str()),
            ("password", config.password.as_str()),
            ("grant_type", "password"),
        ]);

        let response = transport
            .send(request)
            .await
            .map_err(|e| ConformanceError::Credential(e.to_string()))?;

        if response.status != 200 {
            return Err(ConformanceError::Credential(format!(
                "token endpoint {} returned status {} (expected 200): {}",
                config.token_url,
                response.status,
                excerpt(&response.body)
            )));
        }

        let body = response
            .json(&config.token_url)
            .map_err(|e| ConformanceError::Credential(e.to_string()))?;
        let token = body
            .get("access_token")
            .and_then(|t| t.as_str())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ConformanceError::Credential(format!(
                    "token response from {} has no access_token",
                    config.token_url
                ))
            })?;

        tracing::info!(token_url = %config.token_url, user = %config.username, "bearer credential acquired");
        Ok(Credential::from_token(token))
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// End the credential's scope. Tokens expire on their own; nothing is revoked.
    pub fn release(self) {
        tracing::debug!(
            held_ms = self.acquired_at.elapsed().as_millis() as u64,
            "bearer credential released"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{ApiResponse, RequestBody};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct TokenIssuer {
        response: ApiResponse,
        seen: Mutex<Vec<ApiRequest>>,
    }

    impl TokenIssuer {
        fn replying(status: u16, body: &str) -> Self {
            TokenIssuer {
                response: ApiResponse::new(status, body),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for TokenIssuer {
        async fn send(&self, request: ApiRequest) -> ConformanceResult<ApiResponse> {
            self.seen.lock().unwrap().push(request);
            Ok(self.response.clone())
        }
    }

    fn config() -> SuiteConfig {
        SuiteConfig::new("http://api", "http://auth/token")
    }

    #[tokio::test]
    async fn acquire_posts_password_grant_form() {
        let issuer = TokenIssuer::replying(200, r#"{"access_token":"tok-1","expires_in":300}"#);
        let credential = Credential::acquire(&issuer, &config()).await.unwrap();
        assert_eq!(credential.token(), "tok-1");

        let seen = issuer.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].url, "http://auth/token");
        assert!(seen[0].bearer.is_none());
        match &seen[0].body {
            RequestBody::Form(pairs) => {
                assert!(pairs.contains(&("username".to_string(), "usernameTest".to_string())));
                assert!(pairs.contains(&("password".to_string(), "qwerty123".to_string())));
                assert!(pairs.contains(&("grant_type".to_string(), "password".to_string())));
            }
            other => panic!("expected form body, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn non_200_is_fatal() {
        let issuer = TokenIssuer::replying(400, r#"{"error":"invalid_grant"}"#);
        let err = Credential::acquire(&issuer, &config()).await.unwrap_err();
        assert!(matches!(err, ConformanceError::Credential(_)));
        assert!(err.to_string().contains("400"));
    }

    #[tokio::test]
    async fn missing_access_token_is_fatal() {
        let issuer = TokenIssuer::replying(200, r#"{"token_type":"bearer"}"#);
        let err = Credential::acquire(&issuer, &config()).await.unwrap_err();
        assert!(err.to_string().contains("access_token"));
    }
}
