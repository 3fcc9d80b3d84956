//! Typed access to one collection endpoint, plus the list/count oracle.

use std::sync::Mutex;

use serde_json::{json, Value};

use crate::config::item_url;
use crate::credential::Credential;
use crate::error::{ConformanceError, ConformanceResult};
use crate::transport::{excerpt, ApiRequest, ApiResponse, Transport};

/// Client for `{base}/{endpoint}` and `{base}/{endpoint}/id/{id}`.
///
/// Without a credential every request goes out with no `Authorization`
/// header, which is what the unauthorized group relies on.
pub struct ResourceClient<'a, T: Transport> {
    transport: &'a T,
    collection_url: String,
    credential: Option<&'a Credential>,
}

impl<'a, T: Transport> ResourceClient<'a, T> {
    pub fn new(
        transport: &'a T,
        collection_url: impl Into<String>,
        credential: Option<&'a Credential>,
    ) -> Self {
        ResourceClient {
            transport,
            collection_url: collection_url.into(),
            credential,
        }
    }

    /// Same collection, no credential.
    pub fn anonymous(&self) -> ResourceClient<'a, T> {
        ResourceClient {
            transport: self.transport,
            collection_url: self.collection_url.clone(),
            credential: None,
        }
    }

    pub fn collection_url(&self) -> &str {
        &self.collection_url
    }

    pub fn item_url(&self, id: i64) -> String {
        item_url(&self.collection_url, id)
    }

    async fn send(&self, request: ApiRequest) -> ConformanceResult<ApiResponse> {
        let request = request.bearer(self.credential.map(|c| c.token()));
        self.transport.send(request).await
    }

    /// POST the given JSON body to the collection.
    pub async fn create(&self, body: Value) -> ConformanceResult<ApiResponse> {
        self.send(ApiRequest::post(&self.collection_url).json(body))
            .await
    }

    /// POST `{"Name": name}` to the collection.
    pub async fn create_named(&self, name: &str) -> ConformanceResult<ApiResponse> {
        self.create(json!({ "Name": name })).await
    }

    pub async fn list(&self) -> ConformanceResult<ApiResponse> {
        self.send(ApiRequest::get(&self.collection_url)).await
    }

    pub async fn get_by_id(&self, id: i64) -> ConformanceResult<ApiResponse> {
        self.send(ApiRequest::get(self.item_url(id))).await
    }

    pub async fn delete_by_id(&self, id: i64) -> ConformanceResult<ApiResponse> {
        self.send(ApiRequest::delete(self.item_url(id))).await
    }

    /// Every listed object, in the order the server returned them.
    ///
    /// Anything other than a 200 with a JSON array body is a hard failure.
    pub async fn fetch_all(&self) -> ConformanceResult<Vec<Value>> {
        let response = self.list().await?;
        expect_status(&response, 200, &format!("GET {}", self.collection_url))?;
        match response.json(&self.collection_url)? {
            Value::Array(items) => Ok(items),
            other => Err(ConformanceError::Parse {
                url: self.collection_url.clone(),
                message: format!("expected a JSON array, got {}", json_type(&other)),
            }),
        }
    }

    /// Count oracle: number of objects currently listed.
    pub async fn total_count(&self) -> ConformanceResult<usize> {
        Ok(self.fetch_all().await?.len())
    }

    /// Work out the id of an object just created with `name`.
    ///
    /// Prefers the `Id` echoed in the create response. Otherwise looks the
    /// name up in a fresh listing, and as a last resort takes the final
    /// listed object, which is only right if the server lists in insertion
    /// order.
    pub async fn resolve_created_id(
        &self,
        name: &str,
        create_response: &ApiResponse,
    ) -> ConformanceResult<i64> {
        if let Some(id) = id_from_body(&create_response.body) {
            return Ok(id);
        }

        let objects = self.fetch_all().await?;
        if let Some(id) = objects
            .iter()
            .find(|o| o.get("Name").and_then(|n| n.as_str()) == Some(name))
            .and_then(object_id)
        {
            tracing::debug!(%name, id, "resolved created id from listing");
            return Ok(id);
        }

        let last = objects.last().ok_or_else(|| {
            ConformanceError::assertion(format!(
                "created '{}' but GET {} lists no objects",
                name, self.collection_url
            ))
        })?;
        tracing::warn!(
            %name,
            collection = %self.collection_url,
            "created object not identifiable by id or name; assuming the last listed object"
        );
        object_id(last).ok_or_else(|| ConformanceError::Parse {
            url: self.collection_url.clone(),
            message: format!("last listed object has no numeric Id: {}", last),
        })
    }
}

/// `Id` of a listed object, if it is an integer.
pub fn object_id(object: &Value) -> Option<i64> {
    object.get("Id").and_then(|id| id.as_i64())
}

/// `Id` from a create response body, when the server returns the object.
pub fn id_from_body(body: &str) -> Option<i64> {
    serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(object_id)
}

/// Check a listed object has exactly the keys `Id` (number) and `Name` (string).
pub fn check_object_shape(object: &Value) -> Result<(), String> {
    let map = object
        .as_object()
        .ok_or_else(|| format!("expected an object, got {}", json_type(object)))?;

    let mut keys: Vec<&str> = map.keys().map(|k| k.as_str()).collect();
    keys.sort_unstable();
    if keys != ["Id", "Name"] {
        return Err(format!("expected keys [Id, Name], got {:?}", keys));
    }
    if !map["Id"].is_number() {
        return Err(format!("Id must be a number, got {}", json_type(&map["Id"])));
    }
    if !map["Name"].is_string() {
        return Err(format!(
            "Name must be a string, got {}",
            json_type(&map["Name"])
        ));
    }
    Ok(())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Fail unless the response carries `expected`.
pub fn expect_status(response: &ApiResponse, expected: u16, what: &str) -> ConformanceResult<()> {
    if response.status == expected {
        Ok(())
    } else {
        Err(ConformanceError::assertion(format!(
            "{}: expected status {}, got {} (body: {})",
            what,
            expected,
            response.status,
            excerpt(&response.body)
        )))
    }
}

/// Fail unless the body text is exactly `expected`.
pub fn expect_body_text(response: &ApiResponse, expected: &str, what: &str) -> ConformanceResult<()> {
    if response.body == expected {
        Ok(())
    } else {
        Err(ConformanceError::assertion(format!(
            "{}: expected body {:?}, got {:?}",
            what,
            expected,
            excerpt(&response.body)
        )))
    }
}

/// Fail unless the count oracle moved by exactly the expected amount.
pub fn expect_count(before: usize, delta: usize, after: usize, what: &str) -> ConformanceResult<()> {
    if before + delta == after {
        Ok(())
    } else {
        Err(ConformanceError::assertion(format!(
            "{}: expected {} objects ({} before + {}), found {}",
            what,
            before + delta,
            before,
            delta,
            after
        )))
    }
}

/// Names this run attempted to create; consulted by the `created` teardown scope.
#[derive(Debug, Default)]
pub struct CreatedNames {
    names: Mutex<Vec<String>>,
}

impl CreatedNames {
    pub fn record(&self, name: &str) {
        if let Ok(mut names) = self.names.lock() {
            names.push(name.to_string());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names
            .lock()
            .map(|names| names.iter().any(|n| n == name))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.names.lock().map(|names| names.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
