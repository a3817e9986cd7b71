//! Firestore REST v1 implementation of [`CharacterStore`].
//!
//! Characters live as documents under a configurable collection; document
//! fields use Firestore's typed-value JSON encoding. Ownership listing runs
//! a `:runQuery` with an equality filter on `userId` ordered by `createdAt`
//! descending, matching how the source system indexed its library view.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use studio_core::character::{Character, CharacterStatus, Visualization};
use studio_gcp::TokenProvider;

use crate::{CharacterStore, StoreError};

const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";

pub struct FirestoreStore {
    http: reqwest::Client,
    tokens: Arc<TokenProvider>,
    project_id: String,
    collection: String,
    base_url: String,
}

impl FirestoreStore {
    pub fn new(
        http: reqwest::Client,
        tokens: Arc<TokenProvider>,
        project_id: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            http,
            tokens,
            project_id: project_id.into(),
            collection: collection.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at a non-default endpoint (emulator).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn documents_root(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.base_url, self.project_id
        )
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/{}/{}", self.documents_root(), self.collection, id)
    }

    async fn bearer(&self) -> Result<String, StoreError> {
        self.tokens
            .access_token()
            .await
            .map_err(|e| StoreError::Upstream(e.to_string()))
    }
}

#[async_trait]
impl CharacterStore for FirestoreStore {
    async fn insert(&self, character: &Character) -> Result<(), StoreError> {
        let token = self.bearer().await?;
        let response = self
            .http
            .patch(self.document_url(&character.id))
            .bearer_auth(token)
            .json(&json!({ "fields": character_fields(character) }))
            .send()
            .await
            .map_err(|e| StoreError::Upstream(e.to_string()))?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Character>, StoreError> {
        let token = self.bearer().await?;
        let response = self
            .http
            .get(self.document_url(id))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| StoreError::Upstream(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let document: Value = ensure_success(response).await?;
        decode_document(&document).map(Some)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Character>, StoreError> {
        let token = self.bearer().await?;
        let response = self
            .http
            .post(format!("{}:runQuery", self.documents_root()))
            .bearer_auth(token)
            .json(&run_query_body(&self.collection, user_id))
            .send()
            .await
            .map_err(|e| StoreError::Upstream(e.to_string()))?;

        let results: Value = ensure_success(response).await?;
        let entries = results
            .as_array()
            .ok_or_else(|| StoreError::Decode("runQuery response is not an array".into()))?;

        let mut characters = Vec::new();
        for entry in entries {
            // Entries without a `document` key carry read metadata only.
            if let Some(document) = entry.get("document") {
                characters.push(decode_document(document)?);
            }
        }
        Ok(characters)
    }

    async fn update_status(
        &self,
        id: &str,
        status: CharacterStatus,
        model_endpoint: Option<String>,
    ) -> Result<(), StoreError> {
        let current = self
            .get(id)
            .await?
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        current.status.validate_transition(status)?;

        let endpoint = model_endpoint.or(current.model_endpoint);
        let mut fields = Map::new();
        fields.insert("status".into(), string_value(status.as_str()));
        fields.insert(
            "modelEndpoint".into(),
            match &endpoint {
                Some(e) => string_value(e),
                None => json!({ "nullValue": null }),
            },
        );

        let token = self.bearer().await?;
        let response = self
            .http
            .patch(self.document_url(id))
            .query(&[
                ("updateMask.fieldPaths", "status"),
                ("updateMask.fieldPaths", "modelEndpoint"),
            ])
            .bearer_auth(token)
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(|e| StoreError::Upstream(e.to_string()))?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn append_visualization(
        &self,
        id: &str,
        visualization: &Visualization,
    ) -> Result<(), StoreError> {
        let mut current = self
            .get(id)
            .await?
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        current.visualizations.push(visualization.clone());

        let token = self.bearer().await?;
        let response = self
            .http
            .patch(self.document_url(id))
            .query(&[("updateMask.fieldPaths", "visualizations")])
            .bearer_auth(token)
            .json(&json!({
                "fields": {
                    "visualizations": visualization_array(&current.visualizations),
                }
            }))
            .send()
            .await
            .map_err(|e| StoreError::Upstream(e.to_string()))?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let token = self.bearer().await?;
        let response = self
            .http
            .delete(self.document_url(id))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| StoreError::Upstream(e.to_string()))?;

        // Deleting an already-absent document is fine for compensation, and
        // a successful delete has an empty body -- check the status only.
        match response.status() {
            status if status.is_success() => Ok(()),
            reqwest::StatusCode::NOT_FOUND => Ok(()),
            status => {
                let body = response.text().await.unwrap_or_default();
                tracing::error!(%status, body = %body, "Firestore delete failed");
                Err(StoreError::Upstream(format!("Firestore returned {status}")))
            }
        }
    }
}

/// Read the response body as JSON, mapping non-2xx statuses to `Upstream`.
async fn ensure_success(response: reqwest::Response) -> Result<Value, StoreError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::error!(%status, body = %body, "Firestore request failed");
        return Err(StoreError::Upstream(format!(
            "Firestore returned {status}"
        )));
    }
    response
        .json()
        .await
        .map_err(|e| StoreError::Decode(format!("Invalid Firestore response: {e}")))
}

// ---------------------------------------------------------------------------
// Query construction
// ---------------------------------------------------------------------------

fn run_query_body(collection: &str, user_id: &str) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": "userId" },
                    "op": "EQUAL",
                    "value": { "stringValue": user_id },
                }
            },
            "orderBy": [
                { "field": { "fieldPath": "createdAt" }, "direction": "DESCENDING" }
            ],
        }
    })
}

// ---------------------------------------------------------------------------
// Typed-value encoding
// ---------------------------------------------------------------------------

fn string_value(s: &str) -> Value {
    json!({ "stringValue": s })
}

fn timestamp_value(t: DateTime<Utc>) -> Value {
    json!({ "timestampValue": t.to_rfc3339_opts(SecondsFormat::Micros, true) })
}

fn string_array(items: &[String]) -> Value {
    let values: Vec<Value> = items.iter().map(|s| string_value(s)).collect();
    json!({ "arrayValue": { "values": values } })
}

fn visualization_array(items: &[Visualization]) -> Value {
    let values: Vec<Value> = items
        .iter()
        .map(|v| {
            json!({
                "mapValue": {
                    "fields": {
                        "id": string_value(&v.id),
                        "imageUrl": string_value(&v.image_url),
                        "prompt": string_value(&v.prompt),
                        "createdAt": timestamp_value(v.created_at),
                    }
                }
            })
        })
        .collect();
    json!({ "arrayValue": { "values": values } })
}

fn character_fields(character: &Character) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("userId".into(), string_value(&character.user_id));
    fields.insert("characterName".into(), string_value(&character.name));
    fields.insert("description".into(), string_value(&character.description));
    fields.insert("keywords".into(), string_array(&character.keywords));
    fields.insert("imageUrls".into(), string_array(&character.image_urls));
    fields.insert("imagePaths".into(), string_array(&character.image_paths));
    fields.insert("status".into(), string_value(character.status.as_str()));
    if let Some(endpoint) = &character.model_endpoint {
        fields.insert("modelEndpoint".into(), string_value(endpoint));
    }
    fields.insert("createdAt".into(), timestamp_value(character.created_at));
    fields.insert(
        "visualizations".into(),
        visualization_array(&character.visualizations),
    );
    fields
}

// ---------------------------------------------------------------------------
// Typed-value decoding
// ---------------------------------------------------------------------------

fn decode_document(document: &Value) -> Result<Character, StoreError> {
    let name = document
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::Decode("Document has no name".into()))?;
    let id = name
        .rsplit('/')
        .next()
        .ok_or_else(|| StoreError::Decode("Document name has no id segment".into()))?
        .to_string();

    let fields = document
        .get("fields")
        .and_then(Value::as_object)
        .ok_or_else(|| StoreError::Decode("Document has no fields".into()))?;

    let status_raw = get_string(fields, "status").unwrap_or_else(|_| "ready".to_string());
    let status = CharacterStatus::parse(&status_raw)
        .map_err(|e| StoreError::Decode(e.to_string()))?;

    Ok(Character {
        id,
        user_id: get_string(fields, "userId")?,
        name: get_string(fields, "characterName")?,
        description: get_string(fields, "description")?,
        keywords: get_string_array(fields, "keywords"),
        image_urls: get_string_array(fields, "imageUrls"),
        image_paths: get_string_array(fields, "imagePaths"),
        status,
        model_endpoint: opt_string(fields, "modelEndpoint"),
        created_at: get_timestamp(fields, "createdAt")?,
        visualizations: get_visualizations(fields)?,
    })
}

fn get_string(fields: &Map<String, Value>, name: &str) -> Result<String, StoreError> {
    fields
        .get(name)
        .and_then(|v| v.get("stringValue"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StoreError::Decode(format!("Missing string field '{name}'")))
}

fn opt_string(fields: &Map<String, Value>, name: &str) -> Option<String> {
    fields
        .get(name)
        .and_then(|v| v.get("stringValue"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn get_timestamp(fields: &Map<String, Value>, name: &str) -> Result<DateTime<Utc>, StoreError> {
    let raw = fields
        .get(name)
        .and_then(|v| v.get("timestampValue"))
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::Decode(format!("Missing timestamp field '{name}'")))?;
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Decode(format!("Bad timestamp in '{name}': {e}")))
}

fn get_string_array(fields: &Map<String, Value>, name: &str) -> Vec<String> {
    fields
        .get(name)
        .and_then(|v| v.get("arrayValue"))
        .and_then(|v| v.get("values"))
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(|v| v.get("stringValue").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn get_visualizations(fields: &Map<String, Value>) -> Result<Vec<Visualization>, StoreError> {
    let Some(values) = fields
        .get("visualizations")
        .and_then(|v| v.get("arrayValue"))
        .and_then(|v| v.get("values"))
        .and_then(Value::as_array)
    else {
        return Ok(Vec::new());
    };

    let mut visualizations = Vec::with_capacity(values.len());
    for value in values {
        let entry = value
            .get("mapValue")
            .and_then(|v| v.get("fields"))
            .and_then(Value::as_object)
            .ok_or_else(|| StoreError::Decode("Visualization entry is not a map".into()))?;
        visualizations.push(Visualization {
            id: get_string(entry, "id")?,
            image_url: get_string(entry, "imageUrl")?,
            prompt: get_string(entry, "prompt")?,
            created_at: get_timestamp(entry, "createdAt")?,
        });
    }
    Ok(visualizations)
}
