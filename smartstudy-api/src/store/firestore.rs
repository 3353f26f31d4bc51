//! Cloud Firestore REST backend
//!
//! Documents are exchanged in Firestore's typed-value wire format and
//! converted to plain JSON at this boundary; nothing above this module
//! sees a `stringValue`. Authenticated with the shared service-account
//! OAuth handle.

use serde_json::{json, Value};
use std::sync::Arc;

use async_trait::async_trait;

use super::{Document, DocumentStore, FieldFilter, Fields, StoreError};
use crate::services::GoogleAuth;

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const LIST_PAGE_SIZE: u32 = 300;

/// Firestore-backed document store
pub struct FirestoreStore {
    http_client: reqwest::Client,
    auth: Arc<GoogleAuth>,
    /// `{base}/projects/{project}/databases/(default)/documents`
    documents_url: String,
}

impl FirestoreStore {
    pub fn new(http_client: reqwest::Client, auth: Arc<GoogleAuth>) -> Self {
        let documents_url = format!(
            "{FIRESTORE_BASE_URL}/projects/{}/databases/(default)/documents",
            auth.project_id()
        );
        Self {
            http_client,
            auth,
            documents_url,
        }
    }

    async fn bearer(&self) -> Result<String, StoreError> {
        self.auth
            .access_token()
            .await
            .map_err(|e| StoreError::Auth(e.to_string()))
    }

    fn doc_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{collection}/{id}", self.documents_url)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(StoreError::Api(status.as_u16(), error_text));
        }
        Ok(response)
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let token = self.bearer().await?;
        let response = self
            .http_client
            .get(self.doc_url(collection, id))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = Self::check_status(response).await?;
        let raw: Value = response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;

        decode_document(&raw).map(Some)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let token = self.bearer().await?;
        let response = self
            .http_client
            .patch(self.doc_url(collection, id))
            .bearer_auth(token)
            .json(&encode_fields(&fields))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Self::check_status(response).await?;
        Ok(())
    }

    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let token = self.bearer().await?;
        let response = self
            .http_client
            .post(format!("{}/{collection}", self.documents_url))
            .bearer_auth(token)
            .json(&encode_fields(&fields))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let response = Self::check_status(response).await?;
        let raw: Value = response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;

        Ok(decode_document(&raw)?.id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let token = self.bearer().await?;

        // Restrict the write to the supplied field paths so untouched
        // fields survive the PATCH.
        let mask: Vec<(&str, &str)> = fields
            .keys()
            .map(|key| ("updateMask.fieldPaths", key.as_str()))
            .collect();

        let response = self
            .http_client
            .patch(self.doc_url(collection, id))
            .query(&mask)
            .bearer_auth(token)
            .json(&encode_fields(&fields))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Self::check_status(response).await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let token = self.bearer().await?;
        let response = self
            .http_client
            .delete(self.doc_url(collection, id))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Self::check_status(response).await?;
        Ok(())
    }

    async fn stream(
        &self,
        collection: &str,
        filters: &[FieldFilter],
    ) -> Result<Vec<Document>, StoreError> {
        if filters.is_empty() {
            self.list_all(collection).await
        } else {
            self.run_query(collection, filters).await
        }
    }
}

impl FirestoreStore {
    /// Unfiltered listing via the paginated documents endpoint.
    async fn list_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let token = self.bearer().await?;
            let mut request = self
                .http_client
                .get(format!("{}/{collection}", self.documents_url))
                .query(&[("pageSize", LIST_PAGE_SIZE.to_string())])
                .bearer_auth(token);
            if let Some(next) = &page_token {
                request = request.query(&[("pageToken", next.as_str())]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| StoreError::Network(e.to_string()))?;
            let response = Self::check_status(response).await?;
            let raw: Value = response
                .json()
                .await
                .map_err(|e| StoreError::Parse(e.to_string()))?;

            if let Some(page) = raw.get("documents").and_then(|d| d.as_array()) {
                for doc in page {
                    documents.push(decode_document(doc)?);
                }
            }

            match raw.get("nextPageToken").and_then(|t| t.as_str()) {
                Some(next) => page_token = Some(next.to_string()),
                None => break,
            }
        }

        Ok(documents)
    }

    /// Filtered listing via `:runQuery` against the collection's parent.
    async fn run_query(
        &self,
        collection: &str,
        filters: &[FieldFilter],
    ) -> Result<Vec<Document>, StoreError> {
        let (parent_path, collection_id) = split_collection(collection);
        let parent_url = match parent_path {
            Some(path) => format!("{}/{path}", self.documents_url),
            None => self.documents_url.clone(),
        };

        let field_filters: Vec<Value> = filters
            .iter()
            .map(|f| {
                json!({
                    "fieldFilter": {
                        "field": { "fieldPath": f.field },
                        "op": "EQUAL",
                        "value": to_firestore_value(&f.value),
                    }
                })
            })
            .collect();

        let where_clause = if field_filters.len() == 1 {
            field_filters.into_iter().next().unwrap_or_default()
        } else {
            json!({
                "compositeFilter": {
                    "op": "AND",
                    "filters": field_filters,
                }
            })
        };

        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection_id }],
                "where": where_clause,
            }
        });

        let token = self.bearer().await?;
        let response = self
            .http_client
            .post(format!("{parent_url}:runQuery"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let response = Self::check_status(response).await?;
        let raw: Value = response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;

        // runQuery streams one result object per matched document; a
        // trailing entry without a `document` key is normal.
        let mut documents = Vec::new();
        if let Some(results) = raw.as_array() {
            for entry in results {
                if let Some(doc) = entry.get("document") {
                    documents.push(decode_document(doc)?);
                }
            }
        }

        Ok(documents)
    }
}

/// Split a collection path into its parent document path (if any) and
/// the final collection id: `users/u1/buddies` → (`users/u1`, `buddies`).
fn split_collection(collection: &str) -> (Option<&str>, &str) {
    match collection.rsplit_once('/') {
        Some((parent, id)) => (Some(parent), id),
        None => (None, collection),
    }
}

/// Encode plain JSON fields as a Firestore document body.
fn encode_fields(fields: &Fields) -> Value {
    let encoded: serde_json::Map<String, Value> = fields
        .iter()
        .map(|(key, value)| (key.clone(), to_firestore_value(value)))
        .collect();
    json!({ "fields": encoded })
}

/// Plain JSON → Firestore typed value.
pub(crate) fn to_firestore_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                // Firestore carries 64-bit integers as strings
                json!({ "integerValue": i.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(to_firestore_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => {
            let encoded: serde_json::Map<String, Value> = map
                .iter()
                .map(|(key, v)| (key.clone(), to_firestore_value(v)))
                .collect();
            json!({ "mapValue": { "fields": encoded } })
        }
    }
}

/// Firestore typed value → plain JSON. Timestamps come back as their
/// RFC 3339 string form.
pub(crate) fn from_firestore_value(value: &Value) -> Value {
    let Some(map) = value.as_object() else {
        return Value::Null;
    };

    if let Some((kind, inner)) = map.iter().next() {
        match kind.as_str() {
            "nullValue" => Value::Null,
            "booleanValue" => inner.clone(),
            "integerValue" => inner
                .as_str()
                .and_then(|s| s.parse::<i64>().ok())
                .map(Value::from)
                .unwrap_or(Value::Null),
            "doubleValue" => inner.clone(),
            "stringValue" | "timestampValue" | "referenceValue" => inner.clone(),
            "arrayValue" => {
                let items = inner
                    .get("values")
                    .and_then(|v| v.as_array())
                    .map(|values| values.iter().map(from_firestore_value).collect())
                    .unwrap_or_default();
                Value::Array(items)
            }
            "mapValue" => {
                let fields = inner
                    .get("fields")
                    .and_then(|f| f.as_object())
                    .map(|fields| {
                        fields
                            .iter()
                            .map(|(key, v)| (key.clone(), from_firestore_value(v)))
                            .collect()
                    })
                    .unwrap_or_default();
                Value::Object(fields)
            }
            _ => Value::Null,
        }
    } else {
        Value::Null
    }
}

/// Decode a Firestore document resource into a `Document`.
fn decode_document(raw: &Value) -> Result<Document, StoreError> {
    let name = raw
        .get("name")
        .and_then(|n| n.as_str())
        .ok_or_else(|| StoreError::Parse("document missing name".to_string()))?;

    let id = name
        .rsplit('/')
        .next()
        .unwrap_or(name)
        .to_string();

    let fields = raw
        .get("fields")
        .and_then(|f| f.as_object())
        .map(|fields| {
            fields
                .iter()
                .map(|(key, v)| (key.clone(), from_firestore_value(v)))
                .collect()
        })
        .unwrap_or_default();

    Ok(Document { id, fields })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_collection_handles_subcollections() {
        assert_eq!(split_collection("users"), (None, "users"));
        assert_eq!(
            split_collection("users/u1/buddies"),
            (Some("users/u1"), "buddies")
        );
    }

    #[test]
    fn encode_covers_document_shapes() {
        let fields = crate::store::fields(json!({
            "name": "Alice",
            "online": true,
            "score": 42,
            "studyPreferences": { "subject": "Math" },
            "tags": ["a", "b"],
        }));
        let encoded = encode_fields(&fields);
        assert_eq!(encoded["fields"]["name"]["stringValue"], "Alice");
        assert_eq!(encoded["fields"]["online"]["booleanValue"], true);
        assert_eq!(encoded["fields"]["score"]["integerValue"], "42");
        assert_eq!(
            encoded["fields"]["studyPreferences"]["mapValue"]["fields"]["subject"]["stringValue"],
            "Math"
        );
        assert_eq!(
            encoded["fields"]["tags"]["arrayValue"]["values"][0]["stringValue"],
            "a"
        );
    }

    #[test]
    fn decode_document_extracts_id_and_fields() {
        let raw = json!({
            "name": "projects/p/databases/(default)/documents/users/u123",
            "fields": {
                "email": { "stringValue": "a@b.c" },
                "online": { "booleanValue": false },
                "visits": { "integerValue": "7" },
                "joined": { "timestampValue": "2025-11-02T10:00:00Z" },
            }
        });
        let doc = decode_document(&raw).expect("should decode");
        assert_eq!(doc.id, "u123");
        assert_eq!(doc.get_str("email").as_deref(), Some("a@b.c"));
        assert_eq!(doc.get_bool("online"), Some(false));
        assert_eq!(doc.get("visits"), Some(&json!(7)));
        assert_eq!(
            doc.get_str("joined").as_deref(),
            Some("2025-11-02T10:00:00Z")
        );
    }

    #[test]
    fn decode_document_without_fields() {
        let raw = json!({ "name": "projects/p/databases/(default)/documents/users/u9" });
        let doc = decode_document(&raw).expect("should decode");
        assert_eq!(doc.id, "u9");
        assert!(doc.fields.is_empty());
    }
}
