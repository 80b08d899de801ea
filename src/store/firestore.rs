//! Firestore REST client implementing [`DocumentStore`].
//!
//! Talks to `{base_url}/projects/{project}/databases/{database}/documents`
//! with a bearer token.  Firestore stores typed values
//! (`{"stringValue": "…"}`, `{"mapValue": {"fields": …}}`, …); this module
//! converts them to and from plain JSON so the rest of the store never sees
//! the wire encoding.
//!
//! Merge writes are a `PATCH` with one `updateMask.fieldPaths` entry per
//! leaf field, so sibling keys inside nested maps survive.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::document::{Document, DocumentStore};
use super::StoreError;
use crate::config::StoreConfig;

pub struct FirestoreClient {
    client: reqwest::Client,
    documents_url: String,
    access_token: Option<String>,
}

impl FirestoreClient {
    /// Build a client from store config.  Returns `None` when no project id
    /// is configured.
    pub fn from_config(config: &StoreConfig) -> Option<Self> {
        let project = config
            .firestore_project_id
            .as_deref()
            .filter(|p| !p.trim().is_empty())?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let documents_url = format!(
            "{}/projects/{}/databases/{}/documents",
            config.firestore_base_url.trim_end_matches('/'),
            project,
            config.firestore_database
        );

        Some(Self {
            client,
            documents_url,
            access_token: config
                .firestore_access_token
                .clone()
                .filter(|t| !t.trim().is_empty()),
        })
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.documents_url, collection, id)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let url = self.document_url(collection, id);
        let response = self.authorize(self.client.get(&url)).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        match body.get("fields") {
            Some(Value::Object(fields)) => Ok(Some(decode_fields(fields)?)),
            // A document with no fields at all.
            _ => Ok(Some(Document::new())),
        }
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        doc: Document,
        merge: bool,
    ) -> Result<(), StoreError> {
        let url = self.document_url(collection, id);
        let mask: Vec<(&str, String)> = if merge {
            leaf_field_paths(&doc)
                .into_iter()
                .map(|p| ("updateMask.fieldPaths", p))
                .collect()
        } else {
            Vec::new()
        };
        let body = json!({ "fields": encode_fields(&doc) });

        let response = self
            .authorize(self.client.patch(&url).query(&mask).json(&body))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        log::debug!("firestore: wrote {collection}/{id} (merge={merge})");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Value encoding
// ---------------------------------------------------------------------------

fn encode_fields(doc: &Document) -> Value {
    Value::Object(doc.iter().map(|(k, v)| (k.clone(), encode_value(v))).collect())
}

fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        // Firestore sends and expects 64-bit integers as strings.
        Value::Number(n) if n.is_i64() || n.is_u64() => json!({ "integerValue": n.to_string() }),
        Value::Number(n) => json!({ "doubleValue": n }),
        // RFC 3339 strings are stored as native timestamps.
        Value::String(s) if chrono::DateTime::parse_from_rfc3339(s).is_ok() => {
            json!({ "timestampValue": s })
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

fn decode_fields(fields: &Map<String, Value>) -> Result<Document, StoreError> {
    fields
        .iter()
        .map(|(k, v)| Ok((k.clone(), decode_value(v)?)))
        .collect()
}

fn decode_value(value: &Value) -> Result<Value, StoreError> {
    let Some((kind, inner)) = value.as_object().and_then(|m| m.iter().next()) else {
        return Err(StoreError::Decode(format!("untyped value {value}")));
    };

    Ok(match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" | "doubleValue" | "stringValue" | "timestampValue" | "referenceValue" => {
            inner.clone()
        }
        "integerValue" => match inner {
            Value::String(s) => s
                .parse::<i64>()
                .map(Value::from)
                .map_err(|e| StoreError::Decode(format!("integerValue {s:?}: {e}")))?,
            other => other.clone(),
        },
        "arrayValue" => {
            let values = match inner.get("values") {
                Some(Value::Array(items)) => items
                    .iter()
                    .map(decode_value)
                    .collect::<Result<Vec<_>, _>>()?,
                _ => Vec::new(),
            };
            Value::Array(values)
        }
        "mapValue" => match inner.get("fields") {
            Some(Value::Object(fields)) => Value::Object(decode_fields(fields)?),
            _ => Value::Object(Map::new()),
        },
        other => return Err(StoreError::Decode(format!("unsupported value type {other}"))),
    })
}

// ---------------------------------------------------------------------------
// Field paths
// ---------------------------------------------------------------------------

/// Dotted paths to every non-map leaf of `doc`, segments quoted as needed.
fn leaf_field_paths(doc: &Document) -> Vec<String> {
    let mut paths = Vec::new();
    collect_paths(doc, "", &mut paths);
    paths
}

fn collect_paths(map: &Document, prefix: &str, out: &mut Vec<String>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            quote_segment(key)
        } else {
            format!("{prefix}.{}", quote_segment(key))
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => collect_paths(inner, &path, out),
            _ => out.push(path),
        }
    }
}

/// Simple segments match `[A-Za-z_][A-Za-z0-9_]*`; anything else is wrapped
/// in backticks with `` ` `` and `\` escaped.
fn quote_segment(segment: &str) -> String {
    let mut chars = segment.chars();
    let simple = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if simple {
        segment.to_string()
    } else {
        let escaped = segment.replace('\\', "\\\\").replace('`', "\\`");
        format!("`{escaped}`")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn config(project: Option<&str>) -> StoreConfig {
        StoreConfig {
            firestore_project_id: project.map(str::to_string),
            firestore_access_token: Some("ya29.test".into()),
            ..StoreConfig::default()
        }
    }

    fn object(value: Value) -> Document {
        match value {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn requires_project_id() {
        assert!(FirestoreClient::from_config(&config(None)).is_none());
        assert!(FirestoreClient::from_config(&config(Some(" "))).is_none());
    }

    #[test]
    fn builds_document_url() {
        let client = FirestoreClient::from_config(&config(Some("kumajala-dev"))).unwrap();
        assert_eq!(
            client.document_url("translations", "bonjour"),
            "https://firestore.googleapis.com/v1/projects/kumajala-dev/databases/(default)/documents/translations/bonjour"
        );
    }

    #[test]
    fn encodes_typed_values() {
        let doc = object(json!({
            "text": "bonjour",
            "languages": { "bété": "Akwaba" },
            "metadata": { "version": 1, "ok": true }
        }));
        let encoded = encode_fields(&doc);
        assert_eq!(encoded["text"], json!({ "stringValue": "bonjour" }));
        assert_eq!(
            encoded["languages"]["mapValue"]["fields"]["bété"],
            json!({ "stringValue": "Akwaba" })
        );
        assert_eq!(
            encoded["metadata"]["mapValue"]["fields"]["version"],
            json!({ "integerValue": "1" })
        );
    }

    #[test]
    fn timestamps_use_timestamp_value() {
        let doc = object(json!({
            "text": "à demain",
            "metadata": { "updatedAt": "2024-05-01T10:00:00+00:00" }
        }));
        let encoded = encode_fields(&doc);
        assert_eq!(
            encoded["metadata"]["mapValue"]["fields"]["updatedAt"],
            json!({ "timestampValue": "2024-05-01T10:00:00+00:00" })
        );
        assert_eq!(encoded["text"], json!({ "stringValue": "à demain" }));
        assert_eq!(decode_fields(encoded.as_object().unwrap()).unwrap(), doc);
    }

    #[test]
    fn decodes_wire_document() {
        let fields = object(json!({
            "text": { "stringValue": "merci" },
            "languages": { "mapValue": { "fields": { "mooré": { "stringValue": "Barika" } } } },
            "metadata": { "mapValue": { "fields": {
                "version": { "integerValue": "1" },
                "updatedAt": { "timestampValue": "2024-05-01T10:00:00Z" }
            } } },
            "tags": { "arrayValue": {} }
        }));
        let doc = decode_fields(&fields).unwrap();
        assert_eq!(doc["text"], "merci");
        assert_eq!(doc["languages"]["mooré"], "Barika");
        assert_eq!(doc["metadata"]["version"], 1);
        assert_eq!(doc["metadata"]["updatedAt"], "2024-05-01T10:00:00Z");
        assert_eq!(doc["tags"], json!([]));
    }

    #[test]
    fn rejects_untyped_values() {
        let fields = object(json!({ "text": "bare" }));
        assert!(matches!(decode_fields(&fields), Err(StoreError::Decode(_))));
    }

    #[test]
    fn merge_mask_lists_quoted_leaves() {
        let doc = object(json!({
            "source": "fr",
            "languages": { "bété": "Akwaba" },
            "metadata": { "updatedAt": "now", "version": 1 }
        }));
        let mut paths = leaf_field_paths(&doc);
        paths.sort();
        assert_eq!(
            paths,
            vec![
                "languages.`bété`",
                "metadata.updatedAt",
                "metadata.version",
                "source",
            ]
        );
    }

    #[test]
    fn quotes_only_non_simple_segments() {
        assert_eq!(quote_segment("agni"), "agni");
        assert_eq!(quote_segment("_v2"), "_v2");
        assert_eq!(quote_segment("mooré"), "`mooré`");
        assert_eq!(quote_segment("2x"), "`2x`");
        assert_eq!(quote_segment("a`b"), "`a\\`b`");
    }
}
