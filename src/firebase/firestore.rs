use super::value::{decode_fields, encode_fields, encode_value};
use super::{google_error_message, GoogleCredentials};
use crate::services::document_store::{Document, DocumentStore, FieldFilter, Fields, Query};
use crate::utils::AppError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const FIRESTORE_API_BASE: &str = "https://firestore.googleapis.com/v1";
const LIST_PAGE_SIZE: u32 = 300;

#[derive(Debug, Deserialize)]
struct RestDocument {
    name: String,
    #[serde(default)]
    fields: Value,
}

impl RestDocument {
    fn into_document(self) -> Document {
        let id = self.name.rsplit('/').next().unwrap_or_default().to_string();
        Document {
            id,
            fields: decode_fields(&self.fields),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RestDocument>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    document: Option<RestDocument>,
}

/// Cloud Firestore over the REST v1 API, `(default)` database.
pub struct Firestore {
    credentials: Arc<GoogleCredentials>,
}

impl Firestore {
    pub fn new(credentials: Arc<GoogleCredentials>) -> Self {
        Self { credentials }
    }

    /// `projects/{p}/databases/(default)/documents`
    fn root(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.credentials.project_id())
    }

    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.root(), collection, id)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", FIRESTORE_API_BASE, path)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        self.url(&format!(
            "{}/{}/{}",
            self.root(),
            urlencoding::encode(collection),
            urlencoding::encode(id)
        ))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, AppError> {
        let token = self.credentials.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::Store(format!("Firestore request failed: {}", e)))?;
        Ok(response)
    }

    async fn error_from(response: reqwest::Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        AppError::Store(google_error_message(status, &body))
    }

    async fn parse<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, AppError> {
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| AppError::Store(format!("Failed to parse Firestore response: {}", e)))
    }
}

/// `structuredQuery` body for `documents:runQuery`.
pub fn structured_query(query: &Query) -> Value {
    let filters: Vec<Value> = query
        .filters
        .iter()
        .map(|filter| match filter {
            FieldFilter::In { field, values } => json!({
                "fieldFilter": {
                    "field": { "fieldPath": field },
                    "op": "IN",
                    "value": { "arrayValue": { "values": values.iter().map(encode_value).collect::<Vec<_>>() } }
                }
            }),
        })
        .collect();

    let mut structured = json!({ "from": [{ "collectionId": query.collection }] });

    match filters.len() {
        0 => {}
        1 => structured["where"] = filters[0].clone(),
        _ => {
            structured["where"] = json!({ "compositeFilter": { "op": "AND", "filters": filters } });
        }
    }

    if let Some(field) = &query.order_by {
        structured["orderBy"] = json!([{ "field": { "fieldPath": field }, "direction": "ASCENDING" }]);
    }

    json!({ "structuredQuery": structured })
}

/// `commit` body applying a server-side numeric increment to an existing document.
pub fn increment_commit(document_name: &str, field: &str, by: i64) -> Value {
    json!({
        "writes": [{
            "transform": {
                "document": document_name,
                "fieldTransforms": [{
                    "fieldPath": field,
                    "increment": { "integerValue": by.to_string() }
                }]
            },
            "currentDocument": { "exists": true }
        }]
    })
}

#[async_trait]
impl DocumentStore for Firestore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        let url = self.document_url(collection, id);
        let response = self.send(self.credentials.http().get(&url)).await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let document: RestDocument = Self::parse(response).await?;
        Ok(Some(document.into_document()))
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), AppError> {
        let url = self.document_url(collection, id);
        let body = json!({ "fields": encode_fields(&fields) });
        let response = self.send(self.credentials.http().patch(&url).json(&body)).await?;
        let _: RestDocument = Self::parse(response).await?;
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), AppError> {
        let url = self.document_url(collection, id);
        let mut params: Vec<(&str, &str)> = fields
            .keys()
            .map(|key| ("updateMask.fieldPaths", key.as_str()))
            .collect();
        params.push(("currentDocument.exists", "true"));

        let body = json!({ "fields": encode_fields(&fields) });
        let response = self
            .send(self.credentials.http().patch(&url).query(&params).json(&body))
            .await?;
        let _: RestDocument = Self::parse(response).await?;
        Ok(())
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String, AppError> {
        let url = self.url(&format!("{}/{}", self.root(), urlencoding::encode(collection)));
        let body = json!({ "fields": encode_fields(&fields) });
        let response = self.send(self.credentials.http().post(&url).json(&body)).await?;
        let document: RestDocument = Self::parse(response).await?;
        Ok(document.into_document().id)
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, AppError> {
        let url = self.url(&format!("{}/{}", self.root(), urlencoding::encode(collection)));
        let page_size = LIST_PAGE_SIZE.to_string();
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![("pageSize", page_size.clone())];
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }

            let response = self.send(self.credentials.http().get(&url).query(&params)).await?;
            let page: ListResponse = Self::parse(response).await?;
            documents.extend(page.documents.into_iter().map(RestDocument::into_document));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(documents)
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, AppError> {
        let url = self.url(&format!("{}:runQuery", self.root()));
        let response = self
            .send(self.credentials.http().post(&url).json(&structured_query(query)))
            .await?;
        let items: Vec<RunQueryItem> = Self::parse(response).await?;

        // Items without a document only carry read-time progress
        Ok(items
            .into_iter()
            .filter_map(|item| item.document)
            .map(RestDocument::into_document)
            .collect())
    }

    async fn increment(&self, collection: &str, id: &str, field: &str, by: i64) -> Result<(), AppError> {
        let url = self.url(&format!("{}:commit", self.root()));
        let body = increment_commit(&self.document_name(collection, id), field, by);
        let response = self.send(self.credentials.http().post(&url).json(&body)).await?;
        let _: Value = Self::parse(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_query_body() {
        let query = Query::collection("messages")
            .filter(FieldFilter::field_in("senderUid", vec![json!("a"), json!("b")]))
            .filter(FieldFilter::field_in("receiverUid", vec![json!("a"), json!("b")]))
            .order_by("timestamp");

        let body = structured_query(&query);
        let structured = &body["structuredQuery"];

        assert_eq!(structured["from"], json!([{ "collectionId": "messages" }]));
        assert_eq!(structured["where"]["compositeFilter"]["op"], "AND");
        assert_eq!(structured["where"]["compositeFilter"]["filters"].as_array().unwrap().len(), 2);
        assert_eq!(
            structured["where"]["compositeFilter"]["filters"][0]["fieldFilter"]["value"],
            json!({ "arrayValue": { "values": [{ "stringValue": "a" }, { "stringValue": "b" }] } })
        );
        assert_eq!(
            structured["orderBy"],
            json!([{ "field": { "fieldPath": "timestamp" }, "direction": "ASCENDING" }])
        );
    }

    #[test]
    fn test_single_filter_is_not_composite() {
        let query = Query::collection("users").filter(FieldFilter::field_in("status", vec![json!("online")]));
        let body = structured_query(&query);

        assert_eq!(body["structuredQuery"]["where"]["fieldFilter"]["op"], "IN");
        assert!(body["structuredQuery"].get("orderBy").is_none());
    }

    #[test]
    fn test_increment_commit_body() {
        let body = increment_commit("projects/p/databases/(default)/documents/users/u1", "notifications", 1);
        let write = &body["writes"][0];

        assert_eq!(write["currentDocument"]["exists"], true);
        assert_eq!(
            write["transform"]["fieldTransforms"][0],
            json!({ "fieldPath": "notifications", "increment": { "integerValue": "1" } })
        );
    }

    #[test]
    fn test_rest_document_id() {
        let document = RestDocument {
            name: "projects/p/databases/(default)/documents/users/uid-42".to_string(),
            fields: json!({ "status": { "stringValue": "online" } }),
        };
        let document = document.into_document();
        assert_eq!(document.id, "uid-42");
        assert_eq!(document.fields["status"], "online");
    }
}
