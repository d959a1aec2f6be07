use crate::utils::AppError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Field map of a schemaless document.
pub type Fields = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    /// `{id, ...fields}` as returned by the user listing.
    pub fn into_json_with_id(self) -> Value {
        let mut object = Map::with_capacity(self.fields.len() + 1);
        object.insert("id".to_string(), Value::String(self.id));
        object.extend(self.fields);
        Value::Object(object)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldFilter {
    /// Field value must equal one of `values`.
    In { field: String, values: Vec<Value> },
}

impl FieldFilter {
    pub fn field_in(field: &str, values: Vec<Value>) -> Self {
        FieldFilter::In { field: field.to_string(), values }
    }

    fn matches(&self, fields: &Fields) -> bool {
        match self {
            FieldFilter::In { field, values } => fields
                .get(field)
                .map(|value| values.contains(value))
                .unwrap_or(false),
        }
    }
}

/// Filters are combined with AND.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<FieldFilter>,
    /// Results ascend by this field
    pub order_by: Option<String>,
}

impl Query {
    pub fn collection(name: &str) -> Self {
        Self {
            collection: name.to_string(),
            filters: Vec::new(),
            order_by: None,
        }
    }

    pub fn filter(mut self, filter: FieldFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: &str) -> Self {
        self.order_by = Some(field.to_string());
        self
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError>;
    /// Creates or fully replaces the document.
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), AppError>;
    /// Merges `fields` into an existing document; fails if it does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), AppError>;
    /// Stores a new document under a generated id and returns that id.
    async fn add(&self, collection: &str, fields: Fields) -> Result<String, AppError>;
    async fn list(&self, collection: &str) -> Result<Vec<Document>, AppError>;
    async fn query(&self, query: &Query) -> Result<Vec<Document>, AppError>;
    /// Atomically adds `by` to a numeric field of an existing document.
    async fn increment(&self, collection: &str, id: &str, field: &str, by: i64) -> Result<(), AppError>;
}

/// Orders JSON scalars the way the store sorts them: numbers and strings by value.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Process-local store for development and tests.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(collection: &str, id: &str) -> AppError {
    AppError::Store(format!("No document to update: {}/{}", collection, id))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id))
            .cloned())
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), AppError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|doc| doc.id == id) {
            Some(doc) => doc.fields = fields,
            None => docs.push(Document { id: id.to_string(), fields }),
        }
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), AppError> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
            .ok_or_else(|| not_found(collection, id))?;
        doc.fields.extend(fields);
        Ok(())
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String, AppError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(Document { id: id.clone(), fields });
        Ok(id)
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, AppError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, AppError> {
        let collections = self.collections.read().await;
        let mut matched: Vec<Document> = collections
            .get(&query.collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| query.filters.iter().all(|f| f.matches(&doc.fields)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(field) = &query.order_by {
            // Documents lacking the ordering field are excluded, as in the hosted store
            matched.retain(|doc| doc.fields.contains_key(field));
            // Stable sort keeps insertion order for equal keys
            matched.sort_by(|a, b| compare_values(&a.fields[field], &b.fields[field]));
        }

        Ok(matched)
    }

    async fn increment(&self, collection: &str, id: &str, field: &str, by: i64) -> Result<(), AppError> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
            .ok_or_else(|| not_found(collection, id))?;
        let current = doc.fields.get(field).and_then(Value::as_i64).unwrap_or(0);
        doc.fields.insert(field.to_string(), Value::from(current + by));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let store = MemoryStore::new();
        let result = store.update("users", "ghost", fields(json!({ "status": "offline" }))).await;
        assert!(matches!(result, Err(AppError::Store(_))));
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemoryStore::new();
        store.set("users", "u1", fields(json!({ "email": "a@b.c", "status": "online" }))).await.unwrap();
        store.update("users", "u1", fields(json!({ "status": "offline" }))).await.unwrap();

        let doc = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc.fields["email"], "a@b.c");
        assert_eq!(doc.fields["status"], "offline");
    }

    #[tokio::test]
    async fn test_increment_treats_missing_field_as_zero() {
        let store = MemoryStore::new();
        store.set("users", "u1", fields(json!({ "email": "a@b.c" }))).await.unwrap();
        store.increment("users", "u1", "notifications", 1).await.unwrap();
        store.increment("users", "u1", "notifications", 2).await.unwrap();

        let doc = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc.fields["notifications"], 3);
    }

    #[tokio::test]
    async fn test_query_filters_and_orders() {
        let store = MemoryStore::new();
        for (from, to, ts) in [("a", "b", "3"), ("b", "a", "1"), ("a", "c", "2"), ("b", "b", "2")] {
            store
                .add("messages", fields(json!({ "senderUid": from, "receiverUid": to, "timestamp": ts })))
                .await
                .unwrap();
        }

        let query = Query::collection("messages")
            .filter(FieldFilter::field_in("senderUid", vec![json!("a"), json!("b")]))
            .filter(FieldFilter::field_in("receiverUid", vec![json!("a"), json!("b")]))
            .order_by("timestamp");

        let timestamps: Vec<_> = store
            .query(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|doc| doc.fields["timestamp"].clone())
            .collect();
        assert_eq!(timestamps, vec![json!("1"), json!("2"), json!("3")]);
    }

    #[tokio::test]
    async fn test_query_skips_documents_without_order_field() {
        let store = MemoryStore::new();
        store.add("messages", fields(json!({ "senderUid": "a" }))).await.unwrap();
        store.add("messages", fields(json!({ "senderUid": "a", "timestamp": "1" }))).await.unwrap();

        let query = Query::collection("messages").order_by("timestamp");
        assert_eq!(store.query(&query).await.unwrap().len(), 1);
    }

    #[test]
    fn test_document_json_carries_id() {
        let doc = Document { id: "u1".into(), fields: fields(json!({ "email": "a@b.c" })) };
        assert_eq!(doc.into_json_with_id(), json!({ "id": "u1", "email": "a@b.c" }));
    }
}
