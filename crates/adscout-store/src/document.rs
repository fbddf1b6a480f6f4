//! The narrow document-store contract the pipeline is written against.
//!
//! Documents are JSON objects grouped into named collections. Reads are
//! point lookups or filtered queries over top-level fields; writes are staged
//! into a [`WriteBatch`] and committed atomically.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::StoreError;

/// A stored document: its identifier plus the JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    /// Decode the body into `T`, with `id` taken from the document key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Decode`] if the body does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self, collection: &str) -> Result<T, StoreError> {
        let mut data = self.data.clone();
        if let Value::Object(map) = &mut data {
            map.insert("id".to_owned(), Value::String(self.id.clone()));
        }
        serde_json::from_value(data).map_err(|source| StoreError::Decode {
            collection: collection.to_owned(),
            id: self.id.clone(),
            source,
        })
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }
}

/// A typed operand for filter comparisons.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    Int(i64),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Order a stored JSON value against this operand.
    ///
    /// `None` when the stored value is missing or of an incompatible type, in
    /// which case no comparison filter matches.
    fn compare_stored(&self, stored: &Value) -> Option<Ordering> {
        match (self, stored) {
            (FieldValue::Text(expected), Value::String(actual)) => {
                Some(actual.as_str().cmp(expected.as_str()))
            }
            (FieldValue::Bool(expected), Value::Bool(actual)) => Some(actual.cmp(expected)),
            (FieldValue::Int(expected), Value::Number(actual)) => {
                actual.as_i64().map(|n| n.cmp(expected))
            }
            (FieldValue::Timestamp(expected), Value::String(actual)) => {
                DateTime::parse_from_rfc3339(actual)
                    .ok()
                    .map(|ts| ts.with_timezone(&Utc).cmp(expected))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(FieldValue),
    Lt(FieldValue),
    Gt(FieldValue),
    /// Field is absent or JSON `null`.
    IsNull,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub condition: Condition,
}

impl Filter {
    #[must_use]
    pub fn matches(&self, data: &Value) -> bool {
        let stored = data.get(&self.field).unwrap_or(&Value::Null);
        match &self.condition {
            Condition::IsNull => stored.is_null(),
            Condition::Eq(operand) => operand.compare_stored(stored) == Some(Ordering::Equal),
            Condition::Lt(operand) => operand.compare_stored(stored) == Some(Ordering::Less),
            Condition::Gt(operand) => operand.compare_stored(stored) == Some(Ordering::Greater),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// How the ordering field is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKind {
    Text,
    Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub kind: SortKind,
    pub direction: Direction,
}

impl OrderBy {
    /// Compare two documents by this ordering. Missing values sort last
    /// regardless of direction.
    #[must_use]
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let key = |data: &Value| -> Option<SortValue> {
            let raw = data.get(&self.field)?.as_str()?;
            match self.kind {
                SortKind::Text => Some(SortValue::Text(raw.to_owned())),
                SortKind::Timestamp => DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|ts| SortValue::Time(ts.with_timezone(&Utc))),
            }
        };
        match (key(a), key(b)) {
            (Some(x), Some(y)) => match self.direction {
                Direction::Asc => x.cmp(&y),
                Direction::Desc => y.cmp(&x),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum SortValue {
    Text(String),
    Time(DateTime<Utc>),
}

/// A filtered read over one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    #[must_use]
    pub fn collection(name: &str) -> Self {
        Self {
            collection: name.to_owned(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    #[must_use]
    pub fn filter(mut self, field: &str, condition: Condition) -> Self {
        self.filters.push(Filter {
            field: field.to_owned(),
            condition,
        });
        self
    }

    #[must_use]
    pub fn where_eq(self, field: &str, value: FieldValue) -> Self {
        self.filter(field, Condition::Eq(value))
    }

    #[must_use]
    pub fn where_lt(self, field: &str, value: FieldValue) -> Self {
        self.filter(field, Condition::Lt(value))
    }

    #[must_use]
    pub fn where_gt(self, field: &str, value: FieldValue) -> Self {
        self.filter(field, Condition::Gt(value))
    }

    #[must_use]
    pub fn where_null(self, field: &str) -> Self {
        self.filter(field, Condition::IsNull)
    }

    #[must_use]
    pub fn order_by(mut self, field: &str, kind: SortKind, direction: Direction) -> Self {
        self.order = Some(OrderBy {
            field: field.to_owned(),
            kind,
            direction,
        });
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn matches(&self, data: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(data))
    }
}

/// Guard on an update: the stored field must currently hold `equals`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Precondition {
    pub field: String,
    pub equals: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Create or fully replace a document.
    Set {
        collection: String,
        id: String,
        data: Value,
    },
    /// Merge top-level fields into an existing document. Fails the whole
    /// batch if the document does not exist or the precondition is not met.
    Update {
        collection: String,
        id: String,
        fields: Map<String, Value>,
        precondition: Option<Precondition>,
    },
    /// Remove a document; a missing document is not an error.
    Delete { collection: String, id: String },
}

/// Writes staged for one atomic commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, collection: &str, id: &str, data: Value) -> &mut Self {
        self.ops.push(WriteOp::Set {
            collection: collection.to_owned(),
            id: id.to_owned(),
            data,
        });
        self
    }

    pub fn update(&mut self, collection: &str, id: &str, fields: Map<String, Value>) -> &mut Self {
        self.ops.push(WriteOp::Update {
            collection: collection.to_owned(),
            id: id.to_owned(),
            fields,
            precondition: None,
        });
        self
    }

    pub fn update_if(
        &mut self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
        precondition: Precondition,
    ) -> &mut Self {
        self.ops.push(WriteOp::Update {
            collection: collection.to_owned(),
            id: id.to_owned(),
            fields,
            precondition: Some(precondition),
        });
        self
    }

    pub fn delete(&mut self, collection: &str, id: &str) -> &mut Self {
        self.ops.push(WriteOp::Delete {
            collection: collection.to_owned(),
            id: id.to_owned(),
        });
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[must_use]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    #[must_use]
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Apply every op in the batch, or none of them.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    fn new_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn is_null_matches_missing_and_null_fields() {
        let query = Query::collection("creatives").where_null("analysis");
        assert!(query.matches(&json!({ "headline": "a" })));
        assert!(query.matches(&json!({ "analysis": null })));
        assert!(!query.matches(&json!({ "analysis": { "niche": "x" } })));
    }

    #[test]
    fn timestamp_comparisons_parse_stored_strings() {
        let cutoff = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let older = Query::collection("scraping_jobs")
            .where_lt("startTime", FieldValue::Timestamp(cutoff));
        assert!(older.matches(&json!({ "startTime": "2024-02-01T00:00:00Z" })));
        assert!(!older.matches(&json!({ "startTime": "2024-03-01T00:00:00.500Z" })));
        assert!(!older.matches(&json!({ "startTime": "not a date" })));
    }

    #[test]
    fn eq_does_not_match_mismatched_types() {
        let query = Query::collection("creatives").where_eq("hash", FieldValue::text("12"));
        assert!(query.matches(&json!({ "hash": "12" })));
        assert!(!query.matches(&json!({ "hash": 12 })));
    }

    #[test]
    fn ordering_places_missing_values_last() {
        let order = OrderBy {
            field: "createdAt".to_owned(),
            kind: SortKind::Timestamp,
            direction: Direction::Desc,
        };
        let newer = json!({ "createdAt": "2024-05-02T00:00:00Z" });
        let older = json!({ "createdAt": "2024-05-01T00:00:00Z" });
        let missing = json!({});
        assert_eq!(order.compare(&newer, &older), Ordering::Less);
        assert_eq!(order.compare(&missing, &older), Ordering::Greater);
    }

    #[test]
    fn decode_takes_id_from_document_key() {
        #[derive(serde::Deserialize)]
        struct Row {
            id: String,
            name: String,
        }
        let doc = Document {
            id: "doc-1".to_owned(),
            data: json!({ "id": "stale", "name": "n" }),
        };
        let row: Row = doc.decode("users").unwrap();
        assert_eq!(row.id, "doc-1");
        assert_eq!(row.name, "n");
    }
}
