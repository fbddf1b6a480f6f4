//! In-process [`DocumentStore`] used by tests and dry runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::document::{Document, DocumentStore, Query, WriteBatch, WriteOp};
use crate::StoreError;

type Collections = HashMap<String, BTreeMap<String, Value>>;

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<Collections>,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Collections> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of documents currently stored in `collection`.
    #[must_use]
    pub fn count(&self, collection: &str) -> usize {
        self.lock().get(collection).map_or(0, BTreeMap::len)
    }

    /// Every document in `collection`, ordered by id.
    #[must_use]
    pub fn all(&self, collection: &str) -> Vec<Document> {
        self.lock()
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn apply(collections: &mut Collections, op: WriteOp) -> Result<(), StoreError> {
    match op {
        WriteOp::Set {
            collection,
            id,
            data,
        } => {
            collections.entry(collection).or_default().insert(id, data);
        }
        WriteOp::Update {
            collection,
            id,
            fields,
            precondition,
        } => {
            let Some(Value::Object(existing)) =
                collections.get_mut(&collection).and_then(|docs| docs.get_mut(&id))
            else {
                return Err(StoreError::NotFound { collection, id });
            };
            if let Some(pre) = precondition {
                let holds = existing.get(&pre.field).and_then(Value::as_str)
                    == Some(pre.equals.as_str());
                if !holds {
                    return Err(StoreError::PreconditionFailed {
                        collection,
                        id,
                        field: pre.field,
                        expected: pre.equals,
                    });
                }
            }
            existing.extend(fields);
        }
        WriteOp::Delete { collection, id } => {
            if let Some(docs) = collections.get_mut(&collection) {
                docs.remove(&id);
            }
        }
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .lock()
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document {
                id: id.to_owned(),
                data: data.clone(),
            }))
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        let guard = self.lock();
        let Some(docs) = guard.get(&query.collection) else {
            return Ok(Vec::new());
        };
        let mut matched: Vec<Document> = docs
            .iter()
            .filter(|(_, data)| query.matches(data))
            .map(|(id, data)| Document {
                id: id.clone(),
                data: data.clone(),
            })
            .collect();
        drop(guard);

        if let Some(order) = &query.order {
            matched.sort_by(|a, b| order.compare(&a.data, &b.data));
        }
        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut guard = self.lock();
        // Apply to a copy so a failing op leaves the store untouched.
        let mut staged = guard.clone();
        for op in batch.into_ops() {
            apply(&mut staged, op)?;
        }
        *guard = staged;
        Ok(())
    }
}
