//! [`DocumentStore`] backed by the `documents` table (one JSONB body per row).

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::document::{
    Condition, Direction, Document, DocumentStore, FieldValue, Query, SortKind, WriteBatch,
    WriteOp,
};
use crate::StoreError;

#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn push_comparison(
    qb: &mut QueryBuilder<'_, Postgres>,
    field: &str,
    op: &str,
    operand: &FieldValue,
) {
    match operand {
        FieldValue::Text(value) => {
            qb.push("data ->> ");
            qb.push_bind(field.to_owned());
            qb.push(format!(" {op} "));
            qb.push_bind(value.clone());
        }
        FieldValue::Bool(value) => {
            qb.push("(data ->> ");
            qb.push_bind(field.to_owned());
            qb.push(format!(")::boolean {op} "));
            qb.push_bind(*value);
        }
        FieldValue::Int(value) => {
            qb.push("(data ->> ");
            qb.push_bind(field.to_owned());
            qb.push(format!(")::bigint {op} "));
            qb.push_bind(*value);
        }
        FieldValue::Timestamp(value) => {
            qb.push("(data ->> ");
            qb.push_bind(field.to_owned());
            qb.push(format!(")::timestamptz {op} "));
            qb.push_bind(*value);
        }
    }
}

fn build_select(query: &Query) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT id, data FROM documents WHERE collection = ");
    qb.push_bind(query.collection.clone());

    for filter in &query.filters {
        qb.push(" AND ");
        match &filter.condition {
            Condition::IsNull => {
                qb.push("COALESCE(jsonb_typeof(data -> ");
                qb.push_bind(filter.field.clone());
                qb.push("), 'null') = 'null'");
            }
            Condition::Eq(operand) => push_comparison(&mut qb, &filter.field, "=", operand),
            Condition::Lt(operand) => push_comparison(&mut qb, &filter.field, "<", operand),
            Condition::Gt(operand) => push_comparison(&mut qb, &filter.field, ">", operand),
        }
    }

    if let Some(order) = &query.order {
        qb.push(" ORDER BY (data ->> ");
        qb.push_bind(order.field.clone());
        qb.push(match order.kind {
            SortKind::Text => ")",
            SortKind::Timestamp => ")::timestamptz",
        });
        qb.push(match order.direction {
            Direction::Asc => " ASC NULLS LAST",
            Direction::Desc => " DESC NULLS LAST",
        });
        qb.push(", id");
    } else {
        qb.push(" ORDER BY id");
    }

    if let Some(limit) = query.limit {
        qb.push(" LIMIT ");
        qb.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }

    qb
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, (String, Value)>(
            "SELECT id, data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, data)| Document { id, data }))
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        let mut qb = build_select(query);
        let rows = qb
            .build_query_as::<(String, Value)>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, data)| Document { id, data })
            .collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        tracing::debug!(ops = batch.len(), "store: committing batch");
        let mut tx = self.pool.begin().await?;

        for op in batch.into_ops() {
            match op {
                WriteOp::Set {
                    collection,
                    id,
                    data,
                } => {
                    sqlx::query(
                        "INSERT INTO documents (collection, id, data) \
                         VALUES ($1, $2, $3) \
                         ON CONFLICT (collection, id) DO UPDATE SET \
                             data = EXCLUDED.data, \
                             updated_at = NOW()",
                    )
                    .bind(&collection)
                    .bind(&id)
                    .bind(&data)
                    .execute(&mut *tx)
                    .await?;
                }
                WriteOp::Update {
                    collection,
                    id,
                    fields,
                    precondition,
                } => {
                    let patch = Value::Object(fields);
                    let result = match &precondition {
                        Some(pre) => {
                            sqlx::query(
                                "UPDATE documents \
                                 SET data = data || $3, updated_at = NOW() \
                                 WHERE collection = $1 AND id = $2 AND data ->> $4 = $5",
                            )
                            .bind(&collection)
                            .bind(&id)
                            .bind(&patch)
                            .bind(&pre.field)
                            .bind(&pre.equals)
                            .execute(&mut *tx)
                            .await?
                        }
                        None => {
                            sqlx::query(
                                "UPDATE documents \
                                 SET data = data || $3, updated_at = NOW() \
                                 WHERE collection = $1 AND id = $2",
                            )
                            .bind(&collection)
                            .bind(&id)
                            .bind(&patch)
                            .execute(&mut *tx)
                            .await?
                        }
                    };

                    if result.rows_affected() == 0 {
                        let exists: bool = sqlx::query_scalar(
                            "SELECT EXISTS(SELECT 1 FROM documents WHERE collection = $1 AND id = $2)",
                        )
                        .bind(&collection)
                        .bind(&id)
                        .fetch_one(&mut *tx)
                        .await?;

                        // Dropping `tx` rolls back everything staged so far.
                        return Err(match precondition {
                            Some(pre) if exists => StoreError::PreconditionFailed {
                                collection,
                                id,
                                field: pre.field,
                                expected: pre.equals,
                            },
                            _ => StoreError::NotFound { collection, id },
                        });
                    }
                }
                WriteOp::Delete { collection, id } => {
                    sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
                        .bind(&collection)
                        .bind(&id)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }
}
