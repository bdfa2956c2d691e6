//! Capacity-bounded history of generated cards.
//!
//! Two backends share one contract: an in-process store for warm Lambda
//! containers and a Postgres store for durable history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::VecDeque;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::models::{CardSpec, EntryType, GeneratedContent, HistoryPage, HistoryRecord, NewHistoryRecord};
use crate::templates::TemplateRegistry;
use crate::{Error, Result};

pub const DEFAULT_CAPACITY: usize = 100;

/// Append-only record store; newest records are listed first and the oldest
/// are discarded once `capacity` is exceeded.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, record: NewHistoryRecord) -> Result<String>;
    async fn list(&self, limit: usize, offset: usize) -> Result<HistoryPage>;
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// Check a save payload and fill in the template's display name.
pub fn prepare(
    mut record: NewHistoryRecord,
    registry: &TemplateRegistry,
) -> std::result::Result<NewHistoryRecord, ValidationError> {
    let template_id = record.template_id.trim();
    if template_id.is_empty() {
        return Err(ValidationError::MissingTemplateId);
    }

    if record.template_name.as_deref().map_or(true, |n| n.trim().is_empty()) {
        record.template_name = Some(
            registry
                .find(template_id)
                .map(|t| t.name.clone())
                .unwrap_or_else(|| template_id.to_string()),
        );
    }

    Ok(record)
}

fn new_record_id() -> String {
    format!("history-{}", Uuid::new_v4().simple())
}

fn into_record(record: NewHistoryRecord, id: String, created_at: DateTime<Utc>) -> HistoryRecord {
    HistoryRecord {
        id,
        topic: record.topic,
        entry_type: record.entry_type,
        template_name: record
            .template_name
            .unwrap_or_else(|| record.template_id.clone()),
        template_id: record.template_id,
        content: record.content,
        image_url: record.image_url,
        card_spec: record.card_spec,
        thumbnail: record.thumbnail,
        created_at,
    }
}

/// In-process history held for the lifetime of the container.
pub struct InMemoryHistoryStore {
    records: RwLock<VecDeque<HistoryRecord>>,
    capacity: usize,
}

impl InMemoryHistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::new()),
            capacity,
        }
    }
}

impl Default for InMemoryHistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, record: NewHistoryRecord) -> Result<String> {
        let id = new_record_id();
        let record = into_record(record, id.clone(), Utc::now());

        let mut records = self.records.write().await;
        records.push_front(record);
        records.truncate(self.capacity);

        Ok(id)
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<HistoryPage> {
        let records = self.records.read().await;
        let mut sorted: Vec<HistoryRecord> = records.iter().cloned().collect();
        // Front of the deque is newest; the stable sort keeps that for ties.
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(HistoryPage {
            total: sorted.len(),
            records: sorted.into_iter().skip(offset).take(limit).collect(),
        })
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() != before)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    id: String,
    topic: String,
    entry_type: String,
    template_id: String,
    template_name: String,
    content: Json<GeneratedContent>,
    image_url: Option<String>,
    card_spec: String,
    thumbnail: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for HistoryRecord {
    type Error = Error;

    fn try_from(row: HistoryRow) -> Result<Self> {
        let entry_type = EntryType::parse(&row.entry_type)
            .ok_or_else(|| Error::Internal(format!("Unknown entry type in history: {}", row.entry_type)))?;

        Ok(Self {
            id: row.id,
            topic: row.topic,
            entry_type,
            template_id: row.template_id,
            template_name: row.template_name,
            content: row.content.0,
            image_url: row.image_url,
            card_spec: CardSpec::parse(&row.card_spec).unwrap_or_default(),
            thumbnail: row.thumbnail,
            created_at: row.created_at,
        })
    }
}

/// Postgres-backed history (table `concept_history`).
pub struct PgHistoryStore {
    pool: PgPool,
    capacity: usize,
}

impl PgHistoryStore {
    pub fn new(pool: PgPool, capacity: usize) -> Self {
        Self { pool, capacity }
    }
}

#[async_trait]
impl HistoryStore for PgHistoryStore {
    async fn append(&self, record: NewHistoryRecord) -> Result<String> {
        let record = into_record(record, new_record_id(), Utc::now());
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO concept_history
                (id, topic, entry_type, template_id, template_name, content, image_url, card_spec, thumbnail, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&record.id)
        .bind(&record.topic)
        .bind(record.entry_type.as_str())
        .bind(&record.template_id)
        .bind(&record.template_name)
        .bind(Json(&record.content))
        .bind(&record.image_url)
        .bind(record.card_spec.as_str())
        .bind(&record.thumbnail)
        .bind(record.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM concept_history
            WHERE id IN (
                SELECT id FROM concept_history
                ORDER BY created_at DESC, id DESC
                OFFSET $1
            )
            "#,
        )
        .bind(self.capacity as i64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(record.id)
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<HistoryPage> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            r#"
            SELECT id, topic, entry_type, template_id, template_name, content,
                   image_url, card_spec, thumbnail, created_at
            FROM concept_history
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM concept_history")
            .fetch_one(&self.pool)
            .await?;

        Ok(HistoryPage {
            records: rows
                .into_iter()
                .map(HistoryRecord::try_from)
                .collect::<Result<Vec<_>>>()?,
            total: total as usize,
        })
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM concept_history WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_record(topic: &str) -> NewHistoryRecord {
        NewHistoryRecord {
            topic: topic.to_string(),
            entry_type: EntryType::Topic,
            template_id: "product-concept".to_string(),
            template_name: Some("产品概念卡".to_string()),
            content: GeneratedContent::from([("name".to_string(), topic.to_string())]),
            image_url: None,
            card_spec: CardSpec::default(),
            thumbnail: None,
        }
    }

    #[tokio::test]
    async fn test_append_and_list_newest_first() {
        let store = InMemoryHistoryStore::default();
        let first = store.append(new_record("first")).await.unwrap();
        let second = store.append(new_record("second")).await.unwrap();
        assert!(first.starts_with("history-"));
        assert_ne!(first, second);

        let page = store.list(20, 0).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.records[0].id, second);
        assert_eq!(page.records[1].id, first);
        assert_eq!(page.records[1].content["name"], "first");
    }

    #[tokio::test]
    async fn test_capacity_discards_oldest() {
        let store = InMemoryHistoryStore::new(3);
        let mut ids = Vec::new();
        for n in 0..5 {
            ids.push(store.append(new_record(&format!("r{}", n))).await.unwrap());
        }

        let page = store.list(10, 0).await.unwrap();
        assert_eq!(page.total, 3);
        let topics: Vec<_> = page.records.iter().map(|r| r.topic.as_str()).collect();
        assert_eq!(topics, vec!["r4", "r3", "r2"]);
        assert!(!store.delete(&ids[0]).await.unwrap());
    }

    #[tokio::test]
    async fn test_pagination() {
        let store = InMemoryHistoryStore::default();
        for n in 0..5 {
            store.append(new_record(&format!("r{}", n))).await.unwrap();
        }

        let page = store.list(2, 1).await.unwrap();
        assert_eq!(page.total, 5);
        let topics: Vec<_> = page.records.iter().map(|r| r.topic.as_str()).collect();
        assert_eq!(topics, vec!["r3", "r2"]);

        assert!(store.list(2, 10).await.unwrap().records.is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryHistoryStore::default();
        let id = store.append(new_record("gone")).await.unwrap();
        assert!(store.delete(&id).await.unwrap());
        assert!(!store.delete(&id).await.unwrap());
        assert_eq!(store.list(20, 0).await.unwrap().total, 0);
    }

    #[test]
    fn test_prepare_fills_template_name() {
        let registry = TemplateRegistry::builtin();

        let mut record = new_record("x");
        record.template_name = None;
        record.template_id = "brand-story".to_string();
        assert_eq!(
            prepare(record, registry).unwrap().template_name.as_deref(),
            Some("品牌故事卡")
        );

        let mut unknown = new_record("x");
        unknown.template_name = Some(" ".to_string());
        unknown.template_id = "custom".to_string();
        assert_eq!(
            prepare(unknown, registry).unwrap().template_name.as_deref(),
            Some("custom")
        );

        let mut missing = new_record("x");
        missing.template_id = String::new();
        assert_eq!(
            prepare(missing, registry).unwrap_err(),
            ValidationError::MissingTemplateId
        );
    }
}
