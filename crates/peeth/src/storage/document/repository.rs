//! Document store implementation of [`Storage`].

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::params;
use serde_json::{Map, Value};
use tokio_rusqlite::Connection;

use peeth_core::keys::entity_label;
use peeth_core::storage::{
    apply_actions, get_chunks, with_update_stamp, write_chunks, BatchWriteOp, Filter, Page,
    QueryOptions, Record, RecordKey, RepositoryError, Result, Storage, UpdateOptions,
};

use super::error::{map_tokio_rusqlite_error, wrap_err, wrap_repository_err};
use super::sql::{self, SqlQuery};

/// Document-collection storage hosted in SQLite.
///
/// One table per entity type, each row holding the whole record as JSON.
/// All calls run on the single connection thread owned by `tokio_rusqlite`,
/// so they are serialized.
pub struct DocumentStore {
    conn: Connection,
}

impl DocumentStore {
    /// Opens (or creates) a file-backed store. `:memory:` gives a private
    /// in-memory database.
    pub async fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;
        tracing::info!(path, "document store opened");
        Ok(Self { conn })
    }

    /// In-memory store; data is lost when the store is dropped.
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    async fn read(
        &self,
        entity_type: &str,
        collection: String,
        query: SqlQuery,
    ) -> Result<Vec<Record>> {
        let docs = self
            .conn
            .call(move |conn| {
                ensure_collection(conn, &collection)?;
                let mut stmt = conn.prepare(&query.sql).map_err(wrap_err)?;
                let rows = stmt
                    .query_map(rusqlite::params_from_iter(query.params.iter()), |row| {
                        row.get::<_, String>(0)
                    })
                    .map_err(wrap_err)?;

                let mut docs = Vec::new();
                for row in rows {
                    docs.push(row.map_err(wrap_err)?);
                }
                Ok(docs)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, entity_label(entity_type)))?;

        docs.iter().map(|doc| parse_record(doc)).collect()
    }
}

fn ensure_collection(
    conn: &rusqlite::Connection,
    collection: &str,
) -> std::result::Result<(), tokio_rusqlite::Error> {
    conn.execute_batch(&sql::create_collection_sql(collection))
        .map_err(wrap_err)
}

fn select_doc(
    conn: &rusqlite::Connection,
    collection: &str,
    id: &str,
) -> std::result::Result<Option<String>, tokio_rusqlite::Error> {
    match conn.query_row(&sql::select_by_id_sql(collection), [id], |row| row.get(0)) {
        Ok(doc) => Ok(Some(doc)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(wrap_err(e)),
    }
}

fn parse_record(doc: &str) -> Result<Record> {
    Ok(serde_json::from_str(doc)?)
}

/// A write prepared outside the connection thread.
enum WriteStatement {
    Upsert {
        collection: String,
        id: String,
        pk: String,
        sk: String,
        doc: String,
    },
    Delete {
        collection: String,
        id: String,
    },
}

impl WriteStatement {
    /// Writes the record as given; callers stamp it first.
    fn upsert(record: &Record) -> Result<Self> {
        Ok(WriteStatement::Upsert {
            collection: sql::collection_name(record.entity_type())?,
            id: sql::document_id(&record.key()),
            doc: serde_json::to_string(record)?,
            pk: record.pk.clone(),
            sk: record.sk.clone(),
        })
    }

    fn delete(key: &RecordKey) -> Result<Self> {
        Ok(WriteStatement::Delete {
            collection: sql::collection_name(key.entity_type())?,
            id: sql::document_id(key),
        })
    }

    fn execute(
        &self,
        conn: &rusqlite::Connection,
    ) -> std::result::Result<(), tokio_rusqlite::Error> {
        match self {
            WriteStatement::Upsert {
                collection,
                id,
                pk,
                sk,
                doc,
            } => {
                ensure_collection(conn, collection)?;
                conn.execute(&sql::upsert_sql(collection), params![id, pk, sk, doc])
                    .map_err(wrap_err)?;
            }
            WriteStatement::Delete { collection, id } => {
                ensure_collection(conn, collection)?;
                conn.execute(&sql::delete_sql(collection), params![id])
                    .map_err(wrap_err)?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for DocumentStore {
    async fn get(&self, key: &RecordKey) -> Result<Option<Record>> {
        let collection = sql::collection_name(key.entity_type())?;
        let id = sql::document_id(key);

        let doc = self
            .conn
            .call(move |conn| {
                ensure_collection(conn, &collection)?;
                select_doc(conn, &collection, &id)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, entity_label(key.entity_type())))?;

        doc.as_deref().map(parse_record).transpose()
    }

    async fn put(&self, record: Record) -> Result<Record> {
        let mut record = record;
        record.stamp(Utc::now());
        let statement = WriteStatement::upsert(&record)?;
        let label = entity_label(record.entity_type());

        self.conn
            .call(move |conn| statement.execute(conn))
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, label))?;

        tracing::debug!(pk = %record.pk, sk = %record.sk, "put document");
        Ok(record)
    }

    async fn delete(&self, key: &RecordKey) -> Result<()> {
        let statement = WriteStatement::delete(key)?;

        self.conn
            .call(move |conn| statement.execute(conn))
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, entity_label(key.entity_type())))?;

        tracing::debug!(key = %key, "deleted document");
        Ok(())
    }

    async fn query(&self, entity_type: &str, options: QueryOptions) -> Result<Page> {
        if options.start_key.is_some() {
            tracing::debug!(
                entity_type,
                "document store returns complete results; ignoring start key"
            );
        }

        let collection = sql::collection_name(entity_type)?;
        let query = sql::select_query(&collection, &options)?;
        let items = self.read(entity_type, collection, query).await?;

        Ok(Page {
            items,
            last_key: None,
        })
    }

    async fn scan(&self, entity_type: &str, filter: Option<Filter>) -> Result<Vec<Record>> {
        let collection = sql::collection_name(entity_type)?;
        let query = sql::scan_query(&collection, filter.as_ref())?;
        self.read(entity_type, collection, query).await
    }

    async fn update(&self, entity_type: &str, options: UpdateOptions) -> Result<Record> {
        if options.key.entity_type() != entity_type {
            return Err(RepositoryError::InvalidData(format!(
                "Key {} does not belong to {entity_type}",
                options.key
            )));
        }

        let actions = with_update_stamp(options.update.into_actions()?, Utc::now());
        let collection = sql::collection_name(entity_type)?;
        let id = sql::document_id(&options.key);

        let updated = self
            .conn
            .call(move |conn| {
                ensure_collection(conn, &collection)?;
                let tx = conn.transaction().map_err(wrap_err)?;

                let Some(current) = select_doc(&tx, &collection, &id)? else {
                    return Ok(None);
                };

                let mut document: Map<String, Value> =
                    serde_json::from_str(&current).map_err(wrap_repository_err)?;
                apply_actions(&mut document, &actions).map_err(wrap_repository_err)?;
                let doc = serde_json::to_string(&document).map_err(wrap_repository_err)?;

                tx.execute(&sql::update_doc_sql(&collection), params![id, doc])
                    .map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(Some(doc))
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, entity_label(entity_type)))?;

        match updated {
            Some(doc) => parse_record(&doc),
            None => Err(RepositoryError::NotFound {
                entity_type: entity_label(entity_type),
                id: options.key.to_string(),
            }),
        }
    }

    async fn batch_get(&self, keys: &[RecordKey]) -> Result<Vec<Record>> {
        let mut records = Vec::with_capacity(keys.len());

        for chunk in get_chunks(keys) {
            let targets = chunk
                .iter()
                .map(|key| Ok((sql::collection_name(key.entity_type())?, sql::document_id(key))))
                .collect::<Result<Vec<_>>>()?;

            let docs = self
                .conn
                .call(move |conn| {
                    let mut docs = Vec::new();
                    for (collection, id) in &targets {
                        ensure_collection(conn, collection)?;
                        if let Some(doc) = select_doc(conn, collection, id)? {
                            docs.push(doc);
                        }
                    }
                    Ok(docs)
                })
                .await
                .map_err(|e| map_tokio_rusqlite_error(e, "Record"))?;

            for doc in &docs {
                records.push(parse_record(doc)?);
            }
        }

        Ok(records)
    }

    async fn batch_write(&self, ops: Vec<BatchWriteOp>) -> Result<()> {
        let now = Utc::now();

        for (index, chunk) in write_chunks(&ops).enumerate() {
            let statements = chunk
                .iter()
                .map(|op| match op {
                    BatchWriteOp::Put(record) => {
                        let mut record = record.clone();
                        record.stamp(now);
                        WriteStatement::upsert(&record)
                    }
                    BatchWriteOp::Delete(key) => WriteStatement::delete(key),
                })
                .collect::<Result<Vec<_>>>()?;
            let size = statements.len();

            self.conn
                .call(move |conn| {
                    let tx = conn.transaction().map_err(wrap_err)?;
                    for statement in &statements {
                        statement.execute(&tx)?;
                    }
                    tx.commit().map_err(wrap_err)
                })
                .await
                .map_err(|e| map_tokio_rusqlite_error(e, "Record"))?;

            tracing::debug!(chunk = index, size, "batch write chunk applied");
        }

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "document"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peeth_core::storage::{
        FieldUpdate, Index, KeyCondition, NativeUpdate, SortCondition, Update, GSI1SK,
    };
    use serde_json::json;

    async fn store() -> DocumentStore {
        DocumentStore::open_in_memory()
            .await
            .expect("Failed to create in-memory store")
    }

    fn component(page: &str, order: u32, id: &str) -> Record {
        Record::new(RecordKey::single(format!("CMS_COMPONENT#{id}")))
            .with_gsi1(format!("PAGE#{page}"), format!("ORDER#{order:010}#{id}"))
            .with_attribute("componentType", "text_block")
            .with_attribute("visible", order != 1)
            .with_attribute("tags", json!(["bhakti", "seva"]))
    }

    #[tokio::test]
    async fn test_put_then_get_stamps_timestamps() {
        let store = store().await;
        let key = RecordKey::single("USER#1");

        let stored = store
            .put(Record::new(key.clone()).with_attribute("email", "a@b.org"))
            .await
            .unwrap();
        let fetched = store.get(&key).await.unwrap().expect("record exists");

        assert_eq!(fetched, stored);
        assert!(fetched.created_at.is_some());
        assert_eq!(fetched.updated_at, fetched.created_at);
    }

    #[tokio::test]
    async fn test_put_preserves_created_at_on_overwrite() {
        let store = store().await;
        let key = RecordKey::single("USER#1");

        let first = store.put(Record::new(key.clone())).await.unwrap();
        let second = store
            .put(first.clone().with_attribute("name", "Seva"))
            .await
            .unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(store.scan("USER", None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none_and_delete_is_idempotent() {
        let store = store().await;
        let key = RecordKey::single("CONTENT#missing");

        assert!(store.get(&key).await.unwrap().is_none());
        store.delete(&key).await.unwrap();
        store.delete(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_query_gsi_in_sort_order() {
        let store = store().await;
        for (order, id) in [(2, "c"), (0, "a"), (1, "b")] {
            store.put(component("p1", order, id)).await.unwrap();
        }
        store.put(component("p2", 0, "z")).await.unwrap();

        let options = QueryOptions::new(Index::Gsi1, KeyCondition::partition("PAGE#p1"));
        let page = store.query("CMS_COMPONENT", options.clone()).await.unwrap();
        let pks: Vec<_> = page.items.iter().map(|r| r.pk.as_str()).collect();
        assert_eq!(
            pks,
            vec!["CMS_COMPONENT#a", "CMS_COMPONENT#b", "CMS_COMPONENT#c"]
        );
        assert!(page.last_key.is_none());

        let page = store
            .query("CMS_COMPONENT", options.descending().limit(1))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].pk, "CMS_COMPONENT#c");
    }

    #[tokio::test]
    async fn test_query_sort_conditions() {
        let store = store().await;
        for (order, id) in [(0, "a"), (1, "b"), (2, "c")] {
            store.put(component("p1", order, id)).await.unwrap();
        }

        let between = KeyCondition::partition("PAGE#p1").with_sort(SortCondition::Between(
            "ORDER#0000000001".to_string(),
            "ORDER#0000000002~".to_string(),
        ));
        let page = store
            .query("CMS_COMPONENT", QueryOptions::new(Index::Gsi1, between))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);

        let prefix = KeyCondition::partition("PAGE#p1").begins_with("ORDER#0000000002");
        let page = store
            .query("CMS_COMPONENT", QueryOptions::new(Index::Gsi1, prefix))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(
            page.items[0].gsi1sk.as_deref(),
            Some("ORDER#0000000002#c")
        );
    }

    #[tokio::test]
    async fn test_query_filters() {
        let store = store().await;
        for (order, id) in [(0, "a"), (1, "b"), (2, "c")] {
            store.put(component("p1", order, id)).await.unwrap();
        }
        let base = QueryOptions::new(Index::Gsi1, KeyCondition::partition("PAGE#p1"));

        let visible = store
            .query("CMS_COMPONENT", base.clone().filter(Filter::eq("visible", true)))
            .await
            .unwrap();
        assert_eq!(visible.items.len(), 2);

        let tagged = store
            .query(
                "CMS_COMPONENT",
                base.clone()
                    .filter(Filter::Contains("tags".to_string(), json!("seva"))),
            )
            .await
            .unwrap();
        assert_eq!(tagged.items.len(), 3);

        let substring = store
            .query(
                "CMS_COMPONENT",
                base.clone()
                    .filter(Filter::Contains("componentType".to_string(), json!("text"))),
            )
            .await
            .unwrap();
        assert_eq!(substring.items.len(), 3);

        let either = store
            .query(
                "CMS_COMPONENT",
                base.clone().filter(Filter::Or(vec![
                    Filter::eq("visible", false),
                    Filter::NotExists("componentType".to_string()),
                ])),
            )
            .await
            .unwrap();
        assert_eq!(either.items.len(), 1);
        assert_eq!(either.items[0].pk, "CMS_COMPONENT#b");

        let missing = store
            .query(
                "CMS_COMPONENT",
                base.filter(Filter::ne("componentType", "text_block")),
            )
            .await
            .unwrap();
        assert!(missing.items.is_empty());
    }

    #[tokio::test]
    async fn test_start_key_is_ignored() {
        let store = store().await;
        store.put(component("p1", 0, "a")).await.unwrap();
        let token = peeth_core::storage::ContinuationToken::from("anything".to_string());

        let page = store
            .query(
                "CMS_COMPONENT",
                QueryOptions::new(Index::Gsi1, KeyCondition::partition("PAGE#p1"))
                    .start_after(Some(token)),
            )
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn test_field_update_stamps_updated_at() {
        let store = store().await;
        let stored = store.put(component("p1", 0, "a")).await.unwrap();

        let updated = store
            .update(
                "CMS_COMPONENT",
                UpdateOptions::new(
                    stored.key(),
                    FieldUpdate::new()
                        .set(GSI1SK, "ORDER#0000000009#a")
                        .set("visible", false)
                        .increment("views", 2),
                ),
            )
            .await
            .unwrap();

        assert_eq!(updated.gsi1sk.as_deref(), Some("ORDER#0000000009#a"));
        assert_eq!(updated.attribute("visible"), Some(&json!(false)));
        assert_eq!(updated.get_i64("views"), Some(2));
        assert_eq!(updated.created_at, stored.created_at);
        assert!(updated.updated_at >= stored.updated_at);
        assert_eq!(store.get(&stored.key()).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_native_update_is_applied() {
        let store = store().await;
        let page = store
            .put(
                Record::new(RecordKey::single("CMS_PAGE#1"))
                    .with_attribute("componentIds", json!(["x"])),
            )
            .await
            .unwrap();

        let native = NativeUpdate::new(
            "SET #ids = list_append(if_not_exists(#ids, :empty), :new), #s = :s REMOVE #old",
        )
        .name("#ids", "componentIds")
        .name("#s", "slug")
        .name("#old", "legacy")
        .value(":empty", json!([]))
        .value(":new", json!(["y"]))
        .value(":s", "home");

        let updated = store
            .update("CMS_PAGE", UpdateOptions::new(page.key(), Update::Native(native)))
            .await
            .unwrap();

        assert_eq!(updated.attribute("componentIds"), Some(&json!(["x", "y"])));
        assert_eq!(updated.get_str("slug"), Some("home"));
    }

    #[tokio::test]
    async fn test_update_missing_record_is_not_found() {
        let store = store().await;
        let result = store
            .update(
                "USER",
                UpdateOptions::new(
                    RecordKey::single("USER#ghost"),
                    FieldUpdate::new().set("name", "x"),
                ),
            )
            .await;

        assert!(matches!(
            result,
            Err(RepositoryError::NotFound {
                entity_type: "USER",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_batch_write_persists_every_chunk() {
        let store = store().await;
        let ops: Vec<_> = (0..60)
            .map(|i| BatchWriteOp::Put(component("p1", i, &format!("c{i:02}"))))
            .collect();
        assert_eq!(write_chunks(&ops).count(), 3);

        store.batch_write(ops).await.unwrap();

        let page = store
            .query(
                "CMS_COMPONENT",
                QueryOptions::new(Index::Gsi1, KeyCondition::partition("PAGE#p1")),
            )
            .await
            .unwrap();
        assert_eq!(page.items.len(), 60);
        assert!(page.items.iter().all(|r| r.created_at.is_some()));

        let keys: Vec<_> = page.items.iter().map(Record::key).collect();
        let deletes = keys.iter().cloned().map(BatchWriteOp::Delete).collect();
        store.batch_write(deletes).await.unwrap();
        assert!(store.scan("CMS_COMPONENT", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_get_skips_missing_across_collections() {
        let store = store().await;
        store.put(Record::new(RecordKey::single("USER#1"))).await.unwrap();
        store.put(Record::new(RecordKey::single("CMS_PAGE#1"))).await.unwrap();

        let records = store
            .batch_get(&[
                RecordKey::single("USER#1"),
                RecordKey::single("USER#2"),
                RecordKey::single("CMS_PAGE#1"),
            ])
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_scan_with_filter() {
        let store = store().await;
        store
            .put(Record::new(RecordKey::single("CONTENT#1")).with_attribute("status", "draft"))
            .await
            .unwrap();
        store
            .put(Record::new(RecordKey::single("CONTENT#2")).with_attribute("status", "published"))
            .await
            .unwrap();

        let published = store
            .scan("CONTENT", Some(Filter::eq("status", "published")))
            .await
            .unwrap();

        assert_eq!(published.len(), 1);
        assert_eq!(published[0].pk, "CONTENT#2");
    }
}
