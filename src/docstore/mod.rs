//! DocStore (§4.5): authoritative metadata storage for Contexts, Sources,
//! and Resources, with a small criterion algebra mirroring the Go
//! original's `clover.Field(name).Eq(value)` query builder.

pub mod file_store;

use std::path::Path;

use serde_json::Value;
use uuid::Uuid;

use crate::error::Result;
use file_store::FileStore;

pub const COL_CONTEXTS: &str = "Contexts";
pub const COL_SOURCES: &str = "Sources";
pub const COL_RESOURCES: &str = "Resources";

/// A persisted document: its DocStore-assigned id plus its JSON body.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub value: Value,
}

/// Conjunction of top-level field equality checks.
#[derive(Debug, Clone, Default)]
pub struct Criterion {
    checks: Vec<(String, Value)>,
}

impl Criterion {
    pub fn field(name: impl Into<String>) -> FieldBuilder {
        FieldBuilder { name: name.into() }
    }

    pub fn and(mut self, other: Criterion) -> Self {
        self.checks.extend(other.checks);
        self
    }

    fn matches(&self, doc: &Value) -> bool {
        self.checks.iter().all(|(field, expected)| doc.get(field) == Some(expected))
    }
}

pub struct FieldBuilder {
    name: String,
}

impl FieldBuilder {
    pub fn eq(self, value: impl Into<Value>) -> Criterion {
        Criterion { checks: vec![(self.name, value.into())] }
    }
}

/// A chainable query against one collection (§4.5's `.Where().Limit().Skip().FindAll()`).
pub struct Query<'a> {
    store: &'a DocStore,
    collection: String,
    criterion: Option<Criterion>,
    limit: Option<usize>,
    skip: usize,
}

impl<'a> Query<'a> {
    pub fn where_(mut self, criterion: Criterion) -> Self {
        self.criterion = Some(match self.criterion {
            Some(existing) => existing.and(criterion),
            None => criterion,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.matching()?.len())
    }

    pub fn find_all(&self) -> Result<Vec<Document>> {
        let mut docs = self.matching()?;
        if self.skip > 0 {
            docs = docs.into_iter().skip(self.skip).collect();
        }
        if let Some(limit) = self.limit {
            docs.truncate(limit);
        }
        Ok(docs)
    }

    fn matching(&self) -> Result<Vec<Document>> {
        let mut all = self.store.backend.all(&self.collection)?;
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(match &self.criterion {
            Some(criterion) => all.into_iter().filter(|doc| criterion.matches(&doc.value)).collect(),
            None => all,
        })
    }
}

/// The three-collection metadata store (§4.5).
pub struct DocStore {
    backend: FileStore,
}

impl DocStore {
    pub fn open(data_dir: &Path) -> Result<Self> {
        let backend = FileStore::open(data_dir)?;
        for name in [COL_CONTEXTS, COL_SOURCES, COL_RESOURCES] {
            if !backend.has_collection(name)? {
                backend.create_collection(name)?;
            }
        }
        Ok(Self { backend })
    }

    pub fn query(&self, collection: &str) -> Query<'_> {
        Query { store: self, collection: collection.to_string(), criterion: None, limit: None, skip: 0 }
    }

    pub fn insert_one(&self, collection: &str, value: Value) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.backend.insert(collection, &id, value)?;
        Ok(id)
    }

    pub fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.backend.get(collection, id)
    }

    /// Overwrite the document at `id` (used after a crawl re-parses an
    /// already-known Source/Resource).
    pub fn replace(&self, collection: &str, id: &str, value: Value) -> Result<()> {
        self.backend.insert(collection, id, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn insert_and_find_by_id_round_trips() {
        let dir = tempdir().unwrap();
        let store = DocStore::open(dir.path()).unwrap();
        let id = store.insert_one(COL_SOURCES, json!({"contextId": "ctx1", "canonicalUri": "file:///a"})).unwrap();
        let found = store.find_by_id(COL_SOURCES, &id).unwrap().unwrap();
        assert_eq!(found.value["contextId"], "ctx1");
    }

    #[test]
    fn criterion_filters_by_equality() {
        let dir = tempdir().unwrap();
        let store = DocStore::open(dir.path()).unwrap();
        store.insert_one(COL_SOURCES, json!({"contextId": "ctx1"})).unwrap();
        store.insert_one(COL_SOURCES, json!({"contextId": "ctx2"})).unwrap();

        let matches = store
            .query(COL_SOURCES)
            .where_(Criterion::field("contextId").eq("ctx1"))
            .find_all()
            .unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn pagination_applies_limit_and_skip() {
        let dir = tempdir().unwrap();
        let store = DocStore::open(dir.path()).unwrap();
        for i in 0..5 {
            store.insert_one(COL_SOURCES, json!({"n": i})).unwrap();
        }
        let page = store.query(COL_SOURCES).limit(2).skip(1).find_all().unwrap();
        assert_eq!(page.len(), 2);
    }

    #[test]
    fn reopening_the_store_reloads_persisted_documents() {
        let dir = tempdir().unwrap();
        let id = {
            let store = DocStore::open(dir.path()).unwrap();
            store.insert_one(COL_CONTEXTS, json!({"name": "_default", "isDefault": true})).unwrap()
        };
        let reopened = DocStore::open(dir.path()).unwrap();
        let found = reopened.find_by_id(COL_CONTEXTS, &id).unwrap().unwrap();
        assert_eq!(found.value["name"], "_default");
    }
}
