//! Engine (§4.1): owns the DocStore, the set of loaded Contexts, and the
//! startup sequence; exposes the operations the RPC facade (`server.rs`)
//! binds to.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::context::{Context, ContextSearchResult};
use crate::docstore::{Criterion, DocStore, COL_CONTEXTS};
use crate::error::{RispError, Result};
use crate::model::{Context as ContextModel, Resource, Source};
use crate::search::SearchStore;

/// Name given to the bootstrap context (§12: original's `setupDefaultContext`).
pub const DEFAULT_CONTEXT_NAME: &str = "_default";

/// Pagination default/clamp applied to `GetSources`/`GetResources` (§4.1,
/// §5): zero-or-negative limit becomes this; negative offset clamps to 0.
const DEFAULT_PAGE_LIMIT: i64 = 100;

/// The knowledge-indexing service: one DocStore, many Contexts, each with
/// its own SearchStore.
pub struct Engine {
    data_dir: PathBuf,
    docs: DocStore,
    http: Client,
    contexts: RwLock<HashMap<String, Context>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").field("data_dir", &self.data_dir).finish_non_exhaustive()
    }
}

impl Engine {
    /// Run the startup sequence (§4.1): open the DocStore, load persisted
    /// contexts and their indexes, then ensure a default context exists.
    pub async fn start(data_dir: PathBuf) -> Result<Self> {
        info!(data_dir = %data_dir.display(), "starting engine");
        std::fs::create_dir_all(&data_dir)?;
        let docs = DocStore::open(&data_dir)?;

        let engine = Self { data_dir, docs, http: Client::new(), contexts: RwLock::new(HashMap::new()) };
        engine.load_contexts().await?;
        engine.ensure_default_context().await?;
        Ok(engine)
    }

    async fn load_contexts(&self) -> Result<()> {
        let documents = self.docs.query(COL_CONTEXTS).find_all()?;
        let mut contexts = self.contexts.write().await;
        for document in documents {
            let model = ContextModel::from_doc(document.id, &document.value)?;
            let index = SearchStore::open_or_create(&self.data_dir, &model.id)?;
            debug!(context_id = %model.id, name = %model.name, "loaded context");
            contexts.insert(model.id.clone(), Context::new(model, index));
        }
        Ok(())
    }

    async fn ensure_default_context(&self) -> Result<()> {
        let has_default = self.contexts.read().await.values().any(|c| c.model.is_default);
        if !has_default {
            info!("no default context found, bootstrapping one");
            self.create_context_inner(DEFAULT_CONTEXT_NAME, true).await?;
        }
        Ok(())
    }

    async fn create_context_inner(&self, name: &str, is_default: bool) -> Result<ContextModel> {
        let model_for_doc = ContextModel { id: String::new(), name: name.to_string(), is_default };
        let id = self.docs.insert_one(COL_CONTEXTS, model_for_doc.to_doc())?;
        let model = ContextModel { id: id.clone(), name: name.to_string(), is_default };
        let index = SearchStore::open_or_create(&self.data_dir, &id)?;
        self.contexts.write().await.insert(id, Context::new(model.clone(), index));
        Ok(model)
    }

    /// Resolve `context_id` against the loaded contexts, falling back to the
    /// context marked default when it is absent or empty (§13 decision #2).
    async fn resolve_context_id(&self, context_id: Option<&str>) -> Result<String> {
        let contexts = self.contexts.read().await;
        match context_id.filter(|id| !id.is_empty()) {
            Some(id) => {
                if contexts.contains_key(id) {
                    Ok(id.to_string())
                } else {
                    Err(RispError::InvalidContext(format!("context '{id}' not found")))
                }
            }
            None => contexts
                .values()
                .find(|c| c.model.is_default)
                .map(|c| c.model.id.clone())
                .ok_or_else(|| RispError::InvalidContext("no default context configured".into())),
        }
    }

    /// `source <uri>` text-command dispatch (§4.1).
    pub async fn execute(&self, command: &str) -> Result<Source> {
        let mut parts = command.splitn(2, ' ');
        let verb = parts.next().unwrap_or("");
        if verb.is_empty() {
            return Err(RispError::InvalidCommand("empty command".into()));
        }
        match verb {
            "source" => {
                let uri = parts.next().map(str::trim).filter(|s| !s.is_empty());
                let uri = uri.ok_or_else(|| RispError::InvalidSourceUri("missing source URI".into()))?;
                self.index_uri(None, uri).await
            }
            other => Err(RispError::InvalidCommand(format!("unrecognized command verb '{other}'"))),
        }
    }

    pub async fn query(&self, context_id: Option<&str>, value: &str, highlight: bool) -> Result<ContextSearchResult> {
        if value.is_empty() {
            return Err(RispError::InvalidQuery("empty query".into()));
        }
        let id = self.resolve_context_id(context_id).await?;
        let contexts = self.contexts.read().await;
        let context = contexts.get(&id).expect("resolved context id is present in the map");
        context.search(&self.docs, value, highlight)
    }

    pub async fn index_uri(&self, context_id: Option<&str>, uri: &str) -> Result<Source> {
        let id = self.resolve_context_id(context_id).await?;
        info!(context_id = %id, uri, "indexing source uri");
        let contexts = self.contexts.read().await;
        let context = contexts.get(&id).expect("resolved context id is present in the map");
        context.source_uri(uri, &self.docs, &self.http).await
    }

    pub async fn get_context(&self, context_id: Option<&str>) -> Result<ContextModel> {
        let contexts = self.contexts.read().await;
        match context_id.filter(|id| !id.is_empty()) {
            Some(id) => contexts
                .get(id)
                .map(|c| c.model.clone())
                .ok_or_else(|| RispError::InvalidContext(format!("context '{id}' not found"))),
            None => contexts
                .values()
                .find(|c| c.model.is_default)
                .map(|c| c.model.clone())
                .ok_or_else(|| RispError::InvalidContext("no default context configured".into())),
        }
    }

    pub async fn get_contexts(&self) -> Vec<ContextModel> {
        let mut models: Vec<_> = self.contexts.read().await.values().map(|c| c.model.clone()).collect();
        models.sort_by(|a, b| a.id.cmp(&b.id));
        models
    }

    pub async fn get_sources(&self, context_id: Option<&str>, limit: i64, offset: i64) -> Result<(Vec<Source>, usize)> {
        let id = self.resolve_context_id(context_id).await?;
        let (limit, offset) = normalize_page(limit, offset);
        let contexts = self.contexts.read().await;
        let context = contexts.get(&id).expect("resolved context id is present in the map");
        context.get_sources(&self.docs, limit, offset)
    }

    pub async fn get_resources(&self, context_id: Option<&str>, limit: i64, offset: i64) -> Result<(Vec<Resource>, usize)> {
        let id = self.resolve_context_id(context_id).await?;
        let (limit, offset) = normalize_page(limit, offset);
        let contexts = self.contexts.read().await;
        let context = contexts.get(&id).expect("resolved context id is present in the map");
        context.get_resources(&self.docs, limit, offset)
    }

    /// Insert a new, never-default context (§12: only the bootstrap path
    /// creates `isDefault == true`).
    pub async fn create_context(&self, name: &str) -> Result<ContextModel> {
        self.create_context_inner(name, false).await
    }

    pub async fn export_contexts(&self, context_ids: &[String], output_path: &Path) -> Result<()> {
        crate::export::export_contexts(self, context_ids, output_path).await
    }

    pub(crate) async fn context_model(&self, context_id: &str) -> Option<ContextModel> {
        self.contexts.read().await.get(context_id).map(|c| c.model.clone())
    }

    pub(crate) async fn context_sources_page(&self, context_id: &str, limit: i64, offset: i64) -> Result<(Vec<Source>, usize)> {
        let contexts = self.contexts.read().await;
        let context = contexts
            .get(context_id)
            .ok_or_else(|| RispError::InvalidContext(format!("context '{context_id}' not found")))?;
        context.get_sources(&self.docs, limit.max(0) as usize, offset.max(0) as usize)
    }

    pub(crate) async fn context_resources_of_source_page(
        &self,
        context_id: &str,
        source_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Resource>, usize)> {
        let contexts = self.contexts.read().await;
        let context = contexts
            .get(context_id)
            .ok_or_else(|| RispError::InvalidContext(format!("context '{context_id}' not found")))?;
        context.get_resources_by_criteria(
            &self.docs,
            Some(Criterion::field("sourceId").eq(source_id.to_string())),
            limit.max(0) as usize,
            offset.max(0) as usize,
        )
    }
}

fn normalize_page(limit: i64, offset: i64) -> (usize, usize) {
    let limit = if limit <= 0 { DEFAULT_PAGE_LIMIT } else { limit };
    let offset = offset.max(0);
    (limit as usize, offset as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn startup_bootstraps_a_default_context() {
        let dir = tempdir().unwrap();
        let engine = Engine::start(dir.path().to_path_buf()).await.unwrap();
        let default = engine.get_context(None).await.unwrap();
        assert_eq!(default.name, DEFAULT_CONTEXT_NAME);
        assert!(default.is_default);
    }

    #[tokio::test]
    async fn reopening_reuses_the_persisted_default_context() {
        let dir = tempdir().unwrap();
        let first_id = {
            let engine = Engine::start(dir.path().to_path_buf()).await.unwrap();
            engine.get_context(None).await.unwrap().id
        };
        let engine = Engine::start(dir.path().to_path_buf()).await.unwrap();
        assert_eq!(engine.get_context(None).await.unwrap().id, first_id);
        assert_eq!(engine.get_contexts().await.len(), 1);
    }

    #[tokio::test]
    async fn execute_requires_a_known_verb_and_uri() {
        let dir = tempdir().unwrap();
        let engine = Engine::start(dir.path().to_path_buf()).await.unwrap();

        assert!(matches!(engine.execute("").await, Err(RispError::InvalidCommand(_))));
        assert!(matches!(engine.execute("bogus x").await, Err(RispError::InvalidCommand(_))));
        assert!(matches!(engine.execute("source ").await, Err(RispError::InvalidSourceUri(_))));
    }

    #[tokio::test]
    async fn query_rejects_an_empty_value() {
        let dir = tempdir().unwrap();
        let engine = Engine::start(dir.path().to_path_buf()).await.unwrap();
        assert!(matches!(engine.query(None, "", false).await, Err(RispError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn indexing_a_directory_twice_reuses_the_same_source() {
        let root = tempdir().unwrap();
        std::fs::write(root.path().join("a.txt"), "hello world").unwrap();

        let data_dir = tempdir().unwrap();
        let engine = Engine::start(data_dir.path().to_path_buf()).await.unwrap();

        let uri = format!("file://{}", root.path().display());
        let first = engine.index_uri(None, &uri).await.unwrap();
        let second = engine.index_uri(None, &uri).await.unwrap();
        assert_eq!(first.id, second.id);

        let (sources, total) = engine.get_sources(None, 100, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(sources.len(), 1);

        let found = engine.query(None, "hello", false).await.unwrap();
        assert_eq!(found.hits.len(), 1);
    }

    #[tokio::test]
    async fn create_context_never_marks_itself_default() {
        let dir = tempdir().unwrap();
        let engine = Engine::start(dir.path().to_path_buf()).await.unwrap();
        let created = engine.create_context("work").await.unwrap();
        assert!(!created.is_default);
        assert_eq!(engine.get_contexts().await.len(), 2);
    }
}
