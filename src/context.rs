//! Context (§4.2): a named namespace pairing a DocStore scope with its own
//! SearchStore index, plus the crawl/query operations bound to it.

use std::collections::HashMap;

use reqwest::Client;
use tokio::sync::Mutex;

use crate::adapter::{fs as fs_adapter, web as web_adapter};
use crate::docstore::{Criterion, DocStore, COL_RESOURCES, COL_SOURCES};
use crate::error::{RispError, Result};
use crate::model::{Context as ContextModel, Resource, Source};
use crate::record::TYPE_FIELD;
use crate::search::SearchStore;

/// Default result count when a caller doesn't page explicitly (bleve's own
/// default search request size).
const DEFAULT_SEARCH_LIMIT: usize = 10;

#[derive(Debug)]
pub struct SearchResultHit {
    pub score: f32,
    pub resource: Resource,
    pub highlights: HashMap<String, Vec<String>>,
}

#[derive(Debug)]
pub struct ContextSearchResult {
    pub max_score: f32,
    pub hits: Vec<SearchResultHit>,
}

pub struct Context {
    pub model: ContextModel,
    pub index: SearchStore,
    /// Serializes the lookup-by-URN-then-insert window adapters run during a
    /// crawl (§5, §9 "upsert race"): held for the whole crawl, not just the
    /// insert, so two concurrent `sourceUri` calls for the same URN can't
    /// both miss the lookup and each create a Source row.
    write_lock: Mutex<()>,
}

impl Context {
    pub fn new(model: ContextModel, index: SearchStore) -> Self {
        Self { model, index, write_lock: Mutex::new(()) }
    }

    /// Dispatch a source URI to the adapter matching its scheme (§3, §4.2).
    pub async fn source_uri(&self, uri: &str, docs: &DocStore, http: &Client) -> Result<Source> {
        let _guard = self.write_lock.lock().await;
        if uri.starts_with("file:") {
            fs_adapter::index_uri(&self.model.id, uri, docs, &self.index)
        } else if uri.starts_with("http:") || uri.starts_with("https:") {
            web_adapter::index_uri(&self.model.id, uri, docs, &self.index, http).await
        } else {
            Err(RispError::InvalidSourceUri(format!("unsupported URI scheme in '{uri}'")))
        }
    }

    pub fn get_source(&self, docs: &DocStore, source_id: &str) -> Result<Source> {
        let document = docs
            .find_by_id(COL_SOURCES, source_id)?
            .ok_or_else(|| RispError::InvalidSource(format!("source '{source_id}' not found")))?;
        Source::from_doc(document.id, &document.value)
    }

    pub fn get_sources(&self, docs: &DocStore, limit: usize, offset: usize) -> Result<(Vec<Source>, usize)> {
        self.get_sources_by_criteria(docs, None, limit, offset)
    }

    pub fn get_sources_by_criteria(
        &self,
        docs: &DocStore,
        criteria: Option<Criterion>,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<Source>, usize)> {
        let criterion = self.scoped_criterion(criteria);
        let total = docs.query(COL_SOURCES).where_(criterion.clone()).count()?;
        let documents = docs.query(COL_SOURCES).where_(criterion).limit(limit).skip(offset).find_all()?;
        let sources = documents.into_iter().map(|doc| Source::from_doc(doc.id, &doc.value)).collect::<Result<Vec<_>>>()?;
        Ok((sources, total))
    }

    pub fn get_resource(&self, docs: &DocStore, resource_id: &str) -> Result<Resource> {
        let document = docs
            .find_by_id(COL_RESOURCES, resource_id)?
            .ok_or_else(|| RispError::InvalidResource(format!("resource '{resource_id}' not found")))?;
        Resource::from_doc(document.id, &document.value)
    }

    pub fn get_resources(&self, docs: &DocStore, limit: usize, offset: usize) -> Result<(Vec<Resource>, usize)> {
        self.get_resources_by_criteria(docs, None, limit, offset)
    }

    pub fn get_resources_by_criteria(
        &self,
        docs: &DocStore,
        criteria: Option<Criterion>,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<Resource>, usize)> {
        let criterion = self.scoped_criterion(criteria);
        let total = docs.query(COL_RESOURCES).where_(criterion.clone()).count()?;
        let documents = docs.query(COL_RESOURCES).where_(criterion).limit(limit).skip(offset).find_all()?;
        let resources = documents.into_iter().map(|doc| Resource::from_doc(doc.id, &doc.value)).collect::<Result<Vec<_>>>()?;
        Ok((resources, total))
    }

    /// Query the Context's index, injecting the `_type:resource` filter so
    /// Source records never surface as hits (§4.6), then join every hit
    /// back to its authoritative DocStore record. A hit whose Resource has
    /// since been deleted aborts the whole search rather than silently
    /// dropping it.
    pub fn search(&self, docs: &DocStore, query: &str, highlight: bool) -> Result<ContextSearchResult> {
        let filtered = format!("{query} +{TYPE_FIELD}:resource");
        let result = self.index.search(&filtered, DEFAULT_SEARCH_LIMIT, 0, highlight)?;

        let mut hits = Vec::with_capacity(result.hits.len());
        let mut max_score = 0.0f32;
        for hit in result.hits {
            let resource = self.get_resource(docs, &hit.id)?;
            max_score = max_score.max(hit.score);
            hits.push(SearchResultHit { score: hit.score, resource, highlights: hit.fragments });
        }

        Ok(ContextSearchResult { max_score, hits })
    }

    fn scoped_criterion(&self, extra: Option<Criterion>) -> Criterion {
        let base = Criterion::field("contextId").eq(self.model.id.clone());
        match extra {
            Some(criterion) => base.and(criterion),
            None => base,
        }
    }
}
