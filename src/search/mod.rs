//! SearchStore (§4.6): one tantivy index per Context, replace-on-id
//! indexing, and query-string search with optional per-field highlighting.

pub mod analyzer;
pub mod schema;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use serde_json::Value;
use tantivy::collector::{Count, TopDocs};
use tantivy::directory::MmapDirectory;
use tantivy::Document;
use tantivy::query::QueryParser;
use tantivy::schema::{FieldType, Value as _};
use tantivy::snippet::SnippetGenerator;
use tantivy::{Index, IndexReader, IndexSettings, IndexWriter, ReloadPolicy, TantivyDocument, Term};

use crate::error::Result;
use crate::record::Record;
use analyzer::{risp_html_analyzer, RISP_HTML_TOKENIZER};
use schema::RecordSchema;

const INDEXING_BUFFER_BYTES: usize = 50_000_000;

pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub fields: Value,
    /// Field name (e.g. `fs-file.contents_text`) to highlighted fragments.
    pub fragments: HashMap<String, Vec<String>>,
}

pub struct SearchResult {
    pub hits: Vec<SearchHit>,
    pub total: usize,
}

/// Per-Context inverted index (§4.6): a single logical collection holding
/// both Source and Resource records, discriminated by `_type`.
pub struct SearchStore {
    index: Index,
    fields: RecordSchema,
    writer: Mutex<IndexWriter>,
    reader: IndexReader,
}

impl SearchStore {
    /// Open the index rooted at `<data_dir>/<context_id>`, creating it (and
    /// the directory) on first use.
    pub fn open_or_create(data_dir: &Path, context_id: &str) -> Result<Self> {
        let dir = data_dir.join(context_id);
        std::fs::create_dir_all(&dir)?;

        let fields = RecordSchema::build();
        let mmap_dir = MmapDirectory::open(&dir)?;
        let index = if Index::exists(&mmap_dir)? {
            Index::open(mmap_dir)?
        } else {
            Index::create(mmap_dir, fields.schema.clone(), IndexSettings::default())?
        };
        index.tokenizers().register(RISP_HTML_TOKENIZER, risp_html_analyzer());

        let writer = index.writer(INDEXING_BUFFER_BYTES)?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()?;

        Ok(Self { index, fields, writer: Mutex::new(writer), reader })
    }

    /// Index `record` under `id`, replacing any document already carrying
    /// that id (§4.6's replace-not-merge upsert semantics).
    pub fn index(&self, id: &str, record: Record) -> Result<()> {
        let mut writer = self.writer.lock().expect("search index writer poisoned");
        writer.delete_term(Term::from_field_text(self.fields.id, id));

        let mut doc = TantivyDocument::default();
        doc.add_text(self.fields.id, id);
        self.populate(&mut doc, record.into_value());
        writer.add_document(doc)?;
        writer.commit()?;
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let mut writer = self.writer.lock().expect("search index writer poisoned");
        writer.delete_term(Term::from_field_text(self.fields.id, id));
        writer.commit()?;
        Ok(())
    }

    /// Run `query_str` against the default content/identity fields,
    /// optionally attaching highlight fragments from the four content
    /// fields named in §4.4.
    pub fn search(&self, query_str: &str, limit: usize, offset: usize, highlight: bool) -> Result<SearchResult> {
        self.reader.reload()?;
        let searcher = self.reader.searcher();

        let default_fields = vec![
            self.fields.canonical_uri,
            self.fields.fs_path,
            self.fields.fs_filename,
            self.fields.fs_contents_text,
            self.fields.fs_contents_html,
            self.fields.web_path,
            self.fields.web_title,
            self.fields.web_body,
        ];
        let parser = QueryParser::for_index(&self.index, default_fields);
        let query = parser.parse_query(query_str)?;

        let total = searcher.search(&query, &Count)?;
        let top_docs = searcher.search(&query, &TopDocs::with_limit(limit + offset))?;

        let generators: Vec<(&'static str, Option<SnippetGenerator>)> = if highlight {
            self.fields
                .highlight_fields()
                .into_iter()
                .map(|(name, field)| (name, SnippetGenerator::create(&searcher, &query, field).ok()))
                .collect()
        } else {
            Vec::new()
        };

        let mut hits = Vec::with_capacity(limit.min(top_docs.len().saturating_sub(offset)));
        for (score, doc_address) in top_docs.into_iter().skip(offset) {
            let retrieved: TantivyDocument = searcher.doc(doc_address)?;
            let id = retrieved
                .get_first(self.fields.id)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();

            let mut fragments = HashMap::new();
            for (name, generator) in &generators {
                if let Some(generator) = generator {
                    let snippet = generator.snippet_from_doc(&retrieved);
                    let html = snippet.to_html();
                    if !html.is_empty() {
                        fragments.entry((*name).to_string()).or_insert_with(Vec::new).push(html);
                    }
                }
            }

            hits.push(SearchHit { id, score, fields: self.document_to_json(&retrieved), fragments });
        }

        Ok(SearchResult { hits, total })
    }

    /// Recursively write `value`'s leaves into the dotted-name schema
    /// fields they correspond to (`adapterData.path`, `fs-file.path`, ...),
    /// skipping anything the schema has no field for.
    fn populate(&self, doc: &mut TantivyDocument, value: Value) {
        let mut flat = Vec::new();
        flatten(&value, "", &mut flat);
        for (key, leaf) in flat {
            let Ok(field) = self.fields.schema.get_field(&key) else { continue };
            let entry = self.fields.schema.get_field_entry(field);
            match entry.field_type() {
                FieldType::Bool(_) => {
                    if let Some(b) = leaf.as_bool() {
                        doc.add_bool(field, b);
                    }
                }
                FieldType::Str(_) => {
                    if let Some(s) = leaf.as_str() {
                        doc.add_text(field, s);
                    }
                }
                _ => {}
            }
        }
    }

    fn document_to_json(&self, doc: &TantivyDocument) -> Value {
        let as_json = doc.to_json(&self.fields.schema);
        serde_json::from_str(&as_json).unwrap_or(Value::Null)
    }
}

fn flatten(value: &Value, prefix: &str, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) => {
            for (key, v) in map {
                let joined = if prefix.is_empty() { key.clone() } else { format!("{prefix}.{key}") };
                flatten(v, &joined, out);
            }
        }
        other => out.push((prefix.to_string(), other.clone())),
    }
}
