//! Data model (§3): Context, Source, Resource, and the AdapterData /
//! resource-payload tagged unions. Operations named in §9's design notes —
//! `marshalURN`, `marshalMap` (→ `to_doc`), `marshalRecord` (→ `to_record`)
//! — are implemented here as plain methods rather than through a trait
//! hierarchy, since the set of variants is closed and small.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{RispError, Result};
use crate::record::Record;
use crate::urn;

/// A named search namespace (§3 Context).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}

impl Context {
    pub fn to_doc(&self) -> Value {
        json!({ "name": self.name, "isDefault": self.is_default })
    }

    pub fn from_doc(id: String, doc: &Value) -> Result<Self> {
        let name = doc
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RispError::InvalidContext("missing context name".into()))?
            .to_string();
        let is_default = doc
            .get("isDefault")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Ok(Self { id, name, is_default })
    }
}

/// Adapter discriminator (§3, §4.7, §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterType {
    Fs,
    Web,
}

impl AdapterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterType::Fs => "fs",
            AdapterType::Web => "web",
        }
    }
}

impl std::str::FromStr for AdapterType {
    type Err = RispError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fs" => Ok(AdapterType::Fs),
            "web" => Ok(AdapterType::Web),
            other => Err(RispError::InvalidSource(format!("invalid adapter: '{other}'"))),
        }
    }
}

/// Adapter-specific payload carried by a Source, tagged by `AdapterType`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AdapterData {
    Fs {
        path: String,
        is_dir: bool,
        is_dot: bool,
    },
    Web {
        scheme: String,
        host: String,
        user: String,
    },
}

impl AdapterData {
    fn to_doc(&self) -> Value {
        match self {
            AdapterData::Fs { path, is_dir, is_dot } => json!({
                "path": path, "isDir": is_dir, "isDot": is_dot,
            }),
            AdapterData::Web { scheme, host, user } => json!({
                "scheme": scheme, "host": host, "user": user,
            }),
        }
    }

    fn from_doc(adapter_type: AdapterType, doc: &Value) -> Self {
        match adapter_type {
            AdapterType::Fs => AdapterData::Fs {
                path: str_field(doc, "path"),
                is_dir: bool_field(doc, "isDir"),
                is_dot: bool_field(doc, "isDot"),
            },
            AdapterType::Web => AdapterData::Web {
                scheme: str_field(doc, "scheme"),
                host: str_field(doc, "host"),
                user: str_field(doc, "user"),
            },
        }
    }
}

fn str_field(doc: &Value, key: &str) -> String {
    doc.get(key).and_then(Value::as_str).unwrap_or("").to_string()
}

fn bool_field(doc: &Value, key: &str) -> bool {
    doc.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// An origin of content within a Context (§3 Source).
#[derive(Debug, Clone)]
pub struct Source {
    pub id: Option<String>,
    pub context_id: String,
    pub canonical_uri: String,
    pub adapter_type: AdapterType,
    pub adapter_data: Option<AdapterData>,
}

impl Source {
    pub fn new(context_id: impl Into<String>, canonical_uri: impl Into<String>, adapter_type: AdapterType) -> Self {
        Self {
            id: None,
            context_id: context_id.into(),
            canonical_uri: canonical_uri.into(),
            adapter_type,
            adapter_data: None,
        }
    }

    pub fn marshal_urn(&self) -> String {
        urn::marshal_source_urn(&self.context_id, self.adapter_type.as_str(), &self.canonical_uri)
    }

    /// Metadata document for the DocStore (no content fields — those only
    /// ever live on Resources, and even there only inside the Record).
    pub fn to_doc(&self) -> Value {
        let mut doc = json!({
            "contextId": self.context_id,
            "adapterType": self.adapter_type,
            "canonicalUri": self.canonical_uri,
            "urn": self.marshal_urn(),
        });
        if let Some(data) = &self.adapter_data {
            doc["adapterData"] = data.to_doc();
        }
        doc
    }

    /// Record for the SearchStore (§4.4 Source mapping).
    pub fn to_record(&self) -> Record {
        let mut record = Record::new_source();
        record.set_all(self.to_doc());
        record
    }

    /// Reconstruct a Source from a DocStore document, honoring the
    /// upsert-by-URN discipline (§4.5): if `urn` is present it is
    /// authoritative for identity; `adapterData` is always re-hydrated.
    pub fn from_doc(id: String, doc: &Value) -> Result<Self> {
        let (context_id, adapter_type, canonical_uri) = if let Some(urn) = doc.get("urn").and_then(Value::as_str) {
            if urn.is_empty() {
                Self::fields_from_doc(doc)?
            } else {
                let (context_id, adapter_type_str, canonical_uri) = urn::unmarshal_source_urn(urn)?;
                (context_id, adapter_type_str.parse()?, canonical_uri)
            }
        } else {
            Self::fields_from_doc(doc)?
        };

        let adapter_data = doc.get("adapterData").map(|d| AdapterData::from_doc(adapter_type, d));

        Ok(Self {
            id: Some(id),
            context_id,
            canonical_uri,
            adapter_type,
            adapter_data,
        })
    }

    fn fields_from_doc(doc: &Value) -> Result<(String, AdapterType, String)> {
        let adapter_type: AdapterType = doc
            .get("adapterType")
            .and_then(Value::as_str)
            .ok_or_else(|| RispError::InvalidSource("missing source adapter type".into()))?
            .parse()?;
        let context_id = doc
            .get("contextId")
            .and_then(Value::as_str)
            .ok_or_else(|| RispError::InvalidSource("missing source contextId".into()))?
            .to_string();
        let canonical_uri = doc
            .get("canonicalUri")
            .and_then(Value::as_str)
            .ok_or_else(|| RispError::InvalidSource("missing source canonicalUri".into()))?
            .to_string();
        Ok((context_id, adapter_type, canonical_uri))
    }
}

/// Resource variant discriminator (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    FsFile,
    WebPage,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::FsFile => "fs-file",
            ResourceType::WebPage => "web-page",
        }
    }
}

impl std::str::FromStr for ResourceType {
    type Err = RispError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fs-file" => Ok(ResourceType::FsFile),
            "web-page" => Ok(ResourceType::WebPage),
            other => Err(RispError::InvalidResource(format!("invalid resource type '{other}'"))),
        }
    }
}

/// Type-specific payload of a Resource (§3).
#[derive(Debug, Clone, Default)]
pub struct FsFileData {
    pub path: String,
    pub filename: String,
    pub filetype: String,
    pub is_dot: bool,
    /// In-memory only; populated during parsing, never persisted to the
    /// DocStore, only written into the Record at index time.
    pub contents_keywords: String,
    pub contents_text: String,
    pub contents_html: String,
}

#[derive(Debug, Clone, Default)]
pub struct WebPageData {
    pub path: String,
    pub query: String,
    pub title: String,
    /// In-memory only, see `FsFileData` contents fields.
    pub body: String,
}

#[derive(Debug, Clone)]
pub enum ResourceData {
    FsFile(FsFileData),
    WebPage(WebPageData),
}

/// An individual indexable unit crawled from a Source (§3 Resource).
#[derive(Debug, Clone)]
pub struct Resource {
    pub id: Option<String>,
    pub context_id: String,
    pub source_id: String,
    pub source_urn: String,
    pub canonical_uri: String,
    pub data: ResourceData,
}

impl Resource {
    pub fn resource_type(&self) -> ResourceType {
        match &self.data {
            ResourceData::FsFile(_) => ResourceType::FsFile,
            ResourceData::WebPage(_) => ResourceType::WebPage,
        }
    }

    pub fn new_fs_file(source: &Source, relative_path: &str) -> Self {
        let filename = relative_path.rsplit('/').next().unwrap_or(relative_path).to_string();
        let is_dot = filename.starts_with('.');
        let filetype = if is_dot {
            String::new()
        } else {
            filename.rsplit_once('.').map(|(_, ext)| ext.to_string()).unwrap_or_default()
        };

        Self {
            id: None,
            context_id: source.context_id.clone(),
            source_id: source.id.clone().unwrap_or_default(),
            source_urn: source.marshal_urn(),
            canonical_uri: relative_path.to_string(),
            data: ResourceData::FsFile(FsFileData {
                path: relative_path.to_string(),
                filename,
                filetype,
                is_dot,
                ..Default::default()
            }),
        }
    }

    /// `resource_uri` is the full request URI (authority + path + query);
    /// the stored canonical URI strips the authority (§4.8).
    pub fn new_web_page(source: &Source, path: &str, query: &str) -> Self {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        let canonical_uri = if query.is_empty() {
            path.clone()
        } else {
            format!("{path}?{query}")
        };

        Self {
            id: None,
            context_id: source.context_id.clone(),
            source_id: source.id.clone().unwrap_or_default(),
            source_urn: source.marshal_urn(),
            canonical_uri,
            data: ResourceData::WebPage(WebPageData {
                path,
                query: query.to_string(),
                ..Default::default()
            }),
        }
    }

    pub fn marshal_urn(&self) -> String {
        urn::marshal_resource_urn(&self.source_urn, self.resource_type().as_str(), &self.canonical_uri)
    }

    /// Metadata document for the DocStore — excludes the in-memory-only
    /// content fields (§4.4's `fs-file`/`web-page` sub-documents split
    /// stored metadata from indexed content).
    pub fn to_doc(&self) -> Value {
        let mut doc = json!({
            "contextId": self.context_id,
            "sourceId": self.source_id,
            "type": self.resource_type(),
            "canonicalUri": self.canonical_uri,
            "urn": self.marshal_urn(),
        });
        let key = self.resource_type().as_str();
        doc[key] = match &self.data {
            ResourceData::FsFile(d) => json!({
                "path": d.path, "filename": d.filename, "filetype": d.filetype, "isDot": d.is_dot,
            }),
            ResourceData::WebPage(d) => json!({
                "path": d.path, "query": d.query, "title": d.title,
            }),
        };
        doc
    }

    /// Record for the SearchStore (§4.4 Resource mapping) — includes
    /// content fields absent from `to_doc`.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new_resource();
        record.set_all(self.to_doc());
        let key = self.resource_type().as_str();
        match &self.data {
            ResourceData::FsFile(d) => {
                record.set_field(
                    key,
                    json!({
                        "path": d.path,
                        "filename": d.filename,
                        "filetype": d.filetype,
                        "isDot": d.is_dot,
                        "contents_keywords": d.contents_keywords,
                        "contents_text": d.contents_text,
                        "contents_html": d.contents_html,
                    }),
                );
            }
            ResourceData::WebPage(d) => {
                record.set_field(
                    key,
                    json!({
                        "path": d.path,
                        "query": d.query,
                        "title": d.title,
                        "body": d.body,
                    }),
                );
            }
        }
        record
    }

    pub fn from_doc(id: String, doc: &Value) -> Result<Self> {
        let (context_id, resource_type, canonical_uri, source_urn) =
            if let Some(urn) = doc.get("urn").and_then(Value::as_str).filter(|s| !s.is_empty()) {
                let (context_id, adapter_type, source_uri_str, resource_type_str, canonical_uri) =
                    urn::unmarshal_resource_urn(urn)?;
                let source_urn = urn::marshal_source_urn(&context_id, &adapter_type, &source_uri_str);
                (context_id, resource_type_str.parse()?, canonical_uri, source_urn)
            } else {
                let context_id = doc
                    .get("contextId")
                    .and_then(Value::as_str)
                    .ok_or_else(|| RispError::InvalidResource("missing resource contextId".into()))?
                    .to_string();
                let resource_type: ResourceType = doc
                    .get("type")
                    .and_then(Value::as_str)
                    .ok_or_else(|| RispError::InvalidResource("missing resource type".into()))?
                    .parse()?;
                let canonical_uri = doc
                    .get("canonicalUri")
                    .and_then(Value::as_str)
                    .ok_or_else(|| RispError::InvalidResource("missing resource canonicalUri".into()))?
                    .to_string();
                (context_id, resource_type, canonical_uri, String::new())
            };

        let source_id = str_field(doc, "sourceId");
        let key = resource_type.as_str();
        let sub = doc.get(key);

        let data = match resource_type {
            ResourceType::FsFile => ResourceData::FsFile(FsFileData {
                path: sub.map(|s| str_field(s, "path")).unwrap_or_default(),
                filename: sub.map(|s| str_field(s, "filename")).unwrap_or_default(),
                filetype: sub.map(|s| str_field(s, "filetype")).unwrap_or_default(),
                is_dot: sub.map(|s| bool_field(s, "isDot")).unwrap_or(false),
                ..Default::default()
            }),
            ResourceType::WebPage => ResourceData::WebPage(WebPageData {
                path: sub.map(|s| str_field(s, "path")).unwrap_or_default(),
                query: sub.map(|s| str_field(s, "query")).unwrap_or_default(),
                title: sub.map(|s| str_field(s, "title")).unwrap_or_default(),
                ..Default::default()
            }),
        };

        Ok(Self {
            id: Some(id),
            context_id,
            source_id,
            source_urn,
            canonical_uri,
            data,
        })
    }
}
