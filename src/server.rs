//! RPC facade (§11): binds `Engine` operations to `rmcp` tool definitions.
//! Thin by design — no Engine logic lives here, only (de)serialization and
//! `RispError` → `ErrorData` translation via `RispError::code()`.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ErrorData, Implementation, ServerCapabilities, ServerInfo},
    service::RequestContext,
    tool, tool_handler, tool_router, RoleServer, ServerHandler,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::engine::Engine;
use crate::error::RispError;
use crate::model::{Resource, ResourceData, Source};

fn to_tool_error(err: RispError) -> ErrorData {
    ErrorData::internal_error(err.to_string(), Some(json!({ "code": err.code() })))
}

fn to_json_result<T: Serialize>(value: &T) -> Result<CallToolResult, ErrorData> {
    let text = serde_json::to_string(value)
        .map_err(|e| ErrorData::internal_error(format!("serialization error: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

#[derive(Debug, Serialize)]
struct SourceDto {
    id: String,
    #[serde(rename = "contextId")]
    context_id: String,
    #[serde(rename = "canonicalUri")]
    canonical_uri: String,
    #[serde(rename = "adapterType")]
    adapter_type: &'static str,
}

impl From<&Source> for SourceDto {
    fn from(source: &Source) -> Self {
        Self {
            id: source.id.clone().unwrap_or_default(),
            context_id: source.context_id.clone(),
            canonical_uri: source.canonical_uri.clone(),
            adapter_type: source.adapter_type.as_str(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ResourceDto {
    id: String,
    #[serde(rename = "contextId")]
    context_id: String,
    #[serde(rename = "sourceId")]
    source_id: String,
    #[serde(rename = "type")]
    resource_type: &'static str,
    #[serde(rename = "canonicalUri")]
    canonical_uri: String,
    #[serde(rename = "dataJson")]
    data_json: Value,
}

impl From<&Resource> for ResourceDto {
    fn from(resource: &Resource) -> Self {
        let data_json = match &resource.data {
            ResourceData::FsFile(d) => json!({
                "path": d.path, "filename": d.filename, "filetype": d.filetype, "isDot": d.is_dot,
            }),
            ResourceData::WebPage(d) => json!({
                "path": d.path, "query": d.query, "title": d.title,
            }),
        };
        Self {
            id: resource.id.clone().unwrap_or_default(),
            context_id: resource.context_id.clone(),
            source_id: resource.source_id.clone(),
            resource_type: resource.resource_type().as_str(),
            canonical_uri: resource.canonical_uri.clone(),
            data_json,
        }
    }
}

#[derive(Debug, Serialize)]
struct ContextDto {
    id: String,
    name: String,
    #[serde(rename = "isDefault")]
    is_default: bool,
}

#[derive(Debug, Serialize)]
struct HighlightDto {
    key: String,
    values: Vec<String>,
}

#[derive(Debug, Serialize)]
struct EdgeDto {
    score: f32,
    resource: ResourceDto,
    highlights: Vec<HighlightDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExecuteParams {
    /// Text command. The only recognized verb is `source <uri>`.
    pub command: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueryParams {
    pub value: String,
    pub context_id: Option<String>,
    /// Enables highlight fragments when true; empty/absent disables them.
    pub highlight: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IndexUriParams {
    pub uri: String,
    pub context_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetContextParams {
    pub context_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetContextsParams {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PageParams {
    pub context_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateContextParams {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExportContextsParams {
    pub context_ids: Vec<String>,
    pub output_path: String,
}

#[derive(Debug, Clone)]
pub struct RispServer {
    engine: Arc<Engine>,
    tool_router: ToolRouter<Self>,
}

impl RispServer {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine, tool_router: Self::tool_router() }
    }
}

#[tool_router]
impl RispServer {
    /// Dispatch a text command. Currently recognizes `source <uri>`.
    #[tool(description = "Run a text command against the engine (currently: 'source <uri>')")]
    pub async fn execute(&self, params: Parameters<ExecuteParams>) -> Result<CallToolResult, ErrorData> {
        let source = self.engine.execute(&params.0.command).await.map_err(to_tool_error)?;
        to_json_result(&json!({ "source": SourceDto::from(&source) }))
    }

    /// Search the addressed context's index for resources.
    #[tool(description = "Search a context's full-text index and return matching resources")]
    pub async fn query(&self, params: Parameters<QueryParams>) -> Result<CallToolResult, ErrorData> {
        let QueryParams { value, context_id, highlight } = params.0;
        let result = self
            .engine
            .query(context_id.as_deref(), &value, highlight.unwrap_or(false))
            .await
            .map_err(to_tool_error)?;

        let edges: Vec<EdgeDto> = result
            .hits
            .into_iter()
            .map(|hit| EdgeDto {
                score: hit.score,
                resource: ResourceDto::from(&hit.resource),
                highlights: hit
                    .highlights
                    .into_iter()
                    .map(|(key, values)| HighlightDto { key, values })
                    .collect(),
            })
            .collect();

        to_json_result(&json!({
            "maxScore": result.max_score,
            "edgesTotal": edges.len(),
            "edges": edges,
        }))
    }

    /// Crawl a source URI into the addressed context.
    #[tool(description = "Index a file:// or http(s):// source URI into a context")]
    pub async fn index_uri(&self, params: Parameters<IndexUriParams>) -> Result<CallToolResult, ErrorData> {
        let IndexUriParams { uri, context_id } = params.0;
        let source = self.engine.index_uri(context_id.as_deref(), &uri).await.map_err(to_tool_error)?;
        to_json_result(&json!({ "source": SourceDto::from(&source) }))
    }

    /// Fetch one context's metadata, defaulting to the default context.
    #[tool(description = "Get a context by id, or the default context if no id is given")]
    pub async fn get_context(&self, params: Parameters<GetContextParams>) -> Result<CallToolResult, ErrorData> {
        let model = self.engine.get_context(params.0.context_id.as_deref()).await.map_err(to_tool_error)?;
        to_json_result(&json!({
            "context": ContextDto { id: model.id, name: model.name, is_default: model.is_default },
        }))
    }

    /// List every loaded context.
    #[tool(description = "List all contexts")]
    pub async fn get_contexts(&self, _params: Parameters<GetContextsParams>) -> Result<CallToolResult, ErrorData> {
        let models = self.engine.get_contexts().await;
        let contexts: Vec<ContextDto> =
            models.into_iter().map(|m| ContextDto { id: m.id, name: m.name, is_default: m.is_default }).collect();
        to_json_result(&json!({ "contexts": contexts, "contextsTotal": contexts.len() }))
    }

    /// Paginated listing of a context's sources.
    #[tool(description = "List a context's sources (paginated)")]
    pub async fn get_sources(&self, params: Parameters<PageParams>) -> Result<CallToolResult, ErrorData> {
        let PageParams { context_id, limit, offset } = params.0;
        let (sources, total) = self
            .engine
            .get_sources(context_id.as_deref(), limit.unwrap_or(0), offset.unwrap_or(0))
            .await
            .map_err(to_tool_error)?;
        let sources: Vec<SourceDto> = sources.iter().map(SourceDto::from).collect();
        to_json_result(&json!({ "sources": sources, "total": total }))
    }

    /// Paginated listing of a context's resources.
    #[tool(description = "List a context's resources (paginated)")]
    pub async fn get_resources(&self, params: Parameters<PageParams>) -> Result<CallToolResult, ErrorData> {
        let PageParams { context_id, limit, offset } = params.0;
        let (resources, total) = self
            .engine
            .get_resources(context_id.as_deref(), limit.unwrap_or(0), offset.unwrap_or(0))
            .await
            .map_err(to_tool_error)?;
        let resources: Vec<ResourceDto> = resources.iter().map(ResourceDto::from).collect();
        to_json_result(&json!({ "resources": resources, "total": total }))
    }

    /// Create a new, never-default context.
    #[tool(description = "Create a new context")]
    pub async fn create_context(&self, params: Parameters<CreateContextParams>) -> Result<CallToolResult, ErrorData> {
        let model = self.engine.create_context(&params.0.name).await.map_err(to_tool_error)?;
        to_json_result(&json!({
            "context": ContextDto { id: model.id, name: model.name, is_default: model.is_default },
        }))
    }

    /// Export one or more contexts and their sources/resources to a YAML file.
    #[tool(description = "Export contexts to a YAML file on disk")]
    pub async fn export_contexts(&self, params: Parameters<ExportContextsParams>) -> Result<CallToolResult, ErrorData> {
        let ExportContextsParams { context_ids, output_path } = params.0;
        self.engine
            .export_contexts(&context_ids, &PathBuf::from(output_path))
            .await
            .map_err(to_tool_error)?;
        to_json_result(&json!({}))
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for RispServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "risp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Risp: a personal knowledge-indexing service. Use index_uri to crawl a file:// or \
                 http(s):// source into a context, query to full-text search it, get_context(s) and \
                 get_sources/get_resources to browse what's indexed, create_context to open a new \
                 namespace, and export_contexts to dump a context to YAML."
                    .to_string(),
            ),
        }
    }

    async fn initialize(
        &self,
        _request: rmcp::model::InitializeRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<rmcp::model::InitializeResult, ErrorData> {
        Ok(self.get_info())
    }
}
