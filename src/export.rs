//! YAML export (§6): serializes a set of Contexts, and every Source and
//! Resource beneath them, to the `formatVersion: v0` / `data:` document
//! shape. Walks sources/resources in batches of 100 to bound memory (§5).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::error::{RispError, Result};

const FORMAT_VERSION: &str = "v0";
const EXPORT_BATCH_SIZE: i64 = 100;

#[derive(Debug, Serialize, Deserialize)]
pub struct RispYaml {
    #[serde(rename = "formatVersion")]
    pub format_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DataYaml>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DataYaml {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contexts: Vec<ContextYaml>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContextYaml {
    pub name: String,
    #[serde(rename = "isDefault", default)]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceYaml>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SourceYaml {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,
}

/// Serialize every context in `context_ids` (missing ids are skipped, not an
/// error — mirroring a best-effort export over whatever is still present)
/// to a single YAML document at `output_path`.
pub async fn export_contexts(engine: &Engine, context_ids: &[String], output_path: &Path) -> Result<()> {
    let mut data = DataYaml::default();

    for context_id in context_ids {
        let Some(model) = engine.context_model(context_id).await else {
            continue;
        };

        let mut context_yaml = ContextYaml { name: model.name, is_default: model.is_default, sources: Vec::new() };

        let mut offset = 0;
        loop {
            let (sources, _) = engine.context_sources_page(context_id, EXPORT_BATCH_SIZE, offset).await?;
            if sources.is_empty() {
                break;
            }

            for source in &sources {
                let source_id = source.id.clone().unwrap_or_default();
                let mut resource_uris = Vec::new();
                let mut resource_offset = 0;
                loop {
                    let (resources, _) = engine
                        .context_resources_of_source_page(context_id, &source_id, EXPORT_BATCH_SIZE, resource_offset)
                        .await?;
                    if resources.is_empty() {
                        break;
                    }
                    resource_uris.extend(resources.iter().map(|r| r.canonical_uri.clone()));
                    resource_offset += EXPORT_BATCH_SIZE;
                }
                resource_uris.sort_by(|a, b| segments(a).cmp(&segments(b)));

                context_yaml.sources.push(SourceYaml { uri: source.canonical_uri.clone(), resources: resource_uris });
            }

            offset += EXPORT_BATCH_SIZE;
        }

        data.contexts.push(context_yaml);
    }

    let document = RispYaml { format_version: FORMAT_VERSION.to_string(), data: Some(data) };
    let encoded = serde_yaml::to_string(&document)?;
    tokio::fs::write(output_path, encoded).await?;
    Ok(())
}

/// Lexicographic comparison of `/`-separated segments (§13 decision #1),
/// replacing the original's non-transitive single-index comparator.
fn segments(uri: &str) -> Vec<&str> {
    uri.split('/').collect()
}

/// Decode a previously exported document's `data:` section. The original
/// implementation checked the wrong optional field here (`config == nil`
/// instead of `data == nil`) and would return `data` unconditionally; this
/// checks the field it actually reads.
pub fn decode_data_yaml(content: &str) -> Result<DataYaml> {
    let document: RispYaml = serde_yaml::from_str(content)?;
    document.data.ok_or_else(|| RispError::Unknown("export document has no data section".into()))
}
