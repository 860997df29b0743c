//! Filesystem adapter (§4.7): recursively crawls a `file:` URI, treating a
//! directory source as the root of a tree of fs-file Resources and a
//! file source as a single Resource.

use std::fs;
use std::path::{Path, PathBuf};

use url::Url;

use crate::docstore::{Criterion, DocStore, COL_RESOURCES, COL_SOURCES};
use crate::error::{RispError, Result};
use crate::model::{AdapterData, AdapterType, Resource, ResourceData, Source};
use crate::sanitize;
use crate::search::SearchStore;

/// Adapt `uri` into a Source (reusing one already indexed under the same
/// URN) and crawl it, indexing every discovered fs-file Resource.
pub fn index_uri(context_id: &str, uri: &str, docs: &DocStore, index: &SearchStore) -> Result<Source> {
    let parsed = Url::parse(uri).map_err(|e| RispError::InvalidSourceUri(e.to_string()))?;

    let mut canonical = parsed.clone();
    canonical.set_query(None);
    canonical.set_fragment(None);
    let canonical_uri = canonical.to_string();

    let mut source = Source::new(context_id, canonical_uri, AdapterType::Fs);
    let urn = source.marshal_urn();

    let existing = docs.query(COL_SOURCES).where_(Criterion::field("urn").eq(urn)).find_all()?;
    if let Some(doc) = existing.into_iter().next() {
        source = Source::from_doc(doc.id, &doc.value)?;
        crawl_path(&source, ".", docs, index)?;
        return Ok(source);
    }

    let path = parsed.path().to_string();
    let metadata = fs::metadata(&path)?;
    let filename = Path::new(&path).file_name().and_then(|s| s.to_str()).unwrap_or("");
    source.adapter_data = Some(AdapterData::Fs {
        path: path.clone(),
        is_dir: metadata.is_dir(),
        is_dot: filename.starts_with('.'),
    });

    let id = docs.insert_one(COL_SOURCES, source.to_doc())?;
    source.id = Some(id.clone());
    index.index(&id, source.to_record())?;

    crawl_path(&source, ".", docs, index)?;
    Ok(source)
}

fn crawl_path(source: &Source, relative_path: &str, docs: &DocStore, index: &SearchStore) -> Result<()> {
    let (base_path, is_dir) = match &source.adapter_data {
        Some(AdapterData::Fs { path, is_dir, .. }) => (path.clone(), *is_dir),
        _ => return Err(RispError::InvalidSource("fs source missing adapter data".into())),
    };

    let absolute_path = if relative_path == "." {
        PathBuf::from(&base_path)
    } else if is_dir {
        Path::new(&base_path).join(relative_path)
    } else {
        return Err(RispError::InvalidSource(format!(
            "cannot crawl subPath '{relative_path}' of file source '{}'",
            source.canonical_uri
        )));
    };

    let metadata = fs::metadata(&absolute_path)?;

    if metadata.is_dir() {
        let mut entries: Vec<_> = fs::read_dir(&absolute_path)?.collect::<std::io::Result<Vec<_>>>()?;
        entries.sort_by_key(|entry| entry.file_name());
        for entry in entries {
            let name = entry.file_name().to_string_lossy().into_owned();
            let child = if relative_path == "." { name } else { format!("{relative_path}/{name}") };
            crawl_path(source, &child, docs, index)?;
        }
        return Ok(());
    }

    index_file(source, relative_path, &absolute_path, docs, index)
}

fn index_file(source: &Source, relative_path: &str, absolute_path: &Path, docs: &DocStore, index: &SearchStore) -> Result<()> {
    let mut resource = Resource::new_fs_file(source, relative_path);
    let urn = resource.marshal_urn();

    let existing = docs.query(COL_RESOURCES).where_(Criterion::field("urn").eq(urn)).find_all()?;
    let id = if let Some(doc) = existing.into_iter().next() {
        resource = Resource::from_doc(doc.id.clone(), &doc.value)?;
        doc.id
    } else {
        docs.insert_one(COL_RESOURCES, resource.to_doc())?
    };
    resource.id = Some(id.clone());

    let data = fs::read(absolute_path)?;
    parse_contents(&mut resource, &data);

    index.index(&id, resource.to_record())
}

/// Dispatch on file extension (§4.7 edge case: unrecognized types are
/// still indexed by metadata alone, with empty content fields).
fn parse_contents(resource: &mut Resource, data: &[u8]) {
    let ResourceData::FsFile(fields) = &mut resource.data else { return };
    match fields.filetype.as_str() {
        "txt" => fields.contents_text = String::from_utf8_lossy(data).into_owned(),
        "html" => fields.contents_html = sanitize::sanitize_html(&String::from_utf8_lossy(data)),
        _ => {}
    }
}
