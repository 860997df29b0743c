//! Web adapter (§4.8): fetches a single `http(s)` URI, sanitizes an HTML
//! response into a web-page Resource. Unlike the fs adapter there is no
//! recursive crawl — each indexed URI is its own Resource under a Source
//! keyed by scheme+host+credentials.

use reqwest::{header, Client};
use url::Url;

use crate::docstore::{Criterion, DocStore, COL_RESOURCES, COL_SOURCES};
use crate::error::{RispError, Result};
use crate::model::{AdapterData, AdapterType, Resource, ResourceData, Source};
use crate::sanitize::ParsedHtml;
use crate::search::SearchStore;

pub async fn index_uri(context_id: &str, uri: &str, docs: &DocStore, index: &SearchStore, http: &Client) -> Result<Source> {
    let parsed = Url::parse(uri).map_err(|e| RispError::InvalidSourceUri(e.to_string()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(RispError::InvalidSourceUri(format!(
            "invalid URI scheme '{}', expected 'http(s)'",
            parsed.scheme()
        )));
    }

    let mut canonical = parsed.clone();
    canonical.set_path("");
    canonical.set_query(None);
    canonical.set_fragment(None);
    let canonical_uri = canonical.to_string();

    let mut source = Source::new(context_id, canonical_uri, AdapterType::Web);
    let urn = source.marshal_urn();

    let existing = docs.query(COL_SOURCES).where_(Criterion::field("urn").eq(urn)).find_all()?;
    if let Some(doc) = existing.into_iter().next() {
        source = Source::from_doc(doc.id, &doc.value)?;
        crawl_uri(&source, &parsed, docs, index, http).await?;
        return Ok(source);
    }

    let user = parsed.username();
    let user_field = match parsed.password() {
        Some(password) => format!("{user}:{password}"),
        None => user.to_string(),
    };
    source.adapter_data = Some(AdapterData::Web {
        scheme: parsed.scheme().to_string(),
        host: host_with_port(&parsed),
        user: user_field,
    });

    let id = docs.insert_one(COL_SOURCES, source.to_doc())?;
    source.id = Some(id.clone());
    index.index(&id, source.to_record())?;

    crawl_uri(&source, &parsed, docs, index, http).await?;
    Ok(source)
}

async fn crawl_uri(source: &Source, resource_uri: &Url, docs: &DocStore, index: &SearchStore, http: &Client) -> Result<()> {
    let target = prepend_source_uri(source, resource_uri)?;
    let response = http.get(target.clone()).send().await?;
    eprintln!("DEBUG target={} status={}", target, response.status());

    if !response.status().is_success() {
        return Err(RispError::InvalidSource(format!("failed with code {}; GET {target}", response.status())));
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    eprintln!("DEBUG content_type={:?}", content_type);
    if content_type.starts_with("text/html") || content_type.starts_with("html") {
        let body = response.text().await?;
        eprintln!("DEBUG body={:?}", body);
        let r = process_html(source, resource_uri, &body, docs, index);
        eprintln!("DEBUG process_html={:?}", r.is_ok());
        r?;
    }

    Ok(())
}

/// `host_str()` drops the port the way Go's `net/url.URL.Host` never does;
/// carry it explicitly so a non-default-port source survives a round trip.
fn host_with_port(uri: &Url) -> String {
    match (uri.host_str(), uri.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}

/// Rebuild the fetch target from the Source's stored authority, matching
/// the Go original's "source's scheme/host/credentials win, request path
/// and query survive" merge.
fn prepend_source_uri(source: &Source, resource_uri: &Url) -> Result<Url> {
    let (scheme, host, user) = match &source.adapter_data {
        Some(AdapterData::Web { scheme, host, user }) => (scheme.clone(), host.clone(), user.clone()),
        _ => return Err(RispError::InvalidSource("web source missing adapter data".into())),
    };

    let (host_only, port) = match host.rsplit_once(':') {
        Some((h, p)) if p.chars().all(|c| c.is_ascii_digit()) && !p.is_empty() => (h, p.parse::<u16>().ok()),
        _ => (host.as_str(), None),
    };

    let mut target = resource_uri.clone();
    target.set_scheme(&scheme).map_err(|_| RispError::InvalidSource(format!("invalid scheme '{scheme}'")))?;
    target.set_host(Some(host_only))?;
    target.set_port(port).map_err(|_| RispError::InvalidSource(format!("invalid port in host '{host}'")))?;

    if user.is_empty() {
        let _ = target.set_username("");
        let _ = target.set_password(None);
    } else if let Some((name, pass)) = user.split_once(':') {
        let _ = target.set_username(name);
        let _ = target.set_password(Some(pass));
    } else {
        let _ = target.set_username(&user);
    }

    Ok(target)
}

fn process_html(source: &Source, resource_uri: &Url, body: &str, docs: &DocStore, index: &SearchStore) -> Result<()> {
    let mut resource = Resource::new_web_page(source, resource_uri.path(), resource_uri.query().unwrap_or(""));
    let urn = resource.marshal_urn();

    let existing = docs.query(COL_RESOURCES).where_(Criterion::field("urn").eq(urn)).find_all()?;
    let id = if let Some(doc) = existing.into_iter().next() {
        resource = Resource::from_doc(doc.id.clone(), &doc.value)?;
        doc.id
    } else {
        docs.insert_one(COL_RESOURCES, resource.to_doc())?
    };
    resource.id = Some(id.clone());

    let parsed_html = ParsedHtml::parse(body);
    if let ResourceData::WebPage(fields) = &mut resource.data {
        if let Some(title) = parsed_html.first_title_text() {
            fields.title = title;
        }
        fields.body = parsed_html.sanitize();
    }

    index.index(&id, resource.to_record())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docstore::DocStore;
    use crate::model::ResourceData;
    use crate::search::SearchStore;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn indexes_a_single_html_page_and_extracts_its_title() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html><head><title>Ex</title></head><body>x</body></html>"),
            )
            .mount(&mock_server)
            .await;

        let data_dir = tempdir().unwrap();
        let docs = DocStore::open(data_dir.path()).unwrap();
        let index = SearchStore::open_or_create(data_dir.path(), "ctx1").unwrap();
        let http = Client::new();

        let uri = format!("{}/page", mock_server.uri());
        let source = index_uri("ctx1", &uri, &docs, &index, &http).await.unwrap();
        assert!(source.id.is_some());

        let resources = docs.query(COL_RESOURCES).find_all().unwrap();
        assert_eq!(resources.len(), 1);
        let resource = Resource::from_doc(resources[0].id.clone(), &resources[0].value).unwrap();
        match &resource.data {
            ResourceData::WebPage(fields) => assert_eq!(fields.path, "/page"),
            _ => panic!("expected web-page"),
        }
    }

    #[tokio::test]
    async fn non_html_responses_are_skipped_without_erroring() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data.json"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "application/json").set_body_string("{}"))
            .mount(&mock_server)
            .await;

        let data_dir = tempdir().unwrap();
        let docs = DocStore::open(data_dir.path()).unwrap();
        let index = SearchStore::open_or_create(data_dir.path(), "ctx1").unwrap();
        let http = Client::new();

        let uri = format!("{}/data.json", mock_server.uri());
        index_uri("ctx1", &uri, &docs, &index, &http).await.unwrap();

        assert!(docs.query(COL_RESOURCES).find_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reindexing_the_same_page_reuses_its_resource_id() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html><head><title>T</title></head><body>x</body></html>"),
            )
            .mount(&mock_server)
            .await;

        let data_dir = tempdir().unwrap();
        let docs = DocStore::open(data_dir.path()).unwrap();
        let index = SearchStore::open_or_create(data_dir.path(), "ctx1").unwrap();
        let http = Client::new();

        let uri = format!("{}/page", mock_server.uri());
        index_uri("ctx1", &uri, &docs, &index, &http).await.unwrap();
        index_uri("ctx1", &uri, &docs, &index, &http).await.unwrap();

        assert_eq!(docs.query(COL_RESOURCES).find_all().unwrap().len(), 1);
        assert_eq!(docs.query(COL_SOURCES).find_all().unwrap().len(), 1);
    }
}
