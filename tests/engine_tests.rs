//! External tests for the Engine, covering the six literal scenarios
//! enumerated against the public crate API (rather than reaching into
//! `Context`/`SearchStore` internals, which the Engine intentionally
//! doesn't expose).

use risp::engine::Engine;
use risp::error::code;
use risp::model::{AdapterData, ResourceData};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn scenario_1_indexing_a_directory_yields_searchable_text_and_html_resources() {
    let root = tempdir().unwrap();
    std::fs::write(root.path().join("a.txt"), "hello world").unwrap();
    std::fs::write(
        root.path().join("b.html"),
        "<html><head><title>T</title></head><body><p>hi</p></body></html>",
    )
    .unwrap();

    let data_dir = tempdir().unwrap();
    let engine = Engine::start(data_dir.path().to_path_buf()).await.unwrap();

    let uri = format!("file://{}", root.path().display());
    engine.index_uri(None, &uri).await.unwrap();

    let (_, total) = engine.get_resources(None, 100, 0).await.unwrap();
    assert_eq!(total, 2);

    let hello = engine.query(None, "hello", false).await.unwrap();
    assert_eq!(hello.hits.len(), 1);
    assert!(hello.hits[0].score > 0.0);
    match &hello.hits[0].resource.data {
        ResourceData::FsFile(fields) => assert_eq!(fields.filename, "a.txt"),
        _ => panic!("expected fs-file"),
    }

    let hi = engine.query(None, "hi", false).await.unwrap();
    assert_eq!(hi.hits.len(), 1);
    match &hi.hits[0].resource.data {
        ResourceData::FsFile(fields) => assert_eq!(fields.filename, "b.html"),
        _ => panic!("expected fs-file"),
    }
}

#[tokio::test]
async fn scenario_2_indexing_a_web_page_extracts_its_title_and_strips_the_source_to_its_authority() {
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
    let engine = Engine::start(data_dir.path().to_path_buf()).await.unwrap();

    let uri = format!("{}/page?b=2&a=1", mock_server.uri());
    let source = engine.index_uri(None, &uri).await.unwrap();

    match &source.adapter_data {
        Some(AdapterData::Web { .. }) => {}
        _ => panic!("expected web adapter data"),
    }
    assert!(!source.canonical_uri.contains("/page"));

    let (resources, total) = engine.get_resources(None, 100, 0).await.unwrap();
    assert_eq!(total, 1);
    match &resources[0].data {
        ResourceData::WebPage(fields) => assert_eq!(fields.title, "Ex"),
        _ => panic!("expected web-page"),
    }
}

#[tokio::test]
async fn scenario_3_indexing_the_same_file_uri_twice_reuses_its_source_and_resource_ids() {
    let root = tempdir().unwrap();
    std::fs::write(root.path().join("a.txt"), "alpha").unwrap();

    let data_dir = tempdir().unwrap();
    let engine = Engine::start(data_dir.path().to_path_buf()).await.unwrap();

    let uri = format!("file://{}", root.path().display());
    let first = engine.index_uri(None, &uri).await.unwrap();
    let (first_resources, _) = engine.get_resources(None, 100, 0).await.unwrap();

    let second = engine.index_uri(None, &uri).await.unwrap();
    let (second_resources, total) = engine.get_resources(None, 100, 0).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(total, 1);
    assert_eq!(first_resources[0].id, second_resources[0].id);
}

#[tokio::test]
async fn scenario_4_querying_with_an_empty_value_is_rejected_with_code_3() {
    let data_dir = tempdir().unwrap();
    let engine = Engine::start(data_dir.path().to_path_buf()).await.unwrap();

    let err = engine.query(None, "", false).await.unwrap_err();
    assert_eq!(err.code(), code::INVALID_QUERY);
    assert_eq!(err.code(), 3);
}

#[tokio::test]
async fn scenario_5_execute_rejects_a_missing_uri_and_an_unknown_verb() {
    let data_dir = tempdir().unwrap();
    let engine = Engine::start(data_dir.path().to_path_buf()).await.unwrap();

    let missing_uri = engine.execute("source ").await.unwrap_err();
    assert_eq!(missing_uri.code(), code::INVALID_SOURCE_URI);
    assert_eq!(missing_uri.code(), 4);

    let unknown_verb = engine.execute("bogus x").await.unwrap_err();
    assert_eq!(unknown_verb.code(), code::INVALID_COMMAND);
    assert_eq!(unknown_verb.code(), 2);
}

#[tokio::test]
async fn scenario_6_exporting_the_default_context_produces_a_sorted_v0_document() {
    let root = tempdir().unwrap();
    std::fs::write(root.path().join("z.txt"), "z").unwrap();
    std::fs::write(root.path().join("a.txt"), "a").unwrap();

    let data_dir = tempdir().unwrap();
    let engine = Engine::start(data_dir.path().to_path_buf()).await.unwrap();

    let uri = format!("file://{}", root.path().display());
    engine.index_uri(None, &uri).await.unwrap();

    let default_id = engine.get_context(None).await.unwrap().id;
    let out_path = data_dir.path().join("out.yaml");
    engine.export_contexts(&[default_id], &out_path).await.unwrap();

    let content = tokio::fs::read_to_string(&out_path).await.unwrap();
    let decoded = risp::export::decode_data_yaml(&content).unwrap();
    assert_eq!(decoded.contexts.len(), 1);
    let resources = &decoded.contexts[0].sources[0].resources;
    let mut sorted = resources.clone();
    sorted.sort();
    assert_eq!(resources, &sorted);
    assert!(content.starts_with("formatVersion: v0"));
}
