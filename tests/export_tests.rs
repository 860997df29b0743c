//! External tests for YAML export/decode, exercising it through the
//! Engine (as the RPC facade does) rather than `export::export_contexts`
//! directly.

use risp::engine::Engine;
use risp::export::decode_data_yaml;
use tempfile::tempdir;

#[tokio::test]
async fn exporting_an_unknown_context_id_is_skipped_not_an_error() {
    let data_dir = tempdir().unwrap();
    let engine = Engine::start(data_dir.path().to_path_buf()).await.unwrap();

    let out_path = data_dir.path().join("out.yaml");
    engine.export_contexts(&["does-not-exist".to_string()], &out_path).await.unwrap();

    let content = tokio::fs::read_to_string(&out_path).await.unwrap();
    let decoded = decode_data_yaml(&content).unwrap();
    assert!(decoded.contexts.is_empty());
}

#[tokio::test]
async fn exporting_multiple_contexts_preserves_their_isdefault_flags() {
    let data_dir = tempdir().unwrap();
    let engine = Engine::start(data_dir.path().to_path_buf()).await.unwrap();

    let default_id = engine.get_context(None).await.unwrap().id;
    let work = engine.create_context("work").await.unwrap();

    let out_path = data_dir.path().join("out.yaml");
    engine.export_contexts(&[default_id, work.id.clone()], &out_path).await.unwrap();

    let content = tokio::fs::read_to_string(&out_path).await.unwrap();
    let decoded = decode_data_yaml(&content).unwrap();
    assert_eq!(decoded.contexts.len(), 2);

    let default_entry = decoded.contexts.iter().find(|c| c.name == "_default").unwrap();
    assert!(default_entry.is_default);
    let work_entry = decoded.contexts.iter().find(|c| c.name == "work").unwrap();
    assert!(!work_entry.is_default);
}

#[tokio::test]
async fn a_source_with_many_resources_round_trips_across_export_batches() {
    let root = tempdir().unwrap();
    for i in 0..5 {
        std::fs::write(root.path().join(format!("f{i}.txt")), format!("content {i}")).unwrap();
    }

    let data_dir = tempdir().unwrap();
    let engine = Engine::start(data_dir.path().to_path_buf()).await.unwrap();
    let uri = format!("file://{}", root.path().display());
    engine.index_uri(None, &uri).await.unwrap();

    let default_id = engine.get_context(None).await.unwrap().id;
    let out_path = data_dir.path().join("out.yaml");
    engine.export_contexts(&[default_id], &out_path).await.unwrap();

    let content = tokio::fs::read_to_string(&out_path).await.unwrap();
    let decoded = decode_data_yaml(&content).unwrap();
    assert_eq!(decoded.contexts[0].sources[0].resources.len(), 5);
}

#[test]
fn decoding_garbage_yaml_errors_instead_of_panicking() {
    assert!(decode_data_yaml("not: [valid, risp, document").is_err());
}
