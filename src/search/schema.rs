//! SearchStore document schema (§4.4): one flat tantivy `Schema` shared by
//! Source and Resource records within a Context's index, discriminated by
//! `_type`. Keyword-like fields (exact match, faceting, filters) use the
//! `raw` tokenizer; full-text fields use either the default tokenizer or
//! the `risp-html` analyzer for markup-bearing fields that still need to
//! support highlighting.

use tantivy::schema::{
    Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING,
};

use super::analyzer::RISP_HTML_TOKENIZER;

/// Internal identifier field tantivy itself has no notion of: the
/// DocStore-assigned id, used to delete-then-replace on re-index (§4.6).
pub const ID_FIELD: &str = "id";

fn text_field(tokenizer: &str) -> TextOptions {
    TextOptions::default().set_stored().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer(tokenizer)
            .set_index_option(IndexRecordOption::WithFreqsAndPositions),
    )
}

/// Stored-only, unindexed text (identity values no query ever targets
/// directly, e.g. `urn`).
fn stored_only() -> TextOptions {
    TextOptions::default().set_stored()
}

/// Field handles for the shared Source+Resource schema (§4.4).
pub struct RecordSchema {
    pub schema: Schema,

    pub id: Field,
    pub record_type: Field,

    // Shared / Source fields.
    pub context_id: Field,
    pub adapter_type: Field,
    pub canonical_uri: Field,
    pub urn: Field,
    pub adapter_path: Field,
    pub adapter_is_dir: Field,
    pub adapter_is_dot: Field,
    pub adapter_scheme: Field,
    pub adapter_host: Field,
    pub adapter_user: Field,

    // Resource fields.
    pub source_id: Field,
    pub resource_type: Field,
    pub fs_path: Field,
    pub fs_filename: Field,
    pub fs_filetype: Field,
    pub fs_is_dot: Field,
    pub fs_contents_keywords: Field,
    pub fs_contents_text: Field,
    pub fs_contents_html: Field,
    pub web_path: Field,
    pub web_query: Field,
    pub web_title: Field,
    pub web_body: Field,
}

impl RecordSchema {
    pub fn build() -> Self {
        let mut b = Schema::builder();

        let id = b.add_text_field(ID_FIELD, STRING | STORED);
        let record_type = b.add_text_field("_type", STRING | STORED);

        let context_id = b.add_text_field("contextId", STRING | STORED);
        let adapter_type = b.add_text_field("adapterType", STRING | STORED);
        let canonical_uri = b.add_text_field("canonicalUri", STRING | STORED);
        let urn = b.add_text_field("urn", stored_only());
        let adapter_path = b.add_text_field("adapterData.path", STRING | STORED);
        let adapter_is_dir = b.add_bool_field("adapterData.isDir", STORED);
        let adapter_is_dot = b.add_bool_field("adapterData.isDot", STORED);
        let adapter_scheme = b.add_text_field("adapterData.scheme", STRING | STORED);
        let adapter_host = b.add_text_field("adapterData.host", STRING | STORED);
        let adapter_user = b.add_text_field("adapterData.user", stored_only());

        let source_id = b.add_text_field("sourceId", STRING | STORED);
        let resource_type = b.add_text_field("type", STRING | STORED);
        let fs_path = b.add_text_field("fs-file.path", STRING | STORED);
        let fs_filename = b.add_text_field("fs-file.filename", STRING | STORED);
        let fs_filetype = b.add_text_field("fs-file.filetype", STRING | STORED);
        let fs_is_dot = b.add_bool_field("fs-file.isDot", STORED);
        let fs_contents_keywords = b.add_text_field("fs-file.contents_keywords", STRING | STORED);
        let fs_contents_text = b.add_text_field("fs-file.contents_text", text_field("default"));
        let fs_contents_html = b.add_text_field("fs-file.contents_html", text_field(RISP_HTML_TOKENIZER));
        let web_path = b.add_text_field("web-page.path", STRING | STORED);
        let web_query = b.add_text_field("web-page.query", STRING | STORED);
        let web_title = b.add_text_field("web-page.title", text_field("default"));
        let web_body = b.add_text_field("web-page.body", text_field(RISP_HTML_TOKENIZER));

        let schema = b.build();

        Self {
            schema,
            id,
            record_type,
            context_id,
            adapter_type,
            canonical_uri,
            urn,
            adapter_path,
            adapter_is_dir,
            adapter_is_dot,
            adapter_scheme,
            adapter_host,
            adapter_user,
            source_id,
            resource_type,
            fs_path,
            fs_filename,
            fs_filetype,
            fs_is_dot,
            fs_contents_keywords,
            fs_contents_text,
            fs_contents_html,
            web_path,
            web_query,
            web_title,
            web_body,
        }
    }

    /// Fields eligible for highlighting (§4.6: four content fields).
    pub fn highlight_fields(&self) -> [(&'static str, Field); 4] {
        [
            ("fs-file.contents_text", self.fs_contents_text),
            ("fs-file.contents_html", self.fs_contents_html),
            ("web-page.title", self.web_title),
            ("web-page.body", self.web_body),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_without_panicking_and_exposes_named_fields() {
        let rs = RecordSchema::build();
        assert_eq!(rs.schema.get_field_name(rs.id), ID_FIELD);
        assert_eq!(rs.schema.get_field_name(rs.record_type), "_type");
        assert_eq!(rs.highlight_fields().len(), 4);
    }
}
