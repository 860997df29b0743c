//! URN codec (§4.3): deterministic string identities for Sources and
//! Resources, used as the DocStore's de-duplication key.
//!
//! Source scheme:   `contexts/{contextId}/sources/{adapterType}/{pathEscape(canonicalUri)}`
//! Resource scheme: `{source URN}/resources/{type}/{pathEscape(canonicalUri)}`

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::{RispError, Result};

/// Matches the unreserved set from RFC 3986 (`-_.~` plus alphanumerics are
/// left unescaped); everything else, including `/`, is percent-encoded —
/// mirroring Go's `url.PathEscape`.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn path_escape(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

fn path_unescape(value: &str) -> Result<String> {
    percent_decode_str(value)
        .decode_utf8()
        .map(|cow| cow.into_owned())
        .map_err(|e| {
            RispError::Unknown(format!(
                "malformatted URN component: expected path-escaped value, got '{value}' ({e})"
            ))
        })
}

/// Build the URN for a Source.
pub fn marshal_source_urn(context_id: &str, adapter_type: &str, canonical_uri: &str) -> String {
    format!(
        "contexts/{}/sources/{}/{}",
        context_id,
        adapter_type,
        path_escape(canonical_uri)
    )
}

/// Parse a Source URN into `(contextId, adapterType, canonicalUri)`.
pub fn unmarshal_source_urn(urn: &str) -> Result<(String, String, String)> {
    let parts: Vec<&str> = urn.split('/').collect();

    if parts.len() < 5 || parts[0] != "contexts" || parts[2] != "sources" {
        return Err(RispError::Unknown(format!(
            "invalid source URN scheme: '{urn}' (expected 'contexts/<ID>/sources/<TYPE>/<path_escaped(URI)>')"
        )));
    }

    let context_id = parts[1].to_string();
    let adapter_type = parts[3].to_string();
    let canonical_uri = path_unescape(parts[4])?;

    Ok((context_id, adapter_type, canonical_uri))
}

/// Build the URN for a Resource, given its owning Source's URN.
pub fn marshal_resource_urn(source_urn: &str, resource_type: &str, canonical_uri: &str) -> String {
    format!(
        "{}/resources/{}/{}",
        source_urn,
        resource_type,
        path_escape(canonical_uri)
    )
}

/// Parse a Resource URN into `(contextId, sourceAdapterType,
/// sourceCanonicalUri, resourceType, canonicalUri)`.
pub fn unmarshal_resource_urn(urn: &str) -> Result<(String, String, String, String, String)> {
    let (context_id, source_adapter_type, source_canonical_uri) = unmarshal_source_urn(urn)?;

    let parts: Vec<&str> = urn.split('/').collect();
    if parts.len() < 8 || parts[5] != "resources" {
        return Err(RispError::Unknown(format!(
            "invalid resource URN scheme: '{urn}' (expected '<SOURCE_URN>/resources/<TYPE>/<path_escaped(URI)>')"
        )));
    }

    let resource_type = parts[6].to_string();
    let canonical_uri = path_unescape(parts[7])?;

    Ok((
        context_id,
        source_adapter_type,
        source_canonical_uri,
        resource_type,
        canonical_uri,
    ))
}
