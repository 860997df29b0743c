//! Adapters (§4.7, §4.8): turn a source URI into a Source plus the
//! Resources crawled from it, writing both into the DocStore and the
//! SearchStore. One module per `AdapterType`; dispatch lives in
//! `Context::source_uri` (§4.2), matching the Go original's scheme-prefix
//! switch in `Context.SourceURI`.

pub mod fs;
pub mod web;
