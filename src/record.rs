//! Record / IndexSchema (§4.4): the flat document shape written to the
//! SearchStore, tagged with a `_type` discriminator distinguishing Source
//! records from Resource records within the single logical collection.

use serde_json::{Map, Value};

pub const TYPE_FIELD: &str = "_type";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    Source,
    Resource,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Source => "source",
            RecordType::Resource => "resource",
        }
    }
}

/// A record destined for the SearchStore: a flat map of field name to
/// value, always carrying `_type`.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    fn with_type(record_type: RecordType) -> Self {
        let mut fields = Map::new();
        fields.insert(TYPE_FIELD.to_string(), Value::String(record_type.as_str().to_string()));
        Self { fields }
    }

    pub fn new_source() -> Self {
        Self::with_type(RecordType::Source)
    }

    pub fn new_resource() -> Self {
        Self::with_type(RecordType::Resource)
    }

    /// Merge all top-level entries of `doc` into this record.
    pub fn set_all(&mut self, doc: Value) -> &mut Self {
        if let Value::Object(map) = doc {
            for (key, value) in map {
                self.fields.insert(key, value);
            }
        }
        self
    }

    pub fn set_field(&mut self, key: &str, value: Value) -> &mut Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn record_type(&self) -> Option<&str> {
        self.get(TYPE_FIELD).and_then(Value::as_str)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn source_records_carry_type_field() {
        let mut record = Record::new_source();
        record.set_all(json!({"contextId": "ctx1"}));
        assert_eq!(record.record_type(), Some("source"));
        assert_eq!(record.get("contextId").unwrap(), "ctx1");
    }
}
