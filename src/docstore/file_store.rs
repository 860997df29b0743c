//! On-disk DocStore backend: one JSON file per collection under
//! `<data_dir>/__master/`, loaded into memory at startup and rewritten on
//! every mutation. Mirrors the immediate-write-to-disk discipline of the
//! teacher's cache module, minus compression and checksumming, which
//! DocStore documents have no need for.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::Value;

use super::Document;
use crate::error::Result;

pub struct FileStore {
    dir: PathBuf,
    collections: RwLock<HashMap<String, HashMap<String, Value>>>,
}

impl FileStore {
    pub fn open(data_dir: &Path) -> Result<Self> {
        let dir = data_dir.join("__master");
        fs::create_dir_all(&dir)?;

        let mut loaded = HashMap::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default().to_string();
            let contents = fs::read_to_string(&path)?;
            let docs: HashMap<String, Value> = serde_json::from_str(&contents)?;
            loaded.insert(name, docs);
        }

        Ok(Self { dir, collections: RwLock::new(loaded) })
    }

    pub fn has_collection(&self, name: &str) -> Result<bool> {
        Ok(self.collections.read().expect("docstore lock poisoned").contains_key(name))
    }

    pub fn create_collection(&self, name: &str) -> Result<()> {
        self.collections.write().expect("docstore lock poisoned").entry(name.to_string()).or_default();
        self.persist(name)
    }

    pub fn insert(&self, collection: &str, id: &str, value: Value) -> Result<()> {
        {
            let mut guard = self.collections.write().expect("docstore lock poisoned");
            guard.entry(collection.to_string()).or_default().insert(id.to_string(), value);
        }
        self.persist(collection)
    }

    pub fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let guard = self.collections.read().expect("docstore lock poisoned");
        Ok(guard
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|value| Document { id: id.to_string(), value: value.clone() }))
    }

    pub fn all(&self, collection: &str) -> Result<Vec<Document>> {
        let guard = self.collections.read().expect("docstore lock poisoned");
        Ok(guard
            .get(collection)
            .map(|docs| docs.iter().map(|(id, value)| Document { id: id.clone(), value: value.clone() }).collect())
            .unwrap_or_default())
    }

    fn persist(&self, collection: &str) -> Result<()> {
        let guard = self.collections.read().expect("docstore lock poisoned");
        if let Some(docs) = guard.get(collection) {
            let path = self.dir.join(format!("{collection}.json"));
            fs::write(path, serde_json::to_vec_pretty(docs)?)?;
        }
        Ok(())
    }
}
