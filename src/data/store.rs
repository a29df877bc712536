//! In-memory document index.
//!
//! Documents are keyed by source path and kept in discovery order. The index
//! is cleared and refilled at the start of every full posts build.

use super::document::Document;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct DocumentIndex {
    /// Discovery order
    documents: Vec<Document>,
    positions: FxHashMap<PathBuf, usize>,
}

impl DocumentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every document.
    pub fn clear(&mut self) {
        self.documents.clear();
        self.positions.clear();
    }

    /// The document for `path`, inserting an unparsed one on first reference.
    pub fn get_or_create(&mut self, path: &Path) -> &mut Document {
        let index = match self.positions.get(path) {
            Some(&index) => index,
            None => {
                self.documents.push(Document::new(path));
                let index = self.documents.len() - 1;
                self.positions.insert(path.to_path_buf(), index);
                index
            }
        };
        &mut self.documents[index]
    }

    pub fn get(&self, path: &Path) -> Option<&Document> {
        self.positions.get(path).map(|&index| &self.documents[index])
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents sorted ascending by publication date, at most `limit` of
    /// them (`0` means all). Undated documents sort first; ties keep
    /// discovery order.
    pub fn all(&self, limit: usize) -> Vec<&Document> {
        let mut sorted: Vec<&Document> = self.documents.iter().collect();
        // stable: equal dates keep discovery order
        sorted.sort_by_key(|doc| doc.published);
        if limit > 0 {
            sorted.truncate(limit);
        }
        sorted
    }

    /// Sorted listing as template values.
    pub fn to_json(&self) -> Vec<serde_json::Value> {
        self.all(0).into_iter().map(Document::to_json).collect()
    }
}
