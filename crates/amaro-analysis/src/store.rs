// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Versioned store of analysis results.
//!
//! Analyses run outside any lock and may finish out of order. A result is
//! only committed if its version is at least the version already stored,
//! so a slow pass over an old snapshot can never replace a newer one.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::trace;

use crate::Analysis;

/// One committed snapshot of a document.
#[derive(Debug)]
pub struct Document {
    pub version: i32,
    pub text: String,
    pub analysis: Analysis,
}

#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: RwLock<HashMap<String, Arc<Document>>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `analysis` of `text` at `version` unless a newer version is
    /// already stored. Returns whether the result was kept.
    pub fn commit(&self, uri: &str, version: i32, text: String, analysis: Analysis) -> bool {
        let mut documents = self.documents.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(current) = documents.get(uri) {
            if current.version > version {
                trace!(uri, version, current = current.version, "discarding stale analysis");
                return false;
            }
        }

        trace!(uri, version, diagnostics = analysis.diagnostics.len(), "committing analysis");
        documents.insert(uri.to_string(), Arc::new(Document { version, text, analysis }));
        true
    }

    /// Latest committed snapshot.
    pub fn get(&self, uri: &str) -> Option<Arc<Document>> {
        let documents = self.documents.read().unwrap_or_else(PoisonError::into_inner);
        documents.get(uri).cloned()
    }

    pub fn version(&self, uri: &str) -> Option<i32> {
        self.get(uri).map(|doc| doc.version)
    }

    pub fn remove(&self, uri: &str) -> Option<Arc<Document>> {
        let mut documents = self.documents.write().unwrap_or_else(PoisonError::into_inner);
        let removed = documents.remove(uri);
        trace!(uri, removed = removed.is_some(), "closing document");
        removed
    }

    pub fn len(&self) -> usize {
        self.documents.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
