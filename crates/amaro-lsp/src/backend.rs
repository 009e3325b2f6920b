// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Core backend struct and analysis pipeline.

use amaro_analysis::{analyze, DocumentStore};
use amaro_ast::LineMap;
use tokio::sync::Mutex;
use tower_lsp::lsp_types::{Diagnostic, Url};
use tower_lsp::Client;
use tracing::{debug, error};

use crate::convert::to_lsp_diagnostic;

#[derive(Debug)]
pub struct Backend {
    pub client: Client,
    /// Latest analysis per open document.
    pub documents: DocumentStore,
    /// Serializes commit-then-publish so notifications leave in version order.
    publish: Mutex<()>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self { client, documents: DocumentStore::new(), publish: Mutex::new(()) }
    }

    /// Analyze `text` off the async runtime, keep the result if it is the
    /// freshest version seen, and publish its diagnostics.
    pub async fn update(&self, uri: Url, version: i32, text: String) {
        let task = tokio::task::spawn_blocking(move || {
            let analysis = analyze(&text);
            (text, analysis)
        });
        let (text, analysis) = match task.await {
            Ok(done) => done,
            Err(e) => {
                error!(%uri, version, error = %e, "analysis task failed");
                return;
            }
        };

        let lines = LineMap::new(&text);
        let diagnostics: Vec<Diagnostic> = analysis
            .diagnostics
            .iter()
            .map(|d| to_lsp_diagnostic(&text, &lines, &uri, d))
            .collect();

        let _guard = self.publish.lock().await;
        if !self.documents.commit(uri.as_str(), version, text, analysis) {
            debug!(%uri, version, "newer version already published");
            return;
        }
        debug!(%uri, version, count = diagnostics.len(), "publishing diagnostics");
        self.client.publish_diagnostics(uri, diagnostics, Some(version)).await;
    }

    pub async fn close(&self, uri: Url) {
        let _guard = self.publish.lock().await;
        self.documents.remove(uri.as_str());
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }
}
