// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! LanguageServer trait implementation.

use amaro_ast::LineMap;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::LanguageServer;
use tracing::{debug, info};

use crate::backend::Backend;
use crate::convert::to_document_symbols;

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, _: InitializeParams) -> Result<InitializeResult> {
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
                document_symbol_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "amaro-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("client initialized");
        self.client
            .log_message(MessageType::INFO, "Amaro language server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        info!("shutdown requested");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        debug!(uri = %doc.uri, version = doc.version, "did_open");
        self.update(doc.uri, doc.version, doc.text).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        debug!(%uri, version, "did_change");

        // With FULL sync the last change holds the entire document
        if let Some(change) = params.content_changes.into_iter().last() {
            self.update(uri, version, change.text).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        debug!(uri = %params.text_document.uri, "did_close");
        self.close(params.text_document.uri).await;
    }

    async fn document_symbol(&self, params: DocumentSymbolParams) -> Result<Option<DocumentSymbolResponse>> {
        let Some(doc) = self.documents.get(params.text_document.uri.as_str()) else {
            return Ok(None);
        };

        let lines = LineMap::new(&doc.text);
        let symbols = to_document_symbols(&doc.text, &lines, &doc.analysis.outline());
        Ok(Some(DocumentSymbolResponse::Nested(symbols)))
    }
}
