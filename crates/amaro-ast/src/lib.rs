// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Abstract Syntax Tree types for the Amaro routing language.
//!
//! This crate defines the AST nodes shared between the lexer, parser,
//! type checker, and outline extractor.

pub mod span;
pub mod token;
pub mod expr;
pub mod block;

use std::sync::atomic::{AtomicU64, Ordering};

pub use span::{Span, LineMap};

/// Unique identifier for AST nodes.
///
/// Ids come from one process-wide counter, so nodes from documents parsed
/// concurrently on different threads never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

impl NodeId {
    pub const DUMMY: NodeId = NodeId(u64::MAX);

    /// Allocate the next id. Lock-free and safe to call from any thread.
    pub fn fresh() -> NodeId {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}
