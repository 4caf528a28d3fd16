//! Rebinds nodes to new tokens through the host primitives.
//!
//! Batches never abort on a bad item: each (node, property) pair either counts
//! as applied or adds one line to the error list.

use serde::{Deserialize, Serialize};

use super::classify::Category;
use super::index::TokenIndex;
use super::scanner::OrphanedBinding;
use crate::host::{BindError, DocumentHost, Node, PaintSlot, Token};

/// One accepted remap, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemapRequest {
    pub property_key: String,
    pub category: Category,
    pub source_token_id: String,
    pub source_token_name: String,
    pub target_token_id: String,
    pub target_token_name: String,
    pub node_ids: Vec<String>,
    /// Set when the source token no longer exists; such requests cannot be undone.
    #[serde(default)]
    pub is_orphan: bool,
}

impl RemapRequest {
    /// Point an orphaned binding at an existing token.
    pub fn orphan_fix(orphan: &OrphanedBinding, target: &Token) -> Self {
        Self {
            property_key: orphan.property_key.clone(),
            category: orphan.category,
            source_token_id: orphan.raw_token_id.clone(),
            source_token_name: orphan.raw_token_id.clone(),
            target_token_id: target.id.clone(),
            target_token_name: target.name.clone(),
            node_ids: orphan.node_ids.clone(),
            is_orphan: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOutcome {
    /// (node, property) pairs processed without error. Silent host no-ops count.
    pub applied_count: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RebindError {
    NodeNotFound(String),
    TokenNotFound(String),
    Host { node_id: String, source: BindError },
}

impl std::fmt::Display for RebindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RebindError::NodeNotFound(id) => write!(f, "Node {} not found", id),
            RebindError::TokenNotFound(id) => write!(f, "Token {} not found", id),
            RebindError::Host { node_id, source } => {
                write!(f, "Failed to rebind node {}: {}", node_id, source)
            }
        }
    }
}

impl std::error::Error for RebindError {}

/// Apply every request to every one of its nodes, in order.
pub fn apply(
    host: &mut dyn DocumentHost,
    index: &TokenIndex,
    requests: &[RemapRequest],
) -> ApplyOutcome {
    let mut outcome = ApplyOutcome::default();

    for request in requests {
        for node_id in &request.node_ids {
            match rebind(
                host,
                index,
                node_id,
                &request.property_key,
                request.category,
                &request.target_token_id,
            ) {
                Ok(()) => outcome.applied_count += 1,
                Err(e) => outcome.errors.push(e.to_string()),
            }
        }
    }

    crate::log_status!(
        "apply",
        "Rebound {} bindings ({} errors)",
        outcome.applied_count,
        outcome.errors.len()
    );
    outcome
}

/// Bind one node's property to `token_id` according to its category.
pub fn rebind(
    host: &mut dyn DocumentHost,
    index: &TokenIndex,
    node_id: &str,
    property_key: &str,
    category: Category,
    token_id: &str,
) -> Result<(), RebindError> {
    let node = host
        .get_node(node_id)
        .ok_or_else(|| RebindError::NodeNotFound(node_id.to_string()))?;
    let token = index
        .get_token(token_id)
        .ok_or_else(|| RebindError::TokenNotFound(token_id.to_string()))?;

    let caps = node.capabilities();
    match category {
        Category::Fill if caps.fills => rebind_first_paint(host, &node, PaintSlot::Fills, token),
        Category::Stroke if caps.strokes => {
            rebind_first_paint(host, &node, PaintSlot::Strokes, token)
        }
        Category::Fill | Category::Stroke => Ok(()),
        // TODO: effect bindings live inside each effect entry; rebind them once
        // the host exposes a per-effect primitive.
        Category::Effect => Ok(()),
        _ if !caps.scalar_bind => Ok(()),
        _ => {
            // Unbindable properties are indistinguishable from success here.
            let _ = host.bind_property(node_id, property_key, token);
            Ok(())
        }
    }
}

/// Rebind the first paint of a list when it is solid. Writes back a new list.
///
/// Callers check the node's capabilities for `slot` first.
fn rebind_first_paint(
    host: &mut dyn DocumentHost,
    node: &Node,
    slot: PaintSlot,
    token: &Token,
) -> Result<(), RebindError> {
    let paints = node.paints(slot).unwrap_or_default();
    let Some(first) = paints.first().filter(|p| p.is_solid()) else {
        return Ok(());
    };

    let host_error = |source: BindError| RebindError::Host {
        node_id: node.id.clone(),
        source,
    };

    let rebound = host.bind_paint_color(first, token).map_err(host_error)?;
    let mut next = paints.to_vec();
    next[0] = rebound;
    host.set_paints(&node.id, slot, next).map_err(host_error)
}
