//! Walks selected subtrees and aggregates token bindings.
//!
//! Traversal is depth-first pre-order over an explicit stack. Instances found
//! beneath another instance are reported separately and never descended into.

use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

use super::classify::{classify, Category};
use super::index::TokenIndex;
use crate::host::{alias_target, DocumentHost, Node, NodeId, Token};

/// All nodes bound to one token through one property.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub category: Category,
    pub property_key: String,
    pub token_id: String,
    pub token_name: String,
    pub group_id: String,
    pub node_count: usize,
    /// Contributing nodes in first-seen order, each listed once.
    pub node_ids: Vec<NodeId>,
}

/// All nodes referencing one token id that no longer resolves.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanedBinding {
    pub category: Category,
    pub property_key: String,
    pub raw_token_id: String,
    pub node_count: usize,
    pub node_ids: Vec<NodeId>,
    /// Parallel to `node_ids`.
    pub node_names: Vec<String>,
}

/// An instance nested inside another instance, reported instead of scanned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedInstance {
    pub node_id: NodeId,
    pub node_name: String,
    pub component_name: String,
    pub bound_variable_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub bindings: Vec<Binding>,
    pub orphaned_bindings: Vec<OrphanedBinding>,
    pub nested_instances: Vec<NestedInstance>,
    pub total_node_count: usize,
}

type AggregateKey = (Category, String, String);

/// Accumulates bindings and orphans keyed by `(category, property, token id)`.
#[derive(Debug, Default)]
struct Aggregator {
    bindings: Vec<Binding>,
    binding_keys: HashMap<AggregateKey, usize>,
    orphans: Vec<OrphanedBinding>,
    orphan_keys: HashMap<AggregateKey, usize>,
}

impl Aggregator {
    /// Fold one node's bound-variable payload.
    fn collect(&mut self, node: &Node, index: &TokenIndex) {
        for (property_key, payload) in &node.bound_variables {
            let category = classify(property_key);
            for raw_id in references(payload) {
                let resolved = index
                    .get_token(raw_id)
                    .filter(|t| index.get_group(&t.group_id).is_some());
                match resolved {
                    Some(token) => self.fold_bound(category, property_key, token, node),
                    None => self.fold_orphan(category, property_key, raw_id, node),
                }
            }
        }
    }

    fn fold_bound(&mut self, category: Category, property_key: &str, token: &Token, node: &Node) {
        let key = (category, property_key.to_string(), token.id.clone());
        match self.binding_keys.get(&key) {
            Some(&i) => {
                let binding = &mut self.bindings[i];
                if !binding.node_ids.contains(&node.id) {
                    binding.node_ids.push(node.id.clone());
                    binding.node_count += 1;
                }
            }
            None => {
                self.binding_keys.insert(key, self.bindings.len());
                self.bindings.push(Binding {
                    category,
                    property_key: property_key.to_string(),
                    token_id: token.id.clone(),
                    token_name: token.name.clone(),
                    group_id: token.group_id.clone(),
                    node_count: 1,
                    node_ids: vec![node.id.clone()],
                });
            }
        }
    }

    fn fold_orphan(&mut self, category: Category, property_key: &str, raw_id: &str, node: &Node) {
        let key = (category, property_key.to_string(), raw_id.to_string());
        match self.orphan_keys.get(&key) {
            Some(&i) => {
                let orphan = &mut self.orphans[i];
                if !orphan.node_ids.contains(&node.id) {
                    orphan.node_ids.push(node.id.clone());
                    orphan.node_names.push(node.name.clone());
                    orphan.node_count += 1;
                }
            }
            None => {
                self.orphan_keys.insert(key, self.orphans.len());
                self.orphans.push(OrphanedBinding {
                    category,
                    property_key: property_key.to_string(),
                    raw_token_id: raw_id.to_string(),
                    node_count: 1,
                    node_ids: vec![node.id.clone()],
                    node_names: vec![node.name.clone()],
                });
            }
        }
    }

    fn record_count(&self) -> usize {
        self.bindings.len() + self.orphans.len()
    }

    fn into_sorted(self) -> (Vec<Binding>, Vec<OrphanedBinding>) {
        let mut bindings = self.bindings;
        bindings.sort_by(|a, b| {
            (a.category.as_str(), a.token_name.as_str())
                .cmp(&(b.category.as_str(), b.token_name.as_str()))
        });

        let mut orphans = self.orphans;
        orphans.sort_by(|a, b| {
            (a.category.as_str(), a.raw_token_id.as_str())
                .cmp(&(b.category.as_str(), b.raw_token_id.as_str()))
        });

        (bindings, orphans)
    }
}

/// Normalize a payload to the token ids it references.
///
/// Accepts a single alias or a list of aliases; malformed entries are skipped.
fn references(payload: &Value) -> Vec<&str> {
    match payload {
        Value::Array(items) => items.iter().filter_map(alias_target).collect(),
        other => alias_target(other).into_iter().collect(),
    }
}

/// Scan the subtrees rooted at `roots`.
///
/// Roots that do not resolve are skipped. Every visited node counts once toward
/// `total_node_count`, including nested instances that are reported rather than
/// aggregated.
pub fn scan(host: &dyn DocumentHost, index: &TokenIndex, roots: &[NodeId]) -> ScanResult {
    let mut aggregator = Aggregator::default();
    let mut nested_instances = Vec::new();
    let mut reported: HashSet<NodeId> = HashSet::new();
    let mut total_node_count = 0;

    for root in roots {
        // (node id, has an instance ancestor on this path)
        let mut stack: Vec<(NodeId, bool)> = vec![(root.clone(), false)];

        while let Some((id, inside_instance)) = stack.pop() {
            let Some(node) = host.get_node(&id) else {
                continue;
            };
            total_node_count += 1;

            let caps = node.capabilities();
            if caps.instance && inside_instance {
                if reported.insert(node.id.clone()) {
                    let mut isolated = Aggregator::default();
                    isolated.collect(&node, index);
                    let count = isolated.record_count();
                    if count > 0 {
                        nested_instances.push(NestedInstance {
                            node_id: node.id.clone(),
                            node_name: node.name.clone(),
                            component_name: node
                                .main_component
                                .clone()
                                .unwrap_or_else(|| node.name.clone()),
                            bound_variable_count: count,
                        });
                    }
                }
                continue;
            }

            aggregator.collect(&node, index);

            let child_inside = inside_instance || caps.instance;
            for child in node.children.iter().rev() {
                stack.push((child.clone(), child_inside));
            }
        }
    }

    let (bindings, orphaned_bindings) = aggregator.into_sorted();
    crate::log_status!(
        "scan",
        "{} nodes, {} bindings, {} orphaned, {} nested instances",
        total_node_count,
        bindings.len(),
        orphaned_bindings.len(),
        nested_instances.len()
    );

    ScanResult {
        bindings,
        orphaned_bindings,
        nested_instances,
        total_node_count,
    }
}
