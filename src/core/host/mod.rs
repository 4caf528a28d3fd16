//! Host document model the remap engine reads from and mutates.
//!
//! The engine never owns the document. It sees nodes as snapshots returned by
//! [`DocumentHost::get_node`] and changes them only through the two binding
//! primitives, both of which may reject a property or paint shape.

mod memory;

pub use memory::{MemoryDocument, BINDABLE_FIELDS};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::Result;

pub type NodeId = String;

/// Shape tag the host uses for a bound-variable reference.
pub const VARIABLE_ALIAS: &str = "VARIABLE_ALIAS";

/// Resolved value kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    Color,
    Float,
    String,
    Boolean,
}

impl TokenKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "COLOR" => Some(TokenKind::Color),
            "FLOAT" => Some(TokenKind::Float),
            "STRING" => Some(TokenKind::String),
            "BOOLEAN" => Some(TokenKind::Boolean),
            _ => None,
        }
    }
}

/// A named design value managed by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: String,
    /// `/`-delimited path, e.g. `button/brand/surface`.
    pub name: String,
    pub group_id: String,
    pub kind: TokenKind,
}

/// A flat, named container of tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Document,
    Page,
    Frame,
    Group,
    Component,
    ComponentSet,
    Instance,
    Rectangle,
    Ellipse,
    Vector,
    Text,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaintKind {
    Solid,
    GradientLinear,
    GradientRadial,
    GradientAngular,
    GradientDiamond,
    Image,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// One entry of a node's fill or stroke list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paint {
    #[serde(rename = "type")]
    pub kind: PaintKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    /// Token id the color is bound to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound_color: Option<String>,
}

impl Paint {
    pub fn is_solid(&self) -> bool {
        self.kind == PaintKind::Solid
    }
}

/// Which paint list of a node a binding lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintSlot {
    Fills,
    Strokes,
}

impl PaintSlot {
    pub fn property_key(&self) -> &'static str {
        match self {
            PaintSlot::Fills => "fills",
            PaintSlot::Strokes => "strokes",
        }
    }
}

/// Snapshot of one document node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
    /// Raw bound-variable payload keyed by property. Values are a single
    /// alias object or a list of them; anything else is treated as absent.
    #[serde(
        default,
        deserialize_with = "object_or_empty",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub bound_variables: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fills: Option<Vec<Paint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strokes: Option<Vec<Paint>>,
    /// Name of the component an instance was created from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_component: Option<String>,
}

/// Hosts send `null` or `[]` for nodes with no bindings.
fn object_or_empty<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map.into_iter().collect(),
        _ => BTreeMap::new(),
    })
}

/// What a node can do, resolved once per lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeCapabilities {
    pub instance: bool,
    pub fills: bool,
    pub strokes: bool,
    pub scalar_bind: bool,
}

impl Node {
    pub fn capabilities(&self) -> NodeCapabilities {
        NodeCapabilities {
            instance: self.kind == NodeKind::Instance,
            fills: self.fills.is_some(),
            strokes: self.strokes.is_some(),
            scalar_bind: !matches!(self.kind, NodeKind::Document | NodeKind::Page),
        }
    }

    pub fn paints(&self, slot: PaintSlot) -> Option<&[Paint]> {
        match slot {
            PaintSlot::Fills => self.fills.as_deref(),
            PaintSlot::Strokes => self.strokes.as_deref(),
        }
    }
}

/// Rejection from a host binding primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    NodeNotFound(String),
    UnsupportedProperty { node_id: String, property_key: String },
    UnsupportedPaint { node_id: Option<String>, reason: String },
}

impl std::fmt::Display for BindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindError::NodeNotFound(id) => write!(f, "Node {} not found", id),
            BindError::UnsupportedProperty {
                node_id,
                property_key,
            } => write!(
                f,
                "Property '{}' cannot be bound on node {}",
                property_key, node_id
            ),
            BindError::UnsupportedPaint { node_id, reason } => match node_id {
                Some(id) => write!(f, "Paint on node {} cannot be bound: {}", id, reason),
                None => write!(f, "Paint cannot be bound: {}", reason),
            },
        }
    }
}

impl std::error::Error for BindError {}

pub type BindResult<T> = std::result::Result<T, BindError>;

/// Host document operations the engine depends on.
pub trait DocumentHost {
    /// Ids of the currently selected nodes, in selection order.
    fn current_selection(&self) -> Vec<NodeId>;

    /// Look up a node. `None` is a soft not-found.
    fn get_node(&self, id: &str) -> Option<Node>;

    /// Every token currently defined, in host order.
    fn all_tokens(&self) -> Result<Vec<Token>>;

    /// Every group currently defined, in host order.
    fn all_groups(&self) -> Result<Vec<Group>>;

    /// Produce a copy of `paint` with its color bound to `token`.
    fn bind_paint_color(&self, paint: &Paint, token: &Token) -> BindResult<Paint>;

    /// Replace a node's fill or stroke list.
    fn set_paints(&mut self, node_id: &str, slot: PaintSlot, paints: Vec<Paint>)
        -> BindResult<()>;

    /// Bind a scalar property of a node to `token`.
    fn bind_property(&mut self, node_id: &str, property_key: &str, token: &Token)
        -> BindResult<()>;
}

/// Build the host's alias payload for a token id.
pub fn variable_alias(token_id: &str) -> Value {
    serde_json::json!({ "type": VARIABLE_ALIAS, "id": token_id })
}

/// Extract the token id from one alias payload, if well-formed.
pub fn alias_target(value: &Value) -> Option<&str> {
    let obj = value.as_object()?;
    if obj.get("type").and_then(Value::as_str) != Some(VARIABLE_ALIAS) {
        return None;
    }
    obj.get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn alias_target_reads_well_formed_alias() {
        assert_eq!(alias_target(&variable_alias("v:1")), Some("v:1"));
    }

    #[test]
    fn alias_target_rejects_malformed_payloads() {
        assert_eq!(alias_target(&json!({"id": "v:1"})), None);
        assert_eq!(alias_target(&json!({"type": "VARIABLE_ALIAS", "id": ""})), None);
        assert_eq!(alias_target(&json!({"type": "VARIABLE_ALIAS", "id": 3})), None);
        assert_eq!(alias_target(&json!("v:1")), None);
        assert_eq!(alias_target(&Value::Null), None);
    }

    #[test]
    fn unknown_node_types_deserialize_as_other() {
        let node: Node = serde_json::from_value(json!({
            "id": "1:1",
            "type": "STICKY",
        }))
        .unwrap();
        assert_eq!(node.kind, NodeKind::Other);
        assert!(node.bound_variables.is_empty());
    }

    #[test]
    fn null_or_list_bound_variables_read_as_absent() {
        for payload in [Value::Null, json!([]), json!("fills")] {
            let node: Node = serde_json::from_value(json!({
                "id": "1:3",
                "type": "RECTANGLE",
                "boundVariables": payload
            }))
            .unwrap();
            assert!(node.bound_variables.is_empty());
        }
    }

    #[test]
    fn capabilities_reflect_node_shape() {
        let node: Node = serde_json::from_value(json!({
            "id": "1:2",
            "type": "INSTANCE",
            "fills": [],
        }))
        .unwrap();
        let caps = node.capabilities();
        assert!(caps.instance);
        assert!(caps.fills);
        assert!(!caps.strokes);
        assert!(caps.scalar_bind);
    }
}
