//! JSON-backed in-memory document implementing [`DocumentHost`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::{
    variable_alias, BindError, BindResult, DocumentHost, Group, Node, NodeId, Paint, PaintSlot,
    Token,
};
use crate::error::{Error, Result};

/// Scalar fields that accept a token binding.
pub const BINDABLE_FIELDS: &[&str] = &[
    "characters",
    "visible",
    "opacity",
    "width",
    "height",
    "minWidth",
    "maxWidth",
    "minHeight",
    "maxHeight",
    "strokeWeight",
    "itemSpacing",
    "counterAxisSpacing",
    "paddingLeft",
    "paddingRight",
    "paddingTop",
    "paddingBottom",
    "cornerRadius",
    "topLeftRadius",
    "topRightRadius",
    "bottomLeftRadius",
    "bottomRightRadius",
    "fontSize",
    "fontFamily",
    "fontStyle",
    "fontWeight",
    "lineHeight",
    "letterSpacing",
    "paragraphSpacing",
    "paragraphIndent",
];

/// A whole design document held in memory.
///
/// Nodes are stored flat and linked through `children` ids. Serializes back to
/// the same shape it was loaded from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryDocument {
    #[serde(default)]
    selection: Vec<NodeId>,
    #[serde(default)]
    groups: Vec<Group>,
    #[serde(default)]
    tokens: Vec<Token>,
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(skip)]
    positions: HashMap<NodeId, usize>,
}

impl MemoryDocument {
    pub fn from_json(raw: &str) -> Result<Self> {
        let doc: MemoryDocument = serde_json::from_str(raw).map_err(|e| {
            Error::validation_invalid_json(
                e,
                Some("parse document".to_string()),
                Some(raw.chars().take(200).collect::<String>()),
            )
        })?;
        Ok(doc.reindexed())
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let doc: MemoryDocument = serde_json::from_value(value).map_err(|e| {
            Error::validation_invalid_json(e, Some("parse document".to_string()), None)
        })?;
        Ok(doc.reindexed())
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            Error::internal_json(e.to_string(), Some("serialize document".to_string()))
        })
    }

    fn reindexed(mut self) -> Self {
        self.positions = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        self
    }

    pub fn set_selection(&mut self, selection: Vec<NodeId>) {
        self.selection = selection;
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Remove a token, leaving any bindings to it dangling.
    pub fn remove_token(&mut self, token_id: &str) -> Option<Token> {
        let pos = self.tokens.iter().position(|t| t.id == token_id)?;
        Some(self.tokens.remove(pos))
    }

    /// Remove a group without touching its tokens.
    pub fn remove_group(&mut self, group_id: &str) -> Option<Group> {
        let pos = self.groups.iter().position(|g| g.id == group_id)?;
        Some(self.groups.remove(pos))
    }

    fn node_mut(&mut self, id: &str) -> BindResult<&mut Node> {
        let pos = *self
            .positions
            .get(id)
            .ok_or_else(|| BindError::NodeNotFound(id.to_string()))?;
        Ok(&mut self.nodes[pos])
    }
}

impl DocumentHost for MemoryDocument {
    fn current_selection(&self) -> Vec<NodeId> {
        self.selection.clone()
    }

    fn get_node(&self, id: &str) -> Option<Node> {
        self.positions.get(id).map(|&pos| self.nodes[pos].clone())
    }

    fn all_tokens(&self) -> Result<Vec<Token>> {
        Ok(self.tokens.clone())
    }

    fn all_groups(&self) -> Result<Vec<Group>> {
        Ok(self.groups.clone())
    }

    fn bind_paint_color(&self, paint: &Paint, token: &Token) -> BindResult<Paint> {
        if !paint.is_solid() {
            return Err(BindError::UnsupportedPaint {
                node_id: None,
                reason: "only solid paints carry a bindable color".to_string(),
            });
        }

        let mut bound = paint.clone();
        bound.bound_color = Some(token.id.clone());
        Ok(bound)
    }

    fn set_paints(
        &mut self,
        node_id: &str,
        slot: PaintSlot,
        paints: Vec<Paint>,
    ) -> BindResult<()> {
        let node = self.node_mut(node_id)?;
        let key = slot.property_key();

        let aliases: Vec<Value> = paints
            .iter()
            .filter_map(|p| p.bound_color.as_deref())
            .map(variable_alias)
            .collect();
        if aliases.is_empty() {
            node.bound_variables.remove(key);
        } else {
            node.bound_variables
                .insert(key.to_string(), Value::Array(aliases));
        }

        match slot {
            PaintSlot::Fills => node.fills = Some(paints),
            PaintSlot::Strokes => node.strokes = Some(paints),
        }
        Ok(())
    }

    fn bind_property(
        &mut self,
        node_id: &str,
        property_key: &str,
        token: &Token,
    ) -> BindResult<()> {
        let node = self.node_mut(node_id)?;

        if !node.capabilities().scalar_bind || !BINDABLE_FIELDS.contains(&property_key) {
            return Err(BindError::UnsupportedProperty {
                node_id: node_id.to_string(),
                property_key: property_key.to_string(),
            });
        }

        node.bound_variables
            .insert(property_key.to_string(), variable_alias(&token.id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{alias_target, TokenKind};
    use serde_json::json;

    fn doc() -> MemoryDocument {
        MemoryDocument::from_value(json!({
            "selection": ["1:1"],
            "groups": [{"id": "g1", "name": "Brand"}],
            "tokens": [{"id": "v1", "name": "color/brand", "groupId": "g1", "kind": "COLOR"}],
            "nodes": [
                {"id": "1:1", "name": "Card", "type": "FRAME", "children": ["1:2"],
                 "fills": [{"type": "SOLID", "color": {"r": 1.0, "g": 1.0, "b": 1.0}}]},
                {"id": "1:2", "name": "Label", "type": "TEXT"}
            ]
        }))
        .unwrap()
    }

    fn token() -> Token {
        Token {
            id: "v1".to_string(),
            name: "color/brand".to_string(),
            group_id: "g1".to_string(),
            kind: TokenKind::Color,
        }
    }

    #[test]
    fn loads_nodes_and_selection() {
        let doc = doc();
        assert_eq!(doc.current_selection(), vec!["1:1".to_string()]);
        assert_eq!(doc.get_node("1:2").unwrap().name, "Label");
        assert!(doc.get_node("9:9").is_none());
        assert_eq!(doc.node_count(), 2);
    }

    #[test]
    fn invalid_json_is_a_validation_error() {
        let err = MemoryDocument::from_json("{ nodes: ").unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_json");
    }

    #[test]
    fn set_paints_refreshes_bound_payload() {
        let mut doc = doc();
        let node = doc.get_node("1:1").unwrap();
        let first = &node.fills.as_ref().unwrap()[0];
        let bound = doc.bind_paint_color(first, &token()).unwrap();
        doc.set_paints("1:1", PaintSlot::Fills, vec![bound]).unwrap();

        let node = doc.get_node("1:1").unwrap();
        let payload = &node.bound_variables["fills"];
        assert_eq!(alias_target(&payload[0]), Some("v1"));
        assert_eq!(node.fills.unwrap()[0].bound_color.as_deref(), Some("v1"));
    }

    #[test]
    fn gradient_paints_reject_color_binding() {
        let doc = doc();
        let gradient: Paint =
            serde_json::from_value(json!({"type": "GRADIENT_LINEAR"})).unwrap();
        assert!(doc.bind_paint_color(&gradient, &token()).is_err());
    }

    #[test]
    fn bind_property_rejects_unknown_fields() {
        let mut doc = doc();
        assert!(doc.bind_property("1:2", "fontSize", &token()).is_ok());
        assert_eq!(
            doc.bind_property("1:2", "blendMode", &token()),
            Err(BindError::UnsupportedProperty {
                node_id: "1:2".to_string(),
                property_key: "blendMode".to_string(),
            })
        );
        assert_eq!(
            doc.bind_property("4:4", "fontSize", &token()),
            Err(BindError::NodeNotFound("4:4".to_string()))
        );
    }

    #[test]
    fn serializes_back_to_loadable_json() {
        let mut doc = doc();
        doc.bind_property("1:2", "fontSize", &token()).unwrap();
        let raw = doc.to_json_pretty().unwrap();
        let reloaded = MemoryDocument::from_json(&raw).unwrap();
        assert_eq!(
            alias_target(&reloaded.get_node("1:2").unwrap().bound_variables["fontSize"]),
            Some("v1")
        );
    }
}
