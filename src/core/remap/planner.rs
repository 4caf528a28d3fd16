//! Previews where a find/replace rule would send each binding.

use serde::{Deserialize, Serialize};

use super::classify::Category;
use super::executor::RemapRequest;
use super::index::{GroupScope, TokenIndex};
use super::matcher::{apply_find_replace, MatchMode};
use super::scanner::{Binding, OrphanedBinding};

/// Sentinel meaning "search the source binding's own group".
pub const SAME_GROUP: &str = "same";

/// Which group a renamed path is resolved in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum TargetGroup {
    #[default]
    Same,
    Group(String),
}

impl From<Option<String>> for TargetGroup {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(id) if !id.is_empty() && id != SAME_GROUP => TargetGroup::Group(id),
            _ => TargetGroup::Same,
        }
    }
}

impl From<TargetGroup> for Option<String> {
    fn from(value: TargetGroup) -> Self {
        match value {
            TargetGroup::Same => None,
            TargetGroup::Group(id) => Some(id),
        }
    }
}

/// A find/replace rule over token names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemapRule {
    pub find: String,
    pub replace: String,
    #[serde(default)]
    pub mode: MatchMode,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub target_group: TargetGroup,
}

impl RemapRule {
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn in_group(mut self, target_group: TargetGroup) -> Self {
        self.target_group = target_group;
        self
    }

    pub fn describe(&self) -> String {
        format!("'{}' → '{}'", self.find, self.replace)
    }
}

/// A binding selected for preview.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PreviewSource {
    Bound(Binding),
    Orphaned(OrphanedBinding),
}

impl PreviewSource {
    /// The name find/replace runs against. Orphans only carry their raw id.
    pub fn source_name(&self) -> &str {
        match self {
            PreviewSource::Bound(b) => &b.token_name,
            PreviewSource::Orphaned(o) => &o.raw_token_id,
        }
    }

    pub fn source_token_id(&self) -> &str {
        match self {
            PreviewSource::Bound(b) => &b.token_id,
            PreviewSource::Orphaned(o) => &o.raw_token_id,
        }
    }

    pub fn group_id(&self) -> Option<&str> {
        match self {
            PreviewSource::Bound(b) => Some(&b.group_id),
            PreviewSource::Orphaned(_) => None,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            PreviewSource::Bound(b) => b.category,
            PreviewSource::Orphaned(o) => o.category,
        }
    }

    pub fn property_key(&self) -> &str {
        match self {
            PreviewSource::Bound(b) => &b.property_key,
            PreviewSource::Orphaned(o) => &o.property_key,
        }
    }

    pub fn node_ids(&self) -> &[String] {
        match self {
            PreviewSource::Bound(b) => &b.node_ids,
            PreviewSource::Orphaned(o) => &o.node_ids,
        }
    }

    pub fn is_orphan(&self) -> bool {
        matches!(self, PreviewSource::Orphaned(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewStatus {
    Found,
    NotFound,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewEntry {
    pub source: PreviewSource,
    /// Renamed path, absent when the rule leaves the name unchanged.
    #[serde(rename = "newVariableName")]
    pub new_token_name: Option<String>,
    /// Resolved target, present only when `status` is `found`.
    pub target_token_id: Option<String>,
    pub status: PreviewStatus,
}

impl PreviewEntry {
    fn unchanged(source: PreviewSource) -> Self {
        Self {
            source,
            new_token_name: None,
            target_token_id: None,
            status: PreviewStatus::Unchanged,
        }
    }

    /// Turn an accepted `found` entry into an execution unit.
    pub fn to_request(&self) -> Option<RemapRequest> {
        if self.status != PreviewStatus::Found {
            return None;
        }
        Some(RemapRequest {
            property_key: self.source.property_key().to_string(),
            category: self.source.category(),
            source_token_id: self.source.source_token_id().to_string(),
            source_token_name: self.source.source_name().to_string(),
            target_token_id: self.target_token_id.clone()?,
            target_token_name: self.new_token_name.clone()?,
            node_ids: self.source.node_ids().to_vec(),
            is_orphan: self.source.is_orphan(),
        })
    }
}

/// Preview `rule` over `selected`, preserving input order.
pub fn preview(
    index: &TokenIndex,
    rule: &RemapRule,
    selected: &[PreviewSource],
) -> Vec<PreviewEntry> {
    preview_with(index, rule, selected, apply_find_replace)
}

/// [`preview`] with an explicit matcher.
///
/// An empty `find` marks everything unchanged without calling `matcher`.
pub fn preview_with<F>(
    index: &TokenIndex,
    rule: &RemapRule,
    selected: &[PreviewSource],
    mut matcher: F,
) -> Vec<PreviewEntry>
where
    F: FnMut(&str, &str, &str, MatchMode, bool) -> String,
{
    if rule.find.is_empty() {
        return selected.iter().cloned().map(PreviewEntry::unchanged).collect();
    }

    selected
        .iter()
        .cloned()
        .map(|source| {
            let original = source.source_name();
            let new_name = matcher(
                original,
                &rule.find,
                &rule.replace,
                rule.mode,
                rule.case_sensitive,
            );
            if new_name == original {
                return PreviewEntry::unchanged(source);
            }

            let scope = match (&rule.target_group, source.group_id()) {
                (TargetGroup::Group(id), _) => GroupScope::Group(id.as_str()),
                (TargetGroup::Same, Some(id)) => GroupScope::Group(id),
                (TargetGroup::Same, None) => GroupScope::Any,
            };
            let target_token_id = index.find_by_name(&new_name, scope).map(|t| t.id.clone());
            let status = if target_token_id.is_some() {
                PreviewStatus::Found
            } else {
                PreviewStatus::NotFound
            };

            PreviewEntry {
                source,
                new_token_name: Some(new_name),
                target_token_id,
                status,
            }
        })
        .collect()
}

/// Requests for every `found` entry, in preview order.
pub fn accepted_requests(entries: &[PreviewEntry]) -> Vec<RemapRequest> {
    entries.iter().filter_map(PreviewEntry::to_request).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Group, Token, TokenKind};

    fn token(id: &str, name: &str, group: &str) -> Token {
        Token {
            id: id.to_string(),
            name: name.to_string(),
            group_id: group.to_string(),
            kind: TokenKind::Color,
        }
    }

    fn index() -> TokenIndex {
        TokenIndex::from_parts(
            vec![
                token("v1", "button/brand/surface", "light"),
                token("v2", "button/neutral/surface", "light"),
                token("v3", "button/neutral/surface", "dark"),
                token("v4", "button/brand/border", "light"),
            ],
            vec![
                Group {
                    id: "light".to_string(),
                    name: "Light".to_string(),
                },
                Group {
                    id: "dark".to_string(),
                    name: "Dark".to_string(),
                },
            ],
        )
    }

    fn bound(token_id: &str, name: &str, group: &str) -> PreviewSource {
        PreviewSource::Bound(Binding {
            category: Category::Fill,
            property_key: "fills".to_string(),
            token_id: token_id.to_string(),
            token_name: name.to_string(),
            group_id: group.to_string(),
            node_count: 1,
            node_ids: vec!["n1".to_string()],
        })
    }

    fn orphan(raw: &str) -> PreviewSource {
        PreviewSource::Orphaned(OrphanedBinding {
            category: Category::Fill,
            property_key: "fills".to_string(),
            raw_token_id: raw.to_string(),
            node_count: 1,
            node_ids: vec!["n9".to_string()],
            node_names: vec!["Ghost".to_string()],
        })
    }

    #[test]
    fn empty_find_short_circuits_without_matching() {
        let selected = vec![
            bound("v1", "button/brand/surface", "light"),
            bound("v4", "button/brand/border", "light"),
        ];
        let mut calls = 0;
        let rule = RemapRule::new("", "neutral");
        let entries = preview_with(&index(), &rule, &selected, |o, _, _, _, _| {
            calls += 1;
            o.to_string()
        });

        assert_eq!(calls, 0);
        assert_eq!(entries.len(), 2);
        for entry in &entries {
            assert_eq!(entry.status, PreviewStatus::Unchanged);
            assert!(entry.new_token_name.is_none());
            assert!(entry.target_token_id.is_none());
        }
    }

    #[test]
    fn resolves_in_source_group_by_default() {
        let selected = vec![bound("v1", "button/brand/surface", "light")];
        let entries = preview(&index(), &RemapRule::new("brand", "neutral"), &selected);

        assert_eq!(entries[0].status, PreviewStatus::Found);
        assert_eq!(entries[0].new_token_name.as_deref(), Some("button/neutral/surface"));
        assert_eq!(entries[0].target_token_id.as_deref(), Some("v2"));
    }

    #[test]
    fn explicit_target_group_overrides_source_group() {
        let selected = vec![bound("v1", "button/brand/surface", "light")];
        let rule =
            RemapRule::new("brand", "neutral").in_group(TargetGroup::Group("dark".to_string()));
        let entries = preview(&index(), &rule, &selected);

        assert_eq!(entries[0].target_token_id.as_deref(), Some("v3"));
    }

    #[test]
    fn entry_serializes_renamed_path_as_new_variable_name() {
        let selected = vec![bound("v1", "button/brand/surface", "light")];
        let entries = preview(&index(), &RemapRule::new("brand", "neutral"), &selected);

        let value = serde_json::to_value(&entries[0]).unwrap();
        assert_eq!(value["newVariableName"], "button/neutral/surface");
        assert_eq!(value["targetTokenId"], "v2");
        assert!(value.get("newTokenName").is_none());
    }

    #[test]
    fn missing_target_keeps_new_name() {
        let selected = vec![bound("v4", "button/brand/border", "light")];
        let entries = preview(&index(), &RemapRule::new("brand", "neutral"), &selected);

        assert_eq!(entries[0].status, PreviewStatus::NotFound);
        assert_eq!(entries[0].new_token_name.as_deref(), Some("button/neutral/border"));
        assert!(entries[0].target_token_id.is_none());
        assert!(entries[0].to_request().is_none());
    }

    #[test]
    fn unchanged_names_skip_resolution() {
        let selected = vec![bound("v1", "button/brand/surface", "light")];
        let entries = preview(&index(), &RemapRule::new("accent", "neutral"), &selected);

        assert_eq!(entries[0].status, PreviewStatus::Unchanged);
        assert!(entries[0].new_token_name.is_none());
    }

    #[test]
    fn orphans_resolve_globally() {
        let selected = vec![orphan("button/brand/surface")];
        let rule = RemapRule::new("brand", "neutral");
        let entries = preview(&index(), &rule, &selected);

        assert_eq!(entries[0].status, PreviewStatus::Found);
        assert_eq!(entries[0].target_token_id.as_deref(), Some("v2"));

        let request = entries[0].to_request().unwrap();
        assert!(request.is_orphan);
        assert_eq!(request.node_ids, vec!["n9".to_string()]);
    }

    #[test]
    fn preserves_selection_order() {
        let selected = vec![
            bound("v4", "button/brand/border", "light"),
            bound("v1", "button/brand/surface", "light"),
            bound("v2", "button/neutral/surface", "light"),
        ];
        let entries = preview(&index(), &RemapRule::new("brand", "neutral"), &selected);
        let statuses: Vec<PreviewStatus> = entries.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![
                PreviewStatus::NotFound,
                PreviewStatus::Found,
                PreviewStatus::Unchanged
            ]
        );

        let requests = accepted_requests(&entries);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].source_token_id, "v1");
        assert_eq!(requests[0].target_token_id, "v2");
        assert_eq!(requests[0].target_token_name, "button/neutral/surface");
        assert!(!requests[0].is_orphan);
    }

    #[test]
    fn target_group_reads_same_sentinel() {
        assert_eq!(TargetGroup::from(Some("same".to_string())), TargetGroup::Same);
        assert_eq!(TargetGroup::from(None), TargetGroup::Same);
        assert_eq!(
            TargetGroup::from(Some("dark".to_string())),
            TargetGroup::Group("dark".to_string())
        );
    }

    #[test]
    fn rule_deserializes_with_defaults() {
        let rule: RemapRule = serde_json::from_value(serde_json::json!({
            "find": "brand",
            "replace": "core",
            "targetGroup": "same"
        }))
        .unwrap();
        assert_eq!(rule.mode, MatchMode::WholeSegment);
        assert!(!rule.case_sensitive);
        assert_eq!(rule.target_group, TargetGroup::Same);
    }
}
