//! Refreshable snapshot of the host's tokens and groups.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::Result;
use crate::host::{DocumentHost, Group, Token, TokenKind};

/// Where a name lookup searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupScope<'a> {
    Group(&'a str),
    Any,
}

/// Snapshot of every token and group, keyed for lookup.
///
/// Each [`refresh`](TokenIndex::refresh) replaces the whole snapshot. Lookups
/// that tie on name resolve to the first token in host enumeration order.
#[derive(Debug, Default)]
pub struct TokenIndex {
    tokens: Vec<Token>,
    groups: Vec<Group>,
    token_positions: HashMap<String, usize>,
    group_positions: HashMap<String, usize>,
}

impl TokenIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index directly from token and group lists.
    pub fn from_parts(tokens: Vec<Token>, groups: Vec<Group>) -> Self {
        let mut index = Self::new();
        index.replace(tokens, groups);
        index
    }

    pub fn refresh(&mut self, host: &dyn DocumentHost) -> Result<()> {
        let tokens = host.all_tokens()?;
        let groups = host.all_groups()?;
        self.replace(tokens, groups);
        crate::log_status!(
            "index",
            "Loaded {} tokens in {} groups",
            self.tokens.len(),
            self.groups.len()
        );
        Ok(())
    }

    fn replace(&mut self, tokens: Vec<Token>, groups: Vec<Group>) {
        self.token_positions.clear();
        self.group_positions.clear();

        // First occurrence wins when the host reports a duplicate id.
        for (i, token) in tokens.iter().enumerate() {
            self.token_positions.entry(token.id.clone()).or_insert(i);
        }
        for (i, group) in groups.iter().enumerate() {
            self.group_positions.entry(group.id.clone()).or_insert(i);
        }

        self.tokens = tokens;
        self.groups = groups;
    }

    pub fn get_token(&self, id: &str) -> Option<&Token> {
        self.token_positions.get(id).map(|&i| &self.tokens[i])
    }

    pub fn get_group(&self, id: &str) -> Option<&Group> {
        self.group_positions.get(id).map(|&i| &self.groups[i])
    }

    pub fn find_by_name(&self, name: &str, scope: GroupScope<'_>) -> Option<&Token> {
        self.tokens.iter().find(|t| {
            t.name == name
                && match scope {
                    GroupScope::Group(group_id) => t.group_id == group_id,
                    GroupScope::Any => true,
                }
        })
    }

    /// Tokens of one group, optionally filtered by kind, sorted by name.
    pub fn list_by_group(&self, group_id: &str, kind: Option<TokenKind>) -> Vec<&Token> {
        let mut listed: Vec<&Token> = self
            .tokens
            .iter()
            .filter(|t| t.group_id == group_id)
            .filter(|t| kind.map_or(true, |k| t.kind == k))
            .collect();
        listed.sort_by(|a, b| collate(&a.name, &b.name));
        listed
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

/// Dictionary-style ordering: letters compare case-insensitively first, with
/// lowercase ahead of uppercase when names differ only in case.
fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}
