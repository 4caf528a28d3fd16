//! Owns the index and history and sequences engine operations.
//!
//! One event is handled at a time, to completion. Every mutating operation
//! (apply, orphan fix, undo, redo) refreshes the index and re-scans the last
//! scanned roots so the caller always sees current bindings.

use serde::{Deserialize, Serialize};

use super::classify::Category;
use super::executor::{self, RemapRequest};
use super::history::{HistoryManager, HistoryState};
use super::index::TokenIndex;
use super::matcher::MatchMode;
use super::planner::{self, PreviewEntry, PreviewSource, PreviewStatus, RemapRule, TargetGroup};
use super::scanner::{self, ScanResult};
use crate::defaults::RuleDefaults;
use crate::error::{Error, Result};
use crate::host::{DocumentHost, Group, NodeId};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanPayload {
    #[serde(flatten)]
    pub scan: ScanResult,
    pub groups: Vec<Group>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewPayload {
    pub entries: Vec<PreviewEntry>,
    pub found: usize,
    pub not_found: usize,
    pub unchanged: usize,
}

impl PreviewPayload {
    fn from_entries(entries: Vec<PreviewEntry>) -> Self {
        let count = |status: PreviewStatus| entries.iter().filter(|e| e.status == status).count();
        Self {
            found: count(PreviewStatus::Found),
            not_found: count(PreviewStatus::NotFound),
            unchanged: count(PreviewStatus::Unchanged),
            entries,
        }
    }

    pub fn requests(&self) -> Vec<RemapRequest> {
        planner::accepted_requests(&self.entries)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyPayload {
    pub applied_count: usize,
    pub errors: Vec<String>,
    /// Id of the recorded history entry, when anything was applied.
    pub history_entry_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanFixPayload {
    pub fixed_count: usize,
    pub errors: Vec<String>,
    pub history_entry_id: Option<u64>,
}

/// Which scanned bindings a preview covers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFilter {
    /// Restrict to these categories; all when absent.
    #[serde(default)]
    pub categories: Option<Vec<Category>>,
    #[serde(default)]
    pub include_orphans: bool,
}

impl SourceFilter {
    fn admits(&self, category: Category) -> bool {
        self.categories
            .as_ref()
            .map_or(true, |allowed| allowed.contains(&category))
    }
}

/// Rule fields as they arrive from a caller; gaps are filled from config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleInput {
    pub find: String,
    #[serde(default)]
    pub replace: String,
    #[serde(default)]
    pub mode: Option<MatchMode>,
    #[serde(default)]
    pub case_sensitive: Option<bool>,
    #[serde(default)]
    pub target_group: Option<String>,
}

impl RuleInput {
    pub fn resolve(&self, defaults: &RuleDefaults) -> RemapRule {
        RemapRule {
            find: self.find.clone(),
            replace: self.replace.clone(),
            mode: self.mode.unwrap_or(defaults.match_mode),
            case_sensitive: self.case_sensitive.unwrap_or(defaults.case_sensitive),
            target_group: match &self.target_group {
                Some(id) => TargetGroup::from(Some(id.clone())),
                None => defaults.target_group.clone(),
            },
        }
    }
}

/// A rule plus the scanned bindings it applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RuleRequest {
    #[serde(flatten)]
    pub rule: RuleInput,
    #[serde(flatten)]
    pub filter: SourceFilter,
}

/// Replacement chosen for one orphaned binding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanFix {
    pub raw_token_id: String,
    /// Limit the fix to one property; every property referencing the id otherwise.
    #[serde(default)]
    pub property_key: Option<String>,
    pub target_token_id: String,
}

/// Inbound events.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    /// Selection changed; `selection` overrides the host's current selection.
    SelectionChanged {
        #[serde(default)]
        selection: Option<Vec<NodeId>>,
    },
    Preview(RuleRequest),
    Apply(RuleRequest),
    FixOrphans {
        fixes: Vec<OrphanFix>,
    },
    Undo,
    Redo,
    History,
}

/// Outbound payloads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionMessage {
    ScanComplete(ScanPayload),
    PreviewComplete(PreviewPayload),
    ApplyComplete(ApplyPayload),
    OrphanFixComplete(OrphanFixPayload),
    HistoryUpdate(HistoryState),
    Error { code: String, message: String },
}

impl SessionMessage {
    fn from_error(err: &Error) -> Self {
        SessionMessage::Error {
            code: err.code.as_str().to_string(),
            message: err.message.clone(),
        }
    }
}

pub struct RemapSession<H: DocumentHost> {
    host: H,
    index: TokenIndex,
    history: HistoryManager,
    defaults: RuleDefaults,
    roots: Vec<NodeId>,
    last_scan: ScanResult,
}

impl<H: DocumentHost> RemapSession<H> {
    pub fn new(host: H, defaults: RuleDefaults) -> Self {
        Self {
            host,
            index: TokenIndex::new(),
            history: HistoryManager::new(),
            defaults,
            roots: Vec::new(),
            last_scan: ScanResult::default(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn index(&self) -> &TokenIndex {
        &self.index
    }

    pub fn last_scan(&self) -> &ScanResult {
        &self.last_scan
    }

    pub fn defaults(&self) -> &RuleDefaults {
        &self.defaults
    }

    /// Scan the host's current selection.
    pub fn scan_selection(&mut self) -> Result<ScanPayload> {
        let roots = self.host.current_selection();
        self.scan_roots(roots)
    }

    pub fn scan_roots(&mut self, roots: Vec<NodeId>) -> Result<ScanPayload> {
        self.roots = roots;
        self.rescan()
    }

    fn rescan(&mut self) -> Result<ScanPayload> {
        self.index.refresh(&self.host)?;
        self.last_scan = scanner::scan(&self.host, &self.index, &self.roots);
        Ok(ScanPayload {
            scan: self.last_scan.clone(),
            groups: self.index.groups().to_vec(),
        })
    }

    /// Bindings from the last scan that pass `filter`, bound ones first.
    pub fn sources(&self, filter: &SourceFilter) -> Vec<PreviewSource> {
        let bound = self
            .last_scan
            .bindings
            .iter()
            .filter(|b| filter.admits(b.category))
            .cloned()
            .map(PreviewSource::Bound);

        let orphaned = self
            .last_scan
            .orphaned_bindings
            .iter()
            .filter(|o| filter.include_orphans && filter.admits(o.category))
            .cloned()
            .map(PreviewSource::Orphaned);

        bound.chain(orphaned).collect()
    }

    pub fn preview(&self, rule: &RemapRule, selected: &[PreviewSource]) -> PreviewPayload {
        PreviewPayload::from_entries(planner::preview(&self.index, rule, selected))
    }

    /// Apply accepted requests and record them as one history entry.
    pub fn apply(
        &mut self,
        requests: Vec<RemapRequest>,
        description: &str,
    ) -> Result<ApplyPayload> {
        if requests.is_empty() {
            return Ok(ApplyPayload {
                applied_count: 0,
                errors: vec!["No remaps selected".to_string()],
                history_entry_id: None,
            });
        }

        let outcome = executor::apply(&mut self.host, &self.index, &requests);
        let history_entry_id = if outcome.applied_count > 0 {
            Some(self.history.record(description, requests).id)
        } else {
            None
        };

        self.rescan()?;
        Ok(ApplyPayload {
            applied_count: outcome.applied_count,
            errors: outcome.errors,
            history_entry_id,
        })
    }

    /// Preview `rule` over the filtered scan and apply every `found` entry.
    pub fn apply_rule(&mut self, rule: &RemapRule, filter: &SourceFilter) -> Result<ApplyPayload> {
        let selected = self.sources(filter);
        let preview = self.preview(rule, &selected);
        let requests = preview.requests();
        let description = format!("Remap {} ({} bindings)", rule.describe(), requests.len());
        self.apply(requests, &description)
    }

    /// Rebind orphaned references from the last scan to chosen tokens.
    pub fn fix_orphans(&mut self, fixes: &[OrphanFix]) -> Result<OrphanFixPayload> {
        let mut errors = Vec::new();
        let mut requests = Vec::new();

        for fix in fixes {
            let Some(target) = self.index.get_token(&fix.target_token_id) else {
                errors.push(format!("Token {} not found", fix.target_token_id));
                continue;
            };

            let matching: Vec<RemapRequest> = self
                .last_scan
                .orphaned_bindings
                .iter()
                .filter(|o| o.raw_token_id == fix.raw_token_id)
                .filter(|o| {
                    fix.property_key
                        .as_deref()
                        .map_or(true, |key| o.property_key == key)
                })
                .map(|o| RemapRequest::orphan_fix(o, target))
                .collect();

            if matching.is_empty() {
                errors.push(format!("No orphaned binding references {}", fix.raw_token_id));
            }
            requests.extend(matching);
        }

        if requests.is_empty() {
            return Ok(OrphanFixPayload {
                fixed_count: 0,
                errors,
                history_entry_id: None,
            });
        }

        let description = format!("Fix {} orphaned bindings", requests.len());
        let applied = self.apply(requests, &description)?;
        errors.extend(applied.errors);

        Ok(OrphanFixPayload {
            fixed_count: applied.applied_count,
            errors,
            history_entry_id: applied.history_entry_id,
        })
    }

    pub fn undo(&mut self) -> Result<HistoryState> {
        self.history.undo(&mut self.host, &self.index)?;
        self.rescan()?;
        Ok(self.history.state())
    }

    pub fn redo(&mut self) -> Result<HistoryState> {
        self.history.redo(&mut self.host, &self.index)?;
        self.rescan()?;
        Ok(self.history.state())
    }

    pub fn history_state(&self) -> HistoryState {
        self.history.state()
    }

    /// Handle one event, returning the payloads it produces in order.
    ///
    /// Failures become a single `error` message; nothing is left half-recorded.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<SessionMessage> {
        match self.dispatch(event) {
            Ok(messages) => messages,
            Err(err) => {
                crate::log_status!("session", "{}", err.message);
                vec![SessionMessage::from_error(&err)]
            }
        }
    }

    fn dispatch(&mut self, event: SessionEvent) -> Result<Vec<SessionMessage>> {
        match event {
            SessionEvent::SelectionChanged { selection } => {
                let payload = match selection {
                    Some(roots) => self.scan_roots(roots)?,
                    None => self.scan_selection()?,
                };
                Ok(vec![SessionMessage::ScanComplete(payload)])
            }
            SessionEvent::Preview(request) => {
                let rule = request.rule.resolve(&self.defaults);
                let selected = self.sources(&request.filter);
                Ok(vec![SessionMessage::PreviewComplete(
                    self.preview(&rule, &selected),
                )])
            }
            SessionEvent::Apply(request) => {
                let rule = request.rule.resolve(&self.defaults);
                let applied = self.apply_rule(&rule, &request.filter)?;
                Ok(self.after_mutation(SessionMessage::ApplyComplete(applied)))
            }
            SessionEvent::FixOrphans { fixes } => {
                let fixed = self.fix_orphans(&fixes)?;
                Ok(self.after_mutation(SessionMessage::OrphanFixComplete(fixed)))
            }
            SessionEvent::Undo => {
                let state = self.undo()?;
                Ok(self.after_replay(state))
            }
            SessionEvent::Redo => {
                let state = self.redo()?;
                Ok(self.after_replay(state))
            }
            SessionEvent::History => Ok(vec![SessionMessage::HistoryUpdate(self.history_state())]),
        }
    }

    fn current_scan_message(&self) -> SessionMessage {
        SessionMessage::ScanComplete(ScanPayload {
            scan: self.last_scan.clone(),
            groups: self.index.groups().to_vec(),
        })
    }

    fn after_mutation(&self, result: SessionMessage) -> Vec<SessionMessage> {
        vec![
            result,
            SessionMessage::HistoryUpdate(self.history_state()),
            self.current_scan_message(),
        ]
    }

    fn after_replay(&self, state: HistoryState) -> Vec<SessionMessage> {
        vec![SessionMessage::HistoryUpdate(state), self.current_scan_message()]
    }
}
