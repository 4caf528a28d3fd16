//! Token remapping: scan bindings, preview a find/replace, apply, undo.
//!
//! Walks the selected subtrees collecting token bindings, maps each bound
//! token's path through a find/replace rule, resolves the renamed path back to
//! a concrete token, and rebinds the nodes. Applied batches go on a linear
//! undo/redo stack.

mod classify;
mod executor;
mod history;
mod index;
mod matcher;
mod planner;
mod scanner;
mod session;

pub use classify::{classify, Category, ALL_CATEGORIES};
pub use executor::{apply, rebind, ApplyOutcome, RebindError, RemapRequest};
pub use history::{HistoryEntry, HistoryEntrySummary, HistoryManager, HistoryState};
pub use index::{GroupScope, TokenIndex};
pub use matcher::{apply_find_replace, MatchMode};
pub use planner::{
    accepted_requests, preview, preview_with, PreviewEntry, PreviewSource, PreviewStatus,
    RemapRule, TargetGroup, SAME_GROUP,
};
pub use scanner::{scan, Binding, NestedInstance, OrphanedBinding, ScanResult};
pub use session::{
    ApplyPayload, OrphanFix, OrphanFixPayload, PreviewPayload, RemapSession, RuleInput,
    RuleRequest, ScanPayload, SessionEvent, SessionMessage, SourceFilter,
};
