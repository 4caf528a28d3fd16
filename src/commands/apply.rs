use clap::Args;
use serde::Serialize;

use tokenswap::remap::{ApplyPayload, HistoryState, RemapRule, ScanResult};

use super::{CmdResult, DocumentArgs, GlobalArgs, RuleArgs, WriteArgs};

#[derive(Args)]
pub struct ApplyArgs {
    #[command(flatten)]
    document: DocumentArgs,

    #[command(flatten)]
    rule: RuleArgs,

    #[command(flatten)]
    output: WriteArgs,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOutput {
    command: &'static str,
    rule: RemapRule,
    #[serde(flatten)]
    applied: ApplyPayload,
    history: HistoryState,
    /// Bindings after the apply, re-scanned from the same roots.
    scan: ScanResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    written_to: Option<String>,
}

pub fn run(args: ApplyArgs, global: &GlobalArgs) -> CmdResult<ApplyOutput> {
    let request = args.rule.to_request()?;
    let (mut session, source, _) = args.document.open_session(global)?;

    let rule = request.rule.resolve(session.defaults());
    let applied = session.apply_rule(&rule, &request.filter)?;

    let written_to = if applied.applied_count > 0 {
        args.output.persist(session.host(), &source)?
    } else {
        None
    };

    // Partial failures exit non-zero.
    let exit_code = if applied.errors.is_empty() { 0 } else { 1 };

    Ok((
        ApplyOutput {
            command: "apply",
            rule,
            history: session.history_state(),
            scan: session.last_scan().clone(),
            applied,
            written_to,
        },
        exit_code,
    ))
}
