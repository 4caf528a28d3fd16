use clap::Args;
use serde::Serialize;

use tokenswap::remap::{PreviewPayload, RemapRule};

use super::{CmdResult, DocumentArgs, GlobalArgs, RuleArgs};

#[derive(Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    document: DocumentArgs,

    #[command(flatten)]
    rule: RuleArgs,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewOutput {
    command: &'static str,
    rule: RemapRule,
    scanned_nodes: usize,
    #[serde(flatten)]
    preview: PreviewPayload,
}

pub fn run(args: PreviewArgs, global: &GlobalArgs) -> CmdResult<PreviewOutput> {
    let request = args.rule.to_request()?;
    let (session, _, scan) = args.document.open_session(global)?;

    let rule = request.rule.resolve(session.defaults());
    let selected = session.sources(&request.filter);
    let preview = session.preview(&rule, &selected);

    crate::tty::status(&format!(
        "{}: {} found, {} not found, {} unchanged",
        rule.describe(),
        preview.found,
        preview.not_found,
        preview.unchanged
    ));

    Ok((
        PreviewOutput {
            command: "preview",
            rule,
            scanned_nodes: scan.scan.total_node_count,
            preview,
        },
        0,
    ))
}
