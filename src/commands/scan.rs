use clap::Args;
use serde::Serialize;

use tokenswap::host::DocumentHost;
use tokenswap::remap::ScanPayload;

use super::{CmdResult, DocumentArgs, GlobalArgs};

#[derive(Args)]
pub struct ScanArgs {
    #[command(flatten)]
    document: DocumentArgs,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutput {
    command: &'static str,
    roots: Vec<String>,
    #[serde(flatten)]
    scan: ScanPayload,
}

pub fn run(args: ScanArgs, global: &GlobalArgs) -> CmdResult<ScanOutput> {
    let (session, _, scan) = args.document.open_session(global)?;

    let roots = if args.document.roots.is_empty() {
        session.host().current_selection()
    } else {
        args.document.roots.clone()
    };

    Ok((
        ScanOutput {
            command: "scan",
            roots,
            scan,
        },
        0,
    ))
}
