use clap::Args;
use serde::Serialize;
use serde_json::Value;

use tokenswap::remap::{RemapSession, SessionEvent, SessionMessage};

use super::{load_document, read_input, CmdResult, GlobalArgs, WriteArgs};

#[derive(Args)]
pub struct SessionArgs {
    /// Document JSON (path, @path, or - for stdin)
    document: String,

    /// JSON array of session events (path, @path, or inline JSON)
    script: String,

    #[command(flatten)]
    output: WriteArgs,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutput {
    command: &'static str,
    events_handled: usize,
    events_skipped: usize,
    messages: Vec<SessionMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    written_to: Option<String>,
}

pub fn run(args: SessionArgs, global: &GlobalArgs) -> CmdResult<SessionOutput> {
    let (raw_script, _) = read_input(&args.script)?;
    let events: Vec<Value> = serde_json::from_str(&raw_script).map_err(|e| {
        tokenswap::Error::validation_invalid_json(
            e,
            Some("parse session script".to_string()),
            Some(raw_script.chars().take(200).collect::<String>()),
        )
    })?;

    let (doc, source) = load_document(&args.document)?;
    let mut session = RemapSession::new(doc, global.rule_defaults()?);

    let mut messages = Vec::new();
    let mut handled = 0;
    let mut skipped = 0;

    for raw in events {
        match serde_json::from_value::<SessionEvent>(raw) {
            Ok(event) => {
                messages.extend(session.handle(event));
                handled += 1;
            }
            Err(e) => {
                tokenswap::log_status!("session", "Skipping malformed event: {}", e);
                skipped += 1;
            }
        }
    }

    let mutated = !session.history_state().entries.is_empty();
    let written_to = if mutated {
        args.output.persist(session.host(), &source)?
    } else {
        None
    };

    Ok((
        SessionOutput {
            command: "session",
            events_handled: handled,
            events_skipped: skipped,
            messages,
            written_to,
        },
        0,
    ))
}
