use clap::Args;
use serde::Serialize;

use tokenswap::host::{Group, Token, TokenKind};
use tokenswap::remap::TokenIndex;

use super::{load_document, CmdResult, GlobalArgs};

#[derive(Args)]
pub struct TokensArgs {
    /// Document JSON (path, @path, or - for stdin)
    document: String,

    /// Group to list
    #[arg(long)]
    group: String,

    /// Only tokens of this kind: COLOR, FLOAT, STRING, BOOLEAN
    #[arg(long)]
    kind: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokensOutput {
    command: &'static str,
    group: Group,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<TokenKind>,
    count: usize,
    tokens: Vec<Token>,
}

pub fn run(args: TokensArgs, _global: &GlobalArgs) -> CmdResult<TokensOutput> {
    let kind = args
        .kind
        .as_deref()
        .map(|k| {
            TokenKind::from_str(k).ok_or_else(|| {
                tokenswap::Error::validation_invalid_argument(
                    "kind",
                    format!("Unknown token kind '{}'", k),
                    Some(k.to_string()),
                    Some(vec![
                        "COLOR".to_string(),
                        "FLOAT".to_string(),
                        "STRING".to_string(),
                        "BOOLEAN".to_string(),
                    ]),
                )
            })
        })
        .transpose()?;

    let (doc, _) = load_document(&args.document)?;
    let mut index = TokenIndex::new();
    index.refresh(&doc)?;

    let group = index.get_group(&args.group).cloned().ok_or_else(|| {
        tokenswap::Error::validation_invalid_argument(
            "group",
            format!("Unknown group '{}'", args.group),
            Some(args.group.clone()),
            Some(index.groups().iter().map(|g| g.id.clone()).collect()),
        )
    })?;

    let tokens: Vec<Token> = index
        .list_by_group(&group.id, kind)
        .into_iter()
        .cloned()
        .collect();

    Ok((
        TokensOutput {
            command: "tokens",
            group,
            kind,
            count: tokens.len(),
            tokens,
        },
        0,
    ))
}
