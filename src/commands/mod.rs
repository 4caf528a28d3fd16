use clap::Args;
use std::io::Read;
use std::path::{Path, PathBuf};

use tokenswap::defaults::{self, RuleDefaults};
use tokenswap::host::MemoryDocument;
use tokenswap::remap::{
    Category, MatchMode, RemapSession, RuleInput, RuleRequest, ScanPayload, SourceFilter,
};
use tokenswap::utils::io;

pub type CmdResult<T> = tokenswap::Result<(T, i32)>;

pub(crate) struct GlobalArgs {
    /// Explicit tokenswap.json location (overrides the global file)
    pub config: Option<PathBuf>,
}

impl GlobalArgs {
    /// Rule defaults from `--config` when given, otherwise the global file.
    ///
    /// An explicit file must load; the global file falls back silently.
    pub fn rule_defaults(&self) -> tokenswap::Result<RuleDefaults> {
        match &self.config {
            Some(path) => defaults::load_config_from(path)
                .map(|config| config.defaults.rule)
                .map_err(|e| {
                    e.with_hint("Run 'tokenswap config path' to see the global config location")
                }),
            None => Ok(defaults::load_defaults().rule),
        }
    }
}

/// Where a loaded document came from, so `--write` knows where to put it back.
pub(crate) enum DocumentSource {
    File(PathBuf),
    Stdin,
}

/// Document argument shared by every engine command.
#[derive(Args, Debug)]
pub struct DocumentArgs {
    /// Document JSON (path, @path, or - for stdin)
    pub document: String,

    /// Scan these node ids instead of the document's selection
    #[arg(long = "root", value_name = "ID")]
    pub roots: Vec<String>,
}

impl DocumentArgs {
    /// Load the document into a fresh session and run the initial scan.
    pub(crate) fn open_session(
        &self,
        global: &GlobalArgs,
    ) -> tokenswap::Result<(RemapSession<MemoryDocument>, DocumentSource, ScanPayload)> {
        let (doc, source) = load_document(&self.document)?;
        let mut session = RemapSession::new(doc, global.rule_defaults()?);
        let scan = if self.roots.is_empty() {
            session.scan_selection()?
        } else {
            session.scan_roots(self.roots.clone())?
        };
        Ok((session, source, scan))
    }
}

/// Find/replace rule flags shared by `preview` and `apply`.
#[derive(Args, Debug)]
pub struct RuleArgs {
    /// Text to find in token names
    #[arg(long)]
    pub find: String,

    /// Replacement text (empty deletes the match)
    #[arg(long, default_value = "")]
    pub replace: String,

    /// Match mode: whole-segment or substring (default from config)
    #[arg(long)]
    pub mode: Option<String>,

    /// Match case exactly, or ignore it with --case-sensitive=false (default from config)
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub case_sensitive: Option<bool>,

    /// Look replacements up in this group instead of the source token's group
    #[arg(long, value_name = "GROUP_ID")]
    pub target_group: Option<String>,

    /// Only include bindings of these categories (repeatable)
    #[arg(long = "category", value_name = "CATEGORY")]
    pub categories: Vec<String>,

    /// Also remap orphaned bindings
    #[arg(long)]
    pub include_orphans: bool,
}

impl RuleArgs {
    pub(crate) fn to_request(&self) -> tokenswap::Result<RuleRequest> {
        let mode = self.mode.as_deref().map(MatchMode::from_str).transpose()?;

        let categories = if self.categories.is_empty() {
            None
        } else {
            Some(
                self.categories
                    .iter()
                    .map(|c| parse_category(c))
                    .collect::<tokenswap::Result<Vec<_>>>()?,
            )
        };

        Ok(RuleRequest {
            rule: RuleInput {
                find: self.find.clone(),
                replace: self.replace.clone(),
                mode,
                case_sensitive: self.case_sensitive,
                target_group: self.target_group.clone(),
            },
            filter: SourceFilter {
                categories,
                include_orphans: self.include_orphans,
            },
        })
    }
}

fn parse_category(value: &str) -> tokenswap::Result<Category> {
    Category::from_str(value).ok_or_else(|| {
        tokenswap::Error::validation_invalid_argument(
            "category",
            format!("Unknown category '{}'", value),
            Some(value.to_string()),
            Some(
                tokenswap::remap::ALL_CATEGORIES
                    .iter()
                    .map(|c| c.as_str().to_string())
                    .collect(),
            ),
        )
    })
}

/// Output flags for commands that mutate the document.
#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Write the updated document back to its file
    #[arg(long)]
    pub write: bool,

    /// Write the updated document to this path instead (implies --write)
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl WriteArgs {
    /// Persist `doc` if requested. Returns the path written.
    pub(crate) fn persist(
        &self,
        doc: &MemoryDocument,
        source: &DocumentSource,
    ) -> tokenswap::Result<Option<String>> {
        let target = match (&self.output, self.write, source) {
            (Some(path), _, _) => path.clone(),
            (None, true, DocumentSource::File(path)) => path.clone(),
            (None, true, DocumentSource::Stdin) => {
                return Err(tokenswap::Error::validation_invalid_argument(
                    "write",
                    "Document was not read from a file; use --output",
                    None,
                    None,
                ))
            }
            (None, false, _) => return Ok(None),
        };

        let content = doc.to_json_pretty()?;
        io::write_file_atomic(&target, &content, &format!("write {}", target.display()))?;
        Ok(Some(target.display().to_string()))
    }
}

// ============================================================================
// JSON Input Parsing (CLI layer)
// ============================================================================

pub(crate) fn load_document(spec: &str) -> tokenswap::Result<(MemoryDocument, DocumentSource)> {
    let (raw, source) = read_input(spec)?;
    let doc = MemoryDocument::from_json(&raw)?;
    crate::tty::status(&format!("Loaded document with {} nodes", doc.node_count()));
    Ok((doc, source))
}

/// Read JSON from a file path, @path, stdin (-) or an inline JSON literal.
pub(crate) fn read_input(spec: &str) -> tokenswap::Result<(String, DocumentSource)> {
    let trimmed = spec.trim();

    if trimmed == "-" {
        if crate::tty::is_stdin_tty() {
            return Err(tokenswap::Error::validation_invalid_argument(
                "input",
                "Cannot read JSON from stdin when stdin is a TTY",
                None,
                None,
            ));
        }
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).map_err(|e| {
            tokenswap::Error::internal_io(e.to_string(), Some("read stdin".to_string()))
        })?;
        return Ok((buf, DocumentSource::Stdin));
    }

    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        return Ok((spec.to_string(), DocumentSource::Stdin));
    }

    let path = match trimmed.strip_prefix('@') {
        Some(path) if path.trim().is_empty() => {
            return Err(tokenswap::Error::validation_invalid_argument(
                "input",
                "Invalid input '@' (missing file path)",
                None,
                None,
            ));
        }
        Some(path) => path,
        None => trimmed,
    };

    let raw = io::read_file(Path::new(path), &format!("read {}", path))?;
    Ok((raw, DocumentSource::File(PathBuf::from(path))))
}

pub mod apply;
pub mod config;
pub mod preview;
pub mod scan;
pub mod session;
pub mod tokens;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (tokenswap::Result<serde_json::Value>, i32) {
    crate::tty::status("tokenswap is working...");

    match command {
        crate::Commands::Scan(args) => dispatch!(args, global, scan),
        crate::Commands::Tokens(args) => dispatch!(args, global, tokens),
        crate::Commands::Preview(args) => dispatch!(args, global, preview),
        crate::Commands::Apply(args) => dispatch!(args, global, apply),
        crate::Commands::Session(args) => dispatch!(args, global, session),
        crate::Commands::Config(args) => dispatch!(args, global, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct RuleCli {
        #[command(flatten)]
        rule: RuleArgs,
    }

    fn rule_request(args: &[&str]) -> RuleRequest {
        let argv: Vec<&str> = std::iter::once("tokenswap").chain(args.iter().copied()).collect();
        let cli = RuleCli::try_parse_from(argv).unwrap();
        cli.rule.to_request().unwrap()
    }

    #[test]
    fn case_sensitivity_defers_to_config_unless_given() {
        assert_eq!(rule_request(&["--find", "a"]).rule.case_sensitive, None);
        assert_eq!(
            rule_request(&["--find", "a", "--case-sensitive"]).rule.case_sensitive,
            Some(true)
        );
        assert_eq!(
            rule_request(&["--find", "a", "--case-sensitive=false"]).rule.case_sensitive,
            Some(false)
        );
    }

    #[test]
    fn unknown_category_is_a_validation_error() {
        let cli = RuleCli::try_parse_from(["tokenswap", "--find", "a", "--category", "glow"])
            .unwrap();
        let err = cli.rule.to_request().unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
    }
}
