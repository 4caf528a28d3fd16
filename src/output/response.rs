//! JSON envelope written to stdout for every tokenswap command.
//!
//! Success: `{"success": true, "data": ...}`. Failure:
//! `{"success": false, "error": {"code", "message", "details", "hints"?}}`.
//! The process exit code is derived from the error family.

use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};
use tokenswap::error::Hint;
use tokenswap::{Error, ErrorCode, Result};

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody<'a>>,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    message: &'a str,
    details: &'a Value,
    #[serde(skip_serializing_if = "no_hints")]
    hints: &'a [Hint],
    #[serde(skip_serializing_if = "Option::is_none")]
    retryable: Option<bool>,
}

fn no_hints(hints: &&[Hint]) -> bool {
    hints.is_empty()
}

impl<'a> Envelope<'a> {
    fn from_result(result: &'a Result<Value>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(err) => Self {
                success: false,
                data: None,
                error: Some(ErrorBody {
                    code: err.code.as_str(),
                    message: &err.message,
                    details: &err.details,
                    hints: &err.hints,
                    retryable: err.retryable,
                }),
            },
        }
    }
}

/// Serialize a command's output, pairing it with the exit code to use.
///
/// Successful commands pick their own code (an apply with per-item errors
/// exits 1); failures map through [`exit_code_for`].
pub fn map_cmd_result_to_json<T: Serialize>(result: Result<(T, i32)>) -> (Result<Value>, i32) {
    match result {
        Ok((data, exit_code)) => match serde_json::to_value(data) {
            Ok(value) => (Ok(value), exit_code),
            Err(e) => (
                Err(Error::internal_json(
                    e.to_string(),
                    Some("serialize command output".to_string()),
                )),
                1,
            ),
        },
        Err(err) => {
            let exit_code = exit_code_for(err.code);
            (Err(err), exit_code)
        }
    }
}

/// Bad input or config is 2, an empty undo/redo stack is 3, anything else 1.
fn exit_code_for(code: ErrorCode) -> i32 {
    match code {
        ErrorCode::ConfigInvalidJson
        | ErrorCode::ValidationInvalidArgument
        | ErrorCode::ValidationInvalidJson => 2,
        ErrorCode::HistoryNothingToUndo | ErrorCode::HistoryNothingToRedo => 3,
        ErrorCode::InternalIoError
        | ErrorCode::InternalJsonError
        | ErrorCode::InternalUnexpected => 1,
    }
}

pub fn print_json_result(result: Result<Value>) -> Result<()> {
    let payload = serde_json::to_string_pretty(&Envelope::from_result(&result)).map_err(|e| {
        Error::internal_json(e.to_string(), Some("serialize envelope".to_string()))
    })?;

    match writeln!(io::stdout().lock(), "{}", payload) {
        Ok(()) => Ok(()),
        // Reader went away (e.g. piped into `head`).
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(Error::internal_io(
            e.to_string(),
            Some("write stdout".to_string()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;

    fn envelope(result: &Result<Value>) -> Value {
        serde_json::to_value(Envelope::from_result(result)).unwrap()
    }

    #[test]
    fn validation_errors_exit_with_usage_code() {
        let err = Error::validation_invalid_argument("mode", "bad", None, None);
        let (result, code) = map_cmd_result_to_json::<()>(Err(err));
        assert!(result.is_err());
        assert_eq!(code, 2);
    }

    #[test]
    fn missing_config_file_exits_with_usage_code() {
        let err = tokenswap::defaults::load_config_from(Path::new("/nonexistent/tokenswap.json"))
            .unwrap_err();
        let (_, code) = map_cmd_result_to_json::<()>(Err(err));
        assert_eq!(code, 2);
    }

    #[test]
    fn history_errors_have_their_own_code() {
        let (_, code) = map_cmd_result_to_json::<()>(Err(Error::history_nothing_to_undo(0)));
        assert_eq!(code, 3);
    }

    #[test]
    fn success_keeps_command_exit_code() {
        let (result, code) = map_cmd_result_to_json(Ok((json!({"appliedCount": 0}), 1)));
        assert_eq!(result.unwrap()["appliedCount"], 0);
        assert_eq!(code, 1);
    }

    #[test]
    fn success_envelope_carries_data_only() {
        let value = envelope(&Ok(json!({"command": "scan"})));
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["command"], "scan");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn error_envelope_omits_empty_hints() {
        let value = envelope(&Err(Error::history_nothing_to_undo(0)));
        assert_eq!(value["success"], false);
        assert!(value.get("data").is_none());
        assert_eq!(value["error"]["code"], "history.nothing_to_undo");
        assert!(value["error"].get("hints").is_none());
        assert!(value["error"].get("retryable").is_none());
    }

    #[test]
    fn error_envelope_lists_hints() {
        let err = Error::validation_invalid_argument("config", "missing", None, None)
            .with_hint("Run 'tokenswap config path'");
        let value = envelope(&Err(err));
        assert_eq!(value["error"]["hints"][0]["message"], "Run 'tokenswap config path'");
        assert_eq!(value["error"]["details"]["field"], "config");
    }
}
