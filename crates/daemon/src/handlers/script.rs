use std::collections::HashMap;
use std::path::Path;

use rdc_common::protocol::jsonrpc::{RequestId, INTERNAL_ERROR, INVALID_PARAMS};
use serde_json::{json, Value};

use crate::script_exec::run_script;

use super::{err, ok, DaemonState, HandlerOutcome};

/// Runs a user-supplied Lua source file loaded from a caller-provided
/// absolute path (§4.9) — the daemon never accepts inline script text
/// over the wire, matching the original's `{"path": ..., "args": ...}`
/// request shape.
pub fn script(id: RequestId, params: Option<Value>, state: &mut DaemonState) -> HandlerOutcome {
    let path = match params.as_ref().and_then(|p| p.get("path")).and_then(|v| v.as_str()) {
        Some(path) => path,
        None => return HandlerOutcome::plain(err(id, INVALID_PARAMS, "path is required"), true),
    };

    if !Path::new(path).is_absolute() {
        return HandlerOutcome::plain(err(id, INVALID_PARAMS, "path must be absolute"), true);
    }

    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(error) => {
            return HandlerOutcome::plain(
                err(id, INTERNAL_ERROR, format!("failed to read `{path}`: {error}")),
                true,
            )
        }
    };

    let args: HashMap<String, String> = params
        .as_ref()
        .and_then(|p| p.get("args"))
        .and_then(|v| v.as_object())
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();

    let capture_path = state.capture.to_string_lossy().to_string();
    let outcome = run_script(&source, &args, &state.adapter, &capture_path);

    let result = json!({
        "stdout": outcome.stdout,
        "stderr": outcome.stderr,
        "elapsed_ms": outcome.elapsed_ms,
        "return_value": outcome.return_value,
    });
    HandlerOutcome::plain(ok(id, result), true)
}
