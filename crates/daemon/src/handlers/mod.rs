// Handler registry (C5): method name → handler function, uniform
// `(id, params, state) -> (response, keep_running)` contract (§4.5).
//
// Handlers are plain synchronous functions. The daemon is single-threaded
// and sequential by design (§5) and every handler body is either pure
// computation against in-memory adapter state or a blocking call into the
// (opaque, out-of-scope) replay library, so there is nothing here an async
// executor would usefully interleave.

mod binary;
mod capture;
mod lifecycle;
mod script;
mod search;
mod state;
mod vfs_rpc;

pub use state::DaemonState;

use std::collections::HashMap;

use rdc_common::protocol::jsonrpc::{RequestId, Response, INVALID_PARAMS};
use rdc_common::protocol::rpc_methods::*;
use serde_json::Value;

/// What a handler produces: the response to send, whether the connection
/// loop should keep serving after it (only `shutdown` says no), and an
/// optional raw byte payload that the transport layer appends after the
/// JSON line per §4.1/§4.10 (with `_binary_size` stamped onto the result).
pub struct HandlerOutcome {
    pub response: Response,
    pub keep_running: bool,
    pub binary_payload: Option<Vec<u8>>,
}

impl HandlerOutcome {
    fn plain(response: Response, keep_running: bool) -> Self {
        Self { response, keep_running, binary_payload: None }
    }

    fn with_payload(response: Response, payload: Vec<u8>) -> Self {
        Self { response, keep_running: true, binary_payload: Some(payload) }
    }
}

pub type HandlerFn = fn(RequestId, Option<Value>, &mut DaemonState) -> HandlerOutcome;

/// Build the static method → handler table. Every method in
/// `rdc_common::protocol::rpc_methods::IMPLEMENTED_METHODS` must appear
/// here exactly once.
pub fn registry() -> HashMap<&'static str, HandlerFn> {
    let mut map: HashMap<&'static str, HandlerFn> = HashMap::new();
    map.insert(PING, lifecycle::ping);
    map.insert(STATUS, lifecycle::status);
    map.insert(SHUTDOWN, lifecycle::shutdown);
    map.insert(GOTO, capture::goto);
    map.insert(COUNT, capture::count);
    map.insert(SHADER_MAP, capture::shader_map);
    map.insert(CAPTURE_THUMBNAIL, binary::capture_thumbnail);
    map.insert(CAPTURE_GPUS, capture::capture_gpus);
    map.insert(CAPTURE_SECTIONS, capture::capture_sections);
    map.insert(CAPTURE_SECTION_CONTENT, capture::capture_section_content);
    map.insert(PIXEL_HISTORY, capture::pixel_history);
    map.insert(TEX_STATS, capture::tex_stats);
    map.insert(SEARCH, search::search);
    map.insert(VFS_LS, vfs_rpc::vfs_ls);
    map.insert(VFS_READ, binary::vfs_read);
    map.insert(SCRIPT, script::script);
    map
}

/// Outcome of `require_pipe` (§4.5, §9): an explicit result type standing
/// in for the source's raise-a-sentinel-exception idiom. Handlers `match`
/// on it instead of duplicating the eid-validation boilerplate.
pub enum RequirePipe {
    Ready { eid: i64, pipeline_state: Value },
    Err(Response),
}

/// Validate `params.eid` against `0 ..= max_eid`, reposition the adapter
/// to it (`force = false`), and return the resulting pipeline state. Every
/// caller of `require_pipe` needs a concrete eid, so a missing field is
/// itself an invalid-params error rather than an implicit "stay put".
pub fn require_pipe(id: &RequestId, params: &Option<Value>, state: &mut DaemonState) -> RequirePipe {
    let requested_eid = match params.as_ref().and_then(|p| p.get("eid")) {
        Some(value) => match value.as_i64() {
            Some(eid) => eid,
            None => {
                return RequirePipe::Err(err(id.clone(), INVALID_PARAMS, "eid must be an integer"))
            }
        },
        None => return RequirePipe::Err(err(id.clone(), INVALID_PARAMS, "eid is required")),
    };

    match state.adapter.goto(requested_eid, false) {
        Ok(()) => {
            let pipeline_state = state.adapter.pipeline_state(requested_eid);
            persist_current_eid(state, requested_eid);
            RequirePipe::Ready { eid: requested_eid, pipeline_state }
        }
        Err(_) => RequirePipe::Err(err(id.clone(), INVALID_PARAMS, "eid out of range")),
    }
}

/// Re-save the session record with the new `current_eid` (spec §3:
/// "mutable; updated by goto"). Best-effort: a missing or racing session
/// file doesn't fail the RPC that triggered the reposition, since the
/// in-memory adapter state is already authoritative for this connection.
fn persist_current_eid(state: &DaemonState, eid: i64) {
    if let Ok(mut record) = rdc_common::session::load(&state.home, &state.session_name) {
        record.current_eid = eid;
        let _ = rdc_common::session::save(&state.home, &state.session_name, &record);
    }
}

pub fn ok(id: RequestId, result: Value) -> Response {
    Response::success(id, result)
}

pub fn err(id: RequestId, code: i32, message: impl Into<String>) -> Response {
    Response::err(id, code, message)
}

#[cfg(test)]
mod tests {
    use rdc_common::protocol::rpc_methods::IMPLEMENTED_METHODS;

    use super::*;

    #[test]
    fn registry_answers_every_cataloged_method() {
        let registry = registry();
        for method in IMPLEMENTED_METHODS {
            assert!(registry.contains_key(method), "missing handler for `{method}`");
        }
        assert_eq!(registry.len(), IMPLEMENTED_METHODS.len());
    }

    #[test]
    fn require_pipe_re_saves_the_session_record_with_the_new_eid() {
        let mut state = DaemonState::for_test(10);
        let id = RequestId::Number(1);
        let params = Some(serde_json::json!({ "eid": 7 }));

        let outcome = require_pipe(&id, &params, &mut state);
        assert!(matches!(outcome, RequirePipe::Ready { eid: 7, .. }));

        let record = rdc_common::session::load(&state.home, &state.session_name)
            .expect("session record should still load");
        assert_eq!(record.current_eid, 7);
    }

    #[test]
    fn require_pipe_out_of_range_does_not_touch_the_session_record() {
        let mut state = DaemonState::for_test(10);
        let id = RequestId::Number(1);
        let params = Some(serde_json::json!({ "eid": 999 }));

        let outcome = require_pipe(&id, &params, &mut state);
        assert!(matches!(outcome, RequirePipe::Err(_)));

        let record = rdc_common::session::load(&state.home, &state.session_name).unwrap();
        assert_eq!(record.current_eid, 0);
    }
}
