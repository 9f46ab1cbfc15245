use rdc_common::protocol::jsonrpc::RequestId;
use serde_json::{json, Value};

use super::{ok, DaemonState, HandlerOutcome};

/// The one method exempt from token authentication (§4.2). Never mutates
/// state, always answers the same shape.
pub fn ping(id: RequestId, _params: Option<Value>, _state: &mut DaemonState) -> HandlerOutcome {
    HandlerOutcome::plain(ok(id, json!({ "ok": true })), true)
}

pub fn status(id: RequestId, _params: Option<Value>, state: &mut DaemonState) -> HandlerOutcome {
    let result = json!({
        "capture": state.capture,
        "host": state.host,
        "port": state.port,
        "pid": std::process::id(),
        "current_eid": state.adapter.current_eid(),
        "max_eid": state.adapter.max_eid(),
        "session": state.session_name,
    });
    HandlerOutcome::plain(ok(id, result), true)
}

/// Idempotent from the client's view (§8): the handler itself always
/// succeeds and signals shutdown; a *second* call never reaches here
/// because the listener has already stopped accepting connections by
/// then, so the caller sees a transport error instead of a protocol one.
pub fn shutdown(id: RequestId, _params: Option<Value>, state: &mut DaemonState) -> HandlerOutcome {
    state.adapter.shutdown();
    HandlerOutcome::plain(ok(id, json!({ "ok": true })), false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_never_mutates_state_and_keeps_running() {
        let mut state = DaemonState::for_test(10);
        let before = state.adapter.current_eid();
        let outcome = ping(RequestId::Number(1), None, &mut state);
        assert!(outcome.keep_running);
        assert_eq!(outcome.response.result, Some(json!({ "ok": true })));
        assert_eq!(state.adapter.current_eid(), before);
    }

    #[test]
    fn status_reports_capture_and_eid_bounds() {
        let mut state = DaemonState::for_test(10);
        let outcome = status(RequestId::Number(1), None, &mut state);
        let result = outcome.response.result.expect("status should succeed");
        assert_eq!(result["max_eid"], json!(10));
        assert_eq!(result["session"], json!("default"));
    }

    #[test]
    fn shutdown_signals_stop_serving() {
        let mut state = DaemonState::for_test(10);
        let outcome = shutdown(RequestId::Number(1), None, &mut state);
        assert!(!outcome.keep_running);
        assert!(outcome.response.error.is_none());
    }
}
