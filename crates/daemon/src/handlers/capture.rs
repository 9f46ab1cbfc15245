use rdc_common::protocol::jsonrpc::RequestId;
use serde_json::{json, Value};

use super::{ok, require_pipe, DaemonState, HandlerOutcome, RequirePipe};

pub fn goto(id: RequestId, params: Option<Value>, state: &mut DaemonState) -> HandlerOutcome {
    match require_pipe(&id, &params, state) {
        RequirePipe::Ready { eid, pipeline_state } => {
            HandlerOutcome::plain(ok(id, json!({ "eid": eid, "pipeline_state": pipeline_state })), true)
        }
        RequirePipe::Err(response) => HandlerOutcome::plain(response, true),
    }
}

pub fn count(id: RequestId, _params: Option<Value>, state: &mut DaemonState) -> HandlerOutcome {
    let actions = state.adapter.root_actions();
    let result = json!({ "count": actions.len(), "max_eid": state.adapter.max_eid() });
    HandlerOutcome::plain(ok(id, result), true)
}

pub fn shader_map(id: RequestId, _params: Option<Value>, state: &mut DaemonState) -> HandlerOutcome {
    HandlerOutcome::plain(ok(id, state.adapter.structured_data()), true)
}

pub fn capture_gpus(id: RequestId, _params: Option<Value>, state: &mut DaemonState) -> HandlerOutcome {
    HandlerOutcome::plain(ok(id, json!({ "gpus": state.adapter.resources() })), true)
}

pub fn capture_sections(id: RequestId, _params: Option<Value>, state: &mut DaemonState) -> HandlerOutcome {
    HandlerOutcome::plain(ok(id, json!({ "sections": state.adapter.root_actions() })), true)
}

pub fn capture_section_content(
    id: RequestId,
    params: Option<Value>,
    state: &mut DaemonState,
) -> HandlerOutcome {
    let section = params.as_ref().and_then(|p| p.get("section")).and_then(|v| v.as_str());
    let result = json!({ "section": section, "content": state.adapter.structured_data() });
    HandlerOutcome::plain(ok(id, result), true)
}

pub fn pixel_history(id: RequestId, params: Option<Value>, state: &mut DaemonState) -> HandlerOutcome {
    match require_pipe(&id, &params, state) {
        RequirePipe::Ready { pipeline_state, .. } => {
            HandlerOutcome::plain(ok(id, json!({ "pixel_history": pipeline_state })), true)
        }
        RequirePipe::Err(response) => HandlerOutcome::plain(response, true),
    }
}

pub fn tex_stats(id: RequestId, _params: Option<Value>, state: &mut DaemonState) -> HandlerOutcome {
    HandlerOutcome::plain(ok(id, json!({ "tex_stats": state.adapter.textures() })), true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goto_within_range_repositions_and_returns_pipeline_state() {
        let mut state = DaemonState::for_test(10);
        let outcome = goto(RequestId::Number(1), Some(json!({ "eid": 5 })), &mut state);
        let result = outcome.response.result.expect("goto should succeed");
        assert_eq!(result["eid"], json!(5));
        assert_eq!(state.adapter.current_eid(), 5);
    }

    #[test]
    fn goto_out_of_range_reports_invalid_params_and_leaves_state() {
        let mut state = DaemonState::for_test(10);
        state.adapter.goto(3, false).unwrap();
        let outcome = goto(RequestId::Number(1), Some(json!({ "eid": 999 })), &mut state);
        let error = outcome.response.error.expect("goto should fail");
        assert_eq!(error.code, -32602);
        assert_eq!(state.adapter.current_eid(), 3);
    }

    #[test]
    fn goto_without_eid_is_invalid_params() {
        let mut state = DaemonState::for_test(10);
        let outcome = goto(RequestId::Number(1), Some(json!({})), &mut state);
        assert_eq!(outcome.response.error.unwrap().code, -32602);
    }

    #[test]
    fn count_reports_root_action_length() {
        let mut state = DaemonState::for_test(10);
        let outcome = count(RequestId::Number(1), None, &mut state);
        let result = outcome.response.result.unwrap();
        assert_eq!(result["count"], json!(11));
    }
}
