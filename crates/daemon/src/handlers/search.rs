use rdc_common::protocol::jsonrpc::{RequestId, INVALID_PARAMS};
use serde_json::{json, Value};

use super::{err, ok, DaemonState, HandlerOutcome};

/// Substring search over the capture's resource/texture/buffer names.
/// There is no dedicated index in scope here (§1): this walks the same
/// structural data the other inspection handlers expose.
pub fn search(id: RequestId, params: Option<Value>, state: &mut DaemonState) -> HandlerOutcome {
    let query = match params.as_ref().and_then(|p| p.get("query")).and_then(|v| v.as_str()) {
        Some(query) if !query.is_empty() => query,
        _ => return HandlerOutcome::plain(err(id, INVALID_PARAMS, "query is required"), true),
    };

    let haystacks = [state.adapter.resources(), state.adapter.textures(), state.adapter.buffers()];
    let mut matches = Vec::new();
    for haystack in haystacks {
        collect_matches(&haystack, query, &mut matches);
    }

    HandlerOutcome::plain(ok(id, json!({ "matches": matches })), true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_requires_a_nonempty_query() {
        let mut state = DaemonState::for_test(10);
        let outcome = search(RequestId::Number(1), Some(json!({ "query": "" })), &mut state);
        assert_eq!(outcome.response.error.unwrap().code, INVALID_PARAMS);
    }

    #[test]
    fn search_over_mock_resources_returns_a_matches_array() {
        let mut state = DaemonState::for_test(10);
        let outcome = search(RequestId::Number(1), Some(json!({ "query": "resources" })), &mut state);
        let result = outcome.response.result.expect("search should succeed");
        assert!(result["matches"].is_array());
    }
}

fn collect_matches(value: &Value, query: &str, out: &mut Vec<Value>) {
    match value {
        Value::String(s) if s.to_lowercase().contains(&query.to_lowercase()) => {
            out.push(value.clone());
        }
        Value::Array(items) => {
            for item in items {
                collect_matches(item, query, out);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                if key.to_lowercase().contains(&query.to_lowercase()) {
                    let mut hit = serde_json::Map::new();
                    hit.insert(key.clone(), item.clone());
                    out.push(Value::Object(hit));
                }
                collect_matches(item, query, out);
            }
        }
        _ => {}
    }
}
