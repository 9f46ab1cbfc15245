// Binary-payload handlers (C10, §4.10): these return their JSON line as
// usual, but `HandlerOutcome::binary_payload` carries the trailing bytes;
// the transport layer stamps `_binary_size` onto the result before writing
// either half.

use rdc_common::protocol::jsonrpc::{RequestId, INTERNAL_ERROR, INVALID_PARAMS};
use serde_json::{json, Value};

use crate::vfs::{self, VfsNodeKind};

use super::{err, ok, DaemonState, HandlerOutcome};

pub fn capture_thumbnail(
    id: RequestId,
    _params: Option<Value>,
    state: &mut DaemonState,
) -> HandlerOutcome {
    match state.adapter.read_bytes("/thumbnail") {
        Ok(bytes) => {
            let result = json!({ "mime": "image/png" });
            HandlerOutcome::with_payload(ok(id, result), bytes)
        }
        Err(error) => HandlerOutcome::plain(err(id, INTERNAL_ERROR, error.to_string()), true),
    }
}

/// The second round-trip `vfs_ls` leaves implicit (§4.10): given the
/// `handler_path` a prior `vfs_ls` call returned, fetch its bytes.
pub fn vfs_read(id: RequestId, params: Option<Value>, state: &mut DaemonState) -> HandlerOutcome {
    let path = match params.as_ref().and_then(|p| p.get("path")).and_then(|v| v.as_str()) {
        Some(path) => path,
        None => return HandlerOutcome::plain(err(id, INVALID_PARAMS, "path is required"), true),
    };

    let node = match vfs::ls(path) {
        Ok(node) => node,
        Err(error) => return HandlerOutcome::plain(err(id, INVALID_PARAMS, error.to_string()), true),
    };

    if node.kind != VfsNodeKind::LeafBin && node.kind != VfsNodeKind::LeafText {
        return HandlerOutcome::plain(
            err(id, INVALID_PARAMS, format!("`{path}` is not a leaf")),
            true,
        );
    }

    match state.adapter.read_bytes(path) {
        Ok(bytes) => HandlerOutcome::with_payload(ok(id, json!({})), bytes),
        Err(error) => HandlerOutcome::plain(err(id, INTERNAL_ERROR, error.to_string()), true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vfs_read_rejects_missing_path() {
        let mut state = DaemonState::for_test(10);
        let outcome = vfs_read(RequestId::Number(1), Some(json!({})), &mut state);
        assert_eq!(outcome.response.error.unwrap().code, INVALID_PARAMS);
    }

    #[test]
    fn vfs_read_rejects_a_directory_path() {
        let mut state = DaemonState::for_test(10);
        let outcome =
            vfs_read(RequestId::Number(1), Some(json!({ "path": "/textures/7" })), &mut state);
        assert_eq!(outcome.response.error.unwrap().code, INVALID_PARAMS);
    }

    #[test]
    fn vfs_read_rejects_unknown_root() {
        let mut state = DaemonState::for_test(10);
        let outcome =
            vfs_read(RequestId::Number(1), Some(json!({ "path": "/shaders/1" })), &mut state);
        assert_eq!(outcome.response.error.unwrap().code, INVALID_PARAMS);
    }

    #[test]
    fn capture_thumbnail_surfaces_adapter_error_as_internal_error() {
        let mut state = DaemonState::for_test(10);
        let outcome = capture_thumbnail(RequestId::Number(1), None, &mut state);
        assert_eq!(outcome.response.error.unwrap().code, INTERNAL_ERROR);
        assert!(outcome.binary_payload.is_none());
    }
}
