use rdc_common::protocol::jsonrpc::{RequestId, INVALID_PARAMS};
use serde_json::Value;

use crate::vfs;

use super::{err, ok, DaemonState, HandlerOutcome};

pub fn vfs_ls(id: RequestId, params: Option<Value>, _state: &mut DaemonState) -> HandlerOutcome {
    let path = params.as_ref().and_then(|p| p.get("path")).and_then(|v| v.as_str()).unwrap_or("/");

    match vfs::ls(path) {
        Ok(node) => {
            let result = serde_json::to_value(node).expect("VfsNode always serializes");
            HandlerOutcome::plain(ok(id, result), true)
        }
        Err(error) => HandlerOutcome::plain(err(id, INVALID_PARAMS, error.to_string()), true),
    }
}
