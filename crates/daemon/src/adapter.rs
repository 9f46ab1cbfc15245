// Replay-library adapter (§6.4, §9 "Daemon/adapter versioning").
//
// The real replay library is an opaque native handle out of scope here
// (spec §1); `ReplayLibrary` is the capability set the core requires from
// it, and `ReplayAdapter` is the single place that knows which name a
// given library version uses for an operation that got renamed across
// versions — grounded directly on the original `RenderDocAdapter`'s
// version-gated `get_root_actions`. Handlers never branch on version
// themselves.

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("failed to open capture `{path}`: {reason}")]
    OpenFailed { path: PathBuf, reason: String },
    #[error("event id {eid} out of range (max {max_eid})")]
    EidOutOfRange { eid: i64, max_eid: i64 },
    #[error("unknown vfs path `{0}`")]
    UnknownPath(String),
}

/// The capability set every replay-library binding must provide (§6.4).
/// A concrete binding for the real native library lives outside this
/// repository's scope; `MockReplayLibrary` below is the in-memory double
/// used for daemon tests.
pub trait ReplayLibrary: Send {
    fn open(&mut self, capture: &Path) -> Result<(), AdapterError>;
    fn max_eid(&self) -> i64;
    fn current_eid(&self) -> i64;
    fn set_current_eid(&mut self, eid: i64);

    /// Root draw/action list under the library's pre-1.32 name.
    fn root_actions_legacy(&self) -> Vec<Value>;
    /// Root draw/action list under the 1.32+ name. Most bindings can
    /// implement this identically to the legacy variant; the split exists
    /// so a binding that genuinely renamed a field can diverge.
    fn root_actions_current(&self) -> Vec<Value> {
        self.root_actions_legacy()
    }

    fn pipeline_state(&self, eid: i64) -> Value;
    fn resources(&self) -> Value;
    fn textures(&self) -> Value;
    fn buffers(&self) -> Value;
    fn read_bytes(&self, vfs_path: &str) -> Result<Vec<u8>, AdapterError>;
    fn structured_data(&self) -> Value;
    fn shutdown(&mut self);
}

/// Version at and after which the replay library's root-action accessor
/// uses its current name (matching `original_source`'s `(1, 32)` gate).
const ROOT_ACTIONS_RENAME_VERSION: (u32, u32) = (1, 32);

pub struct ReplayAdapter {
    controller: Box<dyn ReplayLibrary>,
    version: (u32, u32),
}

impl ReplayAdapter {
    pub fn new(controller: Box<dyn ReplayLibrary>, version: (u32, u32)) -> Self {
        Self { controller, version }
    }

    pub fn version(&self) -> (u32, u32) {
        self.version
    }

    pub fn open(&mut self, capture: &Path) -> Result<(), AdapterError> {
        self.controller.open(capture)
    }

    pub fn max_eid(&self) -> i64 {
        self.controller.max_eid()
    }

    pub fn current_eid(&self) -> i64 {
        self.controller.current_eid()
    }

    /// Reposition to `eid`. `force` mirrors the replay library's own
    /// "reposition even if already there" flag; the core never needs it
    /// to be true today but keeps the parameter since handlers (via
    /// `require_pipe`) always pass `false`.
    pub fn goto(&mut self, eid: i64, _force: bool) -> Result<(), AdapterError> {
        let max_eid = self.controller.max_eid();
        if eid < 0 || eid > max_eid {
            return Err(AdapterError::EidOutOfRange { eid, max_eid });
        }
        self.controller.set_current_eid(eid);
        Ok(())
    }

    pub fn root_actions(&self) -> Vec<Value> {
        if self.version >= ROOT_ACTIONS_RENAME_VERSION {
            self.controller.root_actions_current()
        } else {
            self.controller.root_actions_legacy()
        }
    }

    pub fn pipeline_state(&self, eid: i64) -> Value {
        self.controller.pipeline_state(eid)
    }

    pub fn resources(&self) -> Value {
        self.controller.resources()
    }

    pub fn textures(&self) -> Value {
        self.controller.textures()
    }

    pub fn buffers(&self) -> Value {
        self.controller.buffers()
    }

    pub fn read_bytes(&self, vfs_path: &str) -> Result<Vec<u8>, AdapterError> {
        self.controller.read_bytes(vfs_path)
    }

    pub fn structured_data(&self) -> Value {
        self.controller.structured_data()
    }

    pub fn shutdown(&mut self) {
        self.controller.shutdown();
    }
}

/// In-memory double standing in for the real native binding (out of scope
/// per spec §1). Enough state to exercise `goto`/`status`/VFS handlers in
/// tests without a real `.rdc` file or GPU.
pub struct MockReplayLibrary {
    capture: Option<PathBuf>,
    max_eid: i64,
    current_eid: i64,
}

impl MockReplayLibrary {
    pub fn new(max_eid: i64) -> Self {
        Self { capture: None, max_eid, current_eid: 0 }
    }
}

impl ReplayLibrary for MockReplayLibrary {
    fn open(&mut self, capture: &Path) -> Result<(), AdapterError> {
        self.capture = Some(capture.to_path_buf());
        Ok(())
    }

    fn max_eid(&self) -> i64 {
        self.max_eid
    }

    fn current_eid(&self) -> i64 {
        self.current_eid
    }

    fn set_current_eid(&mut self, eid: i64) {
        self.current_eid = eid;
    }

    fn root_actions_legacy(&self) -> Vec<Value> {
        (0..=self.max_eid).map(|eid| serde_json::json!({ "eid": eid })).collect()
    }

    fn pipeline_state(&self, eid: i64) -> Value {
        serde_json::json!({ "eid": eid, "shaders": [] })
    }

    fn resources(&self) -> Value {
        serde_json::json!({ "resources": [] })
    }

    fn textures(&self) -> Value {
        serde_json::json!({ "textures": [] })
    }

    fn buffers(&self) -> Value {
        serde_json::json!({ "buffers": [] })
    }

    fn read_bytes(&self, vfs_path: &str) -> Result<Vec<u8>, AdapterError> {
        Err(AdapterError::UnknownPath(vfs_path.to_string()))
    }

    fn structured_data(&self) -> Value {
        serde_json::json!({})
    }

    fn shutdown(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(version: (u32, u32)) -> ReplayAdapter {
        ReplayAdapter::new(Box::new(MockReplayLibrary::new(10)), version)
    }

    #[test]
    fn goto_within_range_updates_current_eid() {
        let mut adapter = adapter((1, 30));
        adapter.goto(5, false).unwrap();
        assert_eq!(adapter.current_eid(), 5);
    }

    #[test]
    fn goto_out_of_range_is_rejected_and_does_not_mutate_state() {
        let mut adapter = adapter((1, 30));
        adapter.goto(3, false).unwrap();
        let err = adapter.goto(999, false).unwrap_err();
        assert!(matches!(err, AdapterError::EidOutOfRange { eid: 999, max_eid: 10 }));
        assert_eq!(adapter.current_eid(), 3);
    }

    #[test]
    fn goto_rejects_negative_eid() {
        let mut adapter = adapter((1, 30));
        let err = adapter.goto(-1, false).unwrap_err();
        assert!(matches!(err, AdapterError::EidOutOfRange { eid: -1, .. }));
    }

    #[test]
    fn root_actions_uses_legacy_name_below_rename_version() {
        let adapter = adapter((1, 31));
        assert_eq!(adapter.root_actions().len(), 11);
    }

    #[test]
    fn root_actions_uses_current_name_at_and_above_rename_version() {
        let adapter = adapter((1, 32));
        assert_eq!(adapter.root_actions().len(), 11);
    }
}
