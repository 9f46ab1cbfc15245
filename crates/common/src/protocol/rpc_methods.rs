// RPC method name constants — the catalog from spec §4.2, plus `vfs_read`:
// §4.10 describes VFS leaves as reachable by "a second round-trip that
// targets the handler directly" without naming the RPC method that performs
// it, so we give that round-trip one concrete method rather than dispatching
// on dynamic path strings as if they were method names.
//
// The daemon's handler registry (rdc-daemon::handlers) must provide every
// one of these; rdc-cli only grows a leaf subcommand for a handful of them
// (open/close/status/goto/diff), but every method here is reachable by
// hand-building a request with `DaemonClient::call`.

pub const PING: &str = "ping";
pub const STATUS: &str = "status";
pub const SHUTDOWN: &str = "shutdown";
pub const GOTO: &str = "goto";
pub const COUNT: &str = "count";
pub const SHADER_MAP: &str = "shader_map";
pub const CAPTURE_THUMBNAIL: &str = "capture_thumbnail";
pub const CAPTURE_GPUS: &str = "capture_gpus";
pub const CAPTURE_SECTIONS: &str = "capture_sections";
pub const CAPTURE_SECTION_CONTENT: &str = "capture_section_content";
pub const PIXEL_HISTORY: &str = "pixel_history";
pub const TEX_STATS: &str = "tex_stats";
pub const SEARCH: &str = "search";
pub const VFS_LS: &str = "vfs_ls";
pub const VFS_READ: &str = "vfs_read";
pub const SCRIPT: &str = "script";

/// Every method the daemon's handler registry must answer.
pub const IMPLEMENTED_METHODS: &[&str] = &[
    PING,
    STATUS,
    SHUTDOWN,
    GOTO,
    COUNT,
    SHADER_MAP,
    CAPTURE_THUMBNAIL,
    CAPTURE_GPUS,
    CAPTURE_SECTIONS,
    CAPTURE_SECTION_CONTENT,
    PIXEL_HISTORY,
    TEX_STATS,
    SEARCH,
    VFS_LS,
    VFS_READ,
    SCRIPT,
];

/// `ping` is the only method exempt from `_token` authentication (§4.2).
pub fn requires_auth(method: &str) -> bool {
    method != PING
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_is_the_only_unauthenticated_method() {
        assert!(!requires_auth(PING));
        for method in IMPLEMENTED_METHODS.iter().filter(|m| **m != PING) {
            assert!(requires_auth(method), "{method} should require a token");
        }
    }

    #[test]
    fn implemented_methods_has_no_duplicates() {
        let mut sorted = IMPLEMENTED_METHODS.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), IMPLEMENTED_METHODS.len());
    }
}
