// Ambient daemon configuration: the small set of knobs spec.md actually
// needs (session directory root, readiness polling schedule), grounded on
// the shape of the teacher's config layer but trimmed to what this core
// uses — there is no `~/.rdc/config.toml` because nothing in spec.md
// calls for one (we do not invent ambient config the spec doesn't need).

use std::path::PathBuf;
use std::time::Duration;

/// Total time budget for `rdc open`'s spawn-then-poll readiness loop
/// (spec §4.6: "polling with exponential backoff, total cap 30 s").
pub const SPAWN_READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Starting delay for the exponential backoff poll, doubling up to a cap.
pub const SPAWN_POLL_INITIAL_DELAY: Duration = Duration::from_millis(25);
pub const SPAWN_POLL_MAX_DELAY: Duration = Duration::from_millis(1000);

/// How long `rdc close` waits for a cooperative shutdown before escalating
/// to `SIGTERM`, and then `SIGKILL` (spec §4.6).
pub const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Default timeout for a single RPC exchange on the CLI side (§4.7).
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolve `$HOME`, the root every persisted path in spec §6.3 hangs off.
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}
