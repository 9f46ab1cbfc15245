// Filesystem permission hardening, re-exported from rdc-common::fs_perms
// since the session store (shared with the CLI) needs the same guarantee
// for the files it writes under `~/.rdc/`.

pub use rdc_common::fs_perms::{ensure_owner_only_dir, ensure_owner_only_file};
