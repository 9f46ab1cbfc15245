// CLI exit codes (§6.1/§7): just three, not the teacher's wider
// `{0,1,2,10,11,12,13}` set — spec.md's exit code space is exactly
// `{0, 1, 2}` and we follow it rather than the teacher's finer-grained
// scheme.
//
//   0 = success
//   1 = normal failure (daemon unreachable, rpc fault, no session, ...)
//   2 = input error (bad arguments, missing capture file, a diff that
//       never got both daemons ready, ...)

use std::process;

use crate::client::{daemon_unreachable, RpcFault};
use crate::diff_coordinator::DiffStartError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    Usage = 2,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn exit(self) -> ! {
        process::exit(self.code())
    }

    /// Map a command failure to an exit code. A `diff` that never got both
    /// daemons ready within its `--timeout` is a usage error (spec.md
    /// scenario 6: `diff A B --timeout 0.001` returns exit 2). Anything
    /// that reaches a daemon at all (an `RpcFault`, a reachable-but-erroring
    /// daemon) is a normal failure; a daemon that was never reachable is
    /// also a normal failure (§7: the CLI maps a failed liveness check to
    /// exit 1 with a `run 'rdc open <file>' first` hint, not a usage error).
    pub fn from_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if cause.downcast_ref::<DiffStartError>().is_some() {
                return Self::Usage;
            }
            if cause.downcast_ref::<RpcFault>().is_some() {
                return Self::Error;
            }
        }
        if daemon_unreachable(err) {
            return Self::Error;
        }
        Self::Error
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code.code() as u8)
    }
}
