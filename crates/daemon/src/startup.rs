// Daemon startup primitives: binding the loopback listener, minting the
// session token, and the readiness probe `rdc open` polls against. The
// daemon binds `127.0.0.1:0` (OS-assigned port) rather than the teacher's
// fixed Unix-socket path — there is no well-known rendezvous file here,
// the assigned port is learned once and written into the session record
// (§3, §4.4).

use std::net::SocketAddr;

use anyhow::{Context, Result};
use rand::RngCore;
use tokio::net::TcpListener;
use tracing::info;

/// Bind a loopback TCP listener on an OS-assigned port.
pub async fn bind_loopback() -> Result<TcpListener> {
    let listener = TcpListener::bind("127.0.0.1:0").await.context("failed to bind loopback socket")?;
    let addr = listener.local_addr().context("failed to read bound loopback address")?;
    info!(%addr, "daemon socket ready");
    Ok(listener)
}

/// Mint a fresh session token: 128 bits of randomness, rendered as 32
/// lowercase hex characters (spec §3, scenario 1).
pub fn mint_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Probe whether a daemon is listening (and, loosely, alive) at `addr` by
/// attempting a bare TCP connect. Used by the spawn-then-poll readiness
/// loop before a real `ping` RPC is attempted.
pub async fn is_reachable(addr: SocketAddr) -> bool {
    tokio::net::TcpStream::connect(addr).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_token_is_32_lowercase_hex_chars() {
        let token = mint_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn mint_token_is_not_constant() {
        assert_ne!(mint_token(), mint_token());
    }

    #[tokio::test]
    async fn bind_loopback_assigns_a_nonzero_port() {
        let listener = bind_loopback().await.unwrap();
        let addr = listener.local_addr().unwrap();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert!(addr.port() > 0);
    }

    #[tokio::test]
    async fn is_reachable_true_once_bound_false_once_dropped() {
        let listener = bind_loopback().await.unwrap();
        let addr = listener.local_addr().unwrap();
        assert!(is_reachable(addr).await);
        drop(listener);
        assert!(!is_reachable(addr).await);
    }
}
