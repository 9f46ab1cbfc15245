// JSON-RPC client over loopback TCP (C7), grounded on
// `scriptum-cli::client::DaemonClient` — same atomic request-id counter,
// same `with_timeout` builder, same private wire-shape structs — adapted
// from `UnixStream` to `TcpStream` and, deliberately, *not* retried: the
// teacher retries once on a dropped connection, but spec.md's shutdown law
// (a second call after `shutdown` is a bare transport error) would be
// masked by an automatic retry, so this client makes exactly one attempt
// per call.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use rdc_common::protocol::jsonrpc::{Request, RequestId, Response};
use rdc_common::protocol::transport::{binary_size_of, read_exact_n, read_line};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug)]
pub struct DaemonUnreachable {
    addr: SocketAddr,
    source: io::Error,
}

impl fmt::Display for DaemonUnreachable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "daemon is not reachable at {}", self.addr)
    }
}

impl std::error::Error for DaemonUnreachable {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// A JSON-RPC fault surfaced by the daemon (`response.error`).
#[derive(Debug)]
pub struct RpcFault {
    pub code: i32,
    pub message: String,
}

impl fmt::Display for RpcFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "daemon reported error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for RpcFault {}

pub struct DaemonClient {
    addr: SocketAddr,
    token: String,
    timeout: Duration,
    next_id: AtomicI64,
}

impl DaemonClient {
    pub fn new(addr: SocketAddr, token: impl Into<String>) -> Self {
        Self {
            addr,
            token: token.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send `method` with `params` (the `_token` field is injected
    /// automatically), returning the decoded `result` value.
    pub async fn call(&self, method: &str, mut params: serde_json::Value) -> Result<serde_json::Value> {
        let (response, _binary) = self.call_raw(method, &mut params).await?;
        response.result.context("daemon response missing `result`")
    }

    /// Like `call`, but also returns the exact-length binary tail when the
    /// response's `result._binary_size` is present (§4.1, §4.10).
    pub async fn call_binary(
        &self,
        method: &str,
        mut params: serde_json::Value,
    ) -> Result<(serde_json::Value, Option<Vec<u8>>)> {
        let (response, binary) = self.call_raw(method, &mut params).await?;
        let result = response.result.context("daemon response missing `result`")?;
        Ok((result, binary))
    }

    async fn call_raw(
        &self,
        method: &str,
        params: &mut serde_json::Value,
    ) -> Result<(Response, Option<Vec<u8>>)> {
        if let serde_json::Value::Object(map) = params {
            map.insert("_token".to_string(), serde_json::Value::String(self.token.clone()));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = Request::new(method, Some(params.clone()), RequestId::Number(id));

        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(self.addr))
            .await
            .context("timed out connecting to daemon")?
            .map_err(|source| DaemonUnreachable { addr: self.addr, source })
            .with_context(|| format!("failed to connect to daemon at {}", self.addr))?;

        let (read_half, mut write_half) = stream.into_split();
        let mut encoded = serde_json::to_vec(&request).context("failed to encode json-rpc request")?;
        encoded.push(b'\n');

        tokio::time::timeout(self.timeout, write_half.write_all(&encoded))
            .await
            .context("timed out writing json-rpc request")?
            .context("failed writing json-rpc request")?;
        tokio::time::timeout(self.timeout, write_half.flush())
            .await
            .context("timed out flushing json-rpc request")?
            .context("failed flushing json-rpc request")?;

        let mut reader = BufReader::new(read_half);
        let line = tokio::time::timeout(self.timeout, read_line(&mut reader))
            .await
            .context("timed out waiting for json-rpc response")?
            .context("failed reading json-rpc response")?;

        if line.is_empty() {
            anyhow::bail!("daemon closed the connection without a response");
        }

        let response: Response =
            serde_json::from_str(&line).context("failed to decode daemon response")?;

        if let Some(error) = &response.error {
            return Err(anyhow::Error::new(RpcFault { code: error.code, message: error.message.clone() }));
        }

        let binary_size = response.result.as_ref().and_then(binary_size_of);
        let binary = match binary_size {
            Some(size) => Some(
                tokio::time::timeout(self.timeout, read_exact_n(&mut reader, size))
                    .await
                    .context("timed out reading binary tail")?
                    .context("failed reading binary tail")?,
            ),
            None => None,
        };

        Ok((response, binary))
    }
}

pub fn daemon_unreachable(error: &anyhow::Error) -> bool {
    error.downcast_ref::<DaemonUnreachable>().is_some()
}
