// Daemon server (C4): a single-threaded, sequential JSON-RPC loop bound to
// loopback. Deliberately NOT `tokio::spawn`-per-connection like a typical
// async server (the teacher's `serve_unix` does that) — the replay
// controller behind every handler is exclusive-use and not re-entrant
// (§4.4, §5), so a serial accept loop removes an entire class of races
// instead of needing lock design.

use anyhow::{Context, Result};
use rdc_common::protocol::jsonrpc::{
    Request, RequestId, Response, RpcError, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
    UNAUTHORIZED,
};
use rdc_common::protocol::rpc_methods::requires_auth;
use rdc_common::protocol::transport::{read_line, TransportError};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::handlers::{registry, DaemonState};

/// Accept connections one at a time; each connection is read, dispatched,
/// answered, and closed before the next `accept()` (§4.4). Returns once a
/// `shutdown` RPC has been answered.
pub async fn serve(listener: TcpListener, state: &mut DaemonState) -> Result<()> {
    let handlers = registry();

    loop {
        let (stream, peer) = listener.accept().await.context("failed to accept rpc connection")?;
        if !peer.ip().is_loopback() {
            warn!(%peer, "rejected non-loopback rpc connection");
            continue;
        }

        match serve_one_request(stream, state, &handlers).await {
            Ok(keep_running) => {
                if !keep_running {
                    info!("daemon shutting down after `shutdown` rpc");
                    return Ok(());
                }
            }
            Err(error) => warn!(?error, "rpc connection failed"),
        }
    }
}

async fn serve_one_request(
    stream: tokio::net::TcpStream,
    state: &mut DaemonState,
    handlers: &std::collections::HashMap<&'static str, crate::handlers::HandlerFn>,
) -> Result<bool> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let line = match read_line(&mut reader).await {
        Ok(line) => line,
        Err(TransportError::Oversize) => {
            let response = Response::err(RequestId::Null, PARSE_ERROR, "request line too large");
            write_response(&mut write_half, &response, None).await?;
            return Ok(true);
        }
        Err(error) => return Err(error.into()),
    };

    if line.is_empty() {
        return Ok(true);
    }

    let request: Request = match serde_json::from_str(&line) {
        Ok(request) => request,
        Err(error) => {
            let response = Response::error(
                RequestId::Null,
                RpcError {
                    code: PARSE_ERROR,
                    message: "parse error".to_string(),
                    data: Some(serde_json::json!({ "reason": error.to_string() })),
                },
            );
            write_response(&mut write_half, &response, None).await?;
            return Ok(true);
        }
    };

    if request.jsonrpc != "2.0" {
        let response =
            Response::err(request.id, INVALID_REQUEST, "invalid request: expected jsonrpc 2.0");
        write_response(&mut write_half, &response, None).await?;
        return Ok(true);
    }

    if requires_auth(&request.method) && !token_matches(&request.params, &state.token) {
        let response = Response::err(request.id, UNAUTHORIZED, "unauthorized");
        write_response(&mut write_half, &response, None).await?;
        return Ok(true);
    }

    let handler = match handlers.get(request.method.as_str()) {
        Some(handler) => handler,
        None => {
            let response = Response::err(request.id, METHOD_NOT_FOUND, "method not found");
            write_response(&mut write_half, &response, None).await?;
            return Ok(true);
        }
    };

    let outcome = handler(request.id, request.params, state);
    write_response(&mut write_half, &outcome.response, outcome.binary_payload.as_deref()).await?;
    Ok(outcome.keep_running)
}

async fn write_response(
    write_half: &mut tokio::net::tcp::OwnedWriteHalf,
    response: &Response,
    binary_payload: Option<&[u8]>,
) -> Result<()> {
    let mut response = response.clone();
    if let (Some(payload), Some(result)) = (binary_payload, response.result.as_mut()) {
        if let Some(object) = result.as_object_mut() {
            object.insert("_binary_size".to_string(), serde_json::json!(payload.len()));
        }
    }

    let mut encoded = serde_json::to_vec(&response).context("failed to encode rpc response")?;
    encoded.push(b'\n');
    write_half.write_all(&encoded).await.context("failed to write rpc response")?;

    if let Some(payload) = binary_payload {
        write_half.write_all(payload).await.context("failed to write binary payload")?;
    }
    write_half.flush().await.context("failed to flush rpc response")?;
    Ok(())
}

fn token_matches(params: &Option<serde_json::Value>, expected: &str) -> bool {
    let provided = params.as_ref().and_then(|p| p.get("_token")).and_then(|v| v.as_str());
    match provided {
        Some(provided) => constant_time_eq(provided.as_bytes(), expected.as_bytes()),
        None => false,
    }
}

/// Constant-time byte comparison (§4.4: "constant-time compare preferred").
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
