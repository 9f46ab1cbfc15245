// JSON-RPC server: method dispatch over a loopback TCP socket.

pub mod tcp;
pub mod trace;
