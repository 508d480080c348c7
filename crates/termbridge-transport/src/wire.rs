//! Newline-delimited JSON framing for the host protocol.
//!
//! Each frame is one serde-tagged event followed by `\n`. The codec is the
//! only place the JSON shape of the protocol is observable; hosts on the
//! other end of a byte stream speak exactly these frames.

use serde::Serialize;

use termbridge_core::{ClientEvent, HostEvent, Result};

/// Encode one event as a newline-terminated JSON frame.
pub fn encode_frame<T: Serialize>(event: &T) -> Result<Vec<u8>> {
    let mut frame = serde_json::to_vec(event)?;
    frame.push(b'\n');
    Ok(frame)
}

/// Decode a client event from one frame line (without the trailing newline).
pub fn decode_client_event(line: &str) -> Result<ClientEvent> {
    Ok(serde_json::from_str(line)?)
}

/// Decode a host event from one frame line (without the trailing newline).
pub fn decode_host_event(line: &str) -> Result<HostEvent> {
    Ok(serde_json::from_str(line)?)
}
