//! Canonical JSON encoding/decoding of [`MessageExchange`].
//!
//! Decode rejection is non-fatal by design: the caller logs and drops the
//! offending payload rather than propagating the error further than the
//! dispatcher (spec §4.1).

use crate::error::{Error, Result};
use crate::models::MessageExchange;

/// Serialize a message to its canonical wire form.
pub fn encode(message: &MessageExchange) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}

/// Parse and structurally validate a wire payload.
///
/// Any of: malformed JSON, a missing required field, an unrecognized
/// `type`, a non-UUID identifier, or a non-aware timestamp surface as
/// [`Error::Decode`]. Callers are expected to log at `error!` and drop the
/// message rather than propagate this further (see `coordinator.rs`).
pub fn decode(payload: &str) -> Result<MessageExchange> {
    serde_json::from_str(payload).map_err(Error::from)
}
