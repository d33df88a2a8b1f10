//! Input decoder: one JSON document per stream, terminated by EOF.

use std::io::Read;

use crate::error::DecodeError;
use crate::event::ToolInvocationEvent;

/// Default upper bound on the payload size.
pub const DEFAULT_MAX_BYTES: usize = 1024 * 1024;

/// Read the whole stream (up to `max_bytes`) and decode it.
pub fn read_event<R: Read>(reader: R, max_bytes: usize) -> Result<ToolInvocationEvent, DecodeError> {
    let mut buf = Vec::new();
    // One extra byte tells an exactly-full payload apart from an oversized one.
    reader
        .take(max_bytes as u64 + 1)
        .read_to_end(&mut buf)?;
    if buf.len() > max_bytes {
        return Err(DecodeError::TooLarge { limit: max_bytes });
    }
    decode(&buf)
}

/// Decode a complete payload. Pure: the same bytes always yield the same event.
pub fn decode(bytes: &[u8]) -> Result<ToolInvocationEvent, DecodeError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeError::Empty);
    }

    let doc: serde_json::Value = serde_json::from_slice(bytes)?;
    if !doc.is_object() {
        return Err(DecodeError::NotAnObject {
            found: json_kind(&doc),
        });
    }

    Ok(ToolInvocationEvent::from_value(&doc))
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
