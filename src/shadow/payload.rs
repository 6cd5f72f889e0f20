//! JSON marshaling of shadow state documents.
//!
//! Two directions are covered here:
//!
//! - **Native to application**: the native layer hands over the `reported`
//!   and `desired` sections as raw JSON text. [`decode_state`] turns each into
//!   a [`Value`], mapping an empty blob to an empty object.
//! - **Application to native**: [`encode_state`] serializes a dynamic
//!   [`Value`] on the heap, while [`encode_typed`] serializes any
//!   [`Serialize`] type into a fixed-capacity [`heapless::String`] without
//!   allocating. Both produce NUL-terminated text ready for the C entry point.

#![deny(unsafe_code)]

use super::error::Error;
use alloc::ffi::CString;
use core::ffi::CStr;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Capacity of the buffer used by [`encode_typed`], including the trailing NUL.
pub const MAX_STATE_LEN: usize = 1024;

/// Decodes one state section received from the native layer.
///
/// An empty string means "no data" and yields an empty object. Anything else
/// must be well-formed JSON; corrupt input is reported as [`Error::Decode`]
/// instead of being replaced with empty data.
pub fn decode_state(text: &str) -> Result<Value, Error> {
    if text.is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    Ok(serde_json::from_str(text)?)
}

/// Serializes a dynamic state document into NUL-terminated JSON text.
pub fn encode_state(state: &Value) -> Result<CString, Error> {
    let json = serde_json::to_string(state).map_err(|_| Error::Encode)?;
    CString::new(json).map_err(|_| Error::InteriorNul)
}

/// Serializes a typed state document without touching the heap.
///
/// The returned buffer holds the JSON text followed by a NUL terminator; use
/// [`as_c_str`] to borrow it for the native call.
pub fn encode_typed<T: Serialize>(
    state: &T,
) -> Result<heapless::String<MAX_STATE_LEN>, Error> {
    let mut buf = [0u8; MAX_STATE_LEN];
    let len = serde_json_core::to_slice(state, &mut buf[..MAX_STATE_LEN - 1]).map_err(
        |err| match err {
            serde_json_core::ser::Error::BufferFull => Error::BufferOverflow,
            _ => Error::Encode,
        },
    )?;

    let json = core::str::from_utf8(&buf[..len]).map_err(|_| Error::Encode)?;
    let mut out = heapless::String::new();
    out.push_str(json).map_err(|_| Error::BufferOverflow)?;
    out.push('\0').map_err(|_| Error::BufferOverflow)?;
    Ok(out)
}

/// Borrows a buffer produced by [`encode_typed`] as a C string.
pub fn as_c_str(encoded: &heapless::String<MAX_STATE_LEN>) -> Result<&CStr, Error> {
    CStr::from_bytes_with_nul(encoded.as_bytes()).map_err(|_| Error::InteriorNul)
}

/// A state document carrying only the `reported` section.
///
/// Serializes as `{"reported": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reported<T> {
    /// State the device reports.
    pub reported: T,
}

/// A state document carrying only the `desired` section.
///
/// Serializes as `{"desired": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Desired<T> {
    /// State a controller asks the device to reach.
    pub desired: T,
}

/// A state document with optional `reported` and `desired` sections.
///
/// Absent sections are omitted from the serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowState<R, D> {
    /// State the device reports, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported: Option<R>,
    /// State a controller asks for, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired: Option<D>,
}

impl<R, D> ShadowState<R, D> {
    /// Creates a document with both sections present.
    pub fn new(reported: R, desired: D) -> Self {
        Self {
            reported: Some(reported),
            desired: Some(desired),
        }
    }
}

impl<R, D> Default for ShadowState<R, D> {
    fn default() -> Self {
        Self {
            reported: None,
            desired: None,
        }
    }
}
