//! Common error types for shadow operations

use core::fmt;

/// Failure at the boundary between Rust values and native state text.
///
/// Decode errors carry the position reported by the JSON parser; the other
/// variants only name the step that failed.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// A non-empty state blob from the native layer was not valid JSON.
    Decode {
        /// Line of the first offending character (1-based).
        line: usize,
        /// Column of the first offending character (1-based).
        column: usize,
    },
    /// A state blob from the native layer was not valid UTF-8.
    InvalidUtf8,
    /// An event arrived while the handler was still running.
    Reentrant,
    /// A state document could not be serialized.
    Encode,
    /// A serialized state document did not fit the update buffer.
    BufferOverflow,
    /// A serialized state document contained a NUL byte.
    InteriorNul,
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            Error::Decode {
                line: err.line(),
                column: err.column(),
            }
        } else {
            Error::Encode
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Decode { line, column } => {
                write!(f, "malformed state JSON at line {line}, column {column}")
            }
            Error::InvalidUtf8 => f.write_str("state text is not valid UTF-8"),
            Error::Reentrant => f.write_str("state handler is already running"),
            Error::Encode => f.write_str("state could not be serialized"),
            Error::BufferOverflow => f.write_str("serialized state exceeds the update buffer"),
            Error::InteriorNul => f.write_str("serialized state contains a NUL byte"),
        }
    }
}

impl core::error::Error for Error {}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Decode { line, column } => {
                defmt::write!(f, "Decode {{ line: {}, column: {} }}", line, column)
            }
            Error::InvalidUtf8 => defmt::write!(f, "InvalidUtf8"),
            Error::Reentrant => defmt::write!(f, "Reentrant"),
            Error::Encode => defmt::write!(f, "Encode"),
            Error::BufferOverflow => defmt::write!(f, "BufferOverflow"),
            Error::InteriorNul => defmt::write!(f, "InteriorNul"),
        }
    }
}
