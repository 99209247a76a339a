//! Schema codec error types

use thiserror::Error;

/// Errors reported by the schema codecs.
///
/// All errors are terminal for the call that produced them; the codec never
/// retries internally and never returns a partially-built document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DefError {
    /// Version number or size tag outside the supported set.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Structural invariant violated: truncated buffer, byte-count/array
    /// mismatch, malformed suffix, unknown type name.
    #[error("corrupt schema: {0}")]
    CorruptSchema(String),

    /// Pre-write validation failed. `field` is the index of the offending
    /// field, or `None` for document-level violations.
    #[error("validation failed{}: {reason}", field_label(.field))]
    ValidationFailed {
        /// Index of the offending field, if any.
        field: Option<usize>,
        /// Human-readable description of the violation.
        reason: String,
    },
}

impl DefError {
    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        DefError::UnsupportedFormat(msg.into())
    }

    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        DefError::CorruptSchema(msg.into())
    }
}

fn field_label(field: &Option<usize>) -> String {
    match *field {
        Some(i) => format!(" at field {i}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            DefError::unsupported("unknown version 105").to_string(),
            "unsupported format: unknown version 105"
        );
        assert_eq!(
            DefError::corrupt("truncated field record").to_string(),
            "corrupt schema: truncated field record"
        );
        assert_eq!(
            DefError::ValidationFailed {
                field: Some(3),
                reason: "internal name may not be empty".to_string(),
            }
            .to_string(),
            "validation failed at field 3: internal name may not be empty"
        );
        assert_eq!(
            DefError::ValidationFailed {
                field: None,
                reason: "param type may not be empty".to_string(),
            }
            .to_string(),
            "validation failed: param type may not be empty"
        );
    }
}
