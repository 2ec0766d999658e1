//! Error kinds surfaced by the layout pipeline.
//!
//! Only conditions the caller has to decide about are errors. Output-buffer
//! exhaustion, a renderer target that is too small, empty input and an
//! infeasible optimal breaking are all handled where they occur.

use core::fmt;
use std::collections::TryReserveError;

/// Layout pipeline error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutError {
    /// Growing an internal buffer failed.
    Allocation {
        /// Buffer that failed to grow.
        what: &'static str,
        /// Additional elements/bytes that were requested.
        requested: usize,
    },
    /// Content width (terminal width minus margins) is below the supported minimum.
    WidthTooSmall {
        /// Effective content width.
        width: usize,
        /// Minimum supported content width.
        min: usize,
    },
    /// A serialized configuration could not be parsed.
    Config(String),
}

impl LayoutError {
    pub(crate) fn allocation(
        what: &'static str,
        requested: usize,
    ) -> impl FnOnce(TryReserveError) -> Self {
        move |_| Self::Allocation { what, requested }
    }
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allocation { what, requested } => {
                write!(f, "layout failed: could not grow {} by {}", what, requested)
            }
            Self::WidthTooSmall { width, min } => write!(
                f,
                "layout width too small: content width {} (minimum {})",
                width, min
            ),
            Self::Config(message) => write!(f, "invalid layout config: {}", message),
        }
    }
}

impl std::error::Error for LayoutError {}

impl From<serde_json::Error> for LayoutError {
    fn from(value: serde_json::Error) -> Self {
        Self::Config(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_error_names_the_buffer() {
        let err = LayoutError::Allocation {
            what: "document text",
            requested: 4096,
        };
        assert_eq!(
            err.to_string(),
            "layout failed: could not grow document text by 4096"
        );
    }

    #[test]
    fn try_reserve_failure_maps_to_allocation() {
        let mut v: Vec<u8> = Vec::new();
        let err = v
            .try_reserve(usize::MAX)
            .map_err(LayoutError::allocation("items", usize::MAX))
            .unwrap_err();
        assert!(matches!(err, LayoutError::Allocation { what: "items", .. }));
    }
}
