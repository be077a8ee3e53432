use thiserror::Error;

/// Domain failures raised by the analysis stages.
///
/// Everything else (I/O, HTTP, workbook writes) travels as `anyhow::Error`.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("malformed {field} coordinates {raw:?}: {reason}")]
    Coordinate {
        field: &'static str,
        raw: String,
        reason: String,
    },

    #[error("pattern #{requested} requested but only {found} patterns were mined")]
    PatternIndex { requested: usize, found: usize },

    #[error("value {value:?} is not in the {column} encoding table")]
    UnknownCategory { column: &'static str, value: String },

    #[error("{column} encoding must be zero padded to build tokens")]
    UnpaddedEncoding { column: &'static str },
}
