use thiserror::Error;

/// Why a report could not be read through the structured path.
///
/// Never surfaced by [`crate::dispatch`]; it only decides whether the
/// free-text grammar runs instead.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("no structured payload (no opening brace)")]
    NoPayload,

    #[error("structured payload is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("structured payload is not an object")]
    NotAnObject,

    #[error("embedded value has none of the report keys")]
    UnrecognizedPayload,
}
