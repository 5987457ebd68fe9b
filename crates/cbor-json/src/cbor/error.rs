use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CborError {
    #[error("invalid cbor payload: {0}")]
    InvalidPayload(String),
    #[error("unexpected end of cbor input at offset {0}")]
    UnexpectedEof(usize),
    #[error("{0} trailing bytes after the cbor value")]
    TrailingBytes(usize),
    #[error("cbor nesting exceeds the limit of {0} levels")]
    DepthLimit(usize),
    #[error("unsupported cbor feature: {0}")]
    Unsupported(String),
}

impl CborError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        CborError::InvalidPayload(reason.into())
    }
}
