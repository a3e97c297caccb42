use notecab_shared::{CabinetNameError, NoteKind};
use thiserror::Error;
use uuid::Uuid;

/// Failure talking to the notes backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    /// Non-success HTTP status. `message` is the server's `{error}` text when
    /// the body carried one.
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error(transparent)]
    InvalidName(#[from] CabinetNameError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("position {index} is out of range for {len} notes")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("cabinet {0} is not loaded")]
    UnknownCabinet(Uuid),
    #[error("note {0} is not loaded")]
    UnknownNote(Uuid),
    #[error("note {id} is a {actual:?} note, not {expected:?}")]
    WrongKind {
        id: Uuid,
        expected: NoteKind,
        actual: NoteKind,
    },
}
