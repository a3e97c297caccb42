use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use notecab_shared::{CabinetNameError, ErrorBody};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    InvalidName(#[from] CabinetNameError),
    #[error("A cabinet named \"{0}\" already exists")]
    DuplicateCabinet(String),
    #[error("Cabinet {0} not found")]
    CabinetNotFound(Uuid),
    #[error("Note {0} not found")]
    NoteNotFound(Uuid),
    #[error("{0}")]
    BadRequest(String),
    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::InvalidName(_) | ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::DuplicateCabinet(_) => StatusCode::CONFLICT,
            ServerError::CabinetNotFound(_) | ServerError::NoteNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
