use thiserror::Error;

use crate::db::StoreError;
use crate::models::NormalizeError;

/// Everything that is not a store rejection. The dispatcher turns any of these
/// into the generic 400 response; the message is only ever logged.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("malformed event: {0}")]
    Event(serde_json::Error),

    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("number {0} cannot be stored as a decimal")]
    InvalidNumber(String),

    #[error("response body could not be serialized: {0}")]
    Response(serde_json::Error),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type AppResult<T> = Result<T, AppError>;
