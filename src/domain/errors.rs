//! Domain Errors

use crate::domain::user::MIN_PASSWORD_LEN;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("No such ID exists.")]
    NotFound,
    #[error("Username already exists.")]
    UsernameTaken,
    #[error("Password must be {min} or more characters.", min = MIN_PASSWORD_LEN)]
    PasswordTooShort,
    #[error("{op} unknown error: {detail}")]
    Unknown { op: &'static str, detail: String },
}

impl RepositoryError {
    pub fn unknown(op: &'static str, detail: impl ToString) -> Self {
        Self::Unknown {
            op,
            detail: detail.to_string(),
        }
    }
}
