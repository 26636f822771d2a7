use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ServiceError {
    #[error("You are not authenticated. Please login again.")]
    NotAuthenticated,

    #[error("Please select a date.")]
    InvalidDate,

    #[error("{0}")]
    InvalidUpload(String),

    #[error("No results to send. Please find birthdays first.")]
    NothingToSend,
}
