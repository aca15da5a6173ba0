use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdminError>;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error(transparent)]
    Ladder(#[from] storage::error::LadderError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
