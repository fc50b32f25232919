use kincare_db::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("User {0} not found")]
    UserNotFound(i64),

    #[error(transparent)]
    Storage(#[from] DbError),
}

pub type AgentResult<T> = Result<T, AgentError>;
