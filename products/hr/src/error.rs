use platform_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HrError {
    #[error(transparent)]
    Store(#[from] DbError),
    #[error("failed to encode employee list: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("unknown status {0:?}")]
    UnknownStatus(String),
    #[error("unknown department {0:?}")]
    UnknownDepartment(String),
}

pub type HrResult<T> = Result<T, HrError>;
