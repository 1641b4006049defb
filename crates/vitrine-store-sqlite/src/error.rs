//! Error type for `vitrine-store-sqlite`.

use thiserror::Error;
use vitrine_core::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("username {0:?} is already registered")]
  UsernameTaken(String),

  #[error("tag {0:?} already exists")]
  TagNameTaken(String),

  #[error("tag not found: {0}")]
  UnknownTag(uuid::Uuid),
}

impl StoreError for Error {
  fn is_rejection(&self) -> bool {
    matches!(
      self,
      Error::UsernameTaken(_) | Error::TagNameTaken(_) | Error::UnknownTag(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
