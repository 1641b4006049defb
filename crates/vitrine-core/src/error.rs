//! Error types for `vitrine-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("username is required")]
  MissingUsername,

  #[error("tag name is required")]
  MissingTagName,

  #[error("invalid tag color {0:?}: expected #rgb or #rrggbb")]
  InvalidColor(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
