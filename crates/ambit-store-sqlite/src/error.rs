//! Error type for `ambit-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain rule rejected the operation (duplicate edge, last active
  /// assignment, unknown role, ...). Carries the core taxonomy so callers
  /// can map variants without string matching.
  #[error("core error: {0}")]
  Core(#[from] ambit_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored enum column held a value outside its taxonomy.
  #[error("column decode error: {0}")]
  Decode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
