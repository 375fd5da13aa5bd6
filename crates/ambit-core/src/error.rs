//! Error types for `ambit-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::policy::ClientAction;

#[derive(Debug, Error)]
pub enum Error {
  #[error("client not found: {0}")]
  ClientNotFound(Uuid),

  #[error("no assignment between client {client_id} and user {user_id}")]
  EdgeNotFound { client_id: Uuid, user_id: Uuid },

  #[error("user {user_id} is already assigned to client {client_id}")]
  DuplicateEdge { client_id: Uuid, user_id: Uuid },

  #[error("client {0} would carry more than one active primary assignment")]
  DuplicatePrimary(Uuid),

  #[error("client {0} would be left without an active assignment")]
  LastActiveAssignment(Uuid),

  #[error("unknown assignment role: {0:?}")]
  InvalidRole(String),

  #[error("unknown role code: {0:?}")]
  UnknownRoleCode(String),

  #[error("not authorized: {action}")]
  Unauthorized { action: ClientAction },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
