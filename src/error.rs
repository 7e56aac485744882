use crate::replication::Role;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("key not found")]
    KeyNotFound,

    #[error("writes are only accepted by the leader, this node is a {role}")]
    NotLeader { role: Role },

    #[error("key must not be empty")]
    EmptyKey,

    #[error("request must carry a 'value' field")]
    MissingValue,

    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

impl From<Error> for tonic::Status {
    fn from(err: Error) -> Self {
        match err {
            Error::KeyNotFound => tonic::Status::not_found(err.to_string()),
            Error::NotLeader { .. } => tonic::Status::failed_precondition(err.to_string()),
            Error::EmptyKey | Error::MissingValue => {
                tonic::Status::invalid_argument(err.to_string())
            }
            Error::Transport(_) => tonic::Status::unavailable(err.to_string()),
        }
    }
}
