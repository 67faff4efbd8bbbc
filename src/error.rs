use rocket::{
    http::{Status, StatusClass},
    response::Responder,
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while handling a request.
///
/// Validation failures carry a human-readable message that is rendered
/// verbatim as the response body; storage and token failures map to opaque
/// server errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The voter already has a vote record; ballots are accepted at most once.
    #[error("You have already voted")]
    AlreadyVoted,
    /// The ballot does not cover every currently-defined position.
    #[error("Ballot is incomplete: {required} positions require a selection but {provided} were provided")]
    IncompleteBallot { required: usize, provided: usize },
    /// Admin tried to delete a vote that does not exist.
    #[error("No vote record found for user {0}")]
    VoteNotFound(String),
    #[error(transparent)]
    Db(#[from] mongodb::error::Error),
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    fn status(&self) -> Status {
        match self {
            Self::AlreadyVoted => Status::Conflict,
            Self::IncompleteBallot { .. } => Status::UnprocessableEntity,
            Self::VoteNotFound(_) | Self::NotFound(_) => Status::NotFound,
            Self::BadRequest(_) => Status::BadRequest,
            Self::Unauthorized(_) => Status::Unauthorized,
            Self::Db(_) | Self::Jwt(_) => Status::InternalServerError,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        match status.class() {
            StatusClass::ServerError => error!("{self:?}"),
            _ => warn!("{self}"),
        }
        // The UI renders the message verbatim, so put it in the body.
        let body = self.to_string().respond_to(req)?;
        rocket::response::Response::build_from(body)
            .status(status)
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(Error::AlreadyVoted.status(), Status::Conflict);
        assert_eq!(
            Error::IncompleteBallot {
                required: 3,
                provided: 1
            }
            .status(),
            Status::UnprocessableEntity
        );
        assert_eq!(
            Error::VoteNotFound("abc".to_string()).status(),
            Status::NotFound
        );
    }

    #[test]
    fn incomplete_ballot_message_states_counts() {
        let msg = Error::IncompleteBallot {
            required: 4,
            provided: 2,
        }
        .to_string();
        assert!(msg.contains('4'));
        assert!(msg.contains('2'));
    }
}
