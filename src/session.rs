// src/session.rs
//! Signed-in user resolution.
//!
//! Authentication happens upstream; the authenticating proxy forwards the
//! user id in the `X-User-Id` header and this guard only reads it.

use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use tracing::warn;

pub const USER_ID_HEADER: &str = "X-User-Id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: String,
}

impl SessionUser {
    pub fn id(&self) -> &str {
        &self.user_id
    }
}

#[derive(Debug)]
pub enum SessionError {
    MissingUser,
}

impl SessionError {
    pub fn message(&self) -> &'static str {
        match self {
            SessionError::MissingUser => "Unauthorized",
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SessionUser {
    type Error = SessionError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match req
            .headers()
            .get_one(USER_ID_HEADER)
            .map(str::trim)
            .filter(|id| !id.is_empty())
        {
            Some(user_id) => Outcome::Success(SessionUser {
                user_id: user_id.to_string(),
            }),
            None => {
                warn!("Request to {} without a session user", req.uri());
                Outcome::Error((Status::Unauthorized, SessionError::MissingUser))
            }
        }
    }
}
