use actix_session::{Session, SessionExt};
use actix_web::{dev, FromRequest, HttpRequest};
use serde::Serialize;
use std::future::{ready, Ready};

/// Extractor for handlers behind the admin guard. The username doubles as
/// the approver id stamped into approval documents.
#[derive(Serialize)]
pub struct AuthenticatedAdmin {
    pub username: String,
}

impl FromRequest for AuthenticatedAdmin {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let session = req.get_session();
        if let (Ok(Some(username)), Ok(Some(role))) = (
            session.get::<String>("username"),
            session.get::<String>("role"),
        ) {
            if role == "admin" {
                return ready(Ok(AuthenticatedAdmin { username }));
            }
        }
        ready(Err(actix_web::error::ErrorUnauthorized("Not logged in.")))
    }
}

pub fn admin_guard(session: &Session) -> bool {
    session.get::<String>("role").unwrap_or(None) == Some("admin".to_string())
}
