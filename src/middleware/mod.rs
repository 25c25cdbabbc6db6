use actix_session::{Session, SessionExt};
use actix_web::{dev, error::InternalError, web, FromRequest, HttpRequest, HttpResponse};
use serde::Serialize;
use std::future::{ready, Ready};

use crate::session_store::SessionStore;
use crate::AppState;

pub const LOGIN_PATH: &str = "/login";

/// The signed-in admin, available to any handler behind the console gate.
#[derive(Serialize, Debug, Clone)]
pub struct AuthenticatedAdmin {
    pub uid: String,
    pub email: String,
}

pub fn redirect_to(location: &str) -> HttpResponse {
    HttpResponse::Found().append_header(("location", location)).finish()
}

/// True when this browser's cookie belongs to the process-wide session and
/// that session is a settled admin session.
pub fn admin_guard(session: &Session, store: &SessionStore) -> bool {
    let cookie_uid = session.get::<String>("uid").unwrap_or(None);
    match (cookie_uid, store.admin_uid()) {
        (Some(cookie_uid), Some(admin_uid)) => cookie_uid == admin_uid,
        _ => false,
    }
}

impl FromRequest for AuthenticatedAdmin {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let session = req.get_session();
        let admin = req.app_data::<web::Data<AppState>>().and_then(|state| {
            if !admin_guard(&session, &state.session) {
                return None;
            }
            state.session.snapshot().user.map(|user| AuthenticatedAdmin {
                uid: user.uid,
                email: user.email,
            })
        });

        match admin {
            Some(admin) => ready(Ok(admin)),
            None => ready(Err(InternalError::from_response("Login required.", redirect_to(LOGIN_PATH)).into())),
        }
    }
}
