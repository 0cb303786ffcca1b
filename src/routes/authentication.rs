use std::convert::Infallible;
use std::future;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, instrument, warn};
use warp::http::{header::SET_COOKIE, Uri};
use warp::{Filter, Reply};

use crate::routes::page::{self, Notice};
use crate::store::{AuthGate, Backend};
use crate::types::account::{Credentials, Grant, Session};

pub const SESSION_COOKIE: &str = "note_board_session";

/// Sessions never outlive a day, whatever the auth service grants.
const MAX_SESSION_SECS: i64 = 24 * 60 * 60;

/// PASETO v2 local key sealing the session cookie.
#[derive(Clone)]
pub struct SessionKey(Arc<Vec<u8>>);

impl SessionKey {
    pub fn new(key: &[u8]) -> Self {
        SessionKey(Arc::new(key.to_vec()))
    }
}

pub fn issue_token(key: &SessionKey, user_name: &str, grant: &Grant) -> Result<(String, i64), handle_errors::Error> {
    let lifetime = grant.expires_in.clamp(0, MAX_SESSION_SECS);
    let now = Utc::now();
    let exp = now + Duration::seconds(lifetime);

    let token = paseto::tokens::PasetoBuilder::new()
        .set_encryption_key(&key.0[..])
        .set_expiration(&exp)
        .set_not_before(&now)
        .set_claim("user_name", serde_json::json!(user_name))
        .set_claim("access_token", serde_json::json!(grant.access_token))
        .build()
        .map_err(|_| handle_errors::Error::CannotIssueToken)?;
    Ok((token, lifetime))
}

pub fn verify_token(key: &SessionKey, token: &str) -> Result<Session, handle_errors::Error> {
    let token = paseto::tokens::validate_local_token(
        token,
        None, // footer
        &key.0[..],
        &paseto::tokens::TimeBackend::Chrono,
    )
    .map_err(|_| handle_errors::Error::CannotDecryptToken)?;

    serde_json::from_value::<Session>(token).map_err(|_| handle_errors::Error::CannotDecryptToken)
}

fn session_cookie(token: &str, max_age: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age
    )
}

/// The session of the request, `None` when the cookie is missing, forged or expired.
pub fn session(key: SessionKey) -> impl Filter<Extract = (Option<Session>,), Error = Infallible> + Clone {
    warp::cookie::optional::<String>(SESSION_COOKIE).map(move |token: Option<String>| {
        token.and_then(|token| verify_token(&key, &token).ok())
    })
}

/// Lets the request through only with a valid session.
pub fn auth(key: SessionKey) -> impl Filter<Extract = (Session,), Error = warp::Rejection> + Clone {
    session(key).and_then(|session: Option<Session>| {
        future::ready(session.ok_or_else(|| warp::reject::custom(handle_errors::Error::Unauthorized)))
    })
}

/// Seals the grant into the cookie and sends the browser to the board.
fn start_session(key: &SessionKey, user_name: &str, grant: &Grant) -> Result<warp::reply::Response, warp::Rejection> {
    let (token, max_age) = issue_token(key, user_name, grant).map_err(warp::reject::custom)?;
    Ok(warp::reply::with_header(
        warp::redirect::see_other(Uri::from_static("/")),
        SET_COOKIE,
        session_cookie(&token, max_age),
    )
    .into_response())
}

fn refused(e: handle_errors::Error) -> warp::reply::Response {
    let notice = Notice::Error(e.to_string());
    warp::reply::with_status(warp::reply::html(page::sign_in_page(Some(&notice))), e.status()).into_response()
}

pub async fn sign_in<B: Backend>(
    credentials: Credentials,
    backend: B,
    key: SessionKey,
) -> Result<warp::reply::Response, warp::Rejection> {
    match backend.auth().sign_in(&credentials).await {
        Ok(grant) => {
            info!("成功登入：{}", credentials.user_name);
            start_session(&key, &credentials.user_name, &grant)
        }
        Err(e @ handle_errors::Error::WrongPassword) => Ok(refused(e)),
        Err(e) => Err(warp::reject::custom(e)),
    }
}

pub async fn sign_up<B: Backend>(
    credentials: Credentials,
    backend: B,
    key: SessionKey,
) -> Result<warp::reply::Response, warp::Rejection> {
    match backend.auth().sign_up(&credentials).await {
        Ok(grant) => {
            info!("成功註冊：{}", credentials.user_name);
            start_session(&key, &credentials.user_name, &grant)
        }
        Err(e @ handle_errors::Error::UserNameTaken) => Ok(refused(e)),
        Err(e) => Err(warp::reject::custom(e)),
    }
}

/// Ends the hosted session and always drops the cookie, even when the auth service fails.
#[instrument(skip_all, fields(user_name = %session.user_name))]
pub async fn sign_out<B: Backend>(session: Session, backend: B) -> Result<warp::reply::Response, warp::Rejection> {
    if let Err(e) = backend.auth().sign_out(&session.access_token).await {
        warn!("auth service refused sign out: {}", e);
    }
    Ok(warp::reply::with_header(
        warp::redirect::see_other(Uri::from_static("/")),
        SET_COOKIE,
        session_cookie("", 0),
    )
    .into_response())
}
