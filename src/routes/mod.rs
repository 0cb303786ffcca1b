pub mod authentication;
pub mod note;
pub mod page;
pub mod submission;

use handle_errors::return_error;
use warp::Filter;

use crate::routes::authentication::SessionKey;
use crate::routes::submission::SubmissionLedger;
use crate::setup::Setup;
use crate::store::Backend;

/// Sign-in form bodies are tiny.
const MAX_FORM_BYTES: u64 = 16 * 1024;

/// The whole route tree, wired to `backend`.
pub fn build<B: Backend>(
    backend: B,
    setup: &Setup,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let key = SessionKey::new(setup.session_key.as_bytes());
    let ledger = SubmissionLedger::default();

    let backend_filter = warp::any().map(move || backend.clone());
    let ledger_filter = warp::any().map(move || ledger.clone());
    let key_filter = {
        let key = key.clone();
        warp::any().map(move || key.clone())
    };

    // path before method, so an unknown path is a 404 and not a 405
    let board = warp::path::end()
        .and(warp::get())
        .and(authentication::session(key.clone()))
        .and(backend_filter.clone())
        .and(ledger_filter.clone())
        .and_then(note::board_page::<B>);

    let sign_in = warp::path("sign_in")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_FORM_BYTES))
        .and(warp::body::form())
        .and(backend_filter.clone())
        .and(key_filter.clone())
        .and_then(authentication::sign_in::<B>);

    let sign_up = warp::path("sign_up")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_FORM_BYTES))
        .and(warp::body::form())
        .and(backend_filter.clone())
        .and(key_filter)
        .and_then(authentication::sign_up::<B>);

    let sign_out = warp::path("sign_out")
        .and(warp::path::end())
        .and(warp::post())
        .and(authentication::auth(key.clone()))
        .and(backend_filter.clone())
        .and_then(authentication::sign_out::<B>);

    let create_note = warp::path("notes")
        .and(warp::path::end())
        .and(warp::post())
        .and(authentication::auth(key.clone()))
        .and(warp::multipart::form().max_length(setup.max_upload_bytes))
        .and(backend_filter.clone())
        .and(ledger_filter.clone())
        .and_then(note::create_note::<B>);

    let delete_note = warp::path("notes")
        .and(warp::path::param::<String>())
        .and(warp::path("delete"))
        .and(warp::path::end())
        .and(warp::post())
        .and(authentication::auth(key))
        .and(backend_filter)
        .and(ledger_filter)
        .and_then(note::delete_note::<B>);

    board
        .or(sign_in)
        .or(sign_up)
        .or(sign_out)
        .or(create_note)
        .or(delete_note)
        .with(warp::trace(|info| {
            tracing::info_span!(
                "request",
                method = %info.method(),
                path = %info.path(),
                id = %uuid::Uuid::new_v4(),
            )
        }))
        .recover(return_error)
}
