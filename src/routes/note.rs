use bytes::{BufMut, Bytes};
use futures::TryStreamExt;
use handle_errors::Error;
use percent_encoding::percent_decode_str;
use tracing::{info, instrument};
use warp::http::StatusCode;
use warp::multipart::{FormData, Part};
use warp::Reply;

use crate::board::NoteBoard;
use crate::routes::page::{self, Notice};
use crate::routes::submission::SubmissionLedger;
use crate::store::Backend;
use crate::types::account::Session;
use crate::types::note::{LocalFile, NoteDraft, NoteView};

/// The multipart body of the note form.
#[derive(Debug, Default)]
pub struct NoteForm {
    pub draft: NoteDraft,
    pub submission: Option<String>,
}

async fn part_bytes(part: Part) -> Result<Vec<u8>, Error> {
    part.stream()
        .try_fold(Vec::new(), |mut vec, data| {
            vec.put(data);
            async move { Ok(vec) }
        })
        .await
        .map_err(Error::FormError)
}

fn text(data: Vec<u8>) -> String {
    String::from_utf8_lossy(&data).into_owned()
}

/// Browsers send the file input even when nothing was picked, with an empty file name.
fn base_name(file_name: &str) -> Option<String> {
    let name = file_name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(file_name);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Each part is drained before the next one is polled.
pub async fn read_form(mut form: FormData) -> Result<NoteForm, Error> {
    let mut note_form = NoteForm::default();

    while let Some(part) = form.try_next().await.map_err(Error::FormError)? {
        let field = part.name().to_string();
        let file_name = part.filename().and_then(base_name);
        let content_type = part.content_type().map(str::to_string);
        let data = part_bytes(part).await?;

        match field.as_str() {
            "name" => note_form.draft.name = text(data),
            "description" => note_form.draft.description = text(data),
            "submission" => note_form.submission = Some(text(data)),
            "image" => {
                note_form.draft.image = file_name.map(|file_name| LocalFile {
                    file_name,
                    content_type,
                    data: Bytes::from(data),
                })
            }
            _ => {}
        }
    }
    Ok(note_form)
}

fn render(
    session: &Session,
    notes: &[NoteView],
    draft: &NoteDraft,
    notice: Option<&Notice>,
    ledger: &SubmissionLedger,
    status: StatusCode,
) -> warp::reply::Response {
    let html = page::board_page(&session.user_name, notes, draft, notice, &ledger.issue());
    warp::reply::with_status(warp::reply::html(html), status).into_response()
}

/// `GET /`: the board for a signed-in user, the sign-in form otherwise.
pub async fn board_page<B: Backend>(
    session: Option<Session>,
    backend: B,
    ledger: SubmissionLedger,
) -> Result<warp::reply::Response, warp::Rejection> {
    let session = match session {
        Some(session) => session,
        None => return Ok(warp::reply::html(page::sign_in_page(None)).into_response()),
    };

    let board = NoteBoard::new(backend.records(&session), backend.blobs(&session));
    let notes = board.fetch().await.map_err(warp::reject::custom)?;
    Ok(render(&session, &notes, &NoteDraft::default(), None, &ledger, StatusCode::OK))
}

#[instrument(skip_all, fields(user_name = %session.user_name))]
pub async fn create_note<B: Backend>(
    session: Session,
    form: FormData,
    backend: B,
    ledger: SubmissionLedger,
) -> Result<warp::reply::Response, warp::Rejection> {
    let form = read_form(form).await.map_err(warp::reject::custom)?;
    let board = NoteBoard::new(backend.records(&session), backend.blobs(&session));

    // an incomplete form creates nothing, so its token stays usable
    let complete = form.draft.missing_field().is_none();
    let token = form.submission.as_deref().unwrap_or_default();
    if complete && !ledger.consume(token) {
        info!("ignored a resent note form");
        let notes = board.fetch().await.map_err(warp::reject::custom)?;
        let notice = Notice::Info(Error::DuplicateSubmission.to_string());
        return Ok(render(&session, &notes, &NoteDraft::default(), Some(&notice), &ledger, StatusCode::CONFLICT));
    }

    board.set_draft(form.draft);
    match board.submit().await {
        Ok(_) => Ok(render(&session, &board.notes(), &board.draft(), None, &ledger, StatusCode::OK)),
        Err(Error::MissingParameters(field)) => {
            // keep what was typed, the file input cannot be refilled
            let notes = board.fetch().await.map_err(warp::reject::custom)?;
            let notice = Notice::Error(format!("Please fill in the note {}.", field));
            Ok(render(
                &session,
                &notes,
                &board.draft(),
                Some(&notice),
                &ledger,
                StatusCode::UNPROCESSABLE_ENTITY,
            ))
        }
        Err(e) => Err(warp::reject::custom(e)),
    }
}

#[instrument(skip_all, fields(user_name = %session.user_name))]
pub async fn delete_note<B: Backend>(
    id: String,
    session: Session,
    backend: B,
    ledger: SubmissionLedger,
) -> Result<warp::reply::Response, warp::Rejection> {
    let id = percent_decode_str(&id).decode_utf8_lossy();
    let board = NoteBoard::new(backend.records(&session), backend.blobs(&session));

    board.delete(&id).await.map_err(warp::reject::custom)?;
    Ok(render(&session, &board.notes(), &NoteDraft::default(), None, &ledger, StatusCode::OK))
}
