use config::ConfigError;
use reqwest::Error as ReqwestError;
use tracing::{event, instrument, Level};
use warp::{
    filters::body::BodyDeserializeError,
    http::StatusCode,
    reject::{
        InvalidHeader, InvalidQuery, LengthRequired, MethodNotAllowed, MissingHeader, PayloadTooLarge, Reject,
        UnsupportedMediaType,
    },
    Rejection, Reply,
};

#[derive(Debug)]
pub enum Error {
    MissingParameters(&'static str),
    ExternalAPIError(ReqwestError),
    UnexpectedResponse(&'static str),
    WrongPassword,
    UserNameTaken,
    CannotIssueToken,
    CannotDecryptToken,
    Unauthorized,
    DuplicateSubmission,
    OperationInFlight,
    FormError(warp::Error),
    ConfigError(ConfigError),
    InvalidSetup(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::MissingParameters(field) => write!(f, "Missing parameter: {}", field),
            Error::ExternalAPIError(ref err) => {
                write!(f, "cannot execute: {}", err)
            }
            Error::UnexpectedResponse(what) => write!(f, "Unexpected answer from the platform: {}", what),
            Error::WrongPassword => write!(f, "Wrong user name or password"),
            Error::UserNameTaken => write!(f, "This user name is already taken"),
            Error::CannotIssueToken => write!(f, "Cannot issue session token"),
            Error::CannotDecryptToken => write!(f, "Cannot decrypt session token"),
            Error::Unauthorized => write!(f, "Not signed in"),
            Error::DuplicateSubmission => write!(f, "This form was already submitted"),
            Error::OperationInFlight => write!(f, "Another operation is still running"),
            Error::FormError(ref err) => write!(f, "Cannot read form: {}", err),
            Error::ConfigError(ref err) => write!(f, "Cannot load setup: {}", err),
            Error::InvalidSetup(ref reason) => write!(f, "Invalid setup: {}", reason),
        }
    }
}

impl Reject for Error {}

impl From<ReqwestError> for Error {
    fn from(err: ReqwestError) -> Self {
        Error::ExternalAPIError(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::ConfigError(err)
    }
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::MissingParameters(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::ExternalAPIError(_) | Error::UnexpectedResponse(_) => StatusCode::BAD_GATEWAY,
            Error::WrongPassword | Error::CannotDecryptToken | Error::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            Error::UserNameTaken | Error::DuplicateSubmission | Error::OperationInFlight => StatusCode::CONFLICT,
            Error::FormError(_) => StatusCode::BAD_REQUEST,
            Error::CannotIssueToken | Error::ConfigError(_) | Error::InvalidSetup(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Minimal page shown for failures that have no better place on the board.
pub fn error_page(message: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset='utf-8'><title>My Notes App</title></head>\
         <body><main style='padding: 20px'><h1>Something went wrong</h1>\
         <p class='error'>{}</p><a href='/'>Back to notes</a></main></body></html>",
        html_escape::encode_text(message)
    )
}

fn page(message: &str, status: StatusCode) -> warp::reply::WithStatus<warp::reply::Html<String>> {
    warp::reply::with_status(warp::reply::html(error_page(message)), status)
}

const UNREACHABLE: &str = "The notes service could not be reached, please try again.";

#[instrument]
pub async fn return_error(r: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(crate::Error::ExternalAPIError(e)) = r.find() {
        event!(Level::ERROR, "remote call failed: {}", e);
        Ok(page(UNREACHABLE, StatusCode::BAD_GATEWAY))
    } else if let Some(error) = r
        .find::<Error>()
        .filter(|error| matches!(error, Error::UnexpectedResponse(_)))
    {
        event!(Level::ERROR, "{}", error);
        Ok(page(UNREACHABLE, StatusCode::BAD_GATEWAY))
    } else if let Some(error) = r.find::<Error>() {
        event!(Level::ERROR, "{}", error);
        Ok(page(&error.to_string(), error.status()))
    } else if let Some(error) = r.find::<PayloadTooLarge>() {
        event!(Level::ERROR, "{}", error);
        Ok(page("The attached file is too large", StatusCode::PAYLOAD_TOO_LARGE))
    } else if let Some(error) = r.find::<BodyDeserializeError>() {
        event!(Level::ERROR, "{}", error);
        Ok(page(&error.to_string(), StatusCode::UNPROCESSABLE_ENTITY))
    } else if let Some(error) = r.find::<UnsupportedMediaType>() {
        event!(Level::WARN, "{}", error);
        Ok(page(&error.to_string(), StatusCode::UNSUPPORTED_MEDIA_TYPE))
    } else if let Some(error) = r.find::<LengthRequired>() {
        event!(Level::WARN, "{}", error);
        Ok(page(&error.to_string(), StatusCode::LENGTH_REQUIRED))
    } else if let Some(error) = r.find::<MissingHeader>() {
        event!(Level::WARN, "{}", error);
        Ok(page(&error.to_string(), StatusCode::BAD_REQUEST))
    } else if let Some(error) = r.find::<InvalidHeader>() {
        event!(Level::WARN, "{}", error);
        Ok(page(&error.to_string(), StatusCode::BAD_REQUEST))
    } else if let Some(error) = r.find::<InvalidQuery>() {
        event!(Level::WARN, "{}", error);
        Ok(page(&error.to_string(), StatusCode::BAD_REQUEST))
    } else if r.find::<MethodNotAllowed>().is_some() {
        Ok(page("Method not allowed", StatusCode::METHOD_NOT_ALLOWED))
    } else {
        Ok(page("Route not found", StatusCode::NOT_FOUND))
    }
}
