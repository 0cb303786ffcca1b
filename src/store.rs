use std::future::Future;

use bytes::Bytes;

use crate::types::account::{Credentials, Grant, Session};
use crate::types::note::{NewNote, Note};

pub mod remote;

/// Key under which the blob store kept an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
}

/// Structured store holding the `Note` records of the signed-in user.
pub trait RecordStore: Send + Sync {
    /// Every note visible to the session, in whatever order the store returns.
    fn list(&self) -> impl Future<Output = Result<Vec<Note>, handle_errors::Error>> + Send;

    fn create(&self, note: NewNote) -> impl Future<Output = Result<Note, handle_errors::Error>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = Result<(), handle_errors::Error>> + Send;
}

/// Object store for note images, addressed by key.
pub trait BlobStore: Send + Sync {
    /// Stores `data` under `key`, overwriting whatever was there.
    fn upload(
        &self,
        key: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> impl Future<Output = Result<StoredObject, handle_errors::Error>> + Send;

    /// A fetchable, possibly short-lived, URL for the object under `key`.
    fn resolve_url(&self, key: &str) -> impl Future<Output = Result<String, handle_errors::Error>> + Send;
}

/// Hosted sign-in service guarding the board.
pub trait AuthGate: Send + Sync {
    fn sign_in(&self, credentials: &Credentials) -> impl Future<Output = Result<Grant, handle_errors::Error>> + Send;

    /// Creates the account and signs it in.
    fn sign_up(&self, credentials: &Credentials) -> impl Future<Output = Result<Grant, handle_errors::Error>> + Send;

    fn sign_out(&self, access_token: &str) -> impl Future<Output = Result<(), handle_errors::Error>> + Send;
}

/// Handle to the whole platform, built once at startup and handed to the routes.
pub trait Backend: Clone + Send + Sync + 'static {
    type Records: RecordStore;
    type Blobs: BlobStore;
    type Auth: AuthGate;

    fn records(&self, session: &Session) -> Self::Records;

    fn blobs(&self, session: &Session) -> Self::Blobs;

    fn auth(&self) -> &Self::Auth;
}
