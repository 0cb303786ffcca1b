//! `reqwest` clients for the hosted platform.
//!
//! Records live behind a small REST API (`{data_url}/notes`), images behind a
//! Firebase-storage style object API (`{storage_url}/o`), accounts behind
//! `{auth_url}/sign_in` and `{auth_url}/sign_up`. Every request carries the platform API key; record
//! and blob requests also carry the session's bearer token.

use std::sync::Arc;

use bytes::Bytes;
use handle_errors::Error;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::setup::BackendConfig;
use crate::store::{AuthGate, Backend, BlobStore, RecordStore, StoredObject};
use crate::types::account::{Credentials, Grant, Session};
use crate::types::note::{NewNote, Note};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Everything but unreserved characters, so `/` inside a key stays one segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Object metadata as returned by the storage API.
#[derive(Deserialize, Debug)]
struct ObjectMetadata {
    name: String,
    #[allow(dead_code)]
    bucket: Option<String>,
    #[serde(rename = "downloadTokens")]
    download_tokens: Option<String>,
}

#[derive(Clone)]
pub struct RemoteBackend {
    client: Client,
    endpoints: Arc<BackendConfig>,
    auth: RemoteAuth,
}

impl RemoteBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, Error> {
        let client = Client::builder().use_rustls_tls().build()?;
        let endpoints = Arc::new(config.clone());
        Ok(RemoteBackend {
            auth: RemoteAuth {
                client: client.clone(),
                endpoints: endpoints.clone(),
            },
            client,
            endpoints,
        })
    }
}

impl Backend for RemoteBackend {
    type Records = RemoteRecords;
    type Blobs = RemoteBlobs;
    type Auth = RemoteAuth;

    fn records(&self, session: &Session) -> RemoteRecords {
        RemoteRecords {
            client: self.client.clone(),
            endpoints: self.endpoints.clone(),
            access_token: session.access_token.clone(),
        }
    }

    fn blobs(&self, session: &Session) -> RemoteBlobs {
        RemoteBlobs {
            client: self.client.clone(),
            endpoints: self.endpoints.clone(),
            access_token: session.access_token.clone(),
        }
    }

    fn auth(&self) -> &RemoteAuth {
        &self.auth
    }
}

fn authorized(request: RequestBuilder, endpoints: &BackendConfig, access_token: &str) -> RequestBuilder {
    request
        .header(API_KEY_HEADER, &endpoints.api_key)
        .bearer_auth(access_token)
}

fn encode(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

pub struct RemoteRecords {
    client: Client,
    endpoints: Arc<BackendConfig>,
    access_token: String,
}

impl RemoteRecords {
    fn notes_url(&self) -> String {
        format!("{}/notes", self.endpoints.data_url)
    }
}

impl RecordStore for RemoteRecords {
    async fn list(&self) -> Result<Vec<Note>, Error> {
        let response = authorized(self.client.get(self.notes_url()), &self.endpoints, &self.access_token)
            .send()
            .await?
            .error_for_status()?;
        let envelope: Envelope<Vec<Note>> = response.json().await?;
        Ok(envelope.data)
    }

    #[instrument(skip(self, note), fields(name = %note.name))]
    async fn create(&self, note: NewNote) -> Result<Note, Error> {
        let response = authorized(self.client.post(self.notes_url()), &self.endpoints, &self.access_token)
            .json(&note)
            .send()
            .await?
            .error_for_status()?;
        let envelope: Envelope<Note> = response.json().await?;
        info!("record store created {}", envelope.data.id);
        Ok(envelope.data)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<(), Error> {
        let url = format!("{}/{}", self.notes_url(), encode(id));
        authorized(self.client.delete(url), &self.endpoints, &self.access_token)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

pub struct RemoteBlobs {
    client: Client,
    endpoints: Arc<BackendConfig>,
    access_token: String,
}

impl RemoteBlobs {
    fn object_url(&self, key: &str) -> String {
        format!("{}/o/{}", self.endpoints.storage_url, encode(key))
    }
}

impl BlobStore for RemoteBlobs {
    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn upload(&self, key: &str, content_type: Option<&str>, data: Bytes) -> Result<StoredObject, Error> {
        let url = format!("{}/o", self.endpoints.storage_url);
        let response = authorized(self.client.post(url), &self.endpoints, &self.access_token)
            .query(&[("name", key)])
            .header(CONTENT_TYPE, content_type.unwrap_or("application/octet-stream"))
            .body(data)
            .send()
            .await?
            .error_for_status()?;
        let object: ObjectMetadata = response.json().await?;
        info!("blob store kept {}", object.name);
        Ok(StoredObject { key: object.name })
    }

    async fn resolve_url(&self, key: &str) -> Result<String, Error> {
        let object_url = self.object_url(key);
        let response = authorized(self.client.get(&object_url), &self.endpoints, &self.access_token)
            .send()
            .await?
            .error_for_status()?;
        let object: ObjectMetadata = response.json().await?;

        // downloadTokens may hold several comma separated tokens, any of them works
        let token = object
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').map(str::trim).find(|t| !t.is_empty()))
            .ok_or(Error::UnexpectedResponse("object metadata without downloadTokens"))?;

        Ok(format!("{}?alt=media&token={}", object_url, encode(token)))
    }
}

#[derive(Clone)]
pub struct RemoteAuth {
    client: Client,
    endpoints: Arc<BackendConfig>,
}

impl AuthGate for RemoteAuth {
    #[instrument(skip(self, credentials), fields(user_name = %credentials.user_name))]
    async fn sign_in(&self, credentials: &Credentials) -> Result<Grant, Error> {
        let response = self
            .client
            .post(format!("{}/sign_in", self.endpoints.auth_url))
            .header(API_KEY_HEADER, &self.endpoints.api_key)
            .json(credentials)
            .send()
            .await?;

        if matches!(response.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(Error::WrongPassword);
        }
        Ok(response.error_for_status()?.json().await?)
    }

    #[instrument(skip(self, credentials), fields(user_name = %credentials.user_name))]
    async fn sign_up(&self, credentials: &Credentials) -> Result<Grant, Error> {
        let response = self
            .client
            .post(format!("{}/sign_up", self.endpoints.auth_url))
            .header(API_KEY_HEADER, &self.endpoints.api_key)
            .json(credentials)
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            return Err(Error::UserNameTaken);
        }
        Ok(response.error_for_status()?.json().await?)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), Error> {
        self.client
            .post(format!("{}/sign_out", self.endpoints.auth_url))
            .header(API_KEY_HEADER, &self.endpoints.api_key)
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
