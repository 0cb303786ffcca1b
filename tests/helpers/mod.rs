#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use chrono::{Duration, Utc};
use handle_errors::Error;
use note_board::setup::{BackendConfig, Setup};
use note_board::store::{AuthGate, Backend, BlobStore, RecordStore, StoredObject};
use note_board::types::account::{Credentials, Grant, Session};
use note_board::types::note::{LocalFile, NewNote, Note, NoteDraft};
use tokio::sync::Notify;

pub const SESSION_KEY: &str = "RANDOM WORDS WINTER MACINTOSH PC";

/// Everything the hosted platform would keep, in memory.
#[derive(Default)]
pub struct Platform {
    pub notes: Vec<(String, Note)>,
    pub blobs: HashMap<String, Bytes>,
    pub users: HashMap<String, String>,
    pub signed_out: Vec<String>,
    pub broken_urls: HashSet<String>,
    pub list_calls: usize,
    pub create_calls: usize,
    pub upload_calls: usize,
    pub fail_lists: bool,
    pub fail_sign_out: bool,
    next_id: u64,
}

#[derive(Clone)]
pub struct MemoryBackend {
    pub platform: Arc<Mutex<Platform>>,
    upload_gate: Option<Arc<Notify>>,
    auth: MemoryAuth,
}

impl MemoryBackend {
    pub fn new() -> Self {
        let platform = Arc::new(Mutex::new(Platform::default()));
        MemoryBackend {
            auth: MemoryAuth {
                platform: platform.clone(),
            },
            platform,
            upload_gate: None,
        }
    }

    /// Uploads wait until `release_upload` is called.
    pub fn with_held_uploads(mut self) -> Self {
        self.upload_gate = Some(Arc::new(Notify::new()));
        self
    }

    pub fn release_upload(&self) {
        if let Some(gate) = &self.upload_gate {
            gate.notify_one();
        }
    }

    pub fn add_user(&self, user_name: &str, password: &str) {
        self.platform
            .lock()
            .unwrap()
            .users
            .insert(user_name.to_string(), password.to_string());
    }

    pub fn break_url(&self, key: &str) {
        self.platform.lock().unwrap().broken_urls.insert(key.to_string());
    }

    pub fn stored_notes(&self) -> Vec<Note> {
        self.platform
            .lock()
            .unwrap()
            .notes
            .iter()
            .map(|(_, note)| note.clone())
            .collect()
    }

    pub fn calls(&self) -> (usize, usize, usize) {
        let platform = self.platform.lock().unwrap();
        (platform.list_calls, platform.create_calls, platform.upload_calls)
    }
}

impl Backend for MemoryBackend {
    type Records = MemoryRecords;
    type Blobs = MemoryBlobs;
    type Auth = MemoryAuth;

    fn records(&self, session: &Session) -> MemoryRecords {
        MemoryRecords {
            platform: self.platform.clone(),
            owner: session.user_name.clone(),
        }
    }

    fn blobs(&self, _session: &Session) -> MemoryBlobs {
        MemoryBlobs {
            platform: self.platform.clone(),
            gate: self.upload_gate.clone(),
        }
    }

    fn auth(&self) -> &MemoryAuth {
        &self.auth
    }
}

pub struct MemoryRecords {
    platform: Arc<Mutex<Platform>>,
    owner: String,
}

impl RecordStore for MemoryRecords {
    async fn list(&self) -> Result<Vec<Note>, Error> {
        let mut platform = self.platform.lock().unwrap();
        platform.list_calls += 1;
        if platform.fail_lists {
            return Err(Error::Unauthorized);
        }
        Ok(platform
            .notes
            .iter()
            .filter(|(owner, _)| *owner == self.owner)
            .map(|(_, note)| note.clone())
            .collect())
    }

    async fn create(&self, note: NewNote) -> Result<Note, Error> {
        let mut platform = self.platform.lock().unwrap();
        platform.create_calls += 1;
        platform.next_id += 1;
        let note = Note {
            id: format!("note-{}", platform.next_id),
            name: note.name,
            description: note.description,
            image: note.image,
        };
        platform.notes.push((self.owner.clone(), note.clone()));
        Ok(note)
    }

    async fn delete(&self, id: &str) -> Result<(), Error> {
        let mut platform = self.platform.lock().unwrap();
        let owner = self.owner.clone();
        platform.notes.retain(|(o, note)| !(*o == owner && note.id == id));
        Ok(())
    }
}

pub struct MemoryBlobs {
    platform: Arc<Mutex<Platform>>,
    gate: Option<Arc<Notify>>,
}

impl BlobStore for MemoryBlobs {
    async fn upload(&self, key: &str, _content_type: Option<&str>, data: Bytes) -> Result<StoredObject, Error> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let mut platform = self.platform.lock().unwrap();
        platform.upload_calls += 1;
        platform.blobs.insert(key.to_string(), data);
        Ok(StoredObject { key: key.to_string() })
    }

    async fn resolve_url(&self, key: &str) -> Result<String, Error> {
        let platform = self.platform.lock().unwrap();
        if platform.broken_urls.contains(key) || !platform.blobs.contains_key(key) {
            return Err(Error::UnexpectedResponse("object metadata without downloadTokens"));
        }
        Ok(format!("https://blobs.test/{}?token=t", key))
    }
}

#[derive(Clone)]
pub struct MemoryAuth {
    platform: Arc<Mutex<Platform>>,
}

impl AuthGate for MemoryAuth {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Grant, Error> {
        let platform = self.platform.lock().unwrap();
        match platform.users.get(&credentials.user_name) {
            Some(password) if *password == credentials.password => Ok(Grant {
                access_token: format!("token-{}", credentials.user_name),
                expires_in: 3600,
            }),
            _ => Err(Error::WrongPassword),
        }
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<Grant, Error> {
        let mut platform = self.platform.lock().unwrap();
        if platform.users.contains_key(&credentials.user_name) {
            return Err(Error::UserNameTaken);
        }
        platform
            .users
            .insert(credentials.user_name.clone(), credentials.password.clone());
        Ok(Grant {
            access_token: format!("token-{}", credentials.user_name),
            expires_in: 3600,
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), Error> {
        let mut platform = self.platform.lock().unwrap();
        if platform.fail_sign_out {
            return Err(Error::UnexpectedResponse("sign out refused"));
        }
        platform.signed_out.push(access_token.to_string());
        Ok(())
    }
}

pub fn session(user_name: &str) -> Session {
    let now = Utc::now();
    Session {
        exp: now + Duration::hours(1),
        user_name: user_name.to_string(),
        access_token: format!("token-{}", user_name),
        nbf: now,
    }
}

pub fn setup() -> Setup {
    Setup {
        log_level: "info".to_string(),
        port: 0,
        session_key: SESSION_KEY.to_string(),
        max_upload_bytes: 1024 * 1024,
        backend: BackendConfig {
            auth_url: "http://127.0.0.1:1/auth".to_string(),
            data_url: "http://127.0.0.1:1/data".to_string(),
            storage_url: "http://127.0.0.1:1/storage".to_string(),
            api_key: "test-key".to_string(),
        },
    }
}

pub fn draft(name: &str, description: &str, image: Option<&str>) -> NoteDraft {
    NoteDraft {
        name: name.to_string(),
        description: description.to_string(),
        image: image.map(|file_name| LocalFile {
            file_name: file_name.to_string(),
            content_type: Some("image/jpeg".to_string()),
            data: Bytes::from_static(b"\xff\xd8\xff\xe0 jpeg bytes"),
        }),
    }
}
