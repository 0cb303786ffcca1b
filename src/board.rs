//! The note board view-model.
//!
//! Holds the list shown to the user and the form draft, and drives the
//! record and blob stores:
//! - fetch: list every record, then resolve an image URL per note concurrently;
//!   a failed resolution only drops that note's image.
//! - submit: presence check, optional upload under the file name, create,
//!   clear the draft, re-fetch the whole list.
//! - delete: delete by id, re-fetch the whole list.
//!
//! One operation runs at a time. A call made while another is in flight fails
//! with `OperationInFlight`, which is what keeps a double click from creating
//! two notes.

use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::future::join_all;
use handle_errors::Error;
use tracing::{info, warn};

use crate::store::{BlobStore, RecordStore};
use crate::types::note::{LocalFile, NewNote, Note, NoteDraft, NoteView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching,
    Submitting,
    Deleting,
}

#[derive(Debug)]
struct BoardState {
    notes: Vec<NoteView>,
    draft: NoteDraft,
    phase: Phase,
}

pub struct NoteBoard<R, B> {
    records: R,
    blobs: B,
    state: Mutex<BoardState>,
}

/// Puts the board back to `Idle` when the operation ends, even if its future is dropped.
struct Busy<'a> {
    state: &'a Mutex<BoardState>,
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        lock(self.state).phase = Phase::Idle;
    }
}

fn lock(state: &Mutex<BoardState>) -> MutexGuard<'_, BoardState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<R: RecordStore, B: BlobStore> NoteBoard<R, B> {
    pub fn new(records: R, blobs: B) -> Self {
        NoteBoard {
            records,
            blobs,
            state: Mutex::new(BoardState {
                notes: Vec::new(),
                draft: NoteDraft::default(),
                phase: Phase::Idle,
            }),
        }
    }

    pub fn notes(&self) -> Vec<NoteView> {
        lock(&self.state).notes.clone()
    }

    pub fn draft(&self) -> NoteDraft {
        lock(&self.state).draft.clone()
    }

    pub fn phase(&self) -> Phase {
        lock(&self.state).phase
    }

    pub fn set_name(&self, name: impl Into<String>) {
        lock(&self.state).draft.name = name.into();
    }

    pub fn set_description(&self, description: impl Into<String>) {
        lock(&self.state).draft.description = description.into();
    }

    pub fn attach_image(&self, image: Option<LocalFile>) {
        lock(&self.state).draft.image = image;
    }

    pub fn set_draft(&self, draft: NoteDraft) {
        lock(&self.state).draft = draft;
    }

    fn begin(&self, phase: Phase) -> Result<Busy<'_>, Error> {
        let mut state = lock(&self.state);
        if state.phase != Phase::Idle {
            return Err(Error::OperationInFlight);
        }
        state.phase = phase;
        Ok(Busy { state: &self.state })
    }

    /// Replaces the list with a fresh one from the record store.
    pub async fn fetch(&self) -> Result<Vec<NoteView>, Error> {
        let _busy = self.begin(Phase::Fetching)?;
        self.refresh().await
    }

    /// Creates a note from the draft. An empty name or description is refused
    /// before anything is sent.
    pub async fn submit(&self) -> Result<Note, Error> {
        let draft = self.draft();
        if let Some(field) = draft.missing_field() {
            return Err(Error::MissingParameters(field));
        }

        let _busy = self.begin(Phase::Submitting)?;
        let note = self.create(&draft).await?;
        info!("成功新增：{}", note.id);

        lock(&self.state).draft = NoteDraft::default();
        self.refresh().await?;
        Ok(note)
    }

    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        let _busy = self.begin(Phase::Deleting)?;
        self.records.delete(id).await?;
        info!("成功刪除：{}", id);

        self.refresh().await?;
        Ok(())
    }

    async fn create(&self, draft: &NoteDraft) -> Result<Note, Error> {
        let image = match &draft.image {
            Some(file) => {
                let stored = self
                    .blobs
                    .upload(&file.file_name, file.content_type.as_deref(), file.data.clone())
                    .await?;
                Some(stored.key)
            }
            None => None,
        };

        self.records
            .create(NewNote {
                name: draft.name.clone(),
                description: draft.description.clone(),
                image,
            })
            .await
    }

    async fn refresh(&self) -> Result<Vec<NoteView>, Error> {
        let notes = self.records.list().await?;
        let views = join_all(notes.into_iter().map(|note| self.resolve(note))).await;

        lock(&self.state).notes = views.clone();
        Ok(views)
    }

    async fn resolve(&self, note: Note) -> NoteView {
        let image_url = match note.image.as_deref() {
            Some(key) => match self.blobs.resolve_url(key).await {
                Ok(url) if !url.is_empty() => Some(url),
                Ok(_) => None,
                Err(e) => {
                    warn!("cannot resolve image {} of note {}: {}", key, note.id, e);
                    None
                }
            },
            None => None,
        };
        NoteView { note, image_url }
    }
}
