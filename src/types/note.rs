use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A note record as the record store hands it out. `id` is assigned by the store.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Fields sent to the record store on creation.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A note plus the display URL resolved for its image at fetch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteView {
    pub note: Note,
    pub image_url: Option<String>,
}

impl NoteView {
    pub fn id(&self) -> &str {
        &self.note.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// What the user typed into the form but has not submitted yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub name: String,
    pub description: String,
    pub image: Option<LocalFile>,
}

impl NoteDraft {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.description.is_empty() && self.image.is_none()
    }

    /// Presence check only, returns the first empty required field.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.name.is_empty() {
            Some("name")
        } else if self.description.is_empty() {
            Some("description")
        } else {
            None
        }
    }
}
