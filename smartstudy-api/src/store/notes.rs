//! Volatile voice-note storage
//!
//! A lock-guarded in-process list. Deliberately non-durable: the
//! feature is demo-grade and the list is empty after every restart.

use std::sync::Arc;
use tokio::sync::RwLock;

use smartstudy_common::types::VoiceNote;

/// Shared handle to the in-memory note list.
#[derive(Clone, Default)]
pub struct NoteStore {
    notes: Arc<RwLock<Vec<VoiceNote>>>,
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, note: VoiceNote) {
        self.notes.write().await.push(note);
    }

    /// All notes in insertion order.
    pub async fn list(&self) -> Vec<VoiceNote> {
        self.notes.read().await.clone()
    }

    /// Remove by id; returns whether a note was actually removed.
    pub async fn remove(&self, id: &str) -> bool {
        let mut notes = self.notes.write().await;
        let before = notes.len();
        notes.retain(|note| note.id != id);
        notes.len() != before
    }

    pub async fn count(&self) -> usize {
        self.notes.read().await.len()
    }
}
