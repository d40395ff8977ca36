use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use scribble_core::artifact::Artifact;
use scribble_core::time::unix_millis_now;

use crate::handoff::decode_png_data_url;

pub const DEFAULT_PAGE_SIZE: usize = 48;
pub const MAX_PAGE_SIZE: usize = 100;

pub type SharedGallery = Arc<RwLock<Gallery>>;

#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    #[error("gallery io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("gallery record error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One persisted drawing, as written to the JSON-lines file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDrawing {
    pub id: u64,
    pub word: String,
    pub drawer: String,
    pub room_code: String,
    pub round: u8,
    /// Milliseconds since the Unix epoch.
    pub played_at: u64,
    pub image_data: String,
}

/// Listing entry without the image payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryItem {
    pub id: u64,
    pub word: String,
    pub drawer: String,
    pub room_code: String,
    pub round: u8,
    pub played_at: u64,
}

impl From<&StoredDrawing> for GalleryItem {
    fn from(d: &StoredDrawing) -> Self {
        Self {
            id: d.id,
            word: d.word.clone(),
            drawer: d.drawer.clone(),
            room_code: d.room_code.clone(),
            round: d.round,
            played_at: d.played_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GalleryQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub drawer: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GalleryPage {
    pub items: Vec<GalleryItem>,
    /// Size of the filtered set, not of this page.
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Append handle for the JSON-lines file. Writes block, so async callers
/// run them on the blocking pool after releasing the gallery lock.
#[derive(Clone)]
pub struct Journal {
    file: Arc<Mutex<File>>,
}

impl Journal {
    pub fn write(&self, drawings: &[StoredDrawing]) -> Result<(), GalleryError> {
        let mut buf = String::new();
        for drawing in drawings {
            buf.push_str(&serde_json::to_string(drawing)?);
            buf.push('\n');
        }
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        file.write_all(buf.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

/// Append-only store of finished drawings, optionally backed by a
/// JSON-lines file.
pub struct Gallery {
    drawings: Vec<StoredDrawing>,
    journal: Option<Journal>,
    next_id: u64,
}

impl Gallery {
    pub fn in_memory() -> Self {
        Self {
            drawings: Vec::new(),
            journal: None,
            next_id: 1,
        }
    }

    /// Open (or create) a JSON-lines store at `path`, loading existing records.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GalleryError> {
        let path = path.as_ref().to_path_buf();
        let mut drawings = Vec::new();
        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for (lineno, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<StoredDrawing>(&line) {
                    Ok(d) => drawings.push(d),
                    Err(e) => tracing::warn!(
                        path = %path.display(),
                        line = lineno + 1,
                        "Skipping malformed gallery record: {e}"
                    ),
                }
            }
        }
        // Concurrent journal writes may land out of id order.
        drawings.sort_by_key(|d| d.id);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let next_id = drawings.iter().map(|d| d.id).max().unwrap_or(0) + 1;
        tracing::info!(
            path = %path.display(),
            drawings = drawings.len(),
            "Opened gallery"
        );
        Ok(Self {
            drawings,
            journal: Some(Journal {
                file: Arc::new(Mutex::new(file)),
            }),
            next_id,
        })
    }

    pub fn len(&self) -> usize {
        self.drawings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawings.is_empty()
    }

    /// Persist one artifact, writing through to the file. Returns the id
    /// assigned to it.
    #[cfg(test)]
    pub fn append(&mut self, artifact: &Artifact, room_code: &str) -> Result<u64, GalleryError> {
        let drawing = self.record(artifact, room_code);
        if let Some(journal) = &self.journal {
            journal.write(std::slice::from_ref(&drawing))?;
        }
        Ok(drawing.id)
    }

    /// Add an artifact to the in-memory listing only. The caller writes the
    /// returned record through [`Gallery::journal`].
    pub fn record(&mut self, artifact: &Artifact, room_code: &str) -> StoredDrawing {
        let drawing = StoredDrawing {
            id: self.next_id,
            word: artifact.word.clone(),
            drawer: artifact.drawer_name.clone(),
            room_code: room_code.to_string(),
            round: artifact.round,
            played_at: unix_millis_now(),
            image_data: artifact.image_data.clone(),
        };
        self.next_id += 1;
        self.drawings.push(drawing.clone());
        drawing
    }

    pub fn journal(&self) -> Option<Journal> {
        self.journal.clone()
    }

    /// Newest-first page, optionally restricted to one drawer.
    pub fn list(&self, query: &GalleryQuery) -> GalleryPage {
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = query.offset.unwrap_or(0);
        let drawer = query.drawer.as_deref().filter(|d| !d.is_empty());

        let matching = || {
            self.drawings
                .iter()
                .rev()
                .filter(move |d| drawer.is_none_or(|name| d.drawer == name))
        };
        GalleryPage {
            items: matching()
                .skip(offset)
                .take(limit)
                .map(GalleryItem::from)
                .collect(),
            total: matching().count(),
            limit,
            offset,
        }
    }

    /// Distinct drawer names, sorted case-insensitively.
    pub fn drawers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.drawings.iter().map(|d| d.drawer.clone()).collect();
        names.sort_by(|a, b| {
            a.to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b))
        });
        names.dedup();
        names
    }

    pub fn get(&self, id: u64) -> Option<&StoredDrawing> {
        self.drawings.iter().find(|d| d.id == id)
    }

    /// Decoded PNG bytes of drawing `id`.
    pub fn image_png(&self, id: u64) -> Option<Vec<u8>> {
        self.get(id)
            .and_then(|d| decode_png_data_url(&d.image_data))
    }
}
