//! Render orchestration: sanitize, theme, photo, layout, paint.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use crate::error::{RenderError, Result};
use crate::layout::{self, PageLayout};
use crate::pdf;
use crate::photo::{Photo, PhotoLoader};
use crate::record::RawRecord;
use crate::sanitize::{self, NormalizedRecord};
use crate::theme::{ThemeRequest, ThemeResolver};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Identity used in file names when the record carries none.
const PREVIEW_IDENTITY: &str = "preview";

/// Distinguishes temporary files of concurrent writers in one process.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

// ============================================================================
// INLINE DOCUMENT
// ============================================================================

/// Rendered bytes plus the headers needed to show them in a browser.
#[derive(Debug, Clone)]
pub struct InlineDocument {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub disposition: String,
}

pub fn artifact_name(id: &str) -> String {
    format!("cv-{}.pdf", id)
}

// ============================================================================
// RENDERER
// ============================================================================

/// Turns raw records into PDF documents.
///
/// Holds only immutable configuration, so one instance can serve any number
/// of threads.
#[derive(Debug, Clone, Default)]
pub struct DocumentRenderer {
    themes: ThemeResolver<'static>,
    photos: PhotoLoader,
}

impl DocumentRenderer {
    pub fn new(photos: PhotoLoader) -> Self {
        DocumentRenderer { themes: ThemeResolver::default(), photos }
    }

    pub fn with_themes(mut self, themes: ThemeResolver<'static>) -> Self {
        self.themes = themes;
        self
    }

    /// Renders `raw` with an explicit theme request.
    pub fn render(&self, raw: &RawRecord, theme: &ThemeRequest) -> Result<Vec<u8>> {
        let cv = sanitize::normalize(raw);
        debug!(identity = ?cv.identity(), "normalized record");
        self.render_normalized(&cv, theme)
    }

    fn render_normalized(&self, cv: &NormalizedRecord, theme: &ThemeRequest) -> Result<Vec<u8>> {
        let layout = self.layout(cv, theme);
        let bytes = pdf::paint(&layout, &format!("CV - {}", cv.full_name()))?;
        debug!(bytes = bytes.len(), "rendered document");
        Ok(bytes)
    }

    /// Renders `raw` with the theme it carries.
    pub fn render_record(&self, raw: &RawRecord) -> Result<Vec<u8>> {
        self.render(raw, &raw.theme)
    }

    /// Composes the page without painting it.
    pub fn layout(&self, cv: &NormalizedRecord, theme: &ThemeRequest) -> PageLayout {
        let style = self.themes.resolve(theme);
        debug!(primary = %style.primary, accent = %style.accent, mode = ?style.mode, "resolved theme");

        let photo = cv.photo.as_deref().and_then(|reference| self.load_photo(reference));
        layout::compose(cv, &style, photo.as_ref())
    }

    /// A missing or broken photo never fails the render.
    fn load_photo(&self, reference: &str) -> Option<Photo> {
        match self.photos.load(reference) {
            Ok(photo) => Some(photo),
            Err(e) => {
                warn!(error = %e, kind = e.kind().as_str(), "photo skipped");
                None
            }
        }
    }

    pub fn inline(&self, raw: &RawRecord) -> Result<InlineDocument> {
        let cv = sanitize::normalize(raw);
        let bytes = self.render_normalized(&cv, &raw.theme)?;
        let id = cv.identity().unwrap_or(PREVIEW_IDENTITY);

        Ok(InlineDocument {
            bytes,
            content_type: PDF_CONTENT_TYPE,
            disposition: format!("inline; filename=\"{}\"", artifact_name(id)),
        })
    }

    /// Renders fully in memory, then stores the document under `id`.
    pub fn persist(&self, raw: &RawRecord, id: &str, store: &ArtifactStore) -> Result<PathBuf> {
        self.export(raw, id, store).map(|(path, _)| path)
    }

    /// Like [`persist`](Self::persist), but also hands back the bytes that
    /// were written, which a concurrent writer of the same id cannot change.
    pub fn export(&self, raw: &RawRecord, id: &str, store: &ArtifactStore) -> Result<(PathBuf, Vec<u8>)> {
        check_identity(id)?;
        let bytes = self.render_record(raw)?;
        let path = store.persist(id, &bytes)?;
        Ok((path, bytes))
    }
}

// ============================================================================
// ARTIFACT STORE
// ============================================================================

/// Directory of persisted `cv-{id}.pdf` artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ArtifactStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &str) -> Result<PathBuf> {
        check_identity(id)?;
        Ok(self.dir.join(artifact_name(id)))
    }

    /// Writes through a temporary file and a rename, so readers only ever
    /// see a complete document. The last writer wins.
    pub fn persist(&self, id: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(id)?;
        fs::create_dir_all(&self.dir)?;

        let tmp = self.dir.join(format!(
            ".{}.{}-{}.tmp",
            artifact_name(id),
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let written = fs::File::create(&tmp).and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|_| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        info!(path = %path.display(), bytes = bytes.len(), "persisted artifact");
        Ok(path)
    }

    /// Reads a persisted artifact; `Ok(None)` when it does not exist.
    pub fn read(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(id)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

pub fn is_valid_identity(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn check_identity(id: &str) -> Result<()> {
    if is_valid_identity(id) {
        Ok(())
    } else {
        Err(RenderError::InvalidIdentity(id.to_string()))
    }
}
