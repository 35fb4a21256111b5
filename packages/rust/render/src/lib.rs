//! Document rendering for PaperForge.
//!
//! Walks a validated [`PaperDocument`] and produces a paginated PDF: title,
//! one heading+body block per section in order, then the references list.
//! The layout engine is `printpdf`'s HTML path; this crate only assembles
//! the (escaped) HTML and handles the output file.

mod html;

use std::collections::BTreeMap;
use std::path::Path;

use printpdf::{GeneratePdfOptions, PdfDocument, PdfSaveOptions};
use tracing::{debug, instrument, warn};

use paperforge_shared::{PaperDocument as Paper, PaperForgeError, Result};

pub use html::document_html;

/// A rendering collaborator: structured document in, PDF byte stream out.
pub trait RenderProvider: Send + Sync {
    fn render(&self, doc: &Paper) -> Result<Vec<u8>>;
}

// ---------------------------------------------------------------------------
// PdfRenderer
// ---------------------------------------------------------------------------

/// PDF renderer backed by `printpdf`.
#[derive(Debug, Default)]
pub struct PdfRenderer;

impl PdfRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl RenderProvider for PdfRenderer {
    #[instrument(skip_all, fields(title = %doc.title, sections = doc.sections.len()))]
    fn render(&self, doc: &Paper) -> Result<Vec<u8>> {
        let html = html::document_html(doc);

        let mut warnings = Vec::new();
        let document = PdfDocument::from_html(
            &html,
            &BTreeMap::new(), // no images
            &BTreeMap::new(), // no extra fonts
            &GeneratePdfOptions::default(),
            &mut warnings,
        )
        .map_err(|e| PaperForgeError::Render(format!("PDF layout failed: {e}")))?;

        if !warnings.is_empty() {
            warn!(count = warnings.len(), "PDF generation produced warnings");
        }

        let bytes = document.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(bytes = bytes.len(), "PDF rendered");
        Ok(bytes)
    }
}

// ---------------------------------------------------------------------------
// Output writing
// ---------------------------------------------------------------------------

/// Render `doc` and write the byte stream to `path`.
///
/// Any filesystem failure maps to [`PaperForgeError::Render`]; an incomplete
/// output file is deleted best-effort before returning the error.
pub fn write_document(renderer: &dyn RenderProvider, doc: &Paper, path: &Path) -> Result<()> {
    let bytes = renderer.render(doc)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PaperForgeError::Render(format!(
                    "cannot create output directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
    }

    if let Err(e) = std::fs::write(path, &bytes) {
        // Best-effort cleanup of a partial file.
        let _ = std::fs::remove_file(path);
        return Err(PaperForgeError::Render(format!(
            "cannot write {}: {e}",
            path.display()
        )));
    }

    debug!(path = %path.display(), bytes = bytes.len(), "output written");
    Ok(())
}
