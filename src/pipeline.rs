//! Document-to-image conversion.
//!
//! Raster images pass through as-is; each PDF page is rendered to a JPEG at a
//! fixed upscale factor. Nothing produced here is written to durable storage.

use base64::{engine::general_purpose, Engine as _};
use log::{debug, warn};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempDir;
use tokio::process::Command;

use crate::error::{Result, StatementError};
use crate::schema::{ImagePayload, StatementFile};

/// Upscale factor applied to PDF pages. Small statement print loses digits at 1x.
pub const DEFAULT_RENDER_SCALE: f32 = 2.0;

const PDF_POINTS_PER_INCH: f32 = 72.0;

/// Rasterises PDF pages. Returns one encoded JPEG per page, in page order.
pub trait PageRenderer {
    fn render_pages(
        &self,
        pdf: &[u8],
        scale: f32,
    ) -> impl Future<Output = Result<Vec<Vec<u8>>>> + Send;
}

/// Renders pages with poppler's `pdftoppm`.
#[derive(Debug, Clone, Default)]
pub struct PdftoppmRenderer;

impl PdftoppmRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn is_available() -> bool {
        std::process::Command::new("pdftoppm")
            .arg("-v")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

fn page_number(path: &Path) -> Option<u32> {
    path.file_stem()?
        .to_str()?
        .rsplit('-')
        .next()?
        .parse()
        .ok()
}

impl PageRenderer for PdftoppmRenderer {
    async fn render_pages(&self, pdf: &[u8], scale: f32) -> Result<Vec<Vec<u8>>> {
        let render_err = |details: String| StatementError::DocumentRender {
            name: "pdf".to_string(),
            details,
        };

        let workdir = TempDir::new()?;
        let input = workdir.path().join("input.pdf");
        tokio::fs::write(&input, pdf).await?;
        let prefix = workdir.path().join("page");
        let dpi = (PDF_POINTS_PER_INCH * scale).round() as u32;

        let output = Command::new("pdftoppm")
            .arg("-jpeg")
            .arg("-r")
            .arg(dpi.to_string())
            .arg(&input)
            .arg(&prefix)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| render_err(format!("could not run pdftoppm: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(render_err(stderr.trim().to_string()));
        }

        let mut pages: Vec<(u32, PathBuf)> = Vec::new();
        let mut entries = tokio::fs::read_dir(workdir.path()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "jpg") {
                if let Some(n) = page_number(&path) {
                    pages.push((n, path));
                }
            }
        }
        pages.sort_by_key(|(n, _)| *n);

        let mut images = Vec::with_capacity(pages.len());
        for (_, path) in pages {
            images.push(tokio::fs::read(path).await?);
        }
        Ok(images)
    }
}

/// Turns one uploaded file into image payloads for a multimodal request.
pub struct DocumentPipeline<R: PageRenderer> {
    renderer: R,
    scale: f32,
}

impl DocumentPipeline<PdftoppmRenderer> {
    pub fn with_pdftoppm() -> Self {
        Self::new(PdftoppmRenderer::new())
    }
}

impl<R: PageRenderer> DocumentPipeline<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            scale: DEFAULT_RENDER_SCALE,
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Images yield one payload, PDFs one payload per page. Any other type
    /// fails with `UnsupportedFile`, which callers treat as a skip.
    pub async fn prepare(&self, file: &StatementFile) -> Result<Vec<ImagePayload>> {
        if file.is_image() {
            debug!("Encoding image {} ({} bytes)", file.name, file.bytes.len());
            return Ok(vec![ImagePayload::new(
                file.mime_type.clone(),
                general_purpose::STANDARD.encode(&file.bytes),
            )]);
        }

        if file.is_pdf() {
            let pages = self
                .renderer
                .render_pages(&file.bytes, self.scale)
                .await
                .map_err(|e| match e {
                    StatementError::DocumentRender { details, .. } => {
                        StatementError::DocumentRender {
                            name: file.name.clone(),
                            details,
                        }
                    }
                    other => other,
                })?;

            if pages.is_empty() {
                warn!("{} has no renderable pages", file.name);
            }
            debug!("Rendered {} pages from {}", pages.len(), file.name);

            return Ok(pages
                .iter()
                .map(|jpeg| ImagePayload::jpeg(general_purpose::STANDARD.encode(jpeg)))
                .collect());
        }

        Err(StatementError::UnsupportedFile {
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
        })
    }
}
