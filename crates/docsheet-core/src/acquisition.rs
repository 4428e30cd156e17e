use std::path::Path;

use async_trait::async_trait;

use crate::document::DocumentRef;
use crate::error::AcquisitionResult;

/// Converts a document into plain text.
#[async_trait]
pub trait TextAcquisition: Send + Sync {
    /// Typed contract: every failure is returned as an [`AcquisitionError`](crate::AcquisitionError).
    async fn acquire(&self, document: &DocumentRef) -> AcquisitionResult<String>;

    /// Never-failing contract: failures come back as a descriptive string.
    async fn read(&self, document: &DocumentRef) -> String {
        match self.acquire(document).await {
            Ok(text) => text,
            Err(e) => format!("Error reading document: {e}"),
        }
    }
}

/// Recognizes text in an image file on disk.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image_path: &Path) -> AcquisitionResult<String>;
}

/// Renders a single PDF page (1-based) to an image file inside `out_dir` and
/// returns its path.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    async fn render_page(
        &self,
        pdf_path: &Path,
        page: u32,
        out_dir: &Path,
    ) -> AcquisitionResult<std::path::PathBuf>;
}
