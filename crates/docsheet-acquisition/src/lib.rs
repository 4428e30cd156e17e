//! Text acquisition: turns PDFs, raster images, plain text and Word files into
//! plain text, with OCR fallback for pages and images that carry no text layer.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use docsheet_core::error::AcquisitionResult;
use docsheet_core::{
    AcquisitionError, AppConfig, DocumentFormat, DocumentRef, OcrEngine, PageRasterizer,
    TextAcquisition,
};

mod docx;
mod ocr;
mod pdf;
mod raster;
mod text;

pub use ocr::{PdftoppmRasterizer, TesseractOcr};

/// Dispatches on a document's format and returns its text.
pub struct DocumentReader {
    ocr: Arc<dyn OcrEngine>,
    rasterizer: Arc<dyn PageRasterizer>,
}

impl DocumentReader {
    pub fn new(ocr: Arc<dyn OcrEngine>, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        Self { ocr, rasterizer }
    }

    /// Reader backed by the tesseract and pdftoppm binaries named in `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut ocr = TesseractOcr::new(&config.tesseract_cmd);
        if let Some(language) = &config.ocr_language {
            ocr = ocr.with_language(language.as_str());
        }
        let rasterizer =
            PdftoppmRasterizer::new(&config.pdftoppm_cmd).with_dpi(config.pdf_render_dpi);
        Self::new(Arc::new(ocr), Arc::new(rasterizer))
    }

    pub fn supported_extensions() -> &'static [&'static str] {
        DocumentFormat::SUPPORTED_EXTENSIONS
    }

    pub fn validate_file(path: &Path) -> bool {
        DocumentFormat::from_path(path).is_supported()
    }
}

/// Run blocking parsing work off the async runtime.
pub(crate) async fn blocking<T, F>(f: F) -> AcquisitionResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> AcquisitionResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AcquisitionError::Task(e.to_string()))?
}

pub(crate) fn scratch_dir() -> AcquisitionResult<tempfile::TempDir> {
    tempfile::Builder::new()
        .prefix("docsheet-")
        .tempdir()
        .map_err(|source| AcquisitionError::Io {
            stage: "scratch",
            source,
        })
}

#[async_trait]
impl TextAcquisition for DocumentReader {
    async fn acquire(&self, document: &DocumentRef) -> AcquisitionResult<String> {
        let path = document.path.as_path();
        let result = match document.format {
            DocumentFormat::Pdf => {
                pdf::read_pdf(path, self.ocr.as_ref(), self.rasterizer.as_ref()).await
            }
            DocumentFormat::Image => raster::read_image(path, self.ocr.as_ref()).await,
            DocumentFormat::PlainText => text::read_text(path).await,
            DocumentFormat::Word => {
                let owned = path.to_path_buf();
                blocking(move || docx::read_docx(&owned)).await
            }
            DocumentFormat::Unsupported => Err(AcquisitionError::UnsupportedFormat {
                extension: format!(".{}", document.extension()),
            }),
        };

        match &result {
            Ok(text) => info!(
                document = %document.name,
                format = ?document.format,
                chars = text.len(),
                "Acquired document text"
            ),
            Err(e) => warn!(
                document = %document.name,
                stage = e.stage(),
                error = %e,
                "Document acquisition failed"
            ),
        }

        result
    }
}
