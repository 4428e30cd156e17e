use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use docsheet_core::error::AcquisitionResult;
use docsheet_core::{AcquisitionError, OcrEngine, PageRasterizer};

/// Page segmentation "single uniform block", LSTM engine.
const TESSERACT_ARGS: &[&str] = &["--oem", "3", "--psm", "6"];
const RENDER_DPI: u32 = 200;

fn spawn_error(command: &str, e: std::io::Error) -> AcquisitionError {
    if e.kind() == ErrorKind::NotFound {
        AcquisitionError::OcrUnavailable(format!("'{command}' is not installed or not on PATH"))
    } else {
        AcquisitionError::OcrUnavailable(format!("failed to start '{command}': {e}"))
    }
}

/// OCR through the `tesseract` command-line tool.
pub struct TesseractOcr {
    command: String,
    language: Option<String>,
}

impl TesseractOcr {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            language: None,
        }
    }

    /// Tesseract language pack(s), e.g. `eng+deu`.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    fn command_for(&self, image_path: &Path) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.arg(image_path).arg("stdout").args(TESSERACT_ARGS);
        if let Some(lang) = &self.language {
            cmd.arg("-l").arg(lang);
        }
        cmd
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, image_path: &Path) -> AcquisitionResult<String> {
        debug!(image = %image_path.display(), "Running tesseract");
        let output = self
            .command_for(image_path)
            .output()
            .await
            .map_err(|e| spawn_error(&self.command, e))?;

        if !output.status.success() {
            return Err(AcquisitionError::Ocr(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Renders PDF pages to PNG with poppler's `pdftoppm`.
pub struct PdftoppmRasterizer {
    command: String,
    dpi: u32,
}

impl PdftoppmRasterizer {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            dpi: RENDER_DPI,
        }
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi.max(1);
        self
    }

    fn command_for(&self, pdf_path: &Path, page: u32, root: &Path) -> Command {
        let page_arg = page.to_string();
        let mut cmd = Command::new(&self.command);
        cmd.args(["-f", page_arg.as_str(), "-l", page_arg.as_str()])
            .arg("-r")
            .arg(self.dpi.to_string())
            .args(["-png", "-singlefile"])
            .arg(pdf_path)
            .arg(root);
        cmd
    }
}

#[async_trait]
impl PageRasterizer for PdftoppmRasterizer {
    async fn render_page(
        &self,
        pdf_path: &Path,
        page: u32,
        out_dir: &Path,
    ) -> AcquisitionResult<PathBuf> {
        let root = out_dir.join(format!("page-{page}"));

        debug!(pdf = %pdf_path.display(), page, dpi = self.dpi, "Rendering PDF page");
        let output = self
            .command_for(pdf_path, page, &root)
            .output()
            .await
            .map_err(|e| spawn_error(&self.command, e))?;

        if !output.status.success() {
            return Err(AcquisitionError::OcrPage {
                page,
                message: format!(
                    "{} exited with {}: {}",
                    self.command,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(root.with_extension("png"))
    }
}
