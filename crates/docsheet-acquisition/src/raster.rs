use std::path::{Path, PathBuf};

use tracing::debug;

use docsheet_core::error::AcquisitionResult;
use docsheet_core::{AcquisitionError, DocumentFormat, OcrEngine};

use crate::{blocking, scratch_dir};

/// Decode any supported raster format, convert it to 8-bit RGB and write it
/// out as PNG so the OCR engine always sees the same color mode.
pub(crate) fn normalize_image(src: &Path, dest: &Path) -> AcquisitionResult<()> {
    let decoded = image::open(src).map_err(|e| AcquisitionError::Image(e.to_string()))?;
    debug!(
        color = ?decoded.color(),
        width = decoded.width(),
        height = decoded.height(),
        "Decoded image"
    );

    decoded
        .to_rgb8()
        .save_with_format(dest, image::ImageFormat::Png)
        .map_err(|e| AcquisitionError::Image(format!("failed to write normalized image: {e}")))
}

pub(crate) async fn read_image(path: &Path, ocr: &dyn OcrEngine) -> AcquisitionResult<String> {
    let scratch = scratch_dir()?;
    let normalized: PathBuf = scratch.path().join("normalized.png");

    let (src, dest) = (path.to_path_buf(), normalized.clone());
    blocking(move || normalize_image(&src, &dest)).await?;

    let text = ocr.recognize(&normalized).await?;
    let text = text.trim();
    if text.is_empty() {
        return Err(AcquisitionError::NoText(DocumentFormat::Image));
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use image::{ColorType, Rgba, RgbaImage};

    use super::*;

    /// Checks that it was handed an RGB image and echoes a fixed string.
    struct RgbCheckingOcr {
        reply: &'static str,
    }

    #[async_trait]
    impl OcrEngine for RgbCheckingOcr {
        async fn recognize(&self, image_path: &Path) -> AcquisitionResult<String> {
            let img = image::open(image_path).map_err(|e| AcquisitionError::Image(e.to_string()))?;
            if img.color() != ColorType::Rgb8 {
                return Err(AcquisitionError::Ocr(format!("unexpected color {:?}", img.color())));
            }
            Ok(self.reply.to_string())
        }
    }

    fn write_rgba_png(dir: &Path) -> PathBuf {
        let path = dir.join("scan.png");
        let img = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 128]));
        img.save(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn rgba_input_is_normalized_before_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rgba_png(dir.path());

        let ocr = RgbCheckingOcr {
            reply: "  Receipt #881\n",
        };
        let text = read_image(&path, &ocr).await.unwrap();
        assert_eq!(text, "Receipt #881");
    }

    #[tokio::test]
    async fn blank_ocr_output_is_no_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rgba_png(dir.path());

        let ocr = RgbCheckingOcr { reply: "\n \n" };
        let err = read_image(&path, &ocr).await.unwrap_err();
        assert!(matches!(err, AcquisitionError::NoText(DocumentFormat::Image)));
    }

    #[tokio::test]
    async fn undecodable_image_is_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.jpg");
        std::fs::write(&path, b"not a jpeg").unwrap();

        let ocr = RgbCheckingOcr { reply: "unused" };
        let err = read_image(&path, &ocr).await.unwrap_err();
        assert_eq!(err.stage(), "image");
    }
}
