use std::path::Path;

use tracing::{debug, warn};

use docsheet_core::error::AcquisitionResult;
use docsheet_core::{AcquisitionError, DocumentFormat, OcrEngine, PageRasterizer};

use crate::{blocking, scratch_dir};

/// Embedded text of every page, keyed by 1-based page number, in page order.
/// A page whose text layer cannot be decoded yields an empty string so that it
/// falls through to OCR instead of failing the whole document.
pub(crate) fn page_texts(path: &Path) -> AcquisitionResult<Vec<(u32, String)>> {
    let doc = lopdf::Document::load(path).map_err(|e| AcquisitionError::Pdf(e.to_string()))?;

    let pages = doc.get_pages();
    let mut texts = Vec::with_capacity(pages.len());
    for &page in pages.keys() {
        let text = doc.extract_text(&[page]).unwrap_or_else(|e| {
            debug!(page, error = %e, "Embedded text extraction failed, page will be OCR'd");
            String::new()
        });
        texts.push((page, text));
    }
    Ok(texts)
}

pub(crate) async fn read_pdf(
    path: &Path,
    ocr: &dyn OcrEngine,
    rasterizer: &dyn PageRasterizer,
) -> AcquisitionResult<String> {
    let owned = path.to_path_buf();
    let pages = blocking(move || page_texts(&owned)).await?;
    debug!(pages = pages.len(), "Loaded PDF text layer");

    let text = assemble_pages(path, pages, ocr, rasterizer).await?;
    if text.is_empty() {
        return Err(AcquisitionError::NoText(DocumentFormat::Pdf));
    }
    Ok(text)
}

/// Concatenate pages in order, OCR-ing only the pages without embedded text.
/// OCR failures stay local to their page and are rendered inline.
pub(crate) async fn assemble_pages(
    path: &Path,
    pages: Vec<(u32, String)>,
    ocr: &dyn OcrEngine,
    rasterizer: &dyn PageRasterizer,
) -> AcquisitionResult<String> {
    let mut scratch = None;
    let mut text = String::new();

    for (page, page_text) in pages {
        if !page_text.trim().is_empty() {
            text.push_str(&page_text);
            text.push('\n');
            continue;
        }

        if scratch.is_none() {
            scratch = Some(scratch_dir()?);
        }
        let out_dir = scratch.as_ref().map(|d| d.path()).unwrap_or(path);

        debug!(page, "No embedded text on page, falling back to OCR");
        let recognized = match ocr_page(path, page, out_dir, ocr, rasterizer).await {
            Ok(recognized) => recognized.trim().to_string(),
            Err(e) => {
                warn!(page, error = %e, "OCR failed for PDF page");
                format!("[{e}]")
            }
        };
        text.push_str(&recognized);
        text.push('\n');
    }

    Ok(text.trim().to_string())
}

async fn ocr_page(
    path: &Path,
    page: u32,
    out_dir: &Path,
    ocr: &dyn OcrEngine,
    rasterizer: &dyn PageRasterizer,
) -> AcquisitionResult<String> {
    let tag = |e: AcquisitionError| match e {
        AcquisitionError::OcrPage { .. } => e,
        other => AcquisitionError::OcrPage {
            page,
            message: other.to_string(),
        },
    };

    let image = rasterizer.render_page(path, page, out_dir).await.map_err(tag)?;
    ocr.recognize(&image).await.map_err(tag)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// Records which pages were rendered and answers OCR with a fixed string.
    #[derive(Default)]
    struct Recorder {
        rendered: Mutex<Vec<u32>>,
        fail_page: Option<u32>,
    }

    #[async_trait]
    impl PageRasterizer for Recorder {
        async fn render_page(
            &self,
            _pdf_path: &Path,
            page: u32,
            out_dir: &Path,
        ) -> AcquisitionResult<PathBuf> {
            self.rendered.lock().unwrap().push(page);
            if self.fail_page == Some(page) {
                return Err(AcquisitionError::Ocr("pdftoppm crashed".into()));
            }
            Ok(out_dir.join(format!("page-{page}.png")))
        }
    }

    #[async_trait]
    impl OcrEngine for Recorder {
        async fn recognize(&self, image_path: &Path) -> AcquisitionResult<String> {
            let name = image_path.file_stem().unwrap().to_string_lossy().into_owned();
            Ok(format!("  ocr text from {name}\n"))
        }
    }

    fn pages(texts: &[&str]) -> Vec<(u32, String)> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| (i as u32 + 1, t.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn text_pages_never_invoke_ocr() {
        let recorder = Recorder::default();
        let text = assemble_pages(
            Path::new("doc.pdf"),
            pages(&["first page", "second page"]),
            &recorder,
            &recorder,
        )
        .await
        .unwrap();

        assert_eq!(text, "first page\nsecond page");
        assert!(recorder.rendered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_page_is_ocrd_in_position() {
        let recorder = Recorder::default();
        let text = assemble_pages(
            Path::new("doc.pdf"),
            pages(&["first page", "   \n", "third page"]),
            &recorder,
            &recorder,
        )
        .await
        .unwrap();

        assert_eq!(*recorder.rendered.lock().unwrap(), vec![2]);
        assert_eq!(text, "first page\nocr text from page-2\nthird page");
    }

    #[tokio::test]
    async fn ocr_failure_is_tagged_with_page_and_kept_inline() {
        let recorder = Recorder {
            fail_page: Some(1),
            ..Recorder::default()
        };
        let text = assemble_pages(
            Path::new("doc.pdf"),
            pages(&["", "second page"]),
            &recorder,
            &recorder,
        )
        .await
        .unwrap();

        assert_eq!(
            text,
            "[OCR error on page 1: OCR failed: pdftoppm crashed]\nsecond page"
        );
    }

    #[tokio::test]
    async fn empty_document_assembles_to_empty_text() {
        let recorder = Recorder::default();
        let text = assemble_pages(Path::new("doc.pdf"), Vec::new(), &recorder, &recorder)
            .await
            .unwrap();
        assert!(text.is_empty());
    }

    /// One page per entry; `None` leaves the page without a content stream.
    fn write_pdf(path: &Path, pages: &[Option<&str>]) {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for text in pages {
            let mut page = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Resources" => resources_id,
            };
            if let Some(text) = text {
                let content = Content {
                    operations: vec![
                        Operation::new("BT", vec![]),
                        Operation::new("Tf", vec!["F1".into(), 24.into()]),
                        Operation::new("Td", vec![72.into(), 700.into()]),
                        Operation::new("Tj", vec![Object::string_literal(*text)]),
                        Operation::new("ET", vec![]),
                    ],
                };
                let content_id =
                    doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
                page.set("Contents", content_id);
            }
            kids.push(Object::from(doc.add_object(page)));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[tokio::test]
    async fn embedded_text_is_read_without_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.pdf");
        write_pdf(&path, &[Some("Invoice 42"), Some("Total 99")]);

        let recorder = Recorder::default();
        let text = read_pdf(&path, &recorder, &recorder).await.unwrap();

        assert!(text.contains("Invoice 42"), "got {text:?}");
        assert!(text.contains("Total 99"), "got {text:?}");
        assert!(text.find("Invoice 42") < text.find("Total 99"));
        assert!(recorder.rendered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn page_without_text_layer_is_ocrd() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.pdf");
        write_pdf(&path, &[Some("Invoice 42"), None]);

        let recorder = Recorder::default();
        let text = read_pdf(&path, &recorder, &recorder).await.unwrap();

        assert_eq!(*recorder.rendered.lock().unwrap(), vec![2]);
        assert!(text.contains("Invoice 42"), "got {text:?}");
        assert!(text.ends_with("ocr text from page-2"), "got {text:?}");
    }

    #[test]
    fn unreadable_pdf_is_pdf_error() {
        let err = page_texts(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, AcquisitionError::Pdf(_)));
    }
}
