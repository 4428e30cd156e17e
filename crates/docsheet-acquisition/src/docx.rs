use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use docsheet_core::error::AcquisitionResult;
use docsheet_core::{AcquisitionError, DocumentFormat};

const DOCUMENT_PART: &str = "word/document.xml";
const CELL_DELIMITER: &str = " | ";

pub(crate) fn read_docx(path: &Path) -> AcquisitionResult<String> {
    let file = std::fs::File::open(path).map_err(|source| AcquisitionError::Io {
        stage: "docx",
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| AcquisitionError::Docx(format!("not a valid .docx archive: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| AcquisitionError::Docx(format!("missing {DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|source| AcquisitionError::Io {
            stage: "docx",
            source,
        })?;

    let text = docx_text(&xml)?;
    if text.is_empty() {
        return Err(AcquisitionError::NoText(DocumentFormat::Word));
    }
    Ok(text)
}

/// Body paragraphs in document order, then every table row on its own line
/// with non-empty cells joined by `" | "`. Blank paragraphs, cells and rows
/// are dropped. Nested tables contribute their text to the enclosing cell.
pub(crate) fn docx_text(xml: &str) -> AcquisitionResult<String> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs: Vec<String> = Vec::new();
    let mut table_rows: Vec<String> = Vec::new();
    let mut open_paragraphs: Vec<String> = Vec::new();
    let mut row_cells: Vec<String> = Vec::new();
    let mut cell_paragraphs: Vec<String> = Vec::new();
    let mut table_depth = 0usize;
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => open_paragraphs.push(String::new()),
                b"t" => in_text_run = true,
                b"tbl" => table_depth += 1,
                b"tr" if table_depth == 1 => row_cells.clear(),
                b"tc" if table_depth == 1 => cell_paragraphs.clear(),
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                let ch = match e.local_name().as_ref() {
                    b"tab" => Some('\t'),
                    b"br" | b"cr" => Some('\n'),
                    _ => None,
                };
                if let (Some(ch), Some(current)) = (ch, open_paragraphs.last_mut()) {
                    current.push(ch);
                }
            }
            Ok(Event::Text(t)) if in_text_run => {
                let fragment = t
                    .unescape()
                    .map_err(|e| AcquisitionError::Docx(format!("bad text run: {e}")))?;
                if let Some(current) = open_paragraphs.last_mut() {
                    current.push_str(&fragment);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => {
                    if let Some(text) = open_paragraphs.pop() {
                        if table_depth == 0 {
                            paragraphs.push(text);
                        } else {
                            cell_paragraphs.push(text);
                        }
                    }
                }
                b"tc" if table_depth == 1 => row_cells.push(cell_paragraphs.join("\n")),
                b"tr" if table_depth == 1 => {
                    let cells: Vec<&str> = row_cells
                        .iter()
                        .map(|c| c.trim())
                        .filter(|c| !c.is_empty())
                        .collect();
                    if !cells.is_empty() {
                        table_rows.push(cells.join(CELL_DELIMITER));
                    }
                }
                b"tbl" => table_depth = table_depth.saturating_sub(1),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(AcquisitionError::Docx(format!(
                    "malformed {DOCUMENT_PART} at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    let mut lines: Vec<String> = paragraphs
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect();
    lines.extend(table_rows);
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::*;

    const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Purchase Order</w:t></w:r></w:p>
    <w:p/>
    <w:p><w:r><w:t xml:space="preserve">Vendor: </w:t></w:r><w:r><w:t>Smith &amp; Sons</w:t></w:r></w:p>
    <w:tbl>
      <w:tr>
        <w:tc><w:p><w:r><w:t>Item</w:t></w:r></w:p></w:tc>
        <w:tc><w:p><w:r><w:t>Qty</w:t></w:r></w:p></w:tc>
      </w:tr>
      <w:tr>
        <w:tc><w:p><w:r><w:t> Bolts </w:t></w:r></w:p></w:tc>
        <w:tc><w:p/></w:tc>
        <w:tc><w:p><w:r><w:t>12</w:t></w:r></w:p></w:tc>
      </w:tr>
      <w:tr>
        <w:tc><w:p/></w:tc>
      </w:tr>
    </w:tbl>
    <w:p><w:r><w:t>Signed</w:t><w:tab/><w:t>J. Doe</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

    #[test]
    fn paragraphs_then_table_rows() {
        let text = docx_text(BODY).unwrap();
        assert_eq!(
            text,
            "Purchase Order\nVendor: Smith & Sons\nSigned\tJ. Doe\nItem | Qty\nBolts | 12"
        );
    }

    #[test]
    fn malformed_xml_is_docx_error() {
        let err = docx_text("<w:document><w:body><w:p></w:body>").unwrap_err();
        assert_eq!(err.stage(), "docx");
    }

    fn write_docx(path: &Path, document_xml: &str) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file(DOCUMENT_PART, SimpleFileOptions::default())
            .unwrap();
        zip.write_all(document_xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn reads_document_part_from_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("order.docx");
        write_docx(&path, BODY);

        let text = read_docx(&path).unwrap();
        assert!(text.starts_with("Purchase Order\n"));
        assert!(text.ends_with("Bolts | 12"));
    }

    #[test]
    fn empty_document_is_no_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.docx");
        write_docx(
            &path,
            r#"<w:document xmlns:w="urn:w"><w:body><w:p/></w:body></w:document>"#,
        );

        let err = read_docx(&path).unwrap_err();
        assert!(matches!(err, AcquisitionError::NoText(DocumentFormat::Word)));
    }

    #[test]
    fn non_zip_file_is_docx_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.docx");
        std::fs::write(&path, "plain text pretending").unwrap();

        let err = read_docx(&path).unwrap_err();
        assert!(matches!(err, AcquisitionError::Docx(_)));
    }
}
