//! Plain-text extraction for fetched documents.
//!
//! The loader hands over raw bytes plus a content type; this module returns
//! UTF-8 text. Supported: PDF, DOCX, and anything textual.

use std::io::Read;

use thiserror::Error;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_TEXT: &str = "text/plain";

const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
/// Maximum decompressed bytes read from `word/document.xml` (zip-bomb guard).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("DOCX extraction failed: {0}")]
    Docx(String),
    #[error("document is not valid UTF-8 text")]
    NotUtf8,
}

/// Resolve the content type of `bytes`.
///
/// PDF magic bytes win over the declared type. `path` (URL or file path)
/// supplies the extension when there is no usable declared type.
pub fn detect_content_type(bytes: &[u8], declared: Option<&str>, path: &str) -> String {
    if bytes.starts_with(PDF_MAGIC) {
        return MIME_PDF.to_string();
    }

    let declared = declared
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");
    if let Some(ct) = declared {
        return ct;
    }

    let lower = path
        .split(['?', '#'])
        .next()
        .unwrap_or(path)
        .to_ascii_lowercase();
    if lower.ends_with(".pdf") {
        MIME_PDF.to_string()
    } else if lower.ends_with(".docx") || bytes.starts_with(ZIP_MAGIC) {
        MIME_DOCX.to_string()
    } else {
        MIME_TEXT.to_string()
    }
}

/// Extract plain text from `bytes` of the given content type.
pub fn extract_text(bytes: &[u8], content_type: &str) -> Result<String, ExtractError> {
    match content_type {
        MIME_PDF => extract_pdf(bytes),
        MIME_DOCX => extract_docx(bytes),
        ct if is_textual(ct) => String::from_utf8(bytes.to_vec()).map_err(|_| ExtractError::NotUtf8),
        other => Err(ExtractError::UnsupportedContentType(other.to_string())),
    }
}

fn is_textual(content_type: &str) -> bool {
    content_type.starts_with("text/")
        || matches!(
            content_type,
            "application/json" | "application/xml" | "application/x-yaml"
        )
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| ExtractError::Docx("word/document.xml not found".to_string()))?;

    let mut xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut xml)
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    if xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::Docx(
            "word/document.xml exceeds size limit".to_string(),
        ));
    }
    paragraphs_text(&xml)
}

/// Collect `<w:t>` runs, one line per `<w:p>` paragraph.
fn paragraphs_text(xml: &[u8]) -> Result<String, ExtractError> {
    use quick_xml::events::Event;

    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::Text(te)) if in_text => {
                let text = te.unescape().map_err(|e| ExtractError::Docx(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out.trim_end().to_string())
}
